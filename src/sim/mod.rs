// Lid-driven cavity solver: source term, pressure relaxation & momentum update

pub mod boundary;
pub mod navier;
pub mod numeric;
pub mod params;
pub mod poisson;
pub mod task;
