// 2D lid-driven cavity flow: finite-difference momentum update coupled to a
// Jacobi pressure-Poisson relaxation.

extern crate nalgebra as na;

pub mod error;
pub mod postprocessing;
pub mod preprocessing;
pub mod sim;

use na::DMatrix;

/// A scalar quantity sampled on the (ny, nx) grid; row 0 is the bottom wall
pub type ScalarField = DMatrix<f64>;

/// A cartesian vector field <u, v>
pub type VectorField = [ScalarField; 2];
