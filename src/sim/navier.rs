// Navier-Stokes timestepping for the lid-driven cavity

use na::DMatrix;
use tracing::{debug, error};

use crate::{
    ScalarField, VectorField,
    error::{CavityError, CavityResult},
    sim::{
        boundary::{PressureBoundary, apply_velocity_boundary},
        numeric,
        params::{AdvectionScheme, CavityParams},
        poisson::{self, PoissonReport},
    },
};

/// Maximum allowable velocity before stopping simulation
const MAX_VELOCITY: f64 = 1000.;

/// Smallest grid extent the stencils & boundary conditions can address
pub const MIN_GRID_NODES: usize = 2;

/// Advance the velocity field one timestep with the discretized momentum
/// equations, then force the no-slip walls & driven lid.
///
/// Convection uses backward differences against each node's previous
/// value, the pressure gradient central differences, and diffusion the
/// 5-point laplacian. With [`AdvectionScheme::Legacy`] the y-derivative of
/// v is carried by u instead of v.
///
/// Parameters
/// - `u` - The velocity field <u, v>, updated in place
/// - `p` - The pressure field solved for this timestep
/// - `params` - Run parameters
pub fn update_velocity(u: &mut VectorField, p: &ScalarField, params: &CavityParams) {
    let [un, vn] = u.clone();
    let (rows, cols) = un.shape();

    let CavityParams {
        density,
        viscosity,
        dx,
        dt,
        ..
    } = *params;

    let courant = dt / dx;
    let diffusion = viscosity * dt / dx.powi(2);
    let pressure = dt / (2. * density * dx);

    for c in 1..(cols - 1) {
        for r in 1..(rows - 1) {
            let (u0, v0) = (un[(r, c)], vn[(r, c)]);

            let v_carrier = match params.advection {
                AdvectionScheme::Consistent => v0,
                AdvectionScheme::Legacy => u0,
            };

            u[0][(r, c)] = u0
                - u0 * courant * (u0 - un[(r, c - 1)])
                - v0 * courant * (u0 - un[(r - 1, c)])
                - pressure * (p[(r, c + 1)] - p[(r, c - 1)])
                + diffusion * numeric::laplacian_at(&un, r, c);

            u[1][(r, c)] = v0
                - u0 * courant * (v0 - vn[(r, c - 1)])
                - v_carrier * courant * (v0 - vn[(r - 1, c)])
                - pressure * (p[(r + 1, c)] - p[(r - 1, c)])
                + diffusion * numeric::laplacian_at(&vn, r, c);
        }
    }

    apply_velocity_boundary(u, params.lid_velocity);
}

/// Outcome of one timestep.
#[derive(Clone, Debug)]
pub struct StepReport {
    /// 1-based index of the step just taken
    pub step: usize,

    /// The pressure solve of this step
    pub poisson: PoissonReport,
}

/// High-level cavity timestepping object. Owns every grid of the run and
/// steps through the simulation as an iterator of `StepReport`s.
pub struct Cavity {
    params: CavityParams,

    pressure_boundary: PressureBoundary,

    /// The velocity field
    u: VectorField,

    /// The pressure field, carried across steps as the next initial guess
    p: ScalarField,

    /// Scratch source field, rebuilt every step
    b: ScalarField,

    /// Iteration-counter
    i: usize,

    /// Step index at which iteration stops
    end: usize,

    /// Set when the velocity blew up
    diverged: bool,
}

impl Cavity {
    /// Create a cavity at rest with zero pressure.
    ///
    /// Parameters
    /// - `params` - Run parameters
    /// - `pressure_boundary` - Boundary conditions for the pressure solve
    /// - `shape` - Grid shape (ny, nx), at least [`MIN_GRID_NODES`] each way
    /// - `steps` - Number of timesteps to take
    ///
    /// Panics if the grid is smaller than `MIN_GRID_NODES` in either
    /// direction.
    pub fn new(
        params: CavityParams,
        pressure_boundary: PressureBoundary,
        shape: (usize, usize),
        steps: usize,
    ) -> Self {
        let (rows, cols) = shape;
        assert!(
            rows >= MIN_GRID_NODES && cols >= MIN_GRID_NODES,
            "cavity grid must be at least {MIN_GRID_NODES}x{MIN_GRID_NODES}, got {rows}x{cols}"
        );

        let ux: ScalarField = DMatrix::zeros(rows, cols);
        let uy: ScalarField = DMatrix::zeros(rows, cols);
        let p: ScalarField = DMatrix::zeros(rows, cols);
        let b: ScalarField = DMatrix::zeros(rows, cols);

        Cavity {
            params,
            pressure_boundary,
            u: [ux, uy],
            p,
            b,
            i: 0,
            end: steps,
            diverged: false,
        }
    }

    /// Continue a run from previously saved fields.
    ///
    /// Parameters
    /// - `start_step` - The number of steps that produced the given fields
    /// - `steps` - Number of further timesteps to take
    pub fn resume(
        params: CavityParams,
        pressure_boundary: PressureBoundary,
        u: VectorField,
        p: ScalarField,
        start_step: usize,
        steps: usize,
    ) -> CavityResult<Self> {
        let expected = p.shape();

        if expected.0 < MIN_GRID_NODES || expected.1 < MIN_GRID_NODES {
            return Err(CavityError::InvalidInput(format!(
                "cavity grid must be at least {MIN_GRID_NODES}x{MIN_GRID_NODES}, got {}x{}",
                expected.0, expected.1
            )));
        }

        for field in u.iter() {
            if field.shape() != expected {
                return Err(CavityError::ShapeMismatch {
                    expected,
                    found: field.shape(),
                });
            }
        }

        let b: ScalarField = DMatrix::zeros(expected.0, expected.1);

        Ok(Cavity {
            params,
            pressure_boundary,
            u,
            p,
            b,
            i: start_step,
            end: start_step + steps,
            diverged: false,
        })
    }

    /// Take a single timestep: source, pressure, then velocity.
    pub fn step(&mut self) -> StepReport {
        numeric::build_source_into(&mut self.b, &self.u, &self.params);

        let poisson = poisson::solve_pressure(
            &mut self.p,
            &self.b,
            self.params.l2_target,
            &self.pressure_boundary,
        );

        update_velocity(&mut self.u, &self.p, &self.params);

        self.i += 1;

        debug!(
            step = self.i,
            sweeps = poisson.sweeps,
            residual = poisson.residual,
            "timestep complete"
        );

        StepReport {
            step: self.i,
            poisson,
        }
    }

    /// Steps left before the iterator is exhausted
    pub fn remaining(&self) -> usize {
        self.end.saturating_sub(self.i)
    }

    /// Index of the last step taken
    pub fn current_step(&self) -> usize {
        self.i
    }

    pub fn diverged(&self) -> bool {
        self.diverged
    }

    pub fn velocity(&self) -> &VectorField {
        &self.u
    }

    pub fn pressure(&self) -> &ScalarField {
        &self.p
    }

    /// Release the velocity & pressure fields
    pub fn into_fields(self) -> (VectorField, ScalarField) {
        (self.u, self.p)
    }

    fn exploded(&self) -> bool {
        self.u
            .iter()
            .flat_map(|component| component.iter())
            .any(|value| !value.is_finite() || value.abs() > MAX_VELOCITY)
    }
}

impl Iterator for Cavity {
    type Item = StepReport;

    fn next(&mut self) -> Option<Self::Item> {
        if self.diverged || self.i >= self.end {
            return None;
        }

        let report = self.step();

        // check for simulation explosion
        if self.exploded() {
            error!(step = self.i, "Velocity exceeded maximum; simulation exploded");
            self.diverged = true;
            return None;
        }

        Some(report)
    }
}
