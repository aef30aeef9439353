// Physical and numerical parameters of a cavity run

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{CavityError, CavityResult};

/// Which velocity carries the y-derivative in the convective term of the
/// v-momentum update.
#[derive(Serialize, Deserialize, ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdvectionScheme {
    /// (u⋅∇)v = u ∂v/∂x + v ∂v/∂y
    #[default]
    Consistent,

    /// u ∂v/∂x + u ∂v/∂y; matches fixtures produced by the classic
    /// notebook formulation of the cavity update.
    Legacy,
}

/// Immutable parameters shared by every routine of a timestep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CavityParams {
    /// Fluid density (rho)
    pub density: f64,

    /// Kinematic viscosity (nu)
    pub viscosity: f64,

    /// Uniform grid spacing, identical in x and y
    pub dx: f64,

    /// Timestep
    pub dt: f64,

    /// Relative L2 change at which the pressure relaxation stops
    pub l2_target: f64,

    /// Tangential velocity of the driven lid
    pub lid_velocity: f64,

    pub advection: AdvectionScheme,
}

impl CavityParams {
    /// The 41x41 cavity on [0, 2] x [0, 2] at Re = 20.
    pub fn reference() -> Self {
        CavityParams {
            density: 1.,
            viscosity: 0.1,
            dx: 2. / 40.,
            dt: 0.005,
            l2_target: 1e-4,
            lid_velocity: 1.,
            advection: AdvectionScheme::Consistent,
        }
    }

    /// Reject parameters the discretization cannot work with.
    pub fn validate(&self) -> CavityResult<()> {
        let positive = [
            ("density", self.density),
            ("viscosity", self.viscosity),
            ("dx", self.dx),
            ("dt", self.dt),
        ];

        for (name, value) in positive {
            if !(value.is_finite() && value > 0.) {
                return Err(CavityError::InvalidInput(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }

        if !self.l2_target.is_finite() {
            return Err(CavityError::InvalidInput(format!(
                "l2_target must be finite, got {}",
                self.l2_target
            )));
        }

        if !self.lid_velocity.is_finite() {
            return Err(CavityError::InvalidInput(format!(
                "lid velocity must be finite, got {}",
                self.lid_velocity
            )));
        }

        Ok(())
    }
}
