use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::{CavityError, CavityResult},
    preprocessing::serial_field::Snapshot,
    sim::{
        boundary::PressureBoundary,
        navier::Cavity,
        params::{AdvectionScheme, CavityParams},
    },
};

pub mod cli;
pub mod serial_field;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OutputSettings {
    /// Where to write the final state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<PathBuf>,

    /// A stored snapshot the final state must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_path: Option<PathBuf>,

    /// Largest absolute deviation accepted against the reference
    pub reference_tolerance: f64,

    pub show_progress: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        OutputSettings {
            snapshot_path: None,
            reference_path: None,
            reference_tolerance: 1e-4,
            show_progress: true,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SimulationInput {
    /// Grid nodes along x (columns)
    pub nx: usize,

    /// Grid nodes along y (rows)
    pub ny: usize,

    /// Length of the domain along x; dx = length / (nx - 1)
    pub length: f64,

    pub density: f64,
    pub viscosity: f64,
    pub timestep: f64,
    pub steps: usize,
    pub l2_target: f64,
    pub lid_velocity: f64,

    #[serde(default)]
    pub advection: AdvectionScheme,

    #[serde(default)]
    pub pressure_boundary: PressureBoundary,

    /// Snapshot to resume from; the cavity starts at rest otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_state: Option<PathBuf>,

    #[serde(default)]
    pub output: OutputSettings,
}

impl Default for SimulationInput {
    fn default() -> Self {
        let params = CavityParams::reference();

        SimulationInput {
            nx: 41,
            ny: 41,
            length: 2.,
            density: params.density,
            viscosity: params.viscosity,
            timestep: params.dt,
            steps: 1000,
            l2_target: params.l2_target,
            lid_velocity: params.lid_velocity,
            advection: params.advection,
            pressure_boundary: PressureBoundary::cavity(),
            initial_state: None,
            output: OutputSettings::default(),
        }
    }
}

impl SimulationInput {
    /// Grid spacing, shared by both axes
    pub fn dx(&self) -> f64 {
        self.length / (self.nx.saturating_sub(1).max(1)) as f64
    }

    pub fn params(&self) -> CavityParams {
        CavityParams {
            density: self.density,
            viscosity: self.viscosity,
            dx: self.dx(),
            dt: self.timestep,
            l2_target: self.l2_target,
            lid_velocity: self.lid_velocity,
            advection: self.advection,
        }
    }

    pub fn validate(&self) -> CavityResult<()> {
        if self.nx < 3 || self.ny < 3 {
            return Err(CavityError::InvalidInput(format!(
                "the grid needs at least 3x3 nodes, got {}x{}",
                self.nx, self.ny
            )));
        }

        if self.steps == 0 {
            return Err(CavityError::InvalidInput(
                "at least one timestep is required".to_string(),
            ));
        }

        if !(self.length.is_finite() && self.length > 0.) {
            return Err(CavityError::InvalidInput(format!(
                "domain length must be positive and finite, got {}",
                self.length
            )));
        }

        if !(self.output.reference_tolerance.is_finite() && self.output.reference_tolerance > 0.) {
            return Err(CavityError::InvalidInput(format!(
                "reference tolerance must be positive, got {}",
                self.output.reference_tolerance
            )));
        }

        self.params().validate()
    }

    /// Build the cavity described by this input, loading the initial
    /// state if one is given.
    pub fn build_simulation(&self) -> CavityResult<Cavity> {
        self.validate()?;

        let Some(path) = &self.initial_state else {
            return Ok(Cavity::new(
                self.params(),
                self.pressure_boundary,
                (self.ny, self.nx),
                self.steps,
            ));
        };

        let snapshot = Snapshot::load(path)?;
        let (u, p) = snapshot.fields()?;

        if p.shape() != (self.ny, self.nx) {
            return Err(CavityError::ShapeMismatch {
                expected: (self.ny, self.nx),
                found: p.shape(),
            });
        }

        info!(
            "Resuming from {:?} after {} steps",
            path, snapshot.steps
        );

        Cavity::resume(
            self.params(),
            self.pressure_boundary,
            u,
            p,
            snapshot.steps,
            self.steps,
        )
    }

    pub fn log(&self) {
        info!(
            "Simulation is shown below:\n\n\
        \t grid:        {} x {} (dx = {})\n\
        \t steps:       {} (dt = {} s)\n\
        \t density:     {}\n\
        \t viscosity:   {}\n\
        \t lid:         {} m/s\n\
        \t l2 target:   {}\n\
        \t advection:   {:?}\n\
        \t pressure bc: {:?}\n\n\
        ",
            self.nx,
            self.ny,
            self.dx(),
            self.steps,
            self.timestep,
            self.density,
            self.viscosity,
            self.lid_velocity,
            self.l2_target,
            self.advection,
            self.pressure_boundary,
        );

        if let Ok(output_str) = serde_json::to_string_pretty(&self.output) {
            info!("Output settings are:\n\n{}", output_str);
        }
    }
}
