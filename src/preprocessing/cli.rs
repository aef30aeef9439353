use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::PathBuf,
};

use clap::Parser;
use tracing::info;

use crate::{
    error::{CavityError, CavityResult},
    preprocessing::{OutputSettings, SimulationInput},
    sim::{boundary::PressureBoundary, params::AdvectionScheme},
};

// Raw, CLI input
#[derive(Parser, Debug)]
#[command(version, about = "Lid-driven cavity flow solver", long_about = None)]
pub struct CliArgs {
    #[arg(
        long,
        help = "An input file with pre-loaded parameters. Overrides the simulation flags; \
                the state & output flags still apply."
    )]
    input_json: Option<PathBuf>,

    #[arg(long, help = "Optional path to save the effective input file to.")]
    input_json_savepath: Option<PathBuf>,

    #[arg(long, help = "Grid nodes along x.", default_value = "41")]
    nx: usize,

    #[arg(long, help = "Grid nodes along y.", default_value = "41")]
    ny: usize,

    #[arg(long, help = "Domain length in x axis.", default_value = "2.0")]
    length: f64,

    #[arg(long, default_value = "1.0", help = "Fluid density.")]
    density: f64,

    #[arg(long, default_value = "0.1", help = "Kinematic viscosity.")]
    viscosity: f64,

    #[arg(short, long, default_value = "0.005", help = "Timestep in seconds.")]
    timestep: f64,

    #[arg(short = 'n', long, default_value = "1000", help = "Number of timesteps.")]
    steps: usize,

    #[arg(
        long,
        default_value = "1e-4",
        help = "Relative L2 change at which the pressure relaxation stops."
    )]
    l2_target: f64,

    #[arg(long, default_value = "1.0", help = "Velocity of the driven lid.")]
    lid_velocity: f64,

    #[arg(
        long,
        value_enum,
        default_value_t = AdvectionScheme::Consistent,
        help = "Advecting velocity of the v-momentum y-derivative."
    )]
    advection: AdvectionScheme,

    #[arg(long, help = "Hold the right edge at zero pressure instead of zero gradient.")]
    open_right_edge: bool,

    #[arg(long, help = "A snapshot to resume the simulation from.")]
    initial_state: Option<PathBuf>,

    #[arg(long, help = "Where to save the final state as a snapshot.")]
    snapshot: Option<PathBuf>,

    #[arg(long, help = "A reference snapshot the final state must match.")]
    reference: Option<PathBuf>,

    #[arg(
        long,
        help = "Largest absolute deviation accepted against the reference [default: 1e-4]."
    )]
    reference_tolerance: Option<f64>,

    #[arg(long, help = "Hide the progress bar.")]
    no_progress: bool,

    #[arg(short, long, help = "Log solver details for every timestep.")]
    pub verbose: bool,
}

impl CliArgs {
    pub fn build_input(&self) -> CavityResult<SimulationInput> {
        // if the input file is supplied, just use that
        if let Some(input_filepath) = &self.input_json {
            info!("Using input file {:?}", input_filepath);

            let input_file =
                File::open(input_filepath).map_err(|err| CavityError::io(input_filepath, err))?;

            let reader = BufReader::new(input_file);
            let mut loaded_input: SimulationInput = serde_json::from_reader(reader)
                .map_err(|err| CavityError::json(input_filepath, err))?;

            self.override_outputs(&mut loaded_input);

            loaded_input.validate()?;
            return Ok(loaded_input);
        }

        // otherwise, build the input from the other arguments
        let pressure_boundary = if self.open_right_edge {
            PressureBoundary::open_right()
        } else {
            PressureBoundary::cavity()
        };

        let input = SimulationInput {
            nx: self.nx,
            ny: self.ny,
            length: self.length,
            density: self.density,
            viscosity: self.viscosity,
            timestep: self.timestep,
            steps: self.steps,
            l2_target: self.l2_target,
            lid_velocity: self.lid_velocity,
            advection: self.advection,
            pressure_boundary,
            initial_state: self.initial_state.clone(),
            output: OutputSettings {
                snapshot_path: self.snapshot.clone(),
                reference_path: self.reference.clone(),
                reference_tolerance: self
                    .reference_tolerance
                    .unwrap_or(OutputSettings::default().reference_tolerance),
                show_progress: !self.no_progress,
            },
        };

        input.validate()?;
        Ok(input)
    }

    /// Apply the state & output flags given on the command line on top of a
    /// loaded input file. Flags that were not given leave the file's values.
    fn override_outputs(&self, input: &mut SimulationInput) {
        if let Some(initial_state) = &self.initial_state {
            input.initial_state = Some(initial_state.clone());
        }

        let output = &mut input.output;

        if let Some(snapshot) = &self.snapshot {
            output.snapshot_path = Some(snapshot.clone());
        }
        if let Some(reference) = &self.reference {
            output.reference_path = Some(reference.clone());
        }
        if let Some(tolerance) = self.reference_tolerance {
            output.reference_tolerance = tolerance;
        }
        if self.no_progress {
            output.show_progress = false;
        }
    }

    /// Write the effective input to `--input-json-savepath`, if given
    pub fn save_input(&self, input: &SimulationInput) -> CavityResult<()> {
        let Some(savepath) = &self.input_json_savepath else {
            return Ok(());
        };

        let file = File::create(savepath).map_err(|err| CavityError::io(savepath, err))?;
        let mut writer = BufWriter::new(file);

        serde_json::to_writer_pretty(&mut writer, input)
            .map_err(|err| CavityError::json(savepath, err))?;
        writer.flush().map_err(|err| CavityError::io(savepath, err))?;

        info!("Saved input file to {:?}", savepath);
        Ok(())
    }
}
