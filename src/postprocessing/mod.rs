// Contains post-processers for analyzing simulation results

pub mod compare;

use tracing::{info, warn};

use crate::{
    error::{CavityError, CavityResult},
    preprocessing::{SimulationInput, serial_field::Snapshot},
    sim::task::SimulationOutput,
};

/// Summary statistics of a finished run
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunSummary {
    pub mean_sweeps: f64,
    pub peak_interior_speed: f64,
    pub centre: (f64, f64, f64), // (u, v, p)
}

impl RunSummary {
    pub fn from_output(output: &SimulationOutput) -> Self {
        let [u, v] = &output.velocity;
        let (rows, cols) = u.shape();

        let mean_sweeps = if output.steps_completed == 0 {
            0.
        } else {
            output.total_sweeps as f64 / output.steps_completed as f64
        };

        let mut peak_interior_speed: f64 = 0.;
        for c in 1..(cols - 1) {
            for r in 1..(rows - 1) {
                peak_interior_speed = peak_interior_speed.max(u[(r, c)].hypot(v[(r, c)]));
            }
        }

        let centre_idx = (rows / 2, cols / 2);

        RunSummary {
            mean_sweeps,
            peak_interior_speed,
            centre: (u[centre_idx], v[centre_idx], output.pressure[centre_idx]),
        }
    }
}

pub fn postprocess(sim_input: &SimulationInput, sim_output: &SimulationOutput) -> CavityResult<()> {
    let summary = RunSummary::from_output(sim_output);

    info!(
        "Run finished:\n\n\
        \t steps:             {} (through step {})\n\
        \t unconverged steps: {}\n\
        \t total sweeps:      {} ({:.1} per step)\n\
        \t peak speed:        {:.6}\n\
        \t centre (u, v, p):  ({:.6}, {:.6}, {:.6})\n\n\
        ",
        sim_output.steps_completed,
        sim_output.final_step,
        sim_output.unconverged_steps,
        sim_output.total_sweeps,
        summary.mean_sweeps,
        summary.peak_interior_speed,
        summary.centre.0,
        summary.centre.1,
        summary.centre.2,
    );

    if sim_output.diverged {
        warn!("The simulation diverged; the saved state is the last stable step");
    }

    let output = &sim_input.output;

    if let Some(path) = &output.snapshot_path {
        Snapshot::capture(
            &sim_output.velocity,
            &sim_output.pressure,
            sim_output.final_step,
        )
        .save(path)?;
        info!("Saved final state to {:?}", path);
    }

    if let Some(path) = &output.reference_path {
        let reference = Snapshot::load(path)?;

        if reference.steps != sim_output.final_step {
            warn!(
                "Reference {:?} was captured after {} steps, this run ended at step {}",
                path, reference.steps, sim_output.final_step
            );
        }

        let deviations = compare::compare_to_snapshot(
            &sim_output.velocity,
            &sim_output.pressure,
            &reference,
            output.reference_tolerance,
        )
        .inspect_err(|err| {
            if let CavityError::ReferenceMismatch { .. } = err {
                warn!("Final state does not match reference {:?}", path);
            }
        })?;

        for deviation in deviations {
            info!(
                "{} matches reference (max |Δ| = {:e})",
                deviation.field, deviation.max_abs_diff
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        preprocessing::OutputSettings,
        sim::{boundary::PressureBoundary, navier::Cavity, task::run_task, testing::grid_params},
    };

    fn short_run() -> SimulationOutput {
        let sim = Cavity::new(grid_params(11), PressureBoundary::cavity(), (11, 11), 20);
        run_task(sim, false)
    }

    #[test]
    fn test_summary() {
        let output = short_run();
        let summary = RunSummary::from_output(&output);

        assert!(summary.mean_sweeps >= 1.);
        assert!(summary.peak_interior_speed > 0.);
        assert!(summary.peak_interior_speed < 1.);
        assert_eq!(summary.centre.2, output.pressure[(5, 5)]);
    }

    #[test]
    fn test_snapshot_then_reference() {
        let output = short_run();
        let path = std::env::temp_dir().join(format!(
            "cavity-2d-postprocess-{}.json",
            std::process::id()
        ));

        let writing = SimulationInput {
            output: OutputSettings {
                snapshot_path: Some(path.clone()),
                ..OutputSettings::default()
            },
            ..SimulationInput::default()
        };
        let checking = SimulationInput {
            output: OutputSettings {
                reference_path: Some(path.clone()),
                ..OutputSettings::default()
            },
            ..SimulationInput::default()
        };

        let written = postprocess(&writing, &output);
        let matched = postprocess(&checking, &output);

        let mut drifted = short_run();
        drifted.pressure[(5, 5)] += 1.;
        let mismatched = postprocess(&checking, &drifted);

        _ = std::fs::remove_file(&path);

        assert!(written.is_ok());
        assert!(matched.is_ok());
        assert!(matches!(
            mismatched,
            Err(CavityError::ReferenceMismatch { field: "p", .. })
        ));
    }
}
