// Task runner for the solver thread

use std::thread::{self, JoinHandle};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use crate::{ScalarField, VectorField, sim::navier::Cavity};

pub struct SimulationOutput {
    /// Final velocity field
    pub velocity: VectorField,

    /// Final pressure field
    pub pressure: ScalarField,

    /// Absolute index of the last step taken
    pub final_step: usize,

    /// Steps taken by this run
    pub steps_completed: usize,

    /// Steps whose pressure solve stopped at the sweep cap
    pub unconverged_steps: usize,

    /// Relaxation sweeps summed over all steps
    pub total_sweeps: usize,

    /// Whether the run was stopped by the blow-up guard
    pub diverged: bool,
}

/// Step the cavity to completion, collecting solver statistics
pub fn run_task(mut sim: Cavity, show_progress: bool) -> SimulationOutput {
    let bar = if show_progress {
        ProgressBar::new(sim.remaining() as u64)
    } else {
        ProgressBar::hidden()
    };
    bar.set_style(
        ProgressStyle::with_template(
            "[Elapsed: {elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} steps (Remaining: {eta_precise})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-"),
    );

    let mut steps_completed = 0;
    let mut unconverged_steps = 0;
    let mut total_sweeps = 0;

    for report in sim.by_ref() {
        steps_completed += 1;
        total_sweeps += report.poisson.sweeps;

        if !report.poisson.converged() {
            unconverged_steps += 1;
        }

        bar.inc(1);
    }

    bar.finish_and_clear();

    if unconverged_steps > 0 {
        warn!(
            "Pressure relaxation reached the sweep cap in {} of {} steps",
            unconverged_steps, steps_completed
        );
    }

    let final_step = sim.current_step();
    let diverged = sim.diverged();
    let (velocity, pressure) = sim.into_fields();

    SimulationOutput {
        velocity,
        pressure,
        final_step,
        steps_completed,
        unconverged_steps,
        total_sweeps,
        diverged,
    }
}

/// Spawns the simulation thread and starts the corresponding task
pub fn spawn_sim_thread(sim: Cavity, show_progress: bool) -> JoinHandle<SimulationOutput> {
    thread::spawn(move || run_task(sim, show_progress))
}
