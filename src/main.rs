use std::process::exit;

use cavity_2d::{
    error::{CavityError, CavityResult},
    postprocessing,
    preprocessing::{SimulationInput, cli::CliArgs},
    sim::task,
};
use clap::Parser;
use tracing::{Level, error};

fn main() {
    let args = CliArgs::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .init();

    let simulation_input = args.build_input().unwrap_or_else(|err| fail(err));
    simulation_input.log();

    args.save_input(&simulation_input).unwrap_or_else(|err| fail(err));

    if let Err(err) = run(&simulation_input) {
        fail(err);
    }
}

fn run(simulation_input: &SimulationInput) -> CavityResult<()> {
    let sim = simulation_input.build_simulation()?;

    let sim_thread = task::spawn_sim_thread(sim, simulation_input.output.show_progress);
    let sim_output = sim_thread.join().unwrap_or_else(|_| {
        error!("The solver thread panicked");
        exit(1);
    });

    postprocessing::postprocess(simulation_input, &sim_output)
}

fn fail(err: CavityError) -> ! {
    error!("{err}");
    exit(1);
}
