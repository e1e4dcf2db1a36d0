use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Parser;

use hopper::control::{ControlProvider, ControlSequence};
use hopper_physics::{HopperSim, SimConfig};

#[derive(Parser)]
#[command(name = "hopper-sim", about = "Run the biped hopper headless")]
struct Cli {
    /// Simulated seconds to run
    #[arg(long, default_value_t = 5.0)]
    duration: f32,

    /// Simulation settings (JSON); defaults apply to missing fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Control sequence: JSON array of per-hop control parameters
    #[arg(long)]
    controls: Option<PathBuf>,

    /// Write the final avatar state as JSON here
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Seconds between progress reports
    #[arg(long, default_value_t = 0.5)]
    report_every: f32,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    let controls = match &cli.controls {
        Some(path) => ControlSequence::from_json(&fs::read_to_string(path)?)?,
        None => ControlSequence::default(),
    };

    let mut sim = HopperSim::new(config, controls)?;

    let report_steps = ((cli.report_every / sim.world().dt()).round() as u64).max(1);
    let total_steps = (cli.duration / sim.world().dt()).round().max(0.0) as u64;
    for _ in 0..total_steps {
        sim.step();
        if sim.steps() % report_steps == 0 {
            let state = sim.controller().state();
            log::info!(
                "t={:.3} {} active leg {} control {} apex {:.3}",
                sim.time(),
                state.control_state(),
                state.active_leg(),
                sim.controller().provider().current_index(),
                state.last_hop_amplitude()
            );
        }
    }

    let snapshot = sim.avatar_state();
    println!(
        "t={:.3} state={} position=({:.3}, {:.3}) pitch={:.3}",
        sim.time(),
        snapshot.control_state,
        snapshot.position[0],
        snapshot.position[1],
        snapshot.pitch
    );

    if let Some(path) = &cli.snapshot {
        fs::write(path, snapshot.to_json()?)?;
        log::info!("wrote snapshot to {}", path.display());
    }

    Ok(())
}
