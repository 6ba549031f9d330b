use std::io::Write;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use env_logger::Builder;
use log::{error, info, warn, LevelFilter};

use macflow::{config, SimResult, Simulator};

/// Log level from `RUST_LOG`, defaulting to info.
fn init_logging() {
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);
    Builder::new()
        .filter_level(level)
        .format(|buf, record| writeln!(buf, "[{:5} {}] {}", record.level(), record.target(), record.args()))
        .init();
}

/// First positional argument is an optional config path.
fn config_path() -> Option<String> {
    std::env::args().nth(1)
}

fn run() -> SimResult<()> {
    let cfg = match config_path() {
        Some(path) => {
            info!("loading config from {}", path);
            config::load_from(&path)?
        }
        None => config::load(),
    };
    let mut sim = Simulator::new(cfg)?;
    info!(
        "{}x{} grid, Re={:.1}, running to t={}",
        sim.config().width,
        sim.config().height,
        sim.reynolds_number(),
        sim.config().max_simulation_time
    );

    // Ctrl+C stops the run after the current step
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || r.store(false, Ordering::SeqCst)) {
        warn!("could not install Ctrl+C handler: {}", e);
    }

    sim.start();
    while sim.is_running() {
        if !running.load(Ordering::SeqCst) {
            sim.stop();
            break;
        }
        sim.step()?;
    }

    let state = sim.state();
    info!(
        "done: t={:.3} steps={} div_rms={:.3e} max|u|={:.4} max|w|={:.4}",
        state.time, state.step_count, state.avg_divergence, state.max_velocity, state.max_vorticity
    );
    Ok(())
}

fn main() -> ExitCode {
    init_logging();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
