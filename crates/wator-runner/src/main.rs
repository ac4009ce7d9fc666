//! Headless runner for the Wa-Tor simulation.
//!
//! Usage: `wator-runner [config.json]`. Without a file the built-in defaults
//! are used. The run stops after `num_ticks` ticks, or between two ticks on
//! Ctrl+C / SIGTERM.

mod telemetry;

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::signal;
use tracing::{event, info, Level};
use wator_core::RunnerConfig;
use wator_world::{Simulation, SimulationSummary};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = match std::env::args().nth(1) {
        Some(path) => RunnerConfig::from_path(&path)
            .with_context(|| format!("failed to load configuration from {path}"))?,
        None => RunnerConfig::default(),
    };

    telemetry::init_telemetry(config.json_logs)?;

    info!(
        grid_size = config.sim.grid_size,
        bands = config.sim.worker_bands,
        seed = config.sim.seed,
        num_ticks = ?config.num_ticks,
        "Starting Wa-Tor runner"
    );

    let simulation = Simulation::new(config.sim.clone())?
        .with_metrics_interval(config.metrics_interval_ticks);

    let stop = Arc::new(AtomicBool::new(false));
    let mut handle = tokio::task::spawn_blocking({
        let stop = stop.clone();
        let config = config.clone();
        move || run_ticks(simulation, &config, &stop)
    });

    let summary = tokio::select! {
        joined = &mut handle => joined??,
        _ = shutdown_signal() => {
            stop.store(true, Ordering::Relaxed);
            handle.await??
        }
    };

    info!(
        event = "final_summary",
        summary = %serde_json::to_string(&summary)?,
        "Simulation finished"
    );

    Ok(())
}

/// Drive the simulation until the tick limit or until `stop` is raised,
/// sampling throughput every `report_interval_ms`.
fn run_ticks(
    mut simulation: Simulation,
    config: &RunnerConfig,
    stop: &AtomicBool,
) -> wator_core::Result<SimulationSummary> {
    let interval = Duration::from_millis(config.report_interval_ms.max(1));
    let mut window_start = Instant::now();
    let mut window_ticks = 0u64;

    while !stop.load(Ordering::Relaxed)
        && config.num_ticks.map_or(true, |limit| simulation.tick() < limit)
    {
        simulation.step()?;
        window_ticks += 1;

        let elapsed = window_start.elapsed();
        if elapsed >= interval {
            event!(
                Level::INFO,
                gauge_name = "ticks_per_second",
                gauge_value = window_ticks as f64 / elapsed.as_secs_f64(),
                tick = simulation.tick(),
                bands = config.sim.worker_bands,
                "Throughput"
            );
            window_start = Instant::now();
            window_ticks = 0;
        }
    }

    Ok(simulation.summary())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping after the current tick");
}
