//! `aria daemon`: sensors, context monitoring and autonomous mode.

use aria_context::ContextMonitor;
use aria_sensors::ScriptedSensorSource;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::load_config;
use crate::runtime::Runtime;

const DEMO_PERIOD: Duration = Duration::from_secs(2);

pub async fn run(config_path: Option<&Path>, demo: bool) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = Runtime::build(load_config(config_path)?);
    let config = &runtime.config;
    let monitor_period = Duration::from_secs(config.context.monitor_interval_secs);

    println!("ARIA Daemon: starting");
    println!("   Backends: {}", runtime.reasoning.backend_ids().join(", "));
    println!("   Monitor:  every {}s", config.context.monitor_interval_secs);
    println!("   Analysis: every {}s", config.autonomy.analysis_interval_secs);

    runtime.sensors.start_collection().await;

    let monitor = ContextMonitor::new(runtime.context.clone(), monitor_period);
    monitor.start();

    runtime.orchestrator.register_background();
    runtime.orchestrator.start_autonomous_mode().await;

    let demo_token = CancellationToken::new();
    let demo_handle = demo.then(|| {
        info!("Demo sensor feed enabled");
        tokio::spawn(demo_feed(runtime.source.clone(), demo_token.clone()))
    });

    println!("\nARIA is running. Press Ctrl+C to stop.\n");
    tokio::signal::ctrl_c().await?;
    println!("\nShutting down...");

    demo_token.cancel();
    if let Some(handle) = demo_handle {
        let _ = handle.await;
    }

    runtime.orchestrator.stop_autonomous_mode().await;
    runtime.orchestrator.unregister_background();
    monitor.stop().await;
    runtime.sensors.stop_collection();

    let status = runtime.orchestrator.get_system_status();
    println!(
        "Tasks: {} active, {} pending, {} completed",
        status.active_tasks, status.pending_tasks, status.completed_tasks
    );
    println!("{}", runtime.context.get_context_summary());
    println!("Stopped.");

    Ok(())
}

/// Cycle through resting, walking and jogging, with the battery slowly draining.
async fn demo_feed(source: Arc<ScriptedSensorSource>, token: CancellationToken) {
    // Vertical-axis magnitudes: gravity plus the motion component.
    const PHASES: [(f64, &str); 3] = [(9.81, "resting"), (11.0, "walking"), (13.0, "jogging")];
    const SAMPLES_PER_PHASE: u64 = 15;

    let mut ticker = tokio::time::interval_at(Instant::now() + DEMO_PERIOD, DEMO_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut step: u64 = 0;
    let mut battery = 60.0_f64;

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let (z, label) = PHASES[((step / SAMPLES_PER_PHASE) % PHASES.len() as u64) as usize];
        if step % SAMPLES_PER_PHASE == 0 {
            info!(phase = label, "Demo motion phase");
        }
        source.emit_accelerometer(0.1, 0.2, z);
        source.emit_gyroscope(0.01, 0.0, 0.02);

        if step % 5 == 0 {
            battery = (battery - 1.0).max(5.0);
            source.emit_battery(battery);
        }
        debug!(step, battery, "Demo samples emitted");
        step += 1;
    }
}
