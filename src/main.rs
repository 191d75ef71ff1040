// src/main.rs

use anyhow::Result;
use onroad_ui::params::MemoryParams;
use onroad_ui::pipeline::{EventBus, ReplayLog, UiEvent};
use onroad_ui::{Config, Device, LoggingHardware, UiState};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load("config.yaml")?;

    tracing_subscriber::fmt()
        .with_env_filter(config.log_filter())
        .init();

    info!("🚗 Onroad UI starting");
    info!(
        "✓ Configuration loaded: {} Hz, frame {}x{}",
        config.ui.freq, config.ui.frame_width, config.ui.frame_height
    );

    let params = seed_params(config.params.persistent_seed.as_deref())?;
    let params_memory = seed_params(config.params.memory_seed.as_deref())?;
    info!(
        "✓ Params seeded ({} persistent, {} memory)",
        params.len(),
        params_memory.len()
    );

    let Some(log_path) = config.replay.log_path.as_deref() else {
        error!("No replay log configured (replay.log_path)");
        return Ok(());
    };
    let mut replay = ReplayLog::load(log_path)?;

    let mut ui = UiState::new(&config.ui, Box::new(params), Box::new(params_memory));
    let mut device = Device::new(
        Arc::new(LoggingHardware),
        config.device.offroad_brightness,
        config.ui.freq,
    );
    let mut bus = EventBus::default();

    let mut ticker = tokio::time::interval(config.tick_period());
    let mut stats = RunStats::default();

    while !replay.is_exhausted() {
        ticker.tick().await;

        let incoming = replay.due(ui.frame() + 1);
        stats.messages += incoming.len();
        ui.tick(incoming, &mut bus);

        for event in bus.drain() {
            if let UiEvent::UiUpdate { frame, scene } = &event {
                device.update(scene, &mut bus);
                debug!(
                    "Frame {}: status={:?} track={} pts leads={:?}",
                    frame,
                    ui.status(),
                    scene.track_vertices.len(),
                    scene.lead_vertices
                );
            } else {
                log_event(&event, &mut stats);
            }
        }
        // raised by the device while handling the update
        for event in bus.drain() {
            log_event(&event, &mut stats);
        }
    }

    device.flush().await;

    let scene = ui.scene();
    info!("\n✓ Replay finished");
    info!("  Ticks: {}", ui.frame());
    info!("  Messages delivered: {}", stats.messages);
    info!("  Offroad transitions: {}", stats.transitions);
    info!("  Final status: {:?}", ui.status());
    info!(
        "  Started: {} (since frame {}), calibrated: {}",
        scene.started, scene.started_frame, scene.calibration_valid
    );
    info!("  Backlight: {}%", device.last_brightness());

    Ok(())
}

#[derive(Default)]
struct RunStats {
    messages: usize,
    transitions: usize,
}

fn log_event(event: &UiEvent, stats: &mut RunStats) {
    match event {
        UiEvent::OffroadTransition(offroad) => {
            stats.transitions += 1;
            info!("🛣️  {}", if *offroad { "Offroad" } else { "Onroad" });
        }
        UiEvent::DisplayPowerChanged(on) => {
            info!("💡 Display {}", if *on { "awake" } else { "asleep" });
        }
        UiEvent::InteractiveTimeout => info!("⏱️  Interactive timeout"),
        UiEvent::UiUpdate { frame, .. } => warn!("Stray ui update for frame {}", frame),
    }
}

fn seed_params(path: Option<&str>) -> Result<MemoryParams> {
    match path {
        Some(path) => MemoryParams::from_yaml_file(path),
        None => Ok(MemoryParams::new()),
    }
}
