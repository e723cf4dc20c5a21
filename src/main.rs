//! Serial JSON Monitor - Main Entry Point
//!
//! Usage: `serial-json-monitor [CONFIG]`

use serial_json_monitor::{
    backend::{available_ports, SerialBackend},
    config::{resolve_config_path, AppConfig},
    frontend::MonitorApp,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> eframe::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,serial_json_monitor=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Serial JSON Monitor");

    let config_path = resolve_config_path(std::env::args().nth(1).map(PathBuf::from));
    let config = AppConfig::load_or_default(&config_path);
    tracing::debug!("Effective configuration: {:?}", config);
    tracing::debug!("Available serial ports: {:?}", available_ports());

    let (backend, frontend) = SerialBackend::new(config.serial.clone());
    let handle = backend.spawn();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 600.0])
            .with_min_inner_size([640.0, 400.0])
            .with_title("Serial JSON Monitor"),
        ..Default::default()
    };

    let result = eframe::run_native(
        "Serial JSON Monitor",
        native_options,
        Box::new(|_cc| Ok(Box::new(MonitorApp::new(config, frontend, Some(handle))))),
    );

    tracing::info!("Shutting down...");

    result
}
