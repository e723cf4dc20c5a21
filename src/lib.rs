//! # Serial JSON Monitor
//!
//! A desktop monitor for devices that stream newline-delimited JSON over a
//! serial port. Two-dimensional numeric arrays in each record are drawn as
//! tables colored by their deviation from the table mean; everything else is
//! shown as labeled fields. Text commands can be sent back over the same link.
//!
//! ## Architecture
//!
//! - **Backend**: Reads and frames lines from the serial port in a separate thread
//! - **Render**: Turns a decoded record into tables and fields, independent of the UI
//! - **Frontend**: Draws the latest record using eframe/egui
//! - **Communication**: A bounded crossbeam channel from the reader to the UI,
//!   and a shared write handle for commands going the other way
//!
//! ## Configuration
//!
//! Settings come from a YAML or TOML file. The path can be given as the first
//! command-line argument; otherwise `config.yaml` in the working directory is
//! used, falling back to the platform config directory:
//!
//! - **Linux**: `~/.config/serial-json-monitor/config.yaml`
//! - **macOS**: `~/Library/Application Support/serial-json-monitor/config.yaml`
//! - **Windows**: `%APPDATA%\serial-json-monitor\config.yaml`
//!
//! ## Example
//!
//! ```ignore
//! use serial_json_monitor::{
//!     backend::SerialBackend,
//!     config::{resolve_config_path, AppConfig},
//!     frontend::MonitorApp,
//! };
//!
//! fn main() -> eframe::Result<()> {
//!     let config = AppConfig::load_or_default(resolve_config_path(None));
//!     let (backend, frontend) = SerialBackend::new(config.serial.clone());
//!     let handle = backend.spawn();
//!
//!     eframe::run_native(
//!         "Serial JSON Monitor",
//!         eframe::NativeOptions::default(),
//!         Box::new(|_cc| Ok(Box::new(MonitorApp::new(config, frontend, Some(handle))))),
//!     )
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod frontend;
pub mod render;
pub mod types;

// Re-export commonly used types
pub use backend::{BackendMessage, SerialBackend};
pub use config::AppConfig;
pub use error::{MonitorError, Result};
pub use frontend::MonitorApp;
pub use render::{RenderPipeline, RenderedView};
pub use types::{ConnectionStatus, LinkStats, Record};
