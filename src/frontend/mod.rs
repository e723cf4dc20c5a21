//! Frontend module for the egui-based UI
//!
//! [`MonitorApp`] owns the UI side of the backend, drains its messages once
//! per frame and draws the latest record through the render pipeline.
//!
//! # Layout
//!
//! - Central area: heatmap tables ([`TablesPanel`])
//! - Right: fields of the record ([`FieldsPanel`]) and command entry ([`CommandPanel`])
//! - Bottom: status bar ([`status_bar::render_status_bar`])

pub mod history;
pub mod panels;
pub mod status_bar;

pub use history::{CommandHistory, HistoryEntry};
pub use panels::{CommandPanel, FieldsPanel, TablesPanel};

use crate::backend::{self, BackendHandle, BackendMessage, FrontendReceiver};
use crate::config::{AppConfig, QuickCommand, SerialConfig};
use crate::render::RenderPipeline;
use crate::types::{ConnectionStatus, LinkStats};
use std::time::Duration;
use status_bar::StatusBarContext;

/// Repaint interval while idle, so new records show up without input events
const REPAINT_INTERVAL: Duration = Duration::from_millis(50);

/// Main application state
pub struct MonitorApp {
    frontend: FrontendReceiver,
    backend: Option<BackendHandle>,
    serial: SerialConfig,
    pipeline: RenderPipeline,
    quick_commands: Vec<QuickCommand>,
    command_input: String,
    history: CommandHistory,
    connection_status: ConnectionStatus,
    link_stats: LinkStats,
    last_error: Option<String>,
}

impl MonitorApp {
    pub fn new(config: AppConfig, frontend: FrontendReceiver, backend: Option<BackendHandle>) -> Self {
        Self {
            pipeline: RenderPipeline::from_config(&config),
            frontend,
            backend,
            serial: config.serial,
            quick_commands: config.buttons,
            command_input: String::new(),
            history: CommandHistory::new(),
            connection_status: ConnectionStatus::Disconnected,
            link_stats: LinkStats::default(),
            last_error: None,
        }
    }

    /// Apply every pending backend message; returns whether there were any
    pub fn process_backend_messages(&mut self) -> bool {
        let messages = self.frontend.drain();
        let had_messages = !messages.is_empty();

        for msg in messages {
            match msg {
                BackendMessage::ConnectionStatus(status) => {
                    self.connection_status = status;
                    if status == ConnectionStatus::Connected {
                        self.last_error = None;
                    }
                }
                BackendMessage::ConnectionError(err) => {
                    self.last_error = Some(err);
                    self.connection_status = ConnectionStatus::Error;
                }
                BackendMessage::Record(record) => {
                    if self.pipeline.display(record) {
                        tracing::trace!("Rendered record #{}", self.pipeline.render_count());
                    }
                }
                BackendMessage::Stats(stats) => {
                    self.link_stats = stats;
                }
            }
        }

        had_messages
    }

    /// Send one command line to the device
    ///
    /// Surrounding whitespace is trimmed and empty commands are ignored. The
    /// command is logged in the history whether or not the port is open.
    pub fn send_command(&mut self, command: &str) -> bool {
        let command = command.trim();
        if command.is_empty() {
            return false;
        }
        let delivered = self.frontend.send_command(command);
        if !delivered {
            tracing::debug!("Command '{}' discarded, port not open", command);
        }
        self.history.push(command, delivered);
        delivered
    }

    /// Stop the reader and wait for it, bounded by the backend's shutdown timeout
    pub fn shutdown(&mut self) {
        match self.backend.take() {
            Some(handle) => {
                if backend::shutdown(&self.frontend, handle) {
                    tracing::info!("Serial reader stopped");
                }
            }
            None => self.frontend.stop(),
        }
    }

    pub fn pipeline(&self) -> &RenderPipeline {
        &self.pipeline
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.connection_status
    }

    pub fn link_stats(&self) -> &LinkStats {
        &self.link_stats
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn quick_commands(&self) -> &[QuickCommand] {
        &self.quick_commands
    }
}

impl eframe::App for MonitorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.process_backend_messages() {
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(REPAINT_INTERVAL);
        }

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            status_bar::render_status_bar(
                ui,
                &StatusBarContext {
                    device: &self.serial.port,
                    baud_rate: self.serial.baud_rate,
                    status: self.connection_status,
                    stats: &self.link_stats,
                    render_count: self.pipeline.render_count(),
                    last_error: self.last_error.as_deref(),
                },
            );
        });

        let mut to_send = None;
        egui::SidePanel::right("commands")
            .default_width(300.0)
            .resizable(true)
            .show(ctx, |ui| {
                to_send = CommandPanel::render(
                    ui,
                    &mut self.command_input,
                    &self.quick_commands,
                    &self.history,
                    self.frontend.commands.is_open(),
                );
            });
        if let Some(command) = to_send {
            self.send_command(&command);
        }

        egui::SidePanel::right("fields")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                ui.heading("Fields");
                ui.separator();
                egui::ScrollArea::vertical()
                    .id_salt("fields_scroll")
                    .show(ui, |ui| {
                        FieldsPanel::render(ui, &self.pipeline.view().fields);
                    });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::both()
                .id_salt("tables_scroll")
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    TablesPanel::render(ui, &self.pipeline.view().tables);
                });
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.shutdown();
    }
}
