//! Status bar panel: bottom bar showing the device, link counters and errors.

use egui::{Color32, RichText, Ui};

use crate::types::{ConnectionStatus, LinkStats};

/// Context needed to render the status bar.
pub struct StatusBarContext<'a> {
    pub device: &'a str,
    pub baud_rate: u32,
    pub status: ConnectionStatus,
    pub stats: &'a LinkStats,
    pub render_count: u64,
    pub last_error: Option<&'a str>,
}

/// Color and label for a connection status
pub fn status_style(status: ConnectionStatus) -> (Color32, &'static str) {
    match status {
        ConnectionStatus::Connected => (Color32::GREEN, "Connected"),
        ConnectionStatus::Connecting => (Color32::YELLOW, "Connecting"),
        ConnectionStatus::Disconnected => (Color32::GRAY, "Disconnected"),
        ConnectionStatus::Error => (Color32::RED, "Error"),
    }
}

/// Hover text for the record counter
pub fn records_tooltip(stats: &LinkStats) -> String {
    format!(
        "{} lines received, {:.1}% decoded",
        stats.lines_received,
        stats.decode_rate()
    )
}

/// Render the status bar.
pub fn render_status_bar(ui: &mut Ui, ctx: &StatusBarContext<'_>) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        // === Connection status dot + device ===
        let (status_color, status_text) = status_style(ctx.status);
        ui.colored_label(status_color, "●");
        ui.label(
            RichText::new(format!(
                "{}: {} @ {} baud",
                status_text, ctx.device, ctx.baud_rate
            ))
            .small(),
        );

        ui.separator();

        let stats = ctx.stats;

        // === Records ===
        ui.label(RichText::new(format!("Records: {}", stats.records_emitted)).small())
            .on_hover_text(records_tooltip(stats));

        ui.separator();

        // === Rejected lines ===
        let rejected_color = if stats.lines_rejected > 0 {
            Color32::YELLOW
        } else {
            Color32::GRAY
        };
        ui.colored_label(
            rejected_color,
            RichText::new(format!("Rejected: {}", stats.lines_rejected)).small(),
        );

        ui.separator();

        // === Dropped + read errors ===
        let error_count = stats.records_dropped + stats.read_errors;
        let error_color = if error_count > 0 {
            Color32::LIGHT_RED
        } else {
            Color32::GRAY
        };
        ui.colored_label(
            error_color,
            RichText::new(format!(
                "Dropped: {}  Read errors: {}",
                stats.records_dropped, stats.read_errors
            ))
            .small(),
        );

        ui.separator();

        ui.label(RichText::new(format!("Renders: {}", ctx.render_count)).small());

        // === Error message (right-aligned) ===
        if let Some(error) = ctx.last_error {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.colored_label(Color32::RED, RichText::new(error).small());
            });
        }
    });
}
