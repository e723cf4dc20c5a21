//! Panel components for the frontend UI
//!
//! Each panel draws one part of the monitor window from already-computed
//! state and reports user actions through its return value.
//!
//! # Panels
//!
//! - [`TablesPanel`] - Heatmap tables, one grid per matrix in the record
//! - [`FieldsPanel`] - Labeled scalar fields from the rest of the record
//! - [`CommandPanel`] - Command entry, quick-command buttons and history

use crate::config::QuickCommand;
use crate::frontend::history::CommandHistory;
use crate::render::{Band, CellShade, FieldLine, Heatmap, TableCell, TableView};
use egui::{Color32, RichText, Ui};

/// Horizontal indent per nesting level in the fields panel
const FIELD_INDENT: f32 = 14.0;

/// Hover text for a colored cell
pub fn shade_tooltip(shade: &CellShade, heatmap: Option<&Heatmap>) -> String {
    let band = match shade.band {
        Band::Within => "within",
        Band::Beyond => "beyond",
    };
    match heatmap {
        Some(heatmap) => format!(
            "Deviation: {:.2}% ({} ±{:.2}%)\nMean: {}",
            shade.deviation * 100.0,
            band,
            heatmap.max_deviation() * 100.0,
            heatmap.mean()
        ),
        None => format!("Deviation: {:.2}% ({})", shade.deviation * 100.0, band),
    }
}

/// Renders every table of the current record
pub struct TablesPanel;

impl TablesPanel {
    pub fn render(ui: &mut Ui, tables: &[TableView]) {
        if tables.is_empty() {
            ui.label(RichText::new("No tables in the latest record").weak());
            return;
        }

        for (index, table) in tables.iter().enumerate() {
            Self::render_table(ui, index, table);
            ui.add_space(12.0);
        }
    }

    /// Grid id for the table at `index`; labels can repeat across nesting levels
    pub fn grid_id(index: usize) -> egui::Id {
        egui::Id::new(("heatmap_table", index))
    }

    fn render_table(ui: &mut Ui, index: usize, table: &TableView) {
        ui.horizontal(|ui| {
            ui.label(RichText::new(&table.label).strong().size(15.0));
            ui.label(
                RichText::new(format!("{}×{}", table.row_count(), table.columns))
                    .small()
                    .weak(),
            );
            if let Some(heatmap) = &table.heatmap {
                ui.label(
                    RichText::new(format!(
                        "mean {:.4}, ±{:.2}%",
                        heatmap.mean(),
                        heatmap.max_deviation() * 100.0
                    ))
                    .small()
                    .weak(),
                );
            }
        });

        egui::Grid::new(Self::grid_id(index))
            .num_columns(table.columns + 1)
            .spacing([4.0, 2.0])
            .show(ui, |ui| {
                // Column headers, 1-based
                ui.label("");
                for col in 1..=table.columns {
                    ui.label(RichText::new(col.to_string()).strong());
                }
                ui.end_row();

                for (row_index, row) in table.rows.iter().enumerate() {
                    ui.label(RichText::new((row_index + 1).to_string()).strong());
                    for cell in row {
                        Self::render_cell(ui, cell, table.heatmap.as_ref());
                    }
                    ui.end_row();
                }
            });
    }

    fn render_cell(ui: &mut Ui, cell: &TableCell, heatmap: Option<&Heatmap>) {
        match &cell.shade {
            Some(shade) => {
                egui::Frame::new()
                    .fill(shade.fill)
                    .inner_margin(egui::Margin::symmetric(6, 2))
                    .show(ui, |ui| {
                        ui.label(
                            RichText::new(&cell.text)
                                .monospace()
                                .color(Color32::BLACK),
                        );
                    })
                    .response
                    .on_hover_text(shade_tooltip(shade, heatmap));
            }
            None => {
                egui::Frame::new()
                    .inner_margin(egui::Margin::symmetric(6, 2))
                    .show(ui, |ui| {
                        ui.label(RichText::new(&cell.text).monospace());
                    });
            }
        }
    }
}

/// Renders the non-table part of the record
pub struct FieldsPanel;

impl FieldsPanel {
    pub fn render(ui: &mut Ui, fields: &[FieldLine]) {
        if fields.is_empty() {
            ui.label(RichText::new("No fields").weak());
            return;
        }

        for line in fields {
            match line {
                FieldLine::Group { key, depth } => {
                    ui.horizontal(|ui| {
                        ui.add_space(*depth as f32 * FIELD_INDENT);
                        ui.label(RichText::new(key).strong().underline());
                    });
                }
                FieldLine::Field { key, value, depth } => {
                    ui.horizontal_wrapped(|ui| {
                        ui.add_space(*depth as f32 * FIELD_INDENT);
                        if let Some(key) = key {
                            ui.label(RichText::new(format!("{}:", key)).strong());
                        }
                        ui.label(RichText::new(value).monospace());
                    });
                }
            }
        }
    }
}

/// Command entry, quick commands and history
pub struct CommandPanel;

impl CommandPanel {
    /// Render the panel
    ///
    /// Returns the command the user asked to send, if any. Text typed into
    /// `input` is taken out of it when sent.
    pub fn render(
        ui: &mut Ui,
        input: &mut String,
        quick_commands: &[QuickCommand],
        history: &CommandHistory,
        connected: bool,
    ) -> Option<String> {
        let mut to_send = None;

        ui.heading("Commands");
        if !connected {
            ui.label(RichText::new("Port not open, commands are discarded").small().weak());
        }
        ui.add_space(4.0);

        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(input)
                    .desired_width(ui.available_width() - 60.0)
                    .hint_text("Type a command"),
            );
            let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if (ui.button("Send").clicked() || enter) && !input.trim().is_empty() {
                to_send = Some(std::mem::take(input));
                response.request_focus();
            }
        });

        ui.separator();
        ui.label(RichText::new("Quick commands").strong());

        if quick_commands.is_empty() {
            ui.label(RichText::new("No quick commands configured.").weak());
        } else {
            egui::Grid::new("quick_commands")
                .num_columns(2)
                .spacing([6.0, 6.0])
                .show(ui, |ui| {
                    for (index, command) in quick_commands.iter().enumerate() {
                        if ui
                            .button(&command.name)
                            .on_hover_text(&command.value)
                            .clicked()
                        {
                            to_send = Some(command.value.clone());
                        }
                        if index % 2 == 1 {
                            ui.end_row();
                        }
                    }
                });
        }

        ui.separator();
        ui.label(RichText::new(format!("History ({})", history.len())).strong());

        egui::ScrollArea::vertical()
            .id_salt("command_history")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for entry in history.recent() {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(entry.time_label()).small().weak());
                        if entry.delivered {
                            ui.label(RichText::new(&entry.command).monospace());
                        } else {
                            ui.label(
                                RichText::new(&entry.command)
                                    .monospace()
                                    .color(Color32::GRAY)
                                    .strikethrough(),
                            )
                            .on_hover_text("Not sent: port not open");
                        }
                    });
                }
            });

        to_send
    }
}
