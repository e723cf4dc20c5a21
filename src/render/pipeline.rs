//! Record-to-view pipeline
//!
//! [`RenderPipeline::display`] turns a decoded record into a [`RenderedView`]:
//! labeled heatmap tables for every matrix found under an object key, and a
//! companion list of field lines for everything else. The view is rebuilt from
//! scratch for each new record and left untouched when the record is equal to
//! the previous one.

use super::format::format_value;
use super::heatmap::{CellShade, Heatmap, HeatmapRules};
use super::matrix::Matrix;
use crate::config::AppConfig;
use serde_json::Value;

/// One rendered table cell
#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    /// Display text
    pub text: String,
    /// Heatmap coloring, if the table is colored and the cell is numeric
    pub shade: Option<CellShade>,
}

/// A labeled matrix ready for drawing
#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    /// The object key the matrix was found under
    pub label: String,
    pub columns: usize,
    pub rows: Vec<Vec<TableCell>>,
    /// Heatmap used for this table, if any
    pub heatmap: Option<Heatmap>,
}

impl TableView {
    fn build(label: &str, matrix: &Matrix<'_>, precision: usize, rules: &HeatmapRules) -> Self {
        let heatmap = rules
            .resolve(label)
            .and_then(|max_deviation| Heatmap::for_matrix(matrix, max_deviation));

        let rows = matrix
            .rows()
            .map(|row| {
                row.iter()
                    .map(|cell| TableCell {
                        text: format_value(cell, precision),
                        shade: heatmap.as_ref().and_then(|h| h.shade_cell(cell)),
                    })
                    .collect()
            })
            .collect();

        Self {
            label: label.to_string(),
            columns: matrix.column_count(),
            rows,
            heatmap,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of cells that received a color
    pub fn shaded_cells(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|c| c.shade.is_some())
            .count()
    }
}

/// One line of the companion (non-table) view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldLine {
    /// Heading for a nested object or array
    Group { key: String, depth: usize },
    /// A scalar, with its key when it came from an object
    Field {
        key: Option<String>,
        value: String,
        depth: usize,
    },
}

/// Everything drawn for one record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedView {
    pub tables: Vec<TableView>,
    pub fields: Vec<FieldLine>,
}

impl RenderedView {
    /// Build the view for a record
    pub fn build(record: &Value, precision: usize, rules: &HeatmapRules) -> Self {
        let mut view = Self::default();
        let mut walker = Walker {
            precision,
            rules,
            view: &mut view,
        };
        walker.visit(record, 0);
        view
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.fields.is_empty()
    }

    pub fn table(&self, label: &str) -> Option<&TableView> {
        self.tables.iter().find(|t| t.label == label)
    }
}

struct Walker<'a> {
    precision: usize,
    rules: &'a HeatmapRules,
    view: &'a mut RenderedView,
}

impl Walker<'_> {
    fn visit(&mut self, value: &Value, depth: usize) {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    if let Some(matrix) = Matrix::classify(child) {
                        self.view.tables.push(TableView::build(
                            key,
                            &matrix,
                            self.precision,
                            self.rules,
                        ));
                    } else if child.is_object() || child.is_array() {
                        self.view.fields.push(FieldLine::Group {
                            key: key.clone(),
                            depth,
                        });
                        self.visit(child, depth + 1);
                    } else {
                        self.view.fields.push(FieldLine::Field {
                            key: Some(key.clone()),
                            value: format_value(child, self.precision),
                            depth,
                        });
                    }
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.visit(item, depth);
                }
            }
            scalar => self.view.fields.push(FieldLine::Field {
                key: None,
                value: format_value(scalar, self.precision),
                depth,
            }),
        }
    }
}

/// Owns the current view and the last record it was built from
#[derive(Debug, Clone)]
pub struct RenderPipeline {
    precision: usize,
    rules: HeatmapRules,
    last_rendered: Option<Value>,
    view: RenderedView,
    renders: u64,
}

impl RenderPipeline {
    pub fn new(precision: usize, rules: HeatmapRules) -> Self {
        Self {
            precision,
            rules,
            last_rendered: None,
            view: RenderedView::default(),
            renders: 0,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.display.precision, config.heatmap_rules())
    }

    /// Show a record
    ///
    /// Returns `false` without touching the view when the record equals the
    /// last one displayed.
    pub fn display(&mut self, record: Value) -> bool {
        if self.last_rendered.as_ref() == Some(&record) {
            tracing::trace!("Record unchanged, skipping render");
            return false;
        }

        self.view = RenderedView::build(&record, self.precision, &self.rules);
        self.last_rendered = Some(record);
        self.renders += 1;
        true
    }

    pub fn view(&self) -> &RenderedView {
        &self.view
    }

    pub fn last_rendered(&self) -> Option<&Value> {
        self.last_rendered.as_ref()
    }

    /// Number of full rebuilds performed
    pub fn render_count(&self) -> u64 {
        self.renders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::heatmap::{Band, HeatmapRule};
    use serde_json::json;

    #[test]
    fn test_matrix_becomes_table_and_is_not_a_field() {
        let record = json!({ "cells": [[1, 2], [3, 4]], "mode": "run" });
        let view = RenderedView::build(&record, 3, &HeatmapRules::uniform(0.1));

        assert_eq!(view.tables.len(), 1);
        assert_eq!(view.tables[0].label, "cells");
        assert_eq!(view.tables[0].columns, 2);
        assert_eq!(
            view.fields,
            vec![FieldLine::Field {
                key: Some("mode".into()),
                value: "run".into(),
                depth: 0
            }]
        );
    }

    #[test]
    fn test_key_order_is_preserved() {
        let record: Value = serde_json::from_str(r#"{"z": 1, "a": 2, "m": 3}"#).unwrap();
        let view = RenderedView::build(&record, 3, &HeatmapRules::disabled());
        let keys: Vec<_> = view
            .fields
            .iter()
            .filter_map(|f| match f {
                FieldLine::Field { key, .. } => key.clone(),
                FieldLine::Group { .. } => None,
            })
            .collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_nested_objects_are_traversed() {
        let record = json!({
            "battery": { "voltages": [[3.7, 3.8]], "temp": 25.5 },
            "samples": [ { "grid": [[1]] }, 7 ],
        });
        let view = RenderedView::build(&record, 1, &HeatmapRules::disabled());

        let labels: Vec<_> = view.tables.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["voltages", "grid"]);
        assert_eq!(
            view.fields,
            vec![
                FieldLine::Group { key: "battery".into(), depth: 0 },
                FieldLine::Field { key: Some("temp".into()), value: "25.5".into(), depth: 1 },
                FieldLine::Group { key: "samples".into(), depth: 0 },
                FieldLine::Field { key: None, value: "7".into(), depth: 1 },
            ]
        );
    }

    #[test]
    fn test_top_level_array_is_not_a_table() {
        let record = json!([[1, 2], [3, 4]]);
        let view = RenderedView::build(&record, 3, &HeatmapRules::uniform(0.1));
        assert!(view.tables.is_empty());
        assert_eq!(view.fields.len(), 4);
    }

    #[test]
    fn test_cells_are_formatted_with_precision() {
        let record = json!({ "t": [[3.14000, 5.0, "x"]] });
        let view = RenderedView::build(&record, 3, &HeatmapRules::disabled());
        let texts: Vec<_> = view.tables[0].rows[0].iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["3.14", "5", "x"]);
    }

    #[test]
    fn test_rule_precedence_in_view() {
        let record = json!({ "A": [[1, 2]], "B": [[1, 2]] });

        let only_a = HeatmapRules::per_table([HeatmapRule::for_table("A", 0.1)]);
        let view = RenderedView::build(&record, 3, &only_a);
        assert!(view.table("A").unwrap().heatmap.is_some());
        assert!(view.table("B").unwrap().heatmap.is_none());
        assert_eq!(view.table("B").unwrap().shaded_cells(), 0);

        let view = RenderedView::build(&record, 3, &HeatmapRules::uniform(0.2));
        let b = view.table("B").unwrap();
        assert_eq!(b.heatmap.map(|h| h.max_deviation()), Some(0.2));
        assert_eq!(b.shaded_cells(), 2);
    }

    #[test]
    fn test_degenerate_tables_render_uncolored() {
        let record = json!({
            "zero": [[1, -1]],
            "text": [["a", "b"]],
            "empty": [[], []],
        });
        let view = RenderedView::build(&record, 3, &HeatmapRules::uniform(0.1));
        assert_eq!(view.tables.len(), 3);
        for table in &view.tables {
            assert!(table.heatmap.is_none(), "{} should be uncolored", table.label);
            assert_eq!(table.shaded_cells(), 0);
        }
    }

    #[test]
    fn test_end_to_end_shading() {
        let record = json!({ "grid": [[10, 10], [10, 40]] });
        let view = RenderedView::build(&record, 3, &HeatmapRules::uniform(0.1));
        let grid = view.table("grid").unwrap();
        let hot = grid.rows[1][1].shade.unwrap();
        assert_eq!(hot.band, Band::Beyond);
        assert_eq!(hot.intensity, 1.0);
    }

    #[test]
    fn test_display_skips_identical_records() {
        let mut pipeline = RenderPipeline::new(3, HeatmapRules::uniform(0.1));

        assert!(pipeline.display(json!({ "a": 1 })));
        assert!(!pipeline.display(json!({ "a": 1 })));
        assert_eq!(pipeline.render_count(), 1);

        assert!(pipeline.display(json!({ "a": 2 })));
        assert_eq!(pipeline.render_count(), 2);
        assert_eq!(pipeline.last_rendered(), Some(&json!({ "a": 2 })));
    }

    #[test]
    fn test_display_replaces_whole_view() {
        let mut pipeline = RenderPipeline::new(3, HeatmapRules::disabled());
        pipeline.display(json!({ "grid": [[1]], "x": 1 }));
        assert_eq!(pipeline.view().tables.len(), 1);

        pipeline.display(json!({ "y": 2 }));
        assert!(pipeline.view().tables.is_empty());
        assert_eq!(pipeline.view().fields.len(), 1);
    }
}
