//! Rendering of decoded records
//!
//! This module contains everything between a decoded JSON record and the
//! widgets on screen, without depending on any live UI state:
//!
//! - [`matrix`] - Detecting rectangular tables inside a record
//! - [`format`] - Numeric display formatting
//! - [`heatmap`] - Deviation-from-mean coloring and rule resolution
//! - [`pipeline`] - Traversal of a record into a [`RenderedView`], with
//!   skip-if-unchanged semantics in [`RenderPipeline`]
//!
//! The frontend draws a [`RenderedView`] directly; it never inspects the
//! record itself.

pub mod format;
pub mod heatmap;
pub mod matrix;
pub mod pipeline;

pub use format::{format_number, format_value, numeric_value};
pub use heatmap::{Band, CellShade, Heatmap, HeatmapRule, HeatmapRules, CAP_FACTOR};
pub use matrix::Matrix;
pub use pipeline::{FieldLine, RenderPipeline, RenderedView, TableCell, TableView};
