//! Deviation heatmap for numeric tables
//!
//! Each numeric cell is compared against the mean of all numeric cells in its
//! table. The relative deviation `|value - mean| / |mean|` picks one of two
//! color bands:
//!
//! - **Within** the threshold: a light-to-medium green, darker toward the
//!   threshold edge.
//! - **Beyond** the threshold: a light-to-strong red, reaching full strength
//!   at [`CAP_FACTOR`] times the threshold past the edge.
//!
//! Tables with a zero mean, or without any numeric cell, stay uncolored.
//!
//! # Rule Resolution
//!
//! [`HeatmapRules::resolve`] picks the threshold for a table by label:
//! an exact per-table rule wins; with no per-table rules configured at all the
//! wildcard default applies; otherwise the table is not colored.

use super::format::numeric_value;
use super::matrix::Matrix;
use egui::Color32;

/// How far past the threshold (in multiples of the threshold) the red band saturates
pub const CAP_FACTOR: f64 = 5.0;

/// Floor for the red band denominator so a zero threshold does not divide by zero
const MIN_BAND_WIDTH: f64 = 1e-12;

const WITHIN_LIGHT: [u8; 3] = [234, 251, 234];
const WITHIN_DEEP: [u8; 3] = [184, 240, 184];
const BEYOND_LIGHT: [u8; 3] = [255, 234, 234];
const BEYOND_DEEP: [u8; 3] = [255, 140, 140];

// ==================== Rules ====================

/// A deviation threshold, optionally bound to one table label
///
/// A rule without a table is a wildcard default.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapRule {
    table: Option<String>,
    max_deviation: f64,
}

impl HeatmapRule {
    /// Create a rule; negative or NaN thresholds become 0
    pub fn new(table: Option<String>, max_deviation: f64) -> Self {
        let max_deviation = if max_deviation.is_nan() {
            0.0
        } else {
            max_deviation.max(0.0)
        };
        Self {
            table,
            max_deviation,
        }
    }

    pub fn for_table(table: impl Into<String>, max_deviation: f64) -> Self {
        Self::new(Some(table.into()), max_deviation)
    }

    pub fn wildcard(max_deviation: f64) -> Self {
        Self::new(None, max_deviation)
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn max_deviation(&self) -> f64 {
        self.max_deviation
    }
}

/// The set of rules applied while rendering
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeatmapRules {
    table_rules: Vec<HeatmapRule>,
    default: Option<HeatmapRule>,
}

impl HeatmapRules {
    /// No coloring at all
    pub fn disabled() -> Self {
        Self::default()
    }

    /// One threshold for every table
    pub fn uniform(max_deviation: f64) -> Self {
        Self {
            table_rules: Vec::new(),
            default: Some(HeatmapRule::wildcard(max_deviation)),
        }
    }

    /// Build from a list of rules
    ///
    /// Wildcard rules in the list become the default (the last one wins).
    pub fn per_table(rules: impl IntoIterator<Item = HeatmapRule>) -> Self {
        let mut out = Self::default();
        for rule in rules {
            if rule.table.is_some() {
                out.table_rules.push(rule);
            } else {
                out.default = Some(rule);
            }
        }
        out
    }

    /// Set the wildcard default
    pub fn with_default(mut self, max_deviation: f64) -> Self {
        self.default = Some(HeatmapRule::wildcard(max_deviation));
        self
    }

    /// Threshold for the table with this label, if it should be colored
    pub fn resolve(&self, label: &str) -> Option<f64> {
        if let Some(rule) = self.table_rules.iter().find(|r| r.table() == Some(label)) {
            return Some(rule.max_deviation);
        }
        if self.table_rules.is_empty() {
            return self.default.as_ref().map(HeatmapRule::max_deviation);
        }
        None
    }
}

// ==================== Coloring ====================

/// Which color band a cell falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    /// Deviation at or below the threshold
    Within,
    /// Deviation above the threshold
    Beyond,
}

/// Computed coloring for one numeric cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellShade {
    /// Relative deviation from the table mean
    pub deviation: f64,
    pub band: Band,
    /// Position on the band gradient, 0..=1
    pub intensity: f64,
    pub fill: Color32,
}

/// Heatmap parameters for one table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Heatmap {
    mean: f64,
    max_deviation: f64,
}

impl Heatmap {
    /// Prepare coloring for a table
    ///
    /// Returns `None` when no cell is numeric or the mean is zero.
    pub fn for_matrix(matrix: &Matrix<'_>, max_deviation: f64) -> Option<Self> {
        let mean = numeric_mean(matrix)?;
        Self::new(mean, max_deviation)
    }

    /// Returns `None` for a zero or non-finite mean.
    pub fn new(mean: f64, max_deviation: f64) -> Option<Self> {
        if mean == 0.0 || !mean.is_finite() {
            return None;
        }
        Some(Self {
            mean,
            max_deviation: HeatmapRule::wildcard(max_deviation).max_deviation,
        })
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn max_deviation(&self) -> f64 {
        self.max_deviation
    }

    /// Relative deviation of a value from the mean
    pub fn deviation(&self, value: f64) -> f64 {
        (value - self.mean).abs() / self.mean.abs()
    }

    /// Coloring for a numeric value
    pub fn shade(&self, value: f64) -> CellShade {
        let deviation = self.deviation(value);

        if deviation <= self.max_deviation {
            let intensity = if self.max_deviation > 0.0 {
                deviation / self.max_deviation
            } else {
                0.0
            };
            CellShade {
                deviation,
                band: Band::Within,
                intensity,
                fill: within_color(intensity),
            }
        } else {
            let over = deviation - self.max_deviation;
            let width = (self.max_deviation * CAP_FACTOR).max(MIN_BAND_WIDTH);
            let intensity = (over / width).clamp(0.0, 1.0);
            CellShade {
                deviation,
                band: Band::Beyond,
                intensity,
                fill: beyond_color(intensity),
            }
        }
    }

    /// Coloring for a cell, if it holds a number
    pub fn shade_cell(&self, cell: &serde_json::Value) -> Option<CellShade> {
        numeric_value(cell).map(|v| self.shade(v))
    }
}

/// Mean of every numeric cell, or `None` if there are none
pub fn numeric_mean(matrix: &Matrix<'_>) -> Option<f64> {
    let (sum, count) = matrix
        .cells()
        .filter_map(numeric_value)
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

    (count > 0).then(|| sum / count as f64)
}

/// Green band color; 0 = at the mean, 1 = at the threshold
pub fn within_color(t: f64) -> Color32 {
    gradient(WITHIN_LIGHT, WITHIN_DEEP, t)
}

/// Red band color; 0 = just past the threshold, 1 = saturated
pub fn beyond_color(t: f64) -> Color32 {
    gradient(BEYOND_LIGHT, BEYOND_DEEP, t)
}

fn gradient(from: [u8; 3], to: [u8; 3], t: f64) -> Color32 {
    Color32::from_rgb(
        lerp(from[0], to[0], t),
        lerp(from[1], to[1], t),
        lerp(from[2], to[2], t),
    )
}

fn lerp(a: u8, b: u8, t: f64) -> u8 {
    let t = t.clamp(0.0, 1.0);
    let value = a as f64 + (b as f64 - a as f64) * t;
    value.trunc() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    #[test]
    fn test_rule_resolution_precedence() {
        let rules = HeatmapRules::per_table([HeatmapRule::for_table("A", 0.1)]);
        assert_eq!(rules.resolve("A"), Some(0.1));
        assert_eq!(rules.resolve("B"), None);

        let rules = HeatmapRules::uniform(0.2);
        assert_eq!(rules.resolve("B"), Some(0.2));

        // A default does not leak into unmatched tables once per-table rules exist
        let rules = HeatmapRules::per_table([HeatmapRule::for_table("A", 0.1)]).with_default(0.3);
        assert_eq!(rules.resolve("B"), None);

        assert_eq!(HeatmapRules::disabled().resolve("A"), None);
    }

    #[test]
    fn test_negative_threshold_clamped() {
        assert_eq!(HeatmapRule::wildcard(-0.5).max_deviation(), 0.0);
        assert_eq!(HeatmapRule::wildcard(f64::NAN).max_deviation(), 0.0);
        assert_eq!(HeatmapRule::for_table("x", 0.25).max_deviation(), 0.25);
    }

    #[test]
    fn test_end_to_end_example() {
        let value = json!([[10, 10], [10, 40]]);
        let matrix = Matrix::classify(&value).unwrap();
        let heatmap = Heatmap::for_matrix(&matrix, 0.1).unwrap();
        assert!((heatmap.mean() - 17.5).abs() < 1e-12);

        let shade = heatmap.shade(40.0);
        assert!((shade.deviation - 22.5 / 17.5).abs() < 1e-12);
        assert_eq!(shade.band, Band::Beyond);
        assert_eq!(shade.intensity, 1.0);
        assert_eq!(shade.fill, Color32::from_rgb(255, 140, 140));

        let shade = heatmap.shade(10.0);
        assert_eq!(shade.band, Band::Beyond);
        assert!(shade.intensity > 0.0 && shade.intensity < 1.0);
    }

    #[test]
    fn test_value_at_mean_is_lightest_green() {
        let heatmap = Heatmap::new(20.0, 0.1).unwrap();
        let shade = heatmap.shade(20.0);
        assert_eq!(shade.band, Band::Within);
        assert_eq!(shade.intensity, 0.0);
        assert_eq!(shade.fill, Color32::from_rgb(234, 251, 234));
    }

    #[test]
    fn test_threshold_edge_is_deepest_green() {
        let heatmap = Heatmap::new(100.0, 0.5).unwrap();
        let shade = heatmap.shade(150.0);
        assert_eq!(shade.band, Band::Within);
        assert_eq!(shade.fill, Color32::from_rgb(184, 240, 184));
    }

    #[test]
    fn test_zero_threshold() {
        let heatmap = Heatmap::new(10.0, 0.0).unwrap();
        let at_mean = heatmap.shade(10.0);
        assert_eq!(at_mean.band, Band::Within);
        assert_eq!(at_mean.fill, within_color(0.0));

        let off = heatmap.shade(10.5);
        assert_eq!(off.band, Band::Beyond);
        assert_eq!(off.intensity, 1.0);
    }

    #[test]
    fn test_zero_mean_is_uncolored() {
        let value = json!([[-1, 1], [2, -2]]);
        let matrix = Matrix::classify(&value).unwrap();
        assert!(Heatmap::for_matrix(&matrix, 0.1).is_none());
    }

    #[test]
    fn test_non_numeric_cells_excluded_from_mean() {
        let value = json!([[10, "n/a"], [null, 20]]);
        let matrix = Matrix::classify(&value).unwrap();
        assert_eq!(numeric_mean(&matrix), Some(15.0));

        let heatmap = Heatmap::for_matrix(&matrix, 0.5).unwrap();
        assert!(heatmap.shade_cell(&json!("n/a")).is_none());
        assert!(heatmap.shade_cell(&Value::Null).is_none());
        assert!(heatmap.shade_cell(&json!(10)).is_some());
    }

    #[test]
    fn test_all_text_matrix_has_no_mean() {
        let value = json!([["a", "b"]]);
        let matrix = Matrix::classify(&value).unwrap();
        assert_eq!(numeric_mean(&matrix), None);
        assert!(Heatmap::for_matrix(&matrix, 0.1).is_none());
    }

    #[test]
    fn test_negative_mean_uses_absolute_value() {
        let heatmap = Heatmap::new(-10.0, 0.1).unwrap();
        assert!((heatmap.deviation(-11.0) - 0.1).abs() < 1e-12);
        assert_eq!(heatmap.shade(-10.0).band, Band::Within);
    }

    proptest! {
        #[test]
        fn test_deviation_is_non_negative_and_intensity_bounded(
            cells in prop::collection::vec(-1000.0f64..1000.0, 1..40),
            max_deviation in 0.0f64..2.0,
        ) {
            let value = Value::Array(vec![Value::Array(
                cells.iter().map(|c| serde_json::json!(c)).collect(),
            )]);
            let matrix = Matrix::classify(&value).unwrap();

            if let Some(heatmap) = Heatmap::for_matrix(&matrix, max_deviation) {
                for cell in &cells {
                    let shade = heatmap.shade(*cell);
                    prop_assert!(shade.deviation >= 0.0);
                    prop_assert!((0.0..=1.0).contains(&shade.intensity));
                    match shade.band {
                        Band::Within => prop_assert!(shade.deviation <= max_deviation),
                        Band::Beyond => prop_assert!(shade.deviation > max_deviation),
                    }
                }
            }
        }

        #[test]
        fn test_zero_mean_never_colored(cells in prop::collection::vec(-100i64..100, 1..20)) {
            // Mirror every value so the mean is exactly zero
            let row: Vec<Value> = cells
                .iter()
                .flat_map(|c| [serde_json::json!(c), serde_json::json!(-c)])
                .collect();
            let value = Value::Array(vec![Value::Array(row)]);
            let matrix = Matrix::classify(&value).unwrap();
            prop_assert!(Heatmap::for_matrix(&matrix, 0.1).is_none());
        }
    }
}
