//! Classification of JSON arrays as rectangular tables

use serde_json::Value;

/// A borrowed view of a rectangular array of scalar rows
///
/// Built fresh from the record on every render, so row uniformity is always
/// checked against the value actually being drawn.
#[derive(Debug, Clone, Copy)]
pub struct Matrix<'a> {
    rows: &'a [Value],
    columns: usize,
}

impl<'a> Matrix<'a> {
    /// Classify a value as a matrix
    ///
    /// Requires a non-empty array whose elements are all arrays of the same
    /// length as the first, containing only scalars.
    pub fn classify(value: &'a Value) -> Option<Self> {
        let rows = value.as_array()?;
        let first = rows.first()?.as_array()?;
        let columns = first.len();

        let rectangular = rows.iter().all(|row| {
            row.as_array()
                .is_some_and(|cells| cells.len() == columns && cells.iter().all(is_scalar))
        });

        rectangular.then_some(Self { rows, columns })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns
    }

    /// Iterate over rows as cell slices
    pub fn rows(&self) -> impl Iterator<Item = &'a [Value]> + '_ {
        self.rows
            .iter()
            .filter_map(|row| row.as_array().map(Vec::as_slice))
    }

    /// Iterate over every cell in row-major order
    pub fn cells(&self) -> impl Iterator<Item = &'a Value> + '_ {
        self.rows().flatten()
    }
}

/// Whether a value is a leaf (not an array or object)
pub fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}
