//! Test data builders for creating test records

use serde_json::{json, Map, Value};

/// Builder for a JSON record containing matrices and scalar fields
#[derive(Default)]
pub struct RecordBuilder {
    fields: Map<String, Value>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `rows` x `cols` matrix filled by `cell(row, col)`
    pub fn matrix(
        mut self,
        name: &str,
        rows: usize,
        cols: usize,
        cell: impl Fn(usize, usize) -> f64,
    ) -> Self {
        let matrix: Vec<Value> = (0..rows)
            .map(|r| Value::Array((0..cols).map(|c| json!(cell(r, c))).collect()))
            .collect();
        self.fields.insert(name.to_string(), Value::Array(matrix));
        self
    }

    pub fn field(mut self, name: &str, value: Value) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    pub fn build(self) -> Value {
        Value::Object(self.fields)
    }

    /// The record as one wire line, terminator included
    pub fn line(self) -> String {
        format!("{}\n", self.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builder() {
        let record = RecordBuilder::new()
            .field("seq", json!(1))
            .matrix("grid", 2, 2, |r, c| (r * 2 + c) as f64)
            .build();

        assert_eq!(record, json!({ "seq": 1, "grid": [[0.0, 1.0], [2.0, 3.0]] }));
    }
}
