//! Display formatting for scalar values

use serde_json::Value;

/// Interpret a scalar as a number
///
/// JSON numbers and strings holding a decimal number qualify. Booleans, null,
/// containers and non-finite values do not.
pub fn numeric_value(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}

/// Format a number with `precision` decimals, then trim trailing zeros
///
/// `3.14000` at precision 3 is `3.14`, `5.0` is `5`. Precision 0 rounds to
/// an integer.
pub fn format_number(value: f64, precision: usize) -> String {
    let formatted = format!("{:.*}", precision, value);
    if precision == 0 {
        return formatted;
    }
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Display text for any value
///
/// Numbers (and numeric strings) go through [`format_number`]; other strings
/// are shown without quotes; everything else uses its JSON text.
pub fn format_value(value: &Value, precision: usize) -> String {
    if let Some(number) = numeric_value(value) {
        return format_number(number, precision);
    }
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
