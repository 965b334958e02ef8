pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Nested objects become dotted `field.sub` rows; arrays of scalars are joined.
pub(crate) fn flatten(prefix: &str, value: &Value, rows: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                let name = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&name, val, rows);
            }
        }
        _ => rows.push((prefix.to_string(), scalar_text(value))),
    }
}

pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => arr.iter().map(scalar_text).collect::<Vec<_>>().join("; "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_nested_result() {
        let value = json!({
            "irr_monthly": "0.02",
            "breakdown": {"pv": "10000", "net_inflow": "9915"},
            "cash_flows": ["9915", "-945.60"]
        });
        let mut rows = Vec::new();
        flatten("", &value, &mut rows);
        assert!(rows.contains(&("breakdown.net_inflow".to_string(), "9915".to_string())));
        assert!(rows.contains(&("cash_flows".to_string(), "9915; -945.60".to_string())));
        assert!(rows.contains(&("irr_monthly".to_string(), "0.02".to_string())));
    }
}
