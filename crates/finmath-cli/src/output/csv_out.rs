use serde_json::Value;
use std::io;

use super::flatten;

/// Result fields as `field,value` CSV rows on stdout.
pub fn print_csv(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let mut rows = Vec::new();
    flatten("", result, &mut rows);

    let mut wtr = csv::Writer::from_writer(io::stdout().lock());
    let _ = wtr.write_record(["field", "value"]);
    for (field, text) in &rows {
        let _ = wtr.write_record([field.as_str(), text.as_str()]);
    }
    let _ = wtr.flush();
}
