use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::flatten;

/// Result fields as a two-column table, followed by warnings and methodology.
pub fn print_table(value: &Value) {
    let Value::Object(envelope) = value else {
        println!("{}", value);
        return;
    };
    let result = envelope.get("result").unwrap_or(value);

    let mut rows = Vec::new();
    flatten("", result, &mut rows);

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (field, text) in rows {
        builder.push_record([field, text]);
    }
    println!("{}", Table::from(builder));

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}
