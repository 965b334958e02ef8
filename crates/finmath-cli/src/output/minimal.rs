use serde_json::Value;

use super::scalar_text;

/// Fields tried in order; the first non-null one is the headline answer.
const PRIORITY_KEYS: [&str; 6] = ["irr", "cet_annual", "npv", "annual_rate", "irr_monthly", "rate"];

/// Print just the headline value of the result.
pub fn print_minimal(value: &Value) {
    println!("{}", headline(value));
}

fn headline(value: &Value) -> String {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let Value::Object(map) = result else {
        return scalar_text(result);
    };

    for key in PRIORITY_KEYS {
        if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
            return scalar_text(val);
        }
    }

    match map.iter().next() {
        Some((key, val)) => format!("{}: {}", key, scalar_text(val)),
        None => String::new(),
    }
}
