//! Token-efficient text rendering of command output.
//!
//! A list of records becomes a header row plus one ` | `-separated row per
//! record; a single record becomes `key: value` lines. Anything else is
//! printed as JSON. Field order follows the record's declaration order.

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

/// Render any serializable value.
pub fn to_text<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(render(&serde_json::to_value(value)?))
}

pub fn render(value: &Value) -> String {
    match value {
        Value::Array(items) if matches!(items.first(), Some(Value::Object(_))) => render_table(items),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{}: {}", k, scalar(v)))
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

fn render_table(items: &[Value]) -> String {
    let keys: Vec<&String> = match items.first() {
        Some(Value::Object(first)) => first.keys().collect(),
        _ => return String::new(),
    };

    let mut lines = Vec::with_capacity(items.len() + 1);
    lines.push(
        keys.iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(" | "),
    );

    for item in items {
        let row: Vec<String> = keys
            .iter()
            .map(|k| {
                let cell = item.get(k.as_str()).map(scalar).unwrap_or_default();
                cell.replace('\n', " ").replace('|', "¦")
            })
            .collect();
        lines.push(row.join(" | "));
    }

    lines.join("\n")
}

/// Display form of a cell: strings unquoted, everything else as JSON.
fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
