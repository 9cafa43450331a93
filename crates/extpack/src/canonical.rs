//! Deterministic JSON canonicalization.
//!
//! Canonical text is produced in two passes over a `serde_json::Value`:
//! [`sort_keys`] orders object keys at every depth (arrays keep element order),
//! then [`render`] writes the fixed house style:
//!
//! - arrays are always inline: `[1, {"a": 2}, []]`
//! - non-empty objects are multiline blocks indented by two spaces per level
//! - empty objects are `{}`
//! - the document ends with exactly one `\n`
//!
//! Structurally equal inputs yield byte-identical output, and canonical text is a
//! fixed point: `canonicalize(canonicalize(t)) == canonicalize(t)`.

use serde_json::{Number, Value};

const INDENT: &str = "  ";

/// Parses `raw`, sorts keys recursively, and renders the canonical text.
pub fn canonicalize(raw: &str) -> Result<String, serde_json::Error> {
    let value: Value = serde_json::from_str(raw)?;
    let mut out = render(&sort_keys(value))?;
    out.push('\n');
    Ok(out)
}

/// Returns `value` with every object's keys in ascending code-point order,
/// including objects nested inside arrays.
pub fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        scalar @ (Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)) => scalar,
    }
}

/// Renders an already key-sorted value without the trailing newline.
pub fn render(value: &Value) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    write_block(&mut out, value, 0)?;
    Ok(out)
}

fn write_block(out: &mut String, value: &Value, depth: usize) -> Result<(), serde_json::Error> {
    match value {
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Object(map) => {
            out.push_str("{\n");
            let last = map.len() - 1;
            for (i, (key, item)) in map.iter().enumerate() {
                push_indent(out, depth + 1);
                write_string(out, key)?;
                out.push_str(": ");
                write_block(out, item, depth + 1)?;
                if i != last {
                    out.push(',');
                }
                out.push('\n');
            }
            push_indent(out, depth);
            out.push('}');
        }
        Value::Array(_) | Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            write_inline(out, value)?
        }
    }
    Ok(())
}

fn write_inline(out: &mut String, value: &Value) -> Result<(), serde_json::Error> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&render_number(n)),
        Value::String(s) => write_string(out, s)?,
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_inline(out, item)?;
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_string(out, key)?;
                out.push_str(": ");
                write_inline(out, item)?;
            }
            out.push('}');
        }
    }
    Ok(())
}

fn write_string(out: &mut String, s: &str) -> Result<(), serde_json::Error> {
    out.push_str(&serde_json::to_string(s)?);
    Ok(())
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

/// Minimal JSON text for a number: integers verbatim, integral floats below 1e21
/// without a fraction, everything else in shortest round-trip form.
pub(crate) fn render_number(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
        _ => n.to_string(),
    }
}
