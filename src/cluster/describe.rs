//! Human-readable descriptions rendered from API objects

use crate::output::{format_age_or_na, format_table_raw, single_line, NOT_AVAILABLE};
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Event;
use serde_json::{Map, Value};

const LABEL_WIDTH: usize = 14;

fn push_field(out: &mut String, label: &str, value: &str) {
    out.push_str(&format!("{:<width$}{}\n", format!("{label}:"), value, width = LABEL_WIDTH));
}

/// `key=value` pairs, one per line, aligned under the field label
fn push_map(out: &mut String, label: &str, map: Option<&Map<String, Value>>) {
    let entries: Vec<String> = map
        .map(|m| {
            m.iter()
                .map(|(k, v)| match v {
                    Value::String(s) => format!("{k}={s}"),
                    other => format!("{k}={other}"),
                })
                .collect()
        })
        .unwrap_or_default();

    if entries.is_empty() {
        push_field(out, label, "<none>");
        return;
    }

    for (i, entry) in entries.iter().enumerate() {
        if i == 0 {
            push_field(out, label, entry);
        } else {
            out.push_str(&format!("{:<width$}{}\n", "", entry, width = LABEL_WIDTH));
        }
    }
}

/// Capitalize the first letter of a field name for a section heading
fn heading(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn push_section(out: &mut String, field: &str, value: &Value) {
    out.push_str(&format!("{}:\n", heading(field)));
    let body = serde_yaml::to_string(value).unwrap_or_else(|e| format!("<unrenderable: {e}>\n"));
    for line in body.lines() {
        out.push_str("  ");
        out.push_str(line);
        out.push('\n');
    }
}

fn push_events(out: &mut String, events: &[Event], now: DateTime<Utc>) {
    if events.is_empty() {
        push_field(out, "Events", "<none>");
        return;
    }

    out.push_str("Events:\n");
    let mut sorted: Vec<&Event> = events.iter().collect();
    sorted.sort_by_key(|e| e.last_timestamp.as_ref().map(|t| t.0));

    let rows: Vec<Vec<String>> = sorted
        .iter()
        .map(|e| {
            vec![
                e.type_.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                e.reason.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                format_age_or_na(now, e.last_timestamp.as_ref().map(|t| t.0)),
                e.message.as_deref().map(single_line).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            ]
        })
        .collect();

    for line in format_table_raw(&["TYPE", "REASON", "AGE", "MESSAGE"], &rows).lines() {
        out.push_str("  ");
        out.push_str(line);
        out.push('\n');
    }
}

/// Render a kubectl-style description of one object and its events
pub fn render_description(kind: &str, object: &Value, events: &[Event], now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let metadata = object.get("metadata").and_then(Value::as_object);
    let meta_str = |key: &str| {
        metadata
            .and_then(|m| m.get(key))
            .and_then(Value::as_str)
            .unwrap_or("<none>")
            .to_string()
    };

    push_field(&mut out, "Name", &meta_str("name"));
    if metadata.is_some_and(|m| m.contains_key("namespace")) {
        push_field(&mut out, "Namespace", &meta_str("namespace"));
    }
    push_field(&mut out, "Kind", kind);
    push_field(
        &mut out,
        "API Version",
        object.get("apiVersion").and_then(Value::as_str).unwrap_or("<none>"),
    );
    push_map(&mut out, "Labels", metadata.and_then(|m| m.get("labels")).and_then(Value::as_object));
    push_map(
        &mut out,
        "Annotations",
        metadata.and_then(|m| m.get("annotations")).and_then(Value::as_object),
    );

    let created = meta_str("creationTimestamp");
    let age = DateTime::parse_from_rfc3339(&created)
        .ok()
        .map(|t| format_age_or_na(now, Some(t.with_timezone(&Utc))));
    match age {
        Some(age) => push_field(&mut out, "Created", &format!("{created} ({age} ago)")),
        None => push_field(&mut out, "Created", &created),
    }

    if let Some(fields) = object.as_object() {
        for (field, value) in fields {
            if matches!(field.as_str(), "apiVersion" | "kind" | "metadata") || value.is_null() {
                continue;
            }
            push_section(&mut out, field, value);
        }
    }

    push_events(&mut out, events, now);
    out
}
