//! Chronological event log

use crate::cluster::Item;
use crate::output::{format_age_or_na, render_table, single_line, NOT_AVAILABLE};
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Event;
use tracing::debug;

pub const EVENT_HEADERS: &[&str] = &["LAST SEEN", "TYPE", "REASON", "KIND", "OBJECT", "MESSAGE"];

fn decode_event(item: &Item) -> Event {
    item.decode().unwrap_or_else(|e| {
        debug!(item = item.name(), error = %e, "could not decode event");
        Event::default()
    })
}

/// Creation time, with events lacking one sorted as the oldest
fn created_at(event: &Event) -> DateTime<Utc> {
    event
        .metadata
        .creation_timestamp
        .as_ref()
        .map(|t| t.0)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// When the event was last observed
fn last_seen(event: &Event) -> Option<DateTime<Utc>> {
    event
        .last_timestamp
        .as_ref()
        .map(|t| t.0)
        .or_else(|| {
            event
                .series
                .as_ref()
                .and_then(|s| s.last_observed_time.as_ref())
                .map(|t| t.0)
        })
}

fn or_na(value: Option<&str>) -> String {
    value.unwrap_or(NOT_AVAILABLE).to_string()
}

fn event_row(event: &Event, now: DateTime<Utc>) -> Vec<String> {
    vec![
        format_age_or_na(now, last_seen(event)),
        or_na(event.type_.as_deref()),
        or_na(event.reason.as_deref()),
        or_na(event.involved_object.kind.as_deref()),
        or_na(event.involved_object.name.as_deref()),
        event
            .message
            .as_deref()
            .map(single_line)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    ]
}

/// Events sorted by creation time, oldest first; ties keep their listed order
pub fn sorted_events(items: &[Item]) -> Vec<Event> {
    let mut events: Vec<Event> = items.iter().map(decode_event).collect();
    events.sort_by_key(created_at);
    events
}

/// Render the event log table
pub fn render_events(items: &[Item], now: DateTime<Utc>) -> String {
    let rows = sorted_events(items)
        .iter()
        .map(|event| event_row(event, now))
        .collect();
    render_table(EVENT_HEADERS, rows)
}
