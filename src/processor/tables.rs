//! Summary tables for pods and volumes

use crate::catalog::TableKind;
use crate::cluster::Item;
use crate::output::{format_age_or_na, render_table, NOT_AVAILABLE};
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::{PersistentVolume, PersistentVolumeClaim, Pod};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::BTreeMap;
use tracing::debug;

pub const POD_HEADERS: &[&str] = &["NAME", "READY", "STATUS", "RESTARTS", "AGE"];

pub const VOLUME_CLAIM_HEADERS: &[&str] =
    &["NAME", "STATUS", "VOLUME", "CAPACITY", "ACCESS MODES", "STORAGECLASS", "AGE"];

pub const VOLUME_HEADERS: &[&str] = &[
    "NAME",
    "CAPACITY",
    "ACCESS MODES",
    "RECLAIM POLICY",
    "STATUS",
    "CLAIM",
    "STORAGECLASS",
    "AGE",
];

/// Column headers of a summary table
pub fn headers(table: TableKind) -> &'static [&'static str] {
    match table {
        TableKind::Pods => POD_HEADERS,
        TableKind::VolumeClaims => VOLUME_CLAIM_HEADERS,
        TableKind::Volumes => VOLUME_HEADERS,
    }
}

/// Render a collection as its summary table
pub fn render(table: TableKind, items: &[Item], now: DateTime<Utc>) -> String {
    let rows = items
        .iter()
        .map(|item| match table {
            TableKind::Pods => decoded_row(item, |pod: Pod| pod_row(&pod, now), POD_HEADERS.len()),
            TableKind::VolumeClaims => decoded_row(
                item,
                |pvc: PersistentVolumeClaim| volume_claim_row(&pvc, now),
                VOLUME_CLAIM_HEADERS.len(),
            ),
            TableKind::Volumes => {
                decoded_row(item, |pv: PersistentVolume| volume_row(&pv, now), VOLUME_HEADERS.len())
            }
        })
        .collect();

    render_table(headers(table), rows)
}

/// Decode an item and build its row; an undecodable item keeps its name and nothing else
fn decoded_row<T, F>(item: &Item, row: F, columns: usize) -> Vec<String>
where
    T: serde::de::DeserializeOwned,
    F: FnOnce(T) -> Vec<String>,
{
    match item.decode::<T>() {
        Ok(resource) => row(resource),
        Err(e) => {
            debug!(item = item.name(), error = %e, "could not decode item for summary table");
            let mut cells = vec![item.name().to_string()];
            cells.resize(columns, NOT_AVAILABLE.to_string());
            cells
        }
    }
}

fn or_na(value: Option<&str>) -> String {
    value.unwrap_or(NOT_AVAILABLE).to_string()
}

fn storage(map: Option<&BTreeMap<String, Quantity>>) -> String {
    or_na(map.and_then(|m| m.get("storage")).map(|q| q.0.as_str()))
}

fn access_modes(modes: Option<&Vec<String>>) -> String {
    match modes {
        Some(modes) if !modes.is_empty() => modes.join(", "),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn pod_row(pod: &Pod, now: DateTime<Utc>) -> Vec<String> {
    let (ready, total) = ready_containers(pod);
    vec![
        or_na(pod.metadata.name.as_deref()),
        format!("{}/{}", ready, total),
        pod_status(pod).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        restart_count(pod).to_string(),
        format_age_or_na(now, pod.metadata.creation_timestamp.as_ref().map(|t| t.0)),
    ]
}

/// Ready container count and declared container count
fn ready_containers(pod: &Pod) -> (usize, usize) {
    let total = pod.spec.as_ref().map(|s| s.containers.len()).unwrap_or(0);

    let ready = pod
        .status
        .as_ref()
        .and_then(|s| s.container_statuses.as_ref())
        .map(|cs| cs.iter().filter(|c| c.ready).count())
        .unwrap_or(0);

    (ready, total)
}

fn restart_count(pod: &Pod) -> i32 {
    pod.status
        .as_ref()
        .and_then(|s| s.container_statuses.as_ref())
        .map(|cs| cs.iter().map(|c| c.restart_count).sum())
        .unwrap_or(0)
}

/// Most specific status available: terminating, a container's waiting or
/// terminated reason, then the pod phase
fn pod_status(pod: &Pod) -> Option<String> {
    if pod.metadata.deletion_timestamp.is_some() {
        return Some("Terminating".to_string());
    }

    let status = pod.status.as_ref()?;
    let container_reason = status.container_statuses.iter().flatten().find_map(|cs| {
        let state = cs.state.as_ref()?;
        state
            .waiting
            .as_ref()
            .and_then(|w| w.reason.clone())
            .or_else(|| state.terminated.as_ref().and_then(|t| t.reason.clone()))
    });

    container_reason.or_else(|| status.phase.clone())
}

fn volume_claim_row(pvc: &PersistentVolumeClaim, now: DateTime<Utc>) -> Vec<String> {
    let spec = pvc.spec.as_ref();
    vec![
        or_na(pvc.metadata.name.as_deref()),
        or_na(pvc.status.as_ref().and_then(|s| s.phase.as_deref())),
        or_na(spec.and_then(|s| s.volume_name.as_deref())),
        storage(spec.and_then(|s| s.resources.as_ref()).and_then(|r| r.requests.as_ref())),
        access_modes(spec.and_then(|s| s.access_modes.as_ref())),
        or_na(spec.and_then(|s| s.storage_class_name.as_deref())),
        format_age_or_na(now, pvc.metadata.creation_timestamp.as_ref().map(|t| t.0)),
    ]
}

fn volume_row(pv: &PersistentVolume, now: DateTime<Utc>) -> Vec<String> {
    let spec = pv.spec.as_ref();
    let claim = spec.and_then(|s| s.claim_ref.as_ref()).map(|c| {
        format!(
            "{}/{}",
            c.namespace.as_deref().unwrap_or(NOT_AVAILABLE),
            c.name.as_deref().unwrap_or(NOT_AVAILABLE)
        )
    });

    vec![
        or_na(pv.metadata.name.as_deref()),
        storage(spec.and_then(|s| s.capacity.as_ref())),
        access_modes(spec.and_then(|s| s.access_modes.as_ref())),
        or_na(spec.and_then(|s| s.persistent_volume_reclaim_policy.as_deref())),
        or_na(pv.status.as_ref().and_then(|s| s.phase.as_deref())),
        claim.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        or_na(spec.and_then(|s| s.storage_class_name.as_deref())),
        format_age_or_na(now, pv.metadata.creation_timestamp.as_ref().map(|t| t.0)),
    ]
}
