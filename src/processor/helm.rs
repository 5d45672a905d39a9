//! Helm release secrets
//!
//! Helm v3 stores each release revision in a secret whose `release` key holds
//! `base64(gzip(json))`. The API serves secret data base64-encoded once more,
//! so the raw value read from the secret object is decoded twice and then
//! decompressed.

use crate::cluster::Item;
use crate::error::{Result, SupportError};
use crate::output::NOT_AVAILABLE;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Summary of one Helm release revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmRelease {
    pub name: String,
    pub namespace: String,
    pub revision: i64,
    pub updated: String,
    pub status: String,
    pub chart: String,
    pub app_version: String,
}

#[derive(Deserialize)]
struct RawRelease {
    name: String,
    namespace: String,
    version: i64,
    info: RawInfo,
    chart: RawChart,
}

#[derive(Deserialize)]
struct RawInfo {
    #[serde(default)]
    last_deployed: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Deserialize)]
struct RawChart {
    metadata: RawChartMetadata,
}

#[derive(Deserialize)]
struct RawChartMetadata {
    name: String,
    version: String,
    #[serde(rename = "appVersion", default)]
    app_version: Option<String>,
}

impl From<RawRelease> for HelmRelease {
    fn from(raw: RawRelease) -> Self {
        let na = || NOT_AVAILABLE.to_string();
        HelmRelease {
            name: raw.name,
            namespace: raw.namespace,
            revision: raw.version,
            updated: raw.info.last_deployed.unwrap_or_else(na),
            status: raw.info.status.unwrap_or_else(na),
            chart: format!("{}-{}", raw.chart.metadata.name, raw.chart.metadata.version),
            app_version: raw.chart.metadata.app_version.unwrap_or_else(na),
        }
    }
}

fn malformed(secret: &str, reason: impl std::fmt::Display) -> SupportError {
    SupportError::MalformedReleaseData {
        secret: secret.to_string(),
        reason: reason.to_string(),
    }
}

/// Decode the `release` value of a Helm secret as served by the API
pub fn decode_release(secret: &str, encoded: &str) -> Result<HelmRelease> {
    let outer = STANDARD
        .decode(encoded.trim())
        .map_err(|e| malformed(secret, format!("outer base64: {e}")))?;
    let inner = std::str::from_utf8(&outer).map_err(|e| malformed(secret, format!("inner payload: {e}")))?;
    let payload = STANDARD
        .decode(inner.trim())
        .map_err(|e| malformed(secret, format!("inner base64: {e}")))?;

    // Helm only compresses when the payload carries the gzip header
    let json = if payload.starts_with(&GZIP_MAGIC) {
        let mut json = String::new();
        GzDecoder::new(payload.as_slice())
            .read_to_string(&mut json)
            .map_err(|e| malformed(secret, format!("gzip: {e}")))?;
        json
    } else {
        String::from_utf8(payload).map_err(|e| malformed(secret, format!("payload: {e}")))?
    };

    let raw: RawRelease = serde_json::from_str(&json).map_err(|e| malformed(secret, format!("release JSON: {e}")))?;
    Ok(raw.into())
}

/// Decode every secret of a collection; the first malformed one fails the whole set
pub fn decode_releases(items: &[Item]) -> Result<Vec<HelmRelease>> {
    items
        .iter()
        .map(|item| {
            let encoded = item
                .object()
                .pointer("/data/release")
                .and_then(Value::as_str)
                .ok_or_else(|| malformed(item.name(), "release data is missing"))?;
            decode_release(item.name(), encoded)
        })
        .collect()
}
