// Common test utilities: in-memory cluster fakes and JSON fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use cf_support::catalog::ResourceKind;
use cf_support::cluster::{ClusterContext, DescribeProvider, FetchedCollection, Item, LogProvider, ResourceSource};
use cf_support::error::{Result, SupportError};
use chrono::{DateTime, TimeZone, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Fixed reference time for every test run
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

/// RFC 3339 timestamp `minutes` before [`now`]
pub fn minutes_ago(minutes: i64) -> String {
    (now() - chrono::Duration::minutes(minutes))
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}

// ============================================================================
// Fakes
// ============================================================================

/// Serves canned collections by kind name; unknown kinds are empty
#[derive(Default)]
pub struct FakeSource {
    collections: HashMap<String, Vec<Value>>,
    failing: HashSet<String>,
    requests: Mutex<Vec<(String, String)>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: &str, items: Vec<Value>) -> Self {
        self.collections.insert(kind.to_string(), items);
        self
    }

    pub fn failing(mut self, kind: &str) -> Self {
        self.failing.insert(kind.to_string());
        self
    }

    /// (kind, namespace) pairs listed so far
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResourceSource for FakeSource {
    async fn list(&self, kind: &ResourceKind, namespace: &str) -> Result<FetchedCollection> {
        self.requests
            .lock()
            .unwrap()
            .push((kind.name.to_string(), namespace.to_string()));

        if self.failing.contains(kind.name) {
            return Err(SupportError::fetch_failed(kind.name, "the server could not find the requested resource"));
        }

        let items = self
            .collections
            .get(kind.name)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(Item::new)
            .collect();
        Ok(FetchedCollection::new(kind.name, items))
    }
}

/// Describes every item as one line; tracks peak concurrency
#[derive(Default)]
pub struct FakeDescriber {
    failing: HashSet<String>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    delay: Option<Duration>,
}

impl FakeDescriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Highest number of describe calls observed in flight at once
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DescribeProvider for FakeDescriber {
    async fn describe(&self, kind: &ResourceKind, namespace: &str, name: &str) -> Result<String> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);

        match self.delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(name) {
            return Err(SupportError::Subprocess {
                command: format!("kubectl describe {} {}", kind.target.kubectl_resource(), name),
                stderr: format!("Error from server (NotFound): {name} not found"),
            });
        }
        Ok(format!("Name: {name}\nNamespace: {namespace}\nKind: {}\n", kind.target.kind))
    }
}

/// Serves `log of {pod}/{container}`, failing for chosen containers
#[derive(Default)]
pub struct FakeLogs {
    failing: HashSet<(String, String)>,
}

impl FakeLogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, pod: &str, container: &str) -> Self {
        self.failing.insert((pod.to_string(), container.to_string()));
        self
    }
}

#[async_trait]
impl LogProvider for FakeLogs {
    async fn logs(&self, _namespace: &str, pod: &str, container: &str) -> Result<String> {
        if self.failing.contains(&(pod.to_string(), container.to_string())) {
            return Err(SupportError::Subprocess {
                command: format!("kubectl logs {pod} -c {container}"),
                stderr: format!("container \"{container}\" in pod \"{pod}\" is waiting to start"),
            });
        }
        Ok(format!("log of {pod}/{container}\n"))
    }
}

pub fn context(source: FakeSource, describer: FakeDescriber, logs: FakeLogs) -> ClusterContext {
    ClusterContext::new(Arc::new(source), Arc::new(describer), Arc::new(logs))
}

pub fn context_with(source: FakeSource) -> ClusterContext {
    context(source, FakeDescriber::new(), FakeLogs::new())
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn pod(name: &str, containers: &[&str], created: &str) -> Value {
    let containers: Vec<Value> = containers.iter().map(|c| json!({"name": c, "image": "busybox"})).collect();
    let statuses: Vec<Value> = containers
        .iter()
        .map(|c| json!({"name": c["name"], "ready": true, "restartCount": 1, "image": "busybox", "imageID": ""}))
        .collect();
    json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {"name": name, "namespace": "codefresh", "creationTimestamp": created},
        "spec": {"containers": containers},
        "status": {"phase": "Running", "containerStatuses": statuses}
    })
}

pub fn pod_with_init(name: &str, init: &[&str], containers: &[&str], created: &str) -> Value {
    let mut pod = pod(name, containers, created);
    pod["spec"]["initContainers"] = init.iter().map(|c| json!({"name": c})).collect();
    pod
}

pub fn volume_claim(name: &str, created: &str) -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "PersistentVolumeClaim",
        "metadata": {
            "name": name,
            "namespace": "codefresh",
            "creationTimestamp": created,
            "managedFields": [{"manager": "kube-controller-manager", "operation": "Update"}]
        },
        "spec": {
            "accessModes": ["ReadWriteOnce"],
            "resources": {"requests": {"storage": "20Gi"}},
            "storageClassName": "dind-ebs",
            "volumeName": format!("pvc-{name}")
        },
        "status": {"phase": "Bound"}
    })
}

pub fn volume(name: &str, claim: Option<&str>, created: &str) -> Value {
    let mut pv = json!({
        "apiVersion": "v1",
        "kind": "PersistentVolume",
        "metadata": {"name": name, "creationTimestamp": created},
        "spec": {
            "capacity": {"storage": "20Gi"},
            "accessModes": ["ReadWriteOnce"],
            "persistentVolumeReclaimPolicy": "Delete",
            "storageClassName": "dind-ebs"
        },
        "status": {"phase": "Bound"}
    });
    if let Some(claim) = claim {
        pv["spec"]["claimRef"] = json!({"namespace": "codefresh", "name": claim});
    }
    pv
}

pub fn event(name: &str, created: Option<&str>, reason: &str, object: &str) -> Value {
    let mut metadata = json!({"name": name, "namespace": "codefresh"});
    if let Some(created) = created {
        metadata["creationTimestamp"] = json!(created);
    }
    json!({
        "apiVersion": "v1",
        "kind": "Event",
        "metadata": metadata,
        "involvedObject": {"kind": "Pod", "name": object},
        "reason": reason,
        "type": "Normal",
        "message": format!("{reason} {object}"),
        "lastTimestamp": created
    })
}

pub fn config_map(name: &str) -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": {"name": name, "namespace": "codefresh"},
        "data": {"key": "value"}
    })
}

/// Release document as Helm stores it
pub fn helm_release_json(name: &str, revision: i64) -> Value {
    json!({
        "name": name,
        "namespace": "codefresh",
        "version": revision,
        "info": {"last_deployed": "2024-04-30T10:00:00Z", "status": "deployed"},
        "chart": {"metadata": {"name": "cf-runtime", "version": "6.3.1", "appVersion": "1.0.0"}},
        "manifest": "---\n"
    })
}

/// `base64(base64(gzip(json)))`, the value of `data.release` as served by the API
pub fn encode_release(release: &Value) -> String {
    let mut gz = GzEncoder::new(Vec::new(), Compression::default());
    gz.write_all(release.to_string().as_bytes()).unwrap();
    let compressed = gz.finish().unwrap();
    STANDARD.encode(STANDARD.encode(compressed))
}

pub fn helm_secret(name: &str, encoded_release: &str) -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "type": "helm.sh/release.v1",
        "metadata": {"name": name, "namespace": "codefresh", "labels": {"owner": "helm"}},
        "data": {"release": encoded_release}
    })
}
