//! Cluster access capabilities used by the collection pipeline
//!
//! The pipeline never talks to a `kube::Client` directly. It goes through three
//! narrow traits so that describe and log retrieval can be served either by the
//! Kubernetes API or by shelling out to `kubectl`, and so tests can use fakes:
//!
//! - [`ResourceSource`] lists the items of a [`ResourceKind`]
//! - [`DescribeProvider`] renders the descriptive text of one item
//! - [`LogProvider`] reads the log of one container

pub mod api;
pub mod describe;
pub mod kubectl;

use crate::catalog::ResourceKind;
use crate::error::{Result, SupportError};
use async_trait::async_trait;
use kube::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub use api::{ApiDescriber, ApiLogs, KubeSource};
pub use kubectl::{KubectlDescriber, KubectlLogs};

/// Name used for items without `metadata.name`
pub const UNKNOWN_NAME: &str = "<unknown>";

/// One structured resource record
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    name: String,
    object: Value,
}

impl Item {
    pub fn new(object: Value) -> Self {
        let name = object
            .pointer("/metadata/name")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_NAME)
            .to_string();
        Self { name, object }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn object(&self) -> &Value {
        &self.object
    }

    /// Decode into a typed resource (e.g. `k8s_openapi::api::core::v1::Pod`)
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(T::deserialize(&self.object)?)
    }

    /// Names of the containers declared by a pod item, init containers first
    pub fn container_names(&self) -> Vec<String> {
        ["/spec/initContainers", "/spec/containers"]
            .iter()
            .filter_map(|ptr| self.object.pointer(ptr).and_then(Value::as_array))
            .flatten()
            .filter_map(|c| c.get("name").and_then(Value::as_str))
            .map(String::from)
            .collect()
    }
}

impl From<Value> for Item {
    fn from(object: Value) -> Self {
        Item::new(object)
    }
}

/// Result of listing one resource kind
#[derive(Debug, Clone, Default)]
pub struct FetchedCollection {
    pub kind: String,
    pub items: Vec<Item>,
}

impl FetchedCollection {
    /// Nameless items are numbered by position so their artifacts never collide
    pub fn new(kind: impl Into<String>, mut items: Vec<Item>) -> Self {
        for (index, item) in items.iter_mut().enumerate() {
            if item.object.pointer("/metadata/name").and_then(Value::as_str).is_none() {
                item.name = format!("{UNKNOWN_NAME}-{index}");
            }
        }
        Self {
            kind: kind.into(),
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Lists the items of a resource kind
#[async_trait]
pub trait ResourceSource: Send + Sync {
    async fn list(&self, kind: &ResourceKind, namespace: &str) -> Result<FetchedCollection>;
}

/// Produces a human-readable description of a single item
#[async_trait]
pub trait DescribeProvider: Send + Sync {
    async fn describe(&self, kind: &ResourceKind, namespace: &str, name: &str) -> Result<String>;
}

/// Reads the log text of one container
#[async_trait]
pub trait LogProvider: Send + Sync {
    async fn logs(&self, namespace: &str, pod: &str, container: &str) -> Result<String>;
}

/// Where describe output and logs come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Kubernetes API through the client library
    #[default]
    Api,
    /// `kubectl` subprocesses
    Kubectl,
}

/// Cluster capabilities shared by every stage of one run
#[derive(Clone)]
pub struct ClusterContext {
    pub source: Arc<dyn ResourceSource>,
    pub describer: Arc<dyn DescribeProvider>,
    pub logs: Arc<dyn LogProvider>,
}

impl ClusterContext {
    pub fn new(
        source: Arc<dyn ResourceSource>,
        describer: Arc<dyn DescribeProvider>,
        logs: Arc<dyn LogProvider>,
    ) -> Self {
        Self {
            source,
            describer,
            logs,
        }
    }

    /// Build the production context around one client
    ///
    /// `kube_context` is only needed by the `kubectl` backend, which does not
    /// share the client's configuration.
    pub fn from_client(client: Client, backend: Backend, kube_context: Option<&str>) -> Self {
        let source: Arc<dyn ResourceSource> = Arc::new(KubeSource::new(client.clone()));
        match backend {
            Backend::Api => Self::new(
                source,
                Arc::new(ApiDescriber::new(client.clone())),
                Arc::new(ApiLogs::new(client)),
            ),
            Backend::Kubectl => {
                let context = kube_context.map(String::from);
                Self::new(
                    source,
                    Arc::new(KubectlDescriber::default().with_context(context.clone())),
                    Arc::new(KubectlLogs::default().with_context(context)),
                )
            }
        }
    }
}

/// Map any displayable error into an item-level failure
pub(crate) fn item_failed(kind: &str, item: &str, err: impl std::fmt::Display) -> SupportError {
    SupportError::ItemProcessingFailed {
        kind: kind.to_string(),
        item: item.to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_name_from_metadata() {
        let item = Item::new(json!({"metadata": {"name": "cf-api"}}));
        assert_eq!(item.name(), "cf-api");

        let nameless = Item::new(json!({"metadata": {}}));
        assert_eq!(nameless.name(), UNKNOWN_NAME);
    }

    #[test]
    fn test_nameless_items_get_distinct_names() {
        let collection = FetchedCollection::new(
            "ConfigMaps",
            vec![
                Item::new(json!({"metadata": {}})),
                Item::new(json!({"metadata": {"name": "cf-config"}})),
                Item::new(json!({"data": {}})),
            ],
        );
        let names: Vec<&str> = collection.items.iter().map(Item::name).collect();
        assert_eq!(names, vec!["<unknown>-0", "cf-config", "<unknown>-2"]);
    }

    #[test]
    fn test_container_names_include_init_containers() {
        let item = Item::new(json!({
            "metadata": {"name": "runner"},
            "spec": {
                "initContainers": [{"name": "init-volume"}],
                "containers": [{"name": "runner"}, {"name": "sidecar"}]
            }
        }));
        assert_eq!(item.container_names(), vec!["init-volume", "runner", "sidecar"]);
    }

    #[test]
    fn test_container_names_without_spec() {
        let item = Item::new(json!({"metadata": {"name": "x"}}));
        assert!(item.container_names().is_empty());
    }
}
