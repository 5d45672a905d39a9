//! Cluster capabilities backed by the Kubernetes API

use super::describe::render_description;
use super::{item_failed, DescribeProvider, FetchedCollection, Item, LogProvider, ResourceSource};
use crate::catalog::{ResourceKind, Scope};
use crate::error::{Result, SupportError};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Event, Pod};
use kube::api::{ApiResource, DynamicObject, ListParams, LogParams};
use kube::core::{GroupVersionKind, TypeMeta};
use kube::{Api, Client};
use tracing::debug;

/// Page size for list calls
const LIST_PAGE_SIZE: u32 = 500;

/// Resolve the API resource for a kind, discovering the served version of custom resources
async fn api_resource(client: &Client, kind: &ResourceKind) -> Result<ApiResource> {
    let target = &kind.target;
    if !target.needs_discovery() {
        let gvk = GroupVersionKind::gvk(target.group, target.version, target.kind);
        return Ok(ApiResource::from_gvk_with_plural(&gvk, target.plural));
    }

    let group = kube::discovery::group(client, target.group).await?;
    group
        .recommended_kind(target.kind)
        .map(|(ar, _caps)| ar)
        .ok_or_else(|| {
            SupportError::fetch_failed(
                kind.name,
                format!("the server doesn't have a resource type \"{}\"", target.kubectl_resource()),
            )
        })
}

fn dynamic_api(client: &Client, kind: &ResourceKind, ar: &ApiResource, namespace: &str) -> Api<DynamicObject> {
    match kind.scope {
        Scope::Namespaced => Api::namespaced_with(client.clone(), namespace, ar),
        Scope::Cluster => Api::all_with(client.clone(), ar),
    }
}

/// Lists any catalog kind through the dynamic API
#[derive(Clone)]
pub struct KubeSource {
    client: Client,
}

impl KubeSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceSource for KubeSource {
    async fn list(&self, kind: &ResourceKind, namespace: &str) -> Result<FetchedCollection> {
        let ar = match api_resource(&self.client, kind).await {
            Ok(ar) => ar,
            Err(e @ SupportError::FetchFailed { .. }) => return Err(e),
            Err(e) => return Err(SupportError::fetch_failed(kind.name, e)),
        };
        let api = dynamic_api(&self.client, kind, &ar, namespace);

        let mut lp = ListParams::default().limit(LIST_PAGE_SIZE);
        if let Some(selector) = kind.label_selector {
            lp = lp.labels(selector);
        }

        let mut items = Vec::new();
        loop {
            let page = api
                .list(&lp)
                .await
                .map_err(|e| SupportError::fetch_failed(kind.name, e))?;

            for mut obj in page.items {
                // List responses omit the type of each item
                if obj.types.is_none() {
                    obj.types = Some(TypeMeta {
                        api_version: ar.api_version.clone(),
                        kind: ar.kind.clone(),
                    });
                }
                items.push(Item::new(serde_json::to_value(&obj)?));
            }

            match page.metadata.continue_ {
                Some(token) if !token.is_empty() => lp = lp.continue_token(&token),
                _ => break,
            }
        }

        debug!(kind = kind.name, count = items.len(), "listed resources");
        Ok(FetchedCollection::new(kind.name, items))
    }
}

/// Renders descriptions from the object and its events
#[derive(Clone)]
pub struct ApiDescriber {
    client: Client,
}

impl ApiDescriber {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn events_for(&self, kind: &ResourceKind, namespace: &str, name: &str) -> Result<Vec<Event>> {
        let api: Api<Event> = match kind.scope {
            Scope::Namespaced => Api::namespaced(self.client.clone(), namespace),
            Scope::Cluster => Api::all(self.client.clone()),
        };
        let fields = format!("involvedObject.name={},involvedObject.kind={}", name, kind.target.kind);
        let list = api.list(&ListParams::default().fields(&fields)).await?;
        Ok(list.items)
    }
}

#[async_trait]
impl DescribeProvider for ApiDescriber {
    async fn describe(&self, kind: &ResourceKind, namespace: &str, name: &str) -> Result<String> {
        let ar = api_resource(&self.client, kind).await?;
        let api = dynamic_api(&self.client, kind, &ar, namespace);
        let obj = api.get(name).await.map_err(|e| item_failed(kind.name, name, e))?;
        let object = serde_json::to_value(&obj)?;

        // Events are best-effort
        let events = match self.events_for(kind, namespace, name).await {
            Ok(events) => events,
            Err(e) => {
                debug!(kind = kind.name, item = name, error = %e, "could not list events");
                Vec::new()
            }
        };

        Ok(render_description(&ar.kind, &object, &events, chrono::Utc::now()))
    }
}

/// Reads container logs through the pod log subresource
#[derive(Clone)]
pub struct ApiLogs {
    client: Client,
}

impl ApiLogs {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LogProvider for ApiLogs {
    async fn logs(&self, namespace: &str, pod: &str, container: &str) -> Result<String> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let lp = LogParams {
            container: Some(container.to_string()),
            timestamps: true,
            ..LogParams::default()
        };
        Ok(api.logs(pod, &lp).await?)
    }
}
