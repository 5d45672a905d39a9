//! Kubernetes client construction

use crate::error::{Result, SupportError};
use k8s_openapi::api::core::v1::Namespace;
use kube::api::ListParams;
use kube::{config::KubeConfigOptions, Api, Client, Config};

/// Create a Kubernetes client for the specified context
pub async fn create_client(context: Option<&str>) -> Result<Client> {
    let config = load_config(context).await?;
    Client::try_from(config).map_err(SupportError::from)
}

/// Load Kubernetes configuration
async fn load_config(context: Option<&str>) -> Result<Config> {
    let options = KubeConfigOptions {
        context: context.map(String::from),
        ..Default::default()
    };

    Config::from_kubeconfig(&options)
        .await
        .map_err(|e| SupportError::Config(format!("Failed to load kubeconfig: {e}")))
}

/// Names of all namespaces, sorted
pub async fn list_namespaces(client: &Client) -> Result<Vec<String>> {
    let api: Api<Namespace> = Api::all(client.clone());
    let mut names: Vec<String> = api
        .list(&ListParams::default())
        .await?
        .items
        .into_iter()
        .filter_map(|ns| ns.metadata.name)
        .collect();
    names.sort();
    Ok(names)
}

/// Fail with `NamespaceNotFound` unless `namespace` exists
pub async fn ensure_namespace(client: &Client, namespace: &str) -> Result<()> {
    let api: Api<Namespace> = Api::all(client.clone());
    match api.get_opt(namespace).await? {
        Some(_) => Ok(()),
        None => Err(SupportError::NamespaceNotFound(namespace.to_string())),
    }
}
