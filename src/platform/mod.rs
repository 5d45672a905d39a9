//! Control-plane HTTP API
//!
//! Read-only queries against the platform API that complement the cluster
//! data: runtime specs for Pipelines, installation-wide summaries for On-Prem.

use crate::config::Credentials;
use crate::error::{Result, SupportError};
use crate::writer::StagingDir;
use reqwest::header::AUTHORIZATION;
use reqwest::Client as HttpClient;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Base URL of the hosted platform, which has no On-Prem admin API
pub const SAAS_BASE_URL: &str = "https://g.codefresh.io/api";

/// Thin authenticated client over the platform API
#[derive(Debug, Clone)]
pub struct PlatformClient {
    http: HttpClient,
    credentials: Credentials,
}

impl PlatformClient {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            http: HttpClient::new(),
            credentials,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.credentials.base_url
    }

    pub fn is_saas(&self) -> bool {
        self.base_url().trim_end_matches('/') == SAAS_BASE_URL
    }

    /// Fail with `NotOnPrem` when pointed at the hosted platform
    pub fn ensure_on_prem(&self) -> Result<()> {
        if self.is_saas() {
            return Err(SupportError::NotOnPrem(self.base_url().to_string()));
        }
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// GET `path` relative to the base URL and parse the JSON body
    pub async fn get_json(&self, path: &str) -> Result<Value> {
        let url = self.url(path);
        debug!(url = %url, "platform request");

        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, &self.credentials.auth_header)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    pub async fn runtime_environments(&self) -> Result<Value> {
        self.get_json("runtime-environments").await
    }

    pub async fn runtime_environment(&self, name: &str) -> Result<Value> {
        self.get_json(&runtime_environment_path(name)).await
    }

    pub async fn accounts(&self) -> Result<Value> {
        self.get_json("admin/accounts").await
    }

    pub async fn runtimes(&self) -> Result<Value> {
        self.get_json("admin/runtime-environments").await
    }

    pub async fn feature_flags(&self) -> Result<Value> {
        self.get_json("admin/features").await
    }

    /// Number of users in the installation
    pub async fn total_users(&self) -> Result<Value> {
        let page = self.get_json("admin/user?limit=1&page=1").await?;
        Ok(page.get("total").cloned().unwrap_or(Value::Null))
    }

    /// Write the On-Prem installation summaries
    pub async fn collect_on_prem(&self, staging: &StagingDir) -> Vec<PathBuf> {
        let fetched = [
            ("OnPrem_Accounts.yaml", self.accounts().await),
            ("OnPrem_Runtimes.yaml", self.runtimes().await),
            ("OnPrem_Feature_Flags.yaml", self.feature_flags().await),
            ("OnPrem_Total_Users.yaml", self.total_users().await),
        ];

        let mut written = Vec::new();
        for (file, document) in fetched {
            written.extend(save_document(staging, file, document).await);
        }
        written
    }
}

/// File holding the selected Pipelines runtime environment
pub const RUNTIME_SPEC_FILE: &str = "Runtime_Spec.yaml";

/// `metadata.name` of a runtime environment document
pub fn runtime_name(runtime: &Value) -> Option<&str> {
    runtime.get("metadata")?.get("name")?.as_str()
}

/// Namespace the runtime schedules builds into
pub fn runtime_namespace(runtime: &Value) -> Option<&str> {
    runtime
        .pointer("/runtimeScheduler/cluster/namespace")?
        .as_str()
        .filter(|ns| !ns.is_empty())
}

/// Write a fetched document at the staging root, logging and skipping on any failure
pub async fn save_document(staging: &StagingDir, file: &str, fetched: Result<Value>) -> Option<PathBuf> {
    let value = match fetched {
        Ok(value) => value,
        Err(e) => {
            warn!(file, error = %e, "platform request failed, skipping");
            return None;
        }
    };

    let path = staging.root_file(file);
    match staging.writer().write_yaml(&path, &value).await {
        Ok(()) => Some(path),
        Err(e) => {
            warn!(file, error = %e, "could not write platform data");
            None
        }
    }
}

fn runtime_environment_path(name: &str) -> String {
    format!("runtime-environments/{}", urlencoding::encode(name))
}
