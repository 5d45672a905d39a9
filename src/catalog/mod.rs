//! Resource catalog: which resource kinds are collected for each runtime type

use crate::error::{Result, SupportError};
use std::fmt;
use std::str::FromStr;

/// Deployment topology of the platform being collected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeType {
    Pipelines,
    GitOps,
    OnPrem,
}

impl RuntimeType {
    pub const ALL: [RuntimeType; 3] = [RuntimeType::Pipelines, RuntimeType::GitOps, RuntimeType::OnPrem];

    /// Human-readable name used in prompts and progress output
    pub fn display_name(&self) -> &'static str {
        match self {
            RuntimeType::Pipelines => "Pipelines Runtime",
            RuntimeType::GitOps => "GitOps Runtime",
            RuntimeType::OnPrem => "On-Prem",
        }
    }

    /// Short lowercase name used in paths and on the command line
    pub fn slug(&self) -> &'static str {
        match self {
            RuntimeType::Pipelines => "pipelines",
            RuntimeType::GitOps => "gitops",
            RuntimeType::OnPrem => "onprem",
        }
    }
}

impl fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for RuntimeType {
    type Err = SupportError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        RuntimeType::ALL
            .into_iter()
            .find(|rt| {
                rt.slug().eq_ignore_ascii_case(wanted) || rt.display_name().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| SupportError::InvalidRuntimeType(s.to_string()))
    }
}

/// Identifies a Kubernetes API type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiTarget {
    pub group: &'static str,
    pub version: &'static str,
    pub kind: &'static str,
    pub plural: &'static str,
}

impl ApiTarget {
    const fn new(group: &'static str, version: &'static str, kind: &'static str, plural: &'static str) -> Self {
        Self { group, version, kind, plural }
    }

    /// Custom resource whose served version is discovered at fetch time
    const fn custom(group: &'static str, kind: &'static str, plural: &'static str) -> Self {
        Self::new(group, "", kind, plural)
    }

    /// Whether the version must be resolved through API discovery
    pub fn needs_discovery(&self) -> bool {
        self.version.is_empty()
    }

    /// `apiVersion` string (e.g. "v1", "apps/v1")
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.to_string()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// Fully qualified resource name as kubectl expects it (e.g. "deployments.apps")
    pub fn kubectl_resource(&self) -> String {
        if self.group.is_empty() {
            self.plural.to_string()
        } else {
            format!("{}.{}", self.plural, self.group)
        }
    }
}

pub mod targets {
    use super::ApiTarget;

    pub const CONFIG_MAP: ApiTarget = ApiTarget::new("", "v1", "ConfigMap", "configmaps");
    pub const EVENT: ApiTarget = ApiTarget::new("", "v1", "Event", "events");
    pub const NODE: ApiTarget = ApiTarget::new("", "v1", "Node", "nodes");
    pub const PERSISTENT_VOLUME: ApiTarget = ApiTarget::new("", "v1", "PersistentVolume", "persistentvolumes");
    pub const PERSISTENT_VOLUME_CLAIM: ApiTarget =
        ApiTarget::new("", "v1", "PersistentVolumeClaim", "persistentvolumeclaims");
    pub const POD: ApiTarget = ApiTarget::new("", "v1", "Pod", "pods");
    pub const SECRET: ApiTarget = ApiTarget::new("", "v1", "Secret", "secrets");
    pub const SERVICE: ApiTarget = ApiTarget::new("", "v1", "Service", "services");
    pub const SERVICE_ACCOUNT: ApiTarget = ApiTarget::new("", "v1", "ServiceAccount", "serviceaccounts");

    pub const DAEMON_SET: ApiTarget = ApiTarget::new("apps", "v1", "DaemonSet", "daemonsets");
    pub const DEPLOYMENT: ApiTarget = ApiTarget::new("apps", "v1", "Deployment", "deployments");
    pub const STATEFUL_SET: ApiTarget = ApiTarget::new("apps", "v1", "StatefulSet", "statefulsets");

    pub const CRON_JOB: ApiTarget = ApiTarget::new("batch", "v1", "CronJob", "cronjobs");
    pub const JOB: ApiTarget = ApiTarget::new("batch", "v1", "Job", "jobs");

    pub const STORAGE_CLASS: ApiTarget = ApiTarget::new("storage.k8s.io", "v1", "StorageClass", "storageclasses");

    pub const ANALYSIS_RUN: ApiTarget = ApiTarget::custom("argoproj.io", "AnalysisRun", "analysisruns");
    pub const ANALYSIS_TEMPLATE: ApiTarget =
        ApiTarget::custom("argoproj.io", "AnalysisTemplate", "analysistemplates");
    pub const APPLICATION: ApiTarget = ApiTarget::custom("argoproj.io", "Application", "applications");
    pub const APPLICATION_SET: ApiTarget =
        ApiTarget::custom("argoproj.io", "ApplicationSet", "applicationsets");
    pub const APP_PROJECT: ApiTarget = ApiTarget::custom("argoproj.io", "AppProject", "appprojects");
    pub const EVENT_BUS: ApiTarget = ApiTarget::custom("argoproj.io", "EventBus", "eventbus");
    pub const EVENT_SOURCE: ApiTarget = ApiTarget::custom("argoproj.io", "EventSource", "eventsources");
    pub const ROLLOUT: ApiTarget = ApiTarget::custom("argoproj.io", "Rollout", "rollouts");
    pub const SENSOR: ApiTarget = ApiTarget::custom("argoproj.io", "Sensor", "sensors");

    pub const PRODUCT: ApiTarget = ApiTarget::custom("codefresh.io", "Product", "products");
    pub const PROMOTION_FLOW: ApiTarget = ApiTarget::custom("codefresh.io", "PromotionFlow", "promotionflows");
    pub const PROMOTION_POLICY: ApiTarget =
        ApiTarget::custom("codefresh.io", "PromotionPolicy", "promotionpolicies");
    pub const PROMOTION_TEMPLATE: ApiTarget =
        ApiTarget::custom("codefresh.io", "PromotionTemplate", "promotiontemplates");
    pub const RESTRICTED_GIT_SOURCE: ApiTarget =
        ApiTarget::custom("codefresh.io", "RestrictedGitSource", "restrictedgitsources");
}

/// Whether a kind is listed within a namespace or cluster-wide
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Namespaced,
    Cluster,
}

/// Summary tables with a fixed column set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Pods,
    VolumeClaims,
    Volumes,
}

impl TableKind {
    /// File name of the summary at the staging root
    pub fn file_name(&self) -> &'static str {
        match self {
            TableKind::Pods => "PodList.txt",
            TableKind::VolumeClaims => "VolumeClaimsList.txt",
            TableKind::Volumes => "VolumesList.txt",
        }
    }
}

/// How a fetched collection is turned into staged artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Summary table at the staging root, plus the raw record of every item
    Tabular(TableKind),
    /// Raw record of every item
    PerItemGet,
    /// Descriptive text of every item
    PerItemDescribe,
    /// Pod table, container logs and a description of every pod
    LogsAndDescribe,
    /// Chronological event table
    EventLog,
    /// Decoded Helm release summaries
    SecretDecode,
}

/// A category of cluster object collected as one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceKind {
    /// Display name, used both as directory name and log tag
    pub name: &'static str,
    pub target: ApiTarget,
    pub scope: Scope,
    pub label_selector: Option<&'static str>,
    pub policy: Policy,
}

impl ResourceKind {
    pub const fn new(name: &'static str, target: ApiTarget, scope: Scope, policy: Policy) -> Self {
        Self {
            name,
            target,
            scope,
            label_selector: None,
            policy,
        }
    }

    fn namespaced(name: &'static str, target: ApiTarget, policy: Policy) -> Self {
        Self::new(name, target, Scope::Namespaced, policy)
    }

    fn cluster(name: &'static str, target: ApiTarget, policy: Policy) -> Self {
        Self::new(name, target, Scope::Cluster, policy)
    }

    fn with_labels(mut self, selector: &'static str) -> Self {
        self.label_selector = Some(selector);
        self
    }
}

const ACCOUNT_LABEL: &str = "io.codefresh.accountName";
const RUNTIME_CONFIGMAP_LABEL: &str = "app.kubernetes.io/name=cf-runtime";
const HELM_OWNER_LABEL: &str = "owner=helm";

/// Resource kinds to collect for a runtime type, in progress-output order
pub fn resources_for(runtime: RuntimeType) -> Vec<ResourceKind> {
    use targets::*;
    use Policy::*;

    match runtime {
        RuntimeType::Pipelines => vec![
            ResourceKind::namespaced("CronJobs", CRON_JOB, PerItemDescribe),
            ResourceKind::namespaced("Jobs", JOB, PerItemDescribe),
            ResourceKind::namespaced("Deployments", DEPLOYMENT, PerItemDescribe),
            ResourceKind::namespaced("Daemonsets", DAEMON_SET, PerItemDescribe),
            ResourceKind::cluster("Nodes", NODE, PerItemDescribe),
            ResourceKind::cluster("Volumes", PERSISTENT_VOLUME, Tabular(TableKind::Volumes))
                .with_labels(ACCOUNT_LABEL),
            ResourceKind::namespaced("Volumeclaims", PERSISTENT_VOLUME_CLAIM, Tabular(TableKind::VolumeClaims))
                .with_labels(ACCOUNT_LABEL),
            ResourceKind::namespaced("Configmaps", CONFIG_MAP, PerItemDescribe).with_labels(RUNTIME_CONFIGMAP_LABEL),
            ResourceKind::namespaced("Services", SERVICE, PerItemDescribe),
            ResourceKind::namespaced("ServiceAccounts", SERVICE_ACCOUNT, PerItemDescribe),
            ResourceKind::namespaced("Pods", POD, LogsAndDescribe),
            ResourceKind::cluster("Storageclass", STORAGE_CLASS, PerItemDescribe),
            ResourceKind::namespaced("Events", EVENT, EventLog),
            ResourceKind::namespaced("HelmReleases", SECRET, SecretDecode).with_labels(HELM_OWNER_LABEL),
        ],
        RuntimeType::GitOps => vec![
            ResourceKind::namespaced("Applications", APPLICATION, PerItemGet),
            ResourceKind::namespaced("ApplicationSets", APPLICATION_SET, PerItemGet),
            ResourceKind::namespaced("AppProjects", APP_PROJECT, PerItemGet),
            ResourceKind::namespaced("Rollouts", ROLLOUT, PerItemGet),
            ResourceKind::namespaced("AnalysisRuns", ANALYSIS_RUN, PerItemGet),
            ResourceKind::namespaced("AnalysisTemplates", ANALYSIS_TEMPLATE, PerItemGet),
            ResourceKind::namespaced("EventSources", EVENT_SOURCE, PerItemGet),
            ResourceKind::namespaced("Sensors", SENSOR, PerItemGet),
            ResourceKind::namespaced("EventBus", EVENT_BUS, PerItemGet),
            ResourceKind::namespaced("Products", PRODUCT, PerItemGet),
            ResourceKind::namespaced("PromotionFlows", PROMOTION_FLOW, PerItemGet),
            ResourceKind::namespaced("PromotionPolicies", PROMOTION_POLICY, PerItemGet),
            ResourceKind::namespaced("PromotionTemplates", PROMOTION_TEMPLATE, PerItemGet),
            ResourceKind::namespaced("RestrictedGitSources", RESTRICTED_GIT_SOURCE, PerItemGet),
            ResourceKind::namespaced("CronJobs", CRON_JOB, PerItemDescribe),
            ResourceKind::namespaced("Jobs", JOB, PerItemDescribe),
            ResourceKind::namespaced("Deployments", DEPLOYMENT, PerItemDescribe),
            ResourceKind::namespaced("Daemonsets", DAEMON_SET, PerItemDescribe),
            ResourceKind::namespaced("Statefulsets", STATEFUL_SET, PerItemDescribe),
            ResourceKind::cluster("Nodes", NODE, PerItemDescribe),
            ResourceKind::namespaced("Configmaps", CONFIG_MAP, PerItemDescribe),
            ResourceKind::namespaced("Services", SERVICE, PerItemDescribe),
            ResourceKind::namespaced("ServiceAccounts", SERVICE_ACCOUNT, PerItemDescribe),
            ResourceKind::namespaced("Pods", POD, LogsAndDescribe),
            ResourceKind::namespaced("Events", EVENT, EventLog),
            ResourceKind::namespaced("HelmReleases", SECRET, SecretDecode).with_labels(HELM_OWNER_LABEL),
        ],
        RuntimeType::OnPrem => vec![
            ResourceKind::namespaced("CronJobs", CRON_JOB, PerItemDescribe),
            ResourceKind::namespaced("Jobs", JOB, PerItemDescribe),
            ResourceKind::namespaced("Deployments", DEPLOYMENT, PerItemDescribe),
            ResourceKind::namespaced("Daemonsets", DAEMON_SET, PerItemDescribe),
            ResourceKind::cluster("Nodes", NODE, PerItemDescribe),
            ResourceKind::cluster("Volumes", PERSISTENT_VOLUME, Tabular(TableKind::Volumes))
                .with_labels(ACCOUNT_LABEL),
            ResourceKind::namespaced("Volumeclaims", PERSISTENT_VOLUME_CLAIM, Tabular(TableKind::VolumeClaims))
                .with_labels(ACCOUNT_LABEL),
            ResourceKind::namespaced("Configmaps", CONFIG_MAP, PerItemDescribe),
            ResourceKind::namespaced("Services", SERVICE, PerItemDescribe),
            ResourceKind::namespaced("ServiceAccounts", SERVICE_ACCOUNT, PerItemDescribe),
            ResourceKind::namespaced("Pods", POD, LogsAndDescribe),
            ResourceKind::cluster("Storageclass", STORAGE_CLASS, PerItemDescribe),
            ResourceKind::namespaced("Events", EVENT, EventLog),
            ResourceKind::namespaced("HelmReleases", SECRET, SecretDecode).with_labels(HELM_OWNER_LABEL),
        ],
    }
}

/// Like [`resources_for`], for a runtime type given by name
pub fn resources_for_name(runtime: &str) -> Result<Vec<ResourceKind>> {
    runtime.parse().map(resources_for)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kubectl_resource_names() {
        assert_eq!(targets::POD.kubectl_resource(), "pods");
        assert_eq!(targets::DEPLOYMENT.kubectl_resource(), "deployments.apps");
        assert_eq!(targets::STORAGE_CLASS.kubectl_resource(), "storageclasses.storage.k8s.io");
    }

    #[test]
    fn test_api_version() {
        assert_eq!(targets::NODE.api_version(), "v1");
        assert_eq!(targets::DEPLOYMENT.api_version(), "apps/v1");
    }

    #[test]
    fn test_custom_targets_need_discovery() {
        assert!(targets::APPLICATION.needs_discovery());
        assert!(targets::PRODUCT.needs_discovery());
        assert!(!targets::POD.needs_discovery());
    }
}
