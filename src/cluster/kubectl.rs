//! Cluster capabilities backed by `kubectl` subprocesses

use super::{DescribeProvider, LogProvider};
use crate::catalog::{ResourceKind, Scope};
use crate::error::{Result, SupportError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Run kubectl with the given arguments and return its stdout
async fn run_kubectl(binary: &Path, context: Option<&str>, args: &[String]) -> Result<String> {
    let mut command = Command::new(binary);
    if let Some(context) = context {
        command.arg("--context").arg(context);
    }
    let output = command.args(args).output().await?;

    if !output.status.success() {
        return Err(SupportError::Subprocess {
            command: format!("{} {}", binary.display(), args.join(" ")),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// `kubectl describe`
#[derive(Debug, Clone)]
pub struct KubectlDescriber {
    binary: PathBuf,
    context: Option<String>,
}

impl KubectlDescriber {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            context: None,
        }
    }

    /// Use a kubeconfig context other than the current one
    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    fn args(kind: &ResourceKind, namespace: &str, name: &str) -> Vec<String> {
        let mut args = vec!["describe".to_string(), kind.target.kubectl_resource()];
        if kind.scope == Scope::Namespaced {
            args.push("-n".to_string());
            args.push(namespace.to_string());
        }
        args.push(name.to_string());
        args
    }
}

impl Default for KubectlDescriber {
    fn default() -> Self {
        Self::new("kubectl")
    }
}

#[async_trait]
impl DescribeProvider for KubectlDescriber {
    async fn describe(&self, kind: &ResourceKind, namespace: &str, name: &str) -> Result<String> {
        run_kubectl(&self.binary, self.context.as_deref(), &Self::args(kind, namespace, name)).await
    }
}

/// `kubectl logs`
#[derive(Debug, Clone)]
pub struct KubectlLogs {
    binary: PathBuf,
    context: Option<String>,
}

impl KubectlLogs {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            context: None,
        }
    }

    /// Use a kubeconfig context other than the current one
    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    fn args(namespace: &str, pod: &str, container: &str) -> Vec<String> {
        ["logs", pod, "-c", container, "-n", namespace, "--timestamps"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

impl Default for KubectlLogs {
    fn default() -> Self {
        Self::new("kubectl")
    }
}

#[async_trait]
impl LogProvider for KubectlLogs {
    async fn logs(&self, namespace: &str, pod: &str, container: &str) -> Result<String> {
        run_kubectl(&self.binary, self.context.as_deref(), &Self::args(namespace, pod, container)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{resources_for, RuntimeType};

    fn kind(name: &str) -> ResourceKind {
        resources_for(RuntimeType::Pipelines)
            .into_iter()
            .find(|k| k.name == name)
            .unwrap()
    }

    #[test]
    fn test_describe_args_namespaced() {
        let args = KubectlDescriber::args(&kind("Deployments"), "codefresh", "cf-api");
        assert_eq!(args, vec!["describe", "deployments.apps", "-n", "codefresh", "cf-api"]);
    }

    #[test]
    fn test_describe_args_cluster_scoped() {
        let args = KubectlDescriber::args(&kind("Nodes"), "codefresh", "node-1");
        assert_eq!(args, vec!["describe", "nodes", "node-1"]);
    }

    #[test]
    fn test_logs_args() {
        let args = KubectlLogs::args("codefresh", "runner-0", "dind");
        assert_eq!(args, vec!["logs", "runner-0", "-c", "dind", "-n", "codefresh", "--timestamps"]);
    }

    #[tokio::test]
    async fn test_missing_binary_is_an_error() {
        let logs = KubectlLogs::new("/nonexistent/kubectl");
        assert!(logs.logs("ns", "pod", "c").await.is_err());
    }
}
