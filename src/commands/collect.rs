//! Support data collection for one runtime

use super::prompt::Prompter;
use crate::catalog::RuntimeType;
use crate::client::{create_client, ensure_namespace, list_namespaces};
use crate::cluster::{Backend, ClusterContext};
use crate::collector::{CollectionOrchestrator, CollectionReport, KindStatus};
use crate::config::load_credentials;
use crate::error::{Result, SupportError};
use crate::limiter::ConcurrencyLimiter;
use crate::package::PackagingStage;
use crate::platform::{runtime_name, runtime_namespace, save_document, PlatformClient, RUNTIME_SPEC_FILE};
use crate::writer::StagingDir;
use chrono::Utc;
use kube::Client;
use owo_colors::OwoColorize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// File recording which tool version produced a bundle
pub const VERSION_FILE: &str = "cf-support-version.txt";

/// Everything one collection run needs to know up front
#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub runtime: RuntimeType,
    pub namespace: Option<String>,
    /// Pipelines runtime environment whose spec is collected
    pub runtime_name: Option<String>,
    pub context: Option<String>,
    pub output_dir: PathBuf,
    pub concurrency: usize,
    pub backend: Backend,
    pub assume_yes: bool,
}

/// Collect, package and report; returns the archive path
pub async fn collect(options: &CollectOptions, prompter: &dyn Prompter) -> Result<PathBuf> {
    let runtime = options.runtime;
    let platform = platform_client(runtime, options.assume_yes, prompter)?;

    // The Pipelines runtime spec names the namespace its builds run in
    let runtime_spec = match (&platform, runtime) {
        (Some(platform), RuntimeType::Pipelines) => {
            pipelines_runtime_spec(platform, options.runtime_name.as_deref(), prompter).await?
        }
        _ => None,
    };
    let namespace_hint = options
        .namespace
        .as_deref()
        .or_else(|| runtime_spec.as_ref().and_then(runtime_namespace));

    let client = create_client(options.context.as_deref()).await?;
    let namespace = resolve_namespace(&client, namespace_hint, prompter).await?;

    let now = Utc::now();
    let staging = StagingDir::timestamped(&options.output_dir, runtime, now);
    staging.create().await?;

    if let Some(spec) = runtime_spec {
        save_document(&staging, RUNTIME_SPEC_FILE, Ok(spec)).await;
    }
    if let (Some(platform), RuntimeType::OnPrem) = (&platform, runtime) {
        let written = platform.collect_on_prem(&staging).await;
        info!(files = written.len(), "collected On-Prem platform data");
    }

    println!(
        "Gathering data in the '{}' namespace for {}",
        namespace.bold(),
        runtime.display_name().bold()
    );

    let cluster = ClusterContext::from_client(client, options.backend, options.context.as_deref());
    let limiter = Arc::new(ConcurrencyLimiter::new(options.concurrency));
    let report = CollectionOrchestrator::new(cluster, limiter)
        .run(runtime, &namespace, &staging, now)
        .await?;

    write_version_file(&staging).await?;
    print_summary(&report);

    package(&staging).await
}

/// Platform client for this run, or `None` when running cluster-only
///
/// GitOps runtimes have no platform data to collect.
/// On-Prem refuses the hosted platform outright, and asks before going on
/// without platform data.
fn platform_client(runtime: RuntimeType, assume_yes: bool, prompter: &dyn Prompter) -> Result<Option<PlatformClient>> {
    if runtime == RuntimeType::GitOps {
        return Ok(None);
    }

    let credentials = match load_credentials() {
        Ok(credentials) => credentials,
        Err(e @ SupportError::CredentialsNotFound(_)) => {
            warn!(error = %e, "continuing without platform data");
            if runtime == RuntimeType::OnPrem
                && !assume_yes
                && !prompter.confirm("Continue without On-Prem platform data?")?
            {
                return Err(SupportError::Cancelled);
            }
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let platform = PlatformClient::new(credentials);
    if runtime == RuntimeType::OnPrem {
        platform.ensure_on_prem()?;
    }
    Ok(Some(platform))
}

/// Use the given namespace if it exists, otherwise ask for one
pub async fn resolve_namespace(client: &Client, namespace: Option<&str>, prompter: &dyn Prompter) -> Result<String> {
    if let Some(namespace) = namespace {
        ensure_namespace(client, namespace).await?;
        return Ok(namespace.to_string());
    }

    let namespaces = list_namespaces(client).await?;
    let index = prompter.select("Which Namespace Is Codefresh Installed In?", &namespaces)?;
    Ok(namespaces[index].clone())
}

/// Spec of the named Pipelines runtime, or of one the operator picks
///
/// Platform failures are logged and yield `None`.
async fn pipelines_runtime_spec(
    platform: &PlatformClient,
    name: Option<&str>,
    prompter: &dyn Prompter,
) -> Result<Option<Value>> {
    if let Some(name) = name {
        return Ok(match platform.runtime_environment(name).await {
            Ok(spec) => Some(spec),
            Err(e) => {
                warn!(runtime = name, error = %e, "could not fetch runtime environment");
                None
            }
        });
    }

    let runtimes = match platform.runtime_environments().await {
        Ok(value) => value.as_array().cloned().unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, "could not list runtime environments");
            return Ok(None);
        }
    };
    if runtimes.is_empty() {
        return Ok(None);
    }

    let names: Vec<String> = runtimes
        .iter()
        .map(|rt| runtime_name(rt).unwrap_or(crate::cluster::UNKNOWN_NAME).to_string())
        .collect();
    let index = prompter.select("Which Pipelines Runtime Are We Working With?", &names)?;
    Ok(runtimes.into_iter().nth(index))
}

/// Record the producing tool's version at the staging root
pub async fn write_version_file(staging: &StagingDir) -> Result<PathBuf> {
    let path = staging.root_file(VERSION_FILE);
    let content = format!("{}\n", env!("CARGO_PKG_VERSION"));
    staging.writer().write_text(&path, &content).await?;
    Ok(path)
}

fn print_summary(report: &CollectionReport) {
    println!();
    println!("{}", "Collection Summary".bold());
    for kind in &report.kinds {
        match &kind.status {
            KindStatus::Collected {
                items, item_failures, ..
            } if item_failures.is_empty() => {
                println!("  {:<22} {}", kind.kind, format!("{items} items").green());
            }
            KindStatus::Collected {
                items, item_failures, ..
            } => {
                println!(
                    "  {:<22} {}",
                    kind.kind,
                    format!("{items} items, {} failed", item_failures.len()).yellow()
                );
            }
            KindStatus::FetchFailed { .. } => println!("  {:<22} {}", kind.kind, "not collected".yellow()),
            KindStatus::Failed { .. } => println!("  {:<22} {}", kind.kind, "failed".red()),
        }
    }
    if !report.is_complete() {
        println!("Details are in {}.", crate::collector::REPORT_FILE);
    }
}

/// Archive the staging tree and tell the operator what to do with the result
pub async fn package(staging: &StagingDir) -> Result<PathBuf> {
    println!();
    println!(
        "{}",
        "Please review the collected data for sensitive information before sharing it.".yellow()
    );

    match PackagingStage::default().finalize(staging).await {
        Ok(archive) => {
            println!(
                "Please attach {} to your support ticket.",
                archive.display().to_string().green()
            );
            Ok(archive)
        }
        Err(e) => {
            print_manual_packaging_help(staging.root());
            Err(e)
        }
    }
}

fn print_manual_packaging_help(staging: &Path) {
    println!(
        "{} Please compress {} manually and attach it to your support ticket.",
        "Packaging failed.".red(),
        staging.display()
    );
}
