//! Collection orchestration
//!
//! Walks the catalog of one runtime type, fetches every kind and hands the
//! collection to the [`KindProcessor`]. Kinds run one after another; a kind
//! that cannot be fetched or processed is recorded in the report and the run
//! moves on.

use crate::catalog::{resources_for, ResourceKind, RuntimeType};
use crate::cluster::ClusterContext;
use crate::error::{Result, SupportError};
use crate::limiter::ConcurrencyLimiter;
use crate::processor::{ItemFailure, KindProcessor};
use crate::writer::StagingDir;
use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Report file written at the staging root
pub const REPORT_FILE: &str = "collection-report.yaml";

/// How one kind fared
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum KindStatus {
    Collected {
        items: usize,
        artifacts: usize,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        item_failures: Vec<ItemFailure>,
    },
    FetchFailed {
        message: String,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindReport {
    pub kind: String,
    #[serde(flatten)]
    pub status: KindStatus,
}

impl KindReport {
    pub fn is_collected(&self) -> bool {
        matches!(self.status, KindStatus::Collected { .. })
    }
}

/// Outcome of a whole collection run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionReport {
    pub runtime: String,
    pub namespace: String,
    pub collected_at: DateTime<Utc>,
    pub staging_root: PathBuf,
    pub kinds: Vec<KindReport>,
}

impl CollectionReport {
    /// Kinds that produced nothing
    pub fn failed_kinds(&self) -> Vec<&KindReport> {
        self.kinds.iter().filter(|k| !k.is_collected()).collect()
    }

    /// True when every kind was collected without any item failure
    pub fn is_complete(&self) -> bool {
        self.kinds.iter().all(|k| {
            matches!(&k.status, KindStatus::Collected { item_failures, .. } if item_failures.is_empty())
        })
    }

    pub fn kind(&self, name: &str) -> Option<&KindReport> {
        self.kinds.iter().find(|k| k.kind == name)
    }
}

/// Runs the catalog of one runtime type against a cluster
pub struct CollectionOrchestrator {
    cluster: ClusterContext,
    limiter: Arc<ConcurrencyLimiter>,
    progress: bool,
}

impl CollectionOrchestrator {
    pub fn new(cluster: ClusterContext, limiter: Arc<ConcurrencyLimiter>) -> Self {
        Self {
            cluster,
            limiter,
            progress: true,
        }
    }

    /// Toggle the per-kind console progress lines
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Collect every kind of `runtime` into `staging`
    ///
    /// Only failing to create the staging root aborts the run.
    pub async fn run(
        &self,
        runtime: RuntimeType,
        namespace: &str,
        staging: &StagingDir,
        now: DateTime<Utc>,
    ) -> Result<CollectionReport> {
        staging.create().await?;
        info!(runtime = %runtime, namespace, staging = %staging.root().display(), "starting collection");

        let processor = KindProcessor::new(
            self.cluster.clone(),
            self.limiter.clone(),
            staging.clone(),
            namespace,
            now,
        );

        let mut kinds = Vec::new();
        for kind in resources_for(runtime) {
            if self.progress {
                println!("Gathering {}...", kind.name.cyan());
            }
            let status = self.collect_kind(&processor, &kind, namespace).await;
            if self.progress {
                print_status(&kind, &status);
            }
            kinds.push(KindReport {
                kind: kind.name.to_string(),
                status,
            });
        }

        let report = CollectionReport {
            runtime: runtime.slug().to_string(),
            namespace: namespace.to_string(),
            collected_at: now,
            staging_root: staging.root().to_path_buf(),
            kinds,
        };

        let report_path = staging.root_file(REPORT_FILE);
        if let Err(e) = staging.writer().write_yaml(&report_path, &report).await {
            warn!(error = %e, "could not write collection report");
        }

        Ok(report)
    }

    async fn collect_kind(&self, processor: &KindProcessor, kind: &ResourceKind, namespace: &str) -> KindStatus {
        let collection = match self.cluster.source.list(kind, namespace).await {
            Ok(collection) => collection,
            Err(e) => {
                warn!(kind = kind.name, error = %e, "fetch failed, skipping kind");
                let message = match e {
                    SupportError::FetchFailed { message, .. } => message,
                    other => other.to_string(),
                };
                return KindStatus::FetchFailed { message };
            }
        };

        match processor.process(kind, &collection).await {
            Ok(outcome) => {
                info!(
                    kind = kind.name,
                    items = outcome.items,
                    artifacts = outcome.artifacts.len(),
                    failures = outcome.failures.len(),
                    "kind collected"
                );
                KindStatus::Collected {
                    items: outcome.items,
                    artifacts: outcome.artifacts.len(),
                    item_failures: outcome.failures,
                }
            }
            Err(e) => {
                warn!(kind = kind.name, error = %e, "processing failed, skipping kind");
                KindStatus::Failed { message: e.to_string() }
            }
        }
    }
}

fn print_status(kind: &ResourceKind, status: &KindStatus) {
    match status {
        KindStatus::Collected { items, item_failures, .. } if item_failures.is_empty() => {
            println!("  {} {} items", "ok".green(), items);
        }
        KindStatus::Collected { items, item_failures, .. } => {
            println!(
                "  {} {} items, {} failed",
                "partial".yellow(),
                items,
                item_failures.len()
            );
        }
        KindStatus::FetchFailed { message } => {
            println!("  {} could not fetch {}: {}", "skipped".yellow(), kind.name, message);
        }
        KindStatus::Failed { message } => {
            println!("  {} {}", "failed".red(), message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(kinds: Vec<KindReport>) -> CollectionReport {
        CollectionReport {
            runtime: "pipelines".to_string(),
            namespace: "cf".to_string(),
            collected_at: DateTime::<Utc>::UNIX_EPOCH,
            staging_root: PathBuf::from("/stage"),
            kinds,
        }
    }

    fn collected(kind: &str, failures: usize) -> KindReport {
        KindReport {
            kind: kind.to_string(),
            status: KindStatus::Collected {
                items: 3,
                artifacts: 3 - failures,
                item_failures: (0..failures)
                    .map(|i| ItemFailure {
                        item: format!("item-{i}"),
                        error: "boom".to_string(),
                    })
                    .collect(),
            },
        }
    }

    #[test]
    fn test_report_completeness() {
        assert!(report(vec![collected("Pods", 0), collected("Nodes", 0)]).is_complete());
        assert!(!report(vec![collected("Pods", 1)]).is_complete());

        let skipped = KindReport {
            kind: "Volumes".to_string(),
            status: KindStatus::FetchFailed {
                message: "forbidden".to_string(),
            },
        };
        let report = report(vec![collected("Pods", 0), skipped]);
        assert!(!report.is_complete());
        assert_eq!(report.failed_kinds().len(), 1);
        assert_eq!(report.failed_kinds()[0].kind, "Volumes");
    }

    #[test]
    fn test_report_yaml_is_flat() {
        let yaml = serde_yaml::to_string(&report(vec![collected("Pods", 0)])).unwrap();
        assert!(yaml.contains("kind: Pods"));
        assert!(yaml.contains("status: collected"));
        assert!(!yaml.contains("item_failures"));

        let parsed: CollectionReport = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.kind("Pods").map(KindReport::is_collected), Some(true));
    }
}
