//! Per-kind processing of fetched collections into staged artifacts

pub mod events;
pub mod helm;
pub mod tables;

use crate::catalog::{Policy, ResourceKind, TableKind};
use crate::cluster::{ClusterContext, FetchedCollection, Item};
use crate::error::Result;
use crate::limiter::ConcurrencyLimiter;
use crate::writer::StagingDir;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

pub const GET_SUFFIX: &str = "_get.yaml";
pub const DESCRIBE_SUFFIX: &str = "_describe.txt";
pub const LOG_SUFFIX: &str = "_log.log";
pub const EVENTS_FILE: &str = "Events.txt";
pub const HELM_RELEASES_FILE: &str = "HelmReleases.yaml";

/// One item-level operation that failed without stopping its siblings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub item: String,
    pub error: String,
}

/// What processing one kind produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindOutcome {
    pub items: usize,
    pub artifacts: Vec<PathBuf>,
    pub failures: Vec<ItemFailure>,
}

/// A single fanned-out operation
enum Job<'a> {
    Get(&'a Item),
    Describe(&'a Item),
    Log { pod: &'a str, container: String },
}

impl Job<'_> {
    fn label(&self) -> String {
        match self {
            Job::Get(item) | Job::Describe(item) => item.name().to_string(),
            Job::Log { pod, container } => format!("{pod}/{container}"),
        }
    }
}

/// Turns fetched collections into files under the staging directory
pub struct KindProcessor {
    cluster: ClusterContext,
    limiter: Arc<ConcurrencyLimiter>,
    staging: StagingDir,
    namespace: String,
    now: DateTime<Utc>,
}

impl KindProcessor {
    /// `now` is the reference time for every age column of the run
    pub fn new(
        cluster: ClusterContext,
        limiter: Arc<ConcurrencyLimiter>,
        staging: StagingDir,
        namespace: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            cluster,
            limiter,
            staging,
            namespace: namespace.into(),
            now,
        }
    }

    /// Process one collection according to its kind's policy
    ///
    /// Per-item failures are recorded in the outcome. An error is returned only
    /// when the kind as a whole produced nothing useful: a summary file could
    /// not be written, or a Helm release could not be decoded.
    pub async fn process(&self, kind: &ResourceKind, collection: &FetchedCollection) -> Result<KindOutcome> {
        let items = &collection.items;
        let mut outcome = KindOutcome {
            items: items.len(),
            ..KindOutcome::default()
        };

        match kind.policy {
            Policy::Tabular(table) => {
                outcome.artifacts.push(self.write_table(table, items).await?);
                let jobs = items.iter().map(Job::Get).collect();
                self.fan_out(kind, jobs, &mut outcome).await;
            }
            Policy::PerItemGet => {
                let jobs = items.iter().map(Job::Get).collect();
                self.fan_out(kind, jobs, &mut outcome).await;
            }
            Policy::PerItemDescribe => {
                let jobs = items.iter().map(Job::Describe).collect();
                self.fan_out(kind, jobs, &mut outcome).await;
            }
            Policy::LogsAndDescribe => {
                outcome.artifacts.push(self.write_table(TableKind::Pods, items).await?);
                let mut jobs = Vec::new();
                for pod in items {
                    for container in pod.container_names() {
                        jobs.push(Job::Log {
                            pod: pod.name(),
                            container,
                        });
                    }
                    jobs.push(Job::Describe(pod));
                }
                self.fan_out(kind, jobs, &mut outcome).await;
            }
            Policy::EventLog => {
                let path = self.staging.root_file(EVENTS_FILE);
                let table = events::render_events(items, self.now);
                self.staging.writer().write_text(&path, &table).await?;
                outcome.artifacts.push(path);
            }
            Policy::SecretDecode => {
                let releases = helm::decode_releases(items)?;
                let path = self.staging.root_file(HELM_RELEASES_FILE);
                self.staging.writer().write_yaml(&path, &releases).await?;
                outcome.artifacts.push(path);
            }
        }

        Ok(outcome)
    }

    async fn write_table(&self, table: TableKind, items: &[Item]) -> Result<PathBuf> {
        let path = self.staging.root_file(table.file_name());
        let content = tables::render(table, items, self.now);
        self.staging.writer().write_text(&path, &content).await?;
        Ok(path)
    }

    /// Run all jobs together, each holding a slot of the kind's pool
    async fn fan_out(&self, kind: &ResourceKind, jobs: Vec<Job<'_>>, outcome: &mut KindOutcome) {
        let results = join_all(jobs.into_iter().map(|job| async move {
            let result = match self.limiter.run(kind.name, self.run_job(kind, &job)).await {
                Ok(inner) => inner,
                Err(e) => Err(e),
            };
            (job.label(), result)
        }))
        .await;

        for (label, result) in results {
            match result {
                Ok(path) => outcome.artifacts.push(path),
                Err(e) => {
                    warn!(kind = kind.name, item = %label, error = %e, "item processing failed");
                    outcome.failures.push(ItemFailure {
                        item: label,
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    async fn run_job(&self, kind: &ResourceKind, job: &Job<'_>) -> Result<PathBuf> {
        let writer = self.staging.writer();
        match job {
            Job::Get(item) => {
                let path = self.staging.item_path(kind.name, item.name(), GET_SUFFIX);
                writer.write_yaml(&path, &without_managed_fields(item.object())).await?;
                Ok(path)
            }
            Job::Describe(item) => {
                let text = self
                    .cluster
                    .describer
                    .describe(kind, &self.namespace, item.name())
                    .await?;
                let path = self.staging.item_path(kind.name, item.name(), DESCRIBE_SUFFIX);
                writer.write_text(&path, &text).await?;
                Ok(path)
            }
            Job::Log { pod, container } => {
                // Logs are best-effort: the error becomes the log content
                let text = match self.cluster.logs.logs(&self.namespace, pod, container).await {
                    Ok(text) => text,
                    Err(e) => {
                        debug!(pod = %pod, container = %container, error = %e, "log retrieval failed");
                        e.to_string()
                    }
                };
                let suffix = format!("_{container}{LOG_SUFFIX}");
                let path = self.staging.item_path(kind.name, pod, &suffix);
                writer.write_text(&path, &text).await?;
                Ok(path)
            }
        }
    }
}

/// Copy of a record with the server-side field ownership bookkeeping removed
fn without_managed_fields(object: &Value) -> Value {
    let mut object = object.clone();
    if let Some(metadata) = object.get_mut("metadata").and_then(Value::as_object_mut) {
        metadata.remove("managedFields");
    }
    object
}
