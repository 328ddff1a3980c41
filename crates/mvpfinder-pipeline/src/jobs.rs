//! Background jobs: a runner with an in-memory registry and the service that
//! starts ingestion, analysis and maintenance work on it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mvpfinder_core::ItemStore;
use mvpfinder_llm::{LlmStatus, OllamaClient, PullStatus};
use mvpfinder_sources::SourceClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::analyze::{AnalysisRun, Analyzer};
use crate::ingest::{summarize, Ingestor};

pub type JobId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Ingestion,
    Analysis,
    ModelPull,
    ConnectionTest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub kind: JobKind,
    pub status: JobStatus,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// What a job body reports back: a JSON result, or an error with an optional
/// partial result.
#[derive(Debug)]
pub struct JobFailure {
    pub error: String,
    pub result: Option<Value>,
}

impl From<String> for JobFailure {
    fn from(error: String) -> Self {
        Self {
            error,
            result: None,
        }
    }
}

/// How long a finished record stays queryable.
pub const DEFAULT_JOB_TTL: Duration = Duration::from_secs(60 * 60);
/// Finished records kept at most; the oldest are dropped first.
pub const DEFAULT_MAX_FINISHED_JOBS: usize = 500;

/// Spawns job bodies onto the tokio runtime and tracks their state.
///
/// Records live only as long as the runner. Finished records are pruned on
/// every [`JobRunner::spawn`] once they exceed the TTL or the cap; queued and
/// running records are never pruned.
#[derive(Debug, Clone)]
pub struct JobRunner {
    jobs: Arc<RwLock<HashMap<JobId, JobRecord>>>,
    ttl: Duration,
    max_finished: usize,
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::with_retention(DEFAULT_JOB_TTL, DEFAULT_MAX_FINISHED_JOBS)
    }
}

impl JobRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_retention(ttl: Duration, max_finished: usize) -> Self {
        Self {
            jobs: Arc::default(),
            ttl,
            max_finished,
        }
    }

    /// Registers a queued job and starts `work` in the background.
    pub async fn spawn<F>(&self, kind: JobKind, work: F) -> JobId
    where
        F: Future<Output = Result<Value, JobFailure>> + Send + 'static,
    {
        let id = Uuid::new_v4();
        let mut guard = self.jobs.write().await;
        let pruned = prune_finished(&mut guard, self.ttl, self.max_finished, Utc::now());
        if pruned > 0 {
            tracing::debug!(pruned, retained = guard.len(), "pruned finished jobs");
        }
        guard.insert(
            id,
            JobRecord {
                id,
                kind,
                status: JobStatus::Queued,
                result: None,
                error: None,
                created_at: Utc::now(),
                finished_at: None,
            },
        );
        drop(guard);

        let jobs = Arc::clone(&self.jobs);
        tokio::spawn(async move {
            set_status(&jobs, id, JobStatus::Running).await;
            tracing::info!(job_id = %id, kind = ?kind, "job started");

            // a panicking body surfaces as a join error instead of a job stuck in `running`
            let outcome = match tokio::spawn(work).await {
                Ok(outcome) => outcome,
                Err(e) => Err(JobFailure::from(format!("job aborted: {e}"))),
            };

            let mut guard = jobs.write().await;
            if let Some(record) = guard.get_mut(&id) {
                record.finished_at = Some(Utc::now());
                match outcome {
                    Ok(result) => {
                        record.status = JobStatus::Succeeded;
                        record.result = Some(result);
                        tracing::info!(job_id = %id, kind = ?kind, "job succeeded");
                    }
                    Err(failure) => {
                        tracing::warn!(job_id = %id, kind = ?kind, error = %failure.error, "job failed");
                        record.status = JobStatus::Failed;
                        record.result = failure.result;
                        record.error = Some(failure.error);
                    }
                }
            }
        });

        id
    }

    pub async fn get(&self, id: JobId) -> Option<JobRecord> {
        self.jobs.read().await.get(&id).cloned()
    }
}

/// Drops finished records older than `ttl`, then the oldest finished ones
/// beyond `max_finished`. Returns how many were removed.
fn prune_finished(
    jobs: &mut HashMap<JobId, JobRecord>,
    ttl: Duration,
    max_finished: usize,
    now: DateTime<Utc>,
) -> usize {
    let before = jobs.len();

    if let Ok(ttl) = chrono::Duration::from_std(ttl) {
        jobs.retain(|_, record| !matches!(record.finished_at, Some(at) if now - at >= ttl));
    }

    let mut finished: Vec<(DateTime<Utc>, JobId)> = jobs
        .values()
        .filter_map(|record| record.finished_at.map(|at| (at, record.id)))
        .collect();
    if finished.len() > max_finished {
        finished.sort_unstable();
        let excess = finished.len() - max_finished;
        for (_, id) in finished.into_iter().take(excess) {
            jobs.remove(&id);
        }
    }

    before - jobs.len()
}

async fn set_status(jobs: &RwLock<HashMap<JobId, JobRecord>>, id: JobId, status: JobStatus) {
    if let Some(record) = jobs.write().await.get_mut(&id) {
        record.status = status;
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, JobFailure> {
    serde_json::to_value(value).map_err(|e| JobFailure::from(format!("failed to encode result: {e}")))
}

/// Starts pipeline work in the background against injected clients and store.
#[derive(Clone)]
pub struct JobService {
    runner: JobRunner,
    source: Arc<dyn SourceClient>,
    llm: Arc<OllamaClient>,
    store: Arc<dyn ItemStore>,
    generate_timeout: Duration,
}

impl JobService {
    #[must_use]
    pub fn new(
        source: Arc<dyn SourceClient>,
        llm: Arc<OllamaClient>,
        store: Arc<dyn ItemStore>,
        generate_timeout: Duration,
    ) -> Self {
        Self {
            runner: JobRunner::new(),
            source,
            llm,
            store,
            generate_timeout,
        }
    }

    /// Syncs the given channel ids, or every active channel when `None`.
    pub async fn start_ingestion(&self, channel_ids: Option<Vec<i64>>, limit: usize) -> JobId {
        let source = Arc::clone(&self.source);
        let store = Arc::clone(&self.store);
        self.runner
            .spawn(
                JobKind::Ingestion,
                run_ingestion(source, store, channel_ids, limit),
            )
            .await
    }

    /// Analyzes the given item ids, or the oldest `limit` unanalyzed items.
    pub async fn start_analysis(&self, item_ids: Option<Vec<i64>>, limit: usize) -> JobId {
        let llm = Arc::clone(&self.llm);
        let store = Arc::clone(&self.store);
        self.runner
            .spawn(
                JobKind::Analysis,
                run_analysis(llm, store, item_ids, limit, self.generate_timeout),
            )
            .await
    }

    pub async fn llm_status(&self) -> LlmStatus {
        self.llm.status().await
    }

    /// Downloads the configured model.
    pub async fn start_model_pull(&self) -> JobId {
        self.runner
            .spawn(JobKind::ModelPull, run_model_pull(Arc::clone(&self.llm)))
            .await
    }

    /// Performs one minimal read against the source platform.
    pub async fn start_connection_test(&self) -> JobId {
        self.runner
            .spawn(
                JobKind::ConnectionTest,
                run_connection_test(Arc::clone(&self.source)),
            )
            .await
    }

    pub async fn job(&self, id: JobId) -> Option<JobRecord> {
        self.runner.get(id).await
    }
}

// ---------------------------------------------------------------------------
// Job bodies
// ---------------------------------------------------------------------------

async fn run_ingestion(
    source: Arc<dyn SourceClient>,
    store: Arc<dyn ItemStore>,
    channel_ids: Option<Vec<i64>>,
    limit: usize,
) -> Result<Value, JobFailure> {
    let ingestor = Ingestor::new(source.as_ref(), store.as_ref());
    let results = match channel_ids {
        Some(ids) => ingestor.sync_channel_ids(&ids, limit).await,
        None => ingestor
            .sync_all_active(limit)
            .await
            .map_err(|e| JobFailure::from(format!("failed to list channels: {e}")))?,
    };
    to_json(&summarize(results))
}

async fn run_analysis(
    llm: Arc<OllamaClient>,
    store: Arc<dyn ItemStore>,
    item_ids: Option<Vec<i64>>,
    limit: usize,
    generate_timeout: Duration,
) -> Result<Value, JobFailure> {
    let analyzer = Analyzer::new(llm.as_ref(), store.as_ref(), generate_timeout);
    let run = analyzer.analyze_batch(item_ids.as_deref(), limit).await;
    let result = to_json(&run)?;
    match run {
        AnalysisRun::Success { .. } => Ok(result),
        AnalysisRun::Error { error } => Err(JobFailure {
            error,
            result: Some(result),
        }),
    }
}

async fn run_model_pull(llm: Arc<OllamaClient>) -> Result<Value, JobFailure> {
    let outcome = llm.pull_model(llm.model()).await;
    let result = to_json(&outcome)?;
    match outcome.status {
        PullStatus::Success => Ok(result),
        PullStatus::Error => Err(JobFailure {
            error: outcome.message,
            result: Some(result),
        }),
    }
}

async fn run_connection_test(source: Arc<dyn SourceClient>) -> Result<Value, JobFailure> {
    let platform = source.platform();
    let connected = source.test_connection().await;
    tracing::info!(platform = %platform, connected, "connection test finished");
    Ok(json!({ "platform": platform, "connected": connected }))
}
