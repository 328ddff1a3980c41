//! Ingestion and analysis orchestration, plus the background job service
//! that runs both.

pub mod analyze;
pub mod ingest;
pub mod jobs;

pub use analyze::{AnalysisRun, Analyzer, MAX_REPORTED_ERRORS};
pub use ingest::{summarize, ChannelSyncResult, Ingestor, SyncSummary};
pub use jobs::{
    JobFailure, JobId, JobKind, JobRecord, JobRunner, JobService, JobStatus, DEFAULT_JOB_TTL,
    DEFAULT_MAX_FINISHED_JOBS,
};
