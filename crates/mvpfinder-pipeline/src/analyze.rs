//! Analysis orchestrator: runs stored items through the LLM and records the
//! parsed insights.

use std::time::Duration;

use chrono::Utc;
use mvpfinder_core::{ContentItem, ItemStore};
use mvpfinder_llm::{parse_analysis, render_prompt, OllamaClient};
use serde::{Deserialize, Serialize};

/// Per-item failure messages kept in a run summary.
pub const MAX_REPORTED_ERRORS: usize = 10;

/// Result of one analysis batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisRun {
    Success {
        analyzed: usize,
        failed: usize,
        /// First [`MAX_REPORTED_ERRORS`] failure messages.
        errors: Vec<String>,
    },
    /// The batch did not start: LLM not ready or items could not be selected.
    Error { error: String },
}

pub struct Analyzer<'a> {
    llm: &'a OllamaClient,
    store: &'a dyn ItemStore,
    generate_timeout: Duration,
}

impl<'a> Analyzer<'a> {
    #[must_use]
    pub fn new(llm: &'a OllamaClient, store: &'a dyn ItemStore, generate_timeout: Duration) -> Self {
        Self {
            llm,
            store,
            generate_timeout,
        }
    }

    /// Analyzes the items named by `ids` (in any analysis state), or the
    /// oldest `limit` unanalyzed items when `ids` is `None`.
    ///
    /// Checks server and model readiness first and selects nothing when
    /// either is missing.
    pub async fn analyze_batch(&self, ids: Option<&[i64]>, limit: usize) -> AnalysisRun {
        if !self.llm.is_available().await {
            return AnalysisRun::Error {
                error: format!("LLM server not available at {}", self.llm.host()),
            };
        }
        if !self.llm.is_model_available(self.llm.model()).await {
            return AnalysisRun::Error {
                error: format!(
                    "model {} is not installed; pull it before analyzing",
                    self.llm.model()
                ),
            };
        }

        let selected = match ids {
            Some(ids) => self.store.get_items(ids).await,
            None => self.store.list_unanalyzed(limit).await,
        };
        let items = match selected {
            Ok(items) => items,
            Err(e) => {
                tracing::error!(error = %e, "failed to select items for analysis");
                return AnalysisRun::Error {
                    error: format!("failed to select items: {e}"),
                };
            }
        };

        tracing::info!(items = items.len(), model = %self.llm.model(), "analysis batch started");

        let mut analyzed = 0_usize;
        let mut failed = 0_usize;
        let mut errors = Vec::new();

        for item in &items {
            match self.analyze_item(item).await {
                Ok(()) => analyzed += 1,
                Err(message) => {
                    tracing::warn!(item_id = item.id, error = %message, "item analysis failed");
                    failed += 1;
                    if errors.len() < MAX_REPORTED_ERRORS {
                        errors.push(message);
                    }
                }
            }
        }

        tracing::info!(analyzed, failed, "analysis batch finished");
        AnalysisRun::Success {
            analyzed,
            failed,
            errors,
        }
    }

    async fn analyze_item(&self, item: &ContentItem) -> Result<(), String> {
        let prompt = render_prompt(&item.title, &item.tagline, &item.body);

        let Some(text) = self.llm.generate(&prompt, self.generate_timeout).await else {
            return Err(format!("item {}: no response from LLM", item.id));
        };
        let Some(result) = parse_analysis(&text) else {
            tracing::debug!(item_id = item.id, response = %text, "unparseable LLM response");
            return Err(format!("item {}: unparseable LLM response", item.id));
        };

        self.store
            .record_analysis(item.id, &result, Utc::now())
            .await
            .map_err(|e| format!("item {}: failed to store analysis: {e}", item.id))?;

        tracing::debug!(
            item_id = item.id,
            potential_score = result.potential_score,
            "item analyzed"
        );
        Ok(())
    }
}
