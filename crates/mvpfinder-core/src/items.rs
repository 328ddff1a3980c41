use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upstream content platform a channel and its items belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourcePlatform {
    ProductHunt,
    Reddit,
}

impl SourcePlatform {
    /// Stable string form used in storage and configuration.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SourcePlatform::ProductHunt => "product_hunt",
            SourcePlatform::Reddit => "reddit",
        }
    }

    /// Parses the storage/configuration form. Accepts `producthunt` as an alias.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "product_hunt" | "producthunt" => Some(SourcePlatform::ProductHunt),
            "reddit" => Some(SourcePlatform::Reddit),
            _ => None,
        }
    }
}

impl std::fmt::Display for SourcePlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A monitored upstream feed: a subreddit or a Product Hunt topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceChannel {
    pub id: i64,
    pub platform: SourcePlatform,
    /// Subreddit name (without `r/`) or topic slug. Unique per platform.
    pub name: String,
    /// Only active channels are included in "sync all" runs.
    pub active: bool,
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// A normalized item produced by a source client, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContentItem {
    /// Stable identifier assigned by the upstream platform; the dedup key.
    pub external_id: String,
    pub platform: SourcePlatform,
    pub channel_id: i64,
    pub title: String,
    pub tagline: String,
    pub body: String,
    pub author: String,
    pub score: i64,
    pub votes: i64,
    pub comments: i64,
    /// Canonical URL of the item on the upstream platform.
    pub source_url: String,
    /// The product website or linked page, when the item points elsewhere.
    pub external_site_url: Option<String>,
    pub created_at_source: DateTime<Utc>,
}

/// LLM-derived fields attached to a [`ContentItem`] once analyzed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisBlock {
    pub summary: String,
    pub problem: String,
    pub mvp_idea: String,
    pub target_audience: String,
    pub potential_score: i32,
    pub tags: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisBlock {
    #[must_use]
    pub fn from_result(result: &AnalysisResult, analyzed_at: DateTime<Utc>) -> Self {
        Self {
            summary: result.summary.clone(),
            problem: result.problem.clone(),
            mvp_idea: result.mvp_idea.clone(),
            target_audience: result.target_audience.clone(),
            potential_score: result.potential_score,
            tags: result.tags.clone(),
            analyzed_at,
        }
    }
}

/// One ingested post or product, the unit of analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: i64,
    pub external_id: String,
    pub platform: SourcePlatform,
    pub channel_id: i64,
    pub title: String,
    pub tagline: String,
    pub body: String,
    pub author: String,
    pub score: i64,
    pub votes: i64,
    pub comments: i64,
    pub source_url: String,
    pub external_site_url: Option<String>,
    pub created_at_source: DateTime<Utc>,
    /// When the item was first stored. Defines "creation order" for analysis.
    pub ingested_at: DateTime<Utc>,
    /// `None` until the item has been analyzed successfully.
    pub analysis: Option<AnalysisBlock>,
}

impl ContentItem {
    #[must_use]
    pub fn analyzed(&self) -> bool {
        self.analysis.is_some()
    }

    #[must_use]
    pub fn analyzed_at(&self) -> Option<DateTime<Utc>> {
        self.analysis.as_ref().map(|a| a.analyzed_at)
    }
}

/// Parsed output of a single LLM analysis call. Never persisted on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub problem: String,
    pub mvp_idea: String,
    pub target_audience: String,
    /// Always within `1..=10` once produced by the response parser.
    pub potential_score: i32,
    /// Lowercase, hyphenated keyword tokens; at most five.
    pub tags: Vec<String>,
}
