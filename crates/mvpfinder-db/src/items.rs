//! Postgres-backed [`ItemStore`].

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mvpfinder_core::{
    AnalysisBlock, AnalysisResult, ContentItem, InsertOutcome, ItemStore, NewContentItem,
    SourceChannel, SourcePlatform, StoreError,
};
use sqlx::PgPool;

use crate::DbError;

const CHANNEL_COLUMNS: &str = "id, platform, name, active, last_synced_at";

const ITEM_COLUMNS: &str = "id, external_id, platform, channel_id, title, tagline, body, author, \
     score, votes, comments, source_url, external_site_url, created_at_source, ingested_at, \
     summary, problem, mvp_idea, target_audience, potential_score, tags, analyzed_at";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChannelRow {
    pub id: i64,
    pub platform: String,
    pub name: String,
    pub active: bool,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl TryFrom<ChannelRow> for SourceChannel {
    type Error = DbError;

    fn try_from(row: ChannelRow) -> Result<Self, Self::Error> {
        Ok(SourceChannel {
            id: row.id,
            platform: parse_platform(&row.platform)?,
            name: row.name,
            active: row.active,
            last_synced_at: row.last_synced_at,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContentItemRow {
    pub id: i64,
    pub external_id: String,
    pub platform: String,
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
    pub ingested_at: DateTime<Utc>,
    pub summary: Option<String>,
    pub problem: Option<String>,
    pub mvp_idea: Option<String>,
    pub target_audience: Option<String>,
    pub potential_score: Option<i32>,
    pub tags: Option<Vec<String>>,
    pub analyzed_at: Option<DateTime<Utc>>,
}

impl TryFrom<ContentItemRow> for ContentItem {
    type Error = DbError;

    fn try_from(row: ContentItemRow) -> Result<Self, Self::Error> {
        let platform = parse_platform(&row.platform)?;
        let analysis = row.analyzed_at.map(|analyzed_at| AnalysisBlock {
            summary: row.summary.unwrap_or_default(),
            problem: row.problem.unwrap_or_default(),
            mvp_idea: row.mvp_idea.unwrap_or_default(),
            target_audience: row.target_audience.unwrap_or_default(),
            potential_score: row.potential_score.unwrap_or(1),
            tags: row.tags.unwrap_or_default(),
            analyzed_at,
        });

        Ok(ContentItem {
            id: row.id,
            external_id: row.external_id,
            platform,
            channel_id: row.channel_id,
            title: row.title,
            tagline: row.tagline,
            body: row.body,
            author: row.author,
            score: row.score,
            votes: row.votes,
            comments: row.comments,
            source_url: row.source_url,
            external_site_url: row.external_site_url,
            created_at_source: row.created_at_source,
            ingested_at: row.ingested_at,
            analysis,
        })
    }
}

fn parse_platform(raw: &str) -> Result<SourcePlatform, DbError> {
    SourcePlatform::parse(raw).ok_or_else(|| DbError::InvalidPlatform(raw.to_string()))
}

fn limit_to_i64(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PgItemStore {
    pool: PgPool,
}

impl PgItemStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ItemStore for PgItemStore {
    async fn get_channel(
        &self,
        platform: SourcePlatform,
        name: &str,
    ) -> Result<Option<SourceChannel>, StoreError> {
        let sql = format!(
            "SELECT {CHANNEL_COLUMNS} FROM source_channels WHERE platform = $1 AND name = $2"
        );
        let row = sqlx::query_as::<_, ChannelRow>(&sql)
            .bind(platform.as_str())
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?;
        Ok(row.map(SourceChannel::try_from).transpose()?)
    }

    async fn get_channel_by_id(&self, id: i64) -> Result<Option<SourceChannel>, StoreError> {
        let sql = format!("SELECT {CHANNEL_COLUMNS} FROM source_channels WHERE id = $1");
        let row = sqlx::query_as::<_, ChannelRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?;
        Ok(row.map(SourceChannel::try_from).transpose()?)
    }

    async fn list_active_channels(
        &self,
        platform: SourcePlatform,
    ) -> Result<Vec<SourceChannel>, StoreError> {
        let sql = format!(
            "SELECT {CHANNEL_COLUMNS} FROM source_channels \
             WHERE platform = $1 AND active ORDER BY name"
        );
        let rows = sqlx::query_as::<_, ChannelRow>(&sql)
            .bind(platform.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(SourceChannel::try_from)
            .collect::<Result<_, _>>()?)
    }

    async fn touch_channel_synced(&self, id: i64, at: DateTime<Utc>) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE source_channels SET last_synced_at = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn upsert_channel(
        &self,
        platform: SourcePlatform,
        name: &str,
        active: bool,
    ) -> Result<SourceChannel, StoreError> {
        let sql = format!(
            "INSERT INTO source_channels (platform, name, active) VALUES ($1, $2, $3) \
             ON CONFLICT (platform, name) DO UPDATE \
             SET active = EXCLUDED.active, updated_at = NOW() \
             RETURNING {CHANNEL_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ChannelRow>(&sql)
            .bind(platform.as_str())
            .bind(name)
            .bind(active)
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;
        tracing::debug!(platform = %platform, name, active, "channel upserted");
        Ok(SourceChannel::try_from(row)?)
    }

    async fn item_exists(&self, external_id: &str) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM content_items WHERE external_id = $1)",
        )
        .bind(external_id)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(exists)
    }

    async fn insert_item(&self, item: &NewContentItem) -> Result<InsertOutcome, StoreError> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO content_items \
             (external_id, platform, channel_id, title, tagline, body, author, \
              score, votes, comments, source_url, external_site_url, created_at_source) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             ON CONFLICT (external_id) DO NOTHING \
             RETURNING id",
        )
        .bind(&item.external_id)
        .bind(item.platform.as_str())
        .bind(item.channel_id)
        .bind(&item.title)
        .bind(&item.tagline)
        .bind(&item.body)
        .bind(&item.author)
        .bind(item.score)
        .bind(item.votes)
        .bind(item.comments)
        .bind(&item.source_url)
        .bind(item.external_site_url.as_deref())
        .bind(item.created_at_source)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(id.map_or(InsertOutcome::Duplicate, InsertOutcome::Created))
    }

    async fn list_unanalyzed(&self, limit: usize) -> Result<Vec<ContentItem>, StoreError> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM content_items \
             WHERE analyzed_at IS NULL ORDER BY ingested_at, id LIMIT $1"
        );
        let rows = sqlx::query_as::<_, ContentItemRow>(&sql)
            .bind(limit_to_i64(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(ContentItem::try_from)
            .collect::<Result<_, _>>()?)
    }

    async fn get_items(&self, ids: &[i64]) -> Result<Vec<ContentItem>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {ITEM_COLUMNS} FROM content_items WHERE id = ANY($1)");
        let rows = sqlx::query_as::<_, ContentItemRow>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;

        let mut by_id: HashMap<i64, ContentItem> = HashMap::with_capacity(rows.len());
        for row in rows {
            let item = ContentItem::try_from(row)?;
            by_id.insert(item.id, item);
        }
        // requested order; repeated ids yield one item
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn record_analysis(
        &self,
        id: i64,
        result: &AnalysisResult,
        analyzed_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let outcome = sqlx::query(
            "UPDATE content_items SET \
             summary = $2, problem = $3, mvp_idea = $4, target_audience = $5, \
             potential_score = $6, tags = $7, analyzed_at = $8 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&result.summary)
        .bind(&result.problem)
        .bind(&result.mvp_idea)
        .bind(&result.target_audience)
        .bind(result.potential_score)
        .bind(result.tags.as_slice())
        .bind(analyzed_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if outcome.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
