//! Bulk job model - SQL persistence layer
//!
//! Jobs are created `queued` by the admission path and mutated only by the
//! worker afterwards: one atomic claim to `running`, progress increments
//! capped at `total_items`, then a single terminal transition. Status guards
//! in the SQL keep the state machine forward-only.

use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domains::credits::math::ContentField;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Queued,
    Running,
    Completed,
    Failed,
}

/// What a job generates, decided once at admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Products,
    Collections,
    AltText,
}

/// Which images of a product an alt-text job touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImageScope {
    #[default]
    Main,
    All,
}

/// Generation settings, sanitized at admission.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerationSettings {
    pub fields: Vec<ContentField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub image_scope: ImageScope,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub image_counts: BTreeMap<String, i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_image_targets: Option<i64>,
}

/// Immutable configuration snapshot persisted with each job.
///
/// `credit_cost` is kept here so the failure path can refund exactly what
/// admission reserved.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JobConfig {
    #[serde(default)]
    pub product_ids: Vec<String>,
    #[serde(default)]
    pub collection_ids: Vec<String>,
    pub settings: GenerationSettings,
    pub session_id: String,
    pub credit_cost: i64,
}

/// A bulk content-generation job.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct BulkJob {
    pub id: Uuid,
    pub shop_domain: String,
    pub kind: JobKind,
    pub status: JobStatus,
    pub config: Json<JobConfig>,
    pub total_items: i64,
    pub processed_items: i64,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BulkJob {
    /// Create a queued job ready for insertion.
    pub fn new_queued(
        shop_domain: impl Into<String>,
        kind: JobKind,
        config: JobConfig,
        total_items: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            shop_domain: shop_domain.into(),
            kind,
            status: JobStatus::Queued,
            config: Json(config),
            total_items,
            processed_items: 0,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub async fn insert(&self, pool: &PgPool) -> Result<Self> {
        let job = sqlx::query_as::<_, Self>(
            "INSERT INTO bulk_jobs
                 (id, shop_domain, kind, status, config, total_items, processed_items,
                  error_message, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING *",
        )
        .bind(self.id)
        .bind(&self.shop_domain)
        .bind(self.kind)
        .bind(self.status)
        .bind(&self.config)
        .bind(self.total_items)
        .bind(self.processed_items)
        .bind(&self.error_message)
        .bind(self.created_at)
        .bind(self.updated_at)
        .fetch_one(pool)
        .await?;

        Ok(job)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let job = sqlx::query_as::<_, Self>("SELECT * FROM bulk_jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(job)
    }

    /// Find a job scoped to its owning shop. Lookups from the API surface
    /// always go through here so jobs never leak across shops.
    pub async fn find_for_shop(pool: &PgPool, shop_domain: &str, id: Uuid) -> Result<Option<Self>> {
        let job = sqlx::query_as::<_, Self>(
            "SELECT * FROM bulk_jobs WHERE id = $1 AND shop_domain = $2",
        )
        .bind(id)
        .bind(shop_domain)
        .fetch_optional(pool)
        .await?;
        Ok(job)
    }

    /// Recent jobs for a shop, newest first.
    pub async fn list_for_shop(pool: &PgPool, shop_domain: &str, limit: i64) -> Result<Vec<Self>> {
        let jobs = sqlx::query_as::<_, Self>(
            "SELECT * FROM bulk_jobs
             WHERE shop_domain = $1
             ORDER BY created_at DESC
             LIMIT $2",
        )
        .bind(shop_domain)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(jobs)
    }

    /// Claim the oldest queued job atomically, flipping it to `running`.
    ///
    /// Single conditional update with `FOR UPDATE SKIP LOCKED`, so exactly
    /// one worker wins each job even when several instances poll at once.
    /// Global FIFO by creation time, across all shops.
    pub async fn claim_next_queued(pool: &PgPool) -> Result<Option<Self>> {
        let job = sqlx::query_as::<_, Self>(
            "WITH next_job AS (
                 SELECT id
                 FROM bulk_jobs
                 WHERE status = 'queued'
                 ORDER BY created_at ASC
                 LIMIT 1
                 FOR UPDATE SKIP LOCKED
             )
             UPDATE bulk_jobs
             SET status = 'running', updated_at = NOW()
             WHERE id IN (SELECT id FROM next_job)
             RETURNING *",
        )
        .fetch_optional(pool)
        .await?;
        Ok(job)
    }

    /// Terminal success: progress snaps to the full work-item count.
    pub async fn mark_completed(pool: &PgPool, id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE bulk_jobs
             SET status = 'completed', processed_items = total_items, updated_at = NOW()
             WHERE id = $1 AND status = 'running'",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Terminal failure with the captured error message.
    pub async fn mark_failed(pool: &PgPool, id: Uuid, error_message: &str) -> Result<()> {
        sqlx::query(
            "UPDATE bulk_jobs
             SET status = 'failed', error_message = $2, updated_at = NOW()
             WHERE id = $1 AND status = 'running'",
        )
        .bind(id)
        .bind(error_message)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Advance progress by `count`, capped at `total_items`.
    ///
    /// Progress tracks attempts, not successes; the cap keeps the
    /// `processed_items <= total_items` invariant under any increment.
    pub async fn increment_processed(pool: &PgPool, id: Uuid, count: i64) -> Result<i64> {
        let processed = sqlx::query_scalar::<_, i64>(
            "UPDATE bulk_jobs
             SET processed_items = LEAST(processed_items + $2, total_items), updated_at = NOW()
             WHERE id = $1
             RETURNING processed_items",
        )
        .bind(id)
        .bind(count.max(0))
        .fetch_one(pool)
        .await?;
        Ok(processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> JobConfig {
        JobConfig {
            product_ids: vec!["gid://storefront/Product/1".into()],
            collection_ids: vec![],
            settings: GenerationSettings {
                fields: vec![ContentField::Title, ContentField::Description],
                ..Default::default()
            },
            session_id: "offline_demo.mystore.example".into(),
            credit_cost: 2,
        }
    }

    #[test]
    fn new_job_starts_queued_with_no_progress() {
        let job = BulkJob::new_queued("demo.mystore.example", JobKind::Products, sample_config(), 2);
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.processed_items, 0);
        assert!(job.error_message.is_none());
    }

    #[test]
    fn config_snapshot_round_trips_through_json() {
        let config = sample_config();
        let value = serde_json::to_value(&config).unwrap();
        let back: JobConfig = serde_json::from_value(value).unwrap();
        assert_eq!(back.credit_cost, 2);
        assert_eq!(back.settings.fields, config.settings.fields);
        assert_eq!(back.product_ids, config.product_ids);
    }

    #[test]
    fn kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(JobKind::AltText).unwrap(),
            serde_json::json!("alt_text")
        );
        assert_eq!(
            serde_json::to_value(JobStatus::Queued).unwrap(),
            serde_json::json!("queued")
        );
    }

    #[test]
    fn image_scope_defaults_to_main() {
        let settings: GenerationSettings = serde_json::from_value(serde_json::json!({
            "fields": ["alt_text"]
        }))
        .unwrap();
        assert_eq!(settings.image_scope, ImageScope::Main);
    }
}
