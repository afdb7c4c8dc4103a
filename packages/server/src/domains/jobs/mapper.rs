//! API view of bulk jobs.
//!
//! Flattens the persisted job into what the merchant UI renders: progress
//! counts, selection sizes, and display type ids for each requested field.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domains::credits::math::ContentField;
use crate::domains::jobs::models::bulk_job::{BulkJob, JobKind, JobStatus};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkJobView {
    pub id: Uuid,
    pub status: JobStatus,
    pub kind: JobKind,
    pub work_item_count: i64,
    pub estimated_credits: i64,
    pub completed_items: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub selection: SelectionCounts,
    pub types: Vec<&'static str>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectionCounts {
    pub products: usize,
    pub collections: usize,
}

fn display_type_id(kind: JobKind, field: ContentField) -> &'static str {
    match (kind, field) {
        (JobKind::Collections, ContentField::Title) => "collectionTitle",
        (JobKind::Collections, ContentField::Description) => "collectionDescription",
        (JobKind::Collections, ContentField::MetaTitle) => "collectionMetaTitle",
        (JobKind::Collections, ContentField::MetaDescription) => "collectionMetaDescription",
        (_, ContentField::Title) => "productTitle",
        (_, ContentField::Description) => "description",
        (_, ContentField::MetaTitle) => "metaTitle",
        (_, ContentField::MetaDescription) => "metaDescription",
        (_, ContentField::AltText) => "altText",
    }
}

pub fn map_bulk_job(job: &BulkJob) -> BulkJobView {
    let config = &job.config;
    BulkJobView {
        id: job.id,
        status: job.status,
        kind: job.kind,
        work_item_count: job.total_items,
        estimated_credits: job.total_items,
        completed_items: job.processed_items,
        error_message: job.error_message.clone(),
        selection: SelectionCounts {
            products: config.product_ids.len(),
            collections: config.collection_ids.len(),
        },
        types: config
            .settings
            .fields
            .iter()
            .map(|field| display_type_id(job.kind, *field))
            .collect(),
        created_at: job.created_at,
    }
}

pub fn map_bulk_jobs(jobs: &[BulkJob]) -> Vec<BulkJobView> {
    jobs.iter().map(map_bulk_job).collect()
}
