//! Collections processor - bulk copy generation for collections.
//!
//! Same per-target discipline as the products processor over collection
//! snapshots.

use anyhow::{bail, Result};
use tracing::warn;

use crate::domains::credits::math::{
    sanitize_id_list, ContentField, COLLECTION_FIELD_ALLOWLIST,
};
use crate::domains::jobs::models::bulk_job::BulkJob;
use crate::domains::jobs::prompts;
use crate::kernel::ServerDeps;

use super::{bounded, products::build_update, GeneratedCopy};

pub async fn run(deps: &ServerDeps, job: &BulkJob) -> Result<()> {
    if !deps.generation.is_configured() {
        bail!("OpenAI API key is not configured.");
    }

    let config = &job.config;
    let collection_ids = sanitize_id_list(&config.collection_ids);
    let fields: Vec<ContentField> = config
        .settings
        .fields
        .iter()
        .copied()
        .filter(|field| COLLECTION_FIELD_ALLOWLIST.contains(field))
        .collect();

    if collection_ids.is_empty() || fields.is_empty() {
        bail!("Job config missing collection ids or fields.");
    }

    if !deps.storefront.has_credentials(&job.shop_domain).await {
        bail!("No admin session available for this shop.");
    }

    let progress_increment = fields.len() as i64;

    for collection_id in &collection_ids {
        if let Err(e) = process_collection(deps, job, collection_id, &fields).await {
            warn!(
                job_id = %job.id,
                collection_id = %collection_id,
                error = %e,
                "failed to process collection"
            );
        }
        BulkJob::increment_processed(&deps.db_pool, job.id, progress_increment).await?;
    }

    Ok(())
}

async fn process_collection(
    deps: &ServerDeps,
    job: &BulkJob,
    collection_id: &str,
    fields: &[ContentField],
) -> Result<()> {
    let timeout = deps.external_call_timeout;

    let collection = bounded(
        timeout,
        "collection fetch",
        deps.storefront
            .fetch_collection(&job.shop_domain, collection_id),
    )
    .await?;
    let Some(collection) = collection else {
        return Ok(());
    };

    let messages = prompts::collection_copy_messages(&collection, &job.config.settings);
    let reply = bounded(
        timeout,
        "content generation",
        deps.generation.complete_json(messages),
    )
    .await?;
    let copy: GeneratedCopy = serde_json::from_value(reply)?;

    let update = build_update(&copy, fields);
    if update.is_empty() {
        return Ok(());
    }

    bounded(
        timeout,
        "collection update",
        deps.storefront
            .apply_collection_content(&job.shop_domain, collection_id, &update),
    )
    .await
}
