//! Products processor - bulk copy generation for products.
//!
//! For each product: fetch the current snapshot, generate copy, apply the
//! requested non-empty fields back. A single product's failure is logged and
//! skipped; progress advances by the field count per product either way,
//! matching how admission priced the job (targets x fields).

use anyhow::{bail, Result};
use storefront::ContentUpdate;
use tracing::warn;

use crate::domains::credits::math::{sanitize_id_list, ContentField, PRODUCT_FIELD_ALLOWLIST};
use crate::domains::jobs::models::bulk_job::BulkJob;
use crate::domains::jobs::prompts;
use crate::kernel::ServerDeps;

use super::{bounded, non_empty, GeneratedCopy};

pub async fn run(deps: &ServerDeps, job: &BulkJob) -> Result<()> {
    if !deps.generation.is_configured() {
        bail!("OpenAI API key is not configured.");
    }

    let config = &job.config;
    let product_ids = sanitize_id_list(&config.product_ids);
    let fields: Vec<ContentField> = config
        .settings
        .fields
        .iter()
        .copied()
        .filter(|field| PRODUCT_FIELD_ALLOWLIST.contains(field))
        .collect();

    if product_ids.is_empty() || fields.is_empty() {
        bail!("Job config missing product ids or fields.");
    }

    if !deps.storefront.has_credentials(&job.shop_domain).await {
        bail!("No admin session available for this shop.");
    }

    let progress_increment = fields.len() as i64;

    for product_id in &product_ids {
        if let Err(e) = process_product(deps, job, product_id, &fields).await {
            warn!(
                job_id = %job.id,
                product_id = %product_id,
                error = %e,
                "failed to process product"
            );
        }
        BulkJob::increment_processed(&deps.db_pool, job.id, progress_increment).await?;
    }

    Ok(())
}

async fn process_product(
    deps: &ServerDeps,
    job: &BulkJob,
    product_id: &str,
    fields: &[ContentField],
) -> Result<()> {
    let timeout = deps.external_call_timeout;

    let product = bounded(
        timeout,
        "product fetch",
        deps.storefront.fetch_product(&job.shop_domain, product_id),
    )
    .await?;
    let Some(product) = product else {
        // Target vanished between selection and execution; nothing to do.
        return Ok(());
    };

    let messages = prompts::product_copy_messages(&product, &job.config.settings);
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
        "product update",
        deps.storefront
            .apply_product_content(&job.shop_domain, product_id, &update),
    )
    .await
}

/// Keep only the requested fields whose generated value is non-empty.
pub(super) fn build_update(copy: &GeneratedCopy, fields: &[ContentField]) -> ContentUpdate {
    let mut update = ContentUpdate::default();
    if fields.contains(&ContentField::Title) {
        update.title = non_empty(copy.title.as_deref());
    }
    if fields.contains(&ContentField::Description) {
        update.description_html = non_empty(copy.description_html.as_deref());
    }
    if fields.contains(&ContentField::MetaTitle) {
        update.seo_title = non_empty(copy.meta_title.as_deref());
    }
    if fields.contains(&ContentField::MetaDescription) {
        update.seo_description = non_empty(copy.meta_description.as_deref());
    }
    update
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_only_includes_requested_non_empty_fields() {
        let copy = GeneratedCopy {
            title: Some(" New Title ".into()),
            description_html: Some("<p>Copy</p>".into()),
            meta_title: Some("".into()),
            meta_description: Some("Meta copy".into()),
            ..Default::default()
        };

        let update = build_update(&copy, &[ContentField::Title, ContentField::MetaTitle]);
        assert_eq!(update.title.as_deref(), Some("New Title"));
        assert!(update.description_html.is_none());
        // Requested but the model returned an empty value
        assert!(update.seo_title.is_none());
        assert!(update.seo_description.is_none());
    }

    #[test]
    fn update_is_empty_when_nothing_usable_returned() {
        let copy = GeneratedCopy::default();
        let update = build_update(
            &copy,
            &[ContentField::Title, ContentField::Description],
        );
        assert!(update.is_empty());
    }
}
