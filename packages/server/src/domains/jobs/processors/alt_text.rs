//! Alt-text processor - vision-generated image alt text.
//!
//! Per product: fetch the image list, pick the primary image or all of them
//! per the job's scope, and for each image generate + normalize + apply alt
//! text. Progress counts attempts (one per image, or the expected count when
//! a product yields nothing), capped at the job's total.

use anyhow::{bail, Result};
use storefront::{ProductImage, ProductWithImages};
use tracing::warn;

use crate::domains::credits::math::sanitize_id_list;
use crate::domains::jobs::models::bulk_job::{BulkJob, ImageScope};
use crate::domains::jobs::prompts;
use crate::kernel::ServerDeps;

use super::{bounded, GeneratedCopy};

/// Alt text longer than this many words reads as a caption, not alt text.
const MAX_ALT_TEXT_WORDS: usize = 15;

pub async fn run(deps: &ServerDeps, job: &BulkJob) -> Result<()> {
    if !deps.generation.is_configured() {
        bail!("OpenAI API key is not configured.");
    }

    let config = &job.config;
    let product_ids = sanitize_id_list(&config.product_ids);
    if product_ids.is_empty() {
        bail!("Job config missing product ids for alt text generation.");
    }

    if !deps.storefront.has_credentials(&job.shop_domain).await {
        bail!("No admin session available for this shop.");
    }

    let scope = config.settings.image_scope;

    for product_id in &product_ids {
        // Billed attempts for a product that produces no images.
        let expected = config
            .settings
            .image_counts
            .get(product_id)
            .copied()
            .unwrap_or(1)
            .max(0);

        let product = match bounded(
            deps.external_call_timeout,
            "product image fetch",
            deps.storefront
                .fetch_product_images(&job.shop_domain, product_id),
        )
        .await
        {
            Ok(product) => product,
            Err(e) => {
                warn!(
                    job_id = %job.id,
                    product_id = %product_id,
                    error = %e,
                    "failed to fetch product images"
                );
                BulkJob::increment_processed(&deps.db_pool, job.id, expected).await?;
                continue;
            }
        };

        let Some(product) = product else {
            BulkJob::increment_processed(&deps.db_pool, job.id, expected).await?;
            continue;
        };

        let target_images = select_images(&product, scope);
        if target_images.is_empty() {
            BulkJob::increment_processed(&deps.db_pool, job.id, expected).await?;
            continue;
        }

        for image in &target_images {
            if let Err(e) = process_image(deps, job, &product, image).await {
                warn!(
                    job_id = %job.id,
                    image_id = %image.id,
                    error = %e,
                    "failed to update image alt text"
                );
            }
            BulkJob::increment_processed(&deps.db_pool, job.id, 1).await?;
        }
    }

    Ok(())
}

async fn process_image(
    deps: &ServerDeps,
    job: &BulkJob,
    product: &ProductWithImages,
    image: &ProductImage,
) -> Result<()> {
    let timeout = deps.external_call_timeout;

    let messages = prompts::alt_text_messages(&product.title, &product.handle, &image.alt_text, &image.url);
    let reply = bounded(
        timeout,
        "alt text generation",
        deps.generation.complete_json(messages),
    )
    .await?;
    let copy: GeneratedCopy = serde_json::from_value(reply)?;

    let Some(alt_text) = normalize_alt_text(copy.any_alt_text().unwrap_or_default()) else {
        warn!(job_id = %job.id, image_id = %image.id, "no alt text returned for image");
        return Ok(());
    };

    bounded(
        timeout,
        "image alt update",
        deps.storefront
            .update_image_alt(&job.shop_domain, &product.id, &image.id, &alt_text),
    )
    .await
}

/// The images a job touches for one product: all of them, or the featured
/// image (falling back to the first) for main-only scope.
fn select_images(product: &ProductWithImages, scope: ImageScope) -> Vec<ProductImage> {
    if product.images.is_empty() {
        return Vec::new();
    }
    if scope == ImageScope::All {
        return product.images.clone();
    }
    if let Some(featured_id) = &product.featured_image_id {
        if let Some(featured) = product.images.iter().find(|image| &image.id == featured_id) {
            return vec![featured.clone()];
        }
    }
    vec![product.images[0].clone()]
}

/// Collapse whitespace and cap at [`MAX_ALT_TEXT_WORDS`] words; empty input
/// yields nothing.
fn normalize_alt_text(value: &str) -> Option<String> {
    let words: Vec<&str> = value.split_whitespace().take(MAX_ALT_TEXT_WORDS).collect();
    if words.is_empty() {
        return None;
    }
    Some(words.join(" "))
}
