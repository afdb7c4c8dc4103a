//! Job admission - validate, price, reserve, persist.
//!
//! Everything up to the credit reservation is side-effect free; the
//! reservation plus the queued job row together are the admission's durable
//! effect. If the job insert fails after a successful reservation the
//! reservation is compensated with an immediate refund.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::domains::credits::math::{
    calculate_alt_text_items, calculate_work_items, clamp_image_target_count, dedupe_fields,
    is_valid_collection_id, is_valid_product_id, sanitize_id_list, ContentField,
    ALT_TEXT_FIELD_ALLOWLIST, COLLECTION_FIELD_ALLOWLIST, PRODUCT_FIELD_ALLOWLIST,
};
use crate::domains::credits::plans::plan_config;
use crate::domains::credits::{CreditError, Shop};
use crate::domains::jobs::models::bulk_job::{
    BulkJob, GenerationSettings, ImageScope, JobConfig, JobKind,
};
use crate::kernel::ServerDeps;

/// Reasons a generation request is refused before any work is queued.
#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("Product selection contains an invalid id.")]
    InvalidProductId,

    #[error("Collection selection contains an invalid id.")]
    InvalidCollectionId,

    #[error("Select products or collections, not both at once.")]
    MixedSelection,

    #[error("Select at least one product or collection.")]
    EmptySelection,

    #[error("Settings with at least one selected field are required.")]
    MissingFields,

    #[error("Unsupported field(s) selected: {0}")]
    UnsupportedFields(String),

    #[error("Alt text generation is only supported for products.")]
    AltTextRequiresProducts,

    #[error("Your {plan} plan supports up to {max_products} products per bulk job. Reduce your selection or upgrade your plan.")]
    PlanLimitExceeded { plan: String, max_products: usize },

    #[error("No eligible items to generate.")]
    NoEligibleWork,

    #[error("Insufficient credits. Please add more to continue.")]
    InsufficientCredits,

    #[error("No admin session available for this shop.")]
    SessionUnavailable,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<CreditError> for AdmissionError {
    fn from(err: CreditError) -> Self {
        match err {
            CreditError::InsufficientCredits => Self::InsufficientCredits,
            other => Self::Internal(other.into()),
        }
    }
}

/// Request body for `POST /api/jobs`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    #[serde(default)]
    pub product_ids: Vec<String>,
    #[serde(default)]
    pub collection_ids: Vec<String>,
    pub settings: Option<SettingsInput>,
}

/// Raw settings as submitted by the merchant UI.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SettingsInput {
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub image_scope: Option<String>,
    #[serde(default)]
    pub image_counts: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub total_image_targets: Option<f64>,
}

/// Admit a generation request: validate, compute cost, reserve credits, and
/// persist the queued job. Returns the new job id.
pub async fn submit_job(
    deps: &ServerDeps,
    shop_domain: &str,
    request: CreateJobRequest,
) -> Result<Uuid, AdmissionError> {
    let product_ids = sanitize_id_list(&request.product_ids);
    if product_ids.iter().any(|id| !is_valid_product_id(id)) {
        return Err(AdmissionError::InvalidProductId);
    }
    let collection_ids = sanitize_id_list(&request.collection_ids);
    if collection_ids.iter().any(|id| !is_valid_collection_id(id)) {
        return Err(AdmissionError::InvalidCollectionId);
    }

    if !product_ids.is_empty() && !collection_ids.is_empty() {
        return Err(AdmissionError::MixedSelection);
    }
    if product_ids.is_empty() && collection_ids.is_empty() {
        return Err(AdmissionError::EmptySelection);
    }

    let settings = request.settings.unwrap_or_default();
    if settings.fields.is_empty() {
        return Err(AdmissionError::MissingFields);
    }

    // The job kind is decided here, once, and stored on the row; the worker
    // never re-derives it from the settings shape.
    let is_alt_text = settings.task.as_deref() == Some("alt_text");
    let kind = if is_alt_text {
        if !collection_ids.is_empty() {
            return Err(AdmissionError::AltTextRequiresProducts);
        }
        JobKind::AltText
    } else if !collection_ids.is_empty() {
        JobKind::Collections
    } else {
        JobKind::Products
    };

    let (requested_fields, unknown_fields) = parse_fields(&settings.fields);
    if !unknown_fields.is_empty() {
        return Err(AdmissionError::UnsupportedFields(unknown_fields.join(", ")));
    }
    if requested_fields.is_empty() {
        return Err(AdmissionError::MissingFields);
    }

    let allowed = match kind {
        JobKind::AltText => ALT_TEXT_FIELD_ALLOWLIST,
        JobKind::Collections => COLLECTION_FIELD_ALLOWLIST,
        JobKind::Products => PRODUCT_FIELD_ALLOWLIST,
    };
    let disallowed: Vec<&str> = requested_fields
        .iter()
        .filter(|field| !allowed.contains(*field))
        .map(|field| field.as_str())
        .collect();
    if !disallowed.is_empty() {
        return Err(AdmissionError::UnsupportedFields(disallowed.join(", ")));
    }

    let shop = Shop::get_or_create(&deps.db_pool, shop_domain, deps.initial_shop_credits).await?;
    let plan = plan_config(&shop.current_plan);
    if kind != JobKind::Collections && product_ids.len() > plan.max_products_per_job {
        return Err(AdmissionError::PlanLimitExceeded {
            plan: plan.title.to_string(),
            max_products: plan.max_products_per_job,
        });
    }

    let mut sanitized = GenerationSettings {
        fields: requested_fields.clone(),
        tone: settings.tone.clone(),
        language: settings.language.clone(),
        ..Default::default()
    };

    let total_items = if kind == JobKind::AltText {
        sanitized.image_scope = match settings.image_scope.as_deref() {
            Some("all") => ImageScope::All,
            _ => ImageScope::Main,
        };
        let no_counts = BTreeMap::new();
        sanitized.image_counts = sanitize_image_counts(
            &product_ids,
            settings.image_counts.as_ref().unwrap_or(&no_counts),
        );
        let total = calculate_alt_text_items(
            &product_ids,
            settings.total_image_targets,
            &sanitized.image_counts,
        );
        sanitized.total_image_targets = Some(total);
        total
    } else {
        calculate_work_items(
            product_ids.len().max(collection_ids.len()),
            &requested_fields,
        )
    };

    if total_items <= 0 {
        return Err(AdmissionError::NoEligibleWork);
    }

    if !deps.storefront.has_credentials(shop_domain).await {
        return Err(AdmissionError::SessionUnavailable);
    }

    // Resource commitment starts here: reservation first, then the job row.
    Shop::reserve(
        &deps.db_pool,
        shop_domain,
        total_items,
        deps.initial_shop_credits,
    )
    .await?;

    let config = JobConfig {
        product_ids,
        collection_ids,
        settings: sanitized,
        session_id: format!("offline_{}", shop_domain),
        credit_cost: total_items,
    };

    let job = BulkJob::new_queued(shop_domain, kind, config, total_items);
    match job.insert(&deps.db_pool).await {
        Ok(inserted) => {
            info!(
                job_id = %inserted.id,
                shop = %shop_domain,
                kind = ?kind,
                total_items,
                "bulk job queued"
            );
            Ok(inserted.id)
        }
        Err(insert_err) => {
            // Compensate the reservation so the balance ends where it started.
            if let Err(refund_err) = Shop::refund(
                &deps.db_pool,
                shop_domain,
                total_items,
                deps.initial_shop_credits,
            )
            .await
            {
                error!(
                    shop = %shop_domain,
                    amount = total_items,
                    error = %refund_err,
                    "failed to refund reservation after job insert failure"
                );
            }
            Err(AdmissionError::Internal(insert_err))
        }
    }
}

/// Split raw field strings into parsed fields and unknown leftovers.
fn parse_fields(raw: &[String]) -> (Vec<ContentField>, Vec<String>) {
    let mut parsed = Vec::new();
    let mut unknown = Vec::new();
    for value in raw {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        match ContentField::parse(trimmed) {
            Some(field) => parsed.push(field),
            None => unknown.push(trimmed.to_string()),
        }
    }
    (dedupe_fields(&parsed), unknown)
}

/// Keep only counts for selected products, clamped to the billable range.
fn sanitize_image_counts(
    product_ids: &[String],
    raw_counts: &BTreeMap<String, f64>,
) -> BTreeMap<String, i64> {
    product_ids
        .iter()
        .filter_map(|id| {
            raw_counts
                .get(id)
                .map(|count| (id.clone(), clamp_image_target_count(*count)))
        })
        .collect()
}
