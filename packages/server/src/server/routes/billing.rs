//! Billing routes: purchase records and idempotent finalization.
//!
//! The billing platform owns checkout and charge verification; these routes
//! are the narrow surface it calls back into. Finalization is idempotent per
//! charge id - the first delivery grants, every re-delivery is a no-op.

use axum::extract::{Extension, Path};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domains::credits::{CreditPurchase, PurchaseOutcome, PurchaseStatus, PurchaseType};
use crate::server::app::AppState;
use crate::server::error::ApiError;

use super::require_shop_domain;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPurchaseRequest {
    pub charge_id: String,
    pub credits_added: i64,
    #[serde(default)]
    pub price_usd_cents: Option<i64>,
    #[serde(default)]
    pub purchase_type: PurchaseType,
    #[serde(default)]
    pub plan: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FinalizePurchaseRequest {
    pub status: PurchaseOutcome,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub charge_id: String,
    pub status: PurchaseStatus,
    pub credits_granted: bool,
}

/// `POST /api/billing/purchases` - record a pending purchase at checkout.
pub async fn record_purchase_handler(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    Json(body): Json<RecordPurchaseRequest>,
) -> Result<(StatusCode, Json<PurchaseResponse>), ApiError> {
    let shop_domain = require_shop_domain(&headers)?;
    if body.charge_id.trim().is_empty() {
        return Err(ApiError::BadRequest("Charge id is required.".to_string()));
    }

    let purchase = CreditPurchase::record_pending(
        &state.deps.db_pool,
        body.charge_id.trim(),
        &shop_domain,
        body.credits_added,
        body.price_usd_cents,
        body.purchase_type,
        body.plan.as_deref(),
    )
    .await
    .map_err(ApiError::Internal)?;

    Ok((
        StatusCode::CREATED,
        Json(PurchaseResponse {
            charge_id: purchase.charge_id,
            status: purchase.status,
            credits_granted: false,
        }),
    ))
}

/// `POST /api/billing/purchases/:charge_id/finalize` - apply the billing
/// platform's verdict. Safe to deliver more than once.
pub async fn finalize_purchase_handler(
    Extension(state): Extension<AppState>,
    Path(charge_id): Path<String>,
    Json(body): Json<FinalizePurchaseRequest>,
) -> Result<Json<PurchaseResponse>, ApiError> {
    let finalized = CreditPurchase::finalize(
        &state.deps.db_pool,
        &charge_id,
        body.status,
        state.deps.initial_shop_credits,
    )
    .await
    .map_err(ApiError::Internal)?;

    if let Some(purchase) = finalized {
        let granted = purchase.status == PurchaseStatus::Completed && purchase.credits_added > 0;
        return Ok(Json(PurchaseResponse {
            charge_id: purchase.charge_id,
            status: purchase.status,
            credits_granted: granted,
        }));
    }

    // Unknown charge, or already finalized by an earlier delivery.
    let existing = CreditPurchase::find_by_charge_id(&state.deps.db_pool, &charge_id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("Purchase not found.".to_string()))?;

    Ok(Json(PurchaseResponse {
        charge_id: existing.charge_id,
        status: existing.status,
        credits_granted: false,
    }))
}
