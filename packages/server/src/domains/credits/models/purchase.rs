//! Credit purchase records - SQL persistence layer
//!
//! One row per external billing charge; the charge id is the idempotency
//! key. Finalization transitions a row out of `pending` exactly once, so
//! re-delivered billing confirmations can never double-grant credits.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::domains::credits::plans::plan_config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "purchase_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    #[default]
    Pending,
    Completed,
    Declined,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "purchase_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PurchaseType {
    #[default]
    OneTime,
    Subscription,
}

/// Terminal outcome reported by the billing platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOutcome {
    Completed,
    Declined,
    Error,
}

impl PurchaseOutcome {
    fn as_status(self) -> PurchaseStatus {
        match self {
            Self::Completed => PurchaseStatus::Completed,
            Self::Declined => PurchaseStatus::Declined,
            Self::Error => PurchaseStatus::Error,
        }
    }
}

/// A credit purchase keyed by the external charge id.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct CreditPurchase {
    pub charge_id: String,
    pub shop_domain: String,
    pub credits_added: i64,
    pub price_usd_cents: Option<i64>,
    pub purchase_type: PurchaseType,
    pub plan: Option<String>,
    pub status: PurchaseStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CreditPurchase {
    /// Record (or refresh) a pending purchase when checkout is initiated.
    pub async fn record_pending(
        pool: &PgPool,
        charge_id: &str,
        shop_domain: &str,
        credits_added: i64,
        price_usd_cents: Option<i64>,
        purchase_type: PurchaseType,
        plan: Option<&str>,
    ) -> Result<Self> {
        let purchase = sqlx::query_as::<_, Self>(
            "INSERT INTO credit_purchases
                 (charge_id, shop_domain, credits_added, price_usd_cents, purchase_type, plan, status)
             VALUES ($1, $2, $3, $4, $5, $6, 'pending')
             ON CONFLICT (charge_id) DO UPDATE SET
                 shop_domain = EXCLUDED.shop_domain,
                 credits_added = EXCLUDED.credits_added,
                 price_usd_cents = EXCLUDED.price_usd_cents,
                 purchase_type = EXCLUDED.purchase_type,
                 plan = EXCLUDED.plan,
                 status = 'pending',
                 updated_at = NOW()
             RETURNING *",
        )
        .bind(charge_id)
        .bind(shop_domain)
        .bind(credits_added)
        .bind(price_usd_cents)
        .bind(purchase_type)
        .bind(plan)
        .fetch_one(pool)
        .await?;

        Ok(purchase)
    }

    pub async fn find_by_charge_id(pool: &PgPool, charge_id: &str) -> Result<Option<Self>> {
        let purchase =
            sqlx::query_as::<_, Self>("SELECT * FROM credit_purchases WHERE charge_id = $1")
                .bind(charge_id)
                .fetch_optional(pool)
                .await?;
        Ok(purchase)
    }

    pub async fn list_pending(pool: &PgPool, shop_domain: &str) -> Result<Vec<Self>> {
        let purchases = sqlx::query_as::<_, Self>(
            "SELECT * FROM credit_purchases
             WHERE shop_domain = $1 AND status = 'pending'
             ORDER BY created_at ASC",
        )
        .bind(shop_domain)
        .fetch_all(pool)
        .await?;
        Ok(purchases)
    }

    /// Apply the billing platform's verdict for a charge, exactly once.
    ///
    /// The `WHERE status = 'pending'` guard is the idempotency gate: only the
    /// first delivery transitions the row, and only that delivery grants
    /// credits (plus the plan move and monthly grant for subscriptions).
    /// Returns `None` when the charge is unknown or already finalized.
    pub async fn finalize(
        pool: &PgPool,
        charge_id: &str,
        outcome: PurchaseOutcome,
        initial_credits: i64,
    ) -> Result<Option<Self>> {
        let mut tx = pool.begin().await?;

        let purchase = sqlx::query_as::<_, Self>(
            "UPDATE credit_purchases
             SET status = $2, updated_at = NOW()
             WHERE charge_id = $1 AND status = 'pending'
             RETURNING *",
        )
        .bind(charge_id)
        .bind(outcome.as_status())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(purchase) = purchase else {
            tx.rollback().await?;
            return Ok(None);
        };

        if purchase.status == PurchaseStatus::Completed {
            sqlx::query(
                "INSERT INTO shops (shop_domain, credits_balance)
                 VALUES ($1, $2)
                 ON CONFLICT (shop_domain) DO NOTHING",
            )
            .bind(&purchase.shop_domain)
            .bind(initial_credits.max(0))
            .execute(&mut *tx)
            .await?;

            if purchase.credits_added > 0 {
                sqlx::query(
                    "UPDATE shops
                     SET credits_balance = credits_balance + $2, updated_at = NOW()
                     WHERE shop_domain = $1",
                )
                .bind(&purchase.shop_domain)
                .bind(purchase.credits_added)
                .execute(&mut *tx)
                .await?;
            }

            if purchase.purchase_type == PurchaseType::Subscription {
                if let Some(plan_id) = &purchase.plan {
                    let plan = plan_config(plan_id);
                    sqlx::query(
                        "UPDATE shops
                         SET current_plan = $2, updated_at = NOW()
                         WHERE shop_domain = $1",
                    )
                    .bind(&purchase.shop_domain)
                    .bind(plan.id)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        tx.commit().await?;
        Ok(Some(purchase))
    }
}
