//! Shop credit account - SQL persistence layer
//!
//! The ledger is the only component allowed to mutate balances. Every
//! mutation goes through `reserve` / `refund` / `add`; nothing else writes
//! `credits_balance`.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;

use crate::domains::credits::plans::DEFAULT_PLAN;

/// Credit ledger errors.
#[derive(Debug, Error)]
pub enum CreditError {
    #[error("Insufficient credits. Please add more to continue.")]
    InsufficientCredits,

    #[error("Credit amount must be positive.")]
    InvalidAmount,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Per-shop credit account.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Shop {
    pub shop_domain: String,
    pub credits_balance: i64,
    pub current_plan: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Negative and fractional-ish inputs normalize to zero, matching the
/// "amount <= 0 is a no-op" ledger contract.
fn normalize_amount(amount: i64) -> i64 {
    amount.max(0)
}

impl Shop {
    /// Find an account, or create it with the configured starting balance.
    ///
    /// At most one insert ever happens for a shop; concurrent callers race
    /// on `ON CONFLICT DO NOTHING` and all read the surviving row.
    pub async fn get_or_create(
        pool: &PgPool,
        shop_domain: &str,
        initial_credits: i64,
    ) -> Result<Self, CreditError> {
        sqlx::query(
            "INSERT INTO shops (shop_domain, credits_balance, current_plan)
             VALUES ($1, $2, $3)
             ON CONFLICT (shop_domain) DO NOTHING",
        )
        .bind(shop_domain)
        .bind(initial_credits.max(0))
        .bind(DEFAULT_PLAN)
        .execute(pool)
        .await?;

        let shop = sqlx::query_as::<_, Self>("SELECT * FROM shops WHERE shop_domain = $1")
            .bind(shop_domain)
            .fetch_one(pool)
            .await?;

        Ok(shop)
    }

    /// Atomically reserve credits, returning the new balance.
    ///
    /// The conditional update only matches when the balance covers the
    /// amount, so concurrent reservations serialize on the row and can never
    /// drive the balance negative. `amount <= 0` is a no-op returning the
    /// current balance.
    pub async fn reserve(
        pool: &PgPool,
        shop_domain: &str,
        amount: i64,
        initial_credits: i64,
    ) -> Result<i64, CreditError> {
        let credits = normalize_amount(amount);
        let shop = Self::get_or_create(pool, shop_domain, initial_credits).await?;
        if credits == 0 {
            return Ok(shop.credits_balance);
        }

        let new_balance = sqlx::query_scalar::<_, i64>(
            "UPDATE shops
             SET credits_balance = credits_balance - $2, updated_at = NOW()
             WHERE shop_domain = $1 AND credits_balance >= $2
             RETURNING credits_balance",
        )
        .bind(shop_domain)
        .bind(credits)
        .fetch_optional(pool)
        .await?;

        new_balance.ok_or(CreditError::InsufficientCredits)
    }

    /// Return credits after a failed job. No-op on `amount <= 0`.
    pub async fn refund(
        pool: &PgPool,
        shop_domain: &str,
        amount: i64,
        initial_credits: i64,
    ) -> Result<Option<Self>, CreditError> {
        let credits = normalize_amount(amount);
        if credits == 0 {
            return Ok(None);
        }
        Self::get_or_create(pool, shop_domain, initial_credits).await?;

        let shop = sqlx::query_as::<_, Self>(
            "UPDATE shops
             SET credits_balance = credits_balance + $2, updated_at = NOW()
             WHERE shop_domain = $1
             RETURNING *",
        )
        .bind(shop_domain)
        .bind(credits)
        .fetch_one(pool)
        .await?;

        Ok(Some(shop))
    }

    /// Grant credits (purchases, plan grants). Rejects non-positive amounts.
    pub async fn add(
        pool: &PgPool,
        shop_domain: &str,
        amount: i64,
        initial_credits: i64,
    ) -> Result<Self, CreditError> {
        let credits = normalize_amount(amount);
        if credits == 0 {
            return Err(CreditError::InvalidAmount);
        }
        Self::get_or_create(pool, shop_domain, initial_credits).await?;

        let shop = sqlx::query_as::<_, Self>(
            "UPDATE shops
             SET credits_balance = credits_balance + $2, updated_at = NOW()
             WHERE shop_domain = $1
             RETURNING *",
        )
        .bind(shop_domain)
        .bind(credits)
        .fetch_one(pool)
        .await?;

        Ok(shop)
    }

    /// Move the shop to a new plan.
    pub async fn set_plan(
        pool: &PgPool,
        shop_domain: &str,
        plan_id: &str,
        initial_credits: i64,
    ) -> Result<Self, CreditError> {
        Self::get_or_create(pool, shop_domain, initial_credits).await?;

        let shop = sqlx::query_as::<_, Self>(
            "UPDATE shops
             SET current_plan = $2, updated_at = NOW()
             WHERE shop_domain = $1
             RETURNING *",
        )
        .bind(shop_domain)
        .bind(plan_id)
        .fetch_one(pool)
        .await?;

        Ok(shop)
    }

    /// Erase every row owned by a shop (account, jobs, purchases).
    ///
    /// The data-erasure path for tenant offboarding; triggered by the
    /// external compliance surface.
    pub async fn erase(pool: &PgPool, shop_domain: &str) -> Result<()> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM credit_purchases WHERE shop_domain = $1")
            .bind(shop_domain)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM bulk_jobs WHERE shop_domain = $1")
            .bind(shop_domain)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM shops WHERE shop_domain = $1")
            .bind(shop_domain)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_amounts_normalize_to_zero() {
        assert_eq!(normalize_amount(-5), 0);
        assert_eq!(normalize_amount(0), 0);
        assert_eq!(normalize_amount(12), 12);
    }
}
