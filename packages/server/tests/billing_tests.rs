//! Purchase finalization tests: the charge id is the idempotency key, so a
//! re-delivered billing confirmation must never double-grant credits.

mod common;

use common::harness::TestHarness;
use common::SHOP;
use test_context::test_context;

use server_core::domains::credits::{
    CreditPurchase, PurchaseOutcome, PurchaseStatus, PurchaseType, Shop,
};

const INITIAL: i64 = 100;

#[test_context(TestHarness)]
#[tokio::test]
async fn completed_purchase_adds_credits_exactly_once(ctx: &mut TestHarness) {
    Shop::get_or_create(&ctx.db_pool, SHOP, INITIAL).await.unwrap();
    CreditPurchase::record_pending(
        &ctx.db_pool,
        "charge_42",
        SHOP,
        500,
        Some(900),
        PurchaseType::OneTime,
        None,
    )
    .await
    .unwrap();

    let first = CreditPurchase::finalize(&ctx.db_pool, "charge_42", PurchaseOutcome::Completed, INITIAL)
        .await
        .unwrap();
    assert_eq!(first.unwrap().status, PurchaseStatus::Completed);
    assert_eq!(common::balance(&ctx.db_pool, SHOP).await, 600);

    // Re-delivery of the same confirmation: no transition, no second grant.
    let second = CreditPurchase::finalize(&ctx.db_pool, "charge_42", PurchaseOutcome::Completed, INITIAL)
        .await
        .unwrap();
    assert!(second.is_none());
    assert_eq!(common::balance(&ctx.db_pool, SHOP).await, 600);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn declined_purchase_grants_nothing(ctx: &mut TestHarness) {
    Shop::get_or_create(&ctx.db_pool, SHOP, INITIAL).await.unwrap();
    CreditPurchase::record_pending(
        &ctx.db_pool,
        "charge_declined",
        SHOP,
        500,
        None,
        PurchaseType::OneTime,
        None,
    )
    .await
    .unwrap();

    let finalized =
        CreditPurchase::finalize(&ctx.db_pool, "charge_declined", PurchaseOutcome::Declined, INITIAL)
            .await
            .unwrap()
            .unwrap();
    assert_eq!(finalized.status, PurchaseStatus::Declined);
    assert_eq!(common::balance(&ctx.db_pool, SHOP).await, 100);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn subscription_purchase_sets_plan_and_grants_monthly_credits(ctx: &mut TestHarness) {
    Shop::get_or_create(&ctx.db_pool, SHOP, INITIAL).await.unwrap();
    // The pending record carries the plan's monthly grant.
    CreditPurchase::record_pending(
        &ctx.db_pool,
        "charge_sub",
        SHOP,
        13_000,
        Some(4500),
        PurchaseType::Subscription,
        Some("GROWTH"),
    )
    .await
    .unwrap();

    CreditPurchase::finalize(&ctx.db_pool, "charge_sub", PurchaseOutcome::Completed, INITIAL)
        .await
        .unwrap()
        .unwrap();

    let shop = Shop::get_or_create(&ctx.db_pool, SHOP, INITIAL).await.unwrap();
    assert_eq!(shop.current_plan, "GROWTH");
    assert_eq!(shop.credits_balance, 13_100);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn finalizing_an_unknown_charge_is_a_noop(ctx: &mut TestHarness) {
    let finalized =
        CreditPurchase::finalize(&ctx.db_pool, "charge_missing", PurchaseOutcome::Completed, INITIAL)
            .await
            .unwrap();
    assert!(finalized.is_none());
}
