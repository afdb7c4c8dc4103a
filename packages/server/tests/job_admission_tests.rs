//! Admission path tests: every rejection leaves no side effects, and a
//! successful admission is exactly one reservation plus one queued job row.

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use common::harness::TestHarness;
use common::{make_deps, products_request, SHOP};
use test_context::test_context;

use server_core::domains::credits::Shop;
use server_core::domains::jobs::{
    submit_job, AdmissionError, BulkJob, CreateJobRequest, JobKind, JobStatus, SettingsInput,
};
use server_core::kernel::test_dependencies::{InMemoryStorefront, StaticGenerator};

const INITIAL: i64 = 100;

fn clean_deps(ctx: &TestHarness) -> Arc<server_core::kernel::ServerDeps> {
    make_deps(
        ctx.db_pool.clone(),
        Arc::new(InMemoryStorefront::new()),
        Arc::new(StaticGenerator::new(common::full_copy_response())),
        INITIAL,
    )
}

#[test_context(TestHarness)]
#[tokio::test]
async fn products_job_reserves_credits_and_queues(ctx: &mut TestHarness) {
    let deps = clean_deps(ctx);
    let request = products_request(10, &["title", "description", "meta_title"]);

    let job_id = submit_job(&deps, SHOP, request).await.unwrap();

    // 10 targets x 3 fields = 30 credits reserved.
    assert_eq!(common::balance(&ctx.db_pool, SHOP).await, 70);

    let job = BulkJob::find_by_id(&ctx.db_pool, job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.kind, JobKind::Products);
    assert_eq!(job.total_items, 30);
    assert_eq!(job.processed_items, 0);
    assert_eq!(job.config.credit_cost, 30);
    assert_eq!(job.config.product_ids.len(), 10);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn duplicate_ids_and_fields_are_deduped_before_pricing(ctx: &mut TestHarness) {
    let deps = clean_deps(ctx);
    let request = CreateJobRequest {
        product_ids: vec![
            common::product_gid(1),
            format!(" {} ", common::product_gid(1)),
            common::product_gid(2),
        ],
        collection_ids: vec![],
        settings: Some(SettingsInput {
            fields: vec!["title".into(), "title".into(), "description".into()],
            ..Default::default()
        }),
    };

    let job_id = submit_job(&deps, SHOP, request).await.unwrap();
    let job = BulkJob::find_by_id(&ctx.db_pool, job_id).await.unwrap().unwrap();
    // 2 unique targets x 2 unique fields.
    assert_eq!(job.total_items, 4);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn mixed_selection_is_rejected_without_side_effects(ctx: &mut TestHarness) {
    let deps = clean_deps(ctx);
    let request = CreateJobRequest {
        product_ids: vec![common::product_gid(1)],
        collection_ids: vec![common::collection_gid(1)],
        settings: Some(SettingsInput {
            fields: vec!["title".into()],
            ..Default::default()
        }),
    };

    let err = submit_job(&deps, SHOP, request).await.unwrap_err();
    assert!(matches!(err, AdmissionError::MixedSelection));
    assert_eq!(common::job_count(&ctx.db_pool).await, 0);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn empty_selection_and_invalid_ids_are_rejected(ctx: &mut TestHarness) {
    let deps = clean_deps(ctx);

    let err = submit_job(&deps, SHOP, products_request(0, &["title"])).await.unwrap_err();
    assert!(matches!(err, AdmissionError::EmptySelection));

    let request = CreateJobRequest {
        product_ids: vec!["not-a-gid".into()],
        collection_ids: vec![],
        settings: Some(SettingsInput {
            fields: vec!["title".into()],
            ..Default::default()
        }),
    };
    let err = submit_job(&deps, SHOP, request).await.unwrap_err();
    assert!(matches!(err, AdmissionError::InvalidProductId));

    assert_eq!(common::job_count(&ctx.db_pool).await, 0);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn unsupported_fields_are_rejected(ctx: &mut TestHarness) {
    let deps = clean_deps(ctx);

    // Unknown field name.
    let err = submit_job(&deps, SHOP, products_request(1, &["handle"])).await.unwrap_err();
    assert!(matches!(err, AdmissionError::UnsupportedFields(_)));

    // Known field outside the mode's allow-list: alt_text on a plain products job.
    let err = submit_job(&deps, SHOP, products_request(1, &["title", "alt_text"]))
        .await
        .unwrap_err();
    assert!(matches!(err, AdmissionError::UnsupportedFields(_)));

    assert_eq!(common::job_count(&ctx.db_pool).await, 0);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn plan_limit_is_enforced_for_product_jobs(ctx: &mut TestHarness) {
    let deps = clean_deps(ctx);

    // FREE plan allows at most 5 products per job.
    let err = submit_job(&deps, SHOP, products_request(6, &["title"])).await.unwrap_err();
    assert!(matches!(err, AdmissionError::PlanLimitExceeded { .. }));
    assert_eq!(common::balance(&ctx.db_pool, SHOP).await, 100);

    // A bigger plan admits the same selection.
    Shop::set_plan(&ctx.db_pool, SHOP, "GROWTH", INITIAL).await.unwrap();
    submit_job(&deps, SHOP, products_request(6, &["title"])).await.unwrap();
}

#[test_context(TestHarness)]
#[tokio::test]
async fn insufficient_credits_aborts_with_no_job_row(ctx: &mut TestHarness) {
    let deps = make_deps(
        ctx.db_pool.clone(),
        Arc::new(InMemoryStorefront::new()),
        Arc::new(StaticGenerator::new(common::full_copy_response())),
        5,
    );

    // 5 targets x 3 fields = 15 credits against a balance of 5.
    let err = submit_job(
        &deps,
        SHOP,
        products_request(5, &["title", "description", "meta_title"]),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AdmissionError::InsufficientCredits));
    assert_eq!(common::balance(&ctx.db_pool, SHOP).await, 5);
    assert_eq!(common::job_count(&ctx.db_pool).await, 0);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn missing_admin_session_is_a_service_error(ctx: &mut TestHarness) {
    let deps = make_deps(
        ctx.db_pool.clone(),
        Arc::new(InMemoryStorefront::without_credentials()),
        Arc::new(StaticGenerator::new(common::full_copy_response())),
        INITIAL,
    );

    let err = submit_job(&deps, SHOP, products_request(2, &["title"])).await.unwrap_err();
    assert!(matches!(err, AdmissionError::SessionUnavailable));
    assert_eq!(common::balance(&ctx.db_pool, SHOP).await, 100);
    assert_eq!(common::job_count(&ctx.db_pool).await, 0);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn alt_text_cost_uses_image_counts(ctx: &mut TestHarness) {
    let deps = clean_deps(ctx);

    let image_counts: BTreeMap<String, f64> = [
        (common::product_gid(1), 2.0),
        (common::product_gid(2), 1.0),
        (common::product_gid(3), 3.0),
        (common::product_gid(4), 1.0),
    ]
    .into();

    let request = CreateJobRequest {
        product_ids: (1..=4).map(common::product_gid).collect(),
        collection_ids: vec![],
        settings: Some(SettingsInput {
            fields: vec!["alt_text".into()],
            task: Some("alt_text".into()),
            image_scope: Some("all".into()),
            image_counts: Some(image_counts),
            ..Default::default()
        }),
    };

    let job_id = submit_job(&deps, SHOP, request).await.unwrap();

    let job = BulkJob::find_by_id(&ctx.db_pool, job_id).await.unwrap().unwrap();
    assert_eq!(job.kind, JobKind::AltText);
    assert_eq!(job.total_items, 7);
    assert_eq!(job.config.settings.total_image_targets, Some(7));
    assert_eq!(common::balance(&ctx.db_pool, SHOP).await, 93);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn alt_text_over_collections_is_rejected(ctx: &mut TestHarness) {
    let deps = clean_deps(ctx);

    let request = CreateJobRequest {
        product_ids: vec![],
        collection_ids: vec![common::collection_gid(1)],
        settings: Some(SettingsInput {
            fields: vec!["alt_text".into()],
            task: Some("alt_text".into()),
            ..Default::default()
        }),
    };

    let err = submit_job(&deps, SHOP, request).await.unwrap_err();
    assert!(matches!(err, AdmissionError::AltTextRequiresProducts));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn reservation_is_compensated_when_the_job_insert_fails(ctx: &mut TestHarness) {
    let deps = clean_deps(ctx);
    Shop::get_or_create(&ctx.db_pool, SHOP, INITIAL).await.unwrap();

    // Force the insert after the reservation to fail.
    sqlx::query("DROP TABLE bulk_jobs").execute(&ctx.db_pool).await.unwrap();

    let err = submit_job(&deps, SHOP, products_request(5, &["title"])).await.unwrap_err();
    assert!(matches!(err, AdmissionError::Internal(_)));

    // The reservation was refunded: end state equals the pre-reservation balance.
    assert_eq!(common::balance(&ctx.db_pool, SHOP).await, 100);
}
