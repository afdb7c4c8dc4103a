//! Shared test helpers: harness, mock dependencies, and fixtures.

pub mod harness;

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use server_core::domains::jobs::{CreateJobRequest, SettingsInput};
use server_core::kernel::test_dependencies::{InMemoryStorefront, StaticGenerator};
use server_core::kernel::ServerDeps;
use storefront::{Product, ProductImage, ProductWithImages};

pub const SHOP: &str = "demo.mystore.example";

pub fn product_gid(n: u32) -> String {
    format!("gid://storefront/Product/{}", n)
}

pub fn collection_gid(n: u32) -> String {
    format!("gid://storefront/Collection/{}", n)
}

/// Wire ServerDeps around in-memory collaborators.
pub fn make_deps(
    pool: PgPool,
    storefront: Arc<InMemoryStorefront>,
    generation: Arc<StaticGenerator>,
    initial_credits: i64,
) -> Arc<ServerDeps> {
    Arc::new(ServerDeps::new(
        pool,
        storefront,
        generation,
        initial_credits,
        Duration::from_secs(5),
    ))
}

pub fn seed_product(storefront: &InMemoryStorefront, n: u32) {
    storefront.seed_product(Product {
        id: product_gid(n),
        title: format!("Product {}", n),
        handle: format!("product-{}", n),
        body_html: "<p>Original copy.</p>".into(),
        ..Default::default()
    });
}

pub fn seed_product_images(storefront: &InMemoryStorefront, n: u32, image_count: usize) {
    let images = (0..image_count)
        .map(|i| ProductImage {
            id: format!("gid://storefront/ProductImage/{}{}", n, i),
            url: format!("https://cdn.example.com/{}-{}.jpg", n, i),
            alt_text: String::new(),
        })
        .collect::<Vec<_>>();
    storefront.seed_product_images(ProductWithImages {
        id: product_gid(n),
        title: format!("Product {}", n),
        handle: format!("product-{}", n),
        featured_image_id: images.first().map(|image| image.id.clone()),
        images,
    });
}

/// A generator reply covering every product copy field.
pub fn full_copy_response() -> serde_json::Value {
    serde_json::json!({
        "title": "Fresh Generated Title",
        "description_html": "<p>Generated copy.</p>",
        "meta_title": "Generated Meta Title",
        "meta_description": "Generated meta description."
    })
}

/// A products request for `count` targets over the given fields.
pub fn products_request(count: u32, fields: &[&str]) -> CreateJobRequest {
    CreateJobRequest {
        product_ids: (1..=count).map(product_gid).collect(),
        collection_ids: vec![],
        settings: Some(SettingsInput {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            ..Default::default()
        }),
    }
}

pub async fn balance(pool: &PgPool, shop_domain: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT credits_balance FROM shops WHERE shop_domain = $1")
        .bind(shop_domain)
        .fetch_one(pool)
        .await
        .expect("shop row should exist")
}

pub async fn job_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bulk_jobs")
        .fetch_one(pool)
        .await
        .expect("count query should succeed")
}
