// Trait definitions for external collaborators
//
// All external services use trait abstractions to enable testing.

use anyhow::Result;
use async_trait::async_trait;

use openai_client::Message;
use storefront::{Collection, ContentUpdate, Product, ProductWithImages};

/// Language-model content generation.
///
/// Callers build the messages (prompts are domain logic); the implementation
/// owns transport, model selection, and the JSON-object reply contract.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Whether the generator has credentials to call the model at all.
    ///
    /// An unconfigured generator is a job-fatal condition, not a per-target one.
    fn is_configured(&self) -> bool;

    /// Complete a conversation, expecting a single JSON object back.
    async fn complete_json(&self, messages: Vec<Message>) -> Result<serde_json::Value>;
}

/// Commerce platform admin surface.
///
/// Entity reads, content writes, and the image alt-text update, scoped to a
/// shop per call.
#[async_trait]
pub trait StorefrontGateway: Send + Sync {
    /// Whether admin credentials exist for this shop.
    async fn has_credentials(&self, shop_domain: &str) -> bool;

    /// Fetch a product snapshot; `None` when the id resolves to nothing.
    async fn fetch_product(&self, shop_domain: &str, product_id: &str)
        -> Result<Option<Product>>;

    /// Fetch a collection snapshot; `None` when the id resolves to nothing.
    async fn fetch_collection(
        &self,
        shop_domain: &str,
        collection_id: &str,
    ) -> Result<Option<Collection>>;

    /// Apply generated content to a product. Platform user errors are `Err`.
    async fn apply_product_content(
        &self,
        shop_domain: &str,
        product_id: &str,
        update: &ContentUpdate,
    ) -> Result<()>;

    /// Apply generated content to a collection. Platform user errors are `Err`.
    async fn apply_collection_content(
        &self,
        shop_domain: &str,
        collection_id: &str,
        update: &ContentUpdate,
    ) -> Result<()>;

    /// Fetch a product with its image list.
    async fn fetch_product_images(
        &self,
        shop_domain: &str,
        product_id: &str,
    ) -> Result<Option<ProductWithImages>>;

    /// Update a single image's alt text.
    async fn update_image_alt(
        &self,
        shop_domain: &str,
        product_id: &str,
        image_id: &str,
        alt_text: &str,
    ) -> Result<()>;
}
