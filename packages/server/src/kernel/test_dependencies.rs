//! In-memory collaborator implementations for tests.
//!
//! These mirror the production traits with programmable state and failure
//! injection so integration tests can drive the worker end-to-end without
//! touching the network.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use openai_client::Message;
use storefront::{Collection, ContentUpdate, Product, ProductWithImages};

use super::traits::{ContentGenerator, StorefrontGateway};

/// Scripted content generator.
///
/// Pops queued responses first, then falls back to the default response.
pub struct StaticGenerator {
    configured: bool,
    fail_all: bool,
    responses: Mutex<VecDeque<serde_json::Value>>,
    default_response: serde_json::Value,
}

impl StaticGenerator {
    /// A configured generator that always returns `default_response`.
    pub fn new(default_response: serde_json::Value) -> Self {
        Self {
            configured: true,
            fail_all: false,
            responses: Mutex::new(VecDeque::new()),
            default_response,
        }
    }

    /// A generator with no credentials (job-fatal on use).
    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            fail_all: false,
            responses: Mutex::new(VecDeque::new()),
            default_response: serde_json::Value::Null,
        }
    }

    /// A configured generator whose every call errors.
    pub fn failing() -> Self {
        Self {
            configured: true,
            fail_all: true,
            responses: Mutex::new(VecDeque::new()),
            default_response: serde_json::Value::Null,
        }
    }

    /// Queue a one-shot response ahead of the default.
    pub fn push_response(&self, response: serde_json::Value) {
        self.responses.lock().unwrap().push_back(response);
    }
}

#[async_trait]
impl ContentGenerator for StaticGenerator {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn complete_json(&self, _messages: Vec<Message>) -> Result<serde_json::Value> {
        if !self.configured {
            bail!("OpenAI API key is not configured");
        }
        if self.fail_all {
            bail!("generation quota exhausted");
        }
        let queued = self.responses.lock().unwrap().pop_front();
        Ok(queued.unwrap_or_else(|| self.default_response.clone()))
    }
}

/// In-memory storefront with recorded writes and per-id failure injection.
#[derive(Default)]
pub struct InMemoryStorefront {
    pub credentialed: bool,
    products: Mutex<HashMap<String, Product>>,
    collections: Mutex<HashMap<String, Collection>>,
    product_images: Mutex<HashMap<String, ProductWithImages>>,
    fail_ids: Mutex<HashSet<String>>,
    applied_products: Mutex<Vec<(String, ContentUpdate)>>,
    applied_collections: Mutex<Vec<(String, ContentUpdate)>>,
    alt_updates: Mutex<Vec<(String, String, String)>>,
}

impl InMemoryStorefront {
    pub fn new() -> Self {
        Self {
            credentialed: true,
            ..Default::default()
        }
    }

    pub fn without_credentials() -> Self {
        Self {
            credentialed: false,
            ..Default::default()
        }
    }

    pub fn seed_product(&self, product: Product) {
        self.products
            .lock()
            .unwrap()
            .insert(product.id.clone(), product);
    }

    pub fn seed_collection(&self, collection: Collection) {
        self.collections
            .lock()
            .unwrap()
            .insert(collection.id.clone(), collection);
    }

    pub fn seed_product_images(&self, product: ProductWithImages) {
        self.product_images
            .lock()
            .unwrap()
            .insert(product.id.clone(), product);
    }

    /// Make every call touching this entity id fail.
    pub fn fail_for(&self, entity_id: impl Into<String>) {
        self.fail_ids.lock().unwrap().insert(entity_id.into());
    }

    pub fn applied_products(&self) -> Vec<(String, ContentUpdate)> {
        self.applied_products.lock().unwrap().clone()
    }

    pub fn applied_collections(&self) -> Vec<(String, ContentUpdate)> {
        self.applied_collections.lock().unwrap().clone()
    }

    /// Recorded alt-text writes as (product_id, image_id, alt_text).
    pub fn alt_updates(&self) -> Vec<(String, String, String)> {
        self.alt_updates.lock().unwrap().clone()
    }

    fn check_failure(&self, entity_id: &str) -> Result<()> {
        if self.fail_ids.lock().unwrap().contains(entity_id) {
            return Err(anyhow!("injected failure for {}", entity_id));
        }
        Ok(())
    }
}

#[async_trait]
impl StorefrontGateway for InMemoryStorefront {
    async fn has_credentials(&self, _shop_domain: &str) -> bool {
        self.credentialed
    }

    async fn fetch_product(
        &self,
        _shop_domain: &str,
        product_id: &str,
    ) -> Result<Option<Product>> {
        self.check_failure(product_id)?;
        Ok(self.products.lock().unwrap().get(product_id).cloned())
    }

    async fn fetch_collection(
        &self,
        _shop_domain: &str,
        collection_id: &str,
    ) -> Result<Option<Collection>> {
        self.check_failure(collection_id)?;
        Ok(self.collections.lock().unwrap().get(collection_id).cloned())
    }

    async fn apply_product_content(
        &self,
        _shop_domain: &str,
        product_id: &str,
        update: &ContentUpdate,
    ) -> Result<()> {
        self.check_failure(product_id)?;
        self.applied_products
            .lock()
            .unwrap()
            .push((product_id.to_string(), update.clone()));
        Ok(())
    }

    async fn apply_collection_content(
        &self,
        _shop_domain: &str,
        collection_id: &str,
        update: &ContentUpdate,
    ) -> Result<()> {
        self.check_failure(collection_id)?;
        self.applied_collections
            .lock()
            .unwrap()
            .push((collection_id.to_string(), update.clone()));
        Ok(())
    }

    async fn fetch_product_images(
        &self,
        _shop_domain: &str,
        product_id: &str,
    ) -> Result<Option<ProductWithImages>> {
        self.check_failure(product_id)?;
        Ok(self
            .product_images
            .lock()
            .unwrap()
            .get(product_id)
            .cloned())
    }

    async fn update_image_alt(
        &self,
        _shop_domain: &str,
        product_id: &str,
        image_id: &str,
        alt_text: &str,
    ) -> Result<()> {
        self.check_failure(image_id)?;
        self.alt_updates.lock().unwrap().push((
            product_id.to_string(),
            image_id.to_string(),
            alt_text.to_string(),
        ));
        Ok(())
    }
}
