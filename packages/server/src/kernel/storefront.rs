// Storefront gateway backed by the admin API client
//
// Adapter between the StorefrontGateway trait and the storefront crate.
// Deployment model: one admin access token per deployment; per-shop session
// establishment is owned by the (external) auth layer.

use anyhow::Result;
use async_trait::async_trait;

use storefront::{
    Collection, ContentUpdate, Product, ProductWithImages, StorefrontClient, StorefrontOptions,
};

use super::traits::StorefrontGateway;

/// Admin-API implementation of the storefront gateway.
pub struct AdminGateway {
    client: StorefrontClient,
}

impl AdminGateway {
    pub fn new(access_token: Option<String>, api_version: impl Into<String>) -> Self {
        let client = StorefrontClient::new(StorefrontOptions {
            access_token: access_token.unwrap_or_default(),
            api_version: api_version.into(),
        });
        Self { client }
    }
}

#[async_trait]
impl StorefrontGateway for AdminGateway {
    async fn has_credentials(&self, _shop_domain: &str) -> bool {
        self.client.has_token()
    }

    async fn fetch_product(
        &self,
        shop_domain: &str,
        product_id: &str,
    ) -> Result<Option<Product>> {
        Ok(self.client.get_product(shop_domain, product_id).await?)
    }

    async fn fetch_collection(
        &self,
        shop_domain: &str,
        collection_id: &str,
    ) -> Result<Option<Collection>> {
        Ok(self.client.get_collection(shop_domain, collection_id).await?)
    }

    async fn apply_product_content(
        &self,
        shop_domain: &str,
        product_id: &str,
        update: &ContentUpdate,
    ) -> Result<()> {
        Ok(self
            .client
            .update_product(shop_domain, product_id, update)
            .await?)
    }

    async fn apply_collection_content(
        &self,
        shop_domain: &str,
        collection_id: &str,
        update: &ContentUpdate,
    ) -> Result<()> {
        Ok(self
            .client
            .update_collection(shop_domain, collection_id, update)
            .await?)
    }

    async fn fetch_product_images(
        &self,
        shop_domain: &str,
        product_id: &str,
    ) -> Result<Option<ProductWithImages>> {
        Ok(self
            .client
            .get_product_images(shop_domain, product_id)
            .await?)
    }

    async fn update_image_alt(
        &self,
        shop_domain: &str,
        product_id: &str,
        image_id: &str,
        alt_text: &str,
    ) -> Result<()> {
        Ok(self
            .client
            .update_image_alt(shop_domain, product_id, image_id, alt_text)
            .await?)
    }
}
