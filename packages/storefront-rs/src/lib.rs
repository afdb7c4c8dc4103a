//! Storefront platform admin API client.
//!
//! Thin client over the platform's per-shop admin surface: GraphQL document
//! POSTs for entity reads and content mutations, plus the REST image endpoint
//! for alt-text updates (the one write GraphQL does not expose).
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront::{StorefrontClient, StorefrontOptions};
//!
//! let client = StorefrontClient::new(StorefrontOptions {
//!     access_token: "shpat_...".into(),
//!     api_version: "2024-10".into(),
//! });
//!
//! let product = client.get_product("demo.mystore.example", "gid://storefront/Product/1").await?;
//! ```

pub mod error;
pub mod types;

pub use error::{Result, StorefrontError};
pub use types::*;

use reqwest::Client;
use serde_json::{json, Value};
use tracing::warn;

const PRODUCT_QUERY: &str = r#"
query ProductForJob($id: ID!) {
  product(id: $id) {
    id
    title
    handle
    productType
    vendor
    tags
    descriptionHtml
    status
    seo { title description }
    options { name values }
    variants(first: 25) { edges { node { id title sku } } }
    collections(first: 10) { edges { node { id title } } }
  }
}
"#;

const PRODUCT_UPDATE_MUTATION: &str = r#"
mutation ApplyGeneratedProductContent($input: ProductInput!) {
  productUpdate(input: $input) {
    product { id }
    userErrors { field message }
  }
}
"#;

const COLLECTION_QUERY: &str = r#"
query CollectionForJob($id: ID!) {
  collection(id: $id) {
    id
    title
    handle
    descriptionHtml
    seo { title description }
    products(first: 10) { edges { node { id title productType vendor } } }
  }
}
"#;

const COLLECTION_UPDATE_MUTATION: &str = r#"
mutation ApplyGeneratedCollectionContent($input: CollectionInput!) {
  collectionUpdate(input: $input) {
    collection { id }
    userErrors { field message }
  }
}
"#;

const PRODUCT_IMAGE_QUERY: &str = r#"
query AltTextProduct($id: ID!) {
  product(id: $id) {
    id
    title
    handle
    featuredImage { id }
    images(first: 50) { edges { node { id url originalSrc altText } } }
  }
}
"#;

/// Connection options for the admin API.
#[derive(Debug, Clone)]
pub struct StorefrontOptions {
    pub access_token: String,
    pub api_version: String,
}

/// Admin API client, scoped per call by shop domain.
#[derive(Clone)]
pub struct StorefrontClient {
    http_client: Client,
    options: StorefrontOptions,
}

impl StorefrontClient {
    pub fn new(options: StorefrontOptions) -> Self {
        Self {
            http_client: Client::new(),
            options,
        }
    }

    /// Whether the client holds a non-empty access token.
    pub fn has_token(&self) -> bool {
        !self.options.access_token.is_empty()
    }

    /// Execute a GraphQL document against a shop's admin endpoint.
    ///
    /// Returns the `data` value; top-level GraphQL errors become
    /// [`StorefrontError::GraphQl`].
    pub async fn graphql(&self, shop_domain: &str, query: &str, variables: Value) -> Result<Value> {
        if !self.has_token() {
            return Err(StorefrontError::Config("missing admin access token".into()));
        }

        let url = format!(
            "https://{}/admin/api/{}/graphql.json",
            shop_domain, self.options.api_version
        );

        let response = self
            .http_client
            .post(url)
            .header("X-Storefront-Access-Token", &self.options.access_token)
            .header("Content-Type", "application/json")
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| {
                warn!(shop = %shop_domain, error = %e, "admin GraphQL request failed");
                StorefrontError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorefrontError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| StorefrontError::Parse(e.to_string()))?;

        if let Some(errors) = body.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                let messages: Vec<String> = errors
                    .iter()
                    .filter_map(|e| {
                        serde_json::from_value::<types::GraphQlErrorRaw>(e.clone())
                            .ok()
                            .map(|e| e.message)
                    })
                    .collect();
                return Err(StorefrontError::GraphQl(messages.join("; ")));
            }
        }

        Ok(body.get("data").cloned().unwrap_or(Value::Null))
    }

    /// Fetch a product snapshot. `None` when the id resolves to nothing.
    pub async fn get_product(&self, shop_domain: &str, product_id: &str) -> Result<Option<Product>> {
        let data = self
            .graphql(shop_domain, PRODUCT_QUERY, json!({ "id": product_id }))
            .await?;

        match data.get("product") {
            None | Some(Value::Null) => Ok(None),
            Some(node) => {
                let raw: types::RawProduct = serde_json::from_value(node.clone())
                    .map_err(|e| StorefrontError::Parse(e.to_string()))?;
                Ok(Some(raw.into()))
            }
        }
    }

    /// Fetch a collection snapshot. `None` when the id resolves to nothing.
    pub async fn get_collection(
        &self,
        shop_domain: &str,
        collection_id: &str,
    ) -> Result<Option<Collection>> {
        let data = self
            .graphql(shop_domain, COLLECTION_QUERY, json!({ "id": collection_id }))
            .await?;

        match data.get("collection") {
            None | Some(Value::Null) => Ok(None),
            Some(node) => {
                let raw: types::RawCollection = serde_json::from_value(node.clone())
                    .map_err(|e| StorefrontError::Parse(e.to_string()))?;
                Ok(Some(raw.into()))
            }
        }
    }

    /// Write generated content fields back to a product.
    pub async fn update_product(
        &self,
        shop_domain: &str,
        product_id: &str,
        update: &ContentUpdate,
    ) -> Result<()> {
        let input = build_content_input(product_id, update);
        let data = self
            .graphql(shop_domain, PRODUCT_UPDATE_MUTATION, json!({ "input": input }))
            .await?;
        check_user_errors(&data, "productUpdate")
    }

    /// Write generated content fields back to a collection.
    pub async fn update_collection(
        &self,
        shop_domain: &str,
        collection_id: &str,
        update: &ContentUpdate,
    ) -> Result<()> {
        let input = build_content_input(collection_id, update);
        let data = self
            .graphql(
                shop_domain,
                COLLECTION_UPDATE_MUTATION,
                json!({ "input": input }),
            )
            .await?;
        check_user_errors(&data, "collectionUpdate")
    }

    /// Fetch a product with its image list.
    pub async fn get_product_images(
        &self,
        shop_domain: &str,
        product_id: &str,
    ) -> Result<Option<ProductWithImages>> {
        let data = self
            .graphql(shop_domain, PRODUCT_IMAGE_QUERY, json!({ "id": product_id }))
            .await?;

        match data.get("product") {
            None | Some(Value::Null) => Ok(None),
            Some(node) => {
                let raw: types::RawImageProduct = serde_json::from_value(node.clone())
                    .map_err(|e| StorefrontError::Parse(e.to_string()))?;
                Ok(Some(raw.into()))
            }
        }
    }

    /// Update a single image's alt text via the REST image endpoint.
    pub async fn update_image_alt(
        &self,
        shop_domain: &str,
        product_id: &str,
        image_id: &str,
        alt_text: &str,
    ) -> Result<()> {
        if !self.has_token() {
            return Err(StorefrontError::Config("missing admin access token".into()));
        }

        let product_numeric = extract_numeric_id(product_id).ok_or_else(|| {
            StorefrontError::Config(format!("invalid product id: {}", product_id))
        })?;
        let image_numeric = extract_numeric_id(image_id)
            .ok_or_else(|| StorefrontError::Config(format!("invalid image id: {}", image_id)))?;

        let url = format!(
            "https://{}/admin/api/{}/products/{}/images/{}.json",
            shop_domain, self.options.api_version, product_numeric, image_numeric
        );

        let response = self
            .http_client
            .put(url)
            .header("X-Storefront-Access-Token", &self.options.access_token)
            .header("Content-Type", "application/json")
            .json(&json!({ "image": { "id": image_numeric, "alt": alt_text } }))
            .send()
            .await
            .map_err(|e| StorefrontError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorefrontError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

/// Build a mutation input from the non-empty update fields.
fn build_content_input(entity_id: &str, update: &ContentUpdate) -> Value {
    let mut input = json!({ "id": entity_id });

    if let Some(title) = &update.title {
        input["title"] = json!(title);
    }
    if let Some(description_html) = &update.description_html {
        input["descriptionHtml"] = json!(description_html);
    }
    if update.seo_title.is_some() || update.seo_description.is_some() {
        let mut seo = json!({});
        if let Some(seo_title) = &update.seo_title {
            seo["title"] = json!(seo_title);
        }
        if let Some(seo_description) = &update.seo_description {
            seo["description"] = json!(seo_description);
        }
        input["seo"] = seo;
    }

    input
}

/// Surface mutation userErrors as a typed error.
fn check_user_errors(data: &Value, mutation: &str) -> Result<()> {
    let user_errors = data
        .get(mutation)
        .and_then(|m| m.get("userErrors"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    if user_errors.is_empty() {
        return Ok(());
    }

    let errors: Vec<UserError> = user_errors
        .into_iter()
        .filter_map(|e| serde_json::from_value(e).ok())
        .collect();
    Err(StorefrontError::UserErrors(errors))
}

/// Pull the trailing numeric id out of a GID (`gid://storefront/Product/42` -> `42`).
pub fn extract_numeric_id(gid: &str) -> Option<u64> {
    gid.rsplit('/').next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_id_extraction() {
        assert_eq!(extract_numeric_id("gid://storefront/Product/42"), Some(42));
        assert_eq!(
            extract_numeric_id("gid://storefront/ProductImage/901"),
            Some(901)
        );
        assert_eq!(extract_numeric_id("gid://storefront/Product/abc"), None);
        assert_eq!(extract_numeric_id(""), None);
    }

    #[test]
    fn content_input_includes_only_requested_fields() {
        let update = ContentUpdate {
            title: Some("New Title".into()),
            seo_description: Some("Meta".into()),
            ..Default::default()
        };
        let input = build_content_input("gid://storefront/Product/1", &update);
        assert_eq!(input["title"], "New Title");
        assert!(input.get("descriptionHtml").is_none());
        assert_eq!(input["seo"]["description"], "Meta");
        assert!(input["seo"].get("title").is_none());
    }

    #[test]
    fn user_errors_are_surfaced() {
        let data = serde_json::json!({
            "productUpdate": {
                "product": null,
                "userErrors": [ { "field": ["title"], "message": "Title is too long" } ]
            }
        });
        let err = check_user_errors(&data, "productUpdate").unwrap_err();
        assert!(err.to_string().contains("Title is too long"));
    }

    #[test]
    fn clean_mutation_passes() {
        let data = serde_json::json!({
            "productUpdate": { "product": { "id": "gid://storefront/Product/1" }, "userErrors": [] }
        });
        assert!(check_user_errors(&data, "productUpdate").is_ok());
    }
}
