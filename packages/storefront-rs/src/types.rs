//! Storefront admin API types.
//!
//! Public snapshot types are flattened from the GraphQL edge/node envelopes
//! so callers never see connection plumbing.

use serde::{Deserialize, Serialize};

// =============================================================================
// Public snapshot types
// =============================================================================

/// A product snapshot as fetched from the admin API.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Product {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub body_html: String,
    #[serde(default)]
    pub seo: Seo,
    #[serde(default)]
    pub options: Vec<ProductOption>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub collections: Vec<CollectionRef>,
}

/// A collection snapshot as fetched from the admin API.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Collection {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub body_html: String,
    #[serde(default)]
    pub seo: Seo,
    #[serde(default)]
    pub products: Vec<ProductRef>,
}

/// SEO fields shared by products and collections.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Seo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// A product option (name + values).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProductOption {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

/// A product variant.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Variant {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub sku: Option<String>,
}

/// A collection reference on a product.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CollectionRef {
    pub id: String,
    pub title: String,
}

/// A product reference on a collection.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProductRef {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
}

/// A product with its image list (alt-text workflows).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProductWithImages {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub featured_image_id: Option<String>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
}

/// A single product image.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProductImage {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub alt_text: String,
}

/// Content fields to write back to a product or collection.
///
/// Only the `Some` fields are sent; an all-`None` update is a no-op the
/// caller should skip.
#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct ContentUpdate {
    pub title: Option<String>,
    pub description_html: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

impl ContentUpdate {
    /// Whether the update carries no fields at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description_html.is_none()
            && self.seo_title.is_none()
            && self.seo_description.is_none()
    }
}

/// A mutation-level user error returned by the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

// =============================================================================
// Raw wire types (GraphQL envelopes)
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct Edges<T> {
    #[serde(default = "Vec::new")]
    pub edges: Vec<Edge<T>>,
}

impl<T> Default for Edges<T> {
    fn default() -> Self {
        Self { edges: Vec::new() }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct Edge<T> {
    pub node: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSeo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<Option<RawSeo>> for Seo {
    fn from(raw: Option<RawSeo>) -> Self {
        let raw = raw.unwrap_or(RawSeo {
            title: None,
            description: None,
        });
        Self {
            title: raw.title.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawProduct {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default, rename = "productType")]
    pub product_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, rename = "descriptionHtml")]
    pub description_html: Option<String>,
    #[serde(default)]
    pub seo: Option<RawSeo>,
    #[serde(default)]
    pub options: Vec<RawOption>,
    #[serde(default)]
    pub variants: Option<Edges<RawVariant>>,
    #[serde(default)]
    pub collections: Option<Edges<RawCollectionRef>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawOption {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawVariant {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCollectionRef {
    pub id: String,
    pub title: String,
}

impl From<RawProduct> for Product {
    fn from(raw: RawProduct) -> Self {
        Self {
            id: raw.id,
            title: raw.title,
            handle: raw.handle.unwrap_or_default(),
            vendor: raw.vendor,
            product_type: raw.product_type,
            status: raw.status,
            tags: raw.tags,
            body_html: raw.description_html.unwrap_or_default(),
            seo: raw.seo.into(),
            options: raw
                .options
                .into_iter()
                .filter_map(|o| {
                    o.name.map(|name| ProductOption {
                        name,
                        values: o.values,
                    })
                })
                .collect(),
            variants: raw
                .variants
                .unwrap_or_default()
                .edges
                .into_iter()
                .map(|e| Variant {
                    id: e.node.id,
                    title: e.node.title.unwrap_or_default(),
                    sku: e.node.sku,
                })
                .collect(),
            collections: raw
                .collections
                .unwrap_or_default()
                .edges
                .into_iter()
                .map(|e| CollectionRef {
                    id: e.node.id,
                    title: e.node.title,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCollection {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default, rename = "descriptionHtml")]
    pub description_html: Option<String>,
    #[serde(default)]
    pub seo: Option<RawSeo>,
    #[serde(default)]
    pub products: Option<Edges<RawProductRef>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawProductRef {
    pub id: String,
    pub title: String,
    #[serde(default, rename = "productType")]
    pub product_type: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
}

impl From<RawCollection> for Collection {
    fn from(raw: RawCollection) -> Self {
        Self {
            id: raw.id,
            title: raw.title,
            handle: raw.handle.unwrap_or_default(),
            body_html: raw.description_html.unwrap_or_default(),
            seo: raw.seo.into(),
            products: raw
                .products
                .unwrap_or_default()
                .edges
                .into_iter()
                .map(|e| ProductRef {
                    id: e.node.id,
                    title: e.node.title,
                    product_type: e.node.product_type,
                    vendor: e.node.vendor,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawImageProduct {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default, rename = "featuredImage")]
    pub featured_image: Option<RawFeaturedImage>,
    #[serde(default)]
    pub images: Option<Edges<RawImage>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawFeaturedImage {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawImage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "originalSrc")]
    pub original_src: Option<String>,
    #[serde(default, rename = "altText")]
    pub alt_text: Option<String>,
}

impl From<RawImageProduct> for ProductWithImages {
    fn from(raw: RawImageProduct) -> Self {
        let images = raw
            .images
            .unwrap_or_default()
            .edges
            .into_iter()
            .filter_map(|e| {
                let node = e.node;
                let url = node.url.or(node.original_src).unwrap_or_default();
                match node.id {
                    Some(id) if !url.is_empty() => Some(ProductImage {
                        id,
                        url,
                        alt_text: node.alt_text.unwrap_or_default(),
                    }),
                    _ => None,
                }
            })
            .collect();

        Self {
            id: raw.id,
            title: raw.title,
            handle: raw.handle.unwrap_or_default(),
            featured_image_id: raw.featured_image.and_then(|f| f.id),
            images,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlErrorRaw {
    pub message: String,
}
