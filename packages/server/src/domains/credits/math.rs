//! Credit math - the sole authority for job cost.
//!
//! Pure, deterministic, no I/O. Admission sizes reservations with these
//! functions and the job's stored `total_items` stays authoritative for the
//! worker afterwards; cost is never recomputed during execution.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Upper bound on billable images per product in an alt-text job.
pub const MAX_IMAGES_PER_PRODUCT: i64 = 50;

const PRODUCT_ID_PREFIX: &str = "gid://storefront/Product/";
const COLLECTION_ID_PREFIX: &str = "gid://storefront/Collection/";

/// A generatable content field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentField {
    Title,
    Description,
    MetaTitle,
    MetaDescription,
    AltText,
}

impl ContentField {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "title" => Some(Self::Title),
            "description" => Some(Self::Description),
            "meta_title" => Some(Self::MetaTitle),
            "meta_description" => Some(Self::MetaDescription),
            "alt_text" => Some(Self::AltText),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::MetaTitle => "meta_title",
            Self::MetaDescription => "meta_description",
            Self::AltText => "alt_text",
        }
    }
}

/// Fields a product copy job may generate.
pub const PRODUCT_FIELD_ALLOWLIST: &[ContentField] = &[
    ContentField::Title,
    ContentField::Description,
    ContentField::MetaTitle,
    ContentField::MetaDescription,
];

/// Fields a collection copy job may generate.
pub const COLLECTION_FIELD_ALLOWLIST: &[ContentField] = &[
    ContentField::Title,
    ContentField::Description,
    ContentField::MetaTitle,
    ContentField::MetaDescription,
];

/// The single field an alt-text job generates.
pub const ALT_TEXT_FIELD_ALLOWLIST: &[ContentField] = &[ContentField::AltText];

/// Trim, drop empties, and dedupe an id list, preserving first-seen order.
pub fn sanitize_id_list<S: AsRef<str>>(ids: &[S]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut unique = Vec::new();
    for id in ids {
        let trimmed = id.as_ref().trim();
        if !trimmed.is_empty() && seen.insert(trimmed.to_string()) {
            unique.push(trimmed.to_string());
        }
    }
    unique
}

/// Dedupe a field list, preserving first-seen order.
pub fn dedupe_fields(fields: &[ContentField]) -> Vec<ContentField> {
    let mut seen = std::collections::HashSet::new();
    fields
        .iter()
        .copied()
        .filter(|field| seen.insert(*field))
        .collect()
}

/// Work items for a copy job: targets x distinct fields, 0 if either is empty.
pub fn calculate_work_items(target_count: usize, fields: &[ContentField]) -> i64 {
    let unique_fields = dedupe_fields(fields);
    if target_count == 0 || unique_fields.is_empty() {
        return 0;
    }
    target_count as i64 * unique_fields.len() as i64
}

/// Clamp a merchant-supplied image count: non-finite or <= 0 becomes 0,
/// everything else floors and caps at [`MAX_IMAGES_PER_PRODUCT`].
pub fn clamp_image_target_count(value: f64) -> i64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    (value.floor() as i64).min(MAX_IMAGES_PER_PRODUCT)
}

/// Work items for an alt-text job.
///
/// Preference order: an explicit `total_image_targets` (capped at targets x
/// max images), then the per-product `image_counts` map (missing entries
/// count as 1), then one image per product.
pub fn calculate_alt_text_items(
    target_ids: &[String],
    total_image_targets: Option<f64>,
    image_counts: &BTreeMap<String, i64>,
) -> i64 {
    if target_ids.is_empty() {
        return 0;
    }

    if let Some(total) = total_image_targets {
        if total.is_finite() && total > 0.0 {
            let max_possible = target_ids.len() as i64 * MAX_IMAGES_PER_PRODUCT;
            return (total.floor() as i64).min(max_possible);
        }
    }

    if !image_counts.is_empty() {
        return target_ids
            .iter()
            .map(|id| match image_counts.get(id) {
                Some(count) => (*count).clamp(0, MAX_IMAGES_PER_PRODUCT),
                None => 1,
            })
            .sum();
    }

    target_ids.len() as i64
}

pub fn is_valid_product_id(value: &str) -> bool {
    value.starts_with(PRODUCT_ID_PREFIX) && value.len() > PRODUCT_ID_PREFIX.len()
}

pub fn is_valid_collection_id(value: &str) -> bool {
    value.starts_with(COLLECTION_ID_PREFIX) && value.len() > COLLECTION_ID_PREFIX.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(n: u32) -> String {
        format!("gid://storefront/Product/{}", n)
    }

    #[test]
    fn sanitize_trims_dedupes_and_drops_empties() {
        let ids = sanitize_id_list(&[" a ", "b", "a", "", "  ", "b "]);
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn work_items_is_targets_times_distinct_fields() {
        let fields = [
            ContentField::Title,
            ContentField::Description,
            ContentField::Title,
            ContentField::MetaTitle,
        ];
        assert_eq!(calculate_work_items(10, &fields), 30);
    }

    #[test]
    fn work_items_zero_when_no_targets_or_no_fields() {
        assert_eq!(calculate_work_items(0, &[ContentField::Title]), 0);
        assert_eq!(calculate_work_items(5, &[]), 0);
    }

    #[test]
    fn work_items_is_deterministic() {
        let fields = [ContentField::Title, ContentField::Description];
        assert_eq!(
            calculate_work_items(7, &fields),
            calculate_work_items(7, &fields)
        );
    }

    #[test]
    fn clamp_handles_degenerate_values() {
        assert_eq!(clamp_image_target_count(f64::NAN), 0);
        assert_eq!(clamp_image_target_count(f64::INFINITY), 0);
        assert_eq!(clamp_image_target_count(-3.0), 0);
        assert_eq!(clamp_image_target_count(0.0), 0);
        assert_eq!(clamp_image_target_count(2.9), 2);
        assert_eq!(clamp_image_target_count(500.0), MAX_IMAGES_PER_PRODUCT);
    }

    #[test]
    fn alt_text_items_prefers_explicit_total() {
        let ids = vec![pid(1), pid(2)];
        let counts = BTreeMap::new();
        assert_eq!(calculate_alt_text_items(&ids, Some(7.0), &counts), 7);
        // Capped at targets x max images
        assert_eq!(calculate_alt_text_items(&ids, Some(1e6), &counts), 100);
        // Non-positive totals fall through to the default
        assert_eq!(calculate_alt_text_items(&ids, Some(0.0), &counts), 2);
    }

    #[test]
    fn alt_text_items_sums_per_product_counts_defaulting_to_one() {
        let ids = vec![pid(1), pid(2), pid(3), pid(4)];
        let counts: BTreeMap<String, i64> =
            [(pid(1), 2), (pid(2), 1), (pid(3), 3), (pid(4), 1)].into();
        assert_eq!(calculate_alt_text_items(&ids, None, &counts), 7);

        let partial: BTreeMap<String, i64> = [(pid(1), 5)].into();
        assert_eq!(calculate_alt_text_items(&ids, None, &partial), 8);
    }

    #[test]
    fn alt_text_items_defaults_to_one_per_product() {
        let ids = vec![pid(1), pid(2), pid(3)];
        assert_eq!(calculate_alt_text_items(&ids, None, &BTreeMap::new()), 3);
        assert_eq!(calculate_alt_text_items(&[], None, &BTreeMap::new()), 0);
    }

    #[test]
    fn gid_shape_validation() {
        assert!(is_valid_product_id("gid://storefront/Product/42"));
        assert!(!is_valid_product_id("gid://storefront/Product/"));
        assert!(!is_valid_product_id("gid://storefront/Collection/42"));
        assert!(is_valid_collection_id("gid://storefront/Collection/7"));
        assert!(!is_valid_collection_id("42"));
    }

    #[test]
    fn field_parse_round_trips() {
        for field in [
            ContentField::Title,
            ContentField::Description,
            ContentField::MetaTitle,
            ContentField::MetaDescription,
            ContentField::AltText,
        ] {
            assert_eq!(ContentField::parse(field.as_str()), Some(field));
        }
        assert_eq!(ContentField::parse("handle"), None);
    }
}
