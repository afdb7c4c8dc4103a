//! Job processors - one per job kind.
//!
//! Shared discipline: every external call is wrapped in a bounded timeout,
//! and anything that goes wrong for a single target is logged and skipped.
//! Only conditions that doom the whole job (no generation credentials, no
//! admin session, unusable config) escape a processor.

pub mod alt_text;
pub mod collections;
pub mod products;

use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Deserialize;

/// Content returned by the generation API.
///
/// Every field is optional; processors apply only the requested, non-empty
/// ones.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneratedCopy {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description_html: Option<String>,
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub alt_text: Option<String>,
    // Some models reply camelCase despite the contract; accept it.
    #[serde(default, rename = "altText")]
    pub alt_text_camel: Option<String>,
}

impl GeneratedCopy {
    /// The alt text under either accepted key.
    pub fn any_alt_text(&self) -> Option<&str> {
        self.alt_text
            .as_deref()
            .or(self.alt_text_camel.as_deref())
    }
}

/// Run an external call under a bound; a timeout is an ordinary error the
/// per-target handling absorbs, so a hung upstream can no longer stall the
/// whole queue.
pub(crate) async fn bounded<T, F>(timeout: Duration, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(anyhow!("{} timed out after {:?}", what, timeout)),
    }
}

/// Trimmed non-empty string, or nothing.
pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
