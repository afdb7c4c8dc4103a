pub mod billing;
pub mod health;
pub mod jobs;

use axum::http::HeaderMap;

use crate::server::error::ApiError;

/// The shop identity placed on every request by the (external) session layer.
pub(crate) fn require_shop_domain(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get("x-shop-domain")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::Unauthorized("Missing shop context.".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn shop_domain_comes_from_the_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-shop-domain", HeaderValue::from_static("demo.mystore.example"));
        assert_eq!(
            require_shop_domain(&headers).unwrap(),
            "demo.mystore.example"
        );
    }

    #[test]
    fn missing_or_blank_header_is_unauthorized() {
        assert!(require_shop_domain(&HeaderMap::new()).is_err());

        let mut headers = HeaderMap::new();
        headers.insert("x-shop-domain", HeaderValue::from_static("   "));
        assert!(require_shop_domain(&headers).is_err());
    }
}
