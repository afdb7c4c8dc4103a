//! Error types for the storefront admin client.

use thiserror::Error;

use crate::types::UserError;

/// Result type for storefront client operations.
pub type Result<T> = std::result::Result<T, StorefrontError>;

/// Storefront admin API errors.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Configuration error (missing access token, bad shop domain)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx HTTP response from the admin API
    #[error("Admin API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Top-level GraphQL errors in an otherwise successful response
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// Mutation-level user errors returned by the platform
    #[error("User errors: {}", format_user_errors(.0))]
    UserErrors(Vec<UserError>),

    /// Parse error (invalid JSON, unexpected response shape)
    #[error("Parse error: {0}")]
    Parse(String),
}

fn format_user_errors(errors: &[UserError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
