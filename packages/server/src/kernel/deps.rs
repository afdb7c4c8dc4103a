//! Server dependencies (using traits for testability)
//!
//! This module provides the central dependency container used by the routes
//! and the job worker. All external services use trait abstractions so tests
//! can swap in the in-memory implementations from `test_dependencies`.

use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use super::traits::{ContentGenerator, StorefrontGateway};

/// Server dependencies accessible to routes and the job worker
#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    /// Commerce platform admin surface
    pub storefront: Arc<dyn StorefrontGateway>,
    /// Language-model content generation
    pub generation: Arc<dyn ContentGenerator>,
    /// Balance newly created shop credit accounts start with
    pub initial_shop_credits: i64,
    /// Bound applied to every external call made while processing a job
    pub external_call_timeout: Duration,
}

impl ServerDeps {
    /// Create new ServerDeps with the given dependencies
    pub fn new(
        db_pool: PgPool,
        storefront: Arc<dyn StorefrontGateway>,
        generation: Arc<dyn ContentGenerator>,
        initial_shop_credits: i64,
        external_call_timeout: Duration,
    ) -> Self {
        Self {
            db_pool,
            storefront,
            generation,
            initial_shop_credits,
            external_call_timeout,
        }
    }
}
