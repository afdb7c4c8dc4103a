//! Application setup and router configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::kernel::ServerDeps;
use crate::server::routes::{
    billing::{finalize_purchase_handler, record_purchase_handler},
    health::health_handler,
    jobs::{create_job_handler, get_job_handler, list_jobs_handler},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
}

/// Build the axum application with all routes and layers.
pub fn build_app(deps: Arc<ServerDeps>) -> Router {
    let state = AppState { deps };

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/jobs", post(create_job_handler).get(list_jobs_handler))
        .route("/api/jobs/:job_id", get(get_job_handler))
        .route("/api/billing/purchases", post(record_purchase_handler))
        .route(
            "/api/billing/purchases/:charge_id/finalize",
            post(finalize_purchase_handler),
        )
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
