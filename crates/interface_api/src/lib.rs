//! HTTP API Layer
//!
//! This crate exposes the guest registry workflows over REST using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: one per workflow or query of `GuestService`
//! - **Middleware**: request ids, tracing, request logging
//! - **DTOs**: request/response bodies with field validation
//! - **Error Handling**: `GuestError` kinds mapped onto status codes
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, config::ApiConfig};
//!
//! let app = create_router(service, config);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use domain_guest::GuestService;

use crate::config::ApiConfig;
use crate::handlers::{document, guest, health};
use crate::middleware::request_logging;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<GuestService>,
    pub config: ApiConfig,
}

/// Creates the main API router
pub fn create_router(service: Arc<GuestService>, config: ApiConfig) -> Router {
    let state = AppState { service, config };

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let guest_routes = Router::new()
        .route("/", post(guest::register_primary).get(guest::list_guests))
        .route(
            "/:id",
            get(guest::get_guest)
                .patch(guest::update_profile)
                .delete(guest::remove_guest),
        )
        .route(
            "/:id/companions",
            post(guest::register_companion).get(guest::list_companions),
        )
        .route("/:id/address", put(guest::update_address))
        .route("/:id/primary", put(guest::reassign_primary))
        .route("/:id/documents", post(guest::attach_document))
        .route("/:id/contacts", post(guest::attach_contact));

    let document_routes = Router::new()
        .route("/:number/guest", get(document::find_guest_by_document))
        .route("/rules/:category", get(document::document_rule));

    let api_routes = Router::new()
        .nest("/guests", guest_routes)
        .nest("/documents", document_routes);

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(axum_middleware::from_fn(request_logging))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
