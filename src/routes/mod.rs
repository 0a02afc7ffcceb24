pub mod api;

use std::sync::Arc;

use axum::{Router, http::Method, http::header::CONTENT_TYPE, routing::get};
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::api::health_check;
use crate::state::AppState;

/// Build the complete application: public health check plus the payment API.
/// Cross-origin requests are accepted from any origin.
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(false);

    Router::new()
        .route("/", get(health_check))
        .merge(api::create_api_router())
        .with_state(state)
        .layer(cors_layer)
}
