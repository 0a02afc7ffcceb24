use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::payments;
use crate::state::AppState;
use std::sync::Arc;

/// Create the payment API router
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/payment", post(payments::submit_payment))
        .route("/api/payments", get(payments::list_payments))
        .route("/api/payments/lookup", get(payments::lookup_payments))
        .layer(TraceLayer::new_for_http())
}
