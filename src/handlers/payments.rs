//! Mock premium payment API.
//!
//! `POST /api/payment` records a payment after normalizing the phone number,
//! `GET /api/payments` lists recorded payments, newest first, and
//! `GET /api/payments/lookup?phone_number=` finds the payments made with one
//! phone number.

use std::sync::Arc;

use axum::{
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::state::{AppState, NewPayment, PaymentRecord};
use crate::utils::normalize_phone_number;

/// Error returned for phone numbers with fewer than ten digits
pub const INVALID_PHONE_ERROR: &str = "Invalid phone number format";

/// Payment submission body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentRequest {
    pub policy_number: String,
    pub phone_number: String,
    pub amount_due: f64,
    pub payment_date: String,
}

/// Payment submission result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PaymentResponse {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            customer_id: None,
            error: Some(error.into()),
        }
    }
}

/// Recorded payments, newest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsResponse {
    pub payments: Vec<PaymentRecord>,
}

/// Query of a payment lookup
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaymentLookupQuery {
    pub phone_number: String,
}

/// Payments found for one phone number
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentLookupResponse {
    pub found: bool,
    pub payment_details: Vec<PaymentRecord>,
    pub message: String,
}

/// Record a premium payment
pub async fn submit_payment(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PaymentRequest>, JsonRejection>,
) -> Result<Json<PaymentResponse>, (StatusCode, Json<PaymentResponse>)> {
    let Json(request) = body.map_err(|rejection| {
        tracing::warn!("Rejected payment body: {}", rejection.body_text());
        (
            StatusCode::BAD_REQUEST,
            Json(PaymentResponse::failure(rejection.body_text())),
        )
    })?;

    let Some(phone_number) = normalize_phone_number(&request.phone_number) else {
        tracing::warn!("Invalid phone number in payment request");
        return Err((
            StatusCode::BAD_REQUEST,
            Json(PaymentResponse::failure(INVALID_PHONE_ERROR)),
        ));
    };

    let record = state.payments.record(NewPayment {
        policy_number: request.policy_number,
        phone_number,
        amount_due: request.amount_due,
        payment_date: request.payment_date,
    });

    tracing::info!(
        "Recorded payment {} for policy {:?} ({:.2})",
        record.id,
        record.policy_number,
        record.amount_due
    );

    Ok(Json(PaymentResponse {
        success: true,
        message: Some("Payment recorded successfully".to_string()),
        customer_id: Some(record.customer_id),
        error: None,
    }))
}

/// List recorded payments
pub async fn list_payments(State(state): State<Arc<AppState>>) -> Json<PaymentsResponse> {
    Json(PaymentsResponse {
        payments: state.payments.list(),
    })
}

/// Look up the payments made with a phone number, newest first
pub async fn lookup_payments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PaymentLookupQuery>,
) -> Result<Json<PaymentLookupResponse>, (StatusCode, Json<PaymentLookupResponse>)> {
    let Some(phone_number) = normalize_phone_number(&query.phone_number) else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(PaymentLookupResponse {
                found: false,
                payment_details: Vec::new(),
                message: format!("{}: {}", INVALID_PHONE_ERROR, query.phone_number),
            }),
        ));
    };

    let payment_details = state.payments.find_by_phone(&phone_number);
    let message = if payment_details.is_empty() {
        format!("No payment records found for phone number {}", phone_number)
    } else {
        format!(
            "Found {} payment record(s) for phone number {}",
            payment_details.len(),
            phone_number
        )
    };

    Ok(Json(PaymentLookupResponse {
        found: !payment_details.is_empty(),
        payment_details,
        message,
    }))
}
