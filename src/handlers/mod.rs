//! HTTP request handlers
//!
//! - `api` - Health check endpoint
//! - `payments` - Mock premium payment API used by the payment assistant

pub mod api;
pub mod payments;

pub use payments::{
    PaymentLookupQuery, PaymentLookupResponse, PaymentRequest, PaymentResponse, PaymentsResponse,
};
