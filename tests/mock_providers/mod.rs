//! Mock realtime service for integration tests
//!
//! Simulates the Voice Live WebSocket endpoint:
//! - Sub-protocol negotiation and request URI capture
//! - Scripted replies to client frames
//! - Server-pushed frames and server-initiated close

// Each test binary uses a different subset of the helpers
#![allow(dead_code)]

pub mod websocket_mock;

pub use websocket_mock::{MockRealtimeServer, Responder, default_responder, spoken_response};

use std::time::Duration;

/// Poll `condition` every 10ms until it holds or `timeout` elapses.
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
