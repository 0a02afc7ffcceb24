//! Base types for the realtime event client.
//!
//! This module defines the error type, the connection state machine, the
//! typed event enum delivered to subscribers, and the connection
//! configuration shared by the URL builder and the client.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use super::config::SessionConfig;
use super::messages::{ApiError, ServerEvent};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during realtime operations.
#[derive(Debug, Clone, Error)]
pub enum RealtimeError {
    /// Opening the WebSocket failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Invalid configuration (e.g. a URL that cannot be turned into a request)
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Session error
    #[error("Session error: {0}")]
    SessionError(String),
}

/// Result type for realtime operations.
pub type RealtimeResult<T> = Result<T, RealtimeError>;

// =============================================================================
// Configuration Types
// =============================================================================

/// Default WebSocket sub-protocol requested during the handshake.
pub const REALTIME_SUBPROTOCOL: &str = "realtime";

/// Connection configuration for the realtime client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// Service endpoint (Azure OpenAI, Voice Live, AI Foundry project URL or a raw ws URL)
    pub endpoint: String,

    /// API key, sent as the `api-key` query parameter
    pub api_key: String,

    /// Model or deployment name
    pub model: String,

    /// API version override; each endpoint family has its own default
    pub api_version: Option<String>,

    /// WebSocket sub-protocol to request, `None` to request none
    pub subprotocol: Option<String>,

    /// Session configuration sent as the first frame after open
    pub session: SessionConfig,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            model: super::config::DEFAULT_MODEL.to_string(),
            api_version: None,
            subprotocol: Some(REALTIME_SUBPROTOCOL.to_string()),
            session: SessionConfig::default(),
        }
    }
}

// =============================================================================
// Connection State
// =============================================================================

/// Connection state of a realtime client.
///
/// `Idle → Connecting → Open → Closed`. A closed client may connect again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Never connected
    #[default]
    Idle,
    /// Handshake in progress
    Connecting,
    /// Socket open, frames may be sent
    Open,
    /// Socket closed, locally or remotely
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Idle => write!(f, "Idle"),
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Open => write!(f, "Open"),
            ConnectionState::Closed => write!(f, "Closed"),
        }
    }
}

// =============================================================================
// Events
// =============================================================================

/// A parsed inbound frame.
///
/// The raw JSON is always available; `event()` gives the typed view for the
/// event types this crate understands.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    raw: serde_json::Value,
}

impl InboundMessage {
    /// Wrap an already-parsed JSON value.
    pub fn new(raw: serde_json::Value) -> Self {
        Self { raw }
    }

    /// Parse a text frame. Returns `None` for anything that is not JSON.
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok().map(Self::new)
    }

    /// The `type` field of the frame, if any.
    pub fn event_type(&self) -> Option<&str> {
        self.raw.get("type").and_then(|t| t.as_str())
    }

    /// The raw JSON payload.
    pub fn raw(&self) -> &serde_json::Value {
        &self.raw
    }

    /// Typed view of the frame.
    ///
    /// Frames whose shape does not match a known event map to
    /// [`ServerEvent::Other`], except `error` frames, which always decode to
    /// [`ServerEvent::Error`].
    pub fn event(&self) -> ServerEvent {
        match serde_json::from_value(self.raw.clone()) {
            Ok(event) => event,
            Err(_) if self.event_type() == Some("error") => {
                let details = self.raw.get("error");
                let message = details
                    .and_then(|e| e.get("message").or(Some(e)))
                    .and_then(|m| m.as_str())
                    .unwrap_or_default();
                ServerEvent::Error {
                    error: ApiError {
                        message: message.to_string(),
                        ..Default::default()
                    },
                }
            }
            Err(_) => ServerEvent::Other,
        }
    }
}

/// Event delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
    /// Socket opened and the session configuration was queued
    Open,
    /// Inbound JSON frame
    Message(InboundMessage),
    /// Socket-level error with an opaque message
    Error(String),
    /// Socket closed
    Close,
}

impl RealtimeEvent {
    /// The subscription key of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            RealtimeEvent::Open => EventKind::Open,
            RealtimeEvent::Message(_) => EventKind::Message,
            RealtimeEvent::Error(_) => EventKind::Error,
            RealtimeEvent::Close => EventKind::Close,
        }
    }
}

/// Subscription key for [`RealtimeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Open,
    Message,
    Error,
    Close,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Open => write!(f, "open"),
            EventKind::Message => write!(f, "message"),
            EventKind::Error => write!(f, "error"),
            EventKind::Close => write!(f, "close"),
        }
    }
}

/// Callback invoked for every event of the kind it was registered for.
///
/// Callbacks run synchronously on the connection task, in registration order.
pub type EventCallback = Arc<dyn Fn(&RealtimeEvent) + Send + Sync>;
