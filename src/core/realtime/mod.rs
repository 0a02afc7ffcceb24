//! Realtime voice module.
//!
//! Client side of the Azure Voice Live / Azure OpenAI Realtime WebSocket API.
//!
//! # Architecture
//!
//! - `url` builds the connection URL from an endpoint, key and model
//! - `client` owns the socket and publishes typed events to subscribers
//! - `messages` holds the wire types, `config` the session configuration
//!
//! # Audio Format
//!
//! PCM 16-bit signed little-endian at 24kHz, base64 encoded on the wire.
//!
//! # Example
//!
//! ```rust,ignore
//! use voicelive_assistant::core::realtime::{RealtimeClient, RealtimeConfig, ServerEvent};
//!
//! let mut client = RealtimeClient::new(config);
//! client.on_message(|msg| {
//!     if let ServerEvent::AudioTranscriptDone { transcript, .. } = msg.event() {
//!         println!("assistant: {transcript}");
//!     }
//! });
//! client.connect().await?;
//! ```

mod base;
pub mod client;
pub mod config;
pub mod messages;
pub mod url;

pub use base::{
    ConnectionState, EventCallback, EventKind, InboundMessage, REALTIME_SUBPROTOCOL,
    RealtimeConfig, RealtimeError, RealtimeEvent, RealtimeResult,
};
pub use client::{RealtimeClient, RealtimeSender};
pub use config::{
    AudioFormat, DEFAULT_INSTRUCTIONS, DEFAULT_MODEL, DEFAULT_VOICE, InputAudioTranscription,
    OPENAI_VOICES, SessionConfig, TurnDetection, VoiceKind, VoiceSpec,
};
pub use messages::{
    ApiError, ClientEvent, ContentPart, ConversationItem, Response, ServerEvent, SessionPayload,
    TokenDetails, ToolDefinition, Usage,
};
pub use url::{EndpointKind, EndpointParams, build_realtime_url, redact_api_key};
