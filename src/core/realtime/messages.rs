//! Realtime API WebSocket message types.
//!
//! Every frame is one JSON object with a `type` field.
//!
//! # Protocol Overview
//!
//! Client events (sent to server):
//! - session.update - Update session configuration
//! - input_audio_buffer.append - Append a base64 PCM16 chunk
//! - conversation.item.create - Add a user message or a tool result
//! - response.create - Ask the model to respond
//!
//! Server events (received from server):
//! - session.created / session.updated
//! - input_audio_buffer.speech_started / speech_stopped / committed
//! - conversation.item.created
//! - conversation.item.input_audio_transcription.completed
//! - response.created / response.done
//! - response.output_item.added
//! - response.text.delta / done
//! - response.audio_transcript.delta / done
//! - response.audio.delta / done
//! - response.function_call_arguments.done
//! - error
//!
//! Inbound fields are all defaulted: the service adds and drops fields
//! between API versions and a missing field should not hide the event.

use base64::prelude::*;
use serde::{Deserialize, Serialize};

use super::config::{InputAudioTranscription, TurnDetection, VoiceSpec};

// =============================================================================
// Session Payload
// =============================================================================

/// The `session` object of a `session.update` frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<VoiceSpec>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_audio_format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_detection: Option<TurnDetection>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_echo_cancellation: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_noise_reduction: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<InputAudioTranscription>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,

    /// Additional keys sent verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SessionPayload {
    /// Partial update that only replaces the tool list.
    pub fn tools_only(tools: Vec<ToolDefinition>) -> Self {
        Self {
            tools: Some(tools),
            tool_choice: Some("auto".to_string()),
            ..Default::default()
        }
    }
}

/// Tool definition advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool type (always "function")
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function name
    pub name: String,
    /// Function description
    pub description: String,
    /// JSON schema of the arguments
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            tool_type: "function".to_string(),
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

// =============================================================================
// Conversation Items
// =============================================================================

/// Conversation item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Item type (message, function_call, function_call_output)
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<ContentPart>>,
    /// Call ID for function call and function call output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    /// Function name for function call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
    /// JSON-encoded tool result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl ConversationItem {
    /// A `function_call_output` item carrying a serialized tool result.
    pub fn function_call_output(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            item_type: "function_call_output".to_string(),
            call_id: Some(call_id.into()),
            output: Some(output.into()),
            ..Default::default()
        }
    }

    /// A user text message.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            item_type: "message".to_string(),
            role: Some("user".to_string()),
            content: Some(vec![ContentPart {
                content_type: "input_text".to_string(),
                text: Some(text.into()),
                ..Default::default()
            }]),
            ..Default::default()
        }
    }
}

/// Content part within a conversation item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentPart {
    /// Content type (input_text, input_audio, text, audio)
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
}

// =============================================================================
// Client Events (sent to server)
// =============================================================================

/// Client events sent to the realtime service.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Full or partial session configuration
    #[serde(rename = "session.update")]
    SessionUpdate { session: SessionPayload },

    /// Append audio to the input buffer
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioBufferAppend {
        /// Base64-encoded PCM16 audio
        audio: String,
    },

    /// Create a conversation item
    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate { item: ConversationItem },

    /// Create a response
    #[serde(rename = "response.create")]
    ResponseCreate,
}

impl ClientEvent {
    /// Create an audio append event from PCM16 samples (little-endian on the wire).
    pub fn audio_append(samples: &[i16]) -> Self {
        let mut bytes = Vec::with_capacity(samples.len() * 2);
        for sample in samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        ClientEvent::InputAudioBufferAppend {
            audio: BASE64_STANDARD.encode(bytes),
        }
    }

    /// Wire name of the event.
    pub fn event_type(&self) -> &'static str {
        match self {
            ClientEvent::SessionUpdate { .. } => "session.update",
            ClientEvent::InputAudioBufferAppend { .. } => "input_audio_buffer.append",
            ClientEvent::ConversationItemCreate { .. } => "conversation.item.create",
            ClientEvent::ResponseCreate => "response.create",
        }
    }
}

// =============================================================================
// Server Events (received from server)
// =============================================================================

/// Server events consumed by this crate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        error: ApiError,
    },

    #[serde(rename = "session.created")]
    SessionCreated {
        #[serde(default)]
        session: serde_json::Value,
    },

    #[serde(rename = "session.updated")]
    SessionUpdated {
        #[serde(default)]
        session: serde_json::Value,
    },

    /// Speech started (VAD detected speech)
    #[serde(rename = "input_audio_buffer.speech_started")]
    SpeechStarted {
        #[serde(default)]
        audio_start_ms: u64,
        #[serde(default)]
        item_id: String,
    },

    /// Speech stopped (VAD detected silence)
    #[serde(rename = "input_audio_buffer.speech_stopped")]
    SpeechStopped {
        #[serde(default)]
        audio_end_ms: u64,
        #[serde(default)]
        item_id: String,
    },

    #[serde(rename = "input_audio_buffer.committed")]
    InputAudioBufferCommitted {
        #[serde(default)]
        item_id: String,
    },

    #[serde(rename = "conversation.item.created")]
    ConversationItemCreated {
        #[serde(default)]
        item: ConversationItem,
    },

    /// User speech transcript
    #[serde(rename = "conversation.item.input_audio_transcription.completed")]
    TranscriptionCompleted {
        #[serde(default)]
        item_id: String,
        #[serde(default)]
        transcript: String,
    },

    #[serde(rename = "response.created")]
    ResponseCreated {
        #[serde(default)]
        response: Response,
    },

    #[serde(rename = "response.output_item.added")]
    OutputItemAdded {
        #[serde(default)]
        response_id: String,
        #[serde(default)]
        item: ConversationItem,
    },

    #[serde(rename = "response.text.delta")]
    TextDelta {
        #[serde(default)]
        response_id: String,
        #[serde(default)]
        delta: String,
    },

    #[serde(rename = "response.text.done")]
    TextDone {
        #[serde(default)]
        response_id: String,
        #[serde(default)]
        text: String,
    },

    #[serde(rename = "response.audio_transcript.delta")]
    AudioTranscriptDelta {
        #[serde(default)]
        response_id: String,
        #[serde(default)]
        delta: String,
    },

    #[serde(rename = "response.audio_transcript.done")]
    AudioTranscriptDone {
        #[serde(default)]
        response_id: String,
        #[serde(default)]
        transcript: String,
    },

    /// Base64-encoded PCM16 audio chunk
    #[serde(rename = "response.audio.delta")]
    AudioDelta {
        #[serde(default)]
        response_id: String,
        #[serde(default)]
        delta: String,
    },

    #[serde(rename = "response.audio.done")]
    AudioDone {
        #[serde(default)]
        response_id: String,
    },

    /// Tool call arguments complete
    #[serde(rename = "response.function_call_arguments.done")]
    FunctionCallArgumentsDone {
        #[serde(default)]
        call_id: String,
        /// Present on newer API versions; older ones only announce it on the item
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        item_id: String,
        /// JSON-encoded arguments
        #[serde(default)]
        arguments: String,
    },

    #[serde(rename = "response.done")]
    ResponseDone {
        #[serde(default)]
        response: Response,
    },

    /// Any event type not listed above
    #[serde(other)]
    Other,
}

/// API error details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiError {
    #[serde(rename = "type")]
    pub error_type: String,
    pub code: Option<String>,
    pub message: String,
    pub param: Option<String>,
    pub event_id: Option<String>,
}

/// Response information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Response {
    pub id: String,
    pub status: Option<String>,
    /// Usage counters, present on `response.done`
    pub usage: Option<Usage>,
}

/// Token usage of one response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Usage {
    pub total_tokens: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub input_token_details: TokenDetails,
    pub output_token_details: TokenDetails,
}

/// Token details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenDetails {
    pub cached_tokens: u64,
    pub text_tokens: u64,
    pub audio_tokens: u64,
    /// Cached audio tokens (Voice Live only)
    pub cached_audio_tokens: u64,
}

// =============================================================================
// Tests
// =============================================================================
