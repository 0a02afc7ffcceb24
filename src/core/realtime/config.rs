//! Session configuration types for the Voice Live / Azure OpenAI Realtime API.
//!
//! This module contains:
//! - Defaults for model, API versions and instructions
//! - Voice classification (built-in OpenAI voices vs. Azure voices)
//! - The user-facing session configuration and its wire form

use serde::{Deserialize, Serialize};

use super::messages::{SessionPayload, ToolDefinition};
use crate::core::tools::car_tools;

/// Default model for new sessions.
pub const DEFAULT_MODEL: &str = "gpt-realtime";

/// Default `api-version` for Azure OpenAI realtime endpoints.
pub const OPENAI_REALTIME_API_VERSION: &str = "2024-10-01-preview";

/// Default `api-version` for Voice Live endpoints.
pub const VOICE_LIVE_API_VERSION: &str = "2025-10-01";

/// Audio sample rate used by the `pcm16` format.
pub const PCM16_SAMPLE_RATE: u32 = 24000;

/// Default instructions for the car assistant.
pub const DEFAULT_INSTRUCTIONS: &str =
    "You are a helpful car assistant, use simple and short oral response.";

/// Default assistant voice.
pub const DEFAULT_VOICE: &str = "alloy";

/// Voices that the service treats as built-in OpenAI voices.
pub const OPENAI_VOICES: &[&str] = &["alloy", "echo", "fable", "nova", "shimmer"];

// =============================================================================
// Voices
// =============================================================================

/// Voice category as understood by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoiceKind {
    /// Built-in OpenAI voice
    #[serde(rename = "openai")]
    OpenAi,
    /// Any other voice name is passed through as an Azure standard voice
    #[serde(rename = "azure-standard")]
    AzureStandard,
}

impl VoiceKind {
    /// Classify a voice name against the built-in allow-list.
    pub fn classify(name: &str) -> Self {
        if OPENAI_VOICES.contains(&name) {
            Self::OpenAi
        } else {
            Self::AzureStandard
        }
    }

    /// Wire value of the `type` field.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::AzureStandard => "azure-standard",
        }
    }
}

impl std::fmt::Display for VoiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Voice object sent in `session.update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceSpec {
    /// Voice name, e.g. `alloy` or `en-US-AvaNeural`
    pub name: String,
    /// Voice category
    #[serde(rename = "type")]
    pub kind: VoiceKind,
}

impl VoiceSpec {
    /// Build the voice object for a voice name.
    pub fn from_name(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: VoiceKind::classify(name),
        }
    }
}

// =============================================================================
// Audio Formats
// =============================================================================

/// Audio formats accepted by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// PCM 16-bit signed little-endian, 24kHz mono
    #[default]
    Pcm16,
    /// G.711 u-law (8-bit)
    #[serde(rename = "g711_ulaw")]
    G711Ulaw,
    /// G.711 a-law (8-bit)
    #[serde(rename = "g711_alaw")]
    G711Alaw,
}

impl AudioFormat {
    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pcm16 => "pcm16",
            Self::G711Ulaw => "g711_ulaw",
            Self::G711Alaw => "g711_alaw",
        }
    }
}

// =============================================================================
// Session Configuration
// =============================================================================

/// Turn detection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TurnDetection {
    /// Server-side VAD
    #[serde(rename = "server_vad")]
    ServerVad {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        threshold: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prefix_padding_ms: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        silence_duration_ms: Option<u32>,
    },
    /// Azure semantic VAD
    #[serde(rename = "azure_semantic_vad")]
    AzureSemanticVad {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        threshold: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        silence_duration_ms: Option<u32>,
    },
    /// No automatic turn detection
    #[serde(rename = "none")]
    None {},
}

impl Default for TurnDetection {
    fn default() -> Self {
        TurnDetection::ServerVad {
            threshold: Some(0.5),
            prefix_padding_ms: Some(300),
            silence_duration_ms: Some(500),
        }
    }
}

/// Input audio transcription configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputAudioTranscription {
    /// Transcription model (e.g. "whisper-1")
    pub model: String,
}

/// Session configuration, built once before connecting.
///
/// Keys this type does not model are kept in `extra` and sent verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub modalities: Vec<String>,
    pub instructions: Option<String>,
    /// Voice name; classified into `{name, type}` when sent
    pub voice: Option<String>,
    pub input_audio_format: AudioFormat,
    pub output_audio_format: AudioFormat,
    pub turn_detection: Option<TurnDetection>,
    pub input_audio_echo_cancellation: Option<serde_json::Value>,
    pub input_audio_noise_reduction: Option<serde_json::Value>,
    pub input_audio_transcription: Option<InputAudioTranscription>,
    pub tools: Vec<ToolDefinition>,
    pub tool_choice: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            modalities: vec!["text".to_string(), "audio".to_string()],
            instructions: Some(DEFAULT_INSTRUCTIONS.to_string()),
            voice: Some(DEFAULT_VOICE.to_string()),
            input_audio_format: AudioFormat::Pcm16,
            output_audio_format: AudioFormat::Pcm16,
            turn_detection: Some(TurnDetection::default()),
            input_audio_echo_cancellation: Some(
                serde_json::json!({ "type": "server_echo_cancellation" }),
            ),
            input_audio_noise_reduction: Some(
                serde_json::json!({ "type": "azure_deep_noise_suppression" }),
            ),
            input_audio_transcription: Some(InputAudioTranscription {
                model: "whisper-1".to_string(),
            }),
            tools: car_tools(),
            tool_choice: None,
            extra: serde_json::Map::new(),
        }
    }
}

impl SessionConfig {
    /// Build the `session` object sent right after the socket opens.
    ///
    /// The voice is reshaped into `{name, type}` and both audio formats are
    /// forced to `pcm16`.
    pub fn to_payload(&self) -> SessionPayload {
        SessionPayload {
            modalities: Some(self.modalities.clone()),
            instructions: self.instructions.clone(),
            voice: self.voice.as_deref().map(VoiceSpec::from_name),
            input_audio_format: Some(AudioFormat::Pcm16.as_str().to_string()),
            output_audio_format: Some(AudioFormat::Pcm16.as_str().to_string()),
            turn_detection: self.turn_detection.clone(),
            input_audio_echo_cancellation: self.input_audio_echo_cancellation.clone(),
            input_audio_noise_reduction: self.input_audio_noise_reduction.clone(),
            input_audio_transcription: self.input_audio_transcription.clone(),
            tools: if self.tools.is_empty() {
                None
            } else {
                Some(self.tools.clone())
            },
            tool_choice: self.tool_choice.clone(),
            extra: self.extra.clone(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
