use serde::Deserialize;
use std::path::Path;

use super::ConfigError;
use crate::core::realtime::TurnDetection;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present
/// here override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3001
///
/// realtime:
///   endpoint: "https://my-resource.services.ai.azure.com/api/projects/my-project"
///   api_key: "your-api-key"
///   model: "gpt-realtime"
///   api_version: "2025-10-01"
///
/// session:
///   voice: "en-US-AvaNeural"
///   instructions: "You are a helpful car assistant."
///   turn_detection:
///     type: server_vad
///     threshold: 0.6
///   transcription_model: "whisper-1"
///   disabled_tools: ["get_weather"]
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub realtime: Option<RealtimeYaml>,
    pub session: Option<SessionYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Realtime service connection from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RealtimeYaml {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub api_version: Option<String>,
    /// Empty string disables the WebSocket sub-protocol
    pub subprotocol: Option<String>,
}

/// Session overrides from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SessionYaml {
    pub voice: Option<String>,
    pub instructions: Option<String>,
    pub modalities: Option<Vec<String>>,
    pub turn_detection: Option<TurnDetection>,
    pub transcription_model: Option<String>,
    pub tool_choice: Option<String>,
    /// Catalog tools left out of the session
    pub disabled_tools: Option<Vec<String>>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or the YAML is malformed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&contents)
    }

    /// Parse configuration from YAML text
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(contents)?)
    }
}
