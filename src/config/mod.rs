//! Configuration module for the car assistant
//!
//! This module handles configuration from .env files, environment variables
//! and YAML files. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `store`: persistence of the endpoint and API key between runs
//!
//! # Example
//! ```rust,no_run
//! use voicelive_assistant::config::AssistantConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = AssistantConfig::from_env()?;
//!
//! // Load from YAML file with environment variable base
//! let config_path = PathBuf::from("config.yaml");
//! let config = AssistantConfig::from_file(&config_path)?;
//!
//! println!("Payment API listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::realtime::{
    DEFAULT_MODEL, InputAudioTranscription, REALTIME_SUBPROTOCOL, RealtimeConfig, SessionConfig,
};

mod store;
mod yaml;

pub use store::{ConfigStore, MemoryStore, StoredSettings, YamlFileStore};
pub use yaml::YamlConfig;

/// Default bind host of the payment API.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default port of the payment API.
pub const DEFAULT_PORT: u16 = 3001;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Missing required configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Payment API listener settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Realtime service connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealtimeSettings {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    /// `None` uses the default version of the endpoint family
    pub api_version: Option<String>,
    pub subprotocol: Option<String>,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            api_version: None,
            subprotocol: Some(REALTIME_SUBPROTOCOL.to_string()),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default)]
pub struct AssistantConfig {
    pub server: ServerSettings,
    pub realtime: RealtimeSettings,
    pub session: SessionConfig,
}

impl AssistantConfig {
    /// Load configuration from environment variables
    ///
    /// The .env file is loaded in `main` before this runs, so actual
    /// environment variables take precedence over .env values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from a variable lookup function
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if `PORT` is not a valid port number.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut config = Self::default();

        if let Some(host) = get("HOST") {
            config.server.host = host;
        }
        if let Some(port) = get("PORT") {
            config.server.port = port.trim().parse().map_err(|e| ConfigError::Invalid {
                key: "PORT",
                message: format!("{port:?}: {e}"),
            })?;
        }

        if let Some(endpoint) = get("VOICE_LIVE_ENDPOINT") {
            config.realtime.endpoint = endpoint;
        }
        if let Some(api_key) = get("VOICE_LIVE_API_KEY") {
            config.realtime.api_key = api_key;
        }
        if let Some(model) = get("VOICE_LIVE_MODEL") {
            config.realtime.model = model;
        }
        config.realtime.api_version = get("VOICE_LIVE_API_VERSION");

        if let Some(voice) = get("VOICE_LIVE_VOICE") {
            config.session.voice = Some(voice);
        }
        if let Some(instructions) = get("VOICE_LIVE_INSTRUCTIONS") {
            config.session.instructions = Some(instructions);
        }

        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let yaml_config = YamlConfig::from_file(path)?;

        let mut config = Self::from_env()?;
        config.apply_yaml(yaml_config);

        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply YAML overrides on top of the current values
    pub fn apply_yaml(&mut self, yaml: YamlConfig) {
        if let Some(server) = yaml.server {
            if let Some(host) = server.host {
                self.server.host = host;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(realtime) = yaml.realtime {
            if let Some(endpoint) = realtime.endpoint {
                self.realtime.endpoint = endpoint;
            }
            if let Some(api_key) = realtime.api_key {
                self.realtime.api_key = api_key;
            }
            if let Some(model) = realtime.model {
                self.realtime.model = model;
            }
            if realtime.api_version.is_some() {
                self.realtime.api_version = realtime.api_version;
            }
            if let Some(subprotocol) = realtime.subprotocol {
                self.realtime.subprotocol = (!subprotocol.is_empty()).then_some(subprotocol);
            }
        }

        if let Some(session) = yaml.session {
            if session.voice.is_some() {
                self.session.voice = session.voice;
            }
            if session.instructions.is_some() {
                self.session.instructions = session.instructions;
            }
            if let Some(modalities) = session.modalities {
                self.session.modalities = modalities;
            }
            if session.turn_detection.is_some() {
                self.session.turn_detection = session.turn_detection;
            }
            if let Some(model) = session.transcription_model {
                self.session.input_audio_transcription = Some(InputAudioTranscription { model });
            }
            if session.tool_choice.is_some() {
                self.session.tool_choice = session.tool_choice;
            }
            if let Some(disabled) = session.disabled_tools {
                for name in &disabled {
                    if !self.session.tools.iter().any(|tool| &tool.name == name) {
                        tracing::warn!("Cannot disable unknown tool {:?}", name);
                    }
                }
                self.session
                    .tools
                    .retain(|tool| !disabled.contains(&tool.name));
            }
        }
    }

    /// Replace the endpoint and key with persisted values
    pub fn apply_stored(&mut self, settings: StoredSettings) {
        if !settings.endpoint.is_empty() {
            self.realtime.endpoint = settings.endpoint;
        }
        if !settings.api_key.is_empty() {
            self.realtime.api_key = settings.api_key;
        }
    }

    /// The endpoint and key as persisted settings
    pub fn stored_settings(&self) -> StoredSettings {
        StoredSettings {
            endpoint: self.realtime.endpoint.clone(),
            api_key: self.realtime.api_key.clone(),
        }
    }

    /// Check that the endpoint and key needed to connect are present
    pub fn require_credentials(&self) -> Result<(), ConfigError> {
        if self.realtime.endpoint.trim().is_empty() {
            return Err(ConfigError::Missing("VOICE_LIVE_ENDPOINT"));
        }
        if self.realtime.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("VOICE_LIVE_API_KEY"));
        }
        Ok(())
    }

    /// Connection configuration for the realtime client
    pub fn realtime_config(&self) -> RealtimeConfig {
        RealtimeConfig {
            endpoint: self.realtime.endpoint.clone(),
            api_key: self.realtime.api_key.clone(),
            model: self.realtime.model.clone(),
            api_version: self.realtime.api_version.clone(),
            subprotocol: self.realtime.subprotocol.clone(),
            session: self.session.clone(),
        }
    }

    /// Get the payment API address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
