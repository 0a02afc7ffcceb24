//! Connection URL builder.
//!
//! Turns a user-supplied endpoint (Azure OpenAI resource, Voice Live
//! resource, AI Foundry project URL or a raw `ws(s)://` URL) into the
//! WebSocket URL the realtime client connects to.

use once_cell::sync::Lazy;
use regex::Regex;
use url::form_urlencoded;

use super::base::RealtimeConfig;
use super::config::{OPENAI_REALTIME_API_VERSION, VOICE_LIVE_API_VERSION};

/// Matches the resource name of an AI Foundry project URL.
static PROJECT_HOST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://([^.]+)\.services\.ai\.azure\.com").expect("static regex is valid")
});

const PROJECT_MARKER: &str = "services.ai.azure.com/api/projects/";
const OPENAI_REALTIME_PATH: &str = "/openai/realtime";
const VOICE_LIVE_PATH: &str = "/voice-live/realtime";

/// Inputs of [`build_realtime_url`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EndpointParams<'a> {
    pub endpoint: &'a str,
    pub api_key: &'a str,
    pub model: &'a str,
    pub api_version: Option<&'a str>,
}

impl<'a> From<&'a RealtimeConfig> for EndpointParams<'a> {
    fn from(config: &'a RealtimeConfig) -> Self {
        Self {
            endpoint: &config.endpoint,
            api_key: &config.api_key,
            model: &config.model,
            api_version: config.api_version.as_deref(),
        }
    }
}

/// Endpoint family, decided by host name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// `*.openai.azure.com`
    OpenAiRealtime,
    /// `*.services.ai.azure.com` or `*.cognitiveservices.azure.com`
    VoiceLive,
    /// Anything else, used as given
    Custom,
}

impl EndpointKind {
    pub fn detect(url: &str) -> Self {
        if url.contains("openai.azure.com") {
            Self::OpenAiRealtime
        } else if url.contains("services.ai.azure.com")
            || url.contains("cognitiveservices.azure.com")
        {
            Self::VoiceLive
        } else {
            Self::Custom
        }
    }
}

/// Build the WebSocket URL for a realtime connection.
///
/// Steps, in order:
/// 1. AI Foundry project URLs are mapped to `https://<resource>.cognitiveservices.azure.com`
/// 2. `http(s)://` becomes `ws(s)://`, a missing scheme becomes `wss://`
/// 3. One trailing `/` is removed
/// 4. The endpoint family decides the path and the `api-version` /
///    `deployment` / `model` query parameters; parameters already present
///    are kept
/// 5. `api-key` is appended when a key is given and the URL has none
///
/// An empty endpoint produces a URL that fails at connect time.
pub fn build_realtime_url(params: &EndpointParams<'_>) -> String {
    let mut url = params.endpoint.trim().to_string();

    if url.contains(PROJECT_MARKER) {
        if let Some(caps) = PROJECT_HOST.captures(&url) {
            url = format!("https://{}.cognitiveservices.azure.com", &caps[1]);
        }
    }

    if let Some(rest) = url.strip_prefix("http://") {
        url = format!("ws://{rest}");
    } else if let Some(rest) = url.strip_prefix("https://") {
        url = format!("wss://{rest}");
    } else if !url.starts_with("wss://") && !url.starts_with("ws://") {
        url = format!("wss://{url}");
    }

    if url.ends_with('/') {
        url.pop();
    }

    let (path, version_default, model_key) = match EndpointKind::detect(&url) {
        EndpointKind::OpenAiRealtime => {
            (OPENAI_REALTIME_PATH, OPENAI_REALTIME_API_VERSION, "deployment")
        }
        EndpointKind::VoiceLive => (VOICE_LIVE_PATH, VOICE_LIVE_API_VERSION, "model"),
        EndpointKind::Custom => return append_api_key(url, params.api_key),
    };

    if !url.contains(path) {
        url = insert_path(&url, path);
    }

    let mut query = form_urlencoded::Serializer::new(String::new());
    let mut added = false;
    if !has_query_param(&url, "api-version") {
        query.append_pair("api-version", params.api_version.unwrap_or(version_default));
        added = true;
    }
    if !params.model.is_empty() && !has_query_param(&url, model_key) {
        query.append_pair(model_key, params.model);
        added = true;
    }
    if added {
        url = append_query(url, &query.finish());
    }

    append_api_key(url, params.api_key)
}

/// Mask the `api-key` query value for logging.
pub fn redact_api_key(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };

    let redacted: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some(("api-key", _)) => "api-key=***".to_string(),
            _ => pair.to_string(),
        })
        .collect();

    format!("{}?{}", base, redacted.join("&"))
}

fn append_api_key(url: String, api_key: &str) -> String {
    if api_key.is_empty() || has_query_param(&url, "api-key") {
        return url;
    }
    let encoded = form_urlencoded::Serializer::new(String::new())
        .append_pair("api-key", api_key)
        .finish();
    append_query(url, &encoded)
}

fn append_query(url: String, encoded: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{encoded}")
}

/// Insert `path` before the query string, if any.
fn insert_path(url: &str, path: &str) -> String {
    match url.split_once('?') {
        Some((base, query)) => {
            format!("{}{}?{}", base.trim_end_matches('/'), path, query)
        }
        None => format!("{url}{path}"),
    }
}

fn has_query_param(url: &str, key: &str) -> bool {
    url.split_once('?')
        .map(|(_, query)| {
            form_urlencoded::parse(query.as_bytes()).any(|(name, _)| name == key)
        })
        .unwrap_or(false)
}
