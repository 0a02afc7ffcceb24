//! Conversation metrics.
//!
//! Token counters come from the `usage` block of `response.done`; latency is
//! measured from the end of user speech to the first audio chunk of the
//! answer.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use super::realtime::Usage;

/// Cost calculator the metrics can be exported to.
pub const CALCULATOR_URL: &str = "https://novaaidesigner.github.io/azure-voice-live-calculator/";

/// Daily active users assumed by the calculator export.
const CALCULATOR_DAU: &str = "1000";

/// Input audio tokens per second.
const INPUT_AUDIO_TOKENS_PER_SEC: f64 = 10.0;

/// Output audio tokens per second.
const OUTPUT_AUDIO_TOKENS_PER_SEC: f64 = 20.0;

/// Accumulated token counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCounters {
    /// Total input tokens as reported by the service
    pub input_text: u64,
    pub input_audio: u64,
    pub output_text: u64,
    pub output_audio: u64,
    pub cached_text: u64,
    pub cached_audio: u64,
}

/// Latency summary in milliseconds. All zero when no sample was recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub min: u64,
    pub avg: u64,
    pub max: u64,
    pub p90: u64,
}

/// Point-in-time view of [`Metrics`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub tokens: TokenCounters,
    pub latency: LatencyStats,
    pub turns: u64,
    pub text_cache_rate: f64,
    pub audio_cache_rate: f64,
    pub input_audio_seconds: f64,
    pub output_audio_seconds: f64,
}

/// Metrics accumulator. Lives for the whole session until reset.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    tokens: TokenCounters,
    latencies: Vec<u64>,
    turns: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the usage of one completed response and count a turn.
    pub fn record_usage(&mut self, usage: &Usage) {
        let tokens = &mut self.tokens;
        tokens.input_text += usage.input_tokens;
        tokens.input_audio += usage.input_token_details.audio_tokens;
        tokens.output_text += usage.output_token_details.text_tokens;
        tokens.output_audio += usage.output_token_details.audio_tokens;
        tokens.cached_text += usage.input_token_details.cached_tokens;
        tokens.cached_audio += usage.input_token_details.cached_audio_tokens;
        self.turns += 1;
    }

    /// Record one speech-stopped to first-audio latency.
    pub fn record_latency(&mut self, latency_ms: u64) {
        self.latencies.push(latency_ms);
    }

    pub fn tokens(&self) -> &TokenCounters {
        &self.tokens
    }

    pub fn turns(&self) -> u64 {
        self.turns
    }

    pub fn latencies(&self) -> &[u64] {
        &self.latencies
    }

    pub fn latency_stats(&self) -> LatencyStats {
        if self.latencies.is_empty() {
            return LatencyStats::default();
        }

        let mut sorted = self.latencies.clone();
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let p90_index = ((count as f64 * 0.9).ceil() as usize).saturating_sub(1);

        LatencyStats {
            min: sorted[0],
            avg: (sum as f64 / count as f64).round() as u64,
            max: sorted[count - 1],
            p90: sorted[p90_index.min(count - 1)],
        }
    }

    /// Cached share of text input, in percent.
    pub fn text_cache_rate(&self) -> f64 {
        percent(self.tokens.cached_text, self.tokens.input_text)
    }

    /// Cached share of audio input, in percent.
    pub fn audio_cache_rate(&self) -> f64 {
        percent(self.tokens.cached_audio, self.tokens.input_audio)
    }

    pub fn input_audio_seconds(&self) -> f64 {
        self.tokens.input_audio as f64 / INPUT_AUDIO_TOKENS_PER_SEC
    }

    pub fn output_audio_seconds(&self) -> f64 {
        self.tokens.output_audio as f64 / OUTPUT_AUDIO_TOKENS_PER_SEC
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            tokens: self.tokens,
            latency: self.latency_stats(),
            turns: self.turns,
            text_cache_rate: self.text_cache_rate(),
            audio_cache_rate: self.audio_cache_rate(),
            input_audio_seconds: self.input_audio_seconds(),
            output_audio_seconds: self.output_audio_seconds(),
        }
    }

    /// Link to the cost calculator prefilled with per-turn averages.
    pub fn calculator_url(&self, model: &str) -> String {
        let turns = self.turns.max(1);
        let per_turn = turns as f64;

        let avg_input_text = (self.tokens.input_text as f64 / per_turn).round() as u64;
        let avg_input_audio = self.input_audio_seconds() / per_turn;
        let avg_output_audio = self.output_audio_seconds() / per_turn;

        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("dau", CALCULATOR_DAU)
            .append_pair("turns", &turns.to_string())
            .append_pair("inputAudio", &format!("{:.2}", avg_input_audio))
            .append_pair("outputAudio", &format!("{:.2}", avg_output_audio))
            .append_pair("inputText", &avg_input_text.to_string())
            .append_pair("model", model)
            .append_pair("avatar", "none")
            .append_pair("textCache", &format!("{:.1}", self.text_cache_rate()))
            .append_pair("audioCache", &format!("{:.1}", self.audio_cache_rate()))
            .append_pair("tts", "openai-realtime")
            .finish();

        format!("{}?{}", CALCULATOR_URL, query)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
