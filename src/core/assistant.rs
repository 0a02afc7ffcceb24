//! Headless car assistant session.
//!
//! [`AssistantSession`] owns the vehicle snapshot, the metrics and the
//! transcript, and reacts to realtime events: it logs the conversation,
//! measures response latency, runs tool calls through the dispatcher and
//! reports their results back to the model.
//!
//! State outlives connections; only [`AssistantSession::reset`] clears it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde::Serialize;
use time::OffsetDateTime;
use time::macros::format_description;

use super::metrics::{Metrics, MetricsSnapshot};
use super::realtime::{InboundMessage, RealtimeClient, RealtimeSender, ServerEvent};
use super::tools::{self, ToolOutcome};
use super::vehicle::VehicleStatus;

/// Category of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    User,
    Assistant,
    Tool,
    Error,
}

/// One line of the session transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    /// Local wall-clock time, `HH:MM:SS`
    pub time: String,
    pub kind: LogKind,
    pub message: String,
}

#[derive(Debug, Default)]
struct AssistantState {
    vehicle: VehicleStatus,
    metrics: Metrics,
    transcript: Vec<LogEntry>,
    /// call_id -> function name, for argument events that omit the name
    pending_calls: HashMap<String, String>,
    speech_stopped_at: Option<Instant>,
    first_audio_seen: bool,
    connected: bool,
}

impl AssistantState {
    fn log(&mut self, kind: LogKind, message: impl Into<String>) {
        let message = message.into();
        match kind {
            LogKind::Error => tracing::warn!("{}", message),
            _ => tracing::info!("{}", message),
        }
        self.transcript.push(LogEntry {
            time: local_time(),
            kind,
            message,
        });
    }
}

/// Car assistant session state and event handling.
#[derive(Clone, Default)]
pub struct AssistantSession {
    state: Arc<Mutex<AssistantState>>,
}

impl AssistantSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a given vehicle snapshot.
    pub fn with_vehicle(vehicle: VehicleStatus) -> Self {
        let session = Self::default();
        session.state.lock().vehicle = vehicle;
        session
    }

    /// Subscribe to a client's events.
    ///
    /// Call once per client, before connecting.
    pub fn attach(&self, client: &RealtimeClient) {
        let state = self.state.clone();
        client.on_open(move || {
            let mut state = state.lock();
            state.connected = true;
            state.log(LogKind::Info, "Connected to Azure Voice Live");
        });

        let state = self.state.clone();
        client.on_error(move |message| {
            let mut state = state.lock();
            state.connected = false;
            state.log(LogKind::Error, format!("Error: {}", message));
        });

        let state = self.state.clone();
        client.on_close(move || {
            let mut state = state.lock();
            state.connected = false;
            state.speech_stopped_at = None;
            state.log(LogKind::Info, "Connection closed");
        });

        let session = self.clone();
        let sender = client.sender();
        client.on_message(move |message| session.handle_message(message, &sender));
    }

    /// React to one inbound frame.
    pub fn handle_message(&self, message: &InboundMessage, sender: &RealtimeSender) {
        match message.event() {
            ServerEvent::SessionCreated { .. } | ServerEvent::SessionUpdated { .. } => {
                self.log(LogKind::Info, "Session ready");
            }

            ServerEvent::SpeechStarted { .. } => {
                self.log(LogKind::Info, "Speech started");
            }

            ServerEvent::SpeechStopped { .. } => {
                let mut state = self.state.lock();
                state.speech_stopped_at = Some(Instant::now());
                state.first_audio_seen = false;
                state.log(LogKind::Info, "Speech stopped");
            }

            ServerEvent::InputAudioBufferCommitted { .. } => {
                self.log(LogKind::Info, "Audio committed");
            }

            ServerEvent::TranscriptionCompleted { transcript, .. } => {
                self.log(LogKind::User, format!("You: {}", transcript.trim()));
            }

            ServerEvent::ResponseCreated { .. } => {
                self.log(LogKind::Info, "Assistant responding...");
            }

            ServerEvent::TextDone { text, .. } => {
                self.log(LogKind::Assistant, format!("Assistant: {}", text));
            }

            ServerEvent::AudioTranscriptDone { transcript, .. } => {
                if !transcript.is_empty() {
                    self.log(LogKind::Assistant, format!("Assistant: {}", transcript));
                }
            }

            ServerEvent::AudioDelta { delta, .. } => {
                if !delta.is_empty() {
                    self.record_first_audio();
                }
            }

            ServerEvent::AudioDone { .. } => {
                self.log(LogKind::Info, "Audio playback complete");
            }

            ServerEvent::ConversationItemCreated { item }
            | ServerEvent::OutputItemAdded { item, .. } => {
                if item.item_type == "function_call" {
                    let mut state = self.state.lock();
                    if let (Some(call_id), Some(name)) = (&item.call_id, &item.name) {
                        if !state.pending_calls.contains_key(call_id) {
                            state.log(LogKind::Tool, format!("Function call: {}", name));
                        }
                        state.pending_calls.insert(call_id.clone(), name.clone());
                    }
                }
            }

            ServerEvent::FunctionCallArgumentsDone {
                call_id,
                name,
                arguments,
                ..
            } => {
                let outcome = self.run_tool_call(&call_id, name, &arguments);
                if !sender.send_tool_output(&call_id, &outcome) {
                    tracing::warn!("Tool result for {} was not sent", call_id);
                }
            }

            ServerEvent::ResponseDone { response } => {
                let mut state = self.state.lock();
                if let Some(usage) = &response.usage {
                    state.metrics.record_usage(usage);
                }
                state.log(LogKind::Info, "Response complete");
            }

            ServerEvent::Error { error } => {
                let message = if error.message.is_empty() {
                    "Unknown error"
                } else {
                    error.message.as_str()
                };
                self.log(LogKind::Error, format!("Error: {}", message));
            }

            ServerEvent::TextDelta { .. }
            | ServerEvent::AudioTranscriptDelta { .. }
            | ServerEvent::Other => {}
        }
    }

    /// Log a typed user message and send it.
    pub fn send_user_text(&self, sender: &RealtimeSender, text: &str) -> bool {
        let sent = sender.send_text(text);
        if sent {
            self.log(LogKind::User, format!("You: {}", text));
        } else {
            self.log(LogKind::Error, "Not connected; message dropped");
        }
        sent
    }

    /// Dispatch a tool call against the current snapshot and keep the result.
    fn run_tool_call(&self, call_id: &str, name: Option<String>, arguments: &str) -> ToolOutcome {
        let mut state = self.state.lock();

        let pending = state.pending_calls.remove(call_id);
        let Some(name) = name.or(pending) else {
            state.log(
                LogKind::Error,
                format!("Tool call {} has no function name", call_id),
            );
            return ToolOutcome::fail("Unknown tool");
        };

        state.log(LogKind::Tool, format!("Executing: {}({})", name, arguments));

        let args = if arguments.trim().is_empty() {
            serde_json::Value::Object(Default::default())
        } else {
            match serde_json::from_str(arguments) {
                Ok(args) => args,
                Err(e) => {
                    let outcome = ToolOutcome::fail(format!("Invalid arguments: {}", e));
                    state.log(LogKind::Error, format!("Result: {}", outcome.message));
                    return outcome;
                }
            }
        };

        let (vehicle, outcome) = tools::execute(&name, &args, &state.vehicle);
        state.vehicle = vehicle;

        let rendered = serde_json::to_string(&outcome).unwrap_or_else(|_| outcome.message.clone());
        state.log(LogKind::Tool, format!("Result: {}", rendered));
        outcome
    }

    fn record_first_audio(&self) {
        let mut state = self.state.lock();
        if state.first_audio_seen {
            return;
        }
        if let Some(stopped_at) = state.speech_stopped_at {
            let latency_ms = stopped_at.elapsed().as_millis() as u64;
            state.first_audio_seen = true;
            state.metrics.record_latency(latency_ms);
            tracing::debug!("Voice-to-voice latency: {} ms", latency_ms);
        }
    }

    fn log(&self, kind: LogKind, message: impl Into<String>) {
        self.state.lock().log(kind, message);
    }

    // -------------------------------------------------------------------------
    // State access
    // -------------------------------------------------------------------------

    pub fn vehicle(&self) -> VehicleStatus {
        self.state.lock().vehicle.clone()
    }

    pub fn metrics(&self) -> Metrics {
        self.state.lock().metrics.clone()
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.state.lock().metrics.snapshot()
    }

    pub fn transcript(&self) -> Vec<LogEntry> {
        self.state.lock().transcript.clone()
    }

    /// Whether the attached client reported an open connection last.
    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    /// Advance the drive-cycle simulation.
    pub fn tick(&self, elapsed_secs: u64) -> VehicleStatus {
        let mut state = self.state.lock();
        state.vehicle = state.vehicle.tick(elapsed_secs);
        if elapsed_secs % 10 == 0 {
            tracing::debug!(
                "Drive cycle: {} km/h, battery {:.2}%, range {} km",
                state.vehicle.speed,
                state.vehicle.battery,
                state.vehicle.battery_range
            );
        }
        state.vehicle.clone()
    }

    /// Clear the transcript and the metrics. The vehicle keeps its state.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.transcript.clear();
        state.metrics.reset();
        state.pending_calls.clear();
        state.speech_stopped_at = None;
        state.first_audio_seen = false;
        state.log(LogKind::Info, "Reset complete");
    }

    pub fn reset_vehicle(&self) {
        self.state.lock().vehicle = VehicleStatus::default();
    }
}

fn local_time() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_default()
}
