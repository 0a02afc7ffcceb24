//! Realtime event client.
//!
//! Holds one WebSocket connection to the realtime service, delivers inbound
//! frames to subscribers and sends control frames.
//!
//! # Example
//!
//! ```rust,ignore
//! use voicelive_assistant::core::realtime::{RealtimeClient, RealtimeConfig};
//!
//! let mut client = RealtimeClient::new(RealtimeConfig {
//!     endpoint: "https://my-resource.services.ai.azure.com/api/projects/demo".into(),
//!     api_key: "...".into(),
//!     ..Default::default()
//! });
//!
//! client.on_message(|msg| println!("{:?}", msg.event_type()));
//! client.connect().await?;
//! client.send_text("Turn on the headlights");
//! ```
//!
//! # Concurrency
//!
//! A single task owns the socket. Outbound frames are serialized by the
//! caller and pushed onto a bounded channel with `try_send`, so sending
//! never blocks and is safe from inside a callback. Callbacks run on the
//! connection task, synchronously and in registration order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderValue, header::SEC_WEBSOCKET_PROTOCOL};

use super::base::{
    ConnectionState, EventCallback, EventKind, InboundMessage, RealtimeConfig, RealtimeError,
    RealtimeEvent, RealtimeResult,
};
use super::messages::{ClientEvent, ConversationItem, SessionPayload, ToolDefinition};
use super::url::{EndpointParams, build_realtime_url, redact_api_key};

/// Channel capacity for outbound frames.
const WS_CHANNEL_CAPACITY: usize = 256;

/// How long `disconnect` waits for the connection task before aborting it.
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(2);

// =============================================================================
// Shared State
// =============================================================================

/// State shared between the client, its senders and the connection task.
#[derive(Default)]
struct ClientShared {
    state: RwLock<ConnectionState>,
    outbound: Mutex<Option<mpsc::Sender<String>>>,
    listeners: RwLock<HashMap<EventKind, Vec<EventCallback>>>,
}

impl ClientShared {
    fn emit(&self, event: &RealtimeEvent) {
        // Clone the list so callbacks may register further listeners
        let callbacks = self
            .listeners
            .read()
            .get(&event.kind())
            .cloned()
            .unwrap_or_default();

        for callback in callbacks {
            callback(event);
        }
    }

    fn queue(&self, json: String) -> bool {
        if *self.state.read() != ConnectionState::Open {
            tracing::warn!("Dropping outbound frame, connection is not open");
            return false;
        }

        let outbound = self.outbound.lock();
        let Some(tx) = outbound.as_ref() else {
            tracing::warn!("Dropping outbound frame, no active connection");
            return false;
        };

        match tx.try_send(json) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("Dropping outbound frame, send queue is full");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!("Dropping outbound frame, connection task has ended");
                false
            }
        }
    }

    /// Move a live connection to `Closed`, optionally reporting an error first.
    ///
    /// Emits `Close` only on the first transition.
    fn finish(&self, error: Option<String>) {
        self.outbound.lock().take();
        {
            let mut state = self.state.write();
            if !matches!(*state, ConnectionState::Connecting | ConnectionState::Open) {
                return;
            }
            *state = ConnectionState::Closed;
        }

        if let Some(message) = error {
            self.emit(&RealtimeEvent::Error(message));
        }
        self.emit(&RealtimeEvent::Close);
    }
}

// =============================================================================
// Sender Handle
// =============================================================================

/// Cloneable handle for sending frames on a client's connection.
///
/// Every send follows the same contract: the frame is queued only while the
/// connection is open, otherwise it is dropped with a warning. The return
/// value tells whether the frame was queued.
#[derive(Clone)]
pub struct RealtimeSender {
    shared: Arc<ClientShared>,
}

impl RealtimeSender {
    /// Serialize and queue a client event.
    pub fn send(&self, event: &ClientEvent) -> bool {
        tracing::trace!("Sending {}", event.event_type());
        self.send_json(event)
    }

    /// Serialize and queue an arbitrary JSON frame.
    pub fn send_json<T: Serialize + ?Sized>(&self, frame: &T) -> bool {
        match serde_json::to_string(frame) {
            Ok(json) => {
                tracing::debug!("Queueing outbound frame ({} bytes)", json.len());
                self.shared.queue(json)
            }
            Err(e) => {
                tracing::warn!("Failed to serialize outbound frame: {}", e);
                false
            }
        }
    }

    /// Replace the session's tools, letting the model choose when to call them.
    pub fn set_tools(&self, tools: Vec<ToolDefinition>) -> bool {
        self.send(&ClientEvent::SessionUpdate {
            session: SessionPayload::tools_only(tools),
        })
    }

    /// Report a tool result and ask the model to continue.
    ///
    /// `response.create` is sent even if the result frame was dropped.
    pub fn send_tool_output<T: Serialize + ?Sized>(&self, call_id: &str, output: &T) -> bool {
        let output = match serde_json::to_string(output) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to serialize tool output for {}: {}", call_id, e);
                return false;
            }
        };

        let item_sent = self.send(&ClientEvent::ConversationItemCreate {
            item: ConversationItem::function_call_output(call_id, output),
        });
        let response_sent = self.create_response();
        item_sent && response_sent
    }

    /// Append PCM16 samples to the input audio buffer.
    pub fn send_audio(&self, samples: &[i16]) -> bool {
        self.send(&ClientEvent::audio_append(samples))
    }

    /// Add a user text message and request a response.
    pub fn send_text(&self, text: &str) -> bool {
        let item_sent = self.send(&ClientEvent::ConversationItemCreate {
            item: ConversationItem::user_text(text),
        });
        let response_sent = self.create_response();
        item_sent && response_sent
    }

    pub fn create_response(&self) -> bool {
        self.send(&ClientEvent::ResponseCreate)
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state.read()
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }
}

// =============================================================================
// Realtime Client
// =============================================================================

/// Realtime event client.
///
/// `Idle → Connecting → Open → Closed`. There is no automatic reconnection;
/// a closed client may be connected again.
pub struct RealtimeClient {
    config: RealtimeConfig,
    shared: Arc<ClientShared>,
    connection_handle: Option<JoinHandle<()>>,
}

impl RealtimeClient {
    pub fn new(config: RealtimeConfig) -> Self {
        Self {
            config,
            shared: Arc::new(ClientShared::default()),
            connection_handle: None,
        }
    }

    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    /// Replace the configuration. Refused while a connection is open.
    pub fn update_config(&mut self, config: RealtimeConfig) -> RealtimeResult<()> {
        match self.state() {
            ConnectionState::Connecting | ConnectionState::Open => Err(
                RealtimeError::SessionError("cannot change configuration while connected".into()),
            ),
            _ => {
                self.config = config;
                Ok(())
            }
        }
    }

    /// The URL this client connects to.
    pub fn url(&self) -> String {
        build_realtime_url(&EndpointParams::from(&self.config))
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state.read()
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// A sender sharing this client's connection.
    pub fn sender(&self) -> RealtimeSender {
        RealtimeSender {
            shared: self.shared.clone(),
        }
    }

    // -------------------------------------------------------------------------
    // Subscriptions
    // -------------------------------------------------------------------------

    /// Register a callback for one event kind.
    ///
    /// Callbacks are never removed and the same callback may be added twice.
    pub fn on<F>(&self, kind: EventKind, callback: F)
    where
        F: Fn(&RealtimeEvent) + Send + Sync + 'static,
    {
        self.shared
            .listeners
            .write()
            .entry(kind)
            .or_default()
            .push(Arc::new(callback));
    }

    pub fn on_open<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on(EventKind::Open, move |_| callback());
    }

    pub fn on_message<F>(&self, callback: F)
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        self.on(EventKind::Message, move |event| {
            if let RealtimeEvent::Message(message) = event {
                callback(message);
            }
        });
    }

    pub fn on_error<F>(&self, callback: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on(EventKind::Error, move |event| {
            if let RealtimeEvent::Error(message) = event {
                callback(message);
            }
        });
    }

    pub fn on_close<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on(EventKind::Close, move |_| callback());
    }

    // -------------------------------------------------------------------------
    // Connection
    // -------------------------------------------------------------------------

    /// Open the connection and send the session configuration.
    ///
    /// Does nothing if already connecting or open. On failure `Error` and
    /// `Close` are emitted before the error is returned.
    pub async fn connect(&mut self) -> RealtimeResult<()> {
        {
            let mut state = self.shared.state.write();
            if matches!(*state, ConnectionState::Connecting | ConnectionState::Open) {
                return Ok(());
            }
            *state = ConnectionState::Connecting;
        }

        // A previous task may still be winding down
        if let Some(handle) = self.connection_handle.take() {
            handle.abort();
        }

        let url = self.url();
        tracing::info!("Connecting to realtime service: {}", redact_api_key(&url));

        let mut request = match url.as_str().into_client_request() {
            Ok(request) => request,
            Err(e) => {
                let message = format!("invalid realtime URL: {}", e);
                tracing::error!("{}", message);
                self.shared.finish(Some(message.clone()));
                return Err(RealtimeError::InvalidConfiguration(message));
            }
        };

        if let Some(protocol) = self.config.subprotocol.as_deref() {
            match HeaderValue::from_str(protocol) {
                Ok(value) => {
                    request.headers_mut().insert(SEC_WEBSOCKET_PROTOCOL, value);
                }
                Err(e) => {
                    let message = format!("invalid sub-protocol {:?}: {}", protocol, e);
                    self.shared.finish(Some(message.clone()));
                    return Err(RealtimeError::InvalidConfiguration(message));
                }
            }
        }

        let ws_stream = match tokio_tungstenite::connect_async(request).await {
            Ok((ws_stream, _response)) => ws_stream,
            Err(e) => {
                tracing::error!("Realtime connection failed: {}", e);
                self.shared.finish(Some(e.to_string()));
                return Err(RealtimeError::ConnectionFailed(e.to_string()));
            }
        };

        tracing::info!("Connected to realtime service");

        let (mut ws_sink, mut ws_stream) = ws_stream.split();
        let (tx, mut rx) = mpsc::channel::<String>(WS_CHANNEL_CAPACITY);
        *self.shared.outbound.lock() = Some(tx);
        *self.shared.state.write() = ConnectionState::Open;

        // The session configuration is the first frame on the wire
        let session = self.config.session.to_payload();
        self.sender().send(&ClientEvent::SessionUpdate { session });
        self.shared.emit(&RealtimeEvent::Open);

        let shared = self.shared.clone();
        let handle = tokio::spawn(async move {
            let mut error = None;

            loop {
                tokio::select! {
                    outbound = rx.recv() => match outbound {
                        Some(json) => {
                            if let Err(e) = ws_sink.send(Message::Text(json.into())).await {
                                tracing::error!("Failed to send WebSocket message: {}", e);
                                error = Some(e.to_string());
                                break;
                            }
                        }
                        None => {
                            // All senders dropped: local disconnect
                            if let Err(e) = ws_sink.close().await {
                                tracing::debug!("Error while closing WebSocket: {}", e);
                            }
                            break;
                        }
                    },

                    inbound = ws_stream.next() => match inbound {
                        Some(Ok(Message::Text(text))) => match InboundMessage::parse(&text) {
                            Some(message) => {
                                if let Some(event_type) = message.event_type() {
                                    if event_type != "response.audio.delta" {
                                        tracing::debug!("Received event: {}", event_type);
                                    }
                                }
                                shared.emit(&RealtimeEvent::Message(message));
                            }
                            None => {
                                tracing::warn!(
                                    "Dropping malformed inbound frame: {}",
                                    text.as_str()
                                );
                            }
                        },
                        Some(Ok(Message::Ping(data))) => {
                            if let Err(e) = ws_sink.send(Message::Pong(data)).await {
                                tracing::error!("Failed to send pong: {}", e);
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            tracing::info!("WebSocket closed by server: {:?}", frame);
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::error!("WebSocket error: {}", e);
                            error = Some(e.to_string());
                            break;
                        }
                        None => break,
                    },
                }
            }

            shared.finish(error);
            tracing::info!("Realtime connection task ended");
        });

        self.connection_handle = Some(handle);
        Ok(())
    }

    /// Close the connection. Safe to call at any time, any number of times.
    pub async fn disconnect(&mut self) {
        // Dropping the sender makes the task close the socket and exit
        self.shared.outbound.lock().take();

        if let Some(mut handle) = self.connection_handle.take() {
            if tokio::time::timeout(DISCONNECT_TIMEOUT, &mut handle)
                .await
                .is_err()
            {
                tracing::warn!("Realtime connection task did not stop in time, aborting");
                handle.abort();
            }
        }

        self.shared.finish(None);
        tracing::info!("Disconnected from realtime service");
    }

    // -------------------------------------------------------------------------
    // Sending
    // -------------------------------------------------------------------------

    pub fn send(&self, event: &ClientEvent) -> bool {
        self.sender().send(event)
    }

    pub fn set_tools(&self, tools: Vec<ToolDefinition>) -> bool {
        self.sender().set_tools(tools)
    }

    pub fn send_tool_output<T: Serialize + ?Sized>(&self, call_id: &str, output: &T) -> bool {
        self.sender().send_tool_output(call_id, output)
    }

    pub fn send_audio(&self, samples: &[i16]) -> bool {
        self.sender().send_audio(samples)
    }

    pub fn send_text(&self, text: &str) -> bool {
        self.sender().send_text(text)
    }

    pub fn create_response(&self) -> bool {
        self.sender().create_response()
    }
}

impl Drop for RealtimeClient {
    fn drop(&mut self) {
        self.shared.outbound.lock().take();
    }
}

// =============================================================================
// Tests
// =============================================================================
