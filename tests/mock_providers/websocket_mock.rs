//! WebSocket mock of the Voice Live realtime endpoint

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::{HeaderValue, header::SEC_WEBSOCKET_PROTOCOL};

use super::wait_until;

/// Replies sent for each client frame, in order.
pub type Responder = Arc<dyn Fn(&Value) -> Vec<Value> + Send + Sync>;

enum ServerCommand {
    Send(String),
    Close,
}

#[derive(Default)]
struct MockState {
    received: Mutex<Vec<Value>>,
    request_uri: Mutex<Option<String>>,
    subprotocol: Mutex<Option<String>>,
    connections: AtomicU64,
    closed_connections: AtomicU64,
    commands: Mutex<Option<mpsc::UnboundedSender<ServerCommand>>>,
}

/// Mock realtime server listening on an ephemeral local port.
pub struct MockRealtimeServer {
    addr: SocketAddr,
    state: Arc<MockState>,
    accept_task: JoinHandle<()>,
}

impl MockRealtimeServer {
    /// Start a server that answers with [`default_responder`].
    pub async fn start() -> Self {
        Self::with_responder(default_responder).await
    }

    /// Start a server with scripted replies.
    pub async fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&Value) -> Vec<Value> + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(MockState::default());
        let responder: Responder = Arc::new(responder);

        let accept_state = state.clone();
        let accept_task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let state = accept_state.clone();
                let responder = responder.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, state.clone(), responder).await {
                        eprintln!("Mock connection error: {}", e);
                    }
                    state.closed_connections.fetch_add(1, Ordering::SeqCst);
                });
            }
        });

        Self {
            addr,
            state,
            accept_task,
        }
    }

    /// Endpoint for the client configuration; used as given by the URL builder.
    pub fn endpoint(&self) -> String {
        format!("ws://{}/realtime", self.addr)
    }

    pub fn received(&self) -> Vec<Value> {
        self.state.received.lock().clone()
    }

    pub fn received_types(&self) -> Vec<String> {
        self.state
            .received
            .lock()
            .iter()
            .map(|frame| frame["type"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    /// Path and query of the last handshake.
    pub fn request_uri(&self) -> Option<String> {
        self.state.request_uri.lock().clone()
    }

    /// Sub-protocol requested in the last handshake.
    pub fn subprotocol(&self) -> Option<String> {
        self.state.subprotocol.lock().clone()
    }

    pub fn connection_count(&self) -> u64 {
        self.state.connections.load(Ordering::SeqCst)
    }

    pub fn closed_connection_count(&self) -> u64 {
        self.state.closed_connections.load(Ordering::SeqCst)
    }

    /// Push a JSON frame on the current connection.
    pub fn push(&self, frame: Value) -> bool {
        self.command(ServerCommand::Send(frame.to_string()))
    }

    /// Push a raw text frame on the current connection.
    pub fn push_text(&self, text: &str) -> bool {
        self.command(ServerCommand::Send(text.to_string()))
    }

    /// Close the current connection from the server side.
    pub fn close(&self) -> bool {
        self.command(ServerCommand::Close)
    }

    fn command(&self, command: ServerCommand) -> bool {
        match self.state.commands.lock().as_ref() {
            Some(tx) => tx.send(command).is_ok(),
            None => false,
        }
    }

    /// Wait until at least `count` frames were received.
    pub async fn wait_for_frames(&self, count: usize, timeout: Duration) -> Vec<Value> {
        wait_until(timeout, || self.state.received.lock().len() >= count).await;
        self.received()
    }

    /// Wait for the first received frame of the given type.
    pub async fn wait_for_type(&self, event_type: &str, timeout: Duration) -> Option<Value> {
        let found = || {
            self.state
                .received
                .lock()
                .iter()
                .find(|frame| frame["type"] == event_type)
                .cloned()
        };
        wait_until(timeout, || found().is_some()).await;
        found()
    }
}

impl Drop for MockRealtimeServer {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

/// Replies like the service does for a plain conversation:
/// - `session.update` -> `session.updated`
/// - `conversation.item.create` -> `conversation.item.created`
/// - `response.create` -> a spoken answer with usage
pub fn default_responder(frame: &Value) -> Vec<Value> {
    match frame["type"].as_str() {
        Some("session.update") => vec![json!({
            "type": "session.updated",
            "session": frame["session"].clone(),
        })],
        Some("conversation.item.create") => vec![json!({
            "type": "conversation.item.created",
            "item": frame["item"].clone(),
        })],
        Some("response.create") => spoken_response("resp_1", "Okay."),
        _ => Vec::new(),
    }
}

/// Frames of a completed audio response.
pub fn spoken_response(response_id: &str, transcript: &str) -> Vec<Value> {
    vec![
        json!({"type": "response.created", "response": {"id": response_id, "status": "in_progress"}}),
        json!({"type": "response.audio.delta", "response_id": response_id, "delta": "AAAAAA=="}),
        json!({"type": "response.audio.done", "response_id": response_id}),
        json!({"type": "response.audio_transcript.done", "response_id": response_id, "transcript": transcript}),
        json!({
            "type": "response.done",
            "response": {
                "id": response_id,
                "status": "completed",
                "usage": {
                    "total_tokens": 150,
                    "input_tokens": 100,
                    "output_tokens": 50,
                    "input_token_details": {"cached_tokens": 20, "text_tokens": 60, "audio_tokens": 40},
                    "output_token_details": {"text_tokens": 10, "audio_tokens": 40}
                }
            }
        }),
    ]
}

async fn handle_connection(
    stream: TcpStream,
    state: Arc<MockState>,
    responder: Responder,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let handshake_state = state.clone();
    let callback = move |request: &Request, mut response: Response| {
        *handshake_state.request_uri.lock() = Some(request.uri().to_string());

        if let Some(requested) = request.headers().get(SEC_WEBSOCKET_PROTOCOL) {
            let protocol = requested
                .to_str()
                .unwrap_or_default()
                .split(',')
                .next()
                .unwrap_or_default()
                .trim()
                .to_string();
            if let Ok(value) = HeaderValue::from_str(&protocol) {
                response.headers_mut().insert(SEC_WEBSOCKET_PROTOCOL, value);
            }
            *handshake_state.subprotocol.lock() = Some(protocol);
        }
        Ok::<_, ErrorResponse>(response)
    };

    let ws_stream = accept_hdr_async(stream, callback).await?;
    let (mut write, mut read) = ws_stream.split();

    let (tx, mut rx) = mpsc::unbounded_channel();
    *state.commands.lock() = Some(tx);
    state.connections.fetch_add(1, Ordering::SeqCst);

    let created = json!({
        "type": "session.created",
        "session": {"id": "sess_mock", "model": "gpt-realtime"}
    });
    write.send(Message::Text(created.to_string().into())).await?;

    loop {
        tokio::select! {
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    let frame: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
                    state.received.lock().push(frame.clone());
                    for reply in responder(&frame) {
                        write.send(Message::Text(reply.to_string().into())).await?;
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    write.send(Message::Pong(data)).await?;
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    eprintln!("Mock WebSocket error: {}", e);
                    break;
                }
            },
            command = rx.recv() => match command {
                Some(ServerCommand::Send(text)) => {
                    write.send(Message::Text(text.into())).await?;
                }
                Some(ServerCommand::Close) | None => {
                    let _ = write.send(Message::Close(None)).await;
                    // Drain until the client acknowledges the close
                    let _ = tokio::time::timeout(Duration::from_secs(1), async {
                        while let Some(Ok(_)) = read.next().await {}
                    })
                    .await;
                    break;
                }
            },
        }
    }

    Ok(())
}
