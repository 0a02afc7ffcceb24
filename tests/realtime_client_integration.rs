//! Integration tests for the realtime event client
//!
//! These tests run the client against a local mock of the Voice Live
//! endpoint and verify:
//! - The handshake (URL, sub-protocol) and the initial `session.update`
//! - Event ordering seen by subscribers
//! - Outbound frames for text, audio and tool results
//! - Local and remote close handling

mod mock_providers;

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use parking_lot::Mutex;
use serde_json::json;

use mock_providers::{MockRealtimeServer, wait_until};
use voicelive_assistant::core::realtime::{
    ConnectionState, RealtimeClient, RealtimeConfig, RealtimeError, ServerEvent, ToolDefinition,
};

const TIMEOUT: Duration = Duration::from_secs(5);

fn config_for(server: &MockRealtimeServer) -> RealtimeConfig {
    RealtimeConfig {
        endpoint: server.endpoint(),
        api_key: "test-key".to_string(),
        ..Default::default()
    }
}

/// Subscribe to every event kind and record them as strings.
fn record_events(client: &RealtimeClient) -> Arc<Mutex<Vec<String>>> {
    let events = Arc::new(Mutex::new(Vec::new()));

    let log = events.clone();
    client.on_open(move || log.lock().push("open".to_string()));

    let log = events.clone();
    client.on_message(move |msg| {
        let event_type = msg.event_type().unwrap_or("?").to_string();
        log.lock().push(format!("message:{}", event_type));
    });

    let log = events.clone();
    client.on_error(move |error| log.lock().push(format!("error:{}", error)));

    let log = events.clone();
    client.on_close(move || log.lock().push("close".to_string()));

    events
}

#[tokio::test]
async fn test_connect_sends_session_update_first() {
    let server = MockRealtimeServer::start().await;
    let mut client = RealtimeClient::new(config_for(&server));

    client.connect().await.unwrap();
    assert_eq!(client.state(), ConnectionState::Open);

    let frames = server.wait_for_frames(1, TIMEOUT).await;
    assert_eq!(frames[0]["type"], "session.update");

    let session = &frames[0]["session"];
    assert_eq!(session["voice"], json!({"name": "alloy", "type": "openai"}));
    assert_eq!(session["input_audio_format"], "pcm16");
    assert_eq!(session["output_audio_format"], "pcm16");
    assert_eq!(session["turn_detection"]["type"], "server_vad");
    assert_eq!(session["input_audio_transcription"]["model"], "whisper-1");
    assert_eq!(session["tools"].as_array().map(Vec::len), Some(14));

    assert_eq!(server.subprotocol().as_deref(), Some("realtime"));
    assert_eq!(
        server.request_uri().as_deref(),
        Some("/realtime?api-key=test-key")
    );

    client.disconnect().await;
}

#[tokio::test]
async fn test_azure_voice_is_sent_as_azure_standard() {
    let server = MockRealtimeServer::start().await;
    let mut config = config_for(&server);
    config.session.voice = Some("en-US-AvaNeural".to_string());
    let mut client = RealtimeClient::new(config);

    client.connect().await.unwrap();
    let frames = server.wait_for_frames(1, TIMEOUT).await;
    assert_eq!(
        frames[0]["session"]["voice"],
        json!({"name": "en-US-AvaNeural", "type": "azure-standard"})
    );

    client.disconnect().await;
}

#[tokio::test]
async fn test_no_subprotocol_requested_when_disabled() {
    let server = MockRealtimeServer::start().await;
    let mut config = config_for(&server);
    config.subprotocol = None;
    let mut client = RealtimeClient::new(config);

    client.connect().await.unwrap();
    server.wait_for_frames(1, TIMEOUT).await;
    assert_eq!(server.subprotocol(), None);

    client.disconnect().await;
}

#[tokio::test]
async fn test_open_precedes_messages() {
    let server = MockRealtimeServer::start().await;
    let mut client = RealtimeClient::new(config_for(&server));
    let events = record_events(&client);

    client.connect().await.unwrap();
    assert!(
        wait_until(TIMEOUT, || events
            .lock()
            .contains(&"message:session.updated".to_string()))
        .await
    );

    let events = events.lock().clone();
    assert_eq!(events[0], "open");
    assert_eq!(events[1], "message:session.created");

    client.disconnect().await;
}

#[tokio::test]
async fn test_send_text_round_trip() {
    let server = MockRealtimeServer::start().await;
    let mut client = RealtimeClient::new(config_for(&server));

    let transcripts = Arc::new(Mutex::new(Vec::new()));
    let sink = transcripts.clone();
    client.on_message(move |msg| {
        if let ServerEvent::AudioTranscriptDone { transcript, .. } = msg.event() {
            sink.lock().push(transcript);
        }
    });

    // Not connected yet: dropped
    assert!(!client.send_text("too early"));

    client.connect().await.unwrap();
    assert!(client.send_text("turn on the headlights"));

    let frames = server.wait_for_frames(3, TIMEOUT).await;
    let types: Vec<_> = frames.iter().map(|f| f["type"].as_str().unwrap()).collect();
    assert_eq!(
        types,
        vec!["session.update", "conversation.item.create", "response.create"]
    );
    assert_eq!(
        frames[1]["item"],
        json!({
            "type": "message",
            "role": "user",
            "content": [{"type": "input_text", "text": "turn on the headlights"}]
        })
    );

    assert!(wait_until(TIMEOUT, || !transcripts.lock().is_empty()).await);
    assert_eq!(transcripts.lock()[0], "Okay.");

    client.disconnect().await;
}

#[tokio::test]
async fn test_send_audio_encodes_pcm16() {
    let server = MockRealtimeServer::start().await;
    let mut client = RealtimeClient::new(config_for(&server));
    client.connect().await.unwrap();

    assert!(client.send_audio(&[0, 1, -1, i16::MAX]));

    let frame = server
        .wait_for_type("input_audio_buffer.append", TIMEOUT)
        .await
        .unwrap();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(frame["audio"].as_str().unwrap())
        .unwrap();
    assert_eq!(bytes, vec![0, 0, 1, 0, 0xFF, 0xFF, 0xFF, 0x7F]);

    client.disconnect().await;
}

#[tokio::test]
async fn test_tool_output_is_followed_by_response_create() {
    let server = MockRealtimeServer::with_responder(|_| Vec::new()).await;
    let mut client = RealtimeClient::new(config_for(&server));
    client.connect().await.unwrap();

    assert!(client.send_tool_output("call_1", &json!({"success": true, "message": "ok"})));

    let frames = server.wait_for_frames(3, TIMEOUT).await;
    assert_eq!(frames[1]["type"], "conversation.item.create");
    assert_eq!(frames[1]["item"]["type"], "function_call_output");
    assert_eq!(frames[1]["item"]["call_id"], "call_1");
    let output: serde_json::Value =
        serde_json::from_str(frames[1]["item"]["output"].as_str().unwrap()).unwrap();
    assert_eq!(output, json!({"success": true, "message": "ok"}));
    assert_eq!(frames[2]["type"], "response.create");

    client.disconnect().await;
}

#[tokio::test]
async fn test_set_tools_while_open() {
    let server = MockRealtimeServer::with_responder(|_| Vec::new()).await;
    let mut client = RealtimeClient::new(config_for(&server));
    client.connect().await.unwrap();

    let tool = ToolDefinition::function(
        "honk_horn",
        "Sound the horn",
        json!({"type": "object", "properties": {}}),
    );
    assert!(client.set_tools(vec![tool]));

    let frames = server.wait_for_frames(2, TIMEOUT).await;
    assert_eq!(frames[1]["type"], "session.update");
    let session = &frames[1]["session"];
    assert_eq!(session["tool_choice"], "auto");
    assert_eq!(session["tools"].as_array().map(Vec::len), Some(1));
    assert_eq!(session["tools"][0]["type"], "function");
    assert_eq!(session["tools"][0]["name"], "honk_horn");
    assert!(session.get("voice").is_none());

    client.disconnect().await;
}

#[tokio::test]
async fn test_malformed_frames_are_skipped() {
    let server = MockRealtimeServer::with_responder(|_| Vec::new()).await;
    let mut client = RealtimeClient::new(config_for(&server));
    let events = record_events(&client);

    client.connect().await.unwrap();
    server.wait_for_frames(1, TIMEOUT).await;

    assert!(server.push_text("not json"));
    assert!(server.push(json!({
        "type": "input_audio_buffer.speech_started",
        "audio_start_ms": 10
    })));

    assert!(
        wait_until(TIMEOUT, || events
            .lock()
            .contains(&"message:input_audio_buffer.speech_started".to_string()))
        .await
    );
    assert_eq!(
        events.lock().clone(),
        vec![
            "open",
            "message:session.created",
            "message:input_audio_buffer.speech_started"
        ]
    );
    assert!(client.is_open());

    client.disconnect().await;
}

#[tokio::test]
async fn test_local_disconnect_emits_close_once() {
    let server = MockRealtimeServer::start().await;
    let mut client = RealtimeClient::new(config_for(&server));
    let events = record_events(&client);

    client.connect().await.unwrap();
    server.wait_for_frames(1, TIMEOUT).await;

    client.disconnect().await;
    client.disconnect().await;

    assert_eq!(client.state(), ConnectionState::Closed);
    assert!(!client.send_text("after close"));
    assert_eq!(
        events.lock().iter().filter(|e| e.as_str() == "close").count(),
        1
    );
    assert!(wait_until(TIMEOUT, || server.closed_connection_count() == 1).await);
}

#[tokio::test]
async fn test_remote_close() {
    let server = MockRealtimeServer::with_responder(|_| Vec::new()).await;
    let mut client = RealtimeClient::new(config_for(&server));
    let events = record_events(&client);

    client.connect().await.unwrap();
    server.wait_for_frames(1, TIMEOUT).await;

    assert!(server.close());
    assert!(wait_until(TIMEOUT, || client.state() == ConnectionState::Closed).await);
    assert_eq!(events.lock().last().map(String::as_str), Some("close"));
    assert!(!client.send_text("after close"));

    client.disconnect().await;
    assert_eq!(
        events.lock().iter().filter(|e| e.as_str() == "close").count(),
        1
    );
}

#[tokio::test]
async fn test_reconnect_after_close() {
    let server = MockRealtimeServer::start().await;
    let mut client = RealtimeClient::new(config_for(&server));

    client.connect().await.unwrap();
    server.wait_for_frames(1, TIMEOUT).await;
    client.disconnect().await;

    client.connect().await.unwrap();
    assert!(client.is_open());
    assert!(wait_until(TIMEOUT, || server.connection_count() == 2).await);
    assert_eq!(
        server
            .received_types()
            .iter()
            .filter(|t| t.as_str() == "session.update")
            .count(),
        2
    );

    client.disconnect().await;
}

#[tokio::test]
async fn test_update_config_rejected_while_open() {
    let server = MockRealtimeServer::start().await;
    let mut client = RealtimeClient::new(config_for(&server));
    client.connect().await.unwrap();

    let result = client.update_config(config_for(&server));
    assert!(matches!(result, Err(RealtimeError::SessionError(_))));

    client.disconnect().await;
    assert!(client.update_config(config_for(&server)).is_ok());
}

#[tokio::test]
async fn test_connection_refused() {
    let mut client = RealtimeClient::new(RealtimeConfig {
        endpoint: "ws://127.0.0.1:9".to_string(),
        api_key: "k".to_string(),
        ..Default::default()
    });
    let events = record_events(&client);

    let result = client.connect().await;
    assert!(matches!(result, Err(RealtimeError::ConnectionFailed(_))));
    assert_eq!(client.state(), ConnectionState::Closed);

    let events = events.lock().clone();
    assert_eq!(events.len(), 2);
    assert!(events[0].starts_with("error:"));
    assert_eq!(events[1], "close");
}
