//! End-to-end tests for the assistant session
//!
//! A mock realtime service drives the session through tool calls, spoken
//! answers and connection loss.

mod mock_providers;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::{Value, json};

use mock_providers::{MockRealtimeServer, spoken_response, wait_until};
use voicelive_assistant::core::realtime::{RealtimeClient, RealtimeConfig};
use voicelive_assistant::core::vehicle::{LightState, VehicleStatus};
use voicelive_assistant::core::{AssistantSession, LogKind};

const TIMEOUT: Duration = Duration::from_secs(5);

fn config_for(server: &MockRealtimeServer) -> RealtimeConfig {
    RealtimeConfig {
        endpoint: server.endpoint(),
        api_key: "test-key".to_string(),
        ..Default::default()
    }
}

/// Answers the first `response.create` with a tool call, later ones with speech.
fn tool_call_responder(
    name: &'static str,
    arguments: &'static str,
) -> impl Fn(&Value) -> Vec<Value> {
    let responses = AtomicUsize::new(0);
    move |frame| {
        if frame["type"] != "response.create" {
            return Vec::new();
        }
        match responses.fetch_add(1, Ordering::SeqCst) {
            0 => vec![
                json!({"type": "response.created", "response": {"id": "resp_1", "status": "in_progress"}}),
                json!({
                    "type": "response.output_item.added",
                    "response_id": "resp_1",
                    "item": {"type": "function_call", "call_id": "call_1", "name": name, "arguments": ""}
                }),
                json!({
                    "type": "response.function_call_arguments.done",
                    "response_id": "resp_1",
                    "item_id": "item_1",
                    "call_id": "call_1",
                    "name": name,
                    "arguments": arguments
                }),
                json!({"type": "response.done", "response": {"id": "resp_1", "status": "completed"}}),
            ],
            _ => spoken_response("resp_2", "All done."),
        }
    }
}

/// Parsed `output` of the first `function_call_output` item sent by the client.
async fn tool_output(server: &MockRealtimeServer) -> Value {
    let found = wait_until(TIMEOUT, || {
        server
            .received()
            .iter()
            .any(|f| f["item"]["type"] == "function_call_output")
    })
    .await;
    assert!(found, "no tool output received");

    let frame = server
        .received()
        .into_iter()
        .find(|f| f["item"]["type"] == "function_call_output")
        .unwrap();
    assert_eq!(frame["item"]["call_id"], "call_1");
    serde_json::from_str(frame["item"]["output"].as_str().unwrap()).unwrap()
}

#[tokio::test]
async fn test_tool_call_round_trip() {
    let responder = tool_call_responder("set_temperature", "{\"temperature\": 99}");
    let server = MockRealtimeServer::with_responder(responder).await;
    let mut client = RealtimeClient::new(config_for(&server));
    let session = AssistantSession::new();
    session.attach(&client);

    client.connect().await.unwrap();
    assert!(session.send_user_text(&client.sender(), "make it really warm"));

    let output = tool_output(&server).await;
    assert_eq!(output["success"], true);
    assert_eq!(output["message"], "Temperature set to 30°C");
    assert_eq!(session.vehicle().temperature, 30.0);

    // The tool result is followed by a response request, answered with speech
    assert!(
        wait_until(TIMEOUT, || session
            .transcript()
            .iter()
            .any(|e| e.message == "Assistant: All done."))
        .await
    );
    let types = server.received_types();
    assert_eq!(
        types,
        vec![
            "session.update",
            "conversation.item.create",
            "response.create",
            "conversation.item.create",
            "response.create",
        ]
    );

    // Only the spoken response carried usage
    assert!(wait_until(TIMEOUT, || session.metrics().turns() == 1).await);
    assert_eq!(session.metrics().tokens().input_text, 100);

    client.disconnect().await;
}

#[tokio::test]
async fn test_vehicle_status_tool_reports_current_media() {
    let server =
        MockRealtimeServer::with_responder(tool_call_responder("get_vehicle_status", "{}")).await;
    let mut client = RealtimeClient::new(config_for(&server));
    let session = AssistantSession::with_vehicle(VehicleStatus {
        lights: LightState::On,
        ..Default::default()
    });
    session.attach(&client);

    client.connect().await.unwrap();
    assert!(session.send_user_text(&client.sender(), "how is the car"));

    let output = tool_output(&server).await;
    assert_eq!(output["success"], true);
    let status = &output["status"];
    assert_eq!(status["lights"], "on");
    assert!(status.get("currentMedia").is_some());
    assert!(status.get("radioStation").is_none());
    assert!(status.get("radioPlaying").is_none());

    client.disconnect().await;
}

#[tokio::test]
async fn test_unknown_tool_leaves_vehicle_unchanged() {
    let server =
        MockRealtimeServer::with_responder(tool_call_responder("open_sunroof", "{}")).await;
    let mut client = RealtimeClient::new(config_for(&server));
    let session = AssistantSession::new();
    session.attach(&client);

    client.connect().await.unwrap();
    assert!(session.send_user_text(&client.sender(), "open the sunroof"));

    let output = tool_output(&server).await;
    assert_eq!(output, json!({"success": false, "message": "Unknown tool"}));
    assert_eq!(session.vehicle(), VehicleStatus::default());

    client.disconnect().await;
}

#[tokio::test]
async fn test_latency_from_speech_stop_to_first_audio() {
    let server = MockRealtimeServer::with_responder(|_| Vec::new()).await;
    let mut client = RealtimeClient::new(config_for(&server));
    let session = AssistantSession::new();
    session.attach(&client);

    client.connect().await.unwrap();
    server.wait_for_frames(1, TIMEOUT).await;

    server.push(json!({
        "type": "input_audio_buffer.speech_started",
        "audio_start_ms": 0,
        "item_id": "item_1"
    }));
    server.push(json!({
        "type": "input_audio_buffer.speech_stopped",
        "audio_end_ms": 900,
        "item_id": "item_1"
    }));
    tokio::time::sleep(Duration::from_millis(20)).await;
    for frame in spoken_response("resp_1", "Hello.") {
        server.push(frame);
    }

    assert!(wait_until(TIMEOUT, || session.metrics().turns() == 1).await);
    let metrics = session.metrics();
    assert_eq!(metrics.latencies().len(), 1);

    client.disconnect().await;
}

#[tokio::test]
async fn test_connection_state_is_logged() {
    let server = MockRealtimeServer::start().await;
    let mut client = RealtimeClient::new(config_for(&server));
    let session = AssistantSession::new();
    session.attach(&client);

    client.connect().await.unwrap();
    assert!(session.is_connected());
    server.wait_for_frames(1, TIMEOUT).await;

    assert!(server.close());
    assert!(wait_until(TIMEOUT, || !session.is_connected()).await);

    let transcript = session.transcript();
    assert_eq!(transcript[0].message, "Connected to Azure Voice Live");
    assert_eq!(transcript.last().map(|e| e.message.as_str()), Some("Connection closed"));
    assert!(transcript.iter().all(|e| e.kind != LogKind::Error));

    // Typed input after the connection is gone is dropped and logged
    assert!(!session.send_user_text(&client.sender(), "hello?"));
    assert_eq!(session.transcript().last().map(|e| e.kind), Some(LogKind::Error));

    client.disconnect().await;
}
