mod common;

use std::io::Read;
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use mockito::{Matcher, Server};
use pretty_assertions::assert_eq;
use tracing_discord_hook::compose::{compose, Notification, MESSAGE_TITLE, REQUEST_PAYLOAD_TITLE};
use tracing_discord_hook::discord::DiscordWebhook;
use tracing_discord_hook::sink::{DeliveryError, NotificationSink};
use tracing_discord_hook::snapshot::CapturedEvent;
use tracing_discord_hook::{DiscordHook, Level, LogEvent, ManualRequest, RequestBody, RequestPayload};

use common::recording_hook;

fn fixed_event<'a>(message: &str) -> LogEvent<'a> {
    LogEvent::new(Level::Error, message).at(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap())
}

fn body_field(n: &Notification) -> Option<String> {
    n.embed(REQUEST_PAYLOAD_TITLE)?
        .fields
        .as_ref()?
        .iter()
        .find(|f| f.name == "Body")
        .map(|f| f.value.clone())
}

#[tokio::test]
async fn inline_message_is_posted_as_json() {
    let mut server = Server::new_async().await;
    let message = "m".repeat(500);
    let mock = server
        .mock("POST", "/api/webhooks/1/token")
        .match_header("content-type", "application/json")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""username":"Rust""#.into()),
            Matcher::Regex(r#""title":"ERROR""#.into()),
            Matcher::Regex(r#""title":"REQUEST PAYLOAD""#.into()),
            Matcher::Regex(format!(r#""title":"MESSAGE","description":"```{message} ```""#)),
            Matcher::Regex(r#""timestamp":"2024-01-02T03:04:05Z""#.into()),
        ]))
        .with_status(204)
        .create_async()
        .await;

    let hook = DiscordHook::new(format!("{}/api/webhooks/1/token", server.url()), &[]);
    hook.fire(fixed_event(&message).with_error("db timeout")).unwrap();
    hook.drain().await;

    mock.assert_async().await;
    assert_eq!(hook.stats().delivered(), 1);
    assert_eq!(hook.stats().failed(), 0);
}

#[tokio::test]
async fn long_message_is_uploaded_as_file() {
    let mut server = Server::new_async().await;
    let message = "y".repeat(501);
    let received = Arc::new(Mutex::new(Vec::new()));
    let mock = server
        .mock("POST", "/hook")
        .match_header("content-type", Matcher::Regex("^multipart/form-data; boundary=".into()))
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="payload_json""#.into()),
            Matcher::Regex(r#""username":"Rust""#.into()),
            Matcher::Regex(r#""title":"ERROR""#.into()),
            Matcher::Regex(r#""title":"REQUEST PAYLOAD""#.into()),
            Matcher::Regex(r#"name="files(\[0\]|%5B0%5D)"; filename="log.txt""#.into()),
            Matcher::Regex(message.clone()),
        ]))
        .with_status(200)
        .with_body_from_request({
            let received = Arc::clone(&received);
            move |request| {
                if let Ok(body) = request.body() {
                    received.lock().unwrap().extend_from_slice(body);
                }
                Vec::new()
            }
        })
        .create_async()
        .await;

    let hook = DiscordHook::new(format!("{}/hook", server.url()), &[]);
    hook.fire(fixed_event(&message)).unwrap();
    hook.drain().await;

    mock.assert_async().await;
    assert_eq!(hook.stats().delivered(), 1);

    let body = String::from_utf8_lossy(&received.lock().unwrap()).into_owned();
    assert!(body.contains(r#""title":"REQUEST PAYLOAD""#));
    assert!(!body.contains(r#""title":"MESSAGE""#));
}

#[tokio::test]
async fn long_message_document_has_no_message_section() {
    let (hook, sink) = recording_hook();
    let message = "z".repeat(501);
    hook.fire(fixed_event(&message)).unwrap();
    hook.drain().await;

    let sent = sink.notifications();
    assert_eq!(sent.len(), 1);
    let n = &sent[0];
    assert!(n.embed(MESSAGE_TITLE).is_none());
    let attachment = n.attachment.as_ref().unwrap();
    assert_eq!(attachment.file_name, "log.txt");
    assert_eq!(attachment.content.as_ref(), message.as_bytes());
}

#[tokio::test]
async fn rejected_post_is_reported_not_returned() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/hook")
        .with_status(400)
        .with_body("invalid embed")
        .create_async()
        .await;

    let hook = DiscordHook::new(format!("{}/hook", server.url()), &[]);
    assert!(hook.fire(fixed_event("boom")).is_ok());
    hook.drain().await;

    mock.assert_async().await;
    assert_eq!(hook.stats().failed(), 1);
    assert_eq!(hook.stats().delivered(), 0);
}

#[tokio::test]
async fn webhook_surfaces_status_and_transport_errors() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/hook")
        .with_status(429)
        .with_body("slow down")
        .create_async()
        .await;

    let captured = fixed_event("boom").capture();
    let notification = compose(&captured, "Rust");

    let webhook = DiscordWebhook::new(format!("{}/hook", server.url()));
    match webhook.send(&notification).await {
        Err(DeliveryError::Status { status, body }) => {
            assert_eq!(status.as_u16(), 429);
            assert_eq!(body, "slow down");
        }
        other => panic!("unexpected result: {other:?}"),
    }

    let unreachable = DiscordWebhook::new("http://127.0.0.1:1/hook");
    assert!(matches!(
        unreachable.send(&notification).await,
        Err(DeliveryError::Transport(_))
    ));
}

#[tokio::test]
async fn live_request_body_survives_fire() {
    let (hook, sink) = recording_hook();
    let mut request = http::Request::builder()
        .method("POST")
        .uri("https://api.example.com/orders")
        .header("content-type", "application/json")
        .body(RequestBody::from(r#"{"a":1}"#))
        .unwrap();

    hook.fire(fixed_event("order failed").with_request(RequestPayload::Live(&mut request)))
        .unwrap();

    let mut body = String::new();
    request.body_mut().read_to_string(&mut body).unwrap();
    assert_eq!(body, r#"{"a":1}"#);

    hook.drain().await;
    let sent = sink.notifications();
    assert_eq!(body_field(&sent[0]).as_deref(), Some("```{\"a\":1} ```"));
}

#[tokio::test]
async fn urlencoded_live_body_is_rendered_as_json() {
    let (hook, sink) = recording_hook();
    let mut request = http::Request::builder()
        .method("POST")
        .uri("/login")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(RequestBody::from("a=1&b=2"))
        .unwrap();

    hook.fire(fixed_event("login failed").with_request((&mut request).into()))
        .unwrap();
    hook.drain().await;

    let rendered = body_field(&sink.notifications()[0]).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(rendered.trim_start_matches("```").trim_end_matches("```")).unwrap();
    assert_eq!(json, serde_json::json!({"a": ["1"], "b": ["2"]}));
}

#[tokio::test]
async fn empty_body_with_default_content_type_has_no_body_field() {
    let (hook, sink) = recording_hook();
    let mut request = http::Request::builder()
        .method("GET")
        .uri("/health")
        .body(RequestBody::from(""))
        .unwrap();

    hook.fire(fixed_event("health check failed").with_request((&mut request).into()))
        .unwrap();
    hook.drain().await;

    let sent = sink.notifications();
    assert_eq!(body_field(&sent[0]), None);
    let fields = sent[0].embed(REQUEST_PAYLOAD_TITLE).unwrap().fields.clone().unwrap();
    assert_eq!(
        fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
        vec!["Method", "URL"]
    );
}

#[tokio::test]
async fn manual_request_fields_are_rendered() {
    let (hook, sink) = recording_hook();
    let manual = ManualRequest::new("POST", "https://api.example.com/users").body(r#"{"name": "John"}"#);
    hook.fire(fixed_event("user creation failed").with_request(manual.into()))
        .unwrap();
    hook.drain().await;

    let fields = sink.notifications()[0]
        .embed(REQUEST_PAYLOAD_TITLE)
        .unwrap()
        .fields
        .clone()
        .unwrap();
    assert_eq!(
        fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
        vec!["Method", "URL", "Body"]
    );
}

#[tokio::test]
async fn identical_events_produce_identical_documents() {
    let (hook, sink) = recording_hook();
    for _ in 0..2 {
        let manual = ManualRequest::new("DELETE", "https://api.example.com/items/9");
        hook.fire(fixed_event("delete failed").with_error("conflict").with_request(manual.into()))
            .unwrap();
    }
    hook.drain().await;

    let sent = sink.notifications();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], sent[1]);
    assert_eq!(hook.stats().delivered(), 2);
}

#[test]
fn composed_document_matches_captured_event() {
    let captured = CapturedEvent {
        level: Level::Warn,
        timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        message: "disk almost full".into(),
        error: None,
        request: None,
    };
    let n = compose(&captured, "Rust");
    assert_eq!(n.document.embeds[0].title, "WARNING");
    assert_eq!(
        n.embed(MESSAGE_TITLE).and_then(|e| e.description.clone()).as_deref(),
        Some("```disk almost full ```")
    );
}
