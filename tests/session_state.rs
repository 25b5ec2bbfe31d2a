//! Projection behavior driven through a connected session.

mod support;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use chrome_debugger::{Session, SessionConfig};

use support::{MockChrome, wait_until};

#[tokio::test]
async fn network_table_evicts_insertion_oldest() {
    let config = SessionConfig {
        max_requests: 5,
        ..SessionConfig::default()
    };
    let server = MockChrome::ack_everything().await;
    let session = Arc::new(Session::new(config));
    session.connect(&server.ws_url).await.expect("connect");
    session.enable_network().await.expect("enable network");

    for i in 0..10 {
        server.inject_event(
            "Network.requestWillBeSent",
            json!({
                "requestId": format!("req{i}"),
                "type": "XHR",
                "timestamp": i as f64,
                "request": { "url": format!("http://x/{i}"), "method": "GET" }
            }),
        );
    }

    assert!(
        wait_until(
            || session
                .list_requests()
                .first()
                .is_some_and(|r| r.request_id.as_str() == "req5"),
            Duration::from_secs(1)
        )
        .await,
        "eviction never settled"
    );

    let ids: Vec<String> = session
        .list_requests()
        .iter()
        .map(|r| r.request_id.as_str().to_string())
        .collect();
    assert_eq!(ids, vec!["req5", "req6", "req7", "req8", "req9"]);
}

#[tokio::test]
async fn console_flattening_end_to_end() {
    let server = MockChrome::ack_everything().await;
    let session = Arc::new(Session::default());
    session.connect(&server.ws_url).await.expect("connect");
    session.enable_runtime().await.expect("enable runtime");

    server.inject_event(
        "Runtime.consoleAPICalled",
        json!({
            "type": "log",
            "timestamp": 1.0,
            "args": [
                { "type": "number", "value": 42 },
                { "type": "boolean", "value": true },
                { "type": "undefined" },
                { "type": "object", "description": "[object Object]" }
            ]
        }),
    );

    assert!(
        wait_until(|| session.console_messages().len() == 1, Duration::from_secs(1)).await
    );

    let message = &session.console_messages()[0];
    assert_eq!(message.text, "42 true undefined [object Object]");
    assert_eq!(message.level, "log");
}

#[tokio::test]
async fn log_buffer_and_worker_maps_fill_from_events() {
    let server = MockChrome::ack_everything().await;
    let session = Arc::new(Session::default());
    session.connect(&server.ws_url).await.expect("connect");

    server.inject_event(
        "Log.entryAdded",
        json!({ "entry": {
            "source": "network",
            "level": "error",
            "text": "Failed to load resource",
            "timestamp": 1.0
        }}),
    );
    server.inject_event(
        "ServiceWorker.workerRegistrationUpdated",
        json!({ "registrations": [
            { "registrationId": "r1", "scopeURL": "http://x/", "isDeleted": false }
        ]}),
    );

    assert!(
        wait_until(|| session.log_entries().len() == 1, Duration::from_secs(1)).await
    );
    assert_eq!(session.log_entries()[0].level, "error");

    assert!(
        wait_until(
            || session.service_workers()["registrations"]
                .as_array()
                .is_some_and(|r| r.len() == 1),
            Duration::from_secs(1)
        )
        .await
    );
}

#[tokio::test]
async fn projections_survive_reconnect() {
    let server = MockChrome::ack_everything().await;
    let session = Arc::new(Session::default());
    session.connect(&server.ws_url).await.expect("connect");
    session.enable_network().await.expect("enable network");

    server.inject_event(
        "Network.requestWillBeSent",
        json!({
            "requestId": "req1",
            "type": "XHR",
            "timestamp": 1.0,
            "request": { "url": "http://x/api", "method": "GET" }
        }),
    );
    assert!(
        wait_until(|| session.list_requests().len() == 1, Duration::from_secs(1)).await
    );

    session.disconnect();
    assert!(!session.is_connected());

    // Disconnect keeps the table for post-mortem queries.
    assert_eq!(session.list_requests().len(), 1);

    // A new endpoint picks up where the old one left off.
    let second = MockChrome::ack_everything().await;
    session.connect(&second.ws_url).await.expect("reconnect");
    assert!(session.is_connected());
    assert_eq!(session.list_requests().len(), 1);

    // Only an explicit reset clears it.
    session.reset();
    assert!(session.list_requests().is_empty());
}

#[tokio::test]
async fn script_registry_and_source_cache() {
    let server = MockChrome::start(Box::new(|frame| {
        match frame["method"].as_str().unwrap_or_default() {
            "Debugger.getScriptSource" => vec![support::ok_response(
                frame,
                json!({ "scriptSource": "function targetFunction() {}" }),
            )],
            _ => vec![support::ok_response(frame, json!({}))],
        }
    }))
    .await;
    let session = Arc::new(Session::default());
    session.connect(&server.ws_url).await.expect("connect");
    session.enable_debugger().await.expect("enable debugger");

    server.inject_event(
        "Debugger.scriptParsed",
        json!({
            "scriptId": "55",
            "url": "http://x/p.html",
            "startLine": 0,
            "endLine": 40,
            "executionContextId": 1
        }),
    );
    assert!(
        wait_until(|| session.list_scripts().len() == 1, Duration::from_secs(1)).await
    );

    let source = session
        .get_script_source(&chrome_debugger::ScriptId::new("55"))
        .await
        .expect("source");
    assert!(source.contains("targetFunction"));

    // Second fetch hits the cache: no extra protocol call.
    let calls_before = server.received_for("Debugger.getScriptSource").len();
    let cached = session
        .get_script_source(&chrome_debugger::ScriptId::new("55"))
        .await
        .expect("cached source");
    assert_eq!(cached, source);
    assert_eq!(
        server.received_for("Debugger.getScriptSource").len(),
        calls_before
    );
}
