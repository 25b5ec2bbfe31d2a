//! End-to-end evaluation scenarios against a scripted endpoint.

mod support;

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use chrome_debugger::{Error, EvaluateOptions, EvaluateOutcome, Session, SessionConfig};

use support::{MockChrome, ok_response, wait_until};

/// Handler covering the domain-enable plumbing most scenarios need.
fn debugging_handler(frame: &Value) -> Vec<Value> {
    match frame["method"].as_str().unwrap_or_default() {
        "Runtime.evaluate" => vec![ok_response(
            frame,
            json!({ "result": { "type": "number", "value": 3 } }),
        )],
        "Debugger.setBreakpointByUrl" => vec![ok_response(
            frame,
            json!({ "breakpointId": "bp:4:0", "locations": [] }),
        )],
        _ => vec![ok_response(frame, json!({}))],
    }
}

async fn connected_session(server: &MockChrome) -> Arc<Session> {
    let session = Arc::new(Session::default());
    session.connect(&server.ws_url).await.expect("connect");
    session
}

#[tokio::test]
async fn evaluate_while_running_returns_value() {
    let server = MockChrome::start(Box::new(debugging_handler)).await;
    let session = connected_session(&server).await;

    session.enable_debugger().await.expect("enable debugger");
    session.enable_runtime().await.expect("enable runtime");

    let outcome = session
        .evaluate("1+2", EvaluateOptions::default())
        .await
        .expect("evaluate");

    match &outcome {
        EvaluateOutcome::Value { result, .. } => {
            assert_eq!(result["type"], "number");
            assert_eq!(result["value"], 3);
        }
        EvaluateOutcome::Paused { .. } => panic!("unexpected pause"),
    }

    let tool = outcome.to_tool_json();
    assert_eq!(tool["type"], "number");
    assert_eq!(tool["value"], 3);
    assert_eq!(tool["paused"], false);
}

#[tokio::test]
async fn evaluate_that_hits_breakpoint_returns_pause() {
    // The evaluate response is withheld: Chrome does not answer while the
    // isolate is paused.
    let server = MockChrome::start(Box::new(|frame| {
        match frame["method"].as_str().unwrap_or_default() {
            "Runtime.evaluate" => Vec::new(),
            "Debugger.setBreakpointByUrl" => vec![ok_response(
                frame,
                json!({ "breakpointId": "bp:4:0", "locations": [] }),
            )],
            _ => vec![ok_response(frame, json!({}))],
        }
    }))
    .await;
    let session = connected_session(&server).await;

    session.enable_debugger().await.expect("enable debugger");
    session.enable_runtime().await.expect("enable runtime");
    session
        .set_breakpoint_by_url(Some("http://x/p.html"), None, 4, None, None)
        .await
        .expect("set breakpoint");

    let eval = tokio::spawn({
        let session = Arc::clone(&session);
        async move {
            session
                .evaluate("targetFunction()", EvaluateOptions::default())
                .await
        }
    });

    // Wait for the call to hit the wire, then pause the target.
    assert!(
        wait_until(
            || !server.received_for("Runtime.evaluate").is_empty(),
            Duration::from_secs(1)
        )
        .await,
        "evaluate never reached the endpoint"
    );
    server.inject_event(
        "Debugger.paused",
        json!({
            "reason": "breakpoint",
            "hitBreakpoints": ["bp:4:0"],
            "callFrames": [{
                "callFrameId": "frame-0",
                "functionName": "targetFunction",
                "location": { "scriptId": "55", "lineNumber": 4, "columnNumber": 0 },
                "url": "http://x/p.html"
            }]
        }),
    );

    let outcome = eval.await.expect("task").expect("evaluate");
    match outcome {
        EvaluateOutcome::Paused {
            reason,
            call_frames,
        } => {
            assert_eq!(reason, "breakpoint");
            assert!(!call_frames.is_empty());
            assert_eq!(call_frames[0].function_name, "targetFunction");
        }
        EvaluateOutcome::Value { .. } => panic!("expected pause to win the race"),
    }

    assert_eq!(session.debug_state()["isPaused"], true);
    assert_eq!(session.call_frames().expect("frames").len(), 1);
}

#[tokio::test]
async fn late_evaluate_response_is_drained_after_pause_wins() {
    let server = MockChrome::start(Box::new(|frame| {
        match frame["method"].as_str().unwrap_or_default() {
            "Runtime.evaluate" => Vec::new(),
            _ => vec![ok_response(frame, json!({}))],
        }
    }))
    .await;

    let transport = chrome_debugger::Transport::connect(&server.ws_url)
        .await
        .expect("connect");

    // Start a send and stop waiting for it, the way the facade does when a
    // pause wins the race.
    let send = transport.send("Runtime.evaluate", None);
    tokio::select! {
        _ = send => panic!("no response was scripted"),
        () = tokio::time::sleep(Duration::from_millis(50)) => {}
    }
    assert_eq!(transport.pending_count(), 1);

    // The late response must free the slot even with nobody waiting.
    let frame = server.received_for("Runtime.evaluate").remove(0);
    server.inject(ok_response(&frame, json!({ "result": { "type": "undefined" } })));

    assert!(
        wait_until(|| transport.pending_count() == 0, Duration::from_secs(1)).await,
        "late response did not free the pending slot"
    );
}

#[tokio::test]
async fn duplicate_pause_after_race_still_updates_state() {
    let server = MockChrome::ack_everything().await;
    let session = connected_session(&server).await;
    session.enable_debugger().await.expect("enable debugger");

    server.inject_event(
        "Debugger.paused",
        json!({ "reason": "other", "callFrames": [{ "callFrameId": "f0" }] }),
    );
    assert!(
        wait_until(|| session.debug_state()["isPaused"] == true, Duration::from_secs(1)).await
    );

    server.inject_event("Debugger.resumed", json!({}));
    assert!(
        wait_until(
            || session.debug_state()["isPaused"] == false,
            Duration::from_secs(1)
        )
        .await
    );

    // A second pause with no listener racing it lands in state all the same.
    server.inject_event(
        "Debugger.paused",
        json!({ "reason": "exception", "callFrames": [{ "callFrameId": "f1" }] }),
    );
    assert!(
        wait_until(|| session.debug_state()["isPaused"] == true, Duration::from_secs(1)).await
    );
    assert_eq!(session.debug_state()["pauseReason"], "exception");
}

#[tokio::test]
async fn detection_window_reports_pause_after_response() {
    let session_config = SessionConfig {
        pause_detection_window: Duration::from_millis(200),
        ..SessionConfig::default()
    };

    // Navigate responds normally, then the load hits a breakpoint: the
    // pause event follows the response.
    let server = MockChrome::start(Box::new(|frame| {
        match frame["method"].as_str().unwrap_or_default() {
            "Page.navigate" => vec![
                ok_response(frame, json!({ "frameId": "F1" })),
                json!({
                    "method": "Debugger.paused",
                    "params": {
                        "reason": "breakpoint",
                        "callFrames": [{ "callFrameId": "f0" }]
                    }
                }),
            ],
            _ => vec![ok_response(frame, json!({}))],
        }
    }))
    .await;

    let session = Arc::new(Session::new(session_config));
    session.connect(&server.ws_url).await.expect("connect");
    session.enable_debugger().await.expect("enable debugger");

    let aware = session.navigate("http://x/p.html").await.expect("navigate");
    assert!(aware.paused);
    assert_eq!(aware.pause_reason.as_deref(), Some("breakpoint"));
    assert_eq!(aware.result["frameId"], "F1");
}

#[tokio::test]
async fn detection_window_elapses_without_pause() {
    let config = SessionConfig {
        pause_detection_window: Duration::from_millis(50),
        ..SessionConfig::default()
    };
    let server = MockChrome::ack_everything().await;

    let session = Arc::new(Session::new(config));
    session.connect(&server.ws_url).await.expect("connect");
    session.enable_debugger().await.expect("enable debugger");

    let aware = session.navigate("http://x/p.html").await.expect("navigate");
    assert!(!aware.paused);
    assert!(aware.pause_reason.is_none());
}

#[tokio::test]
async fn evaluate_on_frame_while_paused() {
    let server = MockChrome::start(Box::new(|frame| {
        match frame["method"].as_str().unwrap_or_default() {
            "Debugger.evaluateOnCallFrame" => {
                assert_eq!(frame["params"]["callFrameId"], "frame-0");
                vec![ok_response(
                    frame,
                    json!({ "result": { "type": "string", "value": "local" } }),
                )]
            }
            _ => vec![ok_response(frame, json!({}))],
        }
    }))
    .await;
    let session = connected_session(&server).await;
    session.enable_debugger().await.expect("enable debugger");

    server.inject_event(
        "Debugger.paused",
        json!({ "reason": "breakpoint", "callFrames": [{ "callFrameId": "frame-0" }] }),
    );
    assert!(
        wait_until(|| session.debug_state()["isPaused"] == true, Duration::from_secs(1)).await
    );

    let outcome = session
        .evaluate_on_frame("frame-0", "localVar", EvaluateOptions::default())
        .await
        .expect("evaluate on frame");
    match outcome {
        EvaluateOutcome::Value { result, .. } => assert_eq!(result["value"], "local"),
        EvaluateOutcome::Paused { .. } => panic!("unexpected pause"),
    }

    // Plain evaluate must refuse while paused, without reaching the wire.
    let before = server.received_for("Runtime.evaluate").len();
    let err = session
        .evaluate("1+2", EvaluateOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyPaused { .. }));
    assert_eq!(server.received_for("Runtime.evaluate").len(), before);
}

#[tokio::test]
async fn disconnect_during_outstanding_send() {
    // Debugger.pause never gets a response.
    let server = MockChrome::start(Box::new(|frame| {
        match frame["method"].as_str().unwrap_or_default() {
            "Debugger.pause" => Vec::new(),
            _ => vec![ok_response(frame, json!({}))],
        }
    }))
    .await;
    let session = connected_session(&server).await;
    session.enable_debugger().await.expect("enable debugger");

    let pause = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.pause().await }
    });

    assert!(
        wait_until(
            || !server.received_for("Debugger.pause").is_empty(),
            Duration::from_secs(1)
        )
        .await,
        "pause never reached the endpoint"
    );
    session.disconnect();

    let err = pause.await.expect("task").unwrap_err();
    assert!(matches!(err, Error::ConnectionClosed));

    // No spurious pause landed in the projection.
    assert_eq!(session.debug_state()["isPaused"], false);
}

#[tokio::test]
async fn stepping_requires_pause_and_resume_clears_it() {
    let server = MockChrome::ack_everything().await;
    let session = connected_session(&server).await;
    session.enable_debugger().await.expect("enable debugger");

    assert!(matches!(
        session.step_over().await.unwrap_err(),
        Error::NotPaused
    ));

    server.inject_event(
        "Debugger.paused",
        json!({ "reason": "other", "callFrames": [{ "callFrameId": "f0" }] }),
    );
    assert!(
        wait_until(|| session.debug_state()["isPaused"] == true, Duration::from_secs(1)).await
    );

    session.step_over().await.expect("step while paused");
    session.resume().await.expect("resume");

    server.inject_event("Debugger.resumed", json!({}));
    assert!(
        wait_until(
            || session.debug_state()["isPaused"] == false,
            Duration::from_secs(1)
        )
        .await
    );
}

#[tokio::test]
async fn breakpoint_resolution_appends_locations() {
    let server = MockChrome::start(Box::new(|frame| {
        match frame["method"].as_str().unwrap_or_default() {
            "Debugger.setBreakpointByUrl" => vec![ok_response(
                frame,
                json!({ "breakpointId": "bp:4:0", "locations": [] }),
            )],
            _ => vec![ok_response(frame, json!({}))],
        }
    }))
    .await;
    let session = connected_session(&server).await;
    session.enable_debugger().await.expect("enable debugger");

    let breakpoint = session
        .set_breakpoint_by_url(Some("http://x/p.html"), None, 4, None, None)
        .await
        .expect("set breakpoint");
    assert_eq!(breakpoint.id.as_str(), "bp:4:0");
    assert!(breakpoint.resolved_locations.is_empty());

    server.inject_event(
        "Debugger.breakpointResolved",
        json!({
            "breakpointId": "bp:4:0",
            "location": { "scriptId": "55", "lineNumber": 4, "columnNumber": 12 }
        }),
    );

    assert!(
        wait_until(
            || session
                .breakpoints()
                .first()
                .is_some_and(|bp| bp.resolved_locations.len() == 1),
            Duration::from_secs(1)
        )
        .await,
        "resolution never landed"
    );
}
