use axum::http::StatusCode;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::time::Duration;

mod common;

use common::{send, send_json};

async fn wait_for_phase(app: &axum::Router, phase: &str) -> Value {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let (_, snapshot) = send_json(app, "GET", "/api/v1/session", None).await;
        if snapshot["phase"] == phase {
            return snapshot;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "session never reached {}: {}",
            phase,
            snapshot
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_initial_session_is_selecting() {
    let app = common::create_test_app().await;

    let (status, body) = send_json(&app.router, "GET", "/api/v1/session", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "selecting");
    assert_eq!(body["active"], false);
    assert_eq!(body["score"], 0);
    assert!(body["quiz_id"].is_null());
    assert!(body["answers"].is_null());
}

#[tokio::test]
async fn test_correct_answer_completes_geo_quiz() {
    let app = common::create_test_app().await;

    let (status, body) = send_json(
        &app.router,
        "POST",
        "/api/v1/session/select",
        Some(json!({ "quiz_id": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["phase"], "in_progress");
    assert_eq!(body["active"], true);
    assert_eq!(body["title"], "Geo");
    assert_eq!(body["current_index"], 0);
    assert_eq!(body["remaining_seconds"], 5);
    assert_eq!(body["remaining_clock"], "0:05");
    assert_eq!(body["question"]["prompt"], "Capital of France?");
    assert_eq!(body["question"]["number"], 1);

    let mut answers: Vec<String> = serde_json::from_value(body["answers"].clone()).unwrap();
    answers.sort();
    assert_eq!(answers, vec!["Lyon", "Paris"]);

    let (status, body) = send_json(
        &app.router,
        "POST",
        "/api/v1/session/answers",
        Some(json!({ "answer": "Paris" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accepted"], true);
    assert_eq!(body["correct"], true);
    assert_eq!(body["snapshot"]["phase"], "completed");
    assert_eq!(body["snapshot"]["score"], 1);
    assert_eq!(body["snapshot"]["active"], false);
    assert!(body["snapshot"]["answers"].is_null());
}

#[tokio::test]
async fn test_wrong_answer_scores_zero() {
    let app = common::create_test_app().await;
    send_json(
        &app.router,
        "POST",
        "/api/v1/session/select",
        Some(json!({ "quiz_id": 1 })),
    )
    .await;

    let (_, body) = send_json(
        &app.router,
        "POST",
        "/api/v1/session/answers",
        Some(json!({ "answer": "Lyon" })),
    )
    .await;
    assert_eq!(body["accepted"], true);
    assert_eq!(body["correct"], false);
    assert_eq!(body["snapshot"]["phase"], "completed");
    assert_eq!(body["snapshot"]["score"], 0);
}

#[tokio::test]
async fn test_untimed_quiz_walks_all_questions() {
    let app = common::create_test_app().await;

    let (_, body) = send_json(
        &app.router,
        "POST",
        "/api/v1/session/select",
        Some(json!({ "quiz_id": 2 })),
    )
    .await;
    assert!(body["remaining_seconds"].is_null());
    assert_eq!(body["question_count"], 2);

    let (_, body) = send_json(
        &app.router,
        "POST",
        "/api/v1/session/answers",
        Some(json!({ "answer": "Paris" })),
    )
    .await;
    assert_eq!(body["snapshot"]["phase"], "in_progress");
    assert_eq!(body["snapshot"]["current_index"], 1);
    assert_eq!(body["snapshot"]["question"]["prompt"], "Longest river in Europe?");
    assert_eq!(body["snapshot"]["answers"].as_array().unwrap().len(), 4);

    let (_, body) = send_json(
        &app.router,
        "POST",
        "/api/v1/session/answers",
        Some(json!({ "answer": "Danube" })),
    )
    .await;
    assert_eq!(body["correct"], false);
    assert_eq!(body["snapshot"]["phase"], "completed");
    assert_eq!(body["snapshot"]["score"], 1);
}

#[tokio::test]
async fn test_commands_out_of_phase() {
    let app = common::create_test_app().await;

    // nothing to answer yet
    let (status, body) = send_json(
        &app.router,
        "POST",
        "/api/v1/session/answers",
        Some(json!({ "answer": "Paris" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accepted"], false);
    assert!(body.get("correct").is_none());

    let (status, _) = send_json(&app.router, "POST", "/api/v1/session/return", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    send_json(
        &app.router,
        "POST",
        "/api/v1/session/select",
        Some(json!({ "quiz_id": 2 })),
    )
    .await;
    let (status, body) = send_json(
        &app.router,
        "POST",
        "/api/v1/session/select",
        Some(json!({ "quiz_id": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], 409);

    let (_, snapshot) = send_json(&app.router, "GET", "/api/v1/session", None).await;
    assert_eq!(snapshot["quiz_id"], 2);
}

#[tokio::test]
async fn test_return_to_selection_after_completion() {
    let app = common::create_test_app().await;
    send_json(
        &app.router,
        "POST",
        "/api/v1/session/select",
        Some(json!({ "quiz_id": 1 })),
    )
    .await;
    send_json(
        &app.router,
        "POST",
        "/api/v1/session/answers",
        Some(json!({ "answer": "Paris" })),
    )
    .await;

    let (status, body) = send_json(&app.router, "POST", "/api/v1/session/return", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "selecting");
    assert_eq!(body["score"], 0);
    assert!(body["quiz_id"].is_null());

    let (status, _) = send_json(
        &app.router,
        "POST",
        "/api/v1/session/select",
        Some(json!({ "quiz_id": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_selecting_missing_quiz_returns_404() {
    let app = common::create_test_app().await;

    let (status, body) = send_json(
        &app.router,
        "POST",
        "/api/v1/session/select",
        Some(json!({ "quiz_id": 99 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Quiz not found");

    let (_, snapshot) = send_json(&app.router, "GET", "/api/v1/session", None).await;
    assert_eq!(snapshot["phase"], "selecting");
}

#[tokio::test]
async fn test_selecting_from_broken_catalog_returns_503() {
    let app = common::create_test_app().await;
    std::fs::write(&app.catalog_path, "{\"results\": 5}").unwrap();

    let (status, _) = send_json(
        &app.router,
        "POST",
        "/api/v1/session/select",
        Some(json!({ "quiz_id": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_timer_runs_out_and_freezes_session() {
    let app = common::create_test_app_with(Some(common::geo_catalog()), 10).await;

    send_json(
        &app.router,
        "POST",
        "/api/v1/session/select",
        Some(json!({ "quiz_id": 1 })),
    )
    .await;

    let snapshot = wait_for_phase(&app.router, "timed_out").await;
    assert_eq!(snapshot["score"], 0);
    assert_eq!(snapshot["remaining_seconds"], 0);
    assert_eq!(snapshot["remaining_clock"], "0:00");
    assert_eq!(snapshot["active"], false);

    let (_, body) = send_json(
        &app.router,
        "POST",
        "/api/v1/session/answers",
        Some(json!({ "answer": "Paris" })),
    )
    .await;
    assert_eq!(body["accepted"], false);
    assert_eq!(body["snapshot"], snapshot);

    let (status, body) = send_json(&app.router, "POST", "/api/v1/session/return", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "selecting");
}

#[tokio::test]
async fn test_answering_in_time_stops_the_countdown() {
    let app = common::create_test_app_with(Some(common::geo_catalog()), 10).await;

    send_json(
        &app.router,
        "POST",
        "/api/v1/session/select",
        Some(json!({ "quiz_id": 1 })),
    )
    .await;
    let (_, body) = send_json(
        &app.router,
        "POST",
        "/api/v1/session/answers",
        Some(json!({ "answer": "Paris" })),
    )
    .await;
    assert_eq!(body["snapshot"]["phase"], "completed");
    let frozen = body["snapshot"]["remaining_seconds"].clone();

    // well past the five simulated seconds
    tokio::time::sleep(Duration::from_millis(200)).await;
    let (_, snapshot) = send_json(&app.router, "GET", "/api/v1/session", None).await;
    assert_eq!(snapshot["phase"], "completed");
    assert_eq!(snapshot["score"], 1);
    assert_eq!(snapshot["remaining_seconds"], frozen);
}

#[tokio::test]
async fn test_stream_sends_current_snapshot_then_updates() {
    let app = common::create_test_app().await;

    let response = send(&app.router, "GET", "/api/v1/session/stream", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );
    let mut body = response.into_body();

    let first = next_event(&mut body).await;
    assert!(first.contains("event: snapshot"));
    assert!(first.contains("\"phase\":\"selecting\""));

    send_json(
        &app.router,
        "POST",
        "/api/v1/session/select",
        Some(json!({ "quiz_id": 2 })),
    )
    .await;

    let second = next_event(&mut body).await;
    assert!(second.contains("\"phase\":\"in_progress\""));
    assert!(second.contains("\"quiz_id\":2"));
}

#[tokio::test]
async fn test_stream_carries_countdown_events() {
    let app = common::create_test_app_with(Some(common::geo_catalog()), 10).await;

    let response = send(&app.router, "GET", "/api/v1/session/stream", None).await;
    let mut body = response.into_body();

    send_json(
        &app.router,
        "POST",
        "/api/v1/session/select",
        Some(json!({ "quiz_id": 1 })),
    )
    .await;

    let mut events = Vec::new();
    while !events.iter().any(|e: &String| e.contains("event: time-expired")) {
        events.push(next_event(&mut body).await);
    }

    let ticks: Vec<&String> = events
        .iter()
        .filter(|e| e.contains("event: timer-tick"))
        .collect();
    assert_eq!(ticks.len(), 5);
    assert!(ticks[0].contains("\"type\":\"timer-tick\""));
    assert!(ticks[0].contains("\"remaining_seconds\":4"));
    assert!(ticks[4].contains("\"remaining_seconds\":0"));

    let expired = events.last().unwrap();
    assert!(expired.contains("\"type\":\"time-expired\""));
    assert!(expired.contains("\"total_seconds\":5"));
}

#[tokio::test]
async fn test_snapshot_shows_decoded_prompt() {
    let catalog = json!({
        "results": [{
            "id": 7,
            "title": "Plays",
            "questions": [{
                "category": "Literature",
                "type": "multiple",
                "difficulty": "easy",
                "question": "Who wrote &quot;Hamlet&quot;?",
                "correct_answer": ["Shakespeare"],
                "incorrect_answers": ["Moli&#232;re"]
            }]
        }]
    });
    let app = common::create_test_app_with(Some(catalog), 1000).await;

    let (_, body) = send_json(
        &app.router,
        "POST",
        "/api/v1/session/select",
        Some(json!({ "quiz_id": 7 })),
    )
    .await;
    assert_eq!(body["question"]["prompt"], "Who wrote \"Hamlet\"?");
    let labels = body["answer_labels"].as_array().unwrap();
    assert!(labels.contains(&json!("Molière")));
    assert!(body["answers"]
        .as_array()
        .unwrap()
        .contains(&json!("Moli&#232;re")));
}

async fn next_event(body: &mut axum::body::Body) -> String {
    let frame = tokio::time::timeout(Duration::from_secs(2), body.frame())
        .await
        .expect("timed out waiting for an SSE event")
        .expect("stream ended")
        .expect("stream error");
    let data = frame.into_data().expect("expected a data frame");
    String::from_utf8(data.to_vec()).unwrap()
}
