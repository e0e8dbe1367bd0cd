#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use mcq_api::{config::Config, create_router, services::AppState};

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub catalog_path: PathBuf,
    // keeps the catalog file alive for the duration of the test
    _dir: TempDir,
}

/// One timed quiz (id 1, five seconds) and one untimed quiz (id 2).
pub fn geo_catalog() -> Value {
    json!({
        "results": [
            {
                "id": 1,
                "title": "Geo",
                "timer": 5,
                "questions": [geo_question()]
            },
            {
                "id": 2,
                "title": "Geo (untimed)",
                "questions": [geo_question(), {
                    "category": "Geography",
                    "type": "multiple",
                    "difficulty": "medium",
                    "question": "Longest river in Europe?",
                    "correct_answer": ["Volga"],
                    "incorrect_answers": ["Danube", "Rhine", "Loire"]
                }]
            }
        ]
    })
}

pub fn geo_question() -> Value {
    json!({
        "category": "Geography",
        "type": "multiple",
        "difficulty": "easy",
        "question": "Capital of France?",
        "correct_answer": ["Paris"],
        "incorrect_answers": ["Lyon"]
    })
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with(Some(geo_catalog()), 1000).await
}

/// Builds the full router over a temporary JSON catalog. `None` leaves the
/// catalog file absent.
pub async fn create_test_app_with(catalog: Option<Value>, tick_interval_ms: u64) -> TestApp {
    init_tracing();

    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let catalog_path = dir.path().join("db.json");
    if let Some(document) = catalog {
        std::fs::write(&catalog_path, document.to_string()).expect("failed to seed catalog");
    }

    let mut config = Config::default();
    config.catalog.path = catalog_path.clone();
    config.session.tick_interval_ms = tick_interval_ms;

    let state = Arc::new(AppState::new(config));
    let router = create_router(state.clone());

    TestApp {
        router,
        state,
        catalog_path,
        _dir: dir,
    }
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    app.clone().oneshot(request).await.unwrap()
}

pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = send(app, method, uri, body).await;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            panic!(
                "non-JSON body for {} {}: {}",
                method,
                uri,
                String::from_utf8_lossy(&bytes)
            )
        })
    };
    (status, json)
}
