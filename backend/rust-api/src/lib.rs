use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use services::AppState;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    // The quiz pages are served from another origin
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/metrics",
            get(handlers::metrics_handler)
                .layer(middleware::from_fn(handlers::metrics_auth_middleware)),
        )
        .merge(catalog_routes())
        .nest("/api/v1", api_routes())
        .with_state(app_state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(
                    middlewares::trace::trace_context_middleware,
                ))
                .layer(middleware::from_fn(
                    middlewares::metrics::metrics_middleware,
                ))
                .layer(CompressionLayer::new())
                .layer(cors),
        )
}

/// Storage API used by the quiz editor.
fn catalog_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/results",
            get(handlers::quizzes::list_quizzes).post(handlers::quizzes::create_quiz),
        )
        // the editor posts to `results/` when the new quiz has no id yet
        .route("/results/", post(handlers::quizzes::create_quiz))
        .route(
            "/results/{id}",
            get(handlers::quizzes::get_quiz).put(handlers::quizzes::update_quiz),
        )
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/quizzes", get(handlers::quizzes::list_summaries))
        .route("/session", get(handlers::session::get_session))
        .route("/session/select", post(handlers::session::select_quiz))
        .route("/session/answers", post(handlers::session::submit_answer))
        .route("/session/return", post(handlers::session::return_to_selection))
        .route("/session/stream", get(handlers::sse::session_stream))
}
