//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - learner session API under `/api/v1/...`
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        .route("/ws", get(ws::ws_upgrade))
        // Catalog
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/modules", get(http::http_get_modules))
        .route("/api/v1/lessons", get(http::http_get_lessons))
        // Learner sessions
        .route("/api/v1/sessions", post(http::http_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(http::http_get_session).delete(http::http_delete_session),
        )
        .route("/api/v1/sessions/:id/module", post(http::http_select_module))
        .route("/api/v1/sessions/:id/course/lesson", post(http::http_select_lesson))
        .route("/api/v1/sessions/:id/course/option", post(http::http_choose_option))
        .route("/api/v1/sessions/:id/course/answer", post(http::http_submit_answer))
        .route("/api/v1/sessions/:id/generate", post(http::http_generate))
        .route("/api/v1/sessions/:id/image", get(http::http_get_image))
        .route("/api/v1/sessions/:id/story", post(http::http_story_message))
        .route("/api/v1/sessions/:id/code/tab", post(http::http_code_tab))
        .route("/api/v1/sessions/:id/code/copy", post(http::http_copy_code))
        .route("/api/v1/sessions/:id/companion", post(http::http_companion_message))
        .route("/api/v1/sessions/:id/companion/open", post(http::http_companion_open))
        .route("/api/v1/sessions/:id/companion/close", post(http::http_companion_close))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .fallback_service(static_service)
}
