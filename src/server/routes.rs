/// API Routes definition

use axum::{routing::get, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::handlers;
use super::AppState;

pub fn create_router(state: AppState) -> Router {
    let enable_cors = state.config.cors;

    let mut app = Router::new()
        .route(
            "/",
            get(handlers::server_status)
                .layer(CatchPanicLayer::custom(handlers::status_panic_response)),
        )
        .route("/space", get(handlers::disk_space))
        .route("/tmp", get(handlers::tmp_storage))
        .route("/memory", get(handlers::memory_usage))
        .route("/cpu", get(handlers::cpu_usage))
        .route("/threads", get(handlers::thread_count))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handlers::panic_response))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    if enable_cors {
        app = app.layer(CorsLayer::permissive());
    }

    app
}
