//! HTTP router construction.
//!
//! Assembles the API routes, static site fallback and middleware into a single `Router`.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::state::AppState;

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let www = state.config.www_dir();
    let cors = cors_layer(&state.config.server.cors_origin);

    Router::new()
        .route("/health", get(api::health))
        .route("/now", get(api::now))
        .route("/rotations", get(api::rotations_list))
        .route("/rotations/{name}", get(api::rotation_detail))
        .fallback_service(ServeDir::new(www))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    if origin == "*" {
        return CorsLayer::permissive();
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new().allow_origin(value),
        Err(e) => {
            tracing::warn!("Invalid CORS_ORIGIN {:?}: {}, falling back to permissive", origin, e);
            CorsLayer::permissive()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::api::test_support::{app, get, write};

    #[tokio::test]
    async fn unknown_paths_are_served_from_www() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "www/index.json", "{\"page\": \"party\"}");

        let (status, body) = get(app(tmp.path()), "/index.json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"], "party");

        let (status, _) = get(app(tmp.path()), "/missing.html").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
