//! Axum router configuration.

use std::sync::Arc;

use axum::{response::Html, routing::get, Router};
use entwine_compiler::ProjectLayout;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use scalar_api_reference::scalar_html_default;

use super::{document, health};

/// Swagger UI page embedded at compile time.
const SWAGGER_UI: &str = include_str!("../../assets/swagger-ui.html");

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub layout: Arc<ProjectLayout>,
}

/// Handler to serve the Scalar API reference for the composed document.
async fn api_docs() -> Html<String> {
    let config = serde_json::json!({
        "spec": {
            "url": "/openapi.json"
        },
        "theme": "purple",
        "layout": "modern",
        "hideDownloadButton": false
    });

    Html(scalar_html_default(&config))
}

/// Handler to serve the Swagger UI explorer. Answers every unmatched path.
async fn swagger_ui() -> Html<&'static str> {
    Html(SWAGGER_UI)
}

/// Create the router serving the document rooted at `layout`.
pub fn create_router(layout: Arc<ProjectLayout>) -> Router {
    let state = AppState { layout };

    Router::new()
        .route("/openapi.json", get(document::openapi_json))
        .route("/doc", get(api_docs))
        .route("/health", get(health::health_check))
        .fallback(swagger_ui)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
