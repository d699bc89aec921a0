//! Live OpenAPI document endpoint.

use axum::{extract::State, Json};
use serde_json::Value;

use super::router::AppState;
use crate::error::ProblemDetails;

/// GET /openapi.json
///
/// Composes the document from the fragments on disk for every request.
pub async fn openapi_json(State(state): State<AppState>) -> Result<Json<Value>, ProblemDetails> {
    match entwine_compiler::compose(&state.layout).await {
        Ok(document) => {
            entwine_telemetry::log_document_served!(
                paths = count(&document, "/paths"),
                schemas = count(&document, "/components/schemas"),
                "served OpenAPI document"
            );
            Ok(Json(document))
        }
        Err(e) => {
            entwine_telemetry::log_assembly_failed!(error = %e, "failed to compose OpenAPI document");
            Err(ProblemDetails::from(e))
        }
    }
}

fn count(document: &Value, pointer: &str) -> usize {
    document
        .pointer(pointer)
        .and_then(Value::as_object)
        .map_or(0, |map| map.len())
}
