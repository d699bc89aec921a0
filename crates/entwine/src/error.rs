//! RFC 9457 Problem Details error responses.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use entwine_compiler::CompileError;
use serde::Serialize;

/// RFC 9457 Problem Details response.
#[derive(Debug, Clone, Serialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub error_type: String,
    pub title: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ProblemDetails {
    /// A fragment directory the document depends on is missing.
    pub fn missing_directory(detail: impl Into<String>) -> Self {
        Self {
            error_type: "urn:entwine:error:missing-directory".into(),
            title: "Fragment Directory Missing".into(),
            status: 500,
            detail: Some(detail.into()),
        }
    }

    /// The document could not be assembled from its fragments.
    pub fn assembly_failed(detail: impl Into<String>) -> Self {
        Self {
            error_type: "urn:entwine:error:assembly-failed".into(),
            title: "Document Assembly Failed".into(),
            status: 500,
            detail: Some(detail.into()),
        }
    }
}

impl From<CompileError> for ProblemDetails {
    fn from(err: CompileError) -> Self {
        match err {
            CompileError::MissingDirectory { .. } => Self::missing_directory(err.to_string()),
            other => Self::assembly_failed(other.to_string()),
        }
    }
}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = Json(&self).into_response();
        *response.status_mut() = status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}
