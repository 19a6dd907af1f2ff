//! HTTP mapping for errors.

use axum::Json;
use axum::extract::rejection::{BytesRejection, JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use qabase_shared::QaBaseError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Errors returned by handlers. The body is always `{"detail": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Any error raised by the engine, adapters or storage.
    #[error(transparent)]
    Domain(#[from] QaBaseError),

    /// A path id that is not a UUID. Reported as a missing entry.
    #[error("entry {0} not found")]
    UnknownId(String),

    /// Malformed JSON body or query string.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Body extraction failed before the handler ran (e.g. too large).
    #[error("{detail}")]
    Rejected { status: StatusCode, detail: String },

    /// The voice endpoint is called without a transcription endpoint.
    #[error("voice intake is not configured")]
    VoiceDisabled,
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl ApiError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Domain(err) => match err {
                QaBaseError::Validation { .. } | QaBaseError::InvalidArgument { .. } => {
                    StatusCode::BAD_REQUEST
                }
                QaBaseError::NotFound { .. } => StatusCode::NOT_FOUND,
                QaBaseError::InvalidTransition { .. } => StatusCode::CONFLICT,
                QaBaseError::Transcription(_) => StatusCode::UNPROCESSABLE_ENTITY,
                QaBaseError::Ingest(_) => StatusCode::BAD_GATEWAY,
                QaBaseError::Config { .. }
                | QaBaseError::Storage(_)
                | QaBaseError::Io { .. }
                | QaBaseError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::UnknownId(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Rejected { status, .. } => *status,
            Self::VoiceDisabled => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Internal causes go to the log only.
        let detail = if status.is_server_error() && !matches!(self, Self::VoiceDisabled) {
            error!(error = %self, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qabase_shared::Status;

    #[test]
    fn domain_errors_map_to_status_codes() {
        let cases = [
            (QaBaseError::validation("blank"), StatusCode::BAD_REQUEST),
            (QaBaseError::invalid_argument("status"), StatusCode::BAD_REQUEST),
            (QaBaseError::not_found("x"), StatusCode::NOT_FOUND),
            (
                QaBaseError::invalid_transition(Status::Rejected, "approve", "not pending"),
                StatusCode::CONFLICT,
            ),
            (
                QaBaseError::Transcription("no answer".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (QaBaseError::Ingest("timeout".into()), StatusCode::BAD_GATEWAY),
            (
                QaBaseError::Storage("disk".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status_code(), expected);
        }
        assert_eq!(
            ApiError::UnknownId("abc".into()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    async fn body_detail(err: ApiError) -> (StatusCode, String) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        (status, body["detail"].as_str().expect("detail").to_string())
    }

    #[tokio::test]
    async fn internal_details_are_not_returned() {
        let err = ApiError::from(QaBaseError::Storage("table qa_entries is locked".into()));
        assert!(err.to_string().contains("qa_entries"));

        let (status, detail) = body_detail(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(detail, "internal server error");
    }

    #[tokio::test]
    async fn client_errors_keep_their_detail() {
        let (status, detail) = body_detail(QaBaseError::validation("question is blank").into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(detail.contains("question is blank"));

        let (status, detail) = body_detail(ApiError::VoiceDisabled).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(detail, "voice intake is not configured");
    }
}
