use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Quota exhausted")]
    QuotaExhausted,

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Failure talking to the completion provider or understanding its answer.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("provider request failed: {0}")]
    Provider(#[from] reqwest::Error),

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider response has no content")]
    EmptyContent,

    #[error("malformed challenge: {0}")]
    Parse(#[from] ParseError),
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected shape: {0}")]
    Schema(String),
}

impl GenerationError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::Provider(_) => "provider",
            GenerationError::Status { .. } => "status",
            GenerationError::EmptyContent => "empty_content",
            GenerationError::Parse(_) => "parse",
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::QuotaExhausted => StatusCode::TOO_MANY_REQUESTS,
            AppError::Database(_) | AppError::Generation(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                "Database error"
            }
            AppError::Auth(ref msg) => msg.as_str(),
            AppError::Validation(ref msg) => msg.as_str(),
            AppError::QuotaExhausted => "Quota exhausted",
            AppError::Generation(ref e) => {
                tracing::error!("Generation error: {}", e);
                "Error generating challenge with AI"
            }
            AppError::Internal(ref e) => {
                tracing::error!("Internal error: {:#}", e);
                "Internal server error"
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::Auth("nope".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::QuotaExhausted.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            AppError::Generation(GenerationError::EmptyContent).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_generation_detail_not_leaked() {
        let error = AppError::Generation(GenerationError::Status {
            status: 401,
            body: "invalid api key sk-secret".to_string(),
        });

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Error generating challenge with AI");
        assert!(!bytes.windows(9).any(|w| w == b"sk-secret"));
    }

    #[test]
    fn test_parse_error_is_generation_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: GenerationError = ParseError::from(json_err).into();
        assert_eq!(error.kind(), "parse");
    }
}
