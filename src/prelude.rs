use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid or expired access link")]
    InvalidAccess,

    #[error("recruiter authentication required")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("payload of {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("rate limit exceeded, please try again later")]
    RateLimited,

    #[error("AI credits exhausted, please contact support")]
    QuotaExhausted,

    #[error("AI gateway error: {0}")]
    Upstream(String),

    #[error("no transcript available for analysis")]
    MissingTranscript,

    #[error("answer was replaced by a newer recording")]
    Superseded,

    #[error("capture device unavailable: {0}")]
    Capture(String),

    #[error("email error: {0}")]
    Email(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidAccess => "ERR-BCQ-001",
            AppError::Unauthorized => "ERR-AUTH-001",
            AppError::NotFound(_) => "ERR-BCQ-404",
            AppError::BadRequest(_) => "ERR-BCQ-002",
            AppError::Upload(_) => "ERR-S3-002",
            AppError::Storage(_) => "ERR-S3-001",
            AppError::PayloadTooLarge { .. } => "ERR-AI-413",
            AppError::RateLimited => "ERR-AI-429",
            AppError::QuotaExhausted => "ERR-AI-402",
            AppError::Upstream(_) => "ERR-AI-002",
            AppError::MissingTranscript => "ERR-AI-003",
            AppError::Superseded => "ERR-BCQ-409",
            AppError::Capture(_) => "ERR-REC-001",
            AppError::Email(_) => "ERR-MAIL-001",
            AppError::Config(_) => "ERR-CONF-001",
            AppError::Database(_) | AppError::Migration(_) => "ERR-DB-000",
            AppError::Io(_) => "ERR-IO-001",
            AppError::Json(_) => "ERR-JSON-001",
            AppError::Http(_) => "ERR-HTTP-001",
            AppError::Base64(_) => "ERR-BCQ-003",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidAccess => StatusCode::FORBIDDEN,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Base64(_) | AppError::MissingTranscript => {
                StatusCode::BAD_REQUEST
            }
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Superseded => StatusCode::CONFLICT,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::QuotaExhausted => StatusCode::PAYMENT_REQUIRED,
            AppError::Upstream(_) | AppError::Upload(_) | AppError::Storage(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}: {}", self.code(), &self);
        } else {
            tracing::debug!("{}: {}", self.code(), &self);
        }
        let message = match &self {
            AppError::Database(_) | AppError::Io(_) | AppError::Migration(_) => {
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        (
            status,
            Json(json!({
                "code": self.code(),
                "message": message,
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_and_rate_limit_are_distinct() {
        assert_eq!(AppError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(AppError::QuotaExhausted.status(), StatusCode::PAYMENT_REQUIRED);
        assert!(AppError::RateLimited.to_string().contains("try again later"));
        assert!(AppError::QuotaExhausted.to_string().contains("contact support"));
    }

    #[test]
    fn test_too_large_is_not_a_generic_failure() {
        let err = AppError::PayloadTooLarge { size: 11, max: 10 };
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.code(), "ERR-AI-413");
    }
}
