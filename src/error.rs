use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::config;

#[derive(Error, Debug)]
pub enum ApiError {
    // Session errors
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Invalid Discord token")]
    InvalidToken,

    // OAuth errors
    #[error("Invalid code")]
    InvalidCode,

    // Authorization errors
    #[error("Guild not found or no access")]
    GuildNotFound,

    #[error("Insufficient permissions")]
    Forbidden,

    // Rate limiting
    #[error("Appearance was updated recently, try again in {retry_after_secs} seconds")]
    CooldownActive { retry_after_secs: u64 },

    // Upstream errors (Discord or the bot backend)
    #[error("{message}")]
    Upstream { status: u16, message: String },

    // Generic errors
    #[error("Internal server error")]
    Internal { detail: String },
}

impl ApiError {
    pub fn internal(detail: impl ToString) -> Self {
        ApiError::Internal {
            detail: detail.to_string(),
        }
    }

    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        ApiError::Upstream {
            status,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotAuthenticated | ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::InvalidCode => StatusCode::BAD_REQUEST,
            ApiError::GuildNotFound => StatusCode::NOT_FOUND,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::CooldownActive { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ApiError::Forbidden => json!({
                "error": "Insufficient permissions",
                "required": "Manage Server or Administrator",
            }),
            ApiError::CooldownActive { retry_after_secs } => json!({
                "error": self.to_string(),
                "retryAfter": retry_after_secs,
            }),
            // Error detail is only exposed outside production
            ApiError::Internal { detail } => {
                let mut body = json!({ "error": "Internal server error" });
                if config::development_mode() {
                    body["details"] = json!(detail);
                }
                body
            }
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::internal(err)
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::NotAuthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::InvalidCode.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::GuildNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::CooldownActive { retry_after_secs: 12 }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::internal("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upstream_relays_backend_status() {
        assert_eq!(
            ApiError::upstream(402, "Premium required").status_code(),
            StatusCode::PAYMENT_REQUIRED
        );
        // Out-of-range status falls back to 500
        assert_eq!(
            ApiError::upstream(7, "bad").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upstream_message_display() {
        let err = ApiError::upstream(503, "Failed to update appearance");
        assert_eq!(err.to_string(), "Failed to update appearance");
    }
}
