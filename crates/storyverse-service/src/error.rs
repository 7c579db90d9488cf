//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden - valid credentials but insufficient permissions.
    #[error("forbidden")]
    Forbidden,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - resource already exists or invalid state transition.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Not enough coins for a debit.
    #[error("insufficient coins: available={available}, required={required}")]
    InsufficientCoins {
        /// Current balance.
        available: i64,
        /// Coins the operation needed.
        required: i64,
    },

    /// The requested chapter is behind the paywall.
    #[error("chapter {chapter} locked: required={required}, available={available}")]
    ChapterLocked {
        /// The locked chapter position.
        chapter: u8,
        /// Coins needed to unlock it.
        required: i64,
        /// The user's current balance.
        available: i64,
    },

    /// The chapter was already unlocked for this run.
    #[error("chapter {0} already unlocked")]
    AlreadyUnlocked(u8),

    /// A refund already references this transaction.
    #[error("transaction already refunded: {0}")]
    AlreadyRefunded(String),

    /// The reward rule is missing or disabled.
    #[error("reward rule disabled or missing: {0}")]
    RuleUnavailable(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body (generic envelope).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Two bodies have fixed wire shapes consumed by the reading UI's
        // paywall flow; everything else uses the service-wide envelope.
        match &self {
            Self::InsufficientCoins {
                available,
                required,
            } => {
                return (
                    StatusCode::PAYMENT_REQUIRED,
                    Json(serde_json::json!({
                        "error": "INSUFFICIENT_COINS",
                        "available": available,
                        "required": required,
                    })),
                )
                    .into_response();
            }
            Self::ChapterLocked {
                chapter,
                required,
                available,
            } => {
                return (
                    StatusCode::FORBIDDEN,
                    Json(serde_json::json!({
                        "code": "CHAPTER_LOCKED",
                        "chapterNumber": chapter,
                        "requiredCoins": required,
                        "available": available,
                    })),
                )
                    .into_response();
            }
            _ => {}
        }

        let (status, code, message) = match &self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", self.to_string()),
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden", self.to_string()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            Self::AlreadyUnlocked(chapter) => (
                StatusCode::CONFLICT,
                "already_unlocked",
                format!("Chapter {chapter} is already unlocked"),
            ),
            Self::AlreadyRefunded(id) => (
                StatusCode::CONFLICT,
                "already_refunded",
                format!("Transaction {id} was already refunded"),
            ),
            Self::RuleUnavailable(key) => (
                StatusCode::CONFLICT,
                "rule_unavailable",
                format!("Reward rule {key} is disabled or missing"),
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            Self::InsufficientCoins { .. } | Self::ChapterLocked { .. } => unreachable!(),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<storyverse_store::StoreError> for ApiError {
    fn from(err: storyverse_store::StoreError) -> Self {
        use storyverse_store::StoreError;

        match err {
            StoreError::NotFound { entity, id } => Self::NotFound(format!("{entity} not found: {id}")),
            StoreError::InsufficientCoins {
                available,
                required,
            } => Self::InsufficientCoins {
                available,
                required,
            },
            StoreError::AlreadyUnlocked { chapter } => Self::AlreadyUnlocked(chapter),
            StoreError::AlreadyRefunded { transaction_id } => Self::AlreadyRefunded(transaction_id),
            StoreError::RuleUnavailable { key } => Self::RuleUnavailable(key),
            StoreError::InvalidAmount(msg) => Self::BadRequest(msg),
            StoreError::Database(msg) | StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}
