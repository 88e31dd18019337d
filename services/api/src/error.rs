//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service, and the mapping
//! of session failures onto HTTP responses.

use crate::config::ConfigError;
use aura_core::{PortError, SessionError};
use axum::http::StatusCode;
use tracing::error;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// The session could not be restored at startup.
    #[error("Session Error: {0}")]
    Session(#[from] SessionError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents an error from the outbound HTTP client.
    #[error("HTTP Client Error: {0}")]
    Http(#[from] reqwest::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// The response body handlers send for a failed session operation.
pub type HandlerError = (StatusCode, String);

/// Maps a session failure to a status code and a message fit for the end user.
pub fn session_error(err: SessionError) -> HandlerError {
    let status = match &err {
        SessionError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        SessionError::InvalidSelection { .. }
        | SessionError::EmptySelection
        | SessionError::EmptyFeedback
        | SessionError::InvalidRating(_) => StatusCode::BAD_REQUEST,
        SessionError::ReviewNotFound { .. }
        | SessionError::ItemNotFound(_)
        | SessionError::PurchaseNotFound(_) => StatusCode::NOT_FOUND,
        SessionError::PaymentRejected(_) => StatusCode::PAYMENT_REQUIRED,
        SessionError::Persistence(e) => {
            error!("Session persistence failed: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            );
        }
    };
    (status, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_errors_keep_their_message() {
        let (status, message) = session_error(SessionError::EmptyFeedback);

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Please provide a rating or a comment to submit.");
    }

    #[test]
    fn payment_reason_is_passed_through() {
        let (status, message) = session_error(SessionError::PaymentRejected("Card declined".to_string()));

        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(message, "Card declined");
    }

    #[test]
    fn persistence_details_stay_internal() {
        let err = SessionError::Persistence(PortError::Unexpected("disk /var/lib full".to_string()));

        let (status, message) = session_error(err);

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!message.contains("/var/lib"));
    }

    #[test]
    fn missing_profile_is_unauthorized() {
        assert_eq!(session_error(SessionError::NotAuthenticated).0, StatusCode::UNAUTHORIZED);
    }
}
