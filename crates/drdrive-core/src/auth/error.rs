use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum SessionError {
    /// Backend call failed. `message` is what the user sees: the backend's own
    /// message when it sent one, otherwise a generic one for the operation.
    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        source: ApiError,
    },

    #[error("Failed to save session: {0:#}")]
    Storage(anyhow::Error),

    #[error("Another account request is still in progress")]
    Busy,

    #[error("You need to sign in first")]
    NotAuthenticated,

    #[error("{0}")]
    InvalidInput(String),
}

impl SessionError {
    pub(crate) fn failed(source: ApiError, fallback: &str) -> Self {
        let message = source
            .backend_message()
            .unwrap_or(fallback)
            .to_string();
        SessionError::Failed { message, source }
    }

    /// The backend answered 401 to an authenticated request
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SessionError::Failed { source, .. } if source.is_unauthorized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_failed_prefers_backend_message() {
        let err = SessionError::failed(
            ApiError::Unsuccessful(Some("bad credentials".into())),
            "Login failed",
        );
        assert_eq!(err.to_string(), "bad credentials");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_failed_falls_back_to_generic() {
        let err = SessionError::failed(
            ApiError::InvalidResponse("not json".into()),
            "Registration failed",
        );
        assert_eq!(err.to_string(), "Registration failed");
    }

    #[test]
    fn test_unauthorized_detection() {
        let err = SessionError::failed(
            ApiError::Rejected { status: 401, message: None },
            "Failed to update profile",
        );
        assert!(err.is_unauthorized());
        assert!(!SessionError::Busy.is_unauthorized());
    }
}
