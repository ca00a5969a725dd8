use std::fmt;

use crate::models::User;

/// Coarse session status, used by front-ends to pick a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Restoring,
    Unauthenticated,
    Authenticated,
}

/// In-memory session.
///
/// A token and user only exist together, in `Authenticated`.
#[derive(Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Process start, until persisted credentials have been read
    Restoring,
    Unauthenticated,
    Authenticated { token: String, user: User },
}

impl SessionState {
    pub fn status(&self) -> AuthStatus {
        match self {
            SessionState::Restoring => AuthStatus::Restoring,
            SessionState::Unauthenticated => AuthStatus::Unauthenticated,
            SessionState::Authenticated { .. } => AuthStatus::Authenticated,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }

    /// True only while the initial restore is running
    pub fn loading(&self) -> bool {
        matches!(self, SessionState::Restoring)
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            SessionState::Authenticated { token, .. } => Some(token),
            _ => None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Restoring => f.write_str("Restoring"),
            SessionState::Unauthenticated => f.write_str("Unauthenticated"),
            SessionState::Authenticated { user, .. } => f
                .debug_struct("Authenticated")
                .field("token", &"<redacted>")
                .field("user", user)
                .finish(),
        }
    }
}
