//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `SessionState`: who is signed in, published on a watch channel
//! - `SessionManager`: restore, sign in, sign up, sign out and profile updates
//! - `SessionError`: what a front-end shows the user when one of those fails
//!
//! The token and user are persisted under the `auth_token` and `user` keys of
//! a `KeyValueStore`. Tokens are never expired client-side.

pub mod error;
pub mod manager;
pub mod session;

pub use error::SessionError;
pub use manager::{SessionManager, TOKEN_KEY, USER_KEY};
pub use session::{AuthStatus, SessionState};
