//! Session lifecycle: restore at startup, sign in, sign up, sign out.
//!
//! The manager is the single owner of the session. It persists the token and
//! user before publishing a new state, so anything that observes
//! `Authenticated` can rely on the credentials surviving a restart.
//! Front-ends subscribe to state changes and navigate on their own.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::{watch, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::api::{ApiClient, AuthSuccess};
use crate::models::{Diagnosis, DiagnosisRequest, ProfileForm, Registration, User};
use crate::storage::KeyValueStore;

use super::{SessionError, SessionState};

/// Storage key for the raw bearer token
pub const TOKEN_KEY: &str = "auth_token";

/// Storage key for the JSON-serialized user
pub const USER_KEY: &str = "user";

const LOGIN_FAILED: &str = "Login failed";
const REGISTRATION_FAILED: &str = "Registration failed";
const PROFILE_UPDATE_FAILED: &str = "Failed to update profile";
const DIAGNOSIS_FAILED: &str = "Error processing problem. Please try again.";
const EMPTY_DIAGNOSIS: &str = "Please describe your problem or upload media";

pub struct SessionManager {
    api: ApiClient,
    store: Arc<dyn KeyValueStore>,
    state: watch::Sender<SessionState>,
    /// Held for the duration of any operation that changes the session
    in_flight: Mutex<()>,
}

impl SessionManager {
    /// Create a manager in the `Restoring` state. Call `restore` next.
    pub fn new(api: ApiClient, store: Arc<dyn KeyValueStore>) -> Self {
        let (state, _) = watch::channel(SessionState::Restoring);
        Self {
            api,
            store,
            state,
            in_flight: Mutex::new(()),
        }
    }

    // =========================================================================
    // State access
    // =========================================================================

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver that sees every published state, starting with the current one
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    /// Client bound to the current token, for authenticated endpoints
    pub fn authorized_client(&self) -> Result<ApiClient, SessionError> {
        match self.state.borrow().token() {
            Some(token) => Ok(self.api.with_token(token.to_string())),
            None => Err(SessionError::NotAuthenticated),
        }
    }

    fn publish(&self, next: SessionState) {
        let previous = self.state.send_replace(next);
        debug!(
            from = ?previous.status(),
            to = ?self.state.borrow().status(),
            "Session state changed"
        );
    }

    /// Claim the operation slot, or fail fast if another operation holds it
    fn begin(&self) -> Result<MutexGuard<'_, ()>, SessionError> {
        self.in_flight.try_lock().map_err(|_| {
            warn!("Rejected session operation: another one is in flight");
            SessionError::Busy
        })
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Load persisted credentials. Never fails: anything unreadable means
    /// there is no session to restore.
    pub async fn restore(&self) -> SessionState {
        let _guard = self.in_flight.lock().await;

        let restored = match self.read_persisted() {
            Ok(Some((token, user))) => {
                info!(user_id = user.id, "Restored session");
                SessionState::Authenticated { token, user }
            }
            Ok(None) => {
                debug!("No stored session");
                SessionState::Unauthenticated
            }
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Failed to load stored session");
                SessionState::Unauthenticated
            }
        };

        self.publish(restored.clone());
        restored
    }

    pub async fn sign_in(&self, username: &str, password: &str) -> Result<SessionState, SessionError> {
        let _guard = self.begin()?;

        let auth = self.api.login(username, password).await.map_err(|e| {
            warn!(error = %e, "Sign in failed");
            SessionError::failed(e, LOGIN_FAILED)
        })?;

        self.commit(auth)
    }

    /// Register a new account. Success signs the user in, like `sign_in`.
    pub async fn sign_up(&self, registration: &Registration) -> Result<SessionState, SessionError> {
        let _guard = self.begin()?;

        let body = registration.to_request();
        let auth = self.api.register(&body).await.map_err(|e| {
            warn!(error = %e, "Sign up failed");
            SessionError::failed(e, REGISTRATION_FAILED)
        })?;

        self.commit(auth)
    }

    /// Forget the session. Storage failures are logged and skipped so that
    /// signing out always succeeds from the caller's point of view.
    pub async fn sign_out(&self) -> SessionState {
        let _guard = self.in_flight.lock().await;

        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.store.remove(key) {
                warn!(key = key, error = %format!("{:#}", e), "Failed to clear stored session value");
            }
        }

        self.publish(SessionState::Unauthenticated);
        info!("Signed out");
        SessionState::Unauthenticated
    }

    // =========================================================================
    // Authenticated operations
    // =========================================================================

    /// Save profile edits. The stored user is updated with the edited fields
    /// and a token rotated by the backend replaces the current one. If that
    /// cannot be persisted the rotated token is lost and the session keeps
    /// the old one.
    pub async fn update_profile(&self, form: &ProfileForm) -> Result<User, SessionError> {
        let _guard = self.begin()?;

        let (token, mut user) = match self.state() {
            SessionState::Authenticated { token, user } => (token, user),
            _ => return Err(SessionError::NotAuthenticated),
        };

        let update = form.to_update();
        let updated = self
            .api
            .with_token(token.clone())
            .update_profile(&update)
            .await
            .map_err(|e| {
                warn!(error = %e, "Profile update failed");
                SessionError::failed(e, PROFILE_UPDATE_FAILED)
            })?;

        let rotated = updated.token.is_some();
        if rotated {
            debug!("Backend issued a new token with the profile update");
        }
        user.apply(&update);
        let token = updated.token.unwrap_or(token);

        self.commit(AuthSuccess {
            token,
            user: user.clone(),
        })
        .map_err(|e| {
            if rotated {
                warn!("Dropped the token issued by the profile update; the stored token may be rejected");
            }
            e
        })?;
        Ok(user)
    }

    /// Send a problem description and/or photo for diagnosis
    pub async fn diagnose(&self, request: &DiagnosisRequest) -> Result<Diagnosis, SessionError> {
        if request.is_empty() {
            return Err(SessionError::InvalidInput(EMPTY_DIAGNOSIS.to_string()));
        }

        self.authorized_client()?
            .generate(request)
            .await
            .map_err(|e| {
                warn!(error = %e, "Diagnosis request failed");
                SessionError::failed(e, DIAGNOSIS_FAILED)
            })
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Persist, then publish. Nothing is published if persisting fails.
    fn commit(&self, auth: AuthSuccess) -> Result<SessionState, SessionError> {
        self.persist(&auth.token, &auth.user)
            .map_err(SessionError::Storage)?;

        info!(user_id = auth.user.id, "Signed in");
        let state = SessionState::Authenticated {
            token: auth.token,
            user: auth.user,
        };
        self.publish(state.clone());
        Ok(state)
    }

    /// Write token and user together. If the user write fails the previous
    /// token is put back, so storage never pairs a new token with an old user.
    /// Nothing is written when the previous token cannot be read.
    fn persist(&self, token: &str, user: &User) -> anyhow::Result<()> {
        let user_json = serde_json::to_string(user).context("Failed to serialize user")?;
        let previous_token = self
            .store
            .get(TOKEN_KEY)
            .context("Failed to read stored token")?;

        self.store.set(TOKEN_KEY, token)?;

        if let Err(e) = self.store.set(USER_KEY, &user_json) {
            let rollback = match previous_token {
                Some(ref previous) => self.store.set(TOKEN_KEY, previous),
                None => self.store.remove(TOKEN_KEY),
            };
            if let Err(rollback_err) = rollback {
                warn!(error = %format!("{:#}", rollback_err), "Failed to roll back stored token");
            }
            return Err(e);
        }

        Ok(())
    }

    fn read_persisted(&self) -> anyhow::Result<Option<(String, User)>> {
        let token = self.store.get(TOKEN_KEY)?;
        let user = self.store.get(USER_KEY)?;

        match (token, user) {
            (Some(token), Some(user)) if !token.is_empty() => {
                let user: User = serde_json::from_str(&user).context("Failed to parse stored user")?;
                Ok(Some((token, user)))
            }
            _ => Ok(None),
        }
    }
}
