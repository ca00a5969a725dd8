//! Screen selection driven by session state.
//!
//! The session manager only publishes state; this is the one place that
//! decides where the user goes next.

use drdrive_core::auth::{AuthStatus, SessionState};
use tokio::sync::watch;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Shown while stored credentials are being read
    Splash,
    SignIn,
    Home,
}

impl Screen {
    pub fn for_state(state: &SessionState) -> Self {
        match state.status() {
            AuthStatus::Restoring => Screen::Splash,
            AuthStatus::Unauthenticated => Screen::SignIn,
            AuthStatus::Authenticated => Screen::Home,
        }
    }
}

/// Follows the session's watch channel and reports screen changes.
pub struct Navigator {
    rx: watch::Receiver<SessionState>,
    current: Screen,
}

impl Navigator {
    pub fn new(mut rx: watch::Receiver<SessionState>) -> Self {
        let current = Screen::for_state(&rx.borrow_and_update());
        Self { rx, current }
    }

    pub fn current(&self) -> Screen {
        self.current
    }

    /// Wait for the startup restore to finish, then land on its screen
    pub async fn wait_until_restored(&mut self) -> Screen {
        let screen = match self.rx.wait_for(|state| !state.loading()).await {
            Ok(state) => Screen::for_state(&state),
            // Manager gone; nothing more will be published
            Err(_) => self.current,
        };
        self.go(screen);
        screen
    }

    /// Pick up a transition published since the last call, if it moved screens
    pub fn poll(&mut self) -> Option<Screen> {
        if !self.rx.has_changed().unwrap_or(false) {
            return None;
        }
        let screen = Screen::for_state(&self.rx.borrow_and_update());
        if screen == self.current {
            return None;
        }
        self.go(screen);
        Some(screen)
    }

    fn go(&mut self, screen: Screen) {
        if screen != self.current {
            info!(from = ?self.current, to = ?screen, "Navigating");
        }
        self.current = screen;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticated() -> SessionState {
        SessionState::Authenticated {
            token: "T1".into(),
            user: serde_json::from_str(r#"{"id":1,"username":"alice"}"#).unwrap(),
        }
    }

    #[test]
    fn test_screen_for_state() {
        assert_eq!(Screen::for_state(&SessionState::Restoring), Screen::Splash);
        assert_eq!(Screen::for_state(&SessionState::Unauthenticated), Screen::SignIn);
        assert_eq!(Screen::for_state(&authenticated()), Screen::Home);
    }

    #[tokio::test]
    async fn test_waits_for_restore() {
        let (tx, rx) = watch::channel(SessionState::Restoring);
        let mut navigator = Navigator::new(rx);
        assert_eq!(navigator.current(), Screen::Splash);

        tx.send_replace(authenticated());
        assert_eq!(navigator.wait_until_restored().await, Screen::Home);
        assert_eq!(navigator.current(), Screen::Home);
    }

    #[test]
    fn test_poll_reports_only_screen_changes() {
        let (tx, rx) = watch::channel(SessionState::Unauthenticated);
        let mut navigator = Navigator::new(rx);
        assert_eq!(navigator.poll(), None);

        tx.send_replace(authenticated());
        assert_eq!(navigator.poll(), Some(Screen::Home));
        assert_eq!(navigator.poll(), None);

        // Re-authenticating keeps the user on the same screen
        tx.send_replace(authenticated());
        assert_eq!(navigator.poll(), None);

        tx.send_replace(SessionState::Unauthenticated);
        assert_eq!(navigator.poll(), Some(Screen::SignIn));
    }
}
