//! Credential store.
//!
//! A [`SessionContext`] is a cheap, cloneable handle on the current login.
//! It is created once per client and passed explicitly to everything that
//! needs the bearer token. Token and email live in one [`Credentials`]
//! value, so they are installed and cleared together.

use std::sync::{Arc, PoisonError, RwLock};

/// Credentials for an authenticated user.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub email: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("email", &self.email)
            .finish()
    }
}

/// Snapshot of the session state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    credentials: Option<Credentials>,
}

impl Session {
    #[must_use]
    pub fn authenticated(token: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            credentials: Some(Credentials {
                token: token.into(),
                email: email.into(),
            }),
        }
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.token.as_str())
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.email.as_str())
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    #[must_use]
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }
}

/// Shared handle on the process-wide session.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    inner: Arc<RwLock<Session>>,
}

impl SessionContext {
    /// Empty (logged-out) context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Context seeded with an existing session.
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        Self {
            inner: Arc::new(RwLock::new(session)),
        }
    }

    /// Install credentials after a successful login or registration.
    pub fn install(&self, session: Session) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = session;
    }

    /// Forget the current credentials.
    pub fn clear(&self) {
        self.install(Session::default());
    }

    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.snapshot().token().map(str::to_string)
    }

    #[must_use]
    pub fn email(&self) -> Option<String> {
        self.snapshot().email().map(str::to_string)
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.snapshot().is_authenticated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_and_clear_move_together() {
        let ctx = SessionContext::new();
        assert!(!ctx.is_authenticated());
        assert!(ctx.token().is_none() && ctx.email().is_none());

        ctx.install(Session::authenticated("tok", "a@b.io"));
        assert_eq!(ctx.token().as_deref(), Some("tok"));
        assert_eq!(ctx.email().as_deref(), Some("a@b.io"));

        ctx.clear();
        assert!(ctx.token().is_none() && ctx.email().is_none());
    }

    #[test]
    fn test_clones_share_state() {
        let ctx = SessionContext::new();
        let other = ctx.clone();
        ctx.install(Session::authenticated("tok", "a@b.io"));
        assert!(other.is_authenticated());
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = Session::authenticated("secret-token", "a@b.io");
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("a@b.io"));
    }
}
