//! Process-wide authentication state.
//!
//! The current [`Session`] is swapped as a whole on every transition, so a
//! reader always sees a consistent token/user pair without taking a lock.
//! Nothing is persisted: every process starts logged out.

use arc_swap::ArcSwap;
use std::sync::Arc;

use crate::models::User;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    token: Option<String>,
    user: Option<User>,
}

impl Session {
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// The logged-in user. Never reported without a token.
    pub fn user(&self) -> Option<&User> {
        self.token.as_ref().and(self.user.as_ref())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

#[derive(Debug, Default)]
pub struct SessionStore {
    current: ArcSwap<Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or replace) a session.
    pub fn login(&self, token: impl Into<String>, user: User) {
        tracing::info!(user_id = user.id, "Session started");
        self.current.store(Arc::new(Session {
            token: Some(token.into()),
            user: Some(user),
        }));
    }

    /// Replace the user, keeping the token. Used after a profile re-fetch.
    pub fn set_user(&self, user: User) {
        tracing::debug!(user_id = user.id, "Session user updated");
        self.current.rcu(|current| Session {
            token: current.token.clone(),
            user: Some(user.clone()),
        });
    }

    pub fn logout(&self) {
        tracing::info!("Session cleared");
        self.current.store(Arc::new(Session::default()));
    }

    pub fn current(&self) -> Arc<Session> {
        self.current.load_full()
    }

    pub fn token(&self) -> Option<String> {
        self.current.load().token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.current.load().user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.load().is_authenticated()
    }
}
