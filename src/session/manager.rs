//! Session Manager
//!
//! Composes the artifact codec and the cookie store into login, logout and
//! current-user operations. It is the only writer of the session cookies and
//! publishes every session transition on the shared [`AuthState`] channel.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::auth::context::AuthState;
use crate::auth::jwt::TokenCodec;
use crate::auth::models::AuthData;
use crate::session::cookies::{parse_expiry, CookieName, CookieStore};
use crate::session::navigator::{Navigator, LOGIN_PATH};

/// Owner of the session cookies and of the in-memory auth state derived from them.
pub struct SessionManager {
    codec: TokenCodec,
    cookies: CookieStore,
    navigator: Arc<dyn Navigator>,
    state: watch::Sender<AuthState>,
}

fn expiry(field: &str, value: &str) -> Option<DateTime<Utc>> {
    let parsed = parse_expiry(value);
    if parsed.is_none() {
        tracing::warn!("Unparseable {} '{}'; storing a session cookie", field, value);
    }
    parsed
}

impl SessionManager {
    /// The auth state starts as loading with no user.
    pub fn new(codec: TokenCodec, cookies: CookieStore, navigator: Arc<dyn Navigator>) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        Self {
            codec,
            cookies,
            navigator,
            state,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn cookies(&self) -> &CookieStore {
        &self.cookies
    }

    /// Watch `{user, loading}`; every login and logout below is published here.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Replace the whole auth state in one step.
    pub fn publish(&self, state: AuthState) {
        self.state.send_replace(state);
    }

    /// Edit the auth state in place, notifying watchers.
    pub fn update_state(&self, f: impl FnOnce(&mut AuthState)) {
        self.state.send_modify(f);
    }

    fn clear_user(&self) {
        self.state.send_if_modified(|s| s.user.take().is_some());
    }

    /// Persist a freshly authenticated session. A no-op when no signing secret is configured.
    pub fn login_cookie(&self, data: &AuthData) {
        let Some(artifact) = self.codec.encode(data) else {
            return;
        };

        let refresh_expires = expiry("refresh_token_expires_at", &data.refresh_token_expires_at);
        let access_expires = expiry("access_token_expires_at", &data.access_token_expires_at);

        self.cookies.set(CookieName::Auth, &artifact, refresh_expires);
        self.cookies.set(CookieName::RefreshToken, &data.refresh_token, refresh_expires);
        self.cookies.set(CookieName::Token, &data.access_token, access_expires);
        self.update_state(|s| s.user = Some(data.clone()));

        tracing::info!("Session stored for user id={}", data.id);
    }

    /// Clear every session cookie and the in-memory user, then navigate to the login entry point.
    pub fn logout_cookie(&self) {
        self.clear_session_cookies();
        self.clear_user();
        tracing::info!("Session cleared");
        self.navigator.assign(LOGIN_PATH);
    }

    /// Decode the `auth` cookie. An invalid or expired artifact clears all session cookies.
    pub fn get_user(&self) -> Option<AuthData> {
        let artifact = self.cookies.get(CookieName::Auth)?;

        if let Some(user) = self.codec.decode(&artifact) {
            return Some(user);
        }

        tracing::warn!("Discarding invalid session artifact");
        self.clear_session_cookies();
        self.clear_user();
        None
    }

    pub fn get_cookie(&self, name: CookieName) -> Option<String> {
        self.cookies.get(name)
    }

    /// Write a single session cookie; `expires_at` is an ISO-8601 string.
    pub fn set_cookie(&self, name: CookieName, value: &str, expires_at: Option<&str>) {
        let expires = expires_at.and_then(|v| expiry(name.as_str(), v));
        self.cookies.set(name, value, expires);
    }

    pub fn delete_cookie(&self, name: CookieName) {
        self.cookies.delete(name);
    }

    fn clear_session_cookies(&self) {
        for name in CookieName::ALL {
            self.cookies.delete(name);
        }
    }
}
