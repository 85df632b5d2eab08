//! Auth Context
//!
//! Process-wide `{user, loading}` state published over a `watch` channel so
//! both fields always change together.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::auth::models::AuthData;
use crate::session::SessionManager;

/// Who is logged in, and whether that is still being determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<AuthData>,
    pub loading: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }
}

/// Process-wide auth state for the UI layer.
///
/// The `{user, loading}` channel lives in the [`SessionManager`], so logins and
/// logouts performed anywhere (including a forced logout by the API client)
/// reach every subscriber.
pub struct AuthContext {
    session: Arc<SessionManager>,
}

impl AuthContext {
    /// Starts in the loading state with no user.
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Receiver that observes `user` and `loading` changing together.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.session.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AuthState {
        self.session.state()
    }

    pub fn user(&self) -> Option<AuthData> {
        self.state().user
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    /// Run the initial "who is logged in" check on a background task.
    pub fn activate(self: &Arc<Self>) -> JoinHandle<()> {
        let context = Arc::clone(self);
        tokio::spawn(async move { context.check_current_user() })
    }

    /// Resolve the user from the `auth` cookie and leave the loading state.
    pub fn check_current_user(&self) {
        self.session.update_state(|s| s.loading = true);
        let user = self.session.get_user();
        tracing::debug!("Current user resolved: logged_in={}", user.is_some());
        self.session.publish(AuthState { user, loading: false });
    }

    /// Persist the session first, then publish the user.
    pub fn login(&self, data: AuthData) {
        self.session.login_cookie(&data);
        self.set_user(Some(data));
    }

    /// Clear the session; the user is unpublished along with the cookies.
    pub fn logout(&self) {
        self.session.logout_cookie();
    }

    pub fn set_user(&self, user: Option<AuthData>) {
        self.session.update_state(|s| s.user = user);
    }
}
