//! Route Guard
//!
//! Maps paths onto the application's routes and decides whether a protected
//! route may render, must wait, or must redirect to login.

use std::sync::Arc;

use tokio::sync::watch;

use crate::auth::context::{AuthContext, AuthState};
use crate::auth::models::AuthData;
use crate::session::{Navigator, LOGIN_PATH};

/// Screens of the client application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Invoices,
    Invoice { id: String },
    Profile,
}

impl Route {
    /// Match a location path (query and fragment ignored); unknown paths yield `None`.
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Some(Route::Invoices),
            ["login"] => Some(Route::Login),
            ["register"] => Some(Route::Register),
            ["profile"] => Some(Route::Profile),
            ["invoice", id] => Some(Route::Invoice { id: id.to_string() }),
            _ => None,
        }
    }

    /// Canonical path of this route.
    pub fn path(&self) -> String {
        match self {
            Route::Login => LOGIN_PATH.to_string(),
            Route::Register => "/register".to_string(),
            Route::Invoices => "/".to_string(),
            Route::Invoice { id } => format!("/invoice/{id}"),
            Route::Profile => "/profile".to_string(),
        }
    }

    /// Everything except the login and registration screens is protected.
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::Login | Route::Register)
    }
}

/// What to show for a requested path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session check still running; render a neutral placeholder.
    Pending,
    Redirect(String),
    /// Render the route; carries the user for protected routes.
    Render { route: Route, user: Option<AuthData> },
    NotFound,
}

/// Gate in front of protected routes.
///
/// Anonymous viewers are sent to the login screen by replacing the current
/// history entry, so the protected page leaves nothing to go back to.
pub struct RouteGuard {
    state: watch::Receiver<AuthState>,
    navigator: Arc<dyn Navigator>,
}

impl RouteGuard {
    /// Subscribe to `context` and redirect through `navigator`.
    pub fn new(context: &AuthContext, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            state: context.subscribe(),
            navigator,
        }
    }

    fn decide(&self, route: Route, state: &AuthState) -> GuardDecision {
        if !route.requires_auth() {
            return GuardDecision::Render { route, user: state.user.clone() };
        }
        if state.loading {
            return GuardDecision::Pending;
        }
        match &state.user {
            Some(user) => GuardDecision::Render {
                route,
                user: Some(user.clone()),
            },
            None => {
                tracing::debug!("Unauthenticated access to {}, redirecting", route.path());
                self.navigator.replace(LOGIN_PATH);
                GuardDecision::Redirect(LOGIN_PATH.to_string())
            }
        }
    }

    /// Decide from the current state without waiting.
    pub fn evaluate(&self, path: &str) -> GuardDecision {
        let Some(route) = Route::parse(path) else {
            return GuardDecision::NotFound;
        };
        let state = self.state.borrow().clone();
        self.decide(route, &state)
    }

    /// Wait for the session check to finish, then decide.
    pub async fn resolve(&mut self, path: &str) -> GuardDecision {
        let Some(route) = Route::parse(path) else {
            return GuardDecision::NotFound;
        };
        if !route.requires_auth() {
            return self.evaluate(path);
        }

        let state = match self.state.wait_for(|s| !s.loading).await {
            Ok(state) => state.clone(),
            Err(_) => return GuardDecision::Pending,
        };
        self.decide(route, &state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_route_surface() {
        assert_eq!(Route::parse("/"), Some(Route::Invoices));
        assert_eq!(Route::parse("/login"), Some(Route::Login));
        assert_eq!(Route::parse("/register/"), Some(Route::Register));
        assert_eq!(Route::parse("/profile?tab=1"), Some(Route::Profile));
        assert_eq!(
            Route::parse("/invoice/RT3080"),
            Some(Route::Invoice { id: "RT3080".into() })
        );
        assert_eq!(Route::parse("/invoice"), None);
        assert_eq!(Route::parse("/settings"), None);
    }

    #[test]
    fn only_auth_screens_are_public() {
        assert!(!Route::Login.requires_auth());
        assert!(!Route::Register.requires_auth());
        assert!(Route::Invoices.requires_auth());
        assert!(Route::Profile.requires_auth());
        assert_eq!(Route::Invoice { id: "x".into() }.path(), "/invoice/x");
    }
}
