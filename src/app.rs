//! # App Module
//!
//! Wires the session layer, API client, auth state and route guard together
//! once per process.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::AuthApi;
use crate::auth::{AuthContext, RouteGuard, TokenCodec};
use crate::config::Config;
use crate::http::{ApiClient, ReqwestTransport, Transport};
use crate::session::{CookieBackend, CookieStore, FileCookieBackend, History, Navigator, SessionManager};

/// Client state shared across every consumer of the session
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SessionManager>,
    pub client: Arc<ApiClient>,
    pub auth: Arc<AuthContext>,
    pub auth_api: Arc<AuthApi>,
    pub navigator: Arc<dyn Navigator>,
}

impl AppState {
    /// Assemble the client from explicit collaborators.
    pub fn new(
        config: &Config,
        cookies: Arc<dyn CookieBackend>,
        transport: Arc<dyn Transport>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let codec = TokenCodec::new(config.secret_key.as_deref());
        let store = CookieStore::for_origin(cookies, &config.app_origin);
        let session = Arc::new(SessionManager::new(codec, store, navigator.clone()));
        let client = Arc::new(ApiClient::new(config.api_base_url.clone(), transport, session.clone()));
        let auth = Arc::new(AuthContext::new(session.clone()));
        let auth_api = Arc::new(AuthApi::new(client.clone(), auth.clone(), navigator.clone()));

        Self {
            session,
            client,
            auth,
            auth_api,
            navigator,
        }
    }

    /// Build the command-line client: file-backed cookies and the `reqwest` transport.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cookies = FileCookieBackend::open(&config.cookie_file)
            .with_context(|| format!("Failed to open cookie jar {}", config.cookie_file.display()))?;
        let transport = ReqwestTransport::new().context("Failed to create HTTP client")?;

        Ok(Self::new(
            config,
            Arc::new(cookies),
            Arc::new(transport),
            Arc::new(History::default()),
        ))
    }

    pub fn route_guard(&self) -> RouteGuard {
        RouteGuard::new(&self.auth, self.navigator.clone())
    }
}
