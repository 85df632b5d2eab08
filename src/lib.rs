//! # Finvio Client
//!
//! Session layer of the Finvio invoicing client.
//!
//! ## Architecture
//! - `auth`: session payload types, the signed artifact codec, auth state and route guard
//! - `session`: cookie store, session manager and navigation seam
//! - `http`: transport, failure classification and the refresh-intercepting client
//! - `api`: login and registration exchanges
//! - `app`: one-stop wiring of all of the above
//! - `config`: environment configuration

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod http;
pub mod session;

pub use app::AppState;
pub use auth::{AuthContext, AuthData, AuthState, GuardDecision, Route, RouteGuard, TokenCodec};
pub use config::Config;
pub use http::{ApiClient, ApiError};
pub use session::{CookieName, CookieStore, SessionManager};
