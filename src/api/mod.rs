//! Remote API exchanges built on the [`crate::http::ApiClient`].

pub mod auth;

pub use auth::{AuthApi, RegisterOutcome};
