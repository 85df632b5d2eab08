//! # Authentication Module
//!
//! Session payload types, the signed session artifact codec, the process-wide
//! auth state and the route guard that reads it.

pub mod context;
pub mod guard;
pub mod jwt;
pub mod models;

pub use context::{AuthContext, AuthState};
pub use guard::{GuardDecision, Route, RouteGuard};
pub use jwt::TokenCodec;
pub use models::{ApiResponse, AuthData, LoginRequest, RegisterForm};
