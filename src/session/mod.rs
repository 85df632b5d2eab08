//! # Session Module
//!
//! Cookie-backed persistence of the signed session artifact and the two
//! bearer credentials, plus the navigation seam logout relies on.

pub mod cookies;
pub mod manager;
pub mod navigator;

pub use cookies::{CookieBackend, CookieError, CookieName, CookieStore, FileCookieBackend, MemoryCookieBackend};
pub use manager::SessionManager;
pub use navigator::{History, LOGIN_PATH, Navigator};
