//! # HTTP Module
//!
//! Transport seam, request model, failure classification and the
//! refresh-intercepting API client.

pub mod client;
pub mod error;
pub mod request;
pub mod transport;

pub use client::{ApiClient, MAX_RETRIES, REFRESH_PATH, RefreshPhase};
pub use error::{ApiError, GENERIC_ERROR_MESSAGE, NETWORK_ERROR_MESSAGE};
pub use request::{ApiRequest, MultipartForm, RequestBody};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};
