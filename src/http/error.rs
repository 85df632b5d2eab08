//! Response classification and the client error taxonomy.

use reqwest::StatusCode;
use serde_json::Value;

use crate::http::transport::{HttpResponse, TransportError};

pub const NETWORK_ERROR_MESSAGE: &str = "Network error: Please check your internet connection and try again.";
pub const GENERIC_ERROR_MESSAGE: &str = "Please try again later";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No HTTP status at all.
    #[error("Network error: Please check your internet connection and try again.")]
    Connectivity(#[source] TransportError),
    /// 500
    #[error("{0}")]
    ServerFault(String),
    /// 403
    #[error("{0}")]
    Forbidden(String),
    /// Any other non-401 failure; the body is kept as sent by the server.
    #[error("{}", rejected_message(.status, .body))]
    Rejected { status: StatusCode, body: Value },
    #[error("No refresh token available")]
    NoRefreshToken,
    #[error("Token refresh failed")]
    RefreshFailed,
    #[error("Max retries reached for token refresh")]
    MaxRetries,
    #[error("Login failed: missing user data from server.")]
    MissingUserData,
    #[error("{0}")]
    Validation(String),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

impl ApiError {
    /// Terminal authentication failures; each one has already forced a logout.
    pub fn is_session_ended(&self) -> bool {
        matches!(
            self,
            ApiError::NoRefreshToken | ApiError::RefreshFailed | ApiError::MaxRetries
        )
    }
}

fn non_empty_str<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// `error`, then `message`, then the generic fallback.
pub fn server_message(body: &Value) -> String {
    non_empty_str(body, "error")
        .or_else(|| non_empty_str(body, "message"))
        .unwrap_or(GENERIC_ERROR_MESSAGE)
        .to_string()
}

fn rejected_message(status: &StatusCode, body: &Value) -> String {
    match body {
        Value::String(s) if !s.is_empty() => s.clone(),
        _ => non_empty_str(body, "message")
            .or_else(|| non_empty_str(body, "error"))
            .map(str::to_string)
            .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16())),
    }
}

/// Result of one attempt, before any refresh logic runs.
#[derive(Debug)]
pub enum Outcome {
    Success(HttpResponse),
    Unauthenticated(HttpResponse),
    Failed(ApiError),
}

/// Classify in precedence order: connectivity, 500, 403, any non-401, then 401.
pub fn classify(result: Result<HttpResponse, TransportError>) -> Outcome {
    let response = match result {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Request failed without a response: {}", e);
            return Outcome::Failed(ApiError::Connectivity(e));
        }
    };

    let status = response.status;
    if status.is_success() {
        return Outcome::Success(response);
    }

    tracing::warn!("Request failed with status {}", status);
    match status {
        StatusCode::INTERNAL_SERVER_ERROR => {
            Outcome::Failed(ApiError::ServerFault(server_message(&response.body_value())))
        }
        StatusCode::FORBIDDEN => Outcome::Failed(ApiError::Forbidden(server_message(&response.body_value()))),
        StatusCode::UNAUTHORIZED => Outcome::Unauthenticated(response),
        _ => Outcome::Failed(ApiError::Rejected {
            status,
            body: response.body_value(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderMap;
    use serde_json::json;

    fn response(status: u16, body: Value) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers: HeaderMap::new(),
            body: serde_json::to_vec(&body).unwrap(),
        })
    }

    #[test]
    fn connectivity() {
        let outcome = classify(Err(TransportError("connection refused".into())));
        match outcome {
            Outcome::Failed(e @ ApiError::Connectivity(_)) => assert_eq!(e.to_string(), NETWORK_ERROR_MESSAGE),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn server_fault_prefers_error_then_message() {
        let cases = [
            (json!({"error": "db down", "message": "m"}), "db down"),
            (json!({"error": "", "message": "m"}), "m"),
            (json!({}), GENERIC_ERROR_MESSAGE),
        ];
        for (body, expected) in cases {
            match classify(response(500, body)) {
                Outcome::Failed(ApiError::ServerFault(m)) => assert_eq!(m, expected),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn forbidden() {
        match classify(response(403, json!({"message": "not yours"}))) {
            Outcome::Failed(ApiError::Forbidden(m)) => assert_eq!(m, "not yours"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn other_client_error_keeps_raw_body() {
        let body = json!({"status": false, "message": "Invoice not found", "data": null});
        match classify(response(404, body.clone())) {
            Outcome::Failed(e @ ApiError::Rejected { .. }) => {
                assert_eq!(e.to_string(), "Invoice not found");
                let ApiError::Rejected { status, body: raw } = e else { unreachable!() };
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(raw, body);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unauthorized_is_left_for_refresh() {
        assert!(matches!(classify(response(401, json!({}))), Outcome::Unauthenticated(_)));
        assert!(matches!(classify(response(201, json!({}))), Outcome::Success(_)));
    }
}
