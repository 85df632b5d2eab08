#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use finvio_client::http::{HttpRequest, HttpResponse, Transport, TransportError};
use finvio_client::session::{History, MemoryCookieBackend};
use finvio_client::{AppState, AuthData, Config};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::{json, Value};
use url::Url;

pub const BASE_URL: &str = "http://api.test/v1";
pub const SECRET: &str = "integration-test-secret";

type Handler = dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync;

/// Transport that answers from a closure and records every request it sees.
pub struct ScriptedTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new(
        handler: impl Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.path() == format!("/v1{path}"))
            .collect()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests_to(path).len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        (self.handler)(&request)
    }
}

pub fn reply(status: u16, body: Value) -> Result<HttpResponse, TransportError> {
    Ok(HttpResponse {
        status: StatusCode::from_u16(status).unwrap(),
        headers: HeaderMap::new(),
        body: serde_json::to_vec(&body).unwrap(),
    })
}

pub fn path_of(request: &HttpRequest) -> &str {
    request.url.path().trim_start_matches("/v1")
}

pub fn bearer(request: &HttpRequest) -> Option<String> {
    request
        .headers
        .get(reqwest::header::AUTHORIZATION)
        .map(|v| v.to_str().unwrap().to_string())
}

pub fn body_json(request: &HttpRequest) -> Value {
    serde_json::from_slice(request.body.as_deref().unwrap_or(b"null")).unwrap()
}

pub fn auth_data(access: &str, refresh: &str) -> AuthData {
    AuthData {
        id: "usr_1".into(),
        email: "ada@example.com".into(),
        name: "Ada Lovelace".into(),
        access_token: access.into(),
        access_token_expires_at: "2099-01-01".into(),
        refresh_token: refresh.into(),
        refresh_token_expires_at: "2099-06-01".into(),
        photo: "https://cdn.example.com/ada.png".into(),
    }
}

pub fn token_envelope(access: &str, refresh: &str) -> Value {
    json!({
        "status": true,
        "message": "Token refreshed",
        "data": {
            "access_token": access,
            "access_token_expires_at": "2099-02-01T00:00:00Z",
            "refresh_token": refresh,
            "refresh_token_expires_at": "2099-07-01T00:00:00Z"
        }
    })
}

pub struct Harness {
    pub app: AppState,
    pub history: Arc<History>,
    pub transport: Arc<ScriptedTransport>,
}

pub fn config(secret: Option<&str>, origin: &str) -> Config {
    Config {
        api_base_url: Url::parse(BASE_URL).unwrap(),
        secret_key: secret.map(str::to_string),
        app_origin: Url::parse(origin).unwrap(),
        cookie_file: std::env::temp_dir().join("unused-finvio-cookies.json"),
    }
}

pub fn harness_with(secret: Option<&str>, transport: Arc<ScriptedTransport>) -> Harness {
    let history = Arc::new(History::new("/"));
    let app = AppState::new(
        &config(secret, "http://localhost:5173"),
        Arc::new(MemoryCookieBackend::new()),
        transport.clone(),
        history.clone(),
    );
    Harness {
        app,
        history,
        transport,
    }
}

pub fn harness(
    handler: impl Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
) -> Harness {
    harness_with(Some(SECRET), ScriptedTransport::new(handler))
}
