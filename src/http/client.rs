//! HTTP client with bearer injection and the bounded refresh-and-retry protocol.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::auth::models::{ApiResponse, AuthData, RefreshRequest};
use crate::http::error::{classify, ApiError, Outcome};
use crate::http::request::{ApiRequest, MultipartForm, RequestBody};
use crate::http::transport::{HttpRequest, HttpResponse, Transport};
use crate::session::{CookieName, SessionManager};

/// Refresh attempts allowed per logical request.
pub const MAX_RETRIES: u32 = 3;

/// Endpoint that trades the refresh token for a new access token.
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Where a request stands in the refresh protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Init,
    Refreshing,
    Retrying,
    Success,
    Failed,
}

/// Per-request retry bookkeeping; dropped once the request resolves.
#[derive(Debug)]
pub struct RetryState {
    pub retry_count: u32,
    pub did_refresh: bool,
    pub phase: RefreshPhase,
    bearer: Option<String>,
}

impl Default for RetryState {
    fn default() -> Self {
        Self {
            retry_count: 0,
            did_refresh: false,
            phase: RefreshPhase::Init,
            bearer: None,
        }
    }
}

impl RetryState {
    fn transition(&mut self, phase: RefreshPhase) {
        tracing::debug!(
            "Refresh state {:?} -> {:?} (attempt {}/{})",
            self.phase,
            phase,
            self.retry_count,
            MAX_RETRIES
        );
        self.phase = phase;
    }
}

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

/// Client for the invoicing API.
///
/// Every request carries the access token from the `token` cookie. A 401 is
/// answered by refreshing the token and retrying, at most [`MAX_RETRIES`]
/// times per request.
pub struct ApiClient {
    base_url: Url,
    transport: Arc<dyn Transport>,
    session: Arc<SessionManager>,
    default_headers: HeaderMap,
}

impl ApiClient {
    /// Create a client rooted at `base_url`; JSON is the default content type.
    pub fn new(base_url: Url, transport: Arc<dyn Transport>, session: Arc<SessionManager>) -> Self {
        Self {
            base_url,
            transport,
            session,
            default_headers: json_headers(),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Append `path` to the base URL, keeping any base path prefix.
    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /// Defaults, caller headers and body. The multipart content type replaces the JSON default.
    fn prepare_bare(&self, request: &ApiRequest) -> Result<HttpRequest, ApiError> {
        let mut headers = self.default_headers.clone();
        headers.extend(request.headers.clone());

        let body = match &request.body {
            RequestBody::Empty => None,
            RequestBody::Json(value) => Some(serde_json::to_vec(value)?),
            RequestBody::Multipart(form) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_str(&form.content_type())?);
                Some(form.to_bytes())
            }
        };

        Ok(HttpRequest {
            method: request.method.clone(),
            url: self.url(&request.path)?,
            headers,
            body,
        })
    }

    /// Request phase: the bare request plus the bearer token, preferring one minted during this request.
    fn prepare(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<HttpRequest, ApiError> {
        let mut prepared = self.prepare_bare(request)?;

        let token = bearer
            .map(str::to_string)
            .or_else(|| self.session.get_cookie(CookieName::Token));
        if let Some(token) = token {
            prepared
                .headers
                .insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
        }

        Ok(prepared)
    }

    /// Send through the interceptor. A 401 triggers up to [`MAX_RETRIES`] refresh-and-retry cycles;
    /// every exhausted path logs the user out.
    pub async fn send(&self, request: ApiRequest) -> Result<HttpResponse, ApiError> {
        let mut state = RetryState::default();

        loop {
            let prepared = self.prepare(&request, state.bearer.as_deref())?;
            match classify(self.transport.execute(prepared).await) {
                Outcome::Success(response) => {
                    if state.did_refresh {
                        state.transition(RefreshPhase::Success);
                    }
                    return Ok(response);
                }
                Outcome::Failed(e) => return Err(e),
                Outcome::Unauthenticated(_) => {}
            }

            if state.retry_count >= MAX_RETRIES {
                state.transition(RefreshPhase::Failed);
                return Err(self.force_logout(ApiError::MaxRetries));
            }

            state.retry_count += 1;
            state.transition(RefreshPhase::Refreshing);

            match self.refresh().await {
                Ok(access_token) => {
                    state.did_refresh = true;
                    state.bearer = Some(access_token);
                    state.transition(RefreshPhase::Retrying);
                }
                Err(e) => {
                    state.transition(RefreshPhase::Failed);
                    return Err(self.force_logout(e));
                }
            }
        }
    }

    /// Send without bearer injection or refresh handling. Failures are still classified; a 401 is
    /// reported as a plain rejection.
    pub async fn send_bare(&self, request: ApiRequest) -> Result<HttpResponse, ApiError> {
        let prepared = self.prepare_bare(&request)?;

        match classify(self.transport.execute(prepared).await) {
            Outcome::Success(response) => Ok(response),
            Outcome::Unauthenticated(response) => Err(ApiError::Rejected {
                status: response.status,
                body: response.body_value(),
            }),
            Outcome::Failed(e) => Err(e),
        }
    }

    /// Mint a new access token over the raw transport and persist the returned session.
    async fn refresh(&self) -> Result<String, ApiError> {
        let refresh_token = self
            .session
            .get_cookie(CookieName::RefreshToken)
            .ok_or(ApiError::NoRefreshToken)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let request = HttpRequest {
            method: Method::POST,
            url: self.url(REFRESH_PATH)?,
            headers,
            body: Some(serde_json::to_vec(&RefreshRequest {
                refresh_token: &refresh_token,
            })?),
        };

        let response = self.transport.execute(request).await.map_err(|e| {
            tracing::warn!("Token refresh request failed: {}", e);
            ApiError::RefreshFailed
        })?;

        if response.status != StatusCode::OK {
            tracing::warn!("Token refresh rejected with status {}", response.status);
            return Err(ApiError::RefreshFailed);
        }

        let envelope: ApiResponse<AuthData> = response.json().map_err(|e| {
            tracing::warn!("Token refresh returned an unreadable body: {}", e);
            ApiError::RefreshFailed
        })?;

        let Some(data) = envelope.data.filter(|d| !d.access_token.is_empty()) else {
            tracing::warn!("Token refresh returned no access token");
            return Err(ApiError::RefreshFailed);
        };

        let data = match self.session.get_user() {
            Some(current) => data.with_identity_from(&current),
            None => data,
        };
        self.session.login_cookie(&data);
        tracing::info!("Access token refreshed");

        Ok(data.access_token)
    }

    fn force_logout(&self, error: ApiError) -> ApiError {
        tracing::warn!("Ending session: {}", error);
        self.session.logout_cookie();
        error
    }

    async fn envelope<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<ApiResponse<T>, ApiError> {
        let response = self.send(request).await?;
        Ok(response.json()?)
    }

    /// `GET path`, decoding the response envelope.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>, ApiError> {
        self.envelope(ApiRequest::get(path)).await
    }

    /// `POST path` with a JSON body.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<ApiResponse<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.envelope(ApiRequest::post(path).json(body)?).await
    }

    /// `PUT path` with a JSON body.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<ApiResponse<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.envelope(ApiRequest::put(path).json(body)?).await
    }

    /// `PATCH path` with a JSON body.
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<ApiResponse<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.envelope(ApiRequest::patch(path).json(body)?).await
    }

    /// `DELETE path`.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>, ApiError> {
        self.envelope(ApiRequest::delete(path)).await
    }

    /// `POST path` with a `multipart/form-data` body, e.g. a file upload.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: MultipartForm,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.envelope(ApiRequest::post(path).multipart(form)).await
    }
}
