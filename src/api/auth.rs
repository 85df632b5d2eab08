//! Login and registration exchanges. Both go over the bare transport and
//! feed the resulting session into the [`AuthContext`].

use std::sync::Arc;

use validator::Validate;

use crate::auth::context::AuthContext;
use crate::auth::models::{first_validation_message, ApiResponse, AuthData, LoginRequest, RegisterForm, RegisterRequest};
use crate::http::{ApiClient, ApiError, ApiRequest};
use crate::session::{Navigator, LOGIN_PATH};

const HOME_PATH: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The server returned a session; the user is now logged in.
    SignedIn { message: String },
    /// Account created without a session; the user must log in.
    Created { message: String },
}

fn message_or(message: String, fallback: &str) -> String {
    if message.is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

pub struct AuthApi {
    client: Arc<ApiClient>,
    context: Arc<AuthContext>,
    navigator: Arc<dyn Navigator>,
}

impl AuthApi {
    pub fn new(client: Arc<ApiClient>, context: Arc<AuthContext>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            client,
            context,
            navigator,
        }
    }

    /// `POST /login`; on success the session is stored and the success message returned.
    pub async fn login(&self, request: LoginRequest) -> Result<String, ApiError> {
        request
            .validate()
            .map_err(|e| ApiError::Validation(first_validation_message(&e)))?;

        let response = self.client.send_bare(ApiRequest::post("/login").json(&request)?).await?;
        let envelope: ApiResponse<AuthData> = response.json()?;

        let Some(data) = envelope.data else {
            return Err(ApiError::MissingUserData);
        };

        tracing::info!("Logged in as {}", data.email);
        self.context.login(data);
        self.navigator.assign(HOME_PATH);
        Ok(message_or(envelope.message, "Login successful"))
    }

    /// `POST /register` without the confirmation field.
    pub async fn register(&self, form: RegisterForm) -> Result<RegisterOutcome, ApiError> {
        form.validate()
            .map_err(|e| ApiError::Validation(first_validation_message(&e)))?;

        let body = RegisterRequest::from(form);
        let response = self.client.send_bare(ApiRequest::post("/register").json(&body)?).await?;
        let envelope: ApiResponse<AuthData> = response.json()?;

        match envelope.data.filter(|d| !d.access_token.is_empty()) {
            Some(data) => {
                tracing::info!("Registered and logged in as {}", data.email);
                self.context.login(data);
                self.navigator.assign(HOME_PATH);
                Ok(RegisterOutcome::SignedIn {
                    message: message_or(envelope.message, "Welcome to Finvio!"),
                })
            }
            None => {
                tracing::info!("Registered {}; login required", body.email);
                self.navigator.assign(LOGIN_PATH);
                Ok(RegisterOutcome::Created {
                    message: message_or(envelope.message, "Account created. Please log in."),
                })
            }
        }
    }

    pub fn logout(&self) {
        self.context.logout();
    }
}
