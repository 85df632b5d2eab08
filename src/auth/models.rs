//! Authentication Models
//!
//! Session payload, API envelope and the request bodies sent to the auth endpoints.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

/// Authenticated session payload as returned by `/login`, `/register` and `/auth/refresh`.
///
/// Every field is a string; the two expiry fields are ISO-8601 timestamps.
/// Fields default to empty so that partial refresh payloads still deserialize.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthData {
    pub id: String,
    pub email: String,
    pub name: String,
    pub access_token: String,
    pub access_token_expires_at: String,
    pub refresh_token: String,
    pub refresh_token_expires_at: String,
    pub photo: String,
}

impl AuthData {
    /// Copy identity fields (`id`, `email`, `name`, `photo`) from `current` where this payload left them empty.
    pub fn with_identity_from(mut self, current: &AuthData) -> Self {
        fill(&mut self.id, &current.id);
        fill(&mut self.email, &current.email);
        fill(&mut self.name, &current.name);
        fill(&mut self.photo, &current.photo);
        self
    }
}

fn fill(field: &mut String, fallback: &str) {
    if field.is_empty() {
        *field = fallback.to_string();
    }
}

/// Envelope wrapping every API response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

/// Body of `POST /auth/refresh`.
#[derive(Debug, Serialize)]
pub struct RefreshRequest<'a> {
    #[serde(rename = "refreshToken")]
    pub refresh_token: &'a str,
}

/// Login request payload
#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

static RE_UPPERCASE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Z]").unwrap());
static RE_DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d").unwrap());
static RE_SPECIAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]").unwrap());

/// Registration form as filled in by the user, including the confirmation field.
#[derive(Debug, Clone, Validate)]
pub struct RegisterForm {
    #[validate(length(min = 1, message = "First Name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last Name is required"))]
    pub last_name: String,
    #[validate(email(message = "A valid Email is required"))]
    pub email: String,
    #[validate(custom(function = "password_strength"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

fn password_strength(password: &str) -> Result<(), ValidationError> {
    let rules: [(bool, &'static str); 4] = [
        (
            password.chars().count() >= 8,
            "Password must be at least 8 characters long",
        ),
        (
            RE_UPPERCASE.is_match(password),
            "Password must contain at least one uppercase letter",
        ),
        (
            RE_DIGIT.is_match(password),
            "Password must contain at least one number",
        ),
        (
            RE_SPECIAL.is_match(password),
            "Password must contain at least one special character",
        ),
    ];

    match rules.into_iter().find(|(ok, _)| !ok) {
        Some((_, message)) => Err(ValidationError::new("password_strength").with_message(message.into())),
        None => Ok(()),
    }
}

/// Wire body of `POST /register`; the confirmation field never leaves the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl From<RegisterForm> for RegisterRequest {
    fn from(form: RegisterForm) -> Self {
        let RegisterForm {
            first_name,
            last_name,
            email,
            password,
            confirm_password: _,
        } = form;
        Self {
            first_name,
            last_name,
            email,
            password,
        }
    }
}

/// First human-readable message out of a validation failure, sorted by field name for stable output.
pub fn first_validation_message(errors: &ValidationErrors) -> String {
    let field_errors = errors.field_errors();
    let mut fields: Vec<_> = field_errors.iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| errs.iter().map(move |e| (field, e)))
        .map(|(field, e)| match &e.message {
            Some(message) => message.to_string(),
            None => format!("{field} is invalid"),
        })
        .next()
        .unwrap_or_else(|| "Invalid input".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(password: &str, confirm: &str) -> RegisterForm {
        RegisterForm {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            password: password.into(),
            confirm_password: confirm.into(),
        }
    }

    #[test]
    fn register_request_drops_confirmation() {
        let body = serde_json::to_value(RegisterRequest::from(form("Secr3t!pass", "Secr3t!pass"))).unwrap();
        assert_eq!(body["firstName"], "Ada");
        assert_eq!(body["lastName"], "Lovelace");
        assert!(body.get("confirmPassword").is_none());
        assert!(body.get("confirm_password").is_none());
    }

    #[test]
    fn password_rules() {
        assert!(form("Secr3t!pass", "Secr3t!pass").validate().is_ok());

        let cases = [
            ("S3!a", "Password must be at least 8 characters long"),
            ("secr3t!pass", "Password must contain at least one uppercase letter"),
            ("Secret!pass", "Password must contain at least one number"),
            ("Secr3tpass", "Password must contain at least one special character"),
        ];
        for (password, expected) in cases {
            let errors = form(password, password).validate().unwrap_err();
            assert_eq!(first_validation_message(&errors), expected, "password {password}");
        }
    }

    #[test]
    fn mismatched_confirmation() {
        let errors = form("Secr3t!pass", "Secr3t!pasS").validate().unwrap_err();
        assert_eq!(first_validation_message(&errors), "Passwords do not match");
    }

    #[test]
    fn login_requires_email_and_password() {
        let bad_email = LoginRequest {
            email: "nope".into(),
            password: "x".into(),
        };
        assert_eq!(
            first_validation_message(&bad_email.validate().unwrap_err()),
            "A valid email is required"
        );

        let no_password = LoginRequest {
            email: "a@b.co".into(),
            password: String::new(),
        };
        assert_eq!(
            first_validation_message(&no_password.validate().unwrap_err()),
            "Password is required"
        );
    }

    #[test]
    fn identity_is_filled_from_current_session() {
        let current = AuthData {
            id: "u1".into(),
            email: "a@b.co".into(),
            name: "Ada".into(),
            photo: "p.png".into(),
            ..Default::default()
        };
        let refreshed = AuthData {
            access_token: "new".into(),
            name: "Ada L".into(),
            ..Default::default()
        }
        .with_identity_from(&current);

        assert_eq!(refreshed.id, "u1");
        assert_eq!(refreshed.name, "Ada L");
        assert_eq!(refreshed.photo, "p.png");
        assert_eq!(refreshed.access_token, "new");
    }
}
