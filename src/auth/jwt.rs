//! Session Artifact Codec
//!
//! Signs an [`AuthData`] payload into a compact HS256 JWT and verifies it back.
//! Every failure, including a missing secret, collapses to `None`.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::models::AuthData;

/// Lifetime of a session artifact, independent of the embedded token expiries.
pub const ARTIFACT_LIFETIME_DAYS: i64 = 7;

/// The only algorithm accepted at either end.
const ALGORITHM: Algorithm = Algorithm::HS256;

/// Artifact claims: the session payload plus issued-at and expiry.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    session: AuthData,
    iat: i64,
    exp: i64,
}

#[derive(Clone)]
struct Keys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

/// Codec for the signed session artifact stored in the `auth` cookie.
#[derive(Clone)]
pub struct TokenCodec {
    keys: Option<Keys>,
    validation: Validation,
}

impl TokenCodec {
    /// Create a codec from an optional secret; `None` or an empty secret disables sessions.
    pub fn new(secret: Option<&str>) -> Self {
        let keys = secret.filter(|s| !s.is_empty()).map(|s| Keys {
            encoding_key: EncodingKey::from_secret(s.as_bytes()),
            decoding_key: DecodingKey::from_secret(s.as_bytes()),
        });

        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;

        Self { keys, validation }
    }

    /// Whether a signing secret is configured.
    pub fn is_enabled(&self) -> bool {
        self.keys.is_some()
    }

    fn keys(&self) -> Option<&Keys> {
        if self.keys.is_none() {
            tracing::error!("SECRET_KEY is not set. Session cookies are disabled.");
        }
        self.keys.as_ref()
    }

    /// Sign `payload` into an artifact issued now.
    pub fn encode(&self, payload: &AuthData) -> Option<String> {
        self.encode_at(payload, Utc::now())
    }

    /// Sign `payload` into an artifact issued at `issued_at`, expiring seven days later.
    pub fn encode_at(&self, payload: &AuthData, issued_at: DateTime<Utc>) -> Option<String> {
        let keys = self.keys()?;
        let expiration = issued_at + Duration::days(ARTIFACT_LIFETIME_DAYS);

        let claims = Claims {
            session: payload.clone(),
            iat: issued_at.timestamp(),
            exp: expiration.timestamp(),
        };

        match encode(&Header::new(ALGORITHM), &claims, &keys.encoding_key) {
            Ok(token) => Some(token),
            Err(e) => {
                tracing::error!("Failed to encode session artifact: {}", e);
                None
            }
        }
    }

    /// Verify signature, algorithm and expiry, then return the embedded payload.
    pub fn decode(&self, artifact: &str) -> Option<AuthData> {
        let keys = self.keys()?;

        match decode::<Claims>(artifact, &keys.decoding_key, &self.validation) {
            Ok(data) => Some(data.claims.session),
            Err(e) => {
                tracing::debug!("Session artifact rejected: {}", e);
                None
            }
        }
    }
}
