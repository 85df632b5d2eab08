//! Cookie Store
//!
//! Named, path-rooted persistence for the three session cookies, written
//! through a pluggable [`CookieBackend`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use time::OffsetDateTime;
use url::Url;

/// The only cookies the session layer reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CookieName {
    /// Signed session artifact.
    Auth,
    RefreshToken,
    /// Access token sent as the bearer credential.
    Token,
}

impl CookieName {
    pub const ALL: [CookieName; 3] = [CookieName::Auth, CookieName::RefreshToken, CookieName::Token];

    pub fn as_str(self) -> &'static str {
        match self {
            CookieName::Auth => "auth",
            CookieName::RefreshToken => "refresh_token",
            CookieName::Token => "token",
        }
    }
}

impl fmt::Display for CookieName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    #[error("Cookie file I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cookie file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Physical cookie jar. Implementations own storage; the [`CookieStore`] owns naming and attributes.
pub trait CookieBackend: Send + Sync {
    /// Return a live cookie; expired cookies read as absent.
    fn get(&self, name: &str) -> Option<Cookie<'static>>;
    fn set(&self, cookie: Cookie<'static>);
    fn remove(&self, name: &str);
    /// All live cookies.
    fn cookies(&self) -> Vec<Cookie<'static>>;
}

fn is_expired(cookie: &Cookie<'_>) -> bool {
    cookie
        .expires_datetime()
        .is_some_and(|expires| expires <= OffsetDateTime::now_utc())
}

/// In-memory jar, the browser's cookie jar for a single process.
pub struct MemoryCookieBackend {
    jar: Mutex<CookieJar>,
}

impl Default for MemoryCookieBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCookieBackend {
    pub fn new() -> Self {
        Self {
            jar: Mutex::new(CookieJar::new()),
        }
    }

    fn jar(&self) -> MutexGuard<'_, CookieJar> {
        self.jar.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn update(&self, f: impl FnOnce(CookieJar) -> CookieJar) {
        let mut guard = self.jar();
        let jar = std::mem::replace(&mut *guard, CookieJar::new());
        *guard = f(jar);
    }
}

impl CookieBackend for MemoryCookieBackend {
    fn get(&self, name: &str) -> Option<Cookie<'static>> {
        self.jar().get(name).filter(|c| !is_expired(c)).cloned()
    }

    fn set(&self, cookie: Cookie<'static>) {
        self.update(|jar| jar.add(cookie));
    }

    fn remove(&self, name: &str) {
        let name = name.to_string();
        self.update(|jar| jar.remove(Cookie::new(name, "")));
    }

    fn cookies(&self) -> Vec<Cookie<'static>> {
        self.jar()
            .iter()
            .filter(|c| !is_expired(c))
            .cloned()
            .collect()
    }
}

/// In-memory jar mirrored to a JSON file of `Set-Cookie` strings after every write.
pub struct FileCookieBackend {
    path: PathBuf,
    inner: MemoryCookieBackend,
}

impl FileCookieBackend {
    /// Open (or start) the jar at `path`. A missing file is an empty jar; unreadable entries are skipped.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CookieError> {
        let path = path.as_ref().to_path_buf();
        let inner = MemoryCookieBackend::new();

        if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            let entries: Vec<String> = serde_json::from_str(&raw)?;
            for entry in entries {
                match Cookie::parse(entry) {
                    Ok(cookie) if !is_expired(&cookie) => inner.set(cookie),
                    Ok(_) => {}
                    Err(e) => tracing::warn!("Skipping unreadable entry in {}: {}", path.display(), e),
                }
            }
            tracing::debug!("Loaded cookie jar from {}", path.display());
        }

        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) {
        let entries: Vec<String> = self.inner.cookies().iter().map(|c| c.to_string()).collect();
        let result = serde_json::to_string_pretty(&entries)
            .map_err(CookieError::from)
            .and_then(|json| std::fs::write(&self.path, json).map_err(CookieError::from));

        if let Err(e) = result {
            tracing::warn!("Failed to persist cookie jar to {}: {}", self.path.display(), e);
        }
    }
}

impl CookieBackend for FileCookieBackend {
    fn get(&self, name: &str) -> Option<Cookie<'static>> {
        self.inner.get(name)
    }

    fn set(&self, cookie: Cookie<'static>) {
        self.inner.set(cookie);
        self.persist();
    }

    fn remove(&self, name: &str) {
        self.inner.remove(name);
        self.persist();
    }

    fn cookies(&self) -> Vec<Cookie<'static>> {
        self.inner.cookies()
    }
}

/// Parse an ISO-8601 expiry the way a browser `Date` would: RFC 3339, a naive
/// date-time in UTC, or a bare date at UTC midnight.
pub fn parse_expiry(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Scoped access to the session cookies: path `/`, `SameSite=Strict`, `Secure` iff served over https.
#[derive(Clone)]
pub struct CookieStore {
    backend: Arc<dyn CookieBackend>,
    secure: bool,
}

impl CookieStore {
    pub fn new(backend: Arc<dyn CookieBackend>, secure: bool) -> Self {
        Self { backend, secure }
    }

    /// Derive the `Secure` flag from the origin the client is served from.
    pub fn for_origin(backend: Arc<dyn CookieBackend>, origin: &Url) -> Self {
        Self::new(backend, origin.scheme() == "https")
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn set(&self, name: CookieName, value: &str, expires_at: Option<DateTime<Utc>>) {
        let mut cookie = Cookie::build((name.as_str(), value.to_string()))
            .path("/")
            .same_site(SameSite::Strict)
            .secure(self.secure)
            .build();

        if let Some(expires) = expires_at.and_then(|dt| OffsetDateTime::from_unix_timestamp(dt.timestamp()).ok()) {
            cookie.set_expires(expires);
        }

        self.backend.set(cookie);
    }

    pub fn get(&self, name: CookieName) -> Option<String> {
        self.backend.get(name.as_str()).map(|c| c.value().to_string())
    }

    pub fn delete(&self, name: CookieName) {
        self.backend.remove(name.as_str());
    }

    /// Full cookie including attributes.
    pub fn cookie(&self, name: CookieName) -> Option<Cookie<'static>> {
        self.backend.get(name.as_str())
    }

    pub fn expires_at(&self, name: CookieName) -> Option<DateTime<Utc>> {
        self.cookie(name)?
            .expires_datetime()
            .and_then(|odt| DateTime::from_timestamp(odt.unix_timestamp(), 0))
    }

    /// Render every live session cookie as a `Set-Cookie` header value.
    pub fn set_cookie_headers(&self) -> Vec<String> {
        CookieName::ALL
            .iter()
            .filter_map(|name| self.cookie(*name))
            .map(|c| c.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn store(secure: bool) -> CookieStore {
        CookieStore::new(Arc::new(MemoryCookieBackend::new()), secure)
    }

    #[test]
    fn set_get_delete() {
        let store = store(false);
        store.set(CookieName::Token, "abc", None);
        assert_eq!(store.get(CookieName::Token).as_deref(), Some("abc"));
        assert!(store.get(CookieName::Auth).is_none());

        store.delete(CookieName::Token);
        assert!(store.get(CookieName::Token).is_none());
    }

    #[test]
    fn cookie_attributes() {
        let expires = Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap();
        let store = store(true);
        store.set(CookieName::RefreshToken, "r", Some(expires));

        let cookie = store.cookie(CookieName::RefreshToken).unwrap();
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(store.expires_at(CookieName::RefreshToken), Some(expires));
    }

    #[test]
    fn secure_follows_origin_scheme() {
        let backend: Arc<dyn CookieBackend> = Arc::new(MemoryCookieBackend::new());
        let https = CookieStore::for_origin(backend.clone(), &Url::parse("https://app.example.com").unwrap());
        let http = CookieStore::for_origin(backend, &Url::parse("http://localhost:5173").unwrap());
        assert!(https.is_secure());
        assert!(!http.is_secure());
    }

    #[test]
    fn expired_cookie_reads_as_absent() {
        let store = store(false);
        store.set(CookieName::Token, "old", Some(Utc::now() - chrono::Duration::seconds(5)));
        assert!(store.get(CookieName::Token).is_none());
        assert!(store.set_cookie_headers().is_empty());
    }

    #[test]
    fn parse_expiry_formats() {
        let midnight = Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_expiry("2099-01-01"), Some(midnight));
        assert_eq!(parse_expiry("2099-01-01T00:00:00Z"), Some(midnight));
        assert_eq!(parse_expiry("2099-01-01T01:00:00+01:00"), Some(midnight));
        assert_eq!(parse_expiry("2099-01-01T00:00:00.000"), Some(midnight));
        assert_eq!(parse_expiry("next tuesday"), None);
    }

    #[test]
    fn file_backend_survives_reopen() {
        let path = std::env::temp_dir().join(format!("finvio-cookies-{}.json", uuid::Uuid::new_v4()));
        let expires = Utc::now() + chrono::Duration::days(1);

        {
            let backend = Arc::new(FileCookieBackend::open(&path).unwrap());
            let store = CookieStore::new(backend, false);
            store.set(CookieName::Token, "persisted", Some(expires));
            store.set(CookieName::Auth, "gone", None);
            store.delete(CookieName::Auth);
        }

        let reopened = CookieStore::new(Arc::new(FileCookieBackend::open(&path).unwrap()), false);
        assert_eq!(reopened.get(CookieName::Token).as_deref(), Some("persisted"));
        assert!(reopened.get(CookieName::Auth).is_none());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn file_backend_skips_unreadable_entries() {
        let path = std::env::temp_dir().join(format!("finvio-cookies-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"["no pair here", "=nameless", "token=abc; Path=/; SameSite=Strict"]"#).unwrap();

        let store = CookieStore::new(Arc::new(FileCookieBackend::open(&path).unwrap()), false);
        assert_eq!(store.get(CookieName::Token).as_deref(), Some("abc"));
        assert_eq!(store.set_cookie_headers().len(), 1);

        let _ = std::fs::remove_file(&path);
    }
}
