//! Configuration module for environment variables and client settings

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use url::Url;

pub const DEFAULT_APP_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_COOKIE_FILE: &str = ".finvio-cookies.json";

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the remote invoicing API
    pub api_base_url: Url,

    /// Session signing secret; `None` disables session persistence
    pub secret_key: Option<String>,

    /// Origin the client is served from; decides the `Secure` cookie flag
    pub app_origin: Url,

    /// Where the command-line client keeps its cookie jar
    pub cookie_file: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_base_url = lookup("API_BASE_URL").context("API_BASE_URL environment variable is required")?;
        let api_base_url = Url::parse(&api_base_url).context("API_BASE_URL is not a valid URL")?;

        let secret_key = lookup("SECRET_KEY").filter(|s| !s.is_empty());
        if secret_key.is_none() {
            tracing::error!("SECRET_KEY is not set. Session cookies are disabled.");
        }

        let app_origin = lookup("APP_ORIGIN").unwrap_or_else(|| DEFAULT_APP_ORIGIN.to_string());
        let app_origin = Url::parse(&app_origin).context("APP_ORIGIN is not a valid URL")?;

        let cookie_file = lookup("COOKIE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_COOKIE_FILE));

        Ok(Self {
            api_base_url,
            secret_key,
            app_origin,
            cookie_file,
        })
    }
}
