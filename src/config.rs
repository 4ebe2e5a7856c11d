//! Credential configuration for the client.
//!
//! Credentials are a distinct, sensitive configuration category: they are
//! owned by the auth layer for the lifetime of the client, never logged in
//! full, and masked in `Debug` output. Two kinds are supported: browser
//! session cookies produced by an external login flow, and official app
//! credentials (consumer key/secret plus optional tokens).

use std::str::FromStr;

use log::{info, warn};
use serde::Deserialize;

use crate::error::ClientError;

/// One browser-style cookie record from an external login flow.
///
/// Deserializes from the JSON shape cookie-export tools produce (both `name`
/// and the `key` alias are accepted) and parses from a `Set-Cookie`-style
/// string via [`FromStr`].
#[derive(Clone, Deserialize)]
pub struct CookieRecord {
    /// Cookie name.
    #[serde(alias = "key")]
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Domain the cookie was issued for, when recorded.
    #[serde(default)]
    pub domain: Option<String>,
    /// Path, when recorded.
    #[serde(default)]
    pub path: Option<String>,
    /// Secure flag.
    #[serde(default)]
    pub secure: bool,
    /// HttpOnly flag.
    #[serde(default, rename = "httpOnly", alias = "http_only")]
    pub http_only: bool,
}

impl CookieRecord {
    /// Creates a record from a name and value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        CookieRecord {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            secure: false,
            http_only: false,
        }
    }
}

impl FromStr for CookieRecord {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = cookie::Cookie::parse(s.trim().to_string())
            .map_err(|e| ClientError::Configuration(format!("unparseable cookie: {}", e)))?;
        Ok(CookieRecord {
            name: parsed.name().to_string(),
            value: parsed.value().to_string(),
            domain: parsed.domain().map(str::to_string),
            path: parsed.path().map(str::to_string),
            secure: parsed.secure().unwrap_or(false),
            http_only: parsed.http_only().unwrap_or(false),
        })
    }
}

impl std::fmt::Debug for CookieRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieRecord")
            .field("name", &self.name)
            .field("value", &mask_secret(&self.value))
            .field("domain", &self.domain)
            .finish()
    }
}

/// Official app credentials for the versioned API surface.
#[derive(Clone)]
pub struct AppCredentials {
    /// Consumer API key.
    pub api_key: String,
    /// Consumer API secret.
    pub api_secret: String,
    /// User-context access token for write operations, when available.
    pub access_token: Option<String>,
    /// Pre-supplied app-only bearer token. When absent one is obtained
    /// lazily from the token endpoint and reused for the process lifetime.
    pub bearer_token: Option<String>,
}

impl AppCredentials {
    /// Creates app credentials from a consumer key and secret.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        AppCredentials {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            access_token: None,
            bearer_token: None,
        }
    }

    /// Sets the user-context access token.
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Sets a pre-supplied app-only bearer token.
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }
}

impl std::fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppCredentials")
            .field("api_key", &mask_secret(&self.api_key))
            .field("api_secret", &"[REDACTED]")
            .field(
                "access_token",
                &self.access_token.as_deref().map(mask_secret),
            )
            .field(
                "bearer_token",
                &self.bearer_token.as_deref().map(mask_secret),
            )
            .finish()
    }
}

/// The credential set a client is constructed from.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Browser session cookies from an external login flow.
    Cookies(Vec<CookieRecord>),
    /// Official app credentials.
    App(AppCredentials),
}

impl Credentials {
    /// Loads credentials from the environment.
    ///
    /// Reads `BIRDWIRE_COOKIES` (a JSON array of cookie records) first;
    /// falls back to `BIRDWIRE_API_KEY` / `BIRDWIRE_API_SECRET` with
    /// optional `BIRDWIRE_ACCESS_TOKEN` and `BIRDWIRE_BEARER_TOKEN`. Cookie
    /// credentials win when both are configured.
    ///
    /// # Returns
    ///
    /// - `Ok(Credentials)`: a usable credential set
    /// - `Err(ClientError::Configuration)`: neither form is configured, or
    ///   the cookie JSON is malformed
    pub fn from_env() -> Result<Self, ClientError> {
        if let Ok(raw) = std::env::var("BIRDWIRE_COOKIES") {
            info!("Loading cookie credentials from BIRDWIRE_COOKIES");
            let records: Vec<CookieRecord> = serde_json::from_str(&raw).map_err(|e| {
                ClientError::Configuration(format!("BIRDWIRE_COOKIES is not valid JSON: {}", e))
            })?;
            if records.is_empty() {
                warn!("BIRDWIRE_COOKIES parsed to an empty list");
            }
            return Ok(Credentials::Cookies(records));
        }

        match (
            std::env::var("BIRDWIRE_API_KEY"),
            std::env::var("BIRDWIRE_API_SECRET"),
        ) {
            (Ok(key), Ok(secret)) => {
                info!("Loading app credentials from environment");
                let mut creds = AppCredentials::new(key, secret);
                if let Ok(token) = std::env::var("BIRDWIRE_ACCESS_TOKEN") {
                    creds.access_token = Some(token);
                }
                if let Ok(token) = std::env::var("BIRDWIRE_BEARER_TOKEN") {
                    creds.bearer_token = Some(token);
                }
                Ok(Credentials::App(creds))
            }
            _ => Err(ClientError::Configuration(
                "no credentials configured: set BIRDWIRE_COOKIES or BIRDWIRE_API_KEY/BIRDWIRE_API_SECRET"
                    .to_string(),
            )),
        }
    }
}

/// Masks a secret for logging: keeps a short prefix and suffix, elides the
/// middle entirely for short values.
pub(crate) fn mask_secret(secret: &str) -> String {
    let len = secret.len();
    if len > 16 {
        format!("{}...{}", &secret[..4], &secret[len - 4..])
    } else if len > 8 {
        format!("{}...", &secret[..4])
    } else {
        "[REDACTED]".to_string()
    }
}
