//! Authentication strategies.
//!
//! Builds the per-request headers the service expects. The cookie variant
//! replays a browser session: cookies are replicated across every domain
//! alias of the service, the CSRF cookie is mirrored into its header, and a
//! fixed public bearer token plus the static web-client headers are
//! attached. The app variant wraps official credentials and lazily obtains
//! an app-only bearer token.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use log::{debug, info};
use tokio::sync::OnceCell;

use crate::config::{mask_secret, AppCredentials, CookieRecord};
use crate::error::ClientError;

/// The two interchangeable public hostnames of the service and their
/// subdomain-matching variants. Cookies are not shared between them
/// automatically, so every cookie is written under each alias.
pub(crate) const DOMAIN_ALIASES: [&str; 4] = ["twitter.com", ".twitter.com", "x.com", ".x.com"];

/// Domain read back for validation and listed first in the cookie header.
pub(crate) const CANONICAL_DOMAIN: &str = "twitter.com";

/// Session cookies without which no authenticated call can succeed.
const CRITICAL_COOKIES: [&str; 3] = ["auth_token", "ct0", "twid"];

/// The fixed public bearer token the web client ships with. Not a secret;
/// the service requires it on every web-session request.
pub(crate) const WEB_BEARER_TOKEN: &str =
    "AAAAAAAAAAAAAAAAAAAAANRILgAAAAAAnNwIzUejRCOuH5E6I8xnZz4puTs%3D1Zv7ttfk8LF81IUq16cHjhLTvJu4FA33AGWWjCpTnA";

const WEB_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Thread-safe cookie store keyed by domain.
///
/// Reads (header assembly) happen on every request and may run concurrently;
/// writes (cookie refresh) are rare. A `RwLock` keeps both race-free.
pub(crate) struct CookieStore {
    domains: RwLock<HashMap<String, Vec<CookieRecord>>>,
}

impl CookieStore {
    pub(crate) fn new() -> Self {
        CookieStore {
            domains: RwLock::new(HashMap::new()),
        }
    }

    /// Writes each record under every domain alias, replacing any existing
    /// cookie of the same name.
    pub(crate) fn set_cookies(&self, records: &[CookieRecord]) {
        let mut domains = self
            .domains
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        for alias in DOMAIN_ALIASES {
            let jar = domains.entry(alias.to_string()).or_default();
            for record in records {
                jar.retain(|c| c.name != record.name);
                let mut stored = record.clone();
                stored.domain = Some(alias.to_string());
                jar.push(stored);
            }
        }
    }

    /// Looks up a cookie value under the given domain.
    pub(crate) fn get(&self, domain: &str, name: &str) -> Option<String> {
        let domains = self.domains.read().unwrap_or_else(PoisonError::into_inner);
        domains
            .get(domain)?
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.clone())
    }

    /// True when every named cookie exists under the canonical domain.
    pub(crate) fn has_all(&self, names: &[&str]) -> bool {
        names.iter().all(|n| self.get(CANONICAL_DOMAIN, n).is_some())
    }

    /// Concatenates the cookies of all aliased domains into one `cookie`
    /// header value, canonical domain first, each name included once.
    pub(crate) fn cookie_header(&self) -> String {
        let domains = self.domains.read().unwrap_or_else(PoisonError::into_inner);
        let mut seen: Vec<String> = Vec::new();
        let mut pairs: Vec<String> = Vec::new();
        let ordered = std::iter::once(CANONICAL_DOMAIN)
            .chain(DOMAIN_ALIASES.iter().copied().filter(|d| *d != CANONICAL_DOMAIN));
        for domain in ordered {
            if let Some(jar) = domains.get(domain) {
                for record in jar {
                    if !seen.contains(&record.name) {
                        seen.push(record.name.clone());
                        pairs.push(format!("{}={}", record.name, record.value));
                    }
                }
            }
        }
        pairs.join("; ")
    }
}

/// Assembles the full header map for a cookie-session request.
///
/// Recomputed on every call rather than cached, since the CSRF cookie can
/// rotate mid-session. The `x-csrf-token` header is present exactly when the
/// `ct0` cookie exists in the store.
pub(crate) fn assemble_cookie_headers(store: &CookieStore) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert(
        "authorization".to_string(),
        format!("Bearer {}", WEB_BEARER_TOKEN),
    );
    headers.insert("cookie".to_string(), store.cookie_header());
    if let Some(csrf) = store.get(CANONICAL_DOMAIN, "ct0") {
        headers.insert("x-csrf-token".to_string(), csrf);
    }
    headers.insert(
        "x-twitter-auth-type".to_string(),
        "OAuth2Session".to_string(),
    );
    headers.insert("x-twitter-active-user".to_string(), "yes".to_string());
    headers.insert("x-twitter-client-language".to_string(), "en".to_string());
    headers.insert("user-agent".to_string(), WEB_USER_AGENT.to_string());
    headers
}

/// Cookie-session authentication.
pub(crate) struct CookieAuth {
    store: CookieStore,
}

impl CookieAuth {
    /// Builds the store from raw login-flow cookie records and validates it.
    ///
    /// Writes every cookie under all domain aliases, then reads back the
    /// canonical domain and fails with a fatal configuration error unless
    /// the session token, CSRF token, and user id token are all present.
    /// The failure happens here, before any network call, because every
    /// later request would otherwise fail authorization silently.
    pub(crate) fn new(records: Vec<CookieRecord>) -> Result<Self, ClientError> {
        let store = CookieStore::new();
        store.set_cookies(&records);
        for name in CRITICAL_COOKIES {
            if store.get(CANONICAL_DOMAIN, name).is_none() {
                return Err(ClientError::Configuration(format!(
                    "missing required session cookie '{}'",
                    name
                )));
            }
        }
        info!(
            "Cookie session initialized with {} cookies across {} domain aliases",
            records.len(),
            DOMAIN_ALIASES.len()
        );
        Ok(CookieAuth { store })
    }

    /// Replaces session cookies, e.g. after the caller refreshed them.
    pub(crate) fn set_cookies(&self, records: &[CookieRecord]) {
        self.store.set_cookies(records);
    }

    pub(crate) fn headers(&self) -> HashMap<String, String> {
        assemble_cookie_headers(&self.store)
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        self.store.has_all(&CRITICAL_COOKIES)
    }
}

/// App-credential authentication for the official API surface.
pub(crate) struct AppAuth {
    credentials: AppCredentials,
    token_url: String,
    http: reqwest::Client,
    bearer: OnceCell<String>,
}

impl AppAuth {
    pub(crate) fn new(credentials: AppCredentials, token_url: String) -> Self {
        AppAuth {
            credentials,
            token_url,
            http: reqwest::Client::new(),
            bearer: OnceCell::new(),
        }
    }

    /// Returns the bearer token to authenticate with.
    ///
    /// Prefers the user-context access token when one was configured. The
    /// app-only token is otherwise obtained once from the token endpoint and
    /// reused for the process lifetime; these tokens are long-lived and no
    /// refresh logic is attempted.
    async fn bearer(&self) -> Result<String, ClientError> {
        if let Some(token) = &self.credentials.access_token {
            return Ok(token.clone());
        }
        if let Some(token) = &self.credentials.bearer_token {
            return Ok(token.clone());
        }
        let token = self
            .bearer
            .get_or_try_init(|| self.fetch_app_bearer())
            .await?;
        Ok(token.clone())
    }

    async fn fetch_app_bearer(&self) -> Result<String, ClientError> {
        use base64::{engine::general_purpose::STANDARD, Engine as _};

        info!("Obtaining app-only bearer token");
        let basic = STANDARD.encode(format!(
            "{}:{}",
            urlencoding::encode(&self.credentials.api_key),
            urlencoding::encode(&self.credentials.api_secret)
        ));
        let response = self
            .http
            .post(&self.token_url)
            .header("Authorization", format!("Basic {}", basic))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        let status = response.status();
        let raw = response.text().await?;
        if !status.is_success() {
            let payload =
                serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw.clone()));
            return Err(ClientError::transport(status.as_u16(), &payload, raw));
        }
        let payload: serde_json::Value = serde_json::from_str(&raw)?;
        let token = payload
            .get("access_token")
            .and_then(|t| t.as_str())
            .ok_or_else(|| {
                ClientError::Configuration("token endpoint returned no access_token".to_string())
            })?;
        debug!("App-only bearer obtained: {}", mask_secret(token));
        Ok(token.to_string())
    }

    pub(crate) async fn headers(&self) -> Result<HashMap<String, String>, ClientError> {
        let mut headers = HashMap::new();
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", self.bearer().await?),
        );
        Ok(headers)
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        self.credentials.access_token.is_some()
            || self.credentials.bearer_token.is_some()
            || self.bearer.initialized()
    }
}

/// The authentication strategy a client was constructed with, chosen once
/// and never re-branched per call site.
pub(crate) enum AuthStrategy {
    /// Browser cookie session against the undocumented web API.
    Cookie(CookieAuth),
    /// Official app credentials against the versioned API.
    App(AppAuth),
}

impl AuthStrategy {
    /// Produces fresh per-request headers. Never cached.
    pub(crate) async fn headers(&self) -> Result<HashMap<String, String>, ClientError> {
        match self {
            AuthStrategy::Cookie(auth) => Ok(auth.headers()),
            AuthStrategy::App(auth) => auth.headers().await,
        }
    }

    /// Best-effort, non-throwing authentication probe.
    pub(crate) fn is_authenticated(&self) -> bool {
        match self {
            AuthStrategy::Cookie(auth) => auth.is_authenticated(),
            AuthStrategy::App(auth) => auth.is_authenticated(),
        }
    }
}
