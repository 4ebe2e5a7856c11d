//! Authenticated HTTP plumbing.
//!
//! [`Executor`] is the single call/response path every operation goes
//! through: fresh auth headers per call, JSON body encoding for non-GET
//! methods, text-first response reading with a JSON fallback, and one shared
//! error translation. No operation has its own ad hoc error handling.

use log::{debug, info};
use reqwest::Method;
use serde_json::Value;

use crate::auth::AuthStrategy;
use crate::error::ClientError;

/// Base URLs of the service's endpoint families. Overridable so transport
/// tests can point at a local server.
#[derive(Debug, Clone)]
pub(crate) struct Endpoints {
    /// GraphQL operations: `{graphql_base}/{queryId}/{OperationName}`.
    pub graphql_base: String,
    /// Chunked media upload endpoint.
    pub upload: String,
    /// Legacy (pre-GraphQL) REST base.
    pub legacy_base: String,
    /// Poll card creation endpoint.
    pub cards: String,
    /// Official versioned API base.
    pub api_base: String,
    /// App-only bearer token endpoint.
    pub token: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            graphql_base: "https://twitter.com/i/api/graphql".to_string(),
            upload: "https://upload.twitter.com/1.1/media/upload.json".to_string(),
            legacy_base: "https://api.twitter.com/1.1".to_string(),
            cards: "https://caps.twitter.com/v2/cards/create.json".to_string(),
            api_base: "https://api.x.com/2".to_string(),
            token: "https://api.x.com/oauth2/token".to_string(),
        }
    }
}

/// Generic authenticated request executor.
pub(crate) struct Executor {
    http: reqwest::Client,
    auth: AuthStrategy,
    pub(crate) endpoints: Endpoints,
}

impl Executor {
    pub(crate) fn new(auth: AuthStrategy, endpoints: Endpoints) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Executor {
            http,
            auth,
            endpoints,
        })
    }

    pub(crate) fn auth(&self) -> &AuthStrategy {
        &self.auth
    }

    /// Executes an authenticated request with an optional JSON body.
    ///
    /// GET requests never carry a body (the service rejects them); all
    /// parameters must already be encoded into the query string. Non-GET
    /// bodies are serialized as JSON.
    ///
    /// # Returns
    ///
    /// - `Ok(Value)`: the decoded response payload, or the raw text wrapped
    ///   as a JSON string when the body is not JSON
    /// - `Err(ClientError::Transport)`: non-2xx response, carrying the
    ///   server's message, status, and raw payload
    pub(crate) async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        extra_headers: &[(&str, &str)],
    ) -> Result<Value, ClientError> {
        let mut request = self.http.request(method.clone(), url);
        for (name, value) in self.auth.headers().await? {
            request = request.header(name.as_str(), value.as_str());
        }
        for (name, value) in extra_headers {
            request = request.header(*name, *value);
        }
        if method != Method::GET {
            if let Some(body) = body {
                request = request.json(body);
            }
        }
        debug!("{} {}", method, url);
        self.finish(request).await
    }

    /// Executes an authenticated request with a form-encoded body, as the
    /// legacy endpoints that predate the GraphQL migration require.
    pub(crate) async fn execute_form(
        &self,
        url: &str,
        params: &[(&str, &str)],
        extra_headers: &[(&str, &str)],
    ) -> Result<Value, ClientError> {
        let encoded = serde_urlencoded::to_string(params)
            .map_err(|e| ClientError::Configuration(format!("unencodable form body: {}", e)))?;
        let mut request = self
            .http
            .post(url)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(encoded);
        for (name, value) in self.auth.headers().await? {
            request = request.header(name.as_str(), value.as_str());
        }
        for (name, value) in extra_headers {
            request = request.header(*name, *value);
        }
        debug!("POST {} (form)", url);
        self.finish(request).await
    }

    /// Executes an authenticated multipart upload request.
    pub(crate) async fn execute_multipart(
        &self,
        url: &str,
        form: reqwest::multipart::Form,
    ) -> Result<Value, ClientError> {
        let mut request = self.http.post(url).multipart(form);
        for (name, value) in self.auth.headers().await? {
            request = request.header(name.as_str(), value.as_str());
        }
        debug!("POST {} (multipart)", url);
        self.finish(request).await
    }

    /// Shared response tail: read the full body as text, try JSON, fall back
    /// to the raw text verbatim, and translate non-2xx statuses.
    async fn finish(&self, request: reqwest::RequestBuilder) -> Result<Value, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let raw = response.text().await?;
        let payload: Value =
            serde_json::from_str(&raw).unwrap_or_else(|_| Value::String(raw.clone()));
        if !status.is_success() {
            info!("Request failed with status {}", status);
            return Err(ClientError::transport(status.as_u16(), &payload, raw));
        }
        debug!("Response: {} bytes", raw.len());
        Ok(payload)
    }
}
