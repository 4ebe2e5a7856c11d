//! Error types for the birdwire client.
//!
//! Every public operation returns [`ClientError`]. The taxonomy separates
//! construction-time credential problems (never retryable) from transport
//! failures (which carry the HTTP status and raw server payload for
//! diagnostics), missing-result conditions, and upload-protocol failures.
//! This crate performs no retries of its own; retry policy belongs to the
//! caller.

use thiserror::Error;

/// Phase of the chunked media upload protocol that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    /// INIT request (or the single-shot image upload).
    Init,
    /// One of the APPEND chunk requests.
    Append,
    /// FINALIZE request.
    Finalize,
    /// STATUS processing poll.
    Status,
}

impl std::fmt::Display for UploadPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            UploadPhase::Init => "INIT",
            UploadPhase::Append => "APPEND",
            UploadPhase::Finalize => "FINALIZE",
            UploadPhase::Status => "STATUS",
        };
        f.write_str(name)
    }
}

/// Errors produced by the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Required credentials are missing or unusable. Raised at construction
    /// time, before any network call; never worth retrying.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The service answered with a non-2xx status. `message` is the first
    /// entry of the server's nested error list when one is present, else a
    /// generic description; `body` keeps the raw payload verbatim.
    #[error("twitter api error ({status}): {message}")]
    Transport {
        /// HTTP status code of the failed response.
        status: u16,
        /// Server-supplied error message, or a generic fallback.
        message: String,
        /// Raw response payload, when one was readable.
        body: Option<String>,
    },

    /// The expected result was absent from every known response shape.
    #[error("not found: {0}")]
    NotFound(String),

    /// A phase of the media upload protocol failed. The remaining phases are
    /// abandoned immediately; the caller must restart the whole upload.
    #[error("media upload failed during {phase}: {message}")]
    Upload {
        /// Protocol phase that failed.
        phase: UploadPhase,
        /// HTTP status of the failing response, when the failure was one.
        status: Option<u16>,
        /// Description of the failure.
        message: String,
    },

    /// The HTTP request itself could not be performed.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A body that had to be JSON could not be encoded or decoded.
    #[error("invalid payload: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// Builds a [`ClientError::Transport`] from a decoded error payload.
    ///
    /// Prefers the first message of a nested `errors` list when the server
    /// supplied one; otherwise falls back to a generic message carrying the
    /// status code.
    pub(crate) fn transport(status: u16, payload: &serde_json::Value, raw: String) -> Self {
        let message = payload
            .get("errors")
            .and_then(|e| e.as_array())
            .and_then(|a| a.first())
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("request rejected with status {}", status));
        ClientError::Transport {
            status,
            message,
            body: Some(raw),
        }
    }

    /// Re-tags an error raised inside the upload protocol with the phase it
    /// happened in, preserving the HTTP status where one exists.
    pub(crate) fn upload(phase: UploadPhase, source: ClientError) -> Self {
        match source {
            ClientError::Transport {
                status, message, ..
            } => ClientError::Upload {
                phase,
                status: Some(status),
                message,
            },
            other => ClientError::Upload {
                phase,
                status: None,
                message: other.to_string(),
            },
        }
    }
}
