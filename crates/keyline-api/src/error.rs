use thiserror::Error;

/// Top-level error type for the `keyline-api` crate.
///
/// Covers every failure mode of the document store surface:
/// authentication, transport, structured API errors, batch writes, and decoding.
/// `keyline-core` maps these into the service error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// API key rejected by the store (HTTP 401 / 403).
    #[error("Invalid or unauthorized API key")]
    InvalidApiKey,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    ///
    /// Never carries the request URL: it holds the API key as a query
    /// parameter.
    #[error("HTTP transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Store API ───────────────────────────────────────────────────
    /// Structured error returned by the document store.
    #[error("Document store error (HTTP {status}): {message}")]
    Api {
        message: String,
        /// Canonical status string (e.g. `"NOT_FOUND"`, `"PERMISSION_DENIED"`).
        code: Option<String>,
        status: u16,
    },

    /// One write inside a `batchWrite` request was rejected.
    #[error("Batch write {index} rejected (code {code}): {message}")]
    Write {
        index: usize,
        code: i32,
        message: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }

    /// Extract the store's canonical status code, if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.without_url())
    }
}
