// Document store HTTP client
//
// Wraps `reqwest::Client` with resource-name construction, API key
// injection, and structured error parsing. Endpoint methods live in
// `documents.rs` to keep this module focused on transport mechanics.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Default public endpoint of the hosted document database.
pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1/";
/// Default database identifier within a project.
pub const DEFAULT_DATABASE: &str = "(default)";

/// Error body shape: `{"error": {"code": 404, "message": "...", "status": "NOT_FOUND"}}`.
#[derive(serde::Deserialize)]
struct ErrorResponse {
    error: Option<ErrorInner>,
}

#[derive(serde::Deserialize)]
struct ErrorInner {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Connection settings for a hosted document database.
///
/// Built by the config layer from file + environment; this crate never
/// reads configuration itself.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// API root, e.g. `https://firestore.googleapis.com/v1/`.
    pub base_url: Url,
    pub project_id: String,
    pub database_id: String,
    /// Sent as the `key` query parameter. `None` for emulators.
    pub api_key: Option<SecretString>,
    pub transport: TransportConfig,
}

impl StoreConfig {
    /// Config for `project_id` against the public endpoint.
    pub fn new(project_id: impl Into<String>) -> Result<Self, Error> {
        Ok(Self {
            base_url: Url::parse(DEFAULT_BASE_URL)?,
            project_id: project_id.into(),
            database_id: DEFAULT_DATABASE.into(),
            api_key: None,
            transport: TransportConfig::default(),
        })
    }

    pub fn with_api_key(mut self, key: SecretString) -> Self {
        self.api_key = Some(key);
        self
    }
}

/// Raw HTTP client for the document store REST API.
///
/// All document paths are rooted at
/// `projects/{project}/databases/{database}/documents`.
pub struct RestStore {
    http: reqwest::Client,
    base_url: Url,
    project_id: String,
    database_id: String,
    api_key: Option<SecretString>,
}

impl RestStore {
    /// Create a client from a `StoreConfig`, building a fresh `reqwest::Client`.
    pub fn new(config: &StoreConfig) -> Result<Self, Error> {
        let http = config.transport.build_client()?;
        Self::with_client(http, config)
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, config: &StoreConfig) -> Result<Self, Error> {
        let base_url = normalize_base_url(&config.base_url)?;
        Ok(Self {
            http,
            base_url,
            project_id: config.project_id.clone(),
            database_id: config.database_id.clone(),
            api_key: config.api_key.clone(),
        })
    }

    // ── Resource names ───────────────────────────────────────────────

    /// `projects/{p}/databases/{d}/documents`
    pub fn documents_root(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.project_id, self.database_id
        )
    }

    /// `projects/{p}/databases/{d}/documents/{collection}/{id}`
    pub fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/{collection}/{id}", self.documents_root())
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// URL of a single document. Segments are percent-encoded individually.
    pub(crate) fn document_url(&self, collection: &str, id: &str) -> Result<Url, Error> {
        self.url_with_segments(&[
            "projects",
            self.project_id.as_str(),
            "databases",
            self.database_id.as_str(),
            "documents",
            collection,
            id,
        ])
    }

    /// URL of a custom method on the documents root, e.g. `documents:runQuery`.
    pub(crate) fn rpc_url(&self, method: &str) -> Result<Url, Error> {
        let last = format!("documents:{method}");
        self.url_with_segments(&[
            "projects",
            self.project_id.as_str(),
            "databases",
            self.database_id.as_str(),
            last.as_str(),
        ])
    }

    fn url_with_segments(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.query(&[("key", key.expose_secret())]),
            None => builder,
        }
    }

    /// Send a GET request. `Ok(None)` on HTTP 404.
    pub(crate) async fn get_optional<T: DeserializeOwned>(
        &self,
        url: Url,
    ) -> Result<Option<T>, Error> {
        debug!("GET {url}");

        let resp = self.authorize(self.http.get(url)).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        self.handle_response(resp).await.map(Some)
    }

    /// Send a PATCH request with a JSON body.
    pub(crate) async fn patch_json<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, Error> {
        debug!("PATCH {url}");

        let resp = self.authorize(self.http.patch(url).json(body)).send().await?;
        self.handle_response(resp).await
    }

    /// Send a POST request with a JSON body.
    pub(crate) async fn post_json<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, Error> {
        debug!("POST {url}");

        let resp = self.authorize(self.http.post(url).json(body)).send().await?;
        self.handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(parse_error(status, resp).await);
        }

        let body = resp.text().await?;
        trace!(len = body.len(), "response body received");
        serde_json::from_str(&body).map_err(|e| {
            let head = preview(&body);
            Error::Deserialization {
                message: format!("{e} (body preview: {head:?})"),
                body,
            }
        })
    }
}

async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Error::InvalidApiKey;
    }

    let raw = resp.text().await.unwrap_or_default();

    match serde_json::from_str::<ErrorResponse>(&raw) {
        Ok(ErrorResponse { error: Some(inner) }) => Error::Api {
            status: status.as_u16(),
            message: inner.message.unwrap_or_else(|| status.to_string()),
            code: inner.status,
        },
        _ => Error::Api {
            status: status.as_u16(),
            message: if raw.is_empty() {
                status.to_string()
            } else {
                preview(&raw).to_owned()
            },
            code: None,
        },
    }
}

/// First 200 bytes of a body, cut on a char boundary.
fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

/// Ensure the base URL is hierarchical and ends with `/`.
fn normalize_base_url(raw: &Url) -> Result<Url, Error> {
    if raw.cannot_be_a_base() {
        return Err(Error::InvalidUrl(
            url::ParseError::RelativeUrlWithCannotBeABaseBase,
        ));
    }
    let mut url = raw.clone();
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    Ok(url)
}
