use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::EdgeConfig;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("backend transport error: {0}")]
    Transport(String),

    #[error("{status} {reason}")]
    Status { status: u16, reason: String },

    #[error("backend payload could not be decoded: {0}")]
    Decode(String),

    #[error("backend reported failure")]
    Rejected,

    #[error("invalid resource id {0:?}")]
    InvalidId(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else {
            Self::Transport(value.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

/// JSON client for the backend REST API, rooted at `{backend_url}{api_prefix}`.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    root: String,
}

impl BackendClient {
    pub fn new(backend_url: &str, api_prefix: &str, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            root: format!("{}{}", backend_url.trim_end_matches('/'), api_prefix),
        })
    }

    pub fn from_config(cfg: &EdgeConfig) -> anyhow::Result<Self> {
        Self::new(&cfg.backend_url, &cfg.api_prefix, cfg.upstream_timeout())
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.root, path)
    }

    /// GETs one entry of `collection`, with `id` sent as a single
    /// percent-encoded path segment.
    pub async fn get_entry<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<T, FetchError> {
        let path = format!("{collection}/{}", path_segment(id)?);
        self.get(&path, &[]).await
    }

    pub async fn get_value(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, FetchError> {
        let mut req = self.http.get(self.url(path));
        if !query.is_empty() {
            req = req.query(query);
        }
        let res = check_status(req.send().await?)?;
        Ok(res.json().await?)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let value = self.get_value(path, query).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, FetchError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let res = check_status(self.http.post(self.url(path)).json(body).send().await?)?;
        Ok(res.json().await?)
    }
}

/// Encodes `id` so it addresses exactly one path segment. Dot segments would
/// be resolved by the URL parser, so they are refused.
pub fn path_segment(id: &str) -> Result<String, FetchError> {
    if matches!(id, "" | "." | "..") {
        return Err(FetchError::InvalidId(id.to_string()));
    }
    Ok(urlencoding::encode(id).into_owned())
}

fn check_status(res: reqwest::Response) -> Result<reqwest::Response, FetchError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    Err(FetchError::Status {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("").to_string(),
    })
}
