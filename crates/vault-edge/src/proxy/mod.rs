//! Same-origin edge proxy.
//!
//! Every method under `/api/*` is relayed to `{backend_url}{api_prefix}/{path}{query}`.
//! Only `content-type` crosses the edge in either direction, redirects are
//! surfaced rather than followed, and bodies pass through byte for byte.

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        HeaderMap, HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    upstream::{OutboundRequest, Upstream, UpstreamReply},
    AppState,
};

/// Path the proxy is mounted under on the edge's own origin.
pub const MOUNT: &str = "/api";

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("upstream unreachable: {0}")]
    Upstream(String),

    #[error("upstream timed out")]
    Timeout,

    #[error("invalid upstream target: {0}")]
    InvalidTarget(String),

    #[error("request body unreadable: {0}")]
    Body(String),

    #[error("request body of {0} bytes exceeds the limit")]
    TooLarge(u64),
}

impl ProxyError {
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_builder() {
            Self::InvalidTarget(err.to_string())
        } else {
            Self::Upstream(err.to_string())
        }
    }

    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::InvalidTarget(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Body(_) => StatusCode::BAD_REQUEST,
            Self::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = match &self {
            Self::Upstream(_) => "Bad gateway",
            Self::Timeout => "Gateway timeout",
            Self::InvalidTarget(_) => "Internal server error",
            Self::Body(_) => "Unreadable request body",
            Self::TooLarge(_) => "Request body too large",
        };
        (self.status_code(), body).into_response()
    }
}

/// Methods whose payload is read and forwarded. GET never carries one.
pub fn carries_body(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    pub segments: Vec<String>,
    pub query: Option<String>,
    pub content_type: Option<HeaderValue>,
    pub body: Option<Bytes>,
}

impl ProxyRequest {
    /// Splits the part of `path` after the mount point into segments.
    /// Empty segments (doubled or trailing slashes) are dropped.
    pub fn segments_from_path(path: &str) -> Vec<String> {
        path.strip_prefix(MOUNT)
            .unwrap_or(path)
            .split('/')
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect()
    }

    pub fn target_url(&self, backend_url: &str, api_prefix: &str) -> String {
        let joined = format!(
            "{}{}/{}",
            backend_url.trim_end_matches('/'),
            api_prefix,
            self.segments.join("/")
        );
        let mut url = joined.trim_end_matches('/').to_string();
        if let Some(query) = self.query.as_deref().filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }
        url
    }

    pub fn into_outbound(self, backend_url: &str, api_prefix: &str) -> OutboundRequest {
        let url = self.target_url(backend_url, api_prefix);
        let body = if carries_body(&self.method) {
            self.body
        } else {
            None
        };
        OutboundRequest {
            method: self.method,
            url,
            content_type: self.content_type,
            body,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

impl From<UpstreamReply> for ProxyResponse {
    fn from(reply: UpstreamReply) -> Self {
        Self {
            status: reply.status,
            content_type: reply.content_type,
            body: reply.body,
        }
    }
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let mut res = Response::new(Body::from(self.body));
        *res.status_mut() = self.status;
        if let Some(ct) = self.content_type {
            res.headers_mut().insert(CONTENT_TYPE, ct);
        }
        res
    }
}

pub async fn forward(
    upstream: &dyn Upstream,
    req: ProxyRequest,
    backend_url: &str,
    api_prefix: &str,
) -> Result<ProxyResponse, ProxyError> {
    let outbound = req.into_outbound(backend_url, api_prefix);
    let method = outbound.method.clone();
    let target = outbound.url.clone();

    match upstream.send(outbound).await {
        Ok(reply) => {
            debug!(%method, %target, status = reply.status.as_u16(), "proxied");
            Ok(reply.into())
        }
        Err(e) => {
            warn!(error = %e, %method, %target, upstream = upstream.name(), "upstream failed");
            Err(e)
        }
    }
}

/// Rejects a body whose declared length is already over `limit`.
fn check_declared_length(headers: &HeaderMap, limit: usize) -> Result<(), ProxyError> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    match declared {
        Some(len) if len > limit as u64 => Err(ProxyError::TooLarge(len)),
        _ => Ok(()),
    }
}

pub async fn handle(State(state): State<AppState>, req: Request) -> Response {
    let (parts, body) = req.into_parts();
    let limit = state.config.max_body_bytes;

    let body = if carries_body(&parts.method) {
        if let Err(e) = check_declared_length(&parts.headers, limit) {
            warn!(error = %e, limit, "request body rejected");
            return e.into_response();
        }
        // Undeclared or chunked bodies still stop at the limit.
        match axum::body::to_bytes(body, limit).await {
            Ok(bytes) => Some(bytes),
            Err(e) => return ProxyError::Body(e.to_string()).into_response(),
        }
    } else {
        None
    };

    let proxy_req = ProxyRequest {
        segments: ProxyRequest::segments_from_path(parts.uri.path()),
        query: parts.uri.query().map(ToString::to_string),
        content_type: parts.headers.get(CONTENT_TYPE).cloned(),
        method: parts.method,
        body,
    };

    forward(
        state.upstream.as_ref(),
        proxy_req,
        &state.config.backend_url,
        &state.config.api_prefix,
    )
    .await
    .into_response()
}
