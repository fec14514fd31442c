use std::time::Duration;

use axum::{
    body::Bytes,
    http::{header::CONTENT_TYPE, HeaderValue, Method, StatusCode},
};

use crate::proxy::ProxyError;

/// A request as it leaves the edge, already reduced to what the forwarding
/// policy allows through.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub content_type: Option<HeaderValue>,
    pub body: Option<Bytes>,
}

#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

#[async_trait::async_trait]
pub trait Upstream: Send + Sync {
    fn name(&self) -> &'static str;
    async fn send(&self, req: OutboundRequest) -> Result<UpstreamReply, ProxyError>;
}

pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    pub fn new(timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait::async_trait]
impl Upstream for HttpUpstream {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn send(&self, req: OutboundRequest) -> Result<UpstreamReply, ProxyError> {
        let mut builder = self.client.request(req.method, &req.url);
        if let Some(ct) = req.content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        if let Some(body) = req.body {
            builder = builder.body(body);
        }

        let res = builder.send().await.map_err(ProxyError::from_transport)?;
        let status = res.status();
        let content_type = res.headers().get(CONTENT_TYPE).cloned();
        let body = res.bytes().await.map_err(ProxyError::from_transport)?;

        Ok(UpstreamReply {
            status,
            content_type,
            body,
        })
    }
}
