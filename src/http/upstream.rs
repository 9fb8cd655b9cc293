//! Forwarding to the rendering upstream.
//!
//! # Responsibilities
//! - Point the request at the upstream, optionally with a rewritten path
//! - Preserve method, headers, body, query and the original `Host`
//! - Add `X-Forwarded-For` / `X-Forwarded-Host`
//!
//! # Design Decisions
//! - One pooled hyper-util client, plain HTTP to the upstream
//! - Bodies stream through; nothing is buffered
//! - Rewrites are invisible to the client: no redirect, same response

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::uri::{Authority, InvalidUri, PathAndQuery, Scheme};
use axum::http::{header, HeaderValue, Request, Uri};
use axum::response::Response;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use thiserror::Error;

use crate::config::{TimeoutConfig, UpstreamConfig};

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_FORWARDED_HOST: &str = "x-forwarded-host";

/// Error type for forwarding.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The rewritten target is not a valid URI (e.g. odd bytes in the host).
    #[error("invalid upstream target: {0}")]
    InvalidTarget(#[from] axum::http::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
}

/// The rendering upstream and a client to reach it.
#[derive(Clone)]
pub struct Upstream {
    authority: Authority,
    client: Client<HttpConnector, Body>,
}

impl Upstream {
    pub fn new(config: &UpstreamConfig, timeouts: &TimeoutConfig) -> Result<Self, InvalidUri> {
        let authority: Authority = config.address.parse()?;

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self { authority, client })
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Forward `request`, replacing its path with `rewrite` when given.
    pub async fn forward(
        &self,
        request: Request<Body>,
        rewrite: Option<&str>,
    ) -> Result<Response, ForwardError> {
        let (mut parts, body) = request.into_parts();

        let host = crate::http::request::hostname(&parts.headers, &parts.uri).map(str::to_owned);
        let client_addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        parts.uri = upstream_uri(&parts.uri, rewrite, &self.authority)?;
        add_forwarded_headers(&mut parts.headers, host.as_deref(), client_addr);

        let response = self
            .client
            .request(Request::from_parts(parts, body))
            .await?;

        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

/// Absolute upstream URI: original path and query, or `rewrite` plus the
/// original query.
pub fn upstream_uri(
    original: &Uri,
    rewrite: Option<&str>,
    upstream: &Authority,
) -> Result<Uri, axum::http::Error> {
    let path_and_query = match (rewrite, original.query()) {
        (Some(path), Some(query)) => PathAndQuery::try_from(format!("{path}?{query}"))?,
        (Some(path), None) => PathAndQuery::try_from(path)?,
        (None, _) => original
            .path_and_query()
            .cloned()
            .unwrap_or_else(|| PathAndQuery::from_static("/")),
    };

    Uri::builder()
        .scheme(Scheme::HTTP)
        .authority(upstream.clone())
        .path_and_query(path_and_query)
        .build()
}

fn add_forwarded_headers(
    headers: &mut axum::http::HeaderMap,
    host: Option<&str>,
    client_addr: Option<SocketAddr>,
) {
    if let Some(host) = host.and_then(|h| HeaderValue::from_str(h).ok()) {
        if !headers.contains_key(header::HOST) {
            headers.insert(header::HOST, host.clone());
        }
        if !headers.contains_key(X_FORWARDED_HOST) {
            headers.insert(X_FORWARDED_HOST, host);
        }
    }

    if let Some(addr) = client_addr {
        let ip = addr.ip().to_string();
        let value = match headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
            Some(existing) => format!("{existing}, {ip}"),
            None => ip,
        };
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(X_FORWARDED_FOR, value);
        }
    }
}
