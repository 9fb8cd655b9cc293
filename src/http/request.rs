//! Request inspection.
//!
//! # Responsibilities
//! - Extract routing-relevant information (host, path, session presence)
//! - Read the request ID assigned at the edge
//!
//! # Design Decisions
//! - Host header first, URI authority second (HTTP/2 `:authority`)
//! - Session cookies are checked for presence only, never decoded
//! - Nothing is normalized; values reach the router verbatim

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, Uri};

use crate::config::SessionConfig;
use crate::routing::RequestContext;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// The request ID assigned by the request-id layer, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// The host a request was addressed to.
pub fn hostname<'a>(headers: &'a HeaderMap, uri: &'a Uri) -> Option<&'a str> {
    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()))
}

/// Detects an authenticated session by cookie presence.
#[derive(Debug, Clone)]
pub struct SessionDetector {
    cookie_names: Vec<String>,
}

impl SessionDetector {
    pub fn new<I, S>(cookie_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cookie_names: cookie_names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.cookie_names.iter().cloned())
    }

    /// True if any configured session cookie is present with a non-empty value.
    pub fn is_authenticated(&self, headers: &HeaderMap) -> bool {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.split_once('='))
            .any(|(name, value)| {
                !value.trim().is_empty() && self.cookie_names.iter().any(|c| c == name.trim())
            })
    }
}

/// Build the routing context for a request.
pub fn request_context<'a>(
    request: &'a Request<Body>,
    session: &SessionDetector,
) -> RequestContext<'a> {
    RequestContext::new(
        hostname(request.headers(), request.uri()),
        request.uri().path(),
        session.is_authenticated(request.headers()),
    )
}
