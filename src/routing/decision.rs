//! Routing decisions.

use axum::http::StatusCode;
use serde::{Serialize, Serializer};

/// Diagnostic attached to the missing-host rejection.
pub const MISSING_HOST_REASON: &str = "No hostname found in request headers";

/// Diagnostic attached to requests for the internal sites namespace.
pub const HIDDEN_NAMESPACE_REASON: &str = "Not Found";

/// The single outcome of routing one request.
///
/// The HTTP layer owns executing it; see `http::response`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RoutingDecision {
    /// Terminate with an empty body.
    Reject {
        #[serde(serialize_with = "serialize_status")]
        status: StatusCode,
        reason: &'static str,
    },
    /// Redirect to an absolute URL on another host.
    RedirectExternal { url: String },
    /// Redirect to another path on the requested host.
    RedirectInternal { path: String },
    /// Serve from a different path without telling the client.
    RewritePath { path: String },
    /// Forward the request unchanged.
    PassThrough,
}

impl RoutingDecision {
    pub fn reject(status: StatusCode, reason: &'static str) -> Self {
        Self::Reject { status, reason }
    }

    /// Stable label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Reject { .. } => "reject",
            Self::RedirectExternal { .. } => "redirect_external",
            Self::RedirectInternal { .. } => "redirect_internal",
            Self::RewritePath { .. } => "rewrite_path",
            Self::PassThrough => "pass_through",
        }
    }
}

fn serialize_status<S: Serializer>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u16(status.as_u16())
}
