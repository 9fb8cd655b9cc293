//! Per-request routing input.

/// Read-only view of the request fields the router looks at.
///
/// Built fresh for every inbound request and dropped once the decision is
/// produced. Values are taken verbatim: the router does not lowercase hosts,
/// strip ports, or trim trailing slashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext<'a> {
    /// Host the request was addressed to. `None` or empty means missing.
    pub hostname: Option<&'a str>,
    /// Request path, expected to start with `/`.
    pub path: &'a str,
    /// Whether a session cookie was present.
    pub is_authenticated: bool,
}

impl<'a> RequestContext<'a> {
    pub fn new(hostname: Option<&'a str>, path: &'a str, is_authenticated: bool) -> Self {
        Self {
            hostname,
            path,
            is_authenticated,
        }
    }

    /// The hostname, if present and non-empty.
    pub fn host(&self) -> Option<&'a str> {
        self.hostname.filter(|h| !h.is_empty())
    }
}
