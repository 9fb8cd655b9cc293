//! Host and path predicates used by the router.
//!
//! # Responsibilities
//! - Match a host against an exact set of names
//! - Match a path by prefix or by contained substring
//! - Combine path conditions with OR semantics
//!
//! # Design Decisions
//! - Host matching is exact and case-sensitive; callers normalize
//! - Path matching is case-sensitive
//! - No regex to guarantee O(n) matching

/// Trait for matching a request path against a condition.
pub trait PathMatcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the path matches this condition.
    fn matches(&self, path: &str) -> bool;
}

/// Matches paths starting with a fixed prefix.
///
/// Plain string prefix: `/api` also matches `/apis`.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl PathMatcher for PathPrefixMatcher {
    fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }
}

/// Matches paths containing a fixed substring anywhere.
#[derive(Debug, Clone)]
pub struct PathContainsMatcher {
    needle: String,
}

impl PathContainsMatcher {
    pub fn new(needle: impl Into<String>) -> Self {
        Self {
            needle: needle.into(),
        }
    }
}

impl PathMatcher for PathContainsMatcher {
    fn matches(&self, path: &str) -> bool {
        path.contains(self.needle.as_str())
    }
}

/// Combines multiple matchers with OR semantics.
#[derive(Debug)]
pub struct AnyMatcher {
    matchers: Vec<Box<dyn PathMatcher>>,
}

impl AnyMatcher {
    pub fn new(matchers: Vec<Box<dyn PathMatcher>>) -> Self {
        Self { matchers }
    }
}

impl PathMatcher for AnyMatcher {
    fn matches(&self, path: &str) -> bool {
        self.matchers.iter().any(|m| m.matches(path))
    }
}

/// Matches a host against a fixed set of exact names.
///
/// An empty set never matches.
#[derive(Debug, Clone, Default)]
pub struct HostSetMatcher {
    hosts: Vec<String>,
}

impl HostSetMatcher {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hosts: hosts.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, host: &str) -> bool {
        // Sets are a handful of names; a linear scan beats hashing here.
        self.hosts.iter().any(|h| h == host)
    }
}
