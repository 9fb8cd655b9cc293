//! Tenant routing rule table.
//!
//! # Responsibilities
//! - Hold the compiled routing configuration
//! - Classify a request context into exactly one decision
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Rules evaluated in a fixed order; first match wins
//! - Tenant existence is not checked; the tenant is an opaque key

use axum::http::StatusCode;

use crate::config::RoutingConfig;
use crate::routing::context::RequestContext;
use crate::routing::decision::{RoutingDecision, HIDDEN_NAMESPACE_REASON, MISSING_HOST_REASON};
use crate::routing::matcher::{
    AnyMatcher, HostSetMatcher, PathContainsMatcher, PathMatcher, PathPrefixMatcher,
};

/// Subdomain reserved for the authenticated application.
pub const APP_TENANT: &str = "app";

/// Internal namespace serving the application.
pub const APP_NAMESPACE: &str = "/app";

/// Internal namespace serving the root-domain landing pages.
pub const HOME_NAMESPACE: &str = "/home";

/// Internal namespace serving tenant sites. Never reachable from outside.
pub const SITES_NAMESPACE: &str = "/_sites";

/// Prefix of host-agnostic API routes.
pub const API_PREFIX: &str = "/api";

/// Login page of the application.
pub const LOGIN_PATH: &str = "/login";

/// Classifies requests by hostname and path.
#[derive(Debug)]
pub struct TenantRouter {
    root_domain: String,
    /// `".{root_domain}"`, stripped from subdomain hosts to get the tenant.
    root_suffix: String,
    demo_hosts: HostSetMatcher,
    demo_redirect_url: String,
    hidden: PathPrefixMatcher,
    bypass: AnyMatcher,
}

impl TenantRouter {
    /// Build a router from validated routing configuration.
    pub fn from_config(config: &RoutingConfig) -> Self {
        Self {
            root_domain: config.root_domain.clone(),
            root_suffix: format!(".{}", config.root_domain),
            demo_hosts: HostSetMatcher::new(config.demo_hosts.iter().cloned()),
            demo_redirect_url: config.demo_redirect_url.clone(),
            hidden: PathPrefixMatcher::new(SITES_NAMESPACE),
            bypass: AnyMatcher::new(vec![
                Box::new(PathContainsMatcher::new(".")),
                Box::new(PathPrefixMatcher::new(API_PREFIX)),
            ]),
        }
    }

    /// Router for `root_domain` with the default demo hosts.
    pub fn new(root_domain: impl Into<String>) -> Self {
        Self::from_config(&RoutingConfig {
            root_domain: root_domain.into(),
            ..RoutingConfig::default()
        })
    }

    pub fn root_domain(&self) -> &str {
        &self.root_domain
    }

    /// Tenant key for a host: the host minus a trailing `.{root_domain}`.
    ///
    /// Hosts without that suffix (the root domain itself, custom domains)
    /// come back unchanged.
    pub fn tenant_of<'h>(&self, hostname: &'h str) -> &'h str {
        hostname
            .strip_suffix(self.root_suffix.as_str())
            .unwrap_or(hostname)
    }

    /// Decide what to do with a request.
    pub fn route(&self, ctx: &RequestContext<'_>) -> RoutingDecision {
        let Some(hostname) = ctx.host() else {
            return RoutingDecision::reject(StatusCode::BAD_REQUEST, MISSING_HOST_REASON);
        };

        if self.demo_hosts.matches(hostname) {
            return RoutingDecision::RedirectExternal {
                url: self.demo_redirect_url.clone(),
            };
        }

        let tenant = self.tenant_of(hostname);
        let path = ctx.path;

        if self.hidden.matches(path) {
            return RoutingDecision::reject(StatusCode::NOT_FOUND, HIDDEN_NAMESPACE_REASON);
        }

        if self.bypass.matches(path) {
            return RoutingDecision::PassThrough;
        }

        if tenant == APP_TENANT {
            if ctx.is_authenticated && path == LOGIN_PATH {
                return RoutingDecision::RedirectInternal { path: "/".into() };
            }
            return RoutingDecision::RewritePath {
                path: format!("{APP_NAMESPACE}{path}"),
            };
        }

        if hostname == self.root_domain {
            return RoutingDecision::RewritePath {
                path: format!("{HOME_NAMESPACE}{path}"),
            };
        }

        RoutingDecision::RewritePath {
            path: format!("{SITES_NAMESPACE}/{tenant}{path}"),
        }
    }
}
