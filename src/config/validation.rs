//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Detect hosts that would shadow the root domain
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::uri::Authority;
use thiserror::Error;

use crate::config::schema::RouterConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("routing.root_domain must not be empty")]
    EmptyRootDomain,

    #[error("routing.root_domain `{0}` must be a bare host (no scheme, path, or surrounding dots)")]
    MalformedRootDomain(String),

    #[error("routing.demo_hosts contains an empty entry")]
    EmptyDemoHost,

    #[error("routing.demo_hosts entry `{0}` equals the root domain and would hide it")]
    DemoHostShadowsRoot(String),

    #[error("routing.demo_redirect_url `{url}` is invalid: {reason}")]
    InvalidDemoRedirect { url: String, reason: String },

    #[error("session.cookie_names must list at least one cookie")]
    NoSessionCookies,

    #[error("session.cookie_names contains an empty entry")]
    EmptySessionCookie,

    #[error("{field} `{value}` is not a valid socket address")]
    InvalidSocketAddress { field: &'static str, value: String },

    #[error("upstream.address `{0}` is not a valid host:port authority")]
    InvalidUpstream(String),

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let routing = &config.routing;
    let root = routing.root_domain.as_str();
    if root.is_empty() {
        errors.push(ValidationError::EmptyRootDomain);
    } else if root.contains("://")
        || root.contains('/')
        || root.starts_with('.')
        || root.ends_with('.')
    {
        errors.push(ValidationError::MalformedRootDomain(root.to_string()));
    }

    for host in &routing.demo_hosts {
        if host.is_empty() {
            errors.push(ValidationError::EmptyDemoHost);
        } else if host == root {
            errors.push(ValidationError::DemoHostShadowsRoot(host.clone()));
        }
    }

    match url::Url::parse(&routing.demo_redirect_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::InvalidDemoRedirect {
            url: routing.demo_redirect_url.clone(),
            reason: format!("unsupported scheme `{}`", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError::InvalidDemoRedirect {
            url: routing.demo_redirect_url.clone(),
            reason: e.to_string(),
        }),
    }

    if config.session.cookie_names.is_empty() {
        errors.push(ValidationError::NoSessionCookies);
    } else if config.session.cookie_names.iter().any(|c| c.is_empty()) {
        errors.push(ValidationError::EmptySessionCookie);
    }

    check_socket_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_socket_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    let upstream_ok = config
        .upstream
        .address
        .parse::<Authority>()
        .map(|a| a.port_u16().is_some())
        .unwrap_or(false);
    if !upstream_ok {
        errors.push(ValidationError::InvalidUpstream(config.upstream.address.clone()));
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_socket_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidSocketAddress {
            field,
            value: value.to_string(),
        });
    }
}
