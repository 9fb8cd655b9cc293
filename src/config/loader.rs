//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `routing.root_domain`.
pub const ROOT_DOMAIN_ENV: &str = "TENANT_ROUTER_ROOT_DOMAIN";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
///
/// Environment overrides are applied before validation.
pub fn load_config(path: &Path) -> Result<RouterConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content, |key| std::env::var(key).ok())
}

/// Default configuration with environment overrides applied, validated.
pub fn load_default() -> Result<RouterConfig, ConfigError> {
    parse_config("", |key| std::env::var(key).ok())
}

/// Parse and validate configuration text, resolving overrides through `env`.
pub fn parse_config<F>(content: &str, env: F) -> Result<RouterConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: RouterConfig = toml::from_str(content)?;
    apply_overrides(&mut config, env);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides to a parsed configuration.
pub fn apply_overrides<F>(config: &mut RouterConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(root) = env(ROOT_DOMAIN_ENV).filter(|v| !v.is_empty()) {
        tracing::debug!(root_domain = %root, "Root domain overridden from environment");
        config.routing.root_domain = root;
    }
}
