use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use tenant_router::config::{load_config, load_default, ConfigError, RouterConfig};
use tenant_router::{RequestContext, TenantRouter};

#[derive(Parser)]
#[command(name = "router-cli")]
#[command(about = "Inspect tenant routing decisions offline", long_about = None)]
struct Cli {
    /// Configuration file. Defaults plus environment overrides when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how a request would be routed
    Explain {
        /// Host header value. Omit to simulate a request without one.
        #[arg(long)]
        host: Option<String>,
        /// Request path
        #[arg(long, default_value = "/")]
        path: String,
        /// Simulate a session cookie being present
        #[arg(long)]
        authenticated: bool,
    },
    /// Load and validate the configuration
    Check,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            for line in failure_lines(&e) {
                eprintln!("{}", line);
            }
            return Ok(ExitCode::FAILURE);
        }
    };

    let output = match cli.command {
        Commands::Explain {
            host,
            path,
            authenticated,
        } => explain(&config, host.as_deref(), &path, authenticated),
        Commands::Check => check(&config),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(ExitCode::SUCCESS)
}

fn load(path: Option<&std::path::Path>) -> Result<RouterConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => load_default(),
    }
}

/// Routing decision for one simulated request.
fn explain(config: &RouterConfig, host: Option<&str>, path: &str, authenticated: bool) -> Value {
    let router = TenantRouter::from_config(&config.routing);
    let ctx = RequestContext::new(host, path, authenticated);
    let decision = router.route(&ctx);

    json!({
        "root_domain": router.root_domain(),
        "tenant": ctx.host().map(|h| router.tenant_of(h)),
        "decision": decision,
    })
}

/// Summary of a configuration that loaded and validated.
fn check(config: &RouterConfig) -> Value {
    json!({
        "valid": true,
        "root_domain": config.routing.root_domain,
        "demo_hosts": config.routing.demo_hosts,
        "session_cookies": config.session.cookie_names,
        "upstream": config.upstream.address,
        "bind_address": config.listener.bind_address,
    })
}

/// Lines printed to stderr when the configuration cannot be used.
fn failure_lines(error: &ConfigError) -> Vec<String> {
    match error {
        ConfigError::Validation(errors) => {
            let mut lines = vec!["Error: configuration is invalid".to_string()];
            lines.extend(errors.iter().map(|e| format!("  - {}", e)));
            lines
        }
        e => vec![format!("Error: {}", e)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenant_router::config::loader::parse_config;

    fn config() -> RouterConfig {
        let mut config = RouterConfig::default();
        config.routing.root_domain = "example.com".into();
        config
    }

    #[test]
    fn test_explain_tenant_rewrite() {
        let output = explain(&config(), Some("acme.example.com"), "/pricing", false);
        assert_eq!(
            output,
            json!({
                "root_domain": "example.com",
                "tenant": "acme",
                "decision": { "action": "rewrite_path", "path": "/_sites/acme/pricing" },
            })
        );
    }

    #[test]
    fn test_explain_without_host() {
        let output = explain(&config(), None, "/", false);
        assert_eq!(output["tenant"], Value::Null);
        assert_eq!(output["decision"]["action"], "reject");
        assert_eq!(output["decision"]["status"], 400);
    }

    #[test]
    fn test_check_summary() {
        let output = check(&config());
        assert_eq!(output["valid"], true);
        assert_eq!(output["root_domain"], "example.com");
        assert_eq!(output["upstream"], config().upstream.address.as_str());
    }

    #[test]
    fn test_validation_failure_lines() {
        let error = parse_config(
            "[routing]\nroot_domain = \"\"\n[session]\ncookie_names = []\n",
            |_| None,
        )
        .unwrap_err();

        assert_eq!(
            failure_lines(&error),
            vec![
                "Error: configuration is invalid".to_string(),
                "  - routing.root_domain must not be empty".to_string(),
                "  - session.cookie_names must list at least one cookie".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_failure_is_one_line() {
        let error = parse_config("[routing", |_| None).unwrap_err();
        let lines = failure_lines(&error);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Error: Parse error"));
    }
}
