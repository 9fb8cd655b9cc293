//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, deserialize, apply env overrides)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!     → TenantRouter built from RoutingConfig
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → new config sent to the HTTP server
//!     → atomic swap of the routing state
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_default, ConfigError};
pub use schema::{
    ListenerConfig, LogFormat, ObservabilityConfig, RouterConfig, RoutingConfig, SessionConfig,
    TimeoutConfig, UpstreamConfig,
};
pub use validation::ValidationError;
