//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path, session cookies)
//!     → context.rs (RequestContext: hostname, path, authenticated)
//!     → router.rs (ordered rule table)
//!     → matcher.rs (host and path predicates)
//!     → Return: exactly one RoutingDecision
//!
//! Router Construction (at startup and on reload):
//!     RoutingConfig
//!     → Compile matchers (exact host set, path prefixes)
//!     → Freeze as immutable TenantRouter
//! ```
//!
//! # Design Decisions
//! - Router compiled once, immutable at runtime; reload swaps a whole new router
//! - No regex in hot path (prefix, contains and exact matching only)
//! - Deterministic: same context always yields the same decision
//! - First matching rule wins; rule order is fixed, not configurable
//! - No case or trailing-slash normalization of host or path

pub mod context;
pub mod decision;
pub mod matcher;
pub mod router;

pub use context::RequestContext;
pub use decision::RoutingDecision;
pub use router::TenantRouter;
