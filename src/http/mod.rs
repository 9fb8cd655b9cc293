//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → request.rs (host, path, session cookie presence)
//!     → routing::TenantRouter (decision)
//!     → response.rs (reject / redirect)
//!       or upstream.rs (rewrite / pass-through to the renderer)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod upstream;

pub use request::{SessionDetector, X_REQUEST_ID};
pub use server::HttpServer;
