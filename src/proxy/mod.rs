//! Proxy execution subsystem.
//!
//! # Data Flow
//! ```text
//! POST /api/proxy/execute (ProxyRequest)
//!     → environment store lookup
//!     → executor.rs OutboundRequest (path params, URL, headers, basic auth)
//!     → executor.rs Transport (shared pool, or one-off unverified client)
//!     → upstream
//!     → headers.rs filter + body normalization → ProxyResponse
//! ```
//!
//! # Design Decisions
//! - Caller headers override injected auth headers of the same name
//! - Hop-by-hop headers are stripped in both directions
//! - Timeout and connectivity failures stay distinct (504 vs 502)
//! - One attempt per call; retrying is the caller's decision

pub mod executor;
pub mod headers;
pub mod types;

pub use executor::{OutboundRequest, ProxyExecutor, Transport};
pub use types::{ProxyError, ProxyRequest, ProxyResponse};
