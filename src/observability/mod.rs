//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, histograms via `metrics`)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a request's span
//! - Secrets never reach a log field; `AuthConfig` redacts itself in `Debug`
//! - Metric updates are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
