//! Spec resolution subsystem.
//!
//! # Data Flow
//! ```text
//! POST /api/spec/load {url, environment_id?}
//!     → fetcher.rs   (GET root, JSON/YAML, must be a mapping)
//!     → pipeline.rs  (require openapi/swagger key)
//!     → resolver.rs  (external path items + parameters, bounded fan-out)
//!     → flattener.rs (one EndpointSummary per path × method)
//!     → slot.rs      (replace current spec)
//! ```
//!
//! # Design Decisions
//! - Strict at the root: fetch failure → 502, parse failure → 422
//! - Lenient for satellites: a failed external ref stays unresolved
//! - The fetch cache lives for one load only; reloads always refetch

pub mod fetcher;
pub mod flattener;
pub mod pipeline;
pub mod resolver;
pub mod slot;
pub mod types;

pub use fetcher::{DocumentFetcher, DocumentSource};
pub use pipeline::SpecPipeline;
pub use slot::SpecSlot;
pub use types::{
    Document, EndpointSummary, FetchError, LoadedSpec, ParameterInfo, ParameterLocation, SpecError,
};
