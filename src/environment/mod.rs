//! Environment subsystem.
//!
//! # Data Flow
//! ```text
//! POST/PUT /api/environments
//!     → store.rs (lock → mutate → persist tmp file → rename)
//!     → environments.json
//!
//! spec load / proxy execute
//!     → store.rs get(id)
//!     → types.rs AuthConfig (headers, basic credentials)
//! ```
//!
//! # Security Constraints
//! - Secrets live only in `Environment` and the persisted file
//! - Anything returned over HTTP goes through `EnvironmentPublic`

pub mod store;
pub mod types;

pub use store::{EnvironmentStore, StoreError};
pub use types::{
    AuthConfig, AuthConfigPublic, AuthKind, Environment, EnvironmentCreate, EnvironmentPublic,
    EnvironmentUpdate,
};
