//! Luminary: OpenAPI spec explorer and API test proxy.

pub mod api;
pub mod config;
pub mod environment;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod spec;

pub use config::schema::LuminaryConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
