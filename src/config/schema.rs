//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for Luminary.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LuminaryConfig {
    /// HTTP server settings (bind address, request deadline).
    pub server: ServerConfig,

    /// Where environments are persisted.
    pub storage: StorageConfig,

    /// Spec loading settings.
    pub spec: SpecConfig,

    /// Proxy execution settings.
    pub proxy: ProxySettings,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8000").
    pub bind_address: String,

    /// Deadline for a whole inbound request, in seconds.
    ///
    /// Must exceed the longest proxy timeout a caller may ask for.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
            request_timeout_secs: 120,
        }
    }
}

/// Environment persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding `environments.json`.
    pub data_dir: PathBuf,
}

impl StorageConfig {
    /// Full path of the environments file.
    pub fn environments_path(&self) -> PathBuf {
        self.data_dir.join("environments.json")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

/// Spec loading configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SpecConfig {
    /// Timeout for each document fetch (root and external refs), in seconds.
    pub fetch_timeout_secs: u64,

    /// Maximum simultaneous in-flight external ref fetches.
    pub max_concurrent_fetches: usize,
}

impl Default for SpecConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 30,
            max_concurrent_fetches: 30,
        }
    }
}

/// Proxy execution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxySettings {
    /// Timeout applied by the shared pooled client, in seconds.
    pub shared_client_timeout_secs: u64,

    /// Maximum idle pooled connections kept per upstream host.
    pub pool_max_idle_per_host: usize,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            shared_client_timeout_secs: 60,
            pool_max_idle_per_host: 32,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
