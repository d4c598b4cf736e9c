//! The "load spec" operation: fetch → resolve → flatten.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::time::Instant;
use url::Url;

use crate::environment::Environment;
use crate::observability::metrics;
use crate::spec::fetcher::DocumentFetcher;
use crate::spec::flattener::flatten_endpoints;
use crate::spec::resolver::ExternalRefResolver;
use crate::spec::types::{Document, FetchError, LoadedSpec, SpecError};

/// Loads one spec document at a time into a [`LoadedSpec`].
#[derive(Debug, Clone)]
pub struct SpecPipeline {
    fetcher: DocumentFetcher,
    max_concurrent_fetches: usize,
}

impl SpecPipeline {
    pub fn new(fetcher: DocumentFetcher, max_concurrent_fetches: usize) -> Self {
        Self {
            fetcher,
            max_concurrent_fetches,
        }
    }

    /// Fetch, validate, resolve and flatten the spec at `url`.
    ///
    /// When `environment` is given, its bearer or API-key header is sent
    /// with the root fetch. External refs are fetched without it.
    pub async fn load(
        &self,
        url: &str,
        environment: Option<&Environment>,
    ) -> Result<LoadedSpec, SpecError> {
        let start = Instant::now();
        let result = self.load_inner(url, environment).await;

        match &result {
            Ok(spec) => {
                metrics::record_spec_load("ok");
                tracing::info!(
                    url = %url,
                    title = %spec.title,
                    endpoints = spec.endpoints.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Spec loaded"
                );
            }
            Err(e) => {
                let outcome = match e {
                    SpecError::Fetch(_) => "fetch_error",
                    SpecError::Parse(_) => "parse_error",
                };
                metrics::record_spec_load(outcome);
                tracing::warn!(url = %url, error = %e, "Spec load failed");
            }
        }
        result
    }

    async fn load_inner(
        &self,
        url: &str,
        environment: Option<&Environment>,
    ) -> Result<LoadedSpec, SpecError> {
        let source = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let headers = environment.map(auth_headers).unwrap_or_default();
        let mut spec = self.fetcher.fetch_with_headers(url, headers).await?;
        ensure_openapi(&spec)?;

        ExternalRefResolver::new(&self.fetcher, self.max_concurrent_fetches)
            .resolve(&mut spec, &source)
            .await;

        Ok(assemble(spec, url))
    }
}

/// Headers the environment's auth contributes to the root fetch.
fn auth_headers(environment: &Environment) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in environment.auth.injected_headers() {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!(
                environment_id = %environment.id,
                header = %name,
                "Skipping auth header that is not a valid HTTP header"
            ),
        }
    }
    headers
}

/// Reject documents without an `openapi` or `swagger` discriminator.
pub fn ensure_openapi(spec: &Document) -> Result<(), SpecError> {
    if spec.contains_key("openapi") || spec.contains_key("swagger") {
        Ok(())
    } else {
        Err(SpecError::Parse(
            "Not a valid OpenAPI/Swagger spec (missing 'openapi' or 'swagger' key)".to_string(),
        ))
    }
}

/// Build the catalog from a fully resolved document.
pub fn assemble(spec: Document, source_url: &str) -> LoadedSpec {
    let info = spec.get("info").and_then(Value::as_object);
    let info_str = |key: &str| info.and_then(|i| i.get(key)).and_then(Value::as_str);

    let title = info_str("title").unwrap_or("Untitled").to_string();
    let version = match info.and_then(|i| i.get("version")) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "unknown".to_string(),
    };
    let description = info_str("description").map(String::from);

    LoadedSpec {
        title,
        version,
        description,
        base_url: infer_base_url(&spec),
        endpoints: flatten_endpoints(&spec),
        source_url: source_url.to_string(),
        loaded_at: chrono::Utc::now().to_rfc3339(),
        raw: spec,
    }
}

/// First `servers[].url` (OpenAPI 3), else `scheme://host basePath` (Swagger 2).
pub fn infer_base_url(spec: &Document) -> Option<String> {
    if let Some(servers) = spec.get("servers").and_then(Value::as_array) {
        if let Some(first) = servers.first() {
            return first.get("url").and_then(Value::as_str).map(String::from);
        }
    }

    let host = spec.get("host").and_then(Value::as_str)?;
    let scheme = spec
        .get("schemes")
        .and_then(Value::as_array)
        .and_then(|s| s.first())
        .and_then(Value::as_str)
        .unwrap_or("https");
    let base_path = spec.get("basePath").and_then(Value::as_str).unwrap_or("");
    Some(format!("{scheme}://{host}{base_path}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::AuthConfig;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("test document must be an object"),
        }
    }

    #[test]
    fn test_discriminator_required() {
        assert!(ensure_openapi(&doc(json!({"openapi": "3.1.0"}))).is_ok());
        assert!(ensure_openapi(&doc(json!({"swagger": "2.0"}))).is_ok());

        let err = ensure_openapi(&doc(json!({"info": {}, "paths": {"/a": {"get": {}}}})));
        assert!(matches!(err, Err(SpecError::Parse(_))));
    }

    #[test]
    fn test_assemble_metadata() {
        let loaded = assemble(
            doc(json!({
                "openapi": "3.0.0",
                "info": {"title": "Pets", "version": 2, "description": "All the pets"},
                "servers": [{"url": "https://api.example.com/v2"}, {"url": "https://other"}],
                "paths": {"/pets": {"get": {}}}
            })),
            "https://spec/openapi.json",
        );

        assert_eq!(loaded.title, "Pets");
        assert_eq!(loaded.version, "2");
        assert_eq!(loaded.description.as_deref(), Some("All the pets"));
        assert_eq!(loaded.base_url.as_deref(), Some("https://api.example.com/v2"));
        assert_eq!(loaded.endpoints.len(), 1);
        assert_eq!(loaded.source_url, "https://spec/openapi.json");
        assert!(chrono::DateTime::parse_from_rfc3339(&loaded.loaded_at).is_ok());
    }

    #[test]
    fn test_assemble_defaults() {
        let loaded = assemble(doc(json!({"openapi": "3.0.0"})), "u");
        assert_eq!(loaded.title, "Untitled");
        assert_eq!(loaded.version, "unknown");
        assert_eq!(loaded.base_url, None);
        assert!(loaded.endpoints.is_empty());
    }

    #[test]
    fn test_swagger_base_url() {
        let spec = doc(json!({
            "swagger": "2.0",
            "host": "petstore.swagger.io",
            "basePath": "/v2",
            "schemes": ["http", "https"]
        }));
        assert_eq!(
            infer_base_url(&spec).as_deref(),
            Some("http://petstore.swagger.io/v2")
        );

        let spec = doc(json!({"swagger": "2.0", "host": "h"}));
        assert_eq!(infer_base_url(&spec).as_deref(), Some("https://h"));
    }

    #[test]
    fn test_root_fetch_auth_headers() {
        let now = chrono::Utc::now();
        let env = Environment {
            id: "e".into(),
            name: "n".into(),
            base_url: "https://api".into(),
            auth: AuthConfig::ApiKey {
                token: Some("k".into()),
                header_name: Some("X-Custom-Key".into()),
            },
            verify_ssl: true,
            created_at: now,
            updated_at: now,
        };

        let headers = auth_headers(&env);
        assert_eq!(headers.get("x-custom-key").unwrap(), "k");
    }
}
