//! Document retrieval and format detection.
//!
//! # Responsibilities
//! - GET a document with redirects and a bounded timeout
//! - Choose JSON or YAML from content-type, then URL suffix
//! - Fall back to YAML when a non-YAML document fails to parse as JSON
//! - Reject non-mapping roots

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::Client;
use serde_json::{Map, Number, Value};
use std::future::Future;
use std::time::Duration;

use crate::spec::types::{Document, FetchError};

/// Anything that can produce a parsed document for a URL.
///
/// The resolver is generic over this so it can run against an in-memory
/// source in tests.
pub trait DocumentSource: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Document, FetchError>> + Send;
}

/// HTTP document fetcher backed by the shared client.
#[derive(Debug, Clone)]
pub struct DocumentFetcher {
    client: Client,
    timeout: Duration,
}

impl DocumentFetcher {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// GET `url` with extra `headers` and parse the body.
    pub async fn fetch_with_headers(
        &self,
        url: &str,
        headers: HeaderMap,
    ) -> Result<Document, FetchError> {
        let response = self
            .client
            .get(url)
            .headers(headers)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let text = response.text().await.map_err(|e| classify(url, e))?;

        tracing::debug!(url = %url, content_type = %content_type, bytes = text.len(), "Fetched document");
        parse_document(&text, &content_type, url)
    }
}

impl DocumentSource for DocumentFetcher {
    async fn fetch(&self, url: &str) -> Result<Document, FetchError> {
        self.fetch_with_headers(url, HeaderMap::new()).await
    }
}

fn classify(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(url.to_string())
    } else {
        FetchError::Transport {
            url: url.to_string(),
            source: err,
        }
    }
}

/// Returns true if the document should be read as YAML.
fn declares_yaml(content_type: &str, url: &str) -> bool {
    if content_type.to_ascii_lowercase().contains("yaml") {
        return true;
    }
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.ends_with(".yaml") || path.ends_with(".yml")
}

/// Parse document text, choosing the format as described in the module docs.
pub fn parse_document(text: &str, content_type: &str, url: &str) -> Result<Document, FetchError> {
    let value = if declares_yaml(content_type, url) {
        parse_yaml(text)?
    } else {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => value,
            Err(json_err) => {
                tracing::debug!(url = %url, error = %json_err, "JSON parse failed, retrying as YAML");
                parse_yaml(text).map_err(|_| FetchError::Parse(json_err.to_string()))?
            }
        }
    };

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(FetchError::NotAMapping),
    }
}

fn parse_yaml(text: &str) -> Result<Value, FetchError> {
    let mut yaml: serde_yaml::Value =
        serde_yaml::from_str(text).map_err(|e| FetchError::Parse(e.to_string()))?;
    // `<<: *anchor` keys stay literal unless merged explicitly.
    yaml.apply_merge().map_err(|e| FetchError::Parse(e.to_string()))?;
    Ok(yaml_to_json(yaml))
}

/// Convert a YAML tree into the JSON node tree.
///
/// Scalar mapping keys are stringified (`200:` becomes `"200"`), tags are
/// dropped, and non-finite floats become null.
pub fn yaml_to_json(value: serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(mapping) => {
            let mut map = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                map.insert(yaml_key(key), yaml_to_json(value));
            }
            Value::Object(map)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => s,
        Yaml::Null => "null".to_string(),
        Yaml::Bool(b) => b.to_string(),
        Yaml::Number(n) => n.to_string(),
        Yaml::Tagged(tagged) => yaml_key(tagged.value),
        other => serde_json::to_string(&yaml_to_json(other)).unwrap_or_default(),
    }
}
