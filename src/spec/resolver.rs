//! `$ref` resolution.
//!
//! # Internal refs
//! `#/a/b/c` is resolved by descending the root document key by key. Any
//! missing key or non-mapping node yields an empty object.
//!
//! # External refs
//! Path items given as `{"$ref": "<url>"}` are inlined in four phases, each
//! finishing before the next starts:
//!
//! ```text
//! 1. discover   path-item stubs → absolute URLs (relative to the spec)
//! 2. fetch      all path-item URLs          ┐ bounded by one semaphore,
//! 3. fetch      their external parameter refs┘ deduplicated by one cache
//! 4. inline     substitute parameters, splice path items into `paths`
//! ```
//!
//! Failures of these satellite documents never fail the load: the affected
//! stub or parameter is left as it was.
//!
//! Only one level is followed (path items and their parameters). Refs inside
//! a fetched parameter document, or path-item stubs inside a fetched path
//! item, are not chased, so self-referencing documents cannot recurse.

use futures_util::future::join_all;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::Semaphore;
use url::Url;

use crate::observability::metrics;
use crate::spec::fetcher::DocumentSource;
use crate::spec::types::{is_http_method, Document, FetchError};

/// Default bound on simultaneous external fetches.
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 30;

/// Resolve an in-document pointer, returning an empty object on any miss.
pub fn resolve_internal_ref(reference: &str, root: &Document) -> Document {
    lookup_internal_ref(reference, root)
        .cloned()
        .unwrap_or_default()
}

/// Borrowing form of [`resolve_internal_ref`].
pub fn lookup_internal_ref<'a>(reference: &str, root: &'a Document) -> Option<&'a Document> {
    let pointer = reference.strip_prefix("#/")?;
    let mut node = root;
    for segment in pointer.split('/') {
        let key = segment.replace("~1", "/").replace("~0", "~");
        node = node.get(&key)?.as_object()?;
    }
    Some(node)
}

/// Dereference `value` one level if it is an internal `$ref` object.
pub fn resolve_schema(value: &Value, root: &Document) -> Value {
    match ref_target(value) {
        Some(reference) => Value::Object(resolve_internal_ref(reference, root)),
        None => value.clone(),
    }
}

/// The `$ref` string of an object node, if any.
pub fn ref_target(value: &Value) -> Option<&str> {
    value.as_object()?.get("$ref")?.as_str()
}

fn is_external(reference: &str) -> bool {
    !reference.starts_with('#')
}

/// A path item that is nothing but an external `$ref`.
fn external_stub(item: &Value) -> Option<&str> {
    let map = item.as_object()?;
    if map.len() != 1 {
        return None;
    }
    map.get("$ref")?.as_str().filter(|r| is_external(r))
}

/// Per-resolution cache of fetch results, keyed by absolute URL.
#[derive(Debug, Default)]
pub struct FetchCache {
    entries: HashMap<String, Result<Document, FetchError>>,
}

impl FetchCache {
    pub fn get(&self, url: &str) -> Option<&Result<Document, FetchError>> {
        self.entries.get(url)
    }

    /// The fetched document, or `None` if missing or failed.
    pub fn document(&self, url: &str) -> Option<&Document> {
        self.entries.get(url)?.as_ref().ok()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A path whose item is an external stub, with the stub's absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ExternalPathItem {
    path: String,
    url: Url,
}

/// Inlines external path items of one document.
pub struct ExternalRefResolver<'s, S> {
    source: &'s S,
    permits: Semaphore,
    cache: FetchCache,
}

impl<'s, S: DocumentSource> ExternalRefResolver<'s, S> {
    pub fn new(source: &'s S, max_concurrent: usize) -> Self {
        Self {
            source,
            permits: Semaphore::new(max_concurrent.max(1)),
            cache: FetchCache::default(),
        }
    }

    /// Resolve every external path-item stub of `spec` in place.
    ///
    /// `spec_url` is the location `spec` was loaded from.
    pub async fn resolve(mut self, spec: &mut Document, spec_url: &Url) -> FetchCache {
        let items = discover_path_items(spec, spec_url);
        if items.is_empty() {
            return self.cache;
        }
        tracing::debug!(count = items.len(), "Resolving external path items");

        let item_urls: Vec<Url> = items.iter().map(|i| i.url.clone()).collect();
        self.fetch_all(item_urls).await;

        let param_urls = self.discover_parameter_refs(&items);
        if !param_urls.is_empty() {
            tracing::debug!(count = param_urls.len(), "Resolving external parameter refs");
            self.fetch_all(param_urls).await;
        }

        self.inline(spec, &items);
        self.cache
    }

    /// Fetch every URL not yet cached, at most `max_concurrent` at a time.
    /// Returns once all of them have completed.
    async fn fetch_all(&mut self, urls: Vec<Url>) {
        let mut pending: Vec<String> = Vec::new();
        for url in urls {
            let url = String::from(url);
            if !self.cache.contains(&url) && !pending.contains(&url) {
                pending.push(url);
            }
        }

        let permits = &self.permits;
        let source = self.source;
        let results = join_all(pending.into_iter().map(|url| async move {
            let result = match permits.acquire().await {
                Ok(_permit) => source.fetch(&url).await,
                Err(_) => Err(FetchError::Parse("fetch pool closed".to_string())),
            };
            (url, result)
        }))
        .await;

        for (url, result) in results {
            match &result {
                Ok(_) => metrics::record_ref_fetch("ok"),
                Err(e) => {
                    metrics::record_ref_fetch("error");
                    tracing::warn!(url = %url, error = %e, "External ref left unresolved");
                }
            }
            self.cache.entries.insert(url, result);
        }
    }

    fn discover_parameter_refs(&self, items: &[ExternalPathItem]) -> Vec<Url> {
        let mut urls = Vec::new();
        for item in items {
            let Some(doc) = self.cache.document(item.url.as_str()) else {
                continue;
            };
            for params in parameter_lists(doc) {
                for param in params {
                    if let Some(url) = external_param_url(param, &item.url) {
                        if !urls.contains(&url) {
                            urls.push(url);
                        }
                    }
                }
            }
        }
        urls
    }

    fn inline(&self, spec: &mut Document, items: &[ExternalPathItem]) {
        let Some(Value::Object(paths)) = spec.get_mut("paths") else {
            return;
        };

        for item in items {
            let mut doc = match self.cache.get(item.url.as_str()) {
                Some(Ok(doc)) if !doc.is_empty() => doc.clone(),
                _ => continue,
            };

            for (key, operation) in doc.iter_mut() {
                let params = if key == "parameters" {
                    Some(operation)
                } else if is_http_method(key) {
                    operation.as_object_mut().and_then(|op| op.get_mut("parameters"))
                } else {
                    None
                };
                if let Some(Value::Array(params)) = params {
                    for param in params.iter_mut() {
                        self.substitute_parameter(param, &item.url);
                    }
                }
            }

            if let Some(slot) = paths.get_mut(&item.path) {
                *slot = Value::Object(doc);
            }
        }
    }

    /// Replace an external-ref parameter with its fetched document. A failed
    /// or missing fetch leaves the reference object in place.
    fn substitute_parameter(&self, param: &mut Value, base: &Url) {
        let Some(url) = external_param_url(param, base) else {
            return;
        };
        if let Some(resolved) = self.cache.document(url.as_str()) {
            *param = Value::Object(resolved.clone());
        }
    }
}

/// Phase 1: every pure external path-item stub, resolved against the
/// directory of the spec.
fn discover_path_items(spec: &Document, spec_url: &Url) -> Vec<ExternalPathItem> {
    let Some(paths) = spec.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };

    paths
        .iter()
        .filter_map(|(path, item)| {
            let reference = external_stub(item)?;
            match spec_url.join(reference) {
                Ok(url) => Some(ExternalPathItem {
                    path: path.clone(),
                    url,
                }),
                Err(e) => {
                    tracing::warn!(path = %path, reference = %reference, error = %e, "Unresolvable path item ref");
                    None
                }
            }
        })
        .collect()
}

/// Parameter arrays of a path item: its shared list and each operation's.
fn parameter_lists(item: &Document) -> impl Iterator<Item = &Vec<Value>> {
    item.iter().filter_map(|(key, value)| {
        if key == "parameters" {
            value.as_array()
        } else if is_http_method(key) {
            value.as_object()?.get("parameters")?.as_array()
        } else {
            None
        }
    })
}

/// Absolute URL of an external-ref parameter, relative to its own document.
fn external_param_url(param: &Value, base: &Url) -> Option<Url> {
    let reference = ref_target(param).filter(|r| is_external(r))?;
    base.join(reference).ok()
}
