//! Endpoint catalog extraction.
//!
//! One [`EndpointSummary`] per (path, method) pair, in document order.
//! Path-level parameters come first, then the operation's own; duplicates
//! across the two levels are kept.

use serde_json::Value;

use crate::spec::resolver::{ref_target, resolve_internal_ref, resolve_schema};
use crate::spec::types::{is_http_method, Document, EndpointSummary, ParameterInfo, ParameterLocation};

/// Request body media types, in preference order.
const BODY_MEDIA_TYPES: [&str; 3] = [
    "application/json",
    "application/x-www-form-urlencoded",
    "multipart/form-data",
];

/// Flatten the `paths` table of a fully resolved document.
pub fn flatten_endpoints(spec: &Document) -> Vec<EndpointSummary> {
    let Some(paths) = spec.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut endpoints = Vec::new();
    for (path, item) in paths {
        let Some(item) = item.as_object() else {
            continue;
        };
        for (method, operation) in item {
            if !is_http_method(method) {
                continue;
            }
            let Some(operation) = operation.as_object() else {
                continue;
            };
            endpoints.push(summarize(path, method, operation, item, spec));
        }
    }
    endpoints
}

fn summarize(
    path: &str,
    method: &str,
    operation: &Document,
    item: &Document,
    spec: &Document,
) -> EndpointSummary {
    let body = extract_request_body(operation, spec);
    EndpointSummary {
        method: method.to_ascii_uppercase(),
        path: path.to_string(),
        operation_id: string_field(operation, "operationId"),
        summary: string_field(operation, "summary"),
        description: string_field(operation, "description"),
        tags: operation
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| tags.iter().filter_map(|t| t.as_str().map(String::from)).collect())
            .unwrap_or_default(),
        parameters: extract_parameters(operation, item, spec),
        has_request_body: body.present,
        request_body_schema: body.schema,
        request_body_required: body.required,
    }
}

fn string_field(map: &Document, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(String::from)
}

fn parameter_array(map: &Document) -> &[Value] {
    map.get("parameters")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Merge path-level and operation-level parameters.
pub fn extract_parameters(
    operation: &Document,
    item: &Document,
    spec: &Document,
) -> Vec<ParameterInfo> {
    parameter_array(item)
        .iter()
        .chain(parameter_array(operation))
        .filter_map(|raw| parameter_info(raw, spec))
        .collect()
}

fn parameter_info(raw: &Value, spec: &Document) -> Option<ParameterInfo> {
    let resolved;
    let param = match ref_target(raw) {
        Some(reference) => {
            resolved = resolve_internal_ref(reference, spec);
            &resolved
        }
        None => raw.as_object()?,
    };
    if param.is_empty() {
        return None;
    }

    let location = match param.get("in").and_then(Value::as_str) {
        None => ParameterLocation::Query,
        Some(value) => match ParameterLocation::parse(value) {
            Some(location) => location,
            None => {
                tracing::debug!(location = %value, "Skipping parameter with unsupported location");
                return None;
            }
        },
    };

    let schema = match param.get("schema") {
        Some(schema) => resolve_schema(schema, spec),
        None => Value::Object(Document::new()),
    };

    Some(ParameterInfo {
        name: string_field(param, "name").unwrap_or_default(),
        location,
        required: param.get("required").and_then(Value::as_bool).unwrap_or(false),
        description: string_field(param, "description"),
        schema,
    })
}

/// What the catalog knows about an operation's request body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestBodyInfo {
    pub present: bool,
    pub schema: Option<Value>,
    pub required: bool,
}

/// Read `requestBody`, dereferencing it and its chosen schema one level.
pub fn extract_request_body(operation: &Document, spec: &Document) -> RequestBodyInfo {
    let Some(raw) = operation.get("requestBody") else {
        return RequestBodyInfo::default();
    };

    let resolved;
    let body = match ref_target(raw) {
        Some(reference) => {
            resolved = resolve_internal_ref(reference, spec);
            &resolved
        }
        None => match raw.as_object() {
            Some(body) => body,
            None => {
                return RequestBodyInfo {
                    present: true,
                    ..Default::default()
                }
            }
        },
    };

    let required = body.get("required").and_then(Value::as_bool).unwrap_or(false);
    let content = body.get("content").and_then(Value::as_object);
    let schema = content.and_then(|content| {
        BODY_MEDIA_TYPES.iter().find_map(|media_type| {
            let media = content.get(*media_type)?;
            Some(match media.get("schema") {
                Some(schema) => resolve_schema(schema, spec),
                None => Value::Object(Document::new()),
            })
        })
    });

    RequestBodyInfo {
        present: true,
        schema,
        required,
    }
}
