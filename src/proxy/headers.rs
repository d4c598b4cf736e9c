//! Outbound header assembly and hop-by-hop filtering.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;

use crate::environment::AuthConfig;
use crate::proxy::types::ProxyError;

/// Connection-scoped headers a proxy never forwards.
pub const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// Auth headers first, then caller headers on top (same name replaces).
/// Hop-by-hop caller headers are dropped.
pub fn build_outbound_headers(
    auth: &AuthConfig,
    caller: &BTreeMap<String, String>,
) -> Result<HeaderMap, ProxyError> {
    let mut headers = HeaderMap::new();

    for (name, value) in auth.injected_headers() {
        headers.insert(parse_name(&name)?, parse_value(&name, &value)?);
    }

    for (name, value) in caller {
        if is_hop_by_hop(name) {
            continue;
        }
        headers.insert(parse_name(name)?, parse_value(name, value)?);
    }

    Ok(headers)
}

fn parse_name(name: &str) -> Result<HeaderName, ProxyError> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| ProxyError::InvalidRequest(format!("invalid header name '{name}'")))
}

fn parse_value(name: &str, value: &str) -> Result<HeaderValue, ProxyError> {
    HeaderValue::from_str(value)
        .map_err(|_| ProxyError::InvalidRequest(format!("invalid value for header '{name}'")))
}

/// Upstream response headers minus hop-by-hop ones. Repeated headers are
/// joined with `", "`; values that are not visible ASCII are passed lossily.
pub fn filter_response_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        if is_hop_by_hop(name.as_str()) {
            continue;
        }
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        out.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bearer() -> AuthConfig {
        AuthConfig::Bearer {
            token: Some("tok123".into()),
            prefix: "Bearer".into(),
        }
    }

    #[test]
    fn test_caller_header_wins() {
        let caller = BTreeMap::from([("authorization".to_string(), "Token mine".to_string())]);
        let headers = build_outbound_headers(&bearer(), &caller).unwrap();

        assert_eq!(headers.get_all("authorization").iter().count(), 1);
        assert_eq!(headers.get("Authorization").unwrap(), "Token mine");
    }

    #[test]
    fn test_hop_by_hop_never_forwarded() {
        let caller = BTreeMap::from([
            ("Connection".to_string(), "close".to_string()),
            ("TE".to_string(), "trailers".to_string()),
            ("Proxy-Authorization".to_string(), "x".to_string()),
            ("X-Trace".to_string(), "1".to_string()),
        ]);
        let headers = build_outbound_headers(&AuthConfig::None, &caller).unwrap();

        assert_eq!(headers.len(), 1);
        assert!(HOP_BY_HOP.iter().all(|h| !headers.contains_key(*h)));
        assert_eq!(headers.get("x-trace").unwrap(), "1");
    }

    #[test]
    fn test_invalid_caller_header() {
        let caller = BTreeMap::from([("bad header".to_string(), "v".to_string())]);
        assert!(matches!(
            build_outbound_headers(&AuthConfig::None, &caller),
            Err(ProxyError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_response_filter() {
        let mut upstream = HeaderMap::new();
        upstream.insert("content-type", HeaderValue::from_static("application/json"));
        upstream.insert("transfer-encoding", HeaderValue::from_static("chunked"));
        upstream.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        upstream.append("set-cookie", HeaderValue::from_static("a=1"));
        upstream.append("set-cookie", HeaderValue::from_static("b=2"));

        let filtered = filter_response_headers(&upstream);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered["content-type"], "application/json");
        assert_eq!(filtered["set-cookie"], "a=1, b=2");
    }
}
