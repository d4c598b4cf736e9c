//! Builds, dispatches and normalizes one proxied call.

use reqwest::header::{HeaderMap, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Url};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::environment::Environment;
use crate::observability::metrics;
use crate::proxy::headers::{build_outbound_headers, filter_response_headers};
use crate::proxy::types::{ProxyError, ProxyRequest, ProxyResponse};

/// Replace each `{name}` with its percent-encoded value. Placeholders with
/// no matching value are left as they are.
pub fn substitute_path_params(path: &str, params: &BTreeMap<String, String>) -> String {
    params.iter().fold(path.to_string(), |path, (name, value)| {
        path.replace(&format!("{{{name}}}"), &urlencoding::encode(value))
    })
}

/// Everything needed to send the upstream call, before a transport is chosen.
#[derive(Debug)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub basic_auth: Option<(String, String)>,
    pub body: Option<Value>,
    pub timeout: Duration,
}

impl OutboundRequest {
    /// `max_timeout` is the inbound request deadline. The caller timeout must
    /// be below it.
    pub fn build(
        request: &ProxyRequest,
        env: &Environment,
        max_timeout: Duration,
    ) -> Result<Self, ProxyError> {
        let method = Method::from_bytes(request.method.to_ascii_uppercase().as_bytes())
            .map_err(|_| ProxyError::InvalidRequest(format!("invalid method '{}'", request.method)))?;

        let path = substitute_path_params(&request.path, &request.path_params);
        let raw_url = format!("{}{}", env.base_url.trim_end_matches('/'), path);
        let url = Url::parse(&raw_url)
            .map_err(|e| ProxyError::InvalidRequest(format!("invalid URL '{raw_url}': {e}")))?;

        let timeout = parse_timeout(request.timeout, max_timeout)?;

        let headers = build_outbound_headers(&env.auth, &request.headers)?;
        // A caller Authorization header replaces basic credentials.
        let basic_auth = if headers.contains_key(AUTHORIZATION) {
            None
        } else {
            env.auth
                .basic_credentials()
                .map(|(user, pass)| (user.to_string(), pass.to_string()))
        };

        Ok(Self {
            method,
            url,
            query: request
                .query_params
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            headers,
            basic_auth,
            body: request.body.clone(),
            timeout,
        })
    }
}

/// Positive, finite and strictly below `max_timeout`.
fn parse_timeout(secs: f64, max_timeout: Duration) -> Result<Duration, ProxyError> {
    let invalid = || {
        ProxyError::InvalidRequest(format!(
            "timeout must be a positive number of seconds below {}, got {secs}",
            max_timeout.as_secs_f64()
        ))
    };
    if !secs.is_finite() || secs <= 0.0 {
        return Err(invalid());
    }
    let timeout = Duration::try_from_secs_f64(secs).map_err(|_| invalid())?;
    if timeout >= max_timeout {
        return Err(invalid());
    }
    Ok(timeout)
}

/// The client a call goes out on.
///
/// `Ephemeral` is built for one unverified-TLS call and dropped with it; the
/// shared pool is never reconfigured.
#[derive(Debug)]
pub enum Transport<'a> {
    Shared(&'a Client),
    Ephemeral(Client),
}

impl<'a> Transport<'a> {
    pub fn for_environment(shared: &'a Client, env: &Environment) -> Result<Self, ProxyError> {
        if env.verify_ssl {
            return Ok(Transport::Shared(shared));
        }
        Client::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map(Transport::Ephemeral)
            .map_err(|e| ProxyError::Connectivity(format!("failed to build unverified client: {e}")))
    }

    pub fn client(&self) -> &Client {
        match self {
            Transport::Shared(client) => client,
            Transport::Ephemeral(client) => client,
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, Transport::Shared(_))
    }
}

/// Runs proxy calls over the shared pooled client.
#[derive(Debug, Clone)]
pub struct ProxyExecutor {
    shared: Client,
    max_timeout: Duration,
}

impl ProxyExecutor {
    /// `max_timeout` bounds the per-call timeout a caller may ask for.
    pub fn new(shared: Client, max_timeout: Duration) -> Self {
        Self {
            shared,
            max_timeout,
        }
    }

    /// Execute `request` against `env`. One attempt, no retries.
    pub async fn execute(
        &self,
        request: &ProxyRequest,
        env: &Environment,
    ) -> Result<ProxyResponse, ProxyError> {
        let outbound = OutboundRequest::build(request, env, self.max_timeout)?;
        let transport = Transport::for_environment(&self.shared, env)?;
        let method = outbound.method.to_string();

        tracing::debug!(
            environment_id = %env.id,
            method = %method,
            url = %outbound.url,
            shared_transport = transport.is_shared(),
            "Dispatching proxy request"
        );

        let mut builder = transport
            .client()
            .request(outbound.method, outbound.url)
            .headers(outbound.headers)
            .timeout(outbound.timeout);
        if !outbound.query.is_empty() {
            builder = builder.query(&outbound.query);
        }
        if let Some((username, password)) = &outbound.basic_auth {
            builder = builder.basic_auth(username, Some(password));
        }
        if let Some(body) = &outbound.body {
            builder = builder.json(body);
        }

        let start = Instant::now();
        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = ProxyError::from_transport(e);
                let gateway_status = match err {
                    ProxyError::Timeout(_) => 504,
                    _ => 502,
                };
                metrics::record_proxy_request(&method, gateway_status, start.elapsed());
                tracing::warn!(environment_id = %env.id, error = %err, "Proxy dispatch failed");
                return Err(err);
            }
        };
        let elapsed = start.elapsed();

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let headers = filter_response_headers(response.headers());
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("json"));
        let bytes = response.bytes().await.map_err(ProxyError::from_transport)?;
        drop(transport);

        metrics::record_proxy_request(&method, status, elapsed);
        tracing::info!(
            environment_id = %env.id,
            method = %method,
            url = %url,
            status = status,
            duration_ms = elapsed.as_secs_f64() * 1000.0,
            "Proxy request completed"
        );

        Ok(ProxyResponse {
            status_code: status,
            headers,
            body: normalize_body(&bytes, is_json),
            duration_ms: round_ms(elapsed),
            url,
            error: None,
        })
    }
}

/// Parsed JSON if declared and valid, else the raw text.
pub fn normalize_body(bytes: &[u8], is_json: bool) -> Value {
    if is_json {
        if let Ok(value) = serde_json::from_slice(bytes) {
            return value;
        }
    }
    Value::String(String::from_utf8_lossy(bytes).into_owned())
}

/// Milliseconds rounded to two decimal places.
pub fn round_ms(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0 * 100.0).round() / 100.0
}
