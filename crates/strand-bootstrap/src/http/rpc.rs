//! Minimal JSON-RPC 2.0 client posting to `{host}/rpc`.

use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::ServiceError;

/// RPC error code for a missing resource.
pub const CODE_NOT_FOUND: i64 = -32004;
/// RPC error code for a rejected credential.
pub const CODE_UNAUTHORIZED: i64 = -32001;

#[derive(Debug, Serialize)]
struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

/// Error object of a JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl From<RpcError> for ServiceError {
    fn from(error: RpcError) -> Self {
        match error.code {
            CODE_NOT_FOUND => ServiceError::NotFound(error.message),
            CODE_UNAUTHORIZED => ServiceError::Unauthorized(error.message),
            code => ServiceError::Rejected {
                code,
                message: error.message,
            },
        }
    }
}

/// Map a non-success HTTP status to a service error.
pub fn status_error(status: StatusCode, body: &str) -> ServiceError {
    let detail = if body.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {body}")
    };
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ServiceError::Unauthorized(detail),
        StatusCode::NOT_FOUND => ServiceError::NotFound(detail),
        _ => ServiceError::Rejected {
            code: i64::from(status.as_u16()),
            message: detail,
        },
    }
}

/// Endpoint `{host}/rpc`, tolerating a trailing slash on `host`.
pub fn endpoint(host: &str) -> String {
    format!("{}/rpc", host.trim_end_matches('/'))
}

pub fn header(name: &'static str, value: &str) -> Result<(HeaderName, HeaderValue), ServiceError> {
    let value = HeaderValue::from_str(value)
        .map_err(|e| ServiceError::Malformed(format!("header {name}: {e}")))?;
    Ok((HeaderName::from_static(name), value))
}

/// One JSON-RPC endpoint plus headers sent on every call.
#[derive(Debug)]
pub struct RpcClient {
    http: Client,
    endpoint: String,
    headers: HeaderMap,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(host: &str) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint(host),
            headers: HeaderMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Call `method`; `bearer` is attached as `Authorization: Bearer`.
    pub async fn call<P, R>(
        &self,
        method: &str,
        params: P,
        bearer: Option<&str>,
    ) -> Result<R, ServiceError>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        debug!(endpoint = %self.endpoint, method, id, "rpc call");

        let mut builder = self
            .http
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .json(&request);
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        trace!(method, %status, body_len = body.len(), "rpc response");

        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        decode_response(&body)
    }
}

/// Decode a JSON-RPC response body into its result.
pub fn decode_response<R: DeserializeOwned>(body: &str) -> Result<R, ServiceError> {
    let mut response: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ServiceError::Malformed(e.to_string()))?;
    if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
        let error: RpcError = serde_json::from_value(error.clone())
            .map_err(|e| ServiceError::Malformed(format!("error object: {e}")))?;
        return Err(error.into());
    }
    match response.get_mut("result") {
        Some(result) => serde_json::from_value(result.take())
            .map_err(|e| ServiceError::Malformed(format!("result: {e}"))),
        None => Err(ServiceError::Malformed(
            "response has neither result nor error".into(),
        )),
    }
}
