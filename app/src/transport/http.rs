//! JSON over HTTP transport.
//!
//! Every call is a `POST {base}/{service}/{method}` with the request message
//! as the JSON body. Non-2xx responses are mapped to status codes; a JSON
//! error body (`{"message": ..., "field_violations": [...]}`) is decoded when
//! present.

use dashboard_state_api::error::{FieldViolation, StatusCode};
use dashboard_state_api::transport::TransportFuture;
use dashboard_state_api::{Transport, TransportCall, TransportError};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

/// Transport backed by a `reqwest` client.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// A transport calling `base_url`, giving up on calls after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns the client build error (TLS backend initialization).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// A transport reusing an existing client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// URL `call` is posted to.
    #[must_use]
    pub fn url_for(&self, call: &TransportCall) -> String {
        format!("{}/{}/{}", self.base_url, call.service, call.method)
    }
}

impl Transport for HttpTransport {
    fn invoke(&self, call: TransportCall) -> TransportFuture<'_> {
        Box::pin(async move {
            let url = self.url_for(&call);
            let response = self
                .client
                .post(&url)
                .json(&call.data)
                .send()
                .await
                .map_err(from_reqwest)?;

            let status = response.status();
            let body = response.bytes().await.map_err(from_reqwest)?;

            if !status.is_success() {
                return Err(error_from_body(status.as_u16(), &body));
            }
            if body.is_empty() {
                return Ok(Value::Object(Map::new()));
            }
            serde_json::from_slice(&body).map_err(|err| {
                TransportError::new(StatusCode::Internal, format!("invalid response from {url}: {err}"))
            })
        })
    }
}

fn from_reqwest(error: reqwest::Error) -> TransportError {
    let code = if error.is_timeout() {
        StatusCode::DeadlineExceeded
    } else if error.is_connect() {
        StatusCode::Unavailable
    } else if let Some(status) = error.status() {
        StatusCode::from_http(status.as_u16())
    } else {
        StatusCode::Unknown
    };
    TransportError::new(code, error.to_string())
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    field_violations: Vec<FieldViolation>,
}

fn error_from_body(status: u16, body: &[u8]) -> TransportError {
    let code = StatusCode::from_http(status);
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(parsed) => TransportError {
            code,
            message: if parsed.message.is_empty() {
                format!("HTTP {status}")
            } else {
                parsed.message
            },
            field_violations: parsed.field_violations,
        },
        Err(_) if body.is_empty() => TransportError::new(code, format!("HTTP {status}")),
        Err(_) => TransportError::new(code, format!("HTTP {status}: {}", String::from_utf8_lossy(body))),
    }
}
