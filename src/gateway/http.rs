use super::{Gateway, GatewayError, GatewayResponse};
use crate::datamodel::PushRequest;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use std::time::Duration;
use tracing::debug;

/// Headers owned by the transport, recomputed by the HTTP client for each forward.
const TRANSPORT_HEADERS: [&str; 4] = ["host", "content-length", "transfer-encoding", "connection"];

pub fn is_transport_header(name: &str) -> bool {
    TRANSPORT_HEADERS
        .iter()
        .any(|header| header.eq_ignore_ascii_case(name))
}

/// Forwards push requests over HTTP with reqwest.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl HttpGateway {
    /// `None` disables the timeout.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            timeout,
        })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn build_request(
        &self,
        request: &PushRequest,
    ) -> Result<reqwest::RequestBuilder, GatewayError> {
        let url = reqwest::Url::parse(request.target_url()).map_err(|err| {
            GatewayError::Unreachable(format!(
                "invalid gateway URL {}: {err}",
                request.target_url()
            ))
        })?;

        let mut builder = self.client.request(request.method().clone(), url);
        for (name, value) in request.headers() {
            if is_transport_header(name) {
                continue;
            }
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
                GatewayError::Unreachable(format!("invalid header name {name}: {err}"))
            })?;
            let value = HeaderValue::from_str(value).map_err(|err| {
                GatewayError::Unreachable(format!("invalid value for header {name}: {err}"))
            })?;
            builder = builder.header(name, value);
        }
        Ok(builder.body(request.body().clone()))
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn forward(&self, request: &PushRequest) -> Result<GatewayResponse, GatewayError> {
        let response = self
            .build_request(request)?
            .send()
            .await
            .map_err(|err| {
                let reason = if err.is_timeout() { "timed out" } else { "failed" };
                GatewayError::Unreachable(format!(
                    "forward to {} {reason}: {err}",
                    request.target_url()
                ))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|err| {
            GatewayError::Unreachable(format!(
                "failed to read the answer of {}: {err}",
                request.target_url()
            ))
        })?;
        debug!("Push gateway answered {}: {}", status, body);

        if !status.is_success() {
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(GatewayResponse {
            status: status.as_u16(),
            body,
        })
    }
}
