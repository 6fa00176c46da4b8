use super::app_error::AppError;
use super::state::HttpServerState;
use crate::datamodel::{LintProblem, PushRequest};
use crate::proxy::{Forwarded, PushError, TerminalState};
use anyhow::anyhow;
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::de::{Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Headers to forward, in order.
///
/// Accepted as a JSON object or as a list of `[name, value]` pairs. Only the
/// list form can carry a header name twice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderList(pub Vec<(String, String)>);

impl<'de> Deserialize<'de> for HeaderList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct HeaderListVisitor;

        impl<'de> Visitor<'de> for HeaderListVisitor {
            type Value = HeaderList;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an object of headers or a list of [name, value] pairs")
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(HeaderList::default())
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut headers = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, String>()? {
                    headers.push(entry);
                }
                Ok(HeaderList(headers))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut headers = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(pair) = seq.next_element::<(String, String)>()? {
                    headers.push(pair);
                }
                Ok(HeaderList(headers))
            }
        }

        deserializer.deserialize_any(HeaderListVisitor)
    }
}

/// A push request packed into JSON.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PushMetricsRequest {
    /// Push Gateway URL, e.g. `http://pushgateway:9091/metrics/job/backup`.
    pub target_url: Option<String>,
    /// `PUT` (default) or `POST`.
    pub method: Option<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub headers: HeaderList,
    /// Base64 encoded metrics in text exposition format.
    pub data: Option<String>,
}

impl PushMetricsRequest {
    pub fn into_push_request(self) -> anyhow::Result<PushRequest> {
        let target_url = self
            .target_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| anyhow!("Missing 'target_url' parameter"))?;
        let data = self
            .data
            .ok_or_else(|| anyhow!("Missing 'data' parameter"))?;
        let body = STANDARD
            .decode(data.trim())
            .map_err(|err| anyhow!("Invalid base64 data: {}", err))?;
        let method = parse_method(self.method.as_deref())?;
        validate_headers(&self.headers.0)?;

        Ok(PushRequest::new(target_url, method, self.headers.0, body))
    }
}

fn parse_method(method: Option<&str>) -> anyhow::Result<Method> {
    match method.map(|m| m.trim().to_ascii_uppercase()).as_deref() {
        None | Some("PUT") => Ok(Method::PUT),
        Some("POST") => Ok(Method::POST),
        Some(other) => Err(anyhow!(
            "Unsupported method {}, expected PUT or POST",
            other
        )),
    }
}

fn validate_headers(headers: &[(String, String)]) -> anyhow::Result<()> {
    for (name, value) in headers {
        HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| anyhow!("Invalid header name: {:?}", name))?;
        HeaderValue::from_str(value)
            .map_err(|_| anyhow!("Invalid value for header {}", name))?;
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PushAccepted {
    pub success: bool,
    pub message: String,
    /// Status answered by the Push Gateway.
    pub status_code: u16,
    /// Lint problems let through by the lenient policy.
    pub warnings: Vec<LintProblem>,
}

impl From<Forwarded> for PushAccepted {
    fn from(forwarded: Forwarded) -> Self {
        Self {
            success: true,
            message: format!(
                "Metrics forwarded, gateway answered {}",
                forwarded.gateway_status
            ),
            status_code: forwarded.gateway_status,
            warnings: forwarded.lint_warnings,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PushRejected {
    pub success: bool,
    pub state: TerminalState,
    /// Pipeline stage that refused the push: input, lint, parse, validation or gateway.
    pub stage: String,
    pub error: String,
    pub message: String,
    pub details: Vec<String>,
}

impl From<&PushError> for PushRejected {
    fn from(err: &PushError) -> Self {
        Self {
            success: false,
            state: err.terminal_state(),
            stage: err.stage().to_string(),
            error: err.kind().to_string(),
            message: err.to_string(),
            details: err.details(),
        }
    }
}

pub fn rejection_status(err: &PushError) -> StatusCode {
    match err {
        PushError::EmptyInput
        | PushError::LintParseError(_)
        | PushError::LintWarnings(_)
        | PushError::MetricParseError(_)
        | PushError::ValidationViolation(_) => StatusCode::BAD_REQUEST,
        PushError::LintUnreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
        PushError::GatewayUnreachable(_) => StatusCode::BAD_GATEWAY,
        PushError::GatewayRejected { status, .. } => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
        }
    }
}

impl IntoResponse for PushError {
    fn into_response(self) -> Response {
        (rejection_status(&self), Json(PushRejected::from(&self))).into_response()
    }
}

fn outcome_response(result: Result<Forwarded, PushError>) -> Response {
    match result {
        Ok(forwarded) => (StatusCode::OK, Json(PushAccepted::from(forwarded))).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Push metrics
///
/// Lints and validates the metrics, then forwards them to the Push Gateway
/// named by `target_url`. Nothing is forwarded when a stage fails.
#[utoipa::path(
    post,
    path = "/push_metrics",
    tag = "Push",
    request_body = PushMetricsRequest,
    responses(
        (status = 200, description = "Metrics forwarded", body = PushAccepted),
        (status = 400, description = "Malformed request or rejected metrics", body = PushRejected),
        (status = 502, description = "Push Gateway unreachable", body = PushRejected),
        (status = 503, description = "Lint service unreachable", body = PushRejected),
    )
)]
pub async fn push_metrics(
    State(state): State<HttpServerState>,
    payload: Result<Json<PushMetricsRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(payload) = payload.map_err(AppError::bad_request)?;
    let request = payload
        .into_push_request()
        .map_err(AppError::bad_request)?;
    Ok(outcome_response(state.pipeline.handle(&request).await))
}

/// Push Gateway compatible route
///
/// Accepts pushes the way a Push Gateway does, so client libraries can
/// point at the proxy. The path is appended to the configured gateway URL.
#[utoipa::path(
    put,
    path = "/metrics/job/{job}",
    tag = "Push",
    params(("job" = String, Path, description = "Job name, optionally followed by grouping labels")),
    request_body(content = String, content_type = "text/plain"),
    responses(
        (status = 200, description = "Metrics forwarded", body = PushAccepted),
        (status = 400, description = "Rejected metrics", body = PushRejected),
        (status = 404, description = "No Push Gateway configured"),
    )
)]
pub async fn push_gateway_passthrough(
    State(state): State<HttpServerState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let gateway_url = state
        .gateway_url
        .as_deref()
        .ok_or_else(|| AppError::not_found(anyhow!("No push gateway configured")))?;
    let target_url = format!("{}{}", gateway_url.trim_end_matches('/'), uri.path());

    let headers = headers
        .iter()
        .map(|(name, value)| {
            value
                .to_str()
                .map(|value| (name.as_str().to_string(), value.to_string()))
                .map_err(|_| AppError::bad_request(anyhow!("Invalid value for header {}", name)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let request = PushRequest::new(target_url, method, headers, body);
    Ok(outcome_response(state.pipeline.handle(&request).await))
}
