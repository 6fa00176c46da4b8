use crate::datamodel::PushRequest;
use async_trait::async_trait;
use thiserror::Error;

pub mod http;

pub use self::http::HttpGateway;

/// What the Push Gateway answered to an accepted forward.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// Connection failure, timeout or an invalid target URL.
    #[error("{0}")]
    Unreachable(String),

    /// The gateway answered with a non-2xx status.
    #[error("Push gateway returned status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Delivers an accepted push request to its target gateway.
///
/// Implementations send the request once, never retry, and never alter the body.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn forward(&self, request: &PushRequest) -> Result<GatewayResponse, GatewayError>;
}
