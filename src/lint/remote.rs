use super::{Lint, LintError, LintResponse, LintStatus, ensure_trailing_newline};
use crate::datamodel::LintProblem;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Client for a lint service speaking the `PUT /lint` JSON protocol.
///
/// Connection failures, timeouts and unreadable answers all map to
/// [`LintError::Unreachable`] so the caller can fail closed.
#[derive(Debug, Clone)]
pub struct RemoteLinter {
    endpoint: String,
    client: reqwest::Client,
}

impl RemoteLinter {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Lint for RemoteLinter {
    async fn lint(&self, text: &str) -> Result<Vec<LintProblem>, LintError> {
        let body = ensure_trailing_newline(text).into_owned();
        let response = self
            .client
            .put(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(body)
            .send()
            .await
            .map_err(|err| {
                LintError::Unreachable(format!(
                    "failed to reach lint service {}: {err}",
                    self.endpoint
                ))
            })?;

        let status = response.status();
        let payload = response.text().await.map_err(|err| {
            LintError::Unreachable(format!(
                "failed to read the answer of lint service {}: {err}",
                self.endpoint
            ))
        })?;
        debug!("Lint service answered {}: {}", status, payload);

        // Parse errors come back as 400 with a JSON body, so the body is read first.
        let answer: LintResponse = serde_json::from_str(&payload).map_err(|_| {
            LintError::Unreachable(format!(
                "lint service {} returned status {} with an unexpected body",
                self.endpoint, status
            ))
        })?;

        match answer.status {
            LintStatus::Success => Ok(Vec::new()),
            LintStatus::Warning => Ok(answer.problems),
            LintStatus::Error if !answer.error.is_empty() => Err(LintError::Parse(answer.error)),
            LintStatus::Error => Err(LintError::Parse(answer.message)),
        }
    }
}
