use super::{PushError, ProxyResult};
use crate::config::PushProxyConfig;
use crate::datamodel::{LintProblem, PushRequest};
use crate::gateway::{Gateway, HttpGateway};
use crate::lint::{Lint, LintPolicy, create_linter_from_backend};
use crate::parsing::{MetricsParser, TextFormatParser};
use crate::validation::SemanticValidator;
use anyhow::Result;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Intermediate states of a push request. Terminal states live in [`super::TerminalState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Received,
    Linted,
    Parsed,
    Validated,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Received => "RECEIVED",
            PipelineState::Linted => "LINTED",
            PipelineState::Parsed => "PARSED",
            PipelineState::Validated => "VALIDATED",
        };
        write!(f, "{}", name)
    }
}

/// A push accepted by every stage and by the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct Forwarded {
    pub gateway_status: u16,
    pub gateway_body: String,
    /// Lint problems let through by the lenient policy.
    pub lint_warnings: Vec<LintProblem>,
}

/// Lint, parse, validate, then forward.
///
/// A request runs the stages in order and stops at the first failure. The
/// linter is called once, the parser at most once and the gateway at most once.
/// All collaborators are shared read-only, so one pipeline serves every request.
#[derive(Clone)]
pub struct PushPipeline {
    linter: Arc<dyn Lint>,
    parser: Arc<dyn MetricsParser>,
    validator: Arc<SemanticValidator>,
    gateway: Arc<dyn Gateway>,
    lint_policy: LintPolicy,
}

impl fmt::Debug for PushPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushPipeline")
            .field("validator", &self.validator)
            .field("lint_policy", &self.lint_policy)
            .finish_non_exhaustive()
    }
}

impl PushPipeline {
    pub fn new(
        linter: Arc<dyn Lint>,
        parser: Arc<dyn MetricsParser>,
        validator: Arc<SemanticValidator>,
        gateway: Arc<dyn Gateway>,
        lint_policy: LintPolicy,
    ) -> Self {
        Self {
            linter,
            parser,
            validator,
            gateway,
            lint_policy,
        }
    }

    pub fn from_config(config: &PushProxyConfig) -> Result<Self> {
        let linter = create_linter_from_backend(&config.lint_backend, config.lint_timeout())?;
        let validator = SemanticValidator::with_settings(&config.validator_settings())?;
        let gateway = HttpGateway::new(config.gateway_timeout())?;
        let lint_policy = config.parse_lint_policy()?;

        info!(
            "Push pipeline: lint backend {}, lint policy {}, rules {:?}",
            config.lint_backend,
            lint_policy,
            validator.rule_names()
        );

        Ok(Self::new(
            linter,
            Arc::new(TextFormatParser),
            Arc::new(validator),
            Arc::new(gateway),
            lint_policy,
        ))
    }

    pub fn lint_policy(&self) -> LintPolicy {
        self.lint_policy
    }

    pub fn validator(&self) -> &SemanticValidator {
        &self.validator
    }

    pub async fn handle(&self, request: &PushRequest) -> ProxyResult {
        let result = self.run(request).await;
        match &result {
            Ok(forwarded) => info!(
                "Push to {} forwarded, gateway answered {}",
                request.target_url(),
                forwarded.gateway_status
            ),
            Err(err) => warn!(
                "Push to {} ended in {}: {}",
                request.target_url(),
                err.terminal_state(),
                err
            ),
        }
        result
    }

    async fn run(&self, request: &PushRequest) -> ProxyResult {
        let target_url = request.target_url();
        transition(target_url, PipelineState::Received);

        if request.is_blank() {
            return Err(PushError::EmptyInput);
        }

        // Bytes that are not UTF-8 cannot be tokenized as exposition text.
        let text = request.body_text().map_err(|err| {
            PushError::LintParseError(format!("The metrics payload is not valid UTF-8: {}", err))
        })?;

        let lint_warnings = self.linter.lint(text).await?;
        if !lint_warnings.is_empty() {
            match self.lint_policy {
                LintPolicy::Strict => return Err(PushError::LintWarnings(lint_warnings)),
                LintPolicy::Lenient => {
                    for problem in &lint_warnings {
                        warn!("Lint problem in push to {}: {}", target_url, problem);
                    }
                }
            }
        }
        transition(target_url, PipelineState::Linted);

        let families = self.parser.parse(text)?;
        debug!("Parsed {} metric families", families.len());
        transition(target_url, PipelineState::Parsed);

        let violations = self.validator.validate(&families, target_url);
        if !violations.is_empty() {
            return Err(PushError::ValidationViolation(violations));
        }
        transition(target_url, PipelineState::Validated);

        let response = self.gateway.forward(request).await?;
        Ok(Forwarded {
            gateway_status: response.status,
            gateway_body: response.body,
            lint_warnings,
        })
    }
}

fn transition(target_url: &str, state: PipelineState) {
    debug!("Push to {}: {}", target_url, state);
}
