use crate::datamodel::{LintProblem, ValidationViolation};
use crate::gateway::GatewayError;
use crate::lint::LintError;
use crate::parsing::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use utoipa::ToSchema;

/// How a push request ended. Every request reaches exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TerminalState {
    Forwarded,
    RejectedEmpty,
    RejectedLint,
    RejectedParse,
    RejectedValidation,
    GatewayError,
}

impl fmt::Display for TerminalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TerminalState::Forwarded => "FORWARDED",
            TerminalState::RejectedEmpty => "REJECTED_EMPTY",
            TerminalState::RejectedLint => "REJECTED_LINT",
            TerminalState::RejectedParse => "REJECTED_PARSE",
            TerminalState::RejectedValidation => "REJECTED_VALIDATION",
            TerminalState::GatewayError => "GATEWAY_ERROR",
        };
        write!(f, "{}", name)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PushError {
    #[error("The metrics payload is empty")]
    EmptyInput,

    #[error("Lint service unavailable: {0}")]
    LintUnreachable(String),

    #[error("Failed to parse metrics: {0}")]
    LintParseError(String),

    #[error("The metrics have {} lint problem(s)", .0.len())]
    LintWarnings(Vec<LintProblem>),

    #[error("Invalid metrics data: {0}")]
    MetricParseError(#[from] ParseError),

    #[error("The metrics break {} validation rule(s)", .0.len())]
    ValidationViolation(Vec<ValidationViolation>),

    #[error("Push gateway unreachable: {0}")]
    GatewayUnreachable(String),

    #[error("Push gateway returned status {status}")]
    GatewayRejected { status: u16, body: String },
}

impl PushError {
    pub fn terminal_state(&self) -> TerminalState {
        match self {
            PushError::EmptyInput => TerminalState::RejectedEmpty,
            PushError::LintUnreachable(_)
            | PushError::LintParseError(_)
            | PushError::LintWarnings(_) => TerminalState::RejectedLint,
            PushError::MetricParseError(_) => TerminalState::RejectedParse,
            PushError::ValidationViolation(_) => TerminalState::RejectedValidation,
            PushError::GatewayUnreachable(_) | PushError::GatewayRejected { .. } => {
                TerminalState::GatewayError
            }
        }
    }

    /// The pipeline stage that stopped the request.
    pub fn stage(&self) -> &'static str {
        match self {
            PushError::EmptyInput => "input",
            PushError::LintUnreachable(_)
            | PushError::LintParseError(_)
            | PushError::LintWarnings(_) => "lint",
            PushError::MetricParseError(_) => "parse",
            PushError::ValidationViolation(_) => "validation",
            PushError::GatewayUnreachable(_) | PushError::GatewayRejected { .. } => "gateway",
        }
    }

    /// Machine readable error name.
    pub fn kind(&self) -> &'static str {
        match self {
            PushError::EmptyInput => "empty_input",
            PushError::LintUnreachable(_) => "lint_unreachable",
            PushError::LintParseError(_) => "lint_parse_error",
            PushError::LintWarnings(_) => "lint_warnings",
            PushError::MetricParseError(_) => "metric_parse_error",
            PushError::ValidationViolation(_) => "validation_violation",
            PushError::GatewayUnreachable(_) => "gateway_unreachable",
            PushError::GatewayRejected { .. } => "gateway_rejected",
        }
    }

    pub fn details(&self) -> Vec<String> {
        match self {
            PushError::EmptyInput => {
                vec!["No input provided. Please send metrics in the request body.".to_string()]
            }
            PushError::LintUnreachable(detail)
            | PushError::LintParseError(detail)
            | PushError::GatewayUnreachable(detail) => vec![detail.clone()],
            PushError::LintWarnings(problems) => {
                problems.iter().map(ToString::to_string).collect()
            }
            PushError::MetricParseError(err) => vec![err.to_string()],
            PushError::ValidationViolation(violations) => {
                violations.iter().map(ToString::to_string).collect()
            }
            PushError::GatewayRejected { body, .. } => vec![body.clone()],
        }
    }
}

impl From<LintError> for PushError {
    fn from(err: LintError) -> Self {
        match err {
            LintError::Parse(message) => PushError::LintParseError(message),
            LintError::Unreachable(message) => PushError::LintUnreachable(message),
        }
    }
}

impl From<GatewayError> for PushError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Unreachable(message) => PushError::GatewayUnreachable(message),
            GatewayError::Rejected { status, body } => PushError::GatewayRejected { status, body },
        }
    }
}
