use crate::datamodel::LintProblem;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LintStatus {
    Success,
    Warning,
    Error,
}

/// JSON answer of a lint service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LintResponse {
    pub status: LintStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub problems: Vec<LintProblem>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl LintResponse {
    pub fn success() -> Self {
        Self {
            status: LintStatus::Success,
            message: "Input has been parsed successfully. No issues found.".to_string(),
            problems: Vec::new(),
            error: String::new(),
        }
    }

    pub fn warning(problems: Vec<LintProblem>) -> Self {
        Self {
            status: LintStatus::Warning,
            message: "The input can be parsed but there are linting issues".to_string(),
            problems,
            error: String::new(),
        }
    }

    pub fn parse_error(error: impl Into<String>) -> Self {
        Self {
            status: LintStatus::Error,
            message: "Failed to parse metrics".to_string(),
            problems: Vec::new(),
            error: error.into(),
        }
    }

    pub fn empty_input() -> Self {
        Self {
            status: LintStatus::Error,
            message: "No input provided. Please send metrics in the request body.".to_string(),
            problems: Vec::new(),
            error: String::new(),
        }
    }
}
