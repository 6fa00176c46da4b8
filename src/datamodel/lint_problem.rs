use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// A style or format issue found in otherwise parseable metrics text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub struct LintProblem {
    pub metric: String,
    pub text: String,
}

impl LintProblem {
    pub fn new(metric: &str, text: impl Into<String>) -> Self {
        Self {
            metric: metric.to_string(),
            text: text.into(),
        }
    }
}

impl fmt::Display for LintProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.metric, self.text)
    }
}
