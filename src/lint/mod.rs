use crate::datamodel::LintProblem;
use anyhow::{Result, bail};
use async_trait::async_trait;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub mod builtin;
pub mod remote;
pub mod response;

pub use builtin::BuiltinLinter;
pub use remote::RemoteLinter;
pub use response::{LintResponse, LintStatus};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LintError {
    /// The text cannot be tokenized at all.
    #[error("{0}")]
    Parse(String),

    /// The lint service could not be reached or gave an unusable answer.
    #[error("{0}")]
    Unreachable(String),
}

/// Checks metrics text for syntax and style problems without interpreting it.
#[async_trait]
pub trait Lint: Send + Sync {
    async fn lint(&self, text: &str) -> Result<Vec<LintProblem>, LintError>;
}

/// What to do with a payload that parses but has lint problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LintPolicy {
    /// Any lint problem rejects the push.
    #[default]
    Strict,
    /// Lint problems are logged and reported, the push proceeds.
    Lenient,
}

impl fmt::Display for LintPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintPolicy::Strict => write!(f, "strict"),
            LintPolicy::Lenient => write!(f, "lenient"),
        }
    }
}

impl FromStr for LintPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(LintPolicy::Strict),
            "lenient" => Ok(LintPolicy::Lenient),
            _ => bail!("Unknown lint policy: {}, expected strict or lenient", s),
        }
    }
}

/// The exposition format requires line terminated records.
pub fn ensure_trailing_newline(text: &str) -> Cow<'_, str> {
    if text.ends_with('\n') {
        Cow::Borrowed(text)
    } else {
        let mut owned = String::with_capacity(text.len() + 1);
        owned.push_str(text);
        owned.push('\n');
        Cow::Owned(owned)
    }
}

/// Creates a linter from a backend description: `builtin`, or the URL of a lint service.
pub fn create_linter_from_backend(backend: &str, timeout: Duration) -> Result<Arc<dyn Lint>> {
    let backend = backend.trim();
    if backend.eq_ignore_ascii_case("builtin") {
        return Ok(Arc::new(BuiltinLinter::new()));
    }
    if backend.starts_with("http://") || backend.starts_with("https://") {
        let url = url::Url::parse(backend)?;
        return Ok(Arc::new(RemoteLinter::new(url.to_string(), timeout)?));
    }
    bail!("Unsupported lint backend: {}", backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lint_policy_from_str() {
        assert_eq!(LintPolicy::from_str("strict").unwrap(), LintPolicy::Strict);
        assert_eq!(LintPolicy::from_str(" Lenient ").unwrap(), LintPolicy::Lenient);
        assert!(LintPolicy::from_str("permissive").is_err());
        assert_eq!(LintPolicy::default(), LintPolicy::Strict);
        assert_eq!(LintPolicy::Lenient.to_string(), "lenient");
    }

    #[test]
    fn test_ensure_trailing_newline() {
        assert_eq!(ensure_trailing_newline("up 1"), "up 1\n");
        assert!(matches!(ensure_trailing_newline("up 1\n"), Cow::Borrowed(_)));
        assert_eq!(ensure_trailing_newline(""), "\n");
    }

    #[test]
    fn test_create_linter_from_backend() {
        let timeout = Duration::from_secs(1);
        assert!(create_linter_from_backend("builtin", timeout).is_ok());
        assert!(create_linter_from_backend("BUILTIN", timeout).is_ok());
        assert!(create_linter_from_backend("http://localhost:8080/lint", timeout).is_ok());
        assert!(create_linter_from_backend("ftp://localhost/lint", timeout).is_err());
        assert!(create_linter_from_backend("promtool", timeout).is_err());
    }
}
