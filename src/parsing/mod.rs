use crate::datamodel::MetricFamilies;
use thiserror::Error;

pub mod lexer;
pub mod text_format;

pub use text_format::parse_text;

/// A line of metrics text that violates the exposition format grammar.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Turns metrics text into metric families.
pub trait MetricsParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<MetricFamilies, ParseError>;
}

/// Parser for the Prometheus text exposition format, version 0.0.4.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextFormatParser;

impl MetricsParser for TextFormatParser {
    fn parse(&self, text: &str) -> Result<MetricFamilies, ParseError> {
        parse_text(text)
    }
}
