//! Test doubles for the pipeline seams, shared by unit and integration tests.

use crate::datamodel::{GroupingKey, LintProblem, MetricFamilies, PushRequest};
use crate::gateway::{Gateway, GatewayError, GatewayResponse};
use crate::lint::{Lint, LintError};
use crate::parsing::{MetricsParser, ParseError, TextFormatParser};
use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::Method;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A linter answering the same result for every input, counting its calls.
#[derive(Debug)]
pub struct StaticLinter {
    result: Result<Vec<LintProblem>, LintError>,
    calls: AtomicUsize,
}

impl StaticLinter {
    pub fn new(result: Result<Vec<LintProblem>, LintError>) -> Self {
        Self {
            result,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn clean() -> Self {
        Self::new(Ok(Vec::new()))
    }

    pub fn with_problems(problems: Vec<LintProblem>) -> Self {
        Self::new(Ok(problems))
    }

    pub fn failing(err: LintError) -> Self {
        Self::new(Err(err))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Lint for StaticLinter {
    async fn lint(&self, _text: &str) -> Result<Vec<LintProblem>, LintError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// The text format parser, counting its calls.
#[derive(Debug, Default)]
pub struct CountingParser {
    calls: AtomicUsize,
}

impl CountingParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MetricsParser for CountingParser {
    fn parse(&self, text: &str) -> Result<MetricFamilies, ParseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        TextFormatParser.parse(text)
    }
}

/// An in-memory Push Gateway.
///
/// Every forward is recorded. Accepted pushes are stored per grouping key:
/// PUT replaces the group, POST appends to it.
#[derive(Debug)]
pub struct RecordingGateway {
    answer: Result<GatewayResponse, GatewayError>,
    requests: Mutex<Vec<PushRequest>>,
    groups: Mutex<HashMap<String, Vec<u8>>>,
}

impl Default for RecordingGateway {
    fn default() -> Self {
        Self::answering(Ok(GatewayResponse {
            status: 200,
            body: String::new(),
        }))
    }
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answering(answer: Result<GatewayResponse, GatewayError>) -> Self {
        Self {
            answer,
            requests: Mutex::new(Vec::new()),
            groups: Mutex::new(HashMap::new()),
        }
    }

    pub fn rejecting(status: u16, body: &str) -> Self {
        Self::answering(Err(GatewayError::Rejected {
            status,
            body: body.to_string(),
        }))
    }

    pub fn unreachable(message: &str) -> Self {
        Self::answering(Err(GatewayError::Unreachable(message.to_string())))
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<PushRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The stored body of the group a target URL points at.
    pub fn group(&self, target_url: &str) -> Option<Bytes> {
        let key = group_key(target_url);
        self.groups
            .lock()
            .unwrap()
            .get(&key)
            .map(|body| Bytes::from(body.clone()))
    }

    pub fn group_count(&self) -> usize {
        self.groups.lock().unwrap().len()
    }
}

/// Grouping labels sorted by name, so that label order in the URL does not matter.
fn group_key(target_url: &str) -> String {
    match GroupingKey::from_url(target_url) {
        Ok(key) => {
            let mut pairs: Vec<String> = key
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect();
            pairs.sort();
            pairs.join("/")
        }
        Err(_) => target_url.to_string(),
    }
}

#[async_trait]
impl Gateway for RecordingGateway {
    async fn forward(&self, request: &PushRequest) -> Result<GatewayResponse, GatewayError> {
        self.requests.lock().unwrap().push(request.clone());
        let answer = self.answer.clone()?;

        let key = group_key(request.target_url());
        let mut groups = self.groups.lock().unwrap();
        if *request.method() == Method::POST {
            groups
                .entry(key)
                .or_default()
                .extend_from_slice(request.body());
        } else {
            groups.insert(key, request.body().to_vec());
        }
        Ok(answer)
    }
}
