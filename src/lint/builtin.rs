//! In-process linter, a port of the checks done by Prometheus' `promlint`.
//!
//! Only the tokenizer runs here: values are not interpreted, so a payload
//! can pass the linter and still be refused by the metric family parser.

use super::{Lint, LintError, ensure_trailing_newline};
use crate::datamodel::{LintProblem, MetricType};
use crate::parsing::lexer::{Line, lex};
use crate::parsing::text_format::resolve_family_name;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

static CAMEL_CASE: Lazy<Regex> = Lazy::new(|| Regex::new("[a-z][A-Z]").expect("valid regex"));

const UNIT_ABBREVIATIONS: [&str; 14] = [
    "s", "ms", "us", "ns", "sec", "b", "kb", "mb", "gb", "tb", "pb", "m", "h", "d",
];

const BASE_UNITS: [&str; 7] = [
    "seconds", "bytes", "meters", "metres", "volts", "amperes", "joules",
];

const UNIT_PREFIXES: [&str; 18] = [
    "pico", "nano", "micro", "milli", "centi", "deci", "deca", "hecto", "kilo", "kibi", "mega",
    "mebi", "giga", "gibi", "tera", "tebi", "peta", "pebi",
];

const TIME_UNITS: [&str; 3] = ["minutes", "hours", "days"];

/// What the linter knows about one family after tokenization.
#[derive(Debug, Default)]
struct FamilySummary<'a> {
    declared_type: Option<MetricType>,
    help: Option<String>,
    label_names: BTreeSet<&'a str>,
}

impl FamilySummary<'_> {
    fn metric_type(&self) -> MetricType {
        self.declared_type.unwrap_or(MetricType::Untyped)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinLinter;

impl BuiltinLinter {
    pub fn new() -> Self {
        Self
    }

    pub fn lint_text(&self, text: &str) -> Result<Vec<LintProblem>, LintError> {
        let text = ensure_trailing_newline(text);
        let lines = lex(&text).map_err(|err| LintError::Parse(err.to_string()))?;

        let mut order: Vec<&str> = Vec::new();
        let mut families: HashMap<&str, FamilySummary<'_>> = HashMap::new();
        for (_, line) in &lines {
            match line {
                Line::Blank | Line::Comment => {}
                Line::Help { name, text } => {
                    summary_entry(&mut order, &mut families, *name).help = Some(text.clone());
                }
                Line::Type { name, type_name } => {
                    // Unknown types are left to the parser.
                    if let Ok(metric_type) = MetricType::from_str(type_name) {
                        summary_entry(&mut order, &mut families, *name).declared_type =
                            Some(metric_type);
                    }
                }
                Line::Sample(sample) => {
                    let family_name = resolve_family_name(sample.name, |candidate| {
                        families.get(candidate).and_then(|f| f.declared_type)
                    });
                    let summary = summary_entry(&mut order, &mut families, family_name);
                    summary
                        .label_names
                        .extend(sample.labels.iter().map(|(label, _)| *label));
                }
            }
        }

        let mut problems: Vec<LintProblem> = order
            .iter()
            .flat_map(|name| lint_family(name, &families[name]))
            .collect();
        problems.sort();
        problems.dedup();
        Ok(problems)
    }
}

fn summary_entry<'a, 'b>(
    order: &mut Vec<&'a str>,
    families: &'b mut HashMap<&'a str, FamilySummary<'a>>,
    name: &'a str,
) -> &'b mut FamilySummary<'a> {
    families.entry(name).or_insert_with(|| {
        order.push(name);
        FamilySummary::default()
    })
}

fn lint_family(name: &str, summary: &FamilySummary<'_>) -> Vec<LintProblem> {
    let checks: [fn(&str, &FamilySummary<'_>) -> Vec<String>; 8] = [
        lint_help,
        lint_metric_units,
        lint_counter,
        lint_histogram_summary_reserved,
        lint_metric_type_in_name,
        lint_reserved_chars,
        lint_camel_case,
        lint_unit_abbreviations,
    ];
    checks
        .iter()
        .flat_map(|check| check(name, summary))
        .map(|text| LintProblem::new(name, text))
        .collect()
}

fn lint_help(_name: &str, summary: &FamilySummary<'_>) -> Vec<String> {
    match &summary.help {
        Some(help) if !help.trim().is_empty() => vec![],
        _ => vec!["no help text".to_string()],
    }
}

fn lint_metric_units(name: &str, _summary: &FamilySummary<'_>) -> Vec<String> {
    let mut problems = Vec::new();
    for token in name.to_lowercase().split('_') {
        if TIME_UNITS.contains(&token) {
            problems.push(format!("use base unit \"seconds\" instead of \"{}\"", token));
            continue;
        }
        for base in BASE_UNITS {
            if let Some(prefix) = token.strip_suffix(base) {
                if UNIT_PREFIXES.contains(&prefix) {
                    problems.push(format!("use base unit \"{}\" instead of \"{}\"", base, token));
                }
            }
        }
    }
    problems
}

fn lint_counter(name: &str, summary: &FamilySummary<'_>) -> Vec<String> {
    let has_total_suffix = name.ends_with("_total");
    match summary.metric_type() {
        MetricType::Counter if !has_total_suffix => {
            vec!["counter metrics should have \"_total\" suffix".to_string()]
        }
        MetricType::Counter | MetricType::Untyped => vec![],
        _ if has_total_suffix => {
            vec!["non-counter metrics should not have \"_total\" suffix".to_string()]
        }
        _ => vec![],
    }
}

fn lint_histogram_summary_reserved(name: &str, summary: &FamilySummary<'_>) -> Vec<String> {
    let metric_type = summary.metric_type();
    if metric_type == MetricType::Untyped {
        return vec![];
    }
    let is_histogram = metric_type == MetricType::Histogram;
    let is_summary = metric_type == MetricType::Summary;

    let mut problems = Vec::new();
    if !is_histogram && name.ends_with("_bucket") {
        problems.push("non-histogram metrics should not have \"_bucket\" suffix".to_string());
    }
    if !is_histogram && !is_summary && name.ends_with("_count") {
        problems.push(
            "non-histogram and non-summary metrics should not have \"_count\" suffix".to_string(),
        );
    }
    if !is_histogram && !is_summary && name.ends_with("_sum") {
        problems.push(
            "non-histogram and non-summary metrics should not have \"_sum\" suffix".to_string(),
        );
    }
    if !is_histogram && summary.label_names.contains("le") {
        problems.push("non-histogram metrics should not have \"le\" label".to_string());
    }
    if !is_summary && summary.label_names.contains("quantile") {
        problems.push("non-summary metrics should not have \"quantile\" label".to_string());
    }
    problems
}

fn lint_metric_type_in_name(name: &str, summary: &FamilySummary<'_>) -> Vec<String> {
    if summary.metric_type() == MetricType::Untyped {
        return vec![];
    }
    let name = name.to_lowercase();
    [
        MetricType::Counter,
        MetricType::Gauge,
        MetricType::Histogram,
        MetricType::Summary,
    ]
    .iter()
    .map(|metric_type| metric_type.to_string())
    .filter(|type_name| {
        name.contains(&format!("_{}_", type_name)) || name.ends_with(&format!("_{}", type_name))
    })
    .map(|type_name| format!("metric name should not include type '{}'", type_name))
    .collect()
}

fn lint_reserved_chars(name: &str, _summary: &FamilySummary<'_>) -> Vec<String> {
    if name.contains(':') {
        vec!["metric names should not contain ':'".to_string()]
    } else {
        vec![]
    }
}

fn lint_camel_case(name: &str, summary: &FamilySummary<'_>) -> Vec<String> {
    let mut problems = Vec::new();
    if CAMEL_CASE.is_match(name) {
        problems.push("metric names should be written in 'snake_case' not 'camelCase'".to_string());
    }
    if summary
        .label_names
        .iter()
        .any(|label| CAMEL_CASE.is_match(label))
    {
        problems.push("label names should be written in 'snake_case' not 'camelCase'".to_string());
    }
    problems
}

fn lint_unit_abbreviations(name: &str, _summary: &FamilySummary<'_>) -> Vec<String> {
    let name = name.to_lowercase();
    if name
        .split('_')
        .any(|token| UNIT_ABBREVIATIONS.contains(&token))
    {
        vec!["metric names should not contain abbreviated units".to_string()]
    } else {
        vec![]
    }
}

#[async_trait]
impl Lint for BuiltinLinter {
    async fn lint(&self, text: &str) -> Result<Vec<LintProblem>, LintError> {
        self.lint_text(text)
    }
}
