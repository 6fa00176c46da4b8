use crate::datamodel::{MetricFamilies, ValidationViolation};
use std::fmt;

pub mod rules;

use rules::{FiniteValues, GatewayAllowed, GroupingKeyConsistency, HelpPresent, ReservedLabels};

/// One semantic check over a parsed payload and its target URL.
///
/// Rules are pure: the same input always yields the same violations and
/// nothing is remembered between calls.
pub trait ValidationRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn check(&self, families: &MetricFamilies, target_url: &str) -> Vec<ValidationViolation>;
}

/// Adapts a plain function or closure into a [`ValidationRule`].
pub struct FnRule<F> {
    name: &'static str,
    check: F,
}

impl<F> FnRule<F>
where
    F: Fn(&MetricFamilies, &str) -> Vec<ValidationViolation> + Send + Sync,
{
    pub fn new(name: &'static str, check: F) -> Self {
        Self { name, check }
    }
}

impl<F> ValidationRule for FnRule<F>
where
    F: Fn(&MetricFamilies, &str) -> Vec<ValidationViolation> + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn check(&self, families: &MetricFamilies, target_url: &str) -> Vec<ValidationViolation> {
        (self.check)(families, target_url)
    }
}

/// Knobs of the baseline rule set.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorSettings {
    pub require_help: bool,
    /// Reserved `__` labels accepted anyway.
    pub permitted_reserved_labels: Vec<String>,
    pub allow_non_finite_gauges: bool,
    /// URL prefixes of the gateways pushes may target. Empty means any.
    pub allowed_gateways: Vec<String>,
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        Self {
            require_help: true,
            permitted_reserved_labels: Vec::new(),
            allow_non_finite_gauges: false,
            allowed_gateways: Vec::new(),
        }
    }
}

/// Runs registered rules in registration order and concatenates their violations.
#[derive(Default)]
pub struct SemanticValidator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl fmt::Debug for SemanticValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SemanticValidator")
            .field("rules", &self.rule_names())
            .finish()
    }
}

impl SemanticValidator {
    /// A validator without any rule.
    pub fn new() -> Self {
        Self::default()
    }

    /// The baseline rule set configured by `settings`.
    pub fn with_settings(settings: &ValidatorSettings) -> anyhow::Result<Self> {
        let mut validator = Self::new();
        if settings.require_help {
            validator.register(HelpPresent);
        }
        validator.register(ReservedLabels::new(
            settings.permitted_reserved_labels.iter().cloned(),
        ));
        validator.register(GroupingKeyConsistency);
        validator.register(FiniteValues {
            allow_gauges: settings.allow_non_finite_gauges,
        });
        if !settings.allowed_gateways.is_empty() {
            validator.register(GatewayAllowed::new(&settings.allowed_gateways)?);
        }
        Ok(validator)
    }

    pub fn register(&mut self, rule: impl ValidationRule + 'static) -> &mut Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn register_fn<F>(&mut self, name: &'static str, check: F) -> &mut Self
    where
        F: Fn(&MetricFamilies, &str) -> Vec<ValidationViolation> + Send + Sync + 'static,
    {
        self.register(FnRule::new(name, check))
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn validate(&self, families: &MetricFamilies, target_url: &str) -> Vec<ValidationViolation> {
        self.rules
            .iter()
            .flat_map(|rule| rule.check(families, target_url))
            .collect()
    }
}
