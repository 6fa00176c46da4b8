use super::ValidationRule;
use crate::datamodel::{
    GroupingKey, LabelsExt, MetricFamilies, MetricType, ValidationViolation,
};
use anyhow::{Context, Result};
use std::collections::{BTreeSet, HashSet};
use url::Url;

/// Every family must come with a non-empty HELP text.
#[derive(Debug, Default, Clone, Copy)]
pub struct HelpPresent;

impl ValidationRule for HelpPresent {
    fn name(&self) -> &'static str {
        "help_present"
    }

    fn check(&self, families: &MetricFamilies, _target_url: &str) -> Vec<ValidationViolation> {
        families
            .iter()
            .filter(|family| family.help.trim().is_empty())
            .map(|family| {
                ValidationViolation::new(
                    self.name(),
                    format!("metric family {} has no HELP text", family.name),
                )
            })
            .collect()
    }
}

/// Labels starting with `__` are reserved for Prometheus internals.
#[derive(Debug, Default, Clone)]
pub struct ReservedLabels {
    permitted: BTreeSet<String>,
}

impl ReservedLabels {
    pub const RESERVED_PREFIX: &'static str = "__";

    pub fn new(permitted: impl IntoIterator<Item = String>) -> Self {
        Self {
            permitted: permitted.into_iter().collect(),
        }
    }
}

impl ValidationRule for ReservedLabels {
    fn name(&self) -> &'static str {
        "reserved_labels"
    }

    fn check(&self, families: &MetricFamilies, _target_url: &str) -> Vec<ValidationViolation> {
        let mut reported = HashSet::new();
        let mut violations = Vec::new();
        for (family, sample) in families.samples() {
            for (label, _) in &sample.labels {
                if label.starts_with(Self::RESERVED_PREFIX)
                    && !self.permitted.contains(label)
                    && reported.insert((family.name.as_str(), label.as_str()))
                {
                    violations.push(ValidationViolation::new(
                        self.name(),
                        format!(
                            "metric family {} uses the reserved label {}",
                            family.name, label
                        ),
                    ));
                }
            }
        }
        violations
    }
}

/// The job and grouping labels of the target URL must not be contradicted by the payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct GroupingKeyConsistency;

impl ValidationRule for GroupingKeyConsistency {
    fn name(&self) -> &'static str {
        "grouping_key_consistency"
    }

    fn check(&self, families: &MetricFamilies, target_url: &str) -> Vec<ValidationViolation> {
        let grouping_key = match GroupingKey::from_url(target_url) {
            Ok(grouping_key) => grouping_key,
            Err(err) => return vec![ValidationViolation::new(self.name(), err.to_string())],
        };

        let mut reported = HashSet::new();
        let mut violations = Vec::new();
        for (_, sample) in families.samples() {
            for (label, expected) in grouping_key.iter() {
                match sample.labels.get_label(label) {
                    Some(found) if found != expected => {
                        if reported.insert((sample.name.as_str(), label, found)) {
                            violations.push(ValidationViolation::new(
                                self.name(),
                                format!(
                                    "{} has {}={:?} but the target URL groups by {}={:?}",
                                    sample.series_id(),
                                    label,
                                    found,
                                    label,
                                    expected
                                ),
                            ));
                        }
                    }
                    _ => {}
                }
            }
        }
        violations
    }
}

/// Sample values must be finite numbers.
#[derive(Debug, Default, Clone, Copy)]
pub struct FiniteValues {
    /// Lets gauges carry NaN and infinities.
    pub allow_gauges: bool,
}

impl ValidationRule for FiniteValues {
    fn name(&self) -> &'static str {
        "finite_values"
    }

    fn check(&self, families: &MetricFamilies, _target_url: &str) -> Vec<ValidationViolation> {
        families
            .samples()
            .filter(|(_, sample)| !sample.value.is_finite())
            .filter(|(family, _)| !(self.allow_gauges && family.metric_type == MetricType::Gauge))
            .map(|(_, sample)| {
                ValidationViolation::new(
                    self.name(),
                    format!("{} has the non-finite value {}", sample.series_id(), sample.value),
                )
            })
            .collect()
    }
}

/// Pushes may only target one of the configured gateways.
#[derive(Debug, Clone)]
pub struct GatewayAllowed {
    allowed: Vec<Url>,
}

impl GatewayAllowed {
    pub fn new(prefixes: &[String]) -> Result<Self> {
        let allowed = prefixes
            .iter()
            .map(|prefix| {
                Url::parse(prefix.trim())
                    .with_context(|| format!("Invalid allowed gateway URL: {}", prefix))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { allowed })
    }

    fn is_allowed(&self, target: &Url) -> bool {
        self.allowed.iter().any(|prefix| {
            let base = prefix.path().trim_end_matches('/');
            let path = target.path();
            prefix.origin() == target.origin()
                && path
                    .strip_prefix(base)
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}

impl ValidationRule for GatewayAllowed {
    fn name(&self) -> &'static str {
        "gateway_allowed"
    }

    fn check(&self, _families: &MetricFamilies, target_url: &str) -> Vec<ValidationViolation> {
        match Url::parse(target_url) {
            Ok(target) if self.is_allowed(&target) => vec![],
            Ok(_) => vec![ValidationViolation::new(
                self.name(),
                format!("{} is not an allowed push gateway", target_url),
            )],
            Err(err) => vec![ValidationViolation::new(
                self.name(),
                format!("invalid target URL {}: {}", target_url, err),
            )],
        }
    }
}
