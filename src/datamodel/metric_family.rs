use super::{Labels, MetricType};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Series name, including any `_bucket`, `_count`, `_sum` or `_created` suffix.
    pub name: String,
    pub labels: Labels,
    pub value: f64,
    /// Unix seconds.
    pub timestamp: Option<f64>,
}

impl Sample {
    /// `name{label="value",...}`, for diagnostics.
    pub fn series_id(&self) -> String {
        if self.labels.is_empty() {
            return self.name.clone();
        }
        let labels: Vec<String> = self
            .labels
            .iter()
            .map(|(name, value)| format!("{}={:?}", name, value))
            .collect();
        format!("{}{{{}}}", self.name, labels.join(","))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    pub metric_type: MetricType,
    pub help: String,
    pub samples: Vec<Sample>,
}

impl MetricFamily {
    pub fn new(name: String, metric_type: MetricType) -> Self {
        Self {
            name,
            metric_type,
            help: String::new(),
            samples: Vec::new(),
        }
    }

    /// The suffix of a sample series relative to the family name, if any.
    pub fn series_suffix<'a>(&self, sample: &'a Sample) -> &'a str {
        sample.name.strip_prefix(self.name.as_str()).unwrap_or("")
    }
}

/// Metric families of one payload, keyed by name and kept in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricFamilies {
    families: Vec<MetricFamily>,
    index: HashMap<String, usize>,
}

impl MetricFamilies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&MetricFamily> {
        self.index.get(name).map(|&position| &self.families[position])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut MetricFamily> {
        match self.index.get(name) {
            Some(&position) => Some(&mut self.families[position]),
            None => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns the family with the given name, creating it with the given type when missing.
    pub fn get_or_insert(&mut self, name: &str, metric_type: MetricType) -> &mut MetricFamily {
        let position = match self.index.get(name) {
            Some(&position) => position,
            None => {
                self.families
                    .push(MetricFamily::new(name.to_string(), metric_type));
                let position = self.families.len() - 1;
                self.index.insert(name.to_string(), position);
                position
            }
        };
        &mut self.families[position]
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricFamily> {
        self.families.iter()
    }

    pub fn samples(&self) -> impl Iterator<Item = (&MetricFamily, &Sample)> {
        self.families
            .iter()
            .flat_map(|family| family.samples.iter().map(move |sample| (family, sample)))
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

impl<'a> IntoIterator for &'a MetricFamilies {
    type Item = &'a MetricFamily;
    type IntoIter = std::slice::Iter<'a, MetricFamily>;

    fn into_iter(self) -> Self::IntoIter {
        self.families.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn test_families_keep_insertion_order() {
        let mut families = MetricFamilies::new();
        families.get_or_insert("zeta", MetricType::Gauge);
        families.get_or_insert("alpha", MetricType::Counter);
        families.get_or_insert("zeta", MetricType::Counter);

        let names: Vec<&str> = families.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        // The existing family is returned untouched
        assert_eq!(families.get("zeta").unwrap().metric_type, MetricType::Gauge);
        assert_eq!(families.len(), 2);
    }

    #[test]
    fn test_series_id() {
        let sample = Sample {
            name: "up".to_string(),
            labels: smallvec![
                ("job".to_string(), "a".to_string()),
                ("zone".to_string(), "eu".to_string()),
            ],
            value: 1.0,
            timestamp: None,
        };
        assert_eq!(sample.series_id(), r#"up{job="a",zone="eu"}"#);

        let sample = Sample {
            labels: Labels::new(),
            ..sample
        };
        assert_eq!(sample.series_id(), "up");
    }

    #[test]
    fn test_series_suffix() {
        let family = MetricFamily::new("request_duration".to_string(), MetricType::Histogram);
        let sample = Sample {
            name: "request_duration_bucket".to_string(),
            labels: smallvec![("le".to_string(), "+Inf".to_string())],
            value: 3.0,
            timestamp: None,
        };
        assert_eq!(family.series_suffix(&sample), "_bucket");
    }
}
