use super::ParseError;
use super::lexer::{Line, RawSample, lex};
use crate::datamodel::{Labels, LabelsExt, MetricFamilies, MetricType, Sample};
use std::collections::HashSet;
use std::str::FromStr;

/// Suffixes that may attach a series to a histogram, summary or counter family.
const FAMILY_SUFFIXES: [&str; 4] = ["_bucket", "_count", "_sum", "_created"];

/// Finds the family a series belongs to.
///
/// `declared` returns the TYPE of a metric name when one has been declared.
pub fn resolve_family_name<'a>(
    series_name: &'a str,
    declared: impl Fn(&str) -> Option<MetricType>,
) -> &'a str {
    if declared(series_name).is_some() {
        return series_name;
    }
    for suffix in FAMILY_SUFFIXES {
        if let Some(base) = series_name.strip_suffix(suffix) {
            if let Some(metric_type) = declared(base) {
                if metric_type.series_suffixes().contains(&suffix) {
                    return base;
                }
            }
        }
    }
    series_name
}

/// Parses a float the way the exposition format writes them, `NaN` and `+Inf` included.
pub fn parse_float(token: &str) -> Option<f64> {
    f64::from_str(token).ok()
}

#[derive(Default)]
struct FamiliesBuilder {
    families: MetricFamilies,
    typed: HashSet<String>,
    helped: HashSet<String>,
}

impl FamiliesBuilder {
    fn declared_type(&self, name: &str) -> Option<MetricType> {
        if self.typed.contains(name) {
            self.families.get(name).map(|family| family.metric_type)
        } else {
            None
        }
    }

    fn push(&mut self, line_number: usize, line: Line<'_>) -> Result<(), ParseError> {
        let fail = |message: String| ParseError::new(line_number, message);
        match line {
            Line::Blank | Line::Comment => Ok(()),
            Line::Help { name, text } => {
                let family = self.families.get_or_insert(name, MetricType::Untyped);
                if self.helped.contains(name) {
                    if family.help != text {
                        return Err(fail(format!("conflicting HELP lines for metric {}", name)));
                    }
                    return Ok(());
                }
                family.help = text;
                self.helped.insert(name.to_string());
                Ok(())
            }
            Line::Type { name, type_name } => {
                let metric_type = MetricType::from_str(type_name).map_err(fail)?;
                let family = self.families.get_or_insert(name, metric_type);
                if self.typed.contains(name) {
                    if family.metric_type != metric_type {
                        return Err(fail(format!("conflicting TYPE lines for metric {}", name)));
                    }
                    return Ok(());
                }
                if !family.samples.is_empty() {
                    return Err(fail(format!(
                        "TYPE line for metric {} appears after its samples",
                        name
                    )));
                }
                family.metric_type = metric_type;
                self.typed.insert(name.to_string());
                Ok(())
            }
            Line::Sample(raw) => {
                let sample = build_sample(&raw).map_err(fail)?;
                let family_name = resolve_family_name(raw.name, |n| self.declared_type(n));
                let family = self
                    .families
                    .get_or_insert(family_name, MetricType::Untyped);
                check_series_shape(family.metric_type, family_name, &sample).map_err(fail)?;
                family.samples.push(sample);
                Ok(())
            }
        }
    }
}

fn build_sample(raw: &RawSample<'_>) -> Result<Sample, String> {
    let mut labels = Labels::with_capacity(raw.labels.len());
    for (name, value) in &raw.labels {
        if labels.has_label(name) {
            return Err(format!(
                "label {} appears more than once in a sample of metric {}",
                name, raw.name
            ));
        }
        labels.push((name.to_string(), value.clone()));
    }

    let value = parse_float(raw.value).ok_or_else(|| {
        format!(
            "expected a float as value of metric {}, got {:?}",
            raw.name, raw.value
        )
    })?;

    let timestamp = match raw.timestamp {
        Some(token) => {
            let milliseconds = i64::from_str(token).map_err(|_| {
                format!(
                    "expected an integer timestamp for metric {}, got {:?}",
                    raw.name, token
                )
            })?;
            Some(milliseconds as f64 / 1000.0)
        }
        None => None,
    };

    Ok(Sample {
        name: raw.name.to_string(),
        labels,
        value,
        timestamp,
    })
}

fn check_series_shape(
    metric_type: MetricType,
    family_name: &str,
    sample: &Sample,
) -> Result<(), String> {
    let suffix = &sample.name[family_name.len()..];
    let numeric_label = |label: &str| -> Result<(), String> {
        match sample.labels.get_label(label) {
            Some(value) if parse_float(value).is_some() => Ok(()),
            Some(value) => Err(format!(
                "label {} of {} must be a float, got {:?}",
                label, sample.name, value
            )),
            None => Err(format!("{} has no {} label", sample.name, label)),
        }
    };

    match (metric_type, suffix) {
        (MetricType::Histogram, "_bucket") => numeric_label("le"),
        (MetricType::Histogram, "") => Err(format!(
            "histogram {} has a sample without _bucket, _count or _sum suffix",
            family_name
        )),
        (MetricType::Summary, "") => numeric_label("quantile"),
        _ => Ok(()),
    }
}

/// Parses Prometheus text exposition format into metric families.
pub fn parse_text(text: &str) -> Result<MetricFamilies, ParseError> {
    let mut builder = FamiliesBuilder::default();
    for (line_number, line) in lex(text)? {
        builder.push(line_number, line)?;
    }
    Ok(builder.families)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"# HELP sample_requests_total Total number of requests processed
# TYPE sample_requests_total counter
sample_requests_total{userid="example_user",method="GET",endpoint="/api/query"} 5.0
# HELP sample_cpu_usage_percent Current CPU usage in percent
# TYPE sample_cpu_usage_percent gauge
sample_cpu_usage_percent 42.5
"#;

    #[test]
    fn test_parse_counter_and_gauge() {
        let families = parse_text(SAMPLE).unwrap();
        assert_eq!(families.len(), 2);

        let counter = families.get("sample_requests_total").unwrap();
        assert_eq!(counter.metric_type, MetricType::Counter);
        assert_eq!(counter.help, "Total number of requests processed");
        assert_eq!(counter.samples.len(), 1);
        assert_eq!(counter.samples[0].value, 5.0);
        assert_eq!(counter.samples[0].labels.get_label("method"), Some("GET"));

        let gauge = families.get("sample_cpu_usage_percent").unwrap();
        assert_eq!(gauge.metric_type, MetricType::Gauge);
        assert_eq!(gauge.samples[0].value, 42.5);
        assert_eq!(gauge.samples[0].timestamp, None);
    }

    #[test]
    fn test_histogram_and_summary_grouping() {
        let text = r#"# HELP latency Request latency
# TYPE latency histogram
latency_bucket{le="0.1"} 1
latency_bucket{le="+Inf"} 3
latency_count 3
latency_sum 0.9
latency_created 1.7e9
# TYPE rpc summary
rpc{quantile="0.5"} 0.2
rpc_count 10
rpc_sum 2.5
"#;
        let families = parse_text(text).unwrap();
        assert_eq!(families.len(), 2);
        let latency = families.get("latency").unwrap();
        assert_eq!(latency.samples.len(), 5);
        assert_eq!(latency.series_suffix(&latency.samples[4]), "_created");
        let rpc = families.get("rpc").unwrap();
        assert_eq!(rpc.samples.len(), 3);
        assert!(families.get("rpc_count").is_none());
    }

    #[test]
    fn test_untyped_and_suffix_without_declaration() {
        let families = parse_text("foo_count 3\nbar 1 1700000000500\n").unwrap();
        let foo = families.get("foo_count").unwrap();
        assert_eq!(foo.metric_type, MetricType::Untyped);
        assert_eq!(foo.help, "");
        let bar = families.get("bar").unwrap();
        assert_eq!(bar.samples[0].timestamp, Some(1_700_000_000.5));
    }

    #[test]
    fn test_special_values() {
        let families = parse_text("a NaN\nb +Inf\nc -Inf\n").unwrap();
        assert!(families.get("a").unwrap().samples[0].value.is_nan());
        assert_eq!(families.get("b").unwrap().samples[0].value, f64::INFINITY);
        assert_eq!(families.get("c").unwrap().samples[0].value, f64::NEG_INFINITY);
    }

    #[test]
    fn test_help_duplicates() {
        assert!(parse_text("# HELP a x\n# HELP a x\na 1\n").is_ok());
        let error = parse_text("# HELP a x\n# HELP a y\na 1\n").unwrap_err();
        assert_eq!(error.line, 2);
        assert!(error.message.contains("conflicting HELP"));
    }

    #[test]
    fn test_type_errors() {
        let error = parse_text("# TYPE a timer\n").unwrap_err();
        assert!(error.message.contains("Unknown metric type"));

        let error = parse_text("# TYPE a gauge\n# TYPE a counter\n").unwrap_err();
        assert!(error.message.contains("conflicting TYPE"));

        let error = parse_text("a 1\n# TYPE a gauge\n").unwrap_err();
        assert_eq!(error.line, 2);
        assert!(error.message.contains("after its samples"));
    }

    #[test]
    fn test_value_errors() {
        let error = parse_text("a 1\nb abc\n").unwrap_err();
        assert_eq!(error.line, 2);
        assert!(error.message.contains("expected a float"));

        let error = parse_text("a 1 1.5\n").unwrap_err();
        assert!(error.message.contains("integer timestamp"));
    }

    #[test]
    fn test_label_errors() {
        let error = parse_text(r#"a{x="1",x="2"} 1"#).unwrap_err();
        assert!(error.message.contains("more than once"));

        let error = parse_text("# TYPE h histogram\nh_bucket 1\n").unwrap_err();
        assert!(error.message.contains("no le label"));

        let error = parse_text("# TYPE h histogram\nh_bucket{le=\"x\"} 1\n").unwrap_err();
        assert!(error.message.contains("must be a float"));

        let error = parse_text("# TYPE h histogram\nh 1\n").unwrap_err();
        assert!(error.message.contains("without _bucket"));

        let error = parse_text("# TYPE s summary\ns 1\n").unwrap_err();
        assert!(error.message.contains("no quantile label"));
    }

    #[test]
    fn test_resolve_family_name() {
        let declared = |name: &str| match name {
            "h" => Some(MetricType::Histogram),
            "s" => Some(MetricType::Summary),
            "c_total" => Some(MetricType::Counter),
            "g" => Some(MetricType::Gauge),
            _ => None,
        };
        assert_eq!(resolve_family_name("h_bucket", declared), "h");
        assert_eq!(resolve_family_name("s_sum", declared), "s");
        assert_eq!(resolve_family_name("s_bucket", declared), "s_bucket");
        assert_eq!(resolve_family_name("g_count", declared), "g_count");
        assert_eq!(resolve_family_name("c_total", declared), "c_total");
        assert_eq!(resolve_family_name("other", declared), "other");
    }

    #[test]
    fn test_empty_text() {
        assert!(parse_text("").unwrap().is_empty());
        assert!(parse_text("# only a comment\n\n").unwrap().is_empty());
    }
}
