pub mod grouping_key;
pub mod labels;
pub mod lint_problem;
pub mod metric_family;
pub mod metric_type;
pub mod push_request;
pub mod violation;

pub use grouping_key::{GroupingKey, GroupingKeyError};
pub use labels::{Labels, LabelsExt};
pub use lint_problem::LintProblem;
pub use metric_family::{MetricFamilies, MetricFamily, Sample};
pub use metric_type::MetricType;
pub use push_request::PushRequest;
pub use violation::ValidationViolation;
