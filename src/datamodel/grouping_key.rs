use super::{Labels, LabelsExt};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use thiserror::Error;
use url::Url;

const BASE64_SUFFIX: &str = "@base64";

#[derive(Error, Debug, PartialEq)]
pub enum GroupingKeyError {
    #[error("Invalid target URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Target URL has no /metrics/job/<job> path")]
    MissingJob,

    #[error("The job name in the target URL is empty")]
    EmptyJob,

    #[error("Grouping key label {0} has no value")]
    MissingValue(String),

    #[error("Grouping key label {0} appears more than once")]
    DuplicateLabel(String),

    #[error("Grouping key label {label} is not correctly encoded: {message}")]
    InvalidEncoding { label: String, message: String },
}

/// The job and additional labels that identify a metric group at the Push Gateway.
///
/// Decoded from target URLs shaped as `/metrics/job/<job>{/<label>/<value>}`.
/// Label names suffixed with `@base64` carry base64url encoded values.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupingKey {
    pub job: String,
    /// Grouping labels other than `job`, in URL order.
    pub labels: Labels,
}

impl GroupingKey {
    pub fn from_url(target_url: &str) -> Result<Self, GroupingKeyError> {
        let url = Url::parse(target_url)?;
        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        let start = segments
            .windows(2)
            .position(|pair| {
                pair[0] == "metrics" && (pair[1] == "job" || pair[1] == "job@base64")
            })
            .ok_or(GroupingKeyError::MissingJob)?
            + 1;

        let mut job: Option<String> = None;
        let mut labels = Labels::new();
        for pair in segments[start..].chunks(2) {
            let raw_name = pair[0];
            let raw_value = pair
                .get(1)
                .ok_or_else(|| GroupingKeyError::MissingValue(raw_name.to_string()))?;
            let (name, value) = decode_pair(raw_name, raw_value)?;

            if name == "job" {
                if job.is_some() {
                    return Err(GroupingKeyError::DuplicateLabel(name));
                }
                if value.is_empty() {
                    return Err(GroupingKeyError::EmptyJob);
                }
                job = Some(value);
            } else {
                if labels.has_label(&name) {
                    return Err(GroupingKeyError::DuplicateLabel(name));
                }
                labels.push((name, value));
            }
        }

        Ok(Self {
            job: job.ok_or(GroupingKeyError::MissingJob)?,
            labels,
        })
    }

    /// Value of a grouping label, `job` included.
    pub fn get(&self, name: &str) -> Option<&str> {
        if name == "job" {
            Some(self.job.as_str())
        } else {
            self.labels.get_label(name)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        std::iter::once(("job", self.job.as_str())).chain(
            self.labels
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
        )
    }
}

fn decode_pair(raw_name: &str, raw_value: &str) -> Result<(String, String), GroupingKeyError> {
    let invalid = |label: &str, message: String| GroupingKeyError::InvalidEncoding {
        label: label.to_string(),
        message,
    };

    let name = urlencoding::decode(raw_name)
        .map_err(|err| invalid(raw_name, err.to_string()))?
        .into_owned();

    match name.strip_suffix(BASE64_SUFFIX) {
        Some(name) => {
            let decoded = URL_SAFE_NO_PAD
                .decode(raw_value.trim_end_matches('='))
                .map_err(|err| invalid(name, err.to_string()))?;
            let value = String::from_utf8(decoded).map_err(|err| invalid(name, err.to_string()))?;
            Ok((name.to_string(), value))
        }
        None => {
            let value = urlencoding::decode(raw_value)
                .map_err(|err| invalid(&name, err.to_string()))?
                .into_owned();
            Ok((name, value))
        }
    }
}
