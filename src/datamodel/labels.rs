use smallvec::SmallVec;

/// Label pairs of one sample, in document order. Names are unique.
pub type Labels = SmallVec<[(String, String); 8]>;

pub trait LabelsExt {
    fn get_label(&self, name: &str) -> Option<&str>;

    fn has_label(&self, name: &str) -> bool {
        self.get_label(name).is_some()
    }
}

impl LabelsExt for Labels {
    fn get_label(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn test_get_label() {
        let labels: Labels = smallvec![
            ("job".to_string(), "sample".to_string()),
            ("instance".to_string(), "a".to_string()),
        ];
        assert_eq!(labels.get_label("job"), Some("sample"));
        assert_eq!(labels.get_label("instance"), Some("a"));
        assert_eq!(labels.get_label("le"), None);
        assert!(labels.has_label("job"));
        assert!(!labels.has_label("quantile"));
    }
}
