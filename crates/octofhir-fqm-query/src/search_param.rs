//! Search parameter resolution seam
//!
//! Mapping an expression attribute path to a FHIR search parameter name is
//! an external lookup. Attributes with no mapping are not searchable; the
//! compilers drop such conditions rather than approximate them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lookup from `<data type>.<attribute>` to a FHIR search parameter name
pub trait SearchParamResolver: Send + Sync {
    /// Resolve an attribute path on a data type to its search parameter
    /// name, or `None` when the attribute is not searchable
    fn resolve(&self, data_type: &str, attribute: &str) -> Option<String>;
}

/// Map-backed resolver keyed by `"DataType.attribute"`.
///
/// Deserializes transparently from a JSON object, e.g.
/// `{"Condition.onset": "onset-date"}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticSearchParams {
    params: HashMap<String, String>,
}

impl StaticSearchParams {
    /// Create an empty resolver (every attribute unsearchable)
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mapping for one attribute
    pub fn insert(
        &mut self,
        data_type: impl AsRef<str>,
        attribute: impl AsRef<str>,
        param: impl Into<String>,
    ) {
        self.params.insert(
            format!("{}.{}", data_type.as_ref(), attribute.as_ref()),
            param.into(),
        );
    }
}

impl SearchParamResolver for StaticSearchParams {
    fn resolve(&self, data_type: &str, attribute: &str) -> Option<String> {
        self.params.get(&format!("{data_type}.{attribute}")).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_hit_and_miss() {
        let mut params = StaticSearchParams::new();
        params.insert("Condition", "clinicalStatus", "clinical-status");

        assert_eq!(
            params.resolve("Condition", "clinicalStatus").as_deref(),
            Some("clinical-status")
        );
        assert!(params.resolve("Condition", "verificationStatus").is_none());
        assert!(params.resolve("Observation", "clinicalStatus").is_none());
    }

    #[test]
    fn test_transparent_deserialization() {
        let params: StaticSearchParams = serde_json::from_value(json!({
            "Observation.effective": "date",
            "Observation.status": "status"
        }))
        .unwrap();

        assert_eq!(params.resolve("Observation", "status").as_deref(), Some("status"));
    }
}
