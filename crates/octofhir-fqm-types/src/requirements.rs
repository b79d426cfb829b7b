//! Data-requirement shapes produced by the measure calculation engine

use crate::fhir::Coding;
use serde::{Deserialize, Serialize};

/// A declaration that a measure's logic needs instances of a resource type,
/// optionally narrowed by coded criteria
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRequirement {
    /// Resource type the requirement targets
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Coded narrowing criteria
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_filter: Option<Vec<CodeFilter>>,
}

/// A narrowing condition on a data requirement: a search path plus a set of
/// acceptable codings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeFilter {
    /// Search path the codes apply to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Acceptable codings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<Vec<Coding>>,
    /// Value set reference (carries no direct codes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_set: Option<String>,
}

impl CodeFilter {
    /// Whether this filter can be expressed as a direct search query.
    ///
    /// Requires a path, a non-empty code list, and a non-empty code value on
    /// every coding. Anything else (value-set references included) forces
    /// the unfiltered fallback for the whole resource type.
    pub fn is_fully_specified(&self) -> bool {
        if self.path.is_none() {
            return false;
        }
        match self.code.as_deref() {
            Some(codes) if !codes.is_empty() => codes
                .iter()
                .all(|coding| coding.code.as_deref().is_some_and(|c| !c.is_empty())),
            _ => false,
        }
    }
}
