//! FHIR resource and datatype shapes
//!
//! Minimal serde models covering exactly the fields the query generators
//! touch. Bundle entries are kept as raw JSON values; only the resources
//! this crate actually consumes get typed models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A coding from a code system
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coding {
    /// Code system URI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Code value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Display text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Coding {
    /// Create a coding with only a code value
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            system: None,
            code: Some(code.into()),
            display: None,
        }
    }

    /// Create a coding with a system and code
    pub fn new(system: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            code: Some(code.into()),
            display: None,
        }
    }
}

/// A concept expressed as one or more codings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeableConcept {
    /// Codings in this concept
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coding: Option<Vec<Coding>>,
    /// Plain-text representation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConcept {
    /// Check whether any coding carries the given code value
    pub fn has_code(&self, code: &str) -> bool {
        self.coding
            .as_deref()
            .unwrap_or_default()
            .iter()
            .any(|c| c.code.as_deref() == Some(code))
    }
}

/// A time period bounded by dateTime strings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Period {
    /// Inclusive start (FHIR dateTime)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    /// Inclusive end (FHIR dateTime)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// A measured amount with an optional coded unit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Quantity {
    /// Numeric value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Decimal>,
    /// Human-readable unit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Unit system URI (typically UCUM)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Coded unit form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// A ratio of two quantities
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ratio {
    /// Numerator quantity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numerator: Option<Quantity>,
    /// Denominator quantity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denominator: Option<Quantity>,
}

/// A range bounded by two quantities
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Range {
    /// Low bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<Quantity>,
    /// High bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<Quantity>,
}

/// An expression in some language (measure criteria, member filters)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FhirExpression {
    /// Expression language (e.g. "text/cql", "application/x-fhir-query")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// The expression itself
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

/// An extension carrying an expression value
///
/// Only the `valueExpression` choice is modeled; it is the only one the
/// group compiler emits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extension {
    /// Extension URL
    pub url: String,
    /// Expression payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_expression: Option<FhirExpression>,
}

/// A bundle of resources
///
/// Entries stay as raw JSON values; callers deserialize the resources they
/// care about on demand.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    /// Always "Bundle"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    /// Bundle entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<Vec<BundleEntry>>,
}

/// One entry of a bundle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BundleEntry {
    /// The contained resource, as raw JSON
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Value>,
}

impl Bundle {
    /// Find and deserialize the first `Measure` resource in the bundle
    pub fn first_measure(&self) -> Option<Measure> {
        self.entry
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(|e| e.resource.as_ref())
            .find(|r| r.get("resourceType").and_then(Value::as_str) == Some("Measure"))
            .and_then(|r| serde_json::from_value(r.clone()).ok())
    }
}

/// The subset of a Measure the group compiler reads
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Measure {
    /// Measure name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Population criteria groups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<Vec<MeasureGroup>>,
}

/// One population criteria group of a measure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeasureGroup {
    /// Populations in this group
    #[serde(skip_serializing_if = "Option::is_none")]
    pub population: Option<Vec<MeasurePopulation>>,
}

/// One population of a measure group
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeasurePopulation {
    /// Population kind (e.g. initial-population)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,
    /// Criteria defining membership
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criteria: Option<FhirExpression>,
}

impl MeasurePopulation {
    /// Check whether this population is coded with the given population kind
    pub fn is_kind(&self, code: &str) -> bool {
        self.code.as_ref().is_some_and(|c| c.has_code(code))
    }
}

/// A group of members, possibly defined by criteria rather than enumeration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Always "Group"
    pub resource_type: String,
    /// Whether membership is enumerated (false = conditional)
    pub actual: bool,
    /// Kind of members
    #[serde(rename = "type")]
    pub group_type: String,
    /// Group name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Membership-defining modifier extensions
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub modifier_extension: Vec<Extension>,
}

impl Group {
    /// Create a conditional person group with the given membership extensions
    pub fn conditional_person(name: impl Into<String>, modifier_extension: Vec<Extension>) -> Self {
        Self {
            resource_type: "Group".to_string(),
            actual: false,
            group_type: "person".to_string(),
            name: Some(name.into()),
            modifier_extension,
        }
    }
}
