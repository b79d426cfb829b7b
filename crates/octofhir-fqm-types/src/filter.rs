//! Filter-tree shapes attached to compiled retrieves
//!
//! The measure calculation engine statically analyzes each CQL retrieve's
//! where-clause into a boolean/comparison tree. The tree is read-only input
//! here; the query crate walks it once per compile.

use crate::fhir::{Coding, Period, Quantity, Range, Ratio};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One filter node of a retrieve's where-clause tree.
///
/// The engine's set of filter kinds is open; anything outside the kinds
/// modeled here lands on [`FilterNode::Unsupported`], which compiles to an
/// empty contribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FilterNode {
    /// Conjunction of child filters
    And(AndFilter),
    /// Attribute is one of a set of values
    In(InFilter),
    /// Attribute falls within a period
    During(DuringFilter),
    /// Attribute is absent
    IsNull(AttributeFilter),
    /// Attribute is present
    NotNull(AttributeFilter),
    /// Attribute equals a plain value
    Equals(EqualsFilter),
    /// Attribute compares against a typed value
    Value(ValueFilter),
    /// Any other engine filter kind (or, truth, unknown, ...)
    #[serde(other)]
    Unsupported,
}

/// Conjunction of child filters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AndFilter {
    /// Child filters, all of which must hold
    pub children: Vec<FilterNode>,
}

/// Membership filter: attribute is one of a coding list or plain value list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InFilter {
    /// Attribute path on the retrieved type
    pub attribute: String,
    /// Acceptable codings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_coding_list: Option<Vec<Coding>>,
    /// Acceptable plain values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_list: Option<Vec<String>>,
}

/// Interval filter: attribute falls within a period
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuringFilter {
    /// Attribute path on the retrieved type
    pub attribute: String,
    /// The bounding period; either side may be open
    pub value_period: Period,
}

/// Presence filter (isnull / notnull)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeFilter {
    /// Attribute path on the retrieved type
    pub attribute: String,
}

/// Equality filter against a plain value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EqualsFilter {
    /// Attribute path on the retrieved type
    pub attribute: String,
    /// The value, encoded verbatim (string, number, or boolean)
    pub value: Value,
}

/// Comparison filter against a typed value.
///
/// The engine emits redundant value fields; exactly one is authoritative,
/// chosen by fixed priority (boolean, string, integer, quantity, ratio,
/// range) in the value encoder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueFilter {
    /// Attribute path on the retrieved type
    pub attribute: String,
    /// Comparison operator
    #[serde(default)]
    pub comparator: Comparator,
    /// Boolean operand
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_boolean: Option<bool>,
    /// String operand
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,
    /// Integer operand
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_integer: Option<i64>,
    /// Quantity operand
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_quantity: Option<Quantity>,
    /// Ratio operand
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_ratio: Option<Ratio>,
    /// Range operand
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_range: Option<Range>,
}

/// FHIR search comparison prefixes
///
/// See https://hl7.org/fhir/R4/search.html#prefix. The serialized spelling
/// doubles as the prefix text in query fragments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    /// Equal
    #[default]
    Eq,
    /// Greater than
    Gt,
    /// Less than
    Lt,
    /// Greater than or equal
    Ge,
    /// Less than or equal
    Le,
    /// Starts after
    Sa,
    /// Ends before
    Eb,
}

impl Comparator {
    /// The search prefix text for this comparator
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Ge => "ge",
            Self::Le => "le",
            Self::Sa => "sa",
            Self::Eb => "eb",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// One compiled retrieve statement contributing to a population expression
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedTypeQuery {
    /// Resource type the retrieve targets
    pub data_type: String,
    /// Search path of the retrieve's terminology filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Value set the path is filtered against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_set: Option<String>,
    /// Direct code the path is filtered against (only consulted when no
    /// value set exists)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<Coding>,
    /// Where-clause analysis for this retrieve
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_info: Option<QueryInfo>,
}

/// Where-clause analysis attached to a retrieve
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryInfo {
    /// Root of the filter tree, if the retrieve has a where-clause
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterNode>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tagged_deserialization() {
        let node: FilterNode = serde_json::from_value(json!({
            "type": "and",
            "children": [
                { "type": "equals", "attribute": "status", "value": "final" },
                { "type": "isnull", "attribute": "abatement" }
            ]
        }))
        .unwrap();

        let FilterNode::And(and) = node else {
            panic!("expected and filter");
        };
        assert_eq!(and.children.len(), 2);
        assert!(matches!(and.children[0], FilterNode::Equals(_)));
        assert!(matches!(and.children[1], FilterNode::IsNull(_)));
    }

    #[test]
    fn test_unknown_kind_lands_on_unsupported() {
        let node: FilterNode = serde_json::from_value(json!({
            "type": "or",
            "children": []
        }))
        .unwrap();
        assert!(matches!(node, FilterNode::Unsupported));

        let node: FilterNode = serde_json::from_value(json!({ "type": "truth" })).unwrap();
        assert!(matches!(node, FilterNode::Unsupported));
    }

    #[test]
    fn test_value_filter_fields() {
        let node: FilterNode = serde_json::from_value(json!({
            "type": "value",
            "attribute": "valueQuantity",
            "comparator": "ge",
            "valueQuantity": { "value": 150, "system": "http://unitsofmeasure.org", "code": "mg" }
        }))
        .unwrap();

        let FilterNode::Value(vf) = node else {
            panic!("expected value filter");
        };
        assert_eq!(vf.comparator, Comparator::Ge);
        let quantity = vf.value_quantity.unwrap();
        assert_eq!(quantity.code.as_deref(), Some("mg"));
    }

    #[test]
    fn test_comparator_prefix_matches_serde_spelling() {
        for comparator in [
            Comparator::Eq,
            Comparator::Gt,
            Comparator::Lt,
            Comparator::Ge,
            Comparator::Le,
            Comparator::Sa,
            Comparator::Eb,
        ] {
            let spelled = serde_json::to_value(comparator).unwrap();
            assert_eq!(spelled, json!(comparator.prefix()));
        }
    }

    #[test]
    fn test_detailed_type_query_camel_case() {
        let dtq: DetailedTypeQuery = serde_json::from_value(json!({
            "dataType": "Condition",
            "path": "code",
            "valueSet": "http://example.org/ValueSet/diabetes",
            "queryInfo": {
                "filter": { "type": "notnull", "attribute": "onset" }
            }
        }))
        .unwrap();

        assert_eq!(dtq.data_type, "Condition");
        assert_eq!(
            dtq.value_set.as_deref(),
            Some("http://example.org/ValueSet/diabetes")
        );
        assert!(matches!(
            dtq.query_info.unwrap().filter,
            Some(FilterNode::NotNull(_))
        ));
    }
}
