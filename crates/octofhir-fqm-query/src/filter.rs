//! Recursive filter-tree compilation
//!
//! Walks a retrieve's where-clause tree once and produces independent FHIR
//! query fragments to be ANDed by the caller. Conditions that cannot be
//! expressed (unsupported kinds, unsearchable attributes) contribute
//! nothing, broadening the resulting query.

use crate::search_param::SearchParamResolver;
use crate::value::encode_value;
use octofhir_fqm_types::{FilterNode, InFilter};
use serde_json::Value;

/// Compile one filter node into a list of query fragments
pub fn compile_filter(
    filter: &FilterNode,
    data_type: &str,
    resolver: &dyn SearchParamResolver,
) -> Vec<String> {
    match filter {
        // AND is expressed by parameter repetition, so children flatten in
        // order with no grouping.
        FilterNode::And(and) => and
            .children
            .iter()
            .flat_map(|child| compile_filter(child, data_type, resolver))
            .collect(),
        FilterNode::In(in_filter) => {
            let Some(param) = resolve(data_type, &in_filter.attribute, resolver) else {
                return Vec::new();
            };
            compile_in(&param, in_filter)
        }
        FilterNode::During(during) => {
            let Some(param) = resolve(data_type, &during.attribute, resolver) else {
                return Vec::new();
            };
            // Bounds are strict: during maps to gt/lt, one fragment per
            // bounded side of the period.
            let mut fragments = Vec::new();
            if let Some(start) = &during.value_period.start {
                fragments.push(format!("{param}=gt{start}"));
            }
            if let Some(end) = &during.value_period.end {
                fragments.push(format!("{param}=lt{end}"));
            }
            fragments
        }
        FilterNode::IsNull(is_null) => resolve(data_type, &is_null.attribute, resolver)
            .map(|param| vec![format!("{param}:missing=true")])
            .unwrap_or_default(),
        FilterNode::NotNull(not_null) => resolve(data_type, &not_null.attribute, resolver)
            .map(|param| vec![format!("{param}:missing=false")])
            .unwrap_or_default(),
        FilterNode::Equals(equals) => resolve(data_type, &equals.attribute, resolver)
            .map(|param| vec![format!("{param}={}", plain_value(&equals.value))])
            .unwrap_or_default(),
        FilterNode::Value(value_filter) => {
            let Some(param) = resolve(data_type, &value_filter.attribute, resolver) else {
                return Vec::new();
            };
            encode_value(&param, value_filter)
        }
        FilterNode::Unsupported => {
            log::warn!("ignoring unsupported filter kind on {data_type} retrieve");
            Vec::new()
        }
    }
}

fn resolve(
    data_type: &str,
    attribute: &str,
    resolver: &dyn SearchParamResolver,
) -> Option<String> {
    let param = resolver.resolve(data_type, attribute);
    if param.is_none() {
        log::debug!("no search parameter for {data_type}.{attribute}, dropping condition");
    }
    param
}

fn compile_in(param: &str, filter: &InFilter) -> Vec<String> {
    if let Some(codings) = &filter.value_coding_list {
        let codes: Vec<&str> = codings
            .iter()
            .filter_map(|coding| coding.code.as_deref())
            .filter(|code| !code.is_empty())
            .collect();
        if codes.is_empty() {
            return Vec::new();
        }
        return vec![format!("{param}={}", codes.join(","))];
    }
    if let Some(values) = &filter.value_list {
        if values.is_empty() {
            return Vec::new();
        }
        return vec![format!("{param}={}", values.join(","))];
    }
    Vec::new()
}

/// Render an equals-filter operand verbatim (strings unquoted)
fn plain_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
