//! Type-filter collation for bulk data export
//!
//! Collapses a flat data-requirement list into one query string suitable
//! for appending after a bulk `$export?` kickoff endpoint: repeated
//! `_typeFilter` parameters (OR across requirements) followed by a single
//! `_type` parameter listing every distinct resource type.

use crate::engine::MeasureEngine;
use crate::error::Result;
use indexmap::IndexMap;
use octofhir_fqm_types::{Bundle, DataRequirement};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters percent-encoded in a `_typeFilter` value: everything except
/// alphanumerics and the URI component marks `-_.!~*'()`
const TYPE_FILTER_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Filtering state of one resource type during collation.
///
/// Absence from the map means the type is unseen. Unfiltered is sticky:
/// once any requirement for the type cannot be narrowed, later requirements
/// must not re-narrow it.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TypeFilterState {
    /// Include all instances of the type; wins over any fragments
    Unfiltered,
    /// OR-combined query fragments, one per narrowable requirement
    Filtered(Vec<String>),
}

/// Calculate the measure's data requirements and collate them into a
/// bulk-export query string
pub async fn bulk_export_query(engine: &dyn MeasureEngine, bundle: &Bundle) -> Result<String> {
    let output = engine.calculate_data_requirements(bundle).await?;
    let requirements = output.results.data_requirement.unwrap_or_default();
    Ok(collate_type_filters(&requirements))
}

/// Collate data requirements into a bulk-export query string.
///
/// Pure and infallible: requirements that cannot be narrowed degrade to the
/// widest matching query for their resource type.
pub fn collate_type_filters(requirements: &[DataRequirement]) -> String {
    let mut type_filters: IndexMap<&str, TypeFilterState> = IndexMap::new();

    for requirement in requirements {
        let resource_type = requirement.resource_type.as_str();
        if type_filters.get(resource_type) == Some(&TypeFilterState::Unfiltered) {
            continue;
        }

        let code_filters = requirement.code_filter.as_deref().unwrap_or_default();
        // A requirement with no narrowing criteria, or with any filter that
        // cannot be expressed as a direct search, widens the type to all
        // instances and replaces any fragments collected so far.
        if code_filters.is_empty() || code_filters.iter().any(|cf| !cf.is_fully_specified()) {
            type_filters.insert(resource_type, TypeFilterState::Unfiltered);
            continue;
        }

        // Codes within one filter are comma-joined (OR on one parameter);
        // a requirement's filters are &-joined (AND across parameters).
        let fragments: Vec<String> = code_filters
            .iter()
            .map(|cf| {
                let codes: Vec<&str> = cf
                    .code
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|coding| coding.code.as_deref())
                    .collect();
                format!("{}={}", cf.path.as_deref().unwrap_or_default(), codes.join(","))
            })
            .collect();
        let query = format!("{}?{}", resource_type, fragments.join("&"));

        match type_filters
            .entry(resource_type)
            .or_insert_with(|| TypeFilterState::Filtered(Vec::new()))
        {
            TypeFilterState::Filtered(queries) => queries.push(query),
            TypeFilterState::Unfiltered => {}
        }
    }

    // Repeated _typeFilter parameters OR across requirements; _type always
    // lists every distinct resource type, in first-seen order, last.
    let mut segments: Vec<String> = Vec::new();
    for state in type_filters.values() {
        if let TypeFilterState::Filtered(queries) = state {
            let encoded: Vec<String> = queries
                .iter()
                .map(|q| {
                    format!(
                        "_typeFilter={}",
                        utf8_percent_encode(q, TYPE_FILTER_ENCODE_SET)
                    )
                })
                .collect();
            segments.push(encoded.join("&"));
        }
    }

    let types: Vec<&str> = type_filters.keys().copied().collect();
    segments.push(format!("_type={}", types.join(",")));
    segments.join("&")
}
