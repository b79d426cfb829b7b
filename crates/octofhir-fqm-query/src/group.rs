//! Cohort membership group compilation
//!
//! Builds a conditional-membership `Group` for a measure bundle: one FHIR
//! query expression per retrieve of the initial population's criteria
//! expression, attached as member-filter modifier extensions. A person
//! belongs to the group if every expression would select one of their
//! records; negated criteria ("absence of X") cannot be represented here.

use crate::engine::MeasureEngine;
use crate::error::{Error, Result};
use crate::filter::compile_filter;
use crate::search_param::SearchParamResolver;
use octofhir_fqm_types::{Bundle, DetailedTypeQuery, Extension, FhirExpression, Group};

/// Extension URL marking a membership-defining query expression
pub const MEMBER_FILTER_URL: &str =
    "http://hl7.org/fhir/uv/bulkdata/StructureDefinition/member-filter";

/// Expression language of the emitted member filters
pub const X_FHIR_QUERY: &str = "application/x-fhir-query";

/// Population code identifying the initial population
pub const INITIAL_POPULATION: &str = "initial-population";

/// Build the conditional membership group for the measure in the bundle.
///
/// Only the first measure group is considered. Fails when the measure
/// defines no groups, or when the first group has no initial-population
/// criteria expression.
pub async fn membership_group(
    engine: &dyn MeasureEngine,
    resolver: &dyn SearchParamResolver,
    bundle: &Bundle,
) -> Result<Group> {
    let measure = bundle.first_measure().ok_or(Error::NoGroupDefined)?;
    let first_group = measure
        .group
        .as_deref()
        .unwrap_or_default()
        .first()
        .ok_or(Error::NoGroupDefined)?;

    let expression = first_group
        .population
        .as_deref()
        .unwrap_or_default()
        .iter()
        .find(|population| population.is_kind(INITIAL_POPULATION))
        .and_then(|population| population.criteria.as_ref())
        .and_then(|criteria| criteria.expression.clone())
        .ok_or(Error::NoIppExpression)?;

    let output = engine.calculate_query_info(bundle, &expression).await?;

    // One member filter per retrieve, in retrieve order.
    let extensions = output
        .results
        .iter()
        .map(|retrieve| Extension {
            url: MEMBER_FILTER_URL.to_string(),
            value_expression: Some(FhirExpression {
                language: Some(X_FHIR_QUERY.to_string()),
                expression: Some(retrieve_query(retrieve, resolver)),
            }),
        })
        .collect();

    let name = format!("IPP-{}", measure.name.as_deref().unwrap_or_default());
    Ok(Group::conditional_person(name, extensions))
}

/// Compile one retrieve into a FHIR search query string.
///
/// The retrieve's terminology filter (value set, or a direct code when no
/// value set exists) and its where-clause fragments are ANDed; a retrieve
/// with neither compiles to the bare data-type name.
pub fn retrieve_query(retrieve: &DetailedTypeQuery, resolver: &dyn SearchParamResolver) -> String {
    let mut fragments: Vec<String> = Vec::new();

    if let Some(path) = &retrieve.path {
        if let Some(value_set) = &retrieve.value_set {
            fragments.push(format!("{path}:in={value_set}"));
        } else if let Some(code) = &retrieve.code {
            fragments.push(format!(
                "{path}={}|{}",
                code.system.as_deref().unwrap_or_default(),
                code.code.as_deref().unwrap_or_default()
            ));
        }
    }

    if let Some(filter) = retrieve.query_info.as_ref().and_then(|info| info.filter.as_ref()) {
        fragments.extend(compile_filter(filter, &retrieve.data_type, resolver));
    }

    if fragments.is_empty() {
        retrieve.data_type.clone()
    } else {
        format!("{}?{}", retrieve.data_type, fragments.join("&"))
    }
}
