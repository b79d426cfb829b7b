//! Integration tests for the cohort membership group compiler

use octofhir_fqm_query::{
    Error, MEMBER_FILTER_URL, QueryInfoResult, StaticMeasureEngine, StaticSearchParams,
    X_FHIR_QUERY, membership_group,
};
use octofhir_fqm_types::Bundle;
use pretty_assertions::assert_eq;
use serde_json::json;

fn bundle(measure: serde_json::Value) -> Bundle {
    serde_json::from_value(json!({
        "resourceType": "Bundle",
        "entry": [{ "resource": measure }]
    }))
    .unwrap()
}

fn measure_with_ipp() -> Bundle {
    bundle(json!({
        "resourceType": "Measure",
        "name": "ExampleMeasure",
        "group": [
            {
                "population": [
                    {
                        "code": { "coding": [{ "code": "initial-population" }] },
                        "criteria": { "language": "text/cql", "expression": "Initial Population" }
                    }
                ]
            }
        ]
    }))
}

fn query_info(value: serde_json::Value) -> QueryInfoResult {
    serde_json::from_value(json!({ "results": value })).unwrap()
}

#[tokio::test]
async fn fails_without_any_measure() {
    let bundle: Bundle = serde_json::from_value(json!({
        "resourceType": "Bundle",
        "entry": [{ "resource": { "resourceType": "Patient" } }]
    }))
    .unwrap();

    let result = membership_group(
        &StaticMeasureEngine::new(),
        &StaticSearchParams::new(),
        &bundle,
    )
    .await;
    assert!(matches!(result, Err(Error::NoGroupDefined)));
}

#[tokio::test]
async fn fails_without_groups() {
    let bundle = bundle(json!({ "resourceType": "Measure", "name": "NoGroups" }));

    let result = membership_group(
        &StaticMeasureEngine::new(),
        &StaticSearchParams::new(),
        &bundle,
    )
    .await;
    assert!(matches!(result, Err(Error::NoGroupDefined)));
}

#[tokio::test]
async fn fails_without_ipp_population() {
    let bundle = bundle(json!({
        "resourceType": "Measure",
        "name": "NoIpp",
        "group": [
            {
                "population": [
                    {
                        "code": { "coding": [{ "code": "denominator" }] },
                        "criteria": { "expression": "Denominator" }
                    }
                ]
            }
        ]
    }));

    let result = membership_group(
        &StaticMeasureEngine::new(),
        &StaticSearchParams::new(),
        &bundle,
    )
    .await;
    assert!(matches!(result, Err(Error::NoIppExpression)));
}

#[tokio::test]
async fn fails_when_ipp_lacks_expression() {
    let bundle = bundle(json!({
        "resourceType": "Measure",
        "name": "NoExpression",
        "group": [
            {
                "population": [
                    { "code": { "coding": [{ "code": "initial-population" }] } }
                ]
            }
        ]
    }));

    let result = membership_group(
        &StaticMeasureEngine::new(),
        &StaticSearchParams::new(),
        &bundle,
    )
    .await;
    assert!(matches!(result, Err(Error::NoIppExpression)));
}

#[tokio::test]
async fn builds_group_with_one_extension_per_retrieve() {
    let engine = StaticMeasureEngine::new().with_query_info(query_info(json!([
        {
            "dataType": "Condition",
            "path": "code",
            "valueSet": "http://example.org/ValueSet/diabetes"
        },
        { "dataType": "Patient" }
    ])));

    let group = membership_group(&engine, &StaticSearchParams::new(), &measure_with_ipp())
        .await
        .unwrap();

    assert_eq!(group.name.as_deref(), Some("IPP-ExampleMeasure"));
    assert!(!group.actual);
    assert_eq!(group.group_type, "person");
    assert_eq!(group.modifier_extension.len(), 2);

    let expressions: Vec<&str> = group
        .modifier_extension
        .iter()
        .map(|ext| {
            assert_eq!(ext.url, MEMBER_FILTER_URL);
            let value = ext.value_expression.as_ref().unwrap();
            assert_eq!(value.language.as_deref(), Some(X_FHIR_QUERY));
            value.expression.as_deref().unwrap()
        })
        .collect();

    assert_eq!(
        expressions,
        vec![
            "Condition?code:in=http://example.org/ValueSet/diabetes",
            "Patient"
        ]
    );
}

#[tokio::test]
async fn compiles_filter_trees_with_resolved_attributes() {
    let engine = StaticMeasureEngine::new().with_query_info(query_info(json!([
        {
            "dataType": "Condition",
            "path": "code",
            "code": { "system": "http://hl7.org/fhir/sid/icd-10-cm", "code": "E11.9" },
            "queryInfo": {
                "filter": {
                    "type": "and",
                    "children": [
                        {
                            "type": "in",
                            "attribute": "clinicalStatus",
                            "valueCodingList": [{ "code": "active" }]
                        },
                        {
                            "type": "during",
                            "attribute": "onset",
                            "valuePeriod": { "start": "2024-01-01", "end": "2024-12-31" }
                        }
                    ]
                }
            }
        }
    ])));

    let mut params = StaticSearchParams::new();
    params.insert("Condition", "clinicalStatus", "clinical-status");
    params.insert("Condition", "onset", "onset-date");

    let group = membership_group(&engine, &params, &measure_with_ipp())
        .await
        .unwrap();

    let expression = group.modifier_extension[0]
        .value_expression
        .as_ref()
        .and_then(|value| value.expression.as_deref())
        .unwrap();
    assert_eq!(
        expression,
        "Condition?code=http://hl7.org/fhir/sid/icd-10-cm|E11.9&clinical-status=active&onset-date=gt2024-01-01&onset-date=lt2024-12-31"
    );
}

#[tokio::test]
async fn group_serializes_with_fhir_field_names() {
    let engine = StaticMeasureEngine::new()
        .with_query_info(query_info(json!([{ "dataType": "Patient" }])));

    let group = membership_group(&engine, &StaticSearchParams::new(), &measure_with_ipp())
        .await
        .unwrap();

    let value = serde_json::to_value(&group).unwrap();
    assert_eq!(
        value,
        json!({
            "resourceType": "Group",
            "actual": false,
            "type": "person",
            "name": "IPP-ExampleMeasure",
            "modifierExtension": [
                {
                    "url": "http://hl7.org/fhir/uv/bulkdata/StructureDefinition/member-filter",
                    "valueExpression": {
                        "language": "application/x-fhir-query",
                        "expression": "Patient"
                    }
                }
            ]
        })
    );
}
