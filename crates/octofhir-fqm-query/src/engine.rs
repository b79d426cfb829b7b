//! Measure calculation engine seam
//!
//! The CQL/FHIR measure-evaluation engine is an external collaborator. This
//! module defines the trait the query generators call through, the serde
//! envelopes of the engine's wire output, and a replay implementation that
//! serves pre-computed results.

use async_trait::async_trait;
use octofhir_fqm_types::{Bundle, DataRequirement, DetailedTypeQuery};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Calculation engine error
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("calculation failed: {0}")]
    CalculationFailed(String),

    #[error("invalid engine output: {0}")]
    InvalidOutput(String),
}

/// Envelope of a data-requirements calculation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataRequirementsResult {
    /// Calculation results
    pub results: DataRequirementsBody,
}

/// Body of a data-requirements calculation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRequirementsBody {
    /// The data requirements of the measure's logic
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_requirement: Option<Vec<DataRequirement>>,
}

/// Envelope of a query-info calculation for one focused statement
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryInfoResult {
    /// One entry per retrieve contributing to the focused statement
    pub results: Vec<DetailedTypeQuery>,
}

/// External measure calculation engine.
///
/// Implementations are opaque; each generator awaits at most one call per
/// run and propagates failures unmodified.
#[async_trait]
pub trait MeasureEngine: Send + Sync {
    /// Calculate the data requirements of the measure in the bundle
    async fn calculate_data_requirements(
        &self,
        bundle: &Bundle,
    ) -> std::result::Result<DataRequirementsResult, EngineError>;

    /// Statically analyze the retrieves of one named expression
    async fn calculate_query_info(
        &self,
        bundle: &Bundle,
        focused_statement: &str,
    ) -> std::result::Result<QueryInfoResult, EngineError>;
}

/// Engine implementation serving pre-computed results.
///
/// Used by tests and by the CLI to replay engine output captured to files.
#[derive(Debug, Clone, Default)]
pub struct StaticMeasureEngine {
    data_requirements: DataRequirementsResult,
    query_info: QueryInfoResult,
}

impl StaticMeasureEngine {
    /// Create an engine with empty results
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the data-requirements result to serve
    pub fn with_data_requirements(mut self, results: DataRequirementsResult) -> Self {
        self.data_requirements = results;
        self
    }

    /// Set the query-info result to serve
    pub fn with_query_info(mut self, results: QueryInfoResult) -> Self {
        self.query_info = results;
        self
    }
}

#[async_trait]
impl MeasureEngine for StaticMeasureEngine {
    async fn calculate_data_requirements(
        &self,
        _bundle: &Bundle,
    ) -> std::result::Result<DataRequirementsResult, EngineError> {
        Ok(self.data_requirements.clone())
    }

    async fn calculate_query_info(
        &self,
        _bundle: &Bundle,
        _focused_statement: &str,
    ) -> std::result::Result<QueryInfoResult, EngineError> {
        Ok(self.query_info.clone())
    }
}
