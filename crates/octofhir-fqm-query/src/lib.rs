//! FHIR search query generation from quality-measure data requirements
//!
//! This crate turns the structured output of an external measure calculation
//! engine into FHIR REST search query strings:
//! - the type-filter collator builds one bulk-export query string
//!   (`_type=...&_typeFilter=...`) from a flat data-requirement list
//! - the filter-expression compiler builds one query string per compiled
//!   retrieve and packages them as member-filter modifier extensions on a
//!   conditional-membership `Group` resource
//!
//! Both generators degrade by omission: conditions that cannot be expressed
//! as search parameters are dropped (broadening the query), never guessed.

mod bulk;
mod engine;
mod error;
mod filter;
mod group;
mod search_param;
mod value;

pub use bulk::{bulk_export_query, collate_type_filters};
pub use engine::{
    DataRequirementsBody, DataRequirementsResult, EngineError, MeasureEngine, QueryInfoResult,
    StaticMeasureEngine,
};
pub use error::{Error, Result};
pub use filter::compile_filter;
pub use group::{INITIAL_POPULATION, MEMBER_FILTER_URL, X_FHIR_QUERY, membership_group, retrieve_query};
pub use search_param::{SearchParamResolver, StaticSearchParams};
pub use value::encode_value;
