//! Data model for FHIR quality-measure query generation
//!
//! This crate provides:
//! - Minimal serde models of the FHIR shapes the query generators read and write
//! - Data-requirement shapes produced by the measure calculation engine
//! - The boolean/comparison filter tree attached to compiled retrieves

pub mod fhir;
pub mod filter;
pub mod requirements;

pub use fhir::*;
pub use filter::*;
pub use requirements::*;
