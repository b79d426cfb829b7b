//! FHIR quality-measure query generation command-line interface
//!
//! The measure calculation engine is an external collaborator; its output
//! is captured to JSON files and replayed here through the static engine.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use octofhir_fqm_query::{
    DataRequirementsResult, QueryInfoResult, StaticMeasureEngine, StaticSearchParams,
    collate_type_filters, membership_group,
};
use octofhir_fqm_types::Bundle;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// FHIR quality-measure query generation tool
#[derive(Parser)]
#[command(name = "fqm")]
#[command(author, version, about = "FHIR quality-measure query generation tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the calculation engine's data requirements
    DataRequirements {
        /// Captured engine data-requirements output (JSON)
        requirements: PathBuf,
    },
    /// Collate data requirements into a bulk-export query string
    BulkQueries {
        /// Captured engine data-requirements output (JSON)
        requirements: PathBuf,
    },
    /// Build the cohort membership Group for a measure bundle
    Group {
        /// Measure bundle (JSON)
        bundle: PathBuf,
        /// Captured engine query-info output for the IPP expression (JSON)
        #[arg(short, long)]
        query_info: PathBuf,
        /// Search parameter map, `{"DataType.attribute": "param"}`;
        /// conditions on unmapped attributes are dropped
        #[arg(short, long)]
        search_params: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    human_panic::setup_panic!();
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::DataRequirements { requirements } => data_requirements(&requirements),
        Commands::BulkQueries { requirements } => bulk_queries(&requirements),
        Commands::Group {
            bundle,
            query_info,
            search_params,
        } => group(&bundle, &query_info, search_params.as_deref()).await,
    };

    if let Err(e) = result {
        eprintln!("{} {e:#}", "error:".red().bold());
        std::process::exit(1);
    }
}

fn data_requirements(requirements: &Path) -> Result<()> {
    let output: DataRequirementsResult = load_json(requirements, "data-requirements")?;
    println!("{}", serde_json::to_string(&output.results)?);
    Ok(())
}

fn bulk_queries(requirements: &Path) -> Result<()> {
    let output: DataRequirementsResult = load_json(requirements, "data-requirements")?;
    let requirements = output.results.data_requirement.unwrap_or_default();
    println!("{}", collate_type_filters(&requirements));
    Ok(())
}

async fn group(bundle: &Path, query_info: &Path, search_params: Option<&Path>) -> Result<()> {
    let bundle: Bundle = load_json(bundle, "bundle")?;
    let query_info: QueryInfoResult = load_json(query_info, "query-info")?;
    let params: StaticSearchParams = match search_params {
        Some(path) => load_json(path, "search-params")?,
        None => StaticSearchParams::new(),
    };

    let engine = StaticMeasureEngine::new().with_query_info(query_info);
    let group = membership_group(&engine, &params, &bundle).await?;
    println!("{}", serde_json::to_string(&group)?);
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {what} file: {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse {what} file: {}", path.display()))
}
