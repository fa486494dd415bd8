//! POI extraction CLI.
//!
//! Queries the Overture Places dataset and extracts all points matching the
//! specified categories that fall within the provided spatial boundary, then
//! writes the result to GeoJSON, newline-delimited GeoJSON, or PMTiles.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use tamarack::fetch::overture::{OvertureSource, DEFAULT_DATASET_URL};
use tamarack::filter::{resolve_filters, BoundaryCatalog, RegionSpec};
use tamarack::output::{self, OutputSpec};
use tamarack::pipeline::{run_extraction, DEFAULT_CONCURRENCY};
use tamarack::plan::Predicates;

#[derive(Parser, Debug)]
#[command(name = "extract")]
#[command(about = "Extract POIs from the Overture Places release within a spatial boundary")]
struct Args {
    /// Exact name of one or more categories to include in the query. A value
    /// naming an existing file is read as a newline-separated category list.
    /// If not provided, all points are included.
    #[arg(short = 'c', long)]
    categories: Vec<String>,

    /// Path to the output file; the suffix selects the format (.geojson,
    /// .geojsonl, .pmtiles). If not provided, only a result summary is logged.
    #[arg(short = 'o', long)]
    outfile: Option<PathBuf>,

    /// Confidence level to use when querying (greater than or equal).
    #[arg(long, default_value_t = 0.9)]
    confidence: f64,

    /// Disable the confidence filter entirely.
    #[arg(long)]
    any_confidence: bool,

    /// One or more boundary ids matched against the prepared census boundary
    /// files to acquire a geometry filter. All ids must share one prefix.
    #[arg(short = 'g', long)]
    boundary_ids: Vec<String>,

    /// Geospatial dataset (GeoJSON, local path or URL) with geometry to
    /// filter against.
    #[arg(long)]
    filter_file: Option<String>,

    /// field=value selector for the single feature in --filter-file to use
    /// as the geometry filter.
    #[arg(long)]
    filter_unit: Option<String>,

    /// Export a list of all categories included in the result to a CSV file.
    /// Only really useful if no categories were given in the filter.
    #[arg(long)]
    export_category_list: bool,

    /// Write a separate file for each category in the results.
    #[arg(long)]
    separate_files: bool,

    /// Path to the tippecanoe binary, needed for conversion to PMTiles.
    #[arg(long)]
    tippecanoe_path: Option<PathBuf>,

    /// Root of the partitioned places dataset.
    #[arg(long, default_value = DEFAULT_DATASET_URL)]
    dataset_url: String,

    /// Maximum concurrent region queries.
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Tamarack POI Extraction");

    // Pre-flight validation: everything here fails before any remote I/O.
    let catalog = BoundaryCatalog::default();
    let region = RegionSpec::from_args(
        &args.boundary_ids,
        args.filter_file.as_deref(),
        args.filter_unit.as_deref(),
    )?;
    if !args.boundary_ids.is_empty() {
        catalog.validate_ids(&args.boundary_ids)?;
    }
    let output_spec = args
        .outfile
        .clone()
        .map(|path| OutputSpec::from_path(path, args.tippecanoe_path.clone()))
        .transpose()?;

    let predicates = Predicates {
        categories: expand_categories(&args.categories)?,
        min_confidence: (!args.any_confidence).then_some(args.confidence),
    };
    match &predicates.min_confidence {
        Some(t) => info!("Confidence filter: >= {}", t),
        None => info!("Confidence filter: disabled"),
    }
    info!("Category filter: {:?}", predicates.categories);

    // Resolve the region into filter geometries.
    let filters = resolve_filters(&region, &catalog)
        .await
        .context("Failed to resolve the geometry filter")?;

    // Query, clip, and merge.
    let source = Arc::new(OvertureSource::new(&args.dataset_url));
    let collection = run_extraction(source, filters, &predicates, args.concurrency)
        .await
        .context("Extraction failed")?;

    // Optional category-list side channel.
    if args.export_category_list {
        let path = match &args.outfile {
            Some(outfile) => output::category_list_path(outfile),
            None => PathBuf::from("categories.csv"),
        };
        output::write_category_list(&collection, &path)?;
    }

    // Materialize.
    match output_spec {
        Some(spec) => {
            if args.separate_files {
                let written = output::write_separate_files(&collection, &spec).await?;
                info!("Saved {} per-category files", written.len());
            } else {
                let path = output::write_output(&collection, &spec).await?;
                info!("Saved to: {}", path.display());
            }
        }
        None => {
            info!(
                "{} features extracted ({} distinct categories); no --outfile given",
                collection.len(),
                collection.distinct_categories().len()
            );
        }
    }

    Ok(())
}

/// Expand category arguments: a value naming an existing file is read as a
/// newline-separated list, anything else is taken literally.
fn expand_categories(values: &[String]) -> Result<Vec<String>> {
    let mut categories = Vec::new();
    for value in values {
        if Path::new(value).is_file() {
            let text = std::fs::read_to_string(value)
                .with_context(|| format!("Failed to read category list '{value}'"))?;
            categories.extend(
                text.lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(String::from),
            );
        } else {
            categories.push(value.clone());
        }
    }
    Ok(categories)
}
