//! Overture Places adapter: lazy parquet scans against the hive-partitioned
//! S3 release.
//!
//! Predicates are pushed into the scan so parquet row-group statistics prune
//! shards whose declared extent cannot intersect the query bbox. Pruning is
//! a performance concern only; over-fetching is corrected by the clipper.

use std::time::Instant;

use geozero::{wkb::Wkb, ToGeo};
use object_store::aws::AmazonS3ConfigKey;
use polars::io::cloud::CloudOptions;
use polars::prelude::*;
use tracing::{debug, info, warn};
use wkt::ToWkt;

use crate::error::ExtractError;
use crate::fetch::PlacesSource;
use crate::models::RawRow;
use crate::plan::QuerySpec;

/// Current Overture Places release root.
pub const DEFAULT_DATASET_URL: &str =
    "s3://overturemaps-us-west-2/release/2025-10-22.0/theme=places/type=place/*";

pub struct OvertureSource {
    dataset_url: String,
}

impl OvertureSource {
    pub fn new(dataset_url: impl Into<String>) -> Self {
        Self {
            dataset_url: dataset_url.into(),
        }
    }

    fn scan(&self, spec: &QuerySpec) -> PolarsResult<DataFrame> {
        // The release bucket allows anonymous reads; signing must be skipped
        // or the request fails.
        let cloud_options = CloudOptions::default().with_aws([
            (AmazonS3ConfigKey::SkipSignature, "true".to_string()),
            (AmazonS3ConfigKey::Region, "us-west-2".to_string()),
        ]);
        let args = ScanArgsParquet {
            cloud_options: Some(cloud_options),
            ..Default::default()
        };

        let bbox = |field: &str| col("bbox").struct_().field_by_name(field);
        let mut predicate = bbox("xmin")
            .gt_eq(lit(spec.bbox.xmin))
            .and(bbox("xmin").lt_eq(lit(spec.bbox.xmax)))
            .and(bbox("ymin").gt_eq(lit(spec.bbox.ymin)))
            .and(bbox("ymin").lt_eq(lit(spec.bbox.ymax)));

        if let Some(threshold) = spec.min_confidence {
            predicate = predicate.and(col("confidence").gt_eq(lit(threshold)));
        }
        if !spec.categories.is_empty() {
            let categories = Series::new("category", spec.categories.clone());
            predicate = predicate.and(
                col("categories")
                    .struct_()
                    .field_by_name("primary")
                    .is_in(lit(categories)),
            );
        }

        let address = |field: &str| {
            col("addresses")
                .list()
                .first()
                .struct_()
                .field_by_name(field)
        };

        LazyFrame::scan_parquet(&self.dataset_url, args)?
            .filter(predicate)
            .select([
                col("names").struct_().field_by_name("primary").alias("name"),
                col("categories")
                    .struct_()
                    .field_by_name("primary")
                    .alias("category"),
                address("freeform").alias("address"),
                address("locality").alias("city"),
                address("postcode").alias("zip"),
                address("region").alias("state"),
                col("confidence").round(2).alias("confidence"),
                col("geometry"),
            ])
            .collect()
    }
}

impl PlacesSource for OvertureSource {
    fn dataset(&self) -> &str {
        &self.dataset_url
    }

    fn fetch(&self, spec: &QuerySpec) -> Result<Vec<RawRow>, ExtractError> {
        debug!("Query spec: {:?}", spec);
        let start = Instant::now();

        let df = self
            .scan(spec)
            .map_err(|e| ExtractError::remote_fetch(&self.dataset_url, e))?;
        info!(
            "{} rows returned for bbox ({}, {}, {}, {}) in {:.1?}",
            df.height(),
            spec.bbox.xmin,
            spec.bbox.ymin,
            spec.bbox.xmax,
            spec.bbox.ymax,
            start.elapsed()
        );

        to_rows(&df).map_err(|e| ExtractError::remote_fetch(&self.dataset_url, e))
    }
}

/// Flatten a result frame into raw rows, decoding WKB geometry to WKT.
fn to_rows(df: &DataFrame) -> PolarsResult<Vec<RawRow>> {
    let name = df.column("name")?.str()?;
    let category = df.column("category")?.str()?;
    let address = df.column("address")?.str()?;
    let city = df.column("city")?.str()?;
    let zip = df.column("zip")?.str()?;
    let state = df.column("state")?.str()?;
    let confidence = df.column("confidence")?.f64()?;
    let geometry = df.column("geometry")?.binary()?;

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let Some(wkb) = geometry.get(i) else {
            warn!("Row {} has no geometry, skipping", i);
            continue;
        };
        let geom = Wkb(wkb)
            .to_geo()
            .map_err(|e| PolarsError::ComputeError(format!("bad WKB geometry: {e}").into()))?;

        let row = RawRow {
            name: name.get(i).map(str::to_string),
            category: category.get(i).map(str::to_string),
            address: address.get(i).map(str::to_string),
            city: city.get(i).map(str::to_string),
            zip: zip.get(i).map(str::to_string),
            state: state.get(i).map(str::to_string),
            confidence: confidence.get(i),
            wkt: geom.wkt_string(),
        };
        rows.push(row.normalized());
    }

    Ok(rows)
}
