//! Error taxonomy for the extraction pipeline.
//!
//! Validation errors fire before any remote I/O; fetch errors abort the whole
//! run. An empty result set is not an error anywhere in the pipeline.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// A boundary id carries a prefix that is not in the boundary catalog.
    #[error("invalid prefix '{prefix}' on boundary id '{id}'")]
    InvalidRegionPrefix { prefix: String, id: String },

    /// The boundary id set spans more than one geographic level.
    #[error("boundary ids must all share the same prefix, got: {0:?}")]
    MixedRegionPrefixes(Vec<String>),

    /// No feature in the filter dataset matched the `field=value` selector.
    #[error("no feature matching {field}={value} in {dataset}")]
    FilterUnitNotFound {
        dataset: String,
        field: String,
        value: String,
    },

    /// `--filter-file` and `--filter-unit` must be given together.
    #[error("--filter-file and --filter-unit must both be provided if one is to be used")]
    IncompleteFilterSpec,

    /// PMTiles output requested without a tippecanoe binary path.
    #[error("tippecanoe path needed for PMTiles output")]
    TilingExecutableMissing,

    /// The output path suffix does not map to a known format.
    #[error("unsupported output format for '{0}'")]
    UnsupportedOutputFormat(PathBuf),

    /// A query against the remote store failed.
    #[error("remote fetch against '{dataset}' failed: {source}")]
    RemoteFetch {
        dataset: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The tiling subprocess exited nonzero or could not be spawned.
    #[error("tippecanoe failed (status {status}): {stderr}")]
    TilingProcessFailed { status: i32, stderr: String },

    #[error("malformed selector '{0}', expected field=value")]
    MalformedSelector(String),

    #[error("geometry error: {0}")]
    Geometry(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    GeoJson(#[from] geojson::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// Wrap an arbitrary store-side failure with the dataset it hit.
    pub fn remote_fetch<E>(dataset: &str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::RemoteFetch {
            dataset: dataset.to_string(),
            source: Box::new(source),
        }
    }
}
