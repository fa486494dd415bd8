//! Remote fetch boundary.
//!
//! The pipeline talks to the places store through [`PlacesSource`] so tests
//! can substitute an in-memory source for the Overture parquet release.

pub mod overture;

pub use overture::OvertureSource;

use crate::error::ExtractError;
use crate::models::RawRow;
use crate::plan::QuerySpec;

/// A read-only source of place rows, queried one [`QuerySpec`] at a time.
///
/// Implementations own their connection/session state; the pipeline gives
/// each region worker the same shared handle and never mutates it. A fetch
/// failure aborts the whole run, so implementations should surface errors
/// rather than degrade to partial results.
pub trait PlacesSource: Send + Sync {
    /// Identifier of the backing dataset, for logging and error context.
    fn dataset(&self) -> &str;

    /// Execute one query. Row order must be stable for identical inputs.
    fn fetch(&self, spec: &QuerySpec) -> Result<Vec<RawRow>, ExtractError>;
}
