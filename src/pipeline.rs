//! Fan-out/fan-in extraction driver.
//!
//! One worker per filter geometry: plan → fetch → normalize → clip, run
//! concurrently up to a configured bound. `buffered` yields results in input
//! order regardless of completion order, which gives the merger its required
//! deterministic ordering for free. Any region failure aborts the run; there
//! is no partial-result mode.

use std::sync::Arc;

use futures::{stream, StreamExt, TryStreamExt};
use tracing::info;

use crate::clip::{clip_rows, merge_regions};
use crate::error::ExtractError;
use crate::fetch::PlacesSource;
use crate::filter::FilterGeometry;
use crate::models::{Poi, PoiCollection, RawRow};
use crate::plan::{plan_query, Predicates};

pub const DEFAULT_CONCURRENCY: usize = 4;

/// Run the extraction over an ordered filter sequence.
pub async fn run_extraction<S>(
    source: Arc<S>,
    filters: Vec<FilterGeometry>,
    predicates: &Predicates,
    concurrency: usize,
) -> Result<PoiCollection, ExtractError>
where
    S: PlacesSource + 'static,
{
    // Plan every query up front; planning errors abort before any fetch.
    let planned: Vec<_> = filters
        .into_iter()
        .map(|filter| plan_query(&filter, predicates).map(|spec| (filter, spec)))
        .collect::<Result<_, _>>()?;

    info!("Dispatching {} region queries", planned.len());

    let jobs = planned.into_iter().map(|(filter, spec)| {
        let source = Arc::clone(&source);
        async move {
            let dataset = source.dataset().to_string();
            let rows = tokio::task::spawn_blocking(move || source.fetch(&spec))
                .await
                .map_err(|e| ExtractError::remote_fetch(&dataset, e))??;
            let rows: Vec<RawRow> = rows.into_iter().map(RawRow::normalized).collect();
            let features = clip_rows(&filter, &rows)?;
            Ok::<(usize, Vec<Poi>), ExtractError>((rows.len(), features))
        }
    });

    let results: Vec<(usize, Vec<Poi>)> = stream::iter(jobs)
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    let raw_total: usize = results.iter().map(|(n, _)| n).sum();
    let collection = merge_regions(results.into_iter().map(|(_, f)| f).collect());
    info!(
        "{} raw rows fetched, {} features after clipping",
        raw_total,
        collection.len()
    );

    Ok(collection)
}
