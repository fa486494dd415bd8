//! Geometry filter resolution.
//!
//! Turns a user region specification into an ordered sequence of filter
//! polygons. Three mutually exclusive variants: a set of boundary ids
//! resolved against the boundary catalog, a single feature selected out of
//! an arbitrary vector dataset, or the packaged full-coverage geometry when
//! no region was specified.

pub mod boundary;
pub mod coverage;
pub mod vector;

use geo::{BooleanOps, BoundingRect, MultiPolygon, Polygon};
use tracing::info;

use crate::error::ExtractError;
use crate::models::BoundingBox;

pub use boundary::BoundaryCatalog;

/// An immutable filter polygon in EPSG:4326.
///
/// The sequence order of these defines the output ordering of the run.
#[derive(Debug, Clone)]
pub struct FilterGeometry {
    /// Human-readable label used for logging only.
    pub label: String,
    pub geometry: MultiPolygon<f64>,
}

impl FilterGeometry {
    pub fn new(label: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        Self {
            label: label.into(),
            geometry,
        }
    }

    /// Exact vertex min/max envelope.
    pub fn bbox(&self) -> Option<BoundingBox> {
        self.geometry
            .bounding_rect()
            .map(|rect| BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }
}

/// Which region the run is restricted to.
#[derive(Debug, Clone)]
pub enum RegionSpec {
    /// Boundary ids sharing a common catalog prefix, dissolved into one filter.
    BoundaryIds(Vec<String>),
    /// A `field=value` selector into an arbitrary vector dataset.
    FilterFile { dataset: String, selector: String },
    /// No filter: the packaged full-coverage geometry, one filter per piece.
    FullCoverage,
}

impl RegionSpec {
    /// Build a region spec from the raw CLI inputs, rejecting a half-given
    /// filter-file pair.
    pub fn from_args(
        boundary_ids: &[String],
        filter_file: Option<&str>,
        filter_unit: Option<&str>,
    ) -> Result<Self, ExtractError> {
        if !boundary_ids.is_empty() {
            return Ok(Self::BoundaryIds(boundary_ids.to_vec()));
        }
        match (filter_file, filter_unit) {
            (Some(dataset), Some(selector)) => Ok(Self::FilterFile {
                dataset: dataset.to_string(),
                selector: selector.to_string(),
            }),
            (None, None) => Ok(Self::FullCoverage),
            _ => Err(ExtractError::IncompleteFilterSpec),
        }
    }
}

/// Resolve a region spec into the ordered filter sequence for the run.
pub async fn resolve_filters(
    spec: &RegionSpec,
    catalog: &BoundaryCatalog,
) -> Result<Vec<FilterGeometry>, ExtractError> {
    let filters = match spec {
        RegionSpec::BoundaryIds(ids) => vec![boundary::resolve_boundary_ids(catalog, ids).await?],
        RegionSpec::FilterFile { dataset, selector } => {
            vec![vector::resolve_filter_unit(dataset, selector).await?]
        }
        RegionSpec::FullCoverage => coverage::full_coverage_filters()?,
    };
    info!("Resolved {} filter geometries", filters.len());
    Ok(filters)
}

/// Coerce a parsed geometry into a multi-polygon, flattening collections.
pub(crate) fn to_multi_polygon(geometry: geo::Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        geo::Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p])),
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::GeometryCollection(gc) => {
            let polys: Vec<Polygon<f64>> = gc
                .into_iter()
                .filter_map(to_multi_polygon)
                .flat_map(|mp| mp.0)
                .collect();
            if polys.is_empty() {
                None
            } else {
                Some(MultiPolygon::new(polys))
            }
        }
        _ => None,
    }
}

/// Union a set of polygonal geometries into one dissolved multi-polygon.
pub(crate) fn dissolve(parts: Vec<MultiPolygon<f64>>) -> Option<MultiPolygon<f64>> {
    let mut iter = parts.into_iter();
    let first = iter.next()?;
    Some(iter.fold(first, |acc, mp| acc.union(&mp)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Area};

    #[test]
    fn test_half_filter_spec_rejected() {
        let err = RegionSpec::from_args(&[], Some("file.geojson"), None).unwrap_err();
        assert!(matches!(err, ExtractError::IncompleteFilterSpec));

        let err = RegionSpec::from_args(&[], None, Some("GEOID=36061")).unwrap_err();
        assert!(matches!(err, ExtractError::IncompleteFilterSpec));
    }

    #[test]
    fn test_no_spec_means_full_coverage() {
        let spec = RegionSpec::from_args(&[], None, None).unwrap();
        assert!(matches!(spec, RegionSpec::FullCoverage));
    }

    #[test]
    fn test_dissolve_merges_adjacent_squares() {
        let a: MultiPolygon<f64> = polygon![
            (x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0), (x: 0.0, y: 0.0)
        ]
        .into();
        let b: MultiPolygon<f64> = polygon![
            (x: 1.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 1.0), (x: 1.0, y: 1.0), (x: 1.0, y: 0.0)
        ]
        .into();

        let dissolved = dissolve(vec![a, b]).unwrap();
        assert_eq!(dissolved.0.len(), 1);
        assert!((dissolved.unsigned_area() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_filter_bbox_is_vertex_envelope() {
        let filter = FilterGeometry::new(
            "test",
            polygon![
                (x: -3.0, y: 1.0), (x: 2.0, y: 1.0), (x: 2.0, y: 5.0), (x: -3.0, y: 5.0), (x: -3.0, y: 1.0)
            ]
            .into(),
        );
        let bbox = filter.bbox().unwrap();
        assert_eq!(bbox, crate::models::BoundingBox::new(-3.0, 1.0, 2.0, 5.0));
    }
}
