//! Packaged full-coverage geometry: a pre-dissolved multi-polygon of the
//! supported extent, used when no region was specified. Each disjoint piece
//! becomes its own filter so the pipeline fans out per piece instead of
//! issuing one unbounded query.

use std::str::FromStr;

use geo::MultiPolygon;
use geojson::GeoJson;

use crate::error::ExtractError;
use crate::filter::FilterGeometry;

const COVERAGE_GEOJSON: &str = include_str!("../../resources/full-us-dissolved.geojson");

/// One filter geometry per disjoint coverage piece, in resource order.
pub fn full_coverage_filters() -> Result<Vec<FilterGeometry>, ExtractError> {
    let geojson = GeoJson::from_str(COVERAGE_GEOJSON)?;
    let geometry = match geojson {
        GeoJson::Geometry(g) => geo::Geometry::<f64>::try_from(&g.value)
            .map_err(|e| ExtractError::Geometry(e.to_string()))?,
        _ => {
            return Err(ExtractError::Geometry(
                "packaged coverage resource must be a bare geometry".to_string(),
            ))
        }
    };

    let pieces = match geometry {
        geo::Geometry::MultiPolygon(mp) => mp.0,
        geo::Geometry::Polygon(p) => vec![p],
        _ => {
            return Err(ExtractError::Geometry(
                "packaged coverage resource must be polygonal".to_string(),
            ))
        }
    };

    Ok(pieces
        .into_iter()
        .enumerate()
        .map(|(i, p)| FilterGeometry::new(format!("coverage-{}", i + 1), MultiPolygon::new(vec![p])))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coverage_is_multi_piece() {
        let filters = full_coverage_filters().unwrap();
        assert!(filters.len() > 1);
        for filter in &filters {
            assert_eq!(filter.geometry.0.len(), 1);
            assert!(filter.bbox().is_some());
        }
    }

    #[test]
    fn test_coverage_piece_order_is_stable() {
        let filters = full_coverage_filters().unwrap();
        assert_eq!(filters[0].label, "coverage-1");
        assert_eq!(filters[filters.len() - 1].label, format!("coverage-{}", filters.len()));
    }
}
