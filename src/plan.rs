//! Query planning: pure translation from a filter geometry plus predicates
//! into a remote-query specification. The planner never inspects data.

use crate::error::ExtractError;
use crate::filter::FilterGeometry;
use crate::models::BoundingBox;

/// A remote-query specification for one filter geometry.
///
/// The bounding box over-approximates the filter's extent; rows selected by
/// it are clipped back to the true geometry afterwards. Clauses compose with
/// logical AND on top of the mandatory bbox overlap test.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub bbox: BoundingBox,
    /// Exact-match category set; empty means no category clause.
    pub categories: Vec<String>,
    /// Greater-or-equal confidence threshold; `None` means no clause.
    pub min_confidence: Option<f64>,
}

/// Predicates shared by every query of a run.
#[derive(Debug, Clone, Default)]
pub struct Predicates {
    pub categories: Vec<String>,
    pub min_confidence: Option<f64>,
}

/// Plan the query for one filter geometry.
pub fn plan_query(
    filter: &FilterGeometry,
    predicates: &Predicates,
) -> Result<QuerySpec, ExtractError> {
    let bbox = filter.bbox().ok_or_else(|| {
        ExtractError::Geometry(format!("filter '{}' has an empty extent", filter.label))
    })?;

    Ok(QuerySpec {
        bbox,
        categories: predicates.categories.clone(),
        min_confidence: predicates.min_confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn triangle() -> FilterGeometry {
        FilterGeometry::new(
            "triangle",
            polygon![(x: -74.3, y: 40.5), (x: -73.7, y: 40.5), (x: -74.0, y: 40.9), (x: -74.3, y: 40.5)]
                .into(),
        )
    }

    #[test]
    fn test_bbox_is_exact_vertex_envelope() {
        let spec = plan_query(&triangle(), &Predicates::default()).unwrap();
        assert_eq!(spec.bbox, BoundingBox::new(-74.3, 40.5, -73.7, 40.9));
    }

    #[test]
    fn test_clauses_pass_through() {
        let predicates = Predicates {
            categories: vec!["hospital".to_string()],
            min_confidence: Some(0.9),
        };
        let spec = plan_query(&triangle(), &predicates).unwrap();
        assert_eq!(spec.categories, vec!["hospital".to_string()]);
        assert_eq!(spec.min_confidence, Some(0.9));
    }

    #[test]
    fn test_absent_predicates_stay_absent() {
        let spec = plan_query(&triangle(), &Predicates::default()).unwrap();
        assert!(spec.categories.is_empty());
        assert!(spec.min_confidence.is_none());
    }

    #[test]
    fn test_empty_filter_is_an_error() {
        let empty = FilterGeometry::new("empty", geo::MultiPolygon::new(vec![]));
        assert!(plan_query(&empty, &Predicates::default()).is_err());
    }
}
