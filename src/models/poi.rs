//! POI record structures flowing through the pipeline.

use geo::Geometry;
use serde::{Deserialize, Serialize};

/// Axis-aligned envelope of a filter geometry, in EPSG:4326.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BoundingBox {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.xmin && x <= self.xmax && y >= self.ymin && y <= self.ymax
    }
}

/// One row as returned by the remote store, geometry still encoded as WKT.
///
/// Ephemeral: rows are converted into [`Poi`]s by the clipper immediately
/// after fetch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRow {
    pub name: Option<String>,
    pub category: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub state: Option<String>,
    pub confidence: Option<f64>,
    /// Well-known text geometry, EPSG:4326.
    pub wkt: String,
}

impl RawRow {
    /// Apply ingestion normalization. The source postcode field may carry
    /// extended-format codes ("60637-1234"); downstream only the 5-digit
    /// code is used.
    pub fn normalized(mut self) -> Self {
        if let Some(zip) = self.zip.take() {
            self.zip = Some(zip.chars().take(5).collect());
        }
        self
    }
}

/// A materialized POI: parsed geometry plus the attribute columns.
///
/// Region provenance is not retained after the merge.
#[derive(Debug, Clone, PartialEq)]
pub struct Poi {
    pub name: Option<String>,
    pub category: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub state: Option<String>,
    pub confidence: Option<f64>,
    pub geometry: Geometry<f64>,
}

impl Poi {
    /// Attach attributes from a raw row to an already-parsed geometry.
    pub fn from_row(row: &RawRow, geometry: Geometry<f64>) -> Self {
        Self {
            name: row.name.clone(),
            category: row.category.clone(),
            address: row.address.clone(),
            city: row.city.clone(),
            zip: row.zip.clone(),
            state: row.state.clone(),
            confidence: row.confidence,
            geometry,
        }
    }
}

/// The pipeline's final artifact: an ordered, schema-homogeneous feature set.
#[derive(Debug, Clone, Default)]
pub struct PoiCollection {
    pub features: Vec<Poi>,
}

impl PoiCollection {
    pub fn new(features: Vec<Poi>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Poi> {
        self.features.iter()
    }

    /// Distinct category values in first-seen order.
    pub fn distinct_categories(&self) -> Vec<String> {
        let mut seen = hashbrown::HashSet::new();
        let mut out = Vec::new();
        for poi in &self.features {
            if let Some(cat) = &poi.category {
                if seen.insert(cat.clone()) {
                    out.push(cat.clone());
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::point;

    #[test]
    fn test_zip_truncated_to_five() {
        let row = RawRow {
            zip: Some("60637-1234".to_string()),
            ..Default::default()
        }
        .normalized();
        assert_eq!(row.zip.as_deref(), Some("60637"));
    }

    #[test]
    fn test_short_zip_unchanged() {
        let row = RawRow {
            zip: Some("607".to_string()),
            ..Default::default()
        }
        .normalized();
        assert_eq!(row.zip.as_deref(), Some("607"));
    }

    #[test]
    fn test_distinct_categories_first_seen_order() {
        let mk = |cat: &str| Poi {
            name: None,
            category: Some(cat.to_string()),
            address: None,
            city: None,
            zip: None,
            state: None,
            confidence: None,
            geometry: point!(x: 0.0, y: 0.0).into(),
        };
        let collection =
            PoiCollection::new(vec![mk("hospital"), mk("school"), mk("hospital"), mk("park")]);
        assert_eq!(
            collection.distinct_categories(),
            vec!["hospital", "school", "park"]
        );
    }
}
