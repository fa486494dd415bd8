//! Census boundary resolution: a fixed catalog of boundary datasets keyed by
//! the 3-character id prefix, and the dissolve of all matching boundary
//! features into one filter geometry.

use hashbrown::{HashMap, HashSet};
use tracing::info;

use crate::error::ExtractError;
use crate::filter::{dissolve, to_multi_polygon, FilterGeometry};

use super::vector::{feature_geometry, load_feature_collection, property_matches};

/// Attribute field carrying the boundary id in the catalog datasets.
const BOUNDARY_ID_FIELD: &str = "HEROP_ID";

/// Immutable mapping from an id prefix to the boundary dataset holding that
/// geographic level. Constructed once at startup and passed into the
/// resolver explicitly.
#[derive(Debug, Clone)]
pub struct BoundaryCatalog {
    sources: HashMap<&'static str, &'static str>,
}

impl Default for BoundaryCatalog {
    fn default() -> Self {
        let mut sources = HashMap::new();
        sources.insert(
            "040",
            "https://herop-geodata.s3.us-east-2.amazonaws.com/census/state-2018-500k.geojson",
        );
        sources.insert(
            "050",
            "https://herop-geodata.s3.us-east-2.amazonaws.com/census/county-2018-500k.geojson",
        );
        sources.insert(
            "140",
            "https://herop-geodata.s3.us-east-2.amazonaws.com/census/tract-2018-500k.geojson",
        );
        sources.insert(
            "150",
            "https://herop-geodata.s3.us-east-2.amazonaws.com/census/bg-2018-500k.geojson",
        );
        sources.insert(
            "160",
            "https://herop-geodata.s3.us-east-2.amazonaws.com/census/place-2018-500k.geojson",
        );
        sources.insert(
            "860",
            "https://herop-geodata.s3.us-east-2.amazonaws.com/census/zcta-2018-500k.geojson",
        );
        Self { sources }
    }
}

impl BoundaryCatalog {
    /// Validate an id set: all ids must share one prefix and that prefix must
    /// key into the catalog. Returns the dataset URL for the shared prefix.
    ///
    /// Called during pre-flight, before any remote I/O.
    pub fn validate_ids(&self, ids: &[String]) -> Result<&'static str, ExtractError> {
        let prefixes: HashSet<String> = ids
            .iter()
            .map(|id| id.chars().take(3).collect::<String>())
            .collect();

        if prefixes.len() > 1 {
            let mut sorted: Vec<String> = prefixes.into_iter().collect();
            sorted.sort();
            return Err(ExtractError::MixedRegionPrefixes(sorted));
        }

        let prefix = prefixes.into_iter().next().unwrap_or_default();
        self.sources
            .get(prefix.as_str())
            .copied()
            .ok_or_else(|| ExtractError::InvalidRegionPrefix {
                prefix,
                id: ids.first().cloned().unwrap_or_default(),
            })
    }
}

/// Load the boundary dataset for the ids' shared prefix, select the matching
/// features, and dissolve them into a single filter geometry.
pub async fn resolve_boundary_ids(
    catalog: &BoundaryCatalog,
    ids: &[String],
) -> Result<FilterGeometry, ExtractError> {
    let url = catalog.validate_ids(ids)?;

    let collection = load_feature_collection(url).await?;
    info!(
        "Boundary dataset loaded: {} features from {}",
        collection.features.len(),
        url
    );

    let parts: Vec<_> = collection
        .features
        .iter()
        .filter(|f| ids.iter().any(|id| property_matches(f, BOUNDARY_ID_FIELD, id)))
        .filter_map(|f| feature_geometry(f).and_then(to_multi_polygon))
        .collect();

    let matched = parts.len();
    let geometry = dissolve(parts).ok_or_else(|| {
        ExtractError::Geometry(format!(
            "none of the {} boundary ids matched a feature in {}",
            ids.len(),
            url
        ))
    })?;

    info!("Dissolved {} boundary features into one filter", matched);
    Ok(FilterGeometry::new(ids.join("+"), geometry))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_county_prefix() {
        let catalog = BoundaryCatalog::default();
        let url = catalog
            .validate_ids(&["050US36061".to_string(), "050US17031".to_string()])
            .unwrap();
        assert!(url.contains("county"));
    }

    #[test]
    fn test_mixed_prefixes_rejected() {
        let catalog = BoundaryCatalog::default();
        let err = catalog
            .validate_ids(&["050US36061".to_string(), "140US36061000100".to_string()])
            .unwrap_err();
        match err {
            ExtractError::MixedRegionPrefixes(prefixes) => {
                assert_eq!(prefixes, vec!["050".to_string(), "140".to_string()]);
            }
            other => panic!("expected MixedRegionPrefixes, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_prefix_rejected() {
        let catalog = BoundaryCatalog::default();
        let err = catalog.validate_ids(&["999US00000".to_string()]).unwrap_err();
        match err {
            ExtractError::InvalidRegionPrefix { prefix, id } => {
                assert_eq!(prefix, "999");
                assert_eq!(id, "999US00000");
            }
            other => panic!("expected InvalidRegionPrefix, got {other:?}"),
        }
    }
}
