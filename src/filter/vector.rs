//! Ad-hoc filter datasets: any GeoJSON file or URL with named attribute
//! fields, used as a one-feature geometry filter source.

use std::str::FromStr;

use geojson::{Feature, FeatureCollection, GeoJson};
use tracing::{debug, info};
use url::Url;

use crate::error::ExtractError;
use crate::filter::{to_multi_polygon, FilterGeometry};

/// Load a GeoJSON feature collection from a local path or an http(s) URL.
pub(crate) async fn load_feature_collection(
    location: &str,
) -> Result<FeatureCollection, ExtractError> {
    let text = match Url::parse(location) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {
            info!("Downloading filter dataset: {}", location);
            reqwest::get(url).await?.error_for_status()?.text().await?
        }
        _ => {
            debug!("Reading filter dataset from disk: {}", location);
            std::fs::read_to_string(location)?
        }
    };

    match GeoJson::from_str(&text)? {
        GeoJson::FeatureCollection(fc) => Ok(fc),
        GeoJson::Feature(f) => Ok(FeatureCollection {
            bbox: None,
            features: vec![f],
            foreign_members: None,
        }),
        GeoJson::Geometry(_) => Err(ExtractError::Geometry(format!(
            "'{location}' is a bare geometry, expected a feature collection"
        ))),
    }
}

/// Parse a feature's geometry into geo types, if it has one.
pub(crate) fn feature_geometry(feature: &Feature) -> Option<geo::Geometry<f64>> {
    let geometry = feature.geometry.as_ref()?;
    geo::Geometry::<f64>::try_from(&geometry.value).ok()
}

/// Exact-match test of a feature property against a string selector value.
/// Numeric properties are compared by their display form so `GEOID=36061`
/// matches both `"36061"` and `36061`.
pub(crate) fn property_matches(feature: &Feature, field: &str, value: &str) -> bool {
    match feature.properties.as_ref().and_then(|p| p.get(field)) {
        Some(serde_json::Value::String(s)) => s == value,
        Some(serde_json::Value::Number(n)) => n.to_string() == value,
        _ => false,
    }
}

/// Resolve a `field=value` selector against an arbitrary vector dataset into
/// a single filter geometry.
///
/// Whether the selected feature intersects the remote store's coverage is
/// deliberately not validated; an empty query result downstream is success.
pub async fn resolve_filter_unit(
    dataset: &str,
    selector: &str,
) -> Result<FilterGeometry, ExtractError> {
    let (field, value) = selector
        .split_once('=')
        .ok_or_else(|| ExtractError::MalformedSelector(selector.to_string()))?;

    let collection = load_feature_collection(dataset).await?;

    let feature = collection
        .features
        .iter()
        .find(|f| property_matches(f, field, value))
        .ok_or_else(|| ExtractError::FilterUnitNotFound {
            dataset: dataset.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        })?;

    let geometry = feature_geometry(feature)
        .and_then(to_multi_polygon)
        .ok_or_else(|| {
            ExtractError::Geometry(format!(
                "feature matching {field}={value} has no polygonal geometry"
            ))
        })?;

    info!("Filter geometry selected by {}={}", field, value);
    Ok(FilterGeometry::new(format!("{field}={value}"), geometry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DATASET: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"GEOID": "36061", "NAME": "New York"},
                "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}
            },
            {
                "type": "Feature",
                "properties": {"GEOID": 17031, "NAME": "Cook"},
                "geometry": {"type": "Polygon", "coordinates": [[[2,2],[3,2],[3,3],[2,3],[2,2]]]}
            }
        ]
    }"#;

    fn write_dataset() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DATASET.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_selects_first_matching_feature() {
        let file = write_dataset();
        let filter = resolve_filter_unit(file.path().to_str().unwrap(), "GEOID=36061")
            .await
            .unwrap();
        assert_eq!(filter.label, "GEOID=36061");
        assert_eq!(filter.geometry.0.len(), 1);
    }

    #[tokio::test]
    async fn test_numeric_property_matches_by_display_form() {
        let file = write_dataset();
        let filter = resolve_filter_unit(file.path().to_str().unwrap(), "GEOID=17031")
            .await
            .unwrap();
        assert_eq!(filter.label, "GEOID=17031");
    }

    #[tokio::test]
    async fn test_unmatched_unit_is_an_error() {
        let file = write_dataset();
        let err = resolve_filter_unit(file.path().to_str().unwrap(), "GEOID=99999")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::FilterUnitNotFound { .. }));
    }

    #[tokio::test]
    async fn test_malformed_selector() {
        let file = write_dataset();
        let err = resolve_filter_unit(file.path().to_str().unwrap(), "GEOID36061")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::MalformedSelector(_)));
    }
}
