//! Output materialization.
//!
//! The path suffix selects the format: GeoJSON and newline-delimited GeoJSON
//! write directly; PMTiles goes through an intermediate GeoJSON file and the
//! external tippecanoe tool. A distinct-category CSV can be written as a
//! side channel independent of the main format.

pub mod tiles;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::info;

use crate::error::ExtractError;
use crate::models::{Poi, PoiCollection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    GeoJson,
    /// Newline-delimited GeoJSON features.
    GeoJsonSeq,
    PmTiles,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("geojson") => Ok(Self::GeoJson),
            Some("geojsonl") | Some("ndjson") => Ok(Self::GeoJsonSeq),
            Some("pmtiles") => Ok(Self::PmTiles),
            _ => Err(ExtractError::UnsupportedOutputFormat(path.to_path_buf())),
        }
    }
}

/// Where and how to materialize a run's feature collection.
#[derive(Debug, Clone)]
pub struct OutputSpec {
    pub path: PathBuf,
    pub format: OutputFormat,
    pub tippecanoe_path: Option<PathBuf>,
}

impl OutputSpec {
    /// Validate the output target. Called during pre-flight: a PMTiles path
    /// without a tippecanoe binary fails here, before any query executes.
    pub fn from_path(
        path: PathBuf,
        tippecanoe_path: Option<PathBuf>,
    ) -> Result<Self, ExtractError> {
        let format = OutputFormat::from_path(&path)?;
        if format == OutputFormat::PmTiles && tippecanoe_path.is_none() {
            return Err(ExtractError::TilingExecutableMissing);
        }
        Ok(Self {
            path,
            format,
            tippecanoe_path,
        })
    }
}

/// Write the collection to the spec's target. Returns the artifact path.
pub async fn write_output(
    collection: &PoiCollection,
    spec: &OutputSpec,
) -> Result<PathBuf, ExtractError> {
    match spec.format {
        OutputFormat::GeoJson => write_geojson(collection, &spec.path)?,
        OutputFormat::GeoJsonSeq => write_geojson_seq(collection, &spec.path)?,
        OutputFormat::PmTiles => {
            let binary = spec
                .tippecanoe_path
                .as_deref()
                .ok_or(ExtractError::TilingExecutableMissing)?;
            let intermediate = spec.path.with_extension("geojson");
            write_geojson(collection, &intermediate)?;
            tiles::run_tippecanoe(binary, &intermediate, &spec.path).await?;
        }
    }
    info!("Saved {} features to {}", collection.len(), spec.path.display());
    Ok(spec.path.clone())
}

/// Write one artifact per distinct category, suffixing the file stem.
pub async fn write_separate_files(
    collection: &PoiCollection,
    spec: &OutputSpec,
) -> Result<Vec<PathBuf>, ExtractError> {
    let mut written = Vec::new();
    for category in collection.distinct_categories() {
        let subset = PoiCollection::new(
            collection
                .iter()
                .filter(|p| p.category.as_deref() == Some(category.as_str()))
                .cloned()
                .collect(),
        );
        let sub_spec = OutputSpec {
            path: category_path(&spec.path, &category),
            format: spec.format,
            tippecanoe_path: spec.tippecanoe_path.clone(),
        };
        written.push(write_output(&subset, &sub_spec).await?);
    }
    Ok(written)
}

/// Sibling path for one category's artifact: `<stem>__<category>.<ext>`.
fn category_path(path: &Path, category: &str) -> PathBuf {
    let sanitized: String = category
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("geojson");
    path.with_file_name(format!("{stem}__{sanitized}.{ext}"))
}

/// Sibling path carrying the category list: `<name>__categories.csv`.
pub fn category_list_path(outfile: &Path) -> PathBuf {
    let name = outfile
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("output");
    outfile.with_file_name(format!("{name}__categories.csv"))
}

/// Write the distinct category values, one per line, no header.
pub fn write_category_list(
    collection: &PoiCollection,
    path: &Path,
) -> Result<PathBuf, ExtractError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| ExtractError::Io(std::io::Error::other(e)))?;
    for category in collection.distinct_categories() {
        writer
            .write_record([category.as_str()])
            .map_err(|e| ExtractError::Io(std::io::Error::other(e)))?;
    }
    writer
        .flush()
        .map_err(|e| ExtractError::Io(std::io::Error::other(e)))?;
    info!("Category list written to {}", path.display());
    Ok(path.to_path_buf())
}

fn to_feature(poi: &Poi) -> geojson::Feature {
    let mut properties = geojson::JsonObject::new();
    properties.insert("name".to_string(), json!(poi.name));
    properties.insert("category".to_string(), json!(poi.category));
    properties.insert("address".to_string(), json!(poi.address));
    properties.insert("city".to_string(), json!(poi.city));
    properties.insert("zip".to_string(), json!(poi.zip));
    properties.insert("state".to_string(), json!(poi.state));
    properties.insert("confidence".to_string(), json!(poi.confidence));

    geojson::Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geojson::Value::from(&poi.geometry))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn write_geojson(collection: &PoiCollection, path: &Path) -> Result<(), ExtractError> {
    let fc = geojson::FeatureCollection {
        bbox: None,
        features: collection.iter().map(to_feature).collect(),
        foreign_members: None,
    };
    let file = BufWriter::new(File::create(path)?);
    serde_json::to_writer(file, &fc).map_err(|e| ExtractError::Io(std::io::Error::other(e)))?;
    Ok(())
}

fn write_geojson_seq(collection: &PoiCollection, path: &Path) -> Result<(), ExtractError> {
    let mut file = BufWriter::new(File::create(path)?);
    for poi in collection.iter() {
        serde_json::to_writer(&mut file, &to_feature(poi))
            .map_err(|e| ExtractError::Io(std::io::Error::other(e)))?;
        file.write_all(b"\n")?;
    }
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::point;
    use std::str::FromStr;

    fn poi(name: &str, category: &str) -> Poi {
        Poi {
            name: Some(name.to_string()),
            category: Some(category.to_string()),
            address: None,
            city: None,
            zip: Some("60637".to_string()),
            state: Some("IL".to_string()),
            confidence: Some(0.93),
            geometry: point!(x: -87.6, y: 41.8).into(),
        }
    }

    #[test]
    fn test_format_from_suffix() {
        assert_eq!(
            OutputFormat::from_path(Path::new("out.geojson")).unwrap(),
            OutputFormat::GeoJson
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("out.geojsonl")).unwrap(),
            OutputFormat::GeoJsonSeq
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("out.pmtiles")).unwrap(),
            OutputFormat::PmTiles
        );
        assert!(OutputFormat::from_path(Path::new("out.xlsx")).is_err());
    }

    #[test]
    fn test_pmtiles_without_tippecanoe_is_preflight_error() {
        let err = OutputSpec::from_path(PathBuf::from("out.pmtiles"), None).unwrap_err();
        assert!(matches!(err, ExtractError::TilingExecutableMissing));
    }

    #[tokio::test]
    async fn test_geojson_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pois.geojson");
        let spec = OutputSpec::from_path(path.clone(), None).unwrap();

        let collection = PoiCollection::new(vec![poi("a", "hospital"), poi("b", "school")]);
        write_output(&collection, &spec).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed = geojson::GeoJson::from_str(&text).unwrap();
        match parsed {
            geojson::GeoJson::FeatureCollection(fc) => {
                assert_eq!(fc.features.len(), 2);
                let props = fc.features[0].properties.as_ref().unwrap();
                assert_eq!(props["name"], "a");
                assert_eq!(props["zip"], "60637");
            }
            other => panic!("expected a feature collection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_collection_writes_well_formed_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.geojson");
        let spec = OutputSpec::from_path(path.clone(), None).unwrap();

        write_output(&PoiCollection::default(), &spec).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        match geojson::GeoJson::from_str(&text).unwrap() {
            geojson::GeoJson::FeatureCollection(fc) => assert!(fc.features.is_empty()),
            other => panic!("expected a feature collection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_separate_files_per_category() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pois.geojson");
        let spec = OutputSpec::from_path(path, None).unwrap();

        let collection =
            PoiCollection::new(vec![poi("a", "hospital"), poi("b", "school"), poi("c", "hospital")]);
        let written = write_separate_files(&collection, &spec).await.unwrap();

        assert_eq!(written.len(), 2);
        assert!(written[0].to_str().unwrap().contains("hospital"));
        assert!(written[1].to_str().unwrap().contains("school"));
        for p in &written {
            assert!(p.exists());
        }
    }

    #[test]
    fn test_category_list_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("pois.geojson");
        let side = category_list_path(&out);
        assert!(side.to_str().unwrap().ends_with("pois.geojson__categories.csv"));

        let collection = PoiCollection::new(vec![poi("a", "hospital"), poi("b", "school")]);
        write_category_list(&collection, &side).unwrap();
        let text = std::fs::read_to_string(&side).unwrap();
        assert_eq!(text.trim(), "hospital\nschool");
    }
}
