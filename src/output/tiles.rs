//! Tippecanoe subprocess invocation for PMTiles output.
//!
//! The argument profile is fixed: z10 preserves block-group-scale shapes,
//! clustering keeps dense point sets renderable at low zooms. Exit status
//! and stderr are captured; nonzero exit fails the run.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::ExtractError;

/// Layer name baked into the tileset.
const LAYER_NAME: &str = "resources";

/// Convert an intermediate GeoJSON file into PMTiles.
pub async fn run_tippecanoe(
    binary: &Path,
    geojson_path: &Path,
    out_path: &Path,
) -> Result<(), ExtractError> {
    debug!(
        "Running {} on {} -> {}",
        binary.display(),
        geojson_path.display(),
        out_path.display()
    );

    let output = Command::new(binary)
        .arg("-z10")
        .args(["--cluster-distance", "10"])
        .args(["--cluster-maxzoom", "g"])
        .arg("-r1")
        .args(["-d", "20"])
        .args(["--projection", "EPSG:4326"])
        .arg("-o")
        .arg(out_path)
        .args(["-l", LAYER_NAME])
        .arg("--force")
        .arg(geojson_path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| ExtractError::TilingProcessFailed {
            status: -1,
            stderr: format!("failed to spawn '{}': {}", binary.display(), e),
        })?;

    if !output.status.success() {
        return Err(ExtractError::TilingProcessFailed {
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    info!("Tileset written to {}", out_path.display());
    Ok(())
}
