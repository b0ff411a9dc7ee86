//! JSON-lines persistence sink
//!
//! Appends one record per saved region to a file. Each record is written and
//! flushed in a single call so a failed save never leaves a partial line
//! behind from this process.

use chrono::{DateTime, Utc};
use palmscan_core::{
    Detection, PersistenceError, PersistenceResult, PersistenceSink, RegionGeometry, RegionId,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One persisted region as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedRegion<D> {
    pub region_id: RegionId,
    pub saved_at: DateTime<Utc>,
    /// Region outline as a GeoJSON polygon
    pub geometry: Value,
    /// Area in square metres
    pub area: f64,
    pub detections: Vec<D>,
}

/// File-backed sink writing newline-delimited JSON
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    file: File,
}

impl JsonLinesSink {
    /// Open or create the output file in append mode
    pub fn open(path: impl AsRef<Path>) -> PersistenceResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    /// Path of the output file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record back from a sink file
    pub fn read_all<D>(path: impl AsRef<Path>) -> PersistenceResult<Vec<PersistedRegion<D>>>
    where
        D: for<'de> Deserialize<'de>,
    {
        let reader = BufReader::new(File::open(path)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }
}

impl<D> PersistenceSink<D> for JsonLinesSink
where
    D: Detection + Serialize,
{
    fn save(
        &mut self,
        region: RegionId,
        geometry: &RegionGeometry,
        predictions: &[D],
    ) -> PersistenceResult<()> {
        let record = PersistedRegion {
            region_id: region,
            saved_at: Utc::now(),
            geometry: geometry.to_geojson(),
            area: geometry.area_m2(),
            detections: predictions.to_vec(),
        };
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        self.file
            .write_all(line.as_bytes())
            .and_then(|()| self.file.flush())
            .map_err(PersistenceError::Io)?;

        debug!(region = %region, path = %self.path.display(), "Appended region record");
        Ok(())
    }
}
