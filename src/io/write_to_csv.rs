use std::fs::OpenOptions;
use std::path::Path;

use csv::WriterBuilder;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One row of the detection history written at every report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub time: f64,
    pub tstep: usize,
    pub detected: usize,
    pub max_activation: f64,
    /// Zero when the active stabilizer carries no viscosity.
    pub max_visc: f64,
}

/// Appends `record` to the CSV file at `path`; the header goes in only when
/// the file is created.
pub fn append_detection_history(path: impl AsRef<Path>, record: &DetectionRecord) -> Result<()> {
    let path = path.as_ref();
    let is_new = !path.exists() || path.metadata()?.len() == 0;
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = WriterBuilder::new().has_headers(is_new).from_writer(file);
    writer.serialize(record)?;
    writer.flush()?;
    Ok(())
}
