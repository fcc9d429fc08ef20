pub mod csv;
pub mod parquet;

use crate::core::frame::Frame;
use crate::utils::error::{LabError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::str::FromStr;
use zip::write::{FileOptions, ZipWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Parquet,
    Csv,
    Json,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Parquet, OutputFormat::Csv, OutputFormat::Json];

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Parquet => "parquet",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }

    pub fn encode(self, frame: &Frame) -> Result<Vec<u8>> {
        match self {
            OutputFormat::Parquet => parquet::to_parquet(frame),
            OutputFormat::Csv => csv::to_csv(frame),
            OutputFormat::Json => to_json(frame),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "parquet" => Ok(OutputFormat::Parquet),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(LabError::InvalidConfigValueError {
                field: "output_formats".to_string(),
                value: other.to_string(),
                reason: "Unsupported format. Valid formats: parquet, csv, json".to_string(),
            }),
        }
    }
}

/// Rows as an array of JSON objects; missing cells are omitted.
pub fn to_json(frame: &Frame) -> Result<Vec<u8>> {
    let mut rows = Vec::with_capacity(frame.height());
    for row in frame.rows() {
        let mut object = serde_json::Map::new();
        for (name, cell) in frame.columns().iter().zip(row) {
            if let Some(value) = cell {
                object.insert(name.clone(), serde_json::to_value(value)?);
            }
        }
        rows.push(serde_json::Value::Object(object));
    }
    Ok(serde_json::to_vec_pretty(&rows)?)
}

/// Packs already-encoded files into one ZIP archive.
pub fn bundle_zip(files: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, data) in files {
        zip.start_file::<_, ()>(name.as_str(), FileOptions::default())?;
        zip.write_all(data)?;
    }
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}
