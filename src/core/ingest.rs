use crate::core::frame::Frame;
use crate::domain::model::{Record, Value};
use crate::fit::{self, DecodeOptions};
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

/// Degrees per FIT semicircle.
pub const SEMICIRCLE_TO_DEG: f64 = 180.0 / 2_147_483_648.0;

#[derive(Debug, Clone, Copy)]
pub struct CleanOptions {
    pub derived_columns: bool,
    pub drop_missing_timestamp: bool,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            derived_columns: true,
            drop_missing_timestamp: true,
        }
    }
}

/// Decoded `record` messages of one file; all-invalid messages are skipped.
pub fn records_from_bytes(name: &str, bytes: &[u8], options: DecodeOptions) -> Result<Vec<Record>> {
    let file = fit::decode_named(name, bytes, options)?;
    let records = file
        .messages("record")
        .map(|m| m.to_record())
        .filter(|r| !r.is_empty())
        .collect();
    Ok(records)
}

/// Reads one `.fit` / `.fit.gz` file. Failures are logged and give an empty frame.
pub fn read_fit(path: &Path) -> Frame {
    read_fit_with(path, DecodeOptions::default())
}

pub fn read_fit_with(path: &Path, options: DecodeOptions) -> Frame {
    let name = display_name(path);
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!("Failed to read {}: {}", name, e);
            return Frame::new();
        }
    };

    match records_from_bytes(&name, &bytes, options) {
        Ok(records) if records.is_empty() => {
            tracing::warn!("No record data in {}", name);
            Frame::new()
        }
        Ok(records) => Frame::from_records(&records),
        Err(e) => {
            tracing::error!("Failed to read {}: {}", name, e);
            Frame::new()
        }
    }
}

/// Adds the convenience columns and normalizes units.
pub fn add_derived_columns(frame: Frame) -> Frame {
    clean(frame, &CleanOptions::default())
}

pub fn clean(mut frame: Frame, options: &CleanOptions) -> Frame {
    if frame.is_empty() {
        return frame;
    }

    if options.derived_columns {
        frame.derive_column("distance_km", "distance", |v| {
            v.as_f64().map(|d| Value::Float(d / 1000.0))
        });

        frame.derive_column("pace_min_per_km", "speed", |v| {
            v.as_f64()
                .filter(|&s| s > 0.0)
                .map(|s| Value::Float((1000.0 / s) / 60.0))
        });

        if !frame.has_column("altitude") {
            frame.derive_column("altitude", "enhanced_altitude", |v| Some(v.clone()));
        }

        frame.derive_column("lat", "position_lat", |v| {
            v.as_f64().map(|s| Value::Float(s * SEMICIRCLE_TO_DEG))
        });
        frame.derive_column("lon", "position_long", |v| {
            v.as_f64().map(|s| Value::Float(s * SEMICIRCLE_TO_DEG))
        });
    }

    if options.drop_missing_timestamp && frame.has_column("timestamp") {
        frame.retain_where_present("timestamp");
        frame.sort_by_column("timestamp");
    }

    frame
}

pub fn read_and_clean_fit(path: &Path) -> Frame {
    add_derived_columns(read_fit(path))
}

/// `*.fit` and `*.fit.gz` directly inside `dir`, sorted by path.
pub fn list_fit_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && fit::is_fit_file(&display_name(&path)) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Run identifier for a file: its stem, so `a.fit.gz` gives `a.fit`.
pub fn run_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Loads every FIT file in a directory into one cleaned frame tagged with `run_id`.
pub fn load_fit_dir(dir: &Path) -> Frame {
    let files = match list_fit_files(dir) {
        Ok(files) => files,
        Err(e) => {
            tracing::error!("Cannot list {}: {}", dir.display(), e);
            Vec::new()
        }
    };

    let mut frames = Vec::new();
    for path in files {
        let mut frame = read_and_clean_fit(&path);
        if frame.is_empty() {
            tracing::warn!("Skipping empty or unreadable file: {}", display_name(&path));
            continue;
        }
        frame.fill_column("run_id", Value::Text(run_id(&path)));
        frames.push(frame);
    }

    if frames.is_empty() {
        tracing::warn!("No valid FIT files found in {}", dir.display());
        return Frame::new();
    }

    Frame::concat(frames)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
