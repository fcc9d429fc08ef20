//! Garmin FIT activity file decoding.
//!
//! Handles plain and chained files, compressed timestamp headers and
//! developer fields (skipped). Gzipped files (`.fit.gz`, as exported by
//! Strava) are inflated before decoding.

pub mod crc;
pub mod decoder;
pub mod profile;

pub use decoder::{DataMessage, DecodeOptions, Field, FileHeader, FitFile};

use flate2::read::GzDecoder;
use std::io::Read;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FitError {
    #[error("unexpected end of data at byte {offset}")]
    Truncated { offset: usize },

    #[error("invalid header size {0} (expected 12 or 14)")]
    InvalidHeaderSize(u8),

    #[error("missing .FIT signature")]
    BadSignature,

    #[error("CRC mismatch: stored {expected:#06x}, computed {computed:#06x}")]
    CrcMismatch { expected: u16, computed: u16 },

    #[error("data message for undefined local type {0}")]
    UndefinedLocalType(u8),

    #[error("gzip decompression failed: {0}")]
    Gzip(#[from] std::io::Error),
}

pub fn is_fit_file(name: &str) -> bool {
    name.ends_with(".fit") || name.ends_with(".fit.gz")
}

/// Decodes `bytes`, inflating them first when `name` ends in `.gz`.
pub fn decode_named(name: &str, bytes: &[u8], options: DecodeOptions) -> Result<FitFile, FitError> {
    if name.ends_with(".gz") {
        let mut inflated = Vec::new();
        GzDecoder::new(bytes).read_to_end(&mut inflated)?;
        FitFile::from_bytes(&inflated, options)
    } else {
        FitFile::from_bytes(bytes, options)
    }
}
