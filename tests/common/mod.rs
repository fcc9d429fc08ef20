//! Test-side FIT encoder for building synthetic activity files.
#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use notebook_llm_lab::fit::crc;
use std::io::Write;
use std::path::Path;

/// One GPS sample, in physical units.
#[derive(Debug, Clone, Copy)]
pub struct Point {
    /// Seconds since the FIT epoch; `None` writes the invalid marker.
    pub timestamp: Option<u32>,
    pub lat_semicircles: i32,
    pub lon_semicircles: i32,
    pub distance_m: f64,
    pub speed_mps: f64,
    pub heart_rate: u8,
    pub enhanced_altitude_m: f64,
}

impl Point {
    pub fn at(timestamp: u32) -> Self {
        Self {
            timestamp: Some(timestamp),
            lat_semicircles: 1 << 30,
            lon_semicircles: -(1 << 29),
            distance_m: 0.0,
            speed_mps: 2.5,
            heart_rate: 140,
            enhanced_altitude_m: 100.0,
        }
    }

    pub fn distance(mut self, meters: f64) -> Self {
        self.distance_m = meters;
        self
    }

    pub fn speed(mut self, mps: f64) -> Self {
        self.speed_mps = mps;
        self
    }
}

// (field number, size, base type)
const FILE_ID_DEF: &[(u8, u8, u8)] = &[(0, 1, 0x00), (4, 4, 0x86)];
const RECORD_DEF: &[(u8, u8, u8)] = &[
    (253, 4, 0x86),
    (0, 4, 0x85),
    (1, 4, 0x85),
    (5, 4, 0x86),
    (6, 2, 0x84),
    (3, 1, 0x02),
    (78, 4, 0x86),
];

pub struct FitWriter {
    data: Vec<u8>,
}

impl FitWriter {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    fn define(&mut self, local: u8, global: u16, fields: &[(u8, u8, u8)]) {
        self.data.push(0x40 | local);
        self.data.push(0);
        self.data.push(0);
        self.data.extend_from_slice(&global.to_le_bytes());
        self.data.push(fields.len() as u8);
        for &(num, size, base) in fields {
            self.data.extend_from_slice(&[num, size, base]);
        }
    }

    pub fn activity(points: &[Point]) -> Vec<u8> {
        let mut writer = Self::new();
        let created = points.iter().find_map(|p| p.timestamp).unwrap_or(0);

        writer.define(0, 0, FILE_ID_DEF);
        writer.data.push(0);
        writer.data.push(4);
        writer.data.extend_from_slice(&created.to_le_bytes());

        writer.define(1, 20, RECORD_DEF);
        for p in points {
            writer.data.push(1);
            writer
                .data
                .extend_from_slice(&p.timestamp.unwrap_or(u32::MAX).to_le_bytes());
            writer.data.extend_from_slice(&p.lat_semicircles.to_le_bytes());
            writer.data.extend_from_slice(&p.lon_semicircles.to_le_bytes());
            writer
                .data
                .extend_from_slice(&((p.distance_m * 100.0).round() as u32).to_le_bytes());
            writer
                .data
                .extend_from_slice(&((p.speed_mps * 1000.0).round() as u16).to_le_bytes());
            writer.data.push(p.heart_rate);
            let altitude = ((p.enhanced_altitude_m + 500.0) * 5.0).round() as u32;
            writer.data.extend_from_slice(&altitude.to_le_bytes());
        }

        writer.finish()
    }

    fn finish(self) -> Vec<u8> {
        let mut out = vec![14, 0x20];
        out.extend_from_slice(&2132u16.to_le_bytes());
        out.extend_from_slice(&(self.data.len() as u32).to_le_bytes());
        out.extend_from_slice(b".FIT");
        let header_crc = crc::checksum(&out);
        out.extend_from_slice(&header_crc.to_le_bytes());
        out.extend_from_slice(&self.data);
        let file_crc = crc::checksum(&out);
        out.extend_from_slice(&file_crc.to_le_bytes());
        out
    }
}

pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

/// A short run: `n` points one second apart, 2.5 m/s.
pub fn run(start: u32, n: u32) -> Vec<Point> {
    (0..n)
        .map(|i| Point::at(start + i).distance(i as f64 * 2.5))
        .collect()
}

pub fn write_fit(dir: &Path, name: &str, points: &[Point]) {
    let bytes = FitWriter::activity(points);
    let data = if name.ends_with(".gz") { gzip(&bytes) } else { bytes };
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(name), data).unwrap();
}
