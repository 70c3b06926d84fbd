//! Shared test utilities.
//!
//! Builders for synthetic fields and data files, plus on-disk Gwyddion Simple
//! Field fixtures for loader and batch tests.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let path = write_gsf(tmp.path(), "scan.gsf", &["XRes = 2", "YRes = 2"], &[0.0; 4]);
//! let file = GsfLoader::new().load(&path).unwrap();
//! ```

use std::path::{Path, PathBuf};

use crate::data::{Channel, DataFile, MetaContainer, MetaValue};
use crate::engine::DataField;

// =========================================================================
// Fields
// =========================================================================

/// All-zero field, 1 µm square.
pub fn flat_field(xres: usize, yres: usize) -> DataField {
    DataField::new(xres, yres, 1e-6, 1e-6, vec![0.0; xres * yres]).unwrap()
}

/// Field rising along x and y, 1 µm square.
pub fn ramp_field(xres: usize, yres: usize) -> DataField {
    let data = (0..xres * yres)
        .map(|i| (i % xres) as f64 * 1e-9 + (i / xres) as f64 * 2e-9)
        .collect();
    DataField::new(xres, yres, 1e-6, 1e-6, data).unwrap()
}

/// Two-channel file `scan.gsf`:
/// - channel 0: untitled, metadata `Operator = kim`
/// - channel 1: titled "Z Height", no metadata
pub fn sample_file() -> DataFile {
    let mut meta = MetaContainer::new();
    meta.insert("Operator", MetaValue::String("kim".into()));
    DataFile::new(
        "scan.gsf",
        vec![
            Channel::new(0, ramp_field(8, 6)).with_meta(meta),
            Channel::new(1, ramp_field(8, 6)).with_title("Z Height"),
        ],
    )
}

// =========================================================================
// GSF fixtures
// =========================================================================

/// Encode a Gwyddion Simple Field file from header lines and samples.
pub fn gsf_bytes(header: &[&str], samples: &[f32]) -> Vec<u8> {
    let mut bytes = b"Gwyddion Simple Field 1.0\n".to_vec();
    for line in header {
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');
    }
    let padding = 4 - bytes.len() % 4;
    bytes.extend(std::iter::repeat_n(0u8, padding));
    for s in samples {
        bytes.extend_from_slice(&s.to_le_bytes());
    }
    bytes
}

/// Write a GSF fixture into `dir` and return its path.
pub fn write_gsf(dir: &Path, name: &str, header: &[&str], samples: &[f32]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, gsf_bytes(header, samples)).unwrap();
    path
}

/// A small valid 4x4 GSF fixture with a title.
pub fn write_valid_gsf(dir: &Path, name: &str) -> PathBuf {
    let samples: Vec<f32> = (0..16).map(|i| i as f32).collect();
    write_gsf(
        dir,
        name,
        &["XRes = 4", "YRes = 4", "XReal = 1", "XYUnits = um", "Title = Height"],
        &samples,
    )
}
