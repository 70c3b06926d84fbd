//! Reading SPM data files from disk.
//!
//! [`FileLoader`] is the seam the batch driver loads through; [`GsfLoader`]
//! is the production implementation for Gwyddion Simple Field (`.gsf`) files.
//!
//! ## GSF layout
//!
//! ```text
//! Gwyddion Simple Field 1.0\n
//! XRes = 256\n
//! YRes = 256\n
//! XReal = 5e-06\n
//! ...
//! \0\0\0          1-4 NUL bytes, header length becomes a multiple of 4
//! <XRes*YRes little-endian f32, row-major>
//! ```

use crate::data::{Channel, DataFile, MetaContainer, MetaValue};
use crate::engine::{DataField, EngineError, SiUnit};
use std::path::{Path, PathBuf};
use thiserror::Error;

const GSF_MAGIC: &str = "Gwyddion Simple Field 1.0";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unrecognised file format: {}", .0.display())]
    UnknownFormat(PathBuf),
    #[error("Malformed file: {0}")]
    Malformed(String),
    #[error(transparent)]
    Field(#[from] EngineError),
}

/// Loads a data file into memory.
pub trait FileLoader {
    fn load(&self, path: &Path) -> Result<DataFile, LoadError>;
}

/// Loader for Gwyddion Simple Field files.
#[derive(Debug, Default)]
pub struct GsfLoader;

impl GsfLoader {
    pub fn new() -> Self {
        Self
    }
}

impl FileLoader for GsfLoader {
    fn load(&self, path: &Path) -> Result<DataFile, LoadError> {
        let bytes = std::fs::read(path)?;
        let channel = parse_gsf(&bytes).map_err(|e| match e {
            GsfError::NotGsf => LoadError::UnknownFormat(path.to_path_buf()),
            GsfError::Load(e) => e,
        })?;
        Ok(DataFile::new(path, vec![channel]))
    }
}

enum GsfError {
    NotGsf,
    Load(LoadError),
}

impl From<EngineError> for GsfError {
    fn from(e: EngineError) -> Self {
        GsfError::Load(e.into())
    }
}

fn malformed(msg: impl Into<String>) -> GsfError {
    GsfError::Load(LoadError::Malformed(msg.into()))
}

/// Header fields we interpret; everything else goes to the metadata container.
#[derive(Default)]
struct Header {
    xres: Option<usize>,
    yres: Option<usize>,
    xreal: Option<f64>,
    yreal: Option<f64>,
    xy_units: Option<String>,
    z_units: Option<String>,
    title: Option<String>,
    meta: MetaContainer,
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, GsfError> {
    value
        .parse()
        .map_err(|_| malformed(format!("invalid {key} value `{value}`")))
}

fn parse_header(text: &str) -> Result<Header, GsfError> {
    let mut lines = text.lines();
    if lines.next().map(str::trim_end) != Some(GSF_MAGIC) {
        return Err(GsfError::NotGsf);
    }

    let mut header = Header::default();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(malformed(format!("header line without `=`: {line}")));
        };
        let (key, value) = (key.trim(), value.trim());
        match key {
            "XRes" => header.xres = Some(parse_number(key, value)?),
            "YRes" => header.yres = Some(parse_number(key, value)?),
            "XReal" => header.xreal = Some(parse_number(key, value)?),
            "YReal" => header.yreal = Some(parse_number(key, value)?),
            "XYUnits" => header.xy_units = Some(value.to_string()),
            "ZUnits" => header.z_units = Some(value.to_string()),
            "Title" => header.title = Some(value.to_string()),
            _ => header.meta.insert(key, MetaValue::String(value.to_string())),
        }
    }
    Ok(header)
}

fn parse_gsf(bytes: &[u8]) -> Result<Channel, GsfError> {
    if !bytes.starts_with(GSF_MAGIC.as_bytes()) {
        return Err(GsfError::NotGsf);
    }
    let header_len = bytes
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| malformed("header is not NUL-terminated"))?;
    let text = std::str::from_utf8(&bytes[..header_len])
        .map_err(|_| malformed("header is not valid UTF-8"))?;
    let header = parse_header(text)?;

    let xres = header.xres.ok_or_else(|| malformed("missing XRes"))?;
    let yres = header.yres.ok_or_else(|| malformed("missing YRes"))?;

    let data_start = header_len + (4 - header_len % 4);
    let n = xres
        .checked_mul(yres)
        .ok_or_else(|| malformed("resolution overflows"))?;
    let bytes_needed = n
        .checked_mul(4)
        .ok_or_else(|| malformed("resolution overflows"))?;
    let payload = bytes
        .get(data_start..)
        .filter(|p| p.len() >= bytes_needed)
        .ok_or_else(|| malformed(format!("expected {n} samples after the header")))?;

    let (xy_unit, xy_power) = SiUnit::parse(header.xy_units.as_deref().unwrap_or("m"));
    let (z_unit, z_power) = SiUnit::parse(header.z_units.as_deref().unwrap_or("m"));
    let xy_scale = 10f64.powi(xy_power);
    let z_scale = 10f64.powi(z_power);

    let data = payload[..bytes_needed]
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f64 * z_scale)
        .collect();

    let field = DataField::new(
        xres,
        yres,
        header.xreal.unwrap_or(1.0) * xy_scale,
        header.yreal.unwrap_or(1.0) * xy_scale,
        data,
    )?
    .with_units(xy_unit, z_unit);

    let mut channel = Channel::new(0, field);
    if let Some(title) = header.title {
        channel = channel.with_title(title);
    }
    if !header.meta.is_empty() {
        channel = channel.with_meta(header.meta);
    }
    Ok(channel)
}
