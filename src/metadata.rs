//! Metadata text files.
//!
//! Next to each exported image an optional `.txt` file records where the data
//! came from, the channel's metadata entries and the processing applied:
//!
//! ```text
//! "Info:Metadata" string "Dumped by spmexport v0.1.0"
//! "Info:Sourcefile" string "/data/scan.gsf"
//! "Operator" string "kim"
//! "Info:Processing" string "Color gradient: `ReiGreen', Color Range: Auto, Plane level"
//! ```
//!
//! ## Container lookup
//!
//! The channel's own metadata container is used when present. Otherwise the
//! container of channel 0 stands in (files often attach metadata only to the
//! first channel). Without either, nothing is written.

use crate::data::{DataFile, MetaContainer, escape};
use std::path::Path;
use tracing::{info, warn};

/// Which container a metadata file was written from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaSource {
    Channel,
    /// Channel 0's container, standing in for a channel without one.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataOutcome {
    Written(MetaSource),
    /// No container found; no file written.
    Missing,
}

/// Find the container to dump for `channel_id`.
pub fn find_container(file: &DataFile, channel_id: u32) -> Option<(&MetaContainer, MetaSource)> {
    if let Some(meta) = file.meta(channel_id) {
        return Some((meta, MetaSource::Channel));
    }
    file.meta(0).map(|meta| (meta, MetaSource::Fallback))
}

fn string_line(key: &str, value: &str) -> String {
    format!("\"{key}\" string \"{}\"", escape(value))
}

/// Render the full metadata file. Every line ends with a newline.
pub fn format_metadata(source_file: &str, meta: &MetaContainer, trace: &[String]) -> String {
    let mut lines = vec![
        string_line(
            "Info:Metadata",
            &format!("Dumped by {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        ),
        string_line("Info:Sourcefile", source_file),
    ];
    lines.extend(meta.serialize_to_text());
    lines.push(string_line("Info:Processing", &trace.join(", ")));

    lines.iter().map(|l| format!("{l}\n")).collect()
}

/// Write the metadata file for one channel.
///
/// A missing container is logged and reported as [`MetadataOutcome::Missing`];
/// only I/O failures are errors.
pub fn write_metadata(
    path: &Path,
    source_file: &Path,
    data_file: &DataFile,
    channel_id: u32,
    trace: &[String],
) -> std::io::Result<MetadataOutcome> {
    let Some((meta, source)) = find_container(data_file, channel_id) else {
        warn!("Could not find any meta container, no metadata will be dumped");
        return Ok(MetadataOutcome::Missing);
    };
    if source == MetaSource::Fallback {
        info!("Could not find a channel specific meta container, fall back on channel 0");
    }

    let text = format_metadata(&source_file.to_string_lossy(), meta, trace);
    std::fs::write(path, text)?;
    Ok(MetadataOutcome::Written(source))
}
