//! Output file naming.
//!
//! Every exported channel produces files named after the input file, the
//! channel index and the channel title:
//!
//! - `scan.ibw`, channel 2, "Height", PNG → `scan.ibw-2-Height.png`
//! - `scan.ibw`, channel 0, "Z Height", JPEG → `scan.ibw-0-Z_Height.jpg`
//!
//! The metadata file shares the image's stem with a `.txt` extension.

use crate::render::ImageFormat;
use std::path::{Path, PathBuf};

/// Title used when a channel has none.
pub const UNKNOWN_CHANNEL: &str = "Unknown channel";

/// Make a channel title usable inside a filename.
///
/// Spaces and path separators become underscores.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            c => c,
        })
        .collect()
}

/// Paths of the files written for one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPaths {
    pub image: PathBuf,
    pub metadata: PathBuf,
}

/// Build the output paths for a channel.
///
/// `title` must already be sanitized.
pub fn export_paths(
    output_dir: &Path,
    input: &Path,
    channel_index: usize,
    title: &str,
    format: ImageFormat,
) -> ExportPaths {
    let basename = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = format!("{basename}-{channel_index}-{title}");
    ExportPaths {
        image: output_dir.join(format!("{stem}.{}", format.extension())),
        metadata: output_dir.join(format!("{stem}.txt")),
    }
}
