//! Console output that is not logging: startup banner and final summary.
//!
//! # Output Format
//!
//! ```text
//! ==
//! This is spmexport v0.1.0
//! ==
//! ```
//!
//! ```text
//! scan.gsf
//!     0 Unknown_channel → scan.gsf-0-Unknown_channel.jpg
//!     1 Z_Height → scan.gsf-1-Z_Height.jpg (filters incomplete)
//! broken.gsf
//!     Load failed: Unrecognised file format: broken.gsf
//! notes
//!     Skipped
//! Exported 2 images from 2 files (1 failed to load)
//! ```
//!
//! # Architecture
//!
//! Each piece has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::batch::{BatchSummary, FileOutcome};
use crate::export::ChannelExport;
use std::path::Path;

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Startup banner.
pub fn format_banner() -> Vec<String> {
    vec![
        "==".to_string(),
        format!(
            "This is {} v{}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ),
        "==".to_string(),
    ]
}

pub fn print_banner() {
    for line in format_banner() {
        println!("{}", line);
    }
}

fn channel_line(export: &ChannelExport) -> String {
    let mut line = format!(
        "    {} {} \u{2192} {}",
        export.channel_id,
        export.title,
        display_name(&export.image_path)
    );
    if !export.image_written {
        line.push_str(" (not written)");
    } else if !export.filters_ok {
        line.push_str(" (filters incomplete)");
    }
    line
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Per-file report followed by a one-line total.
pub fn format_summary(summary: &BatchSummary) -> Vec<String> {
    let mut lines = Vec::new();

    for report in &summary.files {
        lines.push(display_name(&report.path));
        match &report.outcome {
            FileOutcome::Exported(exports) => lines.extend(exports.iter().map(channel_line)),
            FileOutcome::LoadFailed(reason) => lines.push(format!("    Load failed: {reason}")),
            FileOutcome::NoChannels => lines.push("    No channels".to_string()),
        }
    }
    for path in &summary.skipped {
        lines.push(display_name(path));
        lines.push("    Skipped".to_string());
    }

    let mut total = format!(
        "Exported {} from {}",
        plural(summary.images_written(), "image"),
        plural(summary.files.len(), "file")
    );
    if summary.load_failures() > 0 {
        total.push_str(&format!(" ({} failed to load)", summary.load_failures()));
    }
    lines.push(total);
    lines
}

pub fn print_summary(summary: &BatchSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
