//! Exporting one channel: filter, render, encode, optionally dump metadata.
//!
//! The processing trace records what happened to the data, in order:
//! gradient, colour range, then one entry per applied filter. It ends up in
//! the metadata file's `Info:Processing` line.

use crate::config::ExportConfig;
use crate::engine::ProcessingEngine;
use crate::metadata::{MetadataOutcome, write_metadata};
use crate::naming::{UNKNOWN_CHANNEL, export_paths, sanitize_title};
use crate::render::{Gradient, color_range, render_field, save_image};
use crate::scalebar::{ScaleBar, compute_scale_bar};
use crate::session::Session;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No channel with index {index} (file has {count})")]
    NoSuchChannel { index: usize, count: usize },
}

/// Everything that happened while exporting one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelExport {
    pub channel_id: u32,
    /// Sanitized title as used in the filename.
    pub title: String,
    pub color_range: (f64, f64),
    pub scale_bar: Option<ScaleBar>,
    pub trace: Vec<String>,
    /// Every filter token was applied.
    pub filters_ok: bool,
    pub image_path: PathBuf,
    pub metadata_path: PathBuf,
    pub image_written: bool,
    /// `None` when metadata was not requested or could not be written.
    pub metadata: Option<MetadataOutcome>,
}

/// Export the channel at `channel_index` of the session's file.
pub fn export_channel<E: ProcessingEngine>(
    session: &mut Session<'_, E>,
    config: &ExportConfig,
    channel_index: usize,
) -> Result<ChannelExport, ExportError> {
    let channel_id = *session
        .channel_ids()
        .get(channel_index)
        .ok_or(ExportError::NoSuchChannel {
            index: channel_index,
            count: session.channel_ids().len(),
        })?;

    let gradient = Gradient::by_name(&config.gradient).unwrap_or_else(|| {
        warn!(
            "Unknown gradient `{}', using `{}'",
            config.gradient,
            Gradient::default_gradient().name()
        );
        Gradient::default_gradient()
    });
    let mapping = config.color_mapping;
    let mut trace = vec![
        format!("Color gradient: `{}'", gradient.name()),
        format!("Color Range: {}", mapping.label()),
    ];

    let title = sanitize_title(
        session
            .file()
            .channel(channel_id)
            .and_then(|c| c.title.as_deref())
            .unwrap_or(UNKNOWN_CHANNEL),
    );
    info!("Processing channel {channel_id} : {title}");

    let chain = session
        .run_filters(channel_id, &config.filters)
        .unwrap_or_default();
    trace.extend(chain.descriptions());

    let channel = session
        .file()
        .channel(channel_id)
        .ok_or(ExportError::NoSuchChannel {
            index: channel_index,
            count: session.channel_ids().len(),
        })?;
    let field = &channel.field;

    let range = color_range(field, mapping);
    let scale_bar = compute_scale_bar(field.xreal(), field.si_unit_xy());
    match &scale_bar {
        Some(bar) => debug!("Scale bar {} ({:.0}% of width)", bar.label, bar.fraction * 100.0),
        None => warn!("Channel {channel_id} has no usable width, no scale bar"),
    }

    let img = render_field(field, &gradient, mapping, range);

    let paths = export_paths(
        &config.output_dir,
        session.source(),
        channel_index,
        &title,
        config.format,
    );
    let image_written = match save_image(&img, &paths.image, config.format) {
        Ok(()) => {
            info!(" => Saved to file `{}'", paths.image.display());
            true
        }
        Err(e) => {
            warn!("Error: file `{}' not saved: {e}", paths.image.display());
            false
        }
    };
    drop(img);

    let metadata = if config.metadata {
        match write_metadata(
            &paths.metadata,
            session.source(),
            session.file(),
            channel_id,
            &trace,
        ) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!("Error: metadata `{}' not saved: {e}", paths.metadata.display());
                None
            }
        }
    } else {
        None
    };

    Ok(ChannelExport {
        channel_id,
        title,
        color_range: range,
        scale_bar,
        trace,
        filters_ok: chain.success(),
        image_path: paths.image,
        metadata_path: paths.metadata,
        image_written,
        metadata,
    })
}
