//! Per-file processing session.
//!
//! A [`Session`] owns everything that belongs to one loaded file: the data
//! itself, the processing settings the filter chain writes into, and the list
//! of channels to export. It is opened after a successful load and consumed by
//! [`Session::close`] when the file is done, so nothing carries over to the
//! next file.

use crate::data::DataFile;
use crate::engine::{ProcessingEngine, Settings};
use crate::filters::{FilterChainResult, run_filter_chain};
use std::path::Path;
use tracing::debug;

pub struct Session<'e, E: ProcessingEngine> {
    engine: &'e E,
    file: DataFile,
    settings: Settings,
    channel_ids: Vec<u32>,
}

impl<'e, E: ProcessingEngine> Session<'e, E> {
    /// Open a session on a loaded file, enumerating its channels.
    pub fn open(engine: &'e E, file: DataFile) -> Self {
        let channel_ids = file.channel_ids();
        debug!(
            "Opened {} with {} channel(s)",
            file.source().display(),
            channel_ids.len()
        );
        Self {
            engine,
            file,
            settings: Settings::default(),
            channel_ids,
        }
    }

    pub fn file(&self) -> &DataFile {
        &self.file
    }

    pub fn source(&self) -> &Path {
        self.file.source()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Channel ids in export order.
    pub fn channel_ids(&self) -> &[u32] {
        &self.channel_ids
    }

    /// Run a filter list on one channel's field.
    ///
    /// `None` if the file has no channel with this id.
    pub fn run_filters(&mut self, channel_id: u32, spec: &str) -> Option<FilterChainResult> {
        let channel = self.file.channel_mut(channel_id)?;
        Some(run_filter_chain(
            spec,
            self.engine,
            &mut channel.field,
            &mut self.settings,
        ))
    }

    /// Release the file and its settings.
    pub fn close(self) {
        debug!("Closed {}", self.file.source().display());
    }
}
