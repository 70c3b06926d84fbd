//! Batch driver: walks the input paths and exports every channel of every file.
//!
//! Inputs are handled in command-line order:
//!
//! - **Directory**: its immediate entries, sorted by name. Regular files are
//!   exported; subdirectories and other entries are skipped. Failing to read
//!   the directory aborts the whole run.
//! - **Existing file**: exported directly.
//! - **Anything else**: skipped with a message.
//!
//! Load failures, empty files and per-channel problems are logged and
//! recorded in the [`BatchSummary`]; they never stop the batch.

use crate::config::ExportConfig;
use crate::engine::{NativeEngine, ProcessingEngine};
use crate::export::{ChannelExport, export_channel};
use crate::loader::{FileLoader, GsfLoader};
use crate::session::Session;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Cannot read directory {}: {source}", path.display())]
    Enumerate {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

#[derive(Debug)]
pub enum FileOutcome {
    Exported(Vec<ChannelExport>),
    LoadFailed(String),
    NoChannels,
}

#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

/// What a batch run did, file by file.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub files: Vec<FileReport>,
    /// Inputs and directory entries that were not data files.
    pub skipped: Vec<PathBuf>,
}

impl BatchSummary {
    fn exports(&self) -> impl Iterator<Item = &ChannelExport> {
        self.files.iter().flat_map(|f| match &f.outcome {
            FileOutcome::Exported(channels) => channels.as_slice(),
            _ => &[][..],
        })
    }

    /// Images successfully written.
    pub fn images_written(&self) -> usize {
        self.exports().filter(|e| e.image_written).count()
    }

    /// Channels whose image could not be written.
    pub fn images_failed(&self) -> usize {
        self.exports().filter(|e| !e.image_written).count()
    }

    /// Files that could not be loaded.
    pub fn load_failures(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::LoadFailed(_)))
            .count()
    }
}

/// Run the batch with the built-in loader and engine.
pub fn run(config: &ExportConfig) -> Result<BatchSummary, BatchError> {
    run_with(config, &GsfLoader::new(), &NativeEngine::new())
}

/// Run the batch with an explicit loader and engine.
pub fn run_with<L: FileLoader, E: ProcessingEngine>(
    config: &ExportConfig,
    loader: &L,
    engine: &E,
) -> Result<BatchSummary, BatchError> {
    if let Err(e) = std::fs::create_dir_all(&config.output_dir) {
        warn!(
            "Cannot create output directory {}: {e}",
            config.output_dir.display()
        );
    }

    let mut summary = BatchSummary::default();
    for input in &config.inputs {
        if input.is_dir() {
            for path in directory_entries(input)? {
                if path.is_file() {
                    info!("===> Processing file {}", path.display());
                    summary.files.push(export_file(&path, config, loader, engine));
                } else {
                    info!("Skipping {}: not a regular file", path.display());
                    summary.skipped.push(path);
                }
            }
        } else if input.exists() {
            info!("===> Processing file {}", input.display());
            summary.files.push(export_file(input, config, loader, engine));
        } else {
            info!("Skipping {}: no such file or directory", input.display());
            summary.skipped.push(input.clone());
        }
    }
    Ok(summary)
}

/// Immediate entries of `dir`, sorted by file name.
fn directory_entries(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| entry.map(|e| e.into_path()))
        .collect::<Result<_, _>>()
        .map_err(|source| BatchError::Enumerate {
            path: dir.to_path_buf(),
            source,
        })
}

/// Load one file and export all of its channels.
fn export_file<L: FileLoader, E: ProcessingEngine>(
    path: &Path,
    config: &ExportConfig,
    loader: &L,
    engine: &E,
) -> FileReport {
    let report = |outcome| FileReport {
        path: path.to_path_buf(),
        outcome,
    };

    let file = match loader.load(path) {
        Ok(file) => file,
        Err(e) => {
            warn!("Cannot load `{}': {e}", path.display());
            return report(FileOutcome::LoadFailed(e.to_string()));
        }
    };

    let mut session = Session::open(engine, file);
    let count = session.channel_ids().len();
    if count == 0 {
        warn!("File `{}' contains no channels to export", path.display());
        session.close();
        return report(FileOutcome::NoChannels);
    }

    let mut exports = Vec::with_capacity(count);
    for index in 0..count {
        match export_channel(&mut session, config, index) {
            Ok(export) => exports.push(export),
            Err(e) => warn!("{}: {e}", path.display()),
        }
    }
    session.close();
    report(FileOutcome::Exported(exports))
}
