//! # spmexport
//!
//! Batch export of scanning-probe-microscopy data channels to JPEG or PNG
//! images, with an optional metadata text file per channel.
//!
//! # Pipeline
//!
//! Every channel of every input file goes through the same steps:
//!
//! ```text
//! 1. Load     file.gsf     →  DataFile        (channels + metadata)
//! 2. Filter   DataField    →  DataField       (pc;melc;sr;... in order)
//! 3. Render   DataField    →  RgbImage        (gradient + colour mapping)
//! 4. Save     RgbImage     →  out/file.gsf-0-Height.jpg
//! 5. Dump     metadata     →  out/file.gsf-0-Height.txt   (with --metadata)
//! ```
//!
//! Problems are reported and skipped at the smallest possible scope: a bad
//! filter token skips that token, an unwritable image skips that channel, an
//! unloadable file skips that file. Only an unreadable input directory ends
//! the run.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`batch`] | Walks inputs, loads files, exports every channel, collects a summary |
//! | [`session`] | One loaded file plus the engine and settings its filters run with |
//! | [`export`] | Filters, renders and saves one channel; builds the processing trace |
//! | [`filters`] | Filter-list parser and chain runner (`pc`, `melc`, `sr`, `poly:x,y`, `mean:x`, `any:name`) |
//! | [`engine`] | Data fields, SI units, processing parameters and the [`engine::ProcessingEngine`] trait |
//! | [`loader`] | [`loader::FileLoader`] trait and the Gwyddion Simple Field reader |
//! | [`data`] | Channels, data files and typed metadata containers |
//! | [`render`] | Gradients, colour mapping and JPEG/PNG encoding |
//! | [`scalebar`] | Picks a round scale-bar length for a field width |
//! | [`metadata`] | Metadata text dump with the processing trace |
//! | [`naming`] | Output filenames |
//! | [`config`] | TOML settings file, merging with CLI flags, resolution with fallbacks |
//! | [`output`] | Startup banner and end-of-run summary |
//!
//! # Design Decisions
//!
//! ## Engine Behind a Trait
//!
//! Filters never touch the numeric algorithms directly. They translate tokens
//! into [`engine::ProcessingEngine`] calls, so the chain logic is tested
//! against a recording mock and the native implementation is tested on its
//! own.
//!
//! ## Settings As Data
//!
//! Levelling, extraction and masking options live in a typed
//! [`engine::Settings`] value owned by the session, not in a global store.
//! `poly:x,y` writes the degrees there before running `polylevel`, which is
//! what makes them visible to the engine.
//!
//! ## Keep Going
//!
//! Batch exports are usually run unattended over a whole measurement day.
//! Each failure is logged with its file and channel, recorded in the
//! summary, and the run moves on.

pub mod batch;
pub mod config;
pub mod data;
pub mod engine;
pub mod export;
pub mod filters;
pub mod loader;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod render;
pub mod scalebar;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;
