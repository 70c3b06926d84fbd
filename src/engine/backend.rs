//! Processing engine trait and shared error type.
//!
//! The [`ProcessingEngine`] trait is the seam between the filter chain and the
//! data-processing algorithms. Functions are addressed by name, the same
//! names users type in `any:<name>` filters, so existence can be checked
//! before anything runs.
//!
//! The production implementation is [`NativeEngine`](super::native::NativeEngine).
//! Tests use the recording `MockEngine` defined below.

use super::field::DataField;
use super::params::Settings;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Unknown process function: {0}")]
    UnknownFunction(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Invalid data field: {0}")]
    InvalidField(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// A library of named data-processing functions.
///
/// Every call blocks until the field has been modified in place.
pub trait ProcessingEngine {
    /// Whether a process function with this name is registered.
    fn function_exists(&self, name: &str) -> bool;

    /// Run a named process function on `field`, reading parameters from `settings`.
    fn run_function(
        &self,
        name: &str,
        field: &mut DataField,
        settings: &Settings,
    ) -> Result<(), EngineError>;

    /// Square mean (box) filter with a window of `size` pixels per side.
    fn mean_filter(&self, field: &mut DataField, size: u32) -> Result<(), EngineError>;
}
