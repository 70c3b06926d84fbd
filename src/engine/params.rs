//! Parameter types for engine functions.
//!
//! These structs describe *what* a process function should do, not *how*.
//! Functions that take parameters read them from [`Settings`], the per-file
//! processing-settings container, which the filter chain fills in right
//! before invoking the function.

/// Highest polynomial degree the levelling function accepts in either direction.
pub const MAX_POLY_DEGREE: u32 = 12;

/// What to do with a mask while levelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Masking {
    /// Use every sample for the fit.
    #[default]
    Ignore,
    /// Fit only to masked samples.
    Include,
    /// Fit only to unmasked samples.
    Exclude,
}

/// Polynomial levelling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolyLevelParams {
    pub col_degree: u32,
    pub row_degree: u32,
    pub max_degree: u32,
    pub masking: Masking,
    /// Store the fitted background instead of discarding it.
    pub do_extract: bool,
    /// Force `row_degree == col_degree`.
    pub same_degree: bool,
    /// Fit column and row degrees independently (full tensor-product basis).
    pub independent: bool,
}

impl PolyLevelParams {
    /// Parameters for an independent-degree fit with the fixed export configuration.
    pub fn new(col_degree: u32, row_degree: u32) -> Self {
        Self {
            col_degree,
            row_degree,
            max_degree: MAX_POLY_DEGREE,
            masking: Masking::Ignore,
            do_extract: false,
            same_degree: false,
            independent: true,
        }
    }
}

impl Default for PolyLevelParams {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// Processing-settings container, scoped to one loaded file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub polylevel: PolyLevelParams,
}
