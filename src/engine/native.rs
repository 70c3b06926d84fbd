//! Pure Rust processing engine.
//!
//! ## Function registry
//!
//! | Name | Effect |
//! |---|---|
//! | `level` | Subtract the least-squares plane |
//! | `line_correct_median` | Shift every row so its median is zero |
//! | `scars_remove` | Interpolate over single-row scars |
//! | `polylevel` | Subtract a polynomial background (`Settings::polylevel`) |
//! | `fix_zero` | Shift data so the minimum is zero |
//! | `invert_value` | Mirror values about the middle of their range |
//!
//! The square mean filter is a separate trait method because it takes a size.

use super::backend::{EngineError, ProcessingEngine};
use super::calculations;
use super::field::DataField;
use super::params::{Masking, Settings};

type ProcessFn = fn(&mut DataField, &Settings) -> Result<(), EngineError>;

const FUNCTIONS: &[(&str, ProcessFn)] = &[
    ("level", level),
    ("line_correct_median", line_correct_median),
    ("scars_remove", scars_remove),
    ("polylevel", polylevel),
    ("fix_zero", fix_zero),
    ("invert_value", invert_value),
];

/// Engine backed by the algorithms in [`calculations`].
pub struct NativeEngine;

impl NativeEngine {
    pub fn new() -> Self {
        Self
    }

    /// Names of every registered process function.
    pub fn function_names() -> impl Iterator<Item = &'static str> {
        FUNCTIONS.iter().map(|(name, _)| *name)
    }

    fn lookup(name: &str) -> Option<ProcessFn> {
        FUNCTIONS.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
    }
}

impl Default for NativeEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn level(field: &mut DataField, _: &Settings) -> Result<(), EngineError> {
    let (xres, yres) = (field.xres(), field.yres());
    let (a, bx, by) = calculations::fit_plane(field.data(), xres, yres);
    for (i, z) in field.data_mut().iter_mut().enumerate() {
        *z -= a + bx * (i % xres) as f64 + by * (i / xres) as f64;
    }
    Ok(())
}

fn line_correct_median(field: &mut DataField, _: &Settings) -> Result<(), EngineError> {
    for r in 0..field.yres() {
        let row = field.row_mut(r);
        let med = calculations::median(&mut row.to_vec());
        row.iter_mut().for_each(|z| *z -= med);
    }
    Ok(())
}

fn scars_remove(field: &mut DataField, _: &Settings) -> Result<(), EngineError> {
    let (xres, yres) = (field.xres(), field.yres());
    let mask = calculations::find_scars(field.data(), xres, yres);
    let original = field.data().to_vec();
    for (i, z) in field.data_mut().iter_mut().enumerate() {
        if mask[i] {
            // Scars never touch the first or last row
            *z = (original[i - xres] + original[i + xres]) / 2.0;
        }
    }
    Ok(())
}

fn polylevel(field: &mut DataField, settings: &Settings) -> Result<(), EngineError> {
    let p = &settings.polylevel;
    let row_degree = if p.same_degree {
        p.col_degree
    } else {
        p.row_degree
    };
    if p.col_degree > p.max_degree || row_degree > p.max_degree {
        return Err(EngineError::InvalidParameter(format!(
            "polynomial degree ({}, {row_degree}) exceeds maximum {}",
            p.col_degree, p.max_degree
        )));
    }
    if p.masking != Masking::Ignore {
        return Err(EngineError::InvalidParameter(
            "masked levelling needs a mask, none is attached".into(),
        ));
    }
    if p.do_extract {
        return Err(EngineError::InvalidParameter(
            "background extraction is not supported".into(),
        ));
    }
    if !p.independent {
        return Err(EngineError::InvalidParameter(
            "only independent column/row degrees are supported".into(),
        ));
    }

    let (xres, yres) = (field.xres(), field.yres());
    let background = calculations::poly_background(
        field.data(),
        xres,
        yres,
        p.col_degree as usize,
        row_degree as usize,
    )
    .ok_or_else(|| EngineError::ProcessingFailed("polynomial fit is singular".into()))?;

    for (z, b) in field.data_mut().iter_mut().zip(background) {
        *z -= b;
    }
    Ok(())
}

fn fix_zero(field: &mut DataField, _: &Settings) -> Result<(), EngineError> {
    let (min, _) = field.min_max();
    field.data_mut().iter_mut().for_each(|z| *z -= min);
    Ok(())
}

fn invert_value(field: &mut DataField, _: &Settings) -> Result<(), EngineError> {
    let (min, max) = field.min_max();
    field.data_mut().iter_mut().for_each(|z| *z = min + max - *z);
    Ok(())
}

impl ProcessingEngine for NativeEngine {
    fn function_exists(&self, name: &str) -> bool {
        Self::lookup(name).is_some()
    }

    fn run_function(
        &self,
        name: &str,
        field: &mut DataField,
        settings: &Settings,
    ) -> Result<(), EngineError> {
        let f = Self::lookup(name).ok_or_else(|| EngineError::UnknownFunction(name.to_string()))?;
        f(field, settings)
    }

    fn mean_filter(&self, field: &mut DataField, size: u32) -> Result<(), EngineError> {
        if size == 0 {
            return Err(EngineError::InvalidParameter(
                "mean filter size must be positive".into(),
            ));
        }
        let filtered =
            calculations::mean_filter(field.data(), field.xres(), field.yres(), size as usize);
        field.data_mut().copy_from_slice(&filtered);
        Ok(())
    }
}
