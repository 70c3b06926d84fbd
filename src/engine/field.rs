//! Two-dimensional data field: one channel's samples plus its physical geometry.

use super::backend::EngineError;
use super::units::SiUnit;

/// Regular grid of samples, row-major, `xres` columns by `yres` rows.
///
/// `xreal`/`yreal` are the physical extents in base units of `si_unit_xy`.
#[derive(Debug, Clone, PartialEq)]
pub struct DataField {
    xres: usize,
    yres: usize,
    xreal: f64,
    yreal: f64,
    si_unit_xy: SiUnit,
    si_unit_z: SiUnit,
    data: Vec<f64>,
}

impl DataField {
    /// Build a field, checking that the sample count matches the resolution.
    pub fn new(
        xres: usize,
        yres: usize,
        xreal: f64,
        yreal: f64,
        data: Vec<f64>,
    ) -> Result<Self, EngineError> {
        if xres == 0 || yres == 0 {
            return Err(EngineError::InvalidField(format!(
                "resolution must be non-zero, got {xres}x{yres}"
            )));
        }
        if data.len() != xres * yres {
            return Err(EngineError::InvalidField(format!(
                "expected {} samples for {xres}x{yres}, got {}",
                xres * yres,
                data.len()
            )));
        }
        Ok(Self {
            xres,
            yres,
            xreal,
            yreal,
            si_unit_xy: SiUnit::new("m"),
            si_unit_z: SiUnit::new("m"),
            data,
        })
    }

    pub fn with_units(mut self, xy: SiUnit, z: SiUnit) -> Self {
        self.si_unit_xy = xy;
        self.si_unit_z = z;
        self
    }

    pub fn xres(&self) -> usize {
        self.xres
    }

    pub fn yres(&self) -> usize {
        self.yres
    }

    pub fn xreal(&self) -> f64 {
        self.xreal
    }

    pub fn yreal(&self) -> f64 {
        self.yreal
    }

    pub fn si_unit_xy(&self) -> &SiUnit {
        &self.si_unit_xy
    }

    pub fn si_unit_z(&self) -> &SiUnit {
        &self.si_unit_z
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn get(&self, col: usize, row: usize) -> f64 {
        self.data[row * self.xres + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.xres..(row + 1) * self.xres]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        &mut self.data[row * self.xres..(row + 1) * self.xres]
    }

    /// Minimum and maximum sample, ignoring NaNs. `(0, 0)` for an all-NaN field.
    pub fn min_max(&self) -> (f64, f64) {
        let (min, max) = self
            .data
            .iter()
            .filter(|v| !v.is_nan())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if min > max { (0.0, 0.0) } else { (min, max) }
    }

    pub fn mean(&self) -> f64 {
        self.data.iter().sum::<f64>() / self.data.len() as f64
    }
}
