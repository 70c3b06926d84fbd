//! Mapping data values onto gradient positions.
//!
//! - **Full**: linear over the data minimum and maximum.
//! - **Auto**: linear over the range left after cutting outlier tails.
//! - **Adaptive**: histogram equalization, each value mapped by its rank.

use super::gradient::Gradient;
use crate::engine::DataField;
use image::{Rgb, RgbImage};

/// Fraction of samples cut from each end of the distribution in Auto mode.
const AUTO_TAIL: f64 = 0.005;

/// How data values are spread over the gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMapping {
    Auto,
    Full,
    Adaptive,
}

impl ColorMapping {
    /// Parse a case-insensitive mapping name.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "full" => Some(Self::Full),
            "adaptive" => Some(Self::Adaptive),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Auto => "Auto",
            Self::Full => "Full",
            Self::Adaptive => "Adaptive",
        }
    }
}

fn sorted_samples(field: &DataField) -> Vec<f64> {
    let mut values: Vec<f64> = field.data().iter().copied().filter(|v| !v.is_nan()).collect();
    values.sort_by(f64::total_cmp);
    values
}

/// The value range that maps onto the ends of the gradient.
pub fn color_range(field: &DataField, mapping: ColorMapping) -> (f64, f64) {
    match mapping {
        ColorMapping::Full | ColorMapping::Adaptive => field.min_max(),
        ColorMapping::Auto => {
            let values = sorted_samples(field);
            let cut = (values.len() as f64 * AUTO_TAIL) as usize;
            match (values.get(cut), values.len().checked_sub(cut + 1)) {
                (Some(&lo), Some(hi_index)) if values[hi_index] > lo => (lo, values[hi_index]),
                _ => field.min_max(),
            }
        }
    }
}

fn linear_position(z: f64, (lo, hi): (f64, f64)) -> f64 {
    if hi > lo { (z - lo) / (hi - lo) } else { 0.0 }
}

/// Rank of `z` among `sorted`, scaled to `[0, 1]`. Ties share their mid rank.
fn equalized_position(z: f64, sorted: &[f64]) -> f64 {
    if sorted.len() < 2 {
        return 0.0;
    }
    let below = sorted.partition_point(|&v| v < z);
    let through = sorted.partition_point(|&v| v <= z);
    let rank = (below + through.max(below + 1) - 1) as f64 / 2.0;
    rank / (sorted.len() - 1) as f64
}

/// Render a field to an RGB image of `xres × yres` pixels.
///
/// `range` is used for Auto and Full; Adaptive ignores it and equalizes.
pub fn render_field(
    field: &DataField,
    gradient: &Gradient,
    mapping: ColorMapping,
    range: (f64, f64),
) -> RgbImage {
    let xres = field.xres();
    let position: Box<dyn Fn(f64) -> f64> = match mapping {
        ColorMapping::Auto | ColorMapping::Full => Box::new(move |z| linear_position(z, range)),
        ColorMapping::Adaptive => {
            let sorted = sorted_samples(field);
            Box::new(move |z| equalized_position(z, &sorted))
        }
    };
    let data = field.data();
    RgbImage::from_fn(xres as u32, field.yres() as u32, |x, y| {
        let z = data[y as usize * xres + x as usize];
        Rgb(gradient.color_at(position(z)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(values: Vec<f64>) -> DataField {
        DataField::new(values.len(), 1, 1.0, 1.0, values).unwrap()
    }

    // =========================================================================
    // ColorMapping
    // =========================================================================

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(ColorMapping::parse("AUTO"), Some(ColorMapping::Auto));
        assert_eq!(ColorMapping::parse("full"), Some(ColorMapping::Full));
        assert_eq!(ColorMapping::parse("Adaptive"), Some(ColorMapping::Adaptive));
        assert_eq!(ColorMapping::parse("bogus"), None);
    }

    // =========================================================================
    // color_range
    // =========================================================================

    #[test]
    fn full_range_is_min_max() {
        let f = field(vec![3.0, -1.0, 7.0]);
        assert_eq!(color_range(&f, ColorMapping::Full), (-1.0, 7.0));
        assert_eq!(color_range(&f, ColorMapping::Adaptive), (-1.0, 7.0));
    }

    #[test]
    fn auto_range_cuts_outliers() {
        let mut values: Vec<f64> = (0..1000).map(|i| i as f64).collect();
        values[0] = -1e6;
        values[999] = 1e6;
        let (lo, hi) = color_range(&field(values), ColorMapping::Auto);
        assert_eq!((lo, hi), (5.0, 994.0));
    }

    #[test]
    fn auto_range_degenerate_falls_back_to_full() {
        let mut values = vec![1.0; 1000];
        values[0] = 0.0;
        values[999] = 2.0;
        assert_eq!(color_range(&field(values), ColorMapping::Auto), (0.0, 2.0));
    }

    // =========================================================================
    // render_field
    // =========================================================================

    #[test]
    fn rendered_image_matches_resolution() {
        let f = DataField::new(4, 3, 1.0, 1.0, vec![0.0; 12]).unwrap();
        let img = render_field(&f, &Gradient::default_gradient(), ColorMapping::Full, (0.0, 0.0));
        assert_eq!(img.dimensions(), (4, 3));
    }

    #[test]
    fn linear_mapping_spans_gradient() {
        let f = field(vec![0.0, 10.0]);
        let img = render_field(&f, &Gradient::default_gradient(), ColorMapping::Full, (0.0, 10.0));
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(1, 0).0, [255, 255, 255]);
    }

    #[test]
    fn adaptive_mapping_equalizes_skewed_data() {
        // A huge outlier would crush the rest to black under linear mapping
        let f = field(vec![0.0, 1.0, 2.0, 1000.0]);
        let img = render_field(&f, &Gradient::default_gradient(), ColorMapping::Adaptive, (0.0, 1000.0));
        assert_eq!(img.get_pixel(1, 0).0, [85, 85, 85]);
        assert_eq!(img.get_pixel(3, 0).0, [255, 255, 255]);
    }

    #[test]
    fn equalized_ties_share_rank() {
        let sorted = [1.0, 1.0, 2.0];
        assert_eq!(equalized_position(1.0, &sorted), 0.25);
        assert_eq!(equalized_position(2.0, &sorted), 1.0);
    }
}
