//! Scale-bar sizing.
//!
//! Picks a "nice" bar length of at most 42 % of the image width, from the
//! series 1, 2, 3, 4, 5 × 10^k within a power-of-1000 step, and formats its
//! label with an SI prefix:
//!
//! | Width | Bar | Label | Fraction |
//! |---|---|---|---|
//! | 1 µm | 400 nm | `"400 nm"` | 0.4 |
//! | 5 µm | 2 µm | `"2 µm"` | 0.4 |
//! | 100 nm | 40 nm | `"40 nm"` | 0.4 |

use crate::engine::SiUnit;

/// Share of the image width the bar may cover at most.
const MAX_FRACTION: f64 = 0.42;

const NICE_SIZES: [f64; 15] = [
    1.0, 2.0, 3.0, 4.0, 5.0, 10.0, 20.0, 30.0, 40.0, 50.0, 100.0, 200.0, 300.0, 400.0, 500.0,
];

#[derive(Debug, Clone, PartialEq)]
pub struct ScaleBar {
    /// Bar length in base units of the lateral unit.
    pub length: f64,
    /// Formatted length, e.g. `"400 nm"`.
    pub label: String,
    /// `length / real_width`, in `(0, 1]`.
    pub fraction: f64,
}

/// Size a scale bar for an image `real_width` base units wide.
///
/// Returns `None` for non-positive or non-finite widths.
pub fn compute_scale_bar(real_width: f64, unit: &SiUnit) -> Option<ScaleBar> {
    if !real_width.is_finite() || real_width <= 0.0 {
        return None;
    }
    let vmax = MAX_FRACTION * real_width;
    let power10 = 3 * (vmax.log10() / 3.0).floor() as i32;
    let base = 10f64.powi(power10);
    // Tolerance absorbs rounding in vmax / base
    let x = vmax / base * (1.0 + 1e-12);

    let nice = NICE_SIZES
        .iter()
        .copied()
        .take_while(|&s| s <= x)
        .last()
        .unwrap_or(NICE_SIZES[0]);
    let length = nice * base;

    Some(ScaleBar {
        length,
        label: unit.format_for_power10(power10).format(length),
        fraction: length / real_width,
    })
}
