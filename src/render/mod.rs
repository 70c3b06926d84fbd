//! Turning a data field into an image file.
//!
//! | Step | Function |
//! |---|---|
//! | Gradient lookup | [`Gradient::by_name`] |
//! | Value range | [`color_range`] |
//! | Pixels | [`render_field`] → `image::RgbImage` |
//! | Encode | [`save_image`] (JPEG / PNG via the `image` crate) |

pub mod colormap;
pub mod encode;
pub mod gradient;

pub use colormap::{ColorMapping, color_range, render_field};
pub use encode::{ImageFormat, Quality, RenderError, save_image};
pub use gradient::{DEFAULT_GRADIENT, Gradient};
