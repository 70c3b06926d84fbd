//! Image encoding.
//!
//! JPEG is written at [`Quality::default`] (90); PNG with the best (slowest)
//! deflate compression.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::RgbImage;
use std::io::BufWriter;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Quality setting for lossy encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Output image container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    /// Parse a format name (`jpg`, `jpeg`, `png`), case-insensitive.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

/// Encode `img` to `path`.
pub fn save_image(img: &RgbImage, path: &Path, format: ImageFormat) -> Result<(), RenderError> {
    let file = std::fs::File::create(path)?;
    let writer = BufWriter::new(file);
    match format {
        ImageFormat::Jpeg => {
            let quality = Quality::default().value() as u8;
            img.write_with_encoder(JpegEncoder::new_with_quality(writer, quality))?;
        }
        ImageFormat::Png => {
            img.write_with_encoder(PngEncoder::new_with_quality(
                writer,
                CompressionType::Best,
                FilterType::Adaptive,
            ))?;
        }
    }
    Ok(())
}
