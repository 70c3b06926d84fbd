//! Export configuration.
//!
//! Settings come from two layers, later layers winning field by field:
//!
//! 1. an optional TOML settings file (`--config <file>`)
//! 2. command-line flags
//!
//! The merged [`ExportSettings`] are sparse: anything may be missing or
//! invalid. [`ExportConfig::resolve`] applies every fallback (logging a
//! warning for each) and produces the immutable configuration the batch
//! run reads.
//!
//! ## Settings File
//!
//! ```toml
//! # All keys are optional
//! output = "exports"          # Output directory
//! format = "png"              # jpg | png
//! filters = "pc;melc;poly:2"  # Filter chain
//! gradient = "ReiGreen"       # Colour gradient name
//! colormap = "auto"           # auto | full | adaptive
//! metadata = true             # Write a .txt metadata file per channel
//! silent = false              # Only report errors
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::filters::DEFAULT_FILTERS;
use crate::render::{ColorMapping, ImageFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Gradient used when none is configured.
pub const DEFAULT_GRADIENT_NAME: &str = "ReiGreen";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// One layer of user settings. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportSettings {
    pub output: Option<PathBuf>,
    pub format: Option<String>,
    pub filters: Option<String>,
    pub gradient: Option<String>,
    pub colormap: Option<String>,
    pub metadata: Option<bool>,
    pub silent: Option<bool>,
}

impl ExportSettings {
    /// Layer `overlay` on top of `self`; values present in `overlay` win.
    pub fn merge(self, overlay: ExportSettings) -> ExportSettings {
        ExportSettings {
            output: overlay.output.or(self.output),
            format: overlay.format.or(self.format),
            filters: overlay.filters.or(self.filters),
            gradient: overlay.gradient.or(self.gradient),
            colormap: overlay.colormap.or(self.colormap),
            metadata: overlay.metadata.or(self.metadata),
            silent: overlay.silent.or(self.silent),
        }
    }

    pub fn is_silent(&self) -> bool {
        self.silent.unwrap_or(false)
    }

    /// Reject values no fallback can make sense of.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.output {
            Some(output) if output.as_os_str().is_empty() => {
                Err(ConfigError::Validation("output must not be empty".into()))
            }
            _ => Ok(()),
        }
    }
}

/// Load and validate a TOML settings file.
pub fn load_settings(path: &Path) -> Result<ExportSettings, ConfigError> {
    let content = fs::read_to_string(path)?;
    let settings: ExportSettings = toml::from_str(&content)?;
    settings.validate()?;
    Ok(settings)
}

/// Fully resolved, read-only configuration for a batch run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    pub format: ImageFormat,
    pub filters: String,
    pub gradient: String,
    pub color_mapping: ColorMapping,
    pub metadata: bool,
    pub silent: bool,
    pub inputs: Vec<PathBuf>,
}

/// Treat empty strings (a flag given without a value) like absent ones.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ExportConfig {
    /// Apply every fallback to `settings`.
    pub fn resolve(settings: ExportSettings, inputs: Vec<PathBuf>) -> Self {
        let output_dir = match settings.output {
            Some(dir) => dir,
            None => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
                warn!("No output path defined. Using directory {}", cwd.display());
                cwd
            }
        };

        let format = match settings.format.as_deref().map(str::trim) {
            None => ImageFormat::Jpeg,
            Some("") => {
                warn!("Image format missing, using jpg");
                ImageFormat::Jpeg
            }
            Some(name) => ImageFormat::parse(name).unwrap_or_else(|| {
                warn!("Unknown image format `{name}', using jpg");
                ImageFormat::Jpeg
            }),
        };

        let filters = non_empty(settings.filters).unwrap_or_else(|| {
            warn!("No filters defined. Using defaults `{DEFAULT_FILTERS}'");
            DEFAULT_FILTERS.to_string()
        });

        let gradient = non_empty(settings.gradient).unwrap_or_else(|| {
            warn!("No gradient given. Using `{DEFAULT_GRADIENT_NAME}'");
            DEFAULT_GRADIENT_NAME.to_string()
        });

        let color_mapping = match non_empty(settings.colormap) {
            None => {
                warn!("No color mapping defined. Using auto");
                ColorMapping::Auto
            }
            Some(name) => ColorMapping::parse(&name).unwrap_or_else(|| {
                warn!("Unknown color mapping `{name}'. Using adaptive");
                ColorMapping::Adaptive
            }),
        };

        Self {
            output_dir,
            format,
            filters,
            gradient,
            color_mapping,
            metadata: settings.metadata.unwrap_or(false),
            silent: settings.silent.unwrap_or(false),
            inputs,
        }
    }
}

/// Returns a fully-commented stock settings file.
///
/// Used by the `--print-config` flag.
pub fn stock_config_toml() -> &'static str {
    r##"# spmexport settings
# ==================
# All settings are optional. Command-line flags override anything set here.
# Unknown keys will cause an error.

# Directory the images and metadata files are written to.
# Default: the current directory.
# output = "exports"

# Image format: "jpg" or "png".
# format = "jpg"

# Filter chain, applied to every channel before rendering.
# Tokens separated by ';':
#   pc        plane correction
#   melc      median line correction
#   sr        scar removal
#   poly:x,y  polynomial levelling with column/row degrees x,y
#   mean:x    mean filter of x pixels
#   any:name  run the process function `name`
# filters = "pc;melc;sr;melc;pc"

# Colour gradient: Gray, ReiGreen, Gwyddion.net, Sky, Rainbow.
# gradient = "ReiGreen"

# Mapping of values to colours: "auto", "full" or "adaptive".
# colormap = "auto"

# Write a metadata text file next to every image.
# metadata = false

# Only report errors.
# silent = false
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn resolve(settings: ExportSettings) -> ExportConfig {
        ExportConfig::resolve(settings, vec![PathBuf::from("scan.gsf")])
    }

    // =========================================================================
    // load_settings
    // =========================================================================

    #[test]
    fn load_settings_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("spmexport.toml");
        fs::write(
            &path,
            r#"
output = "out"
format = "png"
metadata = true
"#,
        )
        .unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.output, Some(PathBuf::from("out")));
        assert_eq!(settings.format.as_deref(), Some("png"));
        assert_eq!(settings.metadata, Some(true));
        assert_eq!(settings.gradient, None);
    }

    #[test]
    fn load_settings_rejects_unknown_keys() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("spmexport.toml");
        fs::write(&path, "colour = \"red\"\n").unwrap();
        assert!(matches!(load_settings(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_settings_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("spmexport.toml");
        fs::write(&path, "this is not valid toml [[[").unwrap();
        assert!(matches!(load_settings(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_settings_missing_file_is_io_error() {
        let result = load_settings(Path::new("/nonexistent/spmexport.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_settings_validates_output() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("spmexport.toml");
        fs::write(&path, "output = \"\"\n").unwrap();
        assert!(matches!(
            load_settings(&path),
            Err(ConfigError::Validation(_))
        ));
    }

    // =========================================================================
    // merge
    // =========================================================================

    #[test]
    fn overlay_wins_field_by_field() {
        let file = ExportSettings {
            format: Some("png".into()),
            gradient: Some("Sky".into()),
            metadata: Some(true),
            ..Default::default()
        };
        let cli = ExportSettings {
            gradient: Some("Rainbow".into()),
            ..Default::default()
        };
        let merged = file.merge(cli);
        assert_eq!(merged.format.as_deref(), Some("png"));
        assert_eq!(merged.gradient.as_deref(), Some("Rainbow"));
        assert_eq!(merged.metadata, Some(true));
    }

    // =========================================================================
    // resolve
    // =========================================================================

    #[test]
    fn resolve_applies_defaults() {
        let config = resolve(ExportSettings {
            output: Some("out".into()),
            ..Default::default()
        });
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.format, ImageFormat::Jpeg);
        assert_eq!(config.filters, DEFAULT_FILTERS);
        assert_eq!(config.gradient, "ReiGreen");
        assert_eq!(config.color_mapping, ColorMapping::Auto);
        assert!(!config.metadata);
        assert!(!config.silent);
        assert_eq!(config.inputs, vec![PathBuf::from("scan.gsf")]);
    }

    #[test]
    fn resolve_missing_output_uses_current_dir() {
        let config = resolve(ExportSettings::default());
        assert_eq!(config.output_dir, std::env::current_dir().unwrap());
    }

    #[test]
    fn resolve_unknown_format_falls_back_to_jpeg() {
        let config = resolve(ExportSettings {
            format: Some("tiff".into()),
            ..Default::default()
        });
        assert_eq!(config.format, ImageFormat::Jpeg);
    }

    #[test]
    fn resolve_png_format() {
        let config = resolve(ExportSettings {
            format: Some("png".into()),
            ..Default::default()
        });
        assert_eq!(config.format, ImageFormat::Png);
    }

    #[test]
    fn resolve_invalid_colormap_is_adaptive() {
        let config = resolve(ExportSettings {
            colormap: Some("weird".into()),
            ..Default::default()
        });
        assert_eq!(config.color_mapping, ColorMapping::Adaptive);
    }

    #[test]
    fn resolve_empty_values_count_as_missing() {
        let config = resolve(ExportSettings {
            colormap: Some(String::new()),
            gradient: Some(" ".into()),
            filters: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(config.color_mapping, ColorMapping::Auto);
        assert_eq!(config.gradient, "ReiGreen");
        assert_eq!(config.filters, DEFAULT_FILTERS);
    }

    // =========================================================================
    // Stock config
    // =========================================================================

    #[test]
    fn stock_config_toml_parses_to_empty_settings() {
        let settings: ExportSettings = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(settings, ExportSettings::default());
    }

    #[test]
    fn stock_config_uncommented_is_valid() {
        let uncommented: String = stock_config_toml()
            .lines()
            .filter_map(|l| l.strip_prefix("# "))
            .filter(|l| l.contains(" = "))
            .map(|l| format!("{l}\n"))
            .collect();
        let settings: ExportSettings = toml::from_str(&uncommented).unwrap();
        assert_eq!(settings.filters.as_deref(), Some(DEFAULT_FILTERS));
        assert_eq!(settings.gradient.as_deref(), Some("ReiGreen"));
    }
}
