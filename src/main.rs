use clap::{ArgAction, CommandFactory, Parser};
use spmexport::config::{self, ExportConfig, ExportSettings};
use spmexport::filters::DEFAULT_FILTERS;
use spmexport::{batch, output};
use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error, warn};

fn version_string() -> &'static str {
    let hash = env!("SPMEXPORT_GIT_HASH");
    if hash.is_empty() {
        env!("CARGO_PKG_VERSION")
    } else {
        // Leaked once at startup
        Box::leak(format!("{} ({hash})", env!("CARGO_PKG_VERSION")).into_boxed_str())
    }
}

#[derive(Parser)]
#[command(name = "spmexport")]
#[command(about = "Export SPM data channels to png or jpg images")]
#[command(long_about = "\
Export SPM data channels to png or jpg images

Every channel of every input file is processed by a chain of filters and
rendered with a colour gradient. With --metadata, a text file with the
channel's metadata and the applied processing is written next to each image.

Output files are named <input>-<channel>-<title>.<jpg|png>.

Filters (separated by `;', applied in order):

  pc        Plane correction
  melc      Median line correction
  sr        Scar removal
  poly:x,y  Polynomial levelling with column/row degrees x,y
  mean:x    Mean filter of x pixels
  any:name  Run the process function `name'

Example: spmexport -o out --filters 'pc;melc;poly:2,2;melc' scans/

Run 'spmexport --print-config' for a documented settings file.")]
#[command(version = version_string(), disable_version_flag = true)]
struct Cli {
    /// Print version info and exit
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,

    /// Directory the exported files are written to [default: current directory]
    #[arg(short, long, num_args = 0..=1, value_name = "PATH")]
    output: Option<Option<PathBuf>>,

    /// Write a metadata text file next to each image
    #[arg(short, long)]
    metadata: bool,

    /// Filter chain applied to each channel (also -fl)
    #[arg(long, num_args = 0..=1, value_name = "FILTERS")]
    filters: Option<Option<String>>,

    /// Use the default filter chain (pc;melc;sr;melc;pc)
    #[arg(long)]
    defaultfilters: bool,

    /// Image format: jpg or png
    #[arg(short, long, num_args = 0..=1, value_name = "FORMAT")]
    format: Option<Option<String>>,

    /// Colour gradient name
    #[arg(short, long, num_args = 0..=1, value_name = "GRADIENT")]
    gradient: Option<Option<String>>,

    /// Colour mapping: auto, full or adaptive
    #[arg(short, long, num_args = 0..=1, value_name = "MAP")]
    colormap: Option<Option<String>>,

    /// Only report errors
    #[arg(short, long)]
    silentmode: bool,

    /// TOML settings file; command-line flags override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print a documented settings file and exit
    #[arg(long)]
    print_config: bool,

    /// Data files or directories to export
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    inputs: Vec<PathBuf>,
}

impl Cli {
    /// The settings layer given on the command line.
    fn settings(&self) -> ExportSettings {
        let filters = if self.defaultfilters {
            Some(DEFAULT_FILTERS.to_string())
        } else {
            match &self.filters {
                Some(None) => {
                    warn!("No filter list defined, will use default list");
                    Some(DEFAULT_FILTERS.to_string())
                }
                Some(Some(spec)) => Some(spec.clone()),
                None => None,
            }
        };

        // A flag without a value falls back when the config is resolved
        ExportSettings {
            output: self.output.clone().flatten(),
            format: self.format.clone().map(Option::unwrap_or_default),
            filters,
            gradient: self.gradient.clone().flatten(),
            colormap: self.colormap.clone().flatten(),
            metadata: self.metadata.then_some(true),
            silent: self.silentmode.then_some(true),
        }
    }
}

/// Accept the traditional `-fl` spelling of `--filters`.
fn normalize_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter()
        .map(|a| if a == "-fl" { OsString::from("--filters") } else { a })
        .collect()
}

fn init_logging(silent: bool) {
    let level = if silent { Level::ERROR } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_file(false)
        .with_line_number(false)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));

    if cli.print_config {
        print!("{}", config::stock_config_toml());
        return ExitCode::SUCCESS;
    }

    let file_settings = match &cli.config {
        Some(path) => config::load_settings(path).map_err(|e| (path.clone(), e)),
        None => Ok(ExportSettings::default()),
    };
    let silent = cli.silentmode
        || file_settings
            .as_ref()
            .is_ok_and(ExportSettings::is_silent);
    init_logging(silent);

    let file_settings = match file_settings {
        Ok(settings) => settings,
        Err((path, e)) => {
            error!("Cannot use settings file {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
    };

    if cli.inputs.is_empty() {
        warn!("No file given");
        let _ = Cli::command().print_help();
        return ExitCode::SUCCESS;
    }

    let settings = file_settings.merge(cli.settings());
    let config = ExportConfig::resolve(settings, cli.inputs);

    if !config.silent {
        output::print_banner();
    }

    match batch::run(&config) {
        Ok(summary) => {
            if !config.silent {
                output::print_summary(&summary);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
