use anyhow::{bail, Context, Result};
use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::centerline::SplitSearch;
use crate::component::Layer;
use crate::filter::SavitzkyGolay;
use crate::resample::ResampleStrategy;


/// Ring simplification tolerance applied before splitting a boundary.
pub const SIMPLIFY_TOLERANCE: f64 = 1e-3;
/// Dilation applied to regions when testing which ports they contain.
pub const PORT_TOLERANCE: f64 = 0.005;
/// Squared distance within which a boundary endpoint belongs to a port.
pub const PORT_PROXIMITY: f64 = 1.0;
/// Largest difference for two coordinates to count as coincident.
pub const COINCIDENCE_TOLERANCE: f64 = 1e-6;
/// Grow/shrink distance of the over/under smoothing of a layer.
pub const OVER_UNDER_DISTANCE: f64 = 0.05;
/// Scaling factor for integer coordinates during clipping.
pub const CLIP_TOLERANCE: f64 = 1e6;
/// Miter limit for polygon offsetting, in multiples of the offset.
pub const MITER_LIMIT: f64 = 2.0;

/// Runtime configuration for path extraction.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Layer holding the waveguide core.
    pub layer: Layer,
    /// Keep every n-th boundary point.
    pub under_sampling: usize,
    /// Stitch paths between ports that are not physically connected.
    pub evanescent_coupling: bool,
    pub over_under_distance: f64,
    pub port_tolerance: f64,
    pub simplify_tolerance: f64,
    pub port_proximity: f64,
    pub coincidence_tolerance: f64,
    pub resample: ResampleStrategy,
    pub search: SplitSearch,
    /// Savitzky-Golay smoothing of every extracted path, off when unset.
    pub smoothing: Option<SavitzkyGolay>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            layer: Layer::default(),
            under_sampling: 1,
            evanescent_coupling: false,
            over_under_distance: OVER_UNDER_DISTANCE,
            port_tolerance: PORT_TOLERANCE,
            simplify_tolerance: SIMPLIFY_TOLERANCE,
            port_proximity: PORT_PROXIMITY,
            coincidence_tolerance: COINCIDENCE_TOLERANCE,
            resample: ResampleStrategy::default(),
            search: SplitSearch::default(),
            smoothing: None,
        }
    }
}

/// Loads `config/default.toml` from the project root.
pub fn load_default_config() -> Result<Settings> {
    let root = retrieve_project_root()?;
    load_config_from(&root.join("config/default.toml"))
}

/// Loads settings from a single file, then `PATHLEN_*` environment variables.
pub fn load_config_from(path: &Path) -> Result<Settings> {
    let settings = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(
            Environment::with_prefix("pathlen")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("Error loading configuration from {}", path.display()))?;

    let config: Settings = settings
        .try_deserialize()
        .context("Error deserializing configuration")?;

    validate_config(&config)?;
    Ok(config)
}

/// Loads the configuration for the command line tool.
///
/// Uses `config/local.toml` when present, `config/default.toml` otherwise, and
/// an explicit `--config` file over both. Command-line flags override the
/// result.
pub fn load_config(args: &CliArgs) -> Result<Settings> {
    let mut config = match &args.config {
        Some(path) => load_config_from(path)?,
        None => {
            let root = retrieve_project_root()?;
            let local_config = root.join("config/local.toml");
            let default_config = root.join("config/default.toml");
            if local_config.exists() {
                tracing::debug!(file = %local_config.display(), "using local configuration");
                load_config_from(&local_config)?
            } else if default_config.exists() {
                tracing::debug!(file = %default_config.display(), "using default configuration");
                load_config_from(&default_config)?
            } else {
                tracing::debug!("no configuration file found, using built-in defaults");
                Settings::default()
            }
        }
    };

    args.apply(&mut config);
    validate_config(&config)?;
    Ok(config)
}

/// Retrieve the project root directory.
/// 1. If the CARGO_MANIFEST_DIR environment variable is set, use it.
/// 2. If the PATHLEN_ROOT_DIR environment variable is set, use it.
/// 3. Otherwise walk up from the executable looking for a "config" subdirectory.
fn retrieve_project_root() -> Result<PathBuf> {
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        return Ok(PathBuf::from(manifest_dir));
    }
    if let Ok(path) = env::var("PATHLEN_ROOT_DIR") {
        return Ok(PathBuf::from(path));
    }

    let exe_path = env::current_exe().context("Failed to get current executable path")?;
    let mut current_dir = exe_path.parent();
    while let Some(dir) = current_dir {
        if dir.join("config").is_dir() {
            return Ok(dir.to_path_buf());
        }
        current_dir = dir.parent();
    }
    bail!("Could not find project root directory")
}

pub fn validate_config(config: &Settings) -> Result<()> {
    if config.under_sampling == 0 {
        bail!("Under sampling must be at least 1");
    }
    for (name, value) in [
        ("over_under_distance", config.over_under_distance),
        ("port_tolerance", config.port_tolerance),
        ("simplify_tolerance", config.simplify_tolerance),
        ("port_proximity", config.port_proximity),
        ("coincidence_tolerance", config.coincidence_tolerance),
    ] {
        if !(value >= 0.0) {
            bail!("{} must be non-negative, got {}", name, value);
        }
    }
    if let Some(sg) = &config.smoothing {
        if sg.window_length % 2 == 0 {
            bail!(
                "Savitzky-Golay window length must be odd, got {}",
                sg.window_length
            );
        }
        if sg.polyorder >= sg.window_length {
            bail!(
                "Savitzky-Golay polyorder ({}) must be less than the window length ({})",
                sg.polyorder,
                sg.window_length
            );
        }
    }
    Ok(())
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Extract waveguide centerlines, bend radii and path lengths from a layout component"
)]
pub struct CliArgs {
    /// Component description (JSON) with ports and layer polygons.
    pub input: PathBuf,

    /// Configuration file, used instead of config/local.toml or config/default.toml.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Layer to extract the centerline from, as `layer/datatype`.
    #[arg(short, long)]
    pub layer: Option<Layer>,

    /// Keep every n-th boundary point.
    #[arg(short, long)]
    pub under_sampling: Option<usize>,

    /// Also compute paths between ports coupled through a gap.
    #[arg(short, long)]
    pub evanescent: bool,

    /// Smooth paths with a Savitzky-Golay filter (window 11, order 3).
    #[arg(short, long)]
    pub smooth: bool,

    /// Seed for the random-padding resampler. Switches resampling to random padding.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the report here instead of stdout. A `.toml` extension writes TOML.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Overrides configuration values with the flags that were given.
    pub fn apply(&self, config: &mut Settings) {
        if let Some(layer) = self.layer {
            config.layer = layer;
        }
        if let Some(under_sampling) = self.under_sampling {
            config.under_sampling = under_sampling;
        }
        if self.evanescent {
            config.evanescent_coupling = true;
        }
        if self.smooth && config.smoothing.is_none() {
            config.smoothing = Some(SavitzkyGolay::default());
        }
        if let Some(seed) = self.seed {
            config.resample = ResampleStrategy::RandomPadding { seed };
        }
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Settings:
  - Layer: {}
  - Under Sampling: {}
  - Evanescent Coupling: {}
  - Over/Under Distance: {:.4}
  - Resample: {:?}
  - Smoothing: {:?}
  ",
            self.layer,
            self.under_sampling,
            self.evanescent_coupling,
            self.over_under_distance,
            self.resample,
            self.smoothing,
        )
    }
}
