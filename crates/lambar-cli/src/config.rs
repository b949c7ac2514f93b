use crate::cli::AnalyzeArgs;
use crate::error::{CliError, Result};
use lambar::core::io::bar::BarReadOptions;
use lambar::engine::convergence::AnalysisOptions;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Analysis settings loaded from a TOML file, with CLI overrides applied on
/// top. Omitted fields fall back to the library defaults.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Simulation temperature in Kelvin.
    #[serde(default = "defaults::temperature")]
    pub temperature: f64,

    /// Simulation pressure in bar.
    #[serde(default = "defaults::pressure")]
    pub pressure: f64,

    /// Number of contiguous blocks in the convergence scan.
    #[serde(rename = "block-count", default = "defaults::block_count")]
    pub block_count: usize,

    /// Minimum per-leg samples per block, and the bootstrap floor.
    #[serde(rename = "min-floor", default = "defaults::min_floor")]
    pub min_floor: usize,

    /// Scan resolution for equilibration detection.
    #[serde(rename = "block-hint", default = "defaults::block_hint")]
    pub block_hint: usize,

    /// Seed for the bootstrap resampler.
    #[serde(default = "defaults::seed")]
    pub seed: u64,
}

mod defaults {
    use lambar::engine::convergence::AnalysisOptions;

    pub fn temperature() -> f64 {
        298.0
    }
    pub fn pressure() -> f64 {
        1.0
    }
    pub fn block_count() -> usize {
        AnalysisOptions::default().block_count
    }
    pub fn min_floor() -> usize {
        AnalysisOptions::default().min_floor
    }
    pub fn block_hint() -> usize {
        AnalysisOptions::default().block_hint
    }
    pub fn seed() -> u64 {
        0
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            temperature: defaults::temperature(),
            pressure: defaults::pressure(),
            block_count: defaults::block_count(),
            min_floor: defaults::min_floor(),
            block_hint: defaults::block_hint(),
            seed: defaults::seed(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        debug!("Loaded configuration from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Loads the config file named in the arguments (or the defaults) and
    /// applies the CLI overrides.
    pub fn resolve(args: &AnalyzeArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Some(t) = args.temperature {
            config.temperature = t;
        }
        if let Some(p) = args.pressure {
            config.pressure = p;
        }
        if let Some(s) = args.seed {
            config.seed = s;
        }
        if config.temperature <= 0.0 {
            return Err(CliError::Argument(format!(
                "Temperature must be positive, got {}",
                config.temperature
            )));
        }
        Ok(config)
    }

    pub fn read_options(&self) -> BarReadOptions {
        BarReadOptions {
            temperature: self.temperature,
            pressure: self.pressure,
        }
    }

    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            block_count: self.block_count,
            min_floor: self.min_floor,
            block_hint: self.block_hint,
        }
    }
}
