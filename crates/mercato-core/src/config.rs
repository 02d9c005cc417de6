//! Configuration loading and typed config structures for the Mercato
//! simulation.
//!
//! The canonical configuration lives in `mercato-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure and provides a loader that reads and validates the file. All
//! defaults reproduce the reference parameterization of the model.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A parameter value violates a structural constraint.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level model configuration.
///
/// Mirrors the structure of `mercato-config.yaml`. All fields have defaults
/// matching the reference parameter set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ModelConfig {
    /// Market initialization (population size, split, prices).
    #[serde(default)]
    pub market: MarketConfig,

    /// Run control and step mechanics.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Excess-demand parameters driving the price update.
    #[serde(default)]
    pub demand: DemandConfig,

    /// Strategy-switching coefficients for the transition model.
    #[serde(default)]
    pub switching: SwitchingConfig,

    /// Output destination for the run driver.
    #[serde(default)]
    pub output: OutputConfig,
}

impl ModelConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a parameter violates a constraint.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a parameter violates a constraint.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check structural constraints between parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.market.n == 0 {
            return Err(invalid("market.n must be at least 1"));
        }
        if self.market.nt0 > self.market.n {
            return Err(invalid("market.nt0 cannot exceed market.n"));
        }
        if self.simulation.dt <= 0.0 {
            return Err(invalid("simulation.dt must be positive"));
        }
        if self.simulation.slope_window == 0 {
            return Err(invalid("simulation.slope_window must be at least 1"));
        }
        if self.switching.v1 <= 0.0 || self.switching.v2 <= 0.0 {
            return Err(invalid("switching frequencies v1 and v2 must be positive"));
        }
        if self.demand.sigma < 0.0 {
            return Err(invalid("demand.sigma cannot be negative"));
        }
        Ok(())
    }

    /// Number of fundamentalists at market construction (`n - nt0`).
    pub const fn nf0(&self) -> u32 {
        self.market.n.saturating_sub(self.market.nt0)
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

/// Market initialization parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MarketConfig {
    /// Total number of traders. Constant for the whole run.
    #[serde(default = "default_n")]
    pub n: u32,

    /// Number of technical traders at start (split evenly between
    /// optimists and pessimists, odd remainder to the pessimists).
    #[serde(default = "default_nt0")]
    pub nt0: u32,

    /// Initial market price.
    #[serde(default = "default_p0")]
    pub p0: f64,

    /// Fundamental price the fundamentalists trade towards.
    #[serde(default = "default_fundamental_price")]
    pub fundamental_price: f64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            n: default_n(),
            nt0: default_nt0(),
            p0: default_p0(),
            fundamental_price: default_fundamental_price(),
        }
    }
}

/// Run control and step mechanics.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Master random seed. Per-run seeds are derived from it.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of steps per run.
    #[serde(default = "default_n_steps")]
    pub n_steps: u64,

    /// Number of independent runs the driver executes.
    #[serde(default = "default_n_runs")]
    pub n_runs: u32,

    /// Step size scaling hazard rates into per-step probabilities.
    #[serde(default = "default_dt")]
    pub dt: f64,

    /// Population floor: a trader whose own strategy group is at or below
    /// this count takes no action that step.
    #[serde(default = "default_min_trader")]
    pub min_trader: u32,

    /// Lookback window (in steps) for the price slope estimator.
    #[serde(default = "default_slope_window")]
    pub slope_window: u32,

    /// Price change differential applied on an accepted price update.
    #[serde(default = "default_price_scale")]
    pub price_scale: f64,

    /// Whether fundamentalist <-> technical switching is enabled.
    #[serde(default = "default_true")]
    pub pick_strategy: bool,

    /// Whether the market price update runs. Disabled holds the price
    /// constant so only strategy dynamics evolve.
    #[serde(default = "default_true")]
    pub update_price: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            n_steps: default_n_steps(),
            n_runs: default_n_runs(),
            dt: default_dt(),
            min_trader: default_min_trader(),
            slope_window: default_slope_window(),
            price_scale: default_price_scale(),
            pick_strategy: true,
            update_price: true,
        }
    }
}

/// Excess-demand parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DemandConfig {
    /// Price reaction speed.
    #[serde(default = "default_beta")]
    pub beta: f64,

    /// Standard deviation of the Gaussian demand noise.
    #[serde(default = "default_sigma")]
    pub sigma: f64,

    /// Aggregate technical demand weight. The per-capita weight is `tc / n`.
    #[serde(default = "default_tc")]
    pub tc: f64,

    /// Aggregate fundamentalist demand weight. The per-capita weight is
    /// `tf / n`.
    #[serde(default = "default_tf")]
    pub tf: f64,
}

impl Default for DemandConfig {
    fn default() -> Self {
        Self {
            beta: default_beta(),
            sigma: default_sigma(),
            tc: default_tc(),
            tf: default_tf(),
        }
    }
}

/// Strategy-switching coefficients.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SwitchingConfig {
    /// Frequency of technical <-> technical opinion revisions.
    #[serde(default = "default_v1")]
    pub v1: f64,

    /// Frequency of fundamentalist <-> technical strategy revisions.
    #[serde(default = "default_v2")]
    pub v2: f64,

    /// Weight of the opinion index in the opinion exponent.
    #[serde(default = "default_a1")]
    pub a1: f64,

    /// Weight of the price slope in the opinion exponent.
    #[serde(default = "default_a2")]
    pub a2: f64,

    /// Weight of the profit differential in the strategy exponent.
    #[serde(default = "default_a3")]
    pub a3: f64,

    /// Nominal dividend entering technical excess profit.
    #[serde(default = "default_r")]
    pub r: f64,

    /// Average real return entering technical excess profit.
    #[serde(default = "default_big_r")]
    pub big_r: f64,

    /// Discount factor on the fundamentalist mispricing profit.
    #[serde(default = "default_s")]
    pub s: f64,
}

impl Default for SwitchingConfig {
    fn default() -> Self {
        Self {
            v1: default_v1(),
            v2: default_v2(),
            a1: default_a1(),
            a2: default_a2(),
            a3: default_a3(),
            r: default_r(),
            big_r: default_big_r(),
            s: default_s(),
        }
    }
}

/// Output destination for the run driver.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutputConfig {
    /// Directory the driver writes `model_vars.csv` into.
    #[serde(default = "default_result_dir")]
    pub result_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            result_dir: default_result_dir(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_n() -> u32 {
    500
}

const fn default_nt0() -> u32 {
    450
}

const fn default_p0() -> f64 {
    10.0
}

const fn default_fundamental_price() -> f64 {
    10.0
}

const fn default_seed() -> u64 {
    42
}

const fn default_n_steps() -> u64 {
    30_000
}

const fn default_n_runs() -> u32 {
    500
}

const fn default_dt() -> f64 {
    0.1
}

const fn default_min_trader() -> u32 {
    5
}

const fn default_slope_window() -> u32 {
    20
}

const fn default_price_scale() -> f64 {
    0.0001
}

const fn default_beta() -> f64 {
    6.0
}

const fn default_sigma() -> f64 {
    10.0
}

const fn default_tc() -> f64 {
    2.0
}

const fn default_tf() -> f64 {
    1.0
}

const fn default_v1() -> f64 {
    2.0
}

const fn default_v2() -> f64 {
    1.0
}

const fn default_a1() -> f64 {
    0.5
}

const fn default_a2() -> f64 {
    0.8
}

const fn default_a3() -> f64 {
    0.5
}

const fn default_r() -> f64 {
    0.12
}

const fn default_big_r() -> f64 {
    0.04
}

const fn default_s() -> f64 {
    0.85
}

fn default_result_dir() -> String {
    "results/set_1".to_owned()
}

const fn default_true() -> bool {
    true
}
