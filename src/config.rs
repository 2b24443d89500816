//! TOML settings for the search engine.
//!
//! Every key is optional; missing keys take the tuned defaults.
//!
//! ```toml
//! [search]
//! max_depth = 4
//! prob_cutoff = 0.0001
//!
//! [weights]
//! empty_weight = 270.0
//! ```

use std::io::Read;
use std::path::Path;

use crate::expectimax::{ExpectimaxConfig, HeuristicWeights};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub search: Search,
    #[serde(default)]
    pub weights: HeuristicWeights,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Search {
    #[serde(default = "defaults::max_depth")]
    pub max_depth: u32,
    #[serde(default = "defaults::min_depth")]
    pub min_depth: u32,
    #[serde(default = "defaults::prob_cutoff")]
    pub prob_cutoff: f64,
    #[serde(default = "defaults::four_probability")]
    pub four_probability: f64,
    #[serde(default = "defaults::cache_enabled")]
    pub cache_enabled: bool,
}

impl Default for Search {
    fn default() -> Self {
        Self {
            max_depth: defaults::max_depth(),
            min_depth: defaults::min_depth(),
            prob_cutoff: defaults::prob_cutoff(),
            four_probability: defaults::four_probability(),
            cache_enabled: defaults::cache_enabled(),
        }
    }
}

impl Config {
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file = std::fs::File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings the search cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.search;
        if s.max_depth == 0 {
            return Err(invalid("search.max_depth", "must be at least 1"));
        }
        if !(s.prob_cutoff.is_finite() && s.prob_cutoff > 0.0 && s.prob_cutoff <= 1.0) {
            return Err(invalid("search.prob_cutoff", format!("{} is outside (0, 1]", s.prob_cutoff)));
        }
        if !(0.0..=1.0).contains(&s.four_probability) {
            return Err(invalid("search.four_probability", format!("{} is outside [0, 1]", s.four_probability)));
        }
        let w = &self.weights;
        let all_finite = [
            w.lost_penalty,
            w.empty_weight,
            w.merges_weight,
            w.monotonicity_weight,
            w.monotonicity_power,
            w.sum_weight,
            w.sum_power,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !all_finite {
            return Err(invalid("weights", "every weight must be finite"));
        }
        Ok(())
    }

    pub fn expectimax_config(&self) -> ExpectimaxConfig {
        ExpectimaxConfig {
            max_depth: self.search.max_depth,
            min_depth: self.search.min_depth,
            prob_cutoff: self.search.prob_cutoff,
            four_probability: self.search.four_probability,
            cache_enabled: self.search.cache_enabled,
            weights: self.weights,
        }
    }
}

impl From<&Config> for ExpectimaxConfig {
    fn from(cfg: &Config) -> Self { cfg.expectimax_config() }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field, reason: reason.into() }
}

mod defaults {
    pub fn max_depth() -> u32 { 5 }
    pub fn min_depth() -> u32 { 3 }
    pub fn prob_cutoff() -> f64 { 1e-4 }
    pub fn four_probability() -> f64 { 0.1 }
    pub fn cache_enabled() -> bool { true }
}
