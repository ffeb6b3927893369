//! Engine configuration management via TOML.
//!
//! Missing sections and fields fall back to the documented defaults;
//! present values are validated, and violations surface as parse errors
//! rather than being silently clamped.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::preprocess::NormalizationMode;
use crate::transform::{AutoencoderConfig, BackgroundFilterConfig};

/// Savitzky–Golay smoothing defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub window_length: usize,
    pub polyorder: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            window_length: 15,
            polyorder: 3,
        }
    }
}

/// Baseline-correction defaults, covering both the AsLS and the segmented
/// polynomial estimators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// AsLS smoothness penalty.
    pub lam: f64,
    /// AsLS asymmetry.
    pub p: f64,
    /// AsLS iteration count (fixed; no convergence test).
    pub n_iter: usize,
    /// Segment count of the polynomial estimator.
    pub n_segments: usize,
    /// Polynomial order of the polynomial estimator.
    pub poly_order: usize,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            lam: 1.0e4,
            p: 0.005,
            n_iter: 10,
            n_segments: 50,
            poly_order: 3,
        }
    }
}

/// Normalization stage selection; `None` skips normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    pub mode: Option<NormalizationMode>,
}

/// Bose–Einstein correction defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig {
    /// Sample temperature in Kelvin.
    pub temperature_k: f64,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            temperature_k: 300.0,
        }
    }
}

/// Quality-control gate applied before conditioning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityControlConfig {
    pub enabled: bool,
    /// Minimum peak intensity a spectrum must reach to pass.
    pub min_max_intensity: f64,
}

impl Default for QualityControlConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_max_intensity: 5.0,
        }
    }
}

/// Default augmentation severity for the synthetic generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorDefaults {
    pub noise_level: f64,
    pub baseline_drift: f64,
    pub complexity: f64,
}

impl Default for GeneratorDefaults {
    fn default() -> Self {
        Self {
            noise_level: 0.01,
            baseline_drift: 0.05,
            complexity: 1.0,
        }
    }
}

/// Engine configuration loaded from TOML.
///
/// # Examples
///
/// ```
/// use spectral_core::EngineConfig;
///
/// let config = EngineConfig::from_str("[smoothing]\nwindow_length = 11").unwrap();
/// assert_eq!(config.smoothing.window_length, 11);
/// assert_eq!(config.smoothing.polyorder, 3); // default fills the rest
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub smoothing: SmoothingConfig,
    pub baseline: BaselineConfig,
    pub normalization: NormalizationConfig,
    pub correction: CorrectionConfig,
    pub qc: QualityControlConfig,
    pub autoencoder: AutoencoderConfig,
    pub background: BackgroundFilterConfig,
    pub generator: GeneratorDefaults,
}

impl EngineConfig {
    /// Loads and validates a configuration file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(&path)?;
        Self::from_str(&contents)
    }

    /// Parses and validates a TOML configuration string.
    pub fn from_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            toml::from_str(toml_str).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.smoothing.window_length % 2 == 0 || self.smoothing.window_length < 3 {
            return Err(ConfigError::Parse(
                "smoothing.window_length must be odd and >= 3".into(),
            ));
        }
        if self.smoothing.polyorder >= self.smoothing.window_length {
            return Err(ConfigError::Parse(
                "smoothing.polyorder must be strictly less than window_length".into(),
            ));
        }
        if !(self.baseline.lam.is_finite() && self.baseline.lam > 0.0) {
            return Err(ConfigError::Parse("baseline.lam must be > 0".into()));
        }
        if !(self.baseline.p > 0.0 && self.baseline.p < 1.0) {
            return Err(ConfigError::Parse("baseline.p must be in (0, 1)".into()));
        }
        if self.baseline.n_iter == 0 {
            return Err(ConfigError::Parse("baseline.n_iter must be >= 1".into()));
        }
        if !(self.correction.temperature_k > 0.0) {
            return Err(ConfigError::Parse(
                "correction.temperature_k must be > 0".into(),
            ));
        }
        if self.autoencoder.n_components == 0 {
            return Err(ConfigError::Parse(
                "autoencoder.n_components must be >= 1".into(),
            ));
        }
        if !(self.autoencoder.learning_rate > 0.0) {
            return Err(ConfigError::Parse(
                "autoencoder.learning_rate must be > 0".into(),
            ));
        }
        if self.autoencoder.tolerance < 0.0 {
            return Err(ConfigError::Parse(
                "autoencoder.tolerance must be >= 0".into(),
            ));
        }
        if self.background.n_components == 0 {
            return Err(ConfigError::Parse(
                "background.n_components must be >= 1".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.background.contamination) {
            return Err(ConfigError::Parse(
                "background.contamination must be in [0, 1)".into(),
            ));
        }
        if self
            .background
            .signal_ranges
            .iter()
            .any(|&(lo, hi)| lo > hi)
        {
            return Err(ConfigError::Parse(
                "background.signal_ranges entries must satisfy lo <= hi".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.generator.complexity) {
            return Err(ConfigError::Parse(
                "generator.complexity must be in [0, 1]".into(),
            ));
        }
        if self.generator.noise_level < 0.0 || self.generator.baseline_drift < 0.0 {
            return Err(ConfigError::Parse(
                "generator noise_level and baseline_drift must be >= 0".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "IO error: {}", err),
            ConfigError::Parse(err) => write!(f, "Parse error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        ConfigError::Io(value)
    }
}
