//! # Spectral Core
//!
//! A spectral-processing engine for one-dimensional spectroscopic signals
//! (Raman/IR intensity vs. wavenumber): stateless signal conditioning,
//! fit/transform decomposition models, synthetic labeled mixtures for
//! validation, and cosine-similarity matching against a reference
//! library, tied together by a process-wide name→callable registry.
//!
//! ## Quick Start
//!
//! ```rust
//! use ndarray::Array1;
//! use spectral_core::preprocess::{normalize, NormalizationMode};
//! use spectral_core::SpectralMatcher;
//!
//! let axis = Array1::linspace(400.0, 1800.0, 512);
//! let quartz = axis.mapv(|w: f64| (-((w - 465.0) / 20.0).powi(2)).exp());
//!
//! let mut matcher = SpectralMatcher::new(axis.clone()).unwrap();
//! matcher.add_reference("quartz", &axis, &quartz).unwrap();
//!
//! let query = normalize(&axis, &(&quartz * 3.0), NormalizationMode::Max);
//! let matches = matcher.match_spectrum(&axis, &query, 1).unwrap();
//! assert_eq!(matches[0].name, "quartz");
//! assert!((matches[0].score - 1.0).abs() < 1e-9);
//! ```
//!
//! ## Core Modules
//!
//! - [`config`] - Engine configuration via TOML
//! - [`spectrum`] - Axis/spectrum/matrix data model and resampling
//! - [`preprocess`] - Stateless conditioning transforms
//! - [`transform`] - Stateful fit/transform models
//! - [`synth`] - Synthetic mixture generation
//! - [`matcher`] - Reference-library matching
//! - [`registry`] - Process-wide plugin registry

pub mod config;
pub mod error;
pub mod matcher;
pub mod preprocess;
pub mod registry;
pub mod spectrum;
pub mod synth;
pub mod transform;

pub use config::{ConfigError, EngineConfig};
pub use error::{SpectralError, SpectralResult};
pub use matcher::{MatchResult, SpectralMatcher};
pub use preprocess::NormalizationMode;
pub use registry::{
    get_models, get_plot_styles, get_preprocessors, register_builtin_stages, register_model,
    register_plot_style, register_preprocessor, reset_registry, PlotStyle,
};
pub use spectrum::{Spectrum, SpectrumMatrix};
pub use synth::{GeneratorOptions, SyntheticDataGenerator};
pub use transform::{
    AdaptiveBackgroundFilter, AutoencoderBackend, AutoencoderConfig, AutoencoderTransformer,
    BackgroundFilterConfig, FitReport, NonNegativeTransformer, Transformer,
};
