//! Process-wide plugin registry for preprocessors, models and plot styles.
//!
//! Three independent name→callable mappings, each guarded by its own
//! mutex. Registration is rare relative to lookup; `get_*` returns a
//! cloned snapshot so callers never hold a lock while dispatching.
//!
//! Override policy (the contract plugin authors rely on): registering a
//! name that already exists replaces the previous entry (the last
//! registration wins) and emits a non-fatal `tracing` warning.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::SpectralResult;
use crate::preprocess;
use crate::transform::{
    AdaptiveBackgroundFilter, AutoencoderTransformer, NonNegativeTransformer, Transformer,
};

/// A registered preprocessing stage: `(axis, intensities) -> intensities`.
pub type PreprocessorFn =
    Arc<dyn Fn(&Array1<f64>, &Array1<f64>) -> SpectralResult<Array1<f64>> + Send + Sync>;

/// A registered model constructor.
pub type ModelFactory = Arc<dyn Fn() -> Box<dyn Transformer + Send + Sync> + Send + Sync>;

/// A registered plot style generator.
pub type PlotStyleFn = Arc<dyn Fn() -> PlotStyle + Send + Sync>;

/// Plain plot styling data returned to the presentation layer.
///
/// The engine never hands out UI objects; consumers translate this into
/// whatever their plotting toolkit expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotStyle {
    pub line_width: f64,
    pub color: String,
    pub marker: Option<String>,
}

fn preprocessors() -> &'static Mutex<HashMap<String, PreprocessorFn>> {
    static MAP: OnceLock<Mutex<HashMap<String, PreprocessorFn>>> = OnceLock::new();
    MAP.get_or_init(|| Mutex::new(HashMap::new()))
}

fn models() -> &'static Mutex<HashMap<String, ModelFactory>> {
    static MAP: OnceLock<Mutex<HashMap<String, ModelFactory>>> = OnceLock::new();
    MAP.get_or_init(|| Mutex::new(HashMap::new()))
}

fn plot_styles() -> &'static Mutex<HashMap<String, PlotStyleFn>> {
    static MAP: OnceLock<Mutex<HashMap<String, PlotStyleFn>>> = OnceLock::new();
    MAP.get_or_init(|| Mutex::new(HashMap::new()))
}

fn insert_named<V>(map: &Mutex<HashMap<String, V>>, kind: &str, name: &str, value: V) {
    let key = name.to_lowercase();
    let mut guard = map.lock().expect("registry mutex poisoned");
    if guard.insert(key, value).is_some() {
        tracing::warn!(
            "Overriding previously registered {} '{}'; last registration wins",
            kind,
            name
        );
    }
}

/// Registers a preprocessing stage under `name` (lowercased).
pub fn register_preprocessor(name: &str, func: PreprocessorFn) {
    insert_named(preprocessors(), "preprocessor", name, func);
}

/// Registers a model factory under `name` (lowercased).
pub fn register_model(name: &str, factory: ModelFactory) {
    insert_named(models(), "model", name, factory);
}

/// Registers a plot style generator under `name` (lowercased).
pub fn register_plot_style(name: &str, func: PlotStyleFn) {
    insert_named(plot_styles(), "plot style", name, func);
}

/// Returns a snapshot of the registered preprocessors.
pub fn get_preprocessors() -> HashMap<String, PreprocessorFn> {
    preprocessors().lock().expect("registry mutex poisoned").clone()
}

/// Returns a snapshot of the registered model factories.
pub fn get_models() -> HashMap<String, ModelFactory> {
    models().lock().expect("registry mutex poisoned").clone()
}

/// Returns a snapshot of the registered plot styles.
pub fn get_plot_styles() -> HashMap<String, PlotStyleFn> {
    plot_styles().lock().expect("registry mutex poisoned").clone()
}

/// Clears all three registries. Test isolation only.
pub fn reset_registry() {
    preprocessors().lock().expect("registry mutex poisoned").clear();
    models().lock().expect("registry mutex poisoned").clear();
    plot_styles().lock().expect("registry mutex poisoned").clear();
}

/// Registers the engine's built-in stages, models and styles.
///
/// Rust has no import-time side effects, so orchestration calls this once
/// at startup. Parameters are taken from `config`; plugins registered
/// afterwards may override any built-in by name.
pub fn register_builtin_stages(config: &EngineConfig) {
    let smoothing = config.smoothing.clone();
    register_preprocessor(
        "smoothing",
        Arc::new(move |_axis, y| {
            preprocess::savgol(y, smoothing.window_length, smoothing.polyorder)
        }),
    );

    let baseline = config.baseline.clone();
    register_preprocessor(
        "baseline_als",
        Arc::new(move |_axis, y| {
            preprocess::asls_baseline(y, baseline.lam, baseline.p, baseline.n_iter)
                .map(|fit| fit.corrected)
        }),
    );

    let baseline = config.baseline.clone();
    register_preprocessor(
        "baseline_poly",
        Arc::new(move |axis, y| {
            Ok(preprocess::polynomial_baseline(
                axis,
                y,
                baseline.n_segments,
                baseline.poly_order,
            ))
        }),
    );

    register_preprocessor(
        "normalize_max",
        Arc::new(|axis, y| Ok(preprocess::normalize(axis, y, preprocess::NormalizationMode::Max))),
    );
    register_preprocessor(
        "normalize_area",
        Arc::new(|axis, y| Ok(preprocess::normalize(axis, y, preprocess::NormalizationMode::Area))),
    );
    register_preprocessor(
        "snv",
        Arc::new(|axis, y| Ok(preprocess::normalize(axis, y, preprocess::NormalizationMode::Snv))),
    );
    register_preprocessor(
        "log_transform",
        Arc::new(|_axis, y| Ok(preprocess::log_transform(y))),
    );
    register_preprocessor(
        "sqrt_transform",
        Arc::new(|_axis, y| Ok(preprocess::sqrt_transform(y))),
    );

    let temp_k = config.correction.temperature_k;
    register_preprocessor(
        "bose_einstein",
        Arc::new(move |axis, y| Ok(preprocess::bose_einstein(axis, y, temp_k))),
    );

    register_preprocessor(
        "second_derivative",
        Arc::new(|axis, y| Ok(preprocess::second_derivative(axis, y))),
    );

    let baseline = config.baseline.clone();
    register_preprocessor(
        "polynomial_fit",
        Arc::new(move |axis, y| Ok(preprocess::polynomial_fit(axis, y, baseline.poly_order))),
    );

    let autoencoder = config.autoencoder.clone();
    register_model(
        "autoencoder",
        Arc::new(move || {
            Box::new(AutoencoderTransformer::new(autoencoder.clone()))
                as Box<dyn Transformer + Send + Sync>
        }),
    );
    register_model(
        "nonnegative",
        Arc::new(|| Box::new(NonNegativeTransformer::new()) as Box<dyn Transformer + Send + Sync>),
    );
    let background = config.background.clone();
    register_model(
        "adaptive_background_filter",
        Arc::new(move || {
            Box::new(AdaptiveBackgroundFilter::new(background.clone()))
                as Box<dyn Transformer + Send + Sync>
        }),
    );

    register_plot_style(
        "default",
        Arc::new(|| PlotStyle {
            line_width: 1.0,
            color: "tab:blue".to_string(),
            marker: None,
        }),
    );
    register_plot_style(
        "publication",
        Arc::new(|| PlotStyle {
            line_width: 1.5,
            color: "black".to_string(),
            marker: None,
        }),
    );
}
