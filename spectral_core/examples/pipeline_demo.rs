//! End-to-end demo: synthesize labeled mixtures, condition them, and
//! identify the dominant component against a reference library.
//!
//! Run with: cargo run --example pipeline_demo

use ndarray::Array1;
use spectral_core::preprocess::{
    asls_baseline, normalize, passes_quality_check, savgol, NormalizationMode,
};
use spectral_core::{
    register_builtin_stages, EngineConfig, GeneratorOptions, SpectralMatcher,
    SyntheticDataGenerator,
};

fn gaussian_peak(axis: &Array1<f64>, center: f64, width: f64) -> Array1<f64> {
    axis.mapv(|w: f64| (-((w - center) / width).powi(2)).exp())
}

fn main() {
    let config = EngineConfig::default();
    register_builtin_stages(&config);
    println!(
        "registered {} preprocessors, {} models, {} plot styles",
        spectral_core::get_preprocessors().len(),
        spectral_core::get_models().len(),
        spectral_core::get_plot_styles().len()
    );

    // Reference library of pure minerals.
    let axis = Array1::linspace(400.0, 1800.0, 700);
    let quartz = gaussian_peak(&axis, 465.0, 18.0);
    let calcite = gaussian_peak(&axis, 1086.0, 14.0);
    let anatase = gaussian_peak(&axis, 638.0, 22.0);

    let mut matcher = SpectralMatcher::new(axis.clone()).unwrap();
    matcher.add_reference("quartz", &axis, &quartz).unwrap();
    matcher.add_reference("calcite", &axis, &calcite).unwrap();
    matcher.add_reference("anatase", &axis, &anatase).unwrap();

    // Synthetic quartz-dominated mixtures with mild degradation.
    let mut generator = SyntheticDataGenerator::new(axis.clone()).unwrap();
    generator.add_component("quartz", &axis, &quartz).unwrap();
    generator.add_component("calcite", &axis, &calcite).unwrap();

    let options = GeneratorOptions {
        noise_level: 0.02,
        baseline_drift: 0.05,
        complexity: 0.5,
        seed: Some(7),
    };
    let ranges = vec![
        ("quartz".to_string(), (0.7, 0.95)),
        ("calcite".to_string(), (0.05, 0.3)),
    ];
    let (mixtures, ratios) = generator.generate_batch(5, &ranges, &options).unwrap();

    for i in 0..mixtures.nrows() {
        let raw = mixtures.row(i).to_owned();
        if config.qc.enabled && !passes_quality_check(&raw, config.qc.min_max_intensity) {
            println!("sample {i}: rejected by quality control");
            continue;
        }
        let smoothed = savgol(&raw, 11, 3).unwrap();
        let corrected = asls_baseline(&smoothed, 1.0e5, 0.01, 10).unwrap().corrected;
        let query = normalize(&axis, &corrected, NormalizationMode::Max);

        let matches = matcher.match_spectrum(&axis, &query, 2).unwrap();
        println!(
            "sample {i}: true quartz ratio {:.2} -> matched {} (score {:.4}), runner-up {} ({:.4})",
            ratios[[i, 0]],
            matches[0].name,
            matches[0].score,
            matches[1].name,
            matches[1].score
        );
    }
}
