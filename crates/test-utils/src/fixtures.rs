//! Representative dashboard data for tests.

use hsm_common::{ModelResult, PartialDependenceSample};

pub const DAUBENTONS: &str = "Myotis daubentonii";
pub const PIPISTRELLE: &str = "Pipistrellus pipistrellus";
pub const NOCTULE: &str = "Nyctalus noctula";

pub const FORAGING: &str = "Foraging";
pub const ROOST: &str = "Roost";
pub const IN_FLIGHT: &str = "In flight";

/// Region bounds used across tests.
pub mod bbox {
    /// South Yorkshire in WGS84 degrees `(min_lon, min_lat, max_lon, max_lat)`
    pub const SOUTH_YORKSHIRE_WGS84: (f64, f64, f64, f64) = (-1.83, 53.30, -0.86, 53.66);

    /// South Yorkshire in British National Grid metres
    pub const SOUTH_YORKSHIRE_BNG: (f64, f64, f64, f64) = (410000.0, 380000.0, 475000.0, 420000.0);
}

/// Band name the pipeline derives for a model.
pub fn band_name(latin_name: &str, activity_type: &str) -> String {
    format!("{}_{}", latin_name, activity_type)
}

pub fn model_result(latin_name: &str, activity_type: &str, score: f64, std: f64) -> ModelResult {
    ModelResult {
        latin_name: latin_name.to_string(),
        activity_type: activity_type.to_string(),
        mean_cv_score: score,
        std_cv_score: std,
        n_presence: 120,
        n_background: 5000,
        folds: 5,
        band_name: band_name(latin_name, activity_type),
    }
}

/// Three models over two species.
pub fn sample_results() -> Vec<ModelResult> {
    vec![
        model_result(DAUBENTONS, FORAGING, 0.82, 0.031),
        model_result(DAUBENTONS, ROOST, 0.764, 0.042),
        model_result(PIPISTRELLE, FORAGING, 0.9149, 0.0125),
    ]
}

/// Curves for two features of Daubenton's foraging model and one of the
/// pipistrelle model.
pub fn sample_partial_dependence() -> Vec<PartialDependenceSample> {
    let sample = |latin: &str, activity: &str, feature: &str, value: f64, average: f64| {
        PartialDependenceSample {
            latin_name: latin.to_string(),
            activity_type: activity.to_string(),
            feature: feature.to_string(),
            value,
            average,
        }
    };
    vec![
        sample(DAUBENTONS, FORAGING, "distance_to_water", 0.0, 0.1),
        sample(DAUBENTONS, FORAGING, "distance_to_water", 500.0, 0.4),
        sample(DAUBENTONS, FORAGING, "distance_to_water", 250.0, 0.2),
        sample(DAUBENTONS, FORAGING, "woodland_cover", 0.5, 0.25),
        sample(DAUBENTONS, FORAGING, "woodland_cover", 0.0, 0.2),
        sample(PIPISTRELLE, FORAGING, "woodland_cover", 0.0, 0.3),
    ]
}
