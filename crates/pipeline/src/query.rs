//! Read-only views over the startup snapshot for one user selection.
//!
//! Nothing here fails on an unmatched selection; it yields `None` or an
//! empty list instead.

use std::collections::HashSet;
use std::time::Duration;

use hsm_common::{HsmResult, ModelResult, TrainingRecord};
use renderer::ImageHandle;
use serde::Serialize;
use storage::UrlSigner;

use crate::config::DashboardConfig;
use crate::orchestrator::PipelineResult;

/// Activity selection that disables the activity filter on training points.
pub const ALL_ACTIVITIES: &str = "All";

/// Y-axis label of every partial-dependence plot.
pub const DEPENDENCE_Y_LABEL: &str = "Effect on Habitat Suitability Score";

/// Leaflet-style `[[south, west], [north, east]]`.
pub type LatLonBounds = [[f64; 2]; 2];

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn selected_model<'a>(
    result: &'a PipelineResult,
    species: &str,
    activity: &str,
) -> Option<&'a ModelResult> {
    result.results.iter().find(|r| r.matches(species, activity))
}

/// Headline statistics of one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelDescription {
    /// Mean cross-validation score in percent, one decimal
    pub accuracy_pct: f64,
    pub accuracy_std_pct: f64,
    pub species_records: u64,
    pub background_points: u64,
    pub folds: u32,
}

impl ModelDescription {
    pub fn to_markdown(&self) -> String {
        format!(
            "This model has an accuracy of **{:.1}%** (+/- {:.1})%.\n\nSpecies Records: {}",
            self.accuracy_pct, self.accuracy_std_pct, self.species_records
        )
    }
}

pub fn model_description(model: &ModelResult) -> ModelDescription {
    ModelDescription {
        accuracy_pct: round_to(model.mean_cv_score * 100.0, 1),
        accuracy_std_pct: round_to(model.std_cv_score * 100.0, 1),
        species_records: model.n_presence,
        background_points: model.n_background,
        folds: model.folds,
    }
}

/// One row of the model summary table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummaryRow {
    #[serde(rename = "Species")]
    pub species: String,
    #[serde(rename = "Activity Type")]
    pub activity_type: String,
    #[serde(rename = "Accuracy (%)")]
    pub accuracy_pct: f64,
    #[serde(rename = "Accuracy Std (±%)")]
    pub accuracy_std_pct: f64,
    #[serde(rename = "Presence Points")]
    pub presence_points: u64,
    #[serde(rename = "Background Points")]
    pub background_points: u64,
}

/// Every model, in results order.
pub fn models_table(result: &PipelineResult) -> Vec<ModelSummaryRow> {
    result
        .results
        .iter()
        .map(|r| ModelSummaryRow {
            species: r.latin_name.clone(),
            activity_type: r.activity_type.clone(),
            accuracy_pct: round_to(r.mean_cv_score * 100.0, 1),
            accuracy_std_pct: round_to(r.std_cv_score * 100.0, 1),
            presence_points: r.n_presence,
            background_points: r.n_background,
        })
        .collect()
}

/// Training records of a species, optionally narrowed to one activity type.
pub fn training_points<'a>(
    result: &'a PipelineResult,
    species: &str,
    activity: &str,
) -> Vec<&'a TrainingRecord> {
    result
        .training_data
        .iter()
        .filter(|r| r.latin_name == species)
        .filter(|r| activity == ALL_ACTIVITIES || r.activity_type == activity)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependenceSummaryRow {
    #[serde(rename = "Feature")]
    pub feature: String,
    #[serde(skip)]
    pub raw_feature: String,
    #[serde(rename = "Influence Range")]
    pub influence_range: f64,
}

/// Feature influence of one model, most influential first.
pub fn dependence_summary(
    result: &PipelineResult,
    config: &DashboardConfig,
    species: &str,
    activity: &str,
) -> Vec<DependenceSummaryRow> {
    let mut rows: Vec<DependenceSummaryRow> = result
        .dependence_ranges
        .iter()
        .filter(|r| r.latin_name == species && r.activity_type == activity)
        .map(|r| DependenceSummaryRow {
            feature: config.feature_display_name(&r.feature),
            raw_feature: r.feature.clone(),
            influence_range: round_to(r.range, 3),
        })
        .collect();
    rows.sort_by(|a, b| b.influence_range.total_cmp(&a.influence_range));
    rows
}

/// Data of a partial-dependence plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependenceCurve {
    pub feature: String,
    pub x_label: String,
    pub y_label: &'static str,
    /// `(input value, average effect)` sorted by input value
    pub points: Vec<(f64, f64)>,
}

pub fn dependence_curve(
    result: &PipelineResult,
    config: &DashboardConfig,
    species: &str,
    activity: &str,
    feature: &str,
) -> DependenceCurve {
    let mut points: Vec<(f64, f64)> = result
        .partial_dependence
        .iter()
        .filter(|s| s.latin_name == species && s.activity_type == activity && s.feature == feature)
        .map(|s| (s.value, s.average))
        .collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    DependenceCurve {
        feature: feature.to_string(),
        x_label: config.feature_display_name(feature),
        y_label: DEPENDENCE_Y_LABEL,
        points,
    }
}

/// Everything a map needs to draw one model's prediction overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionOverlay {
    pub band_name: String,
    pub image: ImageHandle,
    /// Browser-loadable URL: signed for blob objects, the path for local files
    pub url: String,
    pub bounds: LatLonBounds,
}

/// Overlay of the selected model. A signing failure is returned as an error;
/// an unknown model or a band without an image yields `None`.
pub async fn prediction_overlay(
    result: &PipelineResult,
    species: &str,
    activity: &str,
    signer: &dyn UrlSigner,
    expires_in: Duration,
) -> HsmResult<Option<PredictionOverlay>> {
    let Some(model) = selected_model(result, species, activity) else {
        return Ok(None);
    };
    let Some(image) = result.band_images.get(&model.band_name) else {
        return Ok(None);
    };

    let url = match image {
        ImageHandle::File(path) => path.display().to_string(),
        ImageHandle::Object(key) | ImageHandle::Memory(key) => {
            signer.sign(key, expires_in).await?
        }
    };

    Ok(Some(PredictionOverlay {
        band_name: model.band_name.clone(),
        image: image.clone(),
        url,
        bounds: result.raster_bounds.to_lat_lon_corners(),
    }))
}

/// Bounds to fit the map to: the boundary's total extent.
pub fn map_frame(result: &PipelineResult) -> Option<LatLonBounds> {
    result.boundary.bounds().map(|b| b.to_lat_lon_corners())
}

/// A select option: stored value plus display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    values.filter(|v| seen.insert(*v)).collect()
}

/// Modelled species in first-seen order, labelled with common names.
pub fn species_choices(result: &PipelineResult, config: &DashboardConfig) -> Vec<Choice> {
    distinct(result.results.iter().map(|r| r.latin_name.as_str()))
        .into_iter()
        .map(|latin| Choice {
            value: latin.to_string(),
            label: config.species_display_name(latin),
        })
        .collect()
}

/// Modelled activity types in first-seen order.
pub fn activity_choices(result: &PipelineResult) -> Vec<String> {
    distinct(result.results.iter().map(|r| r.activity_type.as_str()))
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Features with a partial-dependence curve for one model.
pub fn feature_choices(
    result: &PipelineResult,
    config: &DashboardConfig,
    species: &str,
    activity: &str,
) -> Vec<Choice> {
    distinct(
        result
            .partial_dependence
            .iter()
            .filter(|s| s.latin_name == species && s.activity_type == activity)
            .map(|s| s.feature.as_str()),
    )
    .into_iter()
    .map(|feature| Choice {
        value: feature.to_string(),
        label: config.feature_display_name(feature),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(82.0, 1), 82.0);
        assert_eq!(round_to(1.23456, 3), 1.235);
        assert_eq!(round_to(0.30000000000000004, 3), 0.3);
    }

    #[test]
    fn test_description_markdown() {
        let description = ModelDescription {
            accuracy_pct: 82.0,
            accuracy_std_pct: 3.1,
            species_records: 120,
            background_points: 5000,
            folds: 5,
        };
        assert_eq!(
            description.to_markdown(),
            "This model has an accuracy of **82.0%** (+/- 3.1)%.\n\nSpecies Records: 120"
        );
    }
}
