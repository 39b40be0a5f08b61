//! Tabular and vector records loaded at startup.

use geo::{BoundingRect, MultiPolygon, Point};
use serde::{Deserialize, Serialize};

use crate::{BoundingBox, CrsCode};

/// Identifies one model run: a species and an activity type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelKey {
    pub latin_name: String,
    pub activity_type: String,
}

impl ModelKey {
    pub fn new(latin_name: impl Into<String>, activity_type: impl Into<String>) -> Self {
        Self {
            latin_name: latin_name.into(),
            activity_type: activity_type.into(),
        }
    }
}

/// Cross-validated performance of one (species, activity type) model.
///
/// Field names match the columns of `results.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResult {
    pub latin_name: String,
    pub activity_type: String,
    /// Mean cross-validation score, 0..1
    pub mean_cv_score: f64,
    /// Standard deviation of the cross-validation score
    pub std_cv_score: f64,
    pub n_presence: u64,
    pub n_background: u64,
    pub folds: u32,
    /// Name of the prediction raster band produced by this model
    pub band_name: String,
}

impl ModelResult {
    pub fn key(&self) -> ModelKey {
        ModelKey::new(&self.latin_name, &self.activity_type)
    }

    pub fn matches(&self, latin_name: &str, activity_type: &str) -> bool {
        self.latin_name == latin_name && self.activity_type == activity_type
    }
}

/// One observed species occurrence used to train a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
    pub latin_name: String,
    pub activity_type: String,
    /// x = longitude, y = latitude once reprojected to the display CRS
    pub location: Point<f64>,
}

/// One point of a partial-dependence curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialDependenceSample {
    pub latin_name: String,
    pub activity_type: String,
    pub feature: String,
    /// Input value of the feature
    pub value: f64,
    /// Average predicted effect at that input value
    pub average: f64,
}

/// Influence range of a feature: max(average) - min(average) over its curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependenceRange {
    pub latin_name: String,
    pub activity_type: String,
    pub feature: String,
    pub range: f64,
}

/// Region of interest used to frame the map.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryPolygon {
    pub geometry: MultiPolygon<f64>,
    pub crs: CrsCode,
}

impl BoundaryPolygon {
    /// Total bounds of every polygon, or `None` for an empty boundary.
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.geometry.bounding_rect().map(|rect| {
            BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    #[test]
    fn test_boundary_bounds() {
        let poly = polygon![
            (x: -1.8, y: 53.3),
            (x: -1.0, y: 53.3),
            (x: -1.0, y: 53.7),
            (x: -1.8, y: 53.7),
        ];
        let boundary = BoundaryPolygon {
            geometry: MultiPolygon::new(vec![poly]),
            crs: CrsCode::Epsg4326,
        };
        let bounds = boundary.bounds().unwrap();
        assert_eq!(bounds, BoundingBox::new(-1.8, 53.3, -1.0, 53.7));
    }

    #[test]
    fn test_empty_boundary_has_no_bounds() {
        let boundary = BoundaryPolygon {
            geometry: MultiPolygon::new(vec![]),
            crs: CrsCode::Epsg4326,
        };
        assert!(boundary.bounds().is_none());
    }

    #[test]
    fn test_model_matches() {
        let result = ModelResult {
            latin_name: "Myotis daubentonii".into(),
            activity_type: "Foraging".into(),
            mean_cv_score: 0.82,
            std_cv_score: 0.03,
            n_presence: 120,
            n_background: 5000,
            folds: 5,
            band_name: "Myotis daubentonii_Foraging".into(),
        };
        assert!(result.matches("Myotis daubentonii", "Foraging"));
        assert!(!result.matches("Myotis daubentonii", "Roost"));
        assert_eq!(result.key(), ModelKey::new("Myotis daubentonii", "Foraging"));
    }
}
