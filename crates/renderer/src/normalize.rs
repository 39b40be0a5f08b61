//! Value normalisation onto [0, 1].

use hsm_common::{HsmError, HsmResult};

/// Inclusive value range used to scale a band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    /// An explicit range. Both bounds must be finite and `min <= max`.
    pub fn new(min: f32, max: f32) -> HsmResult<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(HsmError::Render(format!(
                "value range bounds must be finite, got ({}, {})",
                min, max
            )));
        }
        if min > max {
            return Err(HsmError::Render(format!(
                "value range minimum {} exceeds maximum {}",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    /// Finite minimum and maximum of `values`, ignoring no-data.
    /// `None` when no cell holds a finite value.
    pub fn from_data(values: &[f32]) -> Option<Self> {
        values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<ValueRange>, v| {
                Some(match acc {
                    Some(r) => ValueRange {
                        min: r.min.min(v),
                        max: r.max.max(v),
                    },
                    None => ValueRange { min: v, max: v },
                })
            })
    }

    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }

    /// Clip into the range, then rescale. `NaN` stays `NaN`; a degenerate
    /// range sends every other value to 0.
    pub fn normalize(&self, value: f32) -> f32 {
        if value.is_nan() {
            return f32::NAN;
        }
        if self.is_degenerate() {
            return 0.0;
        }
        let clipped = value.clamp(self.min, self.max);
        (clipped - self.min) / (self.max - self.min)
    }
}

/// Normalise a whole band. Without an explicit range the band's own finite
/// extent is used; an all-no-data band comes back unchanged.
pub fn normalize_band(values: &[f32], range: Option<ValueRange>) -> Vec<f32> {
    match range.or_else(|| ValueRange::from_data(values)) {
        Some(range) => values.iter().map(|&v| range.normalize(v)).collect(),
        None => vec![f32::NAN; values.len()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_range_ignores_nan() {
        let range = ValueRange::from_data(&[f32::NAN, 0.2, 0.8, f32::NAN, 0.5]).unwrap();
        assert_eq!(range, ValueRange { min: 0.2, max: 0.8 });
        assert!(ValueRange::from_data(&[f32::NAN, f32::NAN]).is_none());
        assert!(ValueRange::from_data(&[]).is_none());
    }

    #[test]
    fn test_normalized_values_in_unit_interval() {
        let values = [-1.0, 0.0, 0.25, 0.5, 1.0, 3.0, f32::NAN];
        let range = ValueRange::new(0.0, 1.0).unwrap();
        let out = normalize_band(&values, Some(range));
        for v in out.iter().filter(|v| !v.is_nan()) {
            assert!((0.0..=1.0).contains(v), "{} out of range", v);
        }
        assert_eq!(out[0], 0.0);
        assert_eq!(out[2], 0.25);
        assert_eq!(out[5], 1.0);
        assert!(out[6].is_nan());
    }

    #[test]
    fn test_auto_normalisation_spans_unit_interval() {
        let out = normalize_band(&[0.2, 0.4, 0.6], None);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[2], 1.0);
        assert!((out[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_range_maps_to_zero() {
        let out = normalize_band(&[0.3, 0.3, f32::NAN], None);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 0.0);
        assert!(out[2].is_nan());

        let explicit = ValueRange::new(0.5, 0.5).unwrap();
        assert_eq!(explicit.normalize(0.9), 0.0);
    }

    #[test]
    fn test_all_nan_band() {
        let out = normalize_band(&[f32::NAN; 4], None);
        assert!(out.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_invalid_explicit_ranges() {
        assert_eq!(ValueRange::new(1.0, 0.0).unwrap_err().kind(), "RenderError");
        assert!(ValueRange::new(f32::NAN, 1.0).is_err());
        assert!(ValueRange::new(0.0, f32::INFINITY).is_err());
    }
}
