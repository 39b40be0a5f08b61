//! Feature influence ranges from partial-dependence curves.

use std::collections::BTreeMap;

use hsm_common::{DependenceRange, PartialDependenceSample};

/// Group samples by (species, activity type, feature) and compute
/// `max(average) - min(average)` for each group.
///
/// Output is sorted by the grouping key. NaN averages are ignored; a group
/// with no finite average gets a range of 0.
pub fn compute_dependence_ranges(samples: &[PartialDependenceSample]) -> Vec<DependenceRange> {
    let mut groups: BTreeMap<(&str, &str, &str), (f64, f64)> = BTreeMap::new();

    for sample in samples {
        let key = (
            sample.latin_name.as_str(),
            sample.activity_type.as_str(),
            sample.feature.as_str(),
        );
        let entry = groups.entry(key).or_insert((f64::INFINITY, f64::NEG_INFINITY));
        if !sample.average.is_nan() {
            entry.0 = entry.0.min(sample.average);
            entry.1 = entry.1.max(sample.average);
        }
    }

    groups
        .into_iter()
        .map(|((latin_name, activity_type, feature), (min, max))| DependenceRange {
            latin_name: latin_name.to_string(),
            activity_type: activity_type.to_string(),
            feature: feature.to_string(),
            range: if min <= max { max - min } else { 0.0 },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample(feature: &str, average: f64) -> PartialDependenceSample {
        PartialDependenceSample {
            latin_name: "Myotis daubentonii".into(),
            activity_type: "Foraging".into(),
            feature: feature.into(),
            value: 0.0,
            average,
        }
    }

    #[test]
    fn test_range_of_curve() {
        let ranges = compute_dependence_ranges(&[
            sample("distance_to_water", 0.1),
            sample("distance_to_water", 0.4),
            sample("distance_to_water", 0.2),
        ]);
        assert_eq!(ranges.len(), 1);
        assert_abs_diff_eq!(ranges[0].range, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_and_single_sample() {
        assert!(compute_dependence_ranges(&[]).is_empty());
        let ranges = compute_dependence_ranges(&[sample("woodland_cover", 0.7)]);
        assert_eq!(ranges[0].range, 0.0);
    }

    #[test]
    fn test_sorted_by_key_and_non_negative() {
        let mut samples = vec![
            sample("woodland_cover", 0.3),
            sample("arable", -0.2),
            sample("arable", 0.1),
            sample("woodland_cover", 0.3),
        ];
        samples[0].latin_name = "Pipistrellus pipistrellus".into();

        let ranges = compute_dependence_ranges(&samples);
        let keys: Vec<_> = ranges
            .iter()
            .map(|r| (r.latin_name.as_str(), r.feature.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Myotis daubentonii", "arable"),
                ("Myotis daubentonii", "woodland_cover"),
                ("Pipistrellus pipistrellus", "woodland_cover"),
            ]
        );
        assert!(ranges.iter().all(|r| r.range >= 0.0));
        assert_abs_diff_eq!(ranges[0].range, 0.3, epsilon = 1e-12);
        assert_eq!(ranges[1].range, 0.0);
    }

    #[test]
    fn test_nan_averages_ignored() {
        let ranges = compute_dependence_ranges(&[sample("a", f64::NAN), sample("a", 0.5)]);
        assert_eq!(ranges[0].range, 0.0);
        let ranges = compute_dependence_ranges(&[sample("b", f64::NAN)]);
        assert_eq!(ranges[0].range, 0.0);
    }
}
