//! Model results table (`results.csv`).

use std::collections::HashSet;

use hsm_common::{HsmError, HsmResult, ModelResult};

const ARTIFACT: &str = "model results";

/// Parse the results CSV. Columns beyond the `ModelResult` fields are
/// ignored; a repeated (species, activity type) pair is rejected.
pub fn parse_results(bytes: &[u8]) -> HsmResult<Vec<ModelResult>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let mut results = Vec::new();
    let mut seen = HashSet::new();
    for (row, record) in reader.deserialize::<ModelResult>().enumerate() {
        // +2: header line plus 1-based numbering
        let result =
            record.map_err(|e| HsmError::parse(ARTIFACT, format!("row {}: {}", row + 2, e)))?;
        validate(&result, row + 2)?;
        if !seen.insert(result.key()) {
            return Err(HsmError::parse(
                ARTIFACT,
                format!(
                    "duplicate model for '{}' / '{}'",
                    result.latin_name, result.activity_type
                ),
            ));
        }
        results.push(result);
    }
    Ok(results)
}

fn validate(result: &ModelResult, line: usize) -> HsmResult<()> {
    let problem = if !(0.0..=1.0).contains(&result.mean_cv_score) {
        Some(format!("mean_cv_score {} outside 0..1", result.mean_cv_score))
    } else if !result.std_cv_score.is_finite() || result.std_cv_score < 0.0 {
        Some(format!("invalid std_cv_score {}", result.std_cv_score))
    } else if result.folds == 0 {
        Some("folds must be at least 1".to_string())
    } else if result.band_name.is_empty() {
        Some("empty band_name".to_string())
    } else {
        None
    };
    match problem {
        Some(message) => Err(HsmError::parse(ARTIFACT, format!("row {}: {}", line, message))),
        None => Ok(()),
    }
}
