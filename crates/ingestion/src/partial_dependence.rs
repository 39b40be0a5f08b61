//! Partial-dependence curves (`partial-dependence-data.parquet`).

use bytes::Bytes;
use hsm_common::{HsmResult, PartialDependenceSample};

use crate::table::ParquetTable;

const ARTIFACT: &str = "partial dependence";

/// Parse the partial-dependence table. The input value column is named
/// `values` in the stored file.
pub fn parse_partial_dependence(bytes: Bytes) -> HsmResult<Vec<PartialDependenceSample>> {
    let table = ParquetTable::read(ARTIFACT, bytes)?;
    let latin_names = table.strings("latin_name")?;
    let activity_types = table.strings("activity_type")?;
    let features = table.strings("feature")?;
    let values = table.floats("values")?;
    let averages = table.floats("average")?;

    Ok(latin_names
        .into_iter()
        .zip(activity_types)
        .zip(features)
        .zip(values)
        .zip(averages)
        .map(
            |((((latin_name, activity_type), feature), value), average)| PartialDependenceSample {
                latin_name,
                activity_type,
                feature,
                value,
                average,
            },
        )
        .collect())
}
