//! Species occurrence records used to train the models.

use bytes::Bytes;
use geo::{Geometry, Point};
use hsm_common::{HsmError, HsmResult, TrainingRecord};

use crate::geoparquet::GeoFrame;
use crate::wkb::geometry_type_name;

const ARTIFACT: &str = "training data";

/// Parse the training GeoParquet into display-CRS point records.
pub fn parse_training_data(bytes: Bytes) -> HsmResult<Vec<TrainingRecord>> {
    let frame = GeoFrame::read(ARTIFACT, bytes)?;
    let latin_names = frame.table.strings("latin_name")?;
    let activity_types = frame.table.strings("activity_type")?;
    let geometries = frame.display_geometries()?;

    latin_names
        .into_iter()
        .zip(activity_types)
        .zip(geometries)
        .enumerate()
        .map(|(row, ((latin_name, activity_type), geometry))| {
            Ok(TrainingRecord {
                latin_name,
                activity_type,
                location: as_point(geometry, row)?,
            })
        })
        .collect()
}

fn as_point(geometry: Geometry<f64>, row: usize) -> HsmResult<Point<f64>> {
    match geometry {
        Geometry::Point(p) if !p.x().is_nan() => Ok(p),
        Geometry::MultiPoint(mp) if mp.0.len() == 1 => Ok(mp.0[0]),
        other => Err(HsmError::parse(
            ARTIFACT,
            format!(
                "row {}: expected a point, found {}",
                row,
                geometry_type_name(&other)
            ),
        )),
    }
}
