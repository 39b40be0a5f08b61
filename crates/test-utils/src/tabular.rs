//! CSV, Parquet and GeoParquet fixture encoders.

use std::sync::Arc;

use arrow::array::{ArrayRef, BinaryArray, DictionaryArray, Float64Array, StringArray};
use arrow::datatypes::Int32Type;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use hsm_common::{ModelResult, PartialDependenceSample};
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use parquet::format::KeyValue;
use serde_json::json;

/// `results.csv` for the given models, with one trailing column the loader
/// must ignore.
pub fn results_csv(results: &[ModelResult]) -> Vec<u8> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "latin_name",
            "activity_type",
            "mean_cv_score",
            "std_cv_score",
            "n_presence",
            "n_background",
            "folds",
            "band_name",
            "model_file",
        ])
        .expect("csv header");
    for r in results {
        writer
            .write_record([
                r.latin_name.clone(),
                r.activity_type.clone(),
                r.mean_cv_score.to_string(),
                r.std_cv_score.to_string(),
                r.n_presence.to_string(),
                r.n_background.to_string(),
                r.folds.to_string(),
                r.band_name.clone(),
                format!("models/{}.pkl", r.band_name),
            ])
            .expect("csv row");
    }
    writer.into_inner().expect("csv flush")
}

/// Write one record batch to Parquet with optional footer metadata.
pub fn write_parquet(batch: &RecordBatch, metadata: Vec<(String, String)>) -> Bytes {
    let properties = WriterProperties::builder()
        .set_key_value_metadata(Some(
            metadata
                .into_iter()
                .map(|(k, v)| KeyValue::new(k, v))
                .collect(),
        ))
        .build();
    let mut buffer = Vec::new();
    let mut writer =
        ArrowWriter::try_new(&mut buffer, batch.schema(), Some(properties)).expect("parquet writer");
    writer.write(batch).expect("parquet write");
    writer.close().expect("parquet close");
    Bytes::from(buffer)
}

fn strings(values: impl IntoIterator<Item = String>) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(values))
}

/// Partial-dependence table as written by pandas, `latin_name` and
/// `activity_type` as categoricals (dictionary encoded).
pub fn partial_dependence_parquet(samples: &[PartialDependenceSample]) -> Bytes {
    let latin: DictionaryArray<Int32Type> = samples.iter().map(|s| s.latin_name.as_str()).collect();
    let activity: DictionaryArray<Int32Type> =
        samples.iter().map(|s| s.activity_type.as_str()).collect();
    let batch = RecordBatch::try_from_iter(vec![
        ("latin_name", Arc::new(latin) as ArrayRef),
        ("activity_type", Arc::new(activity) as ArrayRef),
        ("feature", strings(samples.iter().map(|s| s.feature.clone()))),
        (
            "values",
            Arc::new(Float64Array::from_iter_values(samples.iter().map(|s| s.value))) as ArrayRef,
        ),
        (
            "average",
            Arc::new(Float64Array::from_iter_values(samples.iter().map(|s| s.average))) as ArrayRef,
        ),
    ])
    .expect("partial dependence batch");
    write_parquet(&batch, Vec::new())
}

/// WKB (little-endian ISO) for a point.
pub fn wkb_point(x: f64, y: f64) -> Vec<u8> {
    let mut out = vec![1u8];
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&x.to_le_bytes());
    out.extend_from_slice(&y.to_le_bytes());
    out
}

/// WKB for a polygon with a single (closed) exterior ring.
pub fn wkb_polygon(ring: &[(f64, f64)]) -> Vec<u8> {
    let mut out = vec![1u8];
    out.extend_from_slice(&3u32.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&(ring.len() as u32).to_le_bytes());
    for (x, y) in ring {
        out.extend_from_slice(&x.to_le_bytes());
        out.extend_from_slice(&y.to_le_bytes());
    }
    out
}

/// WKB for a multipolygon of single-ring polygons.
pub fn wkb_multipolygon(rings: &[Vec<(f64, f64)>]) -> Vec<u8> {
    let mut out = vec![1u8];
    out.extend_from_slice(&6u32.to_le_bytes());
    out.extend_from_slice(&(rings.len() as u32).to_le_bytes());
    for ring in rings {
        out.extend_from_slice(&wkb_polygon(ring));
    }
    out
}

/// Closed square ring with lower-left corner `(x, y)`.
pub fn square(x: f64, y: f64, size: f64) -> Vec<(f64, f64)> {
    vec![
        (x, y),
        (x + size, y),
        (x + size, y + size),
        (x, y + size),
        (x, y),
    ]
}

/// The `geo` footer document for a WKB `geometry` column. `epsg = None`
/// omits the CRS (meaning OGC:CRS84).
pub fn geo_metadata(epsg: Option<u32>, geometry_types: &[&str]) -> String {
    let mut column = json!({
        "encoding": "WKB",
        "geometry_types": geometry_types,
    });
    if let Some(code) = epsg {
        column["crs"] = json!({
            "$schema": "https://proj.org/schemas/v0.7/projjson.schema.json",
            "type": "ProjectedCRS",
            "name": format!("EPSG:{}", code),
            "id": { "authority": "EPSG", "code": code },
        });
    }
    json!({
        "version": "1.0.0",
        "primary_column": "geometry",
        "columns": { "geometry": column },
    })
    .to_string()
}

/// Training records GeoParquet: `(latin_name, activity_type, x, y)` rows in
/// the given CRS.
pub fn training_geoparquet(rows: &[(&str, &str, f64, f64)], epsg: Option<u32>) -> Bytes {
    let geometry: Vec<Vec<u8>> = rows.iter().map(|(_, _, x, y)| wkb_point(*x, *y)).collect();
    let batch = RecordBatch::try_from_iter(vec![
        ("latin_name", strings(rows.iter().map(|r| r.0.to_string()))),
        ("activity_type", strings(rows.iter().map(|r| r.1.to_string()))),
        (
            "geometry",
            Arc::new(BinaryArray::from_iter_values(geometry.iter())) as ArrayRef,
        ),
    ])
    .expect("training batch");
    write_parquet(
        &batch,
        vec![("geo".to_string(), geo_metadata(epsg, &["Point"]))],
    )
}

/// Boundary GeoParquet from pre-encoded WKB rows.
pub fn boundary_geoparquet(geometries: &[Vec<u8>], epsg: Option<u32>) -> Bytes {
    let batch = RecordBatch::try_from_iter(vec![
        ("name", strings((0..geometries.len()).map(|i| format!("district_{}", i)))),
        (
            "geometry",
            Arc::new(BinaryArray::from_iter_values(geometries.iter())) as ArrayRef,
        ),
    ])
    .expect("boundary batch");
    write_parquet(
        &batch,
        vec![(
            "geo".to_string(),
            geo_metadata(epsg, &["Polygon", "MultiPolygon"]),
        )],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wkb_point_layout() {
        let wkb = wkb_point(1.0, 2.0);
        assert_eq!(wkb.len(), 21);
        assert_eq!(wkb[0], 1);
    }

    #[test]
    fn test_geo_metadata_without_crs() {
        let meta: serde_json::Value = serde_json::from_str(&geo_metadata(None, &["Point"])).unwrap();
        assert_eq!(meta["primary_column"], "geometry");
        assert!(meta["columns"]["geometry"].get("crs").is_none());
    }

    #[test]
    fn test_results_csv_header() {
        let csv = String::from_utf8(results_csv(&[])).unwrap();
        assert!(csv.starts_with("latin_name,activity_type,mean_cv_score"));
    }
}
