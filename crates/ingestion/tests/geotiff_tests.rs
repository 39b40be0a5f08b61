//! Prediction GeoTIFF decoding against files written with `tiff::encoder` via test-utils.

use approx::assert_abs_diff_eq;
use hsm_common::{BoundingBox, CrsCode, RowOrder};
use ingestion::parse_predictions;
use test_utils::{indexed_grid, stored_prediction_grid, GeoTiffBuilder, SampleType, TiffCompression};

const ORIGIN: (f64, f64) = (410000.0, 420000.0);

fn assert_scaled(actual: &[f32], stored: &[f64]) {
    assert_eq!(actual.len(), stored.len());
    for (a, s) in actual.iter().zip(stored) {
        if *s < 0.0 {
            assert!(a.is_nan(), "expected no-data, found {}", a);
        } else {
            assert_abs_diff_eq!(*a, (*s / 100.0) as f32, epsilon = 1e-4);
        }
    }
}

// ============================================================================
// Layouts
// ============================================================================

#[test]
fn test_strips_uncompressed_float() {
    let a = stored_prediction_grid(4, 3);
    let b = vec![50.0; 12];
    let tiff = GeoTiffBuilder::new(4, 3, ORIGIN, 100.0)
        .band("Myotis daubentonii_Foraging", a.clone())
        .band("Pipistrellus pipistrellus_Roost", b.clone())
        .build();

    let raster = parse_predictions(&tiff).unwrap();
    assert_eq!((raster.width, raster.height), (4, 3));
    assert_eq!(raster.crs, CrsCode::Epsg27700);
    assert_eq!(raster.row_order, RowOrder::NorthUp);
    assert!(raster
        .bounds
        .approx_eq(&BoundingBox::new(410000.0, 419700.0, 410400.0, 420000.0), 1e-9));
    assert_eq!(
        raster.band_names().collect::<Vec<_>>(),
        vec!["Myotis daubentonii_Foraging", "Pipistrellus pipistrellus_Roost"]
    );
    assert_scaled(&raster.bands[0].values, &a);
    assert_scaled(&raster.bands[1].values, &b);
}

#[test]
fn test_deflate_strips_with_partial_last_strip() {
    let grid = indexed_grid(20, 18);
    let tiff = GeoTiffBuilder::new(20, 18, ORIGIN, 50.0)
        .band("a", grid.clone())
        .rows_per_strip(4)
        .compression(TiffCompression::Deflate)
        .build();

    let raster = parse_predictions(&tiff).unwrap();
    assert_eq!((raster.width, raster.height), (20, 18));
    assert_scaled(&raster.bands[0].values, &grid);
}

#[test]
fn test_interleaved_lzw_int16_with_predictor() {
    let a = stored_prediction_grid(7, 5);
    let b: Vec<f64> = (0..35).map(|i| (i % 101) as f64).collect();
    let tiff = GeoTiffBuilder::new(7, 5, ORIGIN, 100.0)
        .band("a", a.clone())
        .band("b", b.clone())
        .sample_type(SampleType::I16)
        .compression(TiffCompression::Lzw)
        .horizontal_predictor()
        .rows_per_strip(2)
        .build();

    let raster = parse_predictions(&tiff).unwrap();
    assert_scaled(&raster.bands[0].values, &a);
    assert_scaled(&raster.bands[1].values, &b);
}

#[test]
fn test_chunky_u8_with_nodata_tag() {
    let values = vec![0.0, 255.0, 100.0, 42.0];
    let tiff = GeoTiffBuilder::new(2, 2, ORIGIN, 100.0)
        .band("a", values)
        .sample_type(SampleType::U8)
        .nodata("255")
        .build();

    let band = &parse_predictions(&tiff).unwrap().bands[0];
    assert_eq!(band.values[0], 0.0);
    assert!(band.values[1].is_nan());
    assert_abs_diff_eq!(band.values[2], 1.0);
    assert_abs_diff_eq!(band.values[3], 0.42, epsilon = 1e-6);
}

#[test]
fn test_float64_samples() {
    let grid = stored_prediction_grid(5, 4);
    let tiff = GeoTiffBuilder::new(5, 4, ORIGIN, 100.0)
        .band("a", grid.clone())
        .sample_type(SampleType::F64)
        .compression(TiffCompression::Deflate)
        .build();
    assert_scaled(&parse_predictions(&tiff).unwrap().bands[0].values, &grid);
}

// ============================================================================
// Georeferencing
// ============================================================================

#[test]
fn test_south_up_raster() {
    let grid = indexed_grid(3, 2);
    let tiff = GeoTiffBuilder::new(3, 2, ORIGIN, 100.0)
        .band("a", grid.clone())
        .south_up()
        .build();

    let raster = parse_predictions(&tiff).unwrap();
    assert_eq!(raster.row_order, RowOrder::SouthUp);
    assert!(raster
        .bounds
        .approx_eq(&BoundingBox::new(410000.0, 419800.0, 410300.0, 420000.0), 1e-9));
    // Stored row 0 is the southern row of the input
    assert_scaled(&raster.bands[0].values[..3], &grid[3..]);
}

#[test]
fn test_pixel_is_point_matches_area_bounds() {
    let area = GeoTiffBuilder::new(4, 4, ORIGIN, 100.0).band("a", vec![1.0; 16]);
    let point = area.clone().pixel_is_point();

    let area_bounds = parse_predictions(&area.build()).unwrap().bounds;
    let point_bounds = parse_predictions(&point.build()).unwrap().bounds;
    assert!(area_bounds.approx_eq(&point_bounds, 1e-9));
}

#[test]
fn test_geographic_raster() {
    let tiff = GeoTiffBuilder::new(10, 5, (-1.83, 53.66), 0.01)
        .band("a", vec![10.0; 50])
        .epsg(4326)
        .build();
    let raster = parse_predictions(&tiff).unwrap();
    assert_eq!(raster.crs, CrsCode::Epsg4326);
    assert!(raster.bounds.approx_eq(&BoundingBox::new(-1.83, 53.61, -1.73, 53.66), 1e-9));
}

// ============================================================================
// Band names and failures
// ============================================================================

#[test]
fn test_missing_descriptions_fall_back_to_index() {
    let tiff = GeoTiffBuilder::new(2, 1, ORIGIN, 100.0)
        .band("named", vec![1.0, 2.0])
        .unnamed_band(vec![3.0, 4.0])
        .build();
    let raster = parse_predictions(&tiff).unwrap();
    assert_eq!(raster.band_names().collect::<Vec<_>>(), vec!["named", "band_2"]);
}

#[test]
fn test_all_nodata_band_is_kept() {
    let tiff = GeoTiffBuilder::new(2, 2, ORIGIN, 100.0)
        .band("empty", vec![-1.0; 4])
        .build();
    let raster = parse_predictions(&tiff).unwrap();
    assert_eq!(raster.bands[0].valid_count(), 0);
}

#[test]
fn test_unsupported_crs_is_projection_error() {
    let tiff = GeoTiffBuilder::new(2, 2, ORIGIN, 100.0)
        .band("a", vec![1.0; 4])
        .epsg(2154)
        .build();
    assert_eq!(parse_predictions(&tiff).unwrap_err().kind(), "ProjectionError");
}

#[test]
fn test_garbage_is_parse_error() {
    let err = parse_predictions(b"definitely not a tiff").unwrap_err();
    assert_eq!(err.kind(), "ParseError");

    let mut truncated = GeoTiffBuilder::new(8, 8, ORIGIN, 100.0)
        .band("a", vec![1.0; 64])
        .build();
    truncated.truncate(40);
    assert_eq!(parse_predictions(&truncated).unwrap_err().kind(), "ParseError");
}
