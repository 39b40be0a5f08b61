//! GeoTIFF georeferencing and GDAL metadata.
//!
//! Reads tags 33550 (ModelPixelScale), 33922 (ModelTiepoint), 34264
//! (ModelTransformation), 34735 (GeoKeyDirectory), 42112 (GDAL_METADATA) and
//! 42113 (GDAL_NODATA).

use std::collections::BTreeMap;
use std::io::{Read, Seek};

use quick_xml::events::Event;
use quick_xml::Reader;
use tiff::decoder::Decoder;
use tiff::tags::Tag;

use super::error::{Result, TiffError};

/// GeoTIFF and GDAL tag codes.
pub mod tags {
    pub const MODEL_PIXEL_SCALE: u16 = 33550;
    pub const MODEL_TIEPOINT: u16 = 33922;
    pub const MODEL_TRANSFORMATION: u16 = 34264;
    pub const GEO_KEY_DIRECTORY: u16 = 34735;
    pub const GDAL_METADATA: u16 = 42112;
    pub const GDAL_NODATA: u16 = 42113;
}

/// GeoKey IDs used here.
pub mod geokeys {
    pub const MODEL_TYPE: u16 = 1024;
    pub const RASTER_TYPE: u16 = 1025;
    pub const GEOGRAPHIC_TYPE: u16 = 2048;
    pub const PROJECTED_CS_TYPE: u16 = 3072;
}

pub const RASTER_PIXEL_IS_POINT: u16 = 2;
const USER_DEFINED: u16 = 32767;

/// The `tiff` crate names some GeoTIFF tags; resolve the code the same way
/// its directory does so lookups match either way.
pub fn tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

/// Affine mapping from pixel corner `(col, row)` to model coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    /// Negative for the usual north-up layout
    pub pixel_height: f64,
    pub row_rotation: f64,
    pub col_rotation: f64,
}

impl GeoTransform {
    pub fn is_rotated(&self) -> bool {
        self.row_rotation != 0.0 || self.col_rotation != 0.0
    }

    /// Outer edges `(min_x, min_y, max_x, max_y)` of a `width` x `height` grid.
    pub fn bounds(&self, width: usize, height: usize) -> (f64, f64, f64, f64) {
        let x1 = self.origin_x + width as f64 * self.pixel_width;
        let y1 = self.origin_y + height as f64 * self.pixel_height;
        (
            self.origin_x.min(x1),
            self.origin_y.min(y1),
            self.origin_x.max(x1),
            self.origin_y.max(y1),
        )
    }
}

/// Raw georeferencing and GDAL tags of the first image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoTags {
    pub pixel_scale: Option<Vec<f64>>,
    pub tiepoint: Option<Vec<f64>>,
    pub transformation: Option<Vec<f64>>,
    pub key_directory: Vec<u32>,
    pub gdal_metadata: Option<String>,
    pub gdal_nodata: Option<String>,
}

impl GeoTags {
    pub fn read<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Self> {
        let mut doubles = |code: u16| -> Result<Option<Vec<f64>>> {
            Ok(match decoder.find_tag(tag(code))? {
                Some(value) => Some(value.into_f64_vec()?),
                None => None,
            })
        };
        let pixel_scale = doubles(tags::MODEL_PIXEL_SCALE)?;
        let tiepoint = doubles(tags::MODEL_TIEPOINT)?;
        let transformation = doubles(tags::MODEL_TRANSFORMATION)?;

        let key_directory = match decoder.find_tag(tag(tags::GEO_KEY_DIRECTORY))? {
            Some(value) => value.into_u32_vec()?,
            None => Vec::new(),
        };

        let mut ascii = |code: u16| -> Result<Option<String>> {
            Ok(match decoder.find_tag(tag(code))? {
                Some(value) => Some(value.into_string()?),
                None => None,
            })
        };

        Ok(Self {
            pixel_scale,
            tiepoint,
            transformation,
            key_directory,
            gdal_metadata: ascii(tags::GDAL_METADATA)?,
            gdal_nodata: ascii(tags::GDAL_NODATA)?,
        })
    }

    /// GeoKeys stored inline in the directory: key ID to SHORT value.
    pub fn geo_keys(&self) -> BTreeMap<u16, u16> {
        let dir = &self.key_directory;
        let mut keys = BTreeMap::new();
        if dir.len() < 4 {
            return keys;
        }

        let num_keys = dir[3] as usize;
        for entry in dir[4..].chunks_exact(4).take(num_keys) {
            let (key_id, location, value) = (entry[0] as u16, entry[1], entry[3] as u16);
            if location == 0 {
                keys.insert(key_id, value);
            }
        }
        keys
    }

    /// Geotransform from ModelPixelScale + ModelTiepoint, or ModelTransformation.
    pub fn geo_transform(&self) -> Result<GeoTransform> {
        let mut transform = match (
            self.pixel_scale.as_deref(),
            self.tiepoint.as_deref(),
            self.transformation.as_deref(),
        ) {
            (Some(scale), Some(tie), _) if scale.len() >= 2 && tie.len() >= 6 => GeoTransform {
                origin_x: tie[3] - tie[0] * scale[0],
                origin_y: tie[4] + tie[1] * scale[1],
                pixel_width: scale[0],
                pixel_height: -scale[1],
                row_rotation: 0.0,
                col_rotation: 0.0,
            },
            (_, _, Some(t)) if t.len() >= 16 => GeoTransform {
                origin_x: t[3],
                origin_y: t[7],
                pixel_width: t[0],
                pixel_height: t[5],
                row_rotation: t[1],
                col_rotation: t[4],
            },
            _ => {
                return Err(TiffError::Georeference(
                    "no ModelPixelScale/ModelTiepoint or ModelTransformation tags".into(),
                ))
            }
        };

        if self.geo_keys().get(&geokeys::RASTER_TYPE) == Some(&RASTER_PIXEL_IS_POINT) {
            // Tie points address pixel centres; shift to the outer corner
            transform.origin_x -= transform.pixel_width / 2.0;
            transform.origin_y -= transform.pixel_height / 2.0;
        }

        if transform.pixel_width == 0.0 || transform.pixel_height == 0.0 {
            return Err(TiffError::Georeference("zero pixel size".into()));
        }
        Ok(transform)
    }

    /// EPSG code from ProjectedCSTypeGeoKey, falling back to GeographicTypeGeoKey.
    pub fn epsg_code(&self) -> Result<u32> {
        let keys = self.geo_keys();
        [geokeys::PROJECTED_CS_TYPE, geokeys::GEOGRAPHIC_TYPE]
            .iter()
            .filter_map(|k| keys.get(k))
            .find(|&&code| code > 0 && code != USER_DEFINED)
            .map(|&code| code as u32)
            .ok_or_else(|| TiffError::Georeference("no EPSG code in GeoKeyDirectory".into()))
    }

    /// GDAL_NODATA value, if present and numeric.
    pub fn nodata(&self) -> Option<f64> {
        self.gdal_nodata
            .as_deref()?
            .trim_matches(|c: char| c.is_whitespace() || c == '\0')
            .parse()
            .ok()
    }

    /// Band descriptions from GDAL_METADATA, keyed by zero-based sample index.
    pub fn band_descriptions(&self) -> Result<BTreeMap<usize, String>> {
        match &self.gdal_metadata {
            Some(xml) => parse_gdal_metadata(xml.trim_end_matches('\0')),
            None => Ok(BTreeMap::new()),
        }
    }
}

/// Extract `<Item name="DESCRIPTION" sample="n" role="description">` values.
pub fn parse_gdal_metadata(xml: &str) -> Result<BTreeMap<usize, String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut descriptions = BTreeMap::new();
    let mut current: Option<usize> = None;

    loop {
        match reader.read_event().map_err(|e| TiffError::Metadata(e.to_string()))? {
            Event::Start(e) if e.name().as_ref() == b"Item" => {
                let mut name = None;
                let mut sample = None;
                for attr in e.attributes() {
                    let attr = attr.map_err(|e| TiffError::Metadata(e.to_string()))?;
                    let value = attr.unescape_value().map_err(|e| TiffError::Metadata(e.to_string()))?;
                    match attr.key.as_ref() {
                        b"name" => name = Some(value.into_owned()),
                        b"sample" => sample = value.parse::<usize>().ok(),
                        _ => {}
                    }
                }
                current = match (name.as_deref(), sample) {
                    (Some("DESCRIPTION"), Some(sample)) => Some(sample),
                    _ => None,
                };
            }
            Event::Text(text) => {
                if let Some(sample) = current {
                    let value = text.unescape().map_err(|e| TiffError::Metadata(e.to_string()))?;
                    descriptions.insert(sample, value.into_owned());
                }
            }
            Event::End(_) => current = None,
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(descriptions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gdal_metadata() {
        let xml = r#"<GDALMetadata>
  <Item name="AREA_OR_POINT">Area</Item>
  <Item name="DESCRIPTION" sample="0" role="description">Myotis daubentonii_Foraging</Item>
  <Item name="DESCRIPTION" sample="1" role="description">Pipistrellus &amp; co_Roost</Item>
</GDALMetadata>"#;
        let descriptions = parse_gdal_metadata(xml).unwrap();
        assert_eq!(descriptions.len(), 2);
        assert_eq!(descriptions[&0], "Myotis daubentonii_Foraging");
        assert_eq!(descriptions[&1], "Pipistrellus & co_Roost");
    }

    #[test]
    fn test_empty_metadata() {
        assert!(parse_gdal_metadata("<GDALMetadata></GDALMetadata>").unwrap().is_empty());
    }

    fn bng_tags() -> GeoTags {
        GeoTags {
            pixel_scale: Some(vec![100.0, 100.0, 0.0]),
            tiepoint: Some(vec![0.0, 0.0, 0.0, 430_000.0, 400_000.0, 0.0]),
            key_directory: vec![1, 1, 0, 2, 1024, 0, 1, 1, 3072, 0, 1, 27700],
            ..GeoTags::default()
        }
    }

    #[test]
    fn test_tiepoint_transform_and_epsg() {
        let tags = bng_tags();
        let gt = tags.geo_transform().unwrap();
        assert_eq!((gt.origin_x, gt.origin_y), (430_000.0, 400_000.0));
        assert_eq!((gt.pixel_width, gt.pixel_height), (100.0, -100.0));
        assert_eq!(tags.epsg_code().unwrap(), 27700);
    }

    #[test]
    fn test_pixel_is_point_shifts_origin() {
        let mut tags = bng_tags();
        tags.key_directory = vec![1, 1, 0, 2, 1025, 0, 1, 2, 3072, 0, 1, 27700];
        let gt = tags.geo_transform().unwrap();
        assert_eq!((gt.origin_x, gt.origin_y), (429_950.0, 400_050.0));
    }

    #[test]
    fn test_user_defined_crs_falls_back_to_geographic() {
        let mut tags = bng_tags();
        tags.key_directory = vec![1, 1, 0, 2, 2048, 0, 1, 4326, 3072, 0, 1, 32767];
        assert_eq!(tags.epsg_code().unwrap(), 4326);

        tags.key_directory.clear();
        assert!(matches!(tags.epsg_code(), Err(TiffError::Georeference(_))));
    }

    #[test]
    fn test_missing_georeferencing() {
        let tags = GeoTags::default();
        assert!(matches!(tags.geo_transform(), Err(TiffError::Georeference(_))));
    }

    #[test]
    fn test_nodata_parsing() {
        let mut tags = GeoTags::default();
        assert_eq!(tags.nodata(), None);
        tags.gdal_nodata = Some("-9999\0".into());
        assert_eq!(tags.nodata(), Some(-9999.0));
        tags.gdal_nodata = Some("nan-ish".into());
        assert_eq!(tags.nodata(), None);
    }

    #[test]
    fn test_bounds_north_up() {
        let gt = GeoTransform {
            origin_x: 430_000.0,
            origin_y: 400_000.0,
            pixel_width: 100.0,
            pixel_height: -100.0,
            row_rotation: 0.0,
            col_rotation: 0.0,
        };
        assert_eq!(gt.bounds(10, 5), (430_000.0, 399_500.0, 431_000.0, 400_000.0));
        assert!(!gt.is_rotated());
    }
}
