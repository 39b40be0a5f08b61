//! A GeoTIFF reader for (cloud-optimised) multi-band prediction rasters.
//!
//! Pixel data is decoded by the `tiff` crate (strips or tiles, DEFLATE, LZW
//! or PackBits, with predictors); georeferencing comes from the GeoTIFF tags
//! and band names from GDAL's metadata. Only pixel-interleaved bands are read,
//! which is GDAL's default layout for multi-band files.

pub mod error;
pub mod keys;

pub use error::TiffError;
pub use keys::{GeoTags, GeoTransform};

use std::io::Cursor;

use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;

use error::Result;

const PLANAR_SEPARATE: u32 = 2;

/// A decoded GeoTIFF.
#[derive(Debug, Clone)]
pub struct GeoTiff {
    pub width: usize,
    pub height: usize,
    /// One row-major plane per band, raw sample values
    pub bands: Vec<Vec<f64>>,
    /// Band descriptions, `band_<n>` (1-based) where GDAL stored none
    pub band_names: Vec<String>,
    pub transform: GeoTransform,
    pub epsg: u32,
    pub nodata: Option<f64>,
}

impl GeoTiff {
    /// Decode the first image of an in-memory file.
    pub fn decode(file: &[u8]) -> Result<Self> {
        let mut decoder = Decoder::new(Cursor::new(file))?.with_limits(Limits::unlimited());

        let (width, height) = decoder.dimensions()?;
        let (width, height) = (width as usize, height as usize);
        if width == 0 || height == 0 {
            return Err(TiffError::Decode(format!("empty image {}x{}", width, height)));
        }

        let samples = match decoder.find_tag(Tag::SamplesPerPixel)? {
            Some(value) => value.into_u32()? as usize,
            None => 1,
        };
        let planar = match decoder.find_tag(Tag::PlanarConfiguration)? {
            Some(value) => value.into_u32()?,
            None => 1,
        };
        if samples > 1 && planar == PLANAR_SEPARATE {
            return Err(TiffError::Unsupported(
                "band-separate (planar) multi-band layout".into(),
            ));
        }

        let tags = GeoTags::read(&mut decoder)?;
        let pixels = samples_to_f64(decoder.read_image()?)?;
        if pixels.len() != width * height * samples {
            return Err(TiffError::Decode(format!(
                "decoded {} samples, expected {}x{}x{}",
                pixels.len(),
                width,
                height,
                samples
            )));
        }
        let bands = deinterleave(&pixels, samples);

        let descriptions = tags.band_descriptions()?;
        let band_names = (0..samples)
            .map(|i| {
                descriptions
                    .get(&i)
                    .filter(|d| !d.trim().is_empty())
                    .cloned()
                    .unwrap_or_else(|| format!("band_{}", i + 1))
            })
            .collect();

        Ok(Self {
            width,
            height,
            bands,
            band_names,
            transform: tags.geo_transform()?,
            epsg: tags.epsg_code()?,
            nodata: tags.nodata(),
        })
    }
}

fn samples_to_f64(result: DecodingResult) -> Result<Vec<f64>> {
    fn widen<T: Copy + Into<f64>>(buf: Vec<T>) -> Vec<f64> {
        buf.into_iter().map(Into::into).collect()
    }

    Ok(match result {
        DecodingResult::U8(buf) => widen(buf),
        DecodingResult::U16(buf) => widen(buf),
        DecodingResult::U32(buf) => widen(buf),
        DecodingResult::I8(buf) => widen(buf),
        DecodingResult::I16(buf) => widen(buf),
        DecodingResult::I32(buf) => widen(buf),
        DecodingResult::F32(buf) => widen(buf),
        DecodingResult::F64(buf) => buf,
        _ => {
            return Err(TiffError::Unsupported(
                "64-bit integer samples".into(),
            ))
        }
    })
}

/// Split pixel-interleaved samples into one plane per band.
fn deinterleave(pixels: &[f64], samples: usize) -> Vec<Vec<f64>> {
    if samples == 1 {
        return vec![pixels.to_vec()];
    }
    (0..samples)
        .map(|band| pixels.iter().skip(band).step_by(samples).copied().collect())
        .collect()
}
