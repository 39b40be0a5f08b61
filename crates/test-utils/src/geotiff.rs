//! GeoTIFF writer for decoder tests, built on `tiff::encoder`.
//!
//! Produces pixel-interleaved strips with the georeferencing tags GDAL writes
//! for a north-up raster (or a ModelTransformation for south-up grids), band
//! descriptions in GDAL_METADATA and an optional GDAL_NODATA string. The geo
//! tags go into the image directory as extra entries.

use std::io::Cursor;
use std::marker::PhantomData;

use tiff::encoder::colortype::ColorType;
use tiff::encoder::compression::{Compression, Deflate, Lzw, Uncompressed};
use tiff::encoder::{DirectoryEncoder, TiffEncoder, TiffKind, TiffValue};
use tiff::tags::{PhotometricInterpretation, Predictor, SampleFormat, Tag};

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_METADATA: u16 = 42112;
const GDAL_NODATA: u16 = 42113;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiffCompression {
    None,
    Deflate,
    Lzw,
}

/// On-disk sample type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    U8,
    I16,
    F32,
    F64,
}

impl SampleType {
    fn is_integer(self) -> bool {
        matches!(self, SampleType::U8 | SampleType::I16)
    }
}

/// A sample type the fixture writer can store.
pub trait Sample: TiffValue + Copy {
    const BITS: u16;
    const FORMAT: SampleFormat;

    fn from_f64(value: f64) -> Self;

    /// Difference from the previous sample of the same band.
    fn delta(self, previous: Self) -> Self;
}

macro_rules! integer_sample {
    ($ty:ty, $bits:expr, $format:expr) => {
        impl Sample for $ty {
            const BITS: u16 = $bits;
            const FORMAT: SampleFormat = $format;

            fn from_f64(value: f64) -> Self {
                value as $ty
            }

            fn delta(self, previous: Self) -> Self {
                self.wrapping_sub(previous)
            }
        }
    };
}

macro_rules! float_sample {
    ($ty:ty, $bits:expr) => {
        impl Sample for $ty {
            const BITS: u16 = $bits;
            const FORMAT: SampleFormat = SampleFormat::IEEEFP;

            fn from_f64(value: f64) -> Self {
                value as $ty
            }

            fn delta(self, _previous: Self) -> Self {
                panic!("horizontal differencing is only written for integer samples")
            }
        }
    };
}

integer_sample!(u8, 8, SampleFormat::Uint);
integer_sample!(i16, 16, SampleFormat::Int);
float_sample!(f32, 32);
float_sample!(f64, 64);

/// `N` gray bands of `T`, stored chunky.
struct Bands<T, const N: usize>(PhantomData<T>);

impl<T: Sample, const N: usize> ColorType for Bands<T, N> {
    type Inner = T;
    const TIFF_VALUE: PhotometricInterpretation = PhotometricInterpretation::BlackIsZero;
    const BITS_PER_SAMPLE: &'static [u16] = &[T::BITS; N];
    const SAMPLE_FORMAT: &'static [SampleFormat] = &[T::FORMAT; N];

    fn horizontal_predict(row: &[T], result: &mut Vec<T>) {
        let stride = N.min(row.len());
        result.extend_from_slice(&row[..stride]);
        result.extend(
            row.iter()
                .zip(&row[stride..])
                .map(|(previous, current)| current.delta(*previous)),
        );
    }
}

/// Builder for an in-memory GeoTIFF.
#[derive(Debug, Clone)]
pub struct GeoTiffBuilder {
    width: usize,
    height: usize,
    bands: Vec<(Option<String>, Vec<f64>)>,
    origin: (f64, f64),
    pixel_size: (f64, f64),
    epsg: u16,
    nodata: Option<String>,
    compression: TiffCompression,
    sample_type: SampleType,
    rows_per_strip: Option<usize>,
    predictor: bool,
    south_up: bool,
    pixel_is_point: bool,
}

impl GeoTiffBuilder {
    /// A `width` x `height` grid whose north-west corner is `origin` with
    /// square pixels of `pixel_size` units, in British National Grid.
    pub fn new(width: usize, height: usize, origin: (f64, f64), pixel_size: f64) -> Self {
        Self {
            width,
            height,
            bands: Vec::new(),
            origin,
            pixel_size: (pixel_size, pixel_size),
            epsg: 27700,
            nodata: None,
            compression: TiffCompression::None,
            sample_type: SampleType::F32,
            rows_per_strip: None,
            predictor: false,
            south_up: false,
            pixel_is_point: false,
        }
    }

    /// Add a band described as `name` in GDAL_METADATA. `values` are row-major
    /// with row 0 at the north edge.
    pub fn band(mut self, name: &str, values: Vec<f64>) -> Self {
        self.bands.push((Some(name.to_string()), values));
        self
    }

    /// Add a band without a description.
    pub fn unnamed_band(mut self, values: Vec<f64>) -> Self {
        self.bands.push((None, values));
        self
    }

    pub fn epsg(mut self, epsg: u16) -> Self {
        self.epsg = epsg;
        self
    }

    pub fn nodata(mut self, nodata: &str) -> Self {
        self.nodata = Some(nodata.to_string());
        self
    }

    pub fn compression(mut self, compression: TiffCompression) -> Self {
        self.compression = compression;
        self
    }

    pub fn sample_type(mut self, sample_type: SampleType) -> Self {
        self.sample_type = sample_type;
        self
    }

    pub fn rows_per_strip(mut self, rows: usize) -> Self {
        self.rows_per_strip = Some(rows);
        self
    }

    /// Horizontal differencing; integer sample types only.
    pub fn horizontal_predictor(mut self) -> Self {
        self.predictor = true;
        self
    }

    /// Store rows south to north with a positive pixel height.
    pub fn south_up(mut self) -> Self {
        self.south_up = true;
        self
    }

    /// Tag the raster as PixelIsPoint (tie point at the first pixel centre).
    pub fn pixel_is_point(mut self) -> Self {
        self.pixel_is_point = true;
        self
    }

    /// Encode the file.
    ///
    /// # Panics
    ///
    /// When no band was added, a band has the wrong number of cells, more
    /// than six bands were added or a predictor was asked for float samples.
    pub fn build(&self) -> Vec<u8> {
        assert!(!self.bands.is_empty(), "GeoTIFF needs at least one band");
        for (_, values) in &self.bands {
            assert_eq!(values.len(), self.width * self.height, "band size mismatch");
        }
        assert!(
            !self.predictor || self.sample_type.is_integer(),
            "horizontal predictor needs integer samples"
        );

        match self.sample_type {
            SampleType::U8 => self.build_samples::<u8>(),
            SampleType::I16 => self.build_samples::<i16>(),
            SampleType::F32 => self.build_samples::<f32>(),
            SampleType::F64 => self.build_samples::<f64>(),
        }
    }

    fn build_samples<T: Sample>(&self) -> Vec<u8>
    where
        [T]: TiffValue,
    {
        macro_rules! with_band_count {
            ($($n:literal),*) => {
                match self.bands.len() {
                    $($n => self.build_image::<Bands<T, $n>>(),)*
                    n => panic!("fixture writer supports up to 6 bands, got {}", n),
                }
            };
        }
        with_band_count!(1, 2, 3, 4, 5, 6)
    }

    fn build_image<C>(&self) -> Vec<u8>
    where
        C: ColorType,
        C::Inner: Sample,
        [C::Inner]: TiffValue,
    {
        match self.compression {
            TiffCompression::None => self.encode::<C, _>(Uncompressed),
            TiffCompression::Deflate => self.encode::<C, _>(Deflate::default()),
            TiffCompression::Lzw => self.encode::<C, _>(Lzw),
        }
    }

    fn encode<C, D>(&self, compression: D) -> Vec<u8>
    where
        C: ColorType,
        C::Inner: Sample,
        [C::Inner]: TiffValue,
        D: Compression,
    {
        let mut buf = Vec::new();
        {
            let mut encoder = TiffEncoder::new(Cursor::new(&mut buf)).expect("TIFF header");
            if self.predictor {
                encoder = encoder.with_predictor(Predictor::Horizontal);
            }
            let mut image = encoder
                .new_image_with_compression::<C, D>(
                    self.width as u32,
                    self.height as u32,
                    compression,
                )
                .expect("image directory");
            if let Some(rows) = self.rows_per_strip {
                image.rows_per_strip(rows as u32).expect("RowsPerStrip");
            }
            self.write_geo_tags(image.encoder());
            image
                .write_data(&self.interleaved::<C::Inner>())
                .expect("pixel data");
        }
        buf
    }

    fn write_geo_tags<W, K>(&self, dir: &mut DirectoryEncoder<'_, W, K>)
    where
        W: std::io::Write + std::io::Seek,
        K: TiffKind,
    {
        let (px, py) = self.pixel_size;
        let (ox, oy) = self.origin;
        if self.south_up {
            let south = oy - self.height as f64 * py;
            let matrix = [
                px, 0.0, 0.0, ox, 0.0, py, 0.0, south, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0,
            ];
            dir.write_tag(Tag::from_u16_exhaustive(MODEL_TRANSFORMATION), &matrix[..])
                .expect("ModelTransformation");
        } else {
            let (tie_x, tie_y) = if self.pixel_is_point {
                (ox + px / 2.0, oy - py / 2.0)
            } else {
                (ox, oy)
            };
            dir.write_tag(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE), &[px, py, 0.0][..])
                .expect("ModelPixelScale");
            dir.write_tag(
                Tag::from_u16_exhaustive(MODEL_TIEPOINT),
                &[0.0, 0.0, 0.0, tie_x, tie_y, 0.0][..],
            )
            .expect("ModelTiepoint");
        }

        dir.write_tag(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY), &self.geo_keys()[..])
            .expect("GeoKeyDirectory");
        if let Some(xml) = self.gdal_metadata() {
            dir.write_tag(Tag::from_u16_exhaustive(GDAL_METADATA), xml.as_str())
                .expect("GDAL_METADATA");
        }
        if let Some(nodata) = &self.nodata {
            dir.write_tag(Tag::from_u16_exhaustive(GDAL_NODATA), nodata.as_str())
                .expect("GDAL_NODATA");
        }
    }

    fn geo_keys(&self) -> [u16; 16] {
        let geographic = self.epsg == 4326;
        let model_type = if geographic { 2 } else { 1 };
        let raster_type = if self.pixel_is_point { 2 } else { 1 };
        let crs_key = if geographic { 2048 } else { 3072 };
        [
            1, 1, 0, 3, //
            1024, 0, 1, model_type, //
            1025, 0, 1, raster_type, //
            crs_key, 0, 1, self.epsg,
        ]
    }

    /// Pixel-interleaved samples in stored row order.
    fn interleaved<T: Sample>(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.width * self.height * self.bands.len());
        for y in 0..self.height {
            for x in 0..self.width {
                for band in 0..self.bands.len() {
                    out.push(T::from_f64(self.stored_value(band, x, y)));
                }
            }
        }
        out
    }

    /// Value stored at image position `(x, y)`, honouring south-up order.
    fn stored_value(&self, band: usize, x: usize, y: usize) -> f64 {
        let source_row = if self.south_up { self.height - 1 - y } else { y };
        self.bands[band].1[source_row * self.width + x]
    }

    fn gdal_metadata(&self) -> Option<String> {
        let items: String = self
            .bands
            .iter()
            .enumerate()
            .filter_map(|(i, (name, _))| {
                name.as_ref().map(|n| {
                    format!(
                        r#"<Item name="DESCRIPTION" sample="{}" role="description">{}</Item>"#,
                        i,
                        escape(n)
                    )
                })
            })
            .collect();
        (!items.is_empty()).then(|| format!("<GDALMetadata>{}</GDALMetadata>", items))
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiff::decoder::{Decoder, DecodingResult};

    #[test]
    fn test_writes_geo_tags_and_interleaved_samples() {
        let tiff = GeoTiffBuilder::new(2, 2, (100.0, 200.0), 10.0)
            .band("a & b", vec![1.0, 2.0, 3.0, 4.0])
            .unnamed_band(vec![5.0, 6.0, 7.0, 8.0])
            .nodata("-9999")
            .build();

        let mut decoder = Decoder::new(Cursor::new(tiff)).unwrap();
        assert_eq!(decoder.dimensions().unwrap(), (2, 2));

        let scale = decoder
            .find_tag(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE))
            .unwrap()
            .unwrap()
            .into_f64_vec()
            .unwrap();
        assert_eq!(scale, vec![10.0, 10.0, 0.0]);

        let metadata = decoder
            .find_tag(Tag::from_u16_exhaustive(GDAL_METADATA))
            .unwrap()
            .unwrap()
            .into_string()
            .unwrap();
        assert!(metadata.contains(r#"sample="0" role="description">a &amp; b</Item>"#));
        assert!(!metadata.contains(r#"sample="1""#));

        match decoder.read_image().unwrap() {
            DecodingResult::F32(samples) => {
                assert_eq!(samples, vec![1.0, 5.0, 2.0, 6.0, 3.0, 7.0, 4.0, 8.0]);
            }
            _ => panic!("expected f32 samples"),
        }
    }

    #[test]
    fn test_south_up_reverses_rows() {
        let tiff = GeoTiffBuilder::new(1, 3, (0.0, 30.0), 10.0)
            .band("a", vec![1.0, 2.0, 3.0])
            .sample_type(SampleType::U8)
            .south_up()
            .build();

        let mut decoder = Decoder::new(Cursor::new(tiff)).unwrap();
        let matrix = decoder
            .find_tag(Tag::from_u16_exhaustive(MODEL_TRANSFORMATION))
            .unwrap()
            .unwrap()
            .into_f64_vec()
            .unwrap();
        assert_eq!(matrix[7], 0.0);
        match decoder.read_image().unwrap() {
            DecodingResult::U8(samples) => assert_eq!(samples, vec![3, 2, 1]),
            _ => panic!("expected u8 samples"),
        }
    }

    #[test]
    fn test_geo_keys_for_geographic_point_raster() {
        let builder = GeoTiffBuilder::new(1, 1, (0.0, 0.0), 1.0)
            .epsg(4326)
            .pixel_is_point();
        let keys = builder.geo_keys();
        assert_eq!(&keys[4..8], &[1024, 0, 1, 2]);
        assert_eq!(&keys[8..12], &[1025, 0, 1, 2]);
        assert_eq!(&keys[12..16], &[2048, 0, 1, 4326]);
    }

    #[test]
    #[should_panic(expected = "band size mismatch")]
    fn test_band_size_checked() {
        GeoTiffBuilder::new(2, 2, (0.0, 0.0), 1.0)
            .band("a", vec![1.0])
            .build();
    }

    #[test]
    #[should_panic(expected = "integer samples")]
    fn test_predictor_rejected_for_floats() {
        GeoTiffBuilder::new(1, 1, (0.0, 0.0), 1.0)
            .band("a", vec![1.0])
            .horizontal_predictor()
            .build();
    }
}
