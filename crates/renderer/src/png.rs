//! PNG encoding for rendered RGBA bands.
//!
//! Images with at most 256 distinct colours are written as indexed PNG
//! (colour type 3, with a tRNS chunk when any entry is translucent); anything
//! else falls back to truecolour with alpha (colour type 6).

use std::collections::HashMap;
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use hsm_common::{HsmError, HsmResult};

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];
const MAX_PALETTE_SIZE: usize = 256;

const COLOR_TYPE_INDEXED: u8 = 3;
const COLOR_TYPE_RGBA: u8 = 6;

/// Encode RGBA pixels, choosing indexed or truecolour automatically.
pub fn encode_png(pixels: &[u8], width: usize, height: usize) -> HsmResult<Vec<u8>> {
    if width == 0 || height == 0 {
        return Err(HsmError::Render(format!(
            "cannot encode a {}x{} image",
            width, height
        )));
    }
    if pixels.len() != width * height * 4 {
        return Err(HsmError::Render(format!(
            "expected {} RGBA bytes for {}x{}, got {}",
            width * height * 4,
            width,
            height,
            pixels.len()
        )));
    }

    match extract_palette(pixels) {
        Some((palette, indices)) => encode_indexed(&palette, &indices, width, height),
        None => encode_rgba(pixels, width, height),
    }
}

/// Palette in first-seen order plus one index per pixel, or `None` when the
/// image holds more than 256 colours.
fn extract_palette(pixels: &[u8]) -> Option<(Vec<[u8; 4]>, Vec<u8>)> {
    let mut lookup: HashMap<[u8; 4], u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices = Vec::with_capacity(pixels.len() / 4);

    for px in pixels.chunks_exact(4) {
        let rgba = [px[0], px[1], px[2], px[3]];
        let index = match lookup.get(&rgba) {
            Some(&i) => i,
            None => {
                if palette.len() == MAX_PALETTE_SIZE {
                    return None;
                }
                let i = palette.len() as u8;
                palette.push(rgba);
                lookup.insert(rgba, i);
                i
            }
        };
        indices.push(index);
    }

    Some((palette, indices))
}

fn encode_indexed(
    palette: &[[u8; 4]],
    indices: &[u8],
    width: usize,
    height: usize,
) -> HsmResult<Vec<u8>> {
    let mut png = SIGNATURE.to_vec();
    write_chunk(&mut png, b"IHDR", &header(width, height, COLOR_TYPE_INDEXED));

    let plte: Vec<u8> = palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    write_chunk(&mut png, b"PLTE", &plte);

    if palette.iter().any(|c| c[3] < 255) {
        let trns: Vec<u8> = palette.iter().map(|c| c[3]).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    write_chunk(&mut png, b"IDAT", &deflate_scanlines(indices, width)?);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn encode_rgba(pixels: &[u8], width: usize, height: usize) -> HsmResult<Vec<u8>> {
    let mut png = SIGNATURE.to_vec();
    write_chunk(&mut png, b"IHDR", &header(width, height, COLOR_TYPE_RGBA));
    write_chunk(&mut png, b"IDAT", &deflate_scanlines(pixels, width * 4)?);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn header(width: usize, height: usize, color_type: u8) -> [u8; 13] {
    let mut ihdr = [0u8; 13];
    ihdr[0..4].copy_from_slice(&(width as u32).to_be_bytes());
    ihdr[4..8].copy_from_slice(&(height as u32).to_be_bytes());
    ihdr[8] = 8; // bit depth
    ihdr[9] = color_type;
    // compression, filter and interlace methods stay 0
    ihdr
}

/// Prefix every scanline with filter type 0 and zlib-compress.
fn deflate_scanlines(data: &[u8], row_bytes: usize) -> HsmResult<Vec<u8>> {
    let mut raw = Vec::with_capacity(data.len() + data.len() / row_bytes.max(1));
    for row in data.chunks_exact(row_bytes) {
        raw.push(0);
        raw.extend_from_slice(row);
    }

    let compress_err = |e: std::io::Error| HsmError::Render(format!("IDAT compression failed: {}", e));
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw).map_err(compress_err)?;
    encoder.finish().map_err(compress_err)
}

fn write_chunk(png: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(kind);
    hasher.update(data);

    png.extend_from_slice(kind);
    png.extend_from_slice(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}
