//! PNG encoding for rendered sweep overlays.
//!
//! A sweep overlay is a colour ramp over a transparent background, so it
//! almost always fits an 8-bit palette. [`encode_overlay`] writes an indexed
//! PNG (color type 3) with fully transparent pixels pinned to palette entry
//! 0, which keeps the tRNS chunk short. Images with more than 256 distinct
//! colours fall back to RGBA (color type 6) through [`encode_rgba`].

use std::collections::HashMap;
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use radar_common::{RadarError, RadarResult};

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

const COLOR_TYPE_INDEXED: u8 = 3;
const COLOR_TYPE_RGBA: u8 = 6;

const MAX_PALETTE: usize = 256;

/// Palette with transparent pixels collapsed onto entry 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayPalette {
    pub entries: Vec<[u8; 4]>,
    pub indices: Vec<u8>,
}

impl OverlayPalette {
    /// Build a palette, or `None` if the image needs more than 256 entries.
    pub fn build(pixels: &[u8]) -> Option<Self> {
        let mut entries: Vec<[u8; 4]> = vec![[0, 0, 0, 0]];
        let mut lookup: HashMap<[u8; 4], u8> = HashMap::new();
        let mut indices = Vec::with_capacity(pixels.len() / 4);

        for px in pixels.chunks_exact(4) {
            if px[3] == 0 {
                indices.push(0);
                continue;
            }
            let rgba = [px[0], px[1], px[2], px[3]];
            let index = match lookup.get(&rgba) {
                Some(&index) => index,
                None => {
                    if entries.len() == MAX_PALETTE {
                        return None;
                    }
                    let index = entries.len() as u8;
                    entries.push(rgba);
                    lookup.insert(rgba, index);
                    index
                }
            };
            indices.push(index);
        }

        Some(Self { entries, indices })
    }

    /// tRNS payload: alpha values up to the last non-opaque entry.
    fn alpha(&self) -> Vec<u8> {
        let last = self.entries.iter().rposition(|e| e[3] < 255).unwrap_or(0);
        self.entries[..=last].iter().map(|e| e[3]).collect()
    }
}

/// Encode RGBA pixels, indexed when the palette fits.
pub fn encode_overlay(pixels: &[u8], width: usize, height: usize) -> RadarResult<Vec<u8>> {
    check_dimensions(pixels, width, height)?;

    match OverlayPalette::build(pixels) {
        Some(palette) => {
            let mut png = start(width, height, COLOR_TYPE_INDEXED);

            let plte: Vec<u8> = palette.entries.iter().flat_map(|e| [e[0], e[1], e[2]]).collect();
            write_chunk(&mut png, b"PLTE", &plte);

            write_chunk(&mut png, b"tRNS", &palette.alpha());

            finish(png, &palette.indices, width)
        }
        None => encode_rgba(pixels, width, height),
    }
}

/// Encode RGBA pixels as a color type 6 PNG.
pub fn encode_rgba(pixels: &[u8], width: usize, height: usize) -> RadarResult<Vec<u8>> {
    check_dimensions(pixels, width, height)?;
    let png = start(width, height, COLOR_TYPE_RGBA);
    finish(png, pixels, width * 4)
}

fn check_dimensions(pixels: &[u8], width: usize, height: usize) -> RadarResult<()> {
    if width == 0 || height == 0 || width > u32::MAX as usize || height > u32::MAX as usize {
        return Err(RadarError::Render(format!("invalid image size {}x{}", width, height)));
    }
    if pixels.len() != width * height * 4 {
        return Err(RadarError::Render(format!(
            "expected {} RGBA bytes for {}x{}, got {}",
            width * height * 4,
            width,
            height,
            pixels.len()
        )));
    }
    Ok(())
}

/// Signature and IHDR for an 8-bit image.
fn start(width: usize, height: usize, color_type: u8) -> Vec<u8> {
    let mut png = SIGNATURE.to_vec();
    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr.extend_from_slice(&(height as u32).to_be_bytes());
    // bit depth, color type, compression, filter, interlace
    ihdr.extend_from_slice(&[8, color_type, 0, 0, 0]);
    write_chunk(&mut png, b"IHDR", &ihdr);
    png
}

/// Deflate unfiltered scanlines into IDAT and close with IEND.
fn finish(mut png: Vec<u8>, data: &[u8], row_bytes: usize) -> RadarResult<Vec<u8>> {
    let deflate = |data: &[u8]| -> std::io::Result<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 4), Compression::fast());
        for row in data.chunks_exact(row_bytes) {
            encoder.write_all(&[0])?;
            encoder.write_all(row)?;
        }
        encoder.finish()
    };
    let idat = deflate(data).map_err(|e| RadarError::Render(format!("IDAT compression failed: {}", e)))?;

    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

/// Length, type, data, CRC over type and data.
fn write_chunk(png: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(kind);
    png.extend_from_slice(data);

    let mut crc = crc32fast::Hasher::new();
    crc.update(kind);
    crc.update(data);
    png.extend_from_slice(&crc.finalize().to_be_bytes());
}
