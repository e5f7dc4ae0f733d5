//! TGA encoding
//!
//! The default path writes 24-bit uncompressed true-color and drops alpha.
//! `encode_with` can keep alpha (32-bit plus extension area) and run-length
//! compress the pixel data.

use std::io::Write;
use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::canvas::{ColorModel, Image};
use super::error::{TgaError, TgaResult};
use super::header::{
    extension_area, Footer, RawHeader, ATTR_TYPE_ALPHA, ATTR_TYPE_PREMULTIPLIED_ALPHA,
    IMAGE_TYPE_FLAG_RLE, IMAGE_TYPE_TRUE_COLOR,
};

/// Longest run a single packet can describe
const MAX_PACKET_LEN: usize = 128;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    #[default]
    Rgb24,
    Rgba32,
}

impl PixelFormat {
    fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb24 => 3,
            PixelFormat::Rgba32 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compression {
    #[default]
    Raw,
    Rle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    pub format: PixelFormat,
    pub compression: Compression,
}

/// Stored BGR(A) bytes of one row
fn pack_row(row: &[u8], format: PixelFormat) -> Vec<u8> {
    let bpp = format.bytes_per_pixel();
    let mut out = Vec::with_capacity(row.len() / 4 * bpp);
    for px in row.chunks_exact(4) {
        out.extend_from_slice(&[px[2], px[1], px[0]]);
        if format == PixelFormat::Rgba32 {
            out.push(px[3]);
        }
    }
    out
}

/// Run-length packets for one packed row. Packets never cross rows.
fn compress_row(row: &[u8], bpp: usize, out: &mut Vec<u8>) {
    let pixels: Vec<&[u8]> = row.chunks_exact(bpp).collect();
    let n = pixels.len();
    let mut i = 0;

    while i < n {
        let mut run = 1;
        while i + run < n && run < MAX_PACKET_LEN && pixels[i + run] == pixels[i] {
            run += 1;
        }

        if run > 1 {
            out.push(0x80 | (run - 1) as u8);
            out.extend_from_slice(pixels[i]);
            i += run;
            continue;
        }

        let start = i;
        while i < n && i - start < MAX_PACKET_LEN {
            if i + 1 < n && pixels[i] == pixels[i + 1] {
                break;
            }
            i += 1;
        }
        out.push((i - start - 1) as u8);
        for px in &pixels[start..i] {
            out.extend_from_slice(px);
        }
    }
}

/// Serialize `image` to TGA bytes.
pub fn encode_to_vec(image: &Image, options: EncodeOptions) -> TgaResult<Vec<u8>> {
    let (width, height) = (image.width(), image.height());
    if width > u16::MAX as usize || height > u16::MAX as usize {
        return Err(TgaError::ImageTooLarge { width, height });
    }

    let (bpp, alpha_bits) = match options.format {
        PixelFormat::Rgb24 => (24, 0),
        PixelFormat::Rgba32 => (32, 8),
    };
    let mut image_type = IMAGE_TYPE_TRUE_COLOR;
    if options.compression == Compression::Rle {
        image_type |= IMAGE_TYPE_FLAG_RLE;
    }

    // Bottom-left origin: rows go out bottom first
    let raw = RawHeader {
        image_type,
        width: width as u16,
        height: height as u16,
        bpp,
        flags: alpha_bits,
        ..Default::default()
    };

    let mut out = raw.to_bytes().to_vec();
    for y in (0..height).rev() {
        let packed = pack_row(image.row(y), options.format);
        match options.compression {
            Compression::Raw => out.extend_from_slice(&packed),
            Compression::Rle => compress_row(&packed, options.format.bytes_per_pixel(), &mut out),
        }
    }

    if options.format == PixelFormat::Rgba32 {
        let attr = match image.color_model {
            ColorModel::Straight => ATTR_TYPE_ALPHA,
            ColorModel::Premultiplied => ATTR_TYPE_PREMULTIPLIED_ALPHA,
        };
        let ext_offset = out.len() as u32;
        out.extend_from_slice(&extension_area(attr));
        out.extend_from_slice(&Footer::new(ext_offset).to_bytes());
    }

    Ok(out)
}

/// Write `image` with explicit options.
pub fn encode_with<W: Write>(image: &Image, mut writer: W, options: EncodeOptions) -> TgaResult<()> {
    let bytes = encode_to_vec(image, options)?;
    writer.write_all(&bytes)?;
    Ok(())
}

/// Write `image` as 24-bit uncompressed true-color. Alpha is not kept.
pub fn encode<W: Write>(image: &Image, writer: W) -> TgaResult<()> {
    encode_with(image, writer, EncodeOptions::default())
}

/// Save `image` to a file.
pub fn save<P: AsRef<Path>>(image: &Image, path: P, options: EncodeOptions) -> TgaResult<()> {
    let bytes = encode_to_vec(image, options)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
