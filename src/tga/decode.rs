//! TGA decoding: palette, raw and run-length pixel data, orientation

use std::io::Read;
use std::path::Path;

use crate::canvas::Image;
use super::error::{TgaError, TgaResult};
use super::header::{read_header, ImageKind, TgaInfo, FLAG_ORIGIN_RIGHT, FLAG_ORIGIN_TOP};

/// Cursor over the file bytes
struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8], offset: usize) -> Self {
        Self { data, offset }
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    fn skip(&mut self, n: usize, context: &'static str) -> TgaResult<()> {
        if self.remaining() < n {
            return Err(TgaError::UnexpectedEof { context });
        }
        self.offset += n;
        Ok(())
    }

    fn read_u8(&mut self, context: &'static str) -> TgaResult<u8> {
        let b = *self.data.get(self.offset).ok_or(TgaError::UnexpectedEof { context })?;
        self.offset += 1;
        Ok(b)
    }

    fn read_bytes(&mut self, n: usize, context: &'static str) -> TgaResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(TgaError::UnexpectedEof { context });
        }
        let bytes = &self.data[self.offset..self.offset + n];
        self.offset += n;
        Ok(bytes)
    }
}

/// Expand a 5-5-5 word to 8-bit (r, g, b) by bit replication
pub fn expand_555(word: u16) -> (u8, u8, u8) {
    let expand = |c: u16| -> u8 {
        let c = (c & 31) as u8;
        (c << 3) + (c >> 2)
    };
    (expand(word >> 10), expand(word >> 5), expand(word))
}

/// Per-file decoding state
struct Decoder<'a> {
    info: TgaInfo,
    palette: &'a [u8],
    palette_len: usize,
    reader: ByteReader<'a>,
}

impl<'a> Decoder<'a> {
    /// Read one stored pixel group and expand it to RGBA
    fn read_pixel(&mut self) -> TgaResult<[u8; 4]> {
        let info = &self.info;
        let src = self.reader.read_bytes(info.pixel_size, "pixel data")?;
        let mut a = 0xff;

        let (r, g, b) = match src.len() {
            4 => {
                if info.has_alpha {
                    a = src[3];
                }
                (src[2], src[1], src[0])
            }
            3 => (src[2], src[1], src[0]),
            2 if info.kind == ImageKind::Monochrome => {
                if info.has_alpha {
                    a = src[1];
                }
                (src[0], src[0], src[0])
            }
            2 => {
                let word = u16::from_le_bytes([src[0], src[1]]);
                if info.has_alpha && word & (1 << 15) == 0 {
                    a = 0;
                }
                expand_555(word)
            }
            1 if info.kind == ImageKind::Paletted => {
                let index = src[0] as usize;
                if index >= self.palette_len {
                    return Err(TgaError::PaletteIndexOutOfRange { index, len: self.palette_len });
                }
                let size = info.palette_entry_size();
                let entry = &self.palette[index * size..(index + 1) * size];
                match size {
                    4 => {
                        if info.has_alpha {
                            a = entry[3];
                        }
                        (entry[2], entry[1], entry[0])
                    }
                    3 => (entry[2], entry[1], entry[0]),
                    _ => expand_555(u16::from_le_bytes([entry[0], entry[1]])),
                }
            }
            _ => (src[0], src[0], src[0]),
        };

        Ok([r, g, b, a])
    }

    fn decode_raw(&mut self, out: &mut [u8]) -> TgaResult<()> {
        for px in out.chunks_exact_mut(4) {
            px.copy_from_slice(&self.read_pixel()?);
        }
        Ok(())
    }

    fn decode_rle(&mut self, out: &mut [u8]) -> TgaResult<()> {
        let mut i = 0;
        while i < out.len() {
            let control = self.reader.read_u8("run-length packet")?;
            let count = (control & 0x7f) as usize + 1;

            if control & 0x80 != 0 {
                // Encoded packet: one pixel repeated
                let px = self.read_pixel()?;
                for _ in 0..count {
                    if i >= out.len() {
                        break;
                    }
                    out[i..i + 4].copy_from_slice(&px);
                    i += 4;
                }
            } else {
                // Raw packet: `count` distinct pixels
                for _ in 0..count {
                    if i >= out.len() {
                        break;
                    }
                    out[i..i + 4].copy_from_slice(&self.read_pixel()?);
                    i += 4;
                }
            }
        }
        Ok(())
    }
}

/// Bring the decoded image to a top-left origin
fn normalize_orientation(image: &mut Image, flags: u8) {
    if flags & FLAG_ORIGIN_RIGHT != 0 {
        image.flip_horizontal();
    }
    if flags & FLAG_ORIGIN_TOP == 0 {
        image.flip_vertical();
    }
}

/// Decode a complete TGA file held in memory.
pub fn decode_bytes(data: &[u8]) -> TgaResult<Image> {
    let info = read_header(data)?;
    tracing::debug!(
        width = info.width,
        height = info.height,
        bpp = info.raw.bpp,
        kind = ?info.kind,
        rle = info.rle,
        alpha = info.has_alpha,
        "decoding TGA"
    );

    let mut reader = ByteReader::new(data, 0);
    reader.skip(info.data_offset(), "image id")?;

    let (palette, palette_len) = if info.kind == ImageKind::Paletted {
        let entry_size = info.palette_entry_size();
        let len = (info.raw.palette_length - info.raw.palette_first) as usize;
        reader.skip(entry_size * info.raw.palette_first as usize, "palette")?;
        (reader.read_bytes(entry_size * len, "palette")?, len)
    } else {
        (&data[..0], 0)
    };

    let pixel_count = info.width * info.height;
    let min_bytes = if info.rle {
        pixel_count.div_ceil(128) * (1 + info.pixel_size)
    } else {
        pixel_count * info.pixel_size
    };
    if reader.remaining() < min_bytes {
        return Err(TgaError::UnexpectedEof { context: "pixel data" });
    }

    let mut decoder = Decoder {
        info,
        palette,
        palette_len,
        reader,
    };

    let mut image = Image::new(info.width, info.height);
    if info.rle {
        decoder.decode_rle(image.as_bytes_mut())?;
    } else {
        decoder.decode_raw(image.as_bytes_mut())?;
    }

    normalize_orientation(&mut image, info.raw.flags);
    image.color_model = info.color_model;
    Ok(image)
}

/// Decode a TGA image from any reader.
pub fn decode<R: Read>(mut reader: R) -> TgaResult<Image> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    decode_bytes(&data)
}

/// Load a TGA file from disk.
pub fn load<P: AsRef<Path>>(path: P) -> TgaResult<Image> {
    let data = std::fs::read(path)?;
    decode_bytes(&data)
}
