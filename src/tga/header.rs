//! Fixed-size TGA structures and header validation
//!
//! Layout (little-endian): 18-byte header, optional id field, optional
//! palette, pixel data, optional extension area and 26-byte footer.

use crate::canvas::ColorModel;
use super::error::{TgaError, TgaResult};

pub const HEADER_SIZE: usize = 18;
pub const FOOTER_SIZE: usize = 26;

/// Attribute-type byte position inside the extension area
pub const EXT_AREA_ATTR_TYPE_OFFSET: usize = 0x1ee;
/// Size of the extension area we write (TGA 2.0 size)
pub const EXT_AREA_SIZE: usize = EXT_AREA_ATTR_TYPE_OFFSET + 1;

pub const SIGNATURE: &[u8; 18] = b"TRUEVISION-XFILE.\0";

pub const FLAG_ORIGIN_RIGHT: u8 = 1 << 4;
pub const FLAG_ORIGIN_TOP: u8 = 1 << 5;
pub const FLAG_ALPHA_SIZE_MASK: u8 = 0x0f;

pub const IMAGE_TYPE_PALETTED: u8 = 1;
pub const IMAGE_TYPE_TRUE_COLOR: u8 = 2;
pub const IMAGE_TYPE_MONOCHROME: u8 = 3;
pub const IMAGE_TYPE_FLAG_RLE: u8 = 1 << 3;

pub const ATTR_TYPE_ALPHA: u8 = 3;
pub const ATTR_TYPE_PREMULTIPLIED_ALPHA: u8 = 4;

/// The 18-byte header exactly as stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawHeader {
    pub id_length: u8,
    pub palette_type: u8,
    pub image_type: u8,
    pub palette_first: u16,
    pub palette_length: u16,
    pub palette_bpp: u8,
    pub origin_x: u16,
    pub origin_y: u16,
    pub width: u16,
    pub height: u16,
    pub bpp: u8,
    pub flags: u8,
}

fn le16(b: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([b[at], b[at + 1]])
}

fn le32(b: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

impl RawHeader {
    pub fn parse(data: &[u8]) -> TgaResult<Self> {
        if data.len() < HEADER_SIZE {
            return Err(TgaError::UnexpectedEof { context: "header" });
        }
        Ok(Self {
            id_length: data[0],
            palette_type: data[1],
            image_type: data[2],
            palette_first: le16(data, 3),
            palette_length: le16(data, 5),
            palette_bpp: data[7],
            origin_x: le16(data, 8),
            origin_y: le16(data, 10),
            width: le16(data, 12),
            height: le16(data, 14),
            bpp: data[16],
            flags: data[17],
        })
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut b = [0u8; HEADER_SIZE];
        b[0] = self.id_length;
        b[1] = self.palette_type;
        b[2] = self.image_type;
        b[3..5].copy_from_slice(&self.palette_first.to_le_bytes());
        b[5..7].copy_from_slice(&self.palette_length.to_le_bytes());
        b[7] = self.palette_bpp;
        b[8..10].copy_from_slice(&self.origin_x.to_le_bytes());
        b[10..12].copy_from_slice(&self.origin_y.to_le_bytes());
        b[12..14].copy_from_slice(&self.width.to_le_bytes());
        b[14..16].copy_from_slice(&self.height.to_le_bytes());
        b[16] = self.bpp;
        b[17] = self.flags;
        b
    }
}

/// The 26-byte trailer of a TGA 2.0 file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    pub ext_area_offset: u32,
    pub dev_dir_offset: u32,
    pub signature: [u8; 18],
}

impl Footer {
    pub fn new(ext_area_offset: u32) -> Self {
        Self {
            ext_area_offset,
            dev_dir_offset: 0,
            signature: *SIGNATURE,
        }
    }

    /// Footer at the end of `data`, if the file is long enough to have one
    pub fn parse_trailing(data: &[u8]) -> Option<Self> {
        if data.len() < HEADER_SIZE + FOOTER_SIZE {
            return None;
        }
        let b = &data[data.len() - FOOTER_SIZE..];
        let mut signature = [0u8; 18];
        signature.copy_from_slice(&b[8..26]);
        Some(Self {
            ext_area_offset: le32(b, 0),
            dev_dir_offset: le32(b, 4),
            signature,
        })
    }

    pub fn is_valid(&self) -> bool {
        &self.signature == SIGNATURE
    }

    pub fn to_bytes(&self) -> [u8; FOOTER_SIZE] {
        let mut b = [0u8; FOOTER_SIZE];
        b[0..4].copy_from_slice(&self.ext_area_offset.to_le_bytes());
        b[4..8].copy_from_slice(&self.dev_dir_offset.to_le_bytes());
        b[8..].copy_from_slice(&self.signature);
        b
    }
}

/// Minimal extension area carrying only the attribute type
pub fn extension_area(attr_type: u8) -> Vec<u8> {
    let mut area = vec![0u8; EXT_AREA_SIZE];
    area[0..2].copy_from_slice(&(EXT_AREA_SIZE as u16).to_le_bytes());
    area[EXT_AREA_ATTR_TYPE_OFFSET] = attr_type;
    area
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Paletted,
    TrueColor,
    Monochrome,
}

/// Validated header plus everything derived from it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TgaInfo {
    pub raw: RawHeader,
    pub kind: ImageKind,
    pub rle: bool,
    pub has_alpha: bool,
    pub color_model: ColorModel,
    pub width: usize,
    pub height: usize,
    /// Bytes per stored pixel
    pub pixel_size: usize,
}

impl TgaInfo {
    /// Bytes per palette entry (15-bit entries take two bytes)
    pub fn palette_entry_size(&self) -> usize {
        (self.raw.palette_bpp as usize + 1) >> 3
    }

    /// Offset of the first byte after header and id field
    pub fn data_offset(&self) -> usize {
        HEADER_SIZE + self.raw.id_length as usize
    }
}

/// Alpha flags from the extension area: attribute type 3 is straight alpha,
/// 4 is premultiplied, anything else means the file carries no alpha.
fn apply_extensions(data: &[u8], has_alpha: &mut bool, color_model: &mut ColorModel) {
    let Some(footer) = Footer::parse_trailing(data) else {
        return;
    };
    if !footer.is_valid() || footer.ext_area_offset == 0 {
        return;
    }

    let offset = footer.ext_area_offset as usize + EXT_AREA_ATTR_TYPE_OFFSET;
    let Some(&attr) = data.get(offset) else {
        tracing::warn!(offset, len = data.len(), "TGA extension area points past end of file");
        return;
    };

    match attr {
        ATTR_TYPE_ALPHA => *has_alpha = true,
        ATTR_TYPE_PREMULTIPLIED_ALPHA => {
            *has_alpha = true;
            *color_model = ColorModel::Premultiplied;
        }
        _ => *has_alpha = false,
    }
}

/// Parse and validate the header of a complete TGA file.
pub fn read_header(data: &[u8]) -> TgaResult<TgaInfo> {
    let raw = RawHeader::parse(data)?;

    let rle = raw.image_type & IMAGE_TYPE_FLAG_RLE != 0;
    let image_type = raw.image_type & !IMAGE_TYPE_FLAG_RLE;
    let alpha_size = raw.flags & FLAG_ALPHA_SIZE_MASK;

    if alpha_size != 0 && alpha_size != 1 && alpha_size != 8 {
        return Err(TgaError::InvalidAlphaSize(alpha_size));
    }

    let mut has_alpha = alpha_size != 0
        || raw.bpp == 32
        || (image_type == IMAGE_TYPE_MONOCHROME && raw.bpp == 16)
        || (image_type == IMAGE_TYPE_PALETTED && raw.palette_bpp == 32);
    let mut color_model = ColorModel::Straight;

    apply_extensions(data, &mut has_alpha, &mut color_model);

    let kind = match image_type {
        IMAGE_TYPE_PALETTED => {
            if raw.palette_type != 1
                || raw.bpp != 8
                || raw.palette_first >= raw.palette_length
                || !matches!(raw.palette_bpp, 15 | 16 | 24 | 32)
            {
                return Err(TgaError::InvalidFormat {
                    detail: format!(
                        "paletted image with bpp {} and palette ({}, {}..{}, {} bit)",
                        raw.bpp, raw.palette_type, raw.palette_first, raw.palette_length, raw.palette_bpp
                    ),
                });
            }
            ImageKind::Paletted
        }
        IMAGE_TYPE_TRUE_COLOR => {
            if raw.bpp != 32 && raw.bpp != 16 && (raw.bpp != 24 || has_alpha) {
                return Err(TgaError::InvalidFormat {
                    detail: format!("true-color image with bpp {} (alpha: {})", raw.bpp, has_alpha),
                });
            }
            ImageKind::TrueColor
        }
        IMAGE_TYPE_MONOCHROME => {
            if (has_alpha && raw.bpp != 16) || (!has_alpha && raw.bpp != 8) {
                return Err(TgaError::InvalidFormat {
                    detail: format!("monochrome image with bpp {} (alpha: {})", raw.bpp, has_alpha),
                });
            }
            ImageKind::Monochrome
        }
        _ => return Err(TgaError::UnsupportedType(raw.image_type)),
    };

    Ok(TgaInfo {
        raw,
        kind,
        rle,
        has_alpha,
        color_model,
        width: raw.width as usize,
        height: raw.height as usize,
        pixel_size: (raw.bpp >> 3) as usize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(image_type: u8, bpp: u8, flags: u8) -> RawHeader {
        RawHeader {
            image_type,
            width: 2,
            height: 2,
            bpp,
            flags,
            ..Default::default()
        }
    }

    #[test]
    fn test_header_byte_layout() {
        let raw = RawHeader {
            id_length: 3,
            width: 0x0102,
            height: 0x0304,
            bpp: 24,
            flags: FLAG_ORIGIN_TOP,
            ..header(IMAGE_TYPE_TRUE_COLOR, 24, 0)
        };
        let bytes = raw.to_bytes();
        assert_eq!(bytes[0], 3);
        assert_eq!(&bytes[12..16], &[0x02, 0x01, 0x04, 0x03]);
        assert_eq!(RawHeader::parse(&bytes).unwrap(), raw);
    }

    #[test]
    fn test_short_header_is_eof() {
        assert!(matches!(
            RawHeader::parse(&[0u8; 10]),
            Err(TgaError::UnexpectedEof { context: "header" })
        ));
    }

    #[test]
    fn test_alpha_size_validation() {
        let bytes = header(IMAGE_TYPE_TRUE_COLOR, 32, 4).to_bytes();
        assert!(matches!(read_header(&bytes), Err(TgaError::InvalidAlphaSize(4))));
    }

    #[test]
    fn test_unknown_type() {
        let bytes = header(0, 24, 0).to_bytes();
        assert!(matches!(read_header(&bytes), Err(TgaError::UnsupportedType(0))));
        let bytes = header(IMAGE_TYPE_FLAG_RLE | 7, 24, 0).to_bytes();
        assert!(matches!(read_header(&bytes), Err(TgaError::UnsupportedType(15))));
    }

    #[test]
    fn test_bit_depth_mismatch() {
        let bytes = header(IMAGE_TYPE_TRUE_COLOR, 8, 0).to_bytes();
        assert!(matches!(read_header(&bytes), Err(TgaError::InvalidFormat { .. })));

        // 24-bit color cannot declare alpha bits
        let bytes = header(IMAGE_TYPE_TRUE_COLOR, 24, 8).to_bytes();
        assert!(matches!(read_header(&bytes), Err(TgaError::InvalidFormat { .. })));

        let bytes = header(IMAGE_TYPE_MONOCHROME, 16, 0).to_bytes();
        assert!(read_header(&bytes).is_ok());
        let bytes = header(IMAGE_TYPE_MONOCHROME, 24, 0).to_bytes();
        assert!(matches!(read_header(&bytes), Err(TgaError::InvalidFormat { .. })));
    }

    #[test]
    fn test_palette_spec_validation() {
        let mut raw = header(IMAGE_TYPE_PALETTED, 8, 0);
        raw.palette_type = 1;
        raw.palette_length = 4;
        raw.palette_bpp = 24;
        assert_eq!(read_header(&raw.to_bytes()).unwrap().kind, ImageKind::Paletted);

        raw.palette_bpp = 8;
        assert!(matches!(read_header(&raw.to_bytes()), Err(TgaError::InvalidFormat { .. })));

        raw.palette_bpp = 15;
        raw.palette_first = 4;
        assert!(matches!(read_header(&raw.to_bytes()), Err(TgaError::InvalidFormat { .. })));
    }

    #[test]
    fn test_rle_flag_and_derived_fields() {
        let info = read_header(&header(IMAGE_TYPE_TRUE_COLOR | IMAGE_TYPE_FLAG_RLE, 32, 8).to_bytes()).unwrap();
        assert!(info.rle);
        assert!(info.has_alpha);
        assert_eq!(info.kind, ImageKind::TrueColor);
        assert_eq!(info.pixel_size, 4);
        assert_eq!(info.color_model, ColorModel::Straight);
    }

    fn with_extension(raw: RawHeader, attr: u8) -> Vec<u8> {
        let mut data = raw.to_bytes().to_vec();
        data.extend_from_slice(&[0u8; 16]);
        let ext_offset = data.len() as u32;
        data.extend_from_slice(&extension_area(attr));
        data.extend_from_slice(&Footer::new(ext_offset).to_bytes());
        data
    }

    #[test]
    fn test_extension_premultiplied() {
        let data = with_extension(header(IMAGE_TYPE_TRUE_COLOR, 32, 8), ATTR_TYPE_PREMULTIPLIED_ALPHA);
        let info = read_header(&data).unwrap();
        assert!(info.has_alpha);
        assert_eq!(info.color_model, ColorModel::Premultiplied);
    }

    #[test]
    fn test_extension_without_alpha_attr() {
        let data = with_extension(header(IMAGE_TYPE_TRUE_COLOR, 32, 0), 0);
        assert!(!read_header(&data).unwrap().has_alpha);

        // Dropping the alpha claim makes 24-bit with alpha bits acceptable
        let data = with_extension(header(IMAGE_TYPE_TRUE_COLOR, 24, 8), 2);
        assert!(read_header(&data).is_ok());
    }

    #[test]
    fn test_bad_signature_is_ignored() {
        let mut data = with_extension(header(IMAGE_TYPE_TRUE_COLOR, 32, 0), 0);
        let n = data.len();
        data[n - 2] = b'Y';
        assert!(read_header(&data).unwrap().has_alpha);
    }

    #[test]
    fn test_extension_past_end_is_ignored() {
        let mut data = header(IMAGE_TYPE_TRUE_COLOR, 32, 8).to_bytes().to_vec();
        data.extend_from_slice(&Footer::new(10_000).to_bytes());
        assert!(read_header(&data).unwrap().has_alpha);
    }
}
