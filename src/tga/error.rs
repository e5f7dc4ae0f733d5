//! Error types for the TGA codec

use std::fmt;
use std::io;

/// Errors that can occur while decoding or encoding a TGA image.
/// Any error aborts the whole operation; no partial image is returned.
#[derive(Debug)]
pub enum TgaError {
    /// Image type and bit depth (or palette layout) do not fit together.
    InvalidFormat { detail: String },
    /// Alpha bits in the descriptor are not 0, 1 or 8.
    InvalidAlphaSize(u8),
    /// Image type field is not paletted, true-color or monochrome.
    UnsupportedType(u8),
    /// A paletted pixel points past the loaded palette.
    PaletteIndexOutOfRange { index: usize, len: usize },
    /// Input ended before the named section was complete.
    UnexpectedEof { context: &'static str },
    /// Dimensions do not fit the 16-bit header fields.
    ImageTooLarge { width: usize, height: usize },
    /// Underlying read or write failed.
    Io(io::Error),
}

impl fmt::Display for TgaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TgaError::InvalidFormat { detail } => write!(f, "TGA: invalid format: {}", detail),
            TgaError::InvalidAlphaSize(bits) => write!(f, "TGA: invalid alpha size {}", bits),
            TgaError::UnsupportedType(t) => write!(f, "TGA: unknown image type {}", t),
            TgaError::PaletteIndexOutOfRange { index, len } => {
                write!(f, "TGA: palette index {} out of range ({} entries)", index, len)
            }
            TgaError::UnexpectedEof { context } => {
                write!(f, "TGA: unexpected end of data in {}", context)
            }
            TgaError::ImageTooLarge { width, height } => {
                write!(f, "TGA: {}x{} exceeds the 65535 pixel limit", width, height)
            }
            TgaError::Io(e) => write!(f, "TGA: IO error: {}", e),
        }
    }
}

impl std::error::Error for TgaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TgaError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TgaError {
    fn from(e: io::Error) -> Self {
        TgaError::Io(e)
    }
}

/// Result type for codec operations.
pub type TgaResult<T> = Result<T, TgaError>;
