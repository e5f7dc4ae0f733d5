//! TARGA (TGA) image codec
//!
//! Decodes paletted, true-color and monochrome images, raw or run-length
//! compressed, in any of the four origin orientations. Output is always a
//! top-left origin RGBA [`Image`](crate::canvas::Image).
//!
//! Encoding writes uncompressed 24-bit true-color by default; 32-bit with
//! an extension area and run-length compression are available through
//! [`encode_with`].

mod error;
mod header;
mod decode;
mod encode;

pub use error::{TgaError, TgaResult};
pub use header::{read_header, ImageKind, RawHeader, TgaInfo};
pub use decode::{decode, decode_bytes, expand_555, load};
pub use encode::{encode, encode_to_vec, encode_with, save, Compression, EncodeOptions, PixelFormat};
