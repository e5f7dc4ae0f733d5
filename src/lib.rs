//! tinyrender: minimal software rasterizer with a TARGA image codec
//!
//! - Look-at / projection / viewport matrix pipeline
//! - Barycentric triangle fill with a z-buffer and affine texture mapping
//! - Flat Lambertian shading with backface culling
//! - TGA decode (paletted, true-color, monochrome, RLE) and encode

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod canvas;
pub mod mesh;
pub mod rasterizer;
pub mod scene;
pub mod tga;
