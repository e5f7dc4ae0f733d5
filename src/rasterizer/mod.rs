//! Software rasterizer
//!
//! Features:
//! - Look-at / projection / viewport matrix pipeline
//! - Barycentric triangle fill with degenerate-triangle rejection
//! - Z-buffer where the larger depth wins
//! - Affine texture mapping (no perspective correction)
//! - Flat Lambertian shading with a combined backface/light cull

mod math;
mod types;
mod transform;
mod render;

pub use math::*;
pub use types::*;
pub use transform::*;
pub use render::*;
