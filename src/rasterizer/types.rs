//! Core types for the rasterizer

use serde::{Deserialize, Serialize};
use super::math::Vec3;

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Flat Lambertian gray: intensity * 255 on every channel
    pub fn gray(intensity: f64) -> Self {
        let v = (intensity.clamp(0.0, 1.0) * 255.0) as u8;
        Self::new(v, v, v)
    }

    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_bytes(b: [u8; 4]) -> Self {
        Self { r: b[0], g: b[1], b: b[2], a: b[3] }
    }
}

/// Screen-space triangle: x, y in pixels, z kept for depth testing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub points: [Vec3; 3],
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { points: [a, b, c] }
    }

    /// Map model points in [-1, 1] straight onto a `width` x `height` grid,
    /// without going through the matrix pipeline.
    pub fn from_ndc(points: [Vec3; 3], width: f64, height: f64) -> Self {
        let map = |v: Vec3| {
            Vec3::new(
                (v.x + 1.0) * width / 2.0 + 0.5,
                (v.y + 1.0) * height / 2.0 + 0.5,
                v.z,
            )
        };
        Self {
            points: [map(points[0]), map(points[1]), map(points[2])],
        }
    }

    pub fn max_depth(&self) -> f64 {
        self.points[0].z.max(self.points[1].z).max(self.points[2].z)
    }
}

/// Camera and viewport parameters for the matrix pipeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Distance along Z used by the perspective matrix (must be non-zero)
    pub distance: f64,
    /// Fraction of the target left empty on each side
    pub viewport_margin: f64,
    /// Depth range the [-1, 1] cube is mapped onto
    pub depth: f64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            eye: Vec3::new(1.0, 1.0, 3.0),
            target: Vec3::ZERO,
            up: Vec3::UP,
            distance: 3.0,
            viewport_margin: 0.125,
            depth: 256.0,
        }
    }
}

/// How covered pixels get their color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadingMode {
    Wireframe, // Edges only, white lines
    Flat,      // One gray intensity per face
    Textured,  // Sample the texture with interpolated UVs
}

/// Rasterizer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterSettings {
    pub shading: ShadingMode,
    /// Use Z-buffer (larger depth wins)
    pub use_zbuffer: bool,
    /// Light direction for the flat intensity / cull test
    pub light_dir: Vec3,
    /// Matrix pipeline camera; `None` maps model space straight to the screen
    pub camera: Option<CameraSettings>,
    /// Color used by wireframe mode
    pub line_color: Color,
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            shading: ShadingMode::Textured,
            use_zbuffer: true,
            light_dir: Vec3::new(0.0, 0.0, -1.0),
            camera: Some(CameraSettings::default()),
            line_color: Color::WHITE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray_intensity() {
        assert_eq!(Color::gray(1.0), Color::WHITE);
        assert_eq!(Color::gray(0.0), Color::BLACK);
        assert_eq!(Color::gray(0.5).r, 127);
        assert_eq!(Color::gray(2.0), Color::WHITE);
    }

    #[test]
    fn test_from_ndc_maps_corners() {
        let t = Triangle::from_ndc(
            [Vec3::new(-1.0, -1.0, 0.2), Vec3::new(1.0, -1.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
            99.0,
            99.0,
        );
        assert_eq!(t.points[0], Vec3::new(0.5, 0.5, 0.2));
        assert_eq!(t.points[1].x, 99.5);
        assert_eq!(t.points[2].y, 99.5);
        assert_eq!(t.max_depth(), 0.2);
    }

    #[test]
    fn test_settings_ron_defaults() {
        let s: RasterSettings = ron::from_str("(shading: Flat)").unwrap();
        assert_eq!(s.shading, ShadingMode::Flat);
        assert!(s.use_zbuffer);
        assert_eq!(s.camera, Some(CameraSettings::default()));
    }
}
