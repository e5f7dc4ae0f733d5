//! Model -> view -> projection -> viewport matrices

use super::math::{Mat4, MathError, Vec3};
use super::types::CameraSettings;

/// World-to-camera matrix from an eye, a target and an up vector.
///
/// Rows hold the camera basis; the translation column is the negated target.
pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    let z = (eye - target).normalize();
    let x = up.cross(z).normalize();
    let y = z.cross(x).normalize();

    Mat4::from_rows([
        [x.x, x.y, x.z, -target.x],
        [y.x, y.y, y.z, -target.y],
        [z.x, z.y, z.z, -target.z],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

/// Simple perspective: identity with m[3][2] = -1/distance.
/// `camera_distance` must be non-zero.
pub fn projection(camera_distance: f64) -> Mat4 {
    let mut m = Mat4::IDENTITY;
    m.m[3][2] = -1.0 / camera_distance;
    m
}

/// Maps the [-1, 1] cube onto the pixel rectangle (x, y, w, h) and [0, depth].
pub fn viewport(x: f64, y: f64, w: f64, h: f64, depth: f64) -> Mat4 {
    Mat4::from_rows([
        [w / 2.0, 0.0, 0.0, x + w / 2.0],
        [0.0, h / 2.0, 0.0, y + h / 2.0],
        [0.0, 0.0, depth / 2.0, depth / 2.0],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

/// The three matrices of one draw call
#[derive(Debug, Clone, Copy)]
pub struct Pipeline {
    pub model_view: Mat4,
    pub projection: Mat4,
    pub viewport: Mat4,
}

impl Pipeline {
    /// Build the matrices for a `width` x `height` target
    pub fn new(camera: &CameraSettings, width: usize, height: usize) -> Self {
        let (w, h) = (width as f64, height as f64);
        let m = camera.viewport_margin.clamp(0.0, 0.5);
        Self {
            model_view: look_at(camera.eye, camera.target, camera.up),
            projection: projection(camera.distance),
            viewport: viewport(w * m, h * m, w * (1.0 - 2.0 * m), h * (1.0 - 2.0 * m), camera.depth),
        }
    }

    /// viewport * projection * model_view
    pub fn compose(&self) -> Mat4 {
        self.viewport * self.projection * self.model_view
    }
}

/// Model-space point to screen space (pixel x, pixel y, depth)
pub fn to_screen(transform: &Mat4, v: Vec3) -> Result<Vec3, MathError> {
    transform.transform_point(v)
}
