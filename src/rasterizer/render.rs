//! Core rendering functions
//! Triangle rasterization with depth testing and affine texture sampling

use std::fmt;
use crate::canvas::Image;
use crate::mesh::{Mesh, MeshError};
use super::math::{barycentric, is_inside, Mat4, MathError, Vec2, Vec3};
use super::transform::{to_screen, Pipeline};
use super::types::{Color, RasterSettings, ShadingMode, Triangle};

/// Errors that abort a draw call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    Math(MathError),
    Mesh(MeshError),
}

impl From<MathError> for RenderError {
    fn from(e: MathError) -> Self {
        RenderError::Math(e)
    }
}

impl From<MeshError> for RenderError {
    fn from(e: MeshError) -> Self {
        RenderError::Mesh(e)
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Math(e) => write!(f, "transform error: {}", e),
            RenderError::Mesh(e) => write!(f, "mesh error: {}", e),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Math(e) => Some(e),
            RenderError::Mesh(e) => Some(e),
        }
    }
}

/// Per-pixel depth, one per render target.
/// Starts at negative infinity; a larger depth is nearer and wins.
#[derive(Debug, Clone)]
pub struct DepthBuffer {
    width: usize,
    height: usize,
    values: Vec<f64>,
}

impl DepthBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            values: vec![f64::NEG_INFINITY; width * height],
        }
    }

    pub fn for_image(image: &Image) -> Self {
        Self::new(image.width(), image.height())
    }

    pub fn get(&self, x: usize, y: usize) -> f64 {
        if x < self.width && y < self.height {
            self.values[y * self.width + x]
        } else {
            f64::NEG_INFINITY
        }
    }

    /// Store `z` if it is strictly greater than the current value.
    /// Returns whether the pixel should be written.
    pub fn test_and_set(&mut self, x: usize, y: usize, z: f64) -> bool {
        if x < self.width && y < self.height {
            let idx = y * self.width + x;
            if z > self.values[idx] {
                self.values[idx] = z;
                return true;
            }
        }
        false
    }
}

/// Where covered pixels take their color from
#[derive(Debug, Clone, Copy)]
pub enum Fill<'a> {
    Solid(Color),
    Texture { texture: &'a Image, uvs: [Vec2; 3] },
}

/// True for zero or near-zero area triangles
pub fn is_degenerate(tri: &Triangle) -> bool {
    let [a, b, c] = tri.points;
    !is_inside(barycentric(a, b, c, a))
}

/// Pixel box covering the triangle, clamped to the target
fn bounding_box(tri: &Triangle, width: usize, height: usize) -> Option<(usize, usize, usize, usize)> {
    if width == 0 || height == 0 {
        return None;
    }
    let [a, b, c] = tri.points;
    let min_x = a.x.min(b.x).min(c.x).floor();
    let max_x = a.x.max(b.x).max(c.x).floor();
    let min_y = a.y.min(b.y).min(c.y).floor();
    let max_y = a.y.max(b.y).max(c.y).floor();

    if !(min_x.is_finite() && max_x.is_finite() && min_y.is_finite() && max_y.is_finite()) {
        return None;
    }

    let (w, h) = ((width - 1) as f64, (height - 1) as f64);
    if max_x < 0.0 || max_y < 0.0 || min_x > w || min_y > h {
        return None;
    }

    Some((
        min_x.max(0.0) as usize,
        max_x.min(w) as usize,
        min_y.max(0.0) as usize,
        max_y.min(h) as usize,
    ))
}

/// Fill one screen triangle. With a depth buffer only pixels nearer than
/// what is stored are written. Returns the number of pixels written.
pub fn rasterize(
    target: &mut Image,
    tri: &Triangle,
    fill: Fill<'_>,
    mut depth: Option<&mut DepthBuffer>,
) -> usize {
    let Some((min_x, max_x, min_y, max_y)) = bounding_box(tri, target.width(), target.height()) else {
        return 0;
    };
    let [a, b, c] = tri.points;
    let mut written = 0;

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let p = Vec3::new(x as f64, y as f64, 0.0);
            let bc = barycentric(a, b, c, p);
            if !is_inside(bc) {
                continue;
            }

            if let Some(zbuf) = depth.as_deref_mut() {
                let z = a.z * bc.x + b.z * bc.y + c.z * bc.z;
                if !zbuf.test_and_set(x, y, z) {
                    continue;
                }
            }

            let color = match fill {
                Fill::Solid(color) => color,
                Fill::Texture { texture, uvs } => {
                    let u = uvs[0].x * bc.x + uvs[1].x * bc.y + uvs[2].x * bc.z;
                    let v = uvs[0].y * bc.x + uvs[1].y * bc.y + uvs[2].y * bc.z;
                    texture.sample(u, v)
                }
            };

            target.set_pixel(x, y, color);
            written += 1;
        }
    }

    written
}

/// Flat fill, every covered pixel written
pub fn draw_triangle(target: &mut Image, tri: &Triangle, color: Color) -> usize {
    rasterize(target, tri, Fill::Solid(color), None)
}

/// Flat fill with depth test
pub fn draw_triangle_with_depth(
    target: &mut Image,
    tri: &Triangle,
    color: Color,
    depth: &mut DepthBuffer,
) -> usize {
    rasterize(target, tri, Fill::Solid(color), Some(depth))
}

/// Textured fill with depth test
pub fn draw_triangle_textured(
    target: &mut Image,
    tri: &Triangle,
    texture: &Image,
    uvs: [Vec2; 3],
    depth: &mut DepthBuffer,
) -> usize {
    rasterize(target, tri, Fill::Texture { texture, uvs }, Some(depth))
}

/// Line from (x0, y0) to (x1, y1), stepping along the major axis.
/// Steps outside the target are skipped and the minor coordinate is
/// clamped to the target. The slope comes from the unclipped endpoints.
pub fn draw_line(target: &mut Image, x0: i64, y0: i64, x1: i64, y1: i64, color: Color) {
    let (w, h) = (target.width() as i64, target.height() as i64);
    if w == 0 || h == 0 {
        return;
    }

    // Deltas in f64: i64 endpoints may span more than i64::MAX
    let dx = x1 as f64 - x0 as f64;
    let dy = y1 as f64 - y0 as f64;

    if dx.abs() > dy.abs() {
        let ((xa, ya), (xb, yb)) = if x0 > x1 { ((x1, y1), (x0, y0)) } else { ((x0, y0), (x1, y1)) };
        let ratio = (yb as f64 - ya as f64) / (xb as f64 - xa as f64);
        for x in xa.max(0)..xb.min(w) {
            let offset = ((x as f64 - xa as f64) * ratio) as i64;
            let y = ya.saturating_add(offset).clamp(0, h - 1);
            target.set_pixel(x as usize, y as usize, color);
        }
    } else if y0 != y1 {
        let ((xa, ya), (xb, yb)) = if y0 > y1 { ((x1, y1), (x0, y0)) } else { ((x0, y0), (x1, y1)) };
        let ratio = (xb as f64 - xa as f64) / (yb as f64 - ya as f64);
        for y in ya.max(0)..yb.min(h) {
            let offset = ((y as f64 - ya as f64) * ratio) as i64;
            let x = xa.saturating_add(offset).clamp(0, w - 1);
            target.set_pixel(x as usize, y as usize, color);
        }
    }
}

/// Counters for one render pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub faces_drawn: usize,
    pub faces_culled: usize,
    pub faces_degenerate: usize,
    pub pixels_written: usize,
}

/// Exclusive use of a target image (plus its depth buffer) for a set of draws.
/// The depth buffer lives exactly as long as the pass.
pub struct RenderPass<'a> {
    target: &'a mut Image,
    depth: Option<DepthBuffer>,
    settings: &'a RasterSettings,
    stats: RenderStats,
}

impl<'a> RenderPass<'a> {
    pub fn begin(target: &'a mut Image, settings: &'a RasterSettings) -> Self {
        let depth = if settings.use_zbuffer {
            Some(DepthBuffer::for_image(target))
        } else {
            None
        };
        Self {
            target,
            depth,
            settings,
            stats: RenderStats::default(),
        }
    }

    /// Matrix for this draw, or `None` for the direct [-1, 1] mapping
    fn screen_transform(&self) -> Option<Mat4> {
        self.settings
            .camera
            .as_ref()
            .map(|camera| Pipeline::new(camera, self.target.width(), self.target.height()).compose())
    }

    fn project(&self, transform: Option<&Mat4>, points: [Vec3; 3]) -> Result<Triangle, MathError> {
        match transform {
            Some(m) => Ok(Triangle::new(
                to_screen(m, points[0])?,
                to_screen(m, points[1])?,
                to_screen(m, points[2])?,
            )),
            None => Ok(Triangle::from_ndc(
                points,
                self.target.width().saturating_sub(1) as f64,
                self.target.height().saturating_sub(1) as f64,
            )),
        }
    }

    /// Cull, transform and fill every face of `mesh`
    pub fn draw_mesh(&mut self, mesh: &Mesh, texture: Option<&Image>) -> Result<(), RenderError> {
        mesh.validate()?;
        let transform = self.screen_transform();
        let settings = self.settings;

        if settings.shading == ShadingMode::Textured {
            if texture.is_none() {
                tracing::warn!("textured shading requested without a texture, using flat shading");
            } else {
                let untextured = mesh.faces.iter().filter(|f| mesh.face_uvs(f).is_none()).count();
                if untextured > 0 {
                    tracing::warn!(faces = untextured, "faces without texture coordinates use flat shading");
                }
            }
        }

        for face in &mesh.faces {
            let model = mesh.face_positions(face);

            if settings.shading == ShadingMode::Wireframe {
                let tri = self.project(transform.as_ref(), model)?;
                for i in 0..3 {
                    let (p, q) = (tri.points[i], tri.points[(i + 1) % 3]);
                    if !(p.x.is_finite() && p.y.is_finite() && q.x.is_finite() && q.y.is_finite()) {
                        continue;
                    }
                    draw_line(self.target, p.x as i64, p.y as i64, q.x as i64, q.y as i64, settings.line_color);
                }
                self.stats.faces_drawn += 1;
                continue;
            }

            let normal = (model[2] - model[0]).cross(model[1] - model[0]).normalize();
            let intensity = normal.dot(settings.light_dir);
            if intensity < 0.0 {
                self.stats.faces_culled += 1;
                continue;
            }

            let tri = self.project(transform.as_ref(), model)?;
            if is_degenerate(&tri) {
                self.stats.faces_degenerate += 1;
                continue;
            }

            let fill = match (settings.shading, texture, mesh.face_uvs(face)) {
                (ShadingMode::Textured, Some(texture), Some(uvs)) => Fill::Texture { texture, uvs },
                _ => Fill::Solid(Color::gray(intensity)),
            };

            self.stats.pixels_written += rasterize(self.target, &tri, fill, self.depth.as_mut());
            self.stats.faces_drawn += 1;
        }

        Ok(())
    }

    /// End the pass, dropping the depth buffer
    pub fn finish(self) -> RenderStats {
        tracing::debug!(
            drawn = self.stats.faces_drawn,
            culled = self.stats.faces_culled,
            degenerate = self.stats.faces_degenerate,
            pixels = self.stats.pixels_written,
            "render pass finished"
        );
        self.stats
    }
}

/// Render a mesh to the target in a single pass
pub fn render_mesh(
    target: &mut Image,
    mesh: &Mesh,
    texture: Option<&Image>,
    settings: &RasterSettings,
) -> Result<RenderStats, RenderError> {
    let mut pass = RenderPass::begin(target, settings);
    pass.draw_mesh(mesh, texture)?;
    Ok(pass.finish())
}
