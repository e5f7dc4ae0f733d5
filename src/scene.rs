//! Scene files
//!
//! A scene bundles everything one render needs: output size and paths,
//! the texture, raster settings and the mesh. Stored as RON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::canvas::Image;
use crate::mesh::{Mesh, MeshError};
use crate::rasterizer::{render_mesh, RenderError, RenderStats};
use crate::tga::{self, EncodeOptions, TgaError};

/// Where the triangles come from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum MeshSource {
    #[default]
    Cube,
    Inline(Mesh),
}

/// A complete render job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub width: usize,
    pub height: usize,
    /// TGA output path
    pub output: PathBuf,
    /// Optional PNG copy of the output
    pub png_output: Option<PathBuf>,
    /// Texture image (TGA, or PNG by extension)
    pub texture: Option<PathBuf>,
    /// Flip the texture vertically after loading (TGA rows are stored bottom-up)
    pub flip_texture: bool,
    /// Flip the framebuffer vertically before saving (screen y grows upward)
    pub flip_output: bool,
    pub settings: crate::rasterizer::RasterSettings,
    pub mesh: MeshSource,
    pub encode: EncodeOptions,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            output: PathBuf::from("output.tga"),
            png_output: None,
            texture: None,
            flip_texture: true,
            flip_output: true,
            settings: Default::default(),
            mesh: MeshSource::Cube,
            encode: EncodeOptions::default(),
        }
    }
}

#[derive(Debug)]
pub enum SceneError {
    IoError(std::io::Error),
    ParseError(ron::error::SpannedError),
    SerializeError(ron::Error),
    Invalid(String),
    Mesh(MeshError),
    Render(RenderError),
    Tga(TgaError),
    Image(image::ImageError),
}

impl From<std::io::Error> for SceneError {
    fn from(e: std::io::Error) -> Self {
        SceneError::IoError(e)
    }
}

impl From<ron::error::SpannedError> for SceneError {
    fn from(e: ron::error::SpannedError) -> Self {
        SceneError::ParseError(e)
    }
}

impl From<ron::Error> for SceneError {
    fn from(e: ron::Error) -> Self {
        SceneError::SerializeError(e)
    }
}

impl From<MeshError> for SceneError {
    fn from(e: MeshError) -> Self {
        SceneError::Mesh(e)
    }
}

impl From<RenderError> for SceneError {
    fn from(e: RenderError) -> Self {
        SceneError::Render(e)
    }
}

impl From<TgaError> for SceneError {
    fn from(e: TgaError) -> Self {
        SceneError::Tga(e)
    }
}

impl From<image::ImageError> for SceneError {
    fn from(e: image::ImageError) -> Self {
        SceneError::Image(e)
    }
}

impl std::fmt::Display for SceneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneError::IoError(e) => write!(f, "IO error: {}", e),
            SceneError::ParseError(e) => write!(f, "Parse error: {}", e),
            SceneError::SerializeError(e) => write!(f, "Serialize error: {}", e),
            SceneError::Invalid(msg) => write!(f, "Invalid scene: {}", msg),
            SceneError::Mesh(e) => write!(f, "Mesh error: {}", e),
            SceneError::Render(e) => write!(f, "Render error: {}", e),
            SceneError::Tga(e) => write!(f, "{}", e),
            SceneError::Image(e) => write!(f, "Image error: {}", e),
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SceneError::IoError(e) => Some(e),
            SceneError::ParseError(e) => Some(e),
            SceneError::SerializeError(e) => Some(e),
            SceneError::Mesh(e) => Some(e),
            SceneError::Render(e) => Some(e),
            SceneError::Tga(e) => Some(e),
            SceneError::Image(e) => Some(e),
            SceneError::Invalid(_) => None,
        }
    }
}

impl Scene {
    /// Reject scenes that cannot produce an image
    pub fn validate(&self) -> Result<(), SceneError> {
        if self.width == 0 || self.height == 0 {
            return Err(SceneError::Invalid(format!(
                "output size {}x{} must be non-zero",
                self.width, self.height
            )));
        }
        if let Some(camera) = &self.settings.camera {
            if camera.distance == 0.0 {
                return Err(SceneError::Invalid("camera distance must be non-zero".to_string()));
            }
        }
        if let MeshSource::Inline(mesh) = &self.mesh {
            mesh.validate()?;
        }
        Ok(())
    }

    /// The mesh to draw
    pub fn mesh(&self) -> Mesh {
        match &self.mesh {
            MeshSource::Cube => Mesh::cube(),
            MeshSource::Inline(mesh) => mesh.clone(),
        }
    }

    /// Rebase relative paths onto `dir`
    fn resolve_paths(&mut self, dir: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = dir.join(&*p);
            }
        };
        resolve(&mut self.output);
        if let Some(p) = self.png_output.as_mut() {
            resolve(p);
        }
        if let Some(p) = self.texture.as_mut() {
            resolve(p);
        }
    }

    /// Load the texture, if any, applying `flip_texture`
    pub fn load_texture(&self) -> Result<Option<Image>, SceneError> {
        let Some(path) = &self.texture else {
            return Ok(None);
        };
        let mut texture = load_image(path)?;
        if self.flip_texture {
            texture.flip_vertical();
        }
        tracing::debug!(
            path = %path.display(),
            width = texture.width(),
            height = texture.height(),
            "loaded texture"
        );
        Ok(Some(texture))
    }

    /// Render into a fresh framebuffer, applying `flip_output`
    pub fn render(&self) -> Result<(Image, RenderStats), SceneError> {
        self.validate()?;
        let texture = self.load_texture()?;
        let mesh = self.mesh();

        let mut framebuffer = Image::new(self.width, self.height);
        let stats = render_mesh(&mut framebuffer, &mesh, texture.as_ref(), &self.settings)?;

        if self.flip_output {
            framebuffer.flip_vertical();
        }
        Ok((framebuffer, stats))
    }

    /// Write the framebuffer to the TGA output and the optional PNG copy
    pub fn save_outputs(&self, framebuffer: &Image) -> Result<(), SceneError> {
        tga::save(framebuffer, &self.output, self.encode)?;
        tracing::info!(path = %self.output.display(), "wrote TGA");

        if let Some(png) = &self.png_output {
            save_png(framebuffer, png)?;
            tracing::info!(path = %png.display(), "wrote PNG");
        }
        Ok(())
    }
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("png"))
        .unwrap_or(false)
}

/// Load a TGA through the codec, or a PNG through `image`
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<Image, SceneError> {
    let path = path.as_ref();
    if is_png(path) {
        Ok(Image::from(image::open(path)?.to_rgba8()))
    } else {
        Ok(tga::load(path)?)
    }
}

/// Save as PNG through `image`
pub fn save_png<P: AsRef<Path>>(img: &Image, path: P) -> Result<(), SceneError> {
    let buffer = img
        .to_rgba_image()
        .ok_or_else(|| SceneError::Invalid("pixel buffer does not match its size".to_string()))?;
    buffer.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}

/// Save as PNG or TGA by extension
pub fn save_image<P: AsRef<Path>>(img: &Image, path: P, options: EncodeOptions) -> Result<(), SceneError> {
    let path = path.as_ref();
    if is_png(path) {
        save_png(img, path)
    } else {
        Ok(tga::save(img, path, options)?)
    }
}

/// Load a scene from a RON file; relative paths resolve against its directory
pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<Scene, SceneError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let mut scene = load_scene_from_str(&contents)?;
    if let Some(dir) = path.parent() {
        scene.resolve_paths(dir);
    }
    Ok(scene)
}

/// Save a scene to a RON file
pub fn save_scene<P: AsRef<Path>>(scene: &Scene, path: P) -> Result<(), SceneError> {
    let config = ron::ser::PrettyConfig::new()
        .depth_limit(4)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(scene, config)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Load a scene from a RON string (paths are left as written)
pub fn load_scene_from_str(s: &str) -> Result<Scene, SceneError> {
    let scene: Scene = ron::from_str(s)?;
    scene.validate()?;
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Face;
    use crate::rasterizer::{Color, ShadingMode, Vec3};

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tinyrender-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_minimal_scene_uses_defaults() {
        let scene = load_scene_from_str("(width: 64, height: 32)").unwrap();
        assert_eq!((scene.width, scene.height), (64, 32));
        assert_eq!(scene.mesh, MeshSource::Cube);
        assert!(scene.flip_texture && scene.flip_output);
        assert_eq!(scene.settings.shading, ShadingMode::Textured);
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(load_scene_from_str("(width: 0)"), Err(SceneError::Invalid(_))));
        assert!(matches!(
            load_scene_from_str("(settings: (camera: Some((distance: 0.0))))"),
            Err(SceneError::Invalid(_))
        ));
        let bad_mesh = "(mesh: Inline((positions: [(x: 0.0, y: 0.0, z: 0.0)], faces: [(corners: ((position: 0), (position: 1), (position: 0)))])))";
        assert!(matches!(
            load_scene_from_str(bad_mesh),
            Err(SceneError::Mesh(MeshError::PositionOutOfRange { index: 1, .. }))
        ));
        assert!(matches!(load_scene_from_str("(width: "), Err(SceneError::ParseError(_))));
    }

    #[test]
    fn test_save_and_load_resolves_paths() {
        let dir = temp_dir("scene");
        let scene = Scene {
            width: 16,
            height: 16,
            output: PathBuf::from("out.tga"),
            texture: Some(PathBuf::from("tex.tga")),
            ..Default::default()
        };
        let path = dir.join("scene.ron");
        save_scene(&scene, &path).unwrap();

        let loaded = load_scene(&path).unwrap();
        assert_eq!(loaded.output, dir.join("out.tga"));
        assert_eq!(loaded.texture, Some(dir.join("tex.tga")));
        assert_eq!(loaded.settings, scene.settings);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_render_flat_cube() {
        let mut scene = Scene {
            width: 64,
            height: 64,
            ..Default::default()
        };
        scene.settings.shading = ShadingMode::Flat;
        let (fb, stats) = scene.render().unwrap();
        assert!(stats.faces_drawn > 0);
        assert!(stats.faces_culled > 0);
        assert!(fb.as_bytes().iter().any(|&b| b != 0));
    }

    #[test]
    fn test_render_and_save_inline_mesh() {
        let dir = temp_dir("render");
        let mesh = Mesh {
            positions: vec![
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(-1.0, 1.0, 0.0),
            ],
            uvs: vec![],
            faces: vec![Face::tri(0, 1, 2)],
        };
        let mut scene = Scene {
            width: 8,
            height: 8,
            output: dir.join("out.tga"),
            png_output: Some(dir.join("out.png")),
            flip_output: false,
            mesh: MeshSource::Inline(mesh),
            ..Default::default()
        };
        scene.settings.shading = ShadingMode::Flat;
        scene.settings.camera = None;

        let (fb, stats) = scene.render().unwrap();
        assert_eq!(stats.faces_drawn, 1);
        scene.save_outputs(&fb).unwrap();

        // 24-bit output drops alpha; colors survive
        let tga = tga::load(&scene.output).unwrap();
        assert_eq!(tga.get_pixel(1, 1), Color::WHITE);
        let png = load_image(dir.join("out.png")).unwrap();
        assert_eq!(png, fb);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_texture_is_io_error() {
        let scene = Scene {
            texture: Some(PathBuf::from("/nonexistent/tinyrender/tex.tga")),
            ..Default::default()
        };
        assert!(matches!(scene.render(), Err(SceneError::Tga(TgaError::Io(_)))));
    }
}
