//! RGBA pixel buffer shared by the rasterizer and the TGA codec
//!
//! Row-major, 4 bytes per pixel, origin at the top-left corner.

use serde::{Deserialize, Serialize};
use crate::rasterizer::Color;

/// How the alpha channel relates to the color channels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorModel {
    #[default]
    Straight,
    Premultiplied,
}

/// Owned RGBA image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
    pub color_model: ColorModel,
}

impl Image {
    /// Transparent black image
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height * 4],
            color_model: ColorModel::Straight,
        }
    }

    pub fn filled(width: usize, height: usize, color: Color) -> Self {
        let mut image = Self::new(width, height);
        image.fill(color);
        image
    }

    /// Wrap existing RGBA bytes; `None` if the length does not match
    pub fn from_raw(width: usize, height: usize, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() != width * height * 4 {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
            color_model: ColorModel::Straight,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// One row of RGBA bytes
    pub fn row(&self, y: usize) -> &[u8] {
        let stride = self.width * 4;
        &self.pixels[y * stride..(y + 1) * stride]
    }

    pub fn fill(&mut self, color: Color) {
        let bytes = color.to_bytes();
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&bytes);
        }
    }

    /// Pixel at (x, y); transparent black outside the image
    pub fn get_pixel(&self, x: usize, y: usize) -> Color {
        if x < self.width && y < self.height {
            let idx = (y * self.width + x) * 4;
            let p = &self.pixels[idx..idx + 4];
            Color::from_bytes([p[0], p[1], p[2], p[3]])
        } else {
            Color::TRANSPARENT
        }
    }

    /// Out-of-bounds writes are ignored
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Color) {
        if x < self.width && y < self.height {
            let idx = (y * self.width + x) * 4;
            self.pixels[idx..idx + 4].copy_from_slice(&color.to_bytes());
        }
    }

    /// Nearest texel for (u, v) in [0, 1], truncating u*(w-1), v*(h-1)
    pub fn sample(&self, u: f64, v: f64) -> Color {
        if self.width == 0 || self.height == 0 {
            return Color::TRANSPARENT;
        }
        let tx = (u.clamp(0.0, 1.0) * (self.width - 1) as f64) as usize;
        let ty = (v.clamp(0.0, 1.0) * (self.height - 1) as f64) as usize;
        self.get_pixel(tx, ty)
    }

    /// Swap rows top to bottom
    pub fn flip_vertical(&mut self) {
        let stride = self.width * 4;
        for y in 0..self.height / 2 {
            let (top, bottom) = self.pixels.split_at_mut((self.height - y - 1) * stride);
            top[y * stride..(y + 1) * stride].swap_with_slice(&mut bottom[..stride]);
        }
    }

    /// Mirror every row left to right
    pub fn flip_horizontal(&mut self) {
        let stride = self.width * 4;
        if stride == 0 {
            return;
        }
        for row in self.pixels.chunks_exact_mut(stride) {
            for x in 0..self.width / 2 {
                let (left, right) = row.split_at_mut((self.width - x - 1) * 4);
                left[x * 4..x * 4 + 4].swap_with_slice(&mut right[..4]);
            }
        }
    }

    /// Copy into an `image` crate buffer (for PNG export)
    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width as u32, self.height as u32, self.pixels.clone())
    }
}

impl From<image::RgbaImage> for Image {
    fn from(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width: width as usize,
            height: height as usize,
            pixels: img.into_raw(),
            color_model: ColorModel::Straight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn gradient(w: usize, h: usize) -> Image {
        let mut img = Image::new(w, h);
        for y in 0..h {
            for x in 0..w {
                img.set_pixel(x, y, Color::with_alpha(x as u8, y as u8, (x + y) as u8, 255));
            }
        }
        img
    }

    #[test]
    fn test_set_get_pixel() {
        let mut img = Image::new(4, 3);
        img.set_pixel(3, 2, Color::RED);
        assert_eq!(img.get_pixel(3, 2), Color::RED);
        assert_eq!(img.get_pixel(0, 0), Color::TRANSPARENT);
        img.set_pixel(4, 0, Color::RED);
        assert_eq!(img.get_pixel(4, 0), Color::TRANSPARENT);
    }

    #[test]
    fn test_flip_vertical_moves_rows() {
        let mut img = gradient(3, 3);
        img.flip_vertical();
        assert_eq!(img.get_pixel(1, 0), Color::with_alpha(1, 2, 3, 255));
        assert_eq!(img.get_pixel(1, 1), Color::with_alpha(1, 1, 2, 255));
    }

    #[test]
    fn test_flip_horizontal_moves_columns() {
        let mut img = gradient(4, 2);
        img.flip_horizontal();
        assert_eq!(img.get_pixel(0, 1), Color::with_alpha(3, 1, 4, 255));
        assert_eq!(img.get_pixel(3, 0), Color::with_alpha(0, 0, 0, 255));
    }

    #[test]
    fn test_sample_truncates() {
        let img = gradient(5, 5);
        assert_eq!(img.sample(0.0, 0.0), img.get_pixel(0, 0));
        assert_eq!(img.sample(1.0, 1.0), img.get_pixel(4, 4));
        assert_eq!(img.sample(0.49, 0.99), img.get_pixel(1, 3));
    }

    #[test]
    fn test_rgba_image_conversion() {
        let img = gradient(3, 2);
        let back = Image::from(img.to_rgba_image().unwrap());
        assert_eq!(back, img);
    }

    proptest! {
        #[test]
        fn flip_vertical_twice_is_identity(w in 0usize..9, h in 0usize..9, seed in any::<u8>()) {
            let bytes: Vec<u8> = (0..w * h * 4).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect();
            let original = Image::from_raw(w, h, bytes).unwrap();
            let mut img = original.clone();
            img.flip_vertical();
            img.flip_vertical();
            prop_assert_eq!(img, original);
        }

        #[test]
        fn flip_horizontal_twice_is_identity(w in 0usize..9, h in 0usize..9) {
            let bytes: Vec<u8> = (0..w * h * 4).map(|i| (i * 7) as u8).collect();
            let original = Image::from_raw(w, h, bytes).unwrap();
            let mut img = original.clone();
            img.flip_horizontal();
            img.flip_horizontal();
            prop_assert_eq!(img, original);
        }
    }
}
