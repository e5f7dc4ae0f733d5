//! Vector and matrix math for the transform chain
//!
//! Vectors are plain `Copy` values; every operation returns a new value.
//! Shape and homogeneous-divide failures are reported through `MathError`.

use std::fmt;
use std::ops::{Add, Mul, Sub};
use serde::{Deserialize, Serialize};

/// Denominator used when normalizing a zero-length vector
const NORMALIZE_EPSILON: f64 = 0.000001;

/// Area threshold below which a screen triangle counts as degenerate
const DEGENERATE_EPSILON: f64 = 0.000001;

/// Errors raised by matrix operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    /// Operand shapes are incompatible for the requested operation
    DimensionMismatch {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },
    /// Converting a homogeneous column back to 3D with w == 0
    HomogeneousDivideByZero,
}

impl fmt::Display for MathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MathError::DimensionMismatch { op, left, right } => write!(
                f,
                "matrix {} dimension mismatch: {}x{} vs {}x{}",
                op, left.0, left.1, right.0, right.1
            ),
            MathError::HomogeneousDivideByZero => {
                write!(f, "homogeneous w component is zero")
            }
        }
    }
}

impl std::error::Error for MathError {}

/// 3D Vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
    pub const UP: Vec3 = Vec3 { x: 0.0, y: 1.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn len(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction.
    /// A zero vector stays zero: its length is replaced by a tiny epsilon.
    pub fn normalize(self) -> Vec3 {
        let mut l = self.len();
        if l == 0.0 {
            l = NORMALIZE_EPSILON;
        }
        Vec3 {
            x: self.x / l,
            y: self.y / l,
            z: self.z / l,
        }
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

/// 2D Vector (for texture coordinates)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 4x4 homogeneous matrix, row-major, stack allocated
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    pub m: [[f64; 4]; 4],
}

impl Mat4 {
    pub const ZERO: Mat4 = Mat4 { m: [[0.0; 4]; 4] };

    pub const IDENTITY: Mat4 = Mat4 {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub fn from_rows(m: [[f64; 4]; 4]) -> Self {
        Self { m }
    }

    /// Apply to a point (x, y, z, 1) and divide by the resulting w.
    pub fn transform_point(&self, v: Vec3) -> Result<Vec3, MathError> {
        let h = [v.x, v.y, v.z, 1.0];
        let mut out = [0.0; 4];
        for (i, row) in self.m.iter().enumerate() {
            out[i] = row.iter().zip(h.iter()).map(|(a, b)| a * b).sum();
        }
        let w = out[3];
        if w == 0.0 {
            return Err(MathError::HomogeneousDivideByZero);
        }
        Ok(Vec3::new(out[0] / w, out[1] / w, out[2] / w))
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Mat4 {
    type Output = Mat4;
    fn mul(self, other: Mat4) -> Mat4 {
        let mut r = Mat4::ZERO;
        for i in 0..4 {
            for j in 0..4 {
                for k in 0..4 {
                    r.m[i][j] += self.m[i][k] * other.m[k][j];
                }
            }
        }
        r
    }
}

/// General rectangular matrix with explicit shape
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Zero-filled `rows` x `cols` matrix
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::empty(n, n);
        for i in 0..n {
            m.set(i, i, 1.0);
        }
        m
    }

    /// Build from nested rows; every row must have the same length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, MathError> {
        let cols = rows.first().map_or(0, |r| r.len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            if row.len() != cols {
                return Err(MathError::DimensionMismatch {
                    op: "construct",
                    left: (rows.len(), cols),
                    right: (1, row.len()),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// Homogeneous 4x1 column (x, y, z, 1)
    pub fn from_vec3(v: Vec3) -> Self {
        Self {
            rows: 4,
            cols: 1,
            data: vec![v.x, v.y, v.z, 1.0],
        }
    }

    /// Back to 3D by dividing through the w component of a 4x1 column.
    pub fn to_vec3(&self) -> Result<Vec3, MathError> {
        if self.rows != 4 || self.cols != 1 {
            return Err(MathError::DimensionMismatch {
                op: "to_vec3",
                left: (self.rows, self.cols),
                right: (4, 1),
            });
        }
        let w = self.data[3];
        if w == 0.0 {
            return Err(MathError::HomogeneousDivideByZero);
        }
        Ok(Vec3::new(self.data[0] / w, self.data[1] / w, self.data[2] / w))
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    pub fn mul(&self, other: &Matrix) -> Result<Matrix, MathError> {
        if self.cols != other.rows {
            return Err(MathError::DimensionMismatch {
                op: "mul",
                left: (self.rows, self.cols),
                right: (other.rows, other.cols),
            });
        }
        let mut r = Matrix::empty(self.rows, other.cols);
        for i in 0..self.rows {
            for j in 0..other.cols {
                let mut sum = 0.0;
                for k in 0..self.cols {
                    sum += self.get(i, k) * other.get(k, j);
                }
                r.set(i, j, sum);
            }
        }
        Ok(r)
    }

    pub fn add(&self, other: &Matrix) -> Result<Matrix, MathError> {
        self.zip_with(other, "add", |a, b| a + b)
    }

    pub fn sub(&self, other: &Matrix) -> Result<Matrix, MathError> {
        self.zip_with(other, "sub", |a, b| a - b)
    }

    fn zip_with(
        &self,
        other: &Matrix,
        op: &'static str,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<Matrix, MathError> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(MathError::DimensionMismatch {
                op,
                left: (self.rows, self.cols),
                right: (other.rows, other.cols),
            });
        }
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(a, b)| f(*a, *b))
                .collect(),
        })
    }
}

impl From<Mat4> for Matrix {
    fn from(m: Mat4) -> Self {
        Matrix {
            rows: 4,
            cols: 4,
            data: m.m.iter().flatten().copied().collect(),
        }
    }
}

impl TryFrom<&Matrix> for Mat4 {
    type Error = MathError;

    fn try_from(m: &Matrix) -> Result<Self, Self::Error> {
        if m.rows != 4 || m.cols != 4 {
            return Err(MathError::DimensionMismatch {
                op: "into_mat4",
                left: (m.rows, m.cols),
                right: (4, 4),
            });
        }
        let mut r = Mat4::ZERO;
        for i in 0..4 {
            for j in 0..4 {
                r.m[i][j] = m.get(i, j);
            }
        }
        Ok(r)
    }
}

/// Barycentric coordinates of `p` in screen triangle (a, b, c).
///
/// Only x and y take part. Near-zero area triangles return the sentinel
/// (-1, 1, 1), which never passes an inside test.
pub fn barycentric(a: Vec3, b: Vec3, c: Vec3, p: Vec3) -> Vec3 {
    let sx = Vec3::new(c.x - a.x, b.x - a.x, a.x - p.x);
    let sy = Vec3::new(c.y - a.y, b.y - a.y, a.y - p.y);
    let u = sx.cross(sy);

    if u.z.abs() < DEGENERATE_EPSILON {
        return Vec3::new(-1.0, 1.0, 1.0);
    }

    Vec3::new(1.0 - (u.x + u.y) / u.z, u.y / u.z, u.x / u.z)
}

/// True if every barycentric weight is non-negative
pub fn is_inside(bc: Vec3) -> bool {
    bc.x >= 0.0 && bc.y >= 0.0 && bc.z >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_dot() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert!((a.dot(b) - 32.0).abs() < 1e-9);
    }

    #[test]
    fn test_vec3_cross() {
        let a = Vec3::new(1.0, 0.0, 0.0);
        let b = Vec3::new(0.0, 1.0, 0.0);
        assert_eq!(a.cross(b), Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_normalize_zero_is_forgiving() {
        let n = Vec3::ZERO.normalize();
        assert_eq!(n, Vec3::ZERO);
        assert!(!n.x.is_nan());
    }

    #[test]
    fn test_normalize_unit_length() {
        let n = Vec3::new(3.0, 4.0, 0.0).normalize();
        assert!((n.len() - 1.0).abs() < 1e-12);
        assert!((n.x - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_matrix_mul_shapes() {
        let a = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        let b = Matrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        let c = a.mul(&b).unwrap();
        assert_eq!((c.rows(), c.cols()), (3, 3));
        assert_eq!(c.get(0, 0), 9.0);
        assert_eq!(c.get(2, 2), 51.0);
    }

    #[test]
    fn test_matrix_mul_mismatch() {
        let a = Matrix::empty(3, 2);
        let err = a.mul(&a).unwrap_err();
        assert_eq!(
            err,
            MathError::DimensionMismatch { op: "mul", left: (3, 2), right: (3, 2) }
        );
    }

    #[test]
    fn test_matrix_add_sub() {
        let a = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(a.add(&a).unwrap().get(1, 1), 8.0);
        assert_eq!(a.sub(&a).unwrap(), Matrix::empty(2, 2));
        assert!(a.add(&Matrix::empty(2, 3)).is_err());
    }

    #[test]
    fn test_ragged_rows_rejected() {
        assert!(Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).is_err());
    }

    #[test]
    fn test_homogeneous_round_trip() {
        let v = Vec3::new(1.5, -2.0, 3.0);
        let col = Matrix::from_vec3(v);
        assert_eq!(col.to_vec3().unwrap(), v);

        let mut zero_w = col.clone();
        zero_w.set(3, 0, 0.0);
        assert_eq!(zero_w.to_vec3(), Err(MathError::HomogeneousDivideByZero));
    }

    #[test]
    fn test_mat4_matches_general_matrix() {
        let mut m = Mat4::IDENTITY;
        m.m[0][3] = 2.0;
        m.m[3][2] = -0.5;
        let v = Vec3::new(1.0, 1.0, 1.0);

        let general = Matrix::from(m).mul(&Matrix::from_vec3(v)).unwrap().to_vec3().unwrap();
        assert_eq!(m.transform_point(v).unwrap(), general);
        assert_eq!(Mat4::try_from(&Matrix::from(m)).unwrap(), m);
    }

    #[test]
    fn test_barycentric_inside() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(4.0, 0.0, 0.0);
        let c = Vec3::new(0.0, 4.0, 0.0);
        let bc = barycentric(a, b, c, Vec3::new(1.0, 1.0, 0.0));
        assert!(is_inside(bc));
        assert!((bc.x + bc.y + bc.z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_barycentric_outside() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(4.0, 0.0, 0.0);
        let c = Vec3::new(0.0, 4.0, 0.0);
        let bc = barycentric(a, b, c, Vec3::new(-1.0, -1.0, 0.0));
        assert!(!is_inside(bc));
    }

    #[test]
    fn test_barycentric_vertex_weights() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(4.0, 0.0, 0.0);
        let c = Vec3::new(0.0, 4.0, 0.0);
        assert_eq!(barycentric(a, b, c, b), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(barycentric(a, b, c, c), Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_barycentric_degenerate_sentinel() {
        let p = Vec3::new(2.0, 2.0, 0.0);
        let bc = barycentric(p, p, p, p);
        assert_eq!(bc, Vec3::new(-1.0, 1.0, 1.0));
        assert!(!is_inside(bc));
    }
}
