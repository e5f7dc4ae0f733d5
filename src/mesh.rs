//! Indexed triangle mesh consumed by the rasterizer
//!
//! Pure data with index validation. Parsing text mesh formats happens
//! elsewhere; anything that produces these lists can feed the renderer.

use std::fmt;
use serde::{Deserialize, Serialize};
use crate::rasterizer::{Vec2, Vec3};

/// One face corner: index into `positions`, optional index into `uvs`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corner {
    pub position: usize,
    #[serde(default)]
    pub uv: Option<usize>,
}

impl Corner {
    pub fn new(position: usize, uv: Option<usize>) -> Self {
        Self { position, uv }
    }
}

/// A triangle face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Face {
    pub corners: [Corner; 3],
}

impl Face {
    /// Face without texture coordinates
    pub fn tri(v0: usize, v1: usize, v2: usize) -> Self {
        Self {
            corners: [Corner::new(v0, None), Corner::new(v1, None), Corner::new(v2, None)],
        }
    }

    /// Face whose UV indices equal its position indices
    pub fn textured(v0: usize, v1: usize, v2: usize) -> Self {
        Self {
            corners: [
                Corner::new(v0, Some(v0)),
                Corner::new(v1, Some(v1)),
                Corner::new(v2, Some(v2)),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    PositionOutOfRange { face: usize, index: usize, len: usize },
    UvOutOfRange { face: usize, index: usize, len: usize },
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshError::PositionOutOfRange { face, index, len } => {
                write!(f, "face {}: position index {} out of range ({} positions)", face, index, len)
            }
            MeshError::UvOutOfRange { face, index, len } => {
                write!(f, "face {}: uv index {} out of range ({} uvs)", face, index, len)
            }
        }
    }
}

impl std::error::Error for MeshError {}

/// Positions, texture coordinates and faces
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    #[serde(default)]
    pub uvs: Vec<Vec2>,
    pub faces: Vec<Face>,
}

impl Mesh {
    /// Check every corner index against the vertex lists
    pub fn validate(&self) -> Result<(), MeshError> {
        for (face_idx, face) in self.faces.iter().enumerate() {
            for corner in &face.corners {
                if corner.position >= self.positions.len() {
                    return Err(MeshError::PositionOutOfRange {
                        face: face_idx,
                        index: corner.position,
                        len: self.positions.len(),
                    });
                }
                if let Some(uv) = corner.uv {
                    if uv >= self.uvs.len() {
                        return Err(MeshError::UvOutOfRange {
                            face: face_idx,
                            index: uv,
                            len: self.uvs.len(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Model-space corners of a face. The mesh must be validated.
    pub fn face_positions(&self, face: &Face) -> [Vec3; 3] {
        face.corners.map(|c| self.positions[c.position])
    }

    /// UVs of a face, if every corner has one
    pub fn face_uvs(&self, face: &Face) -> Option<[Vec2; 3]> {
        let [a, b, c] = face.corners;
        Some([
            *self.uvs.get(a.uv?)?,
            *self.uvs.get(b.uv?)?,
            *self.uvs.get(c.uv?)?,
        ])
    }

    /// Unit cube centred on the origin, two textured triangles per side,
    /// counter-clockwise seen from outside. Under the default light the
    /// +Z side gets full intensity and the -Z side is culled.
    pub fn cube() -> Self {
        let mut mesh = Mesh::default();

        let sides = [
            // Front (+Z)
            [
                Vec3::new(-0.5, -0.5, 0.5),
                Vec3::new(0.5, -0.5, 0.5),
                Vec3::new(0.5, 0.5, 0.5),
                Vec3::new(-0.5, 0.5, 0.5),
            ],
            // Back (-Z)
            [
                Vec3::new(0.5, -0.5, -0.5),
                Vec3::new(-0.5, -0.5, -0.5),
                Vec3::new(-0.5, 0.5, -0.5),
                Vec3::new(0.5, 0.5, -0.5),
            ],
            // Top (+Y)
            [
                Vec3::new(-0.5, 0.5, 0.5),
                Vec3::new(0.5, 0.5, 0.5),
                Vec3::new(0.5, 0.5, -0.5),
                Vec3::new(-0.5, 0.5, -0.5),
            ],
            // Bottom (-Y)
            [
                Vec3::new(-0.5, -0.5, -0.5),
                Vec3::new(0.5, -0.5, -0.5),
                Vec3::new(0.5, -0.5, 0.5),
                Vec3::new(-0.5, -0.5, 0.5),
            ],
            // Right (+X)
            [
                Vec3::new(0.5, -0.5, 0.5),
                Vec3::new(0.5, -0.5, -0.5),
                Vec3::new(0.5, 0.5, -0.5),
                Vec3::new(0.5, 0.5, 0.5),
            ],
            // Left (-X)
            [
                Vec3::new(-0.5, -0.5, -0.5),
                Vec3::new(-0.5, -0.5, 0.5),
                Vec3::new(-0.5, 0.5, 0.5),
                Vec3::new(-0.5, 0.5, -0.5),
            ],
        ];

        let uvs = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];

        for side in sides {
            let base = mesh.positions.len();
            mesh.positions.extend_from_slice(&side);
            mesh.uvs.extend_from_slice(&uvs);
            mesh.faces.push(Face::textured(base, base + 1, base + 2));
            mesh.faces.push(Face::textured(base, base + 2, base + 3));
        }

        mesh
    }
}
