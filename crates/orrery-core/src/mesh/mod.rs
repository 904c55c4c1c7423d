// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Parametric surface meshes with analytic tangent frames.
//!
//! Every generator evaluates a surface on a regular `(s, t)` grid padded by two
//! samples along each axis, so the seams of closed surfaces (sphere poles,
//! cylinder and torus wrap) get their own duplicated vertices. The same vertex
//! array is indexed by two topologies: a `u16` triangle list and a `u16` quad
//! list.

mod gpu;
mod obj;
mod surfaces;

pub use self::gpu::{GpuMesh, MeshTopology};

use crate::math::Vec4;
use std::fmt;

/// Largest vertex count addressable by a 16-bit index buffer.
pub const MAX_MESH_VERTICES: usize = 1 << 16;

/// One vertex of a parametric mesh.
///
/// Four `vec4` attributes, 64 bytes, in the order the vertex array binds them.
#[derive(Debug, Default, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct MeshVertex {
    /// Surface position, `w = 1`.
    pub position: Vec4,
    /// Texture coordinate in `xy`; `zw` are zero.
    pub tex_coord: Vec4,
    /// Partial derivative of the position along `s`.
    pub tangent: Vec4,
    /// Partial derivative of the position along `t`.
    pub bitangent: Vec4,
}

/// Errors produced while generating or exporting a mesh.
#[derive(Debug)]
pub enum MeshError {
    /// The padded tessellation needs more vertices than a `u16` index can address.
    TooManyVertices {
        /// The number of vertices the request would have produced.
        requested: usize,
        /// The largest supported vertex count.
        max: usize,
    },
    /// The tangent frame of a vertex collapses, so no normal can be derived.
    DegenerateNormal {
        /// Index of the offending vertex.
        vertex: usize,
    },
    /// Writing the exported file failed.
    Io(std::io::Error),
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshError::TooManyVertices { requested, max } => {
                write!(f, "Too many vertices: {requested} requested, at most {max} supported")
            }
            MeshError::DegenerateNormal { vertex } => {
                write!(f, "Vertex {vertex} has a degenerate tangent frame")
            }
            MeshError::Io(err) => write!(f, "Mesh I/O error: {err}"),
        }
    }
}

impl std::error::Error for MeshError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MeshError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MeshError {
    fn from(err: std::io::Error) -> Self {
        MeshError::Io(err)
    }
}

/// An immutable parametric mesh: vertices plus triangle and quad index lists.
#[derive(Debug, Clone)]
pub struct ParametricMesh {
    vertices: Vec<MeshVertex>,
    triangles: Vec<u16>,
    quads: Vec<u16>,
}

impl ParametricMesh {
    /// All vertices, grid column by grid column.
    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    /// Triangle-list indices, three per triangle.
    pub fn triangles(&self) -> &[u16] {
        &self.triangles
    }

    /// Quad-list indices, four per quad.
    pub fn quads(&self) -> &[u16] {
        &self.quads
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// Number of quads.
    pub fn quad_count(&self) -> usize {
        self.quads.len() / 4
    }
}

/// Padded grid dimensions `(slices + 2, stacks + 2)`, rejected when the grid
/// would not fit in 16-bit indices.
fn padded_grid(slices: u32, stacks: u32) -> Result<(usize, usize), MeshError> {
    let columns = slices as usize + 2;
    let rows = stacks as usize + 2;
    match columns.checked_mul(rows) {
        Some(count) if count <= MAX_MESH_VERTICES => Ok((columns, rows)),
        requested => Err(MeshError::TooManyVertices {
            requested: requested.unwrap_or(usize::MAX),
            max: MAX_MESH_VERTICES,
        }),
    }
}

/// Builds the triangle and quad index lists of a `columns x rows` vertex grid.
///
/// Cells are visited row-major over `(row, column)`; the corner of cell
/// `(i, j)` is vertex `j + rows * i`.
fn grid_topology(columns: usize, rows: usize) -> (Vec<u16>, Vec<u16>) {
    let cells = (columns - 1) * (rows - 1);
    let mut triangles = Vec::with_capacity(cells * 6);
    let mut quads = Vec::with_capacity(cells * 4);
    // Indices fit: `padded_grid` bounds `columns * rows` by 65536.
    let at = |i: usize, j: usize| (j + rows * i) as u16;

    for j in 0..rows - 1 {
        for i in 0..columns - 1 {
            triangles.extend_from_slice(&[at(i, j), at(i + 1, j), at(i, j + 1)]);
            triangles.extend_from_slice(&[at(i, j + 1), at(i + 1, j), at(i + 1, j + 1)]);
            quads.extend_from_slice(&[at(i, j), at(i + 1, j), at(i + 1, j + 1), at(i, j + 1)]);
        }
    }

    (triangles, quads)
}

impl ParametricMesh {
    /// Evaluates `surface(s, t)` over the padded grid and attaches the grid topology.
    fn from_surface<F>(slices: u32, stacks: u32, mut surface: F) -> Result<Self, MeshError>
    where
        F: FnMut(f32, f32) -> MeshVertex,
    {
        let (columns, rows) = padded_grid(slices, stacks)?;
        let mut vertices = Vec::with_capacity(columns * rows);

        for x in 0..columns {
            let s = x as f32 / (columns - 1) as f32;
            for z in 0..rows {
                let t = z as f32 / (rows - 1) as f32;
                vertices.push(surface(s, t));
            }
        }

        let (triangles, quads) = grid_topology(columns, rows);
        log::trace!(
            "Generated parametric mesh: {} vertices, {} triangles",
            vertices.len(),
            triangles.len() / 3
        );

        Ok(Self {
            vertices,
            triangles,
            quads,
        })
    }
}
