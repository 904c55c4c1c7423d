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

use super::{MeshVertex, ParametricMesh};
use crate::renderer::{
    api::{
        BufferDescriptor, BufferId, BufferUsage, VertexArrayDescriptor, VertexArrayId,
        VertexAttribute,
    },
    error::ResourceError,
    traits::{GlDevice, GpuResource},
};
use std::borrow::Cow;
use std::mem::size_of;

/// Which index list of a [`ParametricMesh`] a [`GpuMesh`] draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MeshTopology {
    /// Three indices per primitive.
    #[default]
    Triangles,
    /// Four indices per primitive, for tessellation patches.
    Quads,
}

/// Attribute layout of [`MeshVertex`]: position, texture coordinate, tangent
/// and bitangent at locations 0 to 3.
const MESH_ATTRIBUTES: [VertexAttribute; 4] = [
    VertexAttribute {
        location: 0,
        components: 4,
        offset: 0,
    },
    VertexAttribute {
        location: 1,
        components: 4,
        offset: 16,
    },
    VertexAttribute {
        location: 2,
        components: 4,
        offset: 32,
    },
    VertexAttribute {
        location: 3,
        components: 4,
        offset: 48,
    },
];

/// A parametric mesh resident on the GPU: vertex and index buffers bound into
/// one vertex array.
///
/// Must be released with [`GpuMesh::destroy`].
#[derive(Debug)]
pub struct GpuMesh {
    vertex_buffer: BufferId,
    index_buffer: BufferId,
    vertex_array: VertexArrayId,
    index_count: u32,
    topology: MeshTopology,
}

impl GpuMesh {
    /// Uploads the vertices of `mesh` and the index list selected by
    /// `topology` into static buffers.
    ///
    /// # Errors
    ///
    /// Returns the first device error. Objects created before the failure are
    /// released.
    pub fn upload(
        device: &dyn GlDevice,
        mesh: &ParametricMesh,
        topology: MeshTopology,
    ) -> Result<Self, ResourceError> {
        let indices = match topology {
            MeshTopology::Triangles => mesh.triangles(),
            MeshTopology::Quads => mesh.quads(),
        };

        let vertex_buffer = device.create_buffer_with_data(
            &BufferDescriptor {
                label: Some(Cow::Borrowed("Mesh Vertices")),
                size: (mesh.vertices().len() * size_of::<MeshVertex>()) as u64,
                usage: BufferUsage::StaticDraw,
            },
            bytemuck::cast_slice(mesh.vertices()),
        )?;

        let index_buffer = match device.create_buffer_with_data(
            &BufferDescriptor {
                label: Some(Cow::Borrowed("Mesh Indices")),
                size: std::mem::size_of_val(indices) as u64,
                usage: BufferUsage::StaticDraw,
            },
            bytemuck::cast_slice(indices),
        ) {
            Ok(id) => id,
            Err(e) => {
                release_quietly(device, vertex_buffer);
                return Err(e);
            }
        };

        let vertex_array = match device.create_vertex_array(&VertexArrayDescriptor {
            label: Some(Cow::Borrowed("Mesh")),
            vertex_buffer,
            index_buffer: Some(index_buffer),
            stride: size_of::<MeshVertex>() as u32,
            attributes: &MESH_ATTRIBUTES,
        }) {
            Ok(id) => id,
            Err(e) => {
                release_quietly(device, index_buffer);
                release_quietly(device, vertex_buffer);
                return Err(e);
            }
        };

        log::debug!(
            "Uploaded mesh: {} vertices, {} {:?} indices",
            mesh.vertex_count(),
            indices.len(),
            topology
        );

        Ok(Self {
            vertex_buffer,
            index_buffer,
            vertex_array,
            index_count: indices.len() as u32,
            topology,
        })
    }

    /// The vertex array to bind for drawing.
    pub fn vertex_array(&self) -> VertexArrayId {
        self.vertex_array
    }

    /// Number of indices to draw.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// The uploaded index list.
    pub fn topology(&self) -> MeshTopology {
        self.topology
    }

    /// Releases the vertex array and both buffers.
    ///
    /// # Errors
    ///
    /// Every object is released even if an earlier release fails; the first
    /// error is returned.
    pub fn destroy(self, device: &dyn GlDevice) -> Result<(), ResourceError> {
        let vertex_array = self.vertex_array.release(device);
        let index_buffer = self.index_buffer.release(device);
        let vertex_buffer = self.vertex_buffer.release(device);
        vertex_array.and(index_buffer).and(vertex_buffer)
    }
}

fn release_quietly<H: GpuResource>(device: &dyn GlDevice, handle: H) {
    if let Err(e) = handle.release(device) {
        log::warn!("Failed to release {:?} after a failed mesh upload: {}", handle, e);
    }
}
