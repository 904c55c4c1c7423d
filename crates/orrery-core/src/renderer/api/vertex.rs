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

//! Defines vertex array objects and their attribute layouts.

use super::buffer::BufferId;
use std::borrow::Cow;

/// One floating-point vertex attribute sourced from the vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// The shader input location.
    pub location: u32,
    /// Number of `f32` components (1 to 4).
    pub components: u32,
    /// Byte offset of the attribute within one vertex.
    pub offset: u64,
}

/// A descriptor used to create a [`VertexArrayId`].
#[derive(Debug, Clone)]
pub struct VertexArrayDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The buffer every attribute reads from.
    pub vertex_buffer: BufferId,
    /// The element buffer bound into the vertex array, if any.
    pub index_buffer: Option<BufferId>,
    /// Distance in bytes between consecutive vertices.
    pub stride: u32,
    /// The enabled attributes.
    pub attributes: &'a [VertexAttribute],
}

/// An opaque handle to a vertex array object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayId(pub usize);
