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

//! Defines data structures related to GPU buffer resources.

use std::borrow::Cow;

/// The binding point a buffer object is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex attribute data.
    Array,
    /// Vertex indices.
    ElementArray,
    /// Uniform block storage (indexed).
    Uniform,
    /// Shader storage block (indexed).
    ShaderStorage,
    /// Atomic counter storage (indexed).
    AtomicCounter,
    /// Transform feedback capture (indexed).
    TransformFeedback,
    /// Indirect draw arguments.
    DrawIndirect,
}

impl BufferTarget {
    /// Whether the target has numbered binding points usable with a range bind.
    pub const fn is_indexed(self) -> bool {
        matches!(
            self,
            BufferTarget::Uniform
                | BufferTarget::ShaderStorage
                | BufferTarget::AtomicCounter
                | BufferTarget::TransformFeedback
        )
    }
}

/// How the contents of a buffer are expected to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferUsage {
    /// Written once, drawn many times.
    #[default]
    StaticDraw,
    /// Rewritten occasionally.
    DynamicDraw,
    /// Rewritten every use.
    StreamDraw,
}

/// A descriptor used to create a [`BufferId`].
#[derive(Debug, Clone)]
pub struct BufferDescriptor<'a> {
    /// An optional debug label for the buffer.
    pub label: Option<Cow<'a, str>>,
    /// The total size of the buffer in bytes.
    pub size: u64,
    /// The expected update pattern.
    pub usage: BufferUsage,
}

/// An opaque handle to a GPU buffer resource.
///
/// This ID is returned by [`GlDevice::create_buffer`](crate::renderer::GlDevice::create_buffer)
/// and is used to reference the buffer in all subsequent operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub usize);
