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

use crate::renderer::api::*;
use crate::renderer::error::ResourceError;
use std::fmt::Debug;

/// The OpenGL operations the toolkit is built on.
///
/// Implementations own the mapping from opaque ids to native GL object names.
/// GL contexts are bound to one thread, so the trait does not require
/// `Send` or `Sync`; every method takes `&self` and runs synchronously on
/// the context's thread.
pub trait GlDevice: Debug {
    // --- Programs ---

    /// Creates an empty program object.
    /// ## Returns
    /// The ID of the new program.
    /// ## Errors
    /// * `ResourceError` - If the driver refuses to create the object.
    fn create_program(&self) -> Result<ProgramId, ResourceError>;

    /// Compiles one shader stage from the concatenation of `sources`.
    /// ## Arguments
    /// * `stage` - The pipeline stage to compile for.
    /// * `sources` - Source strings, concatenated in order by the compiler.
    /// ## Returns
    /// The ID of the compiled shader object.
    /// ## Errors
    /// * `ResourceError::Shader(ShaderError::StageCompileFailed)` - Carrying the
    ///   driver's info log when compilation fails. The shader object is released.
    fn compile_shader(&self, stage: ShaderStage, sources: &[&str])
        -> Result<ShaderId, ResourceError>;

    /// Attaches a compiled shader to a program.
    fn attach_shader(&self, program: ProgramId, shader: ShaderId) -> Result<(), ResourceError>;

    /// Flags a shader object for deletion. Attached shaders live until their
    /// program is deleted.
    fn destroy_shader(&self, shader: ShaderId) -> Result<(), ResourceError>;

    /// Links a program.
    /// ## Errors
    /// * `ResourceError::Shader(ShaderError::LinkFailed)` - Carrying the
    ///   driver's info log when linking fails.
    fn link_program(&self, program: ProgramId) -> Result<(), ResourceError>;

    /// Deletes a program object.
    fn destroy_program(&self, program: ProgramId) -> Result<(), ResourceError>;

    // --- Buffers ---

    /// Creates a buffer object with uninitialized storage of `descriptor.size` bytes.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError>;

    /// Creates a buffer object initialized with `data`, sized to `data.len()`.
    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError>;

    /// Re-specifies the storage of an existing buffer with uninitialized
    /// contents. The driver hands out fresh memory while draws still
    /// reading the previous storage complete undisturbed.
    fn reallocate_buffer(
        &self,
        id: BufferId,
        size: u64,
        usage: BufferUsage,
    ) -> Result<(), ResourceError>;

    /// Writes `data` at `offset` through an unsynchronized write mapping.
    ///
    /// The caller guarantees the range is not in use by the GPU.
    /// ## Errors
    /// * `ResourceError::BufferMapFailed` - If the driver refuses the mapping.
    fn write_buffer_unsynchronized(
        &self,
        id: BufferId,
        offset: u64,
        data: &[u8],
    ) -> Result<(), ResourceError>;

    /// Binds a whole buffer to a target.
    fn bind_buffer(&self, target: BufferTarget, id: BufferId) -> Result<(), ResourceError>;

    /// Binds `size` bytes starting at `offset` to binding point `index` of an
    /// indexed target.
    fn bind_buffer_range(
        &self,
        target: BufferTarget,
        index: u32,
        id: BufferId,
        offset: u64,
        size: u64,
    ) -> Result<(), ResourceError>;

    /// Deletes a buffer object.
    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError>;

    // --- Vertex arrays ---

    /// Creates a vertex array reading float attributes from one buffer.
    fn create_vertex_array(
        &self,
        descriptor: &VertexArrayDescriptor,
    ) -> Result<VertexArrayId, ResourceError>;

    /// Deletes a vertex array object.
    fn destroy_vertex_array(&self, id: VertexArrayId) -> Result<(), ResourceError>;

    // --- Textures ---

    /// Whether immutable texture storage is available.
    fn supports_immutable_storage(&self) -> bool;

    /// Creates a texture and allocates its storage.
    /// ## Arguments
    /// * `descriptor` - Target, format, level-0 extent and storage kind. Mutable
    ///   storage allocates level 0 only (all six faces for cube maps).
    /// ## Errors
    /// * `ResourceError` - If creation or allocation fails; nothing is leaked.
    fn create_texture(
        &self,
        descriptor: &TextureStorageDescriptor,
    ) -> Result<TextureId, ResourceError>;

    /// Uploads a sub-image into level 0 using the current pixel-unpack state.
    /// ## Errors
    /// * `ResourceError::GlError` - If the transfer raised a GL error.
    fn write_texture(&self, id: TextureId, write: &TextureWrite) -> Result<(), ResourceError>;

    /// Generates the mip chain from level 0.
    fn generate_mipmap(&self, id: TextureId) -> Result<(), ResourceError>;

    /// Deletes a texture object.
    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError>;

    /// Reads the current pixel-unpack state.
    fn pixel_unpack_state(&self) -> PixelStoreState;

    /// Replaces the pixel-unpack state.
    fn set_pixel_unpack_state(&self, state: &PixelStoreState);

    /// Reads the current pixel-pack state.
    fn pixel_pack_state(&self) -> PixelStoreState;

    /// Replaces the pixel-pack state.
    fn set_pixel_pack_state(&self, state: &PixelStoreState);

    /// Reads the current viewport of a color buffer using the current
    /// pixel-pack state. The previous read buffer is restored.
    fn read_color_buffer(
        &self,
        source: ColorSource,
        format: PixelFormat,
        ty: PixelType,
    ) -> Result<ColorReadback, ResourceError>;

    // --- Timer queries ---

    /// Creates a timestamp query object.
    /// ## Errors
    /// * `ResourceError::BackendError` - If the context has no timer queries.
    fn create_timer_query(&self) -> Result<QueryId, ResourceError>;

    /// Records the GPU time, in nanoseconds, once every previously issued
    /// command has completed.
    fn write_timestamp(&self, query: QueryId) -> Result<(), ResourceError>;

    /// Reads a timestamp without stalling.
    /// ## Returns
    /// `None` while the GPU has not reached the timestamp yet.
    fn timer_query_result(&self, query: QueryId) -> Result<Option<u64>, ResourceError>;

    /// Deletes a query object.
    fn destroy_timer_query(&self, query: QueryId) -> Result<(), ResourceError>;

    // --- Diagnostics ---

    /// Drains the GL error queue and returns the first error code, if any.
    fn take_error(&self) -> Option<u32>;
}
