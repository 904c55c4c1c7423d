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

//! A recording [`GlDevice`] for unit tests.
//!
//! Dependent crates reach it through the `testing` feature.

use crate::math::{Extent3D, Origin3D};
use crate::renderer::{
    api::*,
    error::{ResourceError, ShaderError},
    traits::GlDevice,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// Everything the mock observed, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    CreateProgram(ProgramId),
    CompileShader {
        id: ShaderId,
        stage: ShaderStage,
        source: String,
    },
    AttachShader(ProgramId, ShaderId),
    DestroyShader(ShaderId),
    LinkProgram(ProgramId),
    DestroyProgram(ProgramId),
    CreateBuffer {
        id: BufferId,
        size: u64,
        usage: BufferUsage,
        data: Option<Vec<u8>>,
    },
    ReallocateBuffer {
        id: BufferId,
        size: u64,
        usage: BufferUsage,
    },
    WriteBuffer {
        id: BufferId,
        offset: u64,
        data: Vec<u8>,
    },
    BindBuffer(BufferTarget, BufferId),
    BindBufferRange {
        target: BufferTarget,
        index: u32,
        id: BufferId,
        offset: u64,
        size: u64,
    },
    DestroyBuffer(BufferId),
    CreateVertexArray {
        id: VertexArrayId,
        vertex_buffer: BufferId,
        index_buffer: Option<BufferId>,
        stride: u32,
        attributes: Vec<VertexAttribute>,
    },
    DestroyVertexArray(VertexArrayId),
    CreateTexture {
        id: TextureId,
        target: TextureTarget,
        format: TextureFormat,
        extent: Extent3D,
        levels: u32,
        immutable: bool,
    },
    WriteTexture {
        id: TextureId,
        cube_face: Option<CubeFace>,
        origin: Origin3D,
        extent: Extent3D,
        format: PixelFormat,
        ty: PixelType,
        len: usize,
        unpack: PixelStoreState,
    },
    GenerateMipmap(TextureId),
    DestroyTexture(TextureId),
    SetUnpackState(PixelStoreState),
    SetPackState(PixelStoreState),
    ReadColorBuffer {
        source: ColorSource,
        format: PixelFormat,
        ty: PixelType,
        pack: PixelStoreState,
    },
    CreateQuery(QueryId),
    WriteTimestamp(QueryId),
    DestroyQuery(QueryId),
}

/// A mock device that hands out unique ids and records every call.
///
/// Failures are injected through the public `Cell`s before exercising the
/// code under test.
#[derive(Debug)]
pub struct MockGlDevice {
    next_id: Cell<usize>,
    calls: RefCell<Vec<MockCall>>,
    unpack: Cell<PixelStoreState>,
    pack: Cell<PixelStoreState>,
    /// Compilation of this stage fails with a canned log.
    pub fail_compile: Cell<Option<ShaderStage>>,
    /// Linking fails with a canned log.
    pub fail_link: Cell<bool>,
    /// Buffer mapping is refused.
    pub fail_map: Cell<bool>,
    /// The n-th texture write (0-based) raises `GL_INVALID_OPERATION`.
    pub fail_texture_write: Cell<Option<usize>>,
    /// Returned (once) by the next `take_error`.
    pub pending_error: Cell<Option<u32>>,
    /// Answer of `supports_immutable_storage`.
    pub immutable_storage: Cell<bool>,
    /// Viewport size used by color buffer readbacks.
    pub viewport: Cell<(u32, u32)>,
    /// Nanoseconds the GPU clock advances per recorded timestamp.
    pub timestamp_step: Cell<u64>,
    /// Timestamp results are not available yet.
    pub timer_pending: Cell<bool>,
    texture_writes: Cell<usize>,
    gpu_time: Cell<u64>,
    timestamps: RefCell<HashMap<QueryId, u64>>,
}

pub const MOCK_INVALID_OPERATION: u32 = 0x0502;

impl MockGlDevice {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(1),
            calls: RefCell::new(Vec::new()),
            // Start from a state that differs from the tightly packed one.
            unpack: Cell::new(PixelStoreState {
                row_length: 17,
                ..PixelStoreState::default()
            }),
            pack: Cell::new(PixelStoreState::default()),
            fail_compile: Cell::new(None),
            fail_link: Cell::new(false),
            fail_map: Cell::new(false),
            fail_texture_write: Cell::new(None),
            pending_error: Cell::new(None),
            immutable_storage: Cell::new(true),
            viewport: Cell::new((4, 2)),
            timestamp_step: Cell::new(1_000_000),
            timer_pending: Cell::new(false),
            texture_writes: Cell::new(0),
            gpu_time: Cell::new(0),
            timestamps: RefCell::new(HashMap::new()),
        }
    }

    fn next(&self) -> usize {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn record(&self, call: MockCall) {
        self.calls.borrow_mut().push(call);
    }

    /// A snapshot of every recorded call.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.borrow().clone()
    }

    /// Forgets the recorded calls.
    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// The sources handed to `compile_shader`, per stage.
    pub fn compiled_sources(&self) -> Vec<(ShaderStage, String)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                MockCall::CompileShader { stage, source, .. } => Some((*stage, source.clone())),
                _ => None,
            })
            .collect()
    }

    /// Every recorded texture write.
    pub fn texture_writes(&self) -> Vec<MockCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| matches!(call, MockCall::WriteTexture { .. }))
            .cloned()
            .collect()
    }

    /// The current unpack state, as the driver would report it.
    pub fn current_unpack(&self) -> PixelStoreState {
        self.unpack.get()
    }

    /// The current pack state, as the driver would report it.
    pub fn current_pack(&self) -> PixelStoreState {
        self.pack.get()
    }
}

impl Default for MockGlDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GlDevice for MockGlDevice {
    fn create_program(&self) -> Result<ProgramId, ResourceError> {
        let id = ProgramId(self.next());
        self.record(MockCall::CreateProgram(id));
        Ok(id)
    }

    fn compile_shader(
        &self,
        stage: ShaderStage,
        sources: &[&str],
    ) -> Result<ShaderId, ResourceError> {
        let id = ShaderId(self.next());
        self.record(MockCall::CompileShader {
            id,
            stage,
            source: sources.concat(),
        });
        if self.fail_compile.get() == Some(stage) {
            return Err(ShaderError::StageCompileFailed {
                stage,
                log: "0(3) : error C0000: syntax error".to_string(),
            }
            .into());
        }
        Ok(id)
    }

    fn attach_shader(&self, program: ProgramId, shader: ShaderId) -> Result<(), ResourceError> {
        self.record(MockCall::AttachShader(program, shader));
        Ok(())
    }

    fn destroy_shader(&self, shader: ShaderId) -> Result<(), ResourceError> {
        self.record(MockCall::DestroyShader(shader));
        Ok(())
    }

    fn link_program(&self, program: ProgramId) -> Result<(), ResourceError> {
        self.record(MockCall::LinkProgram(program));
        if self.fail_link.get() {
            return Err(ShaderError::LinkFailed {
                log: "error: unresolved varying".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn destroy_program(&self, program: ProgramId) -> Result<(), ResourceError> {
        self.record(MockCall::DestroyProgram(program));
        Ok(())
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        let id = BufferId(self.next());
        self.record(MockCall::CreateBuffer {
            id,
            size: descriptor.size,
            usage: descriptor.usage,
            data: None,
        });
        Ok(id)
    }

    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        let id = BufferId(self.next());
        self.record(MockCall::CreateBuffer {
            id,
            size: data.len() as u64,
            usage: descriptor.usage,
            data: Some(data.to_vec()),
        });
        Ok(id)
    }

    fn reallocate_buffer(
        &self,
        id: BufferId,
        size: u64,
        usage: BufferUsage,
    ) -> Result<(), ResourceError> {
        self.record(MockCall::ReallocateBuffer { id, size, usage });
        Ok(())
    }

    fn write_buffer_unsynchronized(
        &self,
        id: BufferId,
        offset: u64,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        if self.fail_map.get() {
            return Err(ResourceError::BufferMapFailed);
        }
        self.record(MockCall::WriteBuffer {
            id,
            offset,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn bind_buffer(&self, target: BufferTarget, id: BufferId) -> Result<(), ResourceError> {
        self.record(MockCall::BindBuffer(target, id));
        Ok(())
    }

    fn bind_buffer_range(
        &self,
        target: BufferTarget,
        index: u32,
        id: BufferId,
        offset: u64,
        size: u64,
    ) -> Result<(), ResourceError> {
        self.record(MockCall::BindBufferRange {
            target,
            index,
            id,
            offset,
            size,
        });
        Ok(())
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        self.record(MockCall::DestroyBuffer(id));
        Ok(())
    }

    fn create_vertex_array(
        &self,
        descriptor: &VertexArrayDescriptor,
    ) -> Result<VertexArrayId, ResourceError> {
        let id = VertexArrayId(self.next());
        self.record(MockCall::CreateVertexArray {
            id,
            vertex_buffer: descriptor.vertex_buffer,
            index_buffer: descriptor.index_buffer,
            stride: descriptor.stride,
            attributes: descriptor.attributes.to_vec(),
        });
        Ok(id)
    }

    fn destroy_vertex_array(&self, id: VertexArrayId) -> Result<(), ResourceError> {
        self.record(MockCall::DestroyVertexArray(id));
        Ok(())
    }

    fn supports_immutable_storage(&self) -> bool {
        self.immutable_storage.get()
    }

    fn create_texture(
        &self,
        descriptor: &TextureStorageDescriptor,
    ) -> Result<TextureId, ResourceError> {
        let id = TextureId(self.next());
        self.record(MockCall::CreateTexture {
            id,
            target: descriptor.target,
            format: descriptor.format,
            extent: descriptor.extent,
            levels: descriptor.levels,
            immutable: descriptor.immutable,
        });
        Ok(id)
    }

    fn write_texture(&self, id: TextureId, write: &TextureWrite) -> Result<(), ResourceError> {
        let index = self.texture_writes.get();
        self.texture_writes.set(index + 1);
        self.record(MockCall::WriteTexture {
            id,
            cube_face: write.cube_face,
            origin: write.origin,
            extent: write.extent,
            format: write.format,
            ty: write.ty,
            len: write.data.len(),
            unpack: self.unpack.get(),
        });
        if self.fail_texture_write.get() == Some(index) {
            return Err(ResourceError::GlError(MOCK_INVALID_OPERATION));
        }
        Ok(())
    }

    fn generate_mipmap(&self, id: TextureId) -> Result<(), ResourceError> {
        self.record(MockCall::GenerateMipmap(id));
        Ok(())
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        self.record(MockCall::DestroyTexture(id));
        Ok(())
    }

    fn pixel_unpack_state(&self) -> PixelStoreState {
        self.unpack.get()
    }

    fn set_pixel_unpack_state(&self, state: &PixelStoreState) {
        self.record(MockCall::SetUnpackState(*state));
        self.unpack.set(*state);
    }

    fn pixel_pack_state(&self) -> PixelStoreState {
        self.pack.get()
    }

    fn set_pixel_pack_state(&self, state: &PixelStoreState) {
        self.record(MockCall::SetPackState(*state));
        self.pack.set(*state);
    }

    fn read_color_buffer(
        &self,
        source: ColorSource,
        format: PixelFormat,
        ty: PixelType,
    ) -> Result<ColorReadback, ResourceError> {
        self.record(MockCall::ReadColorBuffer {
            source,
            format,
            ty,
            pack: self.pack.get(),
        });
        let (width, height) = self.viewport.get();
        let len = (width * height * format.components()) as usize * ty.size();
        // Each byte holds its row index so flips are observable.
        let row_len = len / height.max(1) as usize;
        let data = (0..len).map(|i| (i / row_len.max(1)) as u8).collect();
        Ok(ColorReadback {
            width,
            height,
            data,
        })
    }

    fn create_timer_query(&self) -> Result<QueryId, ResourceError> {
        let id = QueryId(self.next());
        self.record(MockCall::CreateQuery(id));
        Ok(id)
    }

    fn write_timestamp(&self, query: QueryId) -> Result<(), ResourceError> {
        self.record(MockCall::WriteTimestamp(query));
        let now = self.gpu_time.get() + self.timestamp_step.get();
        self.gpu_time.set(now);
        self.timestamps.borrow_mut().insert(query, now);
        Ok(())
    }

    fn timer_query_result(&self, query: QueryId) -> Result<Option<u64>, ResourceError> {
        if self.timer_pending.get() {
            return Ok(None);
        }
        self.timestamps
            .borrow()
            .get(&query)
            .copied()
            .map(Some)
            .ok_or(ResourceError::NotFound)
    }

    fn destroy_timer_query(&self, query: QueryId) -> Result<(), ResourceError> {
        self.record(MockCall::DestroyQuery(query));
        self.timestamps.borrow_mut().remove(&query);
        Ok(())
    }

    fn take_error(&self) -> Option<u32> {
        self.pending_error.take()
    }
}
