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

use super::context::GlContextInfo;
use super::conversions::{transfer_layout, IntoGl};
use glow::{HasContext, PixelPackData, PixelUnpackData};
use orrery_core::renderer::api::*;
use orrery_core::renderer::{GlDevice, ResourceError, ShaderError, TextureError};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::num::NonZeroU32;
use std::sync::Arc;

/// `take_error` stops after this many codes; a lost context keeps
/// reporting `GL_CONTEXT_LOST`.
const MAX_DRAINED_ERRORS: usize = 16;

#[derive(Debug, Clone, Copy)]
struct GlTextureEntry {
    texture: glow::Texture,
    target: TextureTarget,
    format: TextureFormat,
}

/// The `glGet`/`glPixelStore` parameters of one transfer direction.
struct PixelStoreParams {
    buffer_target: u32,
    buffer_binding: u32,
    swap_bytes: u32,
    lsb_first: u32,
    row_length: u32,
    image_height: u32,
    skip_rows: u32,
    skip_pixels: u32,
    skip_images: u32,
    alignment: u32,
    /// Parameters OpenGL ES does not define; they read as 0 there.
    desktop_only: &'static [u32],
}

impl PixelStoreParams {
    fn available(&self, parameter: u32, embedded: bool) -> bool {
        !embedded || !self.desktop_only.contains(&parameter)
    }
}

const UNPACK_PARAMS: PixelStoreParams = PixelStoreParams {
    buffer_target: glow::PIXEL_UNPACK_BUFFER,
    buffer_binding: glow::PIXEL_UNPACK_BUFFER_BINDING,
    swap_bytes: glow::UNPACK_SWAP_BYTES,
    lsb_first: glow::UNPACK_LSB_FIRST,
    row_length: glow::UNPACK_ROW_LENGTH,
    image_height: glow::UNPACK_IMAGE_HEIGHT,
    skip_rows: glow::UNPACK_SKIP_ROWS,
    skip_pixels: glow::UNPACK_SKIP_PIXELS,
    skip_images: glow::UNPACK_SKIP_IMAGES,
    alignment: glow::UNPACK_ALIGNMENT,
    desktop_only: &[glow::UNPACK_SWAP_BYTES, glow::UNPACK_LSB_FIRST],
};

const PACK_PARAMS: PixelStoreParams = PixelStoreParams {
    buffer_target: glow::PIXEL_PACK_BUFFER,
    buffer_binding: glow::PIXEL_PACK_BUFFER_BINDING,
    swap_bytes: glow::PACK_SWAP_BYTES,
    lsb_first: glow::PACK_LSB_FIRST,
    row_length: glow::PACK_ROW_LENGTH,
    image_height: glow::PACK_IMAGE_HEIGHT,
    skip_rows: glow::PACK_SKIP_ROWS,
    skip_pixels: glow::PACK_SKIP_PIXELS,
    skip_images: glow::PACK_SKIP_IMAGES,
    alignment: glow::PACK_ALIGNMENT,
    desktop_only: &[
        glow::PACK_SWAP_BYTES,
        glow::PACK_LSB_FIRST,
        glow::PACK_IMAGE_HEIGHT,
        glow::PACK_SKIP_IMAGES,
    ],
};

/// An OpenGL implementation of [`GlDevice`] on top of a `glow` context.
///
/// Opaque toolkit ids map to native GL object names through per-kind tables.
/// The device never leaves a buffer or texture bound: every operation binds
/// what it touches and unbinds it afterwards. Buffer transfers go through
/// `GL_COPY_WRITE_BUFFER` so the vertex and element bindings of the caller
/// are left alone.
pub struct GlowDevice {
    gl: Arc<glow::Context>,
    info: GlContextInfo,
    programs: RefCell<HashMap<ProgramId, glow::Program>>,
    shaders: RefCell<HashMap<ShaderId, glow::Shader>>,
    buffers: RefCell<HashMap<BufferId, glow::Buffer>>,
    vertex_arrays: RefCell<HashMap<VertexArrayId, glow::VertexArray>>,
    textures: RefCell<HashMap<TextureId, GlTextureEntry>>,
    queries: RefCell<HashMap<QueryId, glow::Query>>,
    next_id: Cell<usize>,
    // GL calls must stay on the context's thread.
    _thread_bound: PhantomData<*const ()>,
}

impl GlowDevice {
    /// Wraps a context and queries its capabilities.
    ///
    /// # Errors
    ///
    /// Fails if the context version is unsupported.
    ///
    /// # Safety
    ///
    /// `gl` must be current on the calling thread, and stay current on it for
    /// the lifetime of the device.
    pub unsafe fn new(gl: Arc<glow::Context>) -> anyhow::Result<Self> {
        let info = unsafe { GlContextInfo::query(&gl)? };
        Ok(Self {
            gl,
            info,
            programs: RefCell::new(HashMap::new()),
            shaders: RefCell::new(HashMap::new()),
            buffers: RefCell::new(HashMap::new()),
            vertex_arrays: RefCell::new(HashMap::new()),
            textures: RefCell::new(HashMap::new()),
            queries: RefCell::new(HashMap::new()),
            next_id: Cell::new(1),
            _thread_bound: PhantomData,
        })
    }

    /// Loads the GL entry points through `loader` and wraps the resulting context.
    ///
    /// # Errors
    ///
    /// Same as [`GlowDevice::new`].
    ///
    /// # Safety
    ///
    /// Same as [`GlowDevice::new`]; `loader` must return entry points of the
    /// current context.
    pub unsafe fn from_loader_function<F>(loader: F) -> anyhow::Result<Self>
    where
        F: FnMut(&str) -> *const std::ffi::c_void,
    {
        let gl = unsafe { glow::Context::from_loader_function(loader) };
        unsafe { Self::new(Arc::new(gl)) }
    }

    /// Capabilities of the wrapped context.
    pub fn info(&self) -> &GlContextInfo {
        &self.info
    }

    /// The wrapped context, for drawing code that talks to GL directly.
    pub fn context(&self) -> &Arc<glow::Context> {
        &self.gl
    }

    /// The native program object behind `id`.
    pub fn native_program(&self, id: ProgramId) -> Option<glow::Program> {
        self.programs.borrow().get(&id).copied()
    }

    /// The native buffer object behind `id`.
    pub fn native_buffer(&self, id: BufferId) -> Option<glow::Buffer> {
        self.buffers.borrow().get(&id).copied()
    }

    /// The native vertex array object behind `id`.
    pub fn native_vertex_array(&self, id: VertexArrayId) -> Option<glow::VertexArray> {
        self.vertex_arrays.borrow().get(&id).copied()
    }

    /// The native texture object behind `id`.
    pub fn native_texture(&self, id: TextureId) -> Option<glow::Texture> {
        self.textures.borrow().get(&id).map(|entry| entry.texture)
    }

    fn next_id(&self) -> usize {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn program(&self, id: ProgramId) -> Result<glow::Program, ResourceError> {
        self.native_program(id).ok_or(ResourceError::NotFound)
    }

    fn shader(&self, id: ShaderId) -> Result<glow::Shader, ResourceError> {
        self.shaders
            .borrow()
            .get(&id)
            .copied()
            .ok_or(ResourceError::NotFound)
    }

    fn buffer(&self, id: BufferId) -> Result<glow::Buffer, ResourceError> {
        self.native_buffer(id).ok_or(ResourceError::NotFound)
    }

    fn texture(&self, id: TextureId) -> Result<GlTextureEntry, ResourceError> {
        self.textures
            .borrow()
            .get(&id)
            .copied()
            .ok_or(ResourceError::NotFound)
    }

    fn query(&self, id: QueryId) -> Result<glow::Query, ResourceError> {
        self.queries
            .borrow()
            .get(&id)
            .copied()
            .ok_or(ResourceError::NotFound)
    }

    fn check_error(&self) -> Result<(), ResourceError> {
        match unsafe { self.gl.get_error() } {
            glow::NO_ERROR => Ok(()),
            code => Err(ResourceError::GlError(code)),
        }
    }

    /// Fills the storage of a bound buffer at `GL_COPY_WRITE_BUFFER`.
    fn specify_buffer(&self, buffer: glow::Buffer, size: i32, data: Option<&[u8]>, usage: u32) {
        let gl = &self.gl;
        unsafe {
            gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(buffer));
            match data {
                Some(data) => gl.buffer_data_u8_slice(glow::COPY_WRITE_BUFFER, data, usage),
                None => gl.buffer_data_size(glow::COPY_WRITE_BUFFER, size, usage),
            }
            gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
        }
    }

    fn new_buffer(
        &self,
        descriptor: &BufferDescriptor,
        data: Option<&[u8]>,
    ) -> Result<BufferId, ResourceError> {
        let size = match data {
            Some(data) => gl_int(data.len() as u64, "buffer size")?,
            None => gl_int(descriptor.size, "buffer size")?,
        };
        let buffer = unsafe { self.gl.create_buffer() }.map_err(ResourceError::BackendError)?;
        self.specify_buffer(buffer, size, data, descriptor.usage.into_gl());

        let id = BufferId(self.next_id());
        self.buffers.borrow_mut().insert(id, buffer);
        log::debug!(
            "GlowDevice: Created buffer '{}' with ID: {:?}, size: {} bytes",
            descriptor.label.as_deref().unwrap_or_default(),
            id,
            size
        );
        Ok(id)
    }

    fn read_pixel_store(&self, params: &PixelStoreParams) -> PixelStoreState {
        let gl = &self.gl;
        let embedded = self.info.embedded;
        let int = |parameter| {
            if params.available(parameter, embedded) {
                unsafe { gl.get_parameter_i32(parameter) }
            } else {
                0
            }
        };
        PixelStoreState {
            buffer_binding: int(params.buffer_binding) as u32,
            swap_bytes: int(params.swap_bytes) != 0,
            lsb_first: int(params.lsb_first) != 0,
            row_length: int(params.row_length),
            image_height: int(params.image_height),
            skip_rows: int(params.skip_rows),
            skip_pixels: int(params.skip_pixels),
            skip_images: int(params.skip_images),
            alignment: int(params.alignment),
        }
    }

    fn write_pixel_store(&self, params: &PixelStoreParams, state: &PixelStoreState) {
        let gl = &self.gl;
        let buffer = NonZeroU32::new(state.buffer_binding).map(glow::NativeBuffer);
        let values = [
            (params.swap_bytes, i32::from(state.swap_bytes)),
            (params.lsb_first, i32::from(state.lsb_first)),
            (params.row_length, state.row_length),
            (params.image_height, state.image_height),
            (params.skip_rows, state.skip_rows),
            (params.skip_pixels, state.skip_pixels),
            (params.skip_images, state.skip_images),
            (params.alignment, state.alignment),
        ];
        unsafe {
            gl.bind_buffer(params.buffer_target, buffer);
            for (parameter, value) in values {
                if params.available(parameter, self.info.embedded) {
                    gl.pixel_store_i32(parameter, value);
                }
            }
        }
    }

    /// Allocates mutable level-0 storage of a bound texture.
    ///
    /// Any pixel-unpack buffer is unbound for the allocation so no data is read.
    fn allocate_mutable(&self, descriptor: &TextureStorageDescriptor, size: [i32; 3]) {
        let gl = &self.gl;
        let target = descriptor.target.into_gl();
        let internal = descriptor.format.into_gl() as i32;
        let (format, ty) = transfer_layout(descriptor.format);
        let (format, ty) = (format.into_gl(), ty.into_gl());
        let [w, h, d] = size;

        unsafe {
            let unpack_buffer = gl.get_parameter_i32(glow::PIXEL_UNPACK_BUFFER_BINDING) as u32;
            gl.bind_buffer(glow::PIXEL_UNPACK_BUFFER, None);
            match descriptor.target {
                TextureTarget::D1 => gl.tex_image_1d(
                    target,
                    0,
                    internal,
                    w,
                    0,
                    format,
                    ty,
                    PixelUnpackData::Slice(None),
                ),
                TextureTarget::D1Array | TextureTarget::D2 | TextureTarget::Rectangle => gl
                    .tex_image_2d(
                        target,
                        0,
                        internal,
                        w,
                        h,
                        0,
                        format,
                        ty,
                        PixelUnpackData::Slice(None),
                    ),
                TextureTarget::CubeMap => {
                    for face in CubeFace::ALL {
                        gl.tex_image_2d(
                            face.into_gl(),
                            0,
                            internal,
                            w,
                            h,
                            0,
                            format,
                            ty,
                            PixelUnpackData::Slice(None),
                        );
                    }
                }
                TextureTarget::D2Array | TextureTarget::D3 => gl.tex_image_3d(
                    target,
                    0,
                    internal,
                    w,
                    h,
                    d,
                    0,
                    format,
                    ty,
                    PixelUnpackData::Slice(None),
                ),
            }
            gl.bind_buffer(
                glow::PIXEL_UNPACK_BUFFER,
                NonZeroU32::new(unpack_buffer).map(glow::NativeBuffer),
            );
        }
    }
}

impl fmt::Debug for GlowDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlowDevice")
            .field("info", &self.info)
            .field("programs", &self.programs.borrow().len())
            .field("buffers", &self.buffers.borrow().len())
            .field("vertex_arrays", &self.vertex_arrays.borrow().len())
            .field("textures", &self.textures.borrow().len())
            .field("queries", &self.queries.borrow().len())
            .finish_non_exhaustive()
    }
}

impl GlDevice for GlowDevice {
    fn create_program(&self) -> Result<ProgramId, ResourceError> {
        let program = unsafe { self.gl.create_program() }.map_err(ResourceError::BackendError)?;
        let id = ProgramId(self.next_id());
        self.programs.borrow_mut().insert(id, program);
        Ok(id)
    }

    fn compile_shader(
        &self,
        stage: ShaderStage,
        sources: &[&str],
    ) -> Result<ShaderId, ResourceError> {
        let gl = &self.gl;
        let shader = unsafe { gl.create_shader(stage.into_gl()) }
            .map_err(ResourceError::BackendError)?;
        let source = sources.concat();

        unsafe {
            gl.shader_source(shader, &source);
            gl.compile_shader(shader);
            if !gl.get_shader_compile_status(shader) {
                let log = gl.get_shader_info_log(shader);
                gl.delete_shader(shader);
                return Err(ShaderError::StageCompileFailed { stage, log }.into());
            }
        }

        let id = ShaderId(self.next_id());
        self.shaders.borrow_mut().insert(id, shader);
        Ok(id)
    }

    fn attach_shader(&self, program: ProgramId, shader: ShaderId) -> Result<(), ResourceError> {
        let (program, shader) = (self.program(program)?, self.shader(shader)?);
        unsafe { self.gl.attach_shader(program, shader) };
        Ok(())
    }

    fn destroy_shader(&self, shader: ShaderId) -> Result<(), ResourceError> {
        let shader = self
            .shaders
            .borrow_mut()
            .remove(&shader)
            .ok_or(ResourceError::NotFound)?;
        unsafe { self.gl.delete_shader(shader) };
        Ok(())
    }

    fn link_program(&self, program: ProgramId) -> Result<(), ResourceError> {
        let gl = &self.gl;
        let native = self.program(program)?;
        unsafe {
            gl.link_program(native);
            if !gl.get_program_link_status(native) {
                let log = gl.get_program_info_log(native);
                return Err(ShaderError::LinkFailed { log }.into());
            }
        }
        log::debug!("GlowDevice: Linked program {:?}", program);
        Ok(())
    }

    fn destroy_program(&self, program: ProgramId) -> Result<(), ResourceError> {
        let native = self
            .programs
            .borrow_mut()
            .remove(&program)
            .ok_or(ResourceError::NotFound)?;
        unsafe { self.gl.delete_program(native) };
        log::debug!("GlowDevice: Destroyed program with ID: {:?}", program);
        Ok(())
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        self.new_buffer(descriptor, None)
    }

    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        self.new_buffer(descriptor, Some(data))
    }

    fn reallocate_buffer(
        &self,
        id: BufferId,
        size: u64,
        usage: BufferUsage,
    ) -> Result<(), ResourceError> {
        let buffer = self.buffer(id)?;
        let size = gl_int(size, "buffer size")?;
        self.specify_buffer(buffer, size, None, usage.into_gl());
        Ok(())
    }

    fn write_buffer_unsynchronized(
        &self,
        id: BufferId,
        offset: u64,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        if data.is_empty() {
            return Ok(());
        }
        let buffer = self.buffer(id)?;
        let offset = gl_int(offset, "buffer offset")?;
        let length = gl_int(data.len() as u64, "write length")?;
        let gl = &self.gl;

        unsafe {
            gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(buffer));
            let mapped = gl.map_buffer_range(
                glow::COPY_WRITE_BUFFER,
                offset,
                length,
                glow::MAP_WRITE_BIT | glow::MAP_INVALIDATE_RANGE_BIT | glow::MAP_UNSYNCHRONIZED_BIT,
            );
            if mapped.is_null() {
                gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
                return Err(ResourceError::BufferMapFailed);
            }
            // The mapping covers exactly `data.len()` bytes.
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped, data.len());
            gl.unmap_buffer(glow::COPY_WRITE_BUFFER);
            gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
        }
        Ok(())
    }

    fn bind_buffer(&self, target: BufferTarget, id: BufferId) -> Result<(), ResourceError> {
        let buffer = self.buffer(id)?;
        unsafe { self.gl.bind_buffer(target.into_gl(), Some(buffer)) };
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
        if !target.is_indexed() {
            return Err(ResourceError::BackendError(format!(
                "{target:?} has no indexed binding points"
            )));
        }
        let buffer = self.buffer(id)?;
        let offset = gl_int(offset, "binding offset")?;
        let size = gl_int(size, "binding size")?;
        unsafe {
            self.gl
                .bind_buffer_range(target.into_gl(), index, Some(buffer), offset, size)
        };
        Ok(())
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        let buffer = self
            .buffers
            .borrow_mut()
            .remove(&id)
            .ok_or(ResourceError::NotFound)?;
        unsafe { self.gl.delete_buffer(buffer) };
        log::debug!("GlowDevice: Destroyed buffer with ID: {id:?}");
        Ok(())
    }

    fn create_vertex_array(
        &self,
        descriptor: &VertexArrayDescriptor,
    ) -> Result<VertexArrayId, ResourceError> {
        let vertex_buffer = self.buffer(descriptor.vertex_buffer)?;
        let index_buffer = descriptor
            .index_buffer
            .map(|id| self.buffer(id))
            .transpose()?;
        let stride = gl_int(u64::from(descriptor.stride), "vertex stride")?;
        let attributes = descriptor
            .attributes
            .iter()
            .map(|a| Ok((a.location, a.components as i32, gl_int(a.offset, "attribute offset")?)))
            .collect::<Result<Vec<_>, ResourceError>>()?;

        let gl = &self.gl;
        let vertex_array =
            unsafe { gl.create_vertex_array() }.map_err(ResourceError::BackendError)?;
        unsafe {
            gl.bind_vertex_array(Some(vertex_array));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vertex_buffer));
            if let Some(index_buffer) = index_buffer {
                gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(index_buffer));
            }
            for (location, components, offset) in attributes {
                gl.enable_vertex_attrib_array(location);
                gl.vertex_attrib_pointer_f32(location, components, glow::FLOAT, false, stride, offset);
            }
            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }

        let id = VertexArrayId(self.next_id());
        self.vertex_arrays.borrow_mut().insert(id, vertex_array);
        log::debug!(
            "GlowDevice: Created vertex array '{}' with ID: {:?}",
            descriptor.label.as_deref().unwrap_or_default(),
            id
        );
        Ok(id)
    }

    fn destroy_vertex_array(&self, id: VertexArrayId) -> Result<(), ResourceError> {
        let vertex_array = self
            .vertex_arrays
            .borrow_mut()
            .remove(&id)
            .ok_or(ResourceError::NotFound)?;
        unsafe { self.gl.delete_vertex_array(vertex_array) };
        Ok(())
    }

    fn supports_immutable_storage(&self) -> bool {
        self.info.immutable_storage
    }

    fn create_texture(
        &self,
        descriptor: &TextureStorageDescriptor,
    ) -> Result<TextureId, ResourceError> {
        let extent = descriptor.extent;
        let size = [
            gl_int(u64::from(extent.width), "texture width")?,
            gl_int(u64::from(extent.height), "texture height")?,
            gl_int(u64::from(extent.depth_or_array_layers), "texture depth")?,
        ];
        check_target(descriptor.target, self.info.embedded)?;
        let levels = gl_int(u64::from(descriptor.levels.max(1)), "mip level count")?;
        let target = descriptor.target.into_gl();
        let format = descriptor.format.into_gl();
        // 1D textures are always re-specified on write, which immutable storage forbids.
        let immutable = descriptor.immutable && descriptor.target != TextureTarget::D1;

        let gl = &self.gl;
        let texture = unsafe { gl.create_texture() }.map_err(ResourceError::BackendError)?;
        unsafe {
            gl.bind_texture(target, Some(texture));
            if immutable {
                let [w, h, d] = size;
                match descriptor.target {
                    TextureTarget::D3 | TextureTarget::D2Array => {
                        gl.tex_storage_3d(target, levels, format, w, h, d)
                    }
                    _ => gl.tex_storage_2d(target, levels, format, w, h),
                }
            } else {
                self.allocate_mutable(descriptor, size);
            }
            let min_filter = if immutable && levels > 1 {
                glow::LINEAR_MIPMAP_LINEAR
            } else {
                glow::LINEAR
            };
            gl.tex_parameter_i32(target, glow::TEXTURE_MIN_FILTER, min_filter as i32);
            gl.bind_texture(target, None);
        }

        if let Err(e) = self.check_error() {
            unsafe { gl.delete_texture(texture) };
            return Err(e);
        }

        let id = TextureId(self.next_id());
        self.textures.borrow_mut().insert(
            id,
            GlTextureEntry {
                texture,
                target: descriptor.target,
                format: descriptor.format,
            },
        );
        log::debug!(
            "GlowDevice: Created {:?} texture '{}' with ID: {:?}, {}x{}x{}, {} level(s), {}",
            descriptor.target,
            descriptor.label.as_deref().unwrap_or_default(),
            id,
            extent.width,
            extent.height,
            extent.depth_or_array_layers,
            levels,
            if immutable { "immutable" } else { "mutable" }
        );
        Ok(id)
    }

    fn write_texture(&self, id: TextureId, write: &TextureWrite) -> Result<(), ResourceError> {
        let entry = self.texture(id)?;
        let required = write.extent.width as usize
            * write.extent.height as usize
            * write.extent.depth_or_array_layers as usize
            * write.format.components() as usize
            * write.ty.size();
        if write.data.len() < required {
            return Err(ResourceError::BackendError(format!(
                "texture write needs {required} bytes, got {}",
                write.data.len()
            )));
        }
        let face_target = match (entry.target, write.cube_face) {
            (TextureTarget::CubeMap, Some(face)) => face.into_gl(),
            (TextureTarget::CubeMap, None) => {
                return Err(ResourceError::BackendError(
                    "cube map write without a face".to_string(),
                ))
            }
            (target, _) => target.into_gl(),
        };

        let [x, y, z] = [write.origin.x as i32, write.origin.y as i32, write.origin.z as i32];
        let [w, h, d] = [
            gl_int(u64::from(write.extent.width), "write width")?,
            gl_int(u64::from(write.extent.height), "write height")?,
            gl_int(u64::from(write.extent.depth_or_array_layers), "write depth")?,
        ];
        let (format, ty) = (write.format.into_gl(), write.ty.into_gl());
        let pixels = PixelUnpackData::Slice(Some(write.data));
        let target = entry.target.into_gl();
        let gl = &self.gl;

        unsafe {
            gl.bind_texture(target, Some(entry.texture));
            match entry.target {
                TextureTarget::D1 => gl.tex_image_1d(
                    target,
                    0,
                    entry.format.into_gl() as i32,
                    w,
                    0,
                    format,
                    ty,
                    pixels,
                ),
                TextureTarget::D1Array
                | TextureTarget::D2
                | TextureTarget::Rectangle
                | TextureTarget::CubeMap => {
                    gl.tex_sub_image_2d(face_target, 0, x, y, w, h, format, ty, pixels)
                }
                TextureTarget::D2Array | TextureTarget::D3 => {
                    gl.tex_sub_image_3d(target, 0, x, y, z, w, h, d, format, ty, pixels)
                }
            }
            gl.bind_texture(target, None);
        }
        self.check_error()
    }

    fn generate_mipmap(&self, id: TextureId) -> Result<(), ResourceError> {
        let entry = self.texture(id)?;
        let target = entry.target.into_gl();
        let gl = &self.gl;
        unsafe {
            gl.bind_texture(target, Some(entry.texture));
            gl.generate_mipmap(target);
            gl.tex_parameter_i32(
                target,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR_MIPMAP_LINEAR as i32,
            );
            gl.bind_texture(target, None);
        }
        Ok(())
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        let entry = self
            .textures
            .borrow_mut()
            .remove(&id)
            .ok_or(ResourceError::NotFound)?;
        unsafe { self.gl.delete_texture(entry.texture) };
        log::debug!("GlowDevice: Destroyed texture with ID: {id:?}");
        Ok(())
    }

    fn pixel_unpack_state(&self) -> PixelStoreState {
        self.read_pixel_store(&UNPACK_PARAMS)
    }

    fn set_pixel_unpack_state(&self, state: &PixelStoreState) {
        self.write_pixel_store(&UNPACK_PARAMS, state);
    }

    fn pixel_pack_state(&self) -> PixelStoreState {
        self.read_pixel_store(&PACK_PARAMS)
    }

    fn set_pixel_pack_state(&self, state: &PixelStoreState) {
        self.write_pixel_store(&PACK_PARAMS, state);
    }

    fn read_color_buffer(
        &self,
        source: ColorSource,
        format: PixelFormat,
        ty: PixelType,
    ) -> Result<ColorReadback, ResourceError> {
        let pack = self.pixel_pack_state();
        if pack.buffer_binding != 0 {
            return Err(ResourceError::BackendError(
                "color buffer readback with a pixel pack buffer bound".to_string(),
            ));
        }

        let gl = &self.gl;
        let mut viewport = [0i32; 4];
        unsafe { gl.get_parameter_i32_slice(glow::VIEWPORT, &mut viewport) };
        let [x, y, width, height] = viewport;
        let (width, height) = (width.max(0) as u32, height.max(0) as u32);
        let pixel_size = format.components() as usize * ty.size();
        let mut data = vec![0u8; packed_len(width, height, pixel_size, &pack)];

        unsafe {
            let previous = gl.get_parameter_i32(glow::READ_BUFFER) as u32;
            gl.read_buffer(source.into_gl());
            gl.read_pixels(
                x,
                y,
                width as i32,
                height as i32,
                format.into_gl(),
                ty.into_gl(),
                PixelPackData::Slice(Some(&mut data[..])),
            );
            gl.read_buffer(previous);
        }
        self.check_error()?;

        Ok(ColorReadback {
            width,
            height,
            data,
        })
    }

    fn create_timer_query(&self) -> Result<QueryId, ResourceError> {
        if self.info.embedded {
            return Err(ResourceError::BackendError(
                "timestamp queries are not available on OpenGL ES".to_string(),
            ));
        }
        let query = unsafe { self.gl.create_query() }.map_err(ResourceError::BackendError)?;
        let id = QueryId(self.next_id());
        self.queries.borrow_mut().insert(id, query);
        Ok(id)
    }

    fn write_timestamp(&self, query: QueryId) -> Result<(), ResourceError> {
        let query = self.query(query)?;
        unsafe { self.gl.query_counter(query, glow::TIMESTAMP) };
        Ok(())
    }

    fn timer_query_result(&self, query: QueryId) -> Result<Option<u64>, ResourceError> {
        let query = self.query(query)?;
        let gl = &self.gl;
        let available = unsafe { gl.get_query_parameter_u32(query, glow::QUERY_RESULT_AVAILABLE) };
        if available == 0 {
            return Ok(None);
        }
        let mut nanos = 0u64;
        // No query buffer is ever bound, so the offset is the destination address.
        unsafe {
            gl.get_query_parameter_u64_with_offset(
                query,
                glow::QUERY_RESULT,
                &mut nanos as *mut u64 as usize,
            )
        };
        Ok(Some(nanos))
    }

    fn destroy_timer_query(&self, query: QueryId) -> Result<(), ResourceError> {
        let native = self
            .queries
            .borrow_mut()
            .remove(&query)
            .ok_or(ResourceError::NotFound)?;
        unsafe { self.gl.delete_query(native) };
        Ok(())
    }

    fn take_error(&self) -> Option<u32> {
        let mut first = None;
        for _ in 0..MAX_DRAINED_ERRORS {
            match unsafe { self.gl.get_error() } {
                glow::NO_ERROR => break,
                code => {
                    first.get_or_insert(code);
                }
            }
        }
        first
    }
}

impl Drop for GlowDevice {
    fn drop(&mut self) {
        let live = self.programs.get_mut().len()
            + self.shaders.get_mut().len()
            + self.buffers.get_mut().len()
            + self.vertex_arrays.get_mut().len()
            + self.textures.get_mut().len()
            + self.queries.get_mut().len();
        if live > 0 {
            log::warn!("GlowDevice: Dropped with {live} live GL object(s)");
        }
    }
}

/// OpenGL ES has no 1D or rectangle textures.
fn check_target(target: TextureTarget, embedded: bool) -> Result<(), TextureError> {
    match target {
        TextureTarget::D1 | TextureTarget::D1Array | TextureTarget::Rectangle if embedded => {
            Err(TextureError::UnsupportedTarget {
                target,
                reason: "not available on OpenGL ES",
            })
        }
        _ => Ok(()),
    }
}

fn gl_int(value: u64, what: &str) -> Result<i32, ResourceError> {
    i32::try_from(value).map_err(|_| {
        ResourceError::BackendError(format!("{what} {value} exceeds the GL integer range"))
    })
}

/// Bytes written by a `width x height` pack transfer under `pack`.
fn packed_len(width: u32, height: u32, pixel_size: usize, pack: &PixelStoreState) -> usize {
    if width == 0 || height == 0 {
        return 0;
    }
    let row_pixels = if pack.row_length > 0 {
        pack.row_length as usize
    } else {
        width as usize
    };
    let alignment = pack.alignment.max(1) as usize;
    let stride = (row_pixels * pixel_size).div_ceil(alignment) * alignment;
    let skip_rows = pack.skip_rows.max(0) as usize;
    let skip_pixels = pack.skip_pixels.max(0) as usize;

    (skip_rows + height as usize - 1) * stride + (skip_pixels + width as usize) * pixel_size
}
