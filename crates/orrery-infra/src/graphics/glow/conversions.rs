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

use orrery_core::renderer::api::{
    BufferTarget, BufferUsage, ColorSource, CubeFace, PixelFormat, PixelType, ShaderStage,
    TextureFormat, TextureTarget,
};

/// A local extension trait to convert toolkit types into OpenGL enums.
pub trait IntoGl {
    /// Consumes self and returns the matching `GLenum`.
    fn into_gl(self) -> u32;
}

// --- Programs ---

impl IntoGl for ShaderStage {
    fn into_gl(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
            ShaderStage::Geometry => glow::GEOMETRY_SHADER,
            ShaderStage::TessControl => glow::TESS_CONTROL_SHADER,
            ShaderStage::TessEvaluation => glow::TESS_EVALUATION_SHADER,
            ShaderStage::Compute => glow::COMPUTE_SHADER,
        }
    }
}

// --- Buffers ---

impl IntoGl for BufferTarget {
    fn into_gl(self) -> u32 {
        match self {
            BufferTarget::Array => glow::ARRAY_BUFFER,
            BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
            BufferTarget::Uniform => glow::UNIFORM_BUFFER,
            BufferTarget::ShaderStorage => glow::SHADER_STORAGE_BUFFER,
            BufferTarget::AtomicCounter => glow::ATOMIC_COUNTER_BUFFER,
            BufferTarget::TransformFeedback => glow::TRANSFORM_FEEDBACK_BUFFER,
            BufferTarget::DrawIndirect => glow::DRAW_INDIRECT_BUFFER,
        }
    }
}

impl IntoGl for BufferUsage {
    fn into_gl(self) -> u32 {
        match self {
            BufferUsage::StaticDraw => glow::STATIC_DRAW,
            BufferUsage::DynamicDraw => glow::DYNAMIC_DRAW,
            BufferUsage::StreamDraw => glow::STREAM_DRAW,
        }
    }
}

// --- Textures ---

impl IntoGl for TextureTarget {
    fn into_gl(self) -> u32 {
        match self {
            TextureTarget::D1 => glow::TEXTURE_1D,
            TextureTarget::D1Array => glow::TEXTURE_1D_ARRAY,
            TextureTarget::D2 => glow::TEXTURE_2D,
            TextureTarget::Rectangle => glow::TEXTURE_RECTANGLE,
            TextureTarget::CubeMap => glow::TEXTURE_CUBE_MAP,
            TextureTarget::D2Array => glow::TEXTURE_2D_ARRAY,
            TextureTarget::D3 => glow::TEXTURE_3D,
        }
    }
}

impl IntoGl for CubeFace {
    fn into_gl(self) -> u32 {
        glow::TEXTURE_CUBE_MAP_POSITIVE_X + self.index()
    }
}

impl IntoGl for PixelFormat {
    fn into_gl(self) -> u32 {
        match self {
            PixelFormat::Red => glow::RED,
            PixelFormat::Rg => glow::RG,
            PixelFormat::Rgb => glow::RGB,
            PixelFormat::Rgba => glow::RGBA,
        }
    }
}

impl IntoGl for PixelType {
    fn into_gl(self) -> u32 {
        match self {
            PixelType::UnsignedByte => glow::UNSIGNED_BYTE,
            PixelType::Float => glow::FLOAT,
        }
    }
}

impl IntoGl for TextureFormat {
    fn into_gl(self) -> u32 {
        match self {
            TextureFormat::R8 => glow::R8,
            TextureFormat::Rg8 => glow::RG8,
            TextureFormat::Rgb8 => glow::RGB8,
            TextureFormat::Rgba8 => glow::RGBA8,
            TextureFormat::Srgb8 => glow::SRGB8,
            TextureFormat::Srgb8Alpha8 => glow::SRGB8_ALPHA8,
            TextureFormat::R16Float => glow::R16F,
            TextureFormat::Rg16Float => glow::RG16F,
            TextureFormat::Rgb16Float => glow::RGB16F,
            TextureFormat::Rgba16Float => glow::RGBA16F,
            TextureFormat::R32Float => glow::R32F,
            TextureFormat::Rg32Float => glow::RG32F,
            TextureFormat::Rgb32Float => glow::RGB32F,
            TextureFormat::Rgba32Float => glow::RGBA32F,
        }
    }
}

impl IntoGl for ColorSource {
    fn into_gl(self) -> u32 {
        match self {
            ColorSource::Front => glow::FRONT,
            ColorSource::Back => glow::BACK,
            ColorSource::Attachment(index) => glow::COLOR_ATTACHMENT0 + index,
        }
    }
}

/// Client-side layout matching a storage format, used to allocate mutable
/// storage without uploading data.
pub fn transfer_layout(format: TextureFormat) -> (PixelFormat, PixelType) {
    use TextureFormat as F;
    let pixel_format = match format {
        F::R8 | F::R16Float | F::R32Float => PixelFormat::Red,
        F::Rg8 | F::Rg16Float | F::Rg32Float => PixelFormat::Rg,
        F::Rgb8 | F::Srgb8 | F::Rgb16Float | F::Rgb32Float => PixelFormat::Rgb,
        F::Rgba8 | F::Srgb8Alpha8 | F::Rgba16Float | F::Rgba32Float => PixelFormat::Rgba,
    };
    let ty = match format {
        F::R8 | F::Rg8 | F::Rgb8 | F::Rgba8 | F::Srgb8 | F::Srgb8Alpha8 => PixelType::UnsignedByte,
        _ => PixelType::Float,
    };
    (pixel_format, ty)
}
