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

//! Defines the hierarchy of error types for the GPU toolkit.

use crate::renderer::api::{ShaderStage, TextureTarget};
use std::fmt;

/// An error related to loading, compiling or linking a shader program.
#[derive(Debug)]
pub enum ShaderError {
    /// An error occurred while trying to load a source fragment from a path.
    LoadError {
        /// The path of the file that failed to load.
        path: String,
        /// The underlying I/O error, rendered as text.
        source_error: String,
    },
    /// The last source fragment contains no stage marker token.
    NoStageDetected,
    /// One stage of the program failed to compile.
    StageCompileFailed {
        /// The stage that failed.
        stage: ShaderStage,
        /// The driver's info log, verbatim.
        log: String,
    },
    /// The program failed to link.
    LinkFailed {
        /// The driver's info log, verbatim.
        log: String,
    },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::LoadError { path, source_error } => {
                write!(
                    f,
                    "Failed to load shader source from '{path}': {source_error}"
                )
            }
            ShaderError::NoStageDetected => {
                write!(f, "No shader stage marker found in the last source fragment")
            }
            ShaderError::StageCompileFailed { stage, log } => {
                write!(f, "{stage} shader compilation failed:\n{log}")
            }
            ShaderError::LinkFailed { log } => write!(f, "Program link failed:\n{log}"),
        }
    }
}

impl std::error::Error for ShaderError {}

/// Width, height, component count and dynamic range of one texture layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerShape {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Components per texel.
    pub components: u32,
    /// Whether texels are 32-bit floats.
    pub hdr: bool,
}

impl fmt::Display for LayerShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}, {} component(s), {}",
            self.width,
            self.height,
            self.components,
            if self.hdr { "HDR" } else { "LDR" }
        )
    }
}

/// An error related to assembling or uploading a layered texture.
#[derive(Debug)]
pub enum TextureError {
    /// The component count / texel type combination has no GL pixel format.
    UnsupportedFormat {
        /// Components per texel.
        components: u32,
        /// Whether texels are 32-bit floats.
        hdr: bool,
    },
    /// The layers cannot be stored in the requested target.
    UnsupportedTarget {
        /// The requested target.
        target: TextureTarget,
        /// What made the target unusable.
        reason: &'static str,
    },
    /// A layer does not match the texture's header or its first layer.
    LayerMismatch {
        /// Position the layer would have taken.
        index: usize,
        /// The shape the texture requires.
        expected: LayerShape,
        /// The shape of the rejected layer.
        found: LayerShape,
    },
    /// A layer's pixel buffer length does not match its declared shape.
    InvalidLayerData {
        /// Number of values implied by the shape.
        expected_len: usize,
        /// Number of values actually provided.
        found_len: usize,
    },
    /// A layer has no texels.
    EmptyLayer {
        /// Width in texels.
        width: u32,
        /// Height in texels.
        height: u32,
    },
    /// The texture holds no layers.
    NoLayers,
    /// The requested component count is outside `0..=4`.
    InvalidComponents(u32),
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureError::UnsupportedFormat { components, hdr } => write!(
                f,
                "Unsupported texel format: {components} component(s), {}",
                if *hdr { "HDR" } else { "LDR" }
            ),
            TextureError::UnsupportedTarget { target, reason } => {
                write!(f, "Unsupported texture target {target:?}: {reason}")
            }
            TextureError::LayerMismatch {
                index,
                expected,
                found,
            } => write!(
                f,
                "Layer {index} does not match the texture: expected {expected}, found {found}"
            ),
            TextureError::InvalidLayerData {
                expected_len,
                found_len,
            } => write!(
                f,
                "Layer pixel data has {found_len} values, its shape requires {expected_len}"
            ),
            TextureError::EmptyLayer { width, height } => {
                write!(f, "Layer of {width}x{height} texels is empty")
            }
            TextureError::NoLayers => write!(f, "Texture has no layers"),
            TextureError::InvalidComponents(count) => {
                write!(f, "Invalid component count {count}, expected 0 to 4")
            }
        }
    }
}

impl std::error::Error for TextureError {}

/// An error related to the creation or use of a GPU resource.
#[derive(Debug)]
pub enum ResourceError {
    /// A shader-specific error occurred.
    Shader(ShaderError),
    /// A texture-specific error occurred.
    Texture(TextureError),
    /// A streaming buffer cannot hold eight chunks of the requested size.
    ChunkTooLarge {
        /// The requested chunk size in bytes.
        chunk_size: u64,
        /// The buffer capacity in bytes.
        capacity: u64,
    },
    /// An upload did not match the streaming buffer's chunk size.
    ChunkSizeMismatch {
        /// The configured chunk size in bytes.
        expected: u64,
        /// The size of the rejected upload.
        found: u64,
    },
    /// The driver refused to map a buffer range for writing.
    BufferMapFailed,
    /// A range bind was requested before anything was written.
    NothingUploaded,
    /// A generic resource could not be found.
    NotFound,
    /// A clock was stopped without a matching start.
    ClockNotStarted,
    /// An error originating from the specific graphics backend implementation.
    BackendError(String),
    /// The GL error flag was raised.
    GlError(u32),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Shader(err) => write!(f, "Shader resource error: {err}"),
            ResourceError::Texture(err) => write!(f, "Texture resource error: {err}"),
            ResourceError::ChunkTooLarge {
                chunk_size,
                capacity,
            } => write!(
                f,
                "Chunk of {chunk_size} bytes is too large for a {capacity}-byte stream buffer"
            ),
            ResourceError::ChunkSizeMismatch { expected, found } => {
                write!(f, "Upload of {found} bytes, stream chunk size is {expected}")
            }
            ResourceError::BufferMapFailed => write!(f, "Failed to map buffer range."),
            ResourceError::NothingUploaded => write!(f, "No chunk has been uploaded yet."),
            ResourceError::NotFound => write!(f, "Resource not found with ID."),
            ResourceError::ClockNotStarted => write!(f, "Clock stopped before being started."),
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
            ResourceError::GlError(code) => write!(f, "OpenGL error 0x{code:04X}"),
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Shader(err) => Some(err),
            ResourceError::Texture(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ShaderError> for ResourceError {
    fn from(err: ShaderError) -> Self {
        ResourceError::Shader(err)
    }
}

impl From<TextureError> for ResourceError {
    fn from(err: TextureError) -> Self {
        ResourceError::Texture(err)
    }
}
