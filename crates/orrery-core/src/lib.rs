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

//! # Orrery Core
//!
//! Backend-agnostic GPU toolkit: the [`GlDevice`](renderer::GlDevice) contract,
//! owned resource slots, shader program assembly, streaming buffers, layered
//! texture uploads and parametric mesh generation.
//!
//! Concrete OpenGL calls live in `orrery-infra`; file formats live in `orrery-io`.

#![warn(missing_docs)]

pub mod math;
pub mod mesh;
pub mod renderer;

#[cfg(any(test, feature = "testing"))]
#[doc(hidden)]
#[allow(missing_docs)]
pub mod testing;

pub use mesh::{GpuMesh, MeshError, MeshTopology, MeshVertex, ParametricMesh};
pub use renderer::{
    upload_texture, ClockTicks, GlDevice, GpuClock, ImageLayer, LayerPixels, LayeredTexture,
    ProgramBuilder, ProgramOptions, ProgramSlot, ResourceError, ResourceSlot, ShaderError,
    StreamingBuffer, TextureError, TextureSlot, TextureUploadOptions, ToolkitSettings,
};
