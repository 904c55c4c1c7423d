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

//! OpenGL-style resource management on top of the [`GlDevice`] contract.

pub mod api;
pub mod error;
pub mod gpu_clock;
pub mod program_builder;
pub mod resource;
pub mod streaming_buffer;
pub mod texture;
pub mod traits;

pub use self::api::*;
pub use self::error::{LayerShape, ResourceError, ShaderError, TextureError};
pub use self::gpu_clock::{ClockTicks, GpuClock};
pub use self::program_builder::{ProgramBuilder, ProgramOptions};
pub use self::resource::{ProgramSlot, ResourceSlot, TextureSlot};
pub use self::streaming_buffer::StreamingBuffer;
pub use self::texture::{
    upload_texture, ImageLayer, LayerPixels, LayeredTexture, TextureUploadOptions,
};
pub use self::traits::{GlDevice, GpuResource};
