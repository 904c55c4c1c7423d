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

use crate::renderer::api::{BufferId, ProgramId, QueryId, TextureId, VertexArrayId};
use crate::renderer::error::ResourceError;
use crate::renderer::traits::GlDevice;
use std::fmt::Debug;

/// A GPU object handle that knows how to release itself.
pub trait GpuResource: Copy + Debug {
    /// Releases the object on `device`.
    fn release(self, device: &dyn GlDevice) -> Result<(), ResourceError>;
}

impl GpuResource for ProgramId {
    fn release(self, device: &dyn GlDevice) -> Result<(), ResourceError> {
        device.destroy_program(self)
    }
}

impl GpuResource for TextureId {
    fn release(self, device: &dyn GlDevice) -> Result<(), ResourceError> {
        device.destroy_texture(self)
    }
}

impl GpuResource for BufferId {
    fn release(self, device: &dyn GlDevice) -> Result<(), ResourceError> {
        device.destroy_buffer(self)
    }
}

impl GpuResource for VertexArrayId {
    fn release(self, device: &dyn GlDevice) -> Result<(), ResourceError> {
        device.destroy_vertex_array(self)
    }
}

impl GpuResource for QueryId {
    fn release(self, device: &dyn GlDevice) -> Result<(), ResourceError> {
        device.destroy_timer_query(self)
    }
}
