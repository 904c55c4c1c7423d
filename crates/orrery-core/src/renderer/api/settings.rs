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

//! Toolkit-wide configuration.

use serde::{Deserialize, Serialize};

/// Default capacity of a streaming buffer: 1 MiB.
pub const DEFAULT_STREAM_CAPACITY: u64 = 1 << 20;

/// Settings shared by the program builder, streaming buffers and texture loader.
///
/// Components read these explicitly; there is no global instance. Missing
/// fields fall back to their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolkitSettings {
    /// GLSL version emitted in every program preamble.
    pub glsl_version: u32,
    /// Append `compatibility` to the `#version` line.
    pub compatibility_profile: bool,
    /// Link programs after compiling their stages.
    pub link_programs: bool,
    /// Capacity in bytes of streaming buffers created from these settings.
    pub stream_capacity: u64,
    /// Prefer immutable texture storage when the driver supports it.
    pub immutable_textures: bool,
    /// Generate mipmaps after uploading textures.
    pub generate_mipmaps: bool,
}

impl Default for ToolkitSettings {
    fn default() -> Self {
        Self {
            glsl_version: 430,
            compatibility_profile: false,
            link_programs: true,
            stream_capacity: DEFAULT_STREAM_CAPACITY,
            immutable_textures: true,
            generate_mipmaps: true,
        }
    }
}
