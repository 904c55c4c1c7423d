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

//! Defines data structures related to shader programs.

use std::fmt;

/// An opaque handle to a GPU program object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub usize);

/// An opaque handle to a compiled shader object, owned by the program builder
/// between compilation and attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderId(pub usize);

/// A programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex processing.
    Vertex,
    /// Fragment processing.
    Fragment,
    /// Geometry processing.
    Geometry,
    /// Tessellation control.
    TessControl,
    /// Tessellation evaluation.
    TessEvaluation,
    /// Compute dispatch.
    Compute,
}

impl ShaderStage {
    /// Every stage, in the order stage detection reports them.
    pub const ALL: [ShaderStage; 6] = [
        ShaderStage::Vertex,
        ShaderStage::Fragment,
        ShaderStage::Geometry,
        ShaderStage::TessControl,
        ShaderStage::TessEvaluation,
        ShaderStage::Compute,
    ];

    /// The marker token that selects this stage in GLSL source, and the macro
    /// defined to `1` while compiling it.
    pub const fn token(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "VERTEX_SHADER",
            ShaderStage::Fragment => "FRAGMENT_SHADER",
            ShaderStage::Geometry => "GEOMETRY_SHADER",
            ShaderStage::TessControl => "TESS_CONTROL_SHADER",
            ShaderStage::TessEvaluation => "TESS_EVALUATION_SHADER",
            ShaderStage::Compute => "COMPUTE_SHADER",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShaderStage::Vertex => "Vertex",
            ShaderStage::Fragment => "Fragment",
            ShaderStage::Geometry => "Geometry",
            ShaderStage::TessControl => "Tessellation control",
            ShaderStage::TessEvaluation => "Tessellation evaluation",
            ShaderStage::Compute => "Compute",
        };
        f.write_str(name)
    }
}
