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

use anyhow::{anyhow, Result};
use glow::HasContext;

/// Lowest desktop OpenGL version the backend accepts.
const MIN_DESKTOP_VERSION: (u32, u32) = (3, 3);

/// Lowest OpenGL ES version the backend accepts.
const MIN_EMBEDDED_VERSION: (u32, u32) = (3, 0);

/// Capabilities of the current OpenGL context, queried once at device creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlContextInfo {
    /// `(major, minor)` context version.
    pub version: (u32, u32),
    /// OpenGL ES context.
    pub embedded: bool,
    /// The `GL_RENDERER` string.
    pub renderer: String,
    /// The `GL_VENDOR` string.
    pub vendor: String,
    /// `glTexStorage*` is available (GL 4.2, ES 3.0 or `ARB_texture_storage`).
    pub immutable_storage: bool,
}

impl GlContextInfo {
    /// Queries the capabilities of `gl`.
    ///
    /// # Errors
    ///
    /// Fails for desktop contexts older than 3.3 and ES contexts older than 3.0.
    ///
    /// # Safety
    ///
    /// `gl` must be current on the calling thread.
    pub unsafe fn query(gl: &glow::Context) -> Result<Self> {
        let version = gl.version();
        let info = Self {
            version: (version.major, version.minor),
            embedded: version.is_embedded,
            renderer: unsafe { gl.get_parameter_string(glow::RENDERER) },
            vendor: unsafe { gl.get_parameter_string(glow::VENDOR) },
            immutable_storage: if version.is_embedded {
                version.major >= 3
            } else {
                (version.major, version.minor) >= (4, 2)
                    || gl.supported_extensions().contains("GL_ARB_texture_storage")
            },
        };

        if !version_supported(info.version, info.embedded) {
            return Err(anyhow!(
                "OpenGL {}{}.{} is too old (\"{}\"), at least 3.3 or ES 3.0 is required",
                if info.embedded { "ES " } else { "" },
                info.version.0,
                info.version.1,
                info.renderer
            ));
        }

        log::info!(
            "GlowDevice: OpenGL {}{}.{} on \"{}\" ({}), immutable storage: {}",
            if info.embedded { "ES " } else { "" },
            info.version.0,
            info.version.1,
            info.renderer,
            info.vendor,
            info.immutable_storage
        );
        Ok(info)
    }
}

/// Whether a context of `version` meets the backend's minimum.
///
/// ES contexts run without 1D, rectangle and timer-query support.
fn version_supported(version: (u32, u32), embedded: bool) -> bool {
    if embedded {
        version >= MIN_EMBEDDED_VERSION
    } else {
        version >= MIN_DESKTOP_VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desktop_needs_three_three() {
        assert!(!version_supported((2, 1), false));
        assert!(!version_supported((3, 2), false));
        assert!(version_supported((3, 3), false));
        assert!(version_supported((4, 6), false));
    }

    #[test]
    fn embedded_needs_three_zero() {
        assert!(!version_supported((2, 0), true));
        assert!(version_supported((3, 0), true));
        assert!(version_supported((3, 2), true));
    }
}
