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

//! Defines data structures related to texture resources and pixel transfers.

use crate::math::{Extent3D, Origin3D};
use std::borrow::Cow;

/// The kind of texture object and how its layers are addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    /// A one-dimensional texture.
    D1,
    /// An array of one-dimensional textures, one per row.
    D1Array,
    /// A two-dimensional texture.
    D2,
    /// A two-dimensional texture addressed with unnormalized coordinates.
    Rectangle,
    /// Six square two-dimensional faces.
    CubeMap,
    /// An array of two-dimensional textures.
    D2Array,
    /// A volume texture.
    D3,
}

/// One face of a cube map, in GL face order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    /// `+X`
    PositiveX,
    /// `-X`
    NegativeX,
    /// `+Y`
    PositiveY,
    /// `-Y`
    NegativeY,
    /// `+Z`
    PositiveZ,
    /// `-Z`
    NegativeZ,
}

impl CubeFace {
    /// All faces in upload order.
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    /// Offset of the face from `TEXTURE_CUBE_MAP_POSITIVE_X`.
    pub const fn index(self) -> u32 {
        self as u32
    }
}

/// The layout of client-side pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// One component.
    Red,
    /// Two components.
    Rg,
    /// Three components.
    Rgb,
    /// Four components.
    Rgba,
}

impl PixelFormat {
    /// The pixel format holding `components` values per texel, if any.
    pub const fn from_components(components: u32) -> Option<Self> {
        match components {
            1 => Some(PixelFormat::Red),
            2 => Some(PixelFormat::Rg),
            3 => Some(PixelFormat::Rgb),
            4 => Some(PixelFormat::Rgba),
            _ => None,
        }
    }

    /// Number of components per texel.
    pub const fn components(self) -> u32 {
        match self {
            PixelFormat::Red => 1,
            PixelFormat::Rg => 2,
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }
}

/// The scalar type of client-side pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelType {
    /// 8-bit unsigned normalized.
    UnsignedByte,
    /// 32-bit float.
    Float,
}

impl PixelType {
    /// Size of one component in bytes.
    pub const fn size(self) -> usize {
        match self {
            PixelType::UnsignedByte => 1,
            PixelType::Float => 4,
        }
    }
}

/// The GPU-side storage format of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum TextureFormat {
    R8,
    Rg8,
    Rgb8,
    Rgba8,
    Srgb8,
    Srgb8Alpha8,
    R16Float,
    Rg16Float,
    Rgb16Float,
    Rgba16Float,
    R32Float,
    Rg32Float,
    Rgb32Float,
    Rgba32Float,
}

impl TextureFormat {
    /// The storage format that keeps client data of this layout without
    /// loss: 8-bit normalized for bytes, 32-bit float for floats.
    pub const fn natural(format: PixelFormat, ty: PixelType) -> Self {
        match (format, ty) {
            (PixelFormat::Red, PixelType::UnsignedByte) => TextureFormat::R8,
            (PixelFormat::Rg, PixelType::UnsignedByte) => TextureFormat::Rg8,
            (PixelFormat::Rgb, PixelType::UnsignedByte) => TextureFormat::Rgb8,
            (PixelFormat::Rgba, PixelType::UnsignedByte) => TextureFormat::Rgba8,
            (PixelFormat::Red, PixelType::Float) => TextureFormat::R32Float,
            (PixelFormat::Rg, PixelType::Float) => TextureFormat::Rg32Float,
            (PixelFormat::Rgb, PixelType::Float) => TextureFormat::Rgb32Float,
            (PixelFormat::Rgba, PixelType::Float) => TextureFormat::Rgba32Float,
        }
    }
}

/// A descriptor used to create a [`TextureId`] together with its storage.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureStorageDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The kind of texture.
    pub target: TextureTarget,
    /// The storage format.
    pub format: TextureFormat,
    /// Width, height and depth (or layer count) of level 0.
    pub extent: Extent3D,
    /// Number of mip levels. Mutable storage only allocates level 0.
    pub levels: u32,
    /// Allocate with immutable storage instead of a mutable level-0 image.
    pub immutable: bool,
}

/// One sub-image transfer into level 0 of a texture.
#[derive(Debug, Clone, Copy)]
pub struct TextureWrite<'a> {
    /// The cube face written, for cube maps only.
    pub cube_face: Option<CubeFace>,
    /// Texel offset of the written region; `z` selects the layer or slice.
    pub origin: Origin3D,
    /// Size of the written region.
    pub extent: Extent3D,
    /// Layout of `data`.
    pub format: PixelFormat,
    /// Scalar type of `data`.
    pub ty: PixelType,
    /// Tightly packed pixel rows, bottom row first.
    pub data: &'a [u8],
}

/// The color buffer read by a readback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSource {
    /// The front buffer of the default framebuffer.
    Front,
    /// The back buffer of the default framebuffer.
    Back,
    /// A color attachment of the bound framebuffer.
    Attachment(u32),
}

/// Pixels read back from the current viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorReadback {
    /// Viewport width.
    pub width: u32,
    /// Viewport height.
    pub height: u32,
    /// Tightly packed pixel rows, bottom row first.
    pub data: Vec<u8>,
}

/// The full pixel-store state of one transfer direction (pack or unpack),
/// including the bound pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelStoreState {
    /// Bound pixel buffer object name, `0` for client memory.
    pub buffer_binding: u32,
    /// Swap bytes of multi-byte components.
    pub swap_bytes: bool,
    /// Bit order for bitmap data.
    pub lsb_first: bool,
    /// Row length override in pixels, `0` for the image width.
    pub row_length: i32,
    /// Image height override for volume transfers, `0` for the image height.
    pub image_height: i32,
    /// Rows skipped at the start.
    pub skip_rows: i32,
    /// Pixels skipped at the start of each row.
    pub skip_pixels: i32,
    /// Images skipped at the start of a volume.
    pub skip_images: i32,
    /// Row alignment in bytes (1, 2, 4 or 8).
    pub alignment: i32,
}

impl PixelStoreState {
    /// Client memory, no skips or overrides, byte alignment.
    pub const fn tightly_packed() -> Self {
        Self {
            buffer_binding: 0,
            swap_bytes: false,
            lsb_first: false,
            row_length: 0,
            image_height: 0,
            skip_rows: 0,
            skip_pixels: 0,
            skip_images: 0,
            alignment: 1,
        }
    }
}

impl Default for PixelStoreState {
    /// The GL initial state: like [`tightly_packed`](Self::tightly_packed) with 4-byte alignment.
    fn default() -> Self {
        Self {
            alignment: 4,
            ..Self::tightly_packed()
        }
    }
}

/// An opaque handle to a GPU texture resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_format_round_trips_component_count() {
        for components in 1..=4 {
            let format = PixelFormat::from_components(components).unwrap();
            assert_eq!(format.components(), components);
        }
        assert!(PixelFormat::from_components(0).is_none());
        assert!(PixelFormat::from_components(5).is_none());
    }

    #[test]
    fn cube_faces_follow_gl_order() {
        let indices: Vec<u32> = CubeFace::ALL.iter().map(|f| f.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn natural_format_preserves_precision() {
        assert_eq!(
            TextureFormat::natural(PixelFormat::Rgb, PixelType::Float),
            TextureFormat::Rgb32Float
        );
        assert_eq!(
            TextureFormat::natural(PixelFormat::Red, PixelType::UnsignedByte),
            TextureFormat::R8
        );
    }
}
