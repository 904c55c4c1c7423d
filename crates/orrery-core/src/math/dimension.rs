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

//! Integer extents and origins for texture storage and sub-image writes.

/// A three-dimensional extent: width, height and depth (or layer count).
///
/// Unused axes are `1`, so a 2D texture is `(w, h, 1)` and a 1D array is
/// `(w, layers, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent3D {
    /// The width component of the extent.
    pub width: u32,
    /// The height component of the extent.
    pub height: u32,
    /// The depth or number of array layers.
    pub depth_or_array_layers: u32,
}

impl Extent3D {
    /// Creates a new extent.
    pub const fn new(width: u32, height: u32, depth_or_array_layers: u32) -> Self {
        Self {
            width,
            height,
            depth_or_array_layers,
        }
    }

    /// Number of mip levels of a full chain for this extent:
    /// `floor(log2(max(width, height, depth))) + 1`.
    ///
    /// # Examples
    ///
    /// ```
    /// use orrery_core::math::Extent3D;
    /// assert_eq!(Extent3D::new(256, 256, 1).full_mip_chain(), 9);
    /// assert_eq!(Extent3D::new(3, 1, 1).full_mip_chain(), 2);
    /// ```
    pub fn full_mip_chain(&self) -> u32 {
        let largest = self
            .width
            .max(self.height)
            .max(self.depth_or_array_layers)
            .max(1);
        u32::BITS - largest.leading_zeros()
    }
}

impl Default for Extent3D {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

/// A three-dimensional origin, representing an (x, y, z) offset.
///
/// `z` addresses the array layer or volume slice of the write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Origin3D {
    /// The x-coordinate of the origin.
    pub x: u32,
    /// The y-coordinate of the origin.
    pub y: u32,
    /// The z-coordinate or array layer of the origin.
    pub z: u32,
}

impl Origin3D {
    /// The origin `(0, 0, 0)`.
    pub const ZERO: Self = Self { x: 0, y: 0, z: 0 };

    /// Creates a new origin.
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }
}
