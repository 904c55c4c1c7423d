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

use crate::renderer::{
    api::{ColorSource, PixelFormat, PixelStoreState, PixelType},
    error::{LayerShape, ResourceError, TextureError},
    traits::GlDevice,
};

/// Texel storage of one layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerPixels {
    /// 8-bit unsigned normalized components.
    Ldr(Vec<u8>),
    /// 32-bit float components.
    Hdr(Vec<f32>),
}

impl LayerPixels {
    /// Number of component values stored.
    pub fn len(&self) -> usize {
        match self {
            LayerPixels::Ldr(v) => v.len(),
            LayerPixels::Hdr(v) => v.len(),
        }
    }

    /// Whether no values are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The raw bytes, in native endianness.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            LayerPixels::Ldr(v) => v,
            LayerPixels::Hdr(v) => bytemuck::cast_slice(v),
        }
    }

    /// The GL scalar type matching the storage.
    pub fn pixel_type(&self) -> PixelType {
        match self {
            LayerPixels::Ldr(_) => PixelType::UnsignedByte,
            LayerPixels::Hdr(_) => PixelType::Float,
        }
    }
}

/// One image of a [`LayeredTexture`]: a 2D grid of texels, rows bottom to top.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageLayer {
    width: u32,
    height: u32,
    components: u32,
    pixels: LayerPixels,
}

impl ImageLayer {
    /// Wraps a pixel buffer of `width * height * components` values.
    ///
    /// # Errors
    ///
    /// - [`TextureError::EmptyLayer`] if `width` or `height` is zero.
    /// - [`TextureError::InvalidComponents`] for a component count outside `1..=4`.
    /// - [`TextureError::InvalidLayerData`] if the buffer length does not
    ///   match the shape.
    pub fn new(
        width: u32,
        height: u32,
        components: u32,
        pixels: LayerPixels,
    ) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::EmptyLayer { width, height });
        }
        if !(1..=4).contains(&components) {
            return Err(TextureError::InvalidComponents(components));
        }
        let expected_len = width as usize * height as usize * components as usize;
        if pixels.len() != expected_len {
            return Err(TextureError::InvalidLayerData {
                expected_len,
                found_len: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            components,
            pixels,
        })
    }

    /// Width in texels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in texels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Components per texel.
    pub fn components(&self) -> u32 {
        self.components
    }

    /// Whether texels are 32-bit floats.
    pub fn is_hdr(&self) -> bool {
        matches!(self.pixels, LayerPixels::Hdr(_))
    }

    /// The texel storage.
    pub fn pixels(&self) -> &LayerPixels {
        &self.pixels
    }

    /// Width, height, components and range, for comparisons.
    pub fn shape(&self) -> LayerShape {
        LayerShape {
            width: self.width,
            height: self.height,
            components: self.components,
            hdr: self.is_hdr(),
        }
    }

    /// The GL client format of the texels.
    pub fn pixel_format(&self) -> Option<PixelFormat> {
        PixelFormat::from_components(self.components)
    }

    /// Reverses the row order in place.
    pub fn flip_vertically(&mut self) {
        let row = self.width as usize * self.components as usize;
        match &mut self.pixels {
            LayerPixels::Ldr(v) => flip_rows(v, row),
            LayerPixels::Hdr(v) => flip_rows(v, row),
        }
    }
}

fn flip_rows<T>(values: &mut [T], row: usize) {
    if row == 0 {
        return;
    }
    let rows = values.len() / row;
    for top in 0..rows / 2 {
        let bottom = rows - 1 - top;
        let (head, tail) = values.split_at_mut(bottom * row);
        head[top * row..(top + 1) * row].swap_with_slice(&mut tail[..row]);
    }
}

/// An ordered list of same-shaped image layers, uploaded together as one
/// texture.
///
/// Push order is array-layer, cube-face and volume-slice order. Every layer is
/// validated against the texture when pushed, so an upload never starts with
/// inconsistent layers.
#[derive(Debug, Clone, Default)]
pub struct LayeredTexture {
    components: u32,
    layers: Vec<ImageLayer>,
}

impl LayeredTexture {
    /// Creates an empty texture whose layers must have `components`
    /// components; `0` adopts the first layer's count.
    ///
    /// # Errors
    ///
    /// [`TextureError::InvalidComponents`] if `components > 4`.
    pub fn new(components: u32) -> Result<Self, TextureError> {
        if components > 4 {
            return Err(TextureError::InvalidComponents(components));
        }
        Ok(Self {
            components,
            layers: Vec::new(),
        })
    }

    /// The component count layers must have, once known.
    pub fn required_components(&self) -> Option<u32> {
        match self.components {
            0 => self.layers.first().map(ImageLayer::components),
            n => Some(n),
        }
    }

    /// Appends a layer, optionally flipping it vertically first.
    ///
    /// # Errors
    ///
    /// [`TextureError::LayerMismatch`] if the layer's component count differs
    /// from the required one, or its size or range differs from the first
    /// layer's. The texture is unchanged on error.
    pub fn push_layer(&mut self, mut layer: ImageLayer, flip_y: bool) -> Result<(), TextureError> {
        let found = layer.shape();
        let expected = match self.layers.first() {
            Some(first) => LayerShape {
                components: self.required_components().unwrap_or(found.components),
                ..first.shape()
            },
            None => LayerShape {
                components: self.required_components().unwrap_or(found.components),
                ..found
            },
        };
        if found != expected {
            return Err(TextureError::LayerMismatch {
                index: self.layers.len(),
                expected,
                found,
            });
        }

        if flip_y {
            layer.flip_vertically();
        }
        self.layers.push(layer);
        Ok(())
    }

    /// Reads the current viewport of a color buffer into a new layer.
    ///
    /// The pixel-pack state is switched to tightly packed for the readback
    /// and restored afterwards, even on failure.
    ///
    /// # Errors
    ///
    /// [`TextureError::LayerMismatch`] (wrapped) if the viewport does not match
    /// the existing layers, or the device error if the readback fails.
    pub fn push_color_buffer(
        &mut self,
        device: &dyn GlDevice,
        source: ColorSource,
        format: PixelFormat,
        ty: PixelType,
        flip_y: bool,
    ) -> Result<(), ResourceError> {
        let readback = {
            let _pack = PackStateGuard::new(device);
            device.read_color_buffer(source, format, ty)?
        };
        if let Some(code) = device.take_error() {
            return Err(ResourceError::GlError(code));
        }

        let pixels = match ty {
            PixelType::UnsignedByte => LayerPixels::Ldr(readback.data),
            PixelType::Float => LayerPixels::Hdr(
                readback
                    .data
                    .chunks_exact(4)
                    .map(bytemuck::pod_read_unaligned::<f32>)
                    .collect(),
            ),
        };
        let layer = ImageLayer::new(readback.width, readback.height, format.components(), pixels)?;
        self.push_layer(layer, flip_y)?;
        Ok(())
    }

    /// The layers in push order.
    pub fn layers(&self) -> &[ImageLayer] {
        &self.layers
    }

    /// Number of layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Whether the texture holds no layer.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Saves the pixel-pack state, installs the tightly packed state, and
/// restores the saved state when dropped.
struct PackStateGuard<'a> {
    device: &'a dyn GlDevice,
    saved: PixelStoreState,
}

impl<'a> PackStateGuard<'a> {
    fn new(device: &'a dyn GlDevice) -> Self {
        let saved = device.pixel_pack_state();
        device.set_pixel_pack_state(&PixelStoreState::tightly_packed());
        Self { device, saved }
    }
}

impl Drop for PackStateGuard<'_> {
    fn drop(&mut self) {
        self.device.set_pixel_pack_state(&self.saved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockCall, MockGlDevice};

    fn ldr(width: u32, height: u32, components: u32) -> ImageLayer {
        let len = (width * height * components) as usize;
        ImageLayer::new(width, height, components, LayerPixels::Ldr((0..len as u8).collect()))
            .unwrap()
    }

    #[test]
    fn layer_rejects_wrong_buffer_length() {
        let err = ImageLayer::new(2, 2, 3, LayerPixels::Ldr(vec![0; 11])).unwrap_err();
        assert!(matches!(
            err,
            TextureError::InvalidLayerData {
                expected_len: 12,
                found_len: 11
            }
        ));
    }

    #[test]
    fn layer_rejects_zero_extent() {
        assert!(matches!(
            ImageLayer::new(0, 3, 1, LayerPixels::Ldr(Vec::new())),
            Err(TextureError::EmptyLayer {
                width: 0,
                height: 3
            })
        ));
        assert!(matches!(
            ImageLayer::new(2, 0, 4, LayerPixels::Hdr(Vec::new())),
            Err(TextureError::EmptyLayer { .. })
        ));
    }

    #[test]
    fn empty_viewport_readback_pushes_nothing() {
        let device = MockGlDevice::new();
        device.viewport.set((0, 0));
        let mut texture = LayeredTexture::new(4).unwrap();

        let err = texture
            .push_color_buffer(
                &device,
                ColorSource::Back,
                PixelFormat::Rgba,
                PixelType::UnsignedByte,
                false,
            )
            .unwrap_err();

        assert!(matches!(
            err,
            ResourceError::Texture(TextureError::EmptyLayer { .. })
        ));
        assert!(texture.is_empty());
        assert_eq!(device.current_pack(), PixelStoreState::default());
    }

    #[test]
    fn flip_reverses_rows() {
        let mut layer = ldr(2, 3, 1);
        layer.flip_vertically();
        assert_eq!(layer.pixels(), &LayerPixels::Ldr(vec![4, 5, 2, 3, 0, 1]));
    }

    #[test]
    fn flip_handles_hdr_rows() {
        let mut layer =
            ImageLayer::new(1, 2, 2, LayerPixels::Hdr(vec![0.0, 0.5, 1.0, 1.5])).unwrap();
        layer.flip_vertically();
        assert_eq!(layer.pixels(), &LayerPixels::Hdr(vec![1.0, 1.5, 0.0, 0.5]));
    }

    #[test]
    fn zero_components_adopts_first_layer() {
        let mut texture = LayeredTexture::new(0).unwrap();
        assert_eq!(texture.required_components(), None);

        texture.push_layer(ldr(2, 2, 3), false).unwrap();

        assert_eq!(texture.required_components(), Some(3));
        assert!(matches!(
            texture.push_layer(ldr(2, 2, 4), false),
            Err(TextureError::LayerMismatch { index: 1, .. })
        ));
    }

    #[test]
    fn invalid_requested_components_rejected() {
        assert!(matches!(
            LayeredTexture::new(5),
            Err(TextureError::InvalidComponents(5))
        ));
    }

    #[test]
    fn mismatched_layers_rejected_without_mutation() {
        let mut texture = LayeredTexture::new(4).unwrap();
        assert!(texture.push_layer(ldr(2, 2, 3), false).is_err());
        assert!(texture.is_empty());

        texture.push_layer(ldr(4, 4, 4), false).unwrap();
        match texture.push_layer(ldr(4, 2, 4), false) {
            Err(TextureError::LayerMismatch {
                index,
                expected,
                found,
            }) => {
                assert_eq!(index, 1);
                assert_eq!(expected.height, 4);
                assert_eq!(found.height, 2);
            }
            other => panic!("expected LayerMismatch, got {other:?}"),
        }

        let hdr = ImageLayer::new(4, 4, 4, LayerPixels::Hdr(vec![0.0; 64])).unwrap();
        assert!(texture.push_layer(hdr, false).is_err());
        assert_eq!(texture.layer_count(), 1);
    }

    #[test]
    fn color_buffer_readback_restores_pack_state() {
        let device = MockGlDevice::new();
        let before = device.current_pack();
        let mut texture = LayeredTexture::new(0).unwrap();

        texture
            .push_color_buffer(
                &device,
                ColorSource::Back,
                PixelFormat::Rgb,
                PixelType::UnsignedByte,
                true,
            )
            .unwrap();

        assert_eq!(device.current_pack(), before);
        let pack_during_read = device.calls().iter().find_map(|c| match c {
            MockCall::ReadColorBuffer { pack, .. } => Some(*pack),
            _ => None,
        });
        assert_eq!(pack_during_read, Some(PixelStoreState::tightly_packed()));

        let layer = &texture.layers()[0];
        assert_eq!((layer.width(), layer.height(), layer.components()), (4, 2, 3));
        // The mock fills each row with its row index; flipped, row 1 comes first.
        match layer.pixels() {
            LayerPixels::Ldr(v) => {
                assert!(v[..12].iter().all(|&b| b == 1));
                assert!(v[12..].iter().all(|&b| b == 0));
            }
            other => panic!("expected LDR pixels, got {other:?}"),
        }
    }

    #[test]
    fn float_readback_becomes_hdr_layer() {
        let device = MockGlDevice::new();
        device.viewport.set((2, 1));
        let mut texture = LayeredTexture::new(1).unwrap();

        texture
            .push_color_buffer(
                &device,
                ColorSource::Attachment(0),
                PixelFormat::Red,
                PixelType::Float,
                false,
            )
            .unwrap();

        assert!(texture.layers()[0].is_hdr());
        assert_eq!(texture.layers()[0].pixels().len(), 2);
    }

    #[test]
    fn readback_error_is_reported() {
        let device = MockGlDevice::new();
        device.pending_error.set(Some(0x0500));
        let mut texture = LayeredTexture::new(0).unwrap();

        let err = texture
            .push_color_buffer(
                &device,
                ColorSource::Front,
                PixelFormat::Rgba,
                PixelType::UnsignedByte,
                false,
            )
            .unwrap_err();

        assert!(matches!(err, ResourceError::GlError(0x0500)));
        assert!(texture.is_empty());
    }
}
