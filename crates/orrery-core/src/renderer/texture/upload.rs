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

use super::layered::{ImageLayer, LayeredTexture};
use crate::math::{Extent3D, Origin3D};
use crate::renderer::{
    api::{
        CubeFace, PixelFormat, PixelStoreState, TextureFormat, TextureId,
        TextureStorageDescriptor, TextureTarget, TextureWrite, ToolkitSettings,
    },
    error::{ResourceError, TextureError},
    resource::TextureSlot,
    traits::GlDevice,
};
use std::borrow::Cow;

/// How a [`LayeredTexture`] is turned into a GPU texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureUploadOptions {
    /// The texture target the layers are stored in.
    pub target: TextureTarget,
    /// Storage format; `None` picks the lossless format for the layers.
    pub internal_format: Option<TextureFormat>,
    /// Prefer immutable storage (used only if the device supports it).
    pub immutable: bool,
    /// Generate the mip chain after the upload.
    pub mipmap: bool,
}

impl TextureUploadOptions {
    /// Immutable storage with mipmaps and a format derived from the layers.
    pub fn new(target: TextureTarget) -> Self {
        Self::from_settings(target, &ToolkitSettings::default())
    }

    /// Options for `target` following the storage preferences of `settings`.
    pub fn from_settings(target: TextureTarget, settings: &ToolkitSettings) -> Self {
        Self {
            target,
            internal_format: None,
            immutable: settings.immutable_textures,
            mipmap: settings.generate_mipmaps,
        }
    }

    /// Overrides the storage format.
    pub fn with_format(mut self, format: TextureFormat) -> Self {
        self.internal_format = Some(format);
        self
    }
}

/// Uploads every layer of `texture` into a new GPU texture and installs it in
/// `slot`, releasing the texture the slot held.
///
/// Layers map onto the target as follows: 1D and 2D (and rectangle) targets
/// use the first layer; a 1D array stores layer `i` in row `i`; a cube map
/// stores layer `i` in face `i` (faces without a layer stay undefined); 2D
/// arrays and 3D textures store layer `i` in slice `i`.
///
/// Every transfer runs with a tightly packed pixel-unpack state; the
/// caller's state is restored afterwards, including on failure. On any error
/// the new texture is released and `slot` is left untouched.
///
/// # Errors
///
/// - [`TextureError::NoLayers`] for an empty texture.
/// - [`TextureError::UnsupportedFormat`] if the layers have no GL pixel format.
/// - [`TextureError::UnsupportedTarget`] for a mipmapped rectangle texture or a
///   cube map with non-square faces.
/// - [`ResourceError::GlError`] if the driver raised an error.
pub fn upload_texture(
    device: &dyn GlDevice,
    texture: &LayeredTexture,
    options: &TextureUploadOptions,
    slot: &mut TextureSlot,
) -> Result<TextureId, ResourceError> {
    let first = texture.layers().first().ok_or(TextureError::NoLayers)?;
    let format = first
        .pixel_format()
        .ok_or(TextureError::UnsupportedFormat {
            components: first.components(),
            hdr: first.is_hdr(),
        })?;
    validate_target(options, first)?;

    if let Some(code) = device.take_error() {
        log::debug!(
            "TextureUpload({}): Discarding stale GL error 0x{:04X}",
            slot.label(),
            code
        );
    }

    let descriptor = storage_descriptor(
        device,
        first,
        texture.layer_count() as u32,
        options,
        format,
        slot.label(),
    );
    let id = device.create_texture(&descriptor)?;

    if let Err(e) = write_layers(device, id, texture, options, format, slot.label()) {
        log::error!(
            "TextureUpload({}): Upload to {:?} failed: {}",
            slot.label(),
            options.target,
            e
        );
        if let Err(release_error) = device.destroy_texture(id) {
            log::warn!(
                "TextureUpload({}): Failed to release texture {:?}: {}",
                slot.label(),
                id,
                release_error
            );
        }
        return Err(e);
    }

    log::debug!(
        "TextureUpload({}): Uploaded {} layer(s) into {:?} texture {:?}",
        slot.label(),
        texture.layer_count(),
        options.target,
        id
    );
    slot.replace(device, id);
    Ok(id)
}

fn validate_target(options: &TextureUploadOptions, first: &ImageLayer) -> Result<(), TextureError> {
    match options.target {
        TextureTarget::Rectangle if options.mipmap => Err(TextureError::UnsupportedTarget {
            target: options.target,
            reason: "rectangle textures have no mip levels",
        }),
        TextureTarget::CubeMap if first.width() != first.height() => {
            Err(TextureError::UnsupportedTarget {
                target: options.target,
                reason: "cube map faces must be square",
            })
        }
        _ => Ok(()),
    }
}

/// Level-0 extent of the texture and the extent its mip chain is derived from.
fn extents(target: TextureTarget, first: &ImageLayer, layers: u32) -> (Extent3D, Extent3D) {
    let (w, h) = (first.width(), first.height());
    match target {
        TextureTarget::D1 => (Extent3D::new(w, 1, 1), Extent3D::new(w, 1, 1)),
        TextureTarget::D1Array => (Extent3D::new(w, layers, 1), Extent3D::new(w, 1, 1)),
        TextureTarget::D2 | TextureTarget::Rectangle | TextureTarget::CubeMap => {
            (Extent3D::new(w, h, 1), Extent3D::new(w, h, 1))
        }
        TextureTarget::D2Array => (Extent3D::new(w, h, layers), Extent3D::new(w, h, 1)),
        TextureTarget::D3 => (Extent3D::new(w, h, layers), Extent3D::new(w, h, layers)),
    }
}

fn storage_descriptor<'a>(
    device: &dyn GlDevice,
    first: &ImageLayer,
    layer_count: u32,
    options: &TextureUploadOptions,
    format: PixelFormat,
    label: &'a str,
) -> TextureStorageDescriptor<'a> {
    let (extent, mip_basis) = extents(options.target, first, layer_count);

    let immutable = options.immutable && device.supports_immutable_storage();
    if options.immutable && !immutable {
        log::debug!("TextureUpload({label}): Immutable storage unavailable, using mutable storage");
    }
    let levels = if immutable && options.mipmap {
        mip_basis.full_mip_chain()
    } else {
        1
    };

    TextureStorageDescriptor {
        label: Some(Cow::Borrowed(label)),
        target: options.target,
        format: options
            .internal_format
            .unwrap_or_else(|| TextureFormat::natural(format, first.pixels().pixel_type())),
        extent,
        levels,
        immutable,
    }
}

fn write_layers(
    device: &dyn GlDevice,
    id: TextureId,
    texture: &LayeredTexture,
    options: &TextureUploadOptions,
    format: PixelFormat,
    label: &str,
) -> Result<(), ResourceError> {
    {
        let _unpack = UnpackStateGuard::new(device);
        let layers = texture.layers();
        let first = layers.first().ok_or(TextureError::NoLayers)?;
        let write = |layer: &ImageLayer,
                     cube_face: Option<CubeFace>,
                     origin: Origin3D,
                     extent: Extent3D| {
            device.write_texture(
                id,
                &TextureWrite {
                    cube_face,
                    origin,
                    extent,
                    format,
                    ty: layer.pixels().pixel_type(),
                    data: layer.pixels().as_bytes(),
                },
            )
        };
        let row = |layer: &ImageLayer| Extent3D::new(layer.width(), 1, 1);
        let image = |layer: &ImageLayer| Extent3D::new(layer.width(), layer.height(), 1);

        match options.target {
            TextureTarget::D1 => write(first, None, Origin3D::ZERO, row(first))?,
            TextureTarget::D1Array => {
                for (i, layer) in layers.iter().enumerate() {
                    write(layer, None, Origin3D::new(0, i as u32, 0), row(layer))?;
                }
            }
            TextureTarget::D2 | TextureTarget::Rectangle => {
                write(first, None, Origin3D::ZERO, image(first))?
            }
            TextureTarget::CubeMap => {
                if layers.len() < CubeFace::ALL.len() {
                    log::debug!(
                        "TextureUpload({label}): {} of 6 cube faces provided, the rest stay undefined",
                        layers.len()
                    );
                } else if layers.len() > CubeFace::ALL.len() {
                    log::warn!(
                        "TextureUpload({label}): Ignoring {} layer(s) beyond the 6 cube faces",
                        layers.len() - CubeFace::ALL.len()
                    );
                }
                for (face, layer) in CubeFace::ALL.into_iter().zip(layers) {
                    write(layer, Some(face), Origin3D::ZERO, image(layer))?;
                }
            }
            TextureTarget::D2Array | TextureTarget::D3 => {
                for (i, layer) in layers.iter().enumerate() {
                    write(layer, None, Origin3D::new(0, 0, i as u32), image(layer))?;
                }
            }
        }
    }

    if options.mipmap {
        device.generate_mipmap(id)?;
    }

    match device.take_error() {
        Some(code) => Err(ResourceError::GlError(code)),
        None => Ok(()),
    }
}

/// Saves the pixel-unpack state, installs the tightly packed state when it
/// differs, and restores the saved state when dropped.
struct UnpackStateGuard<'a> {
    device: &'a dyn GlDevice,
    saved: Option<PixelStoreState>,
}

impl<'a> UnpackStateGuard<'a> {
    fn new(device: &'a dyn GlDevice) -> Self {
        let current = device.pixel_unpack_state();
        let packed = PixelStoreState::tightly_packed();
        let saved = (current != packed).then(|| {
            device.set_pixel_unpack_state(&packed);
            current
        });
        Self { device, saved }
    }
}

impl Drop for UnpackStateGuard<'_> {
    fn drop(&mut self) {
        if let Some(saved) = &self.saved {
            self.device.set_pixel_unpack_state(saved);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::texture::LayerPixels;
    use crate::testing::{MockCall, MockGlDevice, MOCK_INVALID_OPERATION};

    fn texture(layers: u32, width: u32, height: u32) -> LayeredTexture {
        let mut texture = LayeredTexture::new(4).unwrap();
        for i in 0..layers {
            let pixels = LayerPixels::Ldr(vec![i as u8; (width * height * 4) as usize]);
            texture
                .push_layer(ImageLayer::new(width, height, 4, pixels).unwrap(), false)
                .unwrap();
        }
        texture
    }

    fn created(device: &MockGlDevice) -> MockCall {
        device
            .calls()
            .into_iter()
            .find(|c| matches!(c, MockCall::CreateTexture { .. }))
            .expect("no texture created")
    }

    fn write_origins(device: &MockGlDevice) -> Vec<(Option<CubeFace>, Origin3D, Extent3D)> {
        device
            .texture_writes()
            .into_iter()
            .map(|c| match c {
                MockCall::WriteTexture {
                    cube_face,
                    origin,
                    extent,
                    ..
                } => (cube_face, origin, extent),
                other => panic!("unexpected call {other:?}"),
            })
            .collect()
    }

    #[test]
    fn empty_texture_is_rejected_before_gpu_work() {
        let device = MockGlDevice::new();
        let mut slot = TextureSlot::new("test");

        let err = upload_texture(
            &device,
            &LayeredTexture::new(0).unwrap(),
            &TextureUploadOptions::new(TextureTarget::D2),
            &mut slot,
        )
        .unwrap_err();

        assert!(matches!(err, ResourceError::Texture(TextureError::NoLayers)));
        assert!(device.calls().is_empty());
    }

    #[test]
    fn immutable_2d_gets_full_mip_chain() {
        let device = MockGlDevice::new();
        let mut slot = TextureSlot::new("test");

        let id = upload_texture(
            &device,
            &texture(1, 300, 20),
            &TextureUploadOptions::new(TextureTarget::D2),
            &mut slot,
        )
        .unwrap();

        assert_eq!(
            created(&device),
            MockCall::CreateTexture {
                id,
                target: TextureTarget::D2,
                format: TextureFormat::Rgba8,
                extent: Extent3D::new(300, 20, 1),
                levels: 9,
                immutable: true,
            }
        );
        assert!(device.calls().contains(&MockCall::GenerateMipmap(id)));
        assert_eq!(slot.get(), Some(id));
        slot.destroy(&device).unwrap();
    }

    #[test]
    fn falls_back_to_mutable_storage() {
        let device = MockGlDevice::new();
        device.immutable_storage.set(false);
        let mut slot = TextureSlot::new("test");

        upload_texture(
            &device,
            &texture(1, 64, 64),
            &TextureUploadOptions::new(TextureTarget::D2).with_format(TextureFormat::Srgb8Alpha8),
            &mut slot,
        )
        .unwrap();

        match created(&device) {
            MockCall::CreateTexture {
                format,
                levels,
                immutable,
                ..
            } => {
                assert_eq!(format, TextureFormat::Srgb8Alpha8);
                assert_eq!(levels, 1);
                assert!(!immutable);
            }
            other => panic!("unexpected call {other:?}"),
        }
        slot.destroy(&device).unwrap();
    }

    #[test]
    fn array_layers_land_in_their_own_slice() {
        let device = MockGlDevice::new();
        let mut slot = TextureSlot::new("test");

        upload_texture(
            &device,
            &texture(3, 8, 4),
            &TextureUploadOptions::new(TextureTarget::D3),
            &mut slot,
        )
        .unwrap();

        let image = Extent3D::new(8, 4, 1);
        assert_eq!(
            write_origins(&device),
            vec![
                (None, Origin3D::new(0, 0, 0), image),
                (None, Origin3D::new(0, 0, 1), image),
                (None, Origin3D::new(0, 0, 2), image),
            ]
        );
        match created(&device) {
            MockCall::CreateTexture { extent, levels, .. } => {
                assert_eq!(extent, Extent3D::new(8, 4, 3));
                assert_eq!(levels, 4);
            }
            other => panic!("unexpected call {other:?}"),
        }
        slot.destroy(&device).unwrap();
    }

    #[test]
    fn one_dimensional_array_writes_one_row_per_layer() {
        let device = MockGlDevice::new();
        let mut slot = TextureSlot::new("test");

        upload_texture(
            &device,
            &texture(2, 16, 1),
            &TextureUploadOptions::new(TextureTarget::D1Array),
            &mut slot,
        )
        .unwrap();

        let row = Extent3D::new(16, 1, 1);
        assert_eq!(
            write_origins(&device),
            vec![
                (None, Origin3D::new(0, 0, 0), row),
                (None, Origin3D::new(0, 1, 0), row),
            ]
        );
        slot.destroy(&device).unwrap();
    }

    #[test]
    fn partial_cube_map_fills_available_faces() {
        let device = MockGlDevice::new();
        let mut slot = TextureSlot::new("test");

        upload_texture(
            &device,
            &texture(4, 8, 8),
            &TextureUploadOptions::new(TextureTarget::CubeMap),
            &mut slot,
        )
        .unwrap();

        let faces: Vec<_> = write_origins(&device).into_iter().map(|w| w.0).collect();
        assert_eq!(
            faces,
            vec![
                Some(CubeFace::PositiveX),
                Some(CubeFace::NegativeX),
                Some(CubeFace::PositiveY),
                Some(CubeFace::NegativeY),
            ]
        );
        slot.destroy(&device).unwrap();
    }

    #[test]
    fn non_square_cube_map_is_rejected() {
        let device = MockGlDevice::new();
        let mut slot = TextureSlot::new("test");

        let err = upload_texture(
            &device,
            &texture(6, 8, 4),
            &TextureUploadOptions::new(TextureTarget::CubeMap),
            &mut slot,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ResourceError::Texture(TextureError::UnsupportedTarget { .. })
        ));
        assert!(device.calls().is_empty());
    }

    #[test]
    fn writes_are_tightly_packed_and_state_is_restored() {
        let device = MockGlDevice::new();
        let before = device.current_unpack();
        let mut slot = TextureSlot::new("test");

        upload_texture(
            &device,
            &texture(2, 3, 3),
            &TextureUploadOptions::new(TextureTarget::D2Array),
            &mut slot,
        )
        .unwrap();

        for call in device.texture_writes() {
            match call {
                MockCall::WriteTexture { unpack, len, .. } => {
                    assert_eq!(unpack, PixelStoreState::tightly_packed());
                    assert_eq!(len, 36);
                }
                other => panic!("unexpected call {other:?}"),
            }
        }
        assert_eq!(device.current_unpack(), before);
        slot.destroy(&device).unwrap();
    }

    #[test]
    fn failed_write_releases_texture_and_keeps_slot() {
        let device = MockGlDevice::new();
        let before = device.current_unpack();
        let mut slot = TextureSlot::new("test");
        let previous = upload_texture(
            &device,
            &texture(1, 4, 4),
            &TextureUploadOptions::new(TextureTarget::D2),
            &mut slot,
        )
        .unwrap();
        device.clear_calls();
        device.fail_texture_write.set(Some(2));

        let err = upload_texture(
            &device,
            &texture(3, 4, 4),
            &TextureUploadOptions::new(TextureTarget::D2Array),
            &mut slot,
        )
        .unwrap_err();

        assert!(matches!(err, ResourceError::GlError(MOCK_INVALID_OPERATION)));
        let new_id = match created(&device) {
            MockCall::CreateTexture { id, .. } => id,
            other => panic!("unexpected call {other:?}"),
        };
        let calls = device.calls();
        assert!(calls.contains(&MockCall::DestroyTexture(new_id)));
        assert!(!calls.contains(&MockCall::GenerateMipmap(new_id)));
        assert!(!calls.contains(&MockCall::DestroyTexture(previous)));
        assert_eq!(slot.get(), Some(previous));
        assert_eq!(device.current_unpack(), before);
        slot.destroy(&device).unwrap();
    }

    #[test]
    fn hdr_layers_default_to_float_storage() {
        let device = MockGlDevice::new();
        let mut slot = TextureSlot::new("test");
        let mut hdr = LayeredTexture::new(3).unwrap();
        hdr.push_layer(
            ImageLayer::new(2, 2, 3, LayerPixels::Hdr(vec![0.5; 12])).unwrap(),
            false,
        )
        .unwrap();
        let options = TextureUploadOptions {
            mipmap: false,
            ..TextureUploadOptions::new(TextureTarget::Rectangle)
        };

        upload_texture(&device, &hdr, &options, &mut slot).unwrap();

        match created(&device) {
            MockCall::CreateTexture { format, levels, .. } => {
                assert_eq!(format, TextureFormat::Rgb32Float);
                assert_eq!(levels, 1);
            }
            other => panic!("unexpected call {other:?}"),
        }
        assert_eq!(device.texture_writes().len(), 1);
        slot.destroy(&device).unwrap();
    }

    #[test]
    fn mipmapped_rectangle_is_rejected() {
        let device = MockGlDevice::new();
        let mut slot = TextureSlot::new("test");

        let result = upload_texture(
            &device,
            &texture(1, 4, 4),
            &TextureUploadOptions::new(TextureTarget::Rectangle),
            &mut slot,
        );

        assert!(matches!(
            result,
            Err(ResourceError::Texture(TextureError::UnsupportedTarget { .. }))
        ));
    }

    #[test]
    fn stale_gl_error_is_discarded() {
        let device = MockGlDevice::new();
        let mut slot = TextureSlot::new("test");
        let texture = texture(1, 4, 4);
        let options = TextureUploadOptions::new(TextureTarget::D2);

        device.pending_error.set(Some(0x0501));
        let id = upload_texture(&device, &texture, &options, &mut slot).unwrap();
        assert_eq!(slot.get(), Some(id));
        slot.destroy(&device).unwrap();
    }
}
