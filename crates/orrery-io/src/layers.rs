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

//! Image files as texture layers.
//!
//! Decoded images are converted to the component count the texture requires
//! (or their own channel count for an empty texture that adopts the first
//! layer's). Rows are stored in file order, top row first; pass `flip_y` to
//! get the bottom-up order OpenGL samples from.

use crate::error::ImageIoError;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
use orrery_core::renderer::{
    ColorSource, GlDevice, ImageLayer, LayerPixels, LayeredTexture, PixelFormat, PixelType,
    TextureError,
};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Decodes an image file into an 8-bit layer and appends it to `texture`.
///
/// # Errors
///
/// [`ImageIoError::Decode`] if the file cannot be read or decoded, and
/// [`ImageIoError::Texture`] if the image does not match the existing layers.
/// The texture is unchanged on error.
pub fn push_image(
    texture: &mut LayeredTexture,
    path: impl AsRef<Path>,
    flip_y: bool,
) -> Result<(), ImageIoError> {
    let path = path.as_ref();
    let image = open(path)?;
    let components = target_components(texture, &image);
    let (width, height) = (image.width(), image.height());

    let pixels = match components {
        1 => image.into_luma8().into_raw(),
        2 => image.into_luma_alpha8().into_raw(),
        3 => image.into_rgb8().into_raw(),
        _ => image.into_rgba8().into_raw(),
    };

    let layer = ImageLayer::new(width, height, components, LayerPixels::Ldr(pixels))?;
    texture.push_layer(layer, flip_y)?;
    log::debug!(
        "Loaded '{}' as layer {} ({}x{}, {} components)",
        path.display(),
        texture.layer_count() - 1,
        width,
        height,
        components
    );
    Ok(())
}

/// Decodes an image file into a 32-bit float layer and appends it to `texture`.
///
/// Radiance (`.hdr`) and OpenEXR files keep their range; 8-bit files are
/// normalized to `[0, 1]`.
///
/// # Errors
///
/// Same as [`push_image`].
pub fn push_hdr_image(
    texture: &mut LayeredTexture,
    path: impl AsRef<Path>,
    flip_y: bool,
) -> Result<(), ImageIoError> {
    let path = path.as_ref();
    let image = open(path)?;
    let components = target_components(texture, &image);
    let (width, height) = (image.width(), image.height());

    let pixels = match components {
        3 => image.into_rgb32f().into_raw(),
        4 => image.into_rgba32f().into_raw(),
        2 => image
            .into_rgba32f()
            .pixels()
            .flat_map(|p| [luminance(p), p[3]])
            .collect(),
        _ => image.into_rgba32f().pixels().map(luminance).collect(),
    };

    let layer = ImageLayer::new(width, height, components, LayerPixels::Hdr(pixels))?;
    texture.push_layer(layer, flip_y)?;
    log::debug!(
        "Loaded '{}' as HDR layer {} ({}x{}, {} components)",
        path.display(),
        texture.layer_count() - 1,
        width,
        height,
        components
    );
    Ok(())
}

/// Writes every layer of `texture` as PNG.
///
/// A single layer is written to `<stem>.png`; several layers are written to
/// `<stem>_layer001.png`, `<stem>_layer002.png`, and so on. HDR layers are
/// clamped to `[0, 1]` and quantized to 8 bits.
///
/// Returns the written paths in layer order.
///
/// # Errors
///
/// [`TextureError::NoLayers`] (wrapped) for an empty texture, or
/// [`ImageIoError::Encode`] for the first layer that fails to save.
pub fn save_png(
    texture: &LayeredTexture,
    stem: impl AsRef<Path>,
) -> Result<Vec<PathBuf>, ImageIoError> {
    save_layers(texture, stem.as_ref(), ImageFormat::Png, "png")
}

/// Writes every layer of `texture` as BMP, named like [`save_png`].
///
/// # Errors
///
/// Same as [`save_png`].
pub fn save_bmp(
    texture: &LayeredTexture,
    stem: impl AsRef<Path>,
) -> Result<Vec<PathBuf>, ImageIoError> {
    save_layers(texture, stem.as_ref(), ImageFormat::Bmp, "bmp")
}

/// Reads the current viewport of `source` as 8-bit texels and writes it to
/// `<stem>.png`, top row first.
///
/// # Errors
///
/// [`ImageIoError::Readback`] if the readback fails, or [`ImageIoError::Encode`].
pub fn save_color_buffer_png(
    device: &dyn GlDevice,
    source: ColorSource,
    format: PixelFormat,
    stem: impl AsRef<Path>,
) -> Result<PathBuf, ImageIoError> {
    save_color_buffer(device, source, format, stem.as_ref(), ImageFormat::Png, "png")
}

/// Same as [`save_color_buffer_png`], writing `<stem>.bmp`.
///
/// # Errors
///
/// Same as [`save_color_buffer_png`].
pub fn save_color_buffer_bmp(
    device: &dyn GlDevice,
    source: ColorSource,
    format: PixelFormat,
    stem: impl AsRef<Path>,
) -> Result<PathBuf, ImageIoError> {
    save_color_buffer(device, source, format, stem.as_ref(), ImageFormat::Bmp, "bmp")
}

fn save_color_buffer(
    device: &dyn GlDevice,
    source: ColorSource,
    format: PixelFormat,
    stem: &Path,
    image_format: ImageFormat,
    extension: &str,
) -> Result<PathBuf, ImageIoError> {
    let mut texture = LayeredTexture::new(format.components())?;
    // GL rows run bottom to top.
    texture.push_color_buffer(device, source, format, PixelType::UnsignedByte, true)?;
    let mut written = save_layers(&texture, stem, image_format, extension)?;
    written.pop().ok_or_else(|| TextureError::NoLayers.into())
}

fn open(path: &Path) -> Result<DynamicImage, ImageIoError> {
    image::open(path).map_err(|source| ImageIoError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

fn target_components(texture: &LayeredTexture, image: &DynamicImage) -> u32 {
    texture
        .required_components()
        .unwrap_or_else(|| u32::from(image.color().channel_count()).clamp(1, 4))
}

/// Rec. 709 luma of the color channels.
fn luminance(p: &Rgba<f32>) -> f32 {
    0.2126 * p[0] + 0.7152 * p[1] + 0.0722 * p[2]
}

fn save_layers(
    texture: &LayeredTexture,
    stem: &Path,
    format: ImageFormat,
    extension: &str,
) -> Result<Vec<PathBuf>, ImageIoError> {
    if texture.is_empty() {
        return Err(TextureError::NoLayers.into());
    }
    let numbered = texture.layer_count() > 1;

    let mut written = Vec::with_capacity(texture.layer_count());
    for (index, layer) in texture.layers().iter().enumerate() {
        let mut name = OsString::from(stem.as_os_str());
        if numbered {
            name.push(format!("_layer{:03}", index + 1));
        }
        name.push(".");
        name.push(extension);
        let path = PathBuf::from(name);

        to_dynamic_image(layer)?
            .save_with_format(&path, format)
            .map_err(|source| ImageIoError::Encode {
                layer: index,
                path: path.clone(),
                source,
            })?;
        log::debug!("Saved layer {} to '{}'", index, path.display());
        written.push(path);
    }
    Ok(written)
}

fn to_dynamic_image(layer: &ImageLayer) -> Result<DynamicImage, TextureError> {
    let bytes = match layer.pixels() {
        LayerPixels::Ldr(bytes) => bytes.clone(),
        LayerPixels::Hdr(values) => values
            .iter()
            .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect(),
    };
    let (width, height) = (layer.width(), layer.height());
    let invalid = |found_len| TextureError::InvalidLayerData {
        expected_len: width as usize * height as usize * layer.components() as usize,
        found_len,
    };
    let len = bytes.len();

    let image = match layer.components() {
        1 => ImageBuffer::from_raw(width, height, bytes).map(DynamicImage::ImageLuma8),
        2 => ImageBuffer::from_raw(width, height, bytes).map(DynamicImage::ImageLumaA8),
        3 => ImageBuffer::from_raw(width, height, bytes).map(DynamicImage::ImageRgb8),
        4 => ImageBuffer::from_raw(width, height, bytes).map(DynamicImage::ImageRgba8),
        n => return Err(TextureError::InvalidComponents(n)),
    };
    image.ok_or_else(|| invalid(len))
}
