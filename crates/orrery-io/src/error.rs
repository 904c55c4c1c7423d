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

use orrery_core::renderer::{ResourceError, TextureError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while moving texture layers to or from image files.
#[derive(Debug, Error)]
pub enum ImageIoError {
    /// The file could not be opened or decoded.
    #[error("Failed to load image '{}': {source}", .path.display())]
    Decode {
        /// The image path.
        path: PathBuf,
        /// The decoder error.
        #[source]
        source: image::ImageError,
    },
    /// A layer could not be encoded or written.
    #[error("Failed to save layer {layer} to '{}': {source}", .path.display())]
    Encode {
        /// Index of the layer being saved.
        layer: usize,
        /// The output path.
        path: PathBuf,
        /// The encoder error.
        #[source]
        source: image::ImageError,
    },
    /// The decoded image does not fit the texture.
    #[error(transparent)]
    Texture(#[from] TextureError),
    /// Reading the color buffer back from the GPU failed.
    #[error("Color buffer readback failed: {0}")]
    Readback(#[from] ResourceError),
}

/// Errors raised while loading or storing settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read or written.
    #[error("Settings I/O failed for '{}': {source}", .path.display())]
    Io {
        /// The settings path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The settings file is not valid RON.
    #[error("Invalid settings in '{}': {source}", .path.display())]
    Parse {
        /// The settings path.
        path: PathBuf,
        /// The parser error, with its position.
        #[source]
        source: ron::error::SpannedError,
    },
    /// The settings could not be serialized.
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] ron::Error),
}
