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

//! # Orrery IO
//!
//! File-facing collaborators of `orrery-core`:
//!
//! - [`layers`]: decode image files into texture layers and encode layers back
//!   to PNG or BMP, including one-call saves of the current color buffer.
//! - [`settings`]: load and store [`ToolkitSettings`](orrery_core::ToolkitSettings) as RON.

#![warn(missing_docs)]

mod error;
pub mod layers;
pub mod settings;

pub use error::{ImageIoError, SettingsError};
pub use layers::{
    push_hdr_image, push_image, save_bmp, save_color_buffer_bmp, save_color_buffer_png, save_png,
};
pub use settings::{load_settings, save_settings};
