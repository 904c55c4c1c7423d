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

//! [`ToolkitSettings`] stored as RON.
//!
//! ```ron
//! (
//!     glsl_version: 450,
//!     stream_capacity: 4194304,
//! )
//! ```
//!
//! Fields left out of the file keep their defaults.

use crate::error::SettingsError;
use orrery_core::ToolkitSettings;
use ron::ser::PrettyConfig;
use std::fs;
use std::path::Path;

/// Reads settings from a RON file.
///
/// # Errors
///
/// [`SettingsError::Io`] if the file cannot be read, [`SettingsError::Parse`]
/// if it is not a valid settings record.
pub fn load_settings(path: impl AsRef<Path>) -> Result<ToolkitSettings, SettingsError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let settings = ron::from_str(&text).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Loaded toolkit settings from '{}'", path.display());
    Ok(settings)
}

/// Writes `settings` to a RON file, replacing any existing file.
///
/// # Errors
///
/// [`SettingsError::Serialize`] or [`SettingsError::Io`].
pub fn save_settings(
    settings: &ToolkitSettings,
    path: impl AsRef<Path>,
) -> Result<(), SettingsError> {
    let path = path.as_ref();
    let text = ron::ser::to_string_pretty(settings, PrettyConfig::default())?;
    fs::write(path, text).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toolkit.ron");
        fs::write(&path, "(glsl_version: 450, compatibility_profile: true)").unwrap();

        let settings = load_settings(&path).unwrap();

        assert_eq!(settings.glsl_version, 450);
        assert!(settings.compatibility_profile);
        assert_eq!(settings.stream_capacity, ToolkitSettings::default().stream_capacity);
        assert!(settings.generate_mipmaps);
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toolkit.ron");
        let settings = ToolkitSettings {
            stream_capacity: 1 << 22,
            immutable_textures: false,
            ..ToolkitSettings::default()
        };

        save_settings(&settings, &path).unwrap();

        assert_eq!(load_settings(&path).unwrap(), settings);
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ron");
        fs::write(&path, "(glsl_version: \"four thirty\")").unwrap();

        let err = load_settings(&path).unwrap_err();

        assert!(matches!(err, SettingsError::Parse { .. }));
        assert!(err.to_string().contains("broken.ron"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_settings(dir.path().join("absent.ron")),
            Err(SettingsError::Io { .. })
        ));
    }
}
