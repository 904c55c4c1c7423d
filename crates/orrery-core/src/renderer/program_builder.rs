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

//! Multi-fragment GLSL program assembly.
//!
//! A [`ProgramBuilder`] collects source fragments (shared headers, `#define`s,
//! and finally the stage entry points) and compiles one shader object per stage
//! found in the **last** fragment. Each stage sees the same fragments behind a
//! preamble that defines its marker token, so one file can hold every stage:
//!
//! ```glsl
//! #ifdef VERTEX_SHADER
//! void main() { /* ... */ }
//! #endif
//! #ifdef FRAGMENT_SHADER
//! void main() { /* ... */ }
//! #endif
//! ```

use crate::renderer::{
    api::{ProgramId, ShaderStage, ToolkitSettings},
    error::{ResourceError, ShaderError},
    resource::ProgramSlot,
    traits::GlDevice,
};
use std::fmt;
use std::path::Path;

/// Preamble and link options of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramOptions {
    /// The GLSL `#version` number.
    pub version: u32,
    /// Append `compatibility` to the `#version` line.
    pub compatibility: bool,
    /// Link the program after attaching its stages.
    pub link: bool,
}

impl Default for ProgramOptions {
    fn default() -> Self {
        Self::from(&ToolkitSettings::default())
    }
}

impl From<&ToolkitSettings> for ProgramOptions {
    fn from(settings: &ToolkitSettings) -> Self {
        Self {
            version: settings.glsl_version,
            compatibility: settings.compatibility_profile,
            link: settings.link_programs,
        }
    }
}

impl ProgramOptions {
    /// The text prepended to every fragment list when compiling `stage`.
    pub fn preamble(&self, stage: ShaderStage) -> String {
        format!(
            "#version {}{}\n#define {} 1\n",
            self.version,
            if self.compatibility {
                " compatibility"
            } else {
                ""
            },
            stage.token()
        )
    }
}

/// An ordered list of GLSL source fragments, consumed by [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct ProgramBuilder {
    sources: Vec<String>,
}

impl ProgramBuilder {
    /// Creates a builder with no fragments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fragment verbatim.
    pub fn push_source(&mut self, source: impl Into<String>) -> &mut Self {
        self.sources.push(source.into());
        self
    }

    /// Appends a formatted fragment.
    ///
    /// ```
    /// use orrery_core::ProgramBuilder;
    /// let mut builder = ProgramBuilder::new();
    /// builder.push_fmt(format_args!("const int LIGHT_COUNT = {};\n", 4));
    /// assert_eq!(builder.sources()[0], "const int LIGHT_COUNT = 4;\n");
    /// ```
    pub fn push_fmt(&mut self, args: fmt::Arguments<'_>) -> &mut Self {
        self.sources.push(fmt::format(args));
        self
    }

    /// Appends `#define NAME value`.
    pub fn push_define(&mut self, name: &str, value: impl fmt::Display) -> &mut Self {
        self.push_fmt(format_args!("#define {name} {value}\n"))
    }

    /// Appends the contents of a file followed by a newline.
    ///
    /// # Errors
    ///
    /// [`ShaderError::LoadError`] if the file cannot be read; the fragment list
    /// is left unchanged.
    pub fn push_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self, ShaderError> {
        let path = path.as_ref();
        let mut source =
            std::fs::read_to_string(path).map_err(|e| ShaderError::LoadError {
                path: path.display().to_string(),
                source_error: e.to_string(),
            })?;
        source.push('\n');
        self.sources.push(source);
        Ok(self)
    }

    /// The fragments in concatenation order.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Number of fragments pushed so far.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// The stages whose marker token occurs in the last fragment, in
    /// [`ShaderStage::ALL`] order.
    pub fn detect_stages(&self) -> Vec<ShaderStage> {
        match self.sources.last() {
            Some(last) => ShaderStage::ALL
                .into_iter()
                .filter(|stage| last.contains(stage.token()))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Compiles every detected stage, optionally links, and on success
    /// installs the program in `slot` (releasing the program it held).
    ///
    /// On failure the partially built program is released, the driver log is
    /// written to the error log, and `slot` is left untouched.
    ///
    /// # Errors
    ///
    /// - [`ShaderError::NoStageDetected`] if the last fragment names no stage.
    /// - [`ShaderError::StageCompileFailed`] for the first stage that fails.
    /// - [`ShaderError::LinkFailed`] if linking was requested and fails.
    /// - Any device error raised while creating or attaching objects.
    pub fn build(
        self,
        device: &dyn GlDevice,
        options: &ProgramOptions,
        slot: &mut ProgramSlot,
    ) -> Result<ProgramId, ResourceError> {
        let stages = self.detect_stages();
        if stages.is_empty() {
            log::error!(
                "ProgramBuilder({}): No shader stage found in the last of {} fragment(s)",
                slot.label(),
                self.sources.len()
            );
            return Err(ShaderError::NoStageDetected.into());
        }

        let program = device.create_program()?;
        if let Err(e) = self.compile_stages(device, options, program, &stages) {
            log::error!("ProgramBuilder({}): {}", slot.label(), e);
            release_program(device, program, slot.label());
            return Err(e);
        }

        if options.link {
            if let Err(e) = device.link_program(program) {
                log::error!("ProgramBuilder({}): {}", slot.label(), e);
                release_program(device, program, slot.label());
                return Err(e);
            }
        }

        log::debug!(
            "ProgramBuilder({}): Built program {:?} with stages {:?}",
            slot.label(),
            program,
            stages
        );
        slot.replace(device, program);
        Ok(program)
    }

    fn compile_stages(
        &self,
        device: &dyn GlDevice,
        options: &ProgramOptions,
        program: ProgramId,
        stages: &[ShaderStage],
    ) -> Result<(), ResourceError> {
        for &stage in stages {
            let preamble = options.preamble(stage);
            let sources: Vec<&str> = std::iter::once(preamble.as_str())
                .chain(self.sources.iter().map(String::as_str))
                .collect();

            let shader = device.compile_shader(stage, &sources)?;
            let attached = device.attach_shader(program, shader);
            // The program keeps attached shaders alive until it is deleted.
            if let Err(e) = device.destroy_shader(shader) {
                log::warn!("Failed to release shader object {shader:?}: {e}");
            }
            attached?;
        }
        Ok(())
    }
}

fn release_program(device: &dyn GlDevice, program: ProgramId, label: &str) {
    if let Err(e) = device.destroy_program(program) {
        log::warn!("ProgramBuilder({label}): Failed to release program {program:?}: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockCall, MockGlDevice};
    use std::io::Write;

    const SHADER: &str = "#ifdef VERTEX_SHADER\nvoid main() {}\n#endif\n\
                          #ifdef FRAGMENT_SHADER\nvoid main() {}\n#endif\n";

    fn builder_with(last: &str) -> ProgramBuilder {
        let mut builder = ProgramBuilder::new();
        builder.push_define("GAMMA", 2.2).push_source(last);
        builder
    }

    #[test]
    fn detects_stages_in_last_fragment_only() {
        let mut builder = ProgramBuilder::new();
        builder
            .push_source("// COMPUTE_SHADER lives in a header")
            .push_source("FRAGMENT_SHADER VERTEX_SHADER");

        assert_eq!(
            builder.detect_stages(),
            vec![ShaderStage::Vertex, ShaderStage::Fragment]
        );
    }

    #[test]
    fn detects_every_stage_in_fixed_order() {
        let builder = builder_with(
            "COMPUTE_SHADER TESS_EVALUATION_SHADER TESS_CONTROL_SHADER \
             GEOMETRY_SHADER FRAGMENT_SHADER VERTEX_SHADER",
        );
        assert_eq!(builder.detect_stages(), ShaderStage::ALL.to_vec());
    }

    #[test]
    fn push_define_formats_directive() {
        let mut builder = ProgramBuilder::new();
        builder.push_define("SAMPLES", 16);
        assert_eq!(builder.sources(), &["#define SAMPLES 16\n".to_string()]);
    }

    #[test]
    fn push_file_appends_newline() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "void main() {{}}").unwrap();

        let mut builder = ProgramBuilder::new();
        builder.push_file(file.path()).unwrap();

        assert_eq!(builder.source_count(), 1);
        assert_eq!(builder.sources()[0], "void main() {}\n");
    }

    #[test]
    fn push_file_failure_leaves_list_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = builder_with(SHADER);

        let err = builder.push_file(dir.path().join("missing.glsl")).unwrap_err();

        assert!(matches!(err, ShaderError::LoadError { .. }));
        assert_eq!(builder.source_count(), 2);
    }

    #[test]
    fn build_without_stage_creates_nothing() {
        let device = MockGlDevice::new();
        let mut slot = ProgramSlot::new("test");

        let err = builder_with("void main() {}")
            .build(&device, &ProgramOptions::default(), &mut slot)
            .unwrap_err();

        assert!(matches!(err, ResourceError::Shader(ShaderError::NoStageDetected)));
        assert!(device.calls().is_empty());
        assert!(!slot.is_valid());
    }

    #[test]
    fn empty_builder_has_no_stage() {
        let device = MockGlDevice::new();
        let mut slot = ProgramSlot::new("test");

        let result = ProgramBuilder::new().build(&device, &ProgramOptions::default(), &mut slot);

        assert!(matches!(
            result,
            Err(ResourceError::Shader(ShaderError::NoStageDetected))
        ));
    }

    #[test]
    fn build_prepends_preamble_per_stage() {
        let device = MockGlDevice::new();
        let mut slot = ProgramSlot::new("test");
        let options = ProgramOptions {
            version: 450,
            compatibility: true,
            link: true,
        };

        let program = builder_with(SHADER)
            .build(&device, &options, &mut slot)
            .unwrap();

        let sources = device.compiled_sources();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].0, ShaderStage::Vertex);
        assert!(sources[0]
            .1
            .starts_with("#version 450 compatibility\n#define VERTEX_SHADER 1\n#define GAMMA 2.2\n"));
        assert!(sources[1]
            .1
            .starts_with("#version 450 compatibility\n#define FRAGMENT_SHADER 1\n"));
        assert!(sources[1].1.ends_with(SHADER));
        assert!(device.calls().contains(&MockCall::LinkProgram(program)));
        assert_eq!(slot.get(), Some(program));
        slot.destroy(&device).unwrap();
    }

    #[test]
    fn shaders_are_attached_then_released() {
        let device = MockGlDevice::new();
        let mut slot = ProgramSlot::new("test");

        let program = builder_with("VERTEX_SHADER")
            .build(&device, &ProgramOptions::default(), &mut slot)
            .unwrap();

        let calls = device.calls();
        let shader = match calls[1] {
            MockCall::CompileShader { id, .. } => id,
            ref other => panic!("unexpected call {other:?}"),
        };
        assert_eq!(calls[2], MockCall::AttachShader(program, shader));
        assert_eq!(calls[3], MockCall::DestroyShader(shader));
        slot.destroy(&device).unwrap();
    }

    #[test]
    fn compile_failure_keeps_previous_program() {
        let device = MockGlDevice::new();
        let mut slot = ProgramSlot::new("test");
        let first = builder_with(SHADER)
            .build(&device, &ProgramOptions::default(), &mut slot)
            .unwrap();
        device.clear_calls();
        device.fail_compile.set(Some(ShaderStage::Fragment));

        let err = builder_with(SHADER)
            .build(&device, &ProgramOptions::default(), &mut slot)
            .unwrap_err();

        match err {
            ResourceError::Shader(ShaderError::StageCompileFailed { stage, log }) => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(log.contains("syntax error"));
            }
            other => panic!("expected compile failure, got {other:?}"),
        }
        let failed = match device.calls()[0] {
            MockCall::CreateProgram(id) => id,
            ref other => panic!("unexpected call {other:?}"),
        };
        assert!(device.calls().contains(&MockCall::DestroyProgram(failed)));
        assert!(!device.calls().contains(&MockCall::DestroyProgram(first)));
        assert_eq!(slot.get(), Some(first));
        slot.destroy(&device).unwrap();
    }

    #[test]
    fn link_failure_releases_new_program() {
        let device = MockGlDevice::new();
        let mut slot = ProgramSlot::new("test");
        device.fail_link.set(true);

        let err = builder_with(SHADER)
            .build(&device, &ProgramOptions::default(), &mut slot)
            .unwrap_err();

        assert!(matches!(
            err,
            ResourceError::Shader(ShaderError::LinkFailed { .. })
        ));
        let calls = device.calls();
        assert!(matches!(calls.last(), Some(MockCall::DestroyProgram(_))));
        assert!(!slot.is_valid());
    }

    #[test]
    fn unlinked_build_skips_link() {
        let device = MockGlDevice::new();
        let mut slot = ProgramSlot::new("test");
        let options = ProgramOptions {
            link: false,
            ..ProgramOptions::default()
        };

        builder_with("COMPUTE_SHADER")
            .build(&device, &options, &mut slot)
            .unwrap();

        assert!(!device
            .calls()
            .iter()
            .any(|c| matches!(c, MockCall::LinkProgram(_))));
        slot.destroy(&device).unwrap();
    }

    #[test]
    fn rebuild_releases_old_program_after_install() {
        let device = MockGlDevice::new();
        let mut slot = ProgramSlot::new("test");
        let first = builder_with(SHADER)
            .build(&device, &ProgramOptions::default(), &mut slot)
            .unwrap();

        let second = builder_with(SHADER)
            .build(&device, &ProgramOptions::default(), &mut slot)
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(slot.get(), Some(second));
        assert_eq!(
            device.calls().last(),
            Some(&MockCall::DestroyProgram(first))
        );
        slot.destroy(&device).unwrap();
    }

    #[test]
    fn options_follow_settings() {
        let settings = ToolkitSettings {
            glsl_version: 330,
            compatibility_profile: true,
            link_programs: false,
            ..ToolkitSettings::default()
        };
        let options = ProgramOptions::from(&settings);
        assert_eq!(
            options.preamble(ShaderStage::Geometry),
            "#version 330 compatibility\n#define GEOMETRY_SHADER 1\n"
        );
        assert!(!options.link);
        assert_eq!(
            ProgramOptions::default().preamble(ShaderStage::Vertex),
            "#version 430\n#define VERTEX_SHADER 1\n"
        );
    }
}
