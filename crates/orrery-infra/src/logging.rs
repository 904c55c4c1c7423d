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

//! Logger setup for applications built on the toolkit.

use env_logger::{Builder, Env, WriteStyle};
use log::LevelFilter;
use std::sync::Once;

/// Logger configuration.
///
/// `filter` follows the `env_logger` filter syntax (e.g. `"info"`,
/// `"orrery_core=debug,glow=warn"`). When it is `None`, `RUST_LOG` is used,
/// falling back to `info`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Explicit filter, overriding `RUST_LOG`.
    pub filter: Option<String>,
    /// ANSI coloring behavior.
    pub write_style: WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: None,
            write_style: WriteStyle::Auto,
        }
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once; later calls are ignored.
///
/// `glow` is capped at `warn` unless the filter names it.
pub fn init_logging(config: &LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = configured_builder(config);
        if let Err(e) = builder.try_init() {
            // Another logger was installed by the host application.
            eprintln!("orrery: logger already initialized: {e}");
            return;
        }
        log::debug!("Logging initialized");
    });
}

fn configured_builder(config: &LoggingConfig) -> Builder {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.filter_module("glow", LevelFilter::Warn);
    if let Some(filter) = &config.filter {
        builder.parse_filters(filter);
    }
    builder.write_style(config.write_style);
    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_overrides_default_level() {
        let config = LoggingConfig {
            filter: Some("orrery_core=trace".to_string()),
            ..LoggingConfig::default()
        };
        let logger = configured_builder(&config).build();
        let record = log::Metadata::builder()
            .level(log::Level::Trace)
            .target("orrery_core::renderer")
            .build();
        assert!(log::Log::enabled(&logger, &record));
    }

    #[test]
    fn glow_is_capped_at_warn() {
        let logger = configured_builder(&LoggingConfig {
            filter: Some("info".to_string()),
            ..LoggingConfig::default()
        })
        .build();
        let info = log::Metadata::builder()
            .level(log::Level::Info)
            .target("glow")
            .build();
        assert!(!log::Log::enabled(&logger, &info));
    }

    #[test]
    fn repeated_initialization_is_harmless() {
        init_logging(&LoggingConfig::default());
        init_logging(&LoggingConfig::default());
        log::info!("still logging");
    }
}
