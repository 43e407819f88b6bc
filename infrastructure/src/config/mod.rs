//! Configuration file loading for tool-factory
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `TOOL_FACTORY_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./tool-factory.toml` or `./.tool-factory.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/tool-factory/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileDomainConfig, FileFactoryConfig, FileToolConfig,
};
pub use loader::ConfigLoader;
