//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::PathBuf;

const APP_DIR: &str = "tool-factory";
const PROJECT_FILES: [&str; 2] = ["tool-factory.toml", ".tool-factory.toml"];
const ENV_PREFIX: &str = "TOOL_FACTORY_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `TOOL_FACTORY_*` environment variables (`__` separates sections)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./tool-factory.toml` or `./.tool-factory.toml`
    /// 4. XDG config: `$XDG_CONFIG_HOME/tool-factory/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(project_path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(&project_path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        figment.extract().map_err(Box::new)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/tool-factory/config.toml if set,
    /// otherwise falls back to ~/.config/tool-factory/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources(config_path: Option<&PathBuf>) {
        println!("Configuration sources (in priority order):");

        println!("  [     ] Env:     {}*", ENV_PREFIX);

        if let Some(path) = config_path {
            let mark = if path.exists() { "FOUND" } else { "MISS " };
            println!("  [{}] Explicit: {}", mark, path.display());
        }

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND] Project: {}", path.display());
        } else {
            println!("  [     ] Project: ./tool-factory.toml or ./.tool-factory.toml");
        }

        if let Some(path) = Self::global_config_path() {
            if path.exists() {
                println!("  [FOUND] Global:  {}", path.display());
            } else {
                println!("  [     ] Global:  {}", path.display());
            }
        }

        println!("  [     ] Default: built-in defaults");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use std::io::Write;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert!(config.domains.is_empty());
        assert_eq!(config.factory.invocation_timeout_seconds, 30);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        // Should return a path (even if file doesn't exist)
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("tool-factory"));
    }

    #[test]
    fn test_explicit_file_overrides_project_file() {
        let mut explicit = tempfile::NamedTempFile::new().unwrap();
        writeln!(explicit, "[factory]\ninvocation_timeout_seconds = 9").unwrap();
        let explicit_path = explicit.path().to_path_buf();

        Jail::expect_with(|jail| {
            let dir = jail.directory().display().to_string();
            jail.set_env("XDG_CONFIG_HOME", dir);
            jail.create_file(
                "tool-factory.toml",
                r#"
[factory]
invocation_timeout_seconds = 3
recent_error_limit = 2

[[domains]]
name = "billing"
provider = "billing-svc"
"#,
            )?;

            let config = ConfigLoader::load(Some(&explicit_path)).map_err(|e| *e)?;
            assert_eq!(config.factory.invocation_timeout_seconds, 9);
            assert_eq!(config.factory.recent_error_limit, 2);
            assert_eq!(config.domains.len(), 1);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_files() {
        Jail::expect_with(|jail| {
            let dir = jail.directory().display().to_string();
            jail.set_env("XDG_CONFIG_HOME", dir);
            jail.create_file(
                ".tool-factory.toml",
                "[factory]\ndiscovery_cache_ttl_seconds = 60",
            )?;
            jail.set_env("TOOL_FACTORY_FACTORY__DISCOVERY_CACHE_TTL_SECONDS", 5);

            let config = ConfigLoader::load(None).map_err(|e| *e)?;
            assert_eq!(config.factory.discovery_cache_ttl_seconds, 5);
            assert_eq!(
                ConfigLoader::project_config_path(),
                Some(PathBuf::from(".tool-factory.toml"))
            );
            Ok(())
        });
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut explicit = tempfile::NamedTempFile::new().unwrap();
        writeln!(explicit, "[factory]\ninvocation_timeout_seconds = \"soon\"").unwrap();

        assert!(ConfigLoader::load(Some(&explicit.path().to_path_buf())).is_err());
    }
}
