//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod domains;
mod factory;

pub use domains::{FileDomainConfig, FileToolConfig};
pub use factory::FileFactoryConfig;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("factory.{0} cannot be 0")]
    ZeroValue(&'static str),

    #[error("domain name cannot be empty")]
    EmptyDomainName,

    #[error("domain '{0}' is declared twice")]
    DuplicateDomain(String),

    #[error("tool name cannot be empty (domain '{0}')")]
    EmptyToolName(String),

    #[error("tool '{tool}' is declared twice in domain '{domain}'")]
    DuplicateTool { domain: String, tool: String },

    #[error("tool '{tool}' in domain '{domain}' has no provider")]
    MissingProvider { domain: String, tool: String },
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Runtime settings
    pub factory: FileFactoryConfig,
    /// Domain catalogs, registered in declaration order
    pub domains: Vec<FileDomainConfig>,
}

impl FileConfig {
    /// Reject settings the factory cannot run with.
    ///
    /// Stops at the first problem found.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let factory = &self.factory;
        let numeric = [
            ("discovery_cache_ttl_seconds", factory.discovery_cache_ttl_seconds),
            ("executor_cache_ttl_seconds", factory.executor_cache_ttl_seconds),
            ("invocation_timeout_seconds", factory.invocation_timeout_seconds),
            (
                "health_check_interval_seconds",
                factory.health_check_interval_seconds,
            ),
            ("analytics_buffer", factory.analytics_buffer as u64),
            ("max_records_per_tool", factory.max_records_per_tool as u64),
        ];
        if let Some((field, _)) = numeric.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigValidationError::ZeroValue(*field));
        }

        let mut domain_names = HashSet::new();
        for domain in &self.domains {
            if domain.name.trim().is_empty() {
                return Err(ConfigValidationError::EmptyDomainName);
            }
            if !domain_names.insert(domain.name.as_str()) {
                return Err(ConfigValidationError::DuplicateDomain(domain.name.clone()));
            }

            let mut tool_names = HashSet::new();
            for tool in &domain.tools {
                if tool.name.trim().is_empty() {
                    return Err(ConfigValidationError::EmptyToolName(domain.name.clone()));
                }
                if !tool_names.insert(tool.name.as_str()) {
                    return Err(ConfigValidationError::DuplicateTool {
                        domain: domain.name.clone(),
                        tool: tool.name.clone(),
                    });
                }
                if domain.provider_of(tool).trim().is_empty() {
                    return Err(ConfigValidationError::MissingProvider {
                        domain: domain.name.clone(),
                        tool: tool.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
