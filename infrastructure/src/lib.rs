//! Infrastructure layer for tool-factory
//!
//! This crate contains the adapters behind the domain contracts:
//! configuration file loading, the in-memory catalog domain manager and the
//! in-process provider connector.

pub mod config;
pub mod managers;
pub mod providers;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileDomainConfig, FileFactoryConfig,
    FileToolConfig,
};
pub use managers::CatalogDomainManager;
pub use providers::{LocalProviderConnector, ToolHandler};
