//! Application-level configuration.
//!
//! - [`FactoryConfig`]: cache lifetimes, call timeouts and analytics limits

pub mod factory_config;

pub use factory_config::FactoryConfig;
