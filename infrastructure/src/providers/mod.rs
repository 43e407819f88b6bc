//! Provider channel adapters
//!
//! Concrete [`ProviderConnector`](tool_factory_domain::ProviderConnector)
//! implementations the execution engine can pool.

mod local;

pub use local::{LocalProviderConnector, ToolHandler};
