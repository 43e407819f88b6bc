//! Provider channel abstraction
//!
//! A provider is the runtime endpoint that actually executes a tool. The
//! factory reaches providers through an opaque channel keyed by provider id:
//! a [`ProviderConnector`] opens a [`ProviderConnection`], which the execution
//! engine pools and reuses across invocations.
//!
//! Connections are never repaired: when [`ProviderConnection::is_healthy`]
//! reports `false` the pool drops the handle and asks the connector for a
//! fresh one.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use super::value_objects::{ProviderResponse, ToolContext};

/// Error type for provider channel operations
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// No provider is known under this id
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// The handshake with the provider failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The transport broke during the call
    #[error("Transport error: {0}")]
    Transport(String),
}

/// An open channel to one provider.
#[async_trait]
pub trait ProviderConnection: Send + Sync {
    /// Provider this connection talks to
    fn provider_id(&self) -> &str;

    /// Invoke a tool hosted by the provider
    async fn invoke(
        &self,
        tool_name: &str,
        context: &ToolContext,
    ) -> Result<ProviderResponse, ProviderError>;

    /// Check whether the connection can still be used
    async fn is_healthy(&self) -> bool {
        true
    }
}

/// Opens connections to providers by id.
#[async_trait]
pub trait ProviderConnector: Send + Sync {
    /// Perform the handshake with a provider
    async fn connect(
        &self,
        provider_id: &str,
    ) -> Result<Arc<dyn ProviderConnection>, ProviderError>;
}
