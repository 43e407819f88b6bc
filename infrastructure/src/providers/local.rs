//! In-process provider connector.
//!
//! [`LocalProviderConnector`] hosts tool handlers inside the current process,
//! grouped by provider id. It backs the configured catalog in the binary and
//! stands in for remote providers in integration setups.
//!
//! | Handler | Behavior |
//! |---------|----------|
//! | [`echo`](LocalProviderConnector::echo) | Returns the context it was called with |
//! | [`respond`](LocalProviderConnector::respond) | Returns a fixed payload |
//! | [`register_tool`](LocalProviderConnector::register_tool) | Any closure over the context |
//!
//! Connections opened by the connector share its health flag, so
//! [`set_healthy(false)`](LocalProviderConnector::set_healthy) makes every
//! pooled handle fail its next probe.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tool_factory_domain::{
    ProviderConnection, ProviderConnector, ProviderError, ProviderResponse, ToolContext,
};
use tracing::{debug, trace};

use crate::config::FileDomainConfig;

/// A tool implementation hosted by the local provider
pub type ToolHandler = Arc<dyn Fn(&ToolContext) -> ProviderResponse + Send + Sync>;

type HandlerTable = HashMap<String, ToolHandler>;

pub struct LocalProviderConnector {
    providers: RwLock<HashMap<String, HandlerTable>>,
    healthy: Arc<AtomicBool>,
}

impl LocalProviderConnector {
    pub fn new() -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
            healthy: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Host every configured tool: a `response` entry is returned as is,
    /// anything else echoes its context.
    pub fn from_domains(domains: &[FileDomainConfig]) -> Self {
        let connector = Self::new();
        for domain in domains {
            for tool in &domain.tools {
                let provider = domain.provider_of(tool);
                match &tool.response {
                    Some(payload) => connector.respond(provider, &tool.name, payload.clone()),
                    None => connector.echo(provider, &tool.name),
                }
            }
        }
        connector
    }

    // ==================== Registration ====================

    /// Make `provider_id` reachable even before it hosts any tool
    pub fn register_provider(&self, provider_id: &str) {
        self.write().entry(provider_id.to_string()).or_default();
    }

    pub fn register_tool(&self, provider_id: &str, tool_name: &str, handler: ToolHandler) {
        debug!(provider = %provider_id, tool = %tool_name, "Registered local tool");
        self.write()
            .entry(provider_id.to_string())
            .or_default()
            .insert(tool_name.to_string(), handler);
    }

    pub fn echo(&self, provider_id: &str, tool_name: &str) {
        self.register_tool(
            provider_id,
            tool_name,
            Arc::new(|context: &ToolContext| ProviderResponse::ok(Value::Object(context.clone()))),
        );
    }

    pub fn respond(&self, provider_id: &str, tool_name: &str, payload: Value) {
        self.register_tool(
            provider_id,
            tool_name,
            Arc::new(move |_: &ToolContext| ProviderResponse::ok(payload.clone())),
        );
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn provider_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, HandlerTable>> {
        self.providers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, HandlerTable>> {
        self.providers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for LocalProviderConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderConnector for LocalProviderConnector {
    async fn connect(
        &self,
        provider_id: &str,
    ) -> Result<Arc<dyn ProviderConnection>, ProviderError> {
        if !self.healthy.load(Ordering::SeqCst) {
            return Err(ProviderError::ConnectionFailed(format!(
                "local provider '{}' is offline",
                provider_id
            )));
        }
        let handlers = self
            .read()
            .get(provider_id)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownProvider(provider_id.to_string()))?;

        Ok(Arc::new(LocalConnection {
            provider_id: provider_id.to_string(),
            handlers,
            healthy: Arc::clone(&self.healthy),
        }))
    }
}

/// Snapshot of one provider's handlers taken at connect time
struct LocalConnection {
    provider_id: String,
    handlers: HandlerTable,
    healthy: Arc<AtomicBool>,
}

#[async_trait]
impl ProviderConnection for LocalConnection {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    async fn invoke(
        &self,
        tool_name: &str,
        context: &ToolContext,
    ) -> Result<ProviderResponse, ProviderError> {
        if !self.healthy.load(Ordering::SeqCst) {
            return Err(ProviderError::Transport(format!(
                "local provider '{}' went offline",
                self.provider_id
            )));
        }
        trace!(provider = %self.provider_id, tool = %tool_name, "Invoking local tool");
        Ok(match self.handlers.get(tool_name) {
            Some(handler) => handler(context),
            None => ProviderResponse::failed(format!(
                "tool '{}' is not hosted by provider '{}'",
                tool_name, self.provider_id
            )),
        })
    }

    async fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }
}
