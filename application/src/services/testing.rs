//! Hand-written test doubles shared by the service tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tool_factory_domain::{
    DomainHealth, DomainManager, ManagerError, ProviderConnection, ProviderConnector,
    ProviderError, ProviderResponse, ToolContext, ToolDescriptor, ToolFilter, ToolLookup,
};

// ==================== Domain Manager ====================

/// In-memory manager with call-count spies
pub struct StaticManager {
    tools: Vec<ToolDescriptor>,
    available: AtomicBool,
    pub scans: AtomicUsize,
    pub lookups: AtomicUsize,
}

impl StaticManager {
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self {
            tools,
            available: AtomicBool::new(true),
            scans: AtomicUsize::new(0),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn arc(tools: Vec<ToolDescriptor>) -> Arc<Self> {
        Arc::new(Self::new(tools))
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DomainManager for StaticManager {
    async fn public_tools(
        &self,
        filter: &ToolFilter,
    ) -> Result<Vec<ToolDescriptor>, ManagerError> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        if !self.is_available() {
            return Err(ManagerError::Unavailable("manager offline".into()));
        }
        Ok(self
            .tools
            .iter()
            .filter(|t| t.is_public() && filter.matches(t))
            .cloned()
            .collect())
    }

    async fn public_tool(&self, name: &str) -> ToolLookup {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if !self.is_available() {
            return ToolLookup::Unavailable("manager offline".into());
        }
        match self.tools.iter().find(|t| t.name == name) {
            Some(t) if t.is_public() => ToolLookup::Found(t.clone()),
            Some(_) => ToolLookup::NotPublic,
            None => ToolLookup::NotFound,
        }
    }

    async fn health_check(&self) -> DomainHealth {
        if self.is_available() {
            DomainHealth::Healthy
        } else {
            DomainHealth::Unhealthy("manager offline".into())
        }
    }
}

/// Manager that never answers any call
pub struct HangingManager;

#[async_trait]
impl DomainManager for HangingManager {
    async fn public_tools(
        &self,
        _filter: &ToolFilter,
    ) -> Result<Vec<ToolDescriptor>, ManagerError> {
        std::future::pending().await
    }

    async fn public_tool(&self, _name: &str) -> ToolLookup {
        std::future::pending().await
    }

    async fn health_check(&self) -> DomainHealth {
        std::future::pending().await
    }
}

/// Manager whose scans park until released.
///
/// `entered` is notified when a scan starts; the scan answers after
/// `release` is notified.
pub struct GatedManager {
    tools: Vec<ToolDescriptor>,
    pub entered: Notify,
    pub release: Notify,
}

impl GatedManager {
    pub fn arc(tools: Vec<ToolDescriptor>) -> Arc<Self> {
        Arc::new(Self {
            tools,
            entered: Notify::new(),
            release: Notify::new(),
        })
    }
}

#[async_trait]
impl DomainManager for GatedManager {
    async fn public_tools(
        &self,
        filter: &ToolFilter,
    ) -> Result<Vec<ToolDescriptor>, ManagerError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(self
            .tools
            .iter()
            .filter(|t| t.is_public() && filter.matches(t))
            .cloned()
            .collect())
    }

    async fn public_tool(&self, name: &str) -> ToolLookup {
        match self.tools.iter().find(|t| t.name == name) {
            Some(t) => ToolLookup::Found(t.clone()),
            None => ToolLookup::NotFound,
        }
    }

    async fn health_check(&self) -> DomainHealth {
        DomainHealth::Healthy
    }
}

// ==================== Provider ====================

/// Scripted answer of the mock provider for one tool
#[derive(Clone)]
pub enum Behavior {
    Reply(Value),
    Fail(String),
    Delay(Duration, Value),
    Transport(String),
}

/// Connector whose connections follow per-tool scripts.
///
/// Tools without a script echo their context back.
#[derive(Default)]
pub struct MockConnector {
    behaviors: Mutex<HashMap<String, Behavior>>,
    invocations: Arc<Mutex<Vec<String>>>,
    connects: AtomicUsize,
    connect_delay: Mutex<Duration>,
    refuse: AtomicBool,
    unhealthy: Arc<AtomicBool>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn script(&self, tool: &str, behavior: Behavior) {
        self.behaviors
            .lock()
            .unwrap()
            .insert(tool.to_string(), behavior);
    }

    pub fn refuse_connections(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Every handshake takes `delay` before answering
    pub fn set_connect_delay(&self, delay: Duration) {
        *self.connect_delay.lock().unwrap() = delay;
    }

    pub fn set_unhealthy(&self, unhealthy: bool) {
        self.unhealthy.store(unhealthy, Ordering::SeqCst);
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn invocations(&self) -> Vec<String> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn invocation_count(&self, tool: &str) -> usize {
        self.invocations().iter().filter(|t| *t == tool).count()
    }
}

#[async_trait]
impl ProviderConnector for MockConnector {
    async fn connect(
        &self,
        provider_id: &str,
    ) -> Result<Arc<dyn ProviderConnection>, ProviderError> {
        let delay = *self.connect_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.refuse.load(Ordering::SeqCst) {
            return Err(ProviderError::ConnectionFailed(format!(
                "{} refused the handshake",
                provider_id
            )));
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.unhealthy.store(false, Ordering::SeqCst);
        Ok(Arc::new(MockConnection {
            provider_id: provider_id.to_string(),
            behaviors: self.behaviors.lock().unwrap().clone(),
            invocations: Arc::clone(&self.invocations),
            unhealthy: Arc::clone(&self.unhealthy),
        }))
    }
}

struct MockConnection {
    provider_id: String,
    behaviors: HashMap<String, Behavior>,
    invocations: Arc<Mutex<Vec<String>>>,
    unhealthy: Arc<AtomicBool>,
}

#[async_trait]
impl ProviderConnection for MockConnection {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    async fn invoke(
        &self,
        tool_name: &str,
        context: &ToolContext,
    ) -> Result<ProviderResponse, ProviderError> {
        self.invocations.lock().unwrap().push(tool_name.to_string());
        match self.behaviors.get(tool_name).cloned() {
            Some(Behavior::Reply(data)) => Ok(ProviderResponse::ok(data)),
            Some(Behavior::Fail(message)) => Ok(ProviderResponse::failed(message)),
            Some(Behavior::Delay(delay, data)) => {
                tokio::time::sleep(delay).await;
                Ok(ProviderResponse::ok(data))
            }
            Some(Behavior::Transport(message)) => Err(ProviderError::Transport(message)),
            None => Ok(ProviderResponse::ok(Value::Object(context.clone()))),
        }
    }

    async fn is_healthy(&self) -> bool {
        !self.unhealthy.load(Ordering::SeqCst)
    }
}

// ==================== Fixtures ====================

/// `billing` (`calc_invoice`[finance], `send_receipt`, private `ledger`) and
/// `search` (`index_doc`[search])
pub fn billing_tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new("calc_invoice", "billing", "billing-svc")
            .with_description("Compute invoice totals")
            .with_capability("finance"),
        ToolDescriptor::new("send_receipt", "billing", "billing-svc")
            .with_description("Email a receipt to the customer")
            .with_tag("email"),
        ToolDescriptor::new("ledger", "billing", "billing-svc")
            .with_capability("finance")
            .private(),
    ]
}

pub fn search_tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new("index_doc", "search", "search-svc")
            .with_description("Index a document")
            .with_capability("search"),
    ]
}

pub fn context(pairs: &[(&str, Value)]) -> ToolContext {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
