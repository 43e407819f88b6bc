//! Provider connection pool.
//!
//! One handle per provider, reused across invocations. A handle is replaced,
//! never repaired: when it is marked unhealthy or fails a periodic probe it
//! is dropped and the connector is asked for a fresh one.
//!
//! ```text
//! acquire(provider)
//!   ├─ pooled + healthy + probed recently ─▶ reuse
//!   ├─ pooled + probe due ─▶ probe ─┬─ ok ──▶ reuse
//!   │                               └─ fail ─▶ evict ─▶ connect
//!   ├─ pooled + marked unhealthy ─▶ evict ─▶ connect
//!   └─ not pooled ─▶ connect
//! ```
//!
//! The pool lock is never held across a handshake or a probe. Handshakes
//! are single-flight per provider: concurrent cold acquisitions wait for
//! the first handshake and then share its handle.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::Instant;
use tool_factory_domain::{ProviderConnection, ProviderConnector, ToolFactoryError};
use tracing::{debug, info, warn};

struct PooledConnection {
    connection: Arc<dyn ProviderConnection>,
    last_health_check: Instant,
    healthy: bool,
}

/// Pool counters reported by the façade statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub connections: usize,
    pub created: u64,
    pub reused: u64,
    pub evicted: u64,
}

pub struct ConnectionPool {
    connector: Arc<dyn ProviderConnector>,
    handles: Mutex<HashMap<String, PooledConnection>>,
    handshakes: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    call_timeout: Duration,
    health_check_interval: Duration,
    created: AtomicU64,
    reused: AtomicU64,
    evicted: AtomicU64,
}

impl ConnectionPool {
    pub fn new(
        connector: Arc<dyn ProviderConnector>,
        call_timeout: Duration,
        health_check_interval: Duration,
    ) -> Self {
        Self {
            connector,
            handles: Mutex::new(HashMap::new()),
            handshakes: Mutex::new(HashMap::new()),
            call_timeout,
            health_check_interval,
            created: AtomicU64::new(0),
            reused: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
        }
    }

    /// A healthy connection to `provider_id`, pooled or freshly opened.
    ///
    /// Handshake failures and timeouts surface as `ProviderUnavailable`.
    pub async fn acquire(
        &self,
        provider_id: &str,
    ) -> Result<Arc<dyn ProviderConnection>, ToolFactoryError> {
        if let Some(connection) = self.pooled(provider_id).await {
            self.reused.fetch_add(1, Ordering::Relaxed);
            return Ok(connection);
        }

        let gate = self.handshake_gate(provider_id);
        let _handshake = gate.lock().await;
        // Another caller may have connected while we waited
        if let Some(connection) = self.pooled(provider_id).await {
            self.reused.fetch_add(1, Ordering::Relaxed);
            return Ok(connection);
        }

        let connection = self.connect(provider_id).await?;

        self.lock().insert(
            provider_id.to_string(),
            PooledConnection {
                connection: Arc::clone(&connection),
                last_health_check: Instant::now(),
                healthy: true,
            },
        );
        self.created.fetch_add(1, Ordering::Relaxed);
        info!(provider = %provider_id, "Opened provider connection");
        Ok(connection)
    }

    /// Flag a connection for replacement on its next acquisition.
    ///
    /// Ignored when the pool already holds a different handle.
    pub fn mark_unhealthy(&self, provider_id: &str, connection: &Arc<dyn ProviderConnection>) {
        if let Some(handle) = self.lock().get_mut(provider_id)
            && Arc::ptr_eq(&handle.connection, connection)
        {
            debug!(provider = %provider_id, "Marked connection unhealthy");
            handle.healthy = false;
        }
    }

    /// Drop the pooled handle of `provider_id`
    pub fn evict(&self, provider_id: &str) -> bool {
        let removed = self.lock().remove(provider_id).is_some();
        if removed {
            self.evicted.fetch_add(1, Ordering::Relaxed);
            debug!(provider = %provider_id, "Evicted provider connection");
        }
        removed
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            connections: self.len(),
            created: self.created.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
        }
    }

    async fn connect(
        &self,
        provider_id: &str,
    ) -> Result<Arc<dyn ProviderConnection>, ToolFactoryError> {
        let handshake = self.connector.connect(provider_id);
        match tokio::time::timeout(self.call_timeout, handshake).await {
            Ok(Ok(connection)) => Ok(connection),
            Ok(Err(e)) => {
                warn!(provider = %provider_id, error = %e, "Provider handshake failed");
                Err(ToolFactoryError::unavailable(provider_id, e.to_string()))
            }
            Err(_) => {
                warn!(provider = %provider_id, "Provider handshake timed out");
                Err(ToolFactoryError::unavailable(
                    provider_id,
                    format!(
                        "handshake timed out after {:.1}s",
                        self.call_timeout.as_secs_f64()
                    ),
                ))
            }
        }
    }

    fn handshake_gate(&self, provider_id: &str) -> Arc<AsyncMutex<()>> {
        let mut gates = self
            .handshakes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(gates.entry(provider_id.to_string()).or_default())
    }

    async fn pooled(&self, provider_id: &str) -> Option<Arc<dyn ProviderConnection>> {
        let (connection, healthy, probe_due) = {
            let handles = self.lock();
            let handle = handles.get(provider_id)?;
            (
                Arc::clone(&handle.connection),
                handle.healthy,
                handle.last_health_check.elapsed() >= self.health_check_interval,
            )
        };

        if !healthy {
            self.evict(provider_id);
            return None;
        }
        if !probe_due {
            return Some(connection);
        }

        let healthy = tokio::time::timeout(self.call_timeout, connection.is_healthy())
            .await
            .unwrap_or(false);

        let mut handles = self.lock();
        let still_pooled = handles
            .get(provider_id)
            .map(|handle| Arc::ptr_eq(&handle.connection, &connection));
        match still_pooled {
            Some(true) if healthy => {
                if let Some(handle) = handles.get_mut(provider_id) {
                    handle.last_health_check = Instant::now();
                }
                Some(connection)
            }
            Some(true) => {
                handles.remove(provider_id);
                self.evicted.fetch_add(1, Ordering::Relaxed);
                warn!(provider = %provider_id, "Connection failed health check, replacing");
                None
            }
            // Replaced by a concurrent caller while probing
            Some(false) => handles
                .get(provider_id)
                .map(|handle| Arc::clone(&handle.connection)),
            None => None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, PooledConnection>> {
        self.handles
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::MockConnector;

    fn pool(connector: Arc<MockConnector>) -> ConnectionPool {
        ConnectionPool::new(connector, Duration::from_secs(1), Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_connection_is_reused() {
        let connector = MockConnector::arc();
        let pool = pool(connector.clone());

        let first = pool.acquire("billing-svc").await.unwrap();
        let second = pool.acquire("billing-svc").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(connector.connect_count(), 1);
        let stats = pool.stats();
        assert_eq!((stats.created, stats.reused, stats.connections), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_one_handle_per_provider() {
        let connector = MockConnector::arc();
        let pool = pool(connector.clone());

        pool.acquire("billing-svc").await.unwrap();
        pool.acquire("search-svc").await.unwrap();

        assert_eq!(pool.len(), 2);
        assert_eq!(connector.connect_count(), 2);
    }

    #[tokio::test]
    async fn test_marked_unhealthy_is_replaced() {
        let connector = MockConnector::arc();
        let pool = pool(connector.clone());

        let first = pool.acquire("billing-svc").await.unwrap();
        pool.mark_unhealthy("billing-svc", &first);
        let second = pool.acquire("billing-svc").await.unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(connector.connect_count(), 2);
        assert_eq!(pool.stats().evicted, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_probe_replaces_connection() {
        let connector = MockConnector::arc();
        let pool = pool(connector.clone());

        pool.acquire("billing-svc").await.unwrap();
        connector.set_unhealthy(true);

        // Probe not due yet: the handle is reused as is
        pool.acquire("billing-svc").await.unwrap();
        assert_eq!(connector.connect_count(), 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        pool.acquire("billing-svc").await.unwrap();
        assert_eq!(connector.connect_count(), 2);
        assert_eq!(pool.stats().evicted, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_acquire_shares_one_handshake() {
        let connector = MockConnector::arc();
        connector.set_connect_delay(Duration::from_millis(100));
        let pool = pool(connector.clone());

        let provider = "billing-svc";
        let (first, second) = tokio::join!(pool.acquire(provider), pool.acquire(provider));
        let (first, second) = (first.unwrap(), second.unwrap());

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(connector.connect_count(), 1);
        let stats = pool.stats();
        assert_eq!((stats.created, stats.reused, stats.connections), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_refused_handshake_is_unavailable() {
        let connector = MockConnector::arc();
        connector.refuse_connections(true);
        let pool = pool(connector);

        let err = pool.acquire("billing-svc").await.err().unwrap();
        assert!(matches!(err, ToolFactoryError::ProviderUnavailable { .. }));
        assert!(pool.is_empty());
    }
}
