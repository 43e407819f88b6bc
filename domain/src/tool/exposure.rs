//! Pattern exposure: an alternate source of public tools.
//!
//! When configured, the factory asks the exposure source first and falls back
//! to scanning domain managers only when it fails or reports nothing for the
//! request.

use async_trait::async_trait;

use super::entities::ToolDescriptor;
use super::manager::ManagerError;

#[async_trait]
pub trait PatternExposure: Send + Sync {
    /// Every tool the requester may see, across all domains
    async fn public_tools(&self, requester: Option<&str>)
    -> Result<Vec<ToolDescriptor>, ManagerError>;
}
