//! Tool domain module
//!
//! This module defines the core abstractions of the **Tool Factory**: what a
//! tool is, who owns it, how it is reached and what invoking it produces.
//!
//! # Overview
//!
//! Every tool is described by a [`ToolDescriptor`] published by a
//! [`DomainManager`]. Executing it means opening a [`ProviderConnection`]
//! to the descriptor's provider and invoking it with a [`ToolContext`]; the
//! outcome is a [`ToolResult`].
//!
//! ```text
//! ┌────────────────┐    ┌────────────────┐    ┌────────────────┐
//! │ DomainManager  │───▶│ ToolDescriptor │───▶│ ToolResult     │
//! │ (owner)        │    │ (who / where)  │    │ (data | error) │
//! └────────────────┘    └───────┬────────┘    └────────────────┘
//!                               │
//!                               └─ provider_id ──▶ ProviderConnection
//! ```
//!
//! # Key Types
//!
//! - [`ToolDescriptor`]: name, domain, provider, capabilities, visibility
//! - [`ToolFilter`]: AND-combined discovery criteria
//! - [`ToolLookup`]: tagged lookup outcome (`Found | NotPublic | NotFound | Unavailable`)
//! - [`ToolResult`]: normalized invocation outcome with [`ExecutionMetadata`]
//! - [`ToolFactoryError`]: typed failure surfaced to callers
//! - [`PatternExposure`]: optional first-priority tool source

pub mod entities;
pub mod error;
pub mod exposure;
pub mod manager;
pub mod provider;
pub mod value_objects;

pub use entities::{ToolDescriptor, ToolFilter, Visibility};
pub use error::ToolFactoryError;
pub use exposure::PatternExposure;
pub use manager::{DomainHealth, DomainManager, ManagerError, ToolLookup};
pub use provider::{ProviderConnection, ProviderConnector, ProviderError};
pub use value_objects::{
    ExecutionMetadata, InvocationState, LAST_RESULT_KEY, ProviderResponse, ToolContext,
    ToolResult, context_size,
};
