//! Discovery domain module
//!
//! Query shapes understood by the discovery engine and their canonical cache
//! keys.

pub mod query;

pub use query::{DiscoveryQuery, SearchFilters};
