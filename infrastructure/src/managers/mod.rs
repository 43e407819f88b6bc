//! Domain manager adapters

mod catalog;

pub use catalog::CatalogDomainManager;
