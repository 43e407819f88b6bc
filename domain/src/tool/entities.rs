//! Tool domain entities

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Whether a tool may be seen and invoked from outside its owning domain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Discoverable and executable by any caller
    #[default]
    Public,
    /// Known to its domain manager only
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Visibility::Public)
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            other => Err(format!("unknown visibility: {}", other)),
        }
    }
}

/// Metadata record identifying a tool, its owner and its capabilities.
///
/// Tool names are unique within a domain, not globally. A descriptor is a
/// value: republishing a tool replaces the old descriptor wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name (e.g., "calc_invoice")
    pub name: String,
    /// Owning domain (e.g., "billing")
    pub domain: String,
    /// Provider that actually executes the tool
    pub provider_id: String,
    /// Human-readable description
    pub description: String,
    /// Capability tags used by capability discovery
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
    /// Free-form tags
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Public or private
    #[serde(default)]
    pub visibility: Visibility,
    /// JSON schema of the expected context
    #[serde(default)]
    pub input_schema: Value,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        domain: impl Into<String>,
        provider_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
            provider_id: provider_id.into(),
            description: String::new(),
            capabilities: BTreeSet::new(),
            tags: BTreeSet::new(),
            visibility: Visibility::Public,
            input_schema: Value::Null,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn private(self) -> Self {
        self.with_visibility(Visibility::Private)
    }

    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    pub fn is_public(&self) -> bool {
        self.visibility.is_public()
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities
            .iter()
            .any(|c| c.eq_ignore_ascii_case(capability))
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Case-insensitive substring match over name, description, capabilities and tags.
    ///
    /// A descriptor matches when **any** of those fields contains the query.
    pub fn matches_text(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
            || self
                .capabilities
                .iter()
                .any(|c| c.to_lowercase().contains(&needle))
            || self
                .tags
                .iter()
                .any(|t| t.to_lowercase().contains(&needle))
    }
}

/// Criteria for selecting tools.
///
/// Used both as the filter handed to domain managers and as the criteria
/// accepted by the façade's `discover_tools`. Every populated field must
/// match (logical AND); an empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolFilter {
    pub capability: Option<String>,
    pub domain: Option<String>,
    pub provider: Option<String>,
    pub tag: Option<String>,
    pub query: Option<String>,
}

impl ToolFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capability(capability: impl Into<String>) -> Self {
        Self::new().with_capability(capability)
    }

    pub fn domain(domain: impl Into<String>) -> Self {
        Self::new().with_domain(domain)
    }

    pub fn query(query: impl Into<String>) -> Self {
        Self::new().with_query(query)
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capability = Some(capability.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.capability.is_none()
            && self.domain.is_none()
            && self.provider.is_none()
            && self.tag.is_none()
            && self.query.is_none()
    }

    /// Check a descriptor against every populated criterion
    pub fn matches(&self, tool: &ToolDescriptor) -> bool {
        if let Some(capability) = &self.capability
            && !tool.has_capability(capability)
        {
            return false;
        }
        if let Some(domain) = &self.domain
            && tool.domain != *domain
        {
            return false;
        }
        if let Some(provider) = &self.provider
            && tool.provider_id != *provider
        {
            return false;
        }
        if let Some(tag) = &self.tag
            && !tool.has_tag(tag)
        {
            return false;
        }
        if let Some(query) = &self.query
            && !tool.matches_text(query)
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice_tool() -> ToolDescriptor {
        ToolDescriptor::new("calc_invoice", "billing", "billing-svc")
            .with_description("Calculates an invoice total")
            .with_capability("finance")
            .with_tag("Accounting")
    }

    #[test]
    fn test_descriptor_defaults_to_public() {
        let tool = ToolDescriptor::new("index_doc", "search", "search-svc");
        assert!(tool.is_public());
        assert!(!tool.clone().private().is_public());
    }

    #[test]
    fn test_matches_text_any_field() {
        let tool = invoice_tool();

        assert!(tool.matches_text("INVOICE"));
        assert!(tool.matches_text("total"));
        assert!(tool.matches_text("fin"));
        assert!(tool.matches_text("accounting"));
        assert!(!tool.matches_text("receipt"));
    }

    #[test]
    fn test_filter_requires_all_criteria() {
        let tool = invoice_tool();

        assert!(ToolFilter::new().matches(&tool));
        assert!(ToolFilter::capability("finance").matches(&tool));
        assert!(
            ToolFilter::capability("finance")
                .with_domain("billing")
                .matches(&tool)
        );
        assert!(
            !ToolFilter::capability("finance")
                .with_domain("search")
                .matches(&tool)
        );
        assert!(!ToolFilter::new().with_provider("other").matches(&tool));
        assert!(ToolFilter::new().with_tag("accounting").matches(&tool));
    }

    #[test]
    fn test_visibility_parse() {
        assert_eq!("Private".parse::<Visibility>(), Ok(Visibility::Private));
        assert_eq!(" public ".parse::<Visibility>(), Ok(Visibility::Public));
        assert!("hidden".parse::<Visibility>().is_err());
    }

    #[test]
    fn test_descriptor_serde_defaults() {
        let tool: ToolDescriptor = serde_json::from_value(serde_json::json!({
            "name": "send_receipt",
            "domain": "billing",
            "provider_id": "billing-svc",
            "description": "Emails a receipt"
        }))
        .unwrap();

        assert!(tool.is_public());
        assert!(tool.capabilities.is_empty());
        assert_eq!(tool.input_schema, Value::Null);
    }
}
