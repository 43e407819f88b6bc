//! Domain catalogs from TOML (`[[domains]]` array)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tool_factory_domain::{ToolDescriptor, Visibility};

/// One domain and the tools it owns
///
/// # Example
///
/// ```toml
/// [[domains]]
/// name = "billing"
/// provider = "billing-svc"
///
/// [[domains.tools]]
/// name = "calc_invoice"
/// description = "Compute invoice totals"
/// capabilities = ["finance"]
///
/// [[domains.tools]]
/// name = "ledger"
/// visibility = "private"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDomainConfig {
    pub name: String,
    /// Provider hosting the domain's tools unless a tool overrides it
    pub provider: String,
    pub tools: Vec<FileToolConfig>,
}

/// Raw tool entry of a domain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileToolConfig {
    pub name: String,
    pub description: String,
    pub capabilities: Vec<String>,
    pub tags: Vec<String>,
    pub visibility: Visibility,
    /// Overrides the domain provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
    /// Canned payload returned by the local provider instead of echoing the context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
}

impl FileDomainConfig {
    /// Provider that hosts `tool`
    pub fn provider_of<'a>(&'a self, tool: &'a FileToolConfig) -> &'a str {
        tool.provider.as_deref().unwrap_or(&self.provider)
    }

    /// Build the descriptors this domain publishes
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools
            .iter()
            .map(|tool| {
                let mut descriptor =
                    ToolDescriptor::new(&tool.name, &self.name, self.provider_of(tool))
                        .with_description(&tool.description)
                        .with_visibility(tool.visibility);
                for capability in &tool.capabilities {
                    descriptor = descriptor.with_capability(capability);
                }
                for tag in &tool.tags {
                    descriptor = descriptor.with_tag(tag);
                }
                if let Some(schema) = &tool.input_schema {
                    descriptor = descriptor.with_input_schema(schema.clone());
                }
                descriptor
            })
            .collect()
    }
}
