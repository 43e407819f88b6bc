//! CLI command definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for tool-factory
#[derive(Parser, Debug)]
#[command(name = "tool-factory")]
#[command(author, version, about = "Discover, execute and analyze domain tools")]
#[command(long_about = r#"
Tool Factory resolves tool names to the domain that publishes them and runs
them through a pooled provider connection.

Domains and their tools are declared in the configuration file:

  [[domains]]
  name = "billing"
  provider = "billing-svc"

  [[domains.tools]]
  name = "calc_invoice"
  capabilities = ["finance"]

Configuration is merged from (highest priority first):
1. TOOL_FACTORY_* environment variables (`__` separates sections)
2. --config <path>        Explicit config file
3. ./tool-factory.toml    Project-level config
4. ~/.config/tool-factory/config.toml   Global config

Example:
  tool-factory discover --capability finance
  tool-factory exec calc_invoice --context '{"amount": 100}'
  tool-factory chain calc_invoice send_receipt
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List public tools matching every given criterion
    Discover {
        #[command(flatten)]
        criteria: Criteria,

        /// Caller identity passed to pattern exposure
        #[arg(long)]
        requester: Option<String>,
    },

    /// Public tools grouped by domain, capability and provider
    Catalog,

    /// Show the descriptor of one tool
    Info {
        tool: String,
    },

    /// List the public tools of one domain
    Domain {
        domain: String,
    },

    /// Tools sharing a capability or the domain of a tool
    Related {
        tool: String,
    },

    /// Execute one tool
    Exec {
        tool: String,

        #[command(flatten)]
        input: ContextArg,

        /// Caller identity recorded in the result metadata
        #[arg(long)]
        requester: Option<String>,
    },

    /// Execute tools in order, feeding each result into the next context
    Chain {
        #[arg(required = true)]
        tools: Vec<String>,

        #[command(flatten)]
        input: ContextArg,
    },

    /// Execute tools concurrently with the same context
    Parallel {
        #[arg(required = true)]
        tools: Vec<String>,

        #[command(flatten)]
        input: ContextArg,
    },

    /// Factory counters and cache state
    Stats,

    /// Probe every registered domain
    Health,

    /// Run tools repeatedly, then report usage, performance and errors
    Analytics {
        /// Tools to exercise before reporting (can be specified multiple times)
        #[arg(long = "exec", value_name = "TOOL")]
        exec: Vec<String>,

        /// Number of times each tool is executed
        #[arg(long, default_value_t = 1)]
        repeat: usize,

        /// Restrict the report to one tool
        #[arg(long)]
        tool: Option<String>,

        /// Usage and error window in seconds
        #[arg(long, default_value_t = 3600)]
        window: u64,

        #[command(flatten)]
        input: ContextArg,
    },
}

/// AND-combined discovery criteria
#[derive(Args, Debug, Default)]
pub struct Criteria {
    #[arg(long)]
    pub domain: Option<String>,

    #[arg(long)]
    pub capability: Option<String>,

    #[arg(long)]
    pub provider: Option<String>,

    #[arg(long)]
    pub tag: Option<String>,

    /// Case-insensitive text matched against name and description
    #[arg(long)]
    pub query: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct ContextArg {
    /// Initial context as a JSON object
    #[arg(long, value_name = "JSON", default_value = "{}")]
    pub context: String,
}
