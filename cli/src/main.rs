//! CLI entrypoint for Tool Factory
//!
//! This is the main binary that wires together all layers using
//! dependency injection: the configured catalog becomes in-memory domain
//! managers backed by the local provider connector.

mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tool_factory_application::ToolFactory;
use tool_factory_domain::{
    ErrorAnalysis, PerformanceAnalysis, Recommendation, ToolContext, ToolFactoryError, ToolFilter,
    UsageStatistics,
};
use tool_factory_infrastructure::{
    CatalogDomainManager, ConfigLoader, FileConfig, LocalProviderConnector,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use commands::{Cli, Command, ContextArg, Criteria};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level; RUST_LOG wins when set
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .context("failed to load configuration")?
    };
    config.validate().context("invalid configuration")?;

    info!(domains = config.domains.len(), "Starting Tool Factory");

    // === Dependency Injection ===
    let factory = build_factory(&config);

    let Some(command) = cli.command else {
        return print_json(&factory.statistics());
    };
    run(&factory, command).await
}

fn build_factory(config: &FileConfig) -> ToolFactory {
    let connector = Arc::new(LocalProviderConnector::from_domains(&config.domains));
    let factory = ToolFactory::new(config.factory.to_factory_config(), connector);
    for domain in &config.domains {
        factory.register_domain_manager(
            &domain.name,
            Arc::new(CatalogDomainManager::from_config(domain)),
        );
    }
    factory
}

async fn run(factory: &ToolFactory, command: Command) -> Result<()> {
    match command {
        Command::Discover {
            criteria,
            requester,
        } => {
            let tools = factory
                .discover_tools(&to_filter(criteria), requester.as_deref())
                .await;
            print_json(&tools)
        }
        Command::Catalog => print_json(&factory.catalog(None).await),
        Command::Info { tool } => match factory.get_tool_info(&tool, None).await {
            Some(descriptor) => print_json(&descriptor),
            None => anyhow::bail!("tool '{}' is unknown or not public", tool),
        },
        Command::Domain { domain } => print_json(&factory.get_domain_tools(&domain, None).await),
        Command::Related { tool } => print_json(&factory.discover_related_tools(&tool).await),
        Command::Exec {
            tool,
            input,
            requester,
        } => {
            let context = parse_context(&input)?;
            let result = factory
                .execute_tool(&tool, &context, requester.as_deref())
                .await?;
            print_json(&result)
        }
        Command::Chain { tools, input } => {
            let context = parse_context(&input)?;
            let cancel = cancel_on_ctrl_c();
            match factory
                .execute_tool_chain(&tools, context, Some(&cancel))
                .await
            {
                Ok(chain) => print_json(&chain),
                Err(e) => {
                    if let ToolFactoryError::ChainAborted { completed, .. } = &e {
                        print_json(completed)?;
                    }
                    Err(e.into())
                }
            }
        }
        Command::Parallel { tools, input } => {
            let context = parse_context(&input)?;
            let cancel = cancel_on_ctrl_c();
            let results = factory
                .execute_tools_parallel(&tools, &context, Some(&cancel))
                .await;
            print_json(&results)
        }
        Command::Stats => print_json(&factory.statistics()),
        Command::Health => print_json(&factory.health_check().await),
        Command::Analytics {
            exec,
            repeat,
            tool,
            window,
            input,
        } => {
            let context = parse_context(&input)?;
            for name in &exec {
                for _ in 0..repeat {
                    if let Err(e) = factory.get_tool(name, &context, None).await {
                        warn!(tool = %name, error = %e, "Analytics run failed");
                    }
                }
            }
            factory.flush_analytics().await;
            print_json(&analytics_report(factory, tool.as_deref(), window))
        }
    }
}

/// Combined analytics output of the `analytics` subcommand
#[derive(Debug, Serialize)]
struct AnalyticsReport {
    usage: Option<UsageStatistics>,
    performance: Option<PerformanceAnalysis>,
    errors: ErrorAnalysis,
    recommendations: Vec<Recommendation>,
}

fn analytics_report(factory: &ToolFactory, tool: Option<&str>, window: u64) -> AnalyticsReport {
    let analytics = factory.analytics();
    let window = Duration::from_secs(window);
    AnalyticsReport {
        usage: analytics.usage_statistics(tool, window),
        performance: analytics.performance_analysis(tool),
        errors: analytics.error_analysis(tool, window),
        recommendations: analytics.optimization_recommendations(tool),
    }
}

fn to_filter(criteria: Criteria) -> ToolFilter {
    ToolFilter {
        capability: criteria.capability,
        domain: criteria.domain,
        provider: criteria.provider,
        tag: criteria.tag,
        query: criteria.query,
    }
}

fn parse_context(input: &ContextArg) -> Result<ToolContext> {
    serde_json::from_str(&input.context).context("--context must be a JSON object")
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling remaining tools");
            child.cancel();
        }
    });
    token
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
