use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::sync::Arc;
use std::time::Duration;

use mcp_bridge::cli::Cli;
use mcp_bridge::config::Config;
use mcp_bridge::ollama::{OllamaClient, OllamaConfig};
use mcp_bridge::server;
use mcp_bridge::tools::ToolRegistry;

fn setup_logging(config: &Config, verbose: bool) {
    // --verbose wins over the config file; RUST_LOG wins over both.
    let default_filter = if verbose {
        "debug"
    } else {
        config.log_level.as_deref().unwrap_or("info")
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(&config, cli.is_verbose());

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    info!("Starting with config from: {:?}", cli.config);

    // Precedence for the listen address: CLI flags over HOST/PORT over the file.
    config.apply_env_overrides(std::env::var("HOST").ok(), std::env::var("PORT").ok());
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let inference = OllamaConfig {
        base_url: config.inference.base_url.clone(),
        model: config.inference.model.clone(),
        timeout: Duration::from_millis(config.inference.timeout_ms),
    };
    let client =
        Arc::new(OllamaClient::new(inference).context("Failed to create inference client")?);
    let registry = ToolRegistry::standard(&config.limits, client);

    println!(
        "{} {}",
        "Starting MCP Bridge server on".cyan(),
        config.server.bind_addr()
    );
    println!(
        "{} {}",
        "Available tools:".green(),
        registry.tool_names().join(", ")
    );

    server::serve(&config.server, registry)
        .await
        .context("Server failed")?;

    Ok(())
}
