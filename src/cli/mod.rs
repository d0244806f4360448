//! CLI definition using clap.
//!
//! The bridge has a single mode: start and serve until interrupted. Flags
//! only tune where it listens and how it is configured.

use clap::Parser;
use std::path::PathBuf;

/// mcp-bridge - serve local tools over an MCP-style HTTP API
#[derive(Parser, Debug)]
#[command(name = "mcp-bridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Listen host (overrides config file and HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port (overrides config file and PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}
