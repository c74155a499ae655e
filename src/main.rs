//! codelink - Flag quotation blocks that carry a marker in rendered HTML
//!
//! codelink provides:
//! - A marker pass over any document that can enumerate its quotations
//! - An HTML page document that rewrites `class` attributes in place
//! - Site-wide marking and listing with ignore-aware traversal
//! - Unified output format (jsonl/json/md/raw)

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

mod cli;
mod config;
mod core;
mod document;
mod site;

fn main() -> Result<ExitCode> {
    let cli = cli::Cli::parse();

    // Logs go to stderr; stdout carries results
    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    cli::run(cli)
}
