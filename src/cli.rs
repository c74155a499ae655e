//! CLI module - Command-line interface definitions and handlers

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::config::{Config, Overrides};
use crate::core::model::{Kind, ResultSet, Status};
use crate::core::render::{OutputFormat, RenderConfig, Renderer};
use crate::site::list::list_quotes;
use crate::site::mark::{mark_site, MarkOptions, MarkSummary};
use crate::site::walk::WalkOptions;

/// codelink - flag quotation blocks that carry a marker in rendered HTML pages.
#[derive(Parser, Debug)]
#[command(name = "codelink")]
#[command(
    author,
    version,
    about,
    long_about = r#"codelink finds every <blockquote> in rendered HTML pages and gives the
ones whose content contains the marker (default: CODELINK) a CSS class
(default: code-link). Quotations without the marker are never modified.

Each command prints a ResultSet in the selected format (default: jsonl).
Logs and summaries go to stderr.

Examples:
    codelink --root book mark
    codelink --root book mark --check
    codelink --root book list --marked-only --format md
"#
)]
pub struct Cli {
    /// Root directory of the rendered pages.
    #[arg(
        long,
        global = true,
        default_value = ".",
        value_name = "ROOT",
        long_help = "Root directory of the rendered pages (defaults to the current directory).\n\n\
All paths emitted in results are relative to this root, and positional scopes are\n\
interpreted relative to it."
    )]
    pub root: PathBuf,

    /// Configuration file (defaults to ROOT/codelink.toml when present).
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        long_help = "Read settings from FILE instead of ROOT/codelink.toml.\n\n\
Recognized keys: marker, class, extensions, max_excerpt. Flags and environment\n\
variables override file values."
    )]
    pub config: Option<PathBuf>,

    /// Output format (jsonl/json/md/raw).
    #[arg(
        long,
        global = true,
        default_value = "jsonl",
        value_name = "FORMAT",
        value_parser = ["jsonl", "json", "md", "markdown", "raw"]
    )]
    pub format: String,

    /// Disable colored output (when applicable).
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (warnings only, no summary).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose mode (debug logs, including the content of every quotation).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Pretty-print JSON/JSONL output with indentation.
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Page selection shared by all commands
#[derive(Args, Debug)]
pub struct ScopeArgs {
    /// Files or directories to process (relative to ROOT unless absolute).
    #[arg(value_name = "SCOPE", num_args = 0..)]
    pub scope: Vec<PathBuf>,

    /// Include hidden files/directories (dotfiles).
    #[arg(long)]
    pub hidden: bool,

    /// Disable .gitignore and other ignore rules.
    #[arg(long)]
    pub no_ignore: bool,
}

impl ScopeArgs {
    fn walk_options(&self) -> WalkOptions {
        WalkOptions {
            hidden: self.hidden,
            ignore: !self.no_ignore,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Give marked quotations the configured class and write pages back.
    #[command(long_about = "Scan every page under ROOT (or the given scopes), set the class\n\
attribute of each <blockquote> whose content contains the marker, and write back\n\
the pages that changed. Existing classes on quotations without the marker are kept.\n\n\
Examples:\n\
  codelink mark\n\
  codelink mark ch01 ch02/index.html --dry-run\n\
  codelink mark --check    # exit status 1 when any page would change or failed\n")]
    Mark {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Report what would change without writing.
        #[arg(long)]
        dry_run: bool,

        /// Do not write; exit with status 1 when any page would change or failed.
        #[arg(long)]
        check: bool,

        /// Marker substring (case-sensitive).
        #[arg(long, env = "CODELINK_MARKER", value_name = "TEXT")]
        marker: Option<String>,

        /// Class written onto marked quotations.
        #[arg(long, env = "CODELINK_CLASS", value_name = "CLASS")]
        class: Option<String>,
    },

    /// List quotations with their marker and class state (read-only).
    #[command(long_about = "Report every <blockquote> under ROOT (or the given scopes) with its\n\
line range, byte range, current class, whether it carries the marker, and an\n\
excerpt of its content. Status is 'marked' when the class is already set,\n\
'pending' when `mark` would set it, and 'unchanged' otherwise.\n\n\
Examples:\n\
  codelink list\n\
  codelink list --marked-only --format md\n")]
    List {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Only report quotations that carry the marker.
        #[arg(long)]
        marked_only: bool,

        /// Maximum excerpt size in bytes.
        #[arg(long, value_name = "BYTES")]
        max_excerpt: Option<usize>,

        /// Marker substring (case-sensitive).
        #[arg(long, env = "CODELINK_MARKER", value_name = "TEXT")]
        marker: Option<String>,

        /// Class that counts as already marked.
        #[arg(long, env = "CODELINK_CLASS", value_name = "CLASS")]
        class: Option<String>,
    },
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<ExitCode> {
    if cli.no_color {
        colored::control::set_override(false);
    }

    let format: OutputFormat = cli.format.parse().unwrap_or_default();
    let render_config = RenderConfig::with_pretty(format, cli.pretty);

    let root = cli.root.canonicalize().unwrap_or(cli.root);
    if !root.is_dir() {
        bail!("Root is not a directory: {}", root.display());
    }

    match cli.command {
        Commands::Mark {
            scope,
            dry_run,
            check,
            marker,
            class,
        } => {
            let overrides = Overrides {
                marker,
                class,
                ..Default::default()
            };
            let config = Config::resolve(&root, cli.config.as_deref(), overrides)?;
            let options = MarkOptions {
                dry_run,
                check,
                walk: scope.walk_options(),
            };

            let result_set = mark_site(&root, &scope.scope, &config, options)?;
            emit(&result_set, render_config)?;

            let summary = MarkSummary::from_result_set(&result_set);
            if !cli.quiet {
                print_summary(&summary, dry_run || check);
            }

            if check && (summary.pending > 0 || summary.failed > 0) {
                if summary.pending > 0 {
                    eprintln!(
                        "{}",
                        format!("{} page(s) need marking", summary.pending).red()
                    );
                    for item in result_set.items.iter().filter(|i| {
                        i.kind == Kind::Page && i.status == Status::Pending
                    }) {
                        eprintln!("  {}", item.path.as_deref().unwrap_or_default());
                    }
                }
                if summary.failed > 0 {
                    eprintln!(
                        "{}",
                        format!("{} page(s) could not be checked", summary.failed).red()
                    );
                }
                return Ok(ExitCode::FAILURE);
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::List {
            scope,
            marked_only,
            max_excerpt,
            marker,
            class,
        } => {
            let overrides = Overrides {
                marker,
                class,
                max_excerpt,
            };
            let config = Config::resolve(&root, cli.config.as_deref(), overrides)?;

            let result_set = list_quotes(
                &root,
                &scope.scope,
                &config,
                scope.walk_options(),
                marked_only,
            )?;
            emit(&result_set, render_config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn emit(result_set: &ResultSet, config: RenderConfig) -> Result<()> {
    let renderer = Renderer::with_config(config);
    renderer
        .render_to(result_set, std::io::stdout().lock())
        .context("Failed to write results")
}

fn print_summary(summary: &MarkSummary, preview: bool) {
    let changed = if preview {
        format!("{} pending", summary.pending).yellow()
    } else {
        format!("{} marked", summary.marked).green()
    };
    let failed = if summary.failed > 0 {
        format!("{} failed", summary.failed).red()
    } else {
        format!("{} failed", summary.failed).normal()
    };

    eprintln!(
        "{} {} page(s), {}, {}",
        "codelink:".bold(),
        summary.pages,
        changed,
        failed
    );
}
