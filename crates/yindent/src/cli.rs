//! CLI argument parsing and command definitions

use camino::Utf8PathBuf;
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "yindent", version, about = "YAML indentation linter and fixer")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Parser)]
pub enum Command {
    /// Report indentation problems and exit
    Lint(LintArgs),
    /// Rewrite files with corrected indentation
    Fix(FixArgs),
    /// Write a default .yindent.toml
    Init(InitArgs),
}

#[derive(Debug, Parser)]
pub struct LintArgs {
    /// Files or directories to lint.
    #[arg(required = true)]
    pub paths: Vec<Utf8PathBuf>,

    /// Optional config file (TOML only). Default: .yindent.toml if present.
    #[arg(long)]
    pub config: Option<Utf8PathBuf>,

    /// Output JSON instead of human format
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct FixArgs {
    /// Files or directories to fix.
    #[arg(required = true)]
    pub paths: Vec<Utf8PathBuf>,

    /// Optional config file (TOML only). Default: .yindent.toml if present.
    #[arg(long)]
    pub config: Option<Utf8PathBuf>,

    /// Report files that would change without writing them
    #[arg(long)]
    pub check: bool,
}

#[derive(Debug, Parser)]
pub struct InitArgs {
    /// Directory to write .yindent.toml into
    #[arg(default_value = ".")]
    pub path: Utf8PathBuf,

    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,
}
