//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "lintfix",
    version,
    about = "Database-driven lint correction",
    long_about = "lintfix — scan a tree with an external linter, apply stored regex fix \
patterns gated by a syntax check, and re-lint until converged.\n\nConfiguration precedence: CLI > lintfix.toml > defaults.",
    after_help = "Examples:\n  lintfix src/\n  lintfix src/ --max-iterations 3 --exclude build --dry-run\n  lintfix patterns seed\n  lintfix patterns add --code E711 --regex '==\\s*None' --replacement 'is None'\n\nExit codes: 0 converged with zero violations, 1 violations remain, 2 fatal error.",
    args_conflicts_with_subcommands = true,
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    /// Path to scan (directory or single file)
    pub path: Option<PathBuf>,
    #[arg(long, help = "Maximum lint/correct/relint iterations (default: 5)")]
    pub max_iterations: Option<usize>,
    #[arg(long = "exclude", help = "Directory name to skip (repeatable)")]
    pub exclude: Vec<String>,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Match and check patterns but write nothing")]
    pub dry_run: bool,
    #[arg(long, help = "Output mode: human|json (default: human)")]
    pub output: Option<String>,
    #[arg(long, help = "Pattern database path (default: <path>/.lintfix/patterns.db)")]
    pub db: Option<PathBuf>,
    #[arg(long, help = "Report artifact path (default: <path>/.lintfix/lintfix-report.json)")]
    pub report: Option<PathBuf>,
    #[arg(long, help = "Linter command override, space-separated (default: flake8)")]
    pub linter: Option<String>,
    #[arg(long, help = "Syntax checker command override (default: python3 -m py_compile)")]
    pub syntax_check: Option<String>,

    #[command(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Subcommand)]
/// Supported subcommands besides the default scan.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current lintfix version.")]
    Version,
    /// Pattern management (seed/ls/add)
    Patterns {
        #[command(subcommand)]
        cmd: PatternsCmd,
    },
}

#[derive(Subcommand)]
/// Subcommands for `lintfix patterns`
pub enum PatternsCmd {
    /// Insert the built-in pattern set
    #[command(
        about = "Seed built-in patterns",
        long_about = "Insert the built-in correction patterns, skipping any already present."
    )]
    Seed {
        #[arg(long, help = "Pattern database path (default: .lintfix/patterns.db)")]
        db: Option<PathBuf>,
    },
    /// List registered patterns
    #[command(
        about = "List patterns",
        long_about = "List registered patterns with their success and failure counters."
    )]
    Ls {
        #[arg(long, help = "Pattern database path (default: .lintfix/patterns.db)")]
        db: Option<PathBuf>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
    /// Register one pattern
    #[command(
        about = "Add a pattern",
        long_about = "Register a correction pattern. Rejects a duplicate (code, regex) pair."
    )]
    Add {
        #[arg(long, help = "Pattern database path (default: .lintfix/patterns.db)")]
        db: Option<PathBuf>,
        #[arg(long, help = "Violation code, e.g. E501")]
        code: String,
        #[arg(long, help = "Match regex applied to the violating line")]
        regex: String,
        #[arg(long, help = "Replacement template; empty deletes the line")]
        replacement: String,
        #[arg(long, default_value = "", help = "Human description")]
        description: String,
    },
}
