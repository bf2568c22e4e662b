//! lintfix CLI binary entry point.
//! Delegates to library modules for scanning, pattern management, and
//! printing, and maps results onto the documented exit codes.

use anyhow::Context;
use clap::Parser;
use lintfix::cli::{Cli, Commands, PatternsCmd};
use lintfix::linter::{Linter, SyntaxChecker};
use lintfix::scan::ScanOptions;
use lintfix::store::PatternStore;
use lintfix::{config, output, report, scan};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn error_prefix() -> String {
    if std::env::var_os("NO_COLOR").is_none() {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

fn note_prefix() -> String {
    if std::env::var_os("NO_COLOR").is_none() {
        "note:".blue().bold().to_string()
    } else {
        "note:".to_string()
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match cli.cmd {
        Some(Commands::Version) => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            0
        }
        Some(Commands::Patterns { ref cmd }) => match run_patterns(cmd) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("{} {:#}", error_prefix(), e);
                2
            }
        },
        None => match run_scan_command(&cli) {
            Ok(converged) => {
                if converged {
                    0
                } else {
                    1
                }
            }
            Err(e) => {
                eprintln!("{} {:#}", error_prefix(), e);
                2
            }
        },
    };
    std::process::exit(code);
}

/// Pattern subcommands default to the same store location a scan of the
/// current directory would use.
fn pattern_db(db: &Option<PathBuf>) -> PathBuf {
    db.clone()
        .unwrap_or_else(|| PathBuf::from(".lintfix/patterns.db"))
}

fn run_patterns(cmd: &PatternsCmd) -> anyhow::Result<()> {
    match cmd {
        PatternsCmd::Seed { db } => {
            let store =
                PatternStore::open(&pattern_db(db)).context("failed to open pattern store")?;
            let inserted = store.seed_default_patterns()?;
            println!("seeded {} pattern(s)", inserted);
        }
        PatternsCmd::Ls { db, output: out } => {
            let store =
                PatternStore::open(&pattern_db(db)).context("failed to open pattern store")?;
            let patterns = store.list_patterns()?;
            output::print_patterns(&patterns, out.as_deref().unwrap_or("human"));
        }
        PatternsCmd::Add {
            db,
            code,
            regex,
            replacement,
            description,
        } => {
            let store =
                PatternStore::open(&pattern_db(db)).context("failed to open pattern store")?;
            let id = store.add_pattern(code, regex, replacement, description)?;
            println!("added pattern {} for {}", id, code);
        }
    }
    Ok(())
}

/// Run a full scan; returns whether the tree converged at zero violations.
fn run_scan_command(cli: &Cli) -> anyhow::Result<bool> {
    let path = cli
        .path
        .clone()
        .context("missing scan path (usage: lintfix <path>)")?;
    if !path.exists() {
        anyhow::bail!("path not found: {}", path.display());
    }
    // Config, store, and backups live beside the scanned tree
    let cfg_root: PathBuf = if path.is_dir() {
        path.clone()
    } else {
        path.parent().unwrap_or(Path::new(".")).to_path_buf()
    };
    let file_cfg = config::load_config(&cfg_root);
    if file_cfg.is_none() {
        eprintln!("{} No lintfix.toml found; using defaults.", note_prefix());
    }
    let overrides = config::CliOverrides {
        max_iterations: cli.max_iterations,
        exclude: cli.exclude.clone(),
        db: cli.db.clone(),
        report: cli.report.clone(),
        output: cli.output.clone(),
        linter: cli.linter.clone(),
        syntax_check: cli.syntax_check.clone(),
        dry_run: cli.dry_run,
    };
    let eff = config::resolve_effective(&cfg_root, file_cfg, &overrides);

    let store = PatternStore::open(&eff.db).context("failed to open pattern store")?;
    // Seeding skips rows already present
    store.seed_default_patterns()?;

    let linter = Linter::new(eff.linter_command.clone());
    let checker = SyntaxChecker::new(eff.syntax_command.clone());
    let opts = ScanOptions {
        root: path,
        exclude: eff.exclude.clone(),
        backup_root: eff.backup_dir.clone(),
        max_iterations: eff.max_iterations,
        dry_run: eff.dry_run,
    };
    let outcome = scan::run_scan(&store, &linter, &checker, &opts)?;
    output::print_scan(&outcome, &eff.output, &eff.root, eff.dry_run);

    let patterns = store.list_patterns()?;
    let artifact = report::compose_report(&outcome, &patterns);
    report::write_report(&eff.report, &artifact).context("failed to write report")?;

    Ok(outcome.converged)
}
