//! Configuration discovery and effective settings resolution.
//!
//! lintfix reads `lintfix.toml` from the scan root and merges it with CLI
//! flags into an `Effective` config. Defaults:
//! - `max_iterations`: 5
//! - `db`: `.lintfix/patterns.db`
//! - `backup_dir`: `.lintfix/backups`
//! - `report`: `.lintfix/lintfix-report.json`
//! - `output`: `human`
//! - `[linter].command`: `["flake8"]`
//! - `[syntax].command`: `["python3", "-m", "py_compile"]`
//!
//! Overrides precedence: CLI > config file > defaults. Exclusion names are
//! additive: built-ins plus config plus CLI.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory names never descended into, matching the directories the
/// usual Python tooling litters a tree with.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    ".git",
    "__pycache__",
    ".venv",
    "venv",
    "node_modules",
    ".pytest_cache",
    ".mypy_cache",
    ".lintfix",
];

pub const DEFAULT_MAX_ITERATIONS: usize = 5;

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `lintfix.toml`.
pub struct LintfixConfig {
    pub max_iterations: Option<usize>,
    #[serde(default)]
    pub exclude: Vec<String>,
    pub db: Option<String>,
    pub backup_dir: Option<String>,
    pub report: Option<String>,
    pub output: Option<String>,
    pub linter: Option<ToolCfg>,
    pub syntax: Option<ToolCfg>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Command vector for an external tool section (`[linter]` / `[syntax]`).
pub struct ToolCfg {
    #[serde(default)]
    pub command: Vec<String>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by the scan after applying precedence.
pub struct Effective {
    pub root: PathBuf,
    pub max_iterations: usize,
    pub exclude: Vec<String>,
    pub db: PathBuf,
    pub backup_dir: PathBuf,
    pub report: PathBuf,
    pub output: String,
    pub linter_command: Vec<String>,
    pub syntax_command: Vec<String>,
    pub dry_run: bool,
}

/// CLI-provided overrides, already parsed by clap.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub max_iterations: Option<usize>,
    pub exclude: Vec<String>,
    pub db: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub output: Option<String>,
    pub linter: Option<String>,
    pub syntax_check: Option<String>,
    pub dry_run: bool,
}

/// Load `lintfix.toml` from `root`, if present and parseable.
pub fn load_config(root: &Path) -> Option<LintfixConfig> {
    let path = root.join("lintfix.toml");
    let text = fs::read_to_string(path).ok()?;
    toml::from_str(&text).ok()
}

/// Merge CLI flags over an already-loaded config file over defaults.
pub fn resolve_effective(root: &Path, cfg: Option<LintfixConfig>, cli: &CliOverrides) -> Effective {
    let cfg = cfg.unwrap_or_default();

    let mut exclude: Vec<String> = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
    for name in cfg.exclude.iter().chain(cli.exclude.iter()) {
        if !exclude.iter().any(|e| e == name) {
            exclude.push(name.clone());
        }
    }

    let db = cli
        .db
        .clone()
        .or_else(|| cfg.db.as_ref().map(PathBuf::from))
        .map(|p| absolutize(root, p))
        .unwrap_or_else(|| root.join(".lintfix/patterns.db"));
    let backup_dir = cfg
        .backup_dir
        .as_ref()
        .map(|p| absolutize(root, PathBuf::from(p)))
        .unwrap_or_else(|| root.join(".lintfix/backups"));
    let report = cli
        .report
        .clone()
        .or_else(|| cfg.report.as_ref().map(PathBuf::from))
        .map(|p| absolutize(root, p))
        .unwrap_or_else(|| root.join(".lintfix/lintfix-report.json"));

    let linter_command = cli
        .linter
        .as_ref()
        .map(|s| split_command(s))
        .or_else(|| cfg.linter.as_ref().map(|t| t.command.clone()))
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| vec!["flake8".to_string()]);
    let syntax_command = cli
        .syntax_check
        .as_ref()
        .map(|s| split_command(s))
        .or_else(|| cfg.syntax.as_ref().map(|t| t.command.clone()))
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| {
            vec![
                "python3".to_string(),
                "-m".to_string(),
                "py_compile".to_string(),
            ]
        });

    Effective {
        root: root.to_path_buf(),
        max_iterations: cli
            .max_iterations
            .or(cfg.max_iterations)
            .unwrap_or(DEFAULT_MAX_ITERATIONS),
        exclude,
        db,
        backup_dir,
        report,
        output: cli
            .output
            .clone()
            .or(cfg.output)
            .unwrap_or_else(|| "human".to_string()),
        linter_command,
        syntax_command,
        dry_run: cli.dry_run,
    }
}

fn absolutize(root: &Path, p: PathBuf) -> PathBuf {
    if p.is_absolute() {
        p
    } else {
        root.join(p)
    }
}

fn split_command(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_config() {
        let tmp = tempdir().unwrap();
        let eff = resolve_effective(tmp.path(), load_config(tmp.path()), &CliOverrides::default());
        assert_eq!(eff.max_iterations, 5);
        assert_eq!(eff.linter_command, vec!["flake8"]);
        assert_eq!(eff.syntax_command, vec!["python3", "-m", "py_compile"]);
        assert_eq!(eff.db, tmp.path().join(".lintfix/patterns.db"));
        assert!(eff.exclude.iter().any(|e| e == "__pycache__"));
        assert!(eff.exclude.iter().any(|e| e == ".lintfix"));
        assert_eq!(eff.output, "human");
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let tmp = tempdir().unwrap();
        std::fs::write(
            tmp.path().join("lintfix.toml"),
            r#"
max_iterations = 2
exclude = ["build"]
db = "state/p.db"
output = "json"

[linter]
command = ["pyflakes"]
"#,
        )
        .unwrap();
        let cfg = load_config(tmp.path());
        assert!(cfg.is_some());
        let eff = resolve_effective(tmp.path(), cfg, &CliOverrides::default());
        assert_eq!(eff.max_iterations, 2);
        assert_eq!(eff.linter_command, vec!["pyflakes"]);
        assert_eq!(eff.db, tmp.path().join("state/p.db"));
        assert_eq!(eff.output, "json");
        assert!(eff.exclude.iter().any(|e| e == "build"));
        assert!(eff.exclude.iter().any(|e| e == ".git"));
    }

    #[test]
    fn test_cli_beats_config_file() {
        let tmp = tempdir().unwrap();
        std::fs::write(tmp.path().join("lintfix.toml"), "max_iterations = 2\n").unwrap();
        let cli = CliOverrides {
            max_iterations: Some(9),
            exclude: vec!["dist".into()],
            linter: Some("flake8 --select E501".into()),
            ..Default::default()
        };
        let eff = resolve_effective(tmp.path(), load_config(tmp.path()), &cli);
        assert_eq!(eff.max_iterations, 9);
        assert_eq!(eff.linter_command, vec!["flake8", "--select", "E501"]);
        assert!(eff.exclude.iter().any(|e| e == "dist"));
    }
}
