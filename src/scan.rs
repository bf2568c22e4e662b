//! Scan Orchestrator: DISCOVER -> LINT -> CORRECT -> RELINT, looping until
//! the violation count stops decreasing or the iteration budget is spent.
//!
//! Discovery never yields anything under an excluded directory name or
//! under the backup root, so the tool cannot end up correcting its own
//! backups. Corrections within a file run bottom-up so earlier line
//! numbers stay valid while later lines are rewritten.

use crate::engine::CorrectionEngine;
use crate::errors::{LintfixError, Result};
use crate::linter::{Linter, SyntaxChecker};
use crate::models::{ScanOutcome, ScanSession, ViolationRecord};
use crate::store::PatternStore;
use chrono::Utc;
use glob::glob;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Resolved inputs for one orchestrator run.
pub struct ScanOptions {
    pub root: PathBuf,
    pub exclude: Vec<String>,
    pub backup_root: PathBuf,
    pub max_iterations: usize,
    pub dry_run: bool,
}

/// Collect target files under `root`, skipping excluded directory names
/// and anything under `backup_root`. A `root` that is itself a file is
/// scanned as a single target.
pub fn discover_files(root: &Path, exclude: &[String], backup_root: &Path) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    let pattern = root.join("**/*.py").to_string_lossy().to_string();
    let mut files = Vec::new();
    for entry in glob(&pattern).map_err(|e| LintfixError::LintExecution(e.to_string()))? {
        let path = match entry {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "unreadable path skipped during discovery");
                continue;
            }
        };
        if path.starts_with(backup_root) {
            continue;
        }
        let excluded = path.components().any(|c| {
            let name = c.as_os_str().to_string_lossy();
            exclude.iter().any(|e| e == name.as_ref())
        });
        if !excluded {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Drive the full lint/correct/relint cycle for one session.
pub fn run_scan(
    store: &PatternStore,
    linter: &Linter,
    checker: &SyntaxChecker,
    opts: &ScanOptions,
) -> Result<ScanOutcome> {
    let mut session = ScanSession::start(Utc::now());
    let files = discover_files(&opts.root, &opts.exclude, &opts.backup_root)?;
    session.files_scanned = files.len();

    let initial = lint_all(linter, &files)?;
    session.violations_before = initial.len();
    info!(
        session = %session.session_id,
        files = files.len(),
        violations = initial.len(),
        "initial lint complete"
    );

    let mut engine = CorrectionEngine::new(
        store,
        linter,
        checker,
        opts.root.clone(),
        opts.backup_root.clone(),
        opts.dry_run,
    );
    let mut attempts = Vec::new();
    let mut current = initial.clone();
    let mut iterations = 0;

    while !current.is_empty() && iterations < opts.max_iterations {
        iterations += 1;

        // Bottom-up per file: a correction only shifts lines below itself
        let mut by_file: BTreeMap<&str, Vec<&ViolationRecord>> = BTreeMap::new();
        for v in &current {
            by_file.entry(v.file_path.as_str()).or_default().push(v);
        }
        for (file, mut violations) in by_file {
            violations.sort_by(|a, b| b.line.cmp(&a.line));
            for v in violations {
                match engine.correct_violation(v) {
                    Ok(attempt) => attempts.push(attempt),
                    Err(LintfixError::Io(e)) => {
                        warn!(file, error = %e, "file skipped");
                        break;
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        let next = lint_all(linter, &files)?;
        info!(
            iteration = iterations,
            before = current.len(),
            after = next.len(),
            "relint complete"
        );
        let stalled = next.len() >= current.len();
        current = next;
        if stalled || opts.dry_run {
            break;
        }
    }

    session.end_time = Some(Utc::now());
    session.violations_after = current.len();
    if !opts.dry_run {
        store.record_session(&session)?;
        for attempt in &attempts {
            store.record_attempt(&session.session_id, attempt)?;
        }
    }
    let converged = current.is_empty();
    Ok(ScanOutcome {
        session,
        attempts,
        initial,
        remaining: current,
        iterations,
        converged,
    })
}

/// Batch lint with per-file fallback: an execution failure isolates to the
/// offending file, which is logged and skipped, never aborting the session.
fn lint_all(linter: &Linter, files: &[PathBuf]) -> Result<Vec<ViolationRecord>> {
    match linter.lint_paths(files) {
        Ok(records) => Ok(records),
        Err(LintfixError::LintExecution(batch_err)) => {
            warn!(error = %batch_err, "batch lint failed, retrying per file");
            let mut records = Vec::new();
            for file in files {
                match linter.lint_file(file) {
                    Ok(mut recs) => records.append(&mut recs),
                    Err(LintfixError::LintExecution(e)) => {
                        warn!(file = %file.display(), error = %e, "file lint failed, skipped");
                    }
                    Err(e) => return Err(e),
                }
            }
            Ok(records)
        }
        Err(e) => Err(e),
    }
}
