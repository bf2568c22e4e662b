//! Correction Engine: applies stored regex rules to one violation at a
//! time, gated by a syntax check before anything touches disk.
//!
//! A substitution whose result does not parse is discarded, recorded as a
//! failure for that pattern, and the next candidate is tried. Only a
//! passing candidate is written, and then only after the pre-change
//! content has been backed up, via an atomic temp-file-then-rename.

use crate::errors::Result;
use crate::linter::{Linter, SyntaxChecker};
use crate::models::{CorrectionAttempt, ViolationRecord};
use crate::store::PatternStore;
use chrono::Utc;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Per-session correction driver. Holds the skip set of (pattern,
/// violation) pairs that already failed, so a pattern is never retried
/// against the same violation within one session.
pub struct CorrectionEngine<'a> {
    store: &'a PatternStore,
    linter: &'a Linter,
    checker: &'a SyntaxChecker,
    root: PathBuf,
    backup_root: PathBuf,
    dry_run: bool,
    failed: HashSet<(i64, String, usize, String)>,
    backup_seq: u32,
}

impl<'a> CorrectionEngine<'a> {
    pub fn new(
        store: &'a PatternStore,
        linter: &'a Linter,
        checker: &'a SyntaxChecker,
        root: PathBuf,
        backup_root: PathBuf,
        dry_run: bool,
    ) -> Self {
        CorrectionEngine {
            store,
            linter,
            checker,
            root,
            backup_root,
            dry_run,
            failed: HashSet::new(),
            backup_seq: 0,
        }
    }

    /// Try the stored patterns for one violation, best performer first.
    ///
    /// Returns an attempt with `applied = true` and a fresh single-file
    /// violation count on success, or `applied = false` (and
    /// `resulting_violation_count = 0`, which is only meaningful when
    /// applied) when no candidate survived the syntax gate. In dry-run
    /// mode `applied = true` means "would apply": nothing is written, no
    /// counters move, and the count comes from linting the candidate
    /// content instead of the untouched file.
    pub fn correct_violation(&mut self, violation: &ViolationRecord) -> Result<CorrectionAttempt> {
        let path = Path::new(&violation.file_path);
        let original = fs::read_to_string(path)?;
        let patterns = self.store.get_patterns_for_code(&violation.code)?;

        for pattern in &patterns {
            let key = (
                pattern.id,
                violation.file_path.clone(),
                violation.line,
                violation.code.clone(),
            );
            if self.failed.contains(&key) {
                continue;
            }
            let regex = match Regex::new(&pattern.match_regex) {
                Ok(r) => r,
                Err(e) => {
                    warn!(pattern_id = pattern.id, error = %e, "stored regex does not compile, skipping");
                    continue;
                }
            };
            let candidate = match substitute_line(&original, violation.line, &regex, &pattern.replacement_template) {
                Some(c) if c != original => c,
                _ => continue,
            };
            debug!(pattern_id = pattern.id, code = %violation.code, file = %violation.file_path, line = violation.line, "trying pattern");

            if !self.checker.check(&candidate)? {
                debug!(pattern_id = pattern.id, "candidate rejected by syntax gate");
                self.failed.insert(key);
                if !self.dry_run {
                    self.store.record_outcome(pattern.id, false)?;
                }
                continue;
            }

            if self.dry_run {
                return Ok(CorrectionAttempt {
                    file_path: violation.file_path.clone(),
                    code: violation.code.clone(),
                    pattern_id: Some(pattern.id),
                    applied: true,
                    resulting_violation_count: self.lint_candidate(&candidate)?,
                });
            }

            self.backup(path, &original)?;
            write_atomic(path, &candidate)?;
            self.store.record_outcome(pattern.id, true)?;
            let remaining = self.linter.lint_file(path)?.len();
            return Ok(CorrectionAttempt {
                file_path: violation.file_path.clone(),
                code: violation.code.clone(),
                pattern_id: Some(pattern.id),
                applied: true,
                resulting_violation_count: remaining,
            });
        }

        Ok(CorrectionAttempt {
            file_path: violation.file_path.clone(),
            code: violation.code.clone(),
            pattern_id: None,
            applied: false,
            resulting_violation_count: 0,
        })
    }

    /// Lint would-be content through a temp file, so a dry-run attempt
    /// reports the count an applied write would have produced.
    fn lint_candidate(&self, content: &str) -> Result<usize> {
        let mut tmp = tempfile::Builder::new()
            .prefix("lintfix-dry-")
            .suffix(".py")
            .tempfile()?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        Ok(self.linter.lint_file(tmp.path())?.len())
    }

    /// Write the pre-change content under the backup root, named by
    /// timestamp, sequence number, and the path relative to the scan root
    /// with separators flattened.
    fn backup(&mut self, path: &Path, original: &str) -> Result<()> {
        let rel = pathdiff::diff_paths(path, &self.root)
            .unwrap_or_else(|| path.to_path_buf());
        let flat = rel.to_string_lossy().replace(['/', '\\'], "__");
        let name = format!(
            "{}-{:04}__{}",
            Utc::now().format("%Y%m%d-%H%M%S"),
            self.backup_seq,
            flat
        );
        self.backup_seq += 1;
        fs::create_dir_all(&self.backup_root)?;
        fs::write(self.backup_root.join(name), original)?;
        Ok(())
    }
}

/// Apply `regex`/`template` to line `line` (1-based) of `content`.
///
/// An empty substitution result from an empty template removes the line
/// entirely (deletion rules). Returns None when the line is out of range
/// or the regex does not match it. Lines are split on `\n` only, keeping
/// any `\r` with its line, so a CRLF file comes back with every untouched
/// byte intact and the edited line keeps its ending.
fn substitute_line(content: &str, line: usize, regex: &Regex, template: &str) -> Option<String> {
    let ends_with_newline = content.ends_with('\n');
    let mut lines: Vec<String> = content.split('\n').map(str::to_string).collect();
    if ends_with_newline {
        // split produces a trailing empty segment after the final newline
        lines.pop();
    }
    if line == 0 || line > lines.len() {
        return None;
    }
    let raw = &lines[line - 1];
    let (target, had_cr) = match raw.strip_suffix('\r') {
        Some(stripped) => (stripped, true),
        None => (raw.as_str(), false),
    };
    if !regex.is_match(target) {
        return None;
    }
    let replaced = regex.replace(target, template).into_owned();
    if template.is_empty() && replaced.is_empty() {
        lines.remove(line - 1);
    } else if had_cr {
        // a template may expand to several lines; give each the CRLF ending
        lines[line - 1] = replaced.replace('\n', "\r\n") + "\r";
    } else {
        lines[line - 1] = replaced;
    }
    let mut out = lines.join("\n");
    if ends_with_newline && !out.is_empty() {
        out.push('\n');
    }
    Some(out)
}

/// Atomic write: temp file in the target directory, then rename over the
/// destination. A crash mid-write never leaves a half-written file.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{cmd, fake_tool, length_linter, permissive_checker, silent_linter};
    use tempfile::tempdir;

    fn violation(path: &Path, line: usize, code: &str) -> ViolationRecord {
        ViolationRecord {
            file_path: path.to_string_lossy().to_string(),
            line,
            column: 1,
            code: code.to_string(),
            message: String::new(),
        }
    }

    fn engine_parts(root: &Path) -> (PatternStore, Linter, SyntaxChecker) {
        let store = PatternStore::open_in_memory().unwrap();
        let linter = Linter::new(cmd(&silent_linter(root)));
        let checker = SyntaxChecker::new(cmd(&permissive_checker(root)));
        (store, linter, checker)
    }

    #[test]
    fn test_best_performing_pattern_wins() {
        let tmp = tempdir().unwrap();
        let (store, linter, checker) = engine_parts(tmp.path());
        let low = store
            .add_pattern("E711", r"== None", "is None  # low", "low")
            .unwrap();
        let high = store
            .add_pattern("E711", r"==\s*None", "is None", "high")
            .unwrap();
        // 9/10 vs 1/10: the later-registered pattern outranks by success
        for _ in 0..9 {
            store.record_outcome(high, true).unwrap();
        }
        store.record_outcome(high, false).unwrap();
        store.record_outcome(low, true).unwrap();

        let file = tmp.path().join("a.py");
        fs::write(&file, "if x == None:\n    pass\n").unwrap();
        let mut engine = CorrectionEngine::new(
            &store,
            &linter,
            &checker,
            tmp.path().to_path_buf(),
            tmp.path().join("backups"),
            false,
        );
        let attempt = engine.correct_violation(&violation(&file, 1, "E711")).unwrap();
        assert!(attempt.applied);
        assert_eq!(attempt.pattern_id, Some(high));
        let after = fs::read_to_string(&file).unwrap();
        assert_eq!(after, "if x is None:\n    pass\n");
    }

    #[test]
    fn test_fallback_after_syntax_failure_records_failure() {
        let tmp = tempdir().unwrap();
        let store = PatternStore::open_in_memory().unwrap();
        let linter = Linter::new(cmd(&silent_linter(tmp.path())));
        // Gate fails once the import line is gone
        let gate = fake_tool(tmp.path(), "needimport", r#"grep -q "^import" "$1""#);
        let checker = SyntaxChecker::new(cmd(&gate));

        let delete = store
            .add_pattern("F401", r"^\s*import\s+.*$", "", "delete import line")
            .unwrap();
        let noqa = store
            .add_pattern(
                "F401",
                r"^(?P<line>\s*import\s+.*?)\s*$",
                "${line}  # noqa: F401",
                "suppress with noqa",
            )
            .unwrap();
        // Deletion has the better record, so it is tried first
        store.record_outcome(delete, true).unwrap();

        let file = tmp.path().join("b.py");
        fs::write(&file, "import os, sys\nprint(os.sep)\n").unwrap();
        let mut engine = CorrectionEngine::new(
            &store,
            &linter,
            &checker,
            tmp.path().to_path_buf(),
            tmp.path().join("backups"),
            false,
        );
        let attempt = engine.correct_violation(&violation(&file, 1, "F401")).unwrap();
        assert!(attempt.applied);
        assert_eq!(attempt.pattern_id, Some(noqa));
        let after = fs::read_to_string(&file).unwrap();
        assert!(after.starts_with("import os, sys  # noqa: F401\n"));
        // The deletion pattern's failure counter moved by exactly one
        let pats = store.get_patterns_for_code("F401").unwrap();
        let del = pats.iter().find(|p| p.id == delete).unwrap();
        assert_eq!(del.failure_count, 1);
    }

    #[test]
    fn test_no_valid_candidate_leaves_file_untouched() {
        let tmp = tempdir().unwrap();
        let store = PatternStore::open_in_memory().unwrap();
        let linter = Linter::new(cmd(&silent_linter(tmp.path())));
        let reject = fake_tool(tmp.path(), "reject", "exit 1");
        let checker = SyntaxChecker::new(cmd(&reject));
        store
            .add_pattern("E711", r"==\s*None", "is None", "only rule")
            .unwrap();

        let file = tmp.path().join("c.py");
        let before = "if x == None:\n    pass\n";
        fs::write(&file, before).unwrap();
        let mut engine = CorrectionEngine::new(
            &store,
            &linter,
            &checker,
            tmp.path().to_path_buf(),
            tmp.path().join("backups"),
            false,
        );
        let attempt = engine.correct_violation(&violation(&file, 1, "E711")).unwrap();
        assert!(!attempt.applied);
        assert!(attempt.pattern_id.is_none());
        assert_eq!(fs::read_to_string(&file).unwrap(), before);
    }

    #[test]
    fn test_backup_is_byte_identical_to_original() {
        let tmp = tempdir().unwrap();
        let (store, linter, checker) = engine_parts(tmp.path());
        store
            .add_pattern("W291", r"^(?P<l>.*?)[ \t]+$", "${l}", "strip")
            .unwrap();
        let file = tmp.path().join("d.py");
        let before = "x = 1   \n";
        fs::write(&file, before).unwrap();
        let backups = tmp.path().join("store/backups");
        let mut engine = CorrectionEngine::new(
            &store,
            &linter,
            &checker,
            tmp.path().to_path_buf(),
            backups.clone(),
            false,
        );
        let attempt = engine.correct_violation(&violation(&file, 1, "W291")).unwrap();
        assert!(attempt.applied);
        assert_eq!(fs::read_to_string(&file).unwrap(), "x = 1\n");
        let entries: Vec<_> = fs::read_dir(&backups).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let backup = entries[0].as_ref().unwrap().path();
        assert_eq!(fs::read_to_string(backup).unwrap(), before);
    }

    #[test]
    fn test_dry_run_writes_nothing_and_moves_no_counters() {
        let tmp = tempdir().unwrap();
        let (store, linter, checker) = engine_parts(tmp.path());
        let id = store
            .add_pattern("E711", r"==\s*None", "is None", "rule")
            .unwrap();
        let file = tmp.path().join("e.py");
        let before = "if x == None:\n    pass\n";
        fs::write(&file, before).unwrap();
        let backups = tmp.path().join("backups");
        let mut engine = CorrectionEngine::new(
            &store,
            &linter,
            &checker,
            tmp.path().to_path_buf(),
            backups.clone(),
            true,
        );
        let attempt = engine.correct_violation(&violation(&file, 1, "E711")).unwrap();
        assert!(attempt.applied);
        assert_eq!(fs::read_to_string(&file).unwrap(), before);
        assert!(!backups.exists());
        let pats = store.get_patterns_for_code("E711").unwrap();
        assert_eq!(pats[0].id, id);
        assert_eq!(pats[0].success_count, 0);
        assert_eq!(pats[0].failure_count, 0);
    }

    #[test]
    fn test_dry_run_count_reflects_candidate_content() {
        let tmp = tempdir().unwrap();
        let store = PatternStore::open_in_memory().unwrap();
        let linter = Linter::new(cmd(&length_linter(tmp.path())));
        let checker = SyntaxChecker::new(cmd(&permissive_checker(tmp.path())));
        store
            .add_pattern(
                "E501",
                r"^(?P<i>\s*)(?P<h>.{1,70}?\()(?P<t>.+)$",
                "${i}${h}\n${i}    ${t}",
                "wrap after open paren",
            )
            .unwrap();

        let file = tmp.path().join("f.py");
        let before = format!("result_value = compute_the_thing({})\n", "a".repeat(51));
        fs::write(&file, &before).unwrap();
        let mut engine = CorrectionEngine::new(
            &store,
            &linter,
            &checker,
            tmp.path().to_path_buf(),
            tmp.path().join("backups"),
            true,
        );
        let attempt = engine.correct_violation(&violation(&file, 1, "E501")).unwrap();
        assert!(attempt.applied);
        // The wrapped candidate is clean even though the file on disk
        // still carries the long line
        assert_eq!(attempt.resulting_violation_count, 0);
        assert_eq!(fs::read_to_string(&file).unwrap(), before);
    }

    #[test]
    fn test_crlf_line_endings_are_preserved() {
        let re = Regex::new(r"==\s*None").unwrap();
        let out = substitute_line("if x == None:\r\n    pass\r\n", 1, &re, "is None").unwrap();
        assert_eq!(out, "if x is None:\r\n    pass\r\n");

        let re_del = Regex::new(r"^\s*import\s+.*$").unwrap();
        let out = substitute_line("import os\r\nx = 1\r\n", 1, &re_del, "").unwrap();
        assert_eq!(out, "x = 1\r\n");

        let re_wrap = Regex::new(r"^(?P<i>\s*)(?P<h>.{1,70}?\()(?P<t>.+)$").unwrap();
        let long = format!("value = compute({})\r\nrest = 2\r\n", "a, ".repeat(25));
        let out = substitute_line(&long, 1, &re_wrap, "${i}${h}\n${i}    ${t}").unwrap();
        assert!(out.ends_with("rest = 2\r\n"));
        assert!(!out.contains("(\n"), "inserted break lost its \\r: {out:?}");
    }

    #[test]
    fn test_substitute_line_deletion_and_expansion() {
        let re_del = Regex::new(r"^\s*import\s+.*$").unwrap();
        let out = substitute_line("import os\nx = 1\n", 1, &re_del, "").unwrap();
        assert_eq!(out, "x = 1\n");

        let re_wrap = Regex::new(r"^(?P<i>\s*)(?P<h>.{1,70}?\()(?P<t>.+)$").unwrap();
        let long = format!("value = compute({})\n", "a, ".repeat(25));
        let out = substitute_line(&long, 1, &re_wrap, "${i}${h}\n${i}    ${t}").unwrap();
        assert_eq!(out.lines().count(), 2);
        assert!(out.lines().next().unwrap().ends_with("compute("));
    }

    #[test]
    fn test_out_of_range_line_is_no_match() {
        let re = Regex::new(r".*").unwrap();
        assert!(substitute_line("x = 1\n", 5, &re, "y").is_none());
        assert!(substitute_line("x = 1\n", 0, &re, "y").is_none());
    }
}
