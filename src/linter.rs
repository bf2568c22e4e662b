//! Linter Adapter: runs the external linter as a subprocess and parses its
//! one-violation-per-line output, plus the syntax-check gate used before any
//! file write.
//!
//! The linter is opaque: any tool emitting `path:line:col: CODE message`
//! lines works. Lines that do not match that shape are logged and skipped,
//! never fatal. Linters conventionally exit non-zero when violations exist,
//! so a non-zero exit with parseable output is a normal result.

use crate::errors::{LintfixError, Result};
use crate::models::ViolationRecord;
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::warn;

const LINE_SHAPE: &str = r"^(?P<path>.+?):(?P<line>\d+):(?P<col>\d+): (?P<code>[A-Z]+\d+) (?P<msg>.*)$";

/// Subprocess wrapper around the external linter.
pub struct Linter {
    command: Vec<String>,
}

impl Linter {
    /// `command` is the program plus fixed arguments; scanned paths are
    /// appended per invocation. Must be non-empty.
    pub fn new(command: Vec<String>) -> Self {
        debug_assert!(!command.is_empty());
        Linter { command }
    }

    /// Lint the given files, returning parsed violations in output order.
    pub fn lint_paths(&self, paths: &[PathBuf]) -> Result<Vec<ViolationRecord>> {
        if paths.is_empty() {
            return Ok(Vec::new());
        }
        let output = Command::new(&self.command[0])
            .args(&self.command[1..])
            .args(paths)
            .output()
            .map_err(|e| map_spawn_error(e, &self.command[0]))?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let records = parse_output(&stdout);
        if !output.status.success() && records.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.trim().is_empty() {
                return Err(LintfixError::LintExecution(stderr.trim().to_string()));
            }
        }
        Ok(records)
    }

    /// Convenience for the engine's post-write recount.
    pub fn lint_file(&self, path: &Path) -> Result<Vec<ViolationRecord>> {
        self.lint_paths(std::slice::from_ref(&path.to_path_buf()))
    }
}

/// Parse-only gate run against candidate content before it is written.
pub struct SyntaxChecker {
    command: Vec<String>,
}

impl SyntaxChecker {
    pub fn new(command: Vec<String>) -> Self {
        debug_assert!(!command.is_empty());
        SyntaxChecker { command }
    }

    /// Materialize `content` into a temp file and run the checker against
    /// it. `Ok(false)` is the expected rejection signal, not an error.
    pub fn check(&self, content: &str) -> Result<bool> {
        let mut tmp = tempfile::Builder::new()
            .prefix("lintfix-gate-")
            .suffix(".py")
            .tempfile()?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        let out = Command::new(&self.command[0])
            .args(&self.command[1..])
            .arg(tmp.path())
            .output()
            .map_err(|e| map_spawn_error(e, &self.command[0]))?;
        Ok(out.status.success())
    }
}

fn map_spawn_error(e: std::io::Error, program: &str) -> LintfixError {
    if e.kind() == std::io::ErrorKind::NotFound {
        LintfixError::ToolNotAvailable(program.to_string())
    } else {
        LintfixError::Io(e)
    }
}

/// Parse full linter stdout; malformed lines are warned about and skipped.
pub fn parse_output(stdout: &str) -> Vec<ViolationRecord> {
    let shape = Regex::new(LINE_SHAPE).unwrap();
    let mut records = Vec::new();
    for line in stdout.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line_with(&shape, line) {
            Some(rec) => records.push(rec),
            None => warn!(line, "unparseable linter output line skipped"),
        }
    }
    records
}

fn parse_line_with(shape: &Regex, line: &str) -> Option<ViolationRecord> {
    let caps = shape.captures(line)?;
    Some(ViolationRecord {
        file_path: caps["path"].to_string(),
        line: caps["line"].parse().ok()?,
        column: caps["col"].parse().ok()?,
        code: caps["code"].to_string(),
        message: caps["msg"].to_string(),
    })
}
