//! Pattern Store: SQLite-backed persistence for correction patterns plus
//! append-only session/attempt history.
//!
//! The schema is owned by `PatternStore::open` and created there once;
//! nothing else in the crate issues DDL. Counter updates are single atomic
//! UPDATE statements so they stay correct even if several processes share
//! one database file.

use crate::errors::{LintfixError, Result};
use crate::models::{CorrectionAttempt, CorrectionPattern, ScanSession};
use rusqlite::{params, Connection};
use std::path::Path;

/// Persistent store for `CorrectionPattern` rows and scan history.
pub struct PatternStore {
    conn: Connection,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS patterns (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT NOT NULL,
    match_regex TEXT NOT NULL,
    replacement_template TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    success_count INTEGER NOT NULL DEFAULT 0,
    failure_count INTEGER NOT NULL DEFAULT 0,
    UNIQUE(code, match_regex)
);
CREATE TABLE IF NOT EXISTS sessions (
    session_id TEXT PRIMARY KEY,
    start_time TEXT NOT NULL,
    end_time TEXT,
    files_scanned INTEGER NOT NULL,
    violations_before INTEGER NOT NULL,
    violations_after INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS attempts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL,
    file_path TEXT NOT NULL,
    code TEXT NOT NULL,
    pattern_id INTEGER,
    applied INTEGER NOT NULL,
    resulting_violation_count INTEGER NOT NULL
);
"#;

impl PatternStore {
    /// Open (or create) the store at `path`, creating parent directories
    /// and the schema as needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(PatternStore { conn })
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(PatternStore { conn })
    }

    /// Register a new pattern. Rejects an uncompilable regex and a second
    /// entry for the same (code, match_regex) pair.
    pub fn add_pattern(
        &self,
        code: &str,
        match_regex: &str,
        replacement_template: &str,
        description: &str,
    ) -> Result<i64> {
        if let Err(e) = regex::Regex::new(match_regex) {
            return Err(LintfixError::InvalidRegex {
                regex: match_regex.to_string(),
                source: e,
            });
        }
        let res = self.conn.execute(
            "INSERT INTO patterns (code, match_regex, replacement_template, description)
             VALUES (?1, ?2, ?3, ?4)",
            params![code, match_regex, replacement_template, description],
        );
        match res {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(LintfixError::DuplicatePattern {
                    code: code.to_string(),
                    regex: match_regex.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All patterns registered for `code`, best historical performer first.
    /// An empty result is normal, not an error.
    pub fn get_patterns_for_code(&self, code: &str) -> Result<Vec<CorrectionPattern>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, code, match_regex, replacement_template, description,
                    success_count, failure_count
             FROM patterns WHERE code = ?1
             ORDER BY success_count DESC, id ASC",
        )?;
        let rows = stmt.query_map(params![code], row_to_pattern)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// All patterns, grouped by code then ordering as in
    /// `get_patterns_for_code`.
    pub fn list_patterns(&self) -> Result<Vec<CorrectionPattern>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, code, match_regex, replacement_template, description,
                    success_count, failure_count
             FROM patterns ORDER BY code ASC, success_count DESC, id ASC",
        )?;
        let rows = stmt.query_map([], row_to_pattern)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Atomically bump one counter for a pattern. Counters never decrease.
    pub fn record_outcome(&self, pattern_id: i64, success: bool) -> Result<()> {
        let sql = if success {
            "UPDATE patterns SET success_count = success_count + 1 WHERE id = ?1"
        } else {
            "UPDATE patterns SET failure_count = failure_count + 1 WHERE id = ?1"
        };
        self.conn.execute(sql, params![pattern_id])?;
        Ok(())
    }

    /// Append one attempt row for a session.
    pub fn record_attempt(&self, session_id: &str, attempt: &CorrectionAttempt) -> Result<()> {
        self.conn.execute(
            "INSERT INTO attempts
                 (session_id, file_path, code, pattern_id, applied, resulting_violation_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session_id,
                attempt.file_path,
                attempt.code,
                attempt.pattern_id,
                attempt.applied,
                attempt.resulting_violation_count as i64,
            ],
        )?;
        Ok(())
    }

    /// Persist a finalized session.
    pub fn record_session(&self, session: &ScanSession) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO sessions
                 (session_id, start_time, end_time, files_scanned,
                  violations_before, violations_after)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session.session_id,
                session.start_time.to_rfc3339(),
                session.end_time.map(|t| t.to_rfc3339()),
                session.files_scanned as i64,
                session.violations_before as i64,
                session.violations_after as i64,
            ],
        )?;
        Ok(())
    }

    /// Insert the built-in pattern set, skipping entries already present.
    /// Returns how many rows were actually inserted.
    pub fn seed_default_patterns(&self) -> Result<usize> {
        let mut inserted = 0;
        for (code, regex, template, description) in DEFAULT_PATTERNS {
            let n = self.conn.execute(
                "INSERT OR IGNORE INTO patterns
                     (code, match_regex, replacement_template, description)
                 VALUES (?1, ?2, ?3, ?4)",
                params![code, regex, template, description],
            )?;
            inserted += n;
        }
        Ok(inserted)
    }
}

fn row_to_pattern(row: &rusqlite::Row<'_>) -> rusqlite::Result<CorrectionPattern> {
    Ok(CorrectionPattern {
        id: row.get(0)?,
        code: row.get(1)?,
        match_regex: row.get(2)?,
        replacement_template: row.get(3)?,
        description: row.get(4)?,
        success_count: row.get::<_, i64>(5)? as u64,
        failure_count: row.get::<_, i64>(6)? as u64,
    })
}

/// Built-in correction rules for common flake8 codes. Replacement templates
/// use `${name}` capture references; an empty template deletes the line.
const DEFAULT_PATTERNS: &[(&str, &str, &str, &str)] = &[
    (
        "E501",
        r"^(?P<indent>\s*)(?P<head>.{1,70}?\()(?P<tail>.+)$",
        "${indent}${head}\n${indent}    ${tail}",
        "wrap long line after the first opening parenthesis",
    ),
    (
        "W291",
        r"^(?P<line>.*?)[ \t]+$",
        "${line}",
        "strip trailing whitespace",
    ),
    (
        "W293",
        r"^[ \t]+$",
        "",
        "remove whitespace-only blank line",
    ),
    (
        "F401",
        r"^\s*(?:from\s+\S+\s+)?import\s+.*$",
        "",
        "delete unused import line",
    ),
    (
        "F401",
        r"^(?P<line>\s*(?:from\s+\S+\s+)?import\s+.*?)\s*$",
        "${line}  # noqa: F401",
        "suppress unused import with noqa",
    ),
    (
        "E711",
        r"==\s*None",
        "is None",
        "compare to None with is",
    ),
    (
        "E711",
        r"!=\s*None",
        "is not None",
        "compare to None with is not",
    ),
    (
        "E712",
        r"==\s*True",
        "is True",
        "compare to True with is",
    ),
    (
        "E712",
        r"==\s*False",
        "is False",
        "compare to False with is",
    ),
    (
        "E302",
        r"^(?P<line>(?:def|class)\s.*)$",
        "\n${line}",
        "insert blank line before top-level definition",
    ),
];
