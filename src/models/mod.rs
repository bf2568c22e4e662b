//! Shared data models for violations, patterns, correction attempts, and
//! scan sessions.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
/// A single linter finding. Produced fresh on every lint pass, never persisted.
pub struct ViolationRecord {
    pub file_path: String,
    pub line: usize,
    pub column: usize,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
/// A stored regex rule mapping a violation code to a text transformation.
///
/// `code` + `match_regex` is unique per entry; counters only ever grow.
pub struct CorrectionPattern {
    pub id: i64,
    pub code: String,
    pub match_regex: String,
    pub replacement_template: String,
    pub description: String,
    pub success_count: u64,
    pub failure_count: u64,
}

#[derive(Debug, Clone, Serialize)]
/// One attempted correction of one violation. Append-only.
pub struct CorrectionAttempt {
    pub file_path: String,
    pub code: String,
    pub pattern_id: Option<i64>,
    pub applied: bool,
    pub resulting_violation_count: usize,
}

#[derive(Debug, Clone, Serialize)]
/// One orchestrator run, created at start and finalized at end.
pub struct ScanSession {
    pub session_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub files_scanned: usize,
    pub violations_before: usize,
    pub violations_after: usize,
}

impl ScanSession {
    /// Start a new session with an id derived from the current UTC time.
    pub fn start(now: DateTime<Utc>) -> Self {
        ScanSession {
            session_id: format!("scan-{}", now.format("%Y%m%d-%H%M%S")),
            start_time: now,
            end_time: None,
            files_scanned: 0,
            violations_before: 0,
            violations_after: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
/// Outcome of a whole scan, consumed by printers and the report writer.
pub struct ScanOutcome {
    pub session: ScanSession,
    pub attempts: Vec<CorrectionAttempt>,
    pub initial: Vec<ViolationRecord>,
    pub remaining: Vec<ViolationRecord>,
    pub iterations: usize,
    pub converged: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_session_id_format() {
        let t = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let s = ScanSession::start(t);
        assert_eq!(s.session_id, "scan-20260314-092653");
        assert!(s.end_time.is_none());
    }
}
