//! Report composition: a scan outcome summarized into one JSON artifact.
//!
//! Composition is a pure function of the recorded session data so it can
//! be asserted on directly in tests; writing the artifact is the only
//! side effect.

use crate::errors::Result;
use crate::models::{CorrectionPattern, ScanOutcome, ViolationRecord};
use serde_json::{json, Value as JsonVal};
use std::collections::BTreeMap;
use std::path::Path;

/// Build the report object for a finished scan. `patterns` supplies the
/// durable success/failure counters; only patterns that have ever been
/// exercised appear in the artifact.
pub fn compose_report(outcome: &ScanOutcome, patterns: &[CorrectionPattern]) -> JsonVal {
    let before = count_by_code(&outcome.initial);
    let after = count_by_code(&outcome.remaining);
    let mut codes: Vec<&String> = before.keys().chain(after.keys()).collect();
    codes.sort();
    codes.dedup();

    let mut by_code = serde_json::Map::new();
    for code in codes {
        by_code.insert(
            code.clone(),
            json!({
                "before": before.get(code).copied().unwrap_or(0),
                "after": after.get(code).copied().unwrap_or(0),
            }),
        );
    }

    let mut pattern_stats = serde_json::Map::new();
    for p in patterns {
        if p.success_count + p.failure_count == 0 {
            continue;
        }
        pattern_stats.insert(
            p.id.to_string(),
            json!({
                "code": p.code,
                "description": p.description,
                "success_count": p.success_count,
                "failure_count": p.failure_count,
            }),
        );
    }

    json!({
        "session_id": outcome.session.session_id,
        "start_time": outcome.session.start_time.to_rfc3339(),
        "end_time": outcome.session.end_time.map(|t| t.to_rfc3339()),
        "violations_before": outcome.session.violations_before,
        "violations_after": outcome.session.violations_after,
        "corrections_applied": outcome.attempts.iter().filter(|a| a.applied).count(),
        "by_code": JsonVal::Object(by_code),
        "patterns": JsonVal::Object(pattern_stats),
    })
}

/// Write the artifact, creating parent directories as needed.
pub fn write_report(path: &Path, report: &JsonVal) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut text = serde_json::to_string_pretty(report).unwrap_or_default();
    text.push('\n');
    std::fs::write(path, text)?;
    Ok(())
}

fn count_by_code(violations: &[ViolationRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for v in violations {
        *counts.entry(v.code.clone()).or_insert(0) += 1;
    }
    counts
}
