//! Output rendering for scan results and pattern listings.
//!
//! Supports `human` (default) and `json` outputs. The JSON form serializes
//! the full outcome; the human form prints applied corrections, one line
//! per file that could not be corrected, and a final summary.

use crate::models::{CorrectionPattern, ScanOutcome};
use owo_colors::OwoColorize;
use serde_json::Value as JsonVal;
use std::collections::BTreeMap;
use std::path::Path;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

/// Render a path relative to the scan root when possible.
fn rel(root: &Path, path: &str) -> String {
    pathdiff::diff_paths(path, root)
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

/// Print a finished scan in the requested format.
pub fn print_scan(outcome: &ScanOutcome, output: &str, root: &Path, dry_run: bool) {
    match output {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&compose_scan_json(outcome)).unwrap_or_default()
        ),
        _ => {
            let color = use_colors(output);
            let verb = if dry_run { "would fix:" } else { "fixed:" };
            for a in outcome.attempts.iter().filter(|a| a.applied) {
                let file = rel(root, &a.file_path);
                if color {
                    println!(
                        "{} {} {} (pattern {})",
                        "✔".green(),
                        verb.green().bold(),
                        file.bold(),
                        a.pattern_id.unwrap_or(0)
                    );
                } else {
                    println!("✔ {} {} (pattern {})", verb, file, a.pattern_id.unwrap_or(0));
                }
            }
            // One line per file with violations left over
            let mut stuck: BTreeMap<String, usize> = BTreeMap::new();
            for v in &outcome.remaining {
                *stuck.entry(rel(root, &v.file_path)).or_insert(0) += 1;
            }
            for (file, count) in &stuck {
                if color {
                    println!(
                        "{} {} {} ({} remaining)",
                        "✖".red(),
                        "uncorrected:".red().bold(),
                        file.bold(),
                        count
                    );
                } else {
                    println!("✖ uncorrected: {} ({} remaining)", file, count);
                }
            }
            let summary = format!(
                "— Summary — before={} after={} applied={} files={} iterations={}",
                outcome.session.violations_before,
                outcome.session.violations_after,
                outcome.attempts.iter().filter(|a| a.applied).count(),
                outcome.session.files_scanned,
                outcome.iterations
            );
            if color {
                println!("{}", summary.bold());
            } else {
                println!("{}", summary);
            }
        }
    }
}

/// Print registered patterns with their counters.
pub fn print_patterns(patterns: &[CorrectionPattern], output: &str) {
    match output {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::to_value(patterns).unwrap_or_default())
                .unwrap_or_default()
        ),
        _ => {
            let color = use_colors(output);
            for p in patterns {
                let header = format!("[{}] #{}", p.code, p.id);
                let counters = format!("ok={} fail={}", p.success_count, p.failure_count);
                if color {
                    println!(
                        "{} {} {} — {}",
                        header.bold(),
                        counters.bright_black(),
                        p.match_regex,
                        p.description
                    );
                } else {
                    println!("{} {} {} — {}", header, counters, p.match_regex, p.description);
                }
            }
            println!("— {} pattern(s)", patterns.len());
        }
    }
}

/// Compose scan JSON object (pure) for testing/snapshot purposes.
pub fn compose_scan_json(outcome: &ScanOutcome) -> JsonVal {
    serde_json::to_value(outcome).unwrap_or_default()
}
