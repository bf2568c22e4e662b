//! lintfix core library.
//!
//! A database-driven lint correction tool: an external linter reports
//! violations, stored regex patterns propose fixes, and a syntax-check
//! gate decides whether a fix may be written. Outcomes feed success
//! statistics back into the pattern store so better-performing patterns
//! are tried first.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `errors`: Error taxonomy shared across modules.
//! - `linter`: External linter adapter and the syntax-check gate.
//! - `store`: SQLite-backed pattern store with durable counters.
//! - `engine`: Pattern application with the pre-write syntax gate.
//! - `scan`: Lint/correct/relint orchestration until convergence.
//! - `report`: JSON report artifact composition.
//! - `models`: Data models for violations, patterns, attempts, sessions.
//! - `output`: Human/JSON printers.
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod linter;
pub mod models;
pub mod output;
pub mod report;
pub mod scan;
pub mod store;

#[cfg(test)]
pub mod testutil;
