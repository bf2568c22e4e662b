//! Helpers for tests that need fake subprocess collaborators.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Write an executable `sh` script into `dir` and return its path. Used to
/// stand in for the linter and the syntax checker without requiring a
/// Python toolchain.
pub fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

/// A linter script that reports E501 at column 80 for every line longer
/// than 79 characters, mirroring flake8's output shape.
pub fn length_linter(dir: &Path) -> PathBuf {
    fake_tool(
        dir,
        "lenlint",
        r#"awk 'length($0) > 79 { printf "%s:%d:80: E501 line too long (%d > 79 characters)\n", FILENAME, FNR, length($0) }' "$@""#,
    )
}

/// A linter script that never reports anything.
pub fn silent_linter(dir: &Path) -> PathBuf {
    fake_tool(dir, "oklint", "exit 0")
}

/// A syntax checker that accepts everything.
pub fn permissive_checker(dir: &Path) -> PathBuf {
    fake_tool(dir, "okcheck", "exit 0")
}

pub fn cmd(path: &Path) -> Vec<String> {
    vec![path.to_string_lossy().to_string()]
}
