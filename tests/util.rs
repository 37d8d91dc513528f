//! Shared test utilities for integration tests
//!
//! Fixture creation and binary helpers used across the CLI test files.

#![allow(dead_code)]

use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use assert_cmd::Command;

/// Temp project root with a corpus file holding `lines`, one per line.
pub fn corpus_fixture(lines: &[&str]) -> assert_fs::TempDir
{
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    let mut body = String::new();
    for line in lines
    {
        body.push_str(line);
        body.push('\n');
    }

    tmp.child("corpus.txt")
        .write_str(&body)
        .expect("write corpus");

    tmp
}

/// `lcull` rooted in `dir` with colors and progress disabled.
pub fn lcull(dir: &std::path::Path) -> Command
{
    let mut cmd = Command::cargo_bin("lcull").expect("bin");
    cmd.current_dir(dir)
        .env_remove("LINECULL_LOG")
        .args(["--no-color"]);
    cmd
}

/// Parse every stdout line as JSON.
pub fn json_lines(stdout: &[u8]) -> Vec<serde_json::Value>
{
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("json line"))
        .collect()
}
