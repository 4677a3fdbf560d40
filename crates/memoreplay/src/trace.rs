//! Request trace files: one key per line

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Split trace contents into keys, skipping blank lines
pub fn parse_trace(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read and parse a trace file
pub fn read_trace(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read trace file {:?}", path))?;
    Ok(parse_trace(&contents))
}
