//! CLI output formatting for `once`, `normalize`, and `check`.
//!
//! Output leads with the candidate's identity (positional index, id, title);
//! URLs, dimensions, and failure details follow as indented context lines.
//!
//! # Output Format
//!
//! ## Once
//!
//! ```text
//! 001 1a2b3c Mein Titel
//!     Image: https://i.imgur.com/xyz.jpeg (900x1000)
//!     Media: 17895695668004550
//! 002 (no candidate)
//! 003 4d5e6f Anderer Titel
//!     Aborted at download: image download failed: HTTP 404 ...
//!
//! Published 1, aborted 1, empty 1
//! ```
//!
//! ## Normalize
//!
//! ```text
//! in.png 300x500 (ratio 0.60)
//!     Padded to 450x500 → out.png
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::imaging::AspectDecision;
use crate::pipeline::RunOutcome;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_title(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}...")
    }
}

// ============================================================================
// once
// ============================================================================

/// Format one pipeline outcome at 1-based position `index`.
pub fn format_run_outcome(index: usize, outcome: &RunOutcome) -> Vec<String> {
    let mut lines = Vec::new();
    match outcome {
        RunOutcome::NoCandidate => {
            lines.push(format!("{} (no candidate)", format_index(index)));
        }
        RunOutcome::Published { post, receipt } => {
            let (w, h) = post.dimensions();
            lines.push(format!(
                "{} {} {}",
                format_index(index),
                post.candidate().id,
                truncate_title(post.title(), 60)
            ));
            lines.push(format!("{}Image: {} ({w}x{h})", indent(1), post.image_ref()));
            match &receipt.media_id {
                Some(id) => lines.push(format!("{}Media: {id}", indent(1))),
                None => lines.push(format!("{}Media: (dry run)", indent(1))),
            }
        }
        RunOutcome::Aborted { candidate, error } => {
            lines.push(format!(
                "{} {} {}",
                format_index(index),
                candidate.id,
                truncate_title(&candidate.title, 60)
            ));
            lines.push(format!(
                "{}Aborted at {}: {error}",
                indent(1),
                error.stage()
            ));
        }
    }
    lines
}

/// Format a batch of outcomes followed by a totals line.
pub fn format_run_outcomes(outcomes: &[RunOutcome]) -> Vec<String> {
    let mut lines: Vec<String> = outcomes
        .iter()
        .enumerate()
        .flat_map(|(i, outcome)| format_run_outcome(i + 1, outcome))
        .collect();

    let (mut published, mut aborted, mut empty) = (0, 0, 0);
    for outcome in outcomes {
        match outcome {
            RunOutcome::Published { .. } => published += 1,
            RunOutcome::Aborted { .. } => aborted += 1,
            RunOutcome::NoCandidate => empty += 1,
        }
    }
    lines.push(String::new());
    lines.push(format!(
        "Published {published}, aborted {aborted}, empty {empty}"
    ));
    lines
}

pub fn print_run_outcomes(outcomes: &[RunOutcome]) {
    for line in format_run_outcomes(outcomes) {
        println!("{}", line);
    }
}

// ============================================================================
// normalize
// ============================================================================

/// Format the result of normalizing a local file.
pub fn format_normalize(
    input: &Path,
    output: &Path,
    original: (u32, u32),
    decision: AspectDecision,
) -> Vec<String> {
    let (w, h) = original;
    let ratio = w as f64 / h as f64;
    let mut lines = vec![format!("{} {w}x{h} (ratio {ratio:.2})", input.display())];
    match decision {
        AspectDecision::Accepted => lines.push(format!(
            "{}Within range, copied unchanged → {}",
            indent(1),
            output.display()
        )),
        AspectDecision::Resize { width, height } => lines.push(format!(
            "{}Padded to {width}x{height} → {}",
            indent(1),
            output.display()
        )),
    }
    lines
}

pub fn print_normalize(input: &Path, output: &Path, original: (u32, u32), decision: AspectDecision) {
    for line in format_normalize(input, output, original, decision) {
        println!("{}", line);
    }
}

// ============================================================================
// check
// ============================================================================

/// Format the `check` report: config source, ledger size, slot count, and
/// any settings still missing before real posting.
pub fn format_check(
    config_path: &Path,
    config_found: bool,
    ledger_path: &Path,
    ledger_len: usize,
    daily_posts: u32,
    missing: &[&str],
) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push("Config".to_string());
    if config_found {
        lines.push(format!("{}{}", indent(1), config_path.display()));
    } else {
        lines.push(format!(
            "{}{} (not found, using defaults)",
            indent(1),
            config_path.display()
        ));
    }
    lines.push("Ledger".to_string());
    lines.push(format!(
        "{}{} ({ledger_len} ids)",
        indent(1),
        ledger_path.display()
    ));
    lines.push("Schedule".to_string());
    lines.push(format!("{}{daily_posts} posts per day", indent(1)));
    if !missing.is_empty() {
        lines.push("Missing".to_string());
        for key in missing {
            lines.push(format!("{}{key}", indent(1)));
        }
    }
    lines
}

pub fn print_check(
    config_path: &Path,
    config_found: bool,
    ledger_path: &Path,
    ledger_len: usize,
    daily_posts: u32,
    missing: &[&str],
) {
    for line in format_check(
        config_path,
        config_found,
        ledger_path,
        ledger_len,
        daily_posts,
        missing,
    ) {
        println!("{}", line);
    }
}
