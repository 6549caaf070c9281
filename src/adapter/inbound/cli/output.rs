//! CLI output formatting.
//!
//! Human-readable lines and tables by default, one JSON document per command
//! with `--json`, and nothing but errors with `--quiet`.

use std::fmt::Display;
use std::sync::{OnceLock, RwLock};

use owo_colors::OwoColorize;
use serde_json::json;
use tabled::{Table, Tabled};

/// Runtime output configuration shared by CLI handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Emit machine-readable JSON output instead of human-readable text.
    pub json: bool,
    /// Suppress non-essential output.
    pub quiet: bool,
}

impl OutputConfig {
    #[must_use]
    pub const fn new(json: bool, quiet: bool) -> Self {
        Self { json, quiet }
    }
}

static OUTPUT_CONFIG: OnceLock<RwLock<OutputConfig>> = OnceLock::new();

fn config_cell() -> &'static RwLock<OutputConfig> {
    OUTPUT_CONFIG.get_or_init(|| RwLock::new(OutputConfig::default()))
}

fn read_config() -> OutputConfig {
    match config_cell().read() {
        Ok(config) => *config,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

fn write_config(config: OutputConfig) {
    match config_cell().write() {
        Ok(mut current) => *current = config,
        Err(poisoned) => *poisoned.into_inner() = config,
    }
}

/// Human output is off in JSON mode (the document replaces it) and in quiet mode.
fn human_output_suppressed(config: OutputConfig) -> bool {
    config.json || config.quiet
}

/// Apply output settings from global CLI flags.
pub fn configure(config: OutputConfig) {
    write_config(config);
}

#[must_use]
pub fn is_json() -> bool {
    read_config().json
}

/// Print a labeled value.
pub fn field(label: &str, value: impl Display) {
    if human_output_suppressed(read_config()) {
        return;
    }
    println!("  {:<14} {}", label.dimmed(), value);
}

/// Print a success line.
pub fn success(message: &str) {
    if human_output_suppressed(read_config()) {
        return;
    }
    println!("  {} {}", "✓".green(), message);
}

/// Print a warning line.
pub fn warning(message: &str) {
    if human_output_suppressed(read_config()) {
        return;
    }
    println!("  {} {}", "⚠".yellow(), message);
}

/// Print an error line. Always shown.
pub fn error(message: &str) {
    if read_config().json {
        eprintln!("{}", json!({ "error": message }));
        return;
    }
    eprintln!("  {} {}", "×".red(), message);
}

/// Print a section header.
pub fn section(title: &str) {
    if human_output_suppressed(read_config()) {
        return;
    }
    println!();
    println!("{}", title.bold());
}

/// Print a note/hint.
pub fn note(message: &str) {
    if human_output_suppressed(read_config()) {
        return;
    }
    println!("  {}", message.dimmed());
}

/// Render rows as a table.
pub fn table<T: Tabled>(rows: impl IntoIterator<Item = T>) {
    if human_output_suppressed(read_config()) {
        return;
    }
    let table = Table::new(rows).to_string();
    for line in table.lines() {
        println!("  {line}");
    }
}

/// Emit the command's JSON document when in JSON mode.
pub fn json_output(value: serde_json::Value) {
    if read_config().json {
        println!("{value}");
    }
}

/// Format a positive value in green.
pub fn positive(value: impl Display) -> String {
    format!("{}", value.to_string().green())
}

/// Format a highlighted value in cyan.
pub fn highlight(value: impl Display) -> String {
    format!("{}", value.to_string().cyan())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suppression_rules() {
        assert!(!human_output_suppressed(OutputConfig::new(false, false)));
        assert!(human_output_suppressed(OutputConfig::new(true, false)));
        assert!(human_output_suppressed(OutputConfig::new(false, true)));
    }
}
