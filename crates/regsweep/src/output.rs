//! Styled lines for the cleanup summary
//!
//! Errors and warnings go to stderr so `--json` output on stdout stays clean.

use console::style;

pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

pub fn info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Section title, preceded by a blank line
pub fn header(msg: &str) {
    println!("\n{}", style(msg).bold().underlined());
}

/// Indented `label: value` line
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}
