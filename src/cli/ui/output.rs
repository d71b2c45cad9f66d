use console::style;
use std::fmt::Display;

/// Styled terminal output for command results
pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    /// Aligned `label: value` row
    pub fn field(&self, label: &str, value: impl Display) {
        println!("  {:<18} {}", style(format!("{}:", label)).dim(), value);
    }

    pub fn item(&self, value: impl Display) {
        println!("  {} {}", style("•").dim(), value);
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
