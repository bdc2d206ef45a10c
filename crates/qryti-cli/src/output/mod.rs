//! Terminal output formatting and utilities.
//!
//! This module provides consistent output formatting across all commands:
//! status lines, pretty-printed JSON and aligned tables.

pub mod colors;
pub mod errors;

use serde_json::Value;

use colors::ColorSupport;

/// Output handler for consistent terminal formatting
pub struct OutputHandler {
    colors: ColorSupport,
}

impl OutputHandler {
    /// Create a new output handler
    pub fn new() -> Self {
        Self {
            colors: ColorSupport::detect(),
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        println!("{}", self.colors.dim(message));
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        println!("{} {}", self.colors.green("✓"), message);
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", self.colors.yellow("⚠"), message);
    }

    /// Print a labelled value
    pub fn field(&self, label: &str, value: &str) {
        println!("{} {}", self.colors.bold(&format!("{}:", label)), value);
    }

    /// Print a JSON value
    pub fn json(&self, value: &Value) {
        println!("{}", render_json(value));
    }

    /// Print rows as a table with a header line
    pub fn table(&self, headers: &[&str], rows: &[Vec<String>]) {
        if rows.is_empty() {
            self.info("(none)");
            return;
        }
        let lines = render_table(headers, rows);
        if let Some((header, body)) = lines.split_first() {
            println!("{}", self.colors.bold(header));
            for line in body {
                println!("{}", line);
            }
        }
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}

pub fn render_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Lay out rows in columns padded to the widest cell
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let format_row = |cells: Vec<&str>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        padded.join("  ").trim_end().to_string()
    };

    let mut lines = vec![format_row(headers.to_vec())];
    for row in rows {
        lines.push(format_row(row.iter().map(String::as_str).collect()));
    }
    lines
}
