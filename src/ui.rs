//! Terminal output helpers.
//!
//! ## Components
//!
//! - `Table` - Box-drawn table, used for the capability report
//! - `pause` - Blocks until the operator presses Enter
//! - `format_mb` - Human-readable sizes

use crate::capability::CapabilityReport;
use colored::*;
use std::cmp;
use std::io;

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    pub fn render(&self) -> String {
        if self.headers.is_empty() {
            return String::new();
        }

        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = cmp::max(widths[i], console::measure_text_width(cell));
            }
        }

        let sep = |left: &str, mid: &str, right: &str| -> String {
            let inner = widths
                .iter()
                .map(|w| "─".repeat(w + 2))
                .collect::<Vec<_>>()
                .join(mid);
            format!("  {}{}{}", left, inner, right)
        };
        let line = |cells: &[String]| -> String {
            let inner = cells
                .iter()
                .zip(&widths)
                .map(|(cell, w)| {
                    let pad = w.saturating_sub(console::measure_text_width(cell));
                    format!(" {}{} ", cell, " ".repeat(pad))
                })
                .collect::<Vec<_>>()
                .join("│");
            format!("  │{}│", inner)
        };

        let mut out = vec![sep("┌", "┬", "┐"), line(&self.headers), sep("├", "┼", "┤")];
        for row in &self.rows {
            out.push(line(row));
        }
        out.push(sep("└", "┴", "┘"));
        out.join("\n")
    }

    pub fn print(&self) {
        println!("{}", self.render());
    }
}

pub fn capability_table(report: &CapabilityReport) -> Table {
    let mut table = Table::new(&["Package", "Status"]);
    for (cap, present) in report.iter() {
        let status = if present {
            "installed".green().to_string()
        } else {
            "missing".red().to_string()
        };
        table.add_row(vec![cap.to_string(), status]);
    }
    table
}

/// Print `prompt` and wait for Enter.
pub fn pause(prompt: &str) -> io::Result<()> {
    let term = console::Term::stdout();
    term.write_line(&format!("\n{}", prompt.dimmed()))?;
    term.read_line()?;
    Ok(())
}

pub fn banner(title: &str) {
    let rule = "=".repeat(70);
    println!("{}", rule);
    println!("        {} - download package builder", title.bold());
    println!("{}", rule);
}

pub fn format_mb(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
}
