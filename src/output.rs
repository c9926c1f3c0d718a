//! Output formatting and styling module.
//!
//! Everything the CLI shows the user goes through [`OutputFormatter`], so
//! colours, symbols and table layout can change in one place. Diagnostics go
//! through `tracing` instead and never pass through here.

use crate::file_organizer::{OrganizePlan, OrganizeReport};
use crate::walker::FileEntry;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::time::Duration;

/// Renders a byte count with a binary unit, e.g. `1.5 MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dirsweep::output::OutputFormatter;
    /// OutputFormatter::error("Failed to move file");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a spinner counting scanned files.
    ///
    /// indicatif hides it automatically when stderr is not a terminal.
    pub fn create_scan_spinner() -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner().template("{spinner:.cyan} {pos} files scanned");
        if let Ok(style) = style {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// Prints the largest-files ranking, biggest first.
    pub fn largest_files_table(files: &[FileEntry]) {
        Self::header("LARGEST FILES");

        if files.is_empty() {
            println!("No files found.");
            return;
        }

        let sizes: Vec<String> = files.iter().map(|entry| format_size(entry.size)).collect();
        let width = sizes.iter().map(String::len).max().unwrap_or(0).max(4);
        let rank_width = files.len().to_string().len();

        for (rank, (entry, size)) in files.iter().zip(&sizes).enumerate() {
            println!(
                "{:>rank_width$}. {:>width$}  {}",
                rank + 1,
                size.green(),
                entry.path.display(),
                rank_width = rank_width,
                width = width
            );
        }
    }

    /// Prints what an organize run would do.
    pub fn plan(plan: &OrganizePlan) {
        if plan.moves.is_empty() {
            Self::dry_run_notice("No files would be moved.");
        }
        for planned in &plan.moves {
            println!(
                " - {} {} {}",
                planned.source.display(),
                "→".cyan(),
                planned.destination.display()
            );
        }

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for planned in &plan.moves {
            *counts.entry(planned.category.as_str()).or_insert(0) += 1;
        }
        Self::summary_table(&counts, plan.moves.len());
        Self::unmatched(plan.unmatched.len());
    }

    /// Prints the outcome of an organize run.
    pub fn report(report: &OrganizeReport) {
        for moved in &report.moved {
            Self::success(&format!(
                "{} → {}/",
                moved.source.display(),
                moved.category
            ));
        }
        for (path, error) in &report.failed {
            Self::error(&format!("{}: {}", path.display(), error));
        }

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for moved in &report.moved {
            *counts.entry(moved.category.as_str()).or_insert(0) += 1;
        }
        Self::summary_table(&counts, report.moved.len());
        Self::unmatched(report.unmatched.len());

        if !report.failed.is_empty() {
            Self::warning(&format!(
                "{} {} could not be moved and were left in place.",
                report.failed.len(),
                plural(report.failed.len())
            ));
        }
    }

    fn unmatched(count: usize) {
        if count > 0 {
            Self::info(&format!(
                "{} {} matched no category and stayed put.",
                count,
                plural(count)
            ));
        }
    }

    /// Prints a summary table with file counts by category.
    pub fn summary_table(category_counts: &BTreeMap<&str, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let width = category_counts
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max(8); // At least "Category" width

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 10));

        for (category, count) in category_counts {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                plural(*count),
                width = width
            );
        }

        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files),
            width = width
        );
    }
}
