/// Standard output utilities for consistent command formatting
use crate::core::StageReport;
use colored::*;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color as TableColor, ContentArrangement, Table};
use std::path::Path;

/// Display a section header
pub fn section_header(title: &str) {
    println!("\n{}", title.bold().cyan());
}

/// Display a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Display an info message
pub fn info(message: &str) {
    println!("{} {}", "●".blue(), message);
}

/// Display a warning message
pub fn warning(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Display an empty/none indicator
pub fn empty(message: &str) {
    println!("{} {}", "◌".dimmed(), message);
}

/// Display a process/action message
pub fn action(message: &str) {
    println!("{} {}", "▶".cyan(), message);
}

/// Tree structure item
pub fn tree_item(is_last: bool, label: &str, value: Option<&str>) {
    let prefix = if is_last { "└─" } else { "├─" };
    if let Some(val) = value {
        println!("{} {}: {}", prefix.dimmed(), label, val);
    } else {
        println!("{} {}", prefix.dimmed(), label);
    }
}

/// Create a standard table with our preferred styling
pub fn create_standard_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Create a standard header cell
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .add_attribute(Attribute::Bold)
        .fg(TableColor::Cyan)
}

/// Format bytes with appropriate unit
pub fn format_size(bytes: u64) -> String {
    use humansize::{format_size as hs_format, BINARY};
    hs_format(bytes, BINARY)
}

/// Format a number with thousands separator
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}

/// Path followed by its size, when it exists
pub fn describe_file(path: &Path) -> String {
    match std::fs::metadata(path) {
        Ok(meta) => format!("{} ({})", path.display(), format_size(meta.len())),
        Err(_) => path.display().to_string(),
    }
}

/// Counts of one stage as a tree
pub fn stage_summary(report: &StageReport) {
    let mut items = vec![
        ("Records in".to_string(), format_number(report.records_in)),
        ("Records out".to_string(), format_number(report.records_out)),
    ];
    for (reason, count) in &report.dropped {
        items.push((format!("Dropped ({})", reason.replace('_', " ")), format_number(*count)));
    }
    for (key, value) in &report.details {
        items.push((key.replace('_', " "), value.clone()));
    }

    for (i, (label, value)) in items.iter().enumerate() {
        tree_item(i == items.len() - 1, label, Some(value));
    }
}

/// One row per stage, for `kestrel run`
pub fn stage_table(reports: &[StageReport]) -> Table {
    let mut table = create_standard_table();
    table.set_header(vec![
        header_cell("Stage"),
        header_cell("In"),
        header_cell("Out"),
        header_cell("Dropped"),
    ]);

    for report in reports {
        let dropped = if report.dropped.is_empty() {
            "-".to_string()
        } else {
            report
                .dropped
                .iter()
                .map(|(reason, n)| format!("{} {}", format_number(*n), reason.replace('_', " ")))
                .collect::<Vec<_>>()
                .join(", ")
        };
        table.add_row(vec![
            Cell::new(&report.stage),
            Cell::new(format_number(report.records_in)),
            Cell::new(format_number(report.records_out)),
            Cell::new(dropped),
        ]);
    }
    table
}
