//! Output formatting for the CLI.

use crate::db::{ConnectTarget, Row};
use crate::inspect::TableSummary;
use crate::schema::InitReport;
use serde::Serialize;
use std::fmt::Write;

pub fn format_connected(target: &ConnectTarget, version: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "✓ Successfully connected to {} server version {}",
        target.dialect(),
        version
    );
    match target.database() {
        Some(db) => {
            let _ = write!(out, "✓ Connected to database: {}", db.as_str());
        }
        None => {
            let _ = write!(out, "✓ Connected to {}", target);
        }
    }
    out
}

pub fn format_init_report(report: &InitReport) -> String {
    let mut out = String::new();
    if let Some(db) = &report.database {
        let _ = writeln!(out, "✓ Database '{}' created or already exists", db);
    }
    for table in &report.tables {
        let _ = writeln!(out, "✓ Table '{}' created", table);
    }
    let _ = writeln!(
        out,
        "✓ Sample disease data inserted ({} new, {} already present)",
        report.seeds_inserted, report.seeds_skipped
    );
    let _ = write!(out, "\n✓ Database initialization completed successfully!");
    out
}

pub fn format_summary(summary: &TableSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total {}: {}", summary.table, summary.row_count);

    let _ = writeln!(out, "\nSample {}:", summary.table);
    if summary.sample.is_empty() {
        let _ = writeln!(out, "  (no rows)");
    }
    for row in &summary.sample {
        let _ = writeln!(out, "  - {}", format_row_inline(row));
    }

    let _ = writeln!(out, "\n{} table columns:", capitalize(summary.table.name()));
    for column in &summary.columns {
        let _ = writeln!(out, "  - {} ({})", column.name, column.data_type);
    }
    out
}

pub fn format_rows(rows: &[Row]) -> String {
    if rows.is_empty() {
        return "(no rows)".to_string();
    }
    rows.iter()
        .map(format_row_inline)
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_row_inline(row: &Row) -> String {
    row.columns()
        .iter()
        .zip(row.values())
        .map(|(c, v)| format!("{}={}", c, v))
        .collect::<Vec<_>>()
        .join(", ")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}
