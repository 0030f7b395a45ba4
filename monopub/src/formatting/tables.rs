//! Table formatting using comfy-table.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use monopub_core::{ReleaseReport, ReleaseType, Version};

use super::PackageStatus;

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .set_header(
            headers
                .iter()
                .map(|header| Cell::new(*header).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        )
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn version_cell(version: Option<Version>) -> Cell {
    match version {
        Some(version) => Cell::new(version.to_string()),
        None => Cell::new("(none)").fg(Color::DarkGrey),
    }
}

fn release_type_cell(release_type: ReleaseType) -> Cell {
    let color = match release_type {
        ReleaseType::Major => Color::Red,
        ReleaseType::Minor => Color::Yellow,
        ReleaseType::Patch => Color::Green,
        ReleaseType::None => Color::DarkGrey,
    };
    Cell::new(release_type.as_str().to_uppercase()).fg(color)
}

fn status(report: &ReleaseReport, name: &str, changed: bool) -> PackageStatus {
    let contains = |names: &[String]| names.iter().any(|n| n == name);
    if !changed {
        PackageStatus::Unchanged
    } else if contains(&report.failed) {
        PackageStatus::Failed
    } else if contains(&report.skipped) {
        PackageStatus::Skipped
    } else if contains(&report.post_publish_failed) {
        PackageStatus::PostPublishFailed
    } else if contains(&report.published) {
        PackageStatus::Published
    } else {
        PackageStatus::Planned
    }
}

/// One row per planned package, in release order.
pub fn print_release_table(report: &ReleaseReport) {
    let mut table = new_table(&["Package", "Current", "Next", "Type", "Commits", "Status"]);

    for entry in report.plan.entries.values() {
        table.add_row(vec![
            Cell::new(&entry.name).fg(Color::White),
            version_cell(entry.old_version),
            version_cell(entry.new_version).fg(Color::Cyan),
            release_type_cell(entry.release_type),
            Cell::new(entry.commits.len()),
            status(report, &entry.name, entry.is_changed()).cell(),
        ]);
    }

    println!("{}", table);
}

/// One row per batch; packages in a batch have no dependencies on each other.
pub fn print_batches_table(batches: &[Vec<&str>]) {
    let mut table = new_table(&["Batch", "Packages"]);

    for (index, batch) in batches.iter().enumerate() {
        table.add_row(vec![
            Cell::new(index + 1).fg(Color::Cyan),
            Cell::new(batch.join(", ")),
        ]);
    }

    println!("{}", table);
}
