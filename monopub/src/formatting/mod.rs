//! Terminal output for the CLI.

mod status;
mod tables;

use owo_colors::OwoColorize;

pub use status::{print_error, print_success, print_warning, PackageStatus};
pub use tables::{print_batches_table, print_release_table};

pub fn print_section_header(title: &str) {
    println!("{}", title.cyan().bold());
    println!();
}

pub fn print_key_value(key: &str, value: &str) {
    println!("  {} {}", key.bright_black().bold(), value.bold().white());
}

/// Prints `items` one per line, or `(none)`.
pub fn print_name_list(items: &[&str]) {
    if items.is_empty() {
        println!("  {} {}", "→".cyan(), "(none)".bright_black());
        return;
    }
    for item in items {
        println!("  {} {}", "→".cyan(), item.bold().white());
    }
}
