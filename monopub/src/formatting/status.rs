use comfy_table::{Cell, Color};
use owo_colors::OwoColorize;

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message.green().bold());
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow(), message.yellow().bold());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.red().bold());
}

/// Outcome of one package in a release run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageStatus {
    /// Would be published; dry run.
    Planned,
    Published,
    Unchanged,
    /// A dependency failed to publish.
    Skipped,
    Failed,
    /// Published, but a post-publish step failed.
    PostPublishFailed,
}

impl PackageStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PackageStatus::Planned => "planned",
            PackageStatus::Published => "published",
            PackageStatus::Unchanged => "unchanged",
            PackageStatus::Skipped => "skipped",
            PackageStatus::Failed => "failed",
            PackageStatus::PostPublishFailed => "published, post-publish failed",
        }
    }

    pub fn cell(&self) -> Cell {
        let color = match self {
            PackageStatus::Planned => Color::Cyan,
            PackageStatus::Published => Color::Green,
            PackageStatus::Unchanged => Color::DarkGrey,
            PackageStatus::Skipped => Color::Yellow,
            PackageStatus::Failed => Color::Red,
            PackageStatus::PostPublishFailed => Color::Magenta,
        };
        Cell::new(self.label()).fg(color)
    }
}
