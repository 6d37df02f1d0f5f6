//! Terminal output for CLI scans: spinner, group listing and resolver notices.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::{Group, ResolveProgress, format_bytes};

const SEPARATOR: &str = "──────────────────────────────────────────────────";

/// Creates a spinner shown while links are extracted and probed.
pub fn make_spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
            .expect("spinner template is valid"),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Prints a message followed by a separator line.
pub fn print_header(message: &str) {
    eprintln!("{}", style(message).bold());
    eprintln!("{SEPARATOR}");
}

/// Prints the list of groups found by a scan.
pub fn print_groups(groups: &[Group]) {
    eprintln!("Found:");
    for group in groups {
        if group.is_dead {
            eprintln!("  {} {}", style("✗").red(), style(&group.name).dim());
            continue;
        }
        let count = group.files.len();
        eprintln!(
            "  {} {} ({count} file{}, {}, {})",
            style("✓").green(),
            group.name,
            if count == 1 { "" } else { "s" },
            format_bytes(group.total_size_bytes),
            group.host,
        );
    }
    eprintln!("{SEPARATOR}");
}

/// Writes resolver notices to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct CliProgress;

impl ResolveProgress for CliProgress {
    fn on_wait(&self, notice: &str) {
        eprintln!("  {}", style(notice).yellow());
    }

    fn on_countdown(&self) {
        eprintln!("  {}", style("Waiting for countdown...").yellow());
    }

    fn on_new_session(&self, _url: &str) {
        eprintln!("  Trying again with a new download session...");
    }

    fn on_give_up(&self, _url: &str) {
        eprintln!("  {}", style("Skipping. Servers might be down.").red());
    }
}
