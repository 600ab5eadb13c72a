//! Display utilities for the transfer progress bar and formatting helpers.

use console::{Term, style};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

use se_io::{CiEnvironment, ProgressCallback};

/// Progress styles used while an artifact is transferred.
pub struct ProgressStyles {
    pub download: ProgressStyle,
    pub spinner: ProgressStyle,
}

impl Default for ProgressStyles {
    fn default() -> Self {
        Self {
            download: ProgressStyle::default_bar()
                .template(
                    "    {prefix:<24} {bar:25.cyan/dim} {bytes:>10}/{total_bytes:<10} {eta:>6}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("━━╸"),
            spinner: ProgressStyle::default_spinner()
                .template("    {prefix:<24} {spinner:.cyan} {bytes:>10}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        }
    }
}

/// Progress bars only make sense on an interactive terminal outside CI logs.
pub fn should_show_progress(ci: &CiEnvironment) -> bool {
    !ci.is_ci && Term::stdout().is_term()
}

/// Create a progress callback that drives a single bar for `name`.
///
/// The bar starts as a spinner and switches to a bounded bar once the server
/// reports a content length.
pub fn create_progress_callback(name: &str, styles: ProgressStyles) -> (ProgressCallback, ProgressBar) {
    let bar = ProgressBar::new_spinner();
    bar.set_style(styles.spinner);
    bar.set_prefix(name.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));

    let bar_clone = bar.clone();
    let download_style = styles.download;
    let callback: ProgressCallback = Arc::new(move |downloaded, total| {
        if let Some(total) = total
            && bar_clone.length() != Some(total)
        {
            bar_clone.set_length(total);
            bar_clone.set_style(download_style.clone());
        }
        bar_clone.set_position(downloaded);
    });

    (callback, bar)
}

pub fn print_step(message: impl std::fmt::Display) {
    println!("{} {}", style("==>").cyan().bold(), message);
}

/// Print a CI diagnostic. Workflow commands are only recognised on stdout.
pub fn print_diagnostic(ci: &CiEnvironment, line: &str) {
    if ci.is_ci {
        println!("{line}");
    } else {
        eprintln!("{line}");
    }
}

/// Format bytes into a human-readable string (e.g., "1.5 GB").
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
