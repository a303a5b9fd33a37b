use indicatif::{ProgressBar, ProgressStyle};
use sample_vault_core::ProgressReporter;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const TICKS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Folder import progress for the console.
///
/// - Walk phase: spinner (candidate count unknown upfront)
/// - Hash phase: progress bar over the candidates
/// - Store phase: progress bar, one file at a time
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        self.bar.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.lock();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        if let Some(pb) = self.lock().take() {
            pb.finish_and_clear();
        }
    }

    fn counting_bar(label: &str, total: usize) -> ProgressBar {
        let pb = ProgressBar::new(total as u64);
        let template = format!(
            "  {{spinner:.cyan}} {} [{{bar:30.cyan/dim}}] {{pos}}/{{len}} files ({{eta}} remaining)",
            label
        );
        pb.set_style(
            ProgressStyle::with_template(&template)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("━╸─")
                .tick_chars(TICKS),
        );
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }

    /// Advances the current bar, creating it on the first update of a phase.
    fn advance(&self, label: &str, done: usize, total: usize) {
        let mut guard = self.lock();
        let pb = guard.get_or_insert_with(|| Self::counting_bar(label, total));
        if pb.length() != Some(total as u64) {
            pb.set_length(total as u64);
        }
        pb.set_position(done as u64);
    }
}

impl Default for CliReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for CliReporter {
    fn on_walk_start(&self, folder: &str) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars(TICKS),
        );
        pb.set_message(format!("Walking {}...", folder));
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_walk_complete(&self, candidates: usize) {
        self.finish_bar();
        eprintln!("  \x1b[32m✓\x1b[0m Found {} candidate files", candidates);
    }

    fn on_hash_progress(&self, files_hashed: usize, total_files: usize) {
        self.advance("Hashing", files_hashed, total_files);
    }

    fn on_hash_complete(&self, total_files: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Hashed {} files in {:.2}s",
            total_files, duration_secs
        );
    }

    fn on_store_progress(&self, files_stored: usize, total_files: usize) {
        self.advance("Storing", files_stored, total_files);
    }

    fn on_store_complete(&self, stored: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Stored {} new files in {:.2}s",
            stored, duration_secs
        );
    }
}
