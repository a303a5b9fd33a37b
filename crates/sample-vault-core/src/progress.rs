/// Trait for reporting folder import progress.
///
/// The console implements it with indicatif; everything else uses [`SilentReporter`].
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_walk_start(&self, _folder: &str) {}
    fn on_walk_complete(&self, _candidates: usize) {}
    fn on_hash_progress(&self, _files_hashed: usize, _total_files: usize) {}
    fn on_hash_complete(&self, _total_files: usize, _duration_secs: f64) {}
    fn on_store_progress(&self, _files_stored: usize, _total_files: usize) {}
    fn on_store_complete(&self, _stored: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
