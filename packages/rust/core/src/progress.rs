//! Progress reporting for batch imports.

use qabase_shared::BatchReport;

/// Progress callback for batch imports.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each parsed row has been submitted (or failed).
    fn row_processed(&self, current: usize, total: usize);
    /// Called when the import completes.
    fn done(&self, report: &BatchReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn row_processed(&self, _current: usize, _total: usize) {}
    fn done(&self, _report: &BatchReport) {}
}
