//! Per-pass metrics for the scheduler.

/// Counters and timing collected during a single pass.
///
/// Durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PassMetrics {
    /// Wall-clock time for the entire pass.
    pub total_us: u64,
    /// Waves executed.
    pub iterations: usize,
    /// Gate updates invoked.
    pub updates: usize,
    /// Gate updates that returned an error.
    pub failures: usize,
    /// Wire winner changes observed during the pass.
    pub wire_changes: u64,
    /// Queue entries skipped because the gate was removed or no longer dirty.
    pub skipped_stale: usize,
}
