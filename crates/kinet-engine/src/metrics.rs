//! Dispatch metrics for the session runtime.
//!
//! [`DispatchMetrics`] captures cumulative counters and last-call timing,
//! populated by the session after each broadcast or scatter; consumers
//! read them via [`Session::metrics()`](crate::session::Session::metrics).

/// Counters collected across a session's dispatched calls.
///
/// Durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchMetrics {
    /// Number of broadcast/scatter invocations.
    pub calls: u64,
    /// Cumulative per-rank replies collected.
    pub replies: u64,
    /// Cumulative `Skipped` outcomes (sub-group exclusion no-ops).
    pub skipped: u64,
    /// Cumulative `Failed` outcomes.
    pub failures: u64,
    /// Wall-clock time of the most recent call, in microseconds.
    pub last_call_us: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = DispatchMetrics::default();
        assert_eq!(m.calls, 0);
        assert_eq!(m.replies, 0);
        assert_eq!(m.skipped, 0);
        assert_eq!(m.failures, 0);
        assert_eq!(m.last_call_us, 0);
    }
}
