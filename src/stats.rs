use std::sync::atomic::{AtomicU64, Ordering};

/// Cumulative counters across excavation calls.
///
/// Relaxed atomics so a shared orchestrator stays sound; the reference
/// usage is single-threaded and the counts are advisory.
#[derive(Default)]
pub struct RunningStats {
    total_excavations: AtomicU64,
    valid_artifacts: AtomicU64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_excavations(&self) {
        self.total_excavations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_valid_artifacts(&self, count: u64) {
        self.valid_artifacts.fetch_add(count, Ordering::Relaxed);
    }

    pub fn excavations(&self) -> u64 {
        self.total_excavations.load(Ordering::Relaxed)
    }

    pub fn valid_artifacts(&self) -> u64 {
        self.valid_artifacts.load(Ordering::Relaxed)
    }

    /// Valid artifacts per excavation call. Can exceed 1.0 when a single
    /// call yields several valid artifacts.
    pub fn success_rate(&self) -> f64 {
        let total = self.excavations();
        if total == 0 {
            return 0.0;
        }
        self.valid_artifacts() as f64 / total as f64
    }

    pub fn reset(&self) {
        self.total_excavations.store(0, Ordering::Relaxed);
        self.valid_artifacts.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_are_zero() {
        let stats = RunningStats::new();
        assert_eq!(stats.excavations(), 0);
        assert_eq!(stats.valid_artifacts(), 0);
        assert_eq!(stats.success_rate(), 0.0);
    }

    #[test]
    fn counters_accumulate() {
        let stats = RunningStats::new();
        stats.inc_excavations();
        stats.inc_excavations();
        stats.add_valid_artifacts(3);

        assert_eq!(stats.excavations(), 2);
        assert_eq!(stats.valid_artifacts(), 3);
        assert_eq!(stats.success_rate(), 1.5);
    }

    #[test]
    fn reset_clears_everything() {
        let stats = RunningStats::new();
        stats.inc_excavations();
        stats.add_valid_artifacts(1);
        stats.reset();

        assert_eq!(stats.excavations(), 0);
        assert_eq!(stats.valid_artifacts(), 0);
        assert_eq!(stats.success_rate(), 0.0);
    }
}
