// Performance metrics module
//
// Provides lightweight metrics tracking for monitoring query and sort
// performance.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Per-game-handle performance metrics.
///
/// Uses atomic operations for metric tracking without locks. Metrics are
/// collected over the life of the game handle and can be logged on
/// teardown for performance analysis.
#[derive(Debug)]
pub struct Metrics {
    /// Condition evaluations answered from the cache
    condition_cache_hits: AtomicU64,

    /// Condition evaluations that had to parse and resolve
    condition_cache_misses: AtomicU64,

    /// Total number of plugin files loaded into the cache
    plugins_loaded: AtomicUsize,

    /// Number of completed sorts
    sorts_completed: AtomicU64,

    /// Total time spent sorting in milliseconds
    total_sort_time_ms: AtomicU64,

    /// Handle creation time
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            condition_cache_hits: AtomicU64::new(0),
            condition_cache_misses: AtomicU64::new(0),
            plugins_loaded: AtomicUsize::new(0),
            sorts_completed: AtomicU64::new(0),
            total_sort_time_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_condition_cache_hit(&self) {
        self.condition_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_condition_cache_miss(&self) {
        self.condition_cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_plugin_loaded(&self) {
        self.plugins_loaded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sort(&self, duration: Duration) {
        self.sorts_completed.fetch_add(1, Ordering::Relaxed);
        self.total_sort_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn condition_cache_hits(&self) -> u64 {
        self.condition_cache_hits.load(Ordering::Relaxed)
    }

    pub fn condition_cache_misses(&self) -> u64 {
        self.condition_cache_misses.load(Ordering::Relaxed)
    }

    pub fn plugins_loaded(&self) -> usize {
        self.plugins_loaded.load(Ordering::Relaxed)
    }

    pub fn sorts_completed(&self) -> u64 {
        self.sorts_completed.load(Ordering::Relaxed)
    }

    /// Get total uptime of the owning game handle
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Get average sort time in milliseconds
    pub fn avg_sort_time_ms(&self) -> f64 {
        let total = self.total_sort_time_ms.load(Ordering::Relaxed);
        let count = self.sorts_completed.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Performance Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Conditions: {} cache hits, {} misses",
            self.condition_cache_hits(),
            self.condition_cache_misses()
        );
        tracing::info!("Plugins loaded: {}", self.plugins_loaded());
        tracing::info!(
            "Sorts: {} completed (avg: {:.2}ms)",
            self.sorts_completed(),
            self.avg_sort_time_ms()
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
