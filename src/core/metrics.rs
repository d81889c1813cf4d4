//! Buffer pool metrics
//!
//! Counters for watching render buffer reuse, in particular that every
//! acquired buffer comes back to the pool.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters kept by a [`BufferPool`](super::buffer_pool::BufferPool)
///
/// # Example
///
/// ```
/// use kv_logger::core::PoolMetrics;
///
/// let metrics = PoolMetrics::new();
/// metrics.record_acquired();
/// metrics.record_released();
///
/// assert_eq!(metrics.outstanding(), 0);
/// assert_eq!(metrics.acquired(), 1);
/// ```
#[derive(Debug)]
pub struct PoolMetrics {
    /// Buffers handed out
    acquired: AtomicU64,

    /// Buffers given back (reused or discarded)
    released: AtomicU64,

    /// Fresh allocations because the pool was empty
    allocated: AtomicU64,

    /// Released buffers not kept (pool full or buffer oversized)
    discarded: AtomicU64,
}

impl PoolMetrics {
    pub const fn new() -> Self {
        Self {
            acquired: AtomicU64::new(0),
            released: AtomicU64::new(0),
            allocated: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn acquired(&self) -> u64 {
        self.acquired.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn released(&self) -> u64 {
        self.released.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn allocated(&self) -> u64 {
        self.allocated.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }

    /// Buffers currently held by callers
    pub fn outstanding(&self) -> u64 {
        // Read released first so a concurrent release cannot underflow
        let released = self.released.load(Ordering::Acquire);
        let acquired = self.acquired.load(Ordering::Acquire);
        acquired.saturating_sub(released)
    }

    /// Share of acquisitions served from the pool (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been acquired yet.
    pub fn reuse_rate(&self) -> f64 {
        let acquired = self.acquired() as f64;
        if acquired == 0.0 {
            0.0
        } else {
            ((acquired - self.allocated() as f64) / acquired) * 100.0
        }
    }

    #[inline]
    pub fn record_acquired(&self) -> u64 {
        self.acquired.fetch_add(1, Ordering::AcqRel)
    }

    #[inline]
    pub fn record_released(&self) -> u64 {
        self.released.fetch_add(1, Ordering::AcqRel)
    }

    #[inline]
    pub fn record_allocated(&self) -> u64 {
        self.allocated.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_discarded(&self) -> u64 {
        self.discarded.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for PoolMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = PoolMetrics::new();
        assert_eq!(metrics.acquired(), 0);
        assert_eq!(metrics.released(), 0);
        assert_eq!(metrics.outstanding(), 0);
        assert_eq!(metrics.reuse_rate(), 0.0);
    }

    #[test]
    fn test_outstanding_tracks_balance() {
        let metrics = PoolMetrics::new();
        assert_eq!(metrics.record_acquired(), 0); // Returns previous value
        metrics.record_acquired();
        assert_eq!(metrics.outstanding(), 2);

        metrics.record_released();
        assert_eq!(metrics.outstanding(), 1);
    }

    #[test]
    fn test_reuse_rate() {
        let metrics = PoolMetrics::new();
        for _ in 0..4 {
            metrics.record_acquired();
        }
        metrics.record_allocated();

        let rate = metrics.reuse_rate();
        assert!((74.9..=75.1).contains(&rate), "Reuse rate was {}", rate);
    }
}
