//! Reusable render buffers
//!
//! Backends render each record into a pooled `String`. A buffer is handed
//! out as a [`PooledBuffer`] guard that clears it and gives it back when
//! dropped, so early returns and `?` paths release it too.

use super::metrics::PoolMetrics;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::ops::{Deref, DerefMut};

/// Idle buffers kept by default
pub const DEFAULT_POOL_SIZE: usize = 64;

/// Initial capacity of a freshly allocated buffer
const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Buffers that grew past this are dropped instead of pooled
const MAX_RETAINED_CAPACITY: usize = 64 * 1024;

/// Lock-free pool of render buffers, safe for concurrent acquire and release
pub struct BufferPool {
    idle_tx: Sender<String>,
    idle_rx: Receiver<String>,
    metrics: PoolMetrics,
}

impl BufferPool {
    /// Create a pool keeping at most `max_idle` buffers around
    pub fn new(max_idle: usize) -> Self {
        let (idle_tx, idle_rx) = bounded(max_idle.max(1));
        Self {
            idle_tx,
            idle_rx,
            metrics: PoolMetrics::new(),
        }
    }

    /// Take a cleared buffer, allocating one if the pool is empty
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let buf = self.idle_rx.try_recv().unwrap_or_else(|_| {
            self.metrics.record_allocated();
            String::with_capacity(INITIAL_BUFFER_CAPACITY)
        });
        self.metrics.record_acquired();
        PooledBuffer {
            buf: Some(buf),
            pool: self,
        }
    }

    fn release(&self, mut buf: String) {
        buf.clear();
        if buf.capacity() > MAX_RETAINED_CAPACITY || self.idle_tx.try_send(buf).is_err() {
            self.metrics.record_discarded();
        }
        self.metrics.record_released();
    }

    /// Buffers waiting in the pool
    pub fn idle(&self) -> usize {
        self.idle_rx.len()
    }

    /// Buffers currently held by renderers
    pub fn outstanding(&self) -> u64 {
        self.metrics.outstanding()
    }

    pub fn metrics(&self) -> &PoolMetrics {
        &self.metrics
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("idle", &self.idle())
            .field("metrics", &self.metrics)
            .finish()
    }
}

/// A buffer on loan from a [`BufferPool`]
pub struct PooledBuffer<'a> {
    buf: Option<String>,
    pool: &'a BufferPool,
}

impl Deref for PooledBuffer<'_> {
    type Target = String;

    fn deref(&self) -> &String {
        // Only `Drop` takes the buffer out
        self.buf.as_ref().unwrap_or_else(|| unreachable!("buffer taken before drop"))
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut String {
        self.buf.as_mut().unwrap_or_else(|| unreachable!("buffer taken before drop"))
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.release(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_buffer_is_reused_and_cleared() {
        let pool = BufferPool::new(4);
        {
            let mut buf = pool.acquire();
            buf.push_str("hello");
        }
        assert_eq!(pool.idle(), 1);

        let buf = pool.acquire();
        assert!(buf.is_empty());
        assert!(buf.capacity() >= 5);
        assert_eq!(pool.metrics().allocated(), 1);
    }

    #[test]
    fn test_release_on_early_return() {
        fn render(pool: &BufferPool, fail: bool) -> Result<String, &'static str> {
            let mut buf = pool.acquire();
            buf.push_str("partial");
            if fail {
                return Err("boom");
            }
            Ok(buf.clone())
        }

        let pool = BufferPool::new(2);
        assert!(render(&pool, true).is_err());
        assert!(render(&pool, false).is_ok());
        assert_eq!(pool.outstanding(), 0);
        assert_eq!(pool.metrics().acquired(), 2);
    }

    #[test]
    fn test_full_pool_discards() {
        let pool = BufferPool::new(1);
        let a = pool.acquire();
        let b = pool.acquire();
        drop(a);
        drop(b);
        assert_eq!(pool.idle(), 1);
        assert_eq!(pool.metrics().discarded(), 1);
        assert_eq!(pool.outstanding(), 0);
    }

    #[test]
    fn test_oversized_buffer_is_not_retained() {
        let pool = BufferPool::new(4);
        {
            let mut buf = pool.acquire();
            buf.reserve(MAX_RETAINED_CAPACITY * 2);
        }
        assert_eq!(pool.idle(), 0);
        assert_eq!(pool.metrics().discarded(), 1);
    }

    #[test]
    fn test_concurrent_acquire_release() {
        let pool = Arc::new(BufferPool::new(8));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    for i in 0..200 {
                        let mut buf = pool.acquire();
                        buf.push_str(&format!("{}-{}", t, i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(pool.outstanding(), 0);
        assert_eq!(pool.metrics().acquired(), 1600);
        assert!(pool.idle() <= 8);
    }
}
