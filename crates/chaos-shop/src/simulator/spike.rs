//! Scratch allocations for memory-spike scenarios.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Allocation granularity.
pub const SPIKE_CHUNK_BYTES: usize = 64 * 1024;

/// Memory held for the lifetime of the value and released when it is dropped, whichever way
/// the owning scope exits.
///
/// Every buffer sharing one `in_use` counter draws from the same budget: a spike is granted
/// at most what the buffers already alive leave free, possibly nothing. The bytes are written,
/// not just reserved, so the spike shows up in resident memory.
#[derive(Debug)]
pub struct SpikeBuffer {
    chunks: Vec<Vec<u8>>,
    bytes: usize,
    in_use: Arc<AtomicUsize>,
}

impl SpikeBuffer {
    /// Claims up to `requested` bytes of `budget` in `in_use`, then allocates what was granted.
    /// The claim is held until drop.
    pub fn allocate(requested: usize, budget: usize, in_use: Arc<AtomicUsize>) -> Self {
        let grant = |held: usize| requested.min(budget.saturating_sub(held));
        let held = match in_use.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |held| {
            Some(held + grant(held))
        }) {
            Ok(held) | Err(held) => held,
        };
        let bytes = grant(held);

        let mut chunks = Vec::with_capacity(bytes.div_ceil(SPIKE_CHUNK_BYTES));
        let mut left = bytes;
        while left > 0 {
            let size = left.min(SPIKE_CHUNK_BYTES);
            chunks.push(vec![0xA5u8; size]);
            left -= size;
        }
        trace!(requested, bytes, chunks = chunks.len(), "Spike allocated");
        Self {
            chunks,
            bytes,
            in_use,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes == 0
    }

    /// Bytes actually held, summed over chunks.
    pub fn held(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }
}

impl Drop for SpikeBuffer {
    fn drop(&mut self) {
        self.in_use.fetch_sub(self.bytes, Ordering::SeqCst);
        trace!(bytes = self.bytes, "Spike released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUDGET: usize = 1 << 20;

    #[test]
    fn allocates_and_releases() {
        let in_use = Arc::new(AtomicUsize::new(0));
        let buffer = SpikeBuffer::allocate(SPIKE_CHUNK_BYTES * 2 + 10, BUDGET, in_use.clone());

        assert_eq!(buffer.len(), SPIKE_CHUNK_BYTES * 2 + 10);
        assert_eq!(buffer.held(), buffer.len());
        assert_eq!(in_use.load(Ordering::SeqCst), buffer.len());

        drop(buffer);
        assert_eq!(in_use.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn zero_bytes_is_empty() {
        let buffer = SpikeBuffer::allocate(0, BUDGET, Arc::new(AtomicUsize::new(0)));
        assert!(buffer.is_empty());
        assert_eq!(buffer.held(), 0);
    }

    #[test]
    fn live_buffers_share_one_budget() {
        let in_use = Arc::new(AtomicUsize::new(0));

        let first = SpikeBuffer::allocate(80_000, 100_000, in_use.clone());
        let second = SpikeBuffer::allocate(80_000, 100_000, in_use.clone());
        let third = SpikeBuffer::allocate(80_000, 100_000, in_use.clone());

        assert_eq!(first.len(), 80_000);
        assert_eq!(second.len(), 20_000);
        assert_eq!(second.held(), 20_000);
        assert!(third.is_empty());
        assert_eq!(in_use.load(Ordering::SeqCst), 100_000);

        drop(first);
        let fourth = SpikeBuffer::allocate(80_000, 100_000, in_use.clone());
        assert_eq!(fourth.len(), 80_000);
        assert_eq!(in_use.load(Ordering::SeqCst), 100_000);

        drop((second, third, fourth));
        assert_eq!(in_use.load(Ordering::SeqCst), 0);
    }
}
