//! In-memory bounded byte ring for tests and in-process pipelines.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::Arc;
use tracing::trace;

#[derive(Debug)]
struct RingState {
    data: VecDeque<u8>,
    capacity: usize,
    closed: bool,
}

/// A bounded in-memory byte ring with producer and consumer handles.
///
/// The producer side implements [`Write`] and the consumer side
/// implements [`Read`], so both are usable wherever a
/// [`crate::RecordSink`] or [`crate::RecordSource`] is expected.
///
/// - Writing into a full ring returns [`io::ErrorKind::WouldBlock`]
/// - Reading an empty open ring returns [`io::ErrorKind::WouldBlock`]
/// - Reading an empty closed ring returns `Ok(0)` (end of stream)
///
/// # Thread Safety
///
/// Handles can be moved to other threads; all state sits behind one lock.
///
/// # Example
///
/// ```rust
/// use ringitem_transport::{MemoryRing, RecordSink, RecordSource};
///
/// let ring = MemoryRing::new();
/// ring.producer().write_fully(b"ring item").unwrap();
/// ring.close();
///
/// let mut buf = [0u8; 9];
/// ring.consumer().read_exact_bytes(&mut buf).unwrap();
/// assert_eq!(&buf, b"ring item");
/// ```
#[derive(Debug, Clone)]
pub struct MemoryRing {
    state: Arc<Mutex<RingState>>,
}

impl MemoryRing {
    /// Capacity used by [`MemoryRing::new`].
    pub const DEFAULT_CAPACITY: usize = 1024 * 1024;

    /// Creates an empty ring with [`Self::DEFAULT_CAPACITY`] bytes of space.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates an empty ring holding at most `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(RingState {
                data: VecDeque::with_capacity(capacity.min(Self::DEFAULT_CAPACITY)),
                capacity,
                closed: false,
            })),
        }
    }

    /// Returns a writing handle.
    #[must_use]
    pub fn producer(&self) -> RingProducer {
        RingProducer {
            state: Arc::clone(&self.state),
        }
    }

    /// Returns a reading handle.
    #[must_use]
    pub fn consumer(&self) -> RingConsumer {
        RingConsumer {
            state: Arc::clone(&self.state),
        }
    }

    /// Marks the ring closed. Readers see end of stream once it drains.
    pub fn close(&self) {
        self.state.lock().closed = true;
    }

    /// Whether [`MemoryRing::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Bytes waiting to be read.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().data.len()
    }

    /// Whether no bytes are waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of buffered bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.state.lock().capacity
    }
}

impl Default for MemoryRing {
    fn default() -> Self {
        Self::new()
    }
}

/// Writing side of a [`MemoryRing`].
#[derive(Debug, Clone)]
pub struct RingProducer {
    state: Arc<Mutex<RingState>>,
}

impl Write for RingProducer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe));
        }
        if buf.is_empty() {
            return Ok(0);
        }
        let free = state.capacity - state.data.len();
        if free == 0 {
            return Err(io::Error::from(io::ErrorKind::WouldBlock));
        }
        let n = free.min(buf.len());
        state.data.extend(&buf[..n]);
        trace!(bytes = n, "ring write");
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Reading side of a [`MemoryRing`].
#[derive(Debug, Clone)]
pub struct RingConsumer {
    state: Arc<Mutex<RingState>>,
}

impl Read for RingConsumer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        if state.data.is_empty() {
            if state.closed || buf.is_empty() {
                return Ok(0);
            }
            return Err(io::Error::from(io::ErrorKind::WouldBlock));
        }
        let n = buf.len().min(state.data.len());
        for (slot, byte) in buf.iter_mut().zip(state.data.drain(..n)) {
            *slot = byte;
        }
        trace!(bytes = n, "ring read");
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RecordSink, RecordSource, TransportError};
    use std::thread;

    #[test]
    fn ring_new_is_empty() {
        let ring = MemoryRing::new();
        assert!(ring.is_empty());
        assert!(!ring.is_closed());
        assert_eq!(ring.capacity(), MemoryRing::DEFAULT_CAPACITY);
    }

    #[test]
    fn ring_preserves_order() {
        let ring = MemoryRing::new();
        let mut producer = ring.producer();
        producer.write_fully(b"hello ").unwrap();
        producer.write_fully(b"world").unwrap();
        ring.close();

        let mut buf = [0u8; 11];
        ring.consumer().read_exact_bytes(&mut buf).unwrap();
        assert_eq!(&buf, b"hello world");
    }

    #[test]
    fn full_ring_would_block() {
        let ring = MemoryRing::with_capacity(4);
        let mut producer = ring.producer();
        assert_eq!(producer.write(b"abcdef").unwrap(), 4);
        let err = producer.write(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
    }

    #[test]
    fn empty_open_ring_would_block_and_closed_ring_ends() {
        let ring = MemoryRing::new();
        let mut consumer = ring.consumer();
        let mut buf = [0u8; 4];
        assert_eq!(
            consumer.read(&mut buf).unwrap_err().kind(),
            io::ErrorKind::WouldBlock
        );
        ring.close();
        assert_eq!(consumer.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn closed_ring_rejects_writes() {
        let ring = MemoryRing::new();
        ring.close();
        assert!(matches!(
            ring.producer().write_fully(b"x"),
            Err(TransportError::Io(_))
        ));
    }

    #[test]
    fn small_ring_streams_across_threads() {
        let ring = MemoryRing::with_capacity(16);
        let payload: Vec<u8> = (0..=255u8).cycle().take(4096).collect();

        let writer = {
            let ring = ring.clone();
            let payload = payload.clone();
            thread::spawn(move || {
                ring.producer().write_fully(&payload).unwrap();
                ring.close();
            })
        };

        let mut received = vec![0u8; payload.len()];
        ring.consumer().read_exact_bytes(&mut received).unwrap();
        writer.join().unwrap();
        assert_eq!(received, payload);
    }
}
