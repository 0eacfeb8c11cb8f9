//! Record source trait definition.

use crate::error::{TransportError, TransportResult};
use std::io::{self, Read};

/// Something ring items can be read from.
///
/// Sources are **opaque byte streams**: they know nothing about record
/// layouts. The record layer reads a header, learns the declared length,
/// then asks for exactly the remaining bytes.
///
/// Every [`Read`] implementor that is `Send` is a source.
///
/// # Retry Policy
///
/// [`RecordSource::read_fully`] retries transparently when a read is
/// interrupted by a signal or would block. Any other I/O error is returned
/// to the caller.
pub trait RecordSource: Send {
    /// Reads up to `buf.len()` bytes. `Ok(0)` means end of stream.
    ///
    /// # Errors
    ///
    /// Returns any error reported by the underlying stream.
    fn read_some(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Fills `buf`, stopping early only at end of stream.
    ///
    /// Returns the number of bytes read, which is less than `buf.len()`
    /// only if the stream ended.
    ///
    /// # Errors
    ///
    /// Returns an error for any I/O failure other than interruption or
    /// would-block.
    fn read_fully(&mut self, buf: &mut [u8]) -> TransportResult<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read_some(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => std::thread::yield_now(),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }

    /// Fills `buf` completely.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::UnexpectedEof`] if the stream ends first.
    fn read_exact_bytes(&mut self, buf: &mut [u8]) -> TransportResult<()> {
        let actual = self.read_fully(buf)?;
        if actual < buf.len() {
            return Err(TransportError::UnexpectedEof {
                expected: buf.len(),
                actual,
            });
        }
        Ok(())
    }
}

impl<R: Read + Send> RecordSource for R {
    fn read_some(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::Cursor;

    /// Replays a scripted sequence of read outcomes.
    struct Scripted {
        steps: VecDeque<io::Result<Vec<u8>>>,
    }

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.steps.pop_front() {
                None => Ok(0),
                Some(Err(e)) => Err(e),
                Some(Ok(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
            }
        }
    }

    #[test]
    fn read_fully_collects_partial_reads() {
        let mut source = Scripted {
            steps: VecDeque::from(vec![Ok(vec![1, 2]), Ok(vec![3]), Ok(vec![4])]),
        };
        let mut buf = [0u8; 4];
        assert_eq!(source.read_fully(&mut buf).unwrap(), 4);
        assert_eq!(buf, [1, 2, 3, 4]);
    }

    #[test]
    fn read_fully_retries_transient_errors() {
        let mut source = Scripted {
            steps: VecDeque::from(vec![
                Err(io::Error::from(io::ErrorKind::Interrupted)),
                Ok(vec![1, 2]),
                Err(io::Error::from(io::ErrorKind::WouldBlock)),
                Ok(vec![3, 4]),
            ]),
        };
        let mut buf = [0u8; 4];
        assert_eq!(source.read_fully(&mut buf).unwrap(), 4);
        assert_eq!(buf, [1, 2, 3, 4]);
    }

    #[test]
    fn read_fully_surfaces_hard_errors() {
        let mut source = Scripted {
            steps: VecDeque::from(vec![Err(io::Error::from(io::ErrorKind::BrokenPipe))]),
        };
        let mut buf = [0u8; 4];
        assert!(matches!(
            source.read_fully(&mut buf),
            Err(TransportError::Io(_))
        ));
    }

    #[test]
    fn read_fully_stops_at_end_of_stream() {
        let mut source = Cursor::new(vec![1u8, 2, 3]);
        let mut buf = [0u8; 8];
        assert_eq!(source.read_fully(&mut buf).unwrap(), 3);
    }

    #[test]
    fn read_exact_bytes_reports_short_stream() {
        let mut source = Cursor::new(vec![1u8, 2, 3]);
        let mut buf = [0u8; 8];
        assert!(matches!(
            source.read_exact_bytes(&mut buf),
            Err(TransportError::UnexpectedEof {
                expected: 8,
                actual: 3
            })
        ));
    }
}
