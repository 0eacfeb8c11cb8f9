//! Record sink trait definition.

use crate::error::{TransportError, TransportResult};
use std::io::{self, Write};

/// Something ring items can be written to.
///
/// Like [`crate::RecordSource`], sinks are opaque byte streams. Every
/// [`Write`] implementor that is `Send` is a sink.
pub trait RecordSink: Send {
    /// Writes some prefix of `buf`, returning how many bytes were taken.
    ///
    /// # Errors
    ///
    /// Returns any error reported by the underlying stream.
    fn write_some(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Pushes buffered bytes toward their destination.
    ///
    /// # Errors
    ///
    /// Returns any error reported by the underlying stream.
    fn flush_sink(&mut self) -> io::Result<()>;

    /// Writes all of `buf`, retrying on interruption and would-block.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] if the sink stops accepting bytes,
    /// or the I/O error for any other failure.
    fn write_fully(&mut self, buf: &[u8]) -> TransportResult<()> {
        let mut written = 0;
        while written < buf.len() {
            match self.write_some(&buf[written..]) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => std::thread::yield_now(),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

impl<W: Write + Send> RecordSink for W {
    fn write_some(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write(buf)
    }

    fn flush_sink(&mut self) -> io::Result<()> {
        self.flush()
    }
}
