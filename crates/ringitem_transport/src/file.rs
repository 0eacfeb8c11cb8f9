//! File-backed record sources and sinks.

use crate::error::TransportResult;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Reads ring items from an event file.
///
/// # Example
///
/// ```no_run
/// use ringitem_transport::{FileSource, RecordSource};
/// use std::path::Path;
///
/// let mut source = FileSource::open(Path::new("run-0001.evt")).unwrap();
/// let mut header = [0u8; 8];
/// source.read_exact_bytes(&mut header).unwrap();
/// ```
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    reader: BufReader<File>,
}

impl FileSource {
    /// Opens an existing file for reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn open(path: &Path) -> TransportResult<Self> {
        let file = File::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
        })
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Read for FileSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

/// Writes ring items to an event file.
///
/// # Durability
///
/// - `flush_sink()` pushes buffered bytes to the OS
/// - [`FileSink::sync`] additionally calls `File::sync_all()`
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl FileSink {
    /// Creates (or truncates) a file for writing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create(path: &Path) -> TransportResult<Self> {
        let file = File::create(path)?;
        Ok(Self::from_file(path, file))
    }

    /// Opens a file for appending, creating it if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn append(path: &Path) -> TransportResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::from_file(path, file))
    }

    /// Creates a file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file
    /// cannot be created.
    pub fn create_with_dirs(path: &Path) -> TransportResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::create(path)
    }

    fn from_file(path: &Path, file: File) -> Self {
        Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        }
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes buffered bytes and syncs data and metadata to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush or sync fails.
    pub fn sync(&mut self) -> TransportResult<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }
}

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RecordSink, RecordSource, TransportError};
    use tempfile::tempdir;

    #[test]
    fn file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.evt");

        let mut sink = FileSink::create(&path).unwrap();
        sink.write_fully(b"first").unwrap();
        sink.write_fully(b"second").unwrap();
        sink.sync().unwrap();
        drop(sink);

        let mut source = FileSource::open(&path).unwrap();
        let mut buf = [0u8; 11];
        source.read_exact_bytes(&mut buf).unwrap();
        assert_eq!(&buf, b"firstsecond");
        assert_eq!(source.read_fully(&mut buf).unwrap(), 0);
    }

    #[test]
    fn append_keeps_existing_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.evt");

        let mut sink = FileSink::create(&path).unwrap();
        sink.write_fully(b"abc").unwrap();
        sink.flush_sink().unwrap();
        drop(sink);

        let mut sink = FileSink::append(&path).unwrap();
        sink.write_fully(b"def").unwrap();
        sink.flush_sink().unwrap();
        drop(sink);

        assert_eq!(std::fs::read(&path).unwrap(), b"abcdef");
    }

    #[test]
    fn create_with_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("run.evt");
        let sink = FileSink::create_with_dirs(&path).unwrap();
        assert_eq!(sink.path(), path.as_path());
        assert!(path.exists());
    }

    #[test]
    fn truncated_file_reports_unexpected_eof() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.evt");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let mut source = FileSource::open(&path).unwrap();
        let mut buf = [0u8; 8];
        assert!(matches!(
            source.read_exact_bytes(&mut buf),
            Err(TransportError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn missing_file_fails_to_open() {
        let dir = tempdir().unwrap();
        assert!(FileSource::open(&dir.path().join("missing.evt")).is_err());
    }
}
