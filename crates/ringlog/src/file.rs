use crate::sink::{format_line, Sink, Timestamp};
use crate::LogLevel;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Errors from constructing a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to open log file {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Appends formatted lines to a file, uncolored.
///
/// Lines go through a buffered writer; [`flush`](FileSink::flush) forces
/// them out, and dropping the sink flushes whatever is still buffered.
/// Write errors are swallowed, a logging pipeline has nowhere better to
/// report them, but a failed line is not counted in [`bytes_written`].
///
/// [`bytes_written`]: FileSink::bytes_written
pub struct FileSink {
    out: Mutex<BufWriter<File>>,
    bytes_written: AtomicUsize,
}

impl FileSink {
    /// Opens `path` fresh, truncating an existing file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| SinkError::Open {
            path: path.to_owned(),
            source,
        })?;
        Ok(Self::from_file(file))
    }

    /// Opens `path` for appending, creating it if missing.
    pub fn append(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| SinkError::Open {
                path: path.to_owned(),
                source,
            })?;
        Ok(Self::from_file(file))
    }

    fn from_file(file: File) -> Self {
        Self {
            out: Mutex::new(BufWriter::new(file)),
            bytes_written: AtomicUsize::new(0),
        }
    }

    /// Approximate count of bytes written so far, the number a rotation
    /// policy would compare against its size threshold.
    pub fn bytes_written(&self) -> usize {
        self.bytes_written.load(Ordering::Relaxed)
    }

    /// Flushes buffered lines to the file.
    pub fn flush(&self) -> io::Result<()> {
        self.out
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()
    }
}

impl Sink for FileSink {
    fn receive(&self, level: LogLevel, timestamp: Timestamp, line: &str) {
        let mut formatted = format_line(level, timestamp, line);
        formatted.push('\n');

        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if out.write_all(formatted.as_bytes()).is_ok() {
            self.bytes_written
                .fetch_add(formatted.len(), Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    #[test]
    fn test_appends_formatted_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("test.log");

        let sink = FileSink::create(&path).expect("create sink");
        sink.receive(LogLevel::Info, Local::now(), "first");
        sink.receive(LogLevel::Error, Local::now(), "second");
        sink.flush().expect("flush");

        let contents = std::fs::read_to_string(&path).expect("read back");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("[INFO ]: first"));
        assert!(lines[1].contains("[ERROR]: second"));
    }

    #[test]
    fn test_bytes_written_counts_whole_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("count.log");

        let sink = FileSink::create(&path).expect("create sink");
        assert_eq!(sink.bytes_written(), 0);

        sink.receive(LogLevel::Warn, Local::now(), "abc");
        let after_one = sink.bytes_written();
        assert!(after_one > "abc".len());

        sink.receive(LogLevel::Warn, Local::now(), "abc");
        assert_eq!(sink.bytes_written(), after_one * 2);
    }

    #[test]
    fn test_append_mode_preserves_existing_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("appended.log");
        std::fs::write(&path, "preexisting\n").expect("seed file");

        let sink = FileSink::append(&path).expect("append sink");
        sink.receive(LogLevel::Info, Local::now(), "new line");
        sink.flush().expect("flush");

        let contents = std::fs::read_to_string(&path).expect("read back");
        assert!(contents.starts_with("preexisting\n"));
        assert!(contents.contains("[INFO ]: new line"));
    }

    #[test]
    fn test_open_error_is_reported() {
        let err = FileSink::create("/definitely/not/a/real/dir/x.log");
        assert!(matches!(err, Err(SinkError::Open { .. })));
    }
}
