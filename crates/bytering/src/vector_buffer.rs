use crate::buffer::{BufferReader, BufferWriter, ByteBuffer};
use crate::invariants::debug_assert_committed_in_bounds;
use std::sync::{Mutex, PoisonError};

/// Mutex-protected reference implementation of [`ByteBuffer`].
///
/// Everything lives in one `Vec<u8>` guarded by a single mutex: the
/// committed prefix, followed by the current writer session's uncommitted
/// bytes. This is deliberately the dumbest correct implementation. It
/// exists so the lock-free [`RingBuffer`](crate::RingBuffer) can be
/// cross-checked against a known-good buffer under identical tests, and it
/// should not be used on hot paths.
pub struct VectorBuffer {
    inner: Mutex<Inner>,
}

struct Inner {
    data: Vec<u8>,
    /// Length of the committed prefix of `data`. Bytes past this marker
    /// belong to the live writer session and vanish if it drops without
    /// committing.
    committed: usize,
    has_reader: bool,
    has_writer: bool,
}

impl VectorBuffer {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                data: Vec::new(),
                committed: 0,
                has_reader: false,
                has_writer: false,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means another session panicked; the byte
        // state itself is still consistent.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for VectorBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteBuffer for VectorBuffer {
    fn reader(&self) -> Box<dyn BufferReader + '_> {
        if cfg!(debug_assertions) {
            let mut inner = self.lock();
            assert!(!inner.has_reader, "VectorBuffer supports only one concurrent reader");
            inner.has_reader = true;
        }

        Box::new(VectorReader {
            parent: self,
            cursor: 0,
            bytes_read: 0,
        })
    }

    fn writer(&self) -> Box<dyn BufferWriter + '_> {
        if cfg!(debug_assertions) {
            let mut inner = self.lock();
            assert!(!inner.has_writer, "VectorBuffer supports only one concurrent writer");
            inner.has_writer = true;
        }

        Box::new(VectorWriter {
            parent: self,
            bytes_written: 0,
        })
    }

    fn capacity(&self) -> usize {
        usize::MAX - 1
    }
}

struct VectorReader<'a> {
    parent: &'a VectorBuffer,
    /// Private forward cursor over the committed prefix.
    cursor: usize,
    bytes_read: usize,
}

impl BufferReader for VectorReader<'_> {
    fn read(&mut self, dst: &mut [u8]) -> bool {
        let inner = self.parent.lock();
        debug_assert_committed_in_bounds!(inner.committed, inner.data.len());

        if inner.committed - self.cursor < dst.len() {
            return false;
        }

        dst.copy_from_slice(&inner.data[self.cursor..self.cursor + dst.len()]);
        self.cursor += dst.len();
        self.bytes_read += dst.len();
        true
    }

    fn commit(&mut self) -> bool {
        let mut inner = self.parent.lock();

        inner.data.drain(..self.cursor);
        inner.committed -= self.cursor;
        self.cursor = 0;
        true
    }

    fn bytes_read(&self) -> usize {
        self.bytes_read
    }
}

impl Drop for VectorReader<'_> {
    fn drop(&mut self) {
        if cfg!(debug_assertions) {
            self.parent.lock().has_reader = false;
        }
    }
}

struct VectorWriter<'a> {
    parent: &'a VectorBuffer,
    bytes_written: usize,
}

impl BufferWriter for VectorWriter<'_> {
    fn write(&mut self, src: &[u8]) -> bool {
        let mut inner = self.parent.lock();

        inner.data.extend_from_slice(src);
        self.bytes_written += src.len();
        true
    }

    fn commit(&mut self) -> bool {
        let mut inner = self.parent.lock();

        inner.committed = inner.data.len();
        true
    }

    fn bytes_written(&self) -> usize {
        self.bytes_written
    }
}

impl Drop for VectorWriter<'_> {
    fn drop(&mut self) {
        let mut inner = self.parent.lock();

        // Bytes appended since the last commit are discarded.
        let committed = inner.committed;
        inner.data.truncate(committed);
        if cfg!(debug_assertions) {
            inner.has_writer = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let buf = VectorBuffer::new();

        let mut w = buf.writer();
        assert!(w.write(&[1, 2, 3]));
        assert!(w.commit());
        drop(w);

        let mut r = buf.reader();
        let mut out = [0u8; 3];
        assert!(r.read(&mut out));
        assert_eq!(out, [1, 2, 3]);
        assert!(r.commit());
    }

    #[test]
    fn test_uncommitted_write_discarded_on_drop() {
        let buf = VectorBuffer::new();

        {
            let mut w = buf.writer();
            assert!(w.write(&[1, 2, 3]));
            // no commit
        }

        let mut r = buf.reader();
        let mut out = [0u8; 1];
        assert!(!r.read(&mut out));
    }

    #[test]
    fn test_partial_commit_keeps_earlier_bytes() {
        let buf = VectorBuffer::new();

        {
            let mut w = buf.writer();
            assert!(w.write(&[1, 2]));
            assert!(w.commit());
            assert!(w.write(&[3, 4]));
            // the trailing two bytes are never committed
        }

        let mut r = buf.reader();
        let mut out = [0u8; 2];
        assert!(r.read(&mut out));
        assert_eq!(out, [1, 2]);
        assert!(!r.read(&mut [0u8; 1]));
    }

    #[test]
    fn test_reader_commit_erases_consumed_prefix() {
        let buf = VectorBuffer::new();

        {
            let mut w = buf.writer();
            assert!(w.write(&[1, 2, 3, 4]));
            assert!(w.commit());
        }

        {
            let mut r = buf.reader();
            let mut out = [0u8; 2];
            assert!(r.read(&mut out));
            assert!(r.commit());
        }

        // Only the unconsumed suffix remains.
        let mut r = buf.reader();
        let mut out = [0u8; 2];
        assert!(r.read(&mut out));
        assert_eq!(out, [3, 4]);
    }

    #[test]
    fn test_dropped_reader_keeps_position() {
        let buf = VectorBuffer::new();

        {
            let mut w = buf.writer();
            assert!(w.write(&[5, 6]));
            assert!(w.commit());
        }

        {
            let mut r = buf.reader();
            let mut out = [0u8; 2];
            assert!(r.read(&mut out));
            // no commit
        }

        let mut r = buf.reader();
        let mut out = [0u8; 2];
        assert!(r.read(&mut out));
        assert_eq!(out, [5, 6]);
    }
}
