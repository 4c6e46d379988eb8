use crate::buffer::{BufferReader, BufferWriter, ByteBuffer};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Mutex-protected reference implementation of [`ByteBuffer`] over a deque.
///
/// Differs from [`VectorBuffer`](crate::VectorBuffer) in how the writer
/// stages its session: bytes accumulate in a private buffer owned by the
/// writer handle and are appended to the shared deque only on commit, so a
/// dropped session never touches the shared state at all. Like the vector
/// variant it exists for cross-checking, not for hot paths.
pub struct ListBuffer {
    inner: Mutex<Inner>,
}

struct Inner {
    q: VecDeque<u8>,
    has_reader: bool,
    has_writer: bool,
}

impl ListBuffer {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                q: VecDeque::new(),
                has_reader: false,
                has_writer: false,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ListBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteBuffer for ListBuffer {
    fn reader(&self) -> Box<dyn BufferReader + '_> {
        if cfg!(debug_assertions) {
            let mut inner = self.lock();
            assert!(!inner.has_reader, "ListBuffer supports only one concurrent reader");
            inner.has_reader = true;
        }

        Box::new(ListReader {
            parent: self,
            cursor: 0,
            bytes_read: 0,
        })
    }

    fn writer(&self) -> Box<dyn BufferWriter + '_> {
        if cfg!(debug_assertions) {
            let mut inner = self.lock();
            assert!(!inner.has_writer, "ListBuffer supports only one concurrent writer");
            inner.has_writer = true;
        }

        Box::new(ListWriter {
            parent: self,
            staged: Vec::new(),
            bytes_written: 0,
        })
    }

    fn capacity(&self) -> usize {
        usize::MAX - 1
    }
}

struct ListReader<'a> {
    parent: &'a ListBuffer,
    cursor: usize,
    bytes_read: usize,
}

impl BufferReader for ListReader<'_> {
    fn read(&mut self, dst: &mut [u8]) -> bool {
        let inner = self.parent.lock();

        if inner.q.len() - self.cursor < dst.len() {
            return false;
        }

        for (i, byte) in dst.iter_mut().enumerate() {
            *byte = inner.q[self.cursor + i];
        }
        self.cursor += dst.len();
        self.bytes_read += dst.len();
        true
    }

    fn commit(&mut self) -> bool {
        let mut inner = self.parent.lock();

        inner.q.drain(..self.cursor);
        self.cursor = 0;
        true
    }

    fn bytes_read(&self) -> usize {
        self.bytes_read
    }
}

impl Drop for ListReader<'_> {
    fn drop(&mut self) {
        if cfg!(debug_assertions) {
            self.parent.lock().has_reader = false;
        }
    }
}

struct ListWriter<'a> {
    parent: &'a ListBuffer,
    /// Session-private staging area, spliced into the shared deque on commit.
    staged: Vec<u8>,
    bytes_written: usize,
}

impl BufferWriter for ListWriter<'_> {
    fn write(&mut self, src: &[u8]) -> bool {
        self.staged.extend_from_slice(src);
        self.bytes_written += src.len();
        true
    }

    fn commit(&mut self) -> bool {
        let mut inner = self.parent.lock();

        inner.q.extend(self.staged.drain(..));
        true
    }

    fn bytes_written(&self) -> usize {
        self.bytes_written
    }
}

impl Drop for ListWriter<'_> {
    fn drop(&mut self) {
        // Staged bytes die with the handle; the shared deque never saw them.
        if cfg!(debug_assertions) {
            self.parent.lock().has_writer = false;
        }
    }
}
