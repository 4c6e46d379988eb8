//! The byte-buffer contract: scoped reader/writer sessions over a channel of
//! raw bytes.
//!
//! The traits are object safe on purpose. Callers that pick a buffer at
//! runtime (tests cross-checking the ring against a reference
//! implementation, a logger handed `&dyn ByteBuffer`) go through these
//! trait objects; the concrete types remain available for static dispatch.

/// A channel of raw bytes with commit-or-discard sessions.
///
/// At most one reader session and one writer session may be live on a buffer
/// at any instant. Implementations enforce this and fail fast on violation.
pub trait ByteBuffer: Send + Sync {
    /// Opens a read session.
    ///
    /// The reader observes bytes committed by writers before the session
    /// started (plus anything committed while it runs, at the
    /// implementation's discretion). Progress made by `read` calls becomes
    /// permanent only on [`BufferReader::commit`]; dropping the reader
    /// without committing leaves the buffer's read position untouched.
    ///
    /// # Panics
    ///
    /// Panics if another reader session is currently live.
    fn reader(&self) -> Box<dyn BufferReader + '_>;

    /// Opens a write session.
    ///
    /// Bytes written become visible to readers only on
    /// [`BufferWriter::commit`]; dropping the writer without committing
    /// discards everything the session wrote.
    ///
    /// # Panics
    ///
    /// Panics if another writer session is currently live.
    fn writer(&self) -> Box<dyn BufferWriter + '_>;

    /// Maximum number of payload bytes a single uncommitted write session
    /// can hold.
    fn capacity(&self) -> usize;
}

/// A scoped read session over a [`ByteBuffer`].
pub trait BufferReader {
    /// Reads exactly `dst.len()` bytes from the current session position.
    ///
    /// On success the session cursor advances past the bytes and `true` is
    /// returned. If fewer than `dst.len()` committed bytes are available the
    /// call returns `false`; the cursor does not advance, and `dst` may hold
    /// partial garbage. Multiple calls in one session compose.
    fn read(&mut self, dst: &mut [u8]) -> bool;

    /// Publishes the session's progress, freeing the consumed bytes.
    fn commit(&mut self) -> bool;

    /// Total bytes successfully read by this session so far.
    fn bytes_read(&self) -> usize;
}

/// A scoped write session over a [`ByteBuffer`].
pub trait BufferWriter {
    /// Appends all of `src` to the session's uncommitted region.
    ///
    /// Either the whole slice is accepted and `true` is returned, or nothing
    /// is appended and the call returns `false` (buffer full, or `src` alone
    /// exceeds the buffer capacity). Multiple calls in one session compose.
    fn write(&mut self, src: &[u8]) -> bool;

    /// Publishes the session's bytes to readers.
    fn commit(&mut self) -> bool;

    /// Total bytes successfully written by this session so far.
    fn bytes_written(&self) -> usize;
}
