use crate::buffer::{BufferReader, BufferWriter, ByteBuffer};
use crate::invariants::{debug_assert_cursor_in_range, debug_assert_span_in_bounds};
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

// =============================================================================
// MEMORY ORDERING & SYNCHRONIZATION STRATEGY
// =============================================================================
//
// This SPSC byte ring uses a classic producer-consumer protocol:
//
// ## Index scheme
//
// Storage holds `capacity + 1` bytes. `head` and `tail` are indices into that
// storage, each in `[0, capacity + 1]`; the value `capacity + 1` is a
// transient alias of 0 ("wrapped past the end, not yet folded"). One slot of
// padding distinguishes full from empty: empty iff `head == tail`, and the
// writer refuses to advance onto the byte just before `head`.
//
// ## Memory ordering protocol
//
// **Writer session:**
// 1. Claim the writer slot (`has_writer` swap, AcqRel)
// 2. Load `tail` with Relaxed (only the writer stores tail)
// 3. Read `cached_head` with no ordering (UnsafeCell, writer-owned)
// 4. If the cache says full: reload `head` with Acquire (synchronizes with
//    the reader's Release store, so the freed bytes are really free)
// 5. Copy bytes into storage (no ordering needed, protected by the protocol)
// 6. `commit`: store the shadow tail with Release (publishes the bytes)
//
// **Reader session:**
// 1. Claim the reader slot (`has_reader` swap, AcqRel)
// 2. Load `head` with Relaxed (only the reader stores head)
// 3. Read `cached_tail` with no ordering (UnsafeCell, reader-owned)
// 4. If the cache says empty: reload `tail` with Acquire (synchronizes with
//    the writer's Release store, so the published bytes are really there)
// 5. Copy bytes out of storage
// 6. `commit`: store the shadow head with Release (publishes the free space)
//
// ## Single-writer invariants
//
// The following fields are accessed through UnsafeCell without atomics
// because they have exactly one writer at any time, enforced by the
// occupancy flags:
// - `cached_head`: touched only by the live writer session
// - `cached_tail`: touched only by the live reader session
// - `storage[i]`: written by the writer between shadow advance and commit,
//   read by the reader between its Acquire observation and commit
//
// The occupancy flags are checked unconditionally (not just in debug): two
// live writers would alias the UnsafeCell state, so the panic is what keeps
// the unsafe blocks below sound.
//
// =============================================================================

/// SPSC lock-free byte ring buffer.
///
/// A fixed-capacity byte queue for exactly one producer thread and one
/// consumer thread. Sessions obtained from [`ByteBuffer::writer`] and
/// [`ByteBuffer::reader`] stage their progress in private shadow cursors and
/// publish it on commit; a dropped session without a commit is a no-op.
///
/// Optimized with:
/// - `CachePadded` fields to prevent false sharing between the two sides
/// - Cached opposite-side indices to minimize cross-core traffic
/// - A single release store per committed session
#[repr(C)]
pub struct RingBuffer {
    // === PRODUCER HOT ===
    /// Next free byte, one past the last committed byte (written by the
    /// producer, read by the consumer).
    tail: CachePadded<AtomicUsize>,
    /// Producer's cached view of `head` (avoids cross-core reads).
    cached_head: CachePadded<UnsafeCell<usize>>,

    // === CONSUMER HOT ===
    /// Next byte to read (written by the consumer, read by the producer).
    head: CachePadded<AtomicUsize>,
    /// Consumer's cached view of `tail` (avoids cross-core reads).
    cached_tail: CachePadded<UnsafeCell<usize>>,

    // === OCCUPANCY === (touched only at session open/close)
    has_reader: CachePadded<AtomicBool>,
    has_writer: CachePadded<AtomicBool>,

    // === DATA ===
    /// `capacity + 1` bytes; the extra slot is the full/empty disambiguator.
    ///
    /// `Box<[u8]>` rather than `Vec<u8>`: the size is fixed at construction.
    storage: UnsafeCell<Box<[u8]>>,
    capacity: usize,
}

// Safety: the occupancy flags guarantee at most one concurrent writer and
// one concurrent reader; all cross-thread publication goes through the
// release/acquire pairs on `head` and `tail`.
unsafe impl Send for RingBuffer {}
unsafe impl Sync for RingBuffer {}

impl RingBuffer {
    /// Creates a ring that can hold up to `capacity` payload bytes per
    /// uncommitted write session.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be non-zero");

        Self {
            tail: CachePadded::new(AtomicUsize::new(0)),
            cached_head: CachePadded::new(UnsafeCell::new(0)),
            head: CachePadded::new(AtomicUsize::new(0)),
            cached_tail: CachePadded::new(UnsafeCell::new(0)),
            has_reader: CachePadded::new(AtomicBool::new(false)),
            has_writer: CachePadded::new(AtomicBool::new(false)),
            storage: UnsafeCell::new(vec![0u8; capacity + 1].into_boxed_slice()),
            capacity,
        }
    }

    /// Length of the backing storage, `capacity + 1`.
    #[inline]
    fn storage_len(&self) -> usize {
        self.capacity + 1
    }
}

impl ByteBuffer for RingBuffer {
    fn reader(&self) -> Box<dyn BufferReader + '_> {
        assert!(
            !self.has_reader.swap(true, Ordering::AcqRel),
            "RingBuffer supports only one concurrent reader"
        );

        Box::new(RingReader {
            ring: self,
            shadow_head: self.head.load(Ordering::Relaxed),
            bytes_read: 0,
        })
    }

    fn writer(&self) -> Box<dyn BufferWriter + '_> {
        assert!(
            !self.has_writer.swap(true, Ordering::AcqRel),
            "RingBuffer supports only one concurrent writer"
        );

        Box::new(RingWriter {
            ring: self,
            shadow_tail: self.tail.load(Ordering::Relaxed),
            bytes_written: 0,
        })
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Write session over a [`RingBuffer`]. Owns the shadow tail.
struct RingWriter<'a> {
    ring: &'a RingBuffer,
    shadow_tail: usize,
    bytes_written: usize,
}

impl RingWriter<'_> {
    /// Producer's private view of the consumer cursor.
    #[inline]
    fn cached_head(&self) -> usize {
        // SAFETY: `cached_head` is touched only by the live writer session,
        // and the occupancy flag guarantees this session is the only one.
        unsafe { *self.ring.cached_head.get() }
    }

    /// Refreshes the cache from `head` with Acquire, pairing with the
    /// reader's Release commit.
    #[inline]
    fn refresh_cached_head(&self) -> usize {
        let head = self.ring.head.load(Ordering::Acquire);
        // SAFETY: as above; single live writer session.
        unsafe { *self.ring.cached_head.get() = head };
        head
    }
}

impl BufferWriter for RingWriter<'_> {
    fn write(&mut self, src: &[u8]) -> bool {
        // A single session can never hold more than `capacity` payload
        // bytes, so an oversized request fails without touching the ring.
        if src.len() > self.ring.capacity {
            return false;
        }

        let storage_len = self.ring.storage_len();
        let mut tail = self.shadow_tail;
        let mut off = 0;

        while off < src.len() {
            if tail == storage_len {
                // Wrapping onto slot 0 requires the reader to have moved off
                // of it, otherwise the ring is full in this regime.
                if self.cached_head() == 0 && self.refresh_cached_head() == 0 {
                    return false;
                }
                tail = 0;
            } else if tail + 1 == self.cached_head() && tail + 1 == self.refresh_cached_head() {
                return false;
            }

            let cached_head = self.cached_head();
            let writable = if cached_head <= tail {
                // Free span runs to the end of storage; the padding byte is
                // legal here because the wrap above re-checks before
                // touching slot 0.
                storage_len - tail
            } else {
                // The head is ahead of us; keep one byte of padding.
                cached_head - tail - 1
            };

            let n = (src.len() - off).min(writable);
            debug_assert_span_in_bounds!(tail, n, storage_len);

            // SAFETY: `[tail, tail + n)` is within storage, and those slots
            // are not observable by the reader: they sit at or past the
            // committed `tail` and will only become visible after our
            // Release commit. The occupancy flag rules out a second writer.
            unsafe {
                let storage = &mut *self.ring.storage.get();
                storage[tail..tail + n].copy_from_slice(&src[off..off + n]);
            }

            tail += n;
            off += n;
        }

        self.shadow_tail = tail;
        self.bytes_written += src.len();
        true
    }

    fn commit(&mut self) -> bool {
        debug_assert_cursor_in_range!("tail", self.shadow_tail, self.ring.capacity);
        self.ring.tail.store(self.shadow_tail, Ordering::Release);
        true
    }

    fn bytes_written(&self) -> usize {
        self.bytes_written
    }
}

impl Drop for RingWriter<'_> {
    fn drop(&mut self) {
        // Uncommitted shadow progress simply evaporates here.
        self.ring.has_writer.store(false, Ordering::Release);
    }
}

/// Read session over a [`RingBuffer`]. Owns the shadow head.
struct RingReader<'a> {
    ring: &'a RingBuffer,
    shadow_head: usize,
    bytes_read: usize,
}

impl RingReader<'_> {
    /// Consumer's private view of the producer cursor.
    #[inline]
    fn cached_tail(&self) -> usize {
        // SAFETY: `cached_tail` is touched only by the live reader session,
        // and the occupancy flag guarantees this session is the only one.
        unsafe { *self.ring.cached_tail.get() }
    }

    /// Refreshes the cache from `tail` with Acquire, pairing with the
    /// writer's Release commit.
    #[inline]
    fn refresh_cached_tail(&self) -> usize {
        let tail = self.ring.tail.load(Ordering::Acquire);
        // SAFETY: as above; single live reader session.
        unsafe { *self.ring.cached_tail.get() = tail };
        tail
    }
}

impl BufferReader for RingReader<'_> {
    fn read(&mut self, dst: &mut [u8]) -> bool {
        if dst.len() > self.ring.capacity {
            return false;
        }

        let storage_len = self.ring.storage_len();
        let mut head = self.shadow_head;
        let mut off = 0;

        while off < dst.len() {
            if head == self.cached_tail() && head == self.refresh_cached_tail() {
                return false;
            }

            if head == storage_len {
                head = 0;
            }

            // Re-check after folding the wrap alias: `storage_len` and 0
            // name the same position, so the ring may in fact be empty.
            if head == self.cached_tail() {
                return false;
            }

            let cached_tail = self.cached_tail();
            let readable = if head <= cached_tail {
                cached_tail - head
            } else {
                storage_len - head
            };

            let n = (dst.len() - off).min(readable);
            debug_assert_span_in_bounds!(head, n, storage_len);

            // SAFETY: `[head, head + n)` is within storage and lies in the
            // committed region `[head, tail)`, whose bytes were published by
            // the writer's Release commit and observed by our Acquire load.
            // The writer will not reuse these slots until our own commit
            // publishes the new head.
            unsafe {
                let storage = &*self.ring.storage.get();
                dst[off..off + n].copy_from_slice(&storage[head..head + n]);
            }

            head += n;
            off += n;
        }

        self.shadow_head = head;
        self.bytes_read += dst.len();
        true
    }

    fn commit(&mut self) -> bool {
        debug_assert_cursor_in_range!("head", self.shadow_head, self.ring.capacity);
        self.ring.head.store(self.shadow_head, Ordering::Release);
        true
    }

    fn bytes_read(&self) -> usize {
        self.bytes_read
    }
}

impl Drop for RingReader<'_> {
    fn drop(&mut self) {
        self.ring.has_reader.store(false, Ordering::Release);
    }
}
