//! Property-based tests cross-checking the lock-free `RingBuffer` against
//! the mutex-protected `VectorBuffer` reference implementation.
//!
//! Both buffers implement the same session contract, so any schedule of
//! record writes and reads must produce byte-identical streams on both.

use bytering::{ByteBuffer, RingBuffer, VectorBuffer};
use proptest::prelude::*;

const CAP: usize = 256;

/// Pushes one record into `buf`, returning false if the buffer refused it.
fn push_record(buf: &dyn ByteBuffer, record: &[u8]) -> bool {
    let mut w = buf.writer();
    if !w.write(record) {
        return false;
    }
    w.commit()
}

/// Pops `len` bytes out of `buf`, or returns None if not enough are there.
fn pop_record(buf: &dyn ByteBuffer, len: usize) -> Option<Vec<u8>> {
    let mut r = buf.reader();
    let mut out = vec![0u8; len];
    if !r.read(&mut out) {
        return None;
    }
    r.commit().then_some(out)
}

proptest! {
    /// Any interleaving of record pushes and pops yields the same byte
    /// streams from the ring and the reference buffer.
    #[test]
    fn prop_ring_matches_reference(
        records in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..64), 1..40),
        pop_after in prop::collection::vec(prop::bool::ANY, 1..40),
    ) {
        let ring = RingBuffer::new(CAP);
        let reference = VectorBuffer::new();

        let mut pending: Vec<Vec<u8>> = Vec::new();
        let mut drained = 0usize;

        for (i, record) in records.iter().enumerate() {
            let ring_ok = push_record(&ring, record);
            if ring_ok {
                // The reference buffer is unbounded, so it must accept
                // whatever the ring accepted.
                prop_assert!(push_record(&reference, record));
                pending.push(record.clone());
            }

            if *pop_after.get(i).unwrap_or(&false) && drained < pending.len() {
                let expected = &pending[drained];
                let from_ring = pop_record(&ring, expected.len());
                let from_ref = pop_record(&reference, expected.len());

                prop_assert_eq!(from_ring.as_ref(), Some(expected));
                prop_assert_eq!(from_ref.as_ref(), Some(expected));
                drained += 1;
            }
        }

        // Drain everything still in flight; FIFO order must hold.
        while drained < pending.len() {
            let expected = &pending[drained];
            let from_ring = pop_record(&ring, expected.len());
            let from_ref = pop_record(&reference, expected.len());
            prop_assert_eq!(from_ring.as_ref(), Some(expected));
            prop_assert_eq!(from_ref.as_ref(), Some(expected));
            drained += 1;
        }

        // Both buffers must now be empty.
        prop_assert!(pop_record(&ring, 1).is_none());
        prop_assert!(pop_record(&reference, 1).is_none());
    }

    /// A session dropped before commit leaves the ring byte-identical to its
    /// pre-session state, at any cursor position.
    #[test]
    fn prop_dropped_session_is_a_noop(
        slide in 0usize..=CAP,
        record in prop::collection::vec(any::<u8>(), 1..64),
        aborted in prop::collection::vec(any::<u8>(), 1..64),
    ) {
        let ring = RingBuffer::new(CAP);

        // Walk the cursors to an arbitrary position.
        for _ in 0..slide {
            prop_assert!(push_record(&ring, &[0]));
            prop_assert!(pop_record(&ring, 1).is_some());
        }

        prop_assert!(push_record(&ring, &record));

        // Write-and-drop must not disturb the committed record.
        {
            let mut w = ring.writer();
            prop_assert!(w.write(&aborted));
        }
        // Read-and-drop must not consume it either.
        {
            let mut r = ring.reader();
            let mut out = vec![0u8; record.len()];
            prop_assert!(r.read(&mut out));
        }

        prop_assert_eq!(pop_record(&ring, record.len()), Some(record));
        prop_assert!(pop_record(&ring, 1).is_none());
    }

    /// Cumulative in-flight bytes never exceed what fits: once the ring
    /// refuses a record, draining two records always makes room again.
    #[test]
    fn prop_refusal_is_transient(
        record in prop::collection::vec(any::<u8>(), 1..32),
    ) {
        let ring = RingBuffer::new(64);
        let mut stored = 0usize;

        // Fill until refusal. The ring may hold one byte beyond the nominal
        // capacity before its cursors first wrap, never more.
        while push_record(&ring, &record) {
            stored += 1;
            prop_assert!(stored * record.len() <= 64 + 1);
        }
        prop_assert!(stored >= 2);

        // Two records' worth of space always covers the padding byte too.
        prop_assert!(pop_record(&ring, record.len()).is_some());
        prop_assert!(pop_record(&ring, record.len()).is_some());
        prop_assert!(push_record(&ring, &record));
    }
}
