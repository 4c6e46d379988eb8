//! Debug assertion macros for buffer invariants.
//!
//! Active only in debug builds (`debug_assert!`), so there is zero overhead
//! in release builds. Used by `RingBuffer` and the reference buffers.

/// Assert that a shadow cursor stays inside the index range of an
/// `N + 1`-byte ring, where the value `N + 1` is the transient
/// "wrapped past the end, not yet folded to 0" alias.
macro_rules! debug_assert_cursor_in_range {
    ($name:literal, $cursor:expr, $capacity:expr) => {
        debug_assert!(
            $cursor <= $capacity + 1,
            "ring {} cursor {} outside [0, {}]",
            $name,
            $cursor,
            $capacity + 1
        )
    };
}

/// Assert that a copy span lies within the backing storage.
macro_rules! debug_assert_span_in_bounds {
    ($start:expr, $len:expr, $storage_len:expr) => {
        debug_assert!(
            $start + $len <= $storage_len,
            "copy span [{}, {}) outside storage of {} bytes",
            $start,
            $start + $len,
            $storage_len
        )
    };
}

/// Assert that the committed-end marker of a reference buffer never points
/// past the data it guards.
macro_rules! debug_assert_committed_in_bounds {
    ($committed:expr, $len:expr) => {
        debug_assert!(
            $committed <= $len,
            "committed marker {} past buffer length {}",
            $committed,
            $len
        )
    };
}

pub(crate) use debug_assert_committed_in_bounds;
pub(crate) use debug_assert_cursor_in_range;
pub(crate) use debug_assert_span_in_bounds;
