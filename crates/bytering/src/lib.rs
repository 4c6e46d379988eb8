//! Byte buffers with commit-or-discard sessions.
//!
//! This crate provides the byte-channel core of a low-latency logging
//! pipeline: a producer serializes records into a buffer through a scoped
//! [`BufferWriter`], and a consumer later drains them through a scoped
//! [`BufferReader`]. Nothing a session does is visible to the other side
//! until the session commits; dropping a session without committing discards
//! its work.
//!
//! Three implementations of the [`ByteBuffer`] contract are provided:
//!
//! - [`RingBuffer`], the real one: a fixed-capacity single-producer
//!   single-consumer lock-free ring of raw bytes.
//! - [`VectorBuffer`] and [`ListBuffer`]: mutex-protected, dynamically
//!   sized reference implementations, used to cross-check the ring buffer
//!   under identical tests. Not intended for hot paths.
//!
//! [`WaitCell`] rounds out the crate: an atomic integer with
//! wait/notify support, used by higher layers for back-pressure accounting.
//!
//! # Example
//!
//! ```
//! use bytering::{BufferReader, BufferWriter, ByteBuffer, RingBuffer};
//!
//! let ring = RingBuffer::new(64);
//!
//! let mut writer = ring.writer();
//! assert!(writer.write(&[1, 2, 3, 4]));
//! assert!(writer.commit());
//! drop(writer);
//!
//! let mut reader = ring.reader();
//! let mut out = [0u8; 4];
//! assert!(reader.read(&mut out));
//! assert!(reader.commit());
//! assert_eq!(out, [1, 2, 3, 4]);
//! ```

mod buffer;
mod invariants;
mod list_buffer;
mod ring;
mod vector_buffer;
mod wait;

pub use buffer::{BufferReader, BufferWriter, ByteBuffer};
pub use list_buffer::ListBuffer;
pub use ring::RingBuffer;
pub use vector_buffer::VectorBuffer;
pub use wait::WaitCell;
