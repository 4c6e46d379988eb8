//! Deferred-formatting SPSC logger over [`bytering`].
//!
//! Log call sites do almost nothing: they serialize a trampoline pointer,
//! the level, and the raw arguments into a byte buffer and return. A
//! separate consumer thread decodes each record, renders the final line,
//! stamps the wall clock, and forwards it to a [`Sink`]: console, file,
//! fan-out, or a level filter wrapped around either.
//!
//! # Example
//!
//! ```
//! use bytering::RingBuffer;
//! use ringlog::{Logger, LogLevel, NullSink};
//!
//! let ring = RingBuffer::new(4096);
//! let sink = NullSink;
//! let logger = Logger::new(&ring, &sink);
//! logger.set_min_log_level(LogLevel::Trace);
//!
//! assert!(logger.try_info("Here we are: {} and my name is: {}", (7i64, "hermes")));
//! assert!(logger.try_read_log());
//! assert!(!logger.try_read_log());
//! ```
//!
//! The producer-side cost is a handful of memcpys into the ring; all
//! formatting and timestamping happens on the consumer thread. One logger
//! serves exactly one producer thread and one consumer thread; clients
//! needing more producers run one logger per thread and fan into a shared
//! [`MultiSink`].

mod console;
mod file;
mod format;
mod level;
mod logger;
mod serialize;
mod sink;

pub use console::ConsoleSink;
pub use file::{FileSink, SinkError};
pub use level::{InvalidLevel, LogLevel, ParseLevelError};
pub use logger::{FormatSpec, Logger, StaticFmt, DEFAULT_MAX_MESSAGE_SIZE};
pub use serialize::{ArgPack, Decode, Encode, Loggable};
pub use sink::{FilterSink, MultiSink, NullSink, Sink, Timestamp};
