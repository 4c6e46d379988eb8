//! Two-thread demo: a producer logging through a 4 KiB ring while a
//! consumer drains, formats, and prints.
//!
//! Run with `cargo run --bin demo -p ringlog`.

use bytering::RingBuffer;
use ringlog::{static_fmt, ConsoleSink, LogLevel, Logger};
use std::thread;

const RECORDS: i64 = 20;

fn main() {
    let ring = RingBuffer::new(4096);
    let sink = ConsoleSink::new();
    let logger = Logger::new(&ring, &sink);
    logger.set_min_log_level(LogLevel::Trace);

    thread::scope(|s| {
        s.spawn(|| {
            for i in 0..RECORDS {
                logger.debug("Here we are: {} and my name is: {}", (i, "demo"));
            }
            logger.warn_static(static_fmt!("sent {} records, shutting down"), (RECORDS,));
        });

        s.spawn(|| {
            for _ in 0..=RECORDS {
                logger.read_log();
            }
        });
    });

    // Drained completely; a final poll proves the ring is empty.
    assert!(!logger.try_read_log());
}
