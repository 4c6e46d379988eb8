use crate::LogLevel;
use chrono::{DateTime, Local};

/// When a record was decoded, in local wall-clock time.
///
/// The producer side records no timestamp at all, which keeps the enqueue
/// path cheap; the instant a sink sees is stamped by the consumer while it
/// formats the record.
pub type Timestamp = DateTime<Local>;

/// The output endpoint of the logging pipeline.
///
/// `line` is the fully formatted UTF-8 message, without a trailing newline.
/// Sinks are handed to a [`Logger`](crate::Logger) by reference and must
/// outlive it; the consumer thread is the only caller of `receive`, but the
/// `Send + Sync` bound lets the logger itself be shared between its two
/// threads.
pub trait Sink: Send + Sync {
    fn receive(&self, level: LogLevel, timestamp: Timestamp, line: &str);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NullSink {
    pub fn new() -> Self {
        Self
    }
}

impl Sink for NullSink {
    fn receive(&self, _level: LogLevel, _timestamp: Timestamp, _line: &str) {}
}

/// Forwards to `next` only when the record is at least `min_level` severe.
pub struct FilterSink<'a> {
    next: &'a dyn Sink,
    min_level: LogLevel,
}

impl<'a> FilterSink<'a> {
    pub fn new(next: &'a dyn Sink, min_level: LogLevel) -> Self {
        Self { next, min_level }
    }
}

impl Sink for FilterSink<'_> {
    fn receive(&self, level: LogLevel, timestamp: Timestamp, line: &str) {
        if level >= self.min_level {
            self.next.receive(level, timestamp, line);
        }
    }
}

/// Fans a record out to several sinks, in registration order.
pub struct MultiSink<'a> {
    sinks: Vec<&'a dyn Sink>,
}

impl<'a> MultiSink<'a> {
    pub fn new(sinks: Vec<&'a dyn Sink>) -> Self {
        Self { sinks }
    }
}

impl Sink for MultiSink<'_> {
    fn receive(&self, level: LogLevel, timestamp: Timestamp, line: &str) {
        for sink in &self.sinks {
            sink.receive(level, timestamp, line);
        }
    }
}

/// Renders the standard log-line prefix shared by the console and file
/// sinks: `[2024-06-08 14:22:31 +0200] [INFO ]: <line>`.
pub(crate) fn format_line(level: LogLevel, timestamp: Timestamp, line: &str) -> String {
    format!(
        "[{}] [{:<5}]: {}",
        timestamp.format("%Y-%m-%d %H:%M:%S %z"),
        level.as_str(),
        line
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Mutex;

    /// Records every received line, for assertions.
    struct RecordingSink {
        received: Mutex<Vec<(LogLevel, String)>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                received: Mutex::new(Vec::new()),
            }
        }

        fn lines(&self) -> Vec<(LogLevel, String)> {
            self.received.lock().unwrap().clone()
        }
    }

    impl Sink for RecordingSink {
        fn receive(&self, level: LogLevel, _timestamp: Timestamp, line: &str) {
            self.received.lock().unwrap().push((level, line.to_owned()));
        }
    }

    fn now() -> Timestamp {
        Local::now()
    }

    #[test]
    fn test_filter_sink_gates_on_level() {
        let inner = RecordingSink::new();
        let filter = FilterSink::new(&inner, LogLevel::Error);

        filter.receive(LogLevel::Trace, now(), "dropped");
        filter.receive(LogLevel::Error, now(), "kept");
        filter.receive(LogLevel::Critical, now(), "kept too");

        let lines = inner.lines();
        assert_eq!(
            lines,
            vec![
                (LogLevel::Error, String::from("kept")),
                (LogLevel::Critical, String::from("kept too")),
            ]
        );
    }

    #[test]
    fn test_multi_sink_forwards_in_registration_order() {
        let a = RecordingSink::new();
        let b = RecordingSink::new();
        let multi = MultiSink::new(vec![&a, &b]);

        multi.receive(LogLevel::Info, now(), "fan-out");

        assert_eq!(a.lines(), vec![(LogLevel::Info, String::from("fan-out"))]);
        assert_eq!(b.lines(), vec![(LogLevel::Info, String::from("fan-out"))]);
    }

    #[test]
    fn test_null_sink_drops() {
        NullSink::new().receive(LogLevel::Critical, now(), "into the void");
    }

    #[test]
    fn test_line_format() {
        let ts = Local
            .with_ymd_and_hms(2024, 6, 8, 14, 22, 31)
            .single()
            .expect("unambiguous timestamp");
        let line = format_line(LogLevel::Info, ts, "hello 42");

        // The offset depends on the host timezone; pin down the rest.
        assert!(line.starts_with("[2024-06-08 14:22:31 "));
        assert!(line.ends_with("] [INFO ]: hello 42"));
        assert_eq!(line.matches('[').count(), 2);
    }

    #[test]
    fn test_level_token_padding() {
        let ts = now();
        for (level, token) in [
            (LogLevel::Trace, "[TRACE]"),
            (LogLevel::Debug, "[DEBUG]"),
            (LogLevel::Info, "[INFO ]"),
            (LogLevel::Warn, "[WARN ]"),
            (LogLevel::Error, "[ERROR]"),
            (LogLevel::Critical, "[CRIT ]"),
        ] {
            assert!(format_line(level, ts, "x").contains(token));
        }
    }
}
