use crate::serialize::{ArgPack, Decode, Encode};
use crate::{LogLevel, Sink};
use bytering::{BufferReader, ByteBuffer, WaitCell};
use chrono::Local;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicI8, Ordering};
use std::time::Duration;

/// Default ceiling on the wire size of one record, in bytes.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1000;

/// The decoder a consumer runs for one record.
///
/// The identifier written at the head of every record is one of these,
/// serialized as a `usize`. A function pointer is stable for the lifetime
/// of the process, resolvable by the consumer without any shared registry,
/// and survives the round trip through the byte stream. Each monomorphized
/// call signature gets its own pointer, which is how the consumer knows the
/// concrete argument types to decode.
type Trampoline = fn(&mut dyn BufferReader, &dyn Sink) -> bool;

/// A format string whose text is fixed at compile time.
///
/// Records logged through the `*_static` methods never carry their format
/// text on the wire: the text is baked into the trampoline instantiated for
/// the marker type, so only the arguments are serialized. Use
/// [`static_fmt!`](crate::static_fmt) to produce one.
pub trait FormatSpec {
    const TEXT: &'static str;
}

/// Call-site token for a compile-time format string. See [`FormatSpec`].
pub struct StaticFmt<F: FormatSpec>(PhantomData<F>);

impl<F: FormatSpec> StaticFmt<F> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<F: FormatSpec> Default for StaticFmt<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FormatSpec> Clone for StaticFmt<F> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<F: FormatSpec> Copy for StaticFmt<F> {}

/// Builds a [`StaticFmt`] token from a string literal.
///
/// ```
/// use bytering::RingBuffer;
/// use ringlog::{static_fmt, Logger, NullSink};
///
/// let ring = RingBuffer::new(4096);
/// let sink = NullSink;
/// let logger = Logger::new(&ring, &sink);
/// assert!(logger.try_info_static(static_fmt!("answer: {}"), (42,)));
/// ```
#[macro_export]
macro_rules! static_fmt {
    ($text:expr) => {{
        struct Spec;
        impl $crate::FormatSpec for Spec {
            const TEXT: &'static str = $text;
        }
        $crate::StaticFmt::<Spec>::new()
    }};
}

/// Trampoline for records that carry their format text on the wire.
fn decode_dynamic<A: ArgPack>(reader: &mut dyn BufferReader, sink: &dyn Sink) -> bool {
    let Some(level) = decode_level(reader) else {
        return false;
    };
    let Some(text) = String::decode(reader) else {
        return false;
    };
    let Some(line) = A::decode_and_render(&text, reader) else {
        return false;
    };
    sink.receive(level, Local::now(), &line);
    true
}

/// Trampoline for records whose format text lives in the instantiation.
fn decode_static<F: FormatSpec, A: ArgPack>(reader: &mut dyn BufferReader, sink: &dyn Sink) -> bool {
    let Some(level) = decode_level(reader) else {
        return false;
    };
    let Some(line) = A::decode_and_render(F::TEXT, reader) else {
        return false;
    };
    sink.receive(level, Local::now(), &line);
    true
}

fn decode_level(reader: &mut dyn BufferReader) -> Option<LogLevel> {
    LogLevel::try_from(i8::decode(reader)?).ok()
}

/// Single-producer, single-consumer deferred-formatting logger.
///
/// Call sites serialize a trampoline pointer, the level, and their
/// arguments into the byte buffer and return; a consumer thread later runs
/// [`read_log`](Logger::read_log) (or its `try`/timeout variants), which
/// decodes the record, renders the final line, stamps the current wall
/// clock, and hands everything to the sink.
///
/// The logger owns neither the buffer nor the sink; both are borrowed and
/// must outlive it. It coordinates its two threads through one atomic
/// ledger, `bytes_available`: producers block (in the non-`try` methods)
/// until a worst-case record fits, consumers block until at least one
/// committed record exists.
///
/// One logger serves exactly one producer thread and one consumer thread at
/// a time; clients that need more producers multiplex above it (one logger
/// per thread feeding a shared [`MultiSink`](crate::MultiSink), for
/// example).
pub struct Logger<'a> {
    buffer: &'a dyn ByteBuffer,
    sink: &'a dyn Sink,
    min_level: AtomicI8,
    /// Ceiling on the wire size of one record; admission control waits for
    /// this many free bytes, so no admitted record can fail to fit.
    max_message_size: usize,
    capacity: usize,
    /// Free bytes in the buffer. The single bidirectional coordination
    /// channel between the two threads.
    bytes_available: WaitCell,
}

/// Expands the per-level convenience surface: blocking and `try` forms, for
/// both run-time and compile-time format strings.
macro_rules! level_shortcuts {
    ($(($level:ident, $log:ident, $try_log:ident, $log_static:ident, $try_log_static:ident)),* $(,)?) => {$(
        #[doc = concat!("Logs at [`LogLevel::", stringify!($level), "`], blocking until the record is admitted.")]
        pub fn $log<A: ArgPack>(&self, text: &str, args: A) {
            self.log(LogLevel::$level, text, args);
        }

        #[doc = concat!("Logs at [`LogLevel::", stringify!($level), "`] without blocking; `false` means the buffer was full.")]
        pub fn $try_log<A: ArgPack>(&self, text: &str, args: A) -> bool {
            self.try_log(LogLevel::$level, text, args)
        }

        #[doc = concat!("Compile-time-format version of [`Logger::", stringify!($log), "`].")]
        pub fn $log_static<F: FormatSpec, A: ArgPack>(&self, text: StaticFmt<F>, args: A) {
            self.log_static(LogLevel::$level, text, args);
        }

        #[doc = concat!("Compile-time-format version of [`Logger::", stringify!($try_log), "`].")]
        pub fn $try_log_static<F: FormatSpec, A: ArgPack>(&self, text: StaticFmt<F>, args: A) -> bool {
            self.try_log_static(LogLevel::$level, text, args)
        }
    )*};
}

impl<'a> Logger<'a> {
    /// Creates a logger with the default maximum message size.
    pub fn new(buffer: &'a dyn ByteBuffer, sink: &'a dyn Sink) -> Self {
        Self::with_max_message_size(buffer, sink, DEFAULT_MAX_MESSAGE_SIZE)
    }

    /// Creates a logger that refuses records longer than
    /// `max_message_size` bytes on the wire.
    ///
    /// # Panics
    ///
    /// Panics if the buffer cannot hold even one maximum-size message.
    pub fn with_max_message_size(
        buffer: &'a dyn ByteBuffer,
        sink: &'a dyn Sink,
        max_message_size: usize,
    ) -> Self {
        let capacity = buffer.capacity();
        assert!(
            max_message_size <= capacity,
            "the buffer must be able to hold at least one message of {max_message_size} bytes"
        );

        Self {
            buffer,
            sink,
            min_level: AtomicI8::new(LogLevel::Info as i8),
            max_message_size,
            capacity,
            bytes_available: WaitCell::new(capacity),
        }
    }

    /// Records below `level` are accepted and dropped without touching the
    /// buffer. Does not drain records already in flight.
    pub fn set_min_log_level(&self, level: LogLevel) {
        self.min_level.store(level as i8, Ordering::Relaxed);
    }

    pub fn min_log_level(&self) -> LogLevel {
        // The cell only ever holds values stored from a LogLevel.
        LogLevel::try_from(self.min_level.load(Ordering::Relaxed)).unwrap_or(LogLevel::Info)
    }

    // ---------------------------------------------------------------------
    // PRODUCER API
    // ---------------------------------------------------------------------

    /// Logs with a run-time format string, blocking at admission until the
    /// buffer has room for a worst-case record.
    ///
    /// Pair this with the blocking [`read_log`](Logger::read_log) on the
    /// consumer side; a producer parked here is only woken by a consumer
    /// freeing space.
    ///
    /// # Panics
    ///
    /// Panics if the record cannot be written after admission. Admission
    /// guaranteed space for a sole producer, so a failure here means the
    /// record exceeded the maximum message size or the pipeline is being
    /// driven from more threads than it supports.
    pub fn log<A: ArgPack>(&self, level: LogLevel, text: &str, args: A) {
        if (level as i8) < self.min_level.load(Ordering::Relaxed) {
            return;
        }

        let needed = self.max_message_size;
        self.bytes_available
            .wait_until(Ordering::Acquire, |v| v >= needed);

        assert!(
            self.enqueue(decode_dynamic::<A> as Trampoline, level, Some(text), &args),
            "failed to write an admitted log record; this should never happen"
        );
    }

    /// Logs with a run-time format string without ever blocking.
    ///
    /// Returns `true` if the record was enqueued (or filtered out by the
    /// minimum level), `false` if the buffer lacked room or the record was
    /// oversized.
    pub fn try_log<A: ArgPack>(&self, level: LogLevel, text: &str, args: A) -> bool {
        if (level as i8) < self.min_level.load(Ordering::Relaxed) {
            return true;
        }

        self.enqueue(decode_dynamic::<A> as Trampoline, level, Some(text), &args)
    }

    /// Blocking log with a compile-time format string; the format text does
    /// not travel through the buffer.
    ///
    /// # Panics
    ///
    /// As for [`log`](Logger::log).
    pub fn log_static<F: FormatSpec, A: ArgPack>(
        &self,
        level: LogLevel,
        _text: StaticFmt<F>,
        args: A,
    ) {
        if (level as i8) < self.min_level.load(Ordering::Relaxed) {
            return;
        }

        let needed = self.max_message_size;
        self.bytes_available
            .wait_until(Ordering::Acquire, |v| v >= needed);

        assert!(
            self.enqueue(decode_static::<F, A> as Trampoline, level, None, &args),
            "failed to write an admitted log record; this should never happen"
        );
    }

    /// Non-blocking log with a compile-time format string.
    pub fn try_log_static<F: FormatSpec, A: ArgPack>(
        &self,
        level: LogLevel,
        _text: StaticFmt<F>,
        args: A,
    ) -> bool {
        if (level as i8) < self.min_level.load(Ordering::Relaxed) {
            return true;
        }

        self.enqueue(decode_static::<F, A> as Trampoline, level, None, &args)
    }

    level_shortcuts!(
        (Trace, trace, try_trace, trace_static, try_trace_static),
        (Debug, debug, try_debug, debug_static, try_debug_static),
        (Info, info, try_info, info_static, try_info_static),
        (Warn, warn, try_warn, warn_static, try_warn_static),
        (Error, error, try_error, error_static, try_error_static),
        (Critical, critical, try_critical, critical_static, try_critical_static),
    );

    /// Serializes one record into a write session and publishes it.
    fn enqueue<A: ArgPack>(
        &self,
        trampoline: Trampoline,
        level: LogLevel,
        text: Option<&str>,
        args: &A,
    ) -> bool {
        let mut writer = self.buffer.writer();

        let mut good = (trampoline as usize).encode(&mut *writer);
        good = good && (level as i8).encode(&mut *writer);
        if let Some(text) = text {
            good = good && text.encode(&mut *writer);
        }
        good = good && args.encode_all(&mut *writer);

        // Admission control only ever reserves `max_message_size` free
        // bytes, so no committed record may be larger than that.
        if writer.bytes_written() > self.max_message_size {
            return false;
        }

        good = good && writer.commit();
        if !good {
            return false;
        }

        let written = writer.bytes_written();
        drop(writer);

        self.bytes_available.fetch_sub(written, Ordering::AcqRel);
        self.bytes_available.notify_one();
        true
    }

    // ---------------------------------------------------------------------
    // CONSUMER API
    // ---------------------------------------------------------------------

    /// Decodes and dispatches one record if one is ready. Never suspends.
    ///
    /// Returns `false` when the buffer is empty, and also when a record
    /// fails to decode (the session is dropped without commit in that
    /// case, and no sink call happens).
    pub fn try_read_log(&self) -> bool {
        if self.bytes_available.load(Ordering::Acquire) == self.capacity {
            return false;
        }

        let bytes_read = self.drain_one();
        if bytes_read == 0 {
            return false;
        }

        self.publish_read(bytes_read);
        true
    }

    /// Blocks until a record is available, then decodes and dispatches it.
    ///
    /// Only usable opposite the blocking `log` family: a consumer parked
    /// here is woken solely by a producer committing a record.
    ///
    /// # Panics
    ///
    /// Panics if the record that woke us cannot be decoded; the commit
    /// protocol makes that unreachable unless the stream is corrupt.
    pub fn read_log(&self) {
        self.bytes_available.wait(self.capacity, Ordering::Acquire);

        let bytes_read = self.drain_one();
        assert!(
            bytes_read != 0,
            "failed to decode a published log record; this should never happen"
        );

        self.publish_read(bytes_read);
    }

    /// Like [`read_log`](Logger::read_log), but gives up after `timeout`.
    ///
    /// Returns `false` if no record arrived in time.
    pub fn read_log_timeout(&self, timeout: Duration) -> bool {
        if !self
            .bytes_available
            .wait_timeout(self.capacity, timeout, Ordering::Acquire)
        {
            return false;
        }

        let bytes_read = self.drain_one();
        assert!(
            bytes_read != 0,
            "failed to decode a published log record; this should never happen"
        );

        self.publish_read(bytes_read);
        true
    }

    /// Reads one record through a reader session. Returns the bytes
    /// consumed, or 0 if the session failed and was rolled back.
    fn drain_one(&self) -> usize {
        let mut reader = self.buffer.reader();

        let Some(raw) = usize::decode(&mut *reader) else {
            return 0;
        };

        // SAFETY: `raw` was produced by `enqueue` in this same process by
        // casting a `Trampoline` to `usize`, and function pointers are
        // stable for the life of the process. The SPSC commit protocol
        // guarantees the record is either fully visible or not visible at
        // all, so a successfully read identifier is never torn.
        let trampoline: Trampoline = unsafe { std::mem::transmute(raw) };

        if !trampoline(&mut *reader, self.sink) {
            return 0;
        }
        if !reader.commit() {
            return 0;
        }
        reader.bytes_read()
    }

    fn publish_read(&self, bytes_read: usize) {
        self.bytes_available.fetch_add(bytes_read, Ordering::AcqRel);
        self.bytes_available.notify_one();
    }
}
