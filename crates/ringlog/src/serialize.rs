//! Type-directed serialization of log-record fields through a byte buffer.
//!
//! Two wire shapes exist, mirroring the two kinds of things a log call can
//! carry:
//!
//! - **Scalars**: the raw native-endian bytes of the value. The stream
//!   never leaves the process, so endianness is simply "the host's".
//! - **String-likes**: a `usize` length prefix followed by the raw UTF-8
//!   bytes, no terminator.
//!
//! [`Loggable`] records which decoded type an argument turns into: scalars
//! decode to themselves, every string-like decodes to an owned `String`.
//! That decoded type ([`Loggable::Out`]) is what the format renderer sees,
//! so a `&str` argument and the `String` that comes back out are the same
//! thing as far as formatting is concerned.
//!
//! Failures short-circuit: the first field that does not fit (or does not
//! parse) aborts the chain, and the enclosing session is dropped without a
//! commit.

use bytering::{BufferReader, BufferWriter};
use std::fmt::Display;

/// A value that can be appended to a write session.
pub trait Encode {
    /// Writes the wire form of `self`. Returns `false` if the buffer
    /// refused the bytes; the session is then considered poisoned and
    /// should be dropped without commit.
    fn encode(&self, writer: &mut dyn BufferWriter) -> bool;
}

/// A value that can be reconstructed from a read session.
pub trait Decode: Sized {
    /// Reads the wire form. `None` means the record was truncated or did
    /// not parse; the caller drops the session without commit.
    fn decode(reader: &mut dyn BufferReader) -> Option<Self>;
}

/// A log-call argument: how it encodes, and what the consumer decodes.
pub trait Loggable {
    /// The decoded counterpart of this argument, the type the format
    /// renderer works with.
    type Out: Decode + Display;

    fn encode_arg(&self, writer: &mut dyn BufferWriter) -> bool;
}

macro_rules! impl_scalar {
    ($($ty:ty),* $(,)?) => {$(
        impl Encode for $ty {
            fn encode(&self, writer: &mut dyn BufferWriter) -> bool {
                writer.write(&self.to_ne_bytes())
            }
        }

        impl Decode for $ty {
            fn decode(reader: &mut dyn BufferReader) -> Option<Self> {
                let mut bytes = [0u8; std::mem::size_of::<$ty>()];
                reader.read(&mut bytes).then(|| <$ty>::from_ne_bytes(bytes))
            }
        }

        impl Loggable for $ty {
            type Out = $ty;

            fn encode_arg(&self, writer: &mut dyn BufferWriter) -> bool {
                Encode::encode(self, writer)
            }
        }
    )*};
}

impl_scalar!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);

impl Encode for bool {
    fn encode(&self, writer: &mut dyn BufferWriter) -> bool {
        writer.write(&[u8::from(*self)])
    }
}

impl Decode for bool {
    fn decode(reader: &mut dyn BufferReader) -> Option<Self> {
        let mut byte = [0u8; 1];
        reader.read(&mut byte).then(|| byte[0] != 0)
    }
}

impl Loggable for bool {
    type Out = bool;

    fn encode_arg(&self, writer: &mut dyn BufferWriter) -> bool {
        Encode::encode(self, writer)
    }
}

impl Encode for char {
    fn encode(&self, writer: &mut dyn BufferWriter) -> bool {
        u32::from(*self).encode(writer)
    }
}

impl Decode for char {
    fn decode(reader: &mut dyn BufferReader) -> Option<Self> {
        char::from_u32(u32::decode(reader)?)
    }
}

impl Loggable for char {
    type Out = char;

    fn encode_arg(&self, writer: &mut dyn BufferWriter) -> bool {
        Encode::encode(self, writer)
    }
}

impl Encode for str {
    fn encode(&self, writer: &mut dyn BufferWriter) -> bool {
        self.len().encode(writer) && writer.write(self.as_bytes())
    }
}

impl Encode for &str {
    fn encode(&self, writer: &mut dyn BufferWriter) -> bool {
        (**self).encode(writer)
    }
}

impl Encode for String {
    fn encode(&self, writer: &mut dyn BufferWriter) -> bool {
        self.as_str().encode(writer)
    }
}

impl Decode for String {
    fn decode(reader: &mut dyn BufferReader) -> Option<Self> {
        let len = usize::decode(reader)?;
        let mut bytes = vec![0u8; len];
        if !reader.read(&mut bytes) {
            return None;
        }
        String::from_utf8(bytes).ok()
    }
}

impl Loggable for &str {
    type Out = String;

    fn encode_arg(&self, writer: &mut dyn BufferWriter) -> bool {
        Encode::encode(self, writer)
    }
}

impl Loggable for String {
    type Out = String;

    fn encode_arg(&self, writer: &mut dyn BufferWriter) -> bool {
        Encode::encode(self, writer)
    }
}

impl Loggable for &String {
    type Out = String;

    fn encode_arg(&self, writer: &mut dyn BufferWriter) -> bool {
        Encode::encode(self.as_str(), writer)
    }
}

/// The argument tuple of one log call.
///
/// Implemented for tuples of [`Loggable`] values up to arity 8 (a call with
/// a single argument spells it `(x,)`). Encoding and decoding both visit
/// the arguments in declaration order and short-circuit on the first
/// failure.
pub trait ArgPack {
    fn encode_all(&self, writer: &mut dyn BufferWriter) -> bool;

    /// Decodes every argument, then renders `text` against them.
    fn decode_and_render(text: &str, reader: &mut dyn BufferReader) -> Option<String>;
}

impl ArgPack for () {
    fn encode_all(&self, _writer: &mut dyn BufferWriter) -> bool {
        true
    }

    fn decode_and_render(text: &str, _reader: &mut dyn BufferReader) -> Option<String> {
        Some(crate::format::render(text, &[]))
    }
}

macro_rules! impl_arg_pack {
    ($($ty:ident : $idx:tt),+) => {
        impl<$($ty: Loggable),+> ArgPack for ($($ty,)+) {
            fn encode_all(&self, writer: &mut dyn BufferWriter) -> bool {
                $(self.$idx.encode_arg(writer))&&+
            }

            fn decode_and_render(text: &str, reader: &mut dyn BufferReader) -> Option<String> {
                let decoded = ($(<<$ty as Loggable>::Out as Decode>::decode(reader)?,)+);
                Some(crate::format::render(text, &[$(&decoded.$idx as &dyn Display),+]))
            }
        }
    };
}

impl_arg_pack!(A0: 0);
impl_arg_pack!(A0: 0, A1: 1);
impl_arg_pack!(A0: 0, A1: 1, A2: 2);
impl_arg_pack!(A0: 0, A1: 1, A2: 2, A3: 3);
impl_arg_pack!(A0: 0, A1: 1, A2: 2, A3: 3, A4: 4);
impl_arg_pack!(A0: 0, A1: 1, A2: 2, A3: 3, A4: 4, A5: 5);
impl_arg_pack!(A0: 0, A1: 1, A2: 2, A3: 3, A4: 4, A5: 5, A6: 6);
impl_arg_pack!(A0: 0, A1: 1, A2: 2, A3: 3, A4: 4, A5: 5, A6: 6, A7: 7);

#[cfg(test)]
mod tests {
    use super::*;
    use bytering::{ByteBuffer, VectorBuffer};

    fn round_trip<T: Encode + Decode>(value: &T) -> Option<T> {
        let buf = VectorBuffer::new();
        {
            let mut w = buf.writer();
            assert!(value.encode(&mut *w));
            assert!(w.commit());
        }
        let mut r = buf.reader();
        T::decode(&mut *r)
    }

    #[test]
    fn test_scalar_round_trips() {
        assert_eq!(round_trip(&42u8), Some(42));
        assert_eq!(round_trip(&0xBEEFu16), Some(0xBEEF));
        assert_eq!(round_trip(&-7i32), Some(-7));
        assert_eq!(round_trip(&u64::MAX), Some(u64::MAX));
        assert_eq!(round_trip(&usize::MAX), Some(usize::MAX));
        assert_eq!(round_trip(&-1.25f64), Some(-1.25));
        assert_eq!(round_trip(&true), Some(true));
        assert_eq!(round_trip(&'λ'), Some('λ'));
    }

    #[test]
    fn test_string_round_trips() {
        assert_eq!(round_trip(&String::new()), Some(String::new()));
        assert_eq!(
            round_trip(&String::from("hello, ring")),
            Some(String::from("hello, ring"))
        );
        assert_eq!(
            round_trip(&String::from("påkläder 中文")),
            Some(String::from("påkläder 中文"))
        );
    }

    #[test]
    fn test_str_decodes_as_owned_string() {
        let buf = VectorBuffer::new();
        {
            let mut w = buf.writer();
            assert!("borrowed".encode_arg(&mut *w));
            assert!(w.commit());
        }
        let mut r = buf.reader();
        assert_eq!(String::decode(&mut *r), Some(String::from("borrowed")));
    }

    #[test]
    fn test_truncated_scalar_fails() {
        let buf = VectorBuffer::new();
        {
            let mut w = buf.writer();
            assert!(w.write(&[1, 2, 3])); // not enough for a u64
            assert!(w.commit());
        }
        let mut r = buf.reader();
        assert_eq!(u64::decode(&mut *r), None);
    }

    #[test]
    fn test_truncated_string_fails() {
        let buf = VectorBuffer::new();
        {
            let mut w = buf.writer();
            assert!(8usize.encode(&mut *w)); // promises 8 bytes
            assert!(w.write(b"abc")); // delivers 3
            assert!(w.commit());
        }
        let mut r = buf.reader();
        assert_eq!(String::decode(&mut *r), None);
    }

    #[test]
    fn test_invalid_utf8_fails() {
        let buf = VectorBuffer::new();
        {
            let mut w = buf.writer();
            assert!(2usize.encode(&mut *w));
            assert!(w.write(&[0xFF, 0xFE]));
            assert!(w.commit());
        }
        let mut r = buf.reader();
        assert_eq!(String::decode(&mut *r), None);
    }

    #[test]
    fn test_arg_pack_chains_in_order() {
        let buf = VectorBuffer::new();
        {
            let mut w = buf.writer();
            assert!((1u32, "two", 3i64).encode_all(&mut *w));
            assert!(w.commit());
        }
        let mut r = buf.reader();
        let line = <(u32, &str, i64)>::decode_and_render("{} {} {}", &mut *r);
        assert_eq!(line.as_deref(), Some("1 two 3"));
    }

    #[test]
    fn test_arg_pack_short_circuits_on_truncation() {
        let buf = VectorBuffer::new();
        {
            let mut w = buf.writer();
            assert!(7u32.encode(&mut *w)); // first arg only
            assert!(w.commit());
        }
        let mut r = buf.reader();
        assert_eq!(<(u32, u64)>::decode_and_render("{} {}", &mut *r), None);
    }
}
