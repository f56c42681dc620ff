//! Encoding and decoding traits implemented by every schema type.
//!
//! Scalars are implemented here; records, unions and collections get their impls
//! from the [declaration macros](crate::cbor_list) and the [`container`](crate::container)
//! module.

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::Result;
use std::io::Write;

pub trait CborEncode {
    fn encode<W: Write>(&self, e: &mut Encoder<W>) -> Result<()>;

    /// True for a null reference. Array records omit absent fields, map records
    /// skip them unless they are nullable, in which case `null` is written.
    fn is_absent(&self) -> bool {
        false
    }
}

pub trait CborDecode: Sized {
    fn decode(d: &mut Decoder<'_>) -> Result<Self>;

    /// The value a record field takes when it is missing from the input.
    ///
    /// Only nullable types have one; a missing required field is an error.
    fn absent() -> Option<Self> {
        None
    }

    /// The tag every encoding of this type starts with, if there is a fixed one.
    fn leading_tag() -> Option<u64> {
        None
    }
}

impl<T: CborEncode + ?Sized> CborEncode for &T {
    fn encode<W: Write>(&self, e: &mut Encoder<W>) -> Result<()> {
        (**self).encode(e)
    }

    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }
}

impl<T: CborEncode + ?Sized> CborEncode for Box<T> {
    fn encode<W: Write>(&self, e: &mut Encoder<W>) -> Result<()> {
        (**self).encode(e)
    }

    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }
}

impl<T: CborDecode> CborDecode for Box<T> {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        T::decode(d).map(Box::new)
    }

    fn absent() -> Option<Self> {
        T::absent().map(Box::new)
    }

    fn leading_tag() -> Option<u64> {
        T::leading_tag()
    }
}

macro_rules! unsigned_codec {
    ($($ty:ty),*) => {
        $(
            impl CborEncode for $ty {
                fn encode<W: Write>(&self, e: &mut Encoder<W>) -> Result<()> {
                    e.write_u64(*self as u64)
                }
            }

            impl CborDecode for $ty {
                fn decode(d: &mut Decoder<'_>) -> Result<Self> {
                    d.read_int(stringify!($ty))
                }
            }
        )*
    };
}

macro_rules! signed_codec {
    ($($ty:ty),*) => {
        $(
            impl CborEncode for $ty {
                fn encode<W: Write>(&self, e: &mut Encoder<W>) -> Result<()> {
                    e.write_i64(*self as i64)
                }
            }

            impl CborDecode for $ty {
                fn decode(d: &mut Decoder<'_>) -> Result<Self> {
                    d.read_int(stringify!($ty))
                }
            }
        )*
    };
}

unsigned_codec!(u8, u16, u32, u64);
signed_codec!(i8, i16, i32, i64);

impl CborEncode for bool {
    fn encode<W: Write>(&self, e: &mut Encoder<W>) -> Result<()> {
        e.write_bool(*self)
    }
}

impl CborDecode for bool {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        d.read_bool()
    }
}

impl CborEncode for str {
    fn encode<W: Write>(&self, e: &mut Encoder<W>) -> Result<()> {
        e.write_text(self)
    }
}

impl CborEncode for String {
    fn encode<W: Write>(&self, e: &mut Encoder<W>) -> Result<()> {
        e.write_text(self)
    }
}

impl CborDecode for String {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        d.read_text()
    }
}

impl CborEncode for f64 {
    fn encode<W: Write>(&self, e: &mut Encoder<W>) -> Result<()> {
        e.write_f64(*self)
    }
}

impl CborDecode for f64 {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        d.read_float()
    }
}

impl CborEncode for f32 {
    fn encode<W: Write>(&self, e: &mut Encoder<W>) -> Result<()> {
        e.write_f64(*self as f64)
    }
}

impl CborDecode for f32 {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        d.read_float().map(|v| v as f32)
    }
}
