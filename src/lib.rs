//! # Cardano CBOR Library
//!
//! A schema-driven CBOR (RFC 8949) encoder/decoder for Cardano ledger and Plutus data.
//!
//! ## Features
//! - Declaration macros generating typed codecs for each schema category:
//!   - Array records (`cbor_list!`), positional or with explicit wire positions
//!   - Map records (`cbor_map!`) with integer or text keys, optionally nullable
//!   - Plutus constructors (`cbor_constr!`): `tag(121 + i | 1280 + i - 7) [fields...]`
//!   - Unions (`cbor_union!`) resolved by leading tag or by ordered trial decoding
//!   - Single-field wrappers (`cbor_newtype!`)
//! - Cardano tag conventions:
//!   - Rational numbers (tag 30)
//!   - Embedded CBOR (tag 24)
//!   - Sets (tag 258)
//!   - Bignums (tags 2 and 3) inside Plutus data
//! - Byte-exact round trips: [`Preserved`] re-emits the bytes a value was decoded from
//!   until it is modified, and [`EncodedValue`] carries opaque CBOR untouched
//! - Definite and indefinite framing for arrays, maps and byte strings
//!
//! ## Determinism
//! Integers and lengths always use the shortest head. Floats are written as f64
//! unless the `compact_floats` feature is enabled. Decoding accepts any valid width
//! and both framings, and fails if a value does not fit the target type.
//!
//! ## Example
//! ```rust
//! use cardano_cbor::{cbor_constr, cbor_union, from_slice, to_vec};
//!
//! cbor_constr! {
//!     [index = 0]
//!     #[derive(Debug, PartialEq)]
//!     pub struct Just {
//!         pub value: u64,
//!     }
//! }
//!
//! cbor_constr! {
//!     [index = 1]
//!     #[derive(Debug, PartialEq)]
//!     pub struct Nothing {}
//! }
//!
//! cbor_union! {
//!     #[derive(Debug, PartialEq)]
//!     pub enum Maybe {
//!         Just(Just),
//!         Nothing(Nothing),
//!     }
//! }
//!
//! let bytes = to_vec(&Maybe::Just(Just { value: 5 })).unwrap();
//! assert_eq!(bytes, [0xd8, 0x79, 0x81, 0x05]);
//! assert_eq!(from_slice::<Maybe>(&[0xd8, 0x7a, 0x80]).unwrap(), Maybe::Nothing(Nothing {}));
//! ```

use std::io::Write;

pub mod cardano;
pub mod codec;
pub mod constr;
pub mod container;
pub mod decoder;
pub mod encoder;
pub mod error;
mod macros;
pub mod preserved;
pub mod primitives;
pub mod registry;
pub mod schema;
pub mod tags;
pub mod union;
pub mod value;

pub use codec::{CborDecode, CborEncode};
pub use container::{CborMap, IndefList};
pub use decoder::{DECODE_DEPTH_LIMIT, Decoder};
pub use encoder::Encoder;
pub use error::{CborError, Result};
pub use preserved::Preserved;
pub use primitives::{BoundedBytes, Bytes, Embedded, EncodedValue, Rational};
pub use registry::CborSchema;
pub use tags::Tagged;
pub use union::CborUnion;
pub use value::Value;

// CBOR major types
pub(crate) const MAJOR_UNSIGNED: u8 = 0;
pub(crate) const MAJOR_NEGATIVE: u8 = 1;
pub(crate) const MAJOR_BYTES: u8 = 2;
pub(crate) const MAJOR_TEXT: u8 = 3;
pub(crate) const MAJOR_ARRAY: u8 = 4;
pub(crate) const MAJOR_MAP: u8 = 5;
pub(crate) const MAJOR_TAG: u8 = 6;
pub(crate) const MAJOR_SIMPLE: u8 = 7;

// Tags used by Cardano data
pub const TAG_POSITIVE_BIGNUM: u64 = 2; // Positive bignum
pub const TAG_NEGATIVE_BIGNUM: u64 = 3; // Negative bignum
pub const TAG_EMBEDDED_CBOR: u64 = 24;  // Encoded CBOR data item
pub const TAG_RATIONAL: u64 = 30;       // Rational number
pub const TAG_SET: u64 = 258;           // Set / tagged list

// Additional info values
pub(crate) const FALSE: u8 = 20;
pub(crate) const TRUE: u8 = 21;
pub(crate) const NULL: u8 = 22;
pub(crate) const UNDEFINED: u8 = 23;
pub(crate) const BREAK: u8 = 0xff;

// Convenience functions
pub fn to_vec<T: CborEncode + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut encoder = Encoder::new(&mut buf);
    encoder.encode(value)?;
    Ok(buf)
}

pub fn to_writer<W: Write, T: CborEncode + ?Sized>(writer: W, value: &T) -> Result<()> {
    let mut encoder = Encoder::new(writer);
    encoder.encode(value)
}

/// Decodes exactly one value; bytes left after it are an error.
pub fn from_slice<T: CborDecode>(slice: &[u8]) -> Result<T> {
    let (value, consumed) = from_slice_with_consumed(slice)?;
    if consumed != slice.len() {
        return Err(CborError::TrailingData { offset: consumed });
    }
    Ok(value)
}

/// Decodes the value at the start of `slice` and reports how many bytes it used.
pub fn from_slice_with_consumed<T: CborDecode>(slice: &[u8]) -> Result<(T, usize)> {
    let mut decoder = Decoder::new(slice);
    let value = decoder.decode()?;
    Ok((value, decoder.position()))
}

/// Decodes one value and keeps its original bytes for byte-exact re-encoding.
pub fn from_slice_preserved<T: CborDecode>(slice: &[u8]) -> Result<Preserved<T>> {
    from_slice(slice)
}

/// Decodes values packed back to back until the input is exhausted.
pub fn decode_sequence<T: CborDecode>(slice: &[u8]) -> Result<Vec<T>> {
    let mut decoder = Decoder::new(slice);
    let mut values = Vec::new();
    while !decoder.is_empty() {
        values.push(decoder.decode()?);
    }
    Ok(values)
}

// Tagged value helpers
/// Encode a tagged value (tag number + content)
pub fn encode_tagged<W: Write, T: CborEncode + ?Sized>(
    writer: &mut W,
    tag: u64,
    value: &T,
) -> Result<()> {
    let mut encoder = Encoder::new(writer);
    encoder.write_tag(tag)?;
    encoder.encode(value)?;
    Ok(())
}
