//! Scalar wire types beyond the Rust primitives: byte strings, rationals and
//! pre-encoded CBOR.

use crate::codec::{CborDecode, CborEncode};
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{CborError, Result};
use crate::registry::CborSchema;
use crate::schema::{Category, FieldSpec, TypeSpec};
use crate::{TAG_EMBEDDED_CBOR, TAG_RATIONAL};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;

/// Largest chunk of a bounded byte string.
pub const BOUNDED_BYTES_CHUNK: usize = 64;

/// Minimal big-endian bytes of `n`, the payload of a bignum tag.
pub fn uint_to_be_bytes(n: u128) -> Vec<u8> {
    let bytes = n.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    bytes[skip..].to_vec()
}

/// Reads a big-endian bignum payload; `None` if it exceeds 128 bits.
pub fn uint_from_be_bytes(bytes: &[u8]) -> Option<u128> {
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    let significant = &bytes[skip..];
    if significant.len() > 16 {
        return None;
    }
    Some(significant.iter().fold(0u128, |acc, b| (acc << 8) | *b as u128))
}

/// A byte string, written as one definite item.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Bytes(#[serde(with = "serde_bytes")] pub Vec<u8>);

impl Bytes {
    pub fn from_hex(s: &str) -> std::result::Result<Self, hex::FromHexError> {
        hex::decode(s).map(Bytes)
    }
}

impl Deref for Bytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(v: Vec<u8>) -> Self {
        Bytes(v)
    }
}

impl From<&[u8]> for Bytes {
    fn from(v: &[u8]) -> Self {
        Bytes(v.to_vec())
    }
}

impl fmt::Debug for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Bytes({})", hex::encode(&self.0))
    }
}

impl fmt::Display for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl CborEncode for Bytes {
    fn encode<W: std::io::Write>(&self, e: &mut Encoder<W>) -> Result<()> {
        e.write_bytes(&self.0)
    }
}

impl CborDecode for Bytes {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        d.read_bytes().map(Bytes)
    }
}

/// A byte string that is split into 64-byte chunks when longer than 64 bytes.
///
/// This is the shape Plutus data requires for byte strings.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct BoundedBytes(#[serde(with = "serde_bytes")] pub Vec<u8>);

impl Deref for BoundedBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for BoundedBytes {
    fn from(v: Vec<u8>) -> Self {
        BoundedBytes(v)
    }
}

impl fmt::Debug for BoundedBytes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BoundedBytes({})", hex::encode(&self.0))
    }
}

impl CborEncode for BoundedBytes {
    fn encode<W: std::io::Write>(&self, e: &mut Encoder<W>) -> Result<()> {
        if self.0.len() <= BOUNDED_BYTES_CHUNK {
            e.write_bytes(&self.0)
        } else {
            e.write_bytes_chunked(&self.0, BOUNDED_BYTES_CHUNK)
        }
    }
}

impl CborDecode for BoundedBytes {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        d.read_bytes().map(BoundedBytes)
    }
}

/// `tag(30) [numerator, denominator]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rational {
    pub numerator: u64,
    pub denominator: u64,
}

impl Rational {
    pub fn new(numerator: u64, denominator: u64) -> Self {
        Rational {
            numerator,
            denominator,
        }
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl CborSchema for Rational {
    fn describe() -> TypeSpec {
        TypeSpec::new("Rational", Category::Array)
            .tag(TAG_RATIONAL)
            .field(FieldSpec::new("numerator", "u64", false))
            .field(FieldSpec::new("denominator", "u64", false))
    }
}

impl CborEncode for Rational {
    fn encode<W: std::io::Write>(&self, e: &mut Encoder<W>) -> Result<()> {
        e.write_tag(TAG_RATIONAL)?;
        e.write_array_header(Some(2))?;
        e.write_u64(self.numerator)?;
        e.write_u64(self.denominator)
    }
}

impl CborDecode for Rational {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        d.expect_tag(TAG_RATIONAL)?;
        let offset = d.position();
        if d.read_array_len()? != Some(2) {
            return Err(CborError::malformed("Rational", offset));
        }
        Ok(Rational {
            numerator: d.read_u64()?,
            denominator: d.read_u64()?,
        })
    }

    fn leading_tag() -> Option<u64> {
        Some(TAG_RATIONAL)
    }
}

/// An opaque, already encoded CBOR item carried byte for byte.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EncodedValue(Vec<u8>);

impl EncodedValue {
    /// Wraps `bytes`, checking that they hold exactly one well-formed item.
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        let mut d = Decoder::new(&bytes);
        d.skip_value()?;
        if !d.is_empty() {
            return Err(CborError::TrailingData {
                offset: d.position(),
            });
        }
        Ok(EncodedValue(bytes))
    }

    /// Encodes `value` and wraps the result.
    pub fn encode_from<T: CborEncode + ?Sized>(value: &T) -> Result<Self> {
        crate::to_vec(value).map(EncodedValue)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Decodes the carried item as `T`.
    pub fn decode_as<T: CborDecode>(&self) -> Result<T> {
        crate::from_slice(&self.0)
    }
}

impl fmt::Debug for EncodedValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "EncodedValue({})", hex::encode(&self.0))
    }
}

impl CborEncode for EncodedValue {
    fn encode<W: std::io::Write>(&self, e: &mut Encoder<W>) -> Result<()> {
        e.write_raw(&self.0)
    }
}

impl CborDecode for EncodedValue {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        d.read_encoded_value().map(|raw| EncodedValue(raw.to_vec()))
    }
}

/// `tag(24) bytes(cbor(T))`: a CBOR item nested inside a byte string.
///
/// The payload is kept encoded and only decoded on request.
pub struct Embedded<T> {
    bytes: Vec<u8>,
    marker: PhantomData<T>,
}

impl<T> Embedded<T> {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Embedded {
            bytes,
            marker: PhantomData,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl<T: CborEncode> Embedded<T> {
    pub fn new(value: &T) -> Result<Self> {
        crate::to_vec(value).map(Self::from_bytes)
    }
}

impl<T: CborDecode> Embedded<T> {
    pub fn decode_inner(&self) -> Result<T> {
        crate::from_slice(&self.bytes)
    }
}

impl<T> Clone for Embedded<T> {
    fn clone(&self) -> Self {
        Embedded::from_bytes(self.bytes.clone())
    }
}

impl<T> PartialEq for Embedded<T> {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl<T> fmt::Debug for Embedded<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Embedded({})", hex::encode(&self.bytes))
    }
}

impl<T> CborEncode for Embedded<T> {
    fn encode<W: std::io::Write>(&self, e: &mut Encoder<W>) -> Result<()> {
        e.write_tag(TAG_EMBEDDED_CBOR)?;
        e.write_bytes(&self.bytes)
    }
}

impl<T> CborDecode for Embedded<T> {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        d.expect_tag(TAG_EMBEDDED_CBOR)?;
        d.read_bytes().map(Self::from_bytes)
    }

    fn leading_tag() -> Option<u64> {
        Some(TAG_EMBEDDED_CBOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{from_slice, to_vec};
    use hex_literal::hex;

    #[test]
    fn test_rational() {
        let rational = Rational::new(3, 4);
        assert_eq!(to_vec(&rational).unwrap(), hex!("d81e820304"));
        assert_eq!(from_slice::<Rational>(&hex!("d81e820304")).unwrap(), rational);
    }

    #[test]
    fn test_rational_checks_arity_first() {
        let err = from_slice::<Rational>(&hex!("d81e83030405")).unwrap_err();
        assert!(matches!(
            err,
            CborError::MalformedPrimitive {
                type_name: "Rational",
                offset: 2
            }
        ));
        assert!(matches!(
            from_slice::<Rational>(&hex!("820304")),
            Err(CborError::UnexpectedTag {
                expected: 30,
                actual: None,
                ..
            })
        ));
    }

    #[test]
    fn test_bounded_bytes_chunking() {
        let chunk = BOUNDED_BYTES_CHUNK;
        let data: Vec<u8> = (0..5 * chunk + 3).map(|i| i as u8).collect();
        let bytes = to_vec(&BoundedBytes(data.clone())).unwrap();

        assert_eq!(bytes[0], 0x5f);
        assert_eq!(*bytes.last().unwrap(), 0xff);
        let mut d = Decoder::new(&bytes[1..bytes.len() - 1]);
        let mut chunks = Vec::new();
        while !d.is_empty() {
            chunks.push(d.read_bytes().unwrap());
        }
        assert_eq!(chunks.len(), 6);
        assert!(chunks[..5].iter().all(|c| c.len() == chunk));
        assert_eq!(chunks[5].len(), 3);

        assert_eq!(from_slice::<BoundedBytes>(&bytes).unwrap().0, data);
    }

    #[test]
    fn test_bounded_bytes_exact_multiple() {
        let data = vec![7u8; 5 * BOUNDED_BYTES_CHUNK];
        let bytes = to_vec(&BoundedBytes(data.clone())).unwrap();
        // 5 chunks, each with a 2-byte head, plus the framing bytes
        assert_eq!(bytes.len(), data.len() + 5 * 2 + 2);
        assert_eq!(from_slice::<BoundedBytes>(&bytes).unwrap().0, data);
    }

    #[test]
    fn test_short_bounded_bytes_stay_definite() {
        let bytes = to_vec(&BoundedBytes(vec![1, 2, 3])).unwrap();
        assert_eq!(bytes, hex!("43010203"));
    }

    #[test]
    fn test_encoded_value_passthrough() {
        // a non-canonical map that must survive untouched
        let raw = hex!("a2 1800 f5 6161 9f01ff");
        let value: EncodedValue = from_slice(&raw).unwrap();
        assert_eq!(value.as_bytes(), raw);
        assert_eq!(to_vec(&value).unwrap(), raw);
        assert!(EncodedValue::new(hex!("0102").to_vec()).is_err());
    }

    #[test]
    fn test_embedded_cbor() {
        let embedded = Embedded::new(&vec![1u64, 2]).unwrap();
        let bytes = to_vec(&embedded).unwrap();
        assert_eq!(bytes, hex!("d818 43 820102"));
        let decoded: Embedded<Vec<u64>> = from_slice(&bytes).unwrap();
        assert_eq!(decoded.decode_inner().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_bytes_json() {
        let json = serde_json::to_string(&Bytes(vec![1, 2])).unwrap();
        assert_eq!(json, "[1,2]");
        assert_eq!(Bytes::from_hex("0a0b").unwrap().to_string(), "0a0b");
    }
}
