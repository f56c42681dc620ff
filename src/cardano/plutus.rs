//! Plutus data: the untyped datum/redeemer tree of Plutus scripts.

use super::MaybeIndefList;
use crate::codec::{CborDecode, CborEncode};
use crate::constr::{begin_constr, end_constr, open_constr};
use crate::container::CborMap;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{CborError, Result};
use crate::primitives::{BoundedBytes, uint_from_be_bytes, uint_to_be_bytes};
use crate::{TAG_NEGATIVE_BIGNUM, TAG_POSITIVE_BIGNUM, cbor_union};
use std::io::Write;

cbor_union! {
    #[derive(Debug, Clone, PartialEq)]
    pub enum PlutusData {
        Constr(PlutusConstr),
        Map(CborMap<PlutusData, PlutusData>),
        Integer(PlutusInt),
        Bytes(BoundedBytes),
        List(MaybeIndefList<PlutusData>),
    }
}

impl PlutusData {
    pub fn int(value: i128) -> Self {
        PlutusData::Integer(PlutusInt::Int(value))
    }

    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        PlutusData::Bytes(BoundedBytes(value.into()))
    }

    pub fn list(items: Vec<PlutusData>) -> Self {
        PlutusData::List(MaybeIndefList::canonical(items))
    }

    pub fn constr(index: u64, fields: Vec<PlutusData>) -> Self {
        PlutusData::Constr(PlutusConstr::new(index, fields))
    }
}

/// A constructor application with any index.
///
/// Indices up to 127 use the compact tags; larger ones use the general
/// `tag(102) [index, fields]` form.
#[derive(Debug, Clone, PartialEq)]
pub struct PlutusConstr {
    pub index: u64,
    pub fields: Vec<PlutusData>,
    pub definite: bool,
}

impl PlutusConstr {
    /// Fields are framed the way the ledger does: indefinite unless empty.
    pub fn new(index: u64, fields: Vec<PlutusData>) -> Self {
        let definite = fields.is_empty();
        PlutusConstr {
            index,
            fields,
            definite,
        }
    }
}

impl CborEncode for PlutusConstr {
    fn encode<W: Write>(&self, e: &mut Encoder<W>) -> Result<()> {
        begin_constr(e, self.index, self.definite.then_some(self.fields.len()))?;
        for field in &self.fields {
            field.encode(e)?;
        }
        end_constr(e, self.definite)
    }
}

impl CborDecode for PlutusConstr {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let (index, mut items, definite) = open_constr(d, "PlutusConstr")?;
        let mut fields = Vec::with_capacity(items.size_hint());
        while items.next(d)? {
            fields.push(PlutusData::decode(d)?);
        }
        items.finish(d)?;
        Ok(PlutusConstr {
            index,
            fields,
            definite,
        })
    }
}

/// A Plutus integer: a plain CBOR integer or a bignum.
///
/// Bignums keep their payload as received so re-encoding is byte exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlutusInt {
    /// Values in the CBOR head range `-2^64..2^64`; wider values are written as bignums.
    Int(i128),
    BigUInt(BoundedBytes),
    BigNInt(BoundedBytes),
}

impl PlutusInt {
    /// The integer value, when it fits in an `i128`.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            PlutusInt::Int(i) => Some(*i),
            PlutusInt::BigUInt(bytes) => {
                uint_from_be_bytes(bytes).and_then(|n| i128::try_from(n).ok())
            }
            PlutusInt::BigNInt(bytes) => uint_from_be_bytes(bytes)
                .and_then(|n| i128::try_from(n).ok())
                .map(|n| -1 - n),
        }
    }
}

impl From<i128> for PlutusInt {
    fn from(value: i128) -> Self {
        PlutusInt::Int(value)
    }
}

impl CborEncode for PlutusInt {
    fn encode<W: Write>(&self, e: &mut Encoder<W>) -> Result<()> {
        match self {
            PlutusInt::Int(i) => {
                if let Ok(n) = u64::try_from(*i) {
                    e.write_u64(n)
                } else if let Ok(n) = u64::try_from(-1 - *i) {
                    e.write_negative(n)
                } else if *i > 0 {
                    e.write_tag(TAG_POSITIVE_BIGNUM)?;
                    BoundedBytes(uint_to_be_bytes(*i as u128)).encode(e)
                } else {
                    e.write_tag(TAG_NEGATIVE_BIGNUM)?;
                    BoundedBytes(uint_to_be_bytes((-1 - *i) as u128)).encode(e)
                }
            }
            PlutusInt::BigUInt(bytes) => {
                e.write_tag(TAG_POSITIVE_BIGNUM)?;
                bytes.encode(e)
            }
            PlutusInt::BigNInt(bytes) => {
                e.write_tag(TAG_NEGATIVE_BIGNUM)?;
                bytes.encode(e)
            }
        }
    }
}

impl CborDecode for PlutusInt {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let offset = d.position();
        match d.peek_tag()? {
            None => d.read_int("PlutusInt").map(PlutusInt::Int),
            Some(TAG_POSITIVE_BIGNUM) => {
                d.read_tag()?;
                BoundedBytes::decode(d).map(PlutusInt::BigUInt)
            }
            Some(TAG_NEGATIVE_BIGNUM) => {
                d.read_tag()?;
                BoundedBytes::decode(d).map(PlutusInt::BigNInt)
            }
            actual => Err(CborError::UnexpectedTag {
                expected: TAG_POSITIVE_BIGNUM,
                actual,
                offset,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{from_slice, to_vec};
    use hex_literal::hex;

    #[test]
    fn test_plutus_int_shapes() {
        assert_eq!(to_vec(&PlutusInt::Int(-1)).unwrap(), hex!("20"));
        assert_eq!(
            to_vec(&PlutusInt::Int(1i128 << 64)).unwrap(),
            hex!("c2 49 010000000000000000")
        );
        let big: PlutusInt = from_slice(&hex!("c3 49 010000000000000000")).unwrap();
        assert_eq!(big.as_i128(), Some(-(1i128 << 64) - 1));
        // leading zeros in the payload are kept
        let padded = hex!("c2 43 000001");
        let int: PlutusInt = from_slice(&padded).unwrap();
        assert_eq!(int.as_i128(), Some(1));
        assert_eq!(to_vec(&int).unwrap(), padded);
    }

    #[test]
    fn test_constr_field_framing() {
        let constr = PlutusConstr::new(0, vec![PlutusData::int(1)]);
        assert_eq!(to_vec(&constr).unwrap(), hex!("d8799f01ff"));
        let empty = PlutusConstr::new(1, vec![]);
        assert_eq!(to_vec(&empty).unwrap(), hex!("d87a80"));
    }

    #[test]
    fn test_constr_index_ranges() {
        let extended: PlutusConstr = from_slice(&hex!("d9050080")).unwrap();
        assert_eq!(extended.index, 7);
        let general: PlutusConstr = from_slice(&hex!("d866 82 18c8 80")).unwrap();
        assert_eq!(general.index, 200);
        assert_eq!(to_vec(&general).unwrap(), hex!("d866 82 18c8 80"));
    }
}
