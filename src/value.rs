use crate::codec::{CborDecode, CborEncode};
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{CborError, Result};
use crate::primitives::uint_to_be_bytes;
use crate::schema::WireType;
use crate::{TAG_NEGATIVE_BIGNUM, TAG_POSITIVE_BIGNUM};
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, Visitor},
    ser::SerializeMap,
};
use std::fmt;
use std::io::Write;

/// Dynamic CBOR value type for working with untyped CBOR data
///
/// This type can represent any CBOR value without knowing its type at compile time.
/// Decoding normalizes framing: indefinite strings, arrays and maps come back as
/// their definite equivalents. Use [`Preserved`](crate::Preserved) or
/// [`EncodedValue`](crate::EncodedValue) when the exact bytes matter.
///
/// # Example
/// ```
/// use cardano_cbor::{Value, to_vec, from_slice};
///
/// let value = Value::Map(vec![
///     (Value::Text("name".to_string()), Value::Text("Alice".to_string())),
///     (Value::Text("age".to_string()), Value::Integer(30)),
/// ]);
///
/// let bytes = to_vec(&value).unwrap();
/// let decoded: Value = from_slice(&bytes).unwrap();
/// assert_eq!(value, decoded);
/// assert_eq!(decoded.get("age"), Some(&Value::Integer(30)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value
    Null,
    Undefined,
    /// Boolean value
    Bool(bool),
    /// Integer value, covering the full CBOR range -2^64..2^64
    Integer(i128),
    /// Floating point value
    Float(f64),
    /// Byte string
    Bytes(Vec<u8>),
    /// Text string
    Text(String),
    /// Array of values
    Array(Vec<Value>),
    /// Map entries in wire order
    Map(Vec<(Value, Value)>),
    /// Tagged value (tag number, boxed content)
    Tag(u64, Box<Value>),
    /// Unassigned simple value
    Simple(u8),
}

impl CborEncode for Value {
    fn encode<W: Write>(&self, e: &mut Encoder<W>) -> Result<()> {
        match self {
            Value::Null => e.write_null(),
            Value::Undefined => e.write_undefined(),
            Value::Bool(b) => e.write_bool(*b),
            Value::Integer(i) => write_integer(e, *i),
            Value::Float(f) => e.write_f64(*f),
            Value::Bytes(b) => e.write_bytes(b),
            Value::Text(s) => e.write_text(s),
            Value::Array(items) => items.encode(e),
            Value::Map(entries) => {
                e.write_map_header(Some(entries.len()))?;
                for (k, v) in entries {
                    k.encode(e)?;
                    v.encode(e)?;
                }
                Ok(())
            }
            Value::Tag(tag, value) => {
                e.write_tag(*tag)?;
                value.encode(e)
            }
            Value::Simple(v) => e.write_simple(*v),
        }
    }
}

// Integers beyond the head range fall back to bignums.
fn write_integer<W: Write>(e: &mut Encoder<W>, i: i128) -> Result<()> {
    if let Ok(n) = u64::try_from(i) {
        e.write_u64(n)
    } else if let Ok(n) = u64::try_from(-1 - i) {
        e.write_negative(n)
    } else if i > 0 {
        e.write_tag(TAG_POSITIVE_BIGNUM)?;
        e.write_bytes(&uint_to_be_bytes(i as u128))
    } else {
        e.write_tag(TAG_NEGATIVE_BIGNUM)?;
        e.write_bytes(&uint_to_be_bytes((-1 - i) as u128))
    }
}

impl CborDecode for Value {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let head = d.peek_head()?;
        match head.wire_type() {
            WireType::UInt | WireType::SInt => d.read_int("integer").map(Value::Integer),
            WireType::Bool => d.read_bool().map(Value::Bool),
            WireType::Null => d.read_null().map(|_| Value::Null),
            WireType::Float => d.read_float().map(Value::Float),
            WireType::Bytes => d.read_bytes().map(Value::Bytes),
            WireType::Text => d.read_text().map(Value::Text),
            WireType::Array => Vec::<Value>::decode(d).map(Value::Array),
            WireType::Map => crate::container::CborMap::<Value, Value>::decode(d)
                .map(|map| Value::Map(map.into_entries())),
            WireType::Tag => {
                let tag = d.read_tag()?;
                let value = d.nested(Value::decode)?;
                Ok(Value::Tag(tag, Box::new(value)))
            }
            WireType::Simple => {
                d.skip_value()?;
                match head.argument {
                    Some(23) => Ok(Value::Undefined),
                    Some(v) => Ok(Value::Simple(v as u8)),
                    None => Err(CborError::malformed("simple value", head.offset)),
                }
            }
            WireType::Break => Err(CborError::UnexpectedType {
                expected: "CBOR value",
                actual: WireType::Break,
                offset: head.offset,
            }),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null | Value::Undefined => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => {
                if let Ok(i) = i64::try_from(*i) {
                    serializer.serialize_i64(i)
                } else if let Ok(u) = u64::try_from(*i) {
                    serializer.serialize_u64(u)
                } else {
                    serializer.serialize_i128(*i)
                }
            }
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Array(a) => a.serialize(serializer),
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            // Formats without tags only see the content
            Value::Tag(_, value) => value.serialize(serializer),
            Value::Simple(v) => serializer.serialize_u8(*v),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any valid CBOR value")
            }

            fn visit_bool<E>(self, value: bool) -> std::result::Result<Value, E> {
                Ok(Value::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> std::result::Result<Value, E> {
                Ok(Value::Integer(value as i128))
            }

            fn visit_u64<E>(self, value: u64) -> std::result::Result<Value, E> {
                Ok(Value::Integer(value as i128))
            }

            fn visit_i128<E>(self, value: i128) -> std::result::Result<Value, E> {
                Ok(Value::Integer(value))
            }

            fn visit_f64<E>(self, value: f64) -> std::result::Result<Value, E> {
                Ok(Value::Float(value))
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Value, E>
            where
                E: de::Error,
            {
                Ok(Value::Text(value.to_owned()))
            }

            fn visit_string<E>(self, value: String) -> std::result::Result<Value, E> {
                Ok(Value::Text(value))
            }

            fn visit_bytes<E>(self, value: &[u8]) -> std::result::Result<Value, E>
            where
                E: de::Error,
            {
                Ok(Value::Bytes(value.to_vec()))
            }

            fn visit_byte_buf<E>(self, value: Vec<u8>) -> std::result::Result<Value, E> {
                Ok(Value::Bytes(value))
            }

            fn visit_none<E>(self) -> std::result::Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> std::result::Result<Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_unit<E>(self) -> std::result::Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_seq<V>(self, mut visitor: V) -> std::result::Result<Value, V::Error>
            where
                V: de::SeqAccess<'de>,
            {
                let mut vec = Vec::new();
                while let Some(elem) = visitor.next_element()? {
                    vec.push(elem);
                }
                Ok(Value::Array(vec))
            }

            fn visit_map<V>(self, mut visitor: V) -> std::result::Result<Value, V::Error>
            where
                V: de::MapAccess<'de>,
            {
                let mut entries = Vec::new();
                while let Some(entry) = visitor.next_entry()? {
                    entries.push(entry);
                }
                Ok(Value::Map(entries))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

impl Value {
    /// Returns true if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the value as an integer, if it is one
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_integer().and_then(|i| u64::try_from(i).ok())
    }

    /// Returns the value as bytes, if it is a byte string
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the value as text, if it is a text string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an array, if it is one
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Returns the tag number and inner value, if this is a tagged value
    pub fn as_tag(&self) -> Option<(u64, &Value)> {
        match self {
            Value::Tag(tag, value) => Some((*tag, value)),
            _ => None,
        }
    }

    /// Looks up the first entry under a text key, if this is a map
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries
                .iter()
                .find(|(k, _)| k.as_str() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{from_slice, to_vec};
    use hex_literal::hex;

    fn round_trip(bytes: &[u8]) -> Value {
        let value: Value = from_slice(bytes).unwrap();
        assert_eq!(to_vec(&value).unwrap(), bytes);
        value
    }

    #[test]
    fn test_value_scalars() {
        assert!(round_trip(&hex!("f6")).is_null());
        assert_eq!(round_trip(&hex!("f7")), Value::Undefined);
        assert_eq!(round_trip(&hex!("f5")), Value::Bool(true));
        assert_eq!(round_trip(&hex!("f0")), Value::Simple(16));
        assert_eq!(round_trip(&hex!("3903e7")).as_integer(), Some(-1000));
        assert_eq!(round_trip(&hex!("6449455446")).as_str(), Some("IETF"));
        assert_eq!(round_trip(&hex!("43010203")).as_bytes(), Some(&[1, 2, 3][..]));
    }

    #[test]
    fn test_value_full_integer_range() {
        let max = round_trip(&hex!("1bffffffffffffffff"));
        assert_eq!(max.as_u64(), Some(u64::MAX));
        let min = round_trip(&hex!("3bffffffffffffffff"));
        assert_eq!(min.as_integer(), Some(-(1i128 << 64)));
    }

    #[test]
    fn test_value_bignum_fallback() {
        let big = Value::Integer(1i128 << 64);
        assert_eq!(to_vec(&big).unwrap(), hex!("c2 49 010000000000000000"));
        let small = Value::Integer(-(1i128 << 64) - 1);
        assert_eq!(to_vec(&small).unwrap(), hex!("c3 49 010000000000000000"));
    }

    #[test]
    fn test_value_nested() {
        let value = round_trip(&hex!("a2 6161 82 01 d87980 01 c1 1a514b67b0"));
        let Value::Map(entries) = &value else {
            panic!("expected a map");
        };
        assert_eq!(entries.len(), 2);
        assert_eq!(
            value.get("a").and_then(Value::as_array).map(<[Value]>::len),
            Some(2)
        );
        assert_eq!(entries[1].1.as_tag().map(|(tag, _)| tag), Some(1));
    }

    #[test]
    fn test_value_normalizes_framing() {
        let value: Value = from_slice(&hex!("9f 5f 4101 4102 ff ff")).unwrap();
        assert_eq!(value, Value::Array(vec![Value::Bytes(vec![1, 2])]));
        assert_eq!(to_vec(&value).unwrap(), hex!("81 42 0102"));
    }

    #[test]
    fn test_value_rejects_stray_break() {
        assert!(from_slice::<Value>(&hex!("ff")).is_err());
    }

    #[test]
    fn test_value_to_json() {
        let value: Value = from_slice(&hex!("a2 6161 01 6162 82 f5 f6")).unwrap();
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"a":1,"b":[true,null]}"#);

        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}
