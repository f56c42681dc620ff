use crate::codec::CborDecode;
use crate::error::{CborError, Result};
use crate::schema::WireType;
use crate::{BREAK, MAJOR_ARRAY, MAJOR_BYTES, MAJOR_MAP, MAJOR_NEGATIVE, MAJOR_SIMPLE, MAJOR_TAG};
use crate::{MAJOR_TEXT, MAJOR_UNSIGNED};

/// Maximum container nesting accepted while decoding.
pub const DECODE_DEPTH_LIMIT: usize = 256;

/// A decoded item head: major type plus its argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Head {
    pub initial: u8,
    pub major: u8,
    /// `None` for indefinite-length items and the break marker.
    pub argument: Option<u64>,
    /// Absolute offset of the initial byte.
    pub offset: usize,
    /// Size of the head in bytes.
    pub len: usize,
}

impl Head {
    pub fn wire_type(&self) -> WireType {
        match self.major {
            MAJOR_UNSIGNED => WireType::UInt,
            MAJOR_NEGATIVE => WireType::SInt,
            MAJOR_BYTES => WireType::Bytes,
            MAJOR_TEXT => WireType::Text,
            MAJOR_ARRAY => WireType::Array,
            MAJOR_MAP => WireType::Map,
            MAJOR_TAG => WireType::Tag,
            _ => match self.initial & 0x1f {
                20 | 21 => WireType::Bool,
                22 => WireType::Null,
                25..=27 => WireType::Float,
                31 => WireType::Break,
                _ => WireType::Simple,
            },
        }
    }
}

/// Reads CBOR items from a byte slice.
///
/// The decoder keeps an absolute offset so any position can be captured as a raw
/// span of the input, and it is cheap to clone for speculative decoding.
#[derive(Debug, Clone)]
pub struct Decoder<'de> {
    data: &'de [u8],
    offset: usize,
    depth: usize,
}

impl<'de> Decoder<'de> {
    pub fn new(data: &'de [u8]) -> Self {
        Decoder {
            data,
            offset: 0,
            depth: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.offset >= self.data.len()
    }

    pub fn remaining(&self) -> &'de [u8] {
        &self.data[self.offset.min(self.data.len())..]
    }

    /// The input consumed since `start`.
    pub fn span(&self, start: usize) -> &'de [u8] {
        &self.data[start.min(self.offset)..self.offset]
    }

    pub(crate) fn seek(&mut self, offset: usize) {
        self.offset = offset;
    }

    fn read_uint_be(&self, pos: usize, n: usize, type_name: &'static str) -> Result<u64> {
        let bytes = self
            .data
            .get(pos..pos + n)
            .ok_or(CborError::malformed(type_name, pos))?;
        Ok(bytes.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64))
    }

    fn head_at(&self, pos: usize, type_name: &'static str) -> Result<Head> {
        let initial = *self
            .data
            .get(pos)
            .ok_or(CborError::malformed(type_name, pos))?;
        let major = initial >> 5;
        let info = initial & 0x1f;
        let (argument, len) = match info {
            0..=23 => (Some(info as u64), 1),
            24 => (Some(self.read_uint_be(pos + 1, 1, type_name)?), 2),
            25 => (Some(self.read_uint_be(pos + 1, 2, type_name)?), 3),
            26 => (Some(self.read_uint_be(pos + 1, 4, type_name)?), 5),
            27 => (Some(self.read_uint_be(pos + 1, 8, type_name)?), 9),
            31 if matches!(
                major,
                MAJOR_BYTES | MAJOR_TEXT | MAJOR_ARRAY | MAJOR_MAP | MAJOR_SIMPLE
            ) =>
            {
                (None, 1)
            }
            _ => return Err(CborError::malformed(type_name, pos)),
        };
        Ok(Head {
            initial,
            major,
            argument,
            offset: pos,
            len,
        })
    }

    pub fn peek_head(&self) -> Result<Head> {
        self.head_at(self.offset, "CBOR item")
    }

    fn read_head(&mut self, type_name: &'static str) -> Result<Head> {
        let head = self.head_at(self.offset, type_name)?;
        self.offset += head.len;
        Ok(head)
    }

    /// Reads a head and checks its major type without consuming on mismatch.
    fn expect_major(&mut self, major: u8, expected: &'static str) -> Result<Head> {
        let head = self.head_at(self.offset, expected)?;
        if head.major != major || (major == MAJOR_SIMPLE && head.argument.is_none()) {
            return Err(CborError::UnexpectedType {
                expected,
                actual: head.wire_type(),
                offset: head.offset,
            });
        }
        self.offset += head.len;
        Ok(head)
    }

    pub fn peek_type(&self) -> Result<WireType> {
        Ok(self.peek_head()?.wire_type())
    }

    /// Reads any integer and narrows it to `T`, failing if it does not fit.
    pub fn read_int<T: TryFrom<i128>>(&mut self, type_name: &'static str) -> Result<T> {
        let head = self.head_at(self.offset, type_name)?;
        let value = match (head.major, head.argument) {
            (MAJOR_UNSIGNED, Some(n)) => n as i128,
            (MAJOR_NEGATIVE, Some(n)) => -1 - n as i128,
            _ => {
                return Err(CborError::UnexpectedType {
                    expected: type_name,
                    actual: head.wire_type(),
                    offset: head.offset,
                });
            }
        };
        let value = T::try_from(value).map_err(|_| CborError::malformed(type_name, head.offset))?;
        self.offset += head.len;
        Ok(value)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.read_int("u64")
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.read_int("i64")
    }

    /// Reads a negative integer and returns its raw argument `n` (value `-1 - n`).
    pub fn read_negative(&mut self) -> Result<u64> {
        let head = self.expect_major(MAJOR_NEGATIVE, "negative integer")?;
        head.argument
            .ok_or(CborError::malformed("negative integer", head.offset))
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        let head = self.head_at(self.offset, "bool")?;
        match head.wire_type() {
            WireType::Bool => {
                self.offset += head.len;
                Ok(head.argument == Some(crate::TRUE as u64))
            }
            actual => Err(CborError::UnexpectedType {
                expected: "bool",
                actual,
                offset: head.offset,
            }),
        }
    }

    pub fn read_null(&mut self) -> Result<()> {
        let head = self.head_at(self.offset, "null")?;
        match head.wire_type() {
            WireType::Null => {
                self.offset += head.len;
                Ok(())
            }
            actual => Err(CborError::UnexpectedType {
                expected: "null",
                actual,
                offset: head.offset,
            }),
        }
    }

    /// Consumes a `null` if one is next.
    pub fn try_read_null(&mut self) -> Result<bool> {
        if self.peek_type()? == WireType::Null {
            self.offset += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn read_float(&mut self) -> Result<f64> {
        let head = self.head_at(self.offset, "float")?;
        let bits = match (head.wire_type(), head.argument) {
            (WireType::Float, Some(bits)) => bits,
            (actual, _) => {
                return Err(CborError::UnexpectedType {
                    expected: "float",
                    actual,
                    offset: head.offset,
                });
            }
        };
        let value = match head.len {
            3 => half::f16::from_bits(bits as u16).to_f64(),
            5 => f32::from_bits(bits as u32) as f64,
            _ => f64::from_bits(bits),
        };
        self.offset += head.len;
        Ok(value)
    }

    fn take(&mut self, len: u64, type_name: &'static str) -> Result<&'de [u8]> {
        let start = self.offset;
        let end = usize::try_from(len)
            .ok()
            .and_then(|len| start.checked_add(len))
            .filter(|end| *end <= self.data.len())
            .ok_or(CborError::malformed(type_name, start))?;
        self.offset = end;
        Ok(&self.data[start..end])
    }

    /// Reads a definite string body or concatenates the chunks of an indefinite one.
    fn read_string_body(&mut self, major: u8, type_name: &'static str) -> Result<Vec<u8>> {
        let head = self.expect_major(major, type_name)?;
        match head.argument {
            Some(len) => Ok(self.take(len, type_name)?.to_vec()),
            None => {
                let mut buf = Vec::new();
                while !self.at_break()? {
                    let chunk = self.head_at(self.offset, type_name)?;
                    if chunk.major != major || chunk.argument.is_none() {
                        return Err(CborError::malformed(type_name, chunk.offset));
                    }
                    self.offset += chunk.len;
                    buf.extend_from_slice(self.take(chunk.argument.unwrap_or(0), type_name)?);
                }
                self.offset += 1;
                Ok(buf)
            }
        }
    }

    /// Reads a byte string, joining indefinite-length chunks into one buffer.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        self.read_string_body(MAJOR_BYTES, "byte string")
    }

    pub fn read_text(&mut self) -> Result<String> {
        let content = self
            .head_at(self.offset, "text string")
            .map_or(self.offset, |head| head.offset + head.len);
        let body = self.read_string_body(MAJOR_TEXT, "text string")?;
        String::from_utf8(body).map_err(|e| CborError::InvalidUtf8 {
            offset: content + e.utf8_error().valid_up_to(),
        })
    }

    pub fn read_tag(&mut self) -> Result<u64> {
        let head = self.expect_major(MAJOR_TAG, "tag")?;
        head.argument.ok_or(CborError::malformed("tag", head.offset))
    }

    /// The tag number of the next item, if it is tagged.
    pub fn peek_tag(&self) -> Result<Option<u64>> {
        let head = self.peek_head()?;
        Ok(if head.major == MAJOR_TAG {
            head.argument
        } else {
            None
        })
    }

    /// Consumes the tag `expected` or fails without consuming anything.
    pub fn expect_tag(&mut self, expected: u64) -> Result<()> {
        let head = self.peek_head()?;
        let actual = if head.major == MAJOR_TAG {
            head.argument
        } else {
            None
        };
        if actual != Some(expected) {
            return Err(CborError::UnexpectedTag {
                expected,
                actual,
                offset: head.offset,
            });
        }
        self.offset += head.len;
        Ok(())
    }

    /// Reads an array head; `None` means indefinite length.
    pub fn read_array_len(&mut self) -> Result<Option<u64>> {
        Ok(self.expect_major(MAJOR_ARRAY, "array")?.argument)
    }

    /// Reads a map head; `None` means indefinite length.
    pub fn read_map_len(&mut self) -> Result<Option<u64>> {
        Ok(self.expect_major(MAJOR_MAP, "map")?.argument)
    }

    pub fn at_break(&self) -> Result<bool> {
        match self.data.get(self.offset) {
            Some(b) => Ok(*b == BREAK),
            None => Err(CborError::malformed("break", self.offset)),
        }
    }

    pub fn read_break(&mut self) -> Result<()> {
        if self.at_break()? {
            self.offset += 1;
            Ok(())
        } else {
            Err(CborError::malformed("break", self.offset))
        }
    }

    /// Runs `f` one nesting level deeper, failing past [`DECODE_DEPTH_LIMIT`].
    pub fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= DECODE_DEPTH_LIMIT {
            return Err(CborError::DepthExceeded {
                offset: self.offset,
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Skips one complete item, including tags and nested content.
    pub fn skip_value(&mut self) -> Result<()> {
        let head = self.read_head("CBOR item")?;
        match (head.major, head.argument) {
            (MAJOR_UNSIGNED | MAJOR_NEGATIVE | MAJOR_SIMPLE, Some(_)) => Ok(()),
            (MAJOR_BYTES | MAJOR_TEXT, Some(len)) => self.take(len, "string").map(|_| ()),
            (MAJOR_BYTES | MAJOR_TEXT, None) => {
                self.offset = head.offset;
                self.read_string_body(head.major, "string").map(|_| ())
            }
            (MAJOR_TAG, Some(_)) => self.nested(|d| d.skip_value()),
            (MAJOR_ARRAY | MAJOR_MAP, count) => {
                let per_entry = if head.major == MAJOR_MAP { 2 } else { 1 };
                self.nested(|d| match count {
                    Some(n) => {
                        for _ in 0..n.saturating_mul(per_entry) {
                            d.skip_value()?;
                        }
                        Ok(())
                    }
                    None => {
                        while !d.at_break()? {
                            for _ in 0..per_entry {
                                d.skip_value()?;
                            }
                        }
                        d.read_break()
                    }
                })
            }
            _ => Err(CborError::malformed("CBOR item", head.offset)),
        }
    }

    /// Skips one complete item and returns its exact encoded bytes.
    pub fn read_encoded_value(&mut self) -> Result<&'de [u8]> {
        let start = self.offset;
        self.skip_value()?;
        Ok(self.span(start))
    }

    pub fn decode<T: CborDecode>(&mut self) -> Result<T> {
        T::decode(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_read_integers_of_any_width() {
        // 5 encoded with a needlessly wide 8-byte argument is still accepted
        let mut d = Decoder::new(&hex!("1b0000000000000005"));
        assert_eq!(d.read_int::<u8>("u8").unwrap(), 5);
        assert!(d.is_empty());

        let mut d = Decoder::new(&hex!("3903e7"));
        assert_eq!(d.read_i64().unwrap(), -1000);
    }

    #[test]
    fn test_width_overflow() {
        let mut d = Decoder::new(&hex!("190100"));
        let err = d.read_int::<u8>("u8").unwrap_err();
        assert!(matches!(
            err,
            CborError::MalformedPrimitive {
                type_name: "u8",
                offset: 0
            }
        ));
        // nothing was consumed
        assert_eq!(d.position(), 0);

        let mut d = Decoder::new(&hex!("20"));
        assert!(d.read_u64().is_err());
    }

    #[test]
    fn test_truncated_input() {
        let mut d = Decoder::new(&hex!("1a0001"));
        assert!(matches!(
            d.read_u64(),
            Err(CborError::MalformedPrimitive { offset: 0, .. })
        ));

        let mut d = Decoder::new(&hex!("4401020304"));
        assert_eq!(d.read_bytes().unwrap(), vec![1, 2, 3, 4]);
        let mut d = Decoder::new(&hex!("44010203"));
        assert!(matches!(
            d.read_bytes(),
            Err(CborError::MalformedPrimitive { offset: 1, .. })
        ));
    }

    #[test]
    fn test_indefinite_bytes_are_joined() {
        let mut d = Decoder::new(&hex!("5f 42 0102 43 030405 ff"));
        assert_eq!(d.read_bytes().unwrap(), vec![1, 2, 3, 4, 5]);
        assert!(d.is_empty());
    }

    #[test]
    fn test_indefinite_bytes_reject_foreign_chunks() {
        let mut d = Decoder::new(&hex!("5f 61 61 ff"));
        assert!(matches!(
            d.read_bytes(),
            Err(CborError::MalformedPrimitive { offset: 1, .. })
        ));
    }

    #[test]
    fn test_text_and_utf8() {
        let mut d = Decoder::new(&hex!("7f 62 4945 62 5446 ff"));
        assert_eq!(d.read_text().unwrap(), "IETF");
        let mut d = Decoder::new(&hex!("62 c328"));
        assert!(matches!(d.read_text(), Err(CborError::InvalidUtf8 { .. })));
    }

    #[test]
    fn test_floats() {
        assert_eq!(Decoder::new(&hex!("f93e00")).read_float().unwrap(), 1.5);
        assert_eq!(
            Decoder::new(&hex!("fa47c35000")).read_float().unwrap(),
            100000.0
        );
        assert_eq!(
            Decoder::new(&hex!("fbc010666666666666")).read_float().unwrap(),
            -4.1
        );
    }

    #[test]
    fn test_expect_tag_does_not_consume_on_mismatch() {
        let mut d = Decoder::new(&hex!("d87a80"));
        let err = d.expect_tag(121).unwrap_err();
        assert!(matches!(
            err,
            CborError::UnexpectedTag {
                expected: 121,
                actual: Some(122),
                offset: 0
            }
        ));
        assert_eq!(d.position(), 0);
        d.expect_tag(122).unwrap();
        assert_eq!(d.read_array_len().unwrap(), Some(0));
    }

    #[test]
    fn test_peek_types() {
        assert_eq!(Decoder::new(&hex!("f6")).peek_type().unwrap(), WireType::Null);
        assert_eq!(Decoder::new(&hex!("9f")).peek_type().unwrap(), WireType::Array);
        assert_eq!(Decoder::new(&hex!("ff")).peek_type().unwrap(), WireType::Break);
        assert_eq!(Decoder::new(&hex!("c2")).peek_type().unwrap(), WireType::Tag);
    }

    #[test]
    fn test_read_encoded_value() {
        let data = hex!("82 d8799f0102ff a1 6161 5f41 01ff 07");
        let mut d = Decoder::new(&data);
        assert_eq!(d.read_encoded_value().unwrap(), &data[..data.len() - 1]);
        assert_eq!(d.read_u64().unwrap(), 7);
    }

    #[test]
    fn test_depth_limit() {
        let mut data = vec![0x81; DECODE_DEPTH_LIMIT + 1];
        data.push(0x00);
        let mut d = Decoder::new(&data);
        assert!(matches!(
            d.skip_value(),
            Err(CborError::DepthExceeded { .. })
        ));
    }
}
