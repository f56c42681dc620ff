use crate::codec::CborEncode;
use crate::error::Result;
use crate::{BREAK, FALSE, MAJOR_ARRAY, MAJOR_BYTES, MAJOR_MAP, MAJOR_NEGATIVE, MAJOR_SIMPLE};
use crate::{MAJOR_TAG, MAJOR_TEXT, MAJOR_UNSIGNED, NULL, TRUE, UNDEFINED};
use std::io::Write;

/// Indefinite-length marker in the additional information bits.
const INDEFINITE: u8 = 31;

pub struct Encoder<W: Write> {
    writer: W,
}

impl<W: Write> Encoder<W> {
    pub fn new(writer: W) -> Self {
        Encoder { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Writes a head using the shortest argument encoding.
    fn write_type_value(&mut self, major: u8, value: u64) -> Result<()> {
        if value < 24 {
            self.writer.write_all(&[(major << 5) | value as u8])?;
        } else if value < 256 {
            self.writer.write_all(&[(major << 5) | 24, value as u8])?;
        } else if value < 65536 {
            self.writer.write_all(&[(major << 5) | 25])?;
            self.writer.write_all(&(value as u16).to_be_bytes())?;
        } else if value < 4294967296 {
            self.writer.write_all(&[(major << 5) | 26])?;
            self.writer.write_all(&(value as u32).to_be_bytes())?;
        } else {
            self.writer.write_all(&[(major << 5) | 27])?;
            self.writer.write_all(&value.to_be_bytes())?;
        }
        Ok(())
    }

    fn write_indefinite(&mut self, major: u8) -> Result<()> {
        self.writer.write_all(&[(major << 5) | INDEFINITE])?;
        Ok(())
    }

    pub fn write_tag(&mut self, tag: u64) -> Result<()> {
        self.write_type_value(MAJOR_TAG, tag)
    }

    pub fn write_u64(&mut self, v: u64) -> Result<()> {
        self.write_type_value(MAJOR_UNSIGNED, v)
    }

    pub fn write_i64(&mut self, v: i64) -> Result<()> {
        if v >= 0 {
            self.write_type_value(MAJOR_UNSIGNED, v as u64)
        } else {
            self.write_type_value(MAJOR_NEGATIVE, (-1 - v) as u64)
        }
    }

    /// Writes a negative integer `-1 - n` from its raw CBOR argument `n`.
    ///
    /// This reaches down to -2^64, below the range of `i64`.
    pub fn write_negative(&mut self, n: u64) -> Result<()> {
        self.write_type_value(MAJOR_NEGATIVE, n)
    }

    pub fn write_bool(&mut self, v: bool) -> Result<()> {
        let val = if v { TRUE } else { FALSE };
        self.writer.write_all(&[(MAJOR_SIMPLE << 5) | val])?;
        Ok(())
    }

    pub fn write_null(&mut self) -> Result<()> {
        self.writer.write_all(&[(MAJOR_SIMPLE << 5) | NULL])?;
        Ok(())
    }

    pub fn write_undefined(&mut self) -> Result<()> {
        self.writer.write_all(&[(MAJOR_SIMPLE << 5) | UNDEFINED])?;
        Ok(())
    }

    /// Writes a simple value other than the booleans, null and undefined.
    pub fn write_simple(&mut self, v: u8) -> Result<()> {
        self.write_type_value(MAJOR_SIMPLE, v as u64)
    }

    pub fn write_text(&mut self, v: &str) -> Result<()> {
        self.write_type_value(MAJOR_TEXT, v.len() as u64)?;
        self.writer.write_all(v.as_bytes())?;
        Ok(())
    }

    /// Writes a single definite-length byte string.
    pub fn write_bytes(&mut self, v: &[u8]) -> Result<()> {
        self.write_type_value(MAJOR_BYTES, v.len() as u64)?;
        self.writer.write_all(v)?;
        Ok(())
    }

    /// Writes `v` as an indefinite-length byte string made of `chunk_size` chunks.
    ///
    /// Only the last chunk may be shorter; an empty input produces `0x5F 0xFF`.
    pub fn write_bytes_chunked(&mut self, v: &[u8], chunk_size: usize) -> Result<()> {
        self.write_indefinite(MAJOR_BYTES)?;
        for chunk in v.chunks(chunk_size.max(1)) {
            self.write_bytes(chunk)?;
        }
        self.write_break()
    }

    /// `None` starts an indefinite-length array, closed by [`Encoder::write_break`].
    pub fn write_array_header(&mut self, len: Option<usize>) -> Result<()> {
        match len {
            Some(len) => self.write_type_value(MAJOR_ARRAY, len as u64),
            None => self.write_indefinite(MAJOR_ARRAY),
        }
    }

    /// `None` starts an indefinite-length map, closed by [`Encoder::write_break`].
    pub fn write_map_header(&mut self, len: Option<usize>) -> Result<()> {
        match len {
            Some(len) => self.write_type_value(MAJOR_MAP, len as u64),
            None => self.write_indefinite(MAJOR_MAP),
        }
    }

    pub fn write_break(&mut self) -> Result<()> {
        self.writer.write_all(&[BREAK])?;
        Ok(())
    }

    /// Closes a container opened with `definite == false`; a no-op otherwise.
    pub fn end_container(&mut self, definite: bool) -> Result<()> {
        if definite { Ok(()) } else { self.write_break() }
    }

    #[cfg(not(feature = "compact_floats"))]
    pub fn write_f64(&mut self, v: f64) -> Result<()> {
        self.writer.write_all(&[(MAJOR_SIMPLE << 5) | 27])?;
        self.writer.write_all(&v.to_be_bytes())?;
        Ok(())
    }

    /// Writes the shortest float width that represents `v` exactly.
    #[cfg(feature = "compact_floats")]
    pub fn write_f64(&mut self, v: f64) -> Result<()> {
        use half::f16;

        let h = f16::from_f64(v);
        if h.to_f64() == v || (v.is_nan() && h.is_nan()) {
            self.writer.write_all(&[(MAJOR_SIMPLE << 5) | 25])?;
            self.writer.write_all(&h.to_bits().to_be_bytes())?;
        } else if (v as f32) as f64 == v {
            self.writer.write_all(&[(MAJOR_SIMPLE << 5) | 26])?;
            self.writer.write_all(&(v as f32).to_be_bytes())?;
        } else {
            self.writer.write_all(&[(MAJOR_SIMPLE << 5) | 27])?;
            self.writer.write_all(&v.to_be_bytes())?;
        }
        Ok(())
    }

    /// Copies an already encoded CBOR item verbatim.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes)?;
        Ok(())
    }

    pub fn encode<T: CborEncode + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.encode(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn encoded(f: impl FnOnce(&mut Encoder<&mut Vec<u8>>) -> Result<()>) -> Vec<u8> {
        let mut buf = Vec::new();
        f(&mut Encoder::new(&mut buf)).unwrap();
        buf
    }

    #[test]
    fn test_minimal_heads() {
        assert_eq!(encoded(|e| e.write_u64(23)), hex!("17"));
        assert_eq!(encoded(|e| e.write_u64(24)), hex!("1818"));
        assert_eq!(encoded(|e| e.write_u64(1000)), hex!("1903e8"));
        assert_eq!(encoded(|e| e.write_u64(1000000)), hex!("1a000f4240"));
        assert_eq!(
            encoded(|e| e.write_u64(1000000000000)),
            hex!("1b000000e8d4a51000")
        );
        assert_eq!(encoded(|e| e.write_i64(-1000)), hex!("3903e7"));
        assert_eq!(encoded(|e| e.write_negative(u64::MAX)), hex!("3bffffffffffffffff"));
    }

    #[test]
    fn test_chunked_bytes() {
        let data = [1u8, 2, 3, 4, 5];
        assert_eq!(
            encoded(|e| e.write_bytes_chunked(&data, 2)),
            hex!("5f 42 0102 42 0304 41 05 ff")
        );
        assert_eq!(encoded(|e| e.write_bytes_chunked(&[], 64)), hex!("5fff"));
    }

    #[test]
    fn test_indefinite_headers() {
        assert_eq!(
            encoded(|e| {
                e.write_array_header(None)?;
                e.write_u64(1)?;
                e.end_container(false)
            }),
            hex!("9f01ff")
        );
        assert_eq!(encoded(|e| e.write_map_header(Some(0))), hex!("a0"));
    }

    #[test]
    fn test_simple_values() {
        assert_eq!(encoded(|e| e.write_bool(false)), hex!("f4"));
        assert_eq!(encoded(|e| e.write_bool(true)), hex!("f5"));
        assert_eq!(encoded(|e| e.write_null()), hex!("f6"));
        assert_eq!(encoded(|e| e.write_undefined()), hex!("f7"));
    }
}
