use crate::codec::{CborDecode, CborEncode};
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::Result;
use std::io::Write;
use std::ops::Deref;

/// A decoded value together with the exact bytes it was decoded from.
///
/// Re-encoding an untouched value writes the original bytes back, so hashes and
/// signatures computed over them stay valid even when the input used a non-canonical
/// encoding. Any mutable access drops the original bytes.
#[derive(Debug, Clone)]
pub struct Preserved<T> {
    value: T,
    raw: Option<Vec<u8>>,
}

impl<T> Preserved<T> {
    /// Wraps a freshly built value that has no original encoding.
    pub fn new(value: T) -> Self {
        Preserved { value, raw: None }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut T {
        self.raw = None;
        &mut self.value
    }

    /// The bytes the value was decoded from, while it has not been modified.
    pub fn raw(&self) -> Option<&[u8]> {
        self.raw.as_deref()
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for Preserved<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> From<T> for Preserved<T> {
    fn from(value: T) -> Self {
        Preserved::new(value)
    }
}

impl<T: PartialEq> PartialEq for Preserved<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: CborEncode> CborEncode for Preserved<T> {
    fn encode<W: Write>(&self, e: &mut Encoder<W>) -> Result<()> {
        match &self.raw {
            Some(raw) => e.write_raw(raw),
            None => self.value.encode(e),
        }
    }
}

impl<T: CborDecode> CborDecode for Preserved<T> {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let start = d.position();
        let value = T::decode(d)?;
        Ok(Preserved {
            value,
            raw: Some(d.span(start).to_vec()),
        })
    }

    fn leading_tag() -> Option<u64> {
        T::leading_tag()
    }
}
