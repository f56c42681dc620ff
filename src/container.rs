//! Container codecs: record framing shared by the declaration macros, the nullable
//! wrapper and the dynamic list and map types.

use crate::codec::{CborDecode, CborEncode};
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{CborError, Result};
use crate::schema::{Category, TypeSpec, WireKey, WireType};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

/// Writes the tag (if any) and the array or map head of a record with `len` entries.
pub fn begin_record<W: Write>(e: &mut Encoder<W>, spec: &TypeSpec, len: usize) -> Result<()> {
    if let Some(tag) = spec.leading_tag() {
        e.write_tag(tag)?;
    }
    let len = spec.definite.then_some(len);
    match spec.shape() {
        Category::Map => e.write_map_header(len),
        _ => e.write_array_header(len),
    }
}

pub fn end_record<W: Write>(e: &mut Encoder<W>, spec: &TypeSpec) -> Result<()> {
    e.end_container(spec.definite)
}

/// Reads the tag (if the type has one) and the head of a record, in either framing.
pub fn open_record(d: &mut Decoder<'_>, spec: &TypeSpec) -> Result<Items> {
    if let Some(tag) = spec.leading_tag() {
        d.expect_tag(tag)?;
    }
    let remaining = match spec.shape() {
        Category::Map => d.read_map_len()?,
        _ => d.read_array_len()?,
    };
    Ok(Items {
        remaining,
        type_name: spec.name,
    })
}

/// Element cursor over a definite or indefinite array or map.
#[derive(Debug)]
pub struct Items {
    remaining: Option<u64>,
    type_name: &'static str,
}

impl Items {
    pub fn new(remaining: Option<u64>, type_name: &'static str) -> Self {
        Items {
            remaining,
            type_name,
        }
    }

    /// Advances to the next element; false once the container is exhausted.
    pub fn next(&mut self, d: &Decoder<'_>) -> Result<bool> {
        match &mut self.remaining {
            Some(0) => Ok(false),
            Some(n) => {
                *n -= 1;
                Ok(true)
            }
            None => Ok(!d.at_break()?),
        }
    }

    /// Size hint for preallocation, capped against hostile length headers.
    pub fn size_hint(&self) -> usize {
        self.remaining.map_or(0, |n| n.min(1024) as usize)
    }

    /// Requires the container to be exhausted and consumes an indefinite break.
    pub fn finish(self, d: &mut Decoder<'_>) -> Result<()> {
        let extra = CborError::ExtraElements {
            type_name: self.type_name,
            offset: d.position(),
        };
        match self.remaining {
            Some(0) => Ok(()),
            Some(_) => Err(extra),
            None if d.at_break()? => d.read_break(),
            None => Err(extra),
        }
    }
}

/// Resolves a record slot, falling back to the field type's absent value.
pub fn required<T: CborDecode>(
    slot: Option<T>,
    type_name: &'static str,
    field: &'static str,
) -> Result<T> {
    match slot {
        Some(value) => Ok(value),
        None => T::absent().ok_or(CborError::MissingField { type_name, field }),
    }
}

/// A map key as read from the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapKey {
    Int(i64),
    Text(String),
    /// Any other key item, as hex. It never selects a field.
    Other(String),
}

impl MapKey {
    pub fn read(d: &mut Decoder<'_>) -> Result<Self> {
        let start = d.position();
        match d.peek_type()? {
            WireType::Text => return d.read_text().map(MapKey::Text),
            WireType::UInt | WireType::SInt => {
                let mut int = d.clone();
                if let Ok(key) = int.read_int("map key") {
                    d.seek(int.position());
                    return Ok(MapKey::Int(key));
                }
            }
            _ => {}
        }
        d.skip_value()?;
        Ok(MapKey::Other(hex::encode(d.span(start))))
    }

    pub fn matches(&self, key: &WireKey) -> bool {
        match (self, key) {
            (MapKey::Int(a), WireKey::Int(b)) => a == b,
            (MapKey::Text(a), WireKey::Text(b)) => a == b,
            _ => false,
        }
    }

    /// Declaration index of the field this key selects.
    pub fn field_index(&self, spec: &TypeSpec) -> Result<usize> {
        spec.fields
            .iter()
            .position(|f| f.key.as_ref().is_some_and(|k| self.matches(k)))
            .ok_or_else(|| CborError::UnknownMapKey {
                type_name: spec.name,
                key: self.to_string(),
            })
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MapKey::Int(i) => write!(f, "{i}"),
            MapKey::Text(s) => write!(f, "\"{s}\""),
            MapKey::Other(raw) => f.write_str(raw),
        }
    }
}

impl CborEncode for WireKey {
    fn encode<W: Write>(&self, e: &mut Encoder<W>) -> Result<()> {
        match self {
            WireKey::Int(i) => e.write_i64(*i),
            WireKey::Text(s) => e.write_text(s),
        }
    }
}

// Nullable wrapper: `null` when absent, the inner encoding otherwise.

impl<T: CborEncode> CborEncode for Option<T> {
    fn encode<W: Write>(&self, e: &mut Encoder<W>) -> Result<()> {
        match self {
            Some(value) => value.encode(e),
            None => e.write_null(),
        }
    }

    fn is_absent(&self) -> bool {
        self.is_none()
    }
}

impl<T: CborDecode> CborDecode for Option<T> {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        if d.try_read_null()? {
            Ok(None)
        } else {
            T::decode(d).map(Some)
        }
    }

    fn absent() -> Option<Self> {
        Some(None)
    }
}

fn encode_seq<'a, W, T, I>(e: &mut Encoder<W>, len: Option<usize>, items: I) -> Result<()>
where
    W: Write,
    T: CborEncode + 'a,
    I: IntoIterator<Item = &'a T>,
{
    e.write_array_header(len)?;
    for item in items {
        item.encode(e)?;
    }
    e.end_container(len.is_some())
}

/// Decodes an array of any framing; the flag reports whether it was definite.
pub(crate) fn decode_seq<T: CborDecode>(
    d: &mut Decoder<'_>,
    type_name: &'static str,
) -> Result<(Vec<T>, bool)> {
    let len = d.read_array_len()?;
    d.nested(|d| {
        let mut items = Items::new(len, type_name);
        let mut out = Vec::with_capacity(items.size_hint());
        while items.next(d)? {
            out.push(T::decode(d)?);
        }
        items.finish(d)?;
        Ok((out, len.is_some()))
    })
}

impl<T: CborEncode> CborEncode for [T] {
    fn encode<W: Write>(&self, e: &mut Encoder<W>) -> Result<()> {
        encode_seq(e, Some(self.len()), self)
    }
}

impl<T: CborEncode> CborEncode for Vec<T> {
    fn encode<W: Write>(&self, e: &mut Encoder<W>) -> Result<()> {
        encode_seq(e, Some(self.len()), self)
    }
}

impl<T: CborDecode> CborDecode for Vec<T> {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        decode_seq(d, "Vec").map(|(items, _)| items)
    }
}

/// A list always written with indefinite-length framing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndefList<T>(pub Vec<T>);

impl<T: CborEncode> CborEncode for IndefList<T> {
    fn encode<W: Write>(&self, e: &mut Encoder<W>) -> Result<()> {
        encode_seq(e, None, &self.0)
    }
}

impl<T: CborDecode> CborDecode for IndefList<T> {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        decode_seq(d, "IndefList").map(|(items, _)| IndefList(items))
    }
}

impl<K: CborEncode, V: CborEncode> CborEncode for BTreeMap<K, V> {
    fn encode<W: Write>(&self, e: &mut Encoder<W>) -> Result<()> {
        e.write_map_header(Some(self.len()))?;
        for (k, v) in self {
            k.encode(e)?;
            v.encode(e)?;
        }
        Ok(())
    }
}

impl<K: CborDecode + Ord, V: CborDecode> CborDecode for BTreeMap<K, V> {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let len = d.read_map_len()?;
        d.nested(|d| {
            let mut items = Items::new(len, "BTreeMap");
            let mut out = BTreeMap::new();
            while items.next(d)? {
                let start = d.position();
                let key = K::decode(d)?;
                if out.contains_key(&key) {
                    return Err(CborError::DuplicateMapKey {
                        type_name: "BTreeMap",
                        key: hex::encode(d.span(start)),
                    });
                }
                out.insert(key, V::decode(d)?);
            }
            items.finish(d)?;
            Ok(out)
        })
    }
}

/// A map that keeps entries in wire order, duplicates included.
///
/// Re-encoding reproduces the entry order and framing that were decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct CborMap<K, V> {
    entries: Vec<(K, V)>,
    definite: bool,
}

impl<K, V> Default for CborMap<K, V> {
    fn default() -> Self {
        CborMap {
            entries: Vec::new(),
            definite: true,
        }
    }
}

impl<K, V> CborMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty map written with indefinite-length framing.
    pub fn indefinite() -> Self {
        CborMap {
            entries: Vec::new(),
            definite: false,
        }
    }

    pub fn is_definite(&self) -> bool {
        self.definite
    }

    pub fn push(&mut self, key: K, value: V) {
        self.entries.push((key, value));
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &K) -> Option<&V>
    where
        K: PartialEq,
    {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(K, V)> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> Vec<(K, V)> {
        self.entries
    }
}

impl<K, V> From<Vec<(K, V)>> for CborMap<K, V> {
    fn from(entries: Vec<(K, V)>) -> Self {
        CborMap {
            entries,
            definite: true,
        }
    }
}

impl<K, V> FromIterator<(K, V)> for CborMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter().collect::<Vec<_>>().into()
    }
}

impl<K: CborEncode, V: CborEncode> CborEncode for CborMap<K, V> {
    fn encode<W: Write>(&self, e: &mut Encoder<W>) -> Result<()> {
        e.write_map_header(self.definite.then_some(self.entries.len()))?;
        for (k, v) in &self.entries {
            k.encode(e)?;
            v.encode(e)?;
        }
        e.end_container(self.definite)
    }
}

impl<K: CborDecode, V: CborDecode> CborDecode for CborMap<K, V> {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let len = d.read_map_len()?;
        d.nested(|d| {
            let mut items = Items::new(len, "CborMap");
            let mut entries = Vec::with_capacity(items.size_hint());
            while items.next(d)? {
                let key = K::decode(d)?;
                entries.push((key, V::decode(d)?));
            }
            items.finish(d)?;
            Ok(CborMap {
                entries,
                definite: len.is_some(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{from_slice, to_vec};
    use hex_literal::hex;

    #[test]
    fn test_option_is_null_or_inner() {
        assert_eq!(to_vec(&None::<u64>).unwrap(), hex!("f6"));
        assert_eq!(to_vec(&Some(1u64)).unwrap(), hex!("01"));
        assert_eq!(from_slice::<Option<u64>>(&hex!("f6")).unwrap(), None);
        assert_eq!(from_slice::<Option<u64>>(&hex!("01")).unwrap(), Some(1));
    }

    #[test]
    fn test_vec_accepts_both_framings() {
        let values = vec![1u64, 2, 3];
        assert_eq!(to_vec(&values).unwrap(), hex!("83010203"));
        assert_eq!(from_slice::<Vec<u64>>(&hex!("9f010203ff")).unwrap(), values);
        assert_eq!(to_vec(&IndefList(values.clone())).unwrap(), hex!("9f010203ff"));
        assert_eq!(to_vec(&IndefList::<u64>(vec![])).unwrap(), hex!("9fff"));
    }

    #[test]
    fn test_vec_rejects_missing_break() {
        assert!(from_slice::<Vec<u64>>(&hex!("9f0102")).is_err());
    }

    #[test]
    fn test_btreemap_rejects_duplicates() {
        let mut map = BTreeMap::new();
        map.insert(1u64, "a".to_string());
        map.insert(2u64, "b".to_string());
        let bytes = to_vec(&map).unwrap();
        assert_eq!(bytes, hex!("a2 01 6161 02 6162"));
        assert_eq!(from_slice::<BTreeMap<u64, String>>(&bytes).unwrap(), map);

        let err = from_slice::<BTreeMap<u64, String>>(&hex!("a2 01 6161 01 6162")).unwrap_err();
        assert!(matches!(err, CborError::DuplicateMapKey { ref key, .. } if key == "01"));
    }

    #[test]
    fn test_cbor_map_keeps_order_and_framing() {
        let bytes = hex!("bf 02 6162 01 6161 02 6163 ff");
        let map: CborMap<u64, String> = from_slice(&bytes).unwrap();
        assert_eq!(map.len(), 3);
        assert!(!map.is_definite());
        assert_eq!(map.get(&2).map(String::as_str), Some("b"));
        assert_eq!(to_vec(&map).unwrap(), bytes);

        let built: CborMap<u64, u64> = vec![(5, 6)].into();
        assert_eq!(to_vec(&built).unwrap(), hex!("a10506"));
    }

    #[test]
    fn test_map_key_lookup() {
        let spec = TypeSpec::new("Keyed", Category::Map)
            .field(crate::schema::FieldSpec::new("fee", "u64", false).with_key(WireKey::Int(2)));
        assert_eq!(MapKey::Int(2).field_index(&spec).unwrap(), 0);
        assert!(matches!(
            MapKey::Text("fee".into()).field_index(&spec),
            Err(CborError::UnknownMapKey { .. })
        ));
    }

    #[test]
    fn test_map_key_read_keeps_foreign_keys_as_hex() {
        let bytes = hex!("4101 1bffffffffffffffff 20 6161");
        let mut d = Decoder::new(&bytes);
        assert_eq!(MapKey::read(&mut d).unwrap(), MapKey::Other("4101".into()));
        assert_eq!(
            MapKey::read(&mut d).unwrap(),
            MapKey::Other("1bffffffffffffffff".into())
        );
        assert_eq!(MapKey::read(&mut d).unwrap(), MapKey::Int(-1));
        assert_eq!(MapKey::read(&mut d).unwrap(), MapKey::Text("a".into()));
        assert!(d.remaining().is_empty());
    }
}
