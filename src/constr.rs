//! Plutus constructor encoding: `tag(resolve_tag(i)) [fields...]`.

use crate::container::Items;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{CborError, Result};
use std::io::Write;

/// General constructor form `tag(102) [index, [fields...]]` for any index.
pub const TAG_CONSTR_GENERAL: u64 = 102;

const COMPACT_BASE: u64 = 121;
const EXTENDED_BASE: u64 = 1280;
const COMPACT_LIMIT: u64 = 6;
const EXTENDED_LIMIT: u64 = 127;

/// The tag carrying constructor `index`: 121..=127 for 0..=6, then 1280 onwards.
pub const fn resolve_tag(index: u64) -> u64 {
    if index <= COMPACT_LIMIT {
        COMPACT_BASE + index
    } else {
        EXTENDED_BASE - (COMPACT_LIMIT + 1) + index
    }
}

/// The constructor index a compact tag stands for, if it is one.
///
/// Tag 102 is not covered: its index is part of the payload.
pub const fn index_from_tag(tag: u64) -> Option<u64> {
    match tag {
        121..=127 => Some(tag - COMPACT_BASE),
        1280..=1400 => Some(tag - EXTENDED_BASE + COMPACT_LIMIT + 1),
        _ => None,
    }
}

/// Whether `index` can be written with a compact tag rather than the general form.
pub const fn has_compact_tag(index: u64) -> bool {
    index <= EXTENDED_LIMIT
}

/// Writes the head of a constructor with `len` fields, or an indefinite head for `None`.
///
/// Indices without a compact tag use the general form; the caller then writes the
/// fields and closes with [`end_constr`].
pub fn begin_constr<W: Write>(e: &mut Encoder<W>, index: u64, len: Option<usize>) -> Result<()> {
    if has_compact_tag(index) {
        e.write_tag(resolve_tag(index))?;
    } else {
        e.write_tag(TAG_CONSTR_GENERAL)?;
        e.write_array_header(Some(2))?;
        e.write_u64(index)?;
    }
    e.write_array_header(len)
}

pub fn end_constr<W: Write>(e: &mut Encoder<W>, definite: bool) -> Result<()> {
    e.end_container(definite)
}

/// Reads a constructor head of either form and returns its index and field cursor.
pub fn open_constr(d: &mut Decoder<'_>, type_name: &'static str) -> Result<(u64, Items, bool)> {
    let offset = d.position();
    let tag = d.read_tag()?;
    let index = match index_from_tag(tag) {
        Some(index) => index,
        None if tag == TAG_CONSTR_GENERAL => {
            if d.read_array_len()? != Some(2) {
                return Err(CborError::malformed(type_name, offset));
            }
            d.read_u64()?
        }
        None => {
            return Err(CborError::UnexpectedTag {
                expected: COMPACT_BASE,
                actual: Some(tag),
                offset,
            });
        }
    };
    let len = d.read_array_len()?;
    Ok((index, Items::new(len, type_name), len.is_some()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_tag_boundaries() {
        assert_eq!(resolve_tag(0), 121);
        assert_eq!(resolve_tag(6), 127);
        assert_eq!(resolve_tag(7), 1280);
        assert_eq!(resolve_tag(127), 1400);
    }

    #[test]
    fn test_index_from_tag_inverts_resolve_tag() {
        for index in 0..=127 {
            assert_eq!(index_from_tag(resolve_tag(index)), Some(index));
        }
        assert_eq!(index_from_tag(120), None);
        assert_eq!(index_from_tag(128), None);
        assert_eq!(index_from_tag(1401), None);
        assert_eq!(index_from_tag(TAG_CONSTR_GENERAL), None);
    }

    #[test]
    fn test_general_form_round_trip() {
        let mut buf = Vec::new();
        let mut e = Encoder::new(&mut buf);
        begin_constr(&mut e, 200, Some(1)).unwrap();
        e.write_u64(9).unwrap();
        end_constr(&mut e, true).unwrap();
        assert_eq!(buf, hex_literal::hex!("d866 82 18c8 81 09"));

        let mut d = Decoder::new(&buf);
        let (index, mut items, definite) = open_constr(&mut d, "Test").unwrap();
        assert_eq!((index, definite), (200, true));
        assert!(items.next(&d).unwrap());
        assert_eq!(d.read_u64().unwrap(), 9);
        items.finish(&mut d).unwrap();
    }

    #[test]
    fn test_open_constr_rejects_foreign_tags() {
        let mut d = Decoder::new(&hex_literal::hex!("d81e820304"));
        assert!(matches!(
            open_constr(&mut d, "Test"),
            Err(CborError::UnexpectedTag {
                actual: Some(30),
                offset: 0,
                ..
            })
        ));
    }
}
