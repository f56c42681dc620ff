use crate::codec::{CborDecode, CborEncode};
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// A tagged CBOR value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tagged<T> {
    /// The CBOR tag number, `None` when the item carried no tag
    #[serde(default)]
    pub tag: Option<u64>,
    /// The tagged value
    pub value: T,
}

impl<T> Tagged<T> {
    /// Create a new tagged value
    pub fn new(tag: Option<u64>, value: T) -> Self {
        Tagged { tag, value }
    }
}

impl<T: CborEncode> CborEncode for Tagged<T> {
    fn encode<W: Write>(&self, e: &mut Encoder<W>) -> Result<()> {
        if let Some(tag) = self.tag {
            e.write_tag(tag)?;
        }
        self.value.encode(e)
    }
}

// Only the outermost tag is captured; nested tags belong to the value.
impl<T: CborDecode> CborDecode for Tagged<T> {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let tag = match d.peek_tag()? {
            Some(_) => Some(d.read_tag()?),
            None => None,
        };
        Ok(Tagged {
            tag,
            value: T::decode(d)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TAG_SET, from_slice, to_vec};
    use hex_literal::hex;

    #[test]
    fn test_tagged_deserialize_from_json_object() {
        let json = r#"{"tag": 258, "value": [1, 2]}"#;
        let tagged: Tagged<Vec<u64>> = serde_json::from_str(json).unwrap();

        assert_eq!(tagged.tag, Some(TAG_SET));
        assert_eq!(tagged.value, vec![1, 2]);
    }

    #[test]
    fn test_tagged_deserialize_without_tag() {
        let json = r#"{"value": "plain"}"#;
        let tagged: Tagged<String> = serde_json::from_str(json).unwrap();

        assert_eq!(tagged.tag, None);
        assert_eq!(tagged.value, "plain");
    }

    #[test]
    fn test_tagged_round_trip_through_cbor() {
        let tagged = Tagged::new(Some(TAG_SET), vec![1u64, 2]);
        let cbor = to_vec(&tagged).unwrap();
        assert_eq!(cbor, hex!("d90102 82 01 02"));
        assert_eq!(from_slice::<Tagged<Vec<u64>>>(&cbor).unwrap(), tagged);
    }

    #[test]
    fn test_untagged_item_decodes_with_no_tag() {
        let tagged: Tagged<u64> = from_slice(&hex!("0a")).unwrap();
        assert_eq!(tagged, Tagged::new(None, 10));
    }

    #[test]
    fn test_only_outer_tag_is_taken() {
        let tagged: Tagged<Tagged<u64>> = from_slice(&hex!("c1 c2 01")).unwrap();
        assert_eq!(tagged.tag, Some(1));
        assert_eq!(tagged.value, Tagged::new(Some(2), 1));
    }
}
