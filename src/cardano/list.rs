use crate::TAG_SET;
use crate::codec::{CborDecode, CborEncode};
use crate::container::decode_seq;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::Result;
use std::io::Write;
use std::ops::Deref;

/// A list in any of the shapes the ledger accepts, re-encoded in the shape it came in.
///
/// The tagged shapes carry tag 258, used for sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaybeIndefList<T> {
    Def(Vec<T>),
    Indef(Vec<T>),
    DefTagged(Vec<T>),
    IndefTagged(Vec<T>),
}

impl<T> MaybeIndefList<T> {
    /// Plutus shape: indefinite when non-empty, definite otherwise.
    pub fn canonical(items: Vec<T>) -> Self {
        if items.is_empty() {
            MaybeIndefList::Def(items)
        } else {
            MaybeIndefList::Indef(items)
        }
    }

    pub fn is_tagged(&self) -> bool {
        matches!(
            self,
            MaybeIndefList::DefTagged(_) | MaybeIndefList::IndefTagged(_)
        )
    }

    pub fn is_definite(&self) -> bool {
        matches!(self, MaybeIndefList::Def(_) | MaybeIndefList::DefTagged(_))
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            MaybeIndefList::Def(v)
            | MaybeIndefList::Indef(v)
            | MaybeIndefList::DefTagged(v)
            | MaybeIndefList::IndefTagged(v) => v,
        }
    }
}

impl<T> Deref for MaybeIndefList<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        match self {
            MaybeIndefList::Def(v)
            | MaybeIndefList::Indef(v)
            | MaybeIndefList::DefTagged(v)
            | MaybeIndefList::IndefTagged(v) => v,
        }
    }
}

impl<T> Default for MaybeIndefList<T> {
    fn default() -> Self {
        MaybeIndefList::Def(Vec::new())
    }
}

impl<T: CborEncode> CborEncode for MaybeIndefList<T> {
    fn encode<W: Write>(&self, e: &mut Encoder<W>) -> Result<()> {
        if self.is_tagged() {
            e.write_tag(TAG_SET)?;
        }
        let definite = self.is_definite();
        e.write_array_header(definite.then_some(self.len()))?;
        for item in self.iter() {
            item.encode(e)?;
        }
        e.end_container(definite)
    }
}

impl<T: CborDecode> CborDecode for MaybeIndefList<T> {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let tagged = d.peek_tag()? == Some(TAG_SET);
        if tagged {
            d.read_tag()?;
        }
        let (items, definite) = decode_seq(d, "MaybeIndefList")?;
        Ok(match (tagged, definite) {
            (false, true) => MaybeIndefList::Def(items),
            (false, false) => MaybeIndefList::Indef(items),
            (true, true) => MaybeIndefList::DefTagged(items),
            (true, false) => MaybeIndefList::IndefTagged(items),
        })
    }
}
