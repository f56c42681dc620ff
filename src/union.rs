//! Union resolution: picking the concrete variant an encoded item belongs to.
//!
//! A union whose variants all start with distinct tags is resolved by peeking the
//! tag. Any other union is resolved by trial decoding: each variant is attempted in
//! declaration order and the first one that decodes wins.
//!
//! Trial decoding is accelerated by a [`DispatchCache`] keyed by the item's
//! [`Discriminant`]. An entry is only recorded when every variant declared before
//! the winner rejected the item by its head alone, so a cached dispatch always
//! reaches the variant a cold trial decode would have picked.

use crate::decoder::{Decoder, Head};
use crate::error::{CandidateFailure, CborError, Result};
use crate::registry::CborSchema;
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::OnceLock;
use tracing::{debug, trace};

/// Decoder for one candidate variant of a union `U`.
pub struct Variant<U> {
    pub name: &'static str,
    /// Leading tag of the variant's encoding, when it has a fixed one.
    pub tag: Option<u64>,
    pub decode: fn(&mut Decoder<'_>) -> Result<U>,
}

impl<U> Variant<U> {
    pub fn new(
        name: &'static str,
        tag: Option<u64>,
        decode: fn(&mut Decoder<'_>) -> Result<U>,
    ) -> Self {
        Variant { name, tag, decode }
    }
}

/// A closed sum type whose variants are listed in resolution order.
pub trait CborUnion: CborSchema + Sized + 'static {
    fn variants() -> Vec<Variant<Self>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Every variant has its own leading tag.
    TagDispatch,
    TrialDecode,
}

impl Strategy {
    pub fn for_variants<U>(variants: &[Variant<U>]) -> Self {
        let tags: Vec<u64> = variants.iter().filter_map(|v| v.tag).collect();
        let distinct = tags
            .iter()
            .enumerate()
            .all(|(i, tag)| !tags[..i].contains(tag));
        if tags.len() == variants.len() && distinct {
            Strategy::TagDispatch
        } else {
            Strategy::TrialDecode
        }
    }
}

/// Head fingerprint of an encoded item: its initial byte and header argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Discriminant {
    pub initial: u8,
    pub argument: Option<u64>,
}

impl From<Head> for Discriminant {
    fn from(head: Head) -> Self {
        Discriminant {
            initial: head.initial,
            argument: head.argument,
        }
    }
}

/// Process-wide map from (union type, discriminant) to the winning variant index.
///
/// Entries are pure functions of static schema data, so racing inserts of the same
/// key store the same value and are harmless.
pub struct DispatchCache {
    entries: DashMap<(TypeId, Discriminant), usize>,
}

static DISPATCH_CACHE: OnceLock<DispatchCache> = OnceLock::new();

impl DispatchCache {
    pub fn global() -> &'static DispatchCache {
        DISPATCH_CACHE.get_or_init(|| DispatchCache {
            entries: DashMap::new(),
        })
    }

    pub fn lookup<U: 'static>(&self, discriminant: Discriminant) -> Option<usize> {
        self.entries
            .get(&(TypeId::of::<U>(), discriminant))
            .map(|entry| *entry.value())
    }

    pub fn insert<U: 'static>(&self, discriminant: Discriminant, variant: usize) {
        self.entries
            .insert((TypeId::of::<U>(), discriminant), variant);
    }

    pub fn remove<U: 'static>(&self, discriminant: Discriminant) -> Option<usize> {
        self.entries
            .remove(&(TypeId::of::<U>(), discriminant))
            .map(|(_, variant)| variant)
    }

    /// Drops every cached entry of the union `U`.
    pub fn clear_type<U: 'static>(&self) {
        let id = TypeId::of::<U>();
        self.entries.retain(|(type_id, _), _| *type_id != id);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Decodes one item as the union `U`.
pub fn decode_union<U: CborUnion>(d: &mut Decoder<'_>) -> Result<U> {
    let variants = U::variants();
    d.nested(|d| match Strategy::for_variants(&variants) {
        Strategy::TagDispatch => dispatch_by_tag(d, &variants),
        Strategy::TrialDecode => trial_decode(d, &variants),
    })
}

fn type_name<U: CborUnion>() -> &'static str {
    crate::registry::spec::<U>().map_or(std::any::type_name::<U>(), |spec| spec.name)
}

/// Most input bytes a union failure keeps, so nested failures stay small.
pub const RAW_HEX_LIMIT: usize = 64;

/// Hex of the item at the cursor. Items longer than [`RAW_HEX_LIMIT`] bytes, or
/// malformed ones, are cut to that many bytes and marked with a trailing `...`.
fn raw_hex(d: &Decoder<'_>) -> String {
    let remaining = d.remaining();
    let window = &remaining[..remaining.len().min(RAW_HEX_LIMIT)];
    match Decoder::new(window).read_encoded_value() {
        Ok(raw) => hex::encode(raw),
        Err(_) => format!("{}...", hex::encode(window)),
    }
}

fn failed<U: CborUnion>(d: &Decoder<'_>, candidates: Vec<CandidateFailure>) -> CborError {
    let type_name = type_name::<U>();
    debug!(type_name, candidates = candidates.len(), "no union variant matched");
    CborError::UnionDecodeFailed {
        type_name,
        candidates,
        raw_hex: raw_hex(d),
    }
}

fn dispatch_by_tag<U: CborUnion>(d: &mut Decoder<'_>, variants: &[Variant<U>]) -> Result<U> {
    let offset = d.position();
    let actual = d.peek_tag()?;
    if let Some(variant) = variants.iter().find(|v| v.tag.is_some() && v.tag == actual) {
        let mut trial = d.clone();
        return match (variant.decode)(&mut trial) {
            Ok(value) => {
                d.seek(trial.position());
                Ok(value)
            }
            Err(error) => Err(failed::<U>(
                d,
                vec![CandidateFailure {
                    variant: variant.name,
                    error,
                }],
            )),
        };
    }
    let candidates = variants
        .iter()
        .map(|v| CandidateFailure {
            variant: v.name,
            error: CborError::UnexpectedTag {
                expected: v.tag.unwrap_or_default(),
                actual,
                offset,
            },
        })
        .collect();
    Err(failed::<U>(d, candidates))
}

fn trial_decode<U: CborUnion>(d: &mut Decoder<'_>, variants: &[Variant<U>]) -> Result<U> {
    let start = d.position();
    let discriminant = Discriminant::from(d.peek_head()?);
    let cache = DispatchCache::global();

    // A cached variant that fails is not attempted a second time below.
    let mut cached_failure = None;
    if let Some(index) = cache.lookup::<U>(discriminant) {
        if let Some(variant) = variants.get(index) {
            let mut trial = d.clone();
            match (variant.decode)(&mut trial) {
                Ok(value) => {
                    d.seek(trial.position());
                    return Ok(value);
                }
                Err(error) => {
                    debug!(
                        variant = variant.name,
                        %error,
                        "cached union variant rejected the input, falling back to trial decode"
                    );
                    cached_failure = Some((index, error));
                }
            }
        }
    }

    let mut candidates = Vec::new();
    let mut rejected_by_head = true;
    for (index, variant) in variants.iter().enumerate() {
        let result = match cached_failure.take_if(|(cached, _)| *cached == index) {
            Some((_, error)) => Err(error),
            None => {
                let mut trial = d.clone();
                (variant.decode)(&mut trial).map(|value| (value, trial.position()))
            }
        };
        match result {
            Ok((value, end)) => {
                if rejected_by_head {
                    debug!(variant = variant.name, ?discriminant, "cached union dispatch");
                    cache.insert::<U>(discriminant, index);
                }
                d.seek(end);
                return Ok(value);
            }
            Err(error) => {
                trace!(variant = variant.name, %error, "union candidate rejected");
                rejected_by_head &= error.is_head_rejection(start);
                candidates.push(CandidateFailure {
                    variant: variant.name,
                    error,
                });
            }
        }
    }
    Err(failed::<U>(d, candidates))
}
