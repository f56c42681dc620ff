use crate::schema::WireType;
use std::io;
use thiserror::Error;

/// A single union candidate that failed to decode, kept for diagnostics.
#[derive(Debug)]
pub struct CandidateFailure {
    pub variant: &'static str,
    pub error: CborError,
}

#[derive(Error, Debug)]
pub enum CborError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Truncated input, malformed length header or a value too wide for the target type.
    #[error("Malformed {type_name} at offset {offset}")]
    MalformedPrimitive {
        type_name: &'static str,
        offset: usize,
    },

    #[error("Expected {expected} at offset {offset}, found {actual:?}")]
    UnexpectedType {
        expected: &'static str,
        actual: WireType,
        offset: usize,
    },

    /// `actual` is `None` when the item at `offset` carries no tag at all.
    #[error("Expected tag {expected} at offset {offset}, found {actual:?}")]
    UnexpectedTag {
        expected: u64,
        actual: Option<u64>,
        offset: usize,
    },

    #[error("Missing field `{field}` in {type_name}")]
    MissingField {
        type_name: &'static str,
        field: &'static str,
    },

    #[error("Unknown map key {key} in {type_name}")]
    UnknownMapKey { type_name: &'static str, key: String },

    #[error("Duplicate map key {key} in {type_name}")]
    DuplicateMapKey { type_name: &'static str, key: String },

    #[error("Unexpected extra elements in {type_name} at offset {offset}")]
    ExtraElements {
        type_name: &'static str,
        offset: usize,
    },

    #[error("No variant of {type_name} matched {raw_hex}: {}", format_candidates(.candidates))]
    UnionDecodeFailed {
        type_name: &'static str,
        candidates: Vec<CandidateFailure>,
        raw_hex: String,
    },

    #[error("Invalid schema for {type_name}: {reason}")]
    SchemaError {
        type_name: &'static str,
        reason: String,
    },

    #[error("Invalid UTF-8 in text string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("Additional data after the end of the CBOR item at offset {offset}")]
    TrailingData { offset: usize },

    #[error("Nesting depth exceeded at offset {offset}")]
    DepthExceeded { offset: usize },
}

fn format_candidates(candidates: &[CandidateFailure]) -> String {
    candidates
        .iter()
        .map(|c| format!("[{}: {}]", c.variant, c.error))
        .collect::<Vec<_>>()
        .join(", ")
}

impl CborError {
    pub(crate) fn malformed(type_name: &'static str, offset: usize) -> Self {
        CborError::MalformedPrimitive { type_name, offset }
    }

    /// The byte offset the error was detected at, when the error is positional.
    pub fn offset(&self) -> Option<usize> {
        match self {
            CborError::MalformedPrimitive { offset, .. }
            | CborError::UnexpectedType { offset, .. }
            | CborError::UnexpectedTag { offset, .. }
            | CborError::ExtraElements { offset, .. }
            | CborError::InvalidUtf8 { offset }
            | CborError::TrailingData { offset }
            | CborError::DepthExceeded { offset } => Some(*offset),
            _ => None,
        }
    }

    /// True when the value was rejected by looking only at the head of the item
    /// starting at `start`: its major type, tag number or header argument.
    ///
    /// Such a rejection repeats for every input sharing the same initial byte and
    /// argument, which is what makes union discriminant caching sound.
    pub(crate) fn is_head_rejection(&self, start: usize) -> bool {
        match self {
            CborError::UnexpectedType { offset, .. }
            | CborError::UnexpectedTag { offset, .. }
            | CborError::MalformedPrimitive { offset, .. } => *offset == start,
            _ => false,
        }
    }
}

pub use self::CborError as Error;

pub type Result<T> = std::result::Result<T, CborError>;
