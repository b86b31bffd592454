//! Error types for change encoding/decoding and XML scanning.

use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::scan::CancelCause;

/// A string reference that does not resolve against the decoded table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StringTableError {
    #[error("string index {index} out of range (table size: {size})")]
    OutOfRange { index: u32, size: usize },
}

/// Error during binary decoding of a change.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("malformed change encoding: {0}")]
    Malformed(#[from] prost::DecodeError),

    #[error(transparent)]
    StringTable(#[from] StringTableError),

    #[error("invalid relation member type: {value}")]
    InvalidMemberType { value: i32 },

    #[error("{field} has {len} entries but {expected} were expected")]
    LengthMismatch {
        field: &'static str,
        len: usize,
        expected: usize,
    },

    #[error("{field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("zstd decompression failed: {0}")]
    DecompressionFailed(String),
}

/// Error during binary encoding of a change.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("{kind} elements in the {partition} partition cannot be encoded")]
    UnsupportedElement {
        partition: &'static str,
        kind: &'static str,
    },

    #[error("{field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("zstd compression failed: {0}")]
    CompressionFailed(String),
}

/// Why a recognized element failed to decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElementErrorKind {
    #[error("invalid value {value:?} for {field:?}")]
    InvalidValue { field: &'static str, value: String },

    #[error("invalid timestamp for {field:?}: {message}")]
    InvalidTimestamp { field: &'static str, message: String },

    #[error("invalid UTF-8 in {0:?}")]
    InvalidUtf8(&'static str),

    #[error("unexpected end of input")]
    UnexpectedEof,
}

/// A recognized element whose nested structure could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid <{element}> element: {kind}")]
pub struct ElementError {
    pub element: &'static str,
    pub kind: ElementErrorKind,
}

impl ElementError {
    pub fn new(element: &'static str, kind: ElementErrorKind) -> Self {
        Self { element, kind }
    }
}

/// Terminal error of a scanner session.
#[derive(Debug, Clone, Error)]
pub enum ScanError {
    #[error("I/O error: {0}")]
    Io(Arc<io::Error>),

    #[error("malformed XML: {0}")]
    Malformed(quick_xml::Error),

    #[error(transparent)]
    Element(#[from] ElementError),

    /// Input ended while elements were still open.
    #[error("unexpected end of input with {open} open element(s)")]
    UnexpectedEof { open: usize },

    #[error("scanner closed")]
    Closed,

    #[error("scan cancelled: {0}")]
    Cancelled(CancelCause),
}

impl ScanError {
    /// Returns true if the scan stopped because of a cancellation signal.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ScanError::Cancelled(_))
    }
}

impl From<quick_xml::Error> for ScanError {
    fn from(e: quick_xml::Error) -> Self {
        match e {
            quick_xml::Error::Io(io) => ScanError::Io(io),
            other => ScanError::Malformed(other),
        }
    }
}

impl From<io::Error> for ScanError {
    fn from(e: io::Error) -> Self {
        ScanError::Io(Arc::new(e))
    }
}
