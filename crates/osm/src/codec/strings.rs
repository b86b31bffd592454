//! Shared string table for change encoding.
//!
//! Tag keys, tag values, user names and member roles repeat heavily across
//! a change. Each distinct string is stored once in the table and fields
//! refer to it by position.

use rustc_hash::FxHashMap;

use crate::error::StringTableError;

/// Builder for the string table of one encoded change.
///
/// Indices are assigned in first-seen order, so the table produced for a
/// given change is deterministic.
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    strings: Vec<String>,
    indices: FxHashMap<String, u32>,
}

impl StringTable {
    /// Creates a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table with room for `capacity` distinct strings.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            strings: Vec::with_capacity(capacity),
            indices: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Adds or gets the index for a string.
    pub fn intern(&mut self, s: &str) -> u32 {
        if let Some(&idx) = self.indices.get(s) {
            return idx;
        }
        let idx = self.strings.len() as u32;
        self.strings.push(s.to_owned());
        self.indices.insert(s.to_owned(), idx);
        idx
    }

    /// Gets the index of a string already in the table.
    pub fn get_index(&self, s: &str) -> Option<u32> {
        self.indices.get(s).copied()
    }

    /// Returns the interned strings in index order.
    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    /// Returns the interned strings (consumes the table).
    pub fn into_strings(self) -> Vec<String> {
        self.strings
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// Looks up a string by index in a decoded table.
#[inline]
pub fn resolve(strings: &[String], index: u32) -> Result<&str, StringTableError> {
    strings
        .get(index as usize)
        .map(String::as_str)
        .ok_or(StringTableError::OutOfRange {
            index,
            size: strings.len(),
        })
}
