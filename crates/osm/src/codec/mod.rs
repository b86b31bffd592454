//! Binary encoding/decoding for OSM changes.
//!
//! The wire format is protocol buffers with a per-change string table.

pub mod change;
pub mod element;
pub mod strings;
pub mod wire;

pub use change::{
    decode_change, decode_change_with_changeset, decompress, encode_change,
    encode_change_compressed, encode_change_compressed_with_options, encode_change_with_options,
    EncodeOptions,
};
pub use strings::{resolve, StringTable};
