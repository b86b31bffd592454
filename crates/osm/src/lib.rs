//! OpenStreetMap changes in a compact binary form, and OSM XML as a stream
//! of typed objects.
//!
//! # Overview
//!
//! The crate has two halves that share one element model:
//! - **Change codec**: an OsmChange document (create/modify/delete partitions)
//!   serialized as protocol buffers with a per-change string table, so every
//!   user name, tag key, tag value and member role is stored once
//! - **Streaming scanner**: an XML token reader that yields one bounds, node,
//!   way, relation, changeset, note or user at a time and can be cancelled
//!   between tokens
//!
//! # Quick Start
//!
//! ```rust
//! use osm::{Change, Node, Object, Tag};
//! use osm::codec::{decode_change, encode_change};
//!
//! let mut change = Change::new();
//! change.append_create(Object::Node(Node {
//!     id: -1,
//!     lat: 51.5007292,
//!     lon: -0.1246254,
//!     visible: true,
//!     version: 1,
//!     tags: vec![Tag::new("name", "Big Ben")].into(),
//!     ..Default::default()
//! }));
//!
//! let bytes = encode_change(&change).unwrap();
//! let decoded = decode_change(&bytes).unwrap();
//! assert_eq!(change, decoded);
//! ```
//!
//! Scanning a document:
//!
//! ```rust
//! use osm::{Scanner, XmlScanner};
//!
//! let xml = r#"<osm><node id="1" lat="1.0" lon="2.0"/><way id="2"><nd ref="1"/></way></osm>"#;
//! let mut scanner = XmlScanner::new(xml.as_bytes());
//! let mut ids = Vec::new();
//! while scanner.scan() {
//!     ids.push(scanner.object().and_then(|o| o.id()));
//! }
//! assert!(scanner.err().is_none());
//! assert_eq!(ids, [Some(1), Some(2)]);
//! ```
//!
//! # Modules
//!
//! - [`model`]: Element types (Node, Way, Relation, Changeset, Note, User, Osm, Change)
//! - [`codec`]: Binary encoding/decoding with compression support
//! - [`scan`]: The scanner trait and cancellation sources
//! - [`xml`]: The XML scanner
//! - [`error`]: Error types
//! - [`limits`]: Size limits for decoding
//! - [`util`]: Timestamp parsing and formatting
//!
//! # Wire Format
//!
//! Changes are protocol buffer messages, optionally wrapped in a zstd frame.
//! The decoder detects the zstd magic and decompresses transparently.

pub mod codec;
pub mod error;
pub mod limits;
pub mod model;
pub mod scan;
pub mod util;
pub mod xml;

// Re-export commonly used types at crate root
pub use codec::{decode_change, decode_change_with_changeset, encode_change, EncodeOptions};
pub use error::{
    DecodeError, ElementError, ElementErrorKind, EncodeError, ScanError, StringTableError,
};
pub use model::{
    Bounds, Change, Changeset, Member, MemberType, Node, Note, NoteComment, NoteStatus, Object,
    Osm, Relation, Tag, Tags, User, Way,
};
pub use scan::{Background, CancelCause, CancelToken, Cancellation, Deadline, Scanner};
pub use xml::XmlScanner;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
