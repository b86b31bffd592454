//! Data model types for OSM elements.
//!
//! - Tags (key/value pairs with JSON object form)
//! - Elements (nodes, ways, relations, bounds)
//! - Records (changesets, notes, users)
//! - Containers (`Osm`, `Object`, `Change`)

pub mod changeset;
pub mod element;
pub mod osm;
pub mod tag;

pub use changeset::{Changeset, Note, NoteComment, NoteStatus, User};
pub use element::{Bounds, Member, MemberType, Node, Relation, Way};
pub use osm::{Change, Object, Osm};
pub use tag::{Tag, Tags};
