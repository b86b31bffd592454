//! Element containers: the `Osm` element-set, the `Object` variant and `Change`.

use crate::error::ScanError;
use crate::model::{Bounds, Changeset, Node, Note, Relation, User, Way};
use crate::scan::Scanner;

/// One decoded top-level element from an OSM document.
///
/// Each variant is self-contained; references between objects (way node
/// refs, relation members) are left unresolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Bounds(Bounds),
    Node(Node),
    Way(Way),
    Relation(Relation),
    Changeset(Changeset),
    Note(Note),
    User(User),
}

impl Object {
    /// Returns the lower-case XML element name for this variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Object::Bounds(_) => "bounds",
            Object::Node(_) => "node",
            Object::Way(_) => "way",
            Object::Relation(_) => "relation",
            Object::Changeset(_) => "changeset",
            Object::Note(_) => "note",
            Object::User(_) => "user",
        }
    }

    /// Returns the element id, if the variant carries one.
    pub fn id(&self) -> Option<i64> {
        match self {
            Object::Bounds(_) => None,
            Object::Node(n) => Some(n.id),
            Object::Way(w) => Some(w.id),
            Object::Relation(r) => Some(r.id),
            Object::Changeset(c) => Some(c.id),
            Object::Note(n) => Some(n.id),
            Object::User(u) => Some(u.id),
        }
    }
}

/// A set of elements, as found in an `<osm>` document or one partition of
/// an `<osmChange>`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Osm {
    pub version: String,
    pub generator: String,
    pub bounds: Option<Bounds>,
    pub nodes: Vec<Node>,
    pub ways: Vec<Way>,
    pub relations: Vec<Relation>,
    pub changesets: Vec<Changeset>,
    pub notes: Vec<Note>,
    pub users: Vec<User>,
}

impl Osm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of elements held, bounds excluded.
    pub fn len(&self) -> usize {
        self.nodes.len()
            + self.ways.len()
            + self.relations.len()
            + self.changesets.len()
            + self.notes.len()
            + self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_none() && self.len() == 0
    }

    /// Appends an object to the collection matching its variant.
    ///
    /// A later `Bounds` replaces an earlier one.
    pub fn push(&mut self, object: Object) {
        match object {
            Object::Bounds(b) => self.bounds = Some(b),
            Object::Node(n) => self.nodes.push(n),
            Object::Way(w) => self.ways.push(w),
            Object::Relation(r) => self.relations.push(r),
            Object::Changeset(c) => self.changesets.push(c),
            Object::Note(n) => self.notes.push(n),
            Object::User(u) => self.users.push(u),
        }
    }

    /// Drains a scanner into a new element-set.
    ///
    /// Stops at the first scan error. A clean end of input yields the
    /// collected elements.
    ///
    /// [`Scanner::object`] only lends the current object, so each one is
    /// cloned. To move objects out instead, collect
    /// [`XmlScanner::objects`](crate::xml::XmlScanner::objects):
    /// `scanner.objects().collect::<Result<Osm, _>>()`.
    pub fn from_scanner<S: Scanner + ?Sized>(scanner: &mut S) -> Result<Osm, ScanError> {
        let mut osm = Osm::new();
        while scanner.scan() {
            if let Some(object) = scanner.object() {
                osm.push(object.clone());
            }
        }
        match scanner.err() {
            Some(err) => Err(err.clone()),
            None => Ok(osm),
        }
    }
}

impl Extend<Object> for Osm {
    fn extend<I: IntoIterator<Item = Object>>(&mut self, iter: I) {
        for object in iter {
            self.push(object);
        }
    }
}

impl FromIterator<Object> for Osm {
    fn from_iter<I: IntoIterator<Item = Object>>(iter: I) -> Self {
        let mut osm = Osm::new();
        osm.extend(iter);
        osm
    }
}

/// An OsmChange document: elements to create, modify and delete.
///
/// `None` and `Some(Osm::default())` are distinct states and survive an
/// encode/decode round-trip.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Change {
    pub create: Option<Osm>,
    pub modify: Option<Osm>,
    pub delete: Option<Osm>,
}

impl Change {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an object to the create partition, creating it if absent.
    pub fn append_create(&mut self, object: Object) {
        self.create.get_or_insert_with(Osm::new).push(object);
    }

    /// Appends an object to the modify partition, creating it if absent.
    pub fn append_modify(&mut self, object: Object) {
        self.modify.get_or_insert_with(Osm::new).push(object);
    }

    /// Appends an object to the delete partition, creating it if absent.
    pub fn append_delete(&mut self, object: Object) {
        self.delete.get_or_insert_with(Osm::new).push(object);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_osm_push_routes_by_kind() {
        let mut osm = Osm::new();
        assert!(osm.is_empty());

        osm.push(Object::Node(Node { id: 1, ..Default::default() }));
        osm.push(Object::Way(Way { id: 2, ..Default::default() }));
        osm.push(Object::Bounds(Bounds::default()));
        osm.push(Object::User(User { id: 3, ..Default::default() }));

        assert_eq!(osm.nodes.len(), 1);
        assert_eq!(osm.ways.len(), 1);
        assert_eq!(osm.users.len(), 1);
        assert!(osm.bounds.is_some());
        assert_eq!(osm.len(), 3);
    }

    #[test]
    fn test_osm_from_iterator() {
        let osm: Osm = [
            Object::Node(Node { id: 1, ..Default::default() }),
            Object::Way(Way { id: 2, ..Default::default() }),
            Object::Node(Node { id: 3, ..Default::default() }),
        ]
        .into_iter()
        .collect();
        assert_eq!(osm.nodes.len(), 2);
        assert_eq!(osm.ways[0].id, 2);
    }

    #[test]
    fn test_object_kind_and_id() {
        let obj = Object::Relation(Relation { id: 7, ..Default::default() });
        assert_eq!(obj.kind(), "relation");
        assert_eq!(obj.id(), Some(7));
        assert_eq!(Object::Bounds(Bounds::default()).id(), None);
    }

    #[test]
    fn test_change_append_creates_partition() {
        let mut change = Change::new();
        assert!(change.modify.is_none());

        change.append_modify(Object::Node(Node { id: 1, ..Default::default() }));
        assert_eq!(change.modify.as_ref().map(|o| o.nodes.len()), Some(1));
        assert!(change.create.is_none());
        assert!(change.delete.is_none());
    }
}
