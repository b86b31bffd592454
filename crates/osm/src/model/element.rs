//! Map elements: nodes, ways, relations and bounding boxes.

use crate::model::Tags;

/// A bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// A point on the map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
    pub user: String,
    pub user_id: i64,
    pub visible: bool,
    pub version: i32,
    pub changeset_id: i64,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    pub tags: Tags,
}

/// An ordered list of node references forming a line or area boundary.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Way {
    pub id: i64,
    pub user: String,
    pub user_id: i64,
    pub visible: bool,
    pub version: i32,
    pub changeset_id: i64,
    pub timestamp: i64,
    /// Referenced node ids, in order.
    pub nodes: Vec<i64>,
    pub tags: Tags,
}

/// The kind of element a relation member points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum MemberType {
    #[default]
    Node = 0,
    Way = 1,
    Relation = 2,
}

impl MemberType {
    /// Creates a MemberType from its wire representation.
    pub fn from_u8(v: u8) -> Option<MemberType> {
        match v {
            0 => Some(MemberType::Node),
            1 => Some(MemberType::Way),
            2 => Some(MemberType::Relation),
            _ => None,
        }
    }

    /// Parses the XML `type` attribute (case-insensitive).
    pub fn from_name(name: &str) -> Option<MemberType> {
        if name.eq_ignore_ascii_case("node") {
            Some(MemberType::Node)
        } else if name.eq_ignore_ascii_case("way") {
            Some(MemberType::Way)
        } else if name.eq_ignore_ascii_case("relation") {
            Some(MemberType::Relation)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MemberType::Node => "node",
            MemberType::Way => "way",
            MemberType::Relation => "relation",
        }
    }
}

/// A typed, role-annotated reference from a relation to another element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Member {
    pub kind: MemberType,
    pub reference: i64,
    pub role: String,
}

/// A grouping of elements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Relation {
    pub id: i64,
    pub user: String,
    pub user_id: i64,
    pub visible: bool,
    pub version: i32,
    pub changeset_id: i64,
    pub timestamp: i64,
    pub members: Vec<Member>,
    pub tags: Tags,
}
