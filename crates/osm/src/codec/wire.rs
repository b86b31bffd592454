//! Protocol buffer messages for the change wire format.
//!
//! Equivalent schema:
//!
//! ```text
//! message Change {
//!   optional Osm create = 1;
//!   optional Osm modify = 2;
//!   optional Osm delete = 3;
//!   repeated string strings = 15;
//! }
//!
//! message Osm {
//!   optional Bounds bounds = 1;
//!   repeated Node nodes = 2;
//!   repeated Way ways = 3;
//!   repeated Relation relations = 4;
//!   optional uint32 generator_sid = 5;
//!   optional uint32 version_sid = 6;
//! }
//! ```
//!
//! Every `*_sid`, `keys`, `vals` and `roles` field is an index into
//! `Change.strings`. Coordinates are fixed-point at 1e-7 degrees.

/// Top-level message.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Change {
    #[prost(message, optional, tag = "1")]
    pub create: Option<Osm>,
    #[prost(message, optional, tag = "2")]
    pub modify: Option<Osm>,
    #[prost(message, optional, tag = "3")]
    pub delete: Option<Osm>,
    #[prost(string, repeated, tag = "15")]
    pub strings: Vec<String>,
}

/// One element-set (partition).
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Osm {
    #[prost(message, optional, tag = "1")]
    pub bounds: Option<Bounds>,
    #[prost(message, repeated, tag = "2")]
    pub nodes: Vec<Node>,
    #[prost(message, repeated, tag = "3")]
    pub ways: Vec<Way>,
    #[prost(message, repeated, tag = "4")]
    pub relations: Vec<Relation>,
    #[prost(uint32, optional, tag = "5")]
    pub generator_sid: Option<u32>,
    #[prost(uint32, optional, tag = "6")]
    pub version_sid: Option<u32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Bounds {
    #[prost(sint64, tag = "1")]
    pub min_lat: i64,
    #[prost(sint64, tag = "2")]
    pub max_lat: i64,
    #[prost(sint64, tag = "3")]
    pub min_lon: i64,
    #[prost(sint64, tag = "4")]
    pub max_lon: i64,
}

/// Element metadata.
///
/// `changeset`, `user_id` and `user_sid` are left unset when the change is
/// encoded without per-element changeset metadata.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Info {
    #[prost(int32, tag = "1")]
    pub version: i32,
    #[prost(int64, tag = "2")]
    pub timestamp: i64,
    #[prost(bool, tag = "3")]
    pub visible: bool,
    #[prost(int64, optional, tag = "4")]
    pub changeset: Option<i64>,
    #[prost(int64, optional, tag = "5")]
    pub user_id: Option<i64>,
    #[prost(uint32, optional, tag = "6")]
    pub user_sid: Option<u32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Node {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(uint32, repeated, tag = "2")]
    pub keys: Vec<u32>,
    #[prost(uint32, repeated, tag = "3")]
    pub vals: Vec<u32>,
    #[prost(message, optional, tag = "4")]
    pub info: Option<Info>,
    #[prost(sint64, tag = "8")]
    pub lat: i64,
    #[prost(sint64, tag = "9")]
    pub lon: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Way {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(uint32, repeated, tag = "2")]
    pub keys: Vec<u32>,
    #[prost(uint32, repeated, tag = "3")]
    pub vals: Vec<u32>,
    #[prost(message, optional, tag = "4")]
    pub info: Option<Info>,
    #[prost(int64, repeated, tag = "8")]
    pub refs: Vec<i64>,
}

/// Relation members are stored as three parallel arrays.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Relation {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(uint32, repeated, tag = "2")]
    pub keys: Vec<u32>,
    #[prost(uint32, repeated, tag = "3")]
    pub vals: Vec<u32>,
    #[prost(message, optional, tag = "4")]
    pub info: Option<Info>,
    #[prost(uint32, repeated, tag = "8")]
    pub roles: Vec<u32>,
    #[prost(int64, repeated, tag = "9")]
    pub member_ids: Vec<i64>,
    /// 0 = node, 1 = way, 2 = relation.
    #[prost(int32, repeated, tag = "10")]
    pub types: Vec<i32>,
}
