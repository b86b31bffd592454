//! Element encoding/decoding for the change wire format.
//!
//! Each element variant has a pure delegate pair: encoding interns string
//! fields into the shared [`StringTable`], decoding resolves them against
//! the decoded table and optionally re-attaches external changeset metadata.

use crate::codec::strings::{resolve, StringTable};
use crate::codec::wire;
use crate::error::{DecodeError, EncodeError};
use crate::model::{Bounds, Changeset, Member, MemberType, Node, Osm, Relation, Tag, Tags, Way};

/// Fixed-point scale for coordinates (1e-7 degrees, OSM's native precision).
const COORD_SCALE: f64 = 1e7;

#[inline]
fn to_fixed(degrees: f64) -> i64 {
    (degrees * COORD_SCALE).round() as i64
}

#[inline]
fn from_fixed(value: i64) -> f64 {
    value as f64 / COORD_SCALE
}

// =============================================================================
// DECODING
// =============================================================================

/// Metadata shared by nodes, ways and relations.
struct Meta {
    user: String,
    user_id: i64,
    visible: bool,
    version: i32,
    changeset_id: i64,
    timestamp: i64,
}

/// Decodes one partition.
pub fn decode_osm(
    encoded: wire::Osm,
    strings: &[String],
    changeset: Option<&Changeset>,
) -> Result<Osm, DecodeError> {
    let generator = decode_optional_string(encoded.generator_sid, strings)?;
    let version = decode_optional_string(encoded.version_sid, strings)?;

    let mut nodes = Vec::with_capacity(encoded.nodes.len());
    for node in encoded.nodes {
        nodes.push(decode_node(node, strings, changeset)?);
    }

    let mut ways = Vec::with_capacity(encoded.ways.len());
    for way in encoded.ways {
        ways.push(decode_way(way, strings, changeset)?);
    }

    let mut relations = Vec::with_capacity(encoded.relations.len());
    for relation in encoded.relations {
        relations.push(decode_relation(relation, strings, changeset)?);
    }

    Ok(Osm {
        version,
        generator,
        bounds: encoded.bounds.map(decode_bounds),
        nodes,
        ways,
        relations,
        ..Osm::default()
    })
}

pub fn decode_bounds(encoded: wire::Bounds) -> Bounds {
    Bounds {
        min_lat: from_fixed(encoded.min_lat),
        max_lat: from_fixed(encoded.max_lat),
        min_lon: from_fixed(encoded.min_lon),
        max_lon: from_fixed(encoded.max_lon),
    }
}

pub fn decode_node(
    encoded: wire::Node,
    strings: &[String],
    changeset: Option<&Changeset>,
) -> Result<Node, DecodeError> {
    let meta = decode_info(encoded.info, strings, changeset)?;
    Ok(Node {
        id: encoded.id,
        lat: from_fixed(encoded.lat),
        lon: from_fixed(encoded.lon),
        user: meta.user,
        user_id: meta.user_id,
        visible: meta.visible,
        version: meta.version,
        changeset_id: meta.changeset_id,
        timestamp: meta.timestamp,
        tags: decode_tags(&encoded.keys, &encoded.vals, strings)?,
    })
}

pub fn decode_way(
    encoded: wire::Way,
    strings: &[String],
    changeset: Option<&Changeset>,
) -> Result<Way, DecodeError> {
    let meta = decode_info(encoded.info, strings, changeset)?;
    Ok(Way {
        id: encoded.id,
        user: meta.user,
        user_id: meta.user_id,
        visible: meta.visible,
        version: meta.version,
        changeset_id: meta.changeset_id,
        timestamp: meta.timestamp,
        nodes: encoded.refs,
        tags: decode_tags(&encoded.keys, &encoded.vals, strings)?,
    })
}

pub fn decode_relation(
    encoded: wire::Relation,
    strings: &[String],
    changeset: Option<&Changeset>,
) -> Result<Relation, DecodeError> {
    let count = encoded.member_ids.len();
    for (field, len) in [("roles", encoded.roles.len()), ("types", encoded.types.len())] {
        if len != count {
            return Err(DecodeError::LengthMismatch {
                field,
                len,
                expected: count,
            });
        }
    }

    let mut members = Vec::with_capacity(count);
    for i in 0..count {
        let value = encoded.types[i];
        let kind = u8::try_from(value)
            .ok()
            .and_then(MemberType::from_u8)
            .ok_or(DecodeError::InvalidMemberType { value })?;
        members.push(Member {
            kind,
            reference: encoded.member_ids[i],
            role: resolve(strings, encoded.roles[i])?.to_owned(),
        });
    }

    let meta = decode_info(encoded.info, strings, changeset)?;
    Ok(Relation {
        id: encoded.id,
        user: meta.user,
        user_id: meta.user_id,
        visible: meta.visible,
        version: meta.version,
        changeset_id: meta.changeset_id,
        timestamp: meta.timestamp,
        members,
        tags: decode_tags(&encoded.keys, &encoded.vals, strings)?,
    })
}

/// Decodes element metadata. Changeset fields missing from the encoding are
/// taken from `changeset` when provided.
fn decode_info(
    info: Option<wire::Info>,
    strings: &[String],
    changeset: Option<&Changeset>,
) -> Result<Meta, DecodeError> {
    let info = info.unwrap_or_default();

    let user = match info.user_sid {
        Some(sid) => resolve(strings, sid)?.to_owned(),
        None => changeset.map(|cs| cs.user.clone()).unwrap_or_default(),
    };

    Ok(Meta {
        user,
        user_id: info
            .user_id
            .or(changeset.map(|cs| cs.user_id))
            .unwrap_or_default(),
        visible: info.visible,
        version: info.version,
        changeset_id: info
            .changeset
            .or(changeset.map(|cs| cs.id))
            .unwrap_or_default(),
        timestamp: info.timestamp,
    })
}

fn decode_tags(keys: &[u32], vals: &[u32], strings: &[String]) -> Result<Tags, DecodeError> {
    if keys.len() != vals.len() {
        return Err(DecodeError::LengthMismatch {
            field: "vals",
            len: vals.len(),
            expected: keys.len(),
        });
    }

    let mut tags = Vec::with_capacity(keys.len());
    for (&k, &v) in keys.iter().zip(vals) {
        tags.push(Tag {
            key: resolve(strings, k)?.to_owned(),
            value: resolve(strings, v)?.to_owned(),
        });
    }
    Ok(Tags(tags))
}

fn decode_optional_string(sid: Option<u32>, strings: &[String]) -> Result<String, DecodeError> {
    match sid {
        Some(sid) => Ok(resolve(strings, sid)?.to_owned()),
        None => Ok(String::new()),
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes one partition, interning its strings into `table`.
///
/// Only bounds, nodes, ways and relations have a wire representation.
pub fn encode_osm(
    osm: &Osm,
    partition: &'static str,
    table: &mut StringTable,
    include_changeset: bool,
) -> Result<wire::Osm, EncodeError> {
    let unsupported = [
        ("changeset", osm.changesets.is_empty()),
        ("note", osm.notes.is_empty()),
        ("user", osm.users.is_empty()),
    ];
    if let Some(&(kind, _)) = unsupported.iter().find(|(_, empty)| !*empty) {
        return Err(EncodeError::UnsupportedElement { partition, kind });
    }

    Ok(wire::Osm {
        bounds: osm.bounds.as_ref().map(encode_bounds),
        nodes: osm
            .nodes
            .iter()
            .map(|n| encode_node(n, table, include_changeset))
            .collect(),
        ways: osm
            .ways
            .iter()
            .map(|w| encode_way(w, table, include_changeset))
            .collect(),
        relations: osm
            .relations
            .iter()
            .map(|r| encode_relation(r, table, include_changeset))
            .collect(),
        generator_sid: encode_optional_string(&osm.generator, table),
        version_sid: encode_optional_string(&osm.version, table),
    })
}

pub fn encode_bounds(bounds: &Bounds) -> wire::Bounds {
    wire::Bounds {
        min_lat: to_fixed(bounds.min_lat),
        max_lat: to_fixed(bounds.max_lat),
        min_lon: to_fixed(bounds.min_lon),
        max_lon: to_fixed(bounds.max_lon),
    }
}

pub fn encode_node(node: &Node, table: &mut StringTable, include_changeset: bool) -> wire::Node {
    let info = encode_info(
        InfoRef {
            user: &node.user,
            user_id: node.user_id,
            visible: node.visible,
            version: node.version,
            changeset_id: node.changeset_id,
            timestamp: node.timestamp,
        },
        table,
        include_changeset,
    );
    let (keys, vals) = encode_tags(&node.tags, table);
    wire::Node {
        id: node.id,
        keys,
        vals,
        info: Some(info),
        lat: to_fixed(node.lat),
        lon: to_fixed(node.lon),
    }
}

pub fn encode_way(way: &Way, table: &mut StringTable, include_changeset: bool) -> wire::Way {
    let info = encode_info(
        InfoRef {
            user: &way.user,
            user_id: way.user_id,
            visible: way.visible,
            version: way.version,
            changeset_id: way.changeset_id,
            timestamp: way.timestamp,
        },
        table,
        include_changeset,
    );
    let (keys, vals) = encode_tags(&way.tags, table);
    wire::Way {
        id: way.id,
        keys,
        vals,
        info: Some(info),
        refs: way.nodes.clone(),
    }
}

pub fn encode_relation(
    relation: &Relation,
    table: &mut StringTable,
    include_changeset: bool,
) -> wire::Relation {
    let info = encode_info(
        InfoRef {
            user: &relation.user,
            user_id: relation.user_id,
            visible: relation.visible,
            version: relation.version,
            changeset_id: relation.changeset_id,
            timestamp: relation.timestamp,
        },
        table,
        include_changeset,
    );
    let (keys, vals) = encode_tags(&relation.tags, table);

    let count = relation.members.len();
    let mut roles = Vec::with_capacity(count);
    let mut member_ids = Vec::with_capacity(count);
    let mut types = Vec::with_capacity(count);
    for member in &relation.members {
        roles.push(table.intern(&member.role));
        member_ids.push(member.reference);
        types.push(member.kind as i32);
    }

    wire::Relation {
        id: relation.id,
        keys,
        vals,
        info: Some(info),
        roles,
        member_ids,
        types,
    }
}

/// Borrowed view of element metadata.
struct InfoRef<'a> {
    user: &'a str,
    user_id: i64,
    visible: bool,
    version: i32,
    changeset_id: i64,
    timestamp: i64,
}

fn encode_info(meta: InfoRef<'_>, table: &mut StringTable, include_changeset: bool) -> wire::Info {
    let mut info = wire::Info {
        version: meta.version,
        timestamp: meta.timestamp,
        visible: meta.visible,
        ..Default::default()
    };

    if include_changeset {
        info.changeset = Some(meta.changeset_id);
        info.user_id = Some(meta.user_id);
        info.user_sid = Some(table.intern(meta.user));
    }

    info
}

fn encode_tags(tags: &Tags, table: &mut StringTable) -> (Vec<u32>, Vec<u32>) {
    let mut keys = Vec::with_capacity(tags.len());
    let mut vals = Vec::with_capacity(tags.len());
    for tag in tags {
        keys.push(table.intern(&tag.key));
        vals.push(table.intern(&tag.value));
    }
    (keys, vals)
}

fn encode_optional_string(s: &str, table: &mut StringTable) -> Option<u32> {
    if s.is_empty() {
        None
    } else {
        Some(table.intern(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_node() -> Node {
        Node {
            id: 123,
            lat: 52.5170365,
            lon: 13.3888599,
            user: "mapper".to_string(),
            user_id: 42,
            visible: true,
            version: 3,
            changeset_id: 9001,
            timestamp: 1334605927,
            tags: vec![Tag::new("amenity", "cafe"), Tag::new("name", "Café Ω")].into(),
        }
    }

    #[test]
    fn test_node_roundtrip() {
        let node = test_node();
        let mut table = StringTable::new();
        let encoded = encode_node(&node, &mut table, true);
        let strings = table.into_strings();

        let decoded = decode_node(encoded, &strings, None).unwrap();
        assert_eq!(decoded, node);
    }

    #[test]
    fn test_coordinates_fixed_point() {
        for deg in [0.0, -90.0, 90.0, 180.0, -180.0, 52.5170365, -0.0000001] {
            assert_eq!(from_fixed(to_fixed(deg)), deg);
        }
        assert_eq!(to_fixed(52.5170365), 525170365);
    }

    #[test]
    fn test_tags_share_table_entries() {
        let mut table = StringTable::new();
        let a = Way {
            id: 1,
            tags: vec![Tag::new("highway", "residential")].into(),
            ..Default::default()
        };
        let b = Way {
            id: 2,
            tags: vec![Tag::new("highway", "primary")].into(),
            ..Default::default()
        };

        let ea = encode_way(&a, &mut table, false);
        let eb = encode_way(&b, &mut table, false);
        assert_eq!(ea.keys, eb.keys);
        assert_eq!(table.strings(), ["highway", "residential", "primary"]);
    }

    #[test]
    fn test_without_changeset_uses_external() {
        let node = test_node();
        let mut table = StringTable::new();
        let encoded = encode_node(&node, &mut table, false);
        let info = encoded.info.clone().unwrap();
        assert!(info.changeset.is_none());
        assert!(info.user_id.is_none());
        assert!(info.user_sid.is_none());
        assert!(table.get_index("mapper").is_none());

        let strings = table.into_strings();
        let cs = Changeset {
            id: 77,
            user: "other".to_string(),
            user_id: 5,
            ..Default::default()
        };
        let decoded = decode_node(encoded.clone(), &strings, Some(&cs)).unwrap();
        assert_eq!(decoded.changeset_id, 77);
        assert_eq!(decoded.user, "other");
        assert_eq!(decoded.user_id, 5);
        assert_eq!(decoded.tags, node.tags);

        let bare = decode_node(encoded, &strings, None).unwrap();
        assert_eq!(bare.changeset_id, 0);
        assert!(bare.user.is_empty());
    }

    #[test]
    fn test_embedded_changeset_wins_over_external() {
        let node = test_node();
        let mut table = StringTable::new();
        let encoded = encode_node(&node, &mut table, true);
        let strings = table.into_strings();

        let cs = Changeset {
            id: 1,
            user: "x".to_string(),
            user_id: 2,
            ..Default::default()
        };
        let decoded = decode_node(encoded, &strings, Some(&cs)).unwrap();
        assert_eq!(decoded.changeset_id, 9001);
        assert_eq!(decoded.user, "mapper");
    }

    #[test]
    fn test_relation_roundtrip() {
        let relation = Relation {
            id: 5,
            visible: true,
            members: vec![
                Member {
                    kind: MemberType::Way,
                    reference: 10,
                    role: "outer".to_string(),
                },
                Member {
                    kind: MemberType::Node,
                    reference: 11,
                    role: String::new(),
                },
                Member {
                    kind: MemberType::Relation,
                    reference: 12,
                    role: "subarea".to_string(),
                },
            ],
            tags: vec![Tag::new("type", "multipolygon")].into(),
            ..Default::default()
        };
        let mut table = StringTable::new();
        let encoded = encode_relation(&relation, &mut table, true);
        let strings = table.into_strings();
        assert_eq!(decode_relation(encoded, &strings, None).unwrap(), relation);
    }

    #[test]
    fn test_relation_invalid_member_type() {
        let encoded = wire::Relation {
            id: 1,
            roles: vec![0],
            member_ids: vec![2],
            types: vec![7],
            ..Default::default()
        };
        let strings = vec![String::new()];
        assert_eq!(
            decode_relation(encoded, &strings, None),
            Err(DecodeError::InvalidMemberType { value: 7 })
        );
    }

    #[test]
    fn test_relation_parallel_arrays_must_match() {
        let encoded = wire::Relation {
            id: 1,
            roles: vec![0],
            member_ids: vec![2, 3],
            types: vec![0, 0],
            ..Default::default()
        };
        let strings = vec![String::new()];
        assert!(matches!(
            decode_relation(encoded, &strings, None),
            Err(DecodeError::LengthMismatch { field: "roles", .. })
        ));
    }

    #[test]
    fn test_tag_index_out_of_range() {
        let encoded = wire::Node {
            id: 1,
            keys: vec![0],
            vals: vec![3],
            ..Default::default()
        };
        let strings = vec!["k".to_string()];
        assert!(matches!(
            decode_node(encoded, &strings, None),
            Err(DecodeError::StringTable(_))
        ));
    }

    #[test]
    fn test_unsupported_partition_elements() {
        let osm = Osm {
            notes: vec![Default::default()],
            ..Default::default()
        };
        let mut table = StringTable::new();
        assert_eq!(
            encode_osm(&osm, "create", &mut table, true),
            Err(EncodeError::UnsupportedElement { partition: "create", kind: "note" })
        );
    }
}
