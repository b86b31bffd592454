//! Change encoding/decoding.
//!
//! A change is encoded as one protocol buffer message holding the three
//! optional partitions followed by the string table they reference. The
//! message may be wrapped in a zstd frame; decoding detects the frame magic.

use std::io::Read;

use log::{debug, trace};
use prost::Message;

use crate::codec::element::{decode_osm, encode_osm};
use crate::codec::strings::StringTable;
use crate::codec::wire;
use crate::error::{DecodeError, EncodeError};
use crate::limits::{MAX_CHANGE_SIZE, MAX_ELEMENTS_PER_PARTITION, MAX_STRING_TABLE_SIZE, ZSTD_MAGIC};
use crate::model::{Change, Changeset, Osm};

// =============================================================================
// DECODING
// =============================================================================

/// Decodes a change without external changeset metadata.
///
/// Handles both plain and zstd-compressed encodings.
pub fn decode_change(input: &[u8]) -> Result<Change, DecodeError> {
    decode_change_with_changeset(input, None)
}

/// Decodes a change, filling per-element changeset id, user and user id
/// from `changeset` wherever the encoding omitted them.
///
/// The first error aborts decoding; no partially decoded change is returned.
pub fn decode_change_with_changeset(
    input: &[u8],
    changeset: Option<&Changeset>,
) -> Result<Change, DecodeError> {
    if input.starts_with(&ZSTD_MAGIC) {
        let decompressed = decompress(input)?;
        return decode_plain(&decompressed, changeset);
    }
    decode_plain(input, changeset)
}

/// Decompresses a zstd-wrapped change, returning the protobuf bytes.
pub fn decompress(input: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let decoder = zstd::stream::read::Decoder::new(input)
        .map_err(|e| DecodeError::DecompressionFailed(e.to_string()))?;

    let mut decompressed = Vec::new();
    decoder
        .take(MAX_CHANGE_SIZE as u64 + 1)
        .read_to_end(&mut decompressed)
        .map_err(|e| DecodeError::DecompressionFailed(e.to_string()))?;

    if decompressed.len() > MAX_CHANGE_SIZE {
        return Err(DecodeError::LengthExceedsLimit {
            field: "change",
            len: decompressed.len(),
            max: MAX_CHANGE_SIZE,
        });
    }

    Ok(decompressed)
}

fn decode_plain(input: &[u8], changeset: Option<&Changeset>) -> Result<Change, DecodeError> {
    if input.len() > MAX_CHANGE_SIZE {
        return Err(DecodeError::LengthExceedsLimit {
            field: "change",
            len: input.len(),
            max: MAX_CHANGE_SIZE,
        });
    }

    let encoded = wire::Change::decode(input)?;
    if encoded.strings.len() > MAX_STRING_TABLE_SIZE {
        return Err(DecodeError::LengthExceedsLimit {
            field: "strings",
            len: encoded.strings.len(),
            max: MAX_STRING_TABLE_SIZE,
        });
    }

    let wire::Change {
        create,
        modify,
        delete,
        strings,
    } = encoded;

    let decode_partition = |partition: Option<wire::Osm>| -> Result<Option<Osm>, DecodeError> {
        partition
            .map(|osm| decode_osm(osm, &strings, changeset))
            .transpose()
    };

    let change = Change {
        create: decode_partition(create)?,
        modify: decode_partition(modify)?,
        delete: decode_partition(delete)?,
    };

    trace!("decoded change: {} bytes, {} strings", input.len(), strings.len());
    Ok(change)
}

// =============================================================================
// ENCODING
// =============================================================================

/// Options for encoding changes.
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    /// Embed changeset id, user and user id in every element.
    ///
    /// Set for self-contained upload payloads. Clear it when the changeset
    /// is known from context and will be passed to
    /// [`decode_change_with_changeset`].
    pub include_changeset: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            include_changeset: true,
        }
    }
}

impl EncodeOptions {
    /// Creates default options (changeset metadata embedded).
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that embed changeset metadata in every element.
    pub fn with_changeset() -> Self {
        Self {
            include_changeset: true,
        }
    }

    /// Options that leave changeset metadata to be supplied on decode.
    pub fn without_changeset() -> Self {
        Self {
            include_changeset: false,
        }
    }
}

fn validate_partition(osm: &Osm, partition: &'static str) -> Result<(), EncodeError> {
    let len = osm.len();
    if len > MAX_ELEMENTS_PER_PARTITION {
        return Err(EncodeError::LengthExceedsLimit {
            field: partition,
            len,
            max: MAX_ELEMENTS_PER_PARTITION,
        });
    }
    Ok(())
}

/// Encodes a change with changeset metadata embedded.
pub fn encode_change(change: &Change) -> Result<Vec<u8>, EncodeError> {
    encode_change_with_options(change, EncodeOptions::default())
}

/// Encodes a change with the given options.
///
/// The string table is built in one pass over create, modify and delete,
/// in that order.
pub fn encode_change_with_options(
    change: &Change,
    options: EncodeOptions,
) -> Result<Vec<u8>, EncodeError> {
    let mut table = StringTable::with_capacity(string_capacity(change));

    let mut encode_partition = |osm: &Option<Osm>, partition: &'static str| {
        osm.as_ref()
            .map(|osm| {
                validate_partition(osm, partition)?;
                encode_osm(osm, partition, &mut table, options.include_changeset)
            })
            .transpose()
    };

    let create = encode_partition(&change.create, "create")?;
    let modify = encode_partition(&change.modify, "modify")?;
    let delete = encode_partition(&change.delete, "delete")?;

    if table.len() > MAX_STRING_TABLE_SIZE {
        return Err(EncodeError::LengthExceedsLimit {
            field: "strings",
            len: table.len(),
            max: MAX_STRING_TABLE_SIZE,
        });
    }

    let encoded = wire::Change {
        create,
        modify,
        delete,
        strings: table.into_strings(),
    };

    let bytes = encoded.encode_to_vec();
    debug!(
        "encoded change: {} bytes, {} strings",
        bytes.len(),
        encoded.strings.len()
    );
    Ok(bytes)
}

/// Initial string table capacity: version and generator per partition, a
/// user name per element and a key and value per tag. Member roles are not
/// counted.
fn string_capacity(change: &Change) -> usize {
    let estimate: usize = [&change.create, &change.modify, &change.delete]
        .into_iter()
        .flatten()
        .map(|osm| {
            let nodes: usize = osm.nodes.iter().map(|n| 1 + 2 * n.tags.len()).sum();
            let ways: usize = osm.ways.iter().map(|w| 1 + 2 * w.tags.len()).sum();
            let relations: usize = osm.relations.iter().map(|r| 1 + 2 * r.tags.len()).sum();
            2 + nodes + ways + relations
        })
        .sum();
    estimate.min(MAX_STRING_TABLE_SIZE)
}

/// Encodes a change and wraps it in a zstd frame.
pub fn encode_change_compressed(change: &Change, level: i32) -> Result<Vec<u8>, EncodeError> {
    encode_change_compressed_with_options(change, level, EncodeOptions::default())
}

/// Encodes a change with the given options and wraps it in a zstd frame.
pub fn encode_change_compressed_with_options(
    change: &Change,
    level: i32,
    options: EncodeOptions,
) -> Result<Vec<u8>, EncodeError> {
    let uncompressed = encode_change_with_options(change, options)?;
    zstd::encode_all(uncompressed.as_slice(), level)
        .map_err(|e| EncodeError::CompressionFailed(e.to_string()))
}

impl Change {
    /// Encodes the change in the binary format with changeset metadata
    /// embedded in every element.
    pub fn marshal(&self) -> Result<Vec<u8>, EncodeError> {
        encode_change(self)
    }

    /// Decodes a change produced by [`Change::marshal`].
    pub fn unmarshal(data: &[u8]) -> Result<Change, DecodeError> {
        decode_change(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StringTableError;
    use crate::model::{Bounds, Member, MemberType, Node, Relation, Tag, Way};

    fn make_test_osm(base: i64) -> Osm {
        Osm {
            version: "0.6".to_string(),
            generator: "osm-rs".to_string(),
            bounds: Some(Bounds {
                min_lat: 52.5,
                max_lat: 52.6,
                min_lon: 13.3,
                max_lon: 13.4,
            }),
            nodes: vec![Node {
                id: base,
                lat: 52.5170365,
                lon: 13.3888599,
                user: "mapper 🏤".to_string(),
                user_id: 17,
                visible: true,
                version: 1,
                changeset_id: 100,
                timestamp: 1334605927,
                tags: vec![Tag::new("amenity", "cafe"), Tag::new("name", "Zur Linde")].into(),
            }],
            ways: vec![Way {
                id: base + 1,
                user: "mapper 🏤".to_string(),
                user_id: 17,
                visible: true,
                version: 2,
                changeset_id: 100,
                timestamp: 1334605928,
                nodes: vec![base, base + 10, base + 20],
                tags: vec![Tag::new("highway", "residential")].into(),
            }],
            relations: vec![Relation {
                id: base + 2,
                user: "另一个".to_string(),
                user_id: 18,
                visible: false,
                version: 5,
                changeset_id: 101,
                timestamp: 1334605929,
                members: vec![Member {
                    kind: MemberType::Way,
                    reference: base + 1,
                    role: "outer".to_string(),
                }],
                tags: vec![Tag::new("type", "multipolygon")].into(),
            }],
            ..Default::default()
        }
    }

    fn make_test_change() -> Change {
        Change {
            create: Some(make_test_osm(1)),
            modify: Some(make_test_osm(100)),
            delete: Some(make_test_osm(1000)),
        }
    }

    #[test]
    fn test_change_roundtrip() {
        let change = make_test_change();
        let encoded = change.marshal().unwrap();
        let decoded = Change::unmarshal(&encoded).unwrap();
        assert_eq!(decoded, change);
    }

    #[test]
    fn test_absent_and_empty_partitions_are_distinct() {
        let change = Change {
            create: None,
            modify: Some(Osm::default()),
            delete: None,
        };
        let decoded = decode_change(&encode_change(&change).unwrap()).unwrap();
        assert!(decoded.create.is_none());
        assert_eq!(decoded.modify, Some(Osm::default()));
        assert!(decoded.delete.is_none());

        let empty = Change::default();
        let encoded = encode_change(&empty).unwrap();
        assert!(encoded.is_empty());
        assert_eq!(decode_change(&encoded).unwrap(), empty);
    }

    #[test]
    fn test_string_capacity_counts_users_and_tags() {
        assert_eq!(string_capacity(&Change::new()), 0);

        let change = make_test_change();
        let encoded = encode_change(&change).unwrap();
        let message = wire::Change::decode(encoded.as_slice()).unwrap();
        assert!(string_capacity(&change) >= message.strings.len());
    }

    #[test]
    fn test_strings_deduplicated() {
        let change = make_test_change();
        let encoded = encode_change(&change).unwrap();
        let message = wire::Change::decode(encoded.as_slice()).unwrap();

        let mut seen = std::collections::HashSet::new();
        for s in &message.strings {
            assert!(seen.insert(s.as_str()), "duplicate string {:?}", s);
        }
        // Three partitions share one copy of each tag/user string
        assert_eq!(message.strings.iter().filter(|s| *s == "amenity").count(), 1);
    }

    #[test]
    fn test_without_changeset_reattaches_external() {
        let change = make_test_change();
        let encoded =
            encode_change_with_options(&change, EncodeOptions::without_changeset()).unwrap();
        let full = encode_change(&change).unwrap();
        assert!(encoded.len() < full.len());

        let cs = Changeset {
            id: 555,
            user: "uploader".to_string(),
            user_id: 99,
            ..Default::default()
        };
        let decoded = decode_change_with_changeset(&encoded, Some(&cs)).unwrap();
        let create = decoded.create.unwrap();
        assert_eq!(create.nodes[0].changeset_id, 555);
        assert_eq!(create.ways[0].user, "uploader");
        assert_eq!(create.relations[0].user_id, 99);
        assert_eq!(create.nodes[0].tags, change.create.unwrap().nodes[0].tags);
    }

    #[test]
    fn test_string_reference_out_of_range() {
        let encoded = wire::Change {
            create: Some(wire::Osm {
                nodes: vec![wire::Node {
                    id: 1,
                    keys: vec![0],
                    vals: vec![1],
                    ..Default::default()
                }],
                ..Default::default()
            }),
            strings: vec!["only".to_string()],
            ..Default::default()
        }
        .encode_to_vec();

        assert_eq!(
            decode_change(&encoded),
            Err(DecodeError::StringTable(StringTableError::OutOfRange {
                index: 1,
                size: 1
            }))
        );
    }

    #[test]
    fn test_error_in_later_partition_discards_result() {
        let encoded = wire::Change {
            create: Some(wire::Osm::default()),
            delete: Some(wire::Osm {
                version_sid: Some(4),
                ..Default::default()
            }),
            ..Default::default()
        }
        .encode_to_vec();

        assert!(matches!(
            decode_change(&encoded),
            Err(DecodeError::StringTable(_))
        ));
    }

    #[test]
    fn test_malformed_input() {
        // Field 1, wire type 2, length 10, but no payload
        let result = decode_change(&[0x0A, 0x0A]);
        assert!(matches!(result, Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_compressed_roundtrip() {
        let change = make_test_change();
        let compressed = encode_change_compressed(&change, 3).unwrap();
        assert!(compressed.starts_with(&ZSTD_MAGIC));

        let decoded = decode_change(&compressed).unwrap();
        assert_eq!(decoded, change);
    }

    #[test]
    fn test_corrupt_compressed_input() {
        let mut data = ZSTD_MAGIC.to_vec();
        data.extend_from_slice(&[0xFF; 16]);
        assert!(matches!(
            decode_change(&data),
            Err(DecodeError::DecompressionFailed(_))
        ));
    }

    #[test]
    fn test_encoding_deterministic() {
        let change = make_test_change();
        assert_eq!(encode_change(&change).unwrap(), encode_change(&change).unwrap());
    }

    #[test]
    fn test_changesets_in_partition_rejected() {
        let change = Change {
            modify: Some(Osm {
                changesets: vec![Changeset::default()],
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(
            encode_change(&change),
            Err(EncodeError::UnsupportedElement {
                partition: "modify",
                kind: "changeset"
            })
        );
    }
}
