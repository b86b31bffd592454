//! One decoder per recognized top-level element.
//!
//! Each decoder receives the element's start tag and, unless the element
//! was self-closing, consumes the reader up to and including its end tag.

use std::io::BufRead;

use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::helpers::{parse_time, parse_value, push_tag, read_children, read_text, Attrs};
use crate::error::{ElementError, ElementErrorKind, ScanError};
use crate::model::{
    Bounds, Changeset, Member, MemberType, Node, Note, NoteComment, NoteStatus, Object, Relation,
    Tags, User, Way,
};

const NOTE: &str = "note";
const USER: &str = "user";

/// The element names a scanner turns into objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ElementKind {
    Bounds,
    Node,
    Way,
    Relation,
    Changeset,
    Note,
    User,
}

const ELEMENTS: [(&str, ElementKind); 7] = [
    ("bounds", ElementKind::Bounds),
    ("node", ElementKind::Node),
    ("way", ElementKind::Way),
    ("relation", ElementKind::Relation),
    ("changeset", ElementKind::Changeset),
    ("note", ElementKind::Note),
    ("user", ElementKind::User),
];

impl ElementKind {
    /// Looks up a local element name, ignoring ASCII case.
    pub(super) fn classify(name: &[u8]) -> Option<ElementKind> {
        ELEMENTS
            .iter()
            .find(|(known, _)| known.as_bytes().eq_ignore_ascii_case(name))
            .map(|&(_, kind)| kind)
    }
}

pub(super) fn decode_element<R: BufRead>(
    reader: &mut Reader<R>,
    kind: ElementKind,
    start: &BytesStart,
    empty: bool,
) -> Result<Object, ScanError> {
    match kind {
        ElementKind::Bounds => decode_bounds(reader, start, empty).map(Object::Bounds),
        ElementKind::Node => decode_node(reader, start, empty).map(Object::Node),
        ElementKind::Way => decode_way(reader, start, empty).map(Object::Way),
        ElementKind::Relation => decode_relation(reader, start, empty).map(Object::Relation),
        ElementKind::Changeset => decode_changeset(reader, start, empty).map(Object::Changeset),
        ElementKind::Note => decode_note(reader, start, empty).map(Object::Note),
        ElementKind::User => decode_user(reader, start, empty).map(Object::User),
    }
}

fn skip<R: BufRead>(reader: &mut Reader<R>, element: &'static str) -> Result<(), ScanError> {
    read_children(reader, element, |_| Ok(()))
}

fn unexpected_eof(element: &'static str) -> ScanError {
    ElementError::new(element, ElementErrorKind::UnexpectedEof).into()
}

fn decode_bounds<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
    empty: bool,
) -> Result<Bounds, ScanError> {
    let attrs = Attrs::read("bounds", start)?;
    let bounds = Bounds {
        min_lat: attrs.or_default("minlat")?,
        max_lat: attrs.or_default("maxlat")?,
        min_lon: attrs.or_default("minlon")?,
        max_lon: attrs.or_default("maxlon")?,
    };
    if !empty {
        skip(reader, "bounds")?;
    }
    Ok(bounds)
}

/// Attributes shared by nodes, ways and relations.
struct Meta {
    id: i64,
    user: String,
    user_id: i64,
    visible: bool,
    version: i32,
    changeset_id: i64,
    timestamp: i64,
}

impl Meta {
    fn read(attrs: &Attrs) -> Result<Meta, ScanError> {
        Ok(Meta {
            id: attrs.or_default("id")?,
            user: attrs.string("user"),
            user_id: attrs.parse("uid")?.unwrap_or_default(),
            visible: attrs.parse("visible")?.unwrap_or(true),
            version: attrs.parse("version")?.unwrap_or_default(),
            changeset_id: attrs.parse("changeset")?.unwrap_or_default(),
            timestamp: attrs.timestamp("timestamp")?.unwrap_or_default(),
        })
    }
}

fn decode_node<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
    empty: bool,
) -> Result<Node, ScanError> {
    let attrs = Attrs::read("node", start)?;
    let meta = Meta::read(&attrs)?;
    let mut tags = Tags::new();
    if !empty {
        read_children(reader, "node", |child| match child.local_name().as_ref() {
            b"tag" => push_tag("node", child, &mut tags),
            _ => Ok(()),
        })?;
    }

    Ok(Node {
        id: meta.id,
        // deleted nodes in an osmChange carry no coordinates
        lat: attrs.parse("lat")?.unwrap_or_default(),
        lon: attrs.parse("lon")?.unwrap_or_default(),
        user: meta.user,
        user_id: meta.user_id,
        visible: meta.visible,
        version: meta.version,
        changeset_id: meta.changeset_id,
        timestamp: meta.timestamp,
        tags,
    })
}

fn decode_way<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
    empty: bool,
) -> Result<Way, ScanError> {
    let attrs = Attrs::read("way", start)?;
    let meta = Meta::read(&attrs)?;
    let mut nodes: Vec<i64> = Vec::new();
    let mut tags = Tags::new();
    if !empty {
        read_children(reader, "way", |child| match child.local_name().as_ref() {
            b"nd" => {
                nodes.push(Attrs::read("way", child)?.or_default("ref")?);
                Ok(())
            }
            b"tag" => push_tag("way", child, &mut tags),
            _ => Ok(()),
        })?;
    }

    Ok(Way {
        id: meta.id,
        user: meta.user,
        user_id: meta.user_id,
        visible: meta.visible,
        version: meta.version,
        changeset_id: meta.changeset_id,
        timestamp: meta.timestamp,
        nodes,
        tags,
    })
}

/// Reads a `<member>` child. Members with a missing or unknown `type` are
/// dropped, since the element model has no variant to hold them.
fn read_member(child: &BytesStart) -> Result<Option<Member>, ScanError> {
    let attrs = Attrs::read("relation", child)?;
    let name = attrs.string("type");
    let Some(kind) = MemberType::from_name(&name) else {
        debug!("skipping relation member of unknown type {:?}", name);
        return Ok(None);
    };

    Ok(Some(Member {
        kind,
        reference: attrs.or_default("ref")?,
        role: attrs.string("role"),
    }))
}

fn decode_relation<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
    empty: bool,
) -> Result<Relation, ScanError> {
    let attrs = Attrs::read("relation", start)?;
    let meta = Meta::read(&attrs)?;
    let mut members = Vec::new();
    let mut tags = Tags::new();
    if !empty {
        read_children(reader, "relation", |child| match child.local_name().as_ref() {
            b"member" => {
                members.extend(read_member(child)?);
                Ok(())
            }
            b"tag" => push_tag("relation", child, &mut tags),
            _ => Ok(()),
        })?;
    }

    Ok(Relation {
        id: meta.id,
        user: meta.user,
        user_id: meta.user_id,
        visible: meta.visible,
        version: meta.version,
        changeset_id: meta.changeset_id,
        timestamp: meta.timestamp,
        members,
        tags,
    })
}

fn decode_changeset<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
    empty: bool,
) -> Result<Changeset, ScanError> {
    let attrs = Attrs::read("changeset", start)?;

    // a changeset without edits has no bounding box
    let corners: (Option<f64>, Option<f64>, Option<f64>, Option<f64>) = (
        attrs.parse("min_lat")?,
        attrs.parse("max_lat")?,
        attrs.parse("min_lon")?,
        attrs.parse("max_lon")?,
    );
    let bounds = match corners {
        (Some(min_lat), Some(max_lat), Some(min_lon), Some(max_lon)) => Some(Bounds {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }),
        _ => None,
    };

    let mut tags = Tags::new();
    if !empty {
        read_children(reader, "changeset", |child| match child.local_name().as_ref() {
            b"tag" => push_tag("changeset", child, &mut tags),
            _ => Ok(()),
        })?;
    }

    Ok(Changeset {
        id: attrs.or_default("id")?,
        user: attrs.string("user"),
        user_id: attrs.parse("uid")?.unwrap_or_default(),
        created_at: attrs.timestamp("created_at")?.unwrap_or_default(),
        closed_at: attrs.timestamp("closed_at")?,
        open: attrs.parse("open")?.unwrap_or_default(),
        changes_count: attrs.parse("num_changes")?.unwrap_or_default(),
        comments_count: attrs.parse("comments_count")?.unwrap_or_default(),
        bounds,
        tags,
    })
}

fn decode_note<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
    empty: bool,
) -> Result<Note, ScanError> {
    let attrs = Attrs::read(NOTE, start)?;
    let mut note = Note {
        lat: attrs.parse("lat")?.unwrap_or_default(),
        lon: attrs.parse("lon")?.unwrap_or_default(),
        ..Default::default()
    };
    if empty {
        return Ok(note);
    }

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"id" => note.id = parse_value(NOTE, "id", &read_text(reader, NOTE)?)?,
                b"date_created" => {
                    note.created_at = parse_time(NOTE, "date_created", &read_text(reader, NOTE)?)?
                }
                b"date_closed" => {
                    let raw = read_text(reader, NOTE)?;
                    note.closed_at = Some(parse_time(NOTE, "date_closed", &raw)?)
                }
                b"status" => {
                    let raw = read_text(reader, NOTE)?;
                    note.status = NoteStatus::from_name(raw.trim()).ok_or_else(|| {
                        ElementError::new(
                            NOTE,
                            ElementErrorKind::InvalidValue {
                                field: "status",
                                value: raw.clone(),
                            },
                        )
                    })?;
                }
                b"comments" => note.comments = read_note_comments(reader)?,
                _ => skip(reader, NOTE)?,
            },
            Event::End(_) => return Ok(note),
            Event::Eof => return Err(unexpected_eof(NOTE)),
            _ => {}
        }
        buf.clear();
    }
}

fn read_note_comments<R: BufRead>(reader: &mut Reader<R>) -> Result<Vec<NoteComment>, ScanError> {
    let mut comments = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) if e.local_name().as_ref() == b"comment" => {
                comments.push(read_note_comment(reader)?)
            }
            Event::Start(_) => skip(reader, NOTE)?,
            Event::End(_) => return Ok(comments),
            Event::Eof => return Err(unexpected_eof(NOTE)),
            _ => {}
        }
        buf.clear();
    }
}

fn read_note_comment<R: BufRead>(reader: &mut Reader<R>) -> Result<NoteComment, ScanError> {
    let mut comment = NoteComment::default();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"date" => comment.date = parse_time(NOTE, "date", &read_text(reader, NOTE)?)?,
                b"uid" => comment.user_id = parse_value(NOTE, "uid", &read_text(reader, NOTE)?)?,
                b"user" => comment.user = read_text(reader, NOTE)?,
                b"action" => comment.action = read_text(reader, NOTE)?,
                b"text" => comment.text = read_text(reader, NOTE)?,
                _ => skip(reader, NOTE)?,
            },
            Event::End(_) => return Ok(comment),
            Event::Eof => return Err(unexpected_eof(NOTE)),
            _ => {}
        }
        buf.clear();
    }
}

/// Applies the attributes of a `<user>` child such as `<img href=".."/>`.
fn apply_user_child(user: &mut User, e: &BytesStart) -> Result<(), ScanError> {
    match e.local_name().as_ref() {
        b"img" => user.image_url = Attrs::read(USER, e)?.get("href").map(str::to_string),
        b"changesets" => {
            user.changesets_count = Attrs::read(USER, e)?.parse("count")?.unwrap_or_default()
        }
        b"traces" => user.traces_count = Attrs::read(USER, e)?.parse("count")?.unwrap_or_default(),
        _ => {}
    }
    Ok(())
}

fn decode_user<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
    empty: bool,
) -> Result<User, ScanError> {
    let attrs = Attrs::read(USER, start)?;
    let mut user = User {
        id: attrs.or_default("id")?,
        name: attrs.string("display_name"),
        account_created: attrs.timestamp("account_created")?.unwrap_or_default(),
        ..Default::default()
    };
    if empty {
        return Ok(user);
    }

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) if e.local_name().as_ref() == b"description" => {
                user.description = read_text(reader, USER)?
            }
            Event::Start(ref e) => {
                apply_user_child(&mut user, e)?;
                skip(reader, USER)?;
            }
            Event::Empty(ref e) => apply_user_child(&mut user, e)?,
            Event::End(_) => return Ok(user),
            Event::Eof => return Err(unexpected_eof(USER)),
            _ => {}
        }
        buf.clear();
    }
}
