//! Attribute and child-element helpers shared by the element decoders.

use std::io::BufRead;
use std::str::FromStr;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{ElementError, ElementErrorKind, ScanError};
use crate::model::{Tag, Tags};
use crate::util::parse_timestamp;

/// The attributes of one start tag, unescaped.
///
/// Lookups are linear; OSM elements carry a handful of attributes.
pub(super) struct Attrs {
    element: &'static str,
    values: Vec<(String, String)>,
}

impl Attrs {
    /// Collects the attributes of `e`, attributing failures to `element`.
    pub(super) fn read(element: &'static str, e: &BytesStart) -> Result<Self, ScanError> {
        let mut values = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|_| {
                    ElementError::new(element, ElementErrorKind::InvalidUtf8("attribute name"))
                })?
                .to_string();
            let value = attr.unescape_value()?.into_owned();
            values.push((key, value));
        }
        Ok(Self { element, values })
    }

    pub(super) fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the attribute as an owned string, empty when absent.
    pub(super) fn string(&self, name: &str) -> String {
        self.get(name).unwrap_or_default().to_string()
    }

    pub(super) fn parse<T: FromStr>(&self, name: &'static str) -> Result<Option<T>, ScanError> {
        match self.get(name) {
            Some(raw) => parse_value(self.element, name, raw).map(Some),
            None => Ok(None),
        }
    }

    /// Parses the attribute, taking the type's zero value when it is absent.
    pub(super) fn or_default<T: FromStr + Default>(
        &self,
        name: &'static str,
    ) -> Result<T, ScanError> {
        Ok(self.parse(name)?.unwrap_or_default())
    }

    pub(super) fn timestamp(&self, name: &'static str) -> Result<Option<i64>, ScanError> {
        match self.get(name) {
            Some(raw) => parse_time(self.element, name, raw).map(Some),
            None => Ok(None),
        }
    }
}

pub(super) fn parse_value<T: FromStr>(
    element: &'static str,
    field: &'static str,
    raw: &str,
) -> Result<T, ScanError> {
    raw.trim().parse().map_err(|_| {
        ElementError::new(
            element,
            ElementErrorKind::InvalidValue {
                field,
                value: raw.to_string(),
            },
        )
        .into()
    })
}

pub(super) fn parse_time(
    element: &'static str,
    field: &'static str,
    raw: &str,
) -> Result<i64, ScanError> {
    parse_timestamp(raw.trim()).map_err(|e| {
        ElementError::new(
            element,
            ElementErrorKind::InvalidTimestamp {
                field,
                message: e.message,
            },
        )
        .into()
    })
}

/// Reads a `<tag k=".." v=".."/>` child into `tags`.
pub(super) fn push_tag(
    element: &'static str,
    e: &BytesStart,
    tags: &mut Tags,
) -> Result<(), ScanError> {
    let attrs = Attrs::read(element, e)?;
    tags.push(Tag::new(attrs.string("k"), attrs.string("v")));
    Ok(())
}

/// Walks the children of the element whose start tag was just read, up to
/// and including its end tag.
///
/// `visit` sees every direct child start tag (self-closing or not); deeper
/// descendants and text are skipped.
pub(super) fn read_children<R, F>(
    reader: &mut Reader<R>,
    element: &'static str,
    mut visit: F,
) -> Result<(), ScanError>
where
    R: BufRead,
    F: FnMut(&BytesStart) -> Result<(), ScanError>,
{
    let mut depth = 1;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                if depth == 1 {
                    visit(e)?;
                }
                depth += 1;
            }
            Event::Empty(ref e) => {
                if depth == 1 {
                    visit(e)?;
                }
            }
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => {
                return Err(ElementError::new(element, ElementErrorKind::UnexpectedEof).into());
            }
            _ => {}
        }
        buf.clear();
    }
}

/// Reads character data up to the end tag of the current element.
///
/// Nested markup is skipped; text and CDATA sections are concatenated.
pub(super) fn read_text<R: BufRead>(
    reader: &mut Reader<R>,
    element: &'static str,
) -> Result<String, ScanError> {
    let mut depth = 1;
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(text);
                }
            }
            Event::Text(ref t) if depth == 1 => text.push_str(&t.unescape()?),
            Event::CData(ref c) if depth == 1 => {
                let data = std::str::from_utf8(c).map_err(|_| {
                    ElementError::new(element, ElementErrorKind::InvalidUtf8("text"))
                })?;
                text.push_str(data);
            }
            Event::Eof => {
                return Err(ElementError::new(element, ElementErrorKind::UnexpectedEof).into());
            }
            _ => {}
        }
        buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(xml: &str) -> (Reader<&[u8]>, BytesStart<'static>) {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) | Event::Empty(e) => return (reader, e.into_owned()),
                Event::Eof => panic!("no start tag"),
                _ => {}
            }
        }
    }

    #[test]
    fn test_attrs_lookup() {
        let (_, e) = start(r#"<node id="7" lat="1.5" user="a &amp; b"/>"#);
        let attrs = Attrs::read("node", &e).unwrap();
        assert_eq!(attrs.or_default::<i64>("id").unwrap(), 7);
        assert_eq!(attrs.or_default::<i64>("version").unwrap(), 0);
        assert_eq!(attrs.parse::<f64>("lat").unwrap(), Some(1.5));
        assert_eq!(attrs.parse::<f64>("lon").unwrap(), None);
        assert_eq!(attrs.string("user"), "a & b");
        assert_eq!(attrs.string("missing"), "");
    }

    #[test]
    fn test_attrs_errors() {
        let (_, e) = start(r#"<node id="x" timestamp="yesterday"/>"#);
        let attrs = Attrs::read("node", &e).unwrap();

        let err = attrs.or_default::<i64>("id").unwrap_err();
        assert!(matches!(
            err,
            ScanError::Element(ElementError {
                element: "node",
                kind: ElementErrorKind::InvalidValue { field: "id", .. },
            })
        ));

        let err = attrs.timestamp("timestamp").unwrap_err();
        assert!(matches!(
            err,
            ScanError::Element(ElementError {
                kind: ElementErrorKind::InvalidTimestamp { field: "timestamp", .. },
                ..
            })
        ));
    }

    #[test]
    fn test_read_children_visits_direct_children_only() {
        let (mut reader, _) = start(
            r#"<way id="1"><nd ref="1"/><tag k="a" v="b"><nd ref="9"/></tag><nd ref="2"></nd></way>
               <after/>"#,
        );
        let mut names = Vec::new();
        read_children(&mut reader, "way", |e| {
            names.push(String::from_utf8(e.name().as_ref().to_vec()).unwrap());
            Ok(())
        })
        .unwrap();
        assert_eq!(names, ["nd", "tag", "nd"]);

        // the reader is positioned after </way>
        match reader.read_event().unwrap() {
            Event::Empty(e) => assert_eq!(e.name().as_ref(), b"after"),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_read_children_unexpected_eof() {
        let (mut reader, _) = start(r#"<way id="1"><nd ref="1"/>"#);
        let err = read_children(&mut reader, "way", |_| Ok(())).unwrap_err();
        assert!(matches!(
            err,
            ScanError::Element(ElementError {
                kind: ElementErrorKind::UnexpectedEof,
                ..
            })
        ));
    }

    #[test]
    fn test_read_text() {
        let (mut reader, _) = start("<text>fish &amp; chips<![CDATA[ <now>]]></text>");
        assert_eq!(read_text(&mut reader, "note").unwrap(), "fish & chips <now>");
    }
}
