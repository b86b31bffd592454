//! Streaming scanner over OSM XML documents.
//!
//! Works on `<osm>` downloads, `<osmChange>` diffs and API responses for
//! changesets, notes and users alike: every `bounds`, `node`, `way`,
//! `relation`, `changeset`, `note` and `user` element found anywhere in the
//! token stream becomes one [`Object`]. Other elements are skipped without
//! error, and their children are scanned as ordinary tokens.
//!
//! ```ignore
//! let file = std::io::BufReader::new(std::fs::File::open("map.osm")?);
//! let mut scanner = XmlScanner::new(file);
//! while scanner.scan() {
//!     println!("{:?}", scanner.object());
//! }
//! if let Some(err) = scanner.err() {
//!     return Err(err.clone().into());
//! }
//! ```

mod decode;
mod helpers;

use std::io::BufRead;

use log::{debug, trace};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::ScanError;
use crate::model::Object;
use crate::scan::{Background, Cancellation, Scanner};

use decode::{decode_element, ElementKind};

/// Why a scanner stopped.
#[derive(Debug)]
enum Stop {
    /// Clean end of input.
    Eof,
    Failed(ScanError),
}

/// Outcome of handling one token.
enum Step {
    Skip,
    Found(Object),
    Stopped(Stop),
}

/// A [`Scanner`] over an XML token stream.
///
/// The scanner borrows nothing from its input and never closes it;
/// [`into_inner`](XmlScanner::into_inner) hands the reader back.
pub struct XmlScanner<R: BufRead, C: Cancellation = Background> {
    reader: Reader<R>,
    ctx: C,
    object: Option<Object>,
    stop: Option<Stop>,
    /// Unrecognized elements opened but not yet closed.
    depth: usize,
}

impl<R: BufRead> XmlScanner<R> {
    /// Creates a scanner that can only be stopped by [`Scanner::close`].
    pub fn new(reader: R) -> Self {
        Self::with_cancellation(reader, Background)
    }
}

impl<R: BufRead, C: Cancellation> XmlScanner<R, C> {
    /// Creates a scanner that polls `ctx` before every token it reads.
    pub fn with_cancellation(reader: R, ctx: C) -> Self {
        let mut reader = Reader::from_reader(reader);
        reader.config_mut().trim_text(true);

        Self {
            reader,
            ctx,
            object: None,
            stop: None,
            depth: 0,
        }
    }

    /// Returns true once `scan()` has returned false for good.
    pub fn is_stopped(&self) -> bool {
        self.stop.is_some()
    }

    /// Byte offset of the reader within the input.
    pub fn position(&self) -> u64 {
        self.reader.buffer_position()
    }

    /// Returns the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    /// Adapts the scanner into an iterator of owned objects.
    ///
    /// The iterator moves each object out of the scanner, so `object()`
    /// returns `None` while iterating.
    pub fn objects(&mut self) -> Objects<'_, R, C> {
        Objects {
            scanner: self,
            error_reported: false,
        }
    }

    fn finish(&mut self, stop: Stop) {
        match &stop {
            Stop::Eof => debug!("scan finished at end of input"),
            Stop::Failed(err) => debug!(
                "scan stopped at byte {}: {}",
                self.reader.buffer_position(),
                err
            ),
        }
        self.stop = Some(stop);
    }
}

/// Handles one token, decoding the subtree of recognized elements.
///
/// `depth` counts the unrecognized elements still open around the cursor.
/// Recognized subtrees are consumed whole by their decoder and never
/// change it.
fn step<R: BufRead>(
    reader: &mut Reader<R>,
    depth: &mut usize,
    event: Result<Event, quick_xml::Error>,
) -> Step {
    let (start, empty): (BytesStart, bool) = match event {
        Ok(Event::Start(e)) => (e, false),
        Ok(Event::Empty(e)) => (e, true),
        Ok(Event::End(_)) => {
            *depth = depth.saturating_sub(1);
            return Step::Skip;
        }
        Ok(Event::Eof) if *depth > 0 => {
            let err = ScanError::UnexpectedEof { open: *depth };
            return Step::Stopped(Stop::Failed(err));
        }
        Ok(Event::Eof) => return Step::Stopped(Stop::Eof),
        Ok(_) => return Step::Skip,
        Err(e) => return Step::Stopped(Stop::Failed(e.into())),
    };

    let name = start.local_name();
    let Some(kind) = ElementKind::classify(name.as_ref()) else {
        debug!(
            "skipping unrecognized element <{}>",
            String::from_utf8_lossy(name.as_ref())
        );
        if !empty {
            *depth += 1;
        }
        return Step::Skip;
    };

    match decode_element(reader, kind, &start, empty) {
        Ok(object) => {
            trace!("decoded {} {:?}", object.kind(), object.id());
            Step::Found(object)
        }
        Err(err) => Step::Stopped(Stop::Failed(err)),
    }
}

impl<R: BufRead, C: Cancellation> Scanner for XmlScanner<R, C> {
    fn scan(&mut self) -> bool {
        if self.stop.is_some() {
            return false;
        }

        let mut buf = Vec::new();
        loop {
            if let Some(cause) = self.ctx.cancelled() {
                self.finish(Stop::Failed(ScanError::Cancelled(cause)));
                return false;
            }

            let event = self.reader.read_event_into(&mut buf);
            let outcome = step(&mut self.reader, &mut self.depth, event);
            buf.clear();

            match outcome {
                Step::Skip => {}
                Step::Found(object) => {
                    self.object = Some(object);
                    return true;
                }
                Step::Stopped(stop) => {
                    self.finish(stop);
                    return false;
                }
            }
        }
    }

    fn object(&self) -> Option<&Object> {
        self.object.as_ref()
    }

    fn err(&self) -> Option<&ScanError> {
        match &self.stop {
            Some(Stop::Failed(err)) => Some(err),
            _ => None,
        }
    }

    fn close(&mut self) {
        if self.stop.is_none() {
            self.finish(Stop::Failed(ScanError::Closed));
        }
    }
}

/// Iterator returned by [`XmlScanner::objects`].
pub struct Objects<'a, R: BufRead, C: Cancellation> {
    scanner: &'a mut XmlScanner<R, C>,
    error_reported: bool,
}

impl<R: BufRead, C: Cancellation> Iterator for Objects<'_, R, C> {
    type Item = Result<Object, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.scanner.scan() {
            return self.scanner.object.take().map(Ok);
        }
        if self.error_reported {
            return None;
        }
        self.error_reported = true;
        self.scanner.err().cloned().map(Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ElementError, ElementErrorKind};
    use crate::scan::{CancelCause, CancelToken};

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6" generator="test">
  <bounds minlat="51.5" minlon="-0.2" maxlat="51.6" maxlon="0.1"/>
  <node id="1" lat="51.55" lon="-0.1" version="1"><tag k="name" v="a"/></node>
  <way id="2" version="1"><nd ref="1"/></way>
  <relation id="3" version="1"><member type="way" ref="2" role=""/></relation>
</osm>"#;

    #[test]
    fn test_scan_document() {
        let mut scanner = XmlScanner::new(DOC.as_bytes());
        let mut kinds = Vec::new();
        while scanner.scan() {
            kinds.push(scanner.object().unwrap().kind());
        }
        assert_eq!(kinds, ["bounds", "node", "way", "relation"]);
        assert!(scanner.err().is_none());
        assert!(scanner.is_stopped());

        // stopping is sticky
        assert!(!scanner.scan());
        assert_eq!(scanner.object().unwrap().kind(), "relation");
    }

    #[test]
    fn test_object_before_scan() {
        let scanner = XmlScanner::new(DOC.as_bytes());
        assert!(scanner.object().is_none());
        assert!(scanner.err().is_none());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut scanner = XmlScanner::new(DOC.as_bytes());
        assert!(scanner.scan());
        scanner.close();
        scanner.close();
        assert!(!scanner.scan());
        assert!(matches!(scanner.err(), Some(ScanError::Closed)));
        assert_eq!(scanner.object().unwrap().kind(), "bounds");
    }

    #[test]
    fn test_close_after_eof_keeps_clean_stop() {
        let mut scanner = XmlScanner::new("<osm/>".as_bytes());
        assert!(!scanner.scan());
        scanner.close();
        assert!(scanner.err().is_none());
    }

    #[test]
    fn test_cancel_mid_scan() {
        let token = CancelToken::new();
        let mut scanner = XmlScanner::with_cancellation(DOC.as_bytes(), token.clone());
        assert!(scanner.scan());
        token.cancel();
        assert!(!scanner.scan());
        assert!(matches!(
            scanner.err(),
            Some(ScanError::Cancelled(CancelCause::Cancelled))
        ));
        assert_eq!(scanner.object().unwrap().kind(), "bounds");
    }

    #[test]
    fn test_element_error_is_fatal() {
        let xml = r#"<osm><node id="1"/><node id="oops"/><node id="3"/></osm>"#;
        let mut scanner = XmlScanner::new(xml.as_bytes());
        assert!(scanner.scan());
        assert!(!scanner.scan());
        assert!(matches!(
            scanner.err(),
            Some(ScanError::Element(ElementError {
                element: "node",
                kind: ElementErrorKind::InvalidValue { field: "id", .. },
            }))
        ));
        assert!(!scanner.scan());
        assert_eq!(scanner.object().unwrap().id(), Some(1));
    }

    #[test]
    fn test_truncated_document_is_an_error() {
        let xml = r#"<osm><node id="1" lat="0" lon="0"/><way id="2"><nd ref="1"/></way>"#;
        let mut scanner = XmlScanner::new(xml.as_bytes());
        assert!(scanner.scan());
        assert!(scanner.scan());
        assert!(!scanner.scan());
        assert!(matches!(
            scanner.err(),
            Some(ScanError::UnexpectedEof { open: 1 })
        ));
        assert_eq!(scanner.object().unwrap().id(), Some(2));
    }

    #[test]
    fn test_objects_iterator() {
        let mut scanner = XmlScanner::new(DOC.as_bytes());
        let objects: Vec<_> = scanner.objects().collect::<Result<_, _>>().unwrap();
        assert_eq!(objects.len(), 4);
        assert!(matches!(objects[0], Object::Bounds(_)));
    }

    #[test]
    fn test_objects_iterator_yields_error_once() {
        let xml = r#"<osm><node id="1"/><way id="x"/></osm>"#;
        let mut scanner = XmlScanner::new(xml.as_bytes());
        let mut objects = scanner.objects();
        assert!(matches!(objects.next(), Some(Ok(Object::Node(_)))));
        assert!(matches!(objects.next(), Some(Err(ScanError::Element(_)))));
        assert!(objects.next().is_none());
        assert!(objects.next().is_none());
    }

    #[test]
    fn test_into_inner_returns_reader() {
        let input = DOC.as_bytes();
        let mut scanner = XmlScanner::new(input);
        assert!(scanner.scan());
        let rest = scanner.into_inner();
        assert!(rest.len() < input.len());
    }
}
