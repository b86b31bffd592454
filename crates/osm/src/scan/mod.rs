//! Streaming access to OSM objects.
//!
//! A [`Scanner`] steps through a document one object at a time in the
//! manner of a cursor: `scan()` advances, `object()` reads the current
//! object and `err()` explains why scanning stopped.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::ScanError;
use crate::model::Object;

pub use crate::xml::XmlScanner;

/// A cursor over the objects of one document.
///
/// Scanning stops for good at the end of input, the first read or decode
/// error, an explicit [`close`](Scanner::close) or a cancellation signal.
pub trait Scanner {
    /// Advances to the next object. Returns false once scanning has stopped.
    fn scan(&mut self) -> bool;

    /// Returns the object decoded by the most recent successful `scan()`.
    fn object(&self) -> Option<&Object>;

    /// Returns why scanning stopped, or `None` if it reached the end of
    /// input cleanly (or has not stopped).
    fn err(&self) -> Option<&ScanError>;

    /// Stops the scanner. Later calls to `scan()` return false.
    fn close(&mut self);
}

/// Reason a cancellation source has fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelCause {
    Cancelled,
    DeadlineExceeded,
}

impl fmt::Display for CancelCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelCause::Cancelled => f.write_str("cancelled"),
            CancelCause::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

/// A source of cooperative cancellation, polled by scanners before every
/// read.
pub trait Cancellation {
    /// Returns the cause once the source has been signaled.
    fn cancelled(&self) -> Option<CancelCause>;
}

/// A source that is never signaled.
#[derive(Debug, Clone, Copy, Default)]
pub struct Background;

impl Cancellation for Background {
    fn cancelled(&self) -> Option<CancelCause> {
        None
    }
}

/// A manually signaled, clonable cancellation flag.
///
/// Clones share state, so one clone may be handed to a scanner and another
/// signaled from a different thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

impl Cancellation for CancelToken {
    fn cancelled(&self) -> Option<CancelCause> {
        self.is_cancelled().then_some(CancelCause::Cancelled)
    }
}

/// A source that fires once a point in time has passed.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn at(at: Instant) -> Self {
        Self { at }
    }

    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now() + timeout,
        }
    }
}

impl Cancellation for Deadline {
    fn cancelled(&self) -> Option<CancelCause> {
        (Instant::now() >= self.at).then_some(CancelCause::DeadlineExceeded)
    }
}

impl<T: Cancellation + ?Sized> Cancellation for &T {
    fn cancelled(&self) -> Option<CancelCause> {
        (**self).cancelled()
    }
}

impl<T: Cancellation + ?Sized> Cancellation for Arc<T> {
    fn cancelled(&self) -> Option<CancelCause> {
        (**self).cancelled()
    }
}

/// Fires when either source fires; the first source wins ties.
impl<A: Cancellation, B: Cancellation> Cancellation for (A, B) {
    fn cancelled(&self) -> Option<CancelCause> {
        self.0.cancelled().or_else(|| self.1.cancelled())
    }
}
