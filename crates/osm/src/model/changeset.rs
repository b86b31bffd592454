//! Changeset, note and user records.

use crate::model::{Bounds, Tags};

/// Metadata for a set of edits uploaded as one unit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Changeset {
    pub id: i64,
    pub user: String,
    pub user_id: i64,
    pub created_at: i64,
    pub closed_at: Option<i64>,
    pub open: bool,
    pub changes_count: u32,
    pub comments_count: u32,
    pub bounds: Option<Bounds>,
    pub tags: Tags,
}

impl Changeset {
    /// Returns the `comment` tag, if any.
    pub fn comment(&self) -> Option<&str> {
        self.tags.find("comment")
    }

    /// Returns the `created_by` tag, if any.
    pub fn created_by(&self) -> Option<&str> {
        self.tags.find("created_by")
    }
}

/// Lifecycle state of a map note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoteStatus {
    #[default]
    Open,
    Closed,
    Hidden,
}

impl NoteStatus {
    pub fn from_name(name: &str) -> Option<NoteStatus> {
        match name {
            "open" => Some(NoteStatus::Open),
            "closed" => Some(NoteStatus::Closed),
            "hidden" => Some(NoteStatus::Hidden),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NoteStatus::Open => "open",
            NoteStatus::Closed => "closed",
            NoteStatus::Hidden => "hidden",
        }
    }
}

/// One entry in a note's discussion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NoteComment {
    pub date: i64,
    pub user: String,
    pub user_id: i64,
    /// `opened`, `commented`, `closed`, `reopened` or `hidden`.
    pub action: String,
    pub text: String,
}

/// A map note left by a user.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Note {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
    pub status: NoteStatus,
    pub created_at: i64,
    pub closed_at: Option<i64>,
    pub comments: Vec<NoteComment>,
}

/// A public user profile.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub account_created: i64,
    pub changesets_count: u32,
    pub traces_count: u32,
    pub image_url: Option<String>,
}
