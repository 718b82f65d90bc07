//! Directory listing entries
//!
//! The remote store has no directory objects; directory entries are
//! synthesized from folder-listing results and carry only a path. File
//! entries are projected from search results.

use std::pin::Pin;

use chrono::{DateTime, Utc};
use futures::Stream;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::visibility::Visibility;

/// A file found by a listing.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Logical path (prefix stripped).
    pub path: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub visibility: Visibility,
    /// Extra descriptor fields requested via configuration.
    pub extra: Map<String, Value>,
}

/// A directory found by a listing. The remote API reports no size,
/// timestamp or visibility for folders.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    /// Logical path (prefix stripped).
    pub path: String,
}

/// One element of a directory listing.
#[derive(Debug, Clone)]
pub enum Entry {
    File(FileEntry),
    Directory(DirectoryEntry),
}

impl Entry {
    pub fn path(&self) -> &str {
        match self {
            Entry::File(f) => &f.path,
            Entry::Directory(d) => &d.path,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Entry::File(_))
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Entry::Directory(_))
    }
}

/// Stream type for directory listings. Borrows the adapter for the
/// duration of the iteration; each pull drives at most one remote
/// pagination call.
pub type EntryStream<'a> = Pin<Box<dyn Stream<Item = Result<Entry>> + Send + 'a>>;
