//! Error handling module for circdesk
//!
//! Every failure the core can report is a variant of [`LibraryError`].
//! None of them is fatal: callers decide how to surface them.

use std::path::{Path, PathBuf};
use strum::Display;
use thiserror::Error;

/// Which kind of record a lookup was searching for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum RecordKind {
    Book,
    User,
}

/// A malformed line in a persisted resource.
///
/// Kept separate from [`LibraryError`] so lenient loading can hand back a
/// list of them while still loading every well-formed record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{resource}:{line_number}: {reason} (line: {line:?})")]
pub struct LoadError {
    /// Resource the line came from (usually the file path)
    pub resource: String,
    /// 1-based line number
    pub line_number: usize,
    /// The offending line, untrimmed
    pub line: String,
    /// What is wrong with it
    pub reason: String,
}

impl LoadError {
    pub fn new(
        resource: impl Into<String>,
        line_number: usize,
        line: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            resource: resource.into(),
            line_number,
            line: line.into(),
            reason: reason.into(),
        }
    }
}

/// Main error type for circdesk
#[derive(Error, Debug)]
pub enum LibraryError {
    /// Exact-match lookup on a title or name found nothing
    #[error("No {kind} named {key:?}")]
    NotFound { kind: RecordKind, key: String },

    /// Borrow attempted on a book that is already out
    #[error("Book {title:?} is already borrowed")]
    AlreadyBorrowed { title: String },

    /// Return attempted for a title the user does not hold
    #[error("{name:?} does not hold {title:?}")]
    NotHeldByUser { name: String, title: String },

    /// Removal attempted on a book someone still holds.
    /// `holder` is `None` only if the held-set and status disagree.
    #[error("Book {title:?} is on loan{}", holder_suffix(.holder))]
    OnLoan {
        title: String,
        holder: Option<String>,
    },

    /// Field value that cannot be stored in the line format
    #[error("Invalid {field} {value:?}: {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    /// Malformed persisted record
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// File access failed
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn holder_suffix(holder: &Option<String>) -> String {
    holder
        .as_ref()
        .map(|name| format!(" to {name:?}"))
        .unwrap_or_default()
}

/// Result type alias for circdesk operations
pub type Result<T> = std::result::Result<T, LibraryError>;

// Convenient error constructors
impl LibraryError {
    /// Create a lookup miss for a book title
    pub fn book_not_found(title: impl Into<String>) -> Self {
        Self::NotFound {
            kind: RecordKind::Book,
            key: title.into(),
        }
    }

    /// Create a lookup miss for a user name
    pub fn user_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: RecordKind::User,
            key: name.into(),
        }
    }

    /// Wrap an IO error with the path it happened on
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// True for lookup misses
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
