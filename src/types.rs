//! Shared value types for circdesk
//!
//! Book status is a real enum instead of a free-form label, so an unknown
//! status in a data file is caught at parse time.

use strum::{Display, EnumIter, EnumString};

use crate::error::{LibraryError, Result};

/// Separator between fields in the persisted line format
pub const FIELD_DELIMITER: char = ';';

/// Circulation status of a single book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(Display, EnumString, EnumIter)]
pub enum BookStatus {
    /// On the shelf
    #[default]
    #[strum(to_string = "Available", serialize = "Доступна")]
    Available,
    /// Held by exactly one user
    #[strum(to_string = "Borrowed", serialize = "Выдана")]
    Borrowed,
}

impl BookStatus {
    /// Check if the book can be lent out
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

/// Reject values the line format cannot represent.
///
/// There is no escaping in the data files, so a delimiter or line break
/// inside a field would split the record on reload.
pub fn check_field(field: &'static str, value: &str) -> Result<()> {
    if value.contains(FIELD_DELIMITER) || value.contains(['\n', '\r']) {
        return Err(invalid(field, value, "must not contain ';' or line breaks"));
    }
    Ok(())
}

/// Stricter check for lookup keys (titles and names).
///
/// Data lines are trimmed and blank lines skipped on load, so a key must be
/// non-empty and free of surrounding whitespace to come back unchanged.
pub fn check_key(field: &'static str, value: &str) -> Result<()> {
    check_field(field, value)?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid(field, value, "must not be empty"));
    }
    if trimmed != value {
        return Err(invalid(field, value, "must not start or end with whitespace"));
    }
    Ok(())
}

fn invalid(field: &'static str, value: &str, reason: &'static str) -> LibraryError {
    LibraryError::InvalidField {
        field,
        value: value.to_string(),
        reason,
    }
}
