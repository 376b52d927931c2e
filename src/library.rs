//! The library aggregate: one catalog, one membership
//!
//! Constructed once at startup (usually by the store), handed to the front
//! end by reference and dropped at exit. Name and title resolution happens
//! here so callers can work with plain strings.

use crate::catalog::{Book, Catalog};
use crate::circulation::{audit, CirculationEngine, InvariantViolation};
use crate::error::{LibraryError, Result};
use crate::membership::{Membership, User};
use crate::types::BookStatus;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Library {
    catalog: Catalog,
    membership: Membership,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(catalog: Catalog, membership: Membership) -> Self {
        Self {
            catalog,
            membership,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn membership(&self) -> &Membership {
        &self.membership
    }

    pub fn into_parts(self) -> (Catalog, Membership) {
        (self.catalog, self.membership)
    }

    pub fn add_book(&mut self, title: impl Into<String>, author: impl Into<String>) -> Result<&Book> {
        self.catalog.add(title, author)
    }

    /// Remove a book that is on the shelf.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no book has this title
    /// - `OnLoan` if the first book with this title is borrowed
    pub fn remove_book(&mut self, title: &str) -> Result<Book> {
        if self.catalog.find(title)?.status() == BookStatus::Borrowed {
            let holder = self.membership.holder_of(title).map(|u| u.name().to_string());
            return Err(LibraryError::OnLoan {
                title: title.to_string(),
                holder,
            });
        }
        self.catalog.remove(title)
    }

    pub fn register_user(&mut self, name: impl Into<String>) -> Result<&User> {
        self.membership.register(name)
    }

    /// Resolve `name` and `title`, then lend the book.
    ///
    /// The user is resolved first, so an unknown user is reported even when
    /// the title is unknown too.
    pub fn borrow(&mut self, name: &str, title: &str) -> Result<()> {
        let user = self.membership.find_mut(name)?;
        let book = self.catalog.find_mut(title)?;
        CirculationEngine::borrow(user, book)
    }

    /// Resolve `name` and `title`, then take the book back.
    pub fn return_book(&mut self, name: &str, title: &str) -> Result<()> {
        let user = self.membership.find_mut(name)?;
        let book = self.catalog.find_mut(title)?;
        CirculationEngine::return_book(user, book)
    }

    /// Check the circulation invariant
    pub fn audit(&self) -> Vec<InvariantViolation> {
        audit(&self.catalog, &self.membership)
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut Catalog, &mut Membership) {
        (&mut self.catalog, &mut self.membership)
    }
}
