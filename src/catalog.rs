//! Book records and the catalog that owns them
//!
//! Titles are the lookup key. Duplicates are allowed, in which case every
//! lookup resolves to the first book with that title.

use std::fmt;
use tracing::{debug, warn};

use crate::error::{LibraryError, Result};
use crate::types::{check_field, check_key, BookStatus};

/// A single book in the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    title: String,
    author: String,
    pub(crate) status: BookStatus,
}

impl Book {
    /// Create an available book
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self::with_status(title, author, BookStatus::Available)
    }

    /// Create a book in a given status (used when restoring from disk)
    pub fn with_status(
        title: impl Into<String>,
        author: impl Into<String>,
        status: BookStatus,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            status,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn status(&self) -> BookStatus {
        self.status
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} ({})", self.title, self.author, self.status)
    }
}

/// Ordered collection of books
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    books: Vec<Book>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new available book at the end of the catalog.
    ///
    /// # Errors
    ///
    /// - `InvalidField` if either field cannot be stored, or the title is
    ///   blank or padded with whitespace
    pub fn add(&mut self, title: impl Into<String>, author: impl Into<String>) -> Result<&Book> {
        let (title, author) = (title.into(), author.into());
        check_key("title", &title)?;
        check_field("author", &author)?;

        if self.contains(&title) {
            warn!("Duplicate title {:?}: lookups will resolve to the first copy", title);
        }
        debug!("Adding book {:?} by {:?}", title, author);
        Ok(self.push(Book::new(title, author)))
    }

    /// Append an already-built book without validation (restore path)
    pub(crate) fn push(&mut self, book: Book) -> &Book {
        self.books.push(book);
        &self.books[self.books.len() - 1]
    }

    /// Remove the first book with this exact title and return it
    pub fn remove(&mut self, title: &str) -> Result<Book> {
        let index = self.position(title)?;
        debug!("Removing book {:?}", title);
        Ok(self.books.remove(index))
    }

    /// First book with this exact title
    pub fn find(&self, title: &str) -> Result<&Book> {
        self.books
            .iter()
            .find(|b| b.title == title)
            .ok_or_else(|| LibraryError::book_not_found(title))
    }

    /// Mutable access to the first book with this exact title
    pub fn find_mut(&mut self, title: &str) -> Result<&mut Book> {
        self.books
            .iter_mut()
            .find(|b| b.title == title)
            .ok_or_else(|| LibraryError::book_not_found(title))
    }

    pub fn contains(&self, title: &str) -> bool {
        self.books.iter().any(|b| b.title == title)
    }

    /// Books in insertion order
    pub fn list(&self) -> impl Iterator<Item = &Book> + '_ {
        self.books.iter()
    }

    pub(crate) fn list_mut(&mut self) -> impl Iterator<Item = &mut Book> + '_ {
        self.books.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    fn position(&self, title: &str) -> Result<usize> {
        self.books
            .iter()
            .position(|b| b.title == title)
            .ok_or_else(|| LibraryError::book_not_found(title))
    }
}
