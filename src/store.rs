//! Flat-file persistence
//!
//! Three line-oriented text files, `;`-separated, no escaping:
//!
//! ```text
//! books.txt   title;author;status
//! users.txt   name
//! loans.txt   title;name
//! ```
//!
//! A missing file loads as empty. Saving overwrites every file with the full
//! current state. Writes are not atomic: a crash mid-save can leave a
//! truncated file.
//!
//! The loan file is what lets held-sets survive a restart. Loading reconciles
//! it against the books, so the circulation invariant holds after every load
//! even for data written without a loan file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::catalog::Book;
use crate::config::LibraryConfig;
use crate::error::{LibraryError, LoadError, Result};
use crate::library::Library;
use crate::membership::User;
use crate::types::{BookStatus, FIELD_DELIMITER};

/// How to treat a malformed line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadMode {
    /// Stop at the first one
    Strict,
    /// Skip it and keep going
    Lenient,
}

/// Reads and writes a [`Library`] to its data files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceStore {
    books_path: PathBuf,
    users_path: PathBuf,
    loans_path: PathBuf,
}

impl PersistenceStore {
    pub fn new(
        books_path: impl Into<PathBuf>,
        users_path: impl Into<PathBuf>,
        loans_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            books_path: books_path.into(),
            users_path: users_path.into(),
            loans_path: loans_path.into(),
        }
    }

    pub fn from_config(config: &LibraryConfig) -> Self {
        Self::new(config.books_path(), config.users_path(), config.loans_path())
    }

    /// Load everything, failing on the first malformed line.
    ///
    /// # Errors
    ///
    /// - `Load` naming the file, line number and text of the bad line
    /// - `Io` if a file exists but cannot be read
    pub fn load(&self) -> Result<Library> {
        let mut skipped = Vec::new();
        self.load_with(LoadMode::Strict, &mut skipped)
    }

    /// Load every well-formed record and report the malformed ones.
    ///
    /// # Errors
    ///
    /// - `Io` if a file exists but cannot be read
    pub fn load_lenient(&self) -> Result<(Library, Vec<LoadError>)> {
        let mut skipped = Vec::new();
        let library = self.load_with(LoadMode::Lenient, &mut skipped)?;
        Ok((library, skipped))
    }

    fn load_with(&self, mode: LoadMode, skipped: &mut Vec<LoadError>) -> Result<Library> {
        let mut library = Library::new();
        let (catalog, membership) = library.parts_mut();

        for book in parse_lines(&self.books_path, mode, skipped, parse_book)? {
            catalog.push(book);
        }
        for user in parse_lines(&self.users_path, mode, skipped, parse_user)? {
            membership.push(user);
        }
        let loans = parse_lines(&self.loans_path, mode, skipped, parse_loan)?;

        reconcile(&mut library, loans);
        debug!(
            "Loaded {} books and {} users",
            library.catalog().len(),
            library.membership().len()
        );
        Ok(library)
    }

    /// Overwrite all three files with the current state.
    ///
    /// # Errors
    ///
    /// - `Io` if a directory or file cannot be written
    pub fn save(&self, library: &Library) -> Result<()> {
        let books: String = library
            .catalog()
            .list()
            .map(|b| format_record(&[b.title(), b.author(), &b.status().to_string()]))
            .collect();
        let users: String = library
            .membership()
            .list()
            .map(|name| format_record(&[name]))
            .collect();
        let loans: String = library
            .membership()
            .users()
            .flat_map(|u| u.held_titles().map(move |title| format_record(&[title, u.name()])))
            .collect();

        write_resource(&self.books_path, &books)?;
        write_resource(&self.users_path, &users)?;
        write_resource(&self.loans_path, &loans)?;

        debug!(
            "Saved {} books and {} users",
            library.catalog().len(),
            library.membership().len()
        );
        Ok(())
    }
}

fn format_record(fields: &[&str]) -> String {
    let separator = FIELD_DELIMITER.to_string();
    let mut line = fields.join(separator.as_str());
    line.push('\n');
    line
}

fn write_resource(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| LibraryError::io(parent, e))?;
    }
    fs::write(path, content).map_err(|e| LibraryError::io(path, e))
}

/// Read a resource, treating a missing file as empty
fn read_resource(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("{:?} does not exist, starting empty", path);
            Ok(None)
        }
        Err(e) => Err(LibraryError::io(path, e)),
    }
}

/// Parse every non-blank line of a resource with `parse`.
///
/// Lines are trimmed before parsing. A parse failure becomes a `LoadError`
/// that either aborts (strict) or is recorded and skipped (lenient).
fn parse_lines<T>(
    path: &Path,
    mode: LoadMode,
    skipped: &mut Vec<LoadError>,
    parse: fn(&str) -> std::result::Result<T, String>,
) -> Result<Vec<T>> {
    let Some(content) = read_resource(path)? else {
        return Ok(Vec::new());
    };

    let mut records = Vec::new();
    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        match parse(line) {
            Ok(record) => records.push(record),
            Err(reason) => {
                let err = LoadError::new(path.display().to_string(), index + 1, raw, reason);
                if mode == LoadMode::Strict {
                    return Err(err.into());
                }
                warn!("Skipping malformed record: {}", err);
                skipped.push(err);
            }
        }
    }
    Ok(records)
}

fn split_fields(line: &str, expected: usize) -> std::result::Result<Vec<&str>, String> {
    let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
    if fields.len() != expected {
        return Err(format!("expected {} fields, found {}", expected, fields.len()));
    }
    Ok(fields)
}

fn parse_book(line: &str) -> std::result::Result<Book, String> {
    let fields = split_fields(line, 3)?;
    let status: BookStatus = fields[2]
        .parse()
        .map_err(|_| format!("unknown status {:?}", fields[2]))?;
    Ok(Book::with_status(fields[0], fields[1], status))
}

fn parse_user(line: &str) -> std::result::Result<User, String> {
    let fields = split_fields(line, 1)?;
    Ok(User::new(fields[0]))
}

fn parse_loan(line: &str) -> std::result::Result<(String, String), String> {
    let fields = split_fields(line, 2)?;
    Ok((fields[0].to_string(), fields[1].to_string()))
}

/// Apply loan records and repair anything that would break the invariant.
///
/// A loan is kept only if the title's first book is borrowed, the user
/// exists and nobody holds the title yet. Then every borrowed book nobody
/// holds, and every borrowed shadowed duplicate, goes back to available.
fn reconcile(library: &mut Library, loans: Vec<(String, String)>) {
    let (catalog, membership) = library.parts_mut();

    for (title, name) in loans {
        let borrowed = catalog
            .find(&title)
            .is_ok_and(|b| b.status() == BookStatus::Borrowed);
        if !borrowed {
            warn!("Dropping loan of {:?} to {:?}: book is not borrowed", title, name);
            continue;
        }
        if let Some(holder) = membership.holder_of(&title) {
            warn!(
                "Dropping loan of {:?} to {:?}: already held by {:?}",
                title,
                name,
                holder.name()
            );
            continue;
        }
        match membership.find_mut(&name) {
            Ok(user) => {
                user.held_titles.insert(title);
            }
            Err(_) => warn!("Dropping loan of {:?} to {:?}: no such user", title, name),
        }
    }

    let mut seen: Vec<String> = Vec::new();
    for book in catalog.list_mut() {
        let shadowed = seen.iter().any(|t| t == book.title());
        if !shadowed {
            seen.push(book.title().to_string());
        }
        if book.status == BookStatus::Borrowed
            && (shadowed || membership.holder_of(book.title()).is_none())
        {
            warn!("{:?} is marked borrowed but nobody holds it; marking available", book.title());
            book.status = BookStatus::Available;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &Path) -> PersistenceStore {
        PersistenceStore::new(
            dir.join("books.txt"),
            dir.join("users.txt"),
            dir.join("loans.txt"),
        )
    }

    #[test]
    fn test_parse_book_line() {
        let book = parse_book("Dune;Herbert;Borrowed").unwrap();
        assert_eq!(book, Book::with_status("Dune", "Herbert", BookStatus::Borrowed));
    }

    #[test]
    fn test_parse_book_wrong_field_count() {
        assert_eq!(parse_book("BadLine").unwrap_err(), "expected 3 fields, found 1");
        assert_eq!(parse_book("a;b;Available;d").unwrap_err(), "expected 3 fields, found 4");
    }

    #[test]
    fn test_parse_book_unknown_status() {
        assert_eq!(
            parse_book("Dune;Herbert;Lost").unwrap_err(),
            "unknown status \"Lost\""
        );
    }

    #[test]
    fn test_parse_user_rejects_delimiter() {
        assert!(parse_user("Alice").is_ok());
        assert!(parse_user("Alice;Bob").is_err());
    }

    #[test]
    fn test_missing_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let library = store_in(dir.path()).load().unwrap();
        assert_eq!(library, Library::new());
    }

    #[test]
    fn test_blank_lines_and_crlf_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("books.txt"), "Dune;Herbert;Available\r\n\r\nEmma;Austen;Available\r\n").unwrap();
        fs::write(dir.path().join("users.txt"), "Alice\n\n  \nBob\n").unwrap();

        let library = store_in(dir.path()).load().unwrap();
        assert_eq!(library.catalog().len(), 2);
        assert_eq!(library.membership().list().collect::<Vec<_>>(), ["Alice", "Bob"]);
    }

    #[test]
    fn test_save_writes_expected_lines() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let mut library = Library::new();
        library.add_book("Dune", "Herbert").unwrap();
        library.add_book("Emma", "Austen").unwrap();
        library.register_user("Alice").unwrap();
        library.borrow("Alice", "Emma").unwrap();

        store.save(&library).unwrap();

        let books = fs::read_to_string(dir.path().join("books.txt")).unwrap();
        assert_eq!(books, "Dune;Herbert;Available\nEmma;Austen;Borrowed\n");
        let users = fs::read_to_string(dir.path().join("users.txt")).unwrap();
        assert_eq!(users, "Alice\n");
        let loans = fs::read_to_string(dir.path().join("loans.txt")).unwrap();
        assert_eq!(loans, "Emma;Alice\n");
    }

    #[test]
    fn test_save_creates_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir.path().join("nested/data"));
        store.save(&Library::new()).unwrap();
        assert!(dir.path().join("nested/data/books.txt").exists());
    }

    #[test]
    fn test_reconcile_drops_conflicting_loans() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("books.txt"), "Dune;Herbert;Borrowed\nEmma;Austen;Available\n").unwrap();
        fs::write(dir.path().join("users.txt"), "Alice\nBob\n").unwrap();
        fs::write(
            dir.path().join("loans.txt"),
            "Dune;Alice\nDune;Bob\nEmma;Bob\nDune;Carol\n",
        )
        .unwrap();

        let library = store_in(dir.path()).load().unwrap();
        assert!(library.membership().find("Alice").unwrap().holds("Dune"));
        assert_eq!(library.membership().find("Bob").unwrap().held_count(), 0);
        assert!(library.audit().is_empty());
    }

    #[test]
    fn test_reconcile_resets_borrowed_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("books.txt"), "Dune;Herbert;Borrowed\nDune;Herbert;Borrowed\n").unwrap();
        fs::write(dir.path().join("users.txt"), "Alice\n").unwrap();
        fs::write(dir.path().join("loans.txt"), "Dune;Alice\n").unwrap();

        let library = store_in(dir.path()).load().unwrap();
        let statuses: Vec<BookStatus> = library.catalog().list().map(Book::status).collect();
        assert_eq!(statuses, [BookStatus::Borrowed, BookStatus::Available]);
        assert!(library.audit().is_empty());
    }

    #[test]
    fn test_malformed_loan_line_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("loans.txt"), "Dune\n").unwrap();

        let err = store_in(dir.path()).load().unwrap_err();
        match err {
            LibraryError::Load(load) => {
                assert!(load.resource.ends_with("loans.txt"));
                assert_eq!(load.line_number, 1);
            }
            other => panic!("Expected Load error, got {other:?}"),
        }
    }
}
