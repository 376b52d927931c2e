//! Circulation: borrow/return transitions and the invariant audit
//!
//! Each book runs a two-state machine:
//!
//! ```text
//! Available --borrow--> Borrowed
//! Borrowed  --return--> Available
//! ```
//!
//! No other transitions exist. A failed transition leaves both records
//! untouched, so repeating it is harmless.
//!
//! The system-wide invariant is that a book is Borrowed if and only if
//! exactly one user's held-set contains its title. [`audit`] checks it.

use thiserror::Error;
use tracing::debug;

use crate::catalog::{Book, Catalog};
use crate::error::{LibraryError, Result};
use crate::membership::{Membership, User};
use crate::types::BookStatus;

/// Stateless driver for borrow and return.
///
/// Works on records the caller has already resolved, so it never looks
/// anything up and never touches a record other than the two it is given.
#[derive(Debug, Clone, Copy, Default)]
pub struct CirculationEngine;

impl CirculationEngine {
    /// Lend `book` to `user`.
    ///
    /// # Errors
    ///
    /// - `AlreadyBorrowed` if the book is not available
    pub fn borrow(user: &mut User, book: &mut Book) -> Result<()> {
        if book.status != BookStatus::Available {
            return Err(LibraryError::AlreadyBorrowed {
                title: book.title().to_string(),
            });
        }

        book.status = BookStatus::Borrowed;
        user.held_titles.insert(book.title().to_string());
        debug!("{:?} borrowed {:?}", user.name(), book.title());
        Ok(())
    }

    /// Take `book` back from `user`.
    ///
    /// # Errors
    ///
    /// - `NotHeldByUser` if the title is not in the user's held-set, whether
    ///   the book is on the shelf or with somebody else
    pub fn return_book(user: &mut User, book: &mut Book) -> Result<()> {
        if !user.held_titles.contains(book.title()) {
            return Err(LibraryError::NotHeldByUser {
                name: user.name().to_string(),
                title: book.title().to_string(),
            });
        }

        book.status = BookStatus::Available;
        user.held_titles.shift_remove(book.title());
        debug!("{:?} returned {:?}", user.name(), book.title());
        Ok(())
    }
}

/// A breach of the circulation invariant found by [`audit`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Borrowed book that nobody, or more than one user, holds
    #[error("{title:?} is borrowed but held by {holders} users")]
    BorrowedHolderCount { title: String, holders: usize },

    /// Available book that appears in a held-set
    #[error("{title:?} is available but held by {holder:?}")]
    AvailableButHeld { title: String, holder: String },

    /// Held title with no borrowed book behind it
    #[error("{name:?} holds {title:?}, which is not a borrowed book")]
    HeldWithoutLoan { name: String, title: String },

    /// Later copy of a duplicate title that is not available.
    /// Lookups only ever reach the first copy, so this one could never be returned.
    #[error("Shadowed duplicate of {title:?} is borrowed")]
    ShadowedCopyBorrowed { title: String },
}

/// Check the circulation invariant across the whole library.
///
/// Returns every violation found; an empty list means the state is sound.
pub fn audit(catalog: &Catalog, membership: &Membership) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut seen: Vec<&str> = Vec::new();

    for book in catalog.list() {
        let title = book.title();
        if seen.contains(&title) {
            if book.status() != BookStatus::Available {
                violations.push(InvariantViolation::ShadowedCopyBorrowed {
                    title: title.to_string(),
                });
            }
            continue;
        }
        seen.push(title);

        let holders: Vec<&User> = membership.users().filter(|u| u.holds(title)).collect();
        match book.status() {
            BookStatus::Borrowed if holders.len() != 1 => {
                violations.push(InvariantViolation::BorrowedHolderCount {
                    title: title.to_string(),
                    holders: holders.len(),
                });
            }
            BookStatus::Available => {
                violations.extend(holders.iter().map(|u| InvariantViolation::AvailableButHeld {
                    title: title.to_string(),
                    holder: u.name().to_string(),
                }));
            }
            BookStatus::Borrowed => {}
        }
    }

    for user in membership.users() {
        for title in user.held_titles() {
            if !catalog.contains(title) {
                violations.push(InvariantViolation::HeldWithoutLoan {
                    name: user.name().to_string(),
                    title: title.to_string(),
                });
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dune() -> Book {
        Book::new("Dune", "Herbert")
    }

    #[test]
    fn test_borrow_available_book() {
        let mut alice = User::new("Alice");
        let mut book = dune();

        CirculationEngine::borrow(&mut alice, &mut book).unwrap();
        assert_eq!(book.status(), BookStatus::Borrowed);
        assert!(alice.holds("Dune"));
    }

    #[test]
    fn test_borrow_twice_is_already_borrowed() {
        let mut alice = User::new("Alice");
        let mut book = dune();
        CirculationEngine::borrow(&mut alice, &mut book).unwrap();

        let before = (alice.clone(), book.clone());
        let err = CirculationEngine::borrow(&mut alice, &mut book).unwrap_err();
        assert!(matches!(err, LibraryError::AlreadyBorrowed { .. }));
        assert_eq!((alice, book), before);
    }

    #[test]
    fn test_return_round_trip() {
        let mut alice = User::new("Alice");
        let mut book = dune();
        CirculationEngine::borrow(&mut alice, &mut book).unwrap();
        CirculationEngine::return_book(&mut alice, &mut book).unwrap();

        assert_eq!(book.status(), BookStatus::Available);
        assert_eq!(alice.held_count(), 0);
    }

    #[test]
    fn test_return_by_other_user_is_rejected() {
        let mut alice = User::new("Alice");
        let mut bob = User::new("Bob");
        let mut book = dune();
        CirculationEngine::borrow(&mut alice, &mut book).unwrap();

        let err = CirculationEngine::return_book(&mut bob, &mut book).unwrap_err();
        assert!(matches!(err, LibraryError::NotHeldByUser { ref name, .. } if name == "Bob"));
        assert_eq!(book.status(), BookStatus::Borrowed);
        assert!(alice.holds("Dune"));
    }

    #[test]
    fn test_return_available_book_is_rejected() {
        let mut alice = User::new("Alice");
        let mut book = dune();
        let err = CirculationEngine::return_book(&mut alice, &mut book).unwrap_err();
        assert!(matches!(err, LibraryError::NotHeldByUser { .. }));
        assert_eq!(book.status(), BookStatus::Available);
    }

    #[test]
    fn test_held_order_follows_borrow_order() {
        let mut alice = User::new("Alice");
        let mut a = Book::new("A", "x");
        let mut b = Book::new("B", "y");
        let mut c = Book::new("C", "z");
        CirculationEngine::borrow(&mut alice, &mut c).unwrap();
        CirculationEngine::borrow(&mut alice, &mut a).unwrap();
        CirculationEngine::borrow(&mut alice, &mut b).unwrap();
        CirculationEngine::return_book(&mut alice, &mut a).unwrap();

        assert_eq!(alice.held_titles().collect::<Vec<_>>(), ["C", "B"]);
    }

    #[test]
    fn test_audit_detects_orphaned_borrowed_book() {
        let mut catalog = Catalog::new();
        catalog.push(Book::with_status("Dune", "Herbert", BookStatus::Borrowed));
        let membership = Membership::new();

        assert_eq!(
            audit(&catalog, &membership),
            [InvariantViolation::BorrowedHolderCount {
                title: "Dune".into(),
                holders: 0
            }]
        );
    }

    #[test]
    fn test_audit_detects_held_title_without_book() {
        let catalog = Catalog::new();
        let mut membership = Membership::new();
        let mut alice = User::new("Alice");
        alice.held_titles.insert("Ghost".into());
        membership.push(alice);

        assert!(matches!(
            audit(&catalog, &membership).as_slice(),
            [InvariantViolation::HeldWithoutLoan { .. }]
        ));
    }

    #[test]
    fn test_audit_detects_available_but_held() {
        let mut catalog = Catalog::new();
        catalog.add("Dune", "Herbert").unwrap();
        let mut membership = Membership::new();
        let mut alice = User::new("Alice");
        alice.held_titles.insert("Dune".into());
        membership.push(alice);

        assert!(matches!(
            audit(&catalog, &membership).as_slice(),
            [InvariantViolation::AvailableButHeld { .. }]
        ));
    }

    #[test]
    fn test_audit_clean_after_borrow() {
        let mut catalog = Catalog::new();
        let mut membership = Membership::new();
        catalog.add("Dune", "Herbert").unwrap();
        catalog.add("Dune", "Herbert").unwrap();
        membership.register("Alice").unwrap();

        let user = membership.find_mut("Alice").unwrap();
        let book = catalog.find_mut("Dune").unwrap();
        CirculationEngine::borrow(user, book).unwrap();

        assert!(audit(&catalog, &membership).is_empty());
    }
}
