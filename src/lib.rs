//! circdesk library
//!
//! Book inventory, membership and circulation for a small library, with
//! flat-file persistence. The binary in `main.rs` is a thin front end over
//! this crate.

pub mod catalog;
pub mod circulation;
pub mod cli;
pub mod config;
pub mod error;
pub mod library;
pub mod membership;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use catalog::{Book, Catalog};
pub use circulation::{audit, CirculationEngine, InvariantViolation};
pub use config::LibraryConfig;
pub use error::{LibraryError, LoadError, RecordKind, Result};
pub use library::Library;
pub use membership::{Membership, User};
pub use store::PersistenceStore;
pub use types::BookStatus;
