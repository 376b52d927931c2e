//! Registered users and the titles each one holds

use indexmap::IndexSet;
use tracing::{debug, warn};

use crate::error::{LibraryError, Result};
use crate::types::check_key;

/// A registered library user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    name: String,
    /// Titles currently borrowed, in the order they were borrowed
    pub(crate) held_titles: IndexSet<String>,
}

impl User {
    /// Create a user holding nothing
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            held_titles: IndexSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Titles held, in borrow order
    pub fn held_titles(&self) -> impl Iterator<Item = &str> + '_ {
        self.held_titles.iter().map(String::as_str)
    }

    pub fn holds(&self, title: &str) -> bool {
        self.held_titles.contains(title)
    }

    pub fn held_count(&self) -> usize {
        self.held_titles.len()
    }
}

/// Ordered collection of users
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Membership {
    users: Vec<User>,
}

impl Membership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new user with an empty held-set.
    ///
    /// # Errors
    ///
    /// - `InvalidField` if the name cannot be stored, is blank or is padded
    ///   with whitespace
    pub fn register(&mut self, name: impl Into<String>) -> Result<&User> {
        let name = name.into();
        check_key("name", &name)?;

        if self.users.iter().any(|u| u.name == name) {
            warn!("Duplicate user {:?}: lookups will resolve to the first one", name);
        }
        debug!("Registering user {:?}", name);
        Ok(self.push(User::new(name)))
    }

    pub(crate) fn push(&mut self, user: User) -> &User {
        self.users.push(user);
        &self.users[self.users.len() - 1]
    }

    /// First user with this exact name
    pub fn find(&self, name: &str) -> Result<&User> {
        self.users
            .iter()
            .find(|u| u.name == name)
            .ok_or_else(|| LibraryError::user_not_found(name))
    }

    /// Mutable access to the first user with this exact name
    pub fn find_mut(&mut self, name: &str) -> Result<&mut User> {
        self.users
            .iter_mut()
            .find(|u| u.name == name)
            .ok_or_else(|| LibraryError::user_not_found(name))
    }

    /// First user whose held-set contains the title
    pub fn holder_of(&self, title: &str) -> Option<&User> {
        self.users.iter().find(|u| u.holds(title))
    }

    /// User names in registration order
    pub fn list(&self) -> impl Iterator<Item = &str> + '_ {
        self.users.iter().map(User::name)
    }

    /// Full user records in registration order
    pub fn users(&self) -> impl Iterator<Item = &User> + '_ {
        self.users.iter()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
