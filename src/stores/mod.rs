//! Contains traits and implementations for objects that persist users and
//! their ledgers.
//!
//! Two backends are available: [JsonStore] keeps everything in two JSON files
//! and [SQLiteStore] keeps everything in one SQLite database. Both treat a
//! missing or corrupt backing store as empty.

use std::collections::BTreeMap;

use crate::{Error, PasswordHash, Transaction, User, Username};

mod json;
mod sqlite;

pub use json::JsonStore;
pub use sqlite::SQLiteStore;

/// Every registered user mapped to their password hash.
pub type UserMap = BTreeMap<Username, PasswordHash>;

/// Every user's transactions, in insertion order.
pub type LedgerMap = BTreeMap<Username, Vec<Transaction>>;

/// Handles the creation and retrieval of user accounts.
pub trait UserStore: Send + Sync {
    /// Load every user account.
    fn load(&self) -> Result<UserMap, Error>;

    /// Replace every user account with `users`.
    fn save(&self, users: &UserMap) -> Result<(), Error>;

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns [Error::DuplicateUsername] if the username is taken, in which
    /// case the store is left unchanged.
    fn create(&self, user: User) -> Result<(), Error>;

    /// Get the user with `username`.
    ///
    /// # Errors
    ///
    /// Returns [Error::NotFound] if no such user is registered.
    fn get(&self, username: &Username) -> Result<User, Error>;
}

/// Handles appending to and reading from users' ledgers.
pub trait LedgerStore: Send + Sync {
    /// Load every user's transactions.
    fn load(&self) -> Result<LedgerMap, Error>;

    /// Replace every user's transactions with `ledger`.
    fn save(&self, ledger: &LedgerMap) -> Result<(), Error>;

    /// Add `transaction` to the end of the ledger for `username`.
    fn append(&self, username: &Username, transaction: Transaction) -> Result<(), Error>;

    /// Get the transactions for `username` in insertion order.
    ///
    /// A user without any transactions gets an empty list.
    fn transactions(&self, username: &Username) -> Result<Vec<Transaction>, Error>;
}
