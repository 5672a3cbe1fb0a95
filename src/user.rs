//! Defines usernames and user accounts.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{Error, PasswordHash};

/// The maximum number of characters in a username.
pub const MAX_USERNAME_LENGTH: usize = 64;

/// A validated, non-empty username.
///
/// Usernames are unique across the app and act as the key for a user's
/// ledger.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Username(String);

impl Username {
    /// Create a username, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::InvalidUsername] if `name` is
    /// empty after trimming or longer than [MAX_USERNAME_LENGTH] characters.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            return Err(Error::InvalidUsername("Enter a username.".to_owned()));
        }

        if name.chars().count() > MAX_USERNAME_LENGTH {
            return Err(Error::InvalidUsername(format!(
                "Usernames can be at most {MAX_USERNAME_LENGTH} characters long."
            )));
        }

        Ok(Self(name.to_owned()))
    }

    /// Create a username without validation.
    ///
    /// The caller should ensure that the string is trimmed and not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the non-empty invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's unique name.
    pub username: Username,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

impl User {
    /// Create a new user.
    pub fn new(username: Username, password_hash: PasswordHash) -> Self {
        Self {
            username,
            password_hash,
        }
    }
}

#[cfg(test)]
mod username_tests {
    use crate::Error;

    use super::{MAX_USERNAME_LENGTH, Username};

    #[test]
    fn trims_whitespace() {
        let username = Username::new("  alice \t").unwrap();

        assert_eq!(username.as_ref(), "alice");
    }

    #[test]
    fn rejects_empty_name() {
        assert!(matches!(Username::new(""), Err(Error::InvalidUsername(_))));
        assert!(matches!(
            Username::new("   "),
            Err(Error::InvalidUsername(_))
        ));
    }

    #[test]
    fn rejects_long_name() {
        let name = "a".repeat(MAX_USERNAME_LENGTH + 1);

        assert!(matches!(
            Username::new(&name),
            Err(Error::InvalidUsername(_))
        ));
        assert!(Username::new(&name[1..]).is_ok());
    }

    #[test]
    fn serializes_as_plain_string() {
        let username = Username::new_unchecked("bob");

        assert_eq!(serde_json::to_string(&username).unwrap(), "\"bob\"");
    }
}
