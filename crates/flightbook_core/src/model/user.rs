//! User account record.
//!
//! # Invariants
//! - `username` and `email` are each unique across all users; the store
//!   enforces this with UNIQUE constraints.
//! - `password` is opaque and never rendered by `Display`, `Debug` or serde
//!   serialization.

use crate::model::{check_required, FieldError};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// Sequential row id assigned by the store.
pub type UserId = i64;

pub const USERNAME_MAX_CHARS: usize = 50;
pub const EMAIL_MAX_CHARS: usize = 100;
pub const PASSWORD_MAX_CHARS: usize = 100;

/// Persisted user account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password: String,
}

impl Display for User {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<User(username='{}', email='{}')>",
            self.username, self.email
        )
    }
}

impl Debug for User {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Registration input; becomes a `User` once the store assigns an id.
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl NewUser {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    /// Checks presence and declared widths, in field order.
    pub fn validate(&self) -> Result<(), FieldError> {
        check_required("username", &self.username, USERNAME_MAX_CHARS)?;
        check_required("email", &self.email, EMAIL_MAX_CHARS)?;
        check_required("password", &self.password, PASSWORD_MAX_CHARS)?;
        Ok(())
    }

    pub(crate) fn into_user(self, id: UserId) -> User {
        User {
            id,
            username: self.username,
            email: self.email,
            password: self.password,
        }
    }
}

impl Debug for NewUser {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
