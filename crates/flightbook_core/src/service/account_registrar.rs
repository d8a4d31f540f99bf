//! Account registration use-case.
//!
//! # Invariants
//! - `DuplicateUsername` wins over `DuplicateEmail` when both keys collide.
//! - A failed registration leaves no row behind.

use crate::model::user::{NewUser, User, UserId};
use crate::model::FieldError;
use crate::repo::user_repo::UserRepository;
use crate::repo::{RepoError, RepoResult, UserKey};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Caller-visible registration failure.
#[derive(Debug)]
pub enum RegistrationError {
    /// A field is empty or wider than its column.
    Validation(FieldError),
    DuplicateUsername,
    DuplicateEmail,
    /// The store failed (open, lock timeout, I/O, unexpected constraint).
    Store(RepoError),
}

impl RegistrationError {
    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::DuplicateUsername => "duplicate_username",
            Self::DuplicateEmail => "duplicate_email",
            Self::Store(_) => "store",
        }
    }
}

impl Display for RegistrationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateUsername => {
                write!(f, "Username already exists. Please choose a different username.")
            }
            Self::DuplicateEmail => write!(
                f,
                "Email already registered. Please use a different email address."
            ),
            Self::Store(err) => write!(f, "store failure: {err}"),
        }
    }
}

impl Error for RegistrationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for RegistrationError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::Duplicate(UserKey::Username) => Self::DuplicateUsername,
            RepoError::Duplicate(UserKey::Email) => Self::DuplicateEmail,
            other => Self::Store(other),
        }
    }
}

/// Registers user accounts against an injected repository.
pub struct AccountRegistrar<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> AccountRegistrar<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers one user and returns the committed record.
    ///
    /// # Errors
    /// - `Validation` for empty or over-width fields.
    /// - `DuplicateUsername`, then `DuplicateEmail`, on key collisions.
    /// - `Store` for any store failure.
    pub fn register_user(
        &self,
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<User, RegistrationError> {
        let new_user = NewUser::new(username, email, password);

        match self.repo.register_user(&new_user) {
            Ok(user) => {
                info!(
                    "event=user_register module=service status=ok user_id={}",
                    user.id
                );
                Ok(user)
            }
            Err(err) => {
                let err = RegistrationError::from(err);
                match &err {
                    RegistrationError::Store(cause) => error!(
                        "event=user_register module=service status=error error_code={} error={cause}",
                        err.code()
                    ),
                    _ => warn!(
                        "event=user_register module=service status=rejected error_code={}",
                        err.code()
                    ),
                }
                Err(err)
            }
        }
    }

    pub fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        self.repo.get_user(id)
    }

    pub fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        self.repo.find_user_by_username(username)
    }

    pub fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.repo.find_user_by_email(email)
    }

    pub fn list_users(&self) -> RepoResult<Vec<User>> {
        self.repo.list_users()
    }

    pub fn count_users(&self) -> RepoResult<u64> {
        self.repo.count_users()
    }
}
