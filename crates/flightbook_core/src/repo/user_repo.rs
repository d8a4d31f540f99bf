//! User repository contract and SQLite implementation.
//!
//! # Invariants
//! - Username is checked before email, so a repeated registration reports
//!   the username conflict.
//! - Checks and insert share one IMMEDIATE transaction; the UNIQUE
//!   constraints on `users` remain the final authority and their violations
//!   surface as `RepoError::Duplicate`.

use crate::model::user::{NewUser, User, UserId};
use crate::repo::{
    constraint_violation, ensure_connection_ready, ConstraintViolation, RepoError, RepoResult,
    TableShape, UserKey,
};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const USER_SELECT_SQL: &str = "SELECT id, username, email, password FROM users";

pub(crate) const USERS_TABLE: TableShape = ("users", &["id", "username", "email", "password"]);

/// Repository interface for user accounts.
pub trait UserRepository {
    /// Checks both unique keys and inserts in one write transaction.
    fn register_user(&self, new_user: &NewUser) -> RepoResult<User>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    /// All users in ascending id order.
    fn list_users(&self) -> RepoResult<Vec<User>>;
    fn count_users(&self) -> RepoResult<u64>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[USERS_TABLE])?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn register_user(&self, new_user: &NewUser) -> RepoResult<User> {
        new_user.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for key in [UserKey::Username, UserKey::Email] {
            let value = match key {
                UserKey::Username => new_user.username.as_str(),
                UserKey::Email => new_user.email.as_str(),
            };
            if find_user_by_key(&tx, key, value)?.is_some() {
                return Err(RepoError::Duplicate(key));
            }
        }

        tx.execute(
            "INSERT INTO users (username, email, password) VALUES (?1, ?2, ?3);",
            params![
                new_user.username.as_str(),
                new_user.email.as_str(),
                new_user.password.as_str(),
            ],
        )
        .map_err(map_user_insert_error)?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(new_user.clone().into_user(id))
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        load_user(self.conn, id)
    }

    fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        find_user_by_key(self.conn, UserKey::Username, username)
    }

    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        find_user_by_key(self.conn, UserKey::Email, email)
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn count_users(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative users count `{count}`")))
    }
}

/// Loads one user by id; shared with the reservation write path.
pub(crate) fn load_user(conn: &Connection, id: UserId) -> RepoResult<Option<User>> {
    let mut stmt = conn.prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_user_row(row)?));
    }
    Ok(None)
}

fn find_user_by_key(conn: &Connection, key: UserKey, value: &str) -> RepoResult<Option<User>> {
    let mut stmt = conn.prepare(&format!(
        "{USER_SELECT_SQL} WHERE {} = ?1 LIMIT 1;",
        key.column()
    ))?;
    let mut rows = stmt.query([value])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_user_row(row)?));
    }
    Ok(None)
}

fn map_user_insert_error(err: rusqlite::Error) -> RepoError {
    match constraint_violation(&err) {
        Some(ConstraintViolation::Unique(message)) if message.contains("users.username") => {
            RepoError::Duplicate(UserKey::Username)
        }
        Some(ConstraintViolation::Unique(message)) if message.contains("users.email") => {
            RepoError::Duplicate(UserKey::Email)
        }
        _ => err.into(),
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id: UserId = row.get("id")?;
    if id <= 0 {
        return Err(RepoError::InvalidData(format!(
            "invalid id value `{id}` in users.id"
        )));
    }

    Ok(User {
        id,
        username: row.get("username")?,
        email: row.get("email")?,
        password: row.get("password")?,
    })
}
