//! Reservation repository contract and SQLite implementation.
//!
//! # Invariants
//! - A reservation is inserted only while its owner is visible inside the
//!   same IMMEDIATE transaction.
//! - The `reservations.user_id` foreign key remains the final authority; its
//!   violation surfaces as `RepoError::UserNotFound`.

use crate::model::reservation::{
    format_departure_date, parse_departure_date, NewReservation, Reservation, ReservationId,
};
use crate::model::user::{User, UserId};
use crate::repo::user_repo::{load_user, USERS_TABLE};
use crate::repo::{
    constraint_violation, ensure_connection_ready, ConstraintViolation, RepoError, RepoResult,
    TableShape,
};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const RESERVATION_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    flight_number,
    departure_date,
    seat_number
FROM reservations";

const RESERVATIONS_TABLE: TableShape = (
    "reservations",
    &[
        "id",
        "user_id",
        "flight_number",
        "departure_date",
        "seat_number",
    ],
);

/// A committed reservation together with the user it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedReservation {
    pub reservation: Reservation,
    pub owner: User,
}

/// Repository interface for flight reservations.
pub trait ReservationRepository {
    /// Verifies the owner exists and inserts in one write transaction.
    fn create_reservation(&self, new_reservation: &NewReservation)
        -> RepoResult<RecordedReservation>;
    /// Loads the user a reservation would belong to.
    fn find_owner(&self, user_id: UserId) -> RepoResult<Option<User>>;
    fn get_reservation(&self, id: ReservationId) -> RepoResult<Option<Reservation>>;
    /// Reservations owned by `user_id` in ascending id order.
    fn list_reservations_for_user(&self, user_id: UserId) -> RepoResult<Vec<Reservation>>;
    fn count_reservations(&self) -> RepoResult<u64>;
}

/// SQLite-backed reservation repository.
pub struct SqliteReservationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReservationRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[USERS_TABLE, RESERVATIONS_TABLE])?;
        Ok(Self { conn })
    }
}

impl ReservationRepository for SqliteReservationRepository<'_> {
    fn create_reservation(
        &self,
        new_reservation: &NewReservation,
    ) -> RepoResult<RecordedReservation> {
        new_reservation.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let owner = load_user(&tx, new_reservation.user_id)?
            .ok_or(RepoError::UserNotFound(new_reservation.user_id))?;

        tx.execute(
            "INSERT INTO reservations (
                user_id,
                flight_number,
                departure_date,
                seat_number
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                new_reservation.user_id,
                new_reservation.flight_number.as_str(),
                format_departure_date(&new_reservation.departure_date),
                new_reservation.seat_number.as_deref(),
            ],
        )
        .map_err(|err| match constraint_violation(&err) {
            Some(ConstraintViolation::ForeignKey) => {
                RepoError::UserNotFound(new_reservation.user_id)
            }
            _ => err.into(),
        })?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(RecordedReservation {
            reservation: new_reservation.clone().into_reservation(id),
            owner,
        })
    }

    fn find_owner(&self, user_id: UserId) -> RepoResult<Option<User>> {
        load_user(self.conn, user_id)
    }

    fn get_reservation(&self, id: ReservationId) -> RepoResult<Option<Reservation>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RESERVATION_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_reservation_row(row)?));
        }
        Ok(None)
    }

    fn list_reservations_for_user(&self, user_id: UserId) -> RepoResult<Vec<Reservation>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RESERVATION_SELECT_SQL} WHERE user_id = ?1 ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([user_id])?;
        let mut reservations = Vec::new();
        while let Some(row) = rows.next()? {
            reservations.push(parse_reservation_row(row)?);
        }
        Ok(reservations)
    }

    fn count_reservations(&self) -> RepoResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM reservations;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative reservations count `{count}`")))
    }
}

fn parse_reservation_row(row: &Row<'_>) -> RepoResult<Reservation> {
    let departure_text: String = row.get("departure_date")?;
    let departure_date = parse_departure_date(&departure_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid departure date `{departure_text}` in reservations.departure_date"
        ))
    })?;

    Ok(Reservation {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        flight_number: row.get("flight_number")?,
        departure_date,
        seat_number: row.get("seat_number")?,
    })
}
