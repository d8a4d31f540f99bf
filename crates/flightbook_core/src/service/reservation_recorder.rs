//! Reservation recording use-case.
//!
//! # Invariants
//! - The owner is looked up before the departure timestamp is parsed, so an
//!   unknown user is reported ahead of a malformed date.
//! - A reservation for a missing user is never inserted.

use crate::model::reservation::{MalformedTimestamp, NewReservation, Reservation, ReservationId};
use crate::model::user::UserId;
use crate::model::FieldError;
use crate::repo::reservation_repo::{RecordedReservation, ReservationRepository};
use crate::repo::{RepoError, RepoResult};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Caller-visible reservation failure.
#[derive(Debug)]
pub enum ReservationError {
    /// A field is empty or wider than its column.
    Validation(FieldError),
    MalformedTimestamp(MalformedTimestamp),
    UnknownUser(UserId),
    /// The store failed (open, lock timeout, I/O, unexpected constraint).
    Store(RepoError),
}

impl ReservationError {
    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::MalformedTimestamp(_) => "malformed_timestamp",
            Self::UnknownUser(_) => "unknown_user",
            Self::Store(_) => "store",
        }
    }
}

impl Display for ReservationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::MalformedTimestamp(err) => write!(f, "{err}"),
            Self::UnknownUser(id) => write!(f, "User with id {id} does not exist."),
            Self::Store(err) => write!(f, "store failure: {err}"),
        }
    }
}

impl Error for ReservationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::MalformedTimestamp(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::UnknownUser(_) => None,
        }
    }
}

impl From<RepoError> for ReservationError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::UserNotFound(id) => Self::UnknownUser(id),
            other => Self::Store(other),
        }
    }
}

impl From<MalformedTimestamp> for ReservationError {
    fn from(value: MalformedTimestamp) -> Self {
        Self::MalformedTimestamp(value)
    }
}

/// Records flight reservations against an injected repository.
pub struct ReservationRecorder<R: ReservationRepository> {
    repo: R,
}

impl<R: ReservationRepository> ReservationRecorder<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Records one reservation for an existing user.
    ///
    /// `departure_date` must be exactly `YYYY-MM-DD HH:MM:SS`.
    ///
    /// # Errors
    /// - `UnknownUser` when `user_id` has no user row.
    /// - `MalformedTimestamp` when `departure_date` is not in that format.
    /// - `Validation` for empty or over-width fields.
    /// - `Store` for any store failure.
    pub fn create_reservation(
        &self,
        user_id: UserId,
        flight_number: &str,
        departure_date: &str,
        seat_number: Option<&str>,
    ) -> Result<RecordedReservation, ReservationError> {
        let result = self.record(user_id, flight_number, departure_date, seat_number);

        match &result {
            Ok(recorded) => info!(
                "event=reservation_create module=service status=ok reservation_id={} user_id={user_id}",
                recorded.reservation.id
            ),
            Err(err @ ReservationError::Store(cause)) => error!(
                "event=reservation_create module=service status=error user_id={user_id} error_code={} error={cause}",
                err.code()
            ),
            Err(err) => warn!(
                "event=reservation_create module=service status=rejected user_id={user_id} error_code={}",
                err.code()
            ),
        }
        result
    }

    fn record(
        &self,
        user_id: UserId,
        flight_number: &str,
        departure_date: &str,
        seat_number: Option<&str>,
    ) -> Result<RecordedReservation, ReservationError> {
        if self.repo.find_owner(user_id)?.is_none() {
            return Err(ReservationError::UnknownUser(user_id));
        }

        let input = NewReservation::parse(
            user_id,
            flight_number,
            departure_date,
            seat_number.map(str::to_string),
        )?;
        // The write transaction checks the owner again before inserting.
        Ok(self.repo.create_reservation(&input)?)
    }

    pub fn get_reservation(&self, id: ReservationId) -> RepoResult<Option<Reservation>> {
        self.repo.get_reservation(id)
    }

    pub fn list_reservations_for_user(&self, user_id: UserId) -> RepoResult<Vec<Reservation>> {
        self.repo.list_reservations_for_user(user_id)
    }

    pub fn count_reservations(&self) -> RepoResult<u64> {
        self.repo.count_reservations()
    }
}
