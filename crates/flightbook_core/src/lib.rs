//! Core of flightbook: user registration and flight reservation records
//! over SQLite.
//!
//! Callers open one connection with [`db::open_db`], hand it to the
//! repositories, and drive the [`AccountRegistrar`] and
//! [`ReservationRecorder`] services.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::reservation::{
    format_departure_date, parse_departure_date, MalformedTimestamp, NewReservation, Reservation,
    ReservationId, DEPARTURE_DATE_FORMAT,
};
pub use model::user::{NewUser, User, UserId};
pub use model::FieldError;
pub use repo::reservation_repo::{
    RecordedReservation, ReservationRepository, SqliteReservationRepository,
};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult, UserKey};
pub use service::account_registrar::{AccountRegistrar, RegistrationError};
pub use service::reservation_recorder::{ReservationError, ReservationRecorder};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
