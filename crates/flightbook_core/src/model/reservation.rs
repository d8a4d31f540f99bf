//! Flight reservation record and departure timestamp format.
//!
//! # Invariants
//! - `user_id` references an existing user at creation time; the store
//!   enforces this with a foreign key.
//! - Departure timestamps cross every boundary (input, storage, display) as
//!   `YYYY-MM-DD HH:MM:SS` and nothing else.

use crate::model::user::UserId;
use crate::model::{check_required, FieldError};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Sequential row id assigned by the store.
pub type ReservationId = i64;

pub const FLIGHT_NUMBER_MAX_CHARS: usize = 20;
pub const SEAT_NUMBER_MAX_CHARS: usize = 10;

/// `chrono` format string for departure timestamps.
pub const DEPARTURE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// chrono alone accepts single-digit fields, so the shape is pinned first.
static DEPARTURE_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2}$")
        .expect("valid departure date regex")
});

/// Departure date text that is not a valid `YYYY-MM-DD HH:MM:SS` timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedTimestamp {
    pub value: String,
}

impl Display for MalformedTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "departure date `{}` does not match format YYYY-MM-DD HH:MM:SS",
            self.value
        )
    }
}

impl Error for MalformedTimestamp {}

/// Parses a departure timestamp in the exact wire format.
///
/// Rejects surrounding whitespace, single-digit fields, `T` separators,
/// fractional seconds, offsets and calendar-invalid values such as
/// `2024-02-30 10:00:00`.
pub fn parse_departure_date(value: &str) -> Result<NaiveDateTime, MalformedTimestamp> {
    let malformed = || MalformedTimestamp {
        value: value.to_string(),
    };
    if !DEPARTURE_DATE_RE.is_match(value) {
        return Err(malformed());
    }
    NaiveDateTime::parse_from_str(value, DEPARTURE_DATE_FORMAT).map_err(|_| malformed())
}

/// Formats a departure timestamp in the wire format.
pub fn format_departure_date(value: &NaiveDateTime) -> String {
    value.format(DEPARTURE_DATE_FORMAT).to_string()
}

/// Persisted reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub user_id: UserId,
    pub flight_number: String,
    #[serde(with = "departure_date_serde")]
    pub departure_date: NaiveDateTime,
    pub seat_number: Option<String>,
}

impl Display for Reservation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let seat = match &self.seat_number {
            Some(seat) => format!("'{seat}'"),
            None => "None".to_string(),
        };
        write!(
            f,
            "<Reservation(user_id={}, flight_number='{}', departure_date='{}', seat_number={})>",
            self.user_id,
            self.flight_number,
            format_departure_date(&self.departure_date),
            seat
        )
    }
}

/// Reservation input with an already parsed departure time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    pub user_id: UserId,
    pub flight_number: String,
    pub departure_date: NaiveDateTime,
    pub seat_number: Option<String>,
}

impl NewReservation {
    /// Builds an input from wire-format text.
    pub fn parse(
        user_id: UserId,
        flight_number: impl Into<String>,
        departure_date: &str,
        seat_number: Option<String>,
    ) -> Result<Self, MalformedTimestamp> {
        Ok(Self {
            user_id,
            flight_number: flight_number.into(),
            departure_date: parse_departure_date(departure_date)?,
            seat_number,
        })
    }

    /// Checks presence and declared widths. An explicit seat must not be empty.
    pub fn validate(&self) -> Result<(), FieldError> {
        check_required("flight_number", &self.flight_number, FLIGHT_NUMBER_MAX_CHARS)?;
        if let Some(seat) = &self.seat_number {
            check_required("seat_number", seat, SEAT_NUMBER_MAX_CHARS)?;
        }
        Ok(())
    }

    pub(crate) fn into_reservation(self, id: ReservationId) -> Reservation {
        Reservation {
            id,
            user_id: self.user_id,
            flight_number: self.flight_number,
            departure_date: self.departure_date,
            seat_number: self.seat_number,
        }
    }
}

mod departure_date_serde {
    use super::{format_departure_date, parse_departure_date};
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_departure_date(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_departure_date(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::{format_departure_date, parse_departure_date, NewReservation};
    use crate::model::FieldError;

    #[test]
    fn parse_accepts_exact_format() {
        let parsed = parse_departure_date("2024-05-15 10:00:00").expect("valid timestamp");
        assert_eq!(format_departure_date(&parsed), "2024-05-15 10:00:00");
    }

    #[test]
    fn parse_rejects_near_misses() {
        for value in [
            "2024-05-15T10:00:00",
            "2024-5-15 10:00:00",
            "2024-05-15 10:00",
            "2024-05-15 10:00:00.5",
            " 2024-05-15 10:00:00",
            "2024-05-15 10:00:00Z",
            "2024-02-30 10:00:00",
            "2024-05-15 24:00:00",
            "15/05/2024 10:00:00",
            "",
        ] {
            let err = parse_departure_date(value).expect_err(value);
            assert_eq!(err.value, value);
        }
    }

    #[test]
    fn parse_rejects_non_ascii_digits() {
        assert!(parse_departure_date("２０２４-05-15 10:00:00").is_err());
    }

    #[test]
    fn validate_distinguishes_absent_and_empty_seat() {
        let mut input =
            NewReservation::parse(1, "ABC123", "2024-05-15 10:00:00", None).expect("valid input");
        assert!(input.validate().is_ok());

        input.seat_number = Some(String::new());
        assert_eq!(
            input.validate(),
            Err(FieldError::Empty {
                field: "seat_number"
            })
        );

        input.seat_number = Some("12345678901".to_string());
        assert!(matches!(
            input.validate(),
            Err(FieldError::TooLong {
                field: "seat_number",
                max_chars: 10,
                ..
            })
        ));
    }
}
