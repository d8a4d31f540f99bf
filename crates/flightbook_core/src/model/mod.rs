//! Account and reservation records.
//!
//! # Responsibility
//! - Define persisted shapes (`User`, `Reservation`) and their insert inputs.
//! - Enforce field presence and declared column widths before any store access.
//!
//! # Invariants
//! - Widths are counted in characters, matching SQLite `length()` on TEXT.
//! - Validation never rewrites values; stored text equals caller input.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod reservation;
pub mod user;

/// Field-level validation failure shared by all insert inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// Required field is empty or whitespace only.
    Empty { field: &'static str },
    /// Field exceeds its declared column width.
    TooLong {
        field: &'static str,
        max_chars: usize,
        actual_chars: usize,
    },
}

impl FieldError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Empty { field } | Self::TooLong { field, .. } => field,
        }
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{field} is required"),
            Self::TooLong {
                field,
                max_chars,
                actual_chars,
            } => write!(
                f,
                "{field} must be at most {max_chars} characters, got {actual_chars}"
            ),
        }
    }
}

impl Error for FieldError {}

pub(crate) fn check_required(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<(), FieldError> {
    if value.trim().is_empty() {
        return Err(FieldError::Empty { field });
    }
    check_width(field, value, max_chars)
}

pub(crate) fn check_width(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<(), FieldError> {
    let actual_chars = value.chars().count();
    if actual_chars > max_chars {
        return Err(FieldError::TooLong {
            field,
            max_chars,
            actual_chars,
        });
    }
    Ok(())
}
