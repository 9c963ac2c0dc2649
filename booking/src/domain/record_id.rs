//! Integer row identifiers for the booking tables.
//!
//! Every table keyed by a database sequence gets its own newtype so a pet id
//! can never be passed where a slot id is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Validation errors raised when parsing a row identifier from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordIdError {
    /// Input was blank once trimmed.
    Empty,
    /// Input is not a base-10 integer.
    NotANumber,
    /// Identifiers start at one.
    NotPositive,
}

impl fmt::Display for RecordIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "identifier must not be empty"),
            Self::NotANumber => write!(f, "identifier must be a whole number"),
            Self::NotPositive => write!(f, "identifier must be greater than zero"),
        }
    }
}

impl std::error::Error for RecordIdError {}

fn parse_positive(raw: &str) -> Result<i64, RecordIdError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RecordIdError::Empty);
    }
    let value = trimmed
        .parse::<i64>()
        .map_err(|_| RecordIdError::NotANumber)?;
    if value < 1 {
        return Err(RecordIdError::NotPositive);
    }
    Ok(value)
}

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw database identifier.
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Raw database identifier.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = RecordIdError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                parse_positive(raw).map(Self)
            }
        }
    };
}

record_id! {
    /// Identifier of a row in `pets`.
    PetId
}

record_id! {
    /// Identifier of a row in `services`.
    ServiceId
}

record_id! {
    /// Identifier of a row in `available_slots`.
    SlotId
}

record_id! {
    /// Identifier of a row in the appointments table.
    AppointmentId
}
