//! Human-readable booking identifiers.
//!
//! Format (bit-exact): `BMP-` + 8-digit allocation date + `-` + 4 characters
//! from `[A-Z0-9]`, e.g. `BMP-20260211-A3F7`.
//!
//! Candidate generation is a pure function of the allocation date and an
//! injected [`RandomSource`]; checking candidates against storage lives in the
//! runtime's allocator.

use crate::environment::RandomSource;
use crate::error::BookingError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier prefix
pub const PREFIX: &str = "BMP";

/// Alphabet of the random suffix (36 symbols)
pub const SUFFIX_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Number of random suffix characters
pub const SUFFIX_LEN: usize = 4;

const ID_LEN: usize = PREFIX.len() + 1 + 8 + 1 + SUFFIX_LEN;

/// Globally unique, immutable, human-readable booking identifier.
///
/// Always stored in canonical uppercase form.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookingId(String);

impl BookingId {
    /// Builds a candidate identifier for `date` using `random` for the suffix.
    ///
    /// # Example
    ///
    /// ```
    /// use bmp_core::environment::RandomSource;
    /// use bmp_core::identifier::BookingId;
    /// use chrono::NaiveDate;
    ///
    /// struct Zero;
    /// impl RandomSource for Zero {
    ///     fn next_index(&self, _bound: usize) -> usize { 0 }
    /// }
    ///
    /// let date = NaiveDate::from_ymd_opt(2026, 2, 11).unwrap();
    /// assert_eq!(BookingId::candidate(date, &Zero).as_str(), "BMP-20260211-AAAA");
    /// ```
    #[must_use]
    pub fn candidate(date: NaiveDate, random: &dyn RandomSource) -> Self {
        let mut id = format!("{PREFIX}-{}-", date.format("%Y%m%d"));
        for _ in 0..SUFFIX_LEN {
            let index = random.next_index(SUFFIX_ALPHABET.len()) % SUFFIX_ALPHABET.len();
            id.push(char::from(SUFFIX_ALPHABET[index]));
        }
        Self(id)
    }

    /// Parses a caller-supplied identifier, case-insensitively.
    ///
    /// The result is normalized to uppercase.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] if the input does not match
    /// `BMP-\d{8}-[A-Z0-9]{4}` in any letter case.
    pub fn parse(raw: &str) -> Result<Self, BookingError> {
        let normalized = raw.trim().to_ascii_uppercase();
        if is_well_formed(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(BookingError::validation(format!(
                "Invalid booking ID format: {raw}"
            )))
        }
    }

    /// The canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The allocation date embedded in the identifier, if it is a real date.
    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.0[PREFIX.len() + 1..PREFIX.len() + 9], "%Y%m%d").ok()
    }
}

/// Whether `s` is a canonical (uppercase) booking identifier.
#[must_use]
pub fn is_well_formed(s: &str) -> bool {
    let bytes = s.as_bytes();
    let date_start = PREFIX.len() + 1;
    let suffix_start = date_start + 9;

    bytes.len() == ID_LEN
        && s.starts_with(PREFIX)
        && bytes[PREFIX.len()] == b'-'
        && bytes[date_start..date_start + 8].iter().all(u8::is_ascii_digit)
        && bytes[suffix_start - 1] == b'-'
        && bytes[suffix_start..]
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for BookingId {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BookingId {
    type Error = BookingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BookingId> for String {
    fn from(id: BookingId) -> Self {
        id.0
    }
}
