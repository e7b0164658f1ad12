//! Value objects shared across the booking domain.
//!
//! Identifiers for the storage key and the two referenced collaborators
//! (catalog entries and operators), the structured customer address, the five
//! fixed time slots, and the read-only catalog entry shape.

use crate::error::{BookingError, LifecycleError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "`")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Creates a `", stringify!($name), "` from a UUID")]
            #[must_use]
            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Returns the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Parses an identifier supplied by a caller.
            ///
            /// # Errors
            ///
            /// Returns [`BookingError::Validation`] if the input is blank or not a UUID.
            pub fn parse(raw: &str) -> Result<Self, BookingError> {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(BookingError::validation(concat!($label, " is required")));
                }
                Uuid::parse_str(trimmed).map(Self).map_err(|_| {
                    BookingError::validation(format!(concat!("Invalid ", $label, ": {}"), trimmed))
                })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Opaque storage key of a booking record
    BookingKey,
    "Booking key"
);

uuid_id!(
    /// Reference to a catalog entry (a puja offering)
    PujaId,
    "Puja ID"
);

uuid_id!(
    /// Reference to a field operator (a pujari)
    PujariId,
    "Pujari ID"
);

// ============================================================================
// Address
// ============================================================================

/// Structured customer address.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// First street line
    pub line1: String,
    /// Second street line (may be empty)
    #[serde(default)]
    pub line2: String,
    /// City
    pub city: String,
    /// Six-digit postal code
    pub pincode: String,
    /// Nearby landmark (may be empty)
    #[serde(default)]
    pub landmark: String,
}

impl Address {
    /// Returns a copy with every field trimmed.
    #[must_use]
    pub fn trimmed(&self) -> Self {
        Self {
            line1: self.line1.trim().to_string(),
            line2: self.line2.trim().to_string(),
            city: self.city.trim().to_string(),
            pincode: self.pincode.trim().to_string(),
            landmark: self.landmark.trim().to_string(),
        }
    }
}

// ============================================================================
// Time slots
// ============================================================================

/// One of the five fixed preferred-time slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeSlot {
    /// 5-7 AM
    #[serde(rename = "Early Morning (5-7 AM)")]
    EarlyMorning,
    /// 7-9 AM
    #[serde(rename = "Morning (7-9 AM)")]
    Morning,
    /// 9-11 AM
    #[serde(rename = "Late Morning (9-11 AM)")]
    LateMorning,
    /// 12-3 PM
    #[serde(rename = "Afternoon (12-3 PM)")]
    Afternoon,
    /// 4-7 PM
    #[serde(rename = "Evening (4-7 PM)")]
    Evening,
}

impl TimeSlot {
    /// All slots in chronological order
    pub const ALL: [Self; 5] = [
        Self::EarlyMorning,
        Self::Morning,
        Self::LateMorning,
        Self::Afternoon,
        Self::Evening,
    ];

    /// The exact wire string of this slot.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EarlyMorning => "Early Morning (5-7 AM)",
            Self::Morning => "Morning (7-9 AM)",
            Self::LateMorning => "Late Morning (9-11 AM)",
            Self::Afternoon => "Afternoon (12-3 PM)",
            Self::Evening => "Evening (4-7 PM)",
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeSlot {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|slot| slot.as_str() == s)
            .ok_or_else(|| LifecycleError::invalid_enum("preferredTime", s))
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Whether a catalog entry can be booked directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PujaType {
    /// Open for direct booking
    Bookable,
    /// Listed but only available through a callback request
    ComingSoon,
}

impl PujaType {
    /// Database/wire string
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bookable => "bookable",
            Self::ComingSoon => "coming_soon",
        }
    }
}

impl FromStr for PujaType {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bookable" => Ok(Self::Bookable),
            "coming_soon" => Ok(Self::ComingSoon),
            other => Err(LifecycleError::invalid_enum("pujaType", other)),
        }
    }
}

/// Catalog entry as seen by the booking core (read-only).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Catalog identifier
    pub id: PujaId,
    /// Display name
    pub name: String,
    /// URL slug
    pub slug: String,
    /// Human-readable duration, e.g. "2-3 hours"
    pub duration: String,
    /// Whether the entry is active
    pub is_active: bool,
    /// Booking type
    pub puja_type: PujaType,
}

impl CatalogEntry {
    /// Display summary used when resolving a booking's catalog reference.
    #[must_use]
    pub fn summary(&self) -> PujaSummary {
        PujaSummary {
            id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
            duration: self.duration.clone(),
        }
    }
}

/// Catalog fields shown alongside a booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PujaSummary {
    /// Catalog identifier
    pub id: PujaId,
    /// Display name
    pub name: String,
    /// URL slug
    pub slug: String,
    /// Human-readable duration
    pub duration: String,
}

/// Operator fields shown alongside a booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PujariSummary {
    /// Operator identifier
    pub id: PujariId,
    /// Display name
    pub name: String,
    /// Contact number
    pub mobile: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn time_slot_wire_strings() {
        let json = serde_json::to_string(&TimeSlot::LateMorning).unwrap();
        assert_eq!(json, "\"Late Morning (9-11 AM)\"");

        for slot in TimeSlot::ALL {
            assert_eq!(slot.as_str().parse::<TimeSlot>().unwrap(), slot);
        }
    }

    #[test]
    fn unknown_time_slot_is_invalid_enum() {
        let err = "Midnight".parse::<TimeSlot>().unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidEnum { .. }));
    }

    #[test]
    fn pujari_id_parse_rejects_blank() {
        let err = PujariId::parse("   ").unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: Pujari ID is required");
    }

    #[test]
    fn pujari_id_parse_accepts_uuid() {
        let id = PujariId::new();
        assert_eq!(PujariId::parse(&id.to_string()).unwrap(), id);
        assert!(PujariId::parse("not-a-uuid").is_err());
    }

    #[test]
    fn address_trimmed() {
        let address = Address {
            line1: "  12 Temple Road ".to_string(),
            line2: String::new(),
            city: " Pune".to_string(),
            pincode: "411001 ".to_string(),
            landmark: String::new(),
        };
        let trimmed = address.trimmed();
        assert_eq!(trimmed.line1, "12 Temple Road");
        assert_eq!(trimmed.city, "Pune");
        assert_eq!(trimmed.pincode, "411001");
    }
}
