//! Fixtures for catalog entries, booking requests and bookings.
//!
//! Dates are relative to [`test_clock`](crate::test_clock), which reads
//! 2026-02-11 in India.

#![allow(clippy::expect_used)] // Hardcoded fixture values always parse

use bmp_core::validation::{CreateBookingRequest, NewBooking};
use bmp_core::{
    Address, Booking, BookingId, BookingKey, CatalogEntry, NaiveDate, PujaId, PujaType, PujariId,
    PujariSummary, TimeSlot,
};
use chrono::{DateTime, Utc};

/// Business date of the test clock
///
/// # Panics
///
/// Never; the date is hardcoded.
#[must_use]
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 11).expect("valid date")
}

/// The day after [`today`]
#[must_use]
pub fn tomorrow() -> NaiveDate {
    today().succ_opt().expect("valid date")
}

/// The day before [`today`]
#[must_use]
pub fn yesterday() -> NaiveDate {
    today().pred_opt().expect("valid date")
}

/// An active, bookable catalog entry
#[must_use]
pub fn bookable_puja() -> CatalogEntry {
    CatalogEntry {
        id: PujaId::new(),
        name: "Satyanarayan Puja".to_string(),
        slug: "satyanarayan-puja".to_string(),
        duration: "2-3 hours".to_string(),
        is_active: true,
        puja_type: PujaType::Bookable,
    }
}

/// An active entry that only accepts callback requests
#[must_use]
pub fn coming_soon_puja() -> CatalogEntry {
    CatalogEntry {
        name: "Rudrabhishek".to_string(),
        slug: "rudrabhishek".to_string(),
        puja_type: PujaType::ComingSoon,
        ..bookable_puja()
    }
}

/// A deactivated entry
#[must_use]
pub fn inactive_puja() -> CatalogEntry {
    CatalogEntry {
        name: "Griha Pravesh".to_string(),
        slug: "griha-pravesh".to_string(),
        is_active: false,
        ..bookable_puja()
    }
}

/// A rostered operator with a fresh id
#[must_use]
pub fn pujari() -> PujariSummary {
    PujariSummary {
        id: PujariId::new(),
        name: "Pandit Ramesh Joshi".to_string(),
        mobile: "9822012345".to_string(),
    }
}

/// A valid address in Pune
#[must_use]
pub fn address() -> Address {
    Address {
        line1: "12 Temple Road".to_string(),
        line2: "Shaniwar Peth".to_string(),
        city: "Pune".to_string(),
        pincode: "411030".to_string(),
        landmark: "Near Ganesh Mandir".to_string(),
    }
}

/// A valid booking request for `puja` on `date`, with item delivery
#[must_use]
pub fn booking_request(puja: PujaId, date: NaiveDate) -> CreateBookingRequest {
    CreateBookingRequest {
        puja_id: puja,
        customer_name: "Asha Kulkarni".to_string(),
        customer_mobile: "9876543210".to_string(),
        address: address(),
        preferred_date: date,
        preferred_time: TimeSlot::Morning,
        items_delivery_requested: true,
    }
}

/// A validated draft for a random puja, tomorrow
#[must_use]
pub fn draft() -> NewBooking {
    NewBooking {
        puja: PujaId::new(),
        customer_name: "Asha Kulkarni".to_string(),
        customer_mobile: "9876543210".to_string(),
        address: address(),
        preferred_date: tomorrow(),
        preferred_time: TimeSlot::Morning,
        items_delivery_requested: true,
    }
}

/// Creation instant of fixture bookings
///
/// # Panics
///
/// Never; the timestamp is hardcoded.
#[must_use]
pub fn created_at() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-02-11T04:00:00Z")
        .expect("hardcoded timestamp should always parse")
        .with_timezone(&Utc)
}

/// A freshly created booking with the given identifier
///
/// # Panics
///
/// Panics if `booking_id` is malformed.
#[must_use]
pub fn booking(booking_id: &str) -> Booking {
    Booking::materialize(
        BookingKey::new(),
        BookingId::parse(booking_id).expect("fixture booking id must be well formed"),
        draft(),
        created_at(),
    )
}
