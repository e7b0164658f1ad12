//! The booking record and its read views.

use crate::identifier::BookingId;
use crate::status::{BookingStatus, ItemsDeliveryStatus};
use crate::types::{Address, BookingKey, PujaId, PujaSummary, PujariId, PujariSummary, TimeSlot};
use crate::validation::NewBooking;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One customer's request for a scheduled ritual service, plus its mutable
/// operational state.
///
/// `status` and `items_delivery_status` are written only by the booking
/// reducer; the rest is fixed at creation apart from annotations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Opaque storage key
    pub key: BookingKey,
    /// Human-readable identifier
    pub booking_id: BookingId,
    /// Catalog entry that was booked
    pub puja: PujaId,
    /// Customer name
    pub customer_name: String,
    /// Customer mobile number (10 digits, starting 6-9)
    pub customer_mobile: String,
    /// Service address
    pub address: Address,
    /// Requested service date
    pub preferred_date: NaiveDate,
    /// Requested time slot
    pub preferred_time: TimeSlot,
    /// Whether the customer asked for ritual items to be delivered
    pub items_delivery_requested: bool,
    /// Delivery progress of ritual items
    pub items_delivery_status: ItemsDeliveryStatus,
    /// Operator bound to the booking
    pub assigned_pujari: Option<PujariId>,
    /// Lifecycle status
    pub status: BookingStatus,
    /// Operator-only notes
    pub admin_notes: String,
    /// Reason given when the booking was cancelled
    pub cancellation_reason: String,
    /// When the booking was created
    pub created_at: DateTime<Utc>,
    /// When the booking was last modified
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency version, starting at 1
    pub version: u64,
}

impl Booking {
    /// Version of a freshly created booking
    pub const INITIAL_VERSION: u64 = 1;

    /// Materializes a booking in its initial state.
    #[must_use]
    pub fn materialize(
        key: BookingKey,
        booking_id: BookingId,
        draft: NewBooking,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            booking_id,
            puja: draft.puja,
            customer_name: draft.customer_name,
            customer_mobile: draft.customer_mobile,
            address: draft.address,
            preferred_date: draft.preferred_date,
            preferred_time: draft.preferred_time,
            items_delivery_requested: draft.items_delivery_requested,
            items_delivery_status: ItemsDeliveryStatus::initial(draft.items_delivery_requested),
            assigned_pujari: None,
            status: BookingStatus::New,
            admin_notes: String::new(),
            cancellation_reason: String::new(),
            created_at,
            updated_at: created_at,
            version: Self::INITIAL_VERSION,
        }
    }

    /// Customer-facing view without operator-only fields.
    #[must_use]
    pub fn public_view(&self, puja_details: Option<PujaSummary>) -> PublicBooking {
        PublicBooking {
            booking_id: self.booking_id.clone(),
            puja: self.puja,
            puja_details,
            customer_name: self.customer_name.clone(),
            customer_mobile: self.customer_mobile.clone(),
            address: self.address.clone(),
            preferred_date: self.preferred_date,
            preferred_time: self.preferred_time,
            items_delivery_requested: self.items_delivery_requested,
            items_delivery_status: self.items_delivery_status,
            status: self.status,
            cancellation_reason: self.cancellation_reason.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Customer-facing booking view used by status lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicBooking {
    /// Human-readable identifier
    pub booking_id: BookingId,
    /// Catalog entry that was booked
    pub puja: PujaId,
    /// Catalog summary, `None` if the entry has since disappeared
    pub puja_details: Option<PujaSummary>,
    /// Customer name
    pub customer_name: String,
    /// Customer mobile number
    pub customer_mobile: String,
    /// Service address
    pub address: Address,
    /// Requested service date
    pub preferred_date: NaiveDate,
    /// Requested time slot
    pub preferred_time: TimeSlot,
    /// Whether item delivery was requested
    pub items_delivery_requested: bool,
    /// Delivery progress
    pub items_delivery_status: ItemsDeliveryStatus,
    /// Lifecycle status
    pub status: BookingStatus,
    /// Cancellation reason, empty unless cancelled
    pub cancellation_reason: String,
    /// Creation instant
    pub created_at: DateTime<Utc>,
    /// Last modification instant
    pub updated_at: DateTime<Utc>,
}

/// A booking with its catalog and operator references resolved for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    /// The booking record
    pub booking: Booking,
    /// Catalog summary, `None` if the entry has since disappeared
    pub puja: Option<PujaSummary>,
    /// Assigned operator, `None` if unassigned or no longer on the roster
    pub pujari: Option<PujariSummary>,
}

impl BookingDetails {
    /// Summary returned to the customer right after creation.
    #[must_use]
    pub fn confirmation(&self) -> BookingConfirmation {
        BookingConfirmation {
            booking_id: self.booking.booking_id.clone(),
            puja_name: self
                .puja
                .as_ref()
                .map(|puja| puja.name.clone())
                .unwrap_or_default(),
            preferred_date: self.booking.preferred_date,
            preferred_time: self.booking.preferred_time,
            items_delivery_requested: self.booking.items_delivery_requested,
            status: self.booking.status,
            customer_name: self.booking.customer_name.clone(),
            address: self.booking.address.clone(),
        }
    }
}

/// Creation acknowledgement shown to the customer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    /// Human-readable identifier
    pub booking_id: BookingId,
    /// Name of the booked puja
    pub puja_name: String,
    /// Requested date
    pub preferred_date: NaiveDate,
    /// Requested slot
    pub preferred_time: TimeSlot,
    /// Whether item delivery was requested
    pub items_delivery_requested: bool,
    /// Initial status
    pub status: BookingStatus,
    /// Customer name
    pub customer_name: String,
    /// Service address
    pub address: Address,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn draft(delivery: bool) -> NewBooking {
        NewBooking {
            puja: PujaId::new(),
            customer_name: "Asha Kulkarni".to_string(),
            customer_mobile: "9876543210".to_string(),
            address: Address {
                line1: "12 Temple Road".to_string(),
                line2: String::new(),
                city: "Pune".to_string(),
                pincode: "411001".to_string(),
                landmark: String::new(),
            },
            preferred_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            preferred_time: TimeSlot::Morning,
            items_delivery_requested: delivery,
        }
    }

    #[test]
    fn materialize_starts_in_initial_state() {
        let now = Utc::now();
        let id = BookingId::parse("BMP-20260211-A3F7").unwrap();
        let booking = Booking::materialize(BookingKey::new(), id, draft(true), now);

        assert_eq!(booking.status, BookingStatus::New);
        assert_eq!(booking.items_delivery_status, ItemsDeliveryStatus::Pending);
        assert_eq!(booking.assigned_pujari, None);
        assert_eq!(booking.version, Booking::INITIAL_VERSION);
        assert_eq!(booking.created_at, booking.updated_at);
    }

    #[test]
    fn delivery_not_requested_is_not_applicable() {
        let id = BookingId::parse("BMP-20260211-A3F7").unwrap();
        let booking = Booking::materialize(BookingKey::new(), id, draft(false), Utc::now());
        assert_eq!(
            booking.items_delivery_status,
            ItemsDeliveryStatus::NotApplicable
        );
    }

    #[test]
    fn public_view_hides_admin_notes() {
        let id = BookingId::parse("BMP-20260211-A3F7").unwrap();
        let mut booking = Booking::materialize(BookingKey::new(), id, draft(false), Utc::now());
        booking.admin_notes = "customer prefers Marathi".to_string();

        let json = serde_json::to_value(booking.public_view(None)).unwrap();
        assert!(json.get("adminNotes").is_none());
        assert_eq!(json["bookingId"], "BMP-20260211-A3F7");
        assert_eq!(json["status"], "new");
        assert!(json["pujaDetails"].is_null());
    }
}
