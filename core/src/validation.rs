//! Field validation for booking creation and operator annotations.
//!
//! Validation collects every failing field instead of stopping at the first,
//! so a caller can fix a form in one round trip.

use crate::error::{BookingError, LifecycleError};
use crate::types::{Address, PujaId, TimeSlot};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Maximum length of a customer name
pub const CUSTOMER_NAME_MAX: usize = 100;
/// Minimum length of a customer name
pub const CUSTOMER_NAME_MIN: usize = 2;
/// Maximum length of operator notes
pub const ADMIN_NOTES_MAX: usize = 1000;
/// Maximum length of a cancellation reason
pub const CANCELLATION_REASON_MAX: usize = 500;

/// Booking request as submitted by a customer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    /// Catalog entry to book
    pub puja_id: PujaId,
    /// Customer name
    pub customer_name: String,
    /// Customer mobile number
    pub customer_mobile: String,
    /// Service address
    pub address: Address,
    /// Requested service date
    pub preferred_date: NaiveDate,
    /// Requested slot
    pub preferred_time: TimeSlot,
    /// Whether ritual items should be delivered
    #[serde(default)]
    pub items_delivery_requested: bool,
}

/// A validated, normalized booking draft ready to be materialized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    /// Catalog entry to book
    pub puja: PujaId,
    /// Trimmed customer name
    pub customer_name: String,
    /// Trimmed mobile number
    pub customer_mobile: String,
    /// Trimmed address
    pub address: Address,
    /// Requested date
    pub preferred_date: NaiveDate,
    /// Requested slot
    pub preferred_time: TimeSlot,
    /// Delivery flag
    pub items_delivery_requested: bool,
}

impl CreateBookingRequest {
    /// Validates and normalizes the request.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] listing every failing field.
    pub fn validate(&self) -> Result<NewBooking, BookingError> {
        let customer_name = self.customer_name.trim().to_string();
        let customer_mobile = self.customer_mobile.trim().to_string();
        let address = self.address.trimmed();

        let mut errors = Vec::new();

        let name_len = customer_name.chars().count();
        if name_len == 0 {
            errors.push("Name is required".to_string());
        } else if !(CUSTOMER_NAME_MIN..=CUSTOMER_NAME_MAX).contains(&name_len) {
            errors.push(format!(
                "Name must be {CUSTOMER_NAME_MIN}-{CUSTOMER_NAME_MAX} characters"
            ));
        }

        if customer_mobile.is_empty() {
            errors.push("Mobile number is required".to_string());
        } else if !is_valid_mobile(&customer_mobile) {
            errors.push("Please provide a valid 10-digit Indian mobile number".to_string());
        }

        if address.line1.is_empty() {
            errors.push("Address line 1 is required".to_string());
        }
        if address.city.is_empty() {
            errors.push("City is required".to_string());
        }
        if address.pincode.is_empty() {
            errors.push("Pincode is required".to_string());
        } else if !is_valid_pincode(&address.pincode) {
            errors.push("Pincode must be 6 digits".to_string());
        }

        if !errors.is_empty() {
            return Err(BookingError::Validation(errors));
        }

        Ok(NewBooking {
            puja: self.puja_id,
            customer_name,
            customer_mobile,
            address,
            preferred_date: self.preferred_date,
            preferred_time: self.preferred_time,
            items_delivery_requested: self.items_delivery_requested,
        })
    }
}

/// `^[6-9]\d{9}$`
#[must_use]
pub fn is_valid_mobile(mobile: &str) -> bool {
    let bytes = mobile.as_bytes();
    bytes.len() == 10
        && matches!(bytes[0], b'6'..=b'9')
        && bytes.iter().all(u8::is_ascii_digit)
}

/// `^\d{6}$`
#[must_use]
pub fn is_valid_pincode(pincode: &str) -> bool {
    pincode.len() == 6 && pincode.bytes().all(|b| b.is_ascii_digit())
}

/// Trims optional free text, treating blank input as absent.
#[must_use]
pub fn non_blank(input: Option<&str>) -> Option<&str> {
    input.map(str::trim).filter(|s| !s.is_empty())
}

/// Rejects text longer than `max` characters.
///
/// # Errors
///
/// Returns [`LifecycleError::TooLong`] naming the field.
pub fn check_length(field: &str, value: Option<&str>, max: usize) -> Result<(), LifecycleError> {
    match value {
        Some(text) if text.chars().count() > max => Err(LifecycleError::TooLong {
            field: field.to_string(),
            max,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn request() -> CreateBookingRequest {
        CreateBookingRequest {
            puja_id: PujaId::new(),
            customer_name: "  Asha Kulkarni ".to_string(),
            customer_mobile: "9876543210".to_string(),
            address: Address {
                line1: "12 Temple Road".to_string(),
                line2: String::new(),
                city: "Pune".to_string(),
                pincode: "411001".to_string(),
                landmark: "Near Ganesh Mandir".to_string(),
            },
            preferred_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            preferred_time: TimeSlot::Evening,
            items_delivery_requested: true,
        }
    }

    #[test]
    fn valid_request_is_normalized() {
        let draft = request().validate().unwrap();
        assert_eq!(draft.customer_name, "Asha Kulkarni");
        assert!(draft.items_delivery_requested);
    }

    #[test]
    fn every_failing_field_is_reported() {
        let mut req = request();
        req.customer_name = "A".to_string();
        req.customer_mobile = "5123456789".to_string();
        req.address.city = "  ".to_string();
        req.address.pincode = "4110".to_string();

        let BookingError::Validation(errors) = req.validate().unwrap_err() else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| e.contains("Pincode must be 6 digits")));
    }

    #[test]
    fn mobile_rules() {
        assert!(is_valid_mobile("6000000000"));
        assert!(is_valid_mobile("9999999999"));
        assert!(!is_valid_mobile("5999999999"));
        assert!(!is_valid_mobile("999999999"));
        assert!(!is_valid_mobile("99999999999"));
        assert!(!is_valid_mobile("99999o9999"));
    }

    #[test]
    fn pincode_rules() {
        assert!(is_valid_pincode("411001"));
        assert!(!is_valid_pincode("41100"));
        assert!(!is_valid_pincode("41100a"));
    }

    #[test]
    fn non_blank_trims() {
        assert_eq!(non_blank(Some("  late  ")), Some("late"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn length_limits() {
        let long = "x".repeat(CANCELLATION_REASON_MAX + 1);
        assert!(check_length("cancellationReason", Some(&long), CANCELLATION_REASON_MAX).is_err());
        assert!(check_length("cancellationReason", Some("ok"), CANCELLATION_REASON_MAX).is_ok());
    }
}
