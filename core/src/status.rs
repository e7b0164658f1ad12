//! The two state vocabularies carried by a booking.
//!
//! [`BookingStatus`] is the lifecycle proper and has a strict transition table.
//! [`ItemsDeliveryStatus`] tracks physical item delivery and accepts any member
//! of its vocabulary; the two are validated independently.

use crate::error::LifecycleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a booking.
///
/// ```text
/// new → pujari_assigned → items_preparing → confirmed → completed
///                       └──────────────────↗
/// any non-terminal status → cancelled
/// ```
///
/// Variants are declared in lifecycle order, which is also their `Ord` order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Initial status of every booking
    New,
    /// An operator has been bound to the booking
    PujariAssigned,
    /// Ritual items are being prepared
    ItemsPreparing,
    /// Operations confirmed the booking with the customer
    Confirmed,
    /// Service performed (terminal)
    Completed,
    /// Booking cancelled (terminal)
    Cancelled,
}

impl BookingStatus {
    /// Every status in lifecycle order
    pub const ALL: [Self; 6] = [
        Self::New,
        Self::PujariAssigned,
        Self::ItemsPreparing,
        Self::Confirmed,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Non-terminal statuses
    pub const ACTIVE: [Self; 4] = [
        Self::New,
        Self::PujariAssigned,
        Self::ItemsPreparing,
        Self::Confirmed,
    ];

    /// Database/wire string
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::PujariAssigned => "pujari_assigned",
            Self::ItemsPreparing => "items_preparing",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Statuses this status may move to.
    #[must_use]
    pub const fn allowed_next(self) -> &'static [Self] {
        match self {
            Self::New => &[Self::PujariAssigned, Self::Cancelled],
            Self::PujariAssigned => &[Self::ItemsPreparing, Self::Confirmed, Self::Cancelled],
            Self::ItemsPreparing => &[Self::Confirmed, Self::Cancelled],
            Self::Confirmed => &[Self::Completed, Self::Cancelled],
            Self::Completed | Self::Cancelled => &[],
        }
    }

    /// Whether `next` is an allowed successor.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next().contains(&next)
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| LifecycleError::invalid_enum("status", s))
    }
}

/// Delivery progress of ritual items.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemsDeliveryStatus {
    /// Delivery was never requested
    NotApplicable,
    /// Requested, nothing done yet
    Pending,
    /// Items are being assembled
    Preparing,
    /// Items are on their way
    Dispatched,
    /// Items reached the customer
    Delivered,
}

impl ItemsDeliveryStatus {
    /// Every delivery status
    pub const ALL: [Self; 5] = [
        Self::NotApplicable,
        Self::Pending,
        Self::Preparing,
        Self::Dispatched,
        Self::Delivered,
    ];

    /// Initial delivery status for a new booking.
    #[must_use]
    pub const fn initial(delivery_requested: bool) -> Self {
        if delivery_requested {
            Self::Pending
        } else {
            Self::NotApplicable
        }
    }

    /// Database/wire string
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotApplicable => "not_applicable",
            Self::Pending => "pending",
            Self::Preparing => "preparing",
            Self::Dispatched => "dispatched",
            Self::Delivered => "delivered",
        }
    }

    /// Whether items still have to reach the customer.
    #[must_use]
    pub const fn is_outstanding(self) -> bool {
        matches!(self, Self::Pending | Self::Preparing)
    }
}

impl fmt::Display for ItemsDeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemsDeliveryStatus {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| LifecycleError::invalid_enum("itemsDeliveryStatus", s))
    }
}
