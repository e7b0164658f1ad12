//! Booking aggregate.
//!
//! One reducer drives both state machines of a single booking. Commands are
//! validated against the loaded record; accepted commands produce events that
//! are applied to the state and returned to the caller for persistence.
//!
//! A rejected command records a [`LifecycleError`] in
//! [`BookingState::last_error`] and returns no events, leaving the booking
//! itself untouched.

use crate::booking::Booking;
use crate::environment::Clock;
use crate::error::LifecycleError;
use crate::identifier::BookingId;
use crate::lifecycle::{status_after_assignment, transition_items, transition_status};
use crate::reducer::Reducer;
use crate::status::{BookingStatus, ItemsDeliveryStatus};
use crate::types::{BookingKey, PujariId};
use crate::validation::{
    check_length, non_blank, NewBooking, ADMIN_NOTES_MAX, CANCELLATION_REASON_MAX,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use std::sync::Arc;

// ============================================================================
// Actions (Commands + Events)
// ============================================================================

/// Actions for the booking aggregate
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BookingAction {
    // Commands
    /// Materialize a new booking from a validated draft
    CreateBooking {
        /// Storage key for the new record
        key: BookingKey,
        /// Allocated identifier
        booking_id: BookingId,
        /// Validated request
        draft: NewBooking,
    },

    /// Bind an operator to the booking
    AssignPujari {
        /// Operator to assign
        pujari: PujariId,
    },

    /// Move the booking along the status table
    UpdateStatus {
        /// Requested status
        status: BookingStatus,
        /// Replacement operator notes
        admin_notes: Option<String>,
        /// Reason, required when cancelling
        cancellation_reason: Option<String>,
    },

    /// Set the items delivery status
    UpdateItemsStatus {
        /// Requested delivery status
        status: ItemsDeliveryStatus,
    },

    // Events
    /// Booking was created
    BookingCreated {
        /// The materialized record
        booking: Box<Booking>,
    },

    /// An operator was assigned
    PujariAssigned {
        /// Assigned operator
        pujari: PujariId,
        /// Operator assigned before, if any
        previous: Option<PujariId>,
        /// Status before the assignment
        from: BookingStatus,
        /// Status after the assignment
        to: BookingStatus,
        /// When it happened
        at: DateTime<Utc>,
    },

    /// Status moved along the table
    StatusChanged {
        /// Previous status
        from: BookingStatus,
        /// New status
        to: BookingStatus,
        /// Notes stored with the change
        admin_notes: Option<String>,
        /// Reason stored with the change
        cancellation_reason: Option<String>,
        /// When it happened
        at: DateTime<Utc>,
    },

    /// Items delivery status changed
    ItemsStatusChanged {
        /// Previous delivery status
        from: ItemsDeliveryStatus,
        /// New delivery status
        to: ItemsDeliveryStatus,
        /// When it happened
        at: DateTime<Utc>,
    },

    /// A command was rejected
    ValidationFailed {
        /// Why
        error: LifecycleError,
    },
}

impl BookingAction {
    /// Whether this action is a command.
    #[must_use]
    pub const fn is_command(&self) -> bool {
        matches!(
            self,
            Self::CreateBooking { .. }
                | Self::AssignPujari { .. }
                | Self::UpdateStatus { .. }
                | Self::UpdateItemsStatus { .. }
        )
    }

    /// Whether this action is an event.
    #[must_use]
    pub const fn is_event(&self) -> bool {
        !self.is_command()
    }

    /// Stable event name for storage and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateBooking { .. } => "create_booking",
            Self::AssignPujari { .. } => "assign_pujari",
            Self::UpdateStatus { .. } => "update_status",
            Self::UpdateItemsStatus { .. } => "update_items_status",
            Self::BookingCreated { .. } => "booking_created",
            Self::PujariAssigned { .. } => "pujari_assigned",
            Self::StatusChanged { .. } => "status_changed",
            Self::ItemsStatusChanged { .. } => "items_status_changed",
            Self::ValidationFailed { .. } => "validation_failed",
        }
    }
}

// ============================================================================
// State
// ============================================================================

/// State of the booking aggregate: at most one booking.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BookingState {
    /// The loaded booking, `None` before creation
    pub booking: Option<Booking>,
    /// Error from the last rejected command
    pub last_error: Option<LifecycleError>,
}

impl BookingState {
    /// Creates an empty state
    #[must_use]
    pub const fn new() -> Self {
        Self {
            booking: None,
            last_error: None,
        }
    }

    /// State holding an existing booking
    #[must_use]
    pub const fn loaded(booking: Booking) -> Self {
        Self {
            booking: Some(booking),
            last_error: None,
        }
    }

    /// Current status, if a booking is loaded
    #[must_use]
    pub fn status(&self) -> Option<BookingStatus> {
        self.booking.as_ref().map(|b| b.status)
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Environment dependencies for the booking reducer
#[derive(Clone)]
pub struct BookingEnvironment {
    /// Clock for event timestamps
    pub clock: Arc<dyn Clock>,
}

impl BookingEnvironment {
    /// Creates a new `BookingEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the booking aggregate
#[derive(Clone, Debug, Default)]
pub struct BookingReducer;

impl BookingReducer {
    /// Creates a new `BookingReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn loaded(state: &BookingState) -> Result<&Booking, LifecycleError> {
        state.booking.as_ref().ok_or(LifecycleError::NotLoaded)
    }

    /// Validates `UpdateStatus` and returns the normalized notes and reason.
    fn validate_update_status(
        booking: &Booking,
        status: BookingStatus,
        admin_notes: Option<&str>,
        cancellation_reason: Option<&str>,
    ) -> Result<(Option<String>, Option<String>), LifecycleError> {
        let notes = non_blank(admin_notes);
        let reason = non_blank(cancellation_reason);

        transition_status(booking.status, status, reason)?;
        check_length("Admin notes", notes, ADMIN_NOTES_MAX)?;
        check_length("Cancellation reason", reason, CANCELLATION_REASON_MAX)?;

        Ok((notes.map(str::to_string), reason.map(str::to_string)))
    }

    /// Applies an event to state
    fn apply_event(state: &mut BookingState, action: &BookingAction) {
        match action {
            BookingAction::BookingCreated { booking } => {
                state.booking = Some(booking.as_ref().clone());
                state.last_error = None;
            }

            BookingAction::PujariAssigned { pujari, to, at, .. } => {
                if let Some(booking) = state.booking.as_mut() {
                    booking.assigned_pujari = Some(*pujari);
                    booking.status = *to;
                    booking.updated_at = *at;
                }
                state.last_error = None;
            }

            BookingAction::StatusChanged {
                to,
                admin_notes,
                cancellation_reason,
                at,
                ..
            } => {
                if let Some(booking) = state.booking.as_mut() {
                    booking.status = *to;
                    if let Some(notes) = admin_notes {
                        booking.admin_notes.clone_from(notes);
                    }
                    if let Some(reason) = cancellation_reason {
                        booking.cancellation_reason.clone_from(reason);
                    }
                    booking.updated_at = *at;
                }
                state.last_error = None;
            }

            BookingAction::ItemsStatusChanged { to, at, .. } => {
                if let Some(booking) = state.booking.as_mut() {
                    booking.items_delivery_status = *to;
                    booking.updated_at = *at;
                }
                state.last_error = None;
            }

            BookingAction::ValidationFailed { error } => {
                state.last_error = Some(error.clone());
            }

            // Commands don't modify state
            BookingAction::CreateBooking { .. }
            | BookingAction::AssignPujari { .. }
            | BookingAction::UpdateStatus { .. }
            | BookingAction::UpdateItemsStatus { .. } => {}
        }
    }

    fn reject(state: &mut BookingState, error: LifecycleError) -> SmallVec<[BookingAction; 4]> {
        Self::apply_event(state, &BookingAction::ValidationFailed { error });
        SmallVec::new()
    }

    fn accept(state: &mut BookingState, event: BookingAction) -> SmallVec<[BookingAction; 4]> {
        Self::apply_event(state, &event);
        smallvec![event]
    }
}

impl Reducer for BookingReducer {
    type State = BookingState;
    type Action = BookingAction;
    type Environment = BookingEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Self::Action; 4]> {
        match action {
            BookingAction::CreateBooking {
                key,
                booking_id,
                draft,
            } => {
                if let Some(existing) = state.booking.as_ref() {
                    let key = existing.key;
                    return Self::reject(state, LifecycleError::AlreadyCreated { key });
                }
                let booking = Booking::materialize(key, booking_id, draft, env.clock.now());
                Self::accept(
                    state,
                    BookingAction::BookingCreated {
                        booking: Box::new(booking),
                    },
                )
            }

            BookingAction::AssignPujari { pujari } => {
                let (previous, from) = match Self::loaded(state) {
                    Ok(booking) => (booking.assigned_pujari, booking.status),
                    Err(error) => return Self::reject(state, error),
                };
                Self::accept(
                    state,
                    BookingAction::PujariAssigned {
                        pujari,
                        previous,
                        from,
                        to: status_after_assignment(from),
                        at: env.clock.now(),
                    },
                )
            }

            BookingAction::UpdateStatus {
                status,
                admin_notes,
                cancellation_reason,
            } => {
                let validated = Self::loaded(state).and_then(|booking| {
                    Self::validate_update_status(
                        booking,
                        status,
                        admin_notes.as_deref(),
                        cancellation_reason.as_deref(),
                    )
                    .map(|normalized| (booking.status, normalized))
                });
                match validated {
                    Ok((from, (admin_notes, cancellation_reason))) => Self::accept(
                        state,
                        BookingAction::StatusChanged {
                            from,
                            to: status,
                            admin_notes,
                            cancellation_reason,
                            at: env.clock.now(),
                        },
                    ),
                    Err(error) => Self::reject(state, error),
                }
            }

            BookingAction::UpdateItemsStatus { status } => {
                let from = match Self::loaded(state) {
                    Ok(booking) => booking.items_delivery_status,
                    Err(error) => return Self::reject(state, error),
                };
                Self::accept(
                    state,
                    BookingAction::ItemsStatusChanged {
                        from,
                        to: transition_items(from, status),
                        at: env.clock.now(),
                    },
                )
            }

            // Events (replayed from storage)
            event => {
                Self::apply_event(state, &event);
                SmallVec::new()
            }
        }
    }
}
