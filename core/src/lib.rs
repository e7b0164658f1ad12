//! # BMP Core
//!
//! Functional core of the booking lifecycle engine.
//!
//! This crate owns everything about a booking that can be decided without I/O:
//!
//! - **Types**: bookings, addresses, time slots, catalog and operator references
//! - **Identifier**: the `BMP-YYYYMMDD-XXXX` format and candidate generation
//! - **Lifecycle**: pure transition functions for the status and items-delivery
//!   state machines
//! - **Reducer**: `(State, Action, Environment) → (State, Events)` for a single booking
//! - **Environment**: injected `Clock` and `RandomSource`
//! - **Store**: the contracts the imperative shell needs from storage and collaborators
//!
//! ## Architecture Principles
//!
//! - Functional Core, Imperative Shell
//! - Two independent state machines on one record
//! - Persistence is an explicit step the caller performs after a successful reduce
//!
//! ## Example
//!
//! ```
//! use bmp_core::lifecycle::transition_status;
//! use bmp_core::status::BookingStatus;
//!
//! let next = transition_status(BookingStatus::New, BookingStatus::PujariAssigned, None);
//! assert_eq!(next, Ok(BookingStatus::PujariAssigned));
//!
//! let cancel = transition_status(BookingStatus::Confirmed, BookingStatus::Cancelled, None);
//! assert!(cancel.is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregate;
pub mod booking;
pub mod environment;
pub mod error;
pub mod identifier;
pub mod lifecycle;
pub mod query;
pub mod status;
pub mod store;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use chrono::{DateTime, NaiveDate, Utc};
pub use smallvec::{smallvec, SmallVec};

pub use aggregate::{BookingAction, BookingEnvironment, BookingReducer, BookingState};
pub use booking::{Booking, BookingConfirmation, BookingDetails, PublicBooking};
pub use error::{BookingError, ErrorKind, LifecycleError, StoreError};
pub use identifier::BookingId;
pub use status::{BookingStatus, ItemsDeliveryStatus};
pub use types::{
    Address, BookingKey, CatalogEntry, PujaId, PujaSummary, PujaType, PujariId, PujariSummary,
    TimeSlot,
};

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Events)`.
///
/// A reducer validates a command against the current state, mutates the state
/// in place when the command is accepted, and returns the events describing what
/// happened. Returning events instead of performing writes keeps persistence an
/// explicit step for the caller.
pub mod reducer {
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes (commands and events)
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for BookingReducer {
    ///     type State = BookingState;
    ///     type Action = BookingAction;
    ///     type Environment = BookingEnvironment;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut BookingState,
    ///         action: BookingAction,
    ///         env: &BookingEnvironment,
    ///     ) -> SmallVec<[BookingAction; 4]> {
    ///         match action {
    ///             BookingAction::AssignPujari { pujari } => {
    ///                 // Business logic here
    ///                 SmallVec::new()
    ///             }
    ///             _ => SmallVec::new(),
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and emitted events
        ///
        /// This is a pure function that:
        /// 1. Validates the action
        /// 2. Updates state in place
        /// 3. Returns the events that were applied
        ///
        /// A rejected command leaves the domain state untouched and returns no events.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Self::Action; 4]>;
    }
}
