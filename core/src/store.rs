//! Contracts between the functional core and the outside world.
//!
//! The runtime talks to storage and to the two read-only collaborators (the
//! puja catalog and the operator directory) only through these traits, so the
//! same service runs against Postgres in production and in-memory doubles in
//! tests.

use crate::aggregate::BookingAction;
use crate::booking::Booking;
use crate::error::StoreError;
use crate::identifier::BookingId;
use crate::query::{BookingQuery, DashboardStats, Page, RecordedEvent, StatsWindow};
use crate::types::{BookingKey, CatalogEntry, PujaId, PujariId, PujariSummary};
use async_trait::async_trait;

/// Durable storage of bookings and their audit trail.
///
/// Single-record writes are atomic. Uniqueness of `booking_id` is a hard
/// constraint of the store, not something callers can only check beforehand.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Whether a booking with this identifier already exists.
    async fn exists_booking_id(&self, booking_id: &BookingId) -> Result<bool, StoreError>;

    /// Inserts a new booking together with its creation event.
    ///
    /// # Errors
    ///
    /// [`StoreError::DuplicateKey`] with field `booking_id` if the identifier is taken.
    async fn insert_unique(&self, booking: &Booking, event: &BookingAction) -> Result<(), StoreError>;

    /// Looks a booking up by storage key.
    async fn find_by_key(&self, key: BookingKey) -> Result<Option<Booking>, StoreError>;

    /// Looks a booking up by its canonical identifier.
    async fn find_by_booking_id(&self, booking_id: &BookingId)
        -> Result<Option<Booking>, StoreError>;

    /// Writes a modified booking if it is still at `expected_version`.
    ///
    /// The stored version becomes `expected_version + 1`; the returned booking
    /// carries it. `events` are appended to the audit trail in the same write.
    ///
    /// # Errors
    ///
    /// - [`StoreError::ConcurrencyConflict`] if the stored version differs
    /// - [`StoreError::NotFound`] if the booking does not exist
    async fn update(
        &self,
        booking: &Booking,
        expected_version: u64,
        events: &[BookingAction],
    ) -> Result<Booking, StoreError>;

    /// Filtered, sorted, paged listing.
    async fn list(&self, query: &BookingQuery) -> Result<Page<Booking>, StoreError>;

    /// Dashboard counters for the given window.
    async fn stats(&self, window: &StatsWindow) -> Result<DashboardStats, StoreError>;

    /// Audit trail of a booking, oldest first.
    async fn history(&self, key: BookingKey) -> Result<Vec<RecordedEvent>, StoreError>;
}

/// Read-only view of the puja catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Resolves a catalog entry.
    async fn find_by_id(&self, id: PujaId) -> Result<Option<CatalogEntry>, StoreError>;
}

/// Read-only view of the operator roster.
#[async_trait]
pub trait OperatorDirectory: Send + Sync {
    /// Resolves an operator's display details.
    async fn find_by_id(&self, id: PujariId) -> Result<Option<PujariSummary>, StoreError>;

    /// Whether the operator exists.
    async fn exists(&self, id: PujariId) -> Result<bool, StoreError> {
        Ok(self.find_by_id(id).await?.is_some())
    }
}
