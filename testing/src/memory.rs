//! In-memory store and collaborators
//!
//! Fast, deterministic implementations of the `bmp-core` store traits:
//! - [`InMemoryBookingStore`]: HashMap-based booking storage with the same
//!   uniqueness and version checks as the Postgres store, plus knobs for
//!   forcing identifier collisions
//! - [`InMemoryCatalog`]: fixed set of catalog entries
//! - [`InMemoryOperatorDirectory`]: fixed roster of operators

use async_trait::async_trait;
use bmp_core::query::{BookingQuery, DashboardStats, Page, RecordedEvent, StatsWindow};
use bmp_core::store::{BookingStore, Catalog, OperatorDirectory};
use bmp_core::{
    Booking, BookingAction, BookingId, BookingKey, CatalogEntry, PujaId, PujariId, PujariSummary,
    StoreError,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Bookings {
    by_key: HashMap<BookingKey, Booking>,
    events: HashMap<BookingKey, Vec<RecordedEvent>>,
    reserved: HashSet<BookingId>,
}

/// In-memory booking store for fast, deterministic testing.
///
/// Clones share the same underlying data.
///
/// # Example
///
/// ```
/// use bmp_testing::InMemoryBookingStore;
/// use bmp_core::store::BookingStore;
/// use bmp_core::BookingId;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryBookingStore::new();
/// let id = BookingId::parse("BMP-20260211-A3F7")?;
/// store.reserve(id.clone());
///
/// assert!(store.exists_booking_id(&id).await?);
/// assert_eq!(store.exists_calls(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryBookingStore {
    data: Arc<RwLock<Bookings>>,
    always_collide: Arc<AtomicBool>,
    exists_calls: Arc<AtomicUsize>,
    insert_conflicts: Arc<AtomicUsize>,
}

impl InMemoryBookingStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that reports every identifier as taken
    #[must_use]
    pub fn colliding() -> Self {
        let store = Self::new();
        store.always_collide.store(true, Ordering::SeqCst);
        store
    }

    /// Mark an identifier as taken without storing a booking
    pub fn reserve(&self, booking_id: BookingId) {
        self.write().reserved.insert(booking_id);
    }

    /// Make the next `count` inserts fail with a duplicate identifier even
    /// though the existence check passed, as when a concurrent writer wins
    pub fn fail_next_inserts(&self, count: usize) {
        self.insert_conflicts.store(count, Ordering::SeqCst);
    }

    /// Number of identifier existence checks made so far
    #[must_use]
    pub fn exists_calls(&self) -> usize {
        self.exists_calls.load(Ordering::SeqCst)
    }

    /// Store a booking directly, bypassing uniqueness checks
    pub fn seed(&self, booking: Booking) {
        self.write().by_key.insert(booking.key, booking);
    }

    /// Snapshot of a stored booking
    #[must_use]
    pub fn get(&self, key: BookingKey) -> Option<Booking> {
        self.read().by_key.get(&key).cloned()
    }

    /// Number of stored bookings
    #[must_use]
    pub fn count(&self) -> usize {
        self.read().by_key.len()
    }

    fn read(&self) -> RwLockReadGuard<'_, Bookings> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Bookings> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_insert_conflict(&self) -> bool {
        self.insert_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn exists_booking_id(&self, booking_id: &BookingId) -> Result<bool, StoreError> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        if self.always_collide.load(Ordering::SeqCst) {
            return Ok(true);
        }
        let data = self.read();
        Ok(data.reserved.contains(booking_id)
            || data.by_key.values().any(|b| &b.booking_id == booking_id))
    }

    async fn insert_unique(&self, booking: &Booking, event: &BookingAction) -> Result<(), StoreError> {
        let duplicate_id = || StoreError::DuplicateKey {
            field: "booking_id".to_string(),
            value: booking.booking_id.to_string(),
        };

        if self.take_insert_conflict() {
            return Err(duplicate_id());
        }

        let mut data = self.write();
        if data.reserved.contains(&booking.booking_id)
            || data.by_key.values().any(|b| b.booking_id == booking.booking_id)
        {
            return Err(duplicate_id());
        }
        if data.by_key.contains_key(&booking.key) {
            return Err(StoreError::DuplicateKey {
                field: "key".to_string(),
                value: booking.key.to_string(),
            });
        }

        data.by_key.insert(booking.key, booking.clone());
        data.events.insert(
            booking.key,
            vec![RecordedEvent {
                version: booking.version,
                event: event.clone(),
                recorded_at: booking.created_at,
            }],
        );
        Ok(())
    }

    async fn find_by_key(&self, key: BookingKey) -> Result<Option<Booking>, StoreError> {
        Ok(self.get(key))
    }

    async fn find_by_booking_id(
        &self,
        booking_id: &BookingId,
    ) -> Result<Option<Booking>, StoreError> {
        Ok(self
            .read()
            .by_key
            .values()
            .find(|b| &b.booking_id == booking_id)
            .cloned())
    }

    async fn update(
        &self,
        booking: &Booking,
        expected_version: u64,
        events: &[BookingAction],
    ) -> Result<Booking, StoreError> {
        let mut data = self.write();
        let actual = data
            .by_key
            .get(&booking.key)
            .map(|stored| stored.version)
            .ok_or_else(|| StoreError::NotFound("Booking".to_string()))?;

        if actual != expected_version {
            return Err(StoreError::ConcurrencyConflict {
                key: booking.key.to_string(),
                expected: expected_version,
                actual,
            });
        }

        let mut stored = booking.clone();
        stored.version = expected_version + 1;
        data.by_key.insert(stored.key, stored.clone());

        let trail = data.events.entry(stored.key).or_default();
        trail.extend(events.iter().map(|event| RecordedEvent {
            version: stored.version,
            event: event.clone(),
            recorded_at: stored.updated_at,
        }));

        Ok(stored)
    }

    async fn list(&self, query: &BookingQuery) -> Result<Page<Booking>, StoreError> {
        Ok(query.apply(self.read().by_key.values()))
    }

    async fn stats(&self, window: &StatsWindow) -> Result<DashboardStats, StoreError> {
        Ok(DashboardStats::from_bookings(self.read().by_key.values(), window))
    }

    async fn history(&self, key: BookingKey) -> Result<Vec<RecordedEvent>, StoreError> {
        Ok(self.read().events.get(&key).cloned().unwrap_or_default())
    }
}

/// In-memory puja catalog.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCatalog {
    entries: Arc<RwLock<HashMap<PujaId, CatalogEntry>>>,
}

impl InMemoryCatalog {
    /// Create an empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry (builder style)
    #[must_use]
    pub fn with_entry(self, entry: CatalogEntry) -> Self {
        self.insert(entry);
        self
    }

    /// Add or replace an entry
    pub fn insert(&self, entry: CatalogEntry) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entry.id, entry);
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn find_by_id(&self, id: PujaId) -> Result<Option<CatalogEntry>, StoreError> {
        Ok(self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned())
    }
}

/// In-memory operator roster.
#[derive(Clone, Debug, Default)]
pub struct InMemoryOperatorDirectory {
    operators: Arc<RwLock<HashMap<PujariId, PujariSummary>>>,
}

impl InMemoryOperatorDirectory {
    /// Create an empty roster
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an operator (builder style)
    #[must_use]
    pub fn with_pujari(self, pujari: PujariSummary) -> Self {
        self.add(pujari);
        self
    }

    /// Add or replace an operator
    pub fn add(&self, pujari: PujariSummary) {
        self.operators
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pujari.id, pujari);
    }
}

#[async_trait]
impl OperatorDirectory for InMemoryOperatorDirectory {
    async fn find_by_id(&self, id: PujariId) -> Result<Option<PujariSummary>, StoreError> {
        Ok(self
            .operators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[tokio::test]
    async fn insert_rejects_duplicate_booking_id() {
        let store = InMemoryBookingStore::new();
        let first = fixtures::booking("BMP-20260211-A3F7");
        let second = fixtures::booking("BMP-20260211-A3F7");
        let event = BookingAction::BookingCreated {
            booking: Box::new(first.clone()),
        };

        store.insert_unique(&first, &event).await.unwrap();
        let err = store.insert_unique(&second, &event).await.unwrap_err();

        assert!(matches!(err, StoreError::DuplicateKey { ref field, .. } if field == "booking_id"));
        assert_eq!(store.count(), 1);
    }

    #[tokio::test]
    async fn stale_version_is_a_conflict() {
        let store = InMemoryBookingStore::new();
        let booking = fixtures::booking("BMP-20260211-A3F7");
        store.seed(booking.clone());

        let updated = store.update(&booking, 1, &[]).await.unwrap();
        assert_eq!(updated.version, 2);

        let err = store.update(&booking, 1, &[]).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::ConcurrencyConflict {
                key: booking.key.to_string(),
                expected: 1,
                actual: 2,
            }
        );
    }

    #[tokio::test]
    async fn forced_insert_conflicts_are_consumed() {
        let store = InMemoryBookingStore::new();
        store.fail_next_inserts(1);
        let booking = fixtures::booking("BMP-20260211-A3F7");
        let event = BookingAction::BookingCreated {
            booking: Box::new(booking.clone()),
        };

        assert!(store.insert_unique(&booking, &event).await.is_err());
        assert!(store.insert_unique(&booking, &event).await.is_ok());
    }

    #[tokio::test]
    async fn colliding_store_counts_checks() {
        let store = InMemoryBookingStore::colliding();
        let id = BookingId::parse("BMP-20260211-A3F7").unwrap();
        assert!(store.exists_booking_id(&id).await.unwrap());
        assert!(store.exists_booking_id(&id).await.unwrap());
        assert_eq!(store.exists_calls(), 2);
    }
}
