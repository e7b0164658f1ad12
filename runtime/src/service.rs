//! The booking service: the imperative shell around [`BookingReducer`].
//!
//! Every write follows the same shape: load the record, run the reducer,
//! surface a rejection or persist the result with the version that was read.
//! Creation additionally resolves the catalog entry, checks the preferred date
//! and allocates an identifier. Read views resolve the puja and pujari
//! references they display.

use crate::allocator::IdentifierAllocator;
use crate::metrics::{AllocationMetrics, BookingMetrics};
use crate::retry::RetryPolicy;
use bmp_core::environment::{BusinessCalendar, Clock, RandomSource};
use bmp_core::query::{BookingQuery, DashboardStats, Page, RecordedEvent, StatsWindow, MAX_PAGE_LIMIT};
use bmp_core::reducer::Reducer;
use bmp_core::store::{BookingStore, Catalog, OperatorDirectory};
use bmp_core::validation::CreateBookingRequest;
use bmp_core::{
    Booking, BookingAction, BookingDetails, BookingEnvironment, BookingError, BookingId,
    BookingKey, BookingReducer, BookingState, BookingStatus, CatalogEntry, ItemsDeliveryStatus,
    PublicBooking, PujaId, PujaSummary, PujaType, PujariId, PujariSummary, SmallVec, StoreError,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Operator request to move a booking along the status table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    /// Requested status
    pub status: BookingStatus,
    /// Replacement operator notes
    #[serde(default)]
    pub admin_notes: Option<String>,
    /// Reason, required when cancelling
    #[serde(default)]
    pub cancellation_reason: Option<String>,
}

impl StatusUpdate {
    /// A plain status change.
    #[must_use]
    pub const fn to(status: BookingStatus) -> Self {
        Self {
            status,
            admin_notes: None,
            cancellation_reason: None,
        }
    }

    /// A cancellation with a reason.
    #[must_use]
    pub fn cancel(reason: impl Into<String>) -> Self {
        Self {
            status: BookingStatus::Cancelled,
            admin_notes: None,
            cancellation_reason: Some(reason.into()),
        }
    }

    /// Attaches operator notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.admin_notes = Some(notes.into());
        self
    }
}

/// Booking lifecycle operations over injected storage and collaborators.
#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn BookingStore>,
    catalog: Arc<dyn Catalog>,
    operators: Arc<dyn OperatorDirectory>,
    allocator: IdentifierAllocator,
    clock: Arc<dyn Clock>,
    calendar: BusinessCalendar,
    reducer: BookingReducer,
    env: BookingEnvironment,
    list_max_limit: u32,
}

impl BookingService {
    /// Creates a service with the default calendar (UTC+05:30), retry policy and listing limit.
    #[must_use]
    pub fn new(
        store: Arc<dyn BookingStore>,
        catalog: Arc<dyn Catalog>,
        operators: Arc<dyn OperatorDirectory>,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            allocator: IdentifierAllocator::new(Arc::clone(&store), random),
            store,
            catalog,
            operators,
            env: BookingEnvironment::new(Arc::clone(&clock)),
            clock,
            calendar: BusinessCalendar::default(),
            reducer: BookingReducer::new(),
            list_max_limit: MAX_PAGE_LIMIT,
        }
    }

    /// Uses `calendar` for identifier dates and past-date checks.
    #[must_use]
    pub fn with_calendar(mut self, calendar: BusinessCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    /// Uses `policy` for identifier allocation.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.allocator = self.allocator.with_policy(policy);
        self
    }

    /// Caps listing page sizes at `limit`.
    #[must_use]
    pub fn with_list_max_limit(mut self, limit: u32) -> Self {
        self.list_max_limit = limit;
        self
    }

    /// The business calendar in use.
    #[must_use]
    pub const fn calendar(&self) -> &BusinessCalendar {
        &self.calendar
    }

    /// Validates a customer request and creates the booking.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Validation`] listing every failing field
    /// - [`BookingError::NotFound`], [`BookingError::Inactive`] or
    ///   [`BookingError::NotBookable`] for the catalog entry
    /// - [`BookingError::PastDate`] if the preferred date is before today
    /// - [`BookingError::AllocationExhausted`] if no identifier could be allocated
    #[tracing::instrument(skip(self, request), fields(puja = %request.puja_id))]
    pub async fn create_booking(
        &self,
        request: &CreateBookingRequest,
    ) -> Result<BookingDetails, BookingError> {
        let started = Instant::now();
        let draft = request.validate()?;

        let entry = self.bookable_entry(draft.puja).await?;

        let today = self.calendar.today(self.clock.as_ref());
        if draft.preferred_date < today {
            return Err(BookingError::PastDate {
                date: draft.preferred_date,
                today,
            });
        }

        let mut consumed = 0;
        let booking = loop {
            let (booking_id, spent) = self.allocator.allocate_from(today, consumed).await?;
            consumed = spent;

            let mut state = BookingState::new();
            let events = self.reduce(
                &mut state,
                BookingAction::CreateBooking {
                    key: BookingKey::new(),
                    booking_id,
                    draft: draft.clone(),
                },
            )?;
            let booking = state.booking.ok_or_else(|| {
                BookingError::Internal("creation produced no booking".to_string())
            })?;

            let Some(created) = events.first() else {
                return Err(BookingError::Internal("creation produced no event".to_string()));
            };

            match self.store.insert_unique(&booking, created).await {
                Ok(()) => break booking,
                Err(StoreError::DuplicateKey { field, value }) if field == "booking_id" => {
                    AllocationMetrics::record_collision();
                    tracing::warn!(
                        booking_id = %value,
                        attempt = consumed,
                        "Booking ID taken at insert, allocating another"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        };

        BookingMetrics::record_created(started.elapsed());
        tracing::info!(
            booking_id = %booking.booking_id,
            key = %booking.key,
            items_delivery_requested = booking.items_delivery_requested,
            "Booking created"
        );

        Ok(BookingDetails {
            booking,
            puja: Some(entry.summary()),
            pujari: None,
        })
    }

    /// Assigns an operator, advancing a `new` booking to `pujari_assigned`.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Validation`] if `pujari_id` is blank or malformed
    /// - [`BookingError::NotFound`] if the operator or the booking is absent
    #[tracing::instrument(skip(self))]
    pub async fn assign(&self, key: BookingKey, pujari_id: &str) -> Result<Booking, BookingError> {
        let pujari = PujariId::parse(pujari_id)?;
        if !self.operators.exists(pujari).await? {
            return Err(BookingError::NotFound("Pujari".to_string()));
        }

        let (booking, events) = self
            .execute(key, BookingAction::AssignPujari { pujari })
            .await?;

        BookingMetrics::record_assignment();
        let advanced = events.iter().find_map(|event| match event {
            BookingAction::PujariAssigned { from, to, .. } if from != to => Some((*from, *to)),
            _ => None,
        });
        if let Some((from, to)) = advanced {
            BookingMetrics::record_transition(from, to);
        }
        tracing::info!(
            booking_id = %booking.booking_id,
            pujari = %pujari,
            status = %booking.status,
            "Pujari assigned"
        );

        Ok(booking)
    }

    /// Applies an operator status change.
    ///
    /// # Errors
    ///
    /// - [`BookingError::InvalidTransition`] if the table forbids the move
    /// - [`BookingError::MissingReason`] if cancelling without a reason
    /// - [`BookingError::Validation`] if notes or reason are too long
    /// - [`BookingError::ConcurrentModification`] if the booking changed meanwhile
    #[tracing::instrument(skip(self, update), fields(status = %update.status))]
    pub async fn apply_status(
        &self,
        key: BookingKey,
        update: StatusUpdate,
    ) -> Result<Booking, BookingError> {
        let (booking, events) = self
            .execute(
                key,
                BookingAction::UpdateStatus {
                    status: update.status,
                    admin_notes: update.admin_notes,
                    cancellation_reason: update.cancellation_reason,
                },
            )
            .await?;

        for event in &events {
            if let BookingAction::StatusChanged { from, to, .. } = event {
                BookingMetrics::record_transition(*from, *to);
                tracing::info!(
                    booking_id = %booking.booking_id,
                    from = %from,
                    to = %to,
                    "Booking status changed"
                );
            }
        }

        Ok(booking)
    }

    /// Sets the items delivery status.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] if the booking is absent
    /// - [`BookingError::ConcurrentModification`] if the booking changed meanwhile
    #[tracing::instrument(skip(self))]
    pub async fn apply_items_status(
        &self,
        key: BookingKey,
        status: ItemsDeliveryStatus,
    ) -> Result<Booking, BookingError> {
        let (booking, _) = self
            .execute(key, BookingAction::UpdateItemsStatus { status })
            .await?;

        BookingMetrics::record_items_change(status);
        tracing::info!(
            booking_id = %booking.booking_id,
            items_delivery_status = %status,
            "Items delivery status changed"
        );

        Ok(booking)
    }

    /// Customer status lookup by booking identifier, in any letter case.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Validation`] if the identifier is malformed
    /// - [`BookingError::NotFound`] if no booking has it
    pub async fn find_by_booking_id(&self, raw: &str) -> Result<PublicBooking, BookingError> {
        let booking_id = BookingId::parse(raw)?;
        let booking = self
            .store
            .find_by_booking_id(&booking_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("Booking".to_string()))?;
        let puja = self.puja_summary(booking.puja).await?;
        Ok(booking.public_view(puja))
    }

    /// Operator lookup by storage key, with puja and pujari resolved.
    ///
    /// # Errors
    ///
    /// [`BookingError::NotFound`] if the booking is absent.
    pub async fn get(&self, key: BookingKey) -> Result<BookingDetails, BookingError> {
        let booking = self.load(key).await?;
        let puja = self.puja_summary(booking.puja).await?;
        let pujari = match booking.assigned_pujari {
            Some(id) => self.operators.find_by_id(id).await?,
            None => None,
        };
        Ok(BookingDetails {
            booking,
            puja,
            pujari,
        })
    }

    /// Filtered, paged operator listing with references resolved.
    ///
    /// # Errors
    ///
    /// [`BookingError::Store`] if the store fails.
    pub async fn list(&self, query: BookingQuery) -> Result<Page<BookingDetails>, BookingError> {
        let query = query.normalized(self.list_max_limit);
        let page = self.store.list(&query).await?;
        Ok(Page {
            items: self.resolve_all(page.items).await?,
            page: page.page,
        })
    }

    /// Dashboard counters as of now, with the recent bookings resolved.
    ///
    /// # Errors
    ///
    /// [`BookingError::Store`] if the store fails.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats<BookingDetails>, BookingError> {
        let window = StatsWindow::at(self.clock.now(), &self.calendar);
        let mut stats = self.store.stats(&window).await?;
        let recent = self.resolve_all(std::mem::take(&mut stats.recent)).await?;
        Ok(stats.with_recent(recent))
    }

    /// Audit trail of a booking, oldest first.
    ///
    /// # Errors
    ///
    /// [`BookingError::NotFound`] if the booking is absent.
    pub async fn history(&self, key: BookingKey) -> Result<Vec<RecordedEvent>, BookingError> {
        self.load(key).await?;
        Ok(self.store.history(key).await?)
    }

    async fn bookable_entry(&self, id: PujaId) -> Result<CatalogEntry, BookingError> {
        let entry = self
            .catalog
            .find_by_id(id)
            .await?
            .ok_or_else(|| BookingError::NotFound("Puja".to_string()))?;

        if !entry.is_active {
            return Err(BookingError::Inactive);
        }
        if entry.puja_type == PujaType::ComingSoon {
            return Err(BookingError::NotBookable);
        }
        Ok(entry)
    }

    async fn puja_summary(&self, id: PujaId) -> Result<Option<PujaSummary>, BookingError> {
        Ok(self
            .catalog
            .find_by_id(id)
            .await?
            .map(|entry| entry.summary()))
    }

    /// Resolves each distinct reference once.
    async fn resolve_all(
        &self,
        bookings: Vec<Booking>,
    ) -> Result<Vec<BookingDetails>, BookingError> {
        let mut pujas: HashMap<PujaId, Option<PujaSummary>> = HashMap::new();
        let mut pujaris: HashMap<PujariId, Option<PujariSummary>> = HashMap::new();
        let mut resolved = Vec::with_capacity(bookings.len());

        for booking in bookings {
            let puja = match pujas.get(&booking.puja) {
                Some(cached) => cached.clone(),
                None => {
                    let summary = self.puja_summary(booking.puja).await?;
                    pujas.insert(booking.puja, summary.clone());
                    summary
                }
            };
            let pujari = match booking.assigned_pujari {
                Some(id) => match pujaris.get(&id) {
                    Some(cached) => cached.clone(),
                    None => {
                        let summary = self.operators.find_by_id(id).await?;
                        pujaris.insert(id, summary.clone());
                        summary
                    }
                },
                None => None,
            };
            resolved.push(BookingDetails {
                booking,
                puja,
                pujari,
            });
        }

        Ok(resolved)
    }

    async fn load(&self, key: BookingKey) -> Result<Booking, BookingError> {
        self.store
            .find_by_key(key)
            .await?
            .ok_or_else(|| BookingError::NotFound("Booking".to_string()))
    }

    fn reduce(
        &self,
        state: &mut BookingState,
        action: BookingAction,
    ) -> Result<SmallVec<[BookingAction; 4]>, BookingError> {
        let events = self.reducer.reduce(state, action, &self.env);
        match state.last_error.take() {
            Some(error) => {
                BookingMetrics::record_rejected(&error);
                tracing::warn!(error = %error, "Booking command rejected");
                Err(error.into())
            }
            None => Ok(events),
        }
    }

    /// Load, reduce, persist with the version that was read.
    async fn execute(
        &self,
        key: BookingKey,
        action: BookingAction,
    ) -> Result<(Booking, SmallVec<[BookingAction; 4]>), BookingError> {
        let booking = self.load(key).await?;
        let expected_version = booking.version;

        let mut state = BookingState::loaded(booking);
        let events = self.reduce(&mut state, action)?;
        let booking = state
            .booking
            .ok_or_else(|| BookingError::Internal("command dropped the booking".to_string()))?;

        let stored = self.store.update(&booking, expected_version, &events).await?;
        Ok((stored, events))
    }
}
