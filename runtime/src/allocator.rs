//! Concurrency-safe allocation of human-readable booking identifiers.
//!
//! Candidates come from [`BookingId::candidate`]; the allocator only adds the
//! storage check and the bounded retry loop. The existence check is advisory:
//! two callers can pass it with the same candidate, so the store's unique
//! constraint is the real guard and the creation flow feeds insert-time
//! duplicates back into [`IdentifierAllocator::allocate_from`].

use crate::metrics::AllocationMetrics;
use crate::retry::RetryPolicy;
use bmp_core::environment::RandomSource;
use bmp_core::store::BookingStore;
use bmp_core::{BookingError, BookingId, NaiveDate};
use std::sync::Arc;

/// Allocates unused booking identifiers for a given date.
#[derive(Clone)]
pub struct IdentifierAllocator {
    store: Arc<dyn BookingStore>,
    random: Arc<dyn RandomSource>,
    policy: RetryPolicy,
}

impl IdentifierAllocator {
    /// Creates an allocator with the default policy (5 attempts, no delay).
    #[must_use]
    pub fn new(store: Arc<dyn BookingStore>, random: Arc<dyn RandomSource>) -> Self {
        Self {
            store,
            random,
            policy: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The attempt budget.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.policy.max_attempts
    }

    /// Allocates an identifier for `date` with a fresh attempt budget.
    ///
    /// # Errors
    ///
    /// - [`BookingError::AllocationExhausted`] if every candidate collided
    /// - [`BookingError::Store`] if the existence check fails
    pub async fn allocate(&self, date: NaiveDate) -> Result<BookingId, BookingError> {
        self.allocate_from(date, 0).await.map(|(id, _)| id)
    }

    /// Allocates an identifier when `consumed` attempts of the budget are already spent.
    ///
    /// Returns the identifier and the number of attempts spent in total.
    ///
    /// # Errors
    ///
    /// Same as [`IdentifierAllocator::allocate`].
    pub async fn allocate_from(
        &self,
        date: NaiveDate,
        consumed: u32,
    ) -> Result<(BookingId, u32), BookingError> {
        let max_attempts = self.policy.max_attempts;
        let mut attempt = consumed;

        while attempt < max_attempts {
            if attempt > 0 {
                self.policy.pause(attempt - 1).await;
            }
            attempt += 1;

            let candidate = BookingId::candidate(date, self.random.as_ref());
            if !self.store.exists_booking_id(&candidate).await? {
                tracing::debug!(booking_id = %candidate, attempt, "Allocated booking ID");
                return Ok((candidate, attempt));
            }

            AllocationMetrics::record_collision();
            tracing::warn!(
                booking_id = %candidate,
                attempt,
                max_attempts,
                "Booking ID collision, retrying"
            );
        }

        AllocationMetrics::record_exhausted();
        tracing::error!(%date, max_attempts, "Booking ID allocation exhausted");
        Err(BookingError::AllocationExhausted {
            attempts: max_attempts,
        })
    }
}
