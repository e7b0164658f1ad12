//! # BMP Testing
//!
//! Testing utilities for the booking lifecycle engine.
//!
//! This crate provides:
//! - Deterministic implementations of the environment traits (clock, randomness)
//! - In-memory implementations of the store and collaborator traits
//! - The [`ReducerTest`] Given-When-Then helper
//! - Fixtures for catalog entries and booking requests
//!
//! ## Example
//!
//! ```ignore
//! use bmp_testing::{fixtures, test_clock, InMemoryBookingStore, InMemoryCatalog, SeededRandom};
//!
//! #[tokio::test]
//! async fn creates_a_booking() {
//!     let puja = fixtures::bookable_puja();
//!     let catalog = InMemoryCatalog::new().with_entry(puja.clone());
//!     let service = BookingService::new(
//!         Arc::new(InMemoryBookingStore::new()),
//!         Arc::new(catalog),
//!         Arc::new(InMemoryOperatorDirectory::new()),
//!         Arc::new(test_clock()),
//!         Arc::new(SeededRandom::new(7)),
//!     );
//!
//!     let details = service
//!         .create_booking(&fixtures::booking_request(puja.id, fixtures::tomorrow()))
//!         .await
//!         .unwrap();
//!     assert_eq!(details.booking.status, BookingStatus::New);
//! }
//! ```

use bmp_core::environment::{Clock, RandomSource};
use chrono::{DateTime, Utc};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, RandomSource, Utc};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Mutex, PoisonError};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use bmp_testing::mocks::FixedClock;
    /// use bmp_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2026-02-11 04:00:00 UTC, 09:30 in India)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2026-02-11T04:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Seeded random source: reproducible but well spread.
    #[derive(Debug)]
    pub struct SeededRandom {
        rng: Mutex<StdRng>,
    }

    impl SeededRandom {
        /// Create a random source from a seed
        #[must_use]
        pub fn new(seed: u64) -> Self {
            Self {
                rng: Mutex::new(StdRng::seed_from_u64(seed)),
            }
        }
    }

    impl RandomSource for SeededRandom {
        fn next_index(&self, bound: usize) -> usize {
            if bound == 0 {
                return 0;
            }
            self.rng
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .gen_range(0..bound)
        }
    }

    /// Random source replaying a fixed sequence of indices, cycling at the end.
    ///
    /// # Example
    ///
    /// ```
    /// use bmp_testing::mocks::ScriptedRandom;
    /// use bmp_core::environment::RandomSource;
    ///
    /// let random = ScriptedRandom::new([0, 29]);
    /// assert_eq!(random.next_index(36), 0);
    /// assert_eq!(random.next_index(36), 29);
    /// assert_eq!(random.next_index(36), 0);
    /// ```
    #[derive(Debug)]
    pub struct ScriptedRandom {
        indices: Vec<usize>,
        cursor: AtomicUsize,
    }

    impl ScriptedRandom {
        /// Create a scripted source; an empty script always yields 0
        #[must_use]
        pub fn new(indices: impl IntoIterator<Item = usize>) -> Self {
            Self {
                indices: indices.into_iter().collect(),
                cursor: AtomicUsize::new(0),
            }
        }

        /// Script that spells `suffix` over the booking identifier alphabet
        #[must_use]
        pub fn spelling(suffix: &str) -> Self {
            Self::new(suffix.bytes().map(|b| {
                bmp_core::identifier::SUFFIX_ALPHABET
                    .iter()
                    .position(|&symbol| symbol == b.to_ascii_uppercase())
                    .unwrap_or(0)
            }))
        }
    }

    impl RandomSource for ScriptedRandom {
        fn next_index(&self, bound: usize) -> usize {
            if self.indices.is_empty() || bound == 0 {
                return 0;
            }
            let i = self.cursor.fetch_add(1, Ordering::SeqCst);
            self.indices[i % self.indices.len()] % bound
        }
    }
}

/// Ergonomic reducer testing
pub mod reducer_test;

/// In-memory store and collaborators
pub mod memory;

/// Fixtures for catalog entries and booking requests
pub mod fixtures;

// Re-export commonly used items
pub use memory::{InMemoryBookingStore, InMemoryCatalog, InMemoryOperatorDirectory};
pub use mocks::{test_clock, FixedClock, ScriptedRandom, SeededRandom};
pub use reducer_test::{assertions, ReducerTest};
