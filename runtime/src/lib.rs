//! # BMP Runtime
//!
//! Imperative shell of the booking lifecycle engine.
//!
//! This crate wires the pure reducer from `bmp-core` to storage and the
//! read-only collaborators, and adds the parts that need I/O or time:
//!
//! - **Service**: [`BookingService`] runs every booking operation as
//!   load → reduce → persist with an optimistic version check
//! - **Allocator**: [`IdentifierAllocator`] finds an unused `BMP-YYYYMMDD-XXXX`
//!   identifier within a bounded number of attempts
//! - **Retry**: [`RetryPolicy`] paces allocation retries
//! - **Metrics**: Prometheus counters for lifecycle transitions and allocation
//!
//! ## Example
//!
//! ```ignore
//! use bmp_runtime::{BookingService, StatusUpdate};
//!
//! let service = BookingService::new(store, catalog, operators, clock, random);
//!
//! let details = service.create_booking(&request).await?;
//! let key = details.booking.key;
//!
//! service.assign(key, &pujari_id.to_string()).await?;
//! service.apply_status(key, StatusUpdate::to(BookingStatus::Confirmed)).await?;
//! ```

/// Identifier allocation with bounded retries
pub mod allocator;

/// Prometheus metrics for observability
pub mod metrics;

/// Retry policy with exponential backoff
pub mod retry;

/// Booking lifecycle operations
pub mod service;

pub use allocator::IdentifierAllocator;
pub use retry::RetryPolicy;
pub use service::{BookingService, StatusUpdate};
