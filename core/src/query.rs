//! Read-side models: listing queries, pages, dashboard statistics and the
//! recorded audit trail.
//!
//! The filtering and aggregation rules live here as plain functions over
//! [`Booking`] values so every store adapter agrees on their meaning; the
//! in-memory store uses them directly and the Postgres store mirrors them in SQL.

use crate::aggregate::BookingAction;
use crate::booking::Booking;
use crate::environment::BusinessCalendar;
use crate::status::BookingStatus;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default page size for listings
pub const DEFAULT_PAGE_LIMIT: u32 = 20;
/// Upper bound on page size for listings
pub const MAX_PAGE_LIMIT: u32 = 100;
/// Number of recent bookings on the dashboard
pub const RECENT_BOOKINGS: usize = 10;
/// Length of the dashboard's weekly window in days
pub const WEEK_DAYS: i64 = 7;

/// Ordering of listings by creation time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Oldest first
    Asc,
    /// Newest first
    #[default]
    Desc,
}

/// Filters and paging for the operator listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingQuery {
    /// Only bookings in this status; `None` means all
    pub status: Option<BookingStatus>,
    /// Case-insensitive substring over booking id, customer name and mobile
    pub search: Option<String>,
    /// Earliest preferred date, inclusive
    pub date_from: Option<NaiveDate>,
    /// Latest preferred date, inclusive
    pub date_to: Option<NaiveDate>,
    /// Creation-time ordering
    pub sort: SortOrder,
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub limit: u32,
}

impl Default for BookingQuery {
    fn default() -> Self {
        Self {
            status: None,
            search: None,
            date_from: None,
            date_to: None,
            sort: SortOrder::Desc,
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl BookingQuery {
    /// Clamps paging into range and drops a blank search term.
    #[must_use]
    pub fn normalized(mut self, max_limit: u32) -> Self {
        self.page = self.page.max(1);
        self.limit = match self.limit {
            0 => DEFAULT_PAGE_LIMIT.min(max_limit.max(1)),
            n => n.min(max_limit.max(1)),
        };
        self.search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        self
    }

    /// Whether `booking` passes every filter.
    #[must_use]
    pub fn matches(&self, booking: &Booking) -> bool {
        if self.status.is_some_and(|status| booking.status != status) {
            return false;
        }
        if self.date_from.is_some_and(|from| booking.preferred_date < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| booking.preferred_date > to) {
            return false;
        }
        match self.search.as_deref() {
            Some(term) => {
                let term = term.to_lowercase();
                booking.booking_id.as_str().to_lowercase().contains(&term)
                    || booking.customer_name.to_lowercase().contains(&term)
                    || booking.customer_mobile.contains(&term)
            }
            None => true,
        }
    }

    /// Number of rows skipped before this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// Runs the query over an in-memory collection.
    #[must_use]
    pub fn apply<'a, I>(&self, bookings: I) -> Page<Booking>
    where
        I: IntoIterator<Item = &'a Booking>,
    {
        let mut matching: Vec<&Booking> = bookings.into_iter().filter(|b| self.matches(b)).collect();
        matching.sort_by(|a, b| match self.sort {
            SortOrder::Asc => a.created_at.cmp(&b.created_at),
            SortOrder::Desc => b.created_at.cmp(&a.created_at),
        });

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(usize::try_from(self.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(self.limit).unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Page {
            items,
            page: PageInfo::new(self.page, self.limit, total),
        }
    }
}

/// Paging metadata of a listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Current page, 1-based
    pub current: u32,
    /// Total number of pages
    pub pages: u64,
    /// Total number of matching rows
    pub total: u64,
    /// Page size
    pub limit: u32,
}

impl PageInfo {
    /// Computes the page count for `total` rows.
    #[must_use]
    pub fn new(current: u32, limit: u32, total: u64) -> Self {
        let pages = if limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(limit))
        };
        Self {
            current,
            pages,
            total,
            limit,
        }
    }
}

/// One page of results.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Rows on this page
    pub items: Vec<T>,
    /// Paging metadata
    pub page: PageInfo,
}

/// The instants that bound dashboard counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatsWindow {
    /// Current business date
    pub today: NaiveDate,
    /// Start of today in the business calendar
    pub today_start: DateTime<Utc>,
    /// Start of the weekly window
    pub week_start: DateTime<Utc>,
}

impl StatsWindow {
    /// Window ending at `now` in `calendar`.
    #[must_use]
    pub fn at(now: DateTime<Utc>, calendar: &BusinessCalendar) -> Self {
        let today = calendar.date_of(now);
        let today_start = calendar.start_of_day(today);
        Self {
            today,
            today_start,
            week_start: today_start - Duration::days(WEEK_DAYS),
        }
    }
}

/// Operations dashboard counters.
///
/// Stores report the recent rows as plain [`Booking`]s; the service swaps in
/// resolved rows with [`DashboardStats::with_recent`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats<R = Booking> {
    /// Bookings created today
    pub today_bookings: u64,
    /// Bookings created in the weekly window
    pub week_bookings: u64,
    /// Bookings still waiting for an operator
    pub pending_assignments: u64,
    /// Requested deliveries not yet dispatched
    pub items_delivery_pending: u64,
    /// Non-terminal bookings scheduled today or later
    pub upcoming_pujas: u64,
    /// Count per status; statuses without bookings are omitted
    pub status_breakdown: BTreeMap<BookingStatus, u64>,
    /// Most recently created bookings, newest first
    pub recent: Vec<R>,
}

impl<R> Default for DashboardStats<R> {
    fn default() -> Self {
        Self {
            today_bookings: 0,
            week_bookings: 0,
            pending_assignments: 0,
            items_delivery_pending: 0,
            upcoming_pujas: 0,
            status_breakdown: BTreeMap::new(),
            recent: Vec::new(),
        }
    }
}

impl<R> DashboardStats<R> {
    /// Same counters with `recent` replaced.
    #[must_use]
    pub fn with_recent<S>(self, recent: Vec<S>) -> DashboardStats<S> {
        DashboardStats {
            today_bookings: self.today_bookings,
            week_bookings: self.week_bookings,
            pending_assignments: self.pending_assignments,
            items_delivery_pending: self.items_delivery_pending,
            upcoming_pujas: self.upcoming_pujas,
            status_breakdown: self.status_breakdown,
            recent,
        }
    }
}

impl DashboardStats {
    /// Aggregates statistics over an in-memory collection.
    #[must_use]
    pub fn from_bookings<'a, I>(bookings: I, window: &StatsWindow) -> Self
    where
        I: IntoIterator<Item = &'a Booking>,
    {
        let mut stats = Self::default();
        let mut all: Vec<&Booking> = Vec::new();

        for booking in bookings {
            if booking.created_at >= window.today_start {
                stats.today_bookings += 1;
            }
            if booking.created_at >= window.week_start {
                stats.week_bookings += 1;
            }
            if booking.status == BookingStatus::New {
                stats.pending_assignments += 1;
            }
            if booking.items_delivery_requested && booking.items_delivery_status.is_outstanding() {
                stats.items_delivery_pending += 1;
            }
            if booking.preferred_date >= window.today && !booking.status.is_terminal() {
                stats.upcoming_pujas += 1;
            }
            *stats.status_breakdown.entry(booking.status).or_insert(0) += 1;
            all.push(booking);
        }

        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        stats.recent = all.into_iter().take(RECENT_BOOKINGS).cloned().collect();
        stats
    }
}

/// One entry of a booking's audit trail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedEvent {
    /// Booking version the event produced
    pub version: u64,
    /// The event
    pub event: BookingAction,
    /// When it was stored
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::identifier::BookingId;
    use crate::status::ItemsDeliveryStatus;
    use crate::types::{Address, BookingKey, PujaId, TimeSlot};
    use crate::validation::NewBooking;
    use chrono::TimeZone;

    fn booking(suffix: &str, name: &str, created_day: u32, preferred_day: u32) -> Booking {
        let draft = NewBooking {
            puja: PujaId::new(),
            customer_name: name.to_string(),
            customer_mobile: "9876543210".to_string(),
            address: Address::default(),
            preferred_date: NaiveDate::from_ymd_opt(2026, 2, preferred_day).unwrap(),
            preferred_time: TimeSlot::Morning,
            items_delivery_requested: true,
        };
        Booking::materialize(
            BookingKey::new(),
            BookingId::parse(&format!("BMP-202602{created_day:02}-{suffix}")).unwrap(),
            draft,
            Utc.with_ymd_and_hms(2026, 2, created_day, 6, 0, 0).unwrap(),
        )
    }

    #[test]
    fn normalized_clamps_paging() {
        let query = BookingQuery {
            page: 0,
            limit: 500,
            search: Some("   ".to_string()),
            ..BookingQuery::default()
        }
        .normalized(MAX_PAGE_LIMIT);
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, MAX_PAGE_LIMIT);
        assert_eq!(query.search, None);
    }

    #[test]
    fn search_is_case_insensitive_over_id_and_name() {
        let b = booking("A3F7", "Asha Kulkarni", 10, 20);
        let by_id = BookingQuery {
            search: Some("bmp-20260210-a3".to_string()),
            ..BookingQuery::default()
        };
        let by_name = BookingQuery {
            search: Some("KULKARNI".to_string()),
            ..BookingQuery::default()
        };
        let miss = BookingQuery {
            search: Some("ravi".to_string()),
            ..BookingQuery::default()
        };
        assert!(by_id.matches(&b));
        assert!(by_name.matches(&b));
        assert!(!miss.matches(&b));
    }

    #[test]
    fn apply_sorts_and_pages() {
        let bookings = [
            booking("AAAA", "First", 1, 20),
            booking("BBBB", "Second", 2, 21),
            booking("CCCC", "Third", 3, 22),
        ];
        let page = BookingQuery {
            limit: 2,
            ..BookingQuery::default()
        }
        .apply(&bookings);

        assert_eq!(page.page.total, 3);
        assert_eq!(page.page.pages, 2);
        assert_eq!(page.items[0].customer_name, "Third");

        let second = BookingQuery {
            limit: 2,
            page: 2,
            sort: SortOrder::Asc,
            ..BookingQuery::default()
        }
        .apply(&bookings);
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].customer_name, "Third");
    }

    #[test]
    fn date_range_is_inclusive() {
        let b = booking("AAAA", "First", 1, 20);
        let query = BookingQuery {
            date_from: NaiveDate::from_ymd_opt(2026, 2, 20),
            date_to: NaiveDate::from_ymd_opt(2026, 2, 20),
            ..BookingQuery::default()
        };
        assert!(query.matches(&b));
    }

    #[test]
    fn dashboard_counts() {
        let mut cancelled = booking("CCCC", "Cancelled", 10, 25);
        cancelled.status = BookingStatus::Cancelled;
        let mut delivered = booking("DDDD", "Delivered", 1, 5);
        delivered.status = BookingStatus::Completed;
        delivered.items_delivery_status = ItemsDeliveryStatus::Delivered;
        let bookings = [booking("AAAA", "Today", 10, 20), cancelled, delivered];

        let now = Utc.with_ymd_and_hms(2026, 2, 10, 12, 0, 0).unwrap();
        let window = StatsWindow::at(now, &BusinessCalendar::utc());
        let stats = DashboardStats::from_bookings(&bookings, &window);

        assert_eq!(stats.today_bookings, 2);
        assert_eq!(stats.week_bookings, 2);
        assert_eq!(stats.pending_assignments, 1);
        assert_eq!(stats.items_delivery_pending, 2);
        assert_eq!(stats.upcoming_pujas, 1);
        assert_eq!(stats.status_breakdown.get(&BookingStatus::Cancelled), Some(&1));
        assert_eq!(stats.recent.len(), 3);
    }
}
