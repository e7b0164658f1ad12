//! `PostgreSQL` booking store.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE bookings (
//!     key UUID PRIMARY KEY,
//!     booking_id TEXT NOT NULL UNIQUE,
//!     ...
//!     version BIGINT NOT NULL
//! );
//!
//! CREATE TABLE booking_events (
//!     booking_key UUID NOT NULL REFERENCES bookings(key),
//!     version BIGINT NOT NULL,
//!     seq SMALLINT NOT NULL,
//!     event_type TEXT NOT NULL,
//!     event_data JSONB NOT NULL,
//!     recorded_at TIMESTAMPTZ NOT NULL,
//!     PRIMARY KEY (booking_key, version, seq)
//! );
//! ```
//!
//! A booking row and the events that produced its current version are written
//! in one transaction.

use async_trait::async_trait;
use bmp_core::query::{
    BookingQuery, DashboardStats, Page, PageInfo, RecordedEvent, SortOrder, StatsWindow,
    RECENT_BOOKINGS,
};
use bmp_core::store::BookingStore;
use bmp_core::{
    Address, Booking, BookingAction, BookingId, BookingKey, BookingStatus, ItemsDeliveryStatus,
    PujaId, PujariId, StoreError,
};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, Transaction};
use uuid::Uuid;

const BOOKING_COLUMNS: &str = "key, booking_id, puja_id, customer_name, customer_mobile, \
     address, preferred_date, preferred_time, items_delivery_requested, items_delivery_status, \
     assigned_pujari, status, admin_notes, cancellation_reason, created_at, updated_at, version";

/// `PostgreSQL`-backed [`BookingStore`].
///
/// # Example
///
/// ```no_run
/// use bmp_postgres::PostgresBookingStore;
///
/// # async fn example(pool: sqlx::PgPool) {
/// let store = PostgresBookingStore::new(pool);
/// # }
/// ```
#[derive(Clone)]
pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    /// Create a store over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn append_events(
        tx: &mut Transaction<'_, Postgres>,
        key: BookingKey,
        version: u64,
        recorded_at: DateTime<Utc>,
        events: &[BookingAction],
    ) -> Result<(), StoreError> {
        for (seq, event) in events.iter().enumerate() {
            let seq = i16::try_from(seq)
                .map_err(|_| StoreError::Database("Too many events in one write".to_string()))?;
            sqlx::query(
                r"
                INSERT INTO booking_events
                    (booking_key, version, seq, event_type, event_data, recorded_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                ",
            )
            .bind(key.as_uuid())
            .bind(to_db_version(version)?)
            .bind(seq)
            .bind(event.name())
            .bind(Json(event))
            .bind(recorded_at)
            .execute(&mut **tx)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to append event: {e}")))?;
        }
        Ok(())
    }
}

#[async_trait]
impl BookingStore for PostgresBookingStore {
    async fn exists_booking_id(&self, booking_id: &BookingId) -> Result<bool, StoreError> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM bookings WHERE booking_id = $1)")
                .bind(booking_id.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| StoreError::Database(format!("Failed to check booking ID: {e}")))?;
        Ok(exists)
    }

    async fn insert_unique(&self, booking: &Booking, event: &BookingAction) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Database(format!("Failed to begin transaction: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO bookings (
                key, booking_id, puja_id, customer_name, customer_mobile, address,
                preferred_date, preferred_time, items_delivery_requested, items_delivery_status,
                assigned_pujari, status, admin_notes, cancellation_reason,
                created_at, updated_at, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ",
        )
        .bind(booking.key.as_uuid())
        .bind(booking.booking_id.as_str())
        .bind(booking.puja.as_uuid())
        .bind(&booking.customer_name)
        .bind(&booking.customer_mobile)
        .bind(Json(&booking.address))
        .bind(booking.preferred_date)
        .bind(booking.preferred_time.as_str())
        .bind(booking.items_delivery_requested)
        .bind(booking.items_delivery_status.as_str())
        .bind(booking.assigned_pujari.map(|p| *p.as_uuid()))
        .bind(booking.status.as_str())
        .bind(&booking.admin_notes)
        .bind(&booking.cancellation_reason)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .bind(to_db_version(booking.version)?)
        .execute(&mut *tx)
        .await
        .map_err(|e| insert_error(&e, booking))?;

        Self::append_events(
            &mut tx,
            booking.key,
            booking.version,
            booking.created_at,
            std::slice::from_ref(event),
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Database(format!("Failed to commit booking: {e}")))?;

        tracing::debug!(booking_id = %booking.booking_id, key = %booking.key, "Booking inserted");
        Ok(())
    }

    async fn find_by_key(&self, key: BookingKey) -> Result<Option<Booking>, StoreError> {
        let query = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE key = $1");
        let row = sqlx::query(&query)
            .bind(key.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to load booking: {e}")))?;
        row.as_ref().map(booking_from_row).transpose()
    }

    async fn find_by_booking_id(
        &self,
        booking_id: &BookingId,
    ) -> Result<Option<Booking>, StoreError> {
        let query = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_id = $1");
        let row = sqlx::query(&query)
            .bind(booking_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to load booking: {e}")))?;
        row.as_ref().map(booking_from_row).transpose()
    }

    async fn update(
        &self,
        booking: &Booking,
        expected_version: u64,
        events: &[BookingAction],
    ) -> Result<Booking, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Database(format!("Failed to begin transaction: {e}")))?;

        let next_version = expected_version + 1;
        let updated = sqlx::query(
            r"
            UPDATE bookings SET
                items_delivery_status = $3,
                assigned_pujari = $4,
                status = $5,
                admin_notes = $6,
                cancellation_reason = $7,
                updated_at = $8,
                version = $9
            WHERE key = $1 AND version = $2
            ",
        )
        .bind(booking.key.as_uuid())
        .bind(to_db_version(expected_version)?)
        .bind(booking.items_delivery_status.as_str())
        .bind(booking.assigned_pujari.map(|p| *p.as_uuid()))
        .bind(booking.status.as_str())
        .bind(&booking.admin_notes)
        .bind(&booking.cancellation_reason)
        .bind(booking.updated_at)
        .bind(to_db_version(next_version)?)
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to update booking: {e}")))?;

        if updated.rows_affected() == 0 {
            let current: Option<(i64,)> = sqlx::query_as("SELECT version FROM bookings WHERE key = $1")
                .bind(booking.key.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| StoreError::Database(format!("Failed to read version: {e}")))?;

            return Err(match current {
                None => StoreError::NotFound("Booking".to_string()),
                Some((actual,)) => {
                    metrics::counter!("bmp_store_version_conflicts_total").increment(1);
                    StoreError::ConcurrencyConflict {
                        key: booking.key.to_string(),
                        expected: expected_version,
                        actual: from_db_version(actual)?,
                    }
                }
            });
        }

        Self::append_events(&mut tx, booking.key, next_version, booking.updated_at, events).await?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Database(format!("Failed to commit update: {e}")))?;

        Ok(Booking {
            version: next_version,
            ..booking.clone()
        })
    }

    async fn list(&self, query: &BookingQuery) -> Result<Page<Booking>, StoreError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT count(*) FROM bookings WHERE TRUE");
        push_filters(&mut count, query);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to count bookings: {e}")))?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE TRUE"
        ));
        push_filters(&mut select, query);
        select.push(match query.sort {
            SortOrder::Asc => " ORDER BY created_at ASC",
            SortOrder::Desc => " ORDER BY created_at DESC",
        });
        select
            .push(" LIMIT ")
            .push_bind(i64::from(query.limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(query.offset()).unwrap_or(i64::MAX));

        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to list bookings: {e}")))?;
        let items = rows.iter().map(booking_from_row).collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            page: PageInfo::new(query.page, query.limit, u64::try_from(total).unwrap_or(0)),
        })
    }

    async fn stats(&self, window: &StatsWindow) -> Result<DashboardStats, StoreError> {
        let outstanding: Vec<String> = ItemsDeliveryStatus::ALL
            .into_iter()
            .filter(|s| s.is_outstanding())
            .map(|s| s.as_str().to_string())
            .collect();
        let terminal: Vec<String> = BookingStatus::ALL
            .into_iter()
            .filter(|s| s.is_terminal())
            .map(|s| s.as_str().to_string())
            .collect();

        let counters = sqlx::query(
            r"
            SELECT
                count(*) FILTER (WHERE created_at >= $1) AS today_bookings,
                count(*) FILTER (WHERE created_at >= $2) AS week_bookings,
                count(*) FILTER (WHERE status = $3) AS pending_assignments,
                count(*) FILTER (
                    WHERE items_delivery_requested AND items_delivery_status = ANY($4)
                ) AS items_delivery_pending,
                count(*) FILTER (
                    WHERE preferred_date >= $5 AND NOT (status = ANY($6))
                ) AS upcoming_pujas
            FROM bookings
            ",
        )
        .bind(window.today_start)
        .bind(window.week_start)
        .bind(BookingStatus::New.as_str())
        .bind(&outstanding)
        .bind(window.today)
        .bind(&terminal)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to compute stats: {e}")))?;

        let breakdown: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, count(*) FROM bookings GROUP BY status")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StoreError::Database(format!("Failed to group statuses: {e}")))?;

        let recent_query =
            format!("SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC LIMIT $1");
        let recent = sqlx::query(&recent_query)
            .bind(i64::try_from(RECENT_BOOKINGS).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to load recent bookings: {e}")))?
            .iter()
            .map(booking_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let count = |column: &str| -> Result<u64, StoreError> {
            let n: i64 = counters.try_get(column).map_err(decode_error)?;
            Ok(u64::try_from(n).unwrap_or(0))
        };

        Ok(DashboardStats {
            today_bookings: count("today_bookings")?,
            week_bookings: count("week_bookings")?,
            pending_assignments: count("pending_assignments")?,
            items_delivery_pending: count("items_delivery_pending")?,
            upcoming_pujas: count("upcoming_pujas")?,
            status_breakdown: breakdown
                .into_iter()
                .map(|(status, n)| Ok((parse_column(&status)?, u64::try_from(n).unwrap_or(0))))
                .collect::<Result<_, StoreError>>()?,
            recent,
        })
    }

    async fn history(&self, key: BookingKey) -> Result<Vec<RecordedEvent>, StoreError> {
        let rows: Vec<(i64, Json<BookingAction>, DateTime<Utc>)> = sqlx::query_as(
            r"
            SELECT version, event_data, recorded_at
            FROM booking_events
            WHERE booking_key = $1
            ORDER BY version ASC, seq ASC
            ",
        )
        .bind(key.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to load history: {e}")))?;

        rows.into_iter()
            .map(|(version, Json(event), recorded_at)| {
                Ok(RecordedEvent {
                    version: from_db_version(version)?,
                    event,
                    recorded_at,
                })
            })
            .collect()
    }
}

/// Appends the `WHERE` conditions shared by the count and page queries.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &BookingQuery) {
    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(from) = query.date_from {
        builder.push(" AND preferred_date >= ").push_bind(from);
    }
    if let Some(to) = query.date_to {
        builder.push(" AND preferred_date <= ").push_bind(to);
    }
    if let Some(term) = query.search.as_deref() {
        let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
        builder
            .push(" AND (lower(booking_id) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR lower(customer_name) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR customer_mobile LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Escapes `LIKE` wildcards so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn insert_error(err: &sqlx::Error, booking: &Booking) -> StoreError {
    if let sqlx::Error::Database(db_err) = err {
        if db_err.is_unique_violation() {
            let (field, value) = match db_err.constraint() {
                Some("bookings_pkey") => ("key", booking.key.to_string()),
                _ => ("booking_id", booking.booking_id.to_string()),
            };
            metrics::counter!("bmp_store_unique_violations_total", "field" => field).increment(1);
            return StoreError::DuplicateKey {
                field: field.to_string(),
                value,
            };
        }
    }
    StoreError::Database(format!("Failed to insert booking: {err}"))
}

fn booking_from_row(row: &PgRow) -> Result<Booking, StoreError> {
    let booking_id: String = row.try_get("booking_id").map_err(decode_error)?;
    let Json(address): Json<Address> = row.try_get("address").map_err(decode_error)?;
    let preferred_date: NaiveDate = row.try_get("preferred_date").map_err(decode_error)?;
    let preferred_time: String = row.try_get("preferred_time").map_err(decode_error)?;
    let items_status: String = row.try_get("items_delivery_status").map_err(decode_error)?;
    let status: String = row.try_get("status").map_err(decode_error)?;
    let assigned: Option<Uuid> = row.try_get("assigned_pujari").map_err(decode_error)?;

    Ok(Booking {
        key: BookingKey::from_uuid(row.try_get("key").map_err(decode_error)?),
        booking_id: BookingId::parse(&booking_id)
            .map_err(|e| StoreError::Serialization(e.to_string()))?,
        puja: PujaId::from_uuid(row.try_get("puja_id").map_err(decode_error)?),
        customer_name: row.try_get("customer_name").map_err(decode_error)?,
        customer_mobile: row.try_get("customer_mobile").map_err(decode_error)?,
        address,
        preferred_date,
        preferred_time: parse_column(&preferred_time)?,
        items_delivery_requested: row.try_get("items_delivery_requested").map_err(decode_error)?,
        items_delivery_status: parse_column(&items_status)?,
        assigned_pujari: assigned.map(PujariId::from_uuid),
        status: parse_column(&status)?,
        admin_notes: row.try_get("admin_notes").map_err(decode_error)?,
        cancellation_reason: row.try_get("cancellation_reason").map_err(decode_error)?,
        created_at: row.try_get("created_at").map_err(decode_error)?,
        updated_at: row.try_get("updated_at").map_err(decode_error)?,
        version: from_db_version(row.try_get("version").map_err(decode_error)?)?,
    })
}

fn parse_column<T>(raw: &str) -> Result<T, StoreError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e: T::Err| StoreError::Serialization(e.to_string()))
}

#[allow(clippy::needless_pass_by_value)] // used as a map_err callback
fn decode_error(err: sqlx::Error) -> StoreError {
    StoreError::Serialization(format!("Failed to decode row: {err}"))
}

fn to_db_version(version: u64) -> Result<i64, StoreError> {
    i64::try_from(version)
        .map_err(|_| StoreError::Serialization(format!("Version out of range: {version}")))
}

fn from_db_version(version: i64) -> Result<u64, StoreError> {
    u64::try_from(version)
        .map_err(|_| StoreError::Serialization(format!("Negative version: {version}")))
}
