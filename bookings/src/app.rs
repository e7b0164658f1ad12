//! Application wiring: connection pool, adapters and the booking service.

use crate::config::{BookingConfig, DatabaseConfig};
use bmp_core::environment::{Clock, RandomSource, SystemClock, ThreadRandom};
use bmp_core::store::{BookingStore, Catalog, OperatorDirectory};
use bmp_core::StoreError;
use bmp_postgres::{PostgresBookingStore, PostgresCatalog, PostgresOperatorDirectory};
use bmp_runtime::BookingService;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// Applies the booking configuration to a service over the given collaborators.
#[must_use]
pub fn build_service(
    config: &BookingConfig,
    store: Arc<dyn BookingStore>,
    catalog: Arc<dyn Catalog>,
    operators: Arc<dyn OperatorDirectory>,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
) -> BookingService {
    BookingService::new(store, catalog, operators, clock, random)
        .with_calendar(config.calendar())
        .with_retry_policy(config.retry_policy())
        .with_list_max_limit(config.list_max_limit)
}

/// Opens the `PostgreSQL` pool described by `config`.
///
/// # Errors
///
/// Returns [`StoreError::Database`] if the database is unreachable.
pub async fn connect_pool(config: &DatabaseConfig) -> Result<PgPool, StoreError> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout))
        .idle_timeout(Duration::from_secs(config.idle_timeout))
        .connect(&config.url)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to connect: {e}")))
}

/// The running application: the service plus the seedable collaborators.
pub struct App {
    /// Booking lifecycle operations
    pub service: BookingService,
    /// Puja catalog
    pub catalog: PostgresCatalog,
    /// Pujari roster
    pub operators: PostgresOperatorDirectory,
}

impl App {
    /// Connects, migrates and wires the Postgres-backed service.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the database is unreachable or a migration fails.
    pub async fn bootstrap(
        database: &DatabaseConfig,
        booking: &BookingConfig,
    ) -> Result<Self, StoreError> {
        let pool = connect_pool(database).await?;
        bmp_postgres::migrate(&pool).await?;

        let catalog = PostgresCatalog::new(pool.clone());
        let operators = PostgresOperatorDirectory::new(pool.clone());
        let service = build_service(
            booking,
            Arc::new(PostgresBookingStore::new(pool)),
            Arc::new(catalog.clone()),
            Arc::new(operators.clone()),
            Arc::new(SystemClock),
            Arc::new(ThreadRandom),
        );

        tracing::info!(
            calendar_offset = %service.calendar().offset(),
            "Booking service ready"
        );

        Ok(Self {
            service,
            catalog,
            operators,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bmp_core::query::BookingQuery;
    use bmp_core::BookingError;
    use bmp_testing::{
        fixtures, test_clock, InMemoryBookingStore, InMemoryCatalog, InMemoryOperatorDirectory,
        SeededRandom,
    };

    fn booking_config() -> BookingConfig {
        BookingConfig {
            tz_offset_minutes: 0,
            id_retry_delay_ms: 0,
            list_max_limit: 5,
        }
    }

    #[tokio::test]
    async fn configuration_reaches_the_service() {
        let store = InMemoryBookingStore::colliding();
        let puja = fixtures::bookable_puja();
        let service = build_service(
            &booking_config(),
            Arc::new(store.clone()),
            Arc::new(InMemoryCatalog::new().with_entry(puja.clone())),
            Arc::new(InMemoryOperatorDirectory::new()),
            Arc::new(test_clock()),
            Arc::new(SeededRandom::new(1)),
        );

        assert_eq!(service.calendar().offset().local_minus_utc(), 0);

        let err = service
            .create_booking(&fixtures::booking_request(puja.id, fixtures::tomorrow()))
            .await
            .unwrap_err();
        assert_eq!(err, BookingError::AllocationExhausted { attempts: 5 });
        assert_eq!(store.exists_calls(), 5);

        let page = service
            .list(BookingQuery {
                limit: 50,
                ..BookingQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(page.page.limit, 5);
    }
}
