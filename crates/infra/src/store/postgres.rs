//! Postgres-backed marketplace store.
//!
//! Each aggregate is persisted as a JSONB document next to the columns the
//! queries filter and order on. Ledger entries additionally keep `total` and
//! `reserved` as `NUMERIC` columns guarded by a check constraint, so the
//! `0 <= reserved <= total` invariant also holds at the database level.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `Concurrency` | Concurrent insert of the same ledger |
//! | Database (check constraint violation) | `23514` | `Backend` | Ledger columns out of range |
//! | Database (other) | Any other | `Backend` | Other database errors |
//! | PoolClosed | N/A | `Backend` | Connection pool was closed |
//! | Other | N/A | `Backend` | Network errors, connection failures, etc. |
//!
//! ## Thread Safety
//!
//! `PostgresMarketplaceStore` is `Send + Sync` and can be shared across threads.
//! All operations use the SQLx connection pool.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{Span, instrument};
use uuid::Uuid;

use farmlink_core::{AggregateRoot, ExpectedVersion, UserId};
use farmlink_inventory::LedgerEntry;
use farmlink_products::{LotId, ProduceLot};
use farmlink_sales::{Order, OrderId};

use super::r#trait::{MarketplaceStore, StoreError};

const SCHEMA: [&str; 5] = [
    r#"
    CREATE TABLE IF NOT EXISTS produce_lots (
        lot_id      UUID PRIMARY KEY,
        owner_id    UUID NULL,
        version     BIGINT NOT NULL,
        created_at  TIMESTAMPTZ NULL,
        document    JSONB NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        order_id    UUID PRIMARY KEY,
        lot_id      UUID NULL,
        buyer_id    UUID NULL,
        farmer_id   UUID NULL,
        status      TEXT NOT NULL,
        version     BIGINT NOT NULL,
        created_at  TIMESTAMPTZ NULL,
        document    JSONB NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS lot_ledgers (
        lot_id      UUID PRIMARY KEY,
        unit        TEXT NOT NULL,
        total       NUMERIC NOT NULL,
        reserved    NUMERIC NOT NULL,
        version     BIGINT NOT NULL,
        document    JSONB NOT NULL,
        CONSTRAINT lot_ledgers_reserved_within_total
            CHECK (reserved >= 0 AND reserved <= total)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS orders_lot_id_idx ON orders (lot_id)",
    "CREATE INDEX IF NOT EXISTS produce_lots_owner_id_idx ON produce_lots (owner_id)",
];

/// Postgres-backed marketplace store.
///
/// ## Ledger compare-and-swap
///
/// `save_ledger` never reads before writing:
/// - `Exact(0)` inserts and fails if a row already exists
/// - `Exact(n)` runs `UPDATE ... WHERE version = n` and fails if no row matched
/// - `Any` upserts
#[derive(Debug, Clone)]
pub struct PostgresMarketplaceStore {
    pool: Arc<PgPool>,
}

impl PostgresMarketplaceStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect to `database_url` and return a store over the new pool.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the tables and indexes if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    #[instrument(skip(self), fields(lot_id = %lot_id), err)]
    pub async fn fetch_lot(&self, lot_id: LotId) -> Result<Option<ProduceLot>, StoreError> {
        let row = sqlx::query("SELECT document FROM produce_lots WHERE lot_id = $1")
            .bind(lot_id.0.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_lot", e))?;

        row.map(|r| decode_document(&r)).transpose()
    }

    #[instrument(skip(self, lot), fields(lot_id = %lot.id_typed(), version = lot.version()), err)]
    pub async fn upsert_lot(&self, lot: &ProduceLot) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO produce_lots (lot_id, owner_id, version, created_at, document)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (lot_id)
            DO UPDATE SET
                owner_id = EXCLUDED.owner_id,
                version = EXCLUDED.version,
                document = EXCLUDED.document
            "#,
        )
        .bind(lot.id_typed().0.as_uuid())
        .bind(lot.owner_id().map(uuid_of))
        .bind(lot.version() as i64)
        .bind(lot.created_at())
        .bind(encode_document(lot)?)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("save_lot", e))?;

        Ok(())
    }

    #[instrument(skip(self), fields(lot_id = %lot_id), err)]
    pub async fn remove_lot(&self, lot_id: LotId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM produce_lots WHERE lot_id = $1")
            .bind(lot_id.0.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_lot", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(lot_count = tracing::field::Empty), err)]
    pub async fn fetch_lots(&self, owner_id: Option<UserId>) -> Result<Vec<ProduceLot>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT document
            FROM produce_lots
            WHERE ($1::uuid IS NULL OR owner_id = $1)
            ORDER BY created_at ASC NULLS FIRST, lot_id ASC
            "#,
        )
        .bind(owner_id.map(uuid_of))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_lots", e))?;

        let span = Span::current();
        span.record("lot_count", rows.len());
        rows.iter().map(decode_document).collect()
    }

    #[instrument(skip(self), fields(order_id = %order_id), err)]
    pub async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query("SELECT document FROM orders WHERE order_id = $1")
            .bind(order_id.0.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_order", e))?;

        row.map(|r| decode_document(&r)).transpose()
    }

    #[instrument(
        skip(self, order),
        fields(order_id = %order.id_typed(), status = %order.status()),
        err
    )]
    pub async fn upsert_order(&self, order: &Order) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO orders (
                order_id, lot_id, buyer_id, farmer_id, status, version, created_at, document
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (order_id)
            DO UPDATE SET
                status = EXCLUDED.status,
                version = EXCLUDED.version,
                document = EXCLUDED.document
            "#,
        )
        .bind(order.id_typed().0.as_uuid())
        .bind(order.lot_id().map(|l| *l.0.as_uuid()))
        .bind(order.buyer_id().map(uuid_of))
        .bind(order.farmer_id().map(uuid_of))
        .bind(order.status().as_str())
        .bind(order.version() as i64)
        .bind(order.created_at())
        .bind(encode_document(order)?)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("save_order", e))?;

        Ok(())
    }

    /// Orders matching every given filter, newest first.
    #[instrument(skip(self), fields(order_count = tracing::field::Empty), err)]
    pub async fn fetch_orders(
        &self,
        lot_id: Option<LotId>,
        buyer_id: Option<UserId>,
        farmer_id: Option<UserId>,
    ) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT document
            FROM orders
            WHERE ($1::uuid IS NULL OR lot_id = $1)
                AND ($2::uuid IS NULL OR buyer_id = $2)
                AND ($3::uuid IS NULL OR farmer_id = $3)
            ORDER BY created_at DESC NULLS LAST, order_id DESC
            "#,
        )
        .bind(lot_id.map(|l| *l.0.as_uuid()))
        .bind(buyer_id.map(uuid_of))
        .bind(farmer_id.map(uuid_of))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_orders", e))?;

        Span::current().record("order_count", rows.len());
        rows.iter().map(decode_document).collect()
    }

    #[instrument(skip(self), fields(lot_id = %lot_id), err)]
    pub async fn fetch_ledger(&self, lot_id: LotId) -> Result<Option<LedgerEntry>, StoreError> {
        let row = sqlx::query("SELECT document FROM lot_ledgers WHERE lot_id = $1")
            .bind(lot_id.0.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_ledger", e))?;

        row.map(|r| decode_document(&r)).transpose()
    }

    #[instrument(
        skip(self, entry),
        fields(
            lot_id = %entry.lot_id(),
            version = entry.version(),
            expected_version = ?expected_version
        ),
        err
    )]
    pub async fn write_ledger(
        &self,
        entry: &LedgerEntry,
        expected_version: ExpectedVersion,
    ) -> Result<(), StoreError> {
        let document = encode_document(entry)?;
        let lot_id = *entry.lot_id().0.as_uuid();
        let unit = entry.total().unit().as_str();
        let total = entry.total().value();
        let reserved = entry.reserved().value();
        let version = entry.version() as i64;

        let result = match expected_version {
            ExpectedVersion::Any => {
                sqlx::query(
                    r#"
                    INSERT INTO lot_ledgers (lot_id, unit, total, reserved, version, document)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    ON CONFLICT (lot_id)
                    DO UPDATE SET
                        unit = EXCLUDED.unit,
                        total = EXCLUDED.total,
                        reserved = EXCLUDED.reserved,
                        version = EXCLUDED.version,
                        document = EXCLUDED.document
                    "#,
                )
                .bind(lot_id)
                .bind(unit)
                .bind(total)
                .bind(reserved)
                .bind(version)
                .bind(&document)
                .execute(&*self.pool)
                .await
            }
            ExpectedVersion::Exact(0) => {
                sqlx::query(
                    r#"
                    INSERT INTO lot_ledgers (lot_id, unit, total, reserved, version, document)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    ON CONFLICT (lot_id) DO NOTHING
                    "#,
                )
                .bind(lot_id)
                .bind(unit)
                .bind(total)
                .bind(reserved)
                .bind(version)
                .bind(&document)
                .execute(&*self.pool)
                .await
            }
            ExpectedVersion::Exact(expected) => {
                sqlx::query(
                    r#"
                    UPDATE lot_ledgers
                    SET unit = $2, total = $3, reserved = $4, version = $5, document = $6
                    WHERE lot_id = $1 AND version = $7
                    "#,
                )
                .bind(lot_id)
                .bind(unit)
                .bind(total)
                .bind(reserved)
                .bind(version)
                .bind(&document)
                .bind(expected as i64)
                .execute(&*self.pool)
                .await
            }
        }
        .map_err(|e| map_sqlx_error("save_ledger", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Concurrency(format!(
                "ledger for lot {}: stored version is not {expected_version:?}",
                entry.lot_id()
            )));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(lot_id = %lot_id), err)]
    pub async fn remove_ledger(&self, lot_id: LotId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM lot_ledgers WHERE lot_id = $1")
            .bind(lot_id.0.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_ledger", e))?;
        Ok(())
    }

    // The MarketplaceStore trait is synchronous; run the async call on the
    // ambient tokio runtime.
    fn block_on<F, T>(&self, fut: F) -> Result<T, StoreError>
    where
        F: std::future::Future<Output = Result<T, StoreError>>,
    {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| {
            StoreError::Backend(
                "PostgresMarketplaceStore requires a tokio runtime; call it from within one (e.g. spawn_blocking)"
                    .to_string(),
            )
        })?;
        handle.block_on(fut)
    }
}

fn uuid_of(user_id: UserId) -> Uuid {
    *user_id.as_uuid()
}

fn encode_document<T: Serialize>(value: &T) -> Result<JsonValue, StoreError> {
    serde_json::to_value(value)
        .map_err(|e| StoreError::Serialization(format!("document encoding failed: {e}")))
}

fn decode_document<T: DeserializeOwned>(row: &PgRow) -> Result<T, StoreError> {
    let document: JsonValue = row
        .try_get("document")
        .map_err(|e| StoreError::Serialization(format!("failed to read document column: {e}")))?;
    serde_json::from_value(document)
        .map_err(|e| StoreError::Serialization(format!("document decoding failed: {e}")))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                // Unique violation: another writer created the row first.
                Some("23505") => StoreError::Concurrency(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

impl MarketplaceStore for PostgresMarketplaceStore {
    fn load_lot(&self, lot_id: LotId) -> Result<Option<ProduceLot>, StoreError> {
        self.block_on(self.fetch_lot(lot_id))
    }

    fn save_lot(&self, lot: &ProduceLot) -> Result<(), StoreError> {
        self.block_on(self.upsert_lot(lot))
    }

    fn delete_lot(&self, lot_id: LotId) -> Result<(), StoreError> {
        self.block_on(self.remove_lot(lot_id))
    }

    fn list_lots(&self) -> Result<Vec<ProduceLot>, StoreError> {
        self.block_on(self.fetch_lots(None))
    }

    fn list_lots_by_owner(&self, owner_id: UserId) -> Result<Vec<ProduceLot>, StoreError> {
        self.block_on(self.fetch_lots(Some(owner_id)))
    }

    fn load_order(&self, order_id: OrderId) -> Result<Option<Order>, StoreError> {
        self.block_on(self.fetch_order(order_id))
    }

    fn save_order(&self, order: &Order) -> Result<(), StoreError> {
        self.block_on(self.upsert_order(order))
    }

    fn load_orders_for_lot(&self, lot_id: LotId) -> Result<Vec<Order>, StoreError> {
        self.block_on(self.fetch_orders(Some(lot_id), None, None))
    }

    fn list_orders_for_buyer(&self, buyer_id: UserId) -> Result<Vec<Order>, StoreError> {
        self.block_on(self.fetch_orders(None, Some(buyer_id), None))
    }

    fn list_orders_for_farmer(&self, farmer_id: UserId) -> Result<Vec<Order>, StoreError> {
        self.block_on(self.fetch_orders(None, None, Some(farmer_id)))
    }

    fn load_ledger(&self, lot_id: LotId) -> Result<Option<LedgerEntry>, StoreError> {
        self.block_on(self.fetch_ledger(lot_id))
    }

    fn save_ledger(
        &self,
        entry: &LedgerEntry,
        expected_version: ExpectedVersion,
    ) -> Result<(), StoreError> {
        self.block_on(self.write_ledger(entry, expected_version))
    }

    fn delete_ledger(&self, lot_id: LotId) -> Result<(), StoreError> {
        self.block_on(self.remove_ledger(lot_id))
    }
}
