//! # Movement Ledger Repository
//!
//! Append-only movement history.
//!
//! ## Ledger Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every balance change writes exactly one ledger row, in the same        │
//! │  transaction that changes the balance. Rows are never updated or        │
//! │  deleted; corrections are new adjustment rows.                          │
//! │                                                                         │
//! │  stock_movements                                                        │
//! │  ┌──────────┬──────────────┬────────┬─────────┬──────┬────────┐         │
//! │  │ product  │ reference_no │ in_qty │ out_qty │ uom  │ type   │         │
//! │  ├──────────┼──────────────┼────────┼─────────┼──────┼────────┤         │
//! │  │ P-1      │ 7f3a…-1      │ 50     │ 0       │ EACH │ DEBIT  │         │
//! │  │ P-1      │ 91c2…-1      │ 0      │ 20      │ PACK │ CREDIT │         │
//! │  │ P-1      │ ADJ-04bd…    │ 3      │ 0       │ EACH │ DEBIT  │         │
//! │  └──────────┴──────────────┴────────┴─────────┴──────┴────────┘         │
//! │                                                                         │
//! │  Readers see history newest-first, filtered by product and/or type.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use stockroom_core::{MovementFilter, MovementRecord};

const MOVEMENT_COLUMNS: &str = "id, product_id, reference_no, in_qty, out_qty, uom, \
                                movement_type, remark, created_at";

/// Repository for movement ledger operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = MovementLedgerRepository::new(pool);
///
/// // One product's history, newest first
/// let history = repo.query(&MovementFilter::for_product("P-1")).await?;
///
/// // All credits across products
/// let credits = repo.query(&MovementFilter::of_type(MovementType::Credit)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct MovementLedgerRepository {
    pool: SqlitePool,
}

impl MovementLedgerRepository {
    /// Creates a new MovementLedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MovementLedgerRepository { pool }
    }

    /// Appends one movement record inside the caller's transaction.
    ///
    /// The executor calls this in the same transaction that mutates the
    /// balance row, so the ledger and the balances commit or roll back
    /// together.
    pub async fn append(
        &self,
        conn: &mut SqliteConnection,
        record: &MovementRecord,
    ) -> DbResult<()> {
        debug!(
            product_id = %record.product_id,
            reference_no = %record.reference_no,
            movement_type = %record.movement_type,
            in_qty = record.in_qty,
            out_qty = record.out_qty,
            "Appending movement record"
        );

        sqlx::query(
            "INSERT INTO stock_movements \
             (id, product_id, reference_no, in_qty, out_qty, uom, movement_type, remark, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&record.id)
        .bind(&record.product_id)
        .bind(&record.reference_no)
        .bind(record.in_qty)
        .bind(record.out_qty)
        .bind(&record.uom)
        .bind(record.movement_type)
        .bind(&record.remark)
        .bind(record.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Reads ledger history newest-first.
    ///
    /// ## Arguments
    /// * `filter` - Product and/or movement type restriction; an empty
    ///   filter returns the full ledger
    ///
    /// Rows sharing a timestamp (one document's lines) keep reverse
    /// insertion order via the rowid tiebreak.
    pub async fn query(&self, filter: &MovementFilter) -> DbResult<Vec<MovementRecord>> {
        let mut sql = format!("SELECT {MOVEMENT_COLUMNS} FROM stock_movements");

        let mut clauses: Vec<&str> = Vec::new();
        if filter.product_id.is_some() {
            clauses.push("product_id = ?");
        }
        if filter.movement_type.is_some() {
            clauses.push("movement_type = ?");
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at DESC, rowid DESC");

        let mut query = sqlx::query_as::<_, MovementRecord>(&sql);
        if let Some(product_id) = &filter.product_id {
            query = query.bind(product_id);
        }
        if let Some(movement_type) = filter.movement_type {
            query = query.bind(movement_type);
        }

        let records = query.fetch_all(&self.pool).await?;

        debug!(count = records.len(), "Ledger query returned records");
        Ok(records)
    }

    /// Counts ledger rows (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_movements")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
