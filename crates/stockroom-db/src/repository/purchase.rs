//! # Purchase Repository
//!
//! Database operations for posted purchase documents, mirroring the
//! sale repository shape.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use stockroom_core::{Purchase, PurchaseLine};

const PURCHASE_COLUMNS: &str = "id, purchase_date, supplier_name, total_cents, created_at";

const PURCHASE_LINE_COLUMNS: &str = "id, purchase_id, line_no, product_id, qty, uom, \
                                     unit_price_cents, line_total_cents, created_at";

/// Repository for purchase document database operations.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Inserts a purchase header inside the caller's transaction.
    pub async fn insert_header(
        &self,
        conn: &mut SqliteConnection,
        purchase: &Purchase,
    ) -> DbResult<()> {
        debug!(
            purchase_id = %purchase.id,
            supplier = %purchase.supplier_name,
            "Inserting purchase header"
        );

        sqlx::query(
            "INSERT INTO purchases (id, purchase_date, supplier_name, total_cents, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&purchase.id)
        .bind(purchase.purchase_date)
        .bind(&purchase.supplier_name)
        .bind(purchase.total_cents)
        .bind(purchase.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts one purchase line inside the caller's transaction.
    pub async fn insert_line(
        &self,
        conn: &mut SqliteConnection,
        line: &PurchaseLine,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO purchase_lines \
             (id, purchase_id, line_no, product_id, qty, uom, unit_price_cents, line_total_cents, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&line.id)
        .bind(&line.purchase_id)
        .bind(line.line_no)
        .bind(&line.product_id)
        .bind(line.qty)
        .bind(&line.uom)
        .bind(line.unit_price_cents)
        .bind(line.line_total_cents)
        .bind(line.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Gets a purchase header by ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Purchase))` - Purchase found
    /// * `Ok(None)` - No such purchase
    pub async fn get(&self, id: &str) -> DbResult<Option<Purchase>> {
        let purchase = sqlx::query_as::<_, Purchase>(&format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(purchase)
    }

    /// Gets a purchase's lines in line order.
    pub async fn get_lines(&self, purchase_id: &str) -> DbResult<Vec<PurchaseLine>> {
        let lines = sqlx::query_as::<_, PurchaseLine>(&format!(
            "SELECT {PURCHASE_LINE_COLUMNS} FROM purchase_lines \
             WHERE purchase_id = ?1 ORDER BY line_no"
        ))
        .bind(purchase_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Lists recent purchases, newest first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Purchase>> {
        let purchases = sqlx::query_as::<_, Purchase>(&format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases ORDER BY created_at DESC, rowid DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(purchases)
    }
}
