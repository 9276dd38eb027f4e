//! # Sale Repository
//!
//! Database operations for posted sale documents.
//!
//! Headers and lines are inserted by the executor inside the posting
//! transaction; a sale that fails any stock check leaves no document
//! behind. Reads go through the pool.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use stockroom_core::{Sale, SaleLine};

const SALE_COLUMNS: &str = "id, sale_date, customer_name, total_cents, created_at";

const SALE_LINE_COLUMNS: &str = "id, sale_id, line_no, product_id, qty, uom, \
                                 unit_price_cents, line_total_cents, created_at";

/// Repository for sale document database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = SaleRepository::new(pool);
/// let sale = repo.get("uuid-here").await?;
/// let lines = repo.get_lines("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Inserts a sale header inside the caller's transaction.
    pub async fn insert_header(
        &self,
        conn: &mut SqliteConnection,
        sale: &Sale,
    ) -> DbResult<()> {
        debug!(sale_id = %sale.id, customer = %sale.customer_name, "Inserting sale header");

        sqlx::query(
            "INSERT INTO sales (id, sale_date, customer_name, total_cents, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&sale.id)
        .bind(sale.sale_date)
        .bind(&sale.customer_name)
        .bind(sale.total_cents)
        .bind(sale.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts one sale line inside the caller's transaction.
    pub async fn insert_line(
        &self,
        conn: &mut SqliteConnection,
        line: &SaleLine,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO sale_lines \
             (id, sale_id, line_no, product_id, qty, uom, unit_price_cents, line_total_cents, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&line.id)
        .bind(&line.sale_id)
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

    /// Gets a sale header by ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Sale))` - Sale found
    /// * `Ok(None)` - No such sale
    pub async fn get(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets a sale's lines in line order.
    pub async fn get_lines(&self, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        let lines = sqlx::query_as::<_, SaleLine>(&format!(
            "SELECT {SALE_LINE_COLUMNS} FROM sale_lines WHERE sale_id = ?1 ORDER BY line_no"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Lists recent sales, newest first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at DESC, rowid DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }
}
