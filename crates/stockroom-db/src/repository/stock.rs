//! # Stock Account Repository
//!
//! Database operations for per-product balance rows.
//!
//! ## Key Operations
//! - Onboarding (create) and balance reads
//! - Row locking for the posting flow
//! - Stock overview and reorder reports
//!
//! ## Row Locking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Pessimistic Lock Strategy                            │
//! │                                                                         │
//! │  ❌ WRONG: read balances, decide, then write                            │
//! │     SELECT base_qty ...          (posting A reads 2)                    │
//! │     SELECT base_qty ...          (posting B reads 2)                    │
//! │     UPDATE ... SET base_qty = 0  (A spends both cartons)                │
//! │     UPDATE ... SET base_qty = 0  (B spends them AGAIN → oversell)       │
//! │                                                                         │
//! │  ✅ CORRECT: write first, then read under the write lock                │
//! │     UPDATE stock_accounts SET updated_at = ? WHERE product_id = ?       │
//! │     ── takes SQLite's write lock before any balance is read;            │
//! │        a second posting blocks here (busy_timeout) until commit         │
//! │     SELECT ... WHERE product_id = ?                                     │
//! │     ── balances read inside the transaction are now authoritative       │
//! │                                                                         │
//! │  The touch also doubles as the existence check: zero rows affected      │
//! │  means the product was never onboarded.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockroom_core::{StockAccount, StockOverview};

const ACCOUNT_COLUMNS: &str =
    "product_id, base_qty, derived_qty, reorder_level, created_at, updated_at";

/// Repository for stock account database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = StockAccountRepository::new(pool);
///
/// // Onboard a product
/// repo.create(&StockAccount::new("P-1", 0, 0, 10)).await?;
///
/// // Read a balance
/// let account = repo.get("P-1").await?;
/// ```
#[derive(Debug, Clone)]
pub struct StockAccountRepository {
    pool: SqlitePool,
}

impl StockAccountRepository {
    /// Creates a new StockAccountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockAccountRepository { pool }
    }

    /// Onboards a product by inserting its balance row.
    ///
    /// ## Arguments
    /// * `account` - Opening balances; quantities must be non-negative
    ///
    /// ## Returns
    /// * `Ok(())` - Account created
    /// * `Err(DbError::UniqueViolation)` - Product already onboarded
    pub async fn create(&self, account: &StockAccount) -> DbResult<()> {
        debug!(product_id = %account.product_id, "Creating stock account");

        sqlx::query(
            "INSERT INTO stock_accounts \
             (product_id, base_qty, derived_qty, reorder_level, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&account.product_id)
        .bind(account.base_qty)
        .bind(account.derived_qty)
        .bind(account.reorder_level)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a product's balance row.
    ///
    /// ## Returns
    /// * `Ok(Some(StockAccount))` - Account found
    /// * `Ok(None)` - Product was never onboarded
    pub async fn get(&self, product_id: &str) -> DbResult<Option<StockAccount>> {
        let account = sqlx::query_as::<_, StockAccount>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM stock_accounts WHERE product_id = ?1"
        ))
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Locks a product's balance row for the current transaction and
    /// returns it.
    ///
    /// Must be the first statement touching stock state in the posting
    /// transaction; see the module docs for why the write comes first.
    ///
    /// ## Returns
    /// * `Ok(Some(StockAccount))` - Row locked, balances authoritative
    /// * `Ok(None)` - Product was never onboarded (nothing to lock)
    pub async fn lock_for_update(
        &self,
        conn: &mut SqliteConnection,
        product_id: &str,
    ) -> DbResult<Option<StockAccount>> {
        let now = Utc::now();

        let touched = sqlx::query("UPDATE stock_accounts SET updated_at = ?2 WHERE product_id = ?1")
            .bind(product_id)
            .bind(now)
            .execute(&mut *conn)
            .await?;

        if touched.rows_affected() == 0 {
            return Ok(None);
        }

        let account = sqlx::query_as::<_, StockAccount>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM stock_accounts WHERE product_id = ?1"
        ))
        .bind(product_id)
        .fetch_one(&mut *conn)
        .await?;

        debug!(
            product_id = %product_id,
            base_qty = account.base_qty,
            derived_qty = account.derived_qty,
            "Locked stock account"
        );

        Ok(Some(account))
    }

    /// Persists mutated balances inside the caller's transaction.
    ///
    /// ## Returns
    /// * `Ok(())` - Balances written
    /// * `Err(DbError::NotFound)` - Account row vanished mid-transaction
    pub async fn save(
        &self,
        conn: &mut SqliteConnection,
        account: &StockAccount,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE stock_accounts \
             SET base_qty = ?2, derived_qty = ?3, reorder_level = ?4, updated_at = ?5 \
             WHERE product_id = ?1",
        )
        .bind(&account.product_id)
        .bind(account.base_qty)
        .bind(account.derived_qty)
        .bind(account.reorder_level)
        .bind(account.updated_at)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("StockAccount", &account.product_id));
        }

        Ok(())
    }

    /// Sets a product's reorder level.
    ///
    /// ## Returns
    /// * `Ok(())` - Level updated
    /// * `Err(DbError::NotFound)` - Product was never onboarded
    pub async fn set_reorder_level(&self, product_id: &str, level: i64) -> DbResult<()> {
        debug!(product_id = %product_id, level = level, "Setting reorder level");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE stock_accounts SET reorder_level = ?2, updated_at = ?3 WHERE product_id = ?1",
        )
        .bind(product_id)
        .bind(level)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("StockAccount", product_id));
        }

        Ok(())
    }

    /// Lists all stock balances joined with their unit configuration,
    /// ordered by product id.
    pub async fn list(&self) -> DbResult<Vec<StockOverview>> {
        let rows = sqlx::query_as::<_, StockOverview>(
            "SELECT \
                 a.product_id, c.base_unit, a.base_qty, \
                 c.derive_unit, a.derived_qty, a.reorder_level, c.factor \
             FROM stock_accounts a \
             INNER JOIN unit_conversions c ON c.product_id = a.product_id \
             ORDER BY a.product_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Lists products whose base balance has fallen to or below their
    /// reorder level.
    ///
    /// ## Usage
    /// Drives the restocking report. Loose derived units are ignored;
    /// reordering is decided on whole base units.
    pub async fn below_reorder_level(&self) -> DbResult<Vec<StockOverview>> {
        let rows = sqlx::query_as::<_, StockOverview>(
            "SELECT \
                 a.product_id, c.base_unit, a.base_qty, \
                 c.derive_unit, a.derived_qty, a.reorder_level, c.factor \
             FROM stock_accounts a \
             INNER JOIN unit_conversions c ON c.product_id = a.product_id \
             WHERE a.base_qty <= a.reorder_level \
             ORDER BY a.product_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Counts onboarded products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_accounts")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
