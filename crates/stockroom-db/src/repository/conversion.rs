//! # Unit Conversion Repository
//!
//! Database operations for per-product unit configuration.
//!
//! A product's conversion row is its unit contract: one `base_unit`
//! breaks into `factor` units of `derive_unit`. The posting flow reads
//! it inside the posting transaction so a concurrent reconfiguration
//! cannot slip between classification and balance mutation.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockroom_core::UnitConversion;

const CONVERSION_COLUMNS: &str =
    "product_id, base_unit, derive_unit, factor, created_at, updated_at";

/// Repository for unit conversion database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = UnitConversionRepository::new(pool);
/// repo.create(&UnitConversion::new("P-1", "EACH", "PACK", 12)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct UnitConversionRepository {
    pool: SqlitePool,
}

impl UnitConversionRepository {
    /// Creates a new UnitConversionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UnitConversionRepository { pool }
    }

    /// Registers a product's unit configuration.
    ///
    /// ## Arguments
    /// * `conversion` - Unit names (stored uppercase) and factor >= 1
    ///
    /// ## Returns
    /// * `Ok(())` - Configuration stored
    /// * `Err(DbError::UniqueViolation)` - Product already configured
    pub async fn create(&self, conversion: &UnitConversion) -> DbResult<()> {
        debug!(
            product_id = %conversion.product_id,
            base_unit = %conversion.base_unit,
            derive_unit = %conversion.derive_unit,
            factor = conversion.factor,
            "Creating unit conversion"
        );

        sqlx::query(
            "INSERT INTO unit_conversions \
             (product_id, base_unit, derive_unit, factor, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&conversion.product_id)
        .bind(&conversion.base_unit)
        .bind(&conversion.derive_unit)
        .bind(conversion.factor)
        .bind(conversion.created_at)
        .bind(conversion.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a product's unit configuration.
    ///
    /// ## Returns
    /// * `Ok(Some(UnitConversion))` - Configuration found
    /// * `Ok(None)` - Product has no unit configuration
    pub async fn get(&self, product_id: &str) -> DbResult<Option<UnitConversion>> {
        let conversion = sqlx::query_as::<_, UnitConversion>(&format!(
            "SELECT {CONVERSION_COLUMNS} FROM unit_conversions WHERE product_id = ?1"
        ))
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(conversion)
    }

    /// Reads a product's unit configuration inside the caller's
    /// transaction.
    ///
    /// The posting flow uses this after locking the balance row, so the
    /// factor it converts with is the factor at posting time.
    pub async fn resolve(
        &self,
        conn: &mut SqliteConnection,
        product_id: &str,
    ) -> DbResult<Option<UnitConversion>> {
        let conversion = sqlx::query_as::<_, UnitConversion>(&format!(
            "SELECT {CONVERSION_COLUMNS} FROM unit_conversions WHERE product_id = ?1"
        ))
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(conversion)
    }

    /// Changes a product's conversion factor.
    ///
    /// Existing balances keep their meaning (whole base units and loose
    /// derived units); only future borrowing converts at the new rate.
    ///
    /// ## Returns
    /// * `Ok(())` - Factor updated
    /// * `Err(DbError::NotFound)` - Product has no unit configuration
    pub async fn set_factor(&self, product_id: &str, factor: i64) -> DbResult<()> {
        debug!(product_id = %product_id, factor = factor, "Updating conversion factor");

        let now = chrono::Utc::now();

        let result = sqlx::query(
            "UPDATE unit_conversions SET factor = ?2, updated_at = ?3 WHERE product_id = ?1",
        )
        .bind(product_id)
        .bind(factor)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("UnitConversion", product_id));
        }

        Ok(())
    }
}
