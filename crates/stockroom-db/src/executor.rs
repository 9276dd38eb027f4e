//! # Movement Executor
//!
//! The single write path for stock. Every balance change runs through
//! here in one transaction per call, and the ledger append always
//! commits together with the balance write.
//!
//! ## Posting Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     One Posting Transaction                             │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  1. touch-lock stock_accounts row  ← serializes concurrent postings     │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  2. read unit_conversions row      ← factor fixed for this posting      │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  3. classify uom, mutate balances in memory (stockroom-core)            │
//! │    │         │                                                          │
//! │    │         └── rejection → ROLLBACK (nothing persisted)               │
//! │    ▼                                                                    │
//! │  4. append stock_movements row                                          │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  5. write balances back                                                 │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Documents run steps 1-5 once per line inside a single transaction;     │
//! │  the first rejected line rolls back every earlier line, the header      │
//! │  and every ledger row already written.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::conversion::UnitConversionRepository;
use crate::repository::ledger::MovementLedgerRepository;
use crate::repository::purchase::PurchaseRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::stock::StockAccountRepository;
use stockroom_core::validation;
use stockroom_core::{
    AdjustmentRequest, AdjustmentTarget, CoreError, MovementDirection, MovementRecord,
    MovementRequest, Purchase, PurchaseDraft, PurchaseLine, PurchaseReceipt, Sale, SaleDraft,
    SaleLine, SaleReceipt, StockAccount, ValidationError,
};

// =============================================================================
// Errors
// =============================================================================

/// Errors surfaced by the executor.
#[derive(Debug, Error)]
pub enum PostingError {
    /// The request was malformed before it reached stock state
    /// (no lines, too many lines, bad field lengths).
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] ValidationError),

    /// A movement was rejected by stock rules. For document postings
    /// `line_no` names the offending line (1-based); standalone
    /// movements and adjustments report line 1.
    #[error("Line {line_no} ({reference_no}) rejected for {product_id}: {source}")]
    Rejected {
        line_no: i64,
        reference_no: String,
        product_id: String,
        #[source]
        source: CoreError,
    },

    /// The database failed underneath the posting.
    #[error("Storage failure: {0}")]
    Storage(#[from] DbError),
}

impl From<sqlx::Error> for PostingError {
    fn from(err: sqlx::Error) -> Self {
        PostingError::Storage(DbError::from(err))
    }
}

/// Result type for executor operations.
pub type PostingResult<T> = Result<T, PostingError>;

fn rejection(
    line_no: i64,
    reference_no: &str,
    product_id: &str,
    source: CoreError,
) -> PostingError {
    PostingError::Rejected {
        line_no,
        reference_no: reference_no.to_string(),
        product_id: product_id.to_string(),
        source,
    }
}

// =============================================================================
// Executor
// =============================================================================

/// Applies stock movements atomically.
///
/// Holds its repositories explicitly; construct one per pool (cheap,
/// clonable) and hand it to whatever drives postings.
///
/// ## Usage
/// ```rust,ignore
/// let executor = MovementExecutor::new(pool);
///
/// // Standalone receipt
/// let record = executor.apply_movement(&request).await?;
///
/// // Multi-line document, all-or-nothing
/// let receipt = executor.post_sale(&draft).await?;
/// ```
#[derive(Debug, Clone)]
pub struct MovementExecutor {
    pool: SqlitePool,
    accounts: StockAccountRepository,
    conversions: UnitConversionRepository,
    ledger: MovementLedgerRepository,
    sales: SaleRepository,
    purchases: PurchaseRepository,
}

impl MovementExecutor {
    /// Creates a new MovementExecutor over the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        MovementExecutor {
            accounts: StockAccountRepository::new(pool.clone()),
            conversions: UnitConversionRepository::new(pool.clone()),
            ledger: MovementLedgerRepository::new(pool.clone()),
            sales: SaleRepository::new(pool.clone()),
            purchases: PurchaseRepository::new(pool.clone()),
            pool,
        }
    }

    /// Applies one standalone stock movement in its own transaction.
    ///
    /// ## Arguments
    /// * `request` - Product, quantity, unit, direction and reference
    ///
    /// ## Returns
    /// * `Ok(MovementRecord)` - The ledger row that was appended
    /// * `Err(PostingError::Rejected)` - Stock rules refused the movement
    /// * `Err(PostingError::Storage)` - Database failure
    pub async fn apply_movement(&self, request: &MovementRequest) -> PostingResult<MovementRecord> {
        debug!(
            product_id = %request.product_id,
            qty = request.qty,
            uom = %request.uom,
            direction = ?request.direction,
            reference_no = %request.reference_no,
            "Applying stock movement"
        );

        let mut tx = self.pool.begin().await?;
        let (_, record) = self.apply_movement_on(&mut tx, 1, request).await?;
        tx.commit().await?;

        Ok(record)
    }

    /// Posts a sale: header, lines, and one outflow movement per line,
    /// all in a single transaction.
    ///
    /// ## Returns
    /// * `Ok(SaleReceipt)` - Persisted document plus its ledger rows
    /// * `Err(PostingError::Rejected)` - A line was refused; nothing
    ///   was persisted
    pub async fn post_sale(&self, draft: &SaleDraft) -> PostingResult<SaleReceipt> {
        validation::validate_document_lines(&draft.lines)?;

        let now = Utc::now();
        let total_cents: i64 = draft.lines.iter().map(|l| l.line_total_cents()).sum();
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            sale_date: draft.sale_date,
            customer_name: draft.customer_name.trim().to_string(),
            total_cents,
            created_at: now,
        };

        let remark = if sale.customer_name.is_empty() {
            "Sale".to_string()
        } else {
            format!("Sale to {}", sale.customer_name)
        };

        debug!(
            sale_id = %sale.id,
            lines = draft.lines.len(),
            total_cents = total_cents,
            "Posting sale"
        );

        let mut tx = self.pool.begin().await?;
        self.sales.insert_header(&mut tx, &sale).await?;

        let mut lines = Vec::with_capacity(draft.lines.len());
        let mut movements = Vec::with_capacity(draft.lines.len());
        for (idx, line) in draft.lines.iter().enumerate() {
            let line_no = (idx + 1) as i64;
            let request = MovementRequest {
                product_id: line.product_id.clone(),
                qty: line.qty,
                uom: line.uom.clone(),
                direction: MovementDirection::Outflow,
                reference_no: format!("{}-{}", sale.id, line_no),
                remark: remark.clone(),
            };

            let (_, record) = self.apply_movement_on(&mut tx, line_no, &request).await?;

            let sale_line = SaleLine {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                line_no,
                product_id: line.product_id.clone(),
                qty: line.qty,
                uom: record.uom.clone(),
                unit_price_cents: line.unit_price_cents,
                line_total_cents: line.line_total_cents(),
                created_at: now,
            };
            self.sales.insert_line(&mut tx, &sale_line).await?;

            lines.push(sale_line);
            movements.push(record);
        }

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            lines = lines.len(),
            total_cents = sale.total_cents,
            "Sale posted"
        );

        Ok(SaleReceipt {
            sale,
            lines,
            movements,
        })
    }

    /// Posts a purchase: header, lines, and one base-unit inflow per
    /// line, all in a single transaction.
    ///
    /// Lines stated in the derived unit are rejected; receipts land in
    /// base-unit stock only.
    pub async fn post_purchase(&self, draft: &PurchaseDraft) -> PostingResult<PurchaseReceipt> {
        validation::validate_document_lines(&draft.lines)?;

        let now = Utc::now();
        let total_cents: i64 = draft.lines.iter().map(|l| l.line_total_cents()).sum();
        let purchase = Purchase {
            id: Uuid::new_v4().to_string(),
            purchase_date: draft.purchase_date,
            supplier_name: draft.supplier_name.trim().to_string(),
            total_cents,
            created_at: now,
        };

        let remark = if purchase.supplier_name.is_empty() {
            "Purchase".to_string()
        } else {
            format!("Purchase from {}", purchase.supplier_name)
        };

        debug!(
            purchase_id = %purchase.id,
            lines = draft.lines.len(),
            total_cents = total_cents,
            "Posting purchase"
        );

        let mut tx = self.pool.begin().await?;
        self.purchases.insert_header(&mut tx, &purchase).await?;

        let mut lines = Vec::with_capacity(draft.lines.len());
        let mut movements = Vec::with_capacity(draft.lines.len());
        for (idx, line) in draft.lines.iter().enumerate() {
            let line_no = (idx + 1) as i64;
            let request = MovementRequest {
                product_id: line.product_id.clone(),
                qty: line.qty,
                uom: line.uom.clone(),
                direction: MovementDirection::Inflow,
                reference_no: format!("{}-{}", purchase.id, line_no),
                remark: remark.clone(),
            };

            let (_, record) = self.apply_movement_on(&mut tx, line_no, &request).await?;

            let purchase_line = PurchaseLine {
                id: Uuid::new_v4().to_string(),
                purchase_id: purchase.id.clone(),
                line_no,
                product_id: line.product_id.clone(),
                qty: line.qty,
                uom: record.uom.clone(),
                unit_price_cents: line.unit_price_cents,
                line_total_cents: line.line_total_cents(),
                created_at: now,
            };
            self.purchases.insert_line(&mut tx, &purchase_line).await?;

            lines.push(purchase_line);
            movements.push(record);
        }

        tx.commit().await?;

        info!(
            purchase_id = %purchase.id,
            lines = lines.len(),
            total_cents = purchase.total_cents,
            "Purchase posted"
        );

        Ok(PurchaseReceipt {
            purchase,
            lines,
            movements,
        })
    }

    /// Sets one balance tier to an absolute counted value and ledgers
    /// the difference.
    ///
    /// A zero-delta adjustment commits without appending a ledger row.
    ///
    /// ## Returns
    /// * `Ok(StockAccount)` - Balances after the correction
    pub async fn adjust_stock(&self, request: &AdjustmentRequest) -> PostingResult<StockAccount> {
        validation::validate_adjustment_request(request)?;

        let reference_no = format!("ADJ-{}", Uuid::new_v4());
        debug!(
            product_id = %request.product_id,
            target = ?request.target,
            reference_no = %reference_no,
            "Adjusting stock"
        );

        let mut tx = self.pool.begin().await?;

        let mut account = self
            .accounts
            .lock_for_update(&mut tx, &request.product_id)
            .await?
            .ok_or_else(|| {
                rejection(
                    1,
                    &reference_no,
                    &request.product_id,
                    CoreError::missing_account(&request.product_id),
                )
            })?;

        let conversion = self
            .conversions
            .resolve(&mut tx, &request.product_id)
            .await?
            .ok_or_else(|| {
                rejection(
                    1,
                    &reference_no,
                    &request.product_id,
                    CoreError::missing_conversion(&request.product_id),
                )
            })?;

        let (previous, moved) = match request.target {
            AdjustmentTarget::Base(target) => {
                let previous = account.base_qty;
                let moved = account
                    .set_base(target)
                    .map_err(|e| rejection(1, &reference_no, &request.product_id, e))?;
                (previous, moved)
            }
            AdjustmentTarget::Derived(target) => {
                let previous = account.derived_qty;
                let moved = account
                    .set_derived(target)
                    .map_err(|e| rejection(1, &reference_no, &request.product_id, e))?;
                (previous, moved)
            }
        };

        let delta = moved.base_delta + moved.derived_delta;
        if delta != 0 {
            let uom = conversion.canonical_name(moved.unit_kind).to_string();
            let remark = if request.remark.trim().is_empty() {
                format!("Stock count correction (was {previous})")
            } else {
                format!("{} (was {previous})", request.remark.trim())
            };
            let record =
                MovementRecord::adjustment(&request.product_id, delta, uom, &reference_no, remark);
            self.ledger.append(&mut tx, &record).await?;
        }

        account.updated_at = Utc::now();
        self.accounts.save(&mut tx, &account).await?;
        tx.commit().await?;

        info!(
            product_id = %request.product_id,
            delta = delta,
            base_qty = account.base_qty,
            derived_qty = account.derived_qty,
            "Stock adjusted"
        );

        Ok(account)
    }

    /// Runs steps 1-5 of the posting flow for one movement on the
    /// caller's transaction. Commit/rollback stays with the caller.
    async fn apply_movement_on(
        &self,
        conn: &mut SqliteConnection,
        line_no: i64,
        request: &MovementRequest,
    ) -> PostingResult<(StockAccount, MovementRecord)> {
        validation::validate_movement_request(request)
            .map_err(|e| rejection(line_no, &request.reference_no, &request.product_id, e.into()))?;

        let mut account = self
            .accounts
            .lock_for_update(&mut *conn, &request.product_id)
            .await?
            .ok_or_else(|| {
                rejection(
                    line_no,
                    &request.reference_no,
                    &request.product_id,
                    CoreError::missing_account(&request.product_id),
                )
            })?;

        let conversion = self
            .conversions
            .resolve(&mut *conn, &request.product_id)
            .await?
            .ok_or_else(|| {
                rejection(
                    line_no,
                    &request.reference_no,
                    &request.product_id,
                    CoreError::missing_conversion(&request.product_id),
                )
            })?;

        let moved = account
            .apply_movement(&conversion, request.direction, request.qty, &request.uom)
            .map_err(|e| rejection(line_no, &request.reference_no, &request.product_id, e))?;

        let uom = conversion.canonical_name(moved.unit_kind);
        let record = match request.direction {
            MovementDirection::Inflow => MovementRecord::inflow(
                &request.product_id,
                request.qty,
                uom,
                &request.reference_no,
                &request.remark,
            ),
            MovementDirection::Outflow => MovementRecord::outflow(
                &request.product_id,
                request.qty,
                uom,
                &request.reference_no,
                &request.remark,
            ),
        };

        self.ledger.append(&mut *conn, &record).await?;

        account.updated_at = Utc::now();
        self.accounts.save(&mut *conn, &account).await?;

        debug!(
            product_id = %request.product_id,
            base_delta = moved.base_delta,
            derived_delta = moved.derived_delta,
            base_converted = moved.base_converted,
            "Movement applied"
        );

        Ok((account, record))
    }
}

// =============================================================================
// Scenario Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::NaiveDate;
    use stockroom_core::{DocumentLine, MovementFilter, MovementType, UnitConversion};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn onboard(
        db: &Database,
        product_id: &str,
        base_unit: &str,
        derive_unit: &str,
        factor: i64,
        base_qty: i64,
        derived_qty: i64,
    ) {
        db.conversions()
            .create(&UnitConversion::new(product_id, base_unit, derive_unit, factor))
            .await
            .unwrap();
        db.stock_accounts()
            .create(&StockAccount::new(product_id, base_qty, derived_qty, 0))
            .await
            .unwrap();
    }

    fn doc_line(product_id: &str, qty: i64, uom: &str, unit_price_cents: i64) -> DocumentLine {
        DocumentLine {
            product_id: product_id.to_string(),
            qty,
            uom: uom.to_string(),
            unit_price_cents,
        }
    }

    fn sale_draft(lines: Vec<DocumentLine>) -> SaleDraft {
        SaleDraft {
            sale_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            customer_name: "Walk-in".to_string(),
            lines,
        }
    }

    fn purchase_draft(lines: Vec<DocumentLine>) -> PurchaseDraft {
        PurchaseDraft {
            purchase_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            supplier_name: "Acme Wholesale".to_string(),
            lines,
        }
    }

    #[tokio::test]
    async fn test_purchase_receives_base_units() {
        let db = test_db().await;
        onboard(&db, "P-1", "EACH", "PACK", 12, 0, 0).await;

        let receipt = db
            .executor()
            .post_purchase(&purchase_draft(vec![doc_line("P-1", 50, "EACH", 100)]))
            .await
            .unwrap();

        assert_eq!(receipt.purchase.total_cents, 5000);
        assert_eq!(receipt.movements.len(), 1);
        let record = &receipt.movements[0];
        assert_eq!(record.movement_type, MovementType::Debit);
        assert_eq!(record.in_qty, 50);
        assert_eq!(record.out_qty, 0);
        assert_eq!(record.uom, "EACH");
        assert_eq!(record.reference_no, format!("{}-1", receipt.purchase.id));

        let account = db.stock_accounts().get("P-1").await.unwrap().unwrap();
        assert_eq!((account.base_qty, account.derived_qty), (50, 0));

        // Exactly one ledger row for the single line.
        assert_eq!(db.ledger().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sale_borrows_across_units() {
        let db = test_db().await;
        onboard(&db, "P-1", "EACH", "PACK", 12, 2, 3).await;

        let receipt = db
            .executor()
            .post_sale(&sale_draft(vec![doc_line("P-1", 20, "pack", 40)]))
            .await
            .unwrap();

        let account = db.stock_accounts().get("P-1").await.unwrap().unwrap();
        assert_eq!((account.base_qty, account.derived_qty), (0, 7));

        let record = &receipt.movements[0];
        assert_eq!(record.movement_type, MovementType::Credit);
        assert_eq!(record.out_qty, 20);
        // Canonical unit name, not the caller's casing.
        assert_eq!(record.uom, "PACK");
        assert_eq!(receipt.lines[0].uom, "PACK");
    }

    #[tokio::test]
    async fn test_sale_fails_when_no_base_left_to_break() {
        let db = test_db().await;
        onboard(&db, "P-1", "EACH", "PACK", 10, 0, 5).await;

        let err = db
            .executor()
            .post_sale(&sale_draft(vec![doc_line("P-1", 6, "PACK", 40)]))
            .await
            .unwrap_err();

        match err {
            PostingError::Rejected {
                source:
                    CoreError::InsufficientStock {
                        requested,
                        available,
                        ..
                    },
                ..
            } => {
                assert_eq!(requested, 6);
                assert_eq!(available, 5);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        let account = db.stock_accounts().get("P-1").await.unwrap().unwrap();
        assert_eq!((account.base_qty, account.derived_qty), (0, 5));
        assert_eq!(db.ledger().count().await.unwrap(), 0);
        assert!(db.sales().list_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sale_rejection_rolls_back_whole_document() {
        let db = test_db().await;
        onboard(&db, "P-1", "EACH", "PACK", 12, 2, 3).await;

        // Lines 1 and 2 are satisfiable; line 3 requests 14 packs when
        // only 13 remain coverable after them.
        let err = db
            .executor()
            .post_sale(&sale_draft(vec![
                doc_line("P-1", 2, "PACK", 40),
                doc_line("P-1", 1, "EACH", 400),
                doc_line("P-1", 14, "PACK", 40),
            ]))
            .await
            .unwrap_err();

        match err {
            PostingError::Rejected {
                line_no,
                product_id,
                source:
                    CoreError::InsufficientStock {
                        requested,
                        available,
                        ..
                    },
                ..
            } => {
                assert_eq!(line_no, 3);
                assert_eq!(product_id, "P-1");
                assert_eq!(requested, 14);
                assert_eq!(available, 13);
            }
            other => panic!("expected Rejected/InsufficientStock, got {other:?}"),
        }

        // Nothing persisted: balances, ledger, header, lines.
        let account = db.stock_accounts().get("P-1").await.unwrap().unwrap();
        assert_eq!((account.base_qty, account.derived_qty), (2, 3));
        assert_eq!(db.ledger().count().await.unwrap(), 0);
        assert!(db.sales().list_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_multi_line_sale_persists_document_and_ledger() {
        let db = test_db().await;
        onboard(&db, "P-1", "EACH", "PACK", 12, 10, 0).await;
        onboard(&db, "P-2", "BOX", "BAR", 24, 5, 10).await;

        let receipt = db
            .executor()
            .post_sale(&sale_draft(vec![
                doc_line("P-1", 3, "EACH", 500),
                doc_line("P-2", 12, "BAR", 50),
            ]))
            .await
            .unwrap();

        assert_eq!(receipt.sale.total_cents, 3 * 500 + 12 * 50);
        assert_eq!(receipt.lines.len(), 2);
        assert_eq!(receipt.movements.len(), 2);
        assert_eq!(receipt.lines[0].line_no, 1);
        assert_eq!(receipt.lines[1].line_no, 2);

        let stored = db.sales().get(&receipt.sale.id).await.unwrap().unwrap();
        assert_eq!(stored.total_cents, receipt.sale.total_cents);
        let lines = db.sales().get_lines(&receipt.sale.id).await.unwrap();
        assert_eq!(lines.len(), 2);

        let p2 = db.stock_accounts().get("P-2").await.unwrap().unwrap();
        // 12 bars: 10 loose + 1 box of 24 → 22 left loose.
        assert_eq!((p2.base_qty, p2.derived_qty), (4, 22));
    }

    #[tokio::test]
    async fn test_missing_account_and_missing_conversion_discriminated() {
        let db = test_db().await;

        // Never onboarded at all.
        let err = db
            .executor()
            .post_sale(&sale_draft(vec![doc_line("GHOST", 1, "EACH", 10)]))
            .await
            .unwrap_err();
        match err {
            PostingError::Rejected {
                source: CoreError::ConfigurationMissing { missing, .. },
                ..
            } => assert_eq!(missing, "stock account"),
            other => panic!("expected ConfigurationMissing, got {other:?}"),
        }

        // Balance row exists but units were never configured.
        db.stock_accounts()
            .create(&StockAccount::new("HALF", 5, 0, 0))
            .await
            .unwrap();
        let err = db
            .executor()
            .post_sale(&sale_draft(vec![doc_line("HALF", 1, "EACH", 10)]))
            .await
            .unwrap_err();
        match err {
            PostingError::Rejected {
                source: CoreError::ConfigurationMissing { missing, .. },
                ..
            } => assert_eq!(missing, "unit conversion"),
            other => panic!("expected ConfigurationMissing, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_purchase_rejects_derived_unit_line() {
        let db = test_db().await;
        onboard(&db, "P-1", "EACH", "PACK", 12, 0, 0).await;

        let err = db
            .executor()
            .post_purchase(&purchase_draft(vec![doc_line("P-1", 5, "PACK", 10)]))
            .await
            .unwrap_err();

        match err {
            PostingError::Rejected {
                line_no,
                source: CoreError::InvalidUnit { expected, .. },
                ..
            } => {
                assert_eq!(line_no, 1);
                assert_eq!(expected, vec!["EACH"]);
            }
            other => panic!("expected InvalidUnit, got {other:?}"),
        }

        assert_eq!(db.ledger().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_unit_rejected_with_both_expected() {
        let db = test_db().await;
        onboard(&db, "P-1", "EACH", "PACK", 12, 10, 10).await;

        let err = db
            .executor()
            .post_sale(&sale_draft(vec![doc_line("P-1", 1, "CRATE", 10)]))
            .await
            .unwrap_err();

        match err {
            PostingError::Rejected {
                source: CoreError::InvalidUnit { uom, expected, .. },
                ..
            } => {
                assert_eq!(uom, "CRATE");
                assert_eq!(expected, vec!["EACH", "PACK"]);
            }
            other => panic!("expected InvalidUnit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_standalone_movement_keeps_caller_reference() {
        let db = test_db().await;
        onboard(&db, "P-1", "EACH", "PACK", 12, 0, 0).await;

        let record = db
            .executor()
            .apply_movement(&MovementRequest {
                product_id: "P-1".to_string(),
                qty: 30,
                uom: "EACH".to_string(),
                direction: MovementDirection::Inflow,
                reference_no: "GRN-7".to_string(),
                remark: "Goods received".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(record.reference_no, "GRN-7");
        assert_eq!(record.in_qty, 30);

        let account = db.stock_accounts().get("P-1").await.unwrap().unwrap();
        assert_eq!(account.base_qty, 30);
    }

    #[tokio::test]
    async fn test_adjustment_decrease_ledgers_out_qty() {
        let db = test_db().await;
        onboard(&db, "P-1", "EACH", "PACK", 12, 10, 4).await;

        let account = db
            .executor()
            .adjust_stock(&AdjustmentRequest {
                product_id: "P-1".to_string(),
                target: AdjustmentTarget::Base(7),
                remark: "Cycle count".to_string(),
            })
            .await
            .unwrap();

        assert_eq!((account.base_qty, account.derived_qty), (7, 4));

        let records = db
            .ledger()
            .query(&MovementFilter::for_product("P-1"))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.movement_type, MovementType::Debit);
        assert_eq!((record.in_qty, record.out_qty), (0, 3));
        assert_eq!(record.uom, "EACH");
        assert!(record.reference_no.starts_with("ADJ-"));
        assert!(record.remark.contains("(was 10)"));
        assert!(record.remark.starts_with("Cycle count"));
    }

    #[tokio::test]
    async fn test_adjustment_increase_ledgers_in_qty() {
        let db = test_db().await;
        onboard(&db, "P-1", "EACH", "PACK", 12, 2, 5).await;

        let account = db
            .executor()
            .adjust_stock(&AdjustmentRequest {
                product_id: "P-1".to_string(),
                target: AdjustmentTarget::Derived(9),
                remark: String::new(),
            })
            .await
            .unwrap();

        assert_eq!((account.base_qty, account.derived_qty), (2, 9));

        let records = db
            .ledger()
            .query(&MovementFilter::for_product("P-1"))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!((records[0].in_qty, records[0].out_qty), (4, 0));
        assert_eq!(records[0].uom, "PACK");
        assert!(records[0].remark.contains("(was 5)"));
    }

    #[tokio::test]
    async fn test_adjustment_zero_delta_appends_nothing() {
        let db = test_db().await;
        onboard(&db, "P-1", "EACH", "PACK", 12, 10, 4).await;

        let account = db
            .executor()
            .adjust_stock(&AdjustmentRequest {
                product_id: "P-1".to_string(),
                target: AdjustmentTarget::Base(10),
                remark: "Recount, no change".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(account.base_qty, 10);
        assert_eq!(db.ledger().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_document_rejected_before_any_write() {
        let db = test_db().await;

        let err = db.executor().post_sale(&sale_draft(vec![])).await.unwrap_err();
        assert!(matches!(err, PostingError::InvalidRequest(_)));
        assert!(db.sales().list_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ledger_filters_and_ordering() {
        let db = test_db().await;
        onboard(&db, "P-1", "EACH", "PACK", 12, 0, 0).await;
        onboard(&db, "P-2", "BOX", "BAR", 10, 8, 0).await;

        db.executor()
            .post_purchase(&purchase_draft(vec![
                doc_line("P-1", 50, "EACH", 100),
                doc_line("P-2", 4, "BOX", 900),
            ]))
            .await
            .unwrap();
        db.executor()
            .post_sale(&sale_draft(vec![doc_line("P-1", 3, "PACK", 40)]))
            .await
            .unwrap();

        // Full ledger, newest first: the sale credit leads.
        let all = db.ledger().query(&MovementFilter::all()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].movement_type, MovementType::Credit);

        let p1 = db
            .ledger()
            .query(&MovementFilter::for_product("P-1"))
            .await
            .unwrap();
        assert_eq!(p1.len(), 2);
        assert!(p1.iter().all(|r| r.product_id == "P-1"));

        let credits = db
            .ledger()
            .query(&MovementFilter::of_type(MovementType::Credit))
            .await
            .unwrap();
        assert_eq!(credits.len(), 1);
        assert_eq!(credits[0].out_qty, 3);

        let p2_debits = db
            .ledger()
            .query(&MovementFilter::for_product("P-2").and_type(MovementType::Debit))
            .await
            .unwrap();
        assert_eq!(p2_debits.len(), 1);
        assert_eq!(p2_debits[0].in_qty, 4);
    }

    #[tokio::test]
    async fn test_stock_listing_and_reorder_report() {
        let db = test_db().await;
        onboard(&db, "P-2", "BOX", "BAR", 10, 8, 0).await;
        onboard(&db, "P-1", "EACH", "PACK", 12, 1, 3).await;
        db.stock_accounts().set_reorder_level("P-1", 5).await.unwrap();

        let listing = db.stock_accounts().list().await.unwrap();
        assert_eq!(listing.len(), 2);
        // Ordered by product id.
        assert_eq!(listing[0].product_id, "P-1");
        assert_eq!(listing[0].base_unit, "EACH");
        assert_eq!(listing[0].factor, 12);
        assert_eq!(listing[1].product_id, "P-2");

        let low = db.stock_accounts().below_reorder_level().await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].product_id, "P-1");
        assert_eq!(low[0].base_qty, 1);
        assert_eq!(low[0].reorder_level, 5);

        // Reading again with no movements in between changes nothing.
        let again = db.stock_accounts().list().await.unwrap();
        assert_eq!(again, listing);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sales_serialize_on_stock_row() {
        let path = std::env::temp_dir().join(format!("stockroom-test-{}.db", Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(4))
            .await
            .unwrap();
        onboard(&db, "P-HOT", "EACH", "PACK", 12, 100, 0).await;

        let mut handles = Vec::new();
        for worker in 0..4 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..5 {
                    let draft = SaleDraft {
                        sale_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                        customer_name: format!("till {worker}-{i}"),
                        lines: vec![DocumentLine {
                            product_id: "P-HOT".to_string(),
                            qty: 1,
                            uom: "EACH".to_string(),
                            unit_price_cents: 100,
                        }],
                    };
                    db.executor().post_sale(&draft).await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let account = db.stock_accounts().get("P-HOT").await.unwrap().unwrap();
        assert_eq!(account.base_qty, 80);
        assert_eq!(db.ledger().count().await.unwrap(), 20);

        db.close().await;
        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_file(path.with_extension("db-wal"));
        let _ = std::fs::remove_file(path.with_extension("db-shm"));
    }
}
