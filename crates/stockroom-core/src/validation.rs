//! # Validation Module
//!
//! Input validation utilities for Stockroom.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (HTTP handler, CLI, test fixture)                     │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - request shape validation                       │
//! │  ├── Identifiers, unit names, quantity ranges, remark length           │
//! │  └── Runs before any lock is taken or arithmetic performed             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE constraints                                                │
//! │  └── CHECK constraints (non-negative balances)                         │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use stockroom_core::validation::{validate_product_id, validate_quantity};
//!
//! // Validate before handing a movement to the executor
//! validate_product_id("P-1001").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::types::{AdjustmentRequest, DocumentLine, MovementRequest};
use crate::{MAX_DOCUMENT_LINES, MAX_MOVEMENT_QUANTITY, MAX_REMARK_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product identifier.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 50 characters
/// - Should contain only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_product_id;
///
/// assert!(validate_product_id("P-1001").is_ok());
/// assert!(validate_product_id("").is_err());
/// assert!(validate_product_id("has space").is_err());
/// ```
pub fn validate_product_id(product_id: &str) -> ValidationResult<()> {
    let product_id = product_id.trim();

    if product_id.is_empty() {
        return Err(ValidationError::Required {
            field: "product_id".to_string(),
        });
    }

    if product_id.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "product_id".to_string(),
            max: 50,
        });
    }

    if !product_id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "product_id".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a unit-of-measure name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 20 characters
/// - Letters and digits only (unit names like "EACH", "PACK", "BOX12")
pub fn validate_unit_name(uom: &str) -> ValidationResult<()> {
    let uom = uom.trim();

    if uom.is_empty() {
        return Err(ValidationError::Required {
            field: "uom".to_string(),
        });
    }

    if uom.len() > 20 {
        return Err(ValidationError::TooLong {
            field: "uom".to_string(),
            max: 20,
        });
    }

    if !uom.chars().all(|c| c.is_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "uom".to_string(),
            reason: "must contain only letters and numbers".to_string(),
        });
    }

    Ok(())
}

/// Validates a ledger remark.
///
/// ## Rules
/// - May be empty (not every movement needs commentary)
/// - Must be at most 500 characters
pub fn validate_remark(remark: &str) -> ValidationResult<()> {
    if remark.len() > MAX_REMARK_LENGTH {
        return Err(ValidationError::TooLong {
            field: "remark".to_string(),
            max: MAX_REMARK_LENGTH,
        });
    }

    Ok(())
}

/// Validates a movement reference number.
///
/// ## Rules
/// - Must not be empty (the ledger is useless without correlation)
/// - Must be at most 100 characters
pub fn validate_reference(reference_no: &str) -> ValidationResult<()> {
    let reference_no = reference_no.trim();

    if reference_no.is_empty() {
        return Err(ValidationError::Required {
            field: "reference_no".to_string(),
        });
    }

    if reference_no.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "reference_no".to_string(),
            max: 100,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a movement quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_MOVEMENT_QUANTITY (1,000,000)
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_quantity;
///
/// assert!(validate_quantity(5).is_ok());
/// assert!(validate_quantity(0).is_err());
/// assert!(validate_quantity(1_000_001).is_err());
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "qty".to_string(),
        });
    }

    if qty > MAX_MOVEMENT_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "qty".to_string(),
            min: 1,
            max: MAX_MOVEMENT_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit conversion factor.
///
/// ## Rules
/// - Must be at least 1 (one base unit yields at least one derived unit)
/// - Must not exceed MAX_MOVEMENT_QUANTITY
pub fn validate_factor(factor: i64) -> ValidationResult<()> {
    if !(1..=MAX_MOVEMENT_QUANTITY).contains(&factor) {
        return Err(ValidationError::OutOfRange {
            field: "factor".to_string(),
            min: 1,
            max: MAX_MOVEMENT_QUANTITY,
        });
    }

    Ok(())
}

/// Validates an absolute adjustment target.
///
/// ## Rules
/// - Must be non-negative (zero empties the balance, which is legal)
/// - Must not exceed MAX_MOVEMENT_QUANTITY
pub fn validate_adjustment_target(target: i64) -> ValidationResult<()> {
    if !(0..=MAX_MOVEMENT_QUANTITY).contains(&target) {
        return Err(ValidationError::OutOfRange {
            field: "target".to_string(),
            min: 0,
            max: MAX_MOVEMENT_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates a full movement request before the executor takes any lock.
pub fn validate_movement_request(request: &MovementRequest) -> ValidationResult<()> {
    validate_product_id(&request.product_id)?;
    validate_unit_name(&request.uom)?;
    validate_quantity(request.qty)?;
    validate_reference(&request.reference_no)?;
    validate_remark(&request.remark)?;
    Ok(())
}

/// Validates the lines of a draft document.
///
/// ## Rules
/// - At least one line
/// - At most MAX_DOCUMENT_LINES (100) lines
/// - Every line has a valid product id, unit name, quantity, and a
///   non-negative unit price
pub fn validate_document_lines(lines: &[DocumentLine]) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::Required {
            field: "lines".to_string(),
        });
    }

    if lines.len() > MAX_DOCUMENT_LINES {
        return Err(ValidationError::OutOfRange {
            field: "lines".to_string(),
            min: 1,
            max: MAX_DOCUMENT_LINES as i64,
        });
    }

    for line in lines {
        validate_product_id(&line.product_id)?;
        validate_unit_name(&line.uom)?;
        validate_quantity(line.qty)?;
        if line.unit_price_cents < 0 {
            return Err(ValidationError::OutOfRange {
                field: "unit_price_cents".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
    }

    Ok(())
}

/// Validates a manual adjustment request.
pub fn validate_adjustment_request(request: &AdjustmentRequest) -> ValidationResult<()> {
    validate_product_id(&request.product_id)?;
    validate_adjustment_target(request.target.value())?;
    validate_remark(&request.remark)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AdjustmentTarget, MovementDirection};

    #[test]
    fn test_validate_product_id() {
        assert!(validate_product_id("P-1001").is_ok());
        assert!(validate_product_id("ABC123").is_ok());
        assert!(validate_product_id("product_1").is_ok());

        assert!(validate_product_id("").is_err());
        assert!(validate_product_id("   ").is_err());
        assert!(validate_product_id("has space").is_err());
        assert!(validate_product_id(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_unit_name() {
        assert!(validate_unit_name("EACH").is_ok());
        assert!(validate_unit_name("pack").is_ok());
        assert!(validate_unit_name("BOX12").is_ok());

        assert!(validate_unit_name("").is_err());
        assert!(validate_unit_name("CUBIC METER").is_err());
        assert!(validate_unit_name(&"U".repeat(30)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(1_000_000).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1_000_001).is_err());
    }

    #[test]
    fn test_validate_factor() {
        assert!(validate_factor(1).is_ok());
        assert!(validate_factor(12).is_ok());

        assert!(validate_factor(0).is_err());
        assert!(validate_factor(-3).is_err());
    }

    #[test]
    fn test_validate_adjustment_target() {
        assert!(validate_adjustment_target(0).is_ok());
        assert!(validate_adjustment_target(500).is_ok());
        assert!(validate_adjustment_target(-1).is_err());
    }

    #[test]
    fn test_validate_remark() {
        assert!(validate_remark("").is_ok());
        assert!(validate_remark("count correction").is_ok());
        assert!(validate_remark(&"x".repeat(501)).is_err());
    }

    #[test]
    fn test_validate_movement_request() {
        let mut request = MovementRequest {
            product_id: "P-1".to_string(),
            qty: 5,
            uom: "EACH".to_string(),
            direction: MovementDirection::Outflow,
            reference_no: "SO-1-1".to_string(),
            remark: "sale".to_string(),
        };
        assert!(validate_movement_request(&request).is_ok());

        request.qty = 0;
        assert!(validate_movement_request(&request).is_err());

        request.qty = 5;
        request.reference_no = String::new();
        assert!(validate_movement_request(&request).is_err());
    }

    #[test]
    fn test_validate_document_lines() {
        let line = DocumentLine {
            product_id: "P-1".to_string(),
            qty: 2,
            uom: "EACH".to_string(),
            unit_price_cents: 250,
        };
        assert!(validate_document_lines(&[line.clone()]).is_ok());
        assert!(validate_document_lines(&[]).is_err());

        let mut bad_price = line.clone();
        bad_price.unit_price_cents = -1;
        assert!(validate_document_lines(&[bad_price]).is_err());

        let too_many = vec![line; 101];
        assert!(validate_document_lines(&too_many).is_err());
    }

    #[test]
    fn test_validate_adjustment_request() {
        let request = AdjustmentRequest {
            product_id: "P-1".to_string(),
            target: AdjustmentTarget::Base(40),
            remark: "yearly count".to_string(),
        };
        assert!(validate_adjustment_request(&request).is_ok());

        let negative = AdjustmentRequest {
            product_id: "P-1".to_string(),
            target: AdjustmentTarget::Derived(-2),
            remark: String::new(),
        };
        assert!(validate_adjustment_request(&negative).is_err());
    }
}
