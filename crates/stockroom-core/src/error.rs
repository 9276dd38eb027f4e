//! # Error Types
//!
//! Domain-specific error types for stockroom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockroom-core errors (this file)                                     │
//! │  ├── CoreError        - Movement rejection reasons                     │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockroom-db errors (separate crate)                                  │
//! │  ├── DbError          - Storage operation failures                     │
//! │  └── PostingError     - Line-level rejection + storage, per document   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → PostingError → Caller             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product id, unit, quantities)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Reasons a stock movement is rejected.
///
/// These errors represent business rule violations. They are fatal to the
/// requested movement (and to its whole parent document) and are never
/// retried automatically.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Required configuration for the product is absent.
    ///
    /// ## When This Occurs
    /// - No unit conversion row exists for the product
    /// - No stock account row exists (product onboarding incomplete)
    ///
    /// Not a stock error: the caller must fix configuration, not retry.
    #[error("Missing {missing} for product {product_id}")]
    ConfigurationMissing { product_id: String, missing: String },

    /// Requested unit matches neither the base nor the derived unit
    /// configured for the product. Caller error, fatal.
    #[error("Invalid unit '{uom}' for product {product_id}: expected one of {expected:?}")]
    InvalidUnit {
        product_id: String,
        uom: String,
        expected: Vec<String>,
    },

    /// Requested outflow exceeds available balance, even after cross-unit
    /// conversion.
    ///
    /// ## User Workflow
    /// ```text
    /// Sale line: 28 PACK of P-1
    ///      │
    ///      ▼
    /// Balances: base 2, derived 3, factor 12 → at most 27 PACK coverable
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: "P-1", uom: "PACK",
    ///                     requested: 28, available: 27 }
    ///      │
    ///      ▼
    /// UI shows: "Only 27 PACK of P-1 available"
    /// ```
    ///
    /// `available` is expressed in the requested unit: the base balance
    /// for base-unit requests, or the largest satisfiable derived-unit
    /// request (`derived_qty + base_qty * factor`) for derived-unit ones.
    #[error("Insufficient stock for {product_id}: requested {requested} {uom}, available {available}")]
    InsufficientStock {
        product_id: String,
        uom: String,
        requested: i64,
        available: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// No unit conversion row for the product.
    pub fn missing_conversion(product_id: impl Into<String>) -> Self {
        CoreError::ConfigurationMissing {
            product_id: product_id.into(),
            missing: "unit conversion".to_string(),
        }
    }

    /// No stock account row for the product.
    pub fn missing_account(product_id: impl Into<String>) -> Self {
        CoreError::ConfigurationMissing {
            product_id: product_id.into(),
            missing: "stock account".to_string(),
        }
    }

    /// Unit name not accepted for this product/operation.
    pub fn invalid_unit(
        product_id: impl Into<String>,
        uom: impl Into<String>,
        expected: &[&str],
    ) -> Self {
        CoreError::InvalidUnit {
            product_id: product_id.into(),
            uom: uom.into(),
            expected: expected.iter().map(|u| u.to_string()).collect(),
        }
    }

    /// Outflow larger than the coverable balance.
    pub fn insufficient_stock(
        product_id: impl Into<String>,
        uom: impl Into<String>,
        requested: i64,
        available: i64,
    ) -> Self {
        CoreError::InsufficientStock {
            product_id: product_id.into(),
            uom: uom.into(),
            requested,
            available,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when a movement request or document draft doesn't
/// meet requirements. Used for early validation before balance arithmetic
/// runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., forbidden characters in an identifier).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::insufficient_stock("P-1", "PACK", 28, 27);
        assert_eq!(
            err.to_string(),
            "Insufficient stock for P-1: requested 28 PACK, available 27"
        );

        let err = CoreError::missing_conversion("P-2");
        assert_eq!(err.to_string(), "Missing unit conversion for product P-2");

        let err = CoreError::invalid_unit("P-3", "CRATE", &["EACH", "PACK"]);
        assert_eq!(
            err.to_string(),
            "Invalid unit 'CRATE' for product P-3: expected one of [\"EACH\", \"PACK\"]"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "product_id".to_string(),
        };
        assert_eq!(err.to_string(), "product_id is required");

        let err = ValidationError::TooLong {
            field: "remark".to_string(),
            max: 500,
        };
        assert_eq!(err.to_string(), "remark must be at most 500 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "qty".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
