//! # Validation Module
//!
//! Input validation utilities for the session/inventory subsystem.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP boundary (pos-api)                                      │
//! │  ├── Type validation (JSON deserialization)                            │
//! │  └── THIS MODULE: field presence and range rules                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Repository (verdant-db)                                      │
//! │  ├── State guards in UPDATE predicates (status = 'open', qty >= n)     │
//! │  └── Existence checks                                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── Partial unique index (one open session per register)              │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: Multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use verdant_core::validation::{validate_id, validate_quantity};
//!
//! validate_id("register_id", "reg-001").unwrap();
//! validate_quantity(5).unwrap();
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates a required opaque identifier field.
///
/// ## Rules
/// - Must not be empty after trimming
///
/// Identity values (vendor, operator, product) are opaque to this subsystem;
/// format enforcement belongs to the systems that mint them.
pub fn validate_id(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Quantity and Amount Validators
// =============================================================================

/// Validates a movement or line-item quantity.
///
/// ## Rules
/// - Must be strictly positive (direction comes from the movement class,
///   never from a caller-supplied sign)
/// - Must not exceed [`MAX_ITEM_QUANTITY`]
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if quantity > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a counter increment amount.
///
/// ## Rules
/// - Must not be negative: session counters are monotone for the life of an
///   open session. Refunds and voids are separate compensating events, never
///   a downward increment.
pub fn validate_counter_amount(amount: i64) -> ValidationResult<()> {
    if amount < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "amount".to_string(),
        });
    }
    Ok(())
}

/// Validates a monetary amount that must not be negative
/// (opening cash, unit price, cost per unit).
pub fn validate_non_negative_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("register_id", "reg-001").is_ok());
        assert!(validate_id("register_id", "").is_err());
        assert!(validate_id("register_id", "   ").is_err());
    }

    #[test]
    fn test_validate_quantity_bounds() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-5).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_counter_amount() {
        assert!(validate_counter_amount(0).is_ok());
        assert!(validate_counter_amount(1000).is_ok());
        assert!(validate_counter_amount(-1).is_err());
    }

    #[test]
    fn test_validate_non_negative_cents() {
        assert!(validate_non_negative_cents("opening_cash_cents", 20_000).is_ok());
        assert!(validate_non_negative_cents("opening_cash_cents", 0).is_ok());
        assert!(validate_non_negative_cents("opening_cash_cents", -1).is_err());
    }
}
