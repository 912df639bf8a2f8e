//! # Error Types
//!
//! Domain-specific error types for checkout-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  checkout-core errors (this file)                                       │
//! │  ├── CartError        - Cart-local rule violations (recoverable by     │
//! │  │                      adjusting quantity or removing a line)         │
//! │  ├── DiscountError    - Why a code cannot be applied                   │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  checkout-engine errors (separate crate)                                │
//! │  ├── GatewayError     - Collaborator transport failures                │
//! │  └── CheckoutError    - Commit-stage failures, incl. the partial       │
//! │                         Order-without-Invoice window                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, amounts, dates)
//! 3. Errors are enum variants, never String
//! 4. Cart and discount errors never propagate past the offending action

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Cart Error
// =============================================================================

/// Cart-local rule violations.
///
/// Every rejected operation leaves the cart unchanged; the cashier recovers
/// by adjusting the quantity or removing the line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CartError {
    /// The product has no stock at all.
    #[error("{name} is out of stock")]
    OutOfStock { name: String },

    /// The requested quantity would exceed the known stock.
    #[error("insufficient stock for {name}: available {available}, requested {requested}")]
    ExceedsStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// The product is not in the cart.
    #[error("product {product_id} is not in the cart")]
    LineNotFound { product_id: String },

    /// Cart has exceeded the maximum number of distinct lines.
    #[error("cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds the per-line maximum.
    #[error("quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Input validation failure (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Discount Error
// =============================================================================

/// Why a discount code cannot be applied to the current subtotal.
///
/// Recoverable by removing or changing the code; also the reason reported
/// when an applied discount is dropped after the subtotal changed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiscountError {
    /// No such code in the discount catalog.
    #[error("discount code not found: {code}")]
    NotFound { code: String },

    /// The code's validity window has not opened yet.
    #[error("discount code is not active until {starts_at}")]
    Upcoming { starts_at: DateTime<Utc> },

    /// The code's validity window has closed.
    #[error("discount code expired at {ends_at}")]
    Expired { ends_at: DateTime<Utc> },

    /// The code has been redeemed as many times as allowed.
    #[error("discount code has reached its usage limit")]
    LimitReached,

    /// The subtotal does not meet the code's minimum purchase.
    #[error("subtotal {subtotal} is below the minimum purchase of {min_purchase}")]
    BelowMinimum {
        min_purchase: Money,
        subtotal: Money,
    },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when cashier input does not meet requirements, before any
/// business logic runs.
#[derive(Debug, Clone, PartialEq, Error)]
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

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience alias for Results with CartError.
pub type CartResult<T> = Result<T, CartError>;

/// Convenience alias for Results with DiscountError.
pub type DiscountResult<T> = Result<T, DiscountError>;

/// Convenience alias for Results with ValidationError.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_error_messages() {
        let err = CartError::ExceedsStock {
            name: "Es Teh 330ml".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock for Es Teh 330ml: available 3, requested 5"
        );
    }

    #[test]
    fn test_discount_error_messages() {
        let err = DiscountError::BelowMinimum {
            min_purchase: Money::from_minor(50_000),
            subtotal: Money::from_minor(20_000),
        };
        assert_eq!(
            err.to_string(),
            "subtotal 20,000 is below the minimum purchase of 50,000"
        );
    }

    #[test]
    fn test_validation_converts_to_cart_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let cart_err: CartError = validation_err.into();
        assert!(matches!(cart_err, CartError::Validation(_)));
    }
}
