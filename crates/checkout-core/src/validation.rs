//! # Validation Module
//!
//! Input validation for cashier-entered values, run before business logic.
//!
//! ## Usage
//! ```rust
//! use checkout_core::validation::{validate_discount_code, validate_quantity};
//!
//! // Normalize and validate a code before lookup
//! assert_eq!(validate_discount_code(" hemat10 ").unwrap(), "HEMAT10");
//!
//! // Validate a quantity before a cart operation
//! validate_quantity(5).unwrap();
//! ```

use crate::discount::normalize_code;
use crate::error::{ValidationError, ValidationResult};
use crate::{MAX_DISCOUNT_CODE_LEN, MAX_LINE_QUANTITY};

/// Validates and normalizes a discount code.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most [`MAX_DISCOUNT_CODE_LEN`] characters
/// - Letters, numbers, hyphens and underscores only
///
/// ## Returns
/// The normalized (trimmed, upper-cased) code.
pub fn validate_discount_code(raw: &str) -> ValidationResult<String> {
    let code = normalize_code(raw);

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "discount code".to_string(),
        });
    }

    if code.len() > MAX_DISCOUNT_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "discount code".to_string(),
            max: MAX_DISCOUNT_CODE_LEN,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "discount code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(code)
}

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed [`MAX_LINE_QUANTITY`]
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
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
    fn test_validate_discount_code() {
        assert_eq!(validate_discount_code("hemat10").unwrap(), "HEMAT10");
        assert_eq!(validate_discount_code("  BUKA_TOKO "), Ok("BUKA_TOKO".to_string()));

        assert!(validate_discount_code("").is_err());
        assert!(validate_discount_code("   ").is_err());
        assert!(validate_discount_code("has space").is_err());
        assert!(validate_discount_code(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

}
