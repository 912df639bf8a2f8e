//! # Discount Evaluation
//!
//! Pure evaluation of a discount code against a cart subtotal.
//!
//! ## Evaluation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  evaluate(rule, subtotal, now)                                          │
//! │                                                                         │
//! │  1. status_at(now)  ── Upcoming / Expired / LimitReached? → Err         │
//! │  2. subtotal < min_purchase?                              → Err         │
//! │  3. Percentage: subtotal × value / 100, capped at max_discount          │
//! │     Fixed:      min(value, subtotal)                                    │
//! │                                                           → Ok(amount)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Evaluation is deterministic: the same `(rule, subtotal, now)` always
//! yields the same amount. The engine re-runs it after every
//! subtotal-changing cart operation so an applied discount always reflects
//! the *current* subtotal, never the subtotal at the moment the code was
//! entered.

use chrono::{DateTime, Utc};

use crate::error::{DiscountError, DiscountResult};
use crate::money::Money;
use crate::types::{DiscountCode, DiscountKind, DiscountStatus};

/// Normalizes a raw code as entered by the cashier.
///
/// Codes are matched case-insensitively: trimmed and upper-cased before any
/// lookup or comparison.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Evaluates a discount rule against a subtotal, returning the amount.
///
/// ## Errors
/// - [`DiscountError::Upcoming`] / [`Expired`] / [`LimitReached`] when the
///   derived status at `now` is not active
/// - [`DiscountError::BelowMinimum`] when the subtotal does not reach the
///   rule's minimum purchase
///
/// [`Expired`]: DiscountError::Expired
/// [`LimitReached`]: DiscountError::LimitReached
pub fn evaluate(
    rule: &DiscountCode,
    subtotal: Money,
    now: DateTime<Utc>,
) -> DiscountResult<Money> {
    match rule.status_at(now) {
        DiscountStatus::Active => {}
        DiscountStatus::Upcoming => {
            return Err(DiscountError::Upcoming {
                starts_at: rule.starts_at,
            })
        }
        DiscountStatus::Expired => {
            return Err(DiscountError::Expired {
                ends_at: rule.ends_at,
            })
        }
        DiscountStatus::LimitReached => return Err(DiscountError::LimitReached),
    }

    if subtotal < rule.min_purchase {
        return Err(DiscountError::BelowMinimum {
            min_purchase: rule.min_purchase,
            subtotal,
        });
    }

    Ok(compute_amount(rule, subtotal))
}

/// Computes the discount amount for an active, qualifying rule.
///
/// A fixed discount never exceeds the subtotal, so the discounted total
/// never goes negative. A percentage discount is capped at `max_discount`
/// when the rule carries one.
fn compute_amount(rule: &DiscountCode, subtotal: Money) -> Money {
    match rule.kind {
        DiscountKind::Percentage => {
            let pct = u32::try_from(rule.value).unwrap_or(0);
            let amount = subtotal.percent(pct);
            match rule.max_discount {
                Some(cap) => amount.min(cap),
                None => amount,
            }
        }
        DiscountKind::Fixed => Money::from_minor(rule.value).min(subtotal),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn active_rule(kind: DiscountKind, value: i64) -> DiscountCode {
        DiscountCode {
            code: "HEMAT".to_string(),
            kind,
            value,
            min_purchase: Money::zero(),
            max_discount: None,
            starts_at: now() - chrono::Duration::days(1),
            ends_at: now() + chrono::Duration::days(1),
            usage_limit: None,
            used_count: 0,
        }
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  hemat10 "), "HEMAT10");
        assert_eq!(normalize_code("HEMAT10"), "HEMAT10");
    }

    #[test]
    fn test_percentage_amount() {
        let rule = active_rule(DiscountKind::Percentage, 20);
        let amount = evaluate(&rule, Money::from_minor(500_000), now()).unwrap();
        assert_eq!(amount.minor(), 100_000);
    }

    #[test]
    fn test_percentage_capped_at_max_discount() {
        let mut rule = active_rule(DiscountKind::Percentage, 20);
        rule.max_discount = Some(Money::from_minor(50_000));

        let amount = evaluate(&rule, Money::from_minor(500_000), now()).unwrap();
        assert_eq!(amount.minor(), 50_000);
    }

    #[test]
    fn test_percentage_under_cap_is_uncapped() {
        let mut rule = active_rule(DiscountKind::Percentage, 10);
        rule.max_discount = Some(Money::from_minor(50_000));

        let amount = evaluate(&rule, Money::from_minor(100_000), now()).unwrap();
        assert_eq!(amount.minor(), 10_000);
    }

    #[test]
    fn test_fixed_never_exceeds_subtotal() {
        let rule = active_rule(DiscountKind::Fixed, 50_000);
        let amount = evaluate(&rule, Money::from_minor(10_000), now()).unwrap();
        assert_eq!(amount.minor(), 10_000);
    }

    #[test]
    fn test_fixed_below_subtotal() {
        let rule = active_rule(DiscountKind::Fixed, 5_000);
        let amount = evaluate(&rule, Money::from_minor(10_000), now()).unwrap();
        assert_eq!(amount.minor(), 5_000);
    }

    #[test]
    fn test_below_minimum_purchase() {
        let mut rule = active_rule(DiscountKind::Percentage, 10);
        rule.min_purchase = Money::from_minor(50_000);

        let err = evaluate(&rule, Money::from_minor(20_000), now()).unwrap_err();
        assert_eq!(
            err,
            DiscountError::BelowMinimum {
                min_purchase: Money::from_minor(50_000),
                subtotal: Money::from_minor(20_000),
            }
        );
    }

    #[test]
    fn test_minimum_purchase_is_inclusive() {
        let mut rule = active_rule(DiscountKind::Percentage, 10);
        rule.min_purchase = Money::from_minor(50_000);

        assert!(evaluate(&rule, Money::from_minor(50_000), now()).is_ok());
    }

    #[test]
    fn test_expired_code() {
        let mut rule = active_rule(DiscountKind::Percentage, 10);
        rule.ends_at = now() - chrono::Duration::hours(1);

        let err = evaluate(&rule, Money::from_minor(100_000), now()).unwrap_err();
        assert!(matches!(err, DiscountError::Expired { .. }));
    }

    #[test]
    fn test_upcoming_code() {
        let mut rule = active_rule(DiscountKind::Percentage, 10);
        rule.starts_at = now() + chrono::Duration::hours(1);

        let err = evaluate(&rule, Money::from_minor(100_000), now()).unwrap_err();
        assert!(matches!(err, DiscountError::Upcoming { .. }));
    }

    #[test]
    fn test_limit_reached_code() {
        let mut rule = active_rule(DiscountKind::Percentage, 10);
        rule.usage_limit = Some(3);
        rule.used_count = 3;

        let err = evaluate(&rule, Money::from_minor(100_000), now()).unwrap_err();
        assert_eq!(err, DiscountError::LimitReached);
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let rule = active_rule(DiscountKind::Percentage, 15);
        let subtotal = Money::from_minor(123_456);

        let first = evaluate(&rule, subtotal, now()).unwrap();
        let second = evaluate(&rule, subtotal, now()).unwrap();
        assert_eq!(first, second);
    }
}
