//! # Domain Types
//!
//! Core domain types used throughout the checkout engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │  DiscountCode   │   │     Order       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  code           │   │  order_number   │       │
//! │  │  name           │   │  kind / value   │   │  lines (frozen) │       │
//! │  │  unit_price     │   │  validity window│   │  subtotal/total │       │
//! │  │  stock          │   │  usage counters │   └────────┬────────┘       │
//! │  └─────────────────┘   └─────────────────┘            │ 1:1            │
//! │                                                ┌──────▼──────────┐     │
//! │                                                │    Invoice      │     │
//! │                                                │  ─────────────  │     │
//! │                                                │  invoice_number │     │
//! │                                                │  paid_by/tender │     │
//! │                                                └─────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//! `Product` and `DiscountCode` are read-only snapshots of catalog records
//! owned by external collaborators. `Order` and `Invoice` are created exactly
//! once per successful checkout and never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A catalog product as seen by the checkout engine.
///
/// The engine reads `stock` but never locks it; the server accepting the
/// order is the stock authority. Client-side checks are a best-effort guard.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier.
    pub id: String,

    /// Display name shown to the cashier and on the receipt.
    pub name: String,

    /// Price per unit in minor currency units.
    pub unit_price: Money,

    /// Stock on hand as last reported by the catalog.
    pub stock: i64,
}

// =============================================================================
// Discounts
// =============================================================================

/// How a discount value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// `value` is a percentage of the subtotal (0-100).
    Percentage,
    /// `value` is an amount in minor currency units.
    Fixed,
}

/// Derived status of a discount code at a point in time.
///
/// Status is never stored; it is computed from the validity window and the
/// usage counters via [`DiscountCode::status_at`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountStatus {
    /// `now < starts_at`.
    Upcoming,
    /// Within the validity window and under the usage limit.
    Active,
    /// `now > ends_at`.
    Expired,
    /// `usage_limit` is set and `used_count` has reached it.
    LimitReached,
}

/// A discount code record, read-only to the engine.
///
/// Owned by the discount-management collaborator; the engine receives a
/// snapshot through the discount-lookup port and evaluates it locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountCode {
    /// The code as entered by customers, stored normalized (upper-case).
    pub code: String,

    /// Percentage or fixed amount.
    pub kind: DiscountKind,

    /// Percentage points for [`DiscountKind::Percentage`], minor currency
    /// units for [`DiscountKind::Fixed`].
    pub value: i64,

    /// Minimum subtotal required to use the code.
    pub min_purchase: Money,

    /// Cap on the computed amount. Percentage codes only.
    pub max_discount: Option<Money>,

    /// Start of the validity window.
    #[ts(as = "String")]
    pub starts_at: DateTime<Utc>,

    /// End of the validity window.
    #[ts(as = "String")]
    pub ends_at: DateTime<Utc>,

    /// Maximum number of redemptions. `None` means unlimited.
    pub usage_limit: Option<u32>,

    /// Redemptions so far.
    pub used_count: u32,
}

impl DiscountCode {
    /// Derives the status of this code at `now`.
    ///
    /// ## Precedence
    /// Expired beats upcoming beats limit-reached; a code outside its window
    /// reports the window problem before the usage problem.
    pub fn status_at(&self, now: DateTime<Utc>) -> DiscountStatus {
        if now > self.ends_at {
            return DiscountStatus::Expired;
        }
        if now < self.starts_at {
            return DiscountStatus::Upcoming;
        }
        if let Some(limit) = self.usage_limit {
            if self.used_count >= limit {
                return DiscountStatus::LimitReached;
            }
        }
        DiscountStatus::Active
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How an invoice was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash handed to the cashier.
    Cash,
    /// QR-code payment scanned by the customer; settled externally.
    Qr,
}

// =============================================================================
// Order
// =============================================================================

/// A frozen line inside a committed [`Order`].
///
/// Snapshot pattern: name and unit price are copied from the cart line at
/// commit time so the record survives later catalog edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name: String,
    /// Unit price at time of sale (frozen).
    pub unit_price: Money,
    pub quantity: i64,
    /// `unit_price × quantity`.
    pub line_total: Money,
}

/// The durable record of what was sold, created at commit step 1.
///
/// Created exactly once per successful checkout; immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Identifier assigned by the order-accepting server.
    pub order_number: String,

    /// Cashier who rang up the sale.
    pub employee_id: String,

    /// Frozen copy of the cart lines.
    pub lines: Vec<OrderLine>,

    pub subtotal: Money,

    /// Discount code applied, if any.
    pub discount_code: Option<String>,

    /// Discount amount as committed. Zero when no code was applied.
    pub discount_amount: Money,

    pub total: Money,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Invoice
// =============================================================================

/// The durable record of how an [`Order`] was paid, created at commit step 2.
///
/// An Order may transiently exist without an Invoice (the known
/// partial-failure window); an Invoice never exists without its Order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub invoice_number: String,

    /// 1:1 reference to the order this invoice settles.
    pub order_number: String,

    pub total: Money,

    pub paid_by: PaymentMethod,

    /// Cash handed over by the buyer. Cash payments only.
    pub tendered: Option<Money>,

    /// `tendered − total`, floored at zero. Cash payments only.
    pub change: Option<Money>,

    /// Employee who verified the payment.
    pub verified_by: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn code_with_window(starts: i64, ends: i64) -> DiscountCode {
        DiscountCode {
            code: "HEMAT10".to_string(),
            kind: DiscountKind::Percentage,
            value: 10,
            min_purchase: Money::zero(),
            max_discount: None,
            starts_at: Utc.timestamp_opt(starts, 0).unwrap(),
            ends_at: Utc.timestamp_opt(ends, 0).unwrap(),
            usage_limit: None,
            used_count: 0,
        }
    }

    #[test]
    fn test_status_active_inside_window() {
        let code = code_with_window(1_000, 2_000);
        let now = Utc.timestamp_opt(1_500, 0).unwrap();
        assert_eq!(code.status_at(now), DiscountStatus::Active);
    }

    #[test]
    fn test_status_upcoming_before_window() {
        let code = code_with_window(1_000, 2_000);
        let now = Utc.timestamp_opt(500, 0).unwrap();
        assert_eq!(code.status_at(now), DiscountStatus::Upcoming);
    }

    #[test]
    fn test_status_expired_after_window() {
        let code = code_with_window(1_000, 2_000);
        let now = Utc.timestamp_opt(2_001, 0).unwrap();
        assert_eq!(code.status_at(now), DiscountStatus::Expired);
    }

    #[test]
    fn test_status_limit_reached() {
        let mut code = code_with_window(1_000, 2_000);
        code.usage_limit = Some(5);
        code.used_count = 5;
        let now = Utc.timestamp_opt(1_500, 0).unwrap();
        assert_eq!(code.status_at(now), DiscountStatus::LimitReached);
    }

    #[test]
    fn test_status_under_limit_is_active() {
        let mut code = code_with_window(1_000, 2_000);
        code.usage_limit = Some(5);
        code.used_count = 4;
        let now = Utc.timestamp_opt(1_500, 0).unwrap();
        assert_eq!(code.status_at(now), DiscountStatus::Active);
    }

    #[test]
    fn test_expired_beats_limit_reached() {
        let mut code = code_with_window(1_000, 2_000);
        code.usage_limit = Some(1);
        code.used_count = 1;
        let now = Utc.timestamp_opt(3_000, 0).unwrap();
        assert_eq!(code.status_at(now), DiscountStatus::Expired);
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let code = code_with_window(1_000, 2_000);
        assert_eq!(
            code.status_at(Utc.timestamp_opt(1_000, 0).unwrap()),
            DiscountStatus::Active
        );
        assert_eq!(
            code.status_at(Utc.timestamp_opt(2_000, 0).unwrap()),
            DiscountStatus::Active
        );
    }
}
