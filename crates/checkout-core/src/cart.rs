//! # Cart
//!
//! The in-progress, uncommitted set of items a cashier intends to sell.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Operations                                   │
//! │                                                                         │
//! │  Cashier Action           Cart Change                                   │
//! │  ──────────────           ───────────                                   │
//! │  Scan product ──────────► add_line()       merge or push CartLine       │
//! │  Edit quantity ─────────► set_quantity()   qty ≤ 0 removes the line     │
//! │  Remove line ───────────► remove_line()    idempotent                   │
//! │  Cancel sale ───────────► clear()          drops lines + discount       │
//! │  Enter code ────────────► apply_discount() evaluate + hold rule         │
//! │  (any of the above) ────► revalidate_discount()                         │
//! │                                                                         │
//! │  The caller re-validates the discount after every subtotal-changing     │
//! │  operation; a discount that no longer qualifies is dropped, never       │
//! │  left attached with a stale amount.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `product_id` (adding the same product merges)
//! - For every line, `quantity ≤ snapshot_stock` as of its last validation
//! - A rejected operation leaves the cart exactly as it was
//! - At most [`MAX_CART_LINES`] lines, [`MAX_LINE_QUANTITY`] units per line
//!
//! [`MAX_CART_LINES`]: crate::MAX_CART_LINES
//! [`MAX_LINE_QUANTITY`]: crate::MAX_LINE_QUANTITY

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::discount;
use crate::error::{CartError, CartResult, DiscountError, DiscountResult};
use crate::money::Money;
use crate::types::{DiscountCode, DiscountKind, Product};
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// One line in the cart.
///
/// Name and unit price are frozen at add time so the cart displays
/// consistent data even if the catalog record changes underneath it.
/// `snapshot_stock` is the stock known at the line's last validation and is
/// refreshed from the product record on every [`Cart::add_line`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,

    /// Product name at time of adding (frozen).
    pub product_name: String,

    /// Unit price at time of adding (frozen).
    pub unit_price: Money,

    /// Quantity the cashier intends to sell. Always > 0.
    pub quantity: i64,

    /// Stock known at the last validation against the catalog.
    pub snapshot_stock: i64,
}

impl CartLine {
    fn from_product(product: &Product, quantity: i64) -> Self {
        CartLine {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            unit_price: product.unit_price,
            quantity,
            snapshot_stock: product.stock,
        }
    }

    /// `unit_price × quantity`.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Applied Discount
// =============================================================================

/// The currently active discount and its amount against the live subtotal.
///
/// Carries the full rule snapshot so re-validation after a subtotal change
/// is pure local computation, not a second lookup. Lives only inside a
/// [`Cart`]; cleared explicitly or on cart clear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AppliedDiscount {
    /// The rule as fetched when the code was applied.
    pub rule: DiscountCode,

    /// Amount computed against the cart's current subtotal.
    pub amount: Money,
}

impl AppliedDiscount {
    /// The normalized code.
    pub fn code(&self) -> &str {
        &self.rule.code
    }

    /// Percentage or fixed.
    pub fn kind(&self) -> DiscountKind {
        self.rule.kind
    }

    /// The raw rule value (percentage points or minor units).
    pub fn value(&self) -> i64 {
        self.rule.value
    }
}

// =============================================================================
// Cart
// =============================================================================

/// Ordered sequence of cart lines plus an optional applied discount.
///
/// Insertion order is irrelevant to totals but preserved for receipt
/// rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub lines: Vec<CartLine>,
    pub discount: Option<AppliedDiscount>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds a product to the cart or merges into an existing line.
    ///
    /// ## Behavior
    /// - `stock ≤ 0` → [`CartError::OutOfStock`]
    /// - merged quantity above the product's stock → [`CartError::ExceedsStock`]
    /// - otherwise the line's `snapshot_stock` is refreshed from the product
    ///   record and the quantity incremented (or a new line pushed)
    ///
    /// A failed add leaves the cart unchanged.
    pub fn add_line(&mut self, product: &Product, quantity: i64) -> CartResult<()> {
        if product.stock <= 0 {
            return Err(CartError::OutOfStock {
                name: product.name.clone(),
            });
        }

        let existing_qty = self
            .lines
            .iter()
            .find(|l| l.product_id == product.id)
            .map_or(0, |l| l.quantity);
        let merged = existing_qty + quantity;

        if merged > MAX_LINE_QUANTITY {
            return Err(CartError::QuantityTooLarge {
                requested: merged,
                max: MAX_LINE_QUANTITY,
            });
        }

        if merged > product.stock {
            return Err(CartError::ExceedsStock {
                name: product.name.clone(),
                available: product.stock,
                requested: merged,
            });
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            line.quantity = merged;
            line.snapshot_stock = product.stock;
            return Ok(());
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CartError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        self.lines.push(CartLine::from_product(product, quantity));
        Ok(())
    }

    /// Sets the quantity of an existing line.
    ///
    /// ## Behavior
    /// - `qty ≤ 0` removes the line (not an error)
    /// - `qty > snapshot_stock` → [`CartError::ExceedsStock`], line unchanged
    /// - unknown product → [`CartError::LineNotFound`]
    pub fn set_quantity(&mut self, product_id: &str, quantity: i64) -> CartResult<()> {
        if quantity <= 0 {
            self.remove_line(product_id);
            return Ok(());
        }

        if quantity > MAX_LINE_QUANTITY {
            return Err(CartError::QuantityTooLarge {
                requested: quantity,
                max: MAX_LINE_QUANTITY,
            });
        }

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or_else(|| CartError::LineNotFound {
                product_id: product_id.to_string(),
            })?;

        if quantity > line.snapshot_stock {
            return Err(CartError::ExceedsStock {
                name: line.product_name.clone(),
                available: line.snapshot_stock,
                requested: quantity,
            });
        }

        line.quantity = quantity;
        Ok(())
    }

    /// Removes a line by product id. Removing a non-existent line is a no-op.
    pub fn remove_line(&mut self, product_id: &str) {
        self.lines.retain(|l| l.product_id != product_id);
    }

    /// Empties the cart and drops any applied discount. Idempotent.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.discount = None;
    }

    /// Sum of `unit_price × quantity` over all lines.
    pub fn subtotal(&self) -> Money {
        self.lines
            .iter()
            .fold(Money::zero(), |acc, l| acc + l.line_total())
    }

    /// Subtotal minus the applied discount amount, floored at zero.
    pub fn total(&self) -> Money {
        let discount = self.discount.as_ref().map_or(Money::zero(), |d| d.amount);
        self.subtotal().saturating_sub(discount)
    }

    /// Checks if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Evaluates a looked-up rule against the current subtotal and holds it.
    ///
    /// Replaces any previously applied discount on success; on failure the
    /// previous discount (if any) stays untouched.
    pub fn apply_discount(
        &mut self,
        rule: DiscountCode,
        now: DateTime<Utc>,
    ) -> DiscountResult<Money> {
        let amount = discount::evaluate(&rule, self.subtotal(), now)?;
        self.discount = Some(AppliedDiscount { rule, amount });
        Ok(amount)
    }

    /// Removes the applied discount, if any.
    pub fn remove_discount(&mut self) {
        self.discount = None;
    }

    /// Re-evaluates the held discount rule against the current subtotal.
    ///
    /// Called after every subtotal-changing operation. On success the stored
    /// amount is refreshed; when the rule no longer qualifies the discount
    /// is dropped and the reason returned so the cashier can be notified.
    /// It is never left attached with a stale amount.
    pub fn revalidate_discount(&mut self, now: DateTime<Utc>) -> Option<DiscountError> {
        let subtotal = self.subtotal();
        let applied = self.discount.as_mut()?;

        match discount::evaluate(&applied.rule, subtotal, now) {
            Ok(amount) => {
                applied.amount = amount;
                None
            }
            Err(reason) => {
                self.discount = None;
                Some(reason)
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
