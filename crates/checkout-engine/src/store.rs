//! # Cart Store
//!
//! The authoritative, persisted view of "what the cashier is about to sell".
//!
//! ## Responsibilities
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          CartStore                                      │
//! │                                                                         │
//! │  Cashier action ──► cart mutation (checkout-core, pure)                 │
//! │                          │                                              │
//! │                          ▼                                              │
//! │                 re-validate applied discount                            │
//! │                 (amount always matches the CURRENT subtotal;            │
//! │                  a no-longer-qualifying code is dropped + reported)     │
//! │                          │                                              │
//! │                          ▼                                              │
//! │                 persist through CartStorage                             │
//! │                 (cart survives a full client reload)                    │
//! │                          │                                              │
//! │                          ▼                                              │
//! │                 CartView returned to the UI                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! On open, an absent or malformed persisted cart is treated as "no cart";
//! a well-formed one is restored verbatim and not re-validated against the
//! catalog until the next mutating operation touches it.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use ts_rs::TS;

use checkout_core::validation::{validate_discount_code, validate_quantity};
use checkout_core::{
    Cart, CartError, CartLine, DiscountError, DiscountKind, Money, Product, ValidationError,
};

use crate::ports::{CartStorage, DiscountLookup, GatewayError, GatewayResult, StockCatalog};

// =============================================================================
// Errors
// =============================================================================

/// Why applying a discount code failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApplyDiscountError {
    /// The entered code is malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The code exists but does not qualify (or does not exist at all).
    #[error(transparent)]
    Invalid(#[from] DiscountError),

    /// The discount catalog could not be reached.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

// =============================================================================
// Cart View
// =============================================================================

/// Discount summary handed to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AppliedDiscountView {
    pub code: String,
    pub kind: DiscountKind,
    pub value: i64,
    pub amount: Money,
}

/// Cart snapshot handed to the UI after every operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub line_count: usize,
    pub total_quantity: i64,
    pub subtotal: Money,
    pub discount: Option<AppliedDiscountView>,
    pub total: Money,

    /// Set when this operation dropped a previously applied discount; the
    /// UI surfaces it so the code is never silently lost.
    pub dropped_discount: Option<String>,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        CartView {
            lines: cart.lines.clone(),
            line_count: cart.line_count(),
            total_quantity: cart.total_quantity(),
            subtotal: cart.subtotal(),
            discount: cart.discount.as_ref().map(|d| AppliedDiscountView {
                code: d.code().to_string(),
                kind: d.kind(),
                value: d.value(),
                amount: d.amount,
            }),
            total: cart.total(),
            dropped_discount: None,
        }
    }
}

// =============================================================================
// Cart Store
// =============================================================================

/// Persisted cart state for one active checkout session.
///
/// Single-threaded by design: one cashier, one cart, operations serialized
/// by the caller. The engine owns mutation; collaborators are read through
/// ports.
pub struct CartStore {
    cart: Cart,
    storage: Arc<dyn CartStorage>,
}

impl CartStore {
    /// Opens the store, restoring a persisted cart when one exists.
    pub fn open(storage: Arc<dyn CartStorage>) -> Self {
        let cart = match storage.load() {
            Some(cart) if !cart.is_empty() => {
                info!(lines = cart.line_count(), "restored persisted cart");
                cart
            }
            _ => Cart::new(),
        };

        CartStore { cart, storage }
    }

    /// Read access to the underlying cart.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Current cart snapshot for the UI.
    pub fn view(&self) -> CartView {
        CartView::from(&self.cart)
    }

    /// Sum of `unit_price × quantity` over all lines.
    pub fn subtotal(&self) -> Money {
        self.cart.subtotal()
    }

    /// Checks if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    /// Adds a product to the cart (or merges into its existing line).
    ///
    /// `snapshot_stock` is refreshed from the passed product record on every
    /// call; stock guards are best-effort (the order-accepting server is the
    /// authority).
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> Result<CartView, CartError> {
        debug!(product_id = %product.id, quantity, "add_item");
        validate_quantity(quantity)?;

        self.cart.add_line(product, quantity)?;
        Ok(self.after_mutation())
    }

    /// Sets the quantity of an existing line; `qty ≤ 0` removes it.
    pub fn set_quantity(&mut self, product_id: &str, quantity: i64) -> Result<CartView, CartError> {
        debug!(product_id, quantity, "set_quantity");

        self.cart.set_quantity(product_id, quantity)?;
        Ok(self.after_mutation())
    }

    /// Removes a line. Removing a non-existent line is a no-op.
    pub fn remove_item(&mut self, product_id: &str) -> CartView {
        debug!(product_id, "remove_item");

        self.cart.remove_line(product_id);
        self.after_mutation()
    }

    /// Empties the cart, drops the applied discount and the persisted copy.
    /// Idempotent.
    pub fn clear(&mut self) -> CartView {
        debug!("clear cart");

        self.cart.clear();
        self.storage.clear();
        self.view()
    }

    /// Looks up a code and applies it against the current subtotal.
    ///
    /// Codes are matched case-insensitively (normalized upper-case before
    /// lookup). This is the only networked discount step; every later
    /// re-validation runs locally against the held rule snapshot.
    pub async fn apply_discount(
        &mut self,
        raw_code: &str,
        directory: &dyn DiscountLookup,
    ) -> Result<CartView, ApplyDiscountError> {
        let code = validate_discount_code(raw_code)?;
        debug!(%code, "apply_discount");

        let rule = directory
            .find(&code)
            .await?
            .ok_or(DiscountError::NotFound { code: code.clone() })?;

        let amount = self.cart.apply_discount(rule, Utc::now())?;
        info!(%code, amount = %amount, "discount applied");

        self.storage.save(&self.cart);
        Ok(self.view())
    }

    /// Removes the applied discount, if any.
    pub fn remove_discount(&mut self) -> CartView {
        debug!("remove_discount");

        self.cart.remove_discount();
        self.storage.save(&self.cart);
        self.view()
    }

    /// Re-validates the applied discount against the current subtotal.
    ///
    /// Used by the orchestrator as its final precondition check; persists
    /// when the discount is dropped.
    pub fn revalidate_discount(&mut self) -> Option<DiscountError> {
        let dropped = self.cart.revalidate_discount(Utc::now());
        if let Some(reason) = &dropped {
            warn!(%reason, "applied discount no longer qualifies, dropped");
            self.storage.save(&self.cart);
        }
        dropped
    }

    /// Refreshes every line's `snapshot_stock` from the catalog.
    ///
    /// Does not change quantities; a line whose quantity now exceeds the
    /// refreshed snapshot will fail its next `set_quantity` increase, and
    /// the server remains the final authority at submit time.
    pub async fn refresh_stock(&mut self, catalog: &dyn StockCatalog) -> GatewayResult<CartView> {
        debug!("refresh_stock");

        for line in &mut self.cart.lines {
            line.snapshot_stock = catalog.stock_on_hand(&line.product_id).await?;
        }

        self.storage.save(&self.cart);
        Ok(self.view())
    }

    // Shared tail of every line mutation: re-validate the discount against
    // the new subtotal, persist, and report a dropped code in the view.
    fn after_mutation(&mut self) -> CartView {
        let dropped = self.cart.revalidate_discount(Utc::now());
        if let Some(reason) = &dropped {
            warn!(%reason, "applied discount no longer qualifies, dropped");
        }

        self.storage.save(&self.cart);

        let mut view = self.view();
        view.dropped_discount = dropped.map(|r| r.to_string());
        view
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
