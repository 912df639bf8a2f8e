//! # Collaborator Ports
//!
//! Abstract interfaces to the rest of the storefront. The concrete transport
//! (HTTP API, IPC bridge, database) lives outside this crate; the engine
//! only ever sees these traits.
//!
//! ## Port Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Checkout Engine Ports                            │
//! │                                                                         │
//! │  DiscountLookup ──► discount-management collaborator (read-only)        │
//! │  SalesGateway  ───► order/invoice-accepting server (the stock and      │
//! │                     durability authority)                               │
//! │  StockCatalog ────► product catalog (snapshot_stock refresh)            │
//! │  CartStorage ─────► client-local key-value store (cart survival        │
//! │                     across reloads; synchronous, best-effort)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Async ports use `async_trait` so they stay object-safe and can be held
//! as `Arc<dyn ...>` by the engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use checkout_core::{Cart, DiscountCode, Money, OrderLine, PaymentMethod};

// =============================================================================
// Gateway Error
// =============================================================================

/// Transport-level failure of any collaborator port.
///
/// ## Timeout Semantics
/// A timeout on an order submission must NOT be read as "no order was
/// created"; the server may have committed it. The orchestrator keeps the
/// idempotency key for the attempt so a retry cannot create a duplicate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// The call did not complete in time; the server-side outcome is unknown.
    #[error("request timed out")]
    Timeout,

    /// The call could not be delivered or the connection dropped.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server received the request and refused it (validation, stock
    /// race, auth).
    #[error("rejected by server: {0}")]
    Rejected(String),
}

/// Convenience alias for Results with GatewayError.
pub type GatewayResult<T> = Result<T, GatewayError>;

// =============================================================================
// Discount Lookup
// =============================================================================

/// Read-only access to the discount catalog.
#[async_trait]
pub trait DiscountLookup: Send + Sync {
    /// Fetches a discount rule by normalized (upper-case) code.
    ///
    /// `Ok(None)` means the code does not exist; transport failures are
    /// `Err` so the UI can distinguish "no such code" from "could not ask".
    async fn find(&self, code: &str) -> GatewayResult<Option<DiscountCode>>;
}

// =============================================================================
// Sales Gateway
// =============================================================================

/// What the engine sends to create an Order (commit step 1).
///
/// The durability boundary for "a sale happened".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    /// Stable per-attempt key; the server deduplicates on it so a retry
    /// after a timeout cannot create a second order.
    pub idempotency_key: Uuid,

    pub employee_id: String,

    /// Frozen copy of the cart lines.
    pub lines: Vec<OrderLine>,

    pub subtotal: Money,

    pub discount_code: Option<String>,

    pub discount_amount: Money,

    pub total: Money,
}

/// What the engine sends to create an Invoice (commit step 2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    /// The order this invoice settles. Always an order number returned by
    /// [`SalesGateway::submit_order`], never fabricated client-side.
    pub order_number: String,

    pub total: Money,

    pub paid_by: PaymentMethod,

    /// Cash handed over. Cash payments only.
    pub tendered: Option<Money>,

    /// `tendered − total`, floored at zero. Cash payments only.
    pub change: Option<Money>,

    pub verified_by: String,
}

/// The order/invoice-accepting server.
///
/// This collaborator is the authority on stock and durability; the engine's
/// client-side stock checks are advisory only.
#[async_trait]
pub trait SalesGateway: Send + Sync {
    /// Submits an order. Returns the server-assigned order number.
    async fn submit_order(&self, draft: &OrderDraft) -> GatewayResult<String>;

    /// Submits an invoice for an existing order. Returns the server-assigned
    /// invoice number.
    async fn submit_invoice(&self, draft: &InvoiceDraft) -> GatewayResult<String>;
}

// =============================================================================
// Stock Catalog
// =============================================================================

/// Read-only stock levels from the product catalog.
#[async_trait]
pub trait StockCatalog: Send + Sync {
    /// Current stock on hand for a product.
    async fn stock_on_hand(&self, product_id: &str) -> GatewayResult<i64>;
}

// =============================================================================
// Cart Storage
// =============================================================================

/// Client-local persistence for the in-progress cart.
///
/// ## Contract
/// - `load` returns `None` for an absent, empty or malformed payload,
///   never an error. A cashier reload lands on an empty cart at worst.
/// - `save` is best-effort: a failed write is logged by the adapter and
///   must not fail the cart operation that triggered it (the in-memory
///   cart is already correct).
pub trait CartStorage: Send + Sync {
    /// Restores the persisted cart, if a readable one exists.
    fn load(&self) -> Option<Cart>;

    /// Persists the current cart.
    fn save(&self, cart: &Cart);

    /// Drops the persisted cart.
    fn clear(&self);
}
