//! # checkout-engine: Cart Store, Checkout Saga, Receipts
//!
//! The engine that turns a cashier's cart into a committed `(Order,
//! Invoice)` pair. Business rules live in `checkout-core`; this crate adds
//! the stateful parts (the persisted cart, the two-step commit and the
//! receipt) and reaches the rest of the storefront only through ports.
//!
//! ## Module Organization
//! ```text
//! checkout_engine/
//! ├── lib.rs        ◄─── You are here (exports)
//! ├── ports.rs      ◄─── Collaborator traits + gateway error
//! ├── store.rs      ◄─── CartStore: persisted cart + discount re-validation
//! ├── checkout.rs   ◄─── CheckoutOrchestrator: the two-step commit
//! ├── receipt.rs    ◄─── ReceiptFormatter: receipt DTO, text, QR payload
//! ├── storage.rs    ◄─── CartStorage adapters (in-memory, JSON file)
//! └── config.rs     ◄─── EngineConfig (store identity, currency display)
//! ```
//!
//! ## A Complete Checkout
//! ```rust,ignore
//! use std::sync::Arc;
//! use checkout_engine::{
//!     CartStore, CheckoutOrchestrator, EngineConfig, JsonFileCartStorage,
//!     ReceiptFormatter, Tender,
//! };
//!
//! let storage = Arc::new(JsonFileCartStorage::new("cart.json"));
//! let mut store = CartStore::open(storage);          // survives reloads
//! store.add_item(&product, 2)?;
//! store.apply_discount("HEMAT10", &directory).await?; // re-validated on
//!                                                     // every cart change
//! let mut checkout = CheckoutOrchestrator::new(
//!     gateway,
//!     ReceiptFormatter::new(EngineConfig::default()),
//!     "emp-7",
//! );
//! let done = checkout
//!     .submit(&mut store, Tender::cash(tendered))
//!     .await?;                                        // Order, then Invoice
//! println!("{}", done.invoice.invoice_number);
//! ```
//!
//! ## Concurrency Model
//! One cashier session, operations serialized by the caller. The only
//! suspension points are the port calls; cart math is synchronous. The
//! orchestrator's state guard, not UI button disabling, rejects a second
//! submit while one is resumable or in flight.

pub mod checkout;
pub mod config;
pub mod ports;
pub mod receipt;
pub mod storage;
pub mod store;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::{
    CheckoutError, CheckoutOrchestrator, CheckoutState, CheckoutSuccess, CommitStage, Tender,
};
pub use config::EngineConfig;
pub use ports::{
    CartStorage, DiscountLookup, GatewayError, InvoiceDraft, OrderDraft, SalesGateway,
    StockCatalog,
};
pub use receipt::{Receipt, ReceiptError, ReceiptFormatter};
pub use storage::{InMemoryCartStorage, JsonFileCartStorage};
pub use store::{AppliedDiscountView, ApplyDiscountError, CartStore, CartView};
