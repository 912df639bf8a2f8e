//! # Checkout Orchestrator
//!
//! The state machine that turns a finalized cart into durable records.
//!
//! ## Commit Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Two-Step Commit (strict order)                       │
//! │                                                                         │
//! │   Idle ──► Submitting ──► OrderCreated ──► InvoiceCreated (success)     │
//! │              │                  │                                       │
//! │              │ submit_order     │ submit_invoice                        │
//! │              │ fails            │ fails                                 │
//! │              ▼                  ▼                                       │
//! │        Failed(Order)      Failed(Invoice)                               │
//! │        nothing committed  ORDER EXISTS, invoice missing                 │
//! │        cart preserved     cart preserved, retry_invoice() only          │
//! │        safe to retry      (never a fresh order)                         │
//! │                                                                         │
//! │   Order first, always: an Order with no Invoice is a recoverable,      │
//! │   auditable state; an Invoice with no Order must never be producible.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Idempotency
//! Each checkout attempt carries a UUID idempotency key on its order draft.
//! The key is REUSED when retrying after `Failed(Order)`: a client-side
//! timeout must not be read as "no order was created", and the key lets the
//! server deduplicate. The key rotates only after a full commit or when the
//! cart is cleared.
//!
//! ## Re-entrancy
//! `submit` takes `&mut self`, so overlapping submits are structurally
//! impossible in safe single-threaded use; the `Submitting` guard still
//! exists so the resumable states (`Failed(*)`) reject misuse explicitly
//! rather than relying on the UI disabling its button.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use checkout_core::{DiscountError, Invoice, Money, Order, OrderLine, PaymentMethod};

use crate::ports::{GatewayError, InvoiceDraft, OrderDraft, SalesGateway};
use crate::receipt::{Receipt, ReceiptFormatter};
use crate::store::CartStore;

// =============================================================================
// States
// =============================================================================

/// Which commit step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStage {
    Order,
    Invoice,
}

/// Orchestrator state. One checkout at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    /// No checkout in flight.
    Idle,
    /// A commit step is awaiting the gateway.
    Submitting,
    /// Step 1 done; invoice submission is next.
    OrderCreated,
    /// Both steps done (terminal success for the attempt).
    InvoiceCreated,
    /// A commit step failed; see [`CommitStage`] for which.
    Failed(CommitStage),
}

// =============================================================================
// Tender
// =============================================================================

/// Payment input for a checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tender {
    pub method: PaymentMethod,
    /// Cash handed over by the buyer. Cash payments only.
    pub tendered: Option<Money>,
}

impl Tender {
    /// Cash payment with the amount physically handed over.
    pub fn cash(tendered: Money) -> Self {
        Tender {
            method: PaymentMethod::Cash,
            tendered: Some(tendered),
        }
    }

    /// QR payment; settlement happens outside this engine.
    pub fn qr() -> Self {
        Tender {
            method: PaymentMethod::Qr,
            tendered: None,
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Commit-stage failures.
///
/// The two terminal failures are deliberately distinct: after
/// [`OrderSubmitFailed`] nothing was committed and the whole checkout is
/// safe to retry; after [`OrderCreatedInvoiceFailed`] the order exists and
/// only the invoice may be retried.
///
/// [`OrderSubmitFailed`]: CheckoutError::OrderSubmitFailed
/// [`OrderCreatedInvoiceFailed`]: CheckoutError::OrderCreatedInvoiceFailed
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing to sell.
    #[error("cart is empty")]
    EmptyCart,

    /// Cash handed over does not cover the total.
    #[error("insufficient tender: total {total}, tendered {tendered}")]
    InsufficientTender { total: Money, tendered: Money },

    /// The applied discount stopped qualifying at the final check; the
    /// checkout aborts rather than silently proceeding at full price.
    #[error("applied discount is no longer valid: {0}")]
    DiscountInvalid(#[from] DiscountError),

    /// A commit step is already awaiting the gateway.
    #[error("a checkout is already in progress")]
    CheckoutInProgress,

    /// An order exists without its invoice; only `retry_invoice` may
    /// proceed.
    #[error("order {order_number} is awaiting its invoice; retry the invoice instead")]
    InvoicePending { order_number: String },

    /// There is no failed invoice submission to retry.
    #[error("no failed invoice submission to retry")]
    NothingToRetry,

    /// Step 1 failed: nothing committed, cart preserved, retry allowed.
    #[error("order submission failed: {source}")]
    OrderSubmitFailed { source: GatewayError },

    /// Step 2 failed: the order exists but its invoice does not. NOT
    /// retryable as a fresh order; reconcile against `order_number`.
    #[error("order {order_number} was created but invoice submission failed: {source}")]
    OrderCreatedInvoiceFailed {
        order_number: String,
        source: GatewayError,
    },
}

// =============================================================================
// Success
// =============================================================================

/// A fully committed checkout.
#[derive(Debug, Clone)]
pub struct CheckoutSuccess {
    pub order: Order,
    pub invoice: Invoice,

    /// `None` when receipt rendering failed. The checkout is committed
    /// regardless, and rendering can be retried via [`ReceiptFormatter`].
    pub receipt: Option<Receipt>,
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Order + invoice held across a `Failed(Invoice)` window.
struct PendingInvoice {
    order: Order,
    draft: InvoiceDraft,
}

/// Drives the two-step commit for one cashier session.
pub struct CheckoutOrchestrator {
    gateway: Arc<dyn SalesGateway>,
    formatter: ReceiptFormatter,
    employee_id: String,
    state: CheckoutState,
    attempt_key: Option<Uuid>,
    pending: Option<PendingInvoice>,
}

impl CheckoutOrchestrator {
    /// Creates an orchestrator for the given cashier.
    pub fn new(
        gateway: Arc<dyn SalesGateway>,
        formatter: ReceiptFormatter,
        employee_id: impl Into<String>,
    ) -> Self {
        CheckoutOrchestrator {
            gateway,
            formatter,
            employee_id: employee_id.into(),
            state: CheckoutState::Idle,
            attempt_key: None,
            pending: None,
        }
    }

    /// Current orchestrator state.
    pub fn state(&self) -> CheckoutState {
        self.state
    }

    /// Order number awaiting its invoice, when in the partial-failure
    /// window.
    pub fn pending_order_number(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.order.order_number.as_str())
    }

    /// Runs the full checkout: preconditions, order submit, invoice submit,
    /// cart clear, receipt.
    ///
    /// ## Preconditions (no network calls yet)
    /// - cart non-empty
    /// - applied discount re-validated against the current subtotal
    /// - cash tender covers the total; change = `tendered − total`,
    ///   floored at zero
    ///
    /// On failure the cart is never cleared; see [`CheckoutError`] for
    /// which failures are safe to retry end-to-end.
    pub async fn submit(
        &mut self,
        store: &mut CartStore,
        tender: Tender,
    ) -> Result<CheckoutSuccess, CheckoutError> {
        match self.state {
            CheckoutState::Submitting => return Err(CheckoutError::CheckoutInProgress),
            CheckoutState::OrderCreated | CheckoutState::Failed(CommitStage::Invoice) => {
                let order_number = self
                    .pending
                    .as_ref()
                    .map(|p| p.order.order_number.clone())
                    .unwrap_or_default();
                return Err(CheckoutError::InvoicePending { order_number });
            }
            CheckoutState::Idle | CheckoutState::InvoiceCreated | CheckoutState::Failed(_) => {}
        }

        // ---- Preconditions: fail fast, cart untouched -----------------------

        if store.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        if let Some(reason) = store.revalidate_discount() {
            return Err(CheckoutError::DiscountInvalid(reason));
        }

        let cart = store.cart();
        let subtotal = cart.subtotal();
        let total = cart.total();
        let discount_code = cart.discount.as_ref().map(|d| d.code().to_string());
        let discount_amount = cart.discount.as_ref().map_or(Money::zero(), |d| d.amount);

        let (tendered, change) = match tender.method {
            PaymentMethod::Cash => {
                let tendered = tender.tendered.unwrap_or_else(Money::zero);
                if tendered < total {
                    return Err(CheckoutError::InsufficientTender { total, tendered });
                }
                (Some(tendered), Some(tendered.saturating_sub(total)))
            }
            PaymentMethod::Qr => (None, None),
        };

        let lines: Vec<OrderLine> = cart
            .lines
            .iter()
            .map(|l| OrderLine {
                product_id: l.product_id.clone(),
                name: l.product_name.clone(),
                unit_price: l.unit_price,
                quantity: l.quantity,
                line_total: l.line_total(),
            })
            .collect();

        // ---- Step 1: Order (the durability boundary for "a sale happened") --

        // Reuse the key when retrying after Failed(Order): a timed-out
        // submit may have committed server-side, and the key deduplicates.
        let key = match (self.state, self.attempt_key) {
            (CheckoutState::Failed(CommitStage::Order), Some(key)) => key,
            _ => Uuid::new_v4(),
        };
        self.attempt_key = Some(key);

        let order_draft = OrderDraft {
            idempotency_key: key,
            employee_id: self.employee_id.clone(),
            lines,
            subtotal,
            discount_code: discount_code.clone(),
            discount_amount,
            total,
        };

        self.state = CheckoutState::Submitting;
        debug!(idempotency_key = %key, total = %total, "submitting order");

        let order_number = match self.gateway.submit_order(&order_draft).await {
            Ok(order_number) => order_number,
            Err(source) => {
                self.state = CheckoutState::Failed(CommitStage::Order);
                warn!(%source, "order submission failed, nothing committed, cart preserved");
                return Err(CheckoutError::OrderSubmitFailed { source });
            }
        };

        let order = Order {
            order_number: order_number.clone(),
            employee_id: self.employee_id.clone(),
            lines: order_draft.lines,
            subtotal,
            discount_code,
            discount_amount,
            total,
            created_at: Utc::now(),
        };
        self.state = CheckoutState::OrderCreated;
        info!(%order_number, total = %total, "order created");

        // ---- Step 2: Invoice -------------------------------------------------

        let invoice_draft = InvoiceDraft {
            order_number,
            total,
            paid_by: tender.method,
            tendered,
            change,
            verified_by: self.employee_id.clone(),
        };

        self.finish_invoice(store, order, invoice_draft).await
    }

    /// Re-submits the invoice for an order left in the partial-failure
    /// window. Never creates a new order.
    pub async fn retry_invoice(
        &mut self,
        store: &mut CartStore,
    ) -> Result<CheckoutSuccess, CheckoutError> {
        if self.state == CheckoutState::Submitting {
            return Err(CheckoutError::CheckoutInProgress);
        }

        let pending = match self.state {
            CheckoutState::Failed(CommitStage::Invoice) => match self.pending.take() {
                Some(pending) => pending,
                None => return Err(CheckoutError::NothingToRetry),
            },
            _ => return Err(CheckoutError::NothingToRetry),
        };

        debug!(order_number = %pending.order.order_number, "retrying invoice");
        self.finish_invoice(store, pending.order, pending.draft).await
    }

    // Shared tail of submit and retry_invoice: submit the invoice, and on
    // success clear the cart and render the receipt.
    async fn finish_invoice(
        &mut self,
        store: &mut CartStore,
        order: Order,
        draft: InvoiceDraft,
    ) -> Result<CheckoutSuccess, CheckoutError> {
        self.state = CheckoutState::Submitting;

        let invoice_number = match self.gateway.submit_invoice(&draft).await {
            Ok(invoice_number) => invoice_number,
            Err(source) => {
                self.state = CheckoutState::Failed(CommitStage::Invoice);
                let order_number = order.order_number.clone();
                self.pending = Some(PendingInvoice { order, draft });
                warn!(
                    %order_number,
                    %source,
                    "invoice submission failed; order already exists, cart preserved"
                );
                return Err(CheckoutError::OrderCreatedInvoiceFailed {
                    order_number,
                    source,
                });
            }
        };

        let invoice = Invoice {
            invoice_number: invoice_number.clone(),
            order_number: draft.order_number.clone(),
            total: draft.total,
            paid_by: draft.paid_by,
            tendered: draft.tendered,
            change: draft.change,
            verified_by: draft.verified_by,
            created_at: Utc::now(),
        };

        // Both records durable: only now is the cart allowed to go away.
        self.state = CheckoutState::InvoiceCreated;
        self.attempt_key = None;
        self.pending = None;
        store.clear();
        info!(
            order_number = %invoice.order_number,
            %invoice_number,
            "checkout committed, cart cleared"
        );

        let receipt = match self.formatter.render(&order, &invoice) {
            Ok(receipt) => Some(receipt),
            Err(err) => {
                warn!(%err, "could not render receipt; checkout already committed");
                None
            }
        };

        Ok(CheckoutSuccess {
            order,
            invoice,
            receipt,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::ports::CartStorage;
    use crate::storage::InMemoryCartStorage;
    use chrono::Duration;
    use checkout_core::cart::AppliedDiscount;
    use checkout_core::{Cart, DiscountCode, DiscountKind, Product};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Gateway double recording every draft it receives; failures are
    /// injectable per step.
    #[derive(Default)]
    struct MockGateway {
        orders: Mutex<Vec<OrderDraft>>,
        invoices: Mutex<Vec<InvoiceDraft>>,
        fail_order: AtomicBool,
        fail_invoice: AtomicBool,
    }

    impl MockGateway {
        fn set_fail_on_order(&self, fail: bool) {
            self.fail_order.store(fail, Ordering::SeqCst);
        }

        fn set_fail_on_invoice(&self, fail: bool) {
            self.fail_invoice.store(fail, Ordering::SeqCst);
        }

        fn order_attempts(&self) -> Vec<OrderDraft> {
            self.orders.lock().unwrap().clone()
        }

        fn invoice_attempts(&self) -> Vec<InvoiceDraft> {
            self.invoices.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl SalesGateway for MockGateway {
        async fn submit_order(&self, draft: &OrderDraft) -> Result<String, GatewayError> {
            let mut orders = self.orders.lock().unwrap();
            orders.push(draft.clone());
            if self.fail_order.load(Ordering::SeqCst) {
                return Err(GatewayError::Transport("connection reset".to_string()));
            }
            Ok(format!("ORD-{:04}", orders.len()))
        }

        async fn submit_invoice(&self, draft: &InvoiceDraft) -> Result<String, GatewayError> {
            let mut invoices = self.invoices.lock().unwrap();
            invoices.push(draft.clone());
            if self.fail_invoice.load(Ordering::SeqCst) {
                return Err(GatewayError::Transport("connection reset".to_string()));
            }
            Ok(format!("INV-{:04}", invoices.len()))
        }
    }

    fn product(id: &str, price: i64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            unit_price: Money::from_minor(price),
            stock,
        }
    }

    struct Harness {
        gateway: Arc<MockGateway>,
        storage: Arc<InMemoryCartStorage>,
        store: CartStore,
        orchestrator: CheckoutOrchestrator,
    }

    fn harness() -> Harness {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let gateway = Arc::new(MockGateway::default());
        let storage = Arc::new(InMemoryCartStorage::new());
        let store = CartStore::open(storage.clone());
        let orchestrator = CheckoutOrchestrator::new(
            gateway.clone(),
            ReceiptFormatter::new(EngineConfig::default()),
            "emp-7",
        );
        Harness {
            gateway,
            storage,
            store,
            orchestrator,
        }
    }

    #[tokio::test]
    async fn test_cash_checkout_commits_and_clears_cart() {
        let mut h = harness();
        h.store.add_item(&product("1", 18_500, 10), 1).unwrap();

        let success = h
            .orchestrator
            .submit(&mut h.store, Tender::cash(Money::from_minor(20_000)))
            .await
            .unwrap();

        assert_eq!(success.order.order_number, "ORD-0001");
        assert_eq!(success.order.total.minor(), 18_500);
        assert_eq!(success.invoice.order_number, "ORD-0001");
        assert_eq!(success.invoice.tendered.unwrap().minor(), 20_000);
        assert_eq!(success.invoice.change.unwrap().minor(), 1_500);
        assert_eq!(success.invoice.verified_by, "emp-7");
        assert!(success.receipt.is_some());

        assert!(h.store.is_empty());
        assert!(h.storage.raw().is_none());
        assert_eq!(h.orchestrator.state(), CheckoutState::InvoiceCreated);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected_before_any_network_call() {
        let mut h = harness();

        let err = h
            .orchestrator
            .submit(&mut h.store, Tender::cash(Money::from_minor(20_000)))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::EmptyCart));
        assert!(h.gateway.order_attempts().is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_tender_rejected_before_any_network_call() {
        let mut h = harness();
        h.store.add_item(&product("1", 25_000, 10), 1).unwrap();

        let err = h
            .orchestrator
            .submit(&mut h.store, Tender::cash(Money::from_minor(20_000)))
            .await
            .unwrap_err();

        match err {
            CheckoutError::InsufficientTender { total, tendered } => {
                assert_eq!(total.minor(), 25_000);
                assert_eq!(tendered.minor(), 20_000);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(h.gateway.order_attempts().is_empty());
        assert!(!h.store.is_empty());
    }

    #[tokio::test]
    async fn test_qr_checkout_has_no_tender_fields_and_a_qr_receipt() {
        let mut h = harness();
        h.store.add_item(&product("1", 18_500, 10), 1).unwrap();

        let success = h
            .orchestrator
            .submit(&mut h.store, Tender::qr())
            .await
            .unwrap();

        assert_eq!(success.invoice.paid_by, PaymentMethod::Qr);
        assert!(success.invoice.tendered.is_none());
        assert!(success.invoice.change.is_none());
        assert!(success.receipt.unwrap().qr_payload.is_some());
    }

    #[tokio::test]
    async fn test_stale_discount_aborts_checkout() {
        let h = harness();

        // Persist a cart whose applied discount has expired since it was
        // entered, then reopen: restore is verbatim, the final check drops it.
        let mut cart = Cart::new();
        cart.add_line(&product("1", 100_000, 10), 1).unwrap();
        cart.discount = Some(AppliedDiscount {
            rule: DiscountCode {
                code: "LAMA".to_string(),
                kind: DiscountKind::Percentage,
                value: 10,
                min_purchase: Money::zero(),
                max_discount: None,
                starts_at: Utc::now() - Duration::days(10),
                ends_at: Utc::now() - Duration::days(1),
                usage_limit: None,
                used_count: 0,
            },
            amount: Money::from_minor(10_000),
        });
        h.storage.save(&cart);

        let mut store = CartStore::open(h.storage.clone());
        assert!(store.cart().discount.is_some());

        let mut orchestrator = h.orchestrator;
        let err = orchestrator
            .submit(&mut store, Tender::cash(Money::from_minor(200_000)))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::DiscountInvalid(DiscountError::Expired { .. })
        ));
        assert!(h.gateway.order_attempts().is_empty());
        // The stale code is dropped, not silently kept with a stale amount
        assert!(store.cart().discount.is_none());
        assert!(!store.is_empty());
    }

    #[tokio::test]
    async fn test_invoice_failure_leaves_order_and_preserves_cart() {
        let mut h = harness();
        h.store.add_item(&product("1", 18_500, 10), 1).unwrap();
        h.gateway.set_fail_on_invoice(true);

        let err = h
            .orchestrator
            .submit(&mut h.store, Tender::cash(Money::from_minor(20_000)))
            .await
            .unwrap_err();

        match err {
            CheckoutError::OrderCreatedInvoiceFailed { order_number, .. } => {
                assert_eq!(order_number, "ORD-0001");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        // The order exists even though the checkout failed
        assert_eq!(h.gateway.order_attempts().len(), 1);
        assert_eq!(
            h.orchestrator.state(),
            CheckoutState::Failed(CommitStage::Invoice)
        );
        assert_eq!(h.orchestrator.pending_order_number(), Some("ORD-0001"));
        // The cashier is visibly blocked, not silently losing the sale
        assert!(!h.store.is_empty());
        assert!(h.storage.raw().is_some());
    }

    #[tokio::test]
    async fn test_submit_during_invoice_window_never_creates_a_fresh_order() {
        let mut h = harness();
        h.store.add_item(&product("1", 18_500, 10), 1).unwrap();
        h.gateway.set_fail_on_invoice(true);

        let _ = h
            .orchestrator
            .submit(&mut h.store, Tender::cash(Money::from_minor(20_000)))
            .await;

        let err = h
            .orchestrator
            .submit(&mut h.store, Tender::cash(Money::from_minor(20_000)))
            .await
            .unwrap_err();

        match err {
            CheckoutError::InvoicePending { order_number } => {
                assert_eq!(order_number, "ORD-0001");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(h.gateway.order_attempts().len(), 1);
    }

    #[tokio::test]
    async fn test_retry_invoice_reuses_the_existing_order() {
        let mut h = harness();
        h.store.add_item(&product("1", 18_500, 10), 1).unwrap();
        h.gateway.set_fail_on_invoice(true);

        let _ = h
            .orchestrator
            .submit(&mut h.store, Tender::cash(Money::from_minor(20_000)))
            .await;

        h.gateway.set_fail_on_invoice(false);
        let success = h.orchestrator.retry_invoice(&mut h.store).await.unwrap();

        assert_eq!(success.order.order_number, "ORD-0001");
        assert_eq!(success.invoice.order_number, "ORD-0001");
        // One order submission total; the invoice needed two attempts
        assert_eq!(h.gateway.order_attempts().len(), 1);
        assert_eq!(h.gateway.invoice_attempts().len(), 2);
        assert!(h.store.is_empty());
        assert_eq!(h.orchestrator.state(), CheckoutState::InvoiceCreated);
    }

    #[tokio::test]
    async fn test_retry_invoice_without_failure_is_rejected() {
        let mut h = harness();
        let err = h.orchestrator.retry_invoice(&mut h.store).await.unwrap_err();
        assert!(matches!(err, CheckoutError::NothingToRetry));
    }

    #[tokio::test]
    async fn test_order_retry_reuses_idempotency_key() {
        let mut h = harness();
        h.store.add_item(&product("1", 18_500, 10), 1).unwrap();
        h.gateway.set_fail_on_order(true);

        let err = h
            .orchestrator
            .submit(&mut h.store, Tender::cash(Money::from_minor(20_000)))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::OrderSubmitFailed { .. }));
        assert_eq!(
            h.orchestrator.state(),
            CheckoutState::Failed(CommitStage::Order)
        );
        assert!(!h.store.is_empty());

        h.gateway.set_fail_on_order(false);
        h.orchestrator
            .submit(&mut h.store, Tender::cash(Money::from_minor(20_000)))
            .await
            .unwrap();

        let attempts = h.gateway.order_attempts();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].idempotency_key, attempts[1].idempotency_key);
    }

    #[tokio::test]
    async fn test_distinct_checkouts_use_distinct_idempotency_keys() {
        let mut h = harness();

        h.store.add_item(&product("1", 18_500, 10), 1).unwrap();
        h.orchestrator
            .submit(&mut h.store, Tender::cash(Money::from_minor(20_000)))
            .await
            .unwrap();

        h.store.add_item(&product("2", 5_000, 10), 1).unwrap();
        h.orchestrator
            .submit(&mut h.store, Tender::cash(Money::from_minor(5_000)))
            .await
            .unwrap();

        let attempts = h.gateway.order_attempts();
        assert_eq!(attempts.len(), 2);
        assert_ne!(attempts[0].idempotency_key, attempts[1].idempotency_key);
    }

    #[tokio::test]
    async fn test_resubmit_after_success_is_empty_cart_not_duplicate_order() {
        let mut h = harness();
        h.store.add_item(&product("1", 18_500, 10), 1).unwrap();

        h.orchestrator
            .submit(&mut h.store, Tender::cash(Money::from_minor(20_000)))
            .await
            .unwrap();

        let err = h
            .orchestrator
            .submit(&mut h.store, Tender::cash(Money::from_minor(20_000)))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::EmptyCart));
        assert_eq!(h.gateway.order_attempts().len(), 1);
    }

    #[tokio::test]
    async fn test_order_draft_carries_discount_fields() {
        let mut h = harness();
        h.store.add_item(&product("1", 100_000, 10), 1).unwrap();

        let mut cart = h.store.cart().clone();
        cart.discount = Some(AppliedDiscount {
            rule: DiscountCode {
                code: "HEMAT10".to_string(),
                kind: DiscountKind::Percentage,
                value: 10,
                min_purchase: Money::zero(),
                max_discount: None,
                starts_at: Utc::now() - Duration::days(1),
                ends_at: Utc::now() + Duration::days(1),
                usage_limit: None,
                used_count: 0,
            },
            amount: Money::from_minor(10_000),
        });
        h.storage.save(&cart);
        let mut store = CartStore::open(h.storage.clone());

        let mut orchestrator = h.orchestrator;
        let success = orchestrator
            .submit(&mut store, Tender::cash(Money::from_minor(90_000)))
            .await
            .unwrap();

        let draft = &h.gateway.order_attempts()[0];
        assert_eq!(draft.discount_code.as_deref(), Some("HEMAT10"));
        assert_eq!(draft.discount_amount.minor(), 10_000);
        assert_eq!(draft.subtotal.minor(), 100_000);
        assert_eq!(draft.total.minor(), 90_000);
        assert_eq!(success.invoice.change.unwrap().minor(), 0);
    }
}
