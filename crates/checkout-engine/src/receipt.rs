//! # Receipt Formatter
//!
//! Renders a completed `(Order, Invoice)` pair into a receipt,
//! deterministically, from already-committed data only.
//!
//! ## Invariant
//! The formatter never recomputes business totals. It echoes the committed
//! `subtotal`, `discount_amount`, `total` and `change` exactly as stored;
//! a rendering bug can garble a receipt but can never contradict the books.
//!
//! ## Failure Semantics
//! Formatting never fails a checkout: by the time `render` runs, Order and
//! Invoice are already durable. The orchestrator reports a render error as
//! a non-fatal "could not print receipt" condition and the caller may retry
//! `render` independently.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use ts_rs::TS;

use checkout_core::{Invoice, Money, Order, PaymentMethod};

use crate::config::EngineConfig;

/// Narrowest paper the plain-text layout can fit.
pub const MIN_PAPER_WIDTH: u8 = 20;

// =============================================================================
// Receipt Error
// =============================================================================

/// Receipt rendering failures. Non-fatal by contract (§ failure semantics).
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// The configured paper is too narrow for the layout.
    #[error("receipt paper width {width} is below the minimum {min}")]
    PaperTooNarrow { width: u8, min: u8 },

    /// The QR scan payload could not be serialized.
    #[error("QR payload serialization failed: {0}")]
    Payload(#[from] serde_json::Error),
}

// =============================================================================
// Receipt
// =============================================================================

/// One printed line of a receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

/// An immutable snapshot of a completed transaction, ready for display or
/// printing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub store_name: String,
    pub store_address: Vec<String>,

    pub order_number: String,
    pub invoice_number: String,

    /// RFC 3339 timestamp of the invoice.
    pub issued_at: String,

    pub lines: Vec<ReceiptLine>,

    pub subtotal: Money,
    pub discount_code: Option<String>,
    pub discount_amount: Money,
    pub total: Money,

    pub paid_by: PaymentMethod,
    pub tendered: Option<Money>,
    pub change: Option<Money>,
    pub verified_by: String,

    /// Opaque scan payload for QR payments; display-only, settled
    /// externally.
    pub qr_payload: Option<String>,
}

/// What a QR scanner reads off the receipt. Informational only; this
/// engine neither verifies nor settles it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrScanPayload {
    pub invoice_number: String,
    pub order_number: String,
    pub total: Money,
    pub currency_code: String,
}

// =============================================================================
// Receipt Formatter
// =============================================================================

/// Renders committed transactions into [`Receipt`]s and printable text.
#[derive(Debug, Clone)]
pub struct ReceiptFormatter {
    config: EngineConfig,
}

impl ReceiptFormatter {
    /// Creates a formatter with the given store configuration.
    pub fn new(config: EngineConfig) -> Self {
        ReceiptFormatter { config }
    }

    /// Builds a [`Receipt`] from a committed pair.
    ///
    /// Deterministic: the same `(order, invoice, config)` always yields the
    /// same receipt.
    pub fn render(&self, order: &Order, invoice: &Invoice) -> Result<Receipt, ReceiptError> {
        debug!(order_number = %order.order_number, invoice_number = %invoice.invoice_number, "render receipt");

        if self.config.paper_width < MIN_PAPER_WIDTH {
            return Err(ReceiptError::PaperTooNarrow {
                width: self.config.paper_width,
                min: MIN_PAPER_WIDTH,
            });
        }

        let qr_payload = match invoice.paid_by {
            PaymentMethod::Qr => Some(serde_json::to_string(&QrScanPayload {
                invoice_number: invoice.invoice_number.clone(),
                order_number: invoice.order_number.clone(),
                total: invoice.total,
                currency_code: self.config.currency_code.clone(),
            })?),
            PaymentMethod::Cash => None,
        };

        Ok(Receipt {
            store_name: self.config.store_name.clone(),
            store_address: self.config.store_address.clone(),
            order_number: order.order_number.clone(),
            invoice_number: invoice.invoice_number.clone(),
            issued_at: invoice.created_at.to_rfc3339(),
            lines: order
                .lines
                .iter()
                .map(|l| ReceiptLine {
                    name: l.name.clone(),
                    quantity: l.quantity,
                    unit_price: l.unit_price,
                    line_total: l.line_total,
                })
                .collect(),
            subtotal: order.subtotal,
            discount_code: order.discount_code.clone(),
            discount_amount: order.discount_amount,
            total: invoice.total,
            paid_by: invoice.paid_by,
            tendered: invoice.tendered,
            change: invoice.change,
            verified_by: invoice.verified_by.clone(),
            qr_payload,
        })
    }

    /// Renders a receipt as fixed-width text sized for the configured
    /// paper.
    pub fn render_text(&self, receipt: &Receipt) -> String {
        let width = self.config.paper_width as usize;
        let rule = "-".repeat(width);
        let mut out = String::new();

        out.push_str(&center(&receipt.store_name, width));
        for line in &receipt.store_address {
            out.push_str(&center(line, width));
        }
        out.push_str(&rule);
        out.push('\n');

        out.push_str(&split_row("Order", &receipt.order_number, width));
        out.push_str(&split_row("Invoice", &receipt.invoice_number, width));
        out.push_str(&split_row("Time", &receipt.issued_at, width));
        out.push_str(&rule);
        out.push('\n');

        for line in &receipt.lines {
            out.push_str(&truncate_str(&line.name, width));
            out.push('\n');
            out.push_str(&split_row(
                &format!("  {} x {}", line.quantity, self.config.format_money(line.unit_price)),
                &self.config.format_money(line.line_total),
                width,
            ));
        }
        out.push_str(&rule);
        out.push('\n');

        out.push_str(&split_row(
            "Subtotal",
            &self.config.format_money(receipt.subtotal),
            width,
        ));
        if let Some(code) = &receipt.discount_code {
            out.push_str(&split_row(
                &format!("Discount ({})", code),
                &format!("-{}", self.config.format_money(receipt.discount_amount)),
                width,
            ));
        }
        out.push_str(&split_row(
            "TOTAL",
            &self.config.format_money(receipt.total),
            width,
        ));

        match receipt.paid_by {
            PaymentMethod::Cash => {
                out.push_str(&split_row("Paid", "CASH", width));
                if let Some(tendered) = receipt.tendered {
                    out.push_str(&split_row(
                        "Tendered",
                        &self.config.format_money(tendered),
                        width,
                    ));
                }
                if let Some(change) = receipt.change {
                    out.push_str(&split_row(
                        "Change",
                        &self.config.format_money(change),
                        width,
                    ));
                }
            }
            PaymentMethod::Qr => {
                out.push_str(&split_row("Paid", "QR", width));
            }
        }

        out.push_str(&split_row("Served by", &receipt.verified_by, width));
        out.push_str(&rule);
        out.push('\n');
        out.push_str(&center("Thank you!", width));

        out
    }
}

// =============================================================================
// Text Layout Helpers
// =============================================================================

fn center(text: &str, width: usize) -> String {
    let text = truncate_str(text, width);
    let pad = width.saturating_sub(text.chars().count()) / 2;
    format!("{}{}\n", " ".repeat(pad), text)
}

fn split_row(left: &str, right: &str, width: usize) -> String {
    let left_count = left.chars().count();
    let right_count = right.chars().count();

    if left_count + right_count + 1 > width {
        // Too wide for one row: stack instead of clipping amounts
        return format!("{}\n{:>width$}\n", truncate_str(left, width), right);
    }

    let pad = width - left_count - right_count;
    format!("{}{}{}\n", left, " ".repeat(pad), right)
}

fn truncate_str(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        text.chars().take(width).collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use checkout_core::OrderLine;

    fn committed_pair(paid_by: PaymentMethod) -> (Order, Invoice) {
        let order = Order {
            order_number: "ORD-0042".to_string(),
            employee_id: "emp-7".to_string(),
            lines: vec![
                OrderLine {
                    product_id: "p-1".to_string(),
                    name: "Es Teh".to_string(),
                    unit_price: Money::from_minor(5_000),
                    quantity: 2,
                    line_total: Money::from_minor(10_000),
                },
                OrderLine {
                    product_id: "p-2".to_string(),
                    name: "Nasi Goreng Spesial".to_string(),
                    unit_price: Money::from_minor(15_000),
                    quantity: 1,
                    line_total: Money::from_minor(15_000),
                },
            ],
            subtotal: Money::from_minor(25_000),
            discount_code: Some("HEMAT10".to_string()),
            discount_amount: Money::from_minor(2_500),
            total: Money::from_minor(22_500),
            created_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        };
        let invoice = Invoice {
            invoice_number: "INV-0042".to_string(),
            order_number: "ORD-0042".to_string(),
            total: Money::from_minor(22_500),
            paid_by,
            tendered: match paid_by {
                PaymentMethod::Cash => Some(Money::from_minor(25_000)),
                PaymentMethod::Qr => None,
            },
            change: match paid_by {
                PaymentMethod::Cash => Some(Money::from_minor(2_500)),
                PaymentMethod::Qr => None,
            },
            verified_by: "emp-7".to_string(),
            created_at: Utc.timestamp_opt(1_700_000_060, 0).unwrap(),
        };
        (order, invoice)
    }

    fn formatter() -> ReceiptFormatter {
        ReceiptFormatter::new(EngineConfig::default())
    }

    #[test]
    fn test_render_echoes_committed_totals() {
        let (order, invoice) = committed_pair(PaymentMethod::Cash);
        let receipt = formatter().render(&order, &invoice).unwrap();

        assert_eq!(receipt.subtotal.minor(), 25_000);
        assert_eq!(receipt.discount_amount.minor(), 2_500);
        assert_eq!(receipt.total.minor(), 22_500);
        assert_eq!(receipt.change.unwrap().minor(), 2_500);
        assert_eq!(receipt.lines.len(), 2);
    }

    #[test]
    fn test_render_never_recomputes() {
        // Stored totals deliberately disagree with the line math; the
        // receipt must echo them as committed.
        let (mut order, mut invoice) = committed_pair(PaymentMethod::Cash);
        order.subtotal = Money::from_minor(99_999);
        invoice.total = Money::from_minor(88_888);

        let receipt = formatter().render(&order, &invoice).unwrap();
        assert_eq!(receipt.subtotal.minor(), 99_999);
        assert_eq!(receipt.total.minor(), 88_888);
    }

    #[test]
    fn test_render_text_is_deterministic() {
        let (order, invoice) = committed_pair(PaymentMethod::Cash);
        let fmt = formatter();

        let receipt = fmt.render(&order, &invoice).unwrap();
        let first = fmt.render_text(&receipt);
        let second = fmt.render_text(&fmt.render(&order, &invoice).unwrap());
        assert_eq!(first, second);

        assert!(first.contains("Storefront Dev Store"));
        assert!(first.contains("Rp 22,500"));
        assert!(first.contains("HEMAT10"));
        assert!(first.contains("Change"));
    }

    #[test]
    fn test_text_rows_fit_paper_width() {
        let (order, invoice) = committed_pair(PaymentMethod::Cash);
        let fmt = formatter();
        let text = fmt.render_text(&fmt.render(&order, &invoice).unwrap());

        for row in text.lines() {
            assert!(row.chars().count() <= 42, "row too wide: {:?}", row);
        }
    }

    #[test]
    fn test_qr_payload_round_trips() {
        let (order, invoice) = committed_pair(PaymentMethod::Qr);
        let receipt = formatter().render(&order, &invoice).unwrap();

        let payload: QrScanPayload =
            serde_json::from_str(receipt.qr_payload.as_deref().unwrap()).unwrap();
        assert_eq!(payload.invoice_number, "INV-0042");
        assert_eq!(payload.order_number, "ORD-0042");
        assert_eq!(payload.total.minor(), 22_500);
        assert_eq!(payload.currency_code, "IDR");
    }

    #[test]
    fn test_cash_receipt_has_no_qr_payload() {
        let (order, invoice) = committed_pair(PaymentMethod::Cash);
        let receipt = formatter().render(&order, &invoice).unwrap();
        assert!(receipt.qr_payload.is_none());
    }

    #[test]
    fn test_paper_too_narrow() {
        let config = EngineConfig {
            paper_width: 10,
            ..EngineConfig::default()
        };
        let (order, invoice) = committed_pair(PaymentMethod::Cash);

        let err = ReceiptFormatter::new(config)
            .render(&order, &invoice)
            .unwrap_err();
        assert!(matches!(err, ReceiptError::PaperTooNarrow { width: 10, .. }));
    }
}
