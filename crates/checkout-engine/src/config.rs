//! # Engine Configuration
//!
//! Store identity and display settings used by receipt rendering.
//!
//! Read-only after initialization; the embedding storefront decides where
//! the values come from (settings screen, config file, defaults here).

use serde::{Deserialize, Serialize};

use checkout_core::Money;

/// Checkout engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Store name printed at the top of receipts.
    pub store_name: String,

    /// Store address lines printed under the name.
    pub store_address: Vec<String>,

    /// Currency code (ISO 4217).
    pub currency_code: String,

    /// Currency symbol for display.
    pub currency_symbol: String,

    /// Number of decimal places the minor unit carries in display.
    pub currency_decimals: u8,

    /// Receipt paper width in characters (typically 32, 42, or 48).
    pub paper_width: u8,
}

impl EngineConfig {
    /// Formats an amount for display: symbol + grouped digits + decimals.
    ///
    /// ## Example
    /// ```rust
    /// use checkout_core::Money;
    /// use checkout_engine::config::EngineConfig;
    ///
    /// let config = EngineConfig::default();
    /// assert_eq!(config.format_money(Money::from_minor(18_500)), "Rp 18,500");
    /// ```
    pub fn format_money(&self, amount: Money) -> String {
        if self.currency_decimals == 0 {
            return format!("{} {}", self.currency_symbol, amount);
        }

        let scale = 10_i64.pow(self.currency_decimals as u32);
        let major = amount.minor() / scale;
        let minor = (amount.minor() % scale).abs();
        let sign = if amount.is_negative() && major == 0 {
            "-"
        } else {
            ""
        };
        format!(
            "{} {}{}.{:0width$}",
            self.currency_symbol,
            sign,
            Money::from_minor(major),
            minor,
            width = self.currency_decimals as usize
        )
    }
}

impl Default for EngineConfig {
    /// Defaults suitable for development.
    fn default() -> Self {
        EngineConfig {
            store_name: "Storefront Dev Store".to_string(),
            store_address: vec!["Jl. Contoh No. 1".to_string()],
            currency_code: "IDR".to_string(),
            currency_symbol: "Rp".to_string(),
            currency_decimals: 0,
            paper_width: 42,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
