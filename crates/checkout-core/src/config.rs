//! # Pricing Configuration
//!
//! Shop-level constants used by the pricing engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOREFRONT_FREE_SHIPPING_THRESHOLD=500                             │
//! │     STOREFRONT_HOME_STATE_CODE=27                                      │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/storefront/pricing.toml (Linux)                          │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     free shipping above ₹500, ₹50 shipping, ₹50 COD, Maharashtra       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # pricing.toml
//! free_shipping_threshold = "500"
//! flat_shipping_fee = "50"
//! cod_surcharge = "50"
//! home_state_code = "27"
//! currency_symbol = "₹"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

/// Orders with a subtotal strictly above this ship free.
pub const DEFAULT_FREE_SHIPPING_THRESHOLD: i64 = 500;

/// Flat shipping fee below the threshold.
pub const DEFAULT_SHIPPING_FEE: i64 = 50;

/// Flat cash-on-delivery surcharge.
pub const DEFAULT_COD_SURCHARGE: i64 = 50;

/// GST state code of the seller (Maharashtra).
pub const DEFAULT_HOME_STATE_CODE: &str = "27";

fn default_threshold() -> Money {
    Money::from_major(DEFAULT_FREE_SHIPPING_THRESHOLD)
}

fn default_shipping_fee() -> Money {
    Money::from_major(DEFAULT_SHIPPING_FEE)
}

fn default_cod_surcharge() -> Money {
    Money::from_major(DEFAULT_COD_SURCHARGE)
}

fn default_home_state_code() -> String {
    DEFAULT_HOME_STATE_CODE.to_string()
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

/// Pricing configuration.
///
/// ## Fields
/// Every field has a default, so an empty `pricing.toml` is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Subtotal above which shipping is free (strictly greater).
    #[serde(default = "default_threshold")]
    pub free_shipping_threshold: Money,

    /// Shipping fee when the subtotal is at or below the threshold.
    #[serde(default = "default_shipping_fee")]
    pub flat_shipping_fee: Money,

    /// Surcharge for cash on delivery.
    #[serde(default = "default_cod_surcharge")]
    pub cod_surcharge: Money,

    /// Two-digit GST state code of the seller.
    #[serde(default = "default_home_state_code")]
    pub home_state_code: String,

    /// Symbol used by [`PricingConfig::format`].
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            free_shipping_threshold: default_threshold(),
            flat_shipping_fee: default_shipping_fee(),
            cod_surcharge: default_cod_surcharge(),
            home_state_code: default_home_state_code(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

impl PricingConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (pricing.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> CoreResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading pricing config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Pricing config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load pricing config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses a TOML document.
    pub fn from_toml(contents: &str) -> CoreResult<Self> {
        toml::from_str(contents).map_err(|e| CoreError::Config(e.to_string()))
    }

    fn from_file(path: &Path) -> CoreResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&contents)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> CoreResult<()> {
        let fees = [
            ("free_shipping_threshold", self.free_shipping_threshold),
            ("flat_shipping_fee", self.flat_shipping_fee),
            ("cod_surcharge", self.cod_surcharge),
        ];
        if let Some((name, _)) = fees.iter().find(|(_, amount)| amount.is_negative()) {
            return Err(CoreError::Config(format!("{} must not be negative", name)));
        }

        let code = &self.home_state_code;
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(CoreError::Config(format!(
                "home_state_code must be a 2-digit GST state code, got: {}",
                code
            )));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        let money_overrides: [(&str, &mut Money); 3] = [
            ("STOREFRONT_FREE_SHIPPING_THRESHOLD", &mut self.free_shipping_threshold),
            ("STOREFRONT_SHIPPING_FEE", &mut self.flat_shipping_fee),
            ("STOREFRONT_COD_SURCHARGE", &mut self.cod_surcharge),
        ];
        for (var, slot) in money_overrides {
            if let Ok(raw) = std::env::var(var) {
                match raw.parse::<Money>() {
                    Ok(amount) => {
                        debug!(var, %amount, "Overriding pricing config from environment");
                        *slot = amount;
                    }
                    Err(e) => warn!(var, value = %raw, error = %e, "Ignoring unparseable amount"),
                }
            }
        }

        if let Ok(code) = std::env::var("STOREFRONT_HOME_STATE_CODE") {
            debug!(code = %code, "Overriding home state code from environment");
            self.home_state_code = code.trim().to_string();
        }

        if let Ok(symbol) = std::env::var("STOREFRONT_CURRENCY_SYMBOL") {
            self.currency_symbol = symbol;
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "storefront", "storefront")
            .map(|dirs| dirs.config_dir().join("pricing.toml"))
    }

    /// Formats an amount with the configured symbol, rounded to 2 digits.
    ///
    /// ## Example
    /// ```rust
    /// use checkout_core::config::PricingConfig;
    /// use checkout_core::money::Money;
    ///
    /// let config = PricingConfig::default();
    /// assert_eq!(config.format(Money::from_paise(188_850)), "₹1888.50");
    /// ```
    pub fn format(&self, amount: Money) -> String {
        amount.format_with(&self.currency_symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_storefront_rules() {
        let config = PricingConfig::default();
        assert_eq!(config.free_shipping_threshold, Money::from_major(500));
        assert_eq!(config.flat_shipping_fee, Money::from_major(50));
        assert_eq!(config.cod_surcharge, Money::from_major(50));
        assert_eq!(config.home_state_code, "27");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PricingConfig::from_toml(
            r#"
            free_shipping_threshold = "999"
            home_state_code = "29"
            "#,
        )
        .unwrap();
        assert_eq!(config.free_shipping_threshold, Money::from_major(999));
        assert_eq!(config.flat_shipping_fee, Money::from_major(50));
        assert_eq!(config.home_state_code, "29");
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(PricingConfig::from_toml("").unwrap(), PricingConfig::default());
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = PricingConfig::from_toml("cod_surcharge = [").unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = PricingConfig::default();
        config.cod_surcharge = Money::from_major(-1);
        assert!(config.validate().is_err());

        let mut config = PricingConfig::default();
        config.home_state_code = "MH".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("checkout-core-no-such-pricing.toml");
        let config = PricingConfig::load_or_default(Some(path));
        assert_eq!(config.flat_shipping_fee, Money::from_major(50));
    }

    #[test]
    fn test_format_uses_symbol() {
        let config = PricingConfig {
            currency_symbol: "Rs. ".to_string(),
            ..PricingConfig::default()
        };
        assert_eq!(config.format(Money::from_major(50)), "Rs. 50.00");
    }
}
