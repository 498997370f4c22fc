//! # Pricing Engine
//!
//! The single place where cart prices, GST, shipping and the COD surcharge
//! are worked out. The cart page, the review step and the order
//! confirmation all call into here, so every screen shows the same figures.
//!
//! ## Calculation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  for each CartLine:                                                     │
//! │     unit_price    = business_price (BUSINESS + present) | base_price    │
//! │     line_subtotal = unit_price × quantity                               │
//! │     line_tax      = line_subtotal × gst_rate / 100   (if applicable)    │
//! │                                                                         │
//! │  subtotal  = Σ line_subtotal          ┐                                 │
//! │  tax_total = Σ line_tax               │  unrounded                      │
//! │  shipping  = subtotal > 500 ? 0 : 50  │                                 │
//! │  cod       = COD ? 50 : 0             │                                 │
//! │  grand     = subtotal + tax + shipping + cod                            │
//! │                                        └──► rounded() only for display  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use checkout_core::money::Money;
//! use checkout_core::pricing::PricingEngine;
//! use checkout_core::types::{CartLine, CustomerTier, GstRate, PaymentMethod, ProductPricing};
//!
//! let product = ProductPricing::new(Money::from_major(1000), true, GstRate::from_whole(18), 10)
//!     .with_business_price(Money::from_major(800));
//! let cart = vec![CartLine::new(product, 2)];
//!
//! let engine = PricingEngine::default();
//! let (_, totals) = engine.price_order(&cart, CustomerTier::Business, PaymentMethod::CreditCard).unwrap();
//! assert_eq!(totals.grand_total, Money::from_major(1888));
//! ```

use tracing::debug;

use crate::config::PricingConfig;
use crate::error::{CoreError, CoreResult};
use crate::gst::{GstBreakup, GstRegime};
use crate::money::Money;
use crate::types::{CartLine, CartPricing, CustomerTier, OrderTotals, PaymentMethod, PricedLine, ProductPricing};

// =============================================================================
// Per-Line Rules
// =============================================================================

/// Unit price a customer of `tier` pays for `product`.
///
/// Business customers get `business_price` when the product has one;
/// everyone else, and business customers on products without one, pay
/// `base_price`.
pub fn unit_price_for(product: &ProductPricing, tier: CustomerTier) -> Money {
    match (tier, product.business_price) {
        (CustomerTier::Business, Some(business_price)) => business_price,
        _ => product.base_price,
    }
}

/// GST on `quantity` units of `product` at the tier's unit price.
///
/// Zero whenever `gst_applicable` is false, whatever the rate says.
pub fn line_tax(product: &ProductPricing, tier: CustomerTier, quantity: u32) -> CoreResult<Money> {
    if !product.gst_applicable {
        return Ok(Money::ZERO);
    }
    unit_price_for(product, tier)
        .checked_multiply_quantity(quantity)
        .and_then(|subtotal| subtotal.checked_percentage(product.gst_rate))
        .ok_or_else(|| overflow("lineTax"))
}

/// Prices one cart line.
pub fn price_line(line: &CartLine, tier: CustomerTier) -> CoreResult<PricedLine> {
    let unit_price = unit_price_for(&line.product, tier);
    let line_subtotal = unit_price
        .checked_multiply_quantity(line.quantity)
        .ok_or_else(|| overflow("lineSubtotal"))?;

    Ok(PricedLine {
        line: line.clone(),
        unit_price,
        line_subtotal,
        line_tax: line_tax(&line.product, tier, line.quantity)?,
    })
}

fn overflow(field: &str) -> CoreError {
    CoreError::AmountOverflow {
        field: field.to_string(),
    }
}

// =============================================================================
// Pricing Engine
// =============================================================================

/// Stateless pricing calculator.
///
/// Holds only the shop constants; every method is a pure function of its
/// arguments and the config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        PricingEngine { config }
    }

    /// The shop constants in use.
    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// See [`unit_price_for`].
    pub fn unit_price_for(&self, product: &ProductPricing, tier: CustomerTier) -> Money {
        unit_price_for(product, tier)
    }

    /// See [`line_tax`].
    pub fn line_tax(&self, product: &ProductPricing, tier: CustomerTier, quantity: u32) -> CoreResult<Money> {
        line_tax(product, tier, quantity)
    }

    /// Prices every line and sums subtotal and tax without rounding.
    ///
    /// An empty cart prices to zero; that is not an error. Amounts too
    /// large for a `Decimal` give `AmountOverflow`.
    pub fn price_cart(&self, lines: &[CartLine], tier: CustomerTier) -> CoreResult<CartPricing> {
        let lines = lines
            .iter()
            .map(|line| price_line(line, tier))
            .collect::<CoreResult<Vec<PricedLine>>>()?;
        let subtotal = Money::checked_sum(lines.iter().map(|l| l.line_subtotal))
            .ok_or_else(|| overflow("subtotal"))?;
        let tax_total = Money::checked_sum(lines.iter().map(|l| l.line_tax))
            .ok_or_else(|| overflow("taxTotal"))?;

        Ok(CartPricing {
            lines,
            subtotal,
            tax_total,
        })
    }

    /// Adds shipping and the COD surcharge to a priced subtotal.
    ///
    /// ## Rules
    /// - Shipping is free only when `subtotal` is strictly above the
    ///   threshold; exactly ₹500 still pays ₹50
    /// - COD adds the surcharge; no other method does
    pub fn compute_order_totals(
        &self,
        subtotal: Money,
        tax_total: Money,
        payment_method: PaymentMethod,
    ) -> CoreResult<OrderTotals> {
        let shipping_charge = if subtotal > self.config.free_shipping_threshold {
            Money::ZERO
        } else {
            self.config.flat_shipping_fee
        };

        let cod_surcharge = if payment_method.is_cod() {
            self.config.cod_surcharge
        } else {
            Money::ZERO
        };

        let grand_total = Money::checked_sum([subtotal, tax_total, shipping_charge, cod_surcharge])
            .ok_or_else(|| overflow("grandTotal"))?;

        Ok(OrderTotals {
            subtotal,
            tax_total,
            shipping_charge,
            cod_surcharge,
            grand_total,
        })
    }

    /// Prices a cart and works out its order totals in one go.
    pub fn price_order(
        &self,
        lines: &[CartLine],
        tier: CustomerTier,
        payment_method: PaymentMethod,
    ) -> CoreResult<(CartPricing, OrderTotals)> {
        let cart = self.price_cart(lines, tier)?;
        let totals = self.compute_order_totals(cart.subtotal, cart.tax_total, payment_method)?;

        debug!(
            lines = cart.item_count(),
            ?tier,
            %payment_method,
            subtotal = %totals.subtotal,
            tax_total = %totals.tax_total,
            grand_total = %totals.grand_total,
            "Priced order"
        );

        Ok((cart, totals))
    }

    /// Splits a tax total for a buyer in `regime`.
    pub fn gst_breakup(&self, tax_total: Money, regime: GstRegime) -> GstBreakup {
        GstBreakup::split(tax_total, regime)
    }

    /// Resolves the GST regime against the configured seller state.
    pub fn gst_regime(&self, customer_gstin: Option<&str>, shipping_state: &str) -> GstRegime {
        GstRegime::resolve(&self.config.home_state_code, customer_gstin, shipping_state)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
