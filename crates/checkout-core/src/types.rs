//! # Domain Types
//!
//! Core domain types shared by the pricing engine and the checkout flow.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ ProductPricing  │   │    CartLine     │   │   PricedLine    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  base_price     │──►│  product        │──►│  unit_price     │       │
//! │  │  business_price │   │  quantity       │   │  line_subtotal  │       │
//! │  │  gst_rate       │   └─────────────────┘   │  line_tax       │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  CustomerTier   │   │ PaymentMethod   │   │  OrderTotals    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  INDIVIDUAL     │   │  CREDIT_CARD    │   │  subtotal       │       │
//! │  │  BUSINESS       │   │  DEBIT_CARD     │   │  tax_total      │       │
//! │  └─────────────────┘   │  NET_BANKING    │   │  shipping       │       │
//! │                        │  UPI, COD       │   │  cod_surcharge  │       │
//! │                        └─────────────────┘   │  grand_total    │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// GST Rate
// =============================================================================

/// GST rate as a decimal percentage.
///
/// `18` means 18%, not `0.18`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GstRate(#[ts(as = "String")] Decimal);

impl GstRate {
    /// Creates a rate from a decimal percentage.
    #[inline]
    pub const fn from_percent(percent: Decimal) -> Self {
        GstRate(percent)
    }

    /// Creates a rate from a whole-number percentage (5, 12, 18, 28).
    #[inline]
    pub fn from_whole(percent: u32) -> Self {
        GstRate(Decimal::from(percent))
    }

    /// Returns the percentage.
    #[inline]
    pub const fn percent(&self) -> Decimal {
        self.0
    }

    /// Zero rate (exempt goods).
    #[inline]
    pub const fn zero() -> Self {
        GstRate(Decimal::ZERO)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Default for GstRate {
    fn default() -> Self {
        GstRate::zero()
    }
}

impl fmt::Display for GstRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}

// =============================================================================
// Customer Tier
// =============================================================================

/// Customer classification deciding which unit price applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerTier {
    /// Retail customer, pays `base_price`.
    #[default]
    Individual,
    /// Registered business, pays `business_price` when the product has one.
    Business,
}

// =============================================================================
// Product Pricing
// =============================================================================

/// The pricing attributes of a catalog product (read-only input).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductPricing {
    /// Catalog identifier, carried into the order snapshot.
    #[serde(default)]
    pub product_id: Option<String>,

    /// Display name, carried into the order snapshot.
    #[serde(default)]
    pub name: Option<String>,

    /// Stock keeping unit / part number.
    #[serde(default)]
    pub sku: Option<String>,

    /// Unit price for individual customers.
    pub base_price: Money,

    /// Unit price for business customers, when the product has one.
    #[serde(default)]
    pub business_price: Option<Money>,

    /// Whether GST is charged on this product.
    pub gst_applicable: bool,

    /// GST percentage.
    pub gst_rate: GstRate,

    /// Units on hand when the cart was priced.
    pub stock_quantity: u32,
}

impl ProductPricing {
    /// Creates pricing attributes with no business price and no descriptive fields.
    pub fn new(base_price: Money, gst_applicable: bool, gst_rate: GstRate, stock_quantity: u32) -> Self {
        ProductPricing {
            product_id: None,
            name: None,
            sku: None,
            base_price,
            business_price: None,
            gst_applicable,
            gst_rate,
            stock_quantity,
        }
    }

    /// Sets the business-tier unit price.
    pub fn with_business_price(mut self, price: Money) -> Self {
        self.business_price = Some(price);
        self
    }

    /// Sets the catalog id and display name.
    pub fn with_identity(mut self, product_id: impl Into<String>, name: impl Into<String>) -> Self {
        self.product_id = Some(product_id.into());
        self.name = Some(name.into());
        self
    }

    /// Checks whether `quantity` units can be supplied from stock.
    pub fn can_supply(&self, quantity: u32) -> bool {
        quantity <= self.stock_quantity
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// A product and the quantity the customer wants.
///
/// `quantity` must not exceed `product.stock_quantity`; the caller enforces
/// that before pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product: ProductPricing,
    pub quantity: u32,
}

impl CartLine {
    pub fn new(product: ProductPricing, quantity: u32) -> Self {
        CartLine { product, quantity }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    NetBanking,
    Upi,
    /// Cash on delivery, carries a flat surcharge.
    #[serde(rename = "COD")]
    Cod,
}

impl PaymentMethod {
    /// Every method offered at checkout.
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::CreditCard,
        PaymentMethod::DebitCard,
        PaymentMethod::NetBanking,
        PaymentMethod::Upi,
        PaymentMethod::Cod,
    ];

    /// Wire name, as the order backend expects it.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "CREDIT_CARD",
            PaymentMethod::DebitCard => "DEBIT_CARD",
            PaymentMethod::NetBanking => "NET_BANKING",
            PaymentMethod::Upi => "UPI",
            PaymentMethod::Cod => "COD",
        }
    }

    /// Card methods need card details.
    pub const fn is_card(&self) -> bool {
        matches!(self, PaymentMethod::CreditCard | PaymentMethod::DebitCard)
    }

    /// Checks if this is cash on delivery.
    pub const fn is_cod(&self) -> bool {
        matches!(self, PaymentMethod::Cod)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Address
// =============================================================================

/// A postal address as entered at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    /// Six-digit Indian PIN code.
    pub postal_code: String,
    pub country: String,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address_line1)?;
        if let Some(line2) = self.address_line2.as_deref().filter(|l| !l.trim().is_empty()) {
            write!(f, ", {}", line2)?;
        }
        write!(
            f,
            ", {}, {} - {}, {}",
            self.city, self.state, self.postal_code, self.country
        )
    }
}

// =============================================================================
// Priced Line
// =============================================================================

/// A cart line with its prices worked out. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricedLine {
    /// The cart line as it was priced.
    pub line: CartLine,
    /// Unit price chosen for the customer tier.
    pub unit_price: Money,
    /// `unit_price × quantity`.
    pub line_subtotal: Money,
    /// GST on `line_subtotal`, zero when GST does not apply.
    pub line_tax: Money,
}

impl PricedLine {
    /// Line subtotal plus its tax.
    pub fn line_total(&self) -> Money {
        self.line_subtotal + self.line_tax
    }
}

// =============================================================================
// Cart Pricing
// =============================================================================

/// Per-line and aggregate figures for a whole cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartPricing {
    pub lines: Vec<PricedLine>,
    /// Sum of unrounded line subtotals.
    pub subtotal: Money,
    /// Sum of unrounded line taxes.
    pub tax_total: Money,
}

impl CartPricing {
    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.line.quantity)).sum()
    }

    /// Checks if the cart had no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// Order Totals
// =============================================================================

/// The money summary of an order. Immutable once built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Money,
    pub tax_total: Money,
    pub shipping_charge: Money,
    pub cod_surcharge: Money,
    pub grand_total: Money,
}

impl OrderTotals {
    /// Copy with every figure rounded to 2 fraction digits, for display.
    pub fn rounded(&self) -> OrderTotals {
        OrderTotals {
            subtotal: self.subtotal.rounded(),
            tax_total: self.tax_total.rounded(),
            shipping_charge: self.shipping_charge.rounded(),
            cod_surcharge: self.cod_surcharge.rounded(),
            grand_total: self.grand_total.rounded(),
        }
    }

    /// Checks if the order ships for free.
    pub fn has_free_shipping(&self) -> bool {
        self.shipping_charge.is_zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
