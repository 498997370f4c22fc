//! # checkout-core: Storefront Checkout Pricing and Flow
//!
//! Everything between "customer has a cart" and "order handed to the order
//! backend": line pricing, GST, shipping and COD rules, and the step-by-step
//! checkout that collects addresses and payment.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Storefront Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Storefront (browser)                         │   │
//! │  │    Cart page ──► Address ──► Payment ──► Review ──► Thank you  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON (serde) / TS bindings (ts-rs)    │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ checkout-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  pricing  │  │    gst    │  │ checkout  │  │validation │  │   │
//! │  │   │  Engine   │  │ CGST/SGST │  │   Flow    │  │  address  │  │   │
//! │  │   │  Totals   │  │   IGST    │  │   Steps   │  │  payment  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO DATABASE • NO NETWORK • ONE AWAIT POINT (confirm)         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ OrderSubmitter (trait)                 │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    Order backend                                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Decimal money, rounded only for display
//! - [`types`] - Products, cart lines, tiers, addresses, totals
//! - [`pricing`] - Unit price, GST, shipping and COD rules
//! - [`gst`] - CGST/SGST vs IGST
//! - [`validation`] - Field checks for checkout forms
//! - [`payment`] - Payment selection and the order's payment instrument
//! - [`checkout`] - The ADDRESS → PAYMENT → REVIEW → CONFIRMED flow
//! - [`order`] - Order payload and the submitter seam
//! - [`config`] - Shop constants from TOML and environment
//! - [`error`] - Error types
//!
//! ## Design Principles
//!
//! 1. **One pricing path**: cart summary and review both call
//!    [`PricingEngine::price_order`]
//! 2. **Round once**: amounts stay unrounded until they are displayed
//! 3. **Nothing fatal**: every error leaves the checkout where it was
//!
//! ## Example Usage
//!
//! ```rust
//! use checkout_core::{CartLine, CustomerTier, GstRate, Money, PaymentMethod, PricingEngine, ProductPricing};
//!
//! let shirt = ProductPricing::new(Money::from_major(400), true, GstRate::from_whole(5), 20);
//! let cart = vec![CartLine::new(shirt, 1)];
//!
//! let (_, totals) = PricingEngine::default().price_order(&cart, CustomerTier::Individual, PaymentMethod::Upi).unwrap();
//!
//! // 400 + 20 GST + 50 shipping (400 is not above 500)
//! assert_eq!(totals.grand_total, Money::from_major(470));
//! assert_eq!(totals.grand_total.to_string(), "₹470.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod config;
pub mod error;
pub mod gst;
pub mod money;
pub mod order;
pub mod payment;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use checkout_core::Money` instead of
// `use checkout_core::money::Money`

pub use checkout::{AddressForm, CheckoutFlow, CheckoutState, CheckoutStep, OrderReview};
pub use config::PricingConfig;
pub use error::{ConfirmError, CoreError, CoreResult, FieldErrors, ValidationError};
pub use gst::{GstBreakup, GstRegime};
pub use money::Money;
pub use order::{OrderConfirmation, OrderReceipt, OrderRequest, OrderSubmitter};
pub use payment::{PaymentDetails, PaymentInstrument, PaymentSelection};
pub use pricing::PricingEngine;
pub use types::*;
