//! # Order Hand-off
//!
//! The finalized order payload and the seam to whatever places it.
//!
//! ## Flow
//! ```text
//! ┌──────────────┐  OrderRequest   ┌─────────────────────┐
//! │ CheckoutFlow │ ──────────────► │ impl OrderSubmitter │ ──► order backend
//! │  (REVIEW)    │ ◄────────────── │  (HTTP, queue, ...) │
//! └──────────────┘  OrderReceipt   └─────────────────────┘
//!        │
//!        ▼ on success only
//!    CONFIRMED
//! ```
//!
//! A retry after a failed submission sends the same `request_id` and
//! `order_number`, so the backend can drop duplicates.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::gst::GstBreakup;
use crate::payment::PaymentInstrument;
use crate::types::{Address, CustomerTier, OrderTotals, PricedLine};

/// Builds an order number from a timestamp: `ORD-<unix millis>`.
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use checkout_core::order::generate_order_number;
///
/// let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
/// assert_eq!(generate_order_number(at), "ORD-1700000000123");
/// ```
pub fn generate_order_number(at: DateTime<Utc>) -> String {
    format!("ORD-{}", at.timestamp_millis())
}

// =============================================================================
// Order Request
// =============================================================================

/// Everything the order backend needs to place an order.
///
/// Totals are unrounded; `lines` are the same priced lines the review
/// screen showed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    /// Idempotency key, fixed for the lifetime of one checkout.
    #[ts(as = "String")]
    pub request_id: Uuid,
    pub order_number: String,
    pub customer_tier: CustomerTier,
    pub shipping_address: Address,
    /// Same as `shipping_address` when the customer ticked "same as shipping".
    pub billing_address: Address,
    pub payment: PaymentInstrument,
    pub lines: Vec<PricedLine>,
    pub totals: OrderTotals,
    pub gst: GstBreakup,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderRequest {
    /// Totals rounded for display.
    pub fn display_totals(&self) -> OrderTotals {
        self.totals.rounded()
    }
}

/// What the order backend hands back for an accepted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt {
    /// Backend identifier of the created order.
    pub order_id: String,
    /// Order number as stored by the backend, when it differs from ours.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
}

impl OrderReceipt {
    pub fn new(order_id: impl Into<String>) -> Self {
        OrderReceipt {
            order_id: order_id.into(),
            order_number: None,
        }
    }
}

/// A confirmed order: what was sent and what came back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub request: OrderRequest,
    pub receipt: OrderReceipt,
}

impl OrderConfirmation {
    /// The backend's order number if it assigned one, otherwise ours.
    pub fn order_number(&self) -> &str {
        self.receipt
            .order_number
            .as_deref()
            .unwrap_or(&self.request.order_number)
    }
}

// =============================================================================
// Submitter
// =============================================================================

/// Places a finalized order.
///
/// Implementations talk to the order backend. Checkout only moves to
/// CONFIRMED once `submit` returns `Ok`.
///
/// ## Example
/// ```rust
/// use std::convert::Infallible;
/// use std::future::Future;
/// use checkout_core::order::{OrderReceipt, OrderRequest, OrderSubmitter};
///
/// struct AcceptAll;
///
/// impl OrderSubmitter for AcceptAll {
///     type Error = Infallible;
///
///     fn submit(
///         &self,
///         order: &OrderRequest,
///     ) -> impl Future<Output = Result<OrderReceipt, Self::Error>> + Send {
///         let receipt = OrderReceipt::new(order.order_number.clone());
///         async move { Ok(receipt) }
///     }
/// }
/// ```
pub trait OrderSubmitter {
    type Error: std::error::Error + Send + Sync + 'static;

    fn submit(
        &self,
        order: &OrderRequest,
    ) -> impl Future<Output = Result<OrderReceipt, Self::Error>> + Send;
}

// =============================================================================
// Unit Tests
// =============================================================================
