//! # Checkout Flow
//!
//! The step-by-step checkout of one cart.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ADDRESS ──submit_address──► PAYMENT ──submit_payment──► REVIEW        │
//! │      ▲                          │  ▲                         │          │
//! │      └───────────back───────────┘  └──────────back───────────┤          │
//! │                                                              │          │
//! │                                       confirm (Ok) ──────────▼          │
//! │                                                          CONFIRMED      │
//! │                                                       (nothing leaves)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every rejected operation leaves the flow exactly as it was. Going back
//! keeps what the customer entered, so they can step forward again without
//! retyping.
//!
//! ## Usage
//! ```rust
//! use checkout_core::checkout::{AddressForm, CheckoutFlow, CheckoutStep};
//! use checkout_core::money::Money;
//! use checkout_core::payment::PaymentSelection;
//! use checkout_core::types::{Address, CartLine, CustomerTier, GstRate, PaymentMethod, ProductPricing};
//!
//! let product = ProductPricing::new(Money::from_major(1000), true, GstRate::from_whole(18), 5);
//! let mut flow = CheckoutFlow::start(vec![CartLine::new(product, 2)], CustomerTier::Individual);
//!
//! let address = Address {
//!     address_line1: "12 MG Road".into(),
//!     address_line2: None,
//!     city: "Pune".into(),
//!     state: "Maharashtra".into(),
//!     postal_code: "411001".into(),
//!     country: "India".into(),
//! };
//! flow.submit_address(AddressForm::same_as_shipping(address)).unwrap();
//! flow.submit_payment(PaymentSelection::bare(PaymentMethod::Cod)).unwrap();
//!
//! assert_eq!(flow.step(), CheckoutStep::Review);
//! assert_eq!(flow.review().unwrap().totals.grand_total, Money::from_major(2410));
//! ```

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{ConfirmError, CoreError, CoreResult, FieldErrors};
use crate::gst::GstBreakup;
use crate::order::{generate_order_number, OrderConfirmation, OrderRequest, OrderSubmitter};
use crate::payment::{validate_payment, PaymentDetails, PaymentInstrument, PaymentSelection};
use crate::pricing::PricingEngine;
use crate::types::{Address, CartLine, CustomerTier, OrderTotals, PaymentMethod, PricedLine};
use crate::validation::{collect_address_errors, validate_note};

// =============================================================================
// Checkout Step
// =============================================================================

/// Where a checkout currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckoutStep {
    Address,
    Payment,
    Review,
    Confirmed,
}

impl CheckoutStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutStep::Address => "ADDRESS",
            CheckoutStep::Payment => "PAYMENT",
            CheckoutStep::Review => "REVIEW",
            CheckoutStep::Confirmed => "CONFIRMED",
        }
    }

    /// The step after this one.
    pub fn next(self) -> Option<Self> {
        match self {
            CheckoutStep::Address => Some(CheckoutStep::Payment),
            CheckoutStep::Payment => Some(CheckoutStep::Review),
            CheckoutStep::Review => Some(CheckoutStep::Confirmed),
            CheckoutStep::Confirmed => None,
        }
    }

    /// The step before this one.
    pub fn previous(self) -> Option<Self> {
        match self {
            CheckoutStep::Address => None,
            CheckoutStep::Payment => Some(CheckoutStep::Address),
            CheckoutStep::Review => Some(CheckoutStep::Payment),
            CheckoutStep::Confirmed => Some(CheckoutStep::Review),
        }
    }

    /// CONFIRMED is final.
    pub fn is_terminal(self) -> bool {
        self == CheckoutStep::Confirmed
    }

    /// Whether `to` is an edge of the checkout graph from here.
    ///
    /// REVIEW → CONFIRMED is an edge, but only `confirm` may take it.
    pub fn can_transition_to(self, to: CheckoutStep) -> bool {
        !self.is_terminal() && (self.next() == Some(to) || self.previous() == Some(to))
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Step Input
// =============================================================================

/// What the customer submits on the address step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressForm {
    pub shipping_address: Address,
    #[serde(default)]
    pub billing_address: Option<Address>,
    #[serde(default)]
    pub same_as_shipping: bool,
}

impl AddressForm {
    /// Bill to the shipping address.
    pub fn same_as_shipping(shipping_address: Address) -> Self {
        AddressForm {
            shipping_address,
            billing_address: None,
            same_as_shipping: true,
        }
    }

    /// Separate billing address.
    pub fn with_billing(shipping_address: Address, billing_address: Address) -> Self {
        AddressForm {
            shipping_address,
            billing_address: Some(billing_address),
            same_as_shipping: false,
        }
    }

    /// Validates the shipping address and, unless billing follows
    /// shipping, the billing address.
    ///
    /// A missing billing address reports every billing field as required.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        collect_address_errors(&mut errors, "shippingAddress", &self.shipping_address);

        if !self.same_as_shipping {
            let blank = Address::default();
            let billing = self.billing_address.as_ref().unwrap_or(&blank);
            collect_address_errors(&mut errors, "billingAddress", billing);
        }

        errors.into_result()
    }
}

// =============================================================================
// Checkout State
// =============================================================================

/// Everything captured so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutState {
    pub step: CheckoutStep,
    pub shipping_address: Option<Address>,
    /// Only set when billing differs from shipping.
    pub billing_address: Option<Address>,
    pub same_as_shipping: bool,
    pub payment_method: Option<PaymentMethod>,
    pub payment_details: PaymentDetails,
    pub order_totals: Option<OrderTotals>,
    pub customer_notes: Option<String>,
    pub terms_accepted: bool,
}

impl Default for CheckoutState {
    fn default() -> Self {
        CheckoutState {
            step: CheckoutStep::Address,
            shipping_address: None,
            billing_address: None,
            same_as_shipping: true,
            payment_method: None,
            payment_details: PaymentDetails::default(),
            order_totals: None,
            customer_notes: None,
            terms_accepted: false,
        }
    }
}

impl CheckoutState {
    /// The address to bill, following "same as shipping".
    pub fn effective_billing_address(&self) -> Option<&Address> {
        if self.same_as_shipping {
            self.shipping_address.as_ref()
        } else {
            self.billing_address.as_ref()
        }
    }
}

/// The review screen: priced lines, totals, GST split and payment summary.
///
/// Amounts are unrounded; use [`OrderReview::display_totals`] for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderReview {
    pub lines: Vec<PricedLine>,
    pub totals: OrderTotals,
    pub gst: GstBreakup,
    pub payment_method: PaymentMethod,
    pub payment_summary: String,
}

impl OrderReview {
    pub fn display_totals(&self) -> OrderTotals {
        self.totals.rounded()
    }
}

// =============================================================================
// Checkout Flow
// =============================================================================

/// One checkout of one cart.
///
/// The cart and tier are a snapshot taken at [`CheckoutFlow::start`]; later
/// cart edits need a new flow.
#[derive(Debug, Clone)]
pub struct CheckoutFlow {
    engine: PricingEngine,
    cart: Vec<CartLine>,
    tier: CustomerTier,
    customer_gstin: Option<String>,
    request_id: Uuid,
    order_number: Option<String>,
    state: CheckoutState,
    payment: Option<PaymentInstrument>,
    review: Option<OrderReview>,
    confirmation: Option<OrderConfirmation>,
}

impl CheckoutFlow {
    /// Starts a checkout with the default pricing constants.
    ///
    /// An empty cart is accepted; it prices to zero plus shipping.
    pub fn start(cart: Vec<CartLine>, tier: CustomerTier) -> Self {
        Self::start_with_engine(PricingEngine::default(), cart, tier)
    }

    /// Starts a checkout priced by `engine`.
    pub fn start_with_engine(engine: PricingEngine, cart: Vec<CartLine>, tier: CustomerTier) -> Self {
        let request_id = Uuid::new_v4();
        debug!(%request_id, lines = cart.len(), ?tier, "Checkout started");

        CheckoutFlow {
            engine,
            cart,
            tier,
            customer_gstin: None,
            request_id,
            order_number: None,
            state: CheckoutState::default(),
            payment: None,
            review: None,
            confirmation: None,
        }
    }

    /// Sets the buyer's GSTIN, used to pick CGST+SGST or IGST.
    pub fn with_customer_gstin(mut self, gstin: impl Into<String>) -> Self {
        self.customer_gstin = Some(gstin.into());
        self
    }

    pub fn step(&self) -> CheckoutStep {
        self.state.step
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    pub fn cart(&self) -> &[CartLine] {
        &self.cart
    }

    pub fn tier(&self) -> CustomerTier {
        self.tier
    }

    pub fn engine(&self) -> &PricingEngine {
        &self.engine
    }

    /// Idempotency key sent with every submission attempt.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Assigned on the first confirmation attempt.
    pub fn order_number(&self) -> Option<&str> {
        self.order_number.as_deref()
    }

    /// The review snapshot; present only at REVIEW and CONFIRMED.
    pub fn review(&self) -> Option<&OrderReview> {
        self.review.as_ref()
    }

    pub fn confirmation(&self) -> Option<&OrderConfirmation> {
        self.confirmation.as_ref()
    }

    /// Hands off the confirmed order, if there is one.
    pub fn into_confirmation(self) -> Option<OrderConfirmation> {
        self.confirmation
    }

    // -------------------------------------------------------------------------
    // ADDRESS
    // -------------------------------------------------------------------------

    /// Captures the addresses and moves to PAYMENT.
    ///
    /// ## Errors
    /// - `Validation` with keys like `shippingAddress.postalCode`
    /// - `WrongStep` when not at ADDRESS
    pub fn submit_address(&mut self, form: AddressForm) -> CoreResult<CheckoutStep> {
        self.ensure_step(CheckoutStep::Address)?;
        form.validate()?;

        let AddressForm {
            shipping_address,
            billing_address,
            same_as_shipping,
        } = form;

        self.state.shipping_address = Some(shipping_address);
        self.state.billing_address = if same_as_shipping { None } else { billing_address };
        self.state.same_as_shipping = same_as_shipping;

        // GST regime depends on the shipping state
        self.review = None;
        self.state.order_totals = None;

        self.move_to(CheckoutStep::Payment);
        Ok(self.state.step)
    }

    // -------------------------------------------------------------------------
    // PAYMENT
    // -------------------------------------------------------------------------

    /// Captures the payment selection, prices the order and moves to REVIEW.
    ///
    /// ## Errors
    /// - `Validation` keyed by payment field (`cardNumber`, `upiId`, ...)
    /// - `WrongStep` when not at PAYMENT
    pub fn submit_payment(&mut self, selection: PaymentSelection) -> CoreResult<CheckoutStep> {
        self.ensure_step(CheckoutStep::Payment)?;
        let instrument = validate_payment(&selection)?;
        let review = self.build_review(&instrument)?;

        self.state.payment_method = Some(selection.method);
        self.state.payment_details = selection.details;
        self.payment = Some(instrument);
        self.install_review(review);

        Ok(self.state.step)
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    /// Goes back one step, keeping everything entered. Leaving REVIEW drops
    /// the priced review and the terms acceptance with it.
    pub fn back(&mut self) -> CoreResult<CheckoutStep> {
        let from = self.state.step;
        match from.previous() {
            Some(to) => {
                self.go_to(to)?;
                Ok(to)
            }
            None => Err(self.reject(from, from)),
        }
    }

    /// Moves to an adjacent step.
    ///
    /// ## Rules
    /// - Backwards by one step: always, unless CONFIRMED
    /// - Forwards by one step: only when the current step's data is
    ///   already captured (after going back)
    /// - CONFIRMED is reached only through [`CheckoutFlow::confirm`]
    /// - Skipping steps, or leaving CONFIRMED: `InvalidTransition`
    pub fn go_to(&mut self, to: CheckoutStep) -> CoreResult<()> {
        let from = self.state.step;
        if from.is_terminal() || to.is_terminal() {
            return Err(self.reject(from, to));
        }
        if from == to {
            return Ok(());
        }

        if from.previous() == Some(to) {
            if from == CheckoutStep::Review {
                // repriced on the way back in
                self.review = None;
                self.state.order_totals = None;
            }
            self.move_to(to);
            return Ok(());
        }

        if from.next() != Some(to) {
            return Err(self.reject(from, to));
        }

        match to {
            CheckoutStep::Payment => {
                if self.state.shipping_address.is_none() {
                    return Err(CoreError::StepIncomplete {
                        step: from,
                        missing: "shipping address".to_string(),
                    });
                }
                self.move_to(to);
            }
            CheckoutStep::Review => {
                let instrument = self.payment.clone().ok_or_else(|| CoreError::StepIncomplete {
                    step: from,
                    missing: "payment method".to_string(),
                })?;
                let review = self.build_review(&instrument)?;
                self.install_review(review);
            }
            CheckoutStep::Address | CheckoutStep::Confirmed => return Err(self.reject(from, to)),
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // REVIEW
    // -------------------------------------------------------------------------

    /// Attaches a note to the order, as typed. An empty note clears it.
    pub fn set_note(&mut self, note: impl Into<String>) -> CoreResult<()> {
        self.ensure_step(CheckoutStep::Review)?;
        let note = note.into();
        validate_note(&note)?;

        self.state.customer_notes = if note.is_empty() { None } else { Some(note) };
        Ok(())
    }

    /// Records the terms and conditions checkbox for the review on screen.
    pub fn accept_terms(&mut self, accepted: bool) -> CoreResult<()> {
        self.ensure_step(CheckoutStep::Review)?;
        self.state.terms_accepted = accepted;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // CONFIRMED
    // -------------------------------------------------------------------------

    /// Submits the order and, once `submitter` accepts it, moves to CONFIRMED.
    ///
    /// On submission failure the submitter's error comes back unchanged in
    /// [`ConfirmError::Submission`] and the flow stays at REVIEW. A retry
    /// sends the same request id and order number.
    pub async fn confirm<S>(
        &mut self,
        submitter: &S,
    ) -> Result<&OrderConfirmation, ConfirmError<S::Error>>
    where
        S: OrderSubmitter,
    {
        let request = self.prepare_order()?;

        match submitter.submit(&request).await {
            Ok(receipt) => {
                info!(
                    request_id = %request.request_id,
                    order_number = %request.order_number,
                    order_id = %receipt.order_id,
                    grand_total = %request.totals.grand_total.rounded(),
                    "Order confirmed"
                );
                self.state.step = CheckoutStep::Confirmed;
                Ok(&*self.confirmation.insert(OrderConfirmation { request, receipt }))
            }
            Err(error) => {
                warn!(
                    request_id = %request.request_id,
                    order_number = %request.order_number,
                    error = %error,
                    "Order submission failed, checkout stays at review"
                );
                Err(ConfirmError::Submission(error))
            }
        }
    }

    /// Builds the order payload, assigning the order number on first use.
    fn prepare_order(&mut self) -> CoreResult<OrderRequest> {
        self.ensure_step(CheckoutStep::Review)?;
        if !self.state.terms_accepted {
            return Err(CoreError::TermsNotAccepted);
        }

        let review = self
            .review
            .as_ref()
            .ok_or_else(|| incomplete(CheckoutStep::Review, "order review"))?;
        let shipping_address = self
            .state
            .shipping_address
            .clone()
            .ok_or_else(|| incomplete(CheckoutStep::Address, "shipping address"))?;
        let billing_address = self
            .state
            .effective_billing_address()
            .cloned()
            .ok_or_else(|| incomplete(CheckoutStep::Address, "billing address"))?;
        let payment = self
            .payment
            .clone()
            .ok_or_else(|| incomplete(CheckoutStep::Payment, "payment method"))?;

        let created_at = Utc::now();
        let order_number = self
            .order_number
            .get_or_insert_with(|| generate_order_number(created_at))
            .clone();

        Ok(OrderRequest {
            request_id: self.request_id,
            order_number,
            customer_tier: self.tier,
            shipping_address,
            billing_address,
            payment,
            lines: review.lines.clone(),
            totals: review.totals,
            gst: review.gst,
            customer_notes: self.state.customer_notes.clone(),
            created_at,
        })
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn ensure_step(&self, expected: CheckoutStep) -> CoreResult<()> {
        let actual = self.state.step;
        if actual == expected {
            return Ok(());
        }
        if actual.is_terminal() {
            return Err(CoreError::AlreadyConfirmed);
        }
        warn!(%expected, %actual, "Checkout step mismatch");
        Err(CoreError::WrongStep { expected, actual })
    }

    fn reject(&self, from: CheckoutStep, to: CheckoutStep) -> CoreError {
        warn!(%from, %to, "Rejected checkout transition");
        CoreError::InvalidTransition { from, to }
    }

    fn move_to(&mut self, to: CheckoutStep) {
        debug!(from = %self.state.step, %to, "Checkout step changed");
        self.state.step = to;
    }

    /// Prices the cart snapshot for `instrument` and the captured address.
    fn build_review(&self, instrument: &PaymentInstrument) -> CoreResult<OrderReview> {
        let shipping = self
            .state
            .shipping_address
            .as_ref()
            .ok_or_else(|| incomplete(CheckoutStep::Address, "shipping address"))?;

        let method = instrument.method();
        let (cart, totals) = self.engine.price_order(&self.cart, self.tier, method)?;
        let regime = self
            .engine
            .gst_regime(self.customer_gstin.as_deref(), &shipping.state);

        Ok(OrderReview {
            lines: cart.lines,
            totals,
            gst: self.engine.gst_breakup(totals.tax_total, regime),
            payment_method: method,
            payment_summary: instrument.summary(),
        })
    }

    /// Terms are accepted against one set of totals; every fresh review
    /// asks again.
    fn install_review(&mut self, review: OrderReview) {
        self.state.terms_accepted = false;
        self.state.order_totals = Some(review.totals);
        self.review = Some(review);
        self.move_to(CheckoutStep::Review);
    }
}

fn incomplete(step: CheckoutStep, missing: &str) -> CoreError {
    CoreError::StepIncomplete {
        step,
        missing: missing.to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::sync::Mutex;

    use super::*;
    use crate::error::ValidationError;
    use crate::gst::GstRegime;
    use crate::money::Money;
    use crate::order::OrderReceipt;
    use crate::types::{GstRate, ProductPricing};

    #[derive(Debug, thiserror::Error)]
    #[error("order service unavailable")]
    struct Unavailable;

    /// Fails the first `failures` submissions, then accepts.
    struct FakeSubmitter {
        failures: Mutex<u32>,
        seen: Mutex<Vec<OrderRequest>>,
    }

    impl FakeSubmitter {
        fn accepting() -> Self {
            Self::failing(0)
        }

        fn failing(failures: u32) -> Self {
            FakeSubmitter {
                failures: Mutex::new(failures),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<OrderRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl OrderSubmitter for FakeSubmitter {
        type Error = Unavailable;

        fn submit(
            &self,
            order: &OrderRequest,
        ) -> impl Future<Output = Result<OrderReceipt, Self::Error>> + Send {
            self.seen.lock().unwrap().push(order.clone());
            let result = {
                let mut failures = self.failures.lock().unwrap();
                if *failures > 0 {
                    *failures -= 1;
                    Err(Unavailable)
                } else {
                    Ok(OrderReceipt::new(format!("srv-{}", order.order_number)))
                }
            };
            async move { result }
        }
    }

    fn address(city: &str, state: &str) -> Address {
        Address {
            address_line1: "12 MG Road".to_string(),
            address_line2: Some("Near Metro".to_string()),
            city: city.to_string(),
            state: state.to_string(),
            postal_code: "411001".to_string(),
            country: "India".to_string(),
        }
    }

    fn pune() -> Address {
        address("Pune", "Maharashtra")
    }

    fn laptop_cart() -> Vec<CartLine> {
        let product = ProductPricing::new(Money::from_major(1000), true, GstRate::from_whole(18), 10)
            .with_business_price(Money::from_major(800));
        vec![CartLine::new(product, 2)]
    }

    fn visa() -> PaymentSelection {
        PaymentSelection::new(
            PaymentMethod::CreditCard,
            PaymentDetails::card("4111111111111234", "Asha Kulkarni", "09", "29", "123"),
        )
    }

    fn at_review(tier: CustomerTier, payment: PaymentSelection) -> CheckoutFlow {
        let mut flow = CheckoutFlow::start(laptop_cart(), tier);
        flow.submit_address(AddressForm::same_as_shipping(pune())).unwrap();
        flow.submit_payment(payment).unwrap();
        flow
    }

    #[test]
    fn test_starts_at_address_with_empty_state() {
        let flow = CheckoutFlow::start(laptop_cart(), CustomerTier::Individual);
        assert_eq!(flow.step(), CheckoutStep::Address);
        assert!(flow.state().shipping_address.is_none());
        assert!(flow.review().is_none());
        assert!(flow.order_number().is_none());
        assert_eq!(flow.cart().len(), 1);
    }

    #[test]
    fn test_business_card_review_totals() {
        let flow = at_review(CustomerTier::Business, visa());
        let review = flow.review().unwrap();

        assert_eq!(flow.step(), CheckoutStep::Review);
        assert_eq!(review.totals.subtotal, Money::from_major(1600));
        assert_eq!(review.totals.tax_total, Money::from_major(288));
        assert!(review.totals.shipping_charge.is_zero());
        assert!(review.totals.cod_surcharge.is_zero());
        assert_eq!(review.totals.grand_total, Money::from_major(1888));
        assert_eq!(review.gst.regime, GstRegime::IntraState);
        assert_eq!(review.gst.cgst, Money::from_major(144));
        assert_eq!(review.payment_summary, "CREDIT CARD ending in ****1234");
        assert_eq!(flow.state().order_totals, Some(review.totals));
    }

    #[test]
    fn test_individual_cod_inter_state() {
        let mut flow = CheckoutFlow::start(laptop_cart(), CustomerTier::Individual);
        flow.submit_address(AddressForm::same_as_shipping(address("Bengaluru", "Karnataka")))
            .unwrap();
        flow.submit_payment(PaymentSelection::bare(PaymentMethod::Cod)).unwrap();

        let review = flow.review().unwrap();
        assert_eq!(review.totals.grand_total, Money::from_major(2410));
        assert_eq!(review.totals.cod_surcharge, Money::from_major(50));
        assert_eq!(review.gst.regime, GstRegime::InterState);
        assert_eq!(review.gst.igst, Money::from_major(360));
    }

    #[test]
    fn test_customer_gstin_decides_regime() {
        let mut flow = CheckoutFlow::start(laptop_cart(), CustomerTier::Business)
            .with_customer_gstin("29ABCDE1234F1Z5");
        flow.submit_address(AddressForm::same_as_shipping(pune())).unwrap();
        flow.submit_payment(PaymentSelection::bare(PaymentMethod::NetBanking)).unwrap();
        assert_eq!(flow.review().unwrap().gst.regime, GstRegime::InterState);
    }

    #[test]
    fn test_empty_cart_prices_to_shipping_only() {
        let mut flow = CheckoutFlow::start(Vec::new(), CustomerTier::Individual);
        flow.submit_address(AddressForm::same_as_shipping(pune())).unwrap();
        flow.submit_payment(PaymentSelection::bare(PaymentMethod::NetBanking)).unwrap();

        let totals = flow.review().unwrap().totals;
        assert!(totals.subtotal.is_zero());
        assert!(totals.tax_total.is_zero());
        assert_eq!(totals.grand_total, Money::from_major(50));
    }

    #[test]
    fn test_invalid_address_keeps_state() {
        let mut flow = CheckoutFlow::start(laptop_cart(), CustomerTier::Individual);
        let mut shipping = pune();
        shipping.postal_code = "4110".to_string();

        let err = flow
            .submit_address(AddressForm {
                shipping_address: shipping,
                billing_address: None,
                same_as_shipping: false,
            })
            .unwrap_err();

        let errors = match err {
            CoreError::Validation(errors) => errors,
            other => panic!("expected validation error, got {other:?}"),
        };
        assert!(errors.contains("shippingAddress.postalCode"));
        assert!(matches!(
            errors.get("billingAddress.city"),
            Some(ValidationError::Required { .. })
        ));
        assert_eq!(flow.step(), CheckoutStep::Address);
        assert!(flow.state().shipping_address.is_none());
    }

    #[test]
    fn test_separate_billing_address_is_kept() {
        let mut flow = CheckoutFlow::start(laptop_cart(), CustomerTier::Individual);
        let billing = address("Mumbai", "Maharashtra");
        flow.submit_address(AddressForm::with_billing(pune(), billing.clone()))
            .unwrap();

        assert!(!flow.state().same_as_shipping);
        assert_eq!(flow.state().effective_billing_address(), Some(&billing));
    }

    #[test]
    fn test_invalid_payment_keeps_state() {
        let mut flow = CheckoutFlow::start(laptop_cart(), CustomerTier::Individual);
        flow.submit_address(AddressForm::same_as_shipping(pune())).unwrap();

        let bad_card = PaymentSelection::new(
            PaymentMethod::DebitCard,
            PaymentDetails::card("4111", "Asha", "13", "29", "123"),
        );
        let err = flow.submit_payment(bad_card).unwrap_err();

        assert!(matches!(err, CoreError::Validation(ref e) if e.contains("cardNumber") && e.contains("expiryMonth")));
        assert_eq!(flow.step(), CheckoutStep::Payment);
        assert!(flow.state().payment_method.is_none());
        assert!(flow.review().is_none());
    }

    #[test]
    fn test_cannot_skip_from_address_to_review() {
        let mut flow = CheckoutFlow::start(laptop_cart(), CustomerTier::Individual);
        let err = flow.go_to(CheckoutStep::Review).unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidTransition {
                from: CheckoutStep::Address,
                to: CheckoutStep::Review
            }
        );
        assert_eq!(flow.step(), CheckoutStep::Address);

        assert!(matches!(
            flow.go_to(CheckoutStep::Payment),
            Err(CoreError::StepIncomplete { .. })
        ));
        assert!(matches!(
            flow.submit_payment(visa()),
            Err(CoreError::WrongStep { .. })
        ));
    }

    #[test]
    fn test_back_from_address_is_rejected() {
        let mut flow = CheckoutFlow::start(laptop_cart(), CustomerTier::Individual);
        assert!(matches!(flow.back(), Err(CoreError::InvalidTransition { .. })));
    }

    #[test]
    fn test_back_preserves_entered_data() {
        let mut flow = at_review(CustomerTier::Business, visa());

        assert_eq!(flow.back().unwrap(), CheckoutStep::Payment);
        assert_eq!(flow.state().payment_method, Some(PaymentMethod::CreditCard));
        assert_eq!(flow.state().payment_details.cardholder_name, "Asha Kulkarni");

        assert_eq!(flow.back().unwrap(), CheckoutStep::Address);
        assert_eq!(flow.state().shipping_address, Some(pune()));

        // forward again without retyping
        flow.go_to(CheckoutStep::Payment).unwrap();
        flow.go_to(CheckoutStep::Review).unwrap();
        assert_eq!(flow.review().unwrap().totals.grand_total, Money::from_major(1888));
    }

    #[test]
    fn test_changing_payment_reprices() {
        let mut flow = at_review(CustomerTier::Individual, visa());
        assert!(flow.review().unwrap().totals.cod_surcharge.is_zero());

        flow.back().unwrap();
        flow.submit_payment(PaymentSelection::bare(PaymentMethod::Cod)).unwrap();
        assert_eq!(flow.review().unwrap().totals.grand_total, Money::from_major(2410));
    }

    #[test]
    fn test_back_from_review_drops_stale_review() {
        let mut flow = at_review(CustomerTier::Individual, visa());
        flow.back().unwrap();

        assert!(flow.review().is_none());
        assert!(flow.state().order_totals.is_none());
        assert_eq!(flow.state().payment_method, Some(PaymentMethod::CreditCard));
    }

    #[test]
    fn test_unpriceable_cart_stays_at_payment() {
        let huge = ProductPricing::new(
            Money::new(rust_decimal::Decimal::MAX),
            true,
            GstRate::from_whole(18),
            10,
        );
        let mut flow = CheckoutFlow::start(vec![CartLine::new(huge, 2)], CustomerTier::Individual);
        flow.submit_address(AddressForm::same_as_shipping(pune())).unwrap();

        let err = flow
            .submit_payment(PaymentSelection::bare(PaymentMethod::Cod))
            .unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow { .. }));
        assert_eq!(flow.step(), CheckoutStep::Payment);
        assert!(flow.review().is_none());
        assert!(flow.state().payment_method.is_none());
    }

    #[test]
    fn test_repricing_asks_for_terms_again() {
        let mut flow = at_review(
            CustomerTier::Individual,
            PaymentSelection::bare(PaymentMethod::NetBanking),
        );
        flow.accept_terms(true).unwrap();
        assert!(flow.state().terms_accepted);

        flow.back().unwrap();
        flow.go_to(CheckoutStep::Review).unwrap();
        assert!(!flow.state().terms_accepted);
    }

    #[test]
    fn test_note_is_kept_unmodified() {
        let mut flow = at_review(CustomerTier::Individual, visa());
        flow.set_note("  Leave at the gate  ").unwrap();
        assert_eq!(
            flow.state().customer_notes.as_deref(),
            Some("  Leave at the gate  ")
        );

        let err = flow.set_note("x".repeat(1001)).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(
            flow.state().customer_notes.as_deref(),
            Some("  Leave at the gate  ")
        );
    }

    #[test]
    fn test_note_outside_review_is_rejected() {
        let mut flow = CheckoutFlow::start(laptop_cart(), CustomerTier::Individual);
        assert_eq!(
            flow.set_note("hello").unwrap_err(),
            CoreError::WrongStep {
                expected: CheckoutStep::Review,
                actual: CheckoutStep::Address
            }
        );
    }

    #[test]
    fn test_go_to_confirmed_is_rejected() {
        let mut flow = at_review(CustomerTier::Individual, visa());
        flow.accept_terms(true).unwrap();
        assert!(matches!(
            flow.go_to(CheckoutStep::Confirmed),
            Err(CoreError::InvalidTransition { .. })
        ));
        assert_eq!(flow.step(), CheckoutStep::Review);
    }

    #[test]
    fn test_step_graph() {
        assert!(CheckoutStep::Address.can_transition_to(CheckoutStep::Payment));
        assert!(CheckoutStep::Review.can_transition_to(CheckoutStep::Payment));
        assert!(!CheckoutStep::Address.can_transition_to(CheckoutStep::Review));
        assert!(!CheckoutStep::Confirmed.can_transition_to(CheckoutStep::Review));
        assert_eq!(
            serde_json::to_value(CheckoutStep::Confirmed).unwrap(),
            "CONFIRMED"
        );
    }

    #[tokio::test]
    async fn test_confirm_requires_terms() {
        let mut flow = at_review(CustomerTier::Individual, visa());
        let submitter = FakeSubmitter::accepting();

        let err = flow.confirm(&submitter).await.unwrap_err();
        assert!(matches!(
            err,
            ConfirmError::Checkout(CoreError::TermsNotAccepted)
        ));
        assert!(submitter.seen().is_empty());
        assert_eq!(flow.step(), CheckoutStep::Review);
    }

    #[tokio::test]
    async fn test_switching_to_cod_needs_fresh_terms() {
        let mut flow = at_review(
            CustomerTier::Individual,
            PaymentSelection::bare(PaymentMethod::NetBanking),
        );
        assert_eq!(flow.review().unwrap().totals.grand_total, Money::from_major(2360));
        flow.accept_terms(true).unwrap();

        flow.back().unwrap();
        flow.submit_payment(PaymentSelection::bare(PaymentMethod::Cod)).unwrap();
        assert_eq!(flow.review().unwrap().totals.grand_total, Money::from_major(2410));

        let submitter = FakeSubmitter::accepting();
        let err = flow.confirm(&submitter).await.unwrap_err();
        assert!(matches!(
            err,
            ConfirmError::Checkout(CoreError::TermsNotAccepted)
        ));
        assert!(submitter.seen().is_empty());

        flow.accept_terms(true).unwrap();
        let confirmation = flow.confirm(&submitter).await.unwrap();
        assert_eq!(confirmation.request.totals.grand_total, Money::from_major(2410));
    }

    #[tokio::test]
    async fn test_confirm_builds_order_request() {
        let mut flow = at_review(CustomerTier::Business, visa());
        flow.set_note("Call before delivery").unwrap();
        flow.accept_terms(true).unwrap();
        let submitter = FakeSubmitter::accepting();

        let confirmation = flow.confirm(&submitter).await.unwrap();
        let request = &confirmation.request;

        assert!(request.order_number.starts_with("ORD-"));
        assert_eq!(confirmation.receipt.order_id, format!("srv-{}", request.order_number));
        assert_eq!(request.customer_tier, CustomerTier::Business);
        assert_eq!(request.billing_address, request.shipping_address);
        assert_eq!(request.totals.grand_total, Money::from_major(1888));
        assert_eq!(request.gst.sgst, Money::from_major(144));
        assert_eq!(request.lines.len(), 1);
        assert_eq!(request.customer_notes.as_deref(), Some("Call before delivery"));

        let json = serde_json::to_value(request).unwrap();
        assert!(json["payment"].get("cvv").is_none());
        assert_eq!(json["payment"]["method"], "CREDIT_CARD");

        assert_eq!(flow.step(), CheckoutStep::Confirmed);
        assert_eq!(submitter.seen().len(), 1);
    }

    #[tokio::test]
    async fn test_submission_failure_stays_at_review_and_retry_is_idempotent() {
        let mut flow = at_review(CustomerTier::Individual, PaymentSelection::bare(PaymentMethod::Cod));
        flow.accept_terms(true).unwrap();
        let submitter = FakeSubmitter::failing(1);

        let err = flow.confirm(&submitter).await.unwrap_err();
        assert!(matches!(err, ConfirmError::Submission(Unavailable)));
        assert_eq!(flow.step(), CheckoutStep::Review);
        assert!(flow.state().terms_accepted);
        assert_eq!(flow.state().shipping_address, Some(pune()));
        assert!(flow.confirmation().is_none());

        flow.confirm(&submitter).await.unwrap();
        assert_eq!(flow.step(), CheckoutStep::Confirmed);

        let seen = submitter.seen();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].request_id, seen[1].request_id);
        assert_eq!(seen[0].order_number, seen[1].order_number);
        assert_eq!(seen[0].request_id, flow.request_id());
    }

    #[tokio::test]
    async fn test_nothing_leaves_confirmed() {
        let mut flow = at_review(CustomerTier::Individual, visa());
        flow.accept_terms(true).unwrap();
        flow.confirm(&FakeSubmitter::accepting()).await.unwrap();

        for step in [
            CheckoutStep::Address,
            CheckoutStep::Payment,
            CheckoutStep::Review,
            CheckoutStep::Confirmed,
        ] {
            assert!(matches!(
                flow.go_to(step),
                Err(CoreError::InvalidTransition {
                    from: CheckoutStep::Confirmed,
                    ..
                })
            ));
        }
        assert!(flow.back().is_err());
        assert_eq!(
            flow.submit_address(AddressForm::same_as_shipping(pune())),
            Err(CoreError::AlreadyConfirmed)
        );
        assert_eq!(flow.accept_terms(false), Err(CoreError::AlreadyConfirmed));

        let again = flow.confirm(&FakeSubmitter::accepting()).await.unwrap_err();
        assert!(matches!(
            again,
            ConfirmError::Checkout(CoreError::AlreadyConfirmed)
        ));

        let confirmation = flow.into_confirmation().unwrap();
        assert!(confirmation.order_number().starts_with("ORD-"));
    }
}
