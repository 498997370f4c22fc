//! # Payment Selection
//!
//! What the customer enters on the payment step, its validation, and the
//! instrument that travels with the order request.
//!
//! ```text
//! PaymentSelection (form input, may hold a CVV)
//!        │ validate_payment()
//!        ▼
//! PaymentInstrument (order payload, never holds a CVV)
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::FieldErrors;
use crate::types::PaymentMethod;
use crate::validation::{
    validate_card_number, validate_cvv, validate_expiry_month, validate_expiry_year,
    validate_required, validate_upi_id,
};

// =============================================================================
// Form Input
// =============================================================================

/// Raw payment fields as typed on the payment step.
///
/// Only the fields for the chosen method are looked at.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentDetails {
    pub card_number: String,
    pub cardholder_name: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub cvv: String,
    pub upi_id: String,
}

impl PaymentDetails {
    /// Card fields.
    pub fn card(
        card_number: impl Into<String>,
        cardholder_name: impl Into<String>,
        expiry_month: impl Into<String>,
        expiry_year: impl Into<String>,
        cvv: impl Into<String>,
    ) -> Self {
        PaymentDetails {
            card_number: card_number.into(),
            cardholder_name: cardholder_name.into(),
            expiry_month: expiry_month.into(),
            expiry_year: expiry_year.into(),
            cvv: cvv.into(),
            ..Self::default()
        }
    }

    /// UPI id only.
    pub fn upi(upi_id: impl Into<String>) -> Self {
        PaymentDetails {
            upi_id: upi_id.into(),
            ..Self::default()
        }
    }
}

/// Card number and CVV stay out of logs.
impl fmt::Debug for PaymentDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentDetails")
            .field("card_number", &mask_card_number(&self.card_number))
            .field("cardholder_name", &self.cardholder_name)
            .field("expiry_month", &self.expiry_month)
            .field("expiry_year", &self.expiry_year)
            .field("cvv", &if self.cvv.is_empty() { "" } else { "***" })
            .field("upi_id", &self.upi_id)
            .finish()
    }
}

/// A payment method together with the fields entered for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSelection {
    pub method: PaymentMethod,
    #[serde(default)]
    pub details: PaymentDetails,
}

impl PaymentSelection {
    pub fn new(method: PaymentMethod, details: PaymentDetails) -> Self {
        PaymentSelection { method, details }
    }

    /// A method with no extra fields (net banking, COD).
    pub fn bare(method: PaymentMethod) -> Self {
        PaymentSelection::new(method, PaymentDetails::default())
    }
}

// =============================================================================
// Order Payload
// =============================================================================

/// Card identifiers forwarded with the order. No CVV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CardInstrument {
    pub card_number: String,
    pub cardholder_name: String,
    pub expiry_month: String,
    pub expiry_year: String,
}

impl CardInstrument {
    /// Last four digits of the card.
    pub fn last_four(&self) -> &str {
        let len = self.card_number.len();
        self.card_number.get(len.saturating_sub(4)..).unwrap_or("")
    }
}

/// The payment part of a finalized order.
///
/// Net banking and COD carry no payment fields at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "method", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentInstrument {
    CreditCard(CardInstrument),
    DebitCard(CardInstrument),
    NetBanking,
    Upi {
        #[serde(rename = "upiId")]
        upi_id: String,
    },
    Cod,
}

impl PaymentInstrument {
    pub fn method(&self) -> PaymentMethod {
        match self {
            PaymentInstrument::CreditCard(_) => PaymentMethod::CreditCard,
            PaymentInstrument::DebitCard(_) => PaymentMethod::DebitCard,
            PaymentInstrument::NetBanking => PaymentMethod::NetBanking,
            PaymentInstrument::Upi { .. } => PaymentMethod::Upi,
            PaymentInstrument::Cod => PaymentMethod::Cod,
        }
    }

    /// One-line description for the review screen.
    ///
    /// ```rust
    /// use checkout_core::payment::PaymentInstrument;
    ///
    /// let upi = PaymentInstrument::Upi { upi_id: "asha@okbank".to_string() };
    /// assert_eq!(upi.summary(), "UPI ID: asha@okbank");
    /// assert_eq!(PaymentInstrument::NetBanking.summary(), "NET BANKING");
    /// ```
    pub fn summary(&self) -> String {
        let label = self.method().as_str().replace('_', " ");
        match self {
            PaymentInstrument::CreditCard(card) | PaymentInstrument::DebitCard(card) => {
                format!("{} ending in ****{}", label, card.last_four())
            }
            PaymentInstrument::Upi { upi_id } => format!("UPI ID: {}", upi_id),
            PaymentInstrument::NetBanking | PaymentInstrument::Cod => label,
        }
    }
}

/// Masks all but the last four digits of a card number.
pub fn mask_card_number(card_number: &str) -> String {
    let digits: Vec<char> = card_number.chars().filter(|c| !c.is_whitespace()).collect();
    let visible = digits.len().saturating_sub(4);
    digits
        .iter()
        .enumerate()
        .map(|(i, c)| if i < visible { '*' } else { *c })
        .collect()
}

// =============================================================================
// Validation
// =============================================================================

/// Validates the fields required by the chosen method and builds the
/// instrument that goes into the order.
///
/// ## Rules
/// - Cards: 16-digit number, cardholder name, `01`-`12` month,
///   2-digit year, 3-4 digit CVV
/// - UPI: `local-part@handle`
/// - Net banking, COD: nothing to check
pub fn validate_payment(selection: &PaymentSelection) -> Result<PaymentInstrument, FieldErrors> {
    let details = &selection.details;
    let mut errors = FieldErrors::new();

    match selection.method {
        PaymentMethod::CreditCard | PaymentMethod::DebitCard => {
            errors.check(validate_card_number("cardNumber", &details.card_number));
            errors.check(validate_required("cardholderName", &details.cardholder_name));
            errors.check(validate_expiry_month("expiryMonth", &details.expiry_month));
            errors.check(validate_expiry_year("expiryYear", &details.expiry_year));
            errors.check(validate_cvv("cvv", &details.cvv));
        }
        PaymentMethod::Upi => {
            errors.check(validate_upi_id("upiId", &details.upi_id));
        }
        PaymentMethod::NetBanking | PaymentMethod::Cod => {}
    }
    errors.into_result()?;

    let card = || CardInstrument {
        card_number: details
            .card_number
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect(),
        cardholder_name: details.cardholder_name.trim().to_string(),
        expiry_month: details.expiry_month.trim().to_string(),
        expiry_year: details.expiry_year.trim().to_string(),
    };

    Ok(match selection.method {
        PaymentMethod::CreditCard => PaymentInstrument::CreditCard(card()),
        PaymentMethod::DebitCard => PaymentInstrument::DebitCard(card()),
        PaymentMethod::NetBanking => PaymentInstrument::NetBanking,
        PaymentMethod::Upi => PaymentInstrument::Upi {
            upi_id: details.upi_id.trim().to_string(),
        },
        PaymentMethod::Cod => PaymentInstrument::Cod,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
