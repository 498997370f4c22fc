//! # GST Module
//!
//! Splits a GST amount into its statutory components and converts
//! GST-inclusive prices back to their taxable value.
//!
//! ## Regimes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Seller state == Buyer state  →  INTRA_STATE                            │
//! │      CGST = tax / 2,  SGST = tax / 2,  IGST = 0                         │
//! │                                                                         │
//! │  Seller state != Buyer state  →  INTER_STATE                            │
//! │      CGST = 0,        SGST = 0,        IGST = tax                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The buyer's state comes from the first two digits of their GSTIN when
//! they have one (business customers), otherwise from the shipping address
//! state name.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::GstRate;

/// GST state codes, as used in the first two digits of a GSTIN.
const STATE_CODES: &[(&str, &str)] = &[
    ("jammu and kashmir", "01"),
    ("himachal pradesh", "02"),
    ("punjab", "03"),
    ("chandigarh", "04"),
    ("uttarakhand", "05"),
    ("haryana", "06"),
    ("delhi", "07"),
    ("rajasthan", "08"),
    ("uttar pradesh", "09"),
    ("bihar", "10"),
    ("sikkim", "11"),
    ("arunachal pradesh", "12"),
    ("nagaland", "13"),
    ("manipur", "14"),
    ("mizoram", "15"),
    ("tripura", "16"),
    ("meghalaya", "17"),
    ("assam", "18"),
    ("west bengal", "19"),
    ("jharkhand", "20"),
    ("odisha", "21"),
    ("chhattisgarh", "22"),
    ("madhya pradesh", "23"),
    ("gujarat", "24"),
    ("dadra and nagar haveli and daman and diu", "26"),
    ("maharashtra", "27"),
    ("karnataka", "29"),
    ("goa", "30"),
    ("lakshadweep", "31"),
    ("kerala", "32"),
    ("tamil nadu", "33"),
    ("puducherry", "34"),
    ("andaman and nicobar islands", "35"),
    ("telangana", "36"),
    ("andhra pradesh", "37"),
    ("ladakh", "38"),
];

/// Looks up the GST state code for a state or union territory name.
///
/// Matching ignores case, surrounding whitespace and `&` vs `and`.
///
/// ```rust
/// use checkout_core::gst::state_code;
///
/// assert_eq!(state_code("Maharashtra"), Some("27"));
/// assert_eq!(state_code(" tamil NADU "), Some("33"));
/// assert_eq!(state_code("Atlantis"), None);
/// ```
pub fn state_code(state_name: &str) -> Option<&'static str> {
    let normalized = state_name.trim().to_lowercase().replace('&', "and");
    let normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");

    STATE_CODES
        .iter()
        .find(|(name, _)| *name == normalized)
        .map(|(_, code)| *code)
}

// =============================================================================
// GST Regime
// =============================================================================

/// Which GST components apply to a sale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GstRegime {
    /// Same state: CGST + SGST.
    #[default]
    IntraState,
    /// Different states: IGST.
    InterState,
}

impl GstRegime {
    /// Decides the regime for a sale.
    ///
    /// ## Resolution Order
    /// 1. Customer GSTIN (2+ characters): its prefix is the buyer's state code
    /// 2. Shipping state name, looked up in the state code table
    /// 3. Unknown or blank state name: `InterState`
    ///
    /// ```rust
    /// use checkout_core::gst::GstRegime;
    ///
    /// // Seller in Maharashtra (27)
    /// assert_eq!(GstRegime::resolve("27", Some("29ABCDE1234F1Z5"), "Maharashtra"), GstRegime::InterState);
    /// assert_eq!(GstRegime::resolve("27", None, "Maharashtra"), GstRegime::IntraState);
    /// assert_eq!(GstRegime::resolve("27", None, "Karnataka"), GstRegime::InterState);
    /// ```
    pub fn resolve(home_state_code: &str, customer_gstin: Option<&str>, shipping_state: &str) -> Self {
        let gstin_state = customer_gstin
            .map(str::trim)
            .filter(|gstin| gstin.len() >= 2)
            .and_then(|gstin| gstin.get(..2));

        let buyer_state = match gstin_state {
            Some(code) => Some(code),
            None => state_code(shipping_state),
        };

        match buyer_state {
            Some(code) if code == home_state_code => GstRegime::IntraState,
            _ => GstRegime::InterState,
        }
    }
}

// =============================================================================
// GST Breakup
// =============================================================================

/// A GST amount split into CGST, SGST and IGST.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct GstBreakup {
    pub regime: GstRegime,
    pub cgst: Money,
    pub sgst: Money,
    pub igst: Money,
    pub total: Money,
}

impl GstBreakup {
    /// Splits a total tax amount under the given regime.
    ///
    /// The halves are exact; `cgst + sgst` always equals `total`.
    pub fn split(total: Money, regime: GstRegime) -> Self {
        match regime {
            GstRegime::IntraState => {
                let half = total.half();
                GstBreakup {
                    regime,
                    cgst: half,
                    sgst: half,
                    igst: Money::ZERO,
                    total,
                }
            }
            GstRegime::InterState => GstBreakup {
                regime,
                cgst: Money::ZERO,
                sgst: Money::ZERO,
                igst: total,
                total,
            },
        }
    }
}

/// Converts a GST-inclusive price (MRP) to its taxable value.
///
/// `price = mrp / (1 + rate / 100)`, unrounded. `None` when the rate
/// makes the divisor zero or the result does not fit.
///
/// ```rust
/// use checkout_core::gst::inclusive_to_exclusive;
/// use checkout_core::money::Money;
/// use checkout_core::types::GstRate;
///
/// let taxable = inclusive_to_exclusive(Money::from_major(1180), GstRate::from_whole(18));
/// assert_eq!(taxable, Some(Money::from_major(1000)));
/// ```
pub fn inclusive_to_exclusive(mrp: Money, rate: GstRate) -> Option<Money> {
    let divisor = rate
        .percent()
        .checked_div(Decimal::ONE_HUNDRED)
        .and_then(|fraction| fraction.checked_add(Decimal::ONE))?;
    mrp.amount().checked_div(divisor).map(Money::new)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intra_state_split_halves() {
        let breakup = GstBreakup::split(Money::from_major(288), GstRegime::IntraState);
        assert_eq!(breakup.cgst, Money::from_major(144));
        assert_eq!(breakup.sgst, Money::from_major(144));
        assert!(breakup.igst.is_zero());
        assert_eq!(breakup.cgst + breakup.sgst, breakup.total);
    }

    #[test]
    fn test_odd_paise_split_is_exact() {
        let breakup = GstBreakup::split(Money::from_paise(1), GstRegime::IntraState);
        assert_eq!(breakup.cgst + breakup.sgst, Money::from_paise(1));
    }

    #[test]
    fn test_inter_state_uses_igst() {
        let breakup = GstBreakup::split(Money::from_major(360), GstRegime::InterState);
        assert_eq!(breakup.igst, Money::from_major(360));
        assert!(breakup.cgst.is_zero());
        assert!(breakup.sgst.is_zero());
    }

    #[test]
    fn test_gstin_wins_over_shipping_state() {
        assert_eq!(
            GstRegime::resolve("27", Some("27AAAAA0000A1Z5"), "Karnataka"),
            GstRegime::IntraState
        );
        assert_eq!(
            GstRegime::resolve("27", Some("07AAAAA0000A1Z5"), "Maharashtra"),
            GstRegime::InterState
        );
    }

    #[test]
    fn test_short_gstin_falls_back_to_state_name() {
        assert_eq!(
            GstRegime::resolve("27", Some("2"), "Goa"),
            GstRegime::InterState
        );
    }

    #[test]
    fn test_unknown_state_is_inter_state() {
        assert_eq!(GstRegime::resolve("27", None, "Atlantis"), GstRegime::InterState);
        assert_eq!(GstRegime::resolve("27", None, ""), GstRegime::InterState);
        assert_eq!(GstRegime::resolve("27", None, "  maharashtra "), GstRegime::IntraState);
    }

    #[test]
    fn test_state_code_normalizes_names() {
        assert_eq!(state_code("Jammu & Kashmir"), Some("01"));
        assert_eq!(state_code("andaman  and nicobar islands"), Some("35"));
    }

    #[test]
    fn test_inclusive_to_exclusive_zero_rate() {
        let mrp = Money::from_paise(9999);
        assert_eq!(inclusive_to_exclusive(mrp, GstRate::zero()), Some(mrp));
    }

    #[test]
    fn test_inclusive_to_exclusive_rejects_zero_divisor() {
        let rate = GstRate::from_percent(Decimal::new(-100, 0));
        assert_eq!(inclusive_to_exclusive(Money::from_major(100), rate), None);
    }
}
