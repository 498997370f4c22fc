//! # Validation Module
//!
//! Shape checks for everything the customer types during checkout.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Storefront forms                                              │
//! │  ├── Immediate per-field feedback while typing                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (re-validated regardless of layer 1)              │
//! │  ├── Address: required fields, 6-digit PIN code                        │
//! │  ├── Card: 16 digits, name, MM, YY, 3-4 digit CVV                      │
//! │  └── UPI: local-part@handle                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Order backend (stock, payment authorisation)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use checkout_core::validation::{validate_postal_code, validate_upi_id};
//!
//! assert!(validate_postal_code("postalCode", "411001").is_ok());
//! assert!(validate_upi_id("upiId", "asha.k@okbank").is_ok());
//! assert!(validate_upi_id("upiId", "asha.k").is_err());
//! ```

use rust_decimal::Decimal;

use crate::error::{FieldErrors, ValidationError};
use crate::types::{Address, CartLine, GstRate};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of the free-text order note.
pub const MAX_NOTE_LENGTH: usize = 1000;

fn all_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

fn is_upi_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_'
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates that a field is present and not blank.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

/// Validates a value made of exactly `len` ASCII digits.
fn validate_digits(field: &str, value: &str, len: usize, reason: &str) -> ValidationResult<()> {
    let value = value.trim();
    validate_required(field, value)?;

    if value.len() != len || !all_digits(value) {
        return Err(ValidationError::invalid_format(field, reason));
    }
    Ok(())
}

/// Validates a 6-digit PIN code.
///
/// ```rust
/// use checkout_core::validation::validate_postal_code;
///
/// assert!(validate_postal_code("postalCode", "560001").is_ok());
/// assert!(validate_postal_code("postalCode", "56001").is_err());
/// assert!(validate_postal_code("postalCode", "5600O1").is_err());
/// ```
pub fn validate_postal_code(field: &str, value: &str) -> ValidationResult<()> {
    validate_digits(field, value, 6, "postal code must be 6 digits")
}

/// Validates a 16-digit card number. Spaces between groups are tolerated.
pub fn validate_card_number(field: &str, value: &str) -> ValidationResult<()> {
    let digits: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    validate_digits(field, &digits, 16, "card number must be 16 digits")
}

/// Validates a 2-digit expiry month between `01` and `12`.
pub fn validate_expiry_month(field: &str, value: &str) -> ValidationResult<()> {
    validate_digits(field, value, 2, "expiry month must be 2 digits")?;

    match value.trim().parse::<u8>() {
        Ok(month) if (1..=12).contains(&month) => Ok(()),
        _ => Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: "01".to_string(),
            max: "12".to_string(),
        }),
    }
}

/// Validates a 2-digit expiry year.
pub fn validate_expiry_year(field: &str, value: &str) -> ValidationResult<()> {
    validate_digits(field, value, 2, "expiry year must be 2 digits")
}

/// Validates a 3 or 4 digit CVV.
pub fn validate_cvv(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();
    validate_required(field, value)?;

    if !(3..=4).contains(&value.len()) || !all_digits(value) {
        return Err(ValidationError::invalid_format(
            field,
            "CVV must be 3 or 4 digits",
        ));
    }
    Ok(())
}

/// Validates a UPI id of the form `local-part@handle`.
///
/// ## Rules
/// - Exactly one `@`
/// - Both sides non-empty
/// - Both sides use only letters, digits, `.`, `-`, `_`
pub fn validate_upi_id(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();
    validate_required(field, value)?;

    let valid = match value.split_once('@') {
        Some((local, handle)) => {
            !local.is_empty()
                && !handle.is_empty()
                && local.chars().all(is_upi_char)
                && handle.chars().all(is_upi_char)
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::invalid_format(
            field,
            "UPI id must look like name@bank",
        ));
    }
    Ok(())
}

/// Validates the optional order note.
pub fn validate_note(note: &str) -> ValidationResult<()> {
    if note.chars().count() > MAX_NOTE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "customerNotes".to_string(),
            max: MAX_NOTE_LENGTH,
        });
    }
    Ok(())
}

/// Validates a GST percentage between 0 and 100.
pub fn validate_gst_rate(field: &str, rate: GstRate) -> ValidationResult<()> {
    let percent = rate.percent();
    if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: "0".to_string(),
            max: "100".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates every field of an address, collecting failures under `prefix`.
///
/// ## Rules
/// - `addressLine1`, `city`, `state`, `country` are required
/// - `postalCode` must be 6 digits
/// - `addressLine2` is optional
///
/// ```rust
/// use checkout_core::types::Address;
/// use checkout_core::validation::validate_address;
///
/// let errors = validate_address("shippingAddress", &Address::default()).unwrap_err();
/// assert!(errors.contains("shippingAddress.city"));
/// assert!(errors.contains("shippingAddress.postalCode"));
/// ```
pub fn validate_address(prefix: &str, address: &Address) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    collect_address_errors(&mut errors, prefix, address);
    errors.into_result()
}

pub(crate) fn collect_address_errors(errors: &mut FieldErrors, prefix: &str, address: &Address) {
    let path = |name: &str| format!("{}.{}", prefix, name);

    errors.check(validate_required(&path("addressLine1"), &address.address_line1));
    errors.check(validate_required(&path("city"), &address.city));
    errors.check(validate_required(&path("state"), &address.state));
    errors.check(validate_postal_code(&path("postalCode"), &address.postal_code));
    errors.check(validate_required(&path("country"), &address.country));
}

/// Validates a cart line before it is priced.
///
/// Pricing never calls this; it is for callers that assemble carts.
///
/// ## Rules
/// - Quantity must be positive
/// - Quantity must not exceed the product's stock
/// - GST rate must be a percentage between 0 and 100
pub fn validate_cart_line(line: &CartLine) -> ValidationResult<()> {
    if line.quantity == 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if !line.product.can_supply(line.quantity) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: "1".to_string(),
            max: line.product.stock_quantity.to_string(),
        });
    }

    validate_gst_rate("gstRate", line.product.gst_rate)
}

// =============================================================================
// Unit Tests
// =============================================================================
