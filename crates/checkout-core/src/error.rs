//! # Error Types
//!
//! Domain-specific error types for checkout-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  ValidationError   - one field failed (postal code, CVV, UPI id, ...)   │
//! │  FieldErrors       - every failing field of one checkout step          │
//! │  CoreError         - step sequencing and configuration failures        │
//! │  ConfirmError<E>   - CoreError, or the order backend's own error E     │
//! │                                                                         │
//! │  Flow: ValidationError → FieldErrors → CoreError ─┐                    │
//! │                         OrderSubmitter::Error ────┴─► ConfirmError     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Field errors are keyed by the form path the storefront uses
//!    (`shippingAddress.postalCode`, `cvv`)
//! 3. Nothing here is fatal; every error leaves the checkout where it was

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::checkout::CheckoutStep;

// =============================================================================
// Validation Error
// =============================================================================

/// A single input field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value does not have the expected shape.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: String, max: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },
}

impl ValidationError {
    /// The field this error belongs to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field } => field,
        }
    }

    pub(crate) fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub(crate) fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Field Errors
// =============================================================================

/// All failing fields of one checkout step, keyed by field path.
///
/// Only the first failure per field is kept, matching how the storefront
/// shows one helper text under each input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, ValidationError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure, keeping an earlier one for the same field.
    pub fn push(&mut self, error: ValidationError) {
        self.0.entry(error.field().to_string()).or_insert(error);
    }

    /// Records the error of a field check, if any.
    pub fn check(&mut self, result: Result<(), ValidationError>) {
        if let Err(error) = result {
            self.push(error);
        }
    }

    /// Returns the failure for a field path.
    pub fn get(&self, field: &str) -> Option<&ValidationError> {
        self.0.get(field)
    }

    /// Checks whether a field failed.
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Failing field paths in sorted order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(())` when nothing failed, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.values().map(ToString::to_string).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for FieldErrors {}

impl From<ValidationError> for FieldErrors {
    fn from(error: ValidationError) -> Self {
        let mut errors = FieldErrors::new();
        errors.push(error);
        errors
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Checkout sequencing and configuration errors.
///
/// All of these are recoverable: the checkout stays on the step it was on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Submitted step data failed validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] FieldErrors),

    /// The requested move is not an edge of the checkout graph.
    ///
    /// ## When This Occurs
    /// - Skipping a step (ADDRESS → REVIEW)
    /// - Moving backwards from ADDRESS
    /// - Any move out of CONFIRMED
    #[error("Cannot move checkout from {from} to {to}")]
    InvalidTransition { from: CheckoutStep, to: CheckoutStep },

    /// Step data was submitted while the checkout is on a different step.
    #[error("Checkout is at {actual}, not {expected}")]
    WrongStep {
        expected: CheckoutStep,
        actual: CheckoutStep,
    },

    /// A forward move was requested before the current step's data was captured.
    #[error("Checkout step {step} is incomplete: {missing} not provided")]
    StepIncomplete { step: CheckoutStep, missing: String },

    /// Confirmation attempted before the terms were accepted.
    #[error("Terms and conditions must be accepted before placing the order")]
    TermsNotAccepted,

    /// The order was already confirmed; the checkout is frozen.
    #[error("Order has already been confirmed")]
    AlreadyConfirmed,

    /// An amount grew past what a `Decimal` can hold while pricing.
    #[error("{field} is too large to price")]
    AmountOverflow { field: String },

    /// Pricing configuration is invalid.
    #[error("Invalid pricing configuration: {0}")]
    Config(String),
}

impl From<ValidationError> for CoreError {
    fn from(error: ValidationError) -> Self {
        CoreError::Validation(error.into())
    }
}

// =============================================================================
// Confirm Error
// =============================================================================

/// Failure of the final confirmation step.
///
/// The order backend's error is passed through untouched so the caller can
/// decide how to report it; the checkout stays at REVIEW either way.
#[derive(Debug, Error)]
pub enum ConfirmError<E>
where
    E: std::error::Error + 'static,
{
    /// The checkout was not ready to confirm.
    #[error(transparent)]
    Checkout(#[from] CoreError),

    /// The order-submission collaborator rejected or failed the request.
    #[error("Order submission failed: {0}")]
    Submission(#[source] E),
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("city");
        assert_eq!(err.to_string(), "city is required");

        let err = ValidationError::invalid_format("postalCode", "must be 6 digits");
        assert_eq!(
            err.to_string(),
            "postalCode has invalid format: must be 6 digits"
        );
    }

    #[test]
    fn test_field_errors_keep_first_failure_per_field() {
        let mut errors = FieldErrors::new();
        errors.push(ValidationError::required("cvv"));
        errors.push(ValidationError::invalid_format("cvv", "must be 3 or 4 digits"));
        errors.check(Ok(()));
        errors.check(Err(ValidationError::required("cardNumber")));

        assert_eq!(errors.len(), 2);
        assert!(matches!(
            errors.get("cvv"),
            Some(ValidationError::Required { .. })
        ));
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["cardNumber", "cvv"]);
    }

    #[test]
    fn test_field_errors_serialize_as_map() {
        let errors = FieldErrors::from(ValidationError::required("upiId"));
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["upiId"]["kind"], "required");
        assert_eq!(json["upiId"]["field"], "upiId");
    }

    #[test]
    fn test_transition_error_message() {
        let err = CoreError::InvalidTransition {
            from: CheckoutStep::Address,
            to: CheckoutStep::Review,
        };
        assert_eq!(err.to_string(), "Cannot move checkout from ADDRESS to REVIEW");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("state").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
