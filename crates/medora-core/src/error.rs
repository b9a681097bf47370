//! # Error Types
//!
//! Domain-specific error types for medora-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  medora-core errors (this file)                                        │
//! │  ├── CoreError        - Draft edits, auth state transitions            │
//! │  ├── ValidationError  - One failed rule on one field                   │
//! │  └── FieldErrors      - Every failed field of a form                   │
//! │                                                                         │
//! │  medora-client errors (separate crate)                                 │
//! │  └── ClientError      - What a screen sees (alert banner text)         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ClientError → Screen               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::auth::{AuthEvent, AuthState};
use crate::money::Money;
use crate::types::ProductId;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// A line-item index does not exist in the draft.
    #[error("Line item {index} is out of range (draft has {len} items)")]
    IndexOutOfRange { index: usize, len: usize },

    /// The catalog returned a product priced below zero.
    #[error("Product {product_id} has a negative price ({price})")]
    NegativePrice { product_id: ProductId, price: Money },

    /// The session state machine rejected an event.
    ///
    /// ## When This Occurs
    /// - `login()` while a session is already established
    /// - `restore_session()` after the session was already set up
    #[error("Cannot apply {event:?} while {from:?}")]
    InvalidTransition { from: AuthState, event: AuthEvent },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Field-level variants carry the JSON field name the form binds to, so the
/// UI can place the message under the right input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Invalid format (e.g., malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Two fields that must match don't.
    #[error("{field} does not match {other}")]
    Mismatch { field: String, other: String },

    /// Invoice submitted without choosing a pharmacy.
    #[error("Please select a pharmacy.")]
    PharmacyNotSelected,

    /// Invoice submitted with no line items.
    #[error("Please add at least one product.")]
    NoLineItems,

    /// A line item has no product chosen.
    #[error("Please choose a product for line {line}.")]
    ProductNotSelected { line: usize },
}

impl ValidationError {
    /// The form field this error belongs to, if it is field-level.
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooShort { field, .. }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::Mismatch { field, .. } => Some(field),
            ValidationError::PharmacyNotSelected => Some("pharmacyId"),
            ValidationError::NoLineItems | ValidationError::ProductNotSelected { .. } => {
                Some("items")
            }
        }
    }
}

// =============================================================================
// Field Errors
// =============================================================================

/// Every failing field of a submitted form.
///
/// Validators collect all failures instead of stopping at the first so the
/// form can highlight every invalid input at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{} field(s) failed validation: {}", self.errors.len(), self.summary())]
pub struct FieldErrors {
    errors: Vec<ValidationError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure.
    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Records the failure of a single-field check, if any.
    pub fn check(&mut self, result: Result<(), ValidationError>) {
        if let Err(e) = result {
            self.push(e);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Errors attached to one field.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a ValidationError> {
        self.errors.iter().filter(move |e| e.field() == Some(field))
    }

    /// Whether the named field has at least one error.
    pub fn has(&self, field: &str) -> bool {
        self.for_field(field).next().is_some()
    }

    /// `Ok(())` when nothing failed, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    fn summary(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
