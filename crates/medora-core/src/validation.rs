//! # Validation Module
//!
//! Field and form validators for the portal's input screens.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Field validators                                             │
//! │  ├── validate_required, validate_email, validate_min_len, ...          │
//! │  └── One rule, one field, first failure wins                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Form validators (THIS MODULE)                                │
//! │  ├── validate_login, validate_registration, ...                        │
//! │  └── Collect every failing field into FieldErrors                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Portal API                                                   │
//! │  └── Server rejects what slips through (duplicate email, ...)          │
//! │                                                                         │
//! │  Forms with errors are never sent                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Field names match the JSON keys the forms bind to (`fullName`,
//! `confirmPassword`, ...).
//!
//! ## Usage
//! ```rust
//! use medora_core::validation::{validate_email, validate_login};
//!
//! assert!(validate_email("email", "sara@example.com").is_ok());
//!
//! let errors = validate_login("not-an-email", "").unwrap_err();
//! assert!(errors.has("email"));
//! assert!(errors.has("password"));
//! ```

use crate::error::{FieldErrors, ValidationError};
use crate::types::{PasswordChange, ProfileUpdate, Registration};
use crate::{MIN_NAME_LEN, MIN_PASSWORD_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Fails when the trimmed value is empty.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Requires at least `min` characters (after trimming).
///
/// Counts characters, not bytes, so Arabic names are measured correctly.
pub fn validate_min_len(field: &str, value: &str, min: usize) -> ValidationResult<()> {
    validate_required(field, value)?;

    if value.trim().chars().count() < min {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min,
        });
    }

    Ok(())
}

/// Validates an email address the way a browser's `type=email` input does.
///
/// ## Rules
/// - Must not be empty
/// - `local@domain` with exactly one `@`
/// - Local part uses letters, digits and ``.!#$%&'*+/=?^_`{|}~-``
/// - Domain is one or more dot-separated labels of letters, digits and `-`,
///   no label empty or starting or ending with `-`
///
/// A dotless domain such as `localhost` is accepted.
///
/// ## Example
/// ```rust
/// use medora_core::validation::validate_email;
///
/// assert!(validate_email("email", "sara@example.com").is_ok());
/// assert!(validate_email("email", "admin@localhost").is_ok());
/// assert!(validate_email("email", "sara@").is_err());
/// assert!(validate_email("email", "").is_err());
/// ```
pub fn validate_email(field: &str, email: &str) -> ValidationResult<()> {
    validate_required(field, email)?;

    let email = email.trim();
    let invalid = || ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid email address".to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || !local.chars().all(is_local_char) {
        return Err(invalid());
    }

    if domain.split('.').all(is_domain_label) {
        Ok(())
    } else {
        Err(invalid())
    }
}

fn is_local_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || ".!#$%&'*+/=?^_`{|}~-".contains(c)
}

fn is_domain_label(label: &str) -> bool {
    (1..=63).contains(&label.len())
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Validates a phone number.
///
/// ## Rules
/// - Must not be empty
/// - Digits, spaces, `+` and `-` only
pub fn validate_phone(field: &str, phone: &str) -> ValidationResult<()> {
    validate_required(field, phone)?;

    let phone = phone.trim();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || c == ' ' || c == '+' || c == '-');

    if !allowed {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a valid phone number".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Form Validators
// =============================================================================

/// Login form. Only presence and email shape are checked; the server decides
/// whether the password is right.
pub fn validate_login(email: &str, password: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    errors.check(validate_email("email", email));
    errors.check(validate_required("password", password));
    errors.into_result()
}

/// Signup form.
///
/// ## Rules
/// ```text
/// fullName   required, ≥ 2 characters
/// email      valid email
/// password   ≥ 6 characters
/// phone      digits, spaces, + and -
/// ```
pub fn validate_registration(form: &Registration) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    errors.check(validate_min_len("fullName", &form.full_name, MIN_NAME_LEN));
    errors.check(validate_email("email", &form.email));
    errors.check(validate_min_len("password", &form.password, MIN_PASSWORD_LEN));
    errors.check(validate_phone("phone", &form.phone));
    errors.into_result()
}

/// Profile form. The phone is optional but must be well formed when given.
///
/// `email` is checked only when the screen lets it be edited.
pub fn validate_profile(form: &ProfileUpdate, email: Option<&str>) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    errors.check(validate_min_len("name", &form.name, MIN_NAME_LEN));

    if let Some(phone) = form.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        errors.check(validate_phone("phone", phone));
    }
    if let Some(email) = email {
        errors.check(validate_email("email", email));
    }

    errors.into_result()
}

/// Password change form.
///
/// The mismatch error is attached to `confirmPassword`, the input the user
/// has to fix.
pub fn validate_password_change(form: &PasswordChange) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    errors.check(validate_required("currentPassword", &form.current_password));
    errors.check(validate_min_len(
        "newPassword",
        &form.new_password,
        MIN_PASSWORD_LEN,
    ));

    if form.confirm_password != form.new_password {
        errors.push(ValidationError::Mismatch {
            field: "confirmPassword".to_string(),
            other: "newPassword".to_string(),
        });
    }

    errors.into_result()
}

// =============================================================================
// Unit Tests
// =============================================================================
