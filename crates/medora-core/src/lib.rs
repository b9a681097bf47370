//! # medora-core: Pure Business Logic for the Medora Portal
//!
//! Every rule the portal screens rely on that does not need the network
//! lives here as plain data and pure functions.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Medora Portal Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Portal Screens                               │   │
//! │  │    Login ──► Pharmacy ──► Products ──► New Invoice ──► Profile  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               medora-client (SessionManager, PortalApi)         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ medora-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  invoice  │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │  Draft    │  │   forms   │  │   │
//! │  │   │  Pharmacy │  │  TaxRate  │  │  LineItem │  │  fields   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                  ┌───────────┐                                  │   │
//! │  │                  │   auth    │  AuthState machine, Route        │   │
//! │  │                  └───────────┘                                  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO STORAGE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (UserProfile, Product, Pharmacy, Statement, etc.)
//! - [`money`] - Exact decimal money and tax rates
//! - [`invoice`] - The invoice draft calculator
//! - [`auth`] - Session state machine and navigation routes
//! - [`validation`] - Field and form validators
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use medora_core::money::Money;
//! use medora_core::INVOICE_TAX_RATE;
//!
//! let subtotal = Money::from_cents(2550); // 25.50
//! let tax = subtotal.calculate_tax(INVOICE_TAX_RATE);
//!
//! // Exact: 25.50 × 15% = 3.825
//! assert_eq!(tax, Money::parse("3.825").unwrap());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod error;
pub mod invoice;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use auth::{AuthEvent, AuthState, Route};
pub use error::{CoreError, CoreResult, FieldErrors, ValidationError};
pub use invoice::{InvoiceDraft, InvoiceItemPayload, InvoicePayload, InvoiceTotals, LineItem};
pub use money::{Money, TaxRate};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Tax applied to every invoice draft (15%).
pub const INVOICE_TAX_RATE: TaxRate = TaxRate::from_bps(1500);

/// Page size the invoice screen uses to load the whole catalog into its
/// product picker.
pub const PRODUCT_PICKER_LIMIT: u32 = 1000;

/// Page size of the catalog browsing screen.
pub const CATALOG_PAGE_SIZE: u32 = 12;

/// Minimum length of a password accepted by signup and password change.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Minimum length of a display name.
pub const MIN_NAME_LEN: usize = 2;
