//! # Domain Types
//!
//! The payload shapes exchanged with the portal REST API.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  UserProfile    │   │    Product      │   │    Pharmacy     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  name, email    │   │  id             │   │  id, name       │       │
//! │  │  theme, lang    │   │  name_en/ar     │   │  balance        │       │
//! │  │  last_login     │   │  price          │   │  balance_limit  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Statement     │   │ InvoiceSummary  │   │    Page<T>      │       │
//! │  │  transactions   │   │  status, amount │   │  data + meta    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Field names follow the API's camelCase JSON.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::de::{self, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::money::Money;

// =============================================================================
// Identifiers
// =============================================================================

/// Server-assigned product identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-assigned pharmacy identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PharmacyId(pub u64);

impl fmt::Display for PharmacyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Preferences
// =============================================================================

/// Color theme saved on the user's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

/// Interface language. Arabic screens are right-to-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ar,
}

impl Language {
    /// Route prefix used by every screen (`/en/...`, `/ar/...`).
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ar => "ar",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "ar" | "arabic" => Ok(Language::Ar),
            other => Err(format!("Unknown language: '{}'. Valid options: en, ar", other)),
        }
    }
}

/// Preferences the UI applies whenever a session is established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Preferences {
    /// `None` leaves the UI's current theme untouched.
    pub theme: Option<Theme>,
    pub language: Language,
}

// =============================================================================
// User
// =============================================================================

/// The authenticated user as returned by `/auth/login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<Language>,
    /// Unparseable values are dropped rather than failing the login.
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_login: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Preferences to apply for this user. Language falls back to English.
    pub fn preferences(&self) -> Preferences {
        Preferences {
            theme: self.theme,
            language: self.lang.unwrap_or_default(),
        }
    }

    /// Greeting shown after login when the server reports a previous login.
    ///
    /// ```rust
    /// use chrono::{TimeZone, Utc};
    /// use medora_core::UserProfile;
    ///
    /// let user = UserProfile {
    ///     name: "Sara".into(),
    ///     email: "sara@example.com".into(),
    ///     phone: None,
    ///     avatar_url: None,
    ///     theme: None,
    ///     lang: None,
    ///     last_login: Some(Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap()),
    /// };
    /// assert_eq!(
    ///     user.welcome_message().unwrap(),
    ///     "Welcome back, Sara! Last login: March 5th, 2024 2:30 PM"
    /// );
    /// ```
    pub fn welcome_message(&self) -> Option<String> {
        self.last_login.map(|at| {
            format!(
                "Welcome back, {}! Last login: {} {}{}, {}",
                self.name,
                at.format("%B"),
                at.format("%-d"),
                ordinal_suffix(chrono::Datelike::day(&at)),
                at.format("%Y %-I:%M %p"),
            )
        })
    }
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Body of `PUT /users/profile`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Password change form. Only `current_password` and `new_password` are sent.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Registration form submitted to `/auth/register`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
}

// =============================================================================
// Catalog
// =============================================================================

/// A product image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductImage {
    pub url: String,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name_en: String,
    pub name_ar: String,
    pub price: Money,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    /// Catalog store this product belongs to (medicine, cosmetics, ...).
    #[serde(default)]
    pub store: Option<u32>,
    #[serde(default)]
    pub store_name: Option<String>,
}

impl Product {
    /// Product name in the requested language.
    pub fn display_name(&self, language: Language) -> &str {
        match language {
            Language::En => &self.name_en,
            Language::Ar => &self.name_ar,
        }
    }
}

/// Catalog stores the products screen can switch between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogStore {
    #[default]
    Medicine,
    Cosmetics,
}

impl CatalogStore {
    /// Store id the API expects in `?store=`.
    pub fn id(&self) -> u32 {
        match self {
            CatalogStore::Medicine => 1,
            CatalogStore::Cosmetics => 6,
        }
    }
}

/// Pagination block returned next to list data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

/// One page of list results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: Option<PageMeta>,
}

// =============================================================================
// Pharmacy
// =============================================================================

/// A pharmacy account the user can order for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pharmacy {
    pub id: PharmacyId,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub balance_limit: Option<Money>,
    #[serde(default)]
    pub balance: Option<Money>,
}

impl Pharmacy {
    /// Credit left before the balance limit is reached.
    pub fn available_credit(&self) -> Option<Money> {
        match (self.balance_limit, self.balance) {
            (Some(limit), Some(balance)) => Some(limit - balance),
            _ => None,
        }
    }
}

// =============================================================================
// Statement
// =============================================================================

/// Kind of account movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    /// Increases what the pharmacy owes.
    Invoice,
    Payment,
    Return,
}

impl TransactionKind {
    /// Whether the movement reduces the pharmacy's balance.
    pub fn is_credit(&self) -> bool {
        matches!(self, TransactionKind::Payment | TransactionKind::Return)
    }
}

/// Product line inside an invoice or return transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetail {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub total: Money,
    #[serde(default)]
    pub discount: Money,
}

/// One statement row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub id: u64,
    pub date: String,
    pub amount: Money,
    #[serde(default)]
    pub details: Option<Vec<TransactionDetail>>,
    pub running_balance: Money,
}

/// Account statement of the current pharmacy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    pub pharmacy_name: String,
    pub starting_balance: Money,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Statement {
    /// Balance after the last transaction.
    pub fn closing_balance(&self) -> Money {
        self.transactions
            .last()
            .map(|t| t.running_balance)
            .unwrap_or(self.starting_balance)
    }
}

// =============================================================================
// Invoices
// =============================================================================

/// Payment status of a submitted invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Paid,
    Pending,
    Overdue,
}

/// Row of the invoices list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSummary {
    pub id: String,
    pub pharmacy_name: String,
    /// Plain dates and full timestamps are both accepted.
    #[serde(deserialize_with = "date_or_timestamp")]
    pub date: NaiveDate,
    pub status: InvoiceStatus,
    pub amount: Money,
}

// =============================================================================
// Timestamps
// =============================================================================

const NAIVE_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parses the timestamp shapes the API sends.
///
/// Accepts RFC 3339, ISO date-times without an offset (read as UTC) and
/// plain `YYYY-MM-DD` dates (midnight UTC).
///
/// ```rust
/// use medora_core::parse_timestamp;
///
/// let with_offset = parse_timestamp("2024-03-05T14:30:00Z").unwrap();
/// assert_eq!(parse_timestamp("2024-03-05T14:30:00"), Some(with_offset));
/// assert!(parse_timestamp("yesterday").is_none());
/// ```
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Some(at.with_timezone(&Utc));
    }

    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Any JSON value found where a timestamp is expected.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    /// Milliseconds since the epoch.
    Millis(i64),
    Other(IgnoredAny),
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawTimestamp>::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| match raw {
        RawTimestamp::Text(text) => parse_timestamp(&text),
        RawTimestamp::Millis(ms) => Utc.timestamp_millis_opt(ms).single(),
        RawTimestamp::Other(_) => None,
    }))
}

fn date_or_timestamp<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(text.trim())
                .ok()
                .map(|at| at.date_naive())
        })
        .or_else(|| parse_timestamp(&text).map(|at| at.date_naive()))
        .ok_or_else(|| de::Error::custom(format!("invalid date: {text}")))
}

// =============================================================================
// Unit Tests
// =============================================================================
