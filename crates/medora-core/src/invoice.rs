//! # Invoice Draft
//!
//! The editable line-item list behind the new-invoice screen.
//!
//! ## Draft Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Invoice Draft Operations                             │
//! │                                                                         │
//! │  Screen Action            Draft Method                 State Change     │
//! │  ─────────────            ────────────                 ────────────     │
//! │                                                                         │
//! │  Click "Add product" ───► add_line_item() ──────────► items.push(empty) │
//! │                                                                         │
//! │  Pick product ──────────► set_line_item_product() ──► id/name/price     │
//! │                                                                         │
//! │  Change quantity ───────► set_line_item_quantity() ─► qty = max(q, 1)   │
//! │                                                                         │
//! │  Click trash icon ──────► remove_line_item() ───────► items.remove(i)   │
//! │                                                                         │
//! │  Totals footer ─────────► compute_totals() ─────────► (read only)       │
//! │                                                                         │
//! │  Click "Create" ────────► validate_for_submission() ► InvoicePayload    │
//! │                                                                         │
//! │  Every edit recomputes the touched line_total. Totals are never cached. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A draft lives for one visit of the screen. It is not persisted and is
//! dropped after a successful submission.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Language, PharmacyId, Product, ProductId};
use crate::INVOICE_TAX_RATE;

// =============================================================================
// Line Item
// =============================================================================

/// One product entry of the draft.
///
/// ## Invariants
/// - `quantity >= 1`
/// - `line_total == unit_price × quantity` after every edit
///
/// Fields are private so the invariants can only be changed through the
/// draft's methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    product_id: Option<ProductId>,
    product_name: String,
    quantity: u32,
    unit_price: Money,
    line_total: Money,
}

impl LineItem {
    /// A row with no product chosen yet.
    fn unselected() -> Self {
        LineItem {
            product_id: None,
            product_name: String::new(),
            quantity: 1,
            unit_price: Money::zero(),
            line_total: Money::zero(),
        }
    }

    fn recompute(&mut self) {
        self.line_total = self.unit_price.multiply_quantity(self.quantity);
    }

    pub fn product_id(&self) -> Option<ProductId> {
        self.product_id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn line_total(&self) -> Money {
        self.line_total
    }
}

// =============================================================================
// Totals and Payload
// =============================================================================

/// Totals footer of the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub grand_total: Money,
}

/// One `items[]` entry of `POST /invoices`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItemPayload {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body of `POST /invoices`.
///
/// ```json
/// { "pharmacyId": 3, "date": "2024-05-01", "items": [{ "productId": 7, "quantity": 2 }] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePayload {
    pub pharmacy_id: PharmacyId,
    /// Serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub items: Vec<InvoiceItemPayload>,
}

// =============================================================================
// Draft
// =============================================================================

/// The in-memory invoice being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDraft {
    pharmacy_id: Option<PharmacyId>,
    issue_date: NaiveDate,
    language: Language,
    line_items: Vec<LineItem>,
}

impl InvoiceDraft {
    /// Creates an empty draft.
    ///
    /// `language` selects which product name is copied into line items.
    pub fn new(issue_date: NaiveDate, language: Language) -> Self {
        InvoiceDraft {
            pharmacy_id: None,
            issue_date,
            language,
            line_items: Vec::new(),
        }
    }

    /// Creates an empty draft dated today (UTC).
    pub fn today(language: Language) -> Self {
        Self::new(chrono::Utc::now().date_naive(), language)
    }

    // -------------------------------------------------------------------------
    // Header
    // -------------------------------------------------------------------------

    /// Chooses the pharmacy the invoice is issued for.
    pub fn select_pharmacy(&mut self, pharmacy_id: PharmacyId) {
        self.pharmacy_id = Some(pharmacy_id);
    }

    pub fn pharmacy_id(&self) -> Option<PharmacyId> {
        self.pharmacy_id
    }

    pub fn set_issue_date(&mut self, date: NaiveDate) {
        self.issue_date = date;
    }

    pub fn issue_date(&self) -> NaiveDate {
        self.issue_date
    }

    pub fn language(&self) -> Language {
        self.language
    }

    // -------------------------------------------------------------------------
    // Line items
    // -------------------------------------------------------------------------

    /// Appends an unselected row (quantity 1, price 0, total 0).
    ///
    /// Returns the index of the new row.
    pub fn add_line_item(&mut self) -> usize {
        self.line_items.push(LineItem::unselected());
        self.line_items.len() - 1
    }

    /// Copies the chosen product into a row and recomputes its total with the
    /// row's current quantity.
    ///
    /// A product priced below zero is rejected and the row is left as it was.
    pub fn set_line_item_product(&mut self, index: usize, product: &Product) -> CoreResult<()> {
        let language = self.language;
        let item = self.item_mut(index)?;
        if product.price.is_negative() {
            return Err(CoreError::NegativePrice {
                product_id: product.id,
                price: product.price,
            });
        }

        item.product_id = Some(product.id);
        item.product_name = product.display_name(language).to_string();
        item.unit_price = product.price;
        item.recompute();
        Ok(())
    }

    /// Sets a row's quantity, clamping anything below 1 up to 1.
    ///
    /// Clamping is silent: the quantity input never shows an error.
    pub fn set_line_item_quantity(&mut self, index: usize, quantity: i64) -> CoreResult<()> {
        let quantity = u32::try_from(quantity.max(1)).unwrap_or(u32::MAX);
        let item = self.item_mut(index)?;
        item.quantity = quantity;
        item.recompute();
        Ok(())
    }

    /// Deletes a row. Later rows shift down by one.
    pub fn remove_line_item(&mut self, index: usize) -> CoreResult<LineItem> {
        self.check_index(index)?;
        Ok(self.line_items.remove(index))
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn line_item(&self, index: usize) -> Option<&LineItem> {
        self.line_items.get(index)
    }

    pub fn len(&self) -> usize {
        self.line_items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }

    // -------------------------------------------------------------------------
    // Derived values
    // -------------------------------------------------------------------------

    /// Recomputes subtotal, tax and grand total from the current rows.
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use medora_core::{InvoiceDraft, Language, Money};
    ///
    /// let draft = InvoiceDraft::new(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), Language::En);
    /// let totals = draft.compute_totals();
    /// assert_eq!(totals.grand_total, Money::zero());
    /// ```
    pub fn compute_totals(&self) -> InvoiceTotals {
        let subtotal: Money = self.line_items.iter().map(LineItem::line_total).sum();
        let tax = subtotal.calculate_tax(INVOICE_TAX_RATE);
        InvoiceTotals {
            subtotal,
            tax,
            grand_total: subtotal + tax,
        }
    }

    /// Checks the draft can be submitted and builds the request body.
    ///
    /// ## Rules (checked in this order)
    /// 1. A pharmacy is selected
    /// 2. There is at least one row
    /// 3. Every row has a product
    pub fn validate_for_submission(&self) -> Result<InvoicePayload, ValidationError> {
        let pharmacy_id = self.pharmacy_id.ok_or(ValidationError::PharmacyNotSelected)?;

        if self.line_items.is_empty() {
            return Err(ValidationError::NoLineItems);
        }

        let items = self
            .line_items
            .iter()
            .enumerate()
            .map(|(line, item)| {
                item.product_id
                    .map(|product_id| InvoiceItemPayload {
                        product_id,
                        quantity: item.quantity,
                    })
                    .ok_or(ValidationError::ProductNotSelected { line: line + 1 })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(InvoicePayload {
            pharmacy_id,
            date: self.issue_date,
            items,
        })
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn check_index(&self, index: usize) -> CoreResult<()> {
        if index < self.line_items.len() {
            Ok(())
        } else {
            Err(CoreError::IndexOutOfRange {
                index,
                len: self.line_items.len(),
            })
        }
    }

    fn item_mut(&mut self, index: usize) -> CoreResult<&mut LineItem> {
        let len = self.line_items.len();
        self.line_items
            .get_mut(index)
            .ok_or(CoreError::IndexOutOfRange { index, len })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_product(id: u64, price_cents: i64) -> Product {
        Product {
            id: ProductId(id),
            name_en: format!("Product {}", id),
            name_ar: format!("منتج {}", id),
            price: Money::from_cents(price_cents),
            category: None,
            images: Vec::new(),
            store: Some(1),
            store_name: None,
        }
    }

    fn draft() -> InvoiceDraft {
        InvoiceDraft::new(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), Language::En)
    }

    #[test]
    fn test_add_line_item_is_unselected() {
        let mut draft = draft();
        let index = draft.add_line_item();

        let item = draft.line_item(index).unwrap();
        assert_eq!(index, 0);
        assert_eq!(item.product_id(), None);
        assert_eq!(item.quantity(), 1);
        assert!(item.unit_price().is_zero());
        assert!(item.line_total().is_zero());
    }

    #[test]
    fn test_two_product_scenario() {
        let mut draft = draft();
        let a = draft.add_line_item();
        let b = draft.add_line_item();

        draft.set_line_item_product(a, &test_product(1, 1000)).unwrap();
        draft.set_line_item_quantity(a, 2).unwrap();
        draft.set_line_item_product(b, &test_product(2, 550)).unwrap();

        assert_eq!(draft.line_items()[a].line_total(), Money::from_cents(2000));
        assert_eq!(draft.line_items()[b].line_total(), Money::from_cents(550));

        let totals = draft.compute_totals();
        assert_eq!(totals.subtotal, Money::parse("25.50").unwrap());
        assert_eq!(totals.tax, Money::parse("3.825").unwrap());
        assert_eq!(totals.grand_total, Money::parse("29.325").unwrap());
    }

    #[test]
    fn test_product_change_keeps_quantity() {
        let mut draft = draft();
        let i = draft.add_line_item();
        draft.set_line_item_quantity(i, 3).unwrap();
        draft.set_line_item_product(i, &test_product(1, 200)).unwrap();

        let item = &draft.line_items()[i];
        assert_eq!(item.quantity(), 3);
        assert_eq!(item.line_total(), Money::from_cents(600));
        assert_eq!(item.product_name(), "Product 1");
    }

    #[test]
    fn test_arabic_draft_uses_arabic_names() {
        let mut draft =
            InvoiceDraft::new(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), Language::Ar);
        let i = draft.add_line_item();
        draft.set_line_item_product(i, &test_product(4, 100)).unwrap();
        assert_eq!(draft.line_items()[i].product_name(), "منتج 4");
    }

    #[test]
    fn test_quantity_clamped_to_one() {
        let mut draft = draft();
        let i = draft.add_line_item();
        draft.set_line_item_product(i, &test_product(1, 999)).unwrap();

        draft.set_line_item_quantity(i, 0).unwrap();
        assert_eq!(draft.line_items()[i].quantity(), 1);

        draft.set_line_item_quantity(i, -5).unwrap();
        assert_eq!(draft.line_items()[i].quantity(), 1);
        assert_eq!(draft.line_items()[i].line_total(), Money::from_cents(999));
    }

    #[test]
    fn test_negative_price_is_rejected() {
        let mut draft = draft();
        let i = draft.add_line_item();
        draft.set_line_item_product(i, &test_product(1, 300)).unwrap();

        assert_eq!(
            draft.set_line_item_product(i, &test_product(2, -500)),
            Err(CoreError::NegativePrice {
                product_id: ProductId(2),
                price: Money::from_cents(-500),
            })
        );

        let item = &draft.line_items()[i];
        assert_eq!(item.product_id(), Some(ProductId(1)));
        assert_eq!(item.line_total(), Money::from_cents(300));
        assert!(!draft.compute_totals().grand_total.is_negative());
    }

    #[test]
    fn test_free_product_is_accepted() {
        let mut draft = draft();
        let i = draft.add_line_item();
        draft.set_line_item_product(i, &test_product(1, 0)).unwrap();
        assert_eq!(draft.line_items()[i].product_id(), Some(ProductId(1)));
        assert!(draft.compute_totals().grand_total.is_zero());
    }

    #[test]
    fn test_index_out_of_range() {
        let mut draft = draft();
        draft.add_line_item();

        assert_eq!(
            draft.set_line_item_quantity(1, 2),
            Err(CoreError::IndexOutOfRange { index: 1, len: 1 })
        );
        assert!(draft.set_line_item_product(5, &test_product(1, 1)).is_err());
        assert!(draft.remove_line_item(1).is_err());
        assert_eq!(draft.len(), 1);
    }

    #[test]
    fn test_remove_line_item() {
        let mut draft = draft();
        let a = draft.add_line_item();
        let b = draft.add_line_item();
        draft.set_line_item_product(b, &test_product(2, 550)).unwrap();

        draft.remove_line_item(a).unwrap();

        assert_eq!(draft.len(), 1);
        assert_eq!(draft.line_items()[0].product_id(), Some(ProductId(2)));
        assert_eq!(draft.compute_totals().subtotal, Money::from_cents(550));
    }

    #[test]
    fn test_compute_totals_is_idempotent() {
        let mut draft = draft();
        let i = draft.add_line_item();
        draft.set_line_item_product(i, &test_product(1, 1234)).unwrap();

        assert_eq!(draft.compute_totals(), draft.compute_totals());
    }

    #[test]
    fn test_validate_requires_pharmacy() {
        let mut draft = draft();
        let i = draft.add_line_item();
        draft.set_line_item_product(i, &test_product(1, 100)).unwrap();

        assert_eq!(
            draft.validate_for_submission(),
            Err(ValidationError::PharmacyNotSelected)
        );
    }

    #[test]
    fn test_validate_requires_items() {
        let mut draft = draft();
        draft.select_pharmacy(PharmacyId(3));

        assert_eq!(draft.validate_for_submission(), Err(ValidationError::NoLineItems));
    }

    #[test]
    fn test_validate_requires_every_product() {
        let mut draft = draft();
        draft.select_pharmacy(PharmacyId(3));
        let a = draft.add_line_item();
        draft.add_line_item();
        draft.set_line_item_product(a, &test_product(1, 100)).unwrap();

        assert_eq!(
            draft.validate_for_submission(),
            Err(ValidationError::ProductNotSelected { line: 2 })
        );
    }

    #[test]
    fn test_validate_builds_payload() {
        let mut draft = draft();
        draft.select_pharmacy(PharmacyId(3));
        let a = draft.add_line_item();
        let b = draft.add_line_item();
        draft.set_line_item_product(a, &test_product(7, 1000)).unwrap();
        draft.set_line_item_quantity(a, 2).unwrap();
        draft.set_line_item_product(b, &test_product(9, 550)).unwrap();

        let payload = draft.validate_for_submission().unwrap();
        assert_eq!(payload.items.len(), draft.len());

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "pharmacyId": 3,
                "date": "2024-05-01",
                "items": [
                    { "productId": 7, "quantity": 2 },
                    { "productId": 9, "quantity": 1 }
                ]
            })
        );
    }

    #[derive(Debug, Clone)]
    enum Edit {
        Add,
        Product(usize, u64, i64),
        Quantity(usize, i64),
        Remove(usize),
    }

    fn edit_strategy() -> impl Strategy<Value = Edit> {
        prop_oneof![
            Just(Edit::Add),
            (0usize..8, 1u64..50, -1_000i64..100_000).prop_map(|(i, id, p)| Edit::Product(i, id, p)),
            (0usize..8, -10i64..500).prop_map(|(i, q)| Edit::Quantity(i, q)),
            (0usize..8).prop_map(Edit::Remove),
        ]
    }

    proptest! {
        #[test]
        fn prop_line_total_always_matches(edits in prop::collection::vec(edit_strategy(), 0..40)) {
            let mut draft = draft();
            for edit in edits {
                let _ = match edit {
                    Edit::Add => { draft.add_line_item(); Ok(()) }
                    Edit::Product(i, id, price) => draft.set_line_item_product(i, &test_product(id, price)),
                    Edit::Quantity(i, q) => draft.set_line_item_quantity(i, q),
                    Edit::Remove(i) => draft.remove_line_item(i).map(|_| ()),
                };

                for item in draft.line_items() {
                    prop_assert!(item.quantity() >= 1);
                    prop_assert!(!item.unit_price().is_negative());
                    prop_assert_eq!(item.line_total(), item.unit_price() * item.quantity());
                }

                let totals = draft.compute_totals();
                prop_assert!(!totals.grand_total.is_negative());
                prop_assert_eq!(
                    totals.grand_total,
                    totals.subtotal + totals.subtotal.calculate_tax(INVOICE_TAX_RATE)
                );
            }
        }

        #[test]
        fn prop_non_positive_quantity_becomes_one(q in i64::MIN..=0) {
            let mut draft = draft();
            let i = draft.add_line_item();
            draft.set_line_item_quantity(i, q).unwrap();
            prop_assert_eq!(draft.line_items()[i].quantity(), 1);
        }
    }
}
