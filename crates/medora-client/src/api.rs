//! # Portal API
//!
//! Typed wrappers over the REST endpoints the portal screens use.
//!
//! ## Endpoint Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Screen            Method                   Endpoint                    │
//! │  ──────            ──────                   ────────                    │
//! │  Pharmacy select   available_pharmacies()   GET  /pharmacies/available  │
//! │                    select_pharmacy(id)      POST /pharmacies/select     │
//! │  Pharmacy home     current_pharmacy()       GET  /pharmacies/current    │
//! │  Statement         statement()              GET  /pharmacies/statement  │
//! │  Products          products(query)          GET  /products?...          │
//! │                    categories(store)        GET  /categories?store=     │
//! │  New invoice       all_products()           GET  /products?limit=1000   │
//! │                    create_invoice(draft)    POST /invoices              │
//! │  Invoices          invoices()               GET  /invoices              │
//! │  Profile           change_password(form)    PUT  /users/password        │
//! │                                                                         │
//! │  Every call goes through SessionManager::send (bearer + 401 refresh)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use medora_core::validation::validate_password_change;
use medora_core::{
    CatalogStore, InvoiceDraft, InvoicePayload, InvoiceSummary, Page, PasswordChange, Pharmacy,
    PharmacyId, Product, Statement, CATALOG_PAGE_SIZE, PRODUCT_PICKER_LIMIT,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::ClientResult;
use crate::request::{ApiRequest, Envelope};
use crate::session::SessionManager;

// =============================================================================
// Queries
// =============================================================================

/// Filters of the catalog screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductQuery {
    pub store: CatalogStore,
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub category: Option<String>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        ProductQuery {
            store: CatalogStore::default(),
            page: 1,
            limit: CATALOG_PAGE_SIZE,
            search: None,
            category: None,
        }
    }
}

impl ProductQuery {
    fn to_request(&self) -> ApiRequest {
        ApiRequest::get("products")
            .query("store", self.store.id())
            .query("page", self.page.max(1))
            .query("limit", self.limit)
            .query_opt("search", self.search.as_deref().filter(|s| !s.trim().is_empty()))
            .query_opt("category", self.category.as_deref().filter(|c| !c.is_empty()))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordBody<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SelectPharmacyBody {
    pharmacy_id: PharmacyId,
}

/// A category entry of `GET /categories`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Category {
    Name(String),
    Named { name: String },
}

impl Category {
    pub fn name(&self) -> &str {
        match self {
            Category::Name(name) | Category::Named { name } => name,
        }
    }
}

// =============================================================================
// Portal API
// =============================================================================

/// Endpoint wrappers bound to a session.
#[derive(Debug, Clone)]
pub struct PortalApi {
    session: Arc<SessionManager>,
}

impl PortalApi {
    pub fn new(session: Arc<SessionManager>) -> Self {
        PortalApi { session }
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    // -------------------------------------------------------------------------
    // Profile
    // -------------------------------------------------------------------------

    /// Changes the password. The confirmation is checked locally and never
    /// sent.
    pub async fn change_password(&self, form: &PasswordChange) -> ClientResult<()> {
        validate_password_change(form)?;

        let request = ApiRequest::put("users/password").json(&PasswordBody {
            current_password: &form.current_password,
            new_password: &form.new_password,
        })?;
        self.session.send(&request).await?;

        info!("Password changed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Pharmacies
    // -------------------------------------------------------------------------

    pub async fn available_pharmacies(&self) -> ClientResult<Vec<Pharmacy>> {
        self.session
            .send_json(&ApiRequest::get("pharmacies/available"))
            .await
    }

    /// The pharmacy the user is working for.
    ///
    /// `None` means none is selected yet and the user must pick one.
    pub async fn current_pharmacy(&self) -> ClientResult<Option<Pharmacy>> {
        self.session
            .send_json(&ApiRequest::get("pharmacies/current"))
            .await
    }

    pub async fn select_pharmacy(&self, pharmacy_id: PharmacyId) -> ClientResult<()> {
        let request =
            ApiRequest::post("pharmacies/select").json(&SelectPharmacyBody { pharmacy_id })?;
        self.session.send(&request).await?;

        info!(%pharmacy_id, "Pharmacy selected");
        Ok(())
    }

    /// Account statement of the current pharmacy.
    pub async fn statement(&self) -> ClientResult<Statement> {
        self.session
            .send_json(&ApiRequest::get("pharmacies/statement"))
            .await
    }

    // -------------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------------

    /// One page of the catalog.
    pub async fn products(&self, query: &ProductQuery) -> ClientResult<Page<Product>> {
        debug!(store = query.store.id(), page = query.page, "Loading products");
        let body = self.session.send(&query.to_request()).await?;
        let envelope: Envelope<Vec<Product>> = serde_json::from_str(&body)?;

        Ok(Page {
            data: envelope.data,
            meta: envelope.meta,
        })
    }

    /// Every product, for the invoice screen's picker.
    pub async fn all_products(&self) -> ClientResult<Vec<Product>> {
        let request = ApiRequest::get("products").query("limit", PRODUCT_PICKER_LIMIT);
        self.session.send_json(&request).await
    }

    /// Category names of one store.
    pub async fn categories(&self, store: CatalogStore) -> ClientResult<Vec<String>> {
        let request = ApiRequest::get("categories").query("store", store.id());
        let categories: Vec<Category> = self.session.send_json(&request).await?;
        Ok(categories
            .iter()
            .map(|c| c.name().to_string())
            .collect())
    }

    // -------------------------------------------------------------------------
    // Invoices
    // -------------------------------------------------------------------------

    pub async fn invoices(&self) -> ClientResult<Vec<InvoiceSummary>> {
        self.session.send_json(&ApiRequest::get("invoices")).await
    }

    /// Validates the draft and submits it.
    ///
    /// Returns the payload that was sent. The draft itself is left untouched;
    /// the screen drops it after navigating away.
    pub async fn create_invoice(&self, draft: &InvoiceDraft) -> ClientResult<InvoicePayload> {
        let payload = draft.validate_for_submission()?;
        let totals = draft.compute_totals();

        let request = ApiRequest::post("invoices").json(&payload)?;
        self.session.send(&request).await?;

        info!(
            pharmacy_id = %payload.pharmacy_id,
            items = payload.items.len(),
            grand_total = %totals.grand_total,
            "Invoice created"
        );
        Ok(payload)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
