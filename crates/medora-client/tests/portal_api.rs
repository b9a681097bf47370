//! Endpoint wrappers against a mock portal API.

mod common;

use chrono::NaiveDate;
use common::{data, error, signed_in, user_json};
use medora_client::{ClientError, PortalApi, ProductQuery, SessionStore};
use medora_core::{
    CatalogStore, InvoiceDraft, InvoiceStatus, Language, Money, PasswordChange, PharmacyId,
    ProfileUpdate, ValidationError,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn product_json(id: u64, price: &str) -> serde_json::Value {
    json!({
        "id": id,
        "nameEn": format!("Product {id}"),
        "nameAr": format!("منتج {id}"),
        "price": price,
        "category": "Pain Relief",
        "images": [{ "url": format!("https://cdn.example.com/{id}.png") }],
        "store": 1
    })
}

#[tokio::test]
async fn test_current_pharmacy_null_means_select() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pharmacies/current"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(data(json!(null)))
        .mount(&server)
        .await;

    let (session, _) = signed_in(&server, "T1", Some("R1"));
    let api = PortalApi::new(session);

    assert_eq!(api.current_pharmacy().await.unwrap(), None);
}

#[tokio::test]
async fn test_available_pharmacies_and_select() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pharmacies/available"))
        .respond_with(data(json!([
            { "id": 3, "name": "Al Noor", "balanceLimit": 5000, "balance": "1200.50" },
            { "id": 4, "name": "Al Shifa" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/pharmacies/select"))
        .and(body_json(json!({ "pharmacyId": 3 })))
        .respond_with(data(json!({ "id": 3 })))
        .expect(1)
        .mount(&server)
        .await;

    let (session, _) = signed_in(&server, "T1", Some("R1"));
    let api = PortalApi::new(session);

    let pharmacies = api.available_pharmacies().await.unwrap();
    assert_eq!(pharmacies.len(), 2);
    assert_eq!(
        pharmacies[0].available_credit(),
        Some(Money::parse("3799.50").unwrap())
    );
    assert_eq!(pharmacies[1].available_credit(), None);

    api.select_pharmacy(PharmacyId(3)).await.unwrap();
}

#[tokio::test]
async fn test_products_page_with_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("store", "6"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "12"))
        .and(query_param("search", "cream"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [product_json(7, "10.50")],
            "meta": { "total": 13, "page": 2, "limit": 12, "totalPages": 2 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (session, _) = signed_in(&server, "T1", Some("R1"));
    let api = PortalApi::new(session);

    let page = api
        .products(&ProductQuery {
            store: CatalogStore::Cosmetics,
            page: 2,
            search: Some("cream".into()),
            ..ProductQuery::default()
        })
        .await
        .unwrap();

    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].price, Money::from_cents(1050));
    let meta = page.meta.unwrap();
    assert_eq!(meta.total_pages, 2);
    assert_eq!(meta.total, 13);
}

#[tokio::test]
async fn test_all_products_and_categories() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("limit", "1000"))
        .respond_with(data(json!([product_json(1, "10.00"), product_json(2, "5.50")])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/categories"))
        .and(query_param("store", "1"))
        .respond_with(data(json!(["Pain Relief", { "name": "Vitamins" }])))
        .mount(&server)
        .await;

    let (session, _) = signed_in(&server, "T1", Some("R1"));
    let api = PortalApi::new(session);

    assert_eq!(api.all_products().await.unwrap().len(), 2);
    assert_eq!(
        api.categories(CatalogStore::Medicine).await.unwrap(),
        vec!["Pain Relief".to_string(), "Vitamins".to_string()]
    );
}

#[tokio::test]
async fn test_statement_and_invoices() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pharmacies/statement"))
        .respond_with(data(json!({
            "pharmacyName": "Al Noor",
            "startingBalance": 0,
            "transactions": [
                { "type": "INVOICE", "id": 1, "date": "2024-05-01", "amount": "29.33", "runningBalance": "29.33" }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/invoices"))
        .respond_with(data(json!([
            { "id": "INV-001", "pharmacyName": "Al Noor", "date": "2024-05-01", "status": "pending", "amount": "29.33" }
        ])))
        .mount(&server)
        .await;

    let (session, _) = signed_in(&server, "T1", Some("R1"));
    let api = PortalApi::new(session);

    let statement = api.statement().await.unwrap();
    assert_eq!(statement.closing_balance(), Money::from_cents(2933));

    let invoices = api.invoices().await.unwrap();
    assert_eq!(invoices[0].status, InvoiceStatus::Pending);
    assert_eq!(invoices[0].date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
}

#[tokio::test]
async fn test_invoices_accept_timestamped_dates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/invoices"))
        .respond_with(data(json!([
            { "id": "INV-001", "pharmacyName": "Al Noor", "date": "2024-05-01", "status": "paid", "amount": "10.00" },
            { "id": "INV-002", "pharmacyName": "Al Noor", "date": "2024-05-01T10:00:00.000Z", "status": "overdue", "amount": "12.50" }
        ])))
        .mount(&server)
        .await;

    let (session, _) = signed_in(&server, "T1", Some("R1"));
    let api = PortalApi::new(session);

    let invoices = api.invoices().await.unwrap();
    let may_first = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    assert_eq!(invoices.len(), 2);
    assert!(invoices.iter().all(|invoice| invoice.date == may_first));
    assert_eq!(invoices[1].status, InvoiceStatus::Overdue);
}

fn filled_draft() -> InvoiceDraft {
    let products: Vec<medora_core::Product> = serde_json::from_value(json!([
        product_json(7, "10.00"),
        product_json(9, "5.50")
    ]))
    .unwrap();

    let mut draft = InvoiceDraft::new(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), Language::En);
    draft.select_pharmacy(PharmacyId(3));
    let a = draft.add_line_item();
    let b = draft.add_line_item();
    draft.set_line_item_product(a, &products[0]).unwrap();
    draft.set_line_item_quantity(a, 2).unwrap();
    draft.set_line_item_product(b, &products[1]).unwrap();
    draft
}

#[tokio::test]
async fn test_create_invoice_posts_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/invoices"))
        .and(body_json(json!({
            "pharmacyId": 3,
            "date": "2024-05-01",
            "items": [
                { "productId": 7, "quantity": 2 },
                { "productId": 9, "quantity": 1 }
            ]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "data": { "id": "INV-002" } })))
        .expect(1)
        .mount(&server)
        .await;

    let (session, _) = signed_in(&server, "T1", Some("R1"));
    let api = PortalApi::new(session);

    let draft = filled_draft();
    let payload = api.create_invoice(&draft).await.unwrap();
    assert_eq!(payload.items.len(), 2);
    assert_eq!(draft.compute_totals().grand_total, Money::parse("29.325").unwrap());
}

#[tokio::test]
async fn test_invalid_invoice_is_never_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/invoices"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let (session, _) = signed_in(&server, "T1", Some("R1"));
    let api = PortalApi::new(session);

    let mut draft = filled_draft();
    draft.add_line_item();

    let err = api.create_invoice(&draft).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Validation(ValidationError::ProductNotSelected { line: 3 })
    ));
}

#[tokio::test]
async fn test_change_password_sends_only_two_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/users/password"))
        .and(body_json(json!({ "currentPassword": "old-pass", "newPassword": "secret1" })))
        .respond_with(data(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let (session, _) = signed_in(&server, "T1", Some("R1"));
    let api = PortalApi::new(session);

    let form = PasswordChange {
        current_password: "old-pass".into(),
        new_password: "secret1".into(),
        confirm_password: "secret1".into(),
    };
    api.change_password(&form).await.unwrap();

    let mismatch = PasswordChange {
        confirm_password: "other".into(),
        ..form
    };
    match api.change_password(&mismatch).await.unwrap_err() {
        ClientError::Form(errors) => assert!(errors.has("confirmPassword")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_api_error_message_surfaces() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/users/password"))
        .respond_with(error(400, "Current password is incorrect"))
        .mount(&server)
        .await;

    let (session, _) = signed_in(&server, "T1", Some("R1"));
    let api = PortalApi::new(session);

    let err = api
        .change_password(&PasswordChange {
            current_password: "wrong".into(),
            new_password: "secret1".into(),
            confirm_password: "secret1".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "Current password is incorrect");
}

#[tokio::test]
async fn test_update_profile_updates_session_and_store() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/users/profile"))
        .and(body_json(json!({ "name": "Sara Ahmed", "phone": "0509999999" })))
        .respond_with(data(user_json()))
        .expect(1)
        .mount(&server)
        .await;

    let (session, store) = signed_in(&server, "T1", Some("R1"));
    let rx = session.subscribe();

    let user = session
        .update_profile(&ProfileUpdate {
            name: "Sara Ahmed".into(),
            phone: Some("0509999999".into()),
        })
        .await
        .unwrap();

    assert_eq!(user.name, "Sara Ahmed");
    assert_eq!(session.current_user().unwrap().phone.as_deref(), Some("0509999999"));
    assert_eq!(store.load().unwrap().unwrap().user.name, "Sara Ahmed");
    assert_eq!(rx.borrow().user.as_ref().unwrap().name, "Sara Ahmed");
}
