use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use scrapyard_accounting::Account;
use scrapyard_api::app::{build_app, AppServices};
use scrapyard_core::{
    AccountId, CompanyId, GodownId, LabourId, Money, Rate, Scope, ScrapTypeId, VendorId,
};
use scrapyard_infra::InMemoryStore;
use scrapyard_observability::LogFormat;
use scrapyard_parties::{Labourer, Vendor};
use scrapyard_purchasing::RateAgreement;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(store: Arc<InMemoryStore>) -> Self {
        scrapyard_observability::tracing::init(LogFormat::Pretty);

        // Same router as prod, bound to an ephemeral port.
        let app = build_app(AppServices::in_memory(store));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn dec_field(v: &Value) -> Decimal {
    match v {
        Value::String(s) => dec(s),
        other => dec(&other.to_string()),
    }
}

struct Seeded {
    store: Arc<InMemoryStore>,
    scope: Scope,
    vendor: VendorId,
    iron: ScrapTypeId,
    unpriced: ScrapTypeId,
    account: AccountId,
    labourer: LabourId,
}

impl Seeded {
    async fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let scope = Scope::new(CompanyId::new(), GodownId::new());

        let vendor = Vendor::new(VendorId::new(), "Ramesh").unwrap();
        let iron = ScrapTypeId::new();
        store
            .set_rate(RateAgreement::new(
                vendor.id_typed(),
                iron,
                Rate::new(dec("10")),
                "Iron",
            ))
            .await;
        let vendor_id = vendor.id_typed();
        store.add_vendor(vendor).await;

        let account = AccountId::new();
        store
            .open_account(Account::new(account, "Cash", Money::new(dec("10000"))))
            .await;

        let labourer = Labourer::new(LabourId::new(), scope, "Suresh", Money::new(dec("500")))
            .unwrap();
        let labour_id = labourer.id_typed();
        store.add_labourer(labourer).await;

        Self {
            store,
            scope,
            vendor: vendor_id,
            iron,
            unpriced: ScrapTypeId::new(),
            account,
            labourer: labour_id,
        }
    }

    fn company(&self) -> String {
        self.scope.company_id.to_string()
    }

    fn godown(&self) -> String {
        self.scope.godown_id.to_string()
    }

    fn scope_query(&self) -> String {
        format!("company_id={}&godown_id={}", self.company(), self.godown())
    }
}

#[tokio::test]
async fn health_reports_backend() {
    let seeded = Seeded::new().await;
    let srv = TestServer::spawn(seeded.store.clone()).await;

    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["backend"], "in_memory");
}

#[tokio::test]
async fn feriwala_purchase_is_recorded_and_listed() {
    let seeded = Seeded::new().await;
    let srv = TestServer::spawn(seeded.store.clone()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/feriwala/add"))
        .json(&json!({
            "company_id": seeded.company(),
            "godown_id": seeded.godown(),
            "vendor_id": seeded.vendor.to_string(),
            "account_id": seeded.account.to_string(),
            "scraps": [{ "scrap_type_id": seeded.iron.to_string(), "weight": "5" }],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["vendor"], "Ramesh");
    assert_eq!(dec_field(&body["totalAmount"]), dec("50"));
    let id = body["feriwala_id"].as_str().unwrap().to_string();

    let snapshot = seeded.store.snapshot().await;
    assert_eq!(snapshot.accounts[&seeded.account].balance, Money::new(dec("9950")));

    let res = client
        .get(srv.url(&format!("/api/feriwala/list?{}", seeded.scope_query())))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let records = body["records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["id"], id.as_str());
    assert_eq!(records[0]["vendor_name"], "Ramesh");
    assert_eq!(dec_field(&records[0]["total_amount"]), dec("50"));
    assert_eq!(records[0]["scraps"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn missing_rate_is_rejected_without_writing() {
    let seeded = Seeded::new().await;
    let srv = TestServer::spawn(seeded.store.clone()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/feriwala/add"))
        .json(&json!({
            "company_id": seeded.company(),
            "godown_id": seeded.godown(),
            "vendor_id": seeded.vendor.to_string(),
            "account_id": seeded.account.to_string(),
            "scraps": [
                { "scrap_type_id": seeded.iron.to_string(), "weight": "5" },
                { "scrap_type_id": seeded.unpriced.to_string(), "weight": "2" }
            ],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "rate_not_found");

    let snapshot = seeded.store.snapshot().await;
    assert!(snapshot.headers.is_empty());
    assert!(snapshot.lines.is_empty());
    assert!(snapshot.ledger.is_empty());
    assert_eq!(snapshot.accounts[&seeded.account].balance, Money::new(dec("10000")));
}

#[tokio::test]
async fn kabadiwala_partial_payment_shows_in_both_views() {
    let seeded = Seeded::new().await;
    let srv = TestServer::spawn(seeded.store.clone()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/kabadiwala/add"))
        .json(&json!({
            "company_id": seeded.company(),
            "godown_id": seeded.godown(),
            "vendor_id": seeded.vendor.to_string(),
            "account_id": seeded.account.to_string(),
            "scraps": [{ "scrap_type_id": seeded.iron.to_string(), "weight": "20" }],
            "payment_amount": "50",
            "payment_mode": "upi",
            "date": "2026-03-02",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["payment_status"], "partial");
    assert_eq!(dec_field(&body["totalAmount"]), dec("200"));
    let kabadi_id = body["kabadi_id"].as_str().unwrap().to_string();

    let res = client
        .get(srv.url(&format!("/api/kabadiwala/list?{}", seeded.scope_query())))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    let row = &body["kabadiwala"][0];
    assert_eq!(row["id"], kabadi_id.as_str());
    assert_eq!(row["kabadiwala_name"], "Ramesh");
    assert_eq!(row["items_count"], 1);
    assert_eq!(dec_field(&row["total_paid"]), dec("50"));

    let res = client
        .get(srv.url(&format!(
            "/api/kabadiwala/owner-list?{}&date=2026-03-02",
            seeded.scope_query()
        )))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["material"], "Iron");
    assert_eq!(entries[0]["payment_status"], "partial");
}

#[tokio::test]
async fn list_endpoints_require_scope() {
    let seeded = Seeded::new().await;
    let srv = TestServer::spawn(seeded.store.clone()).await;
    let client = reqwest::Client::new();

    for path in [
        "/api/feriwala/list",
        "/api/kabadiwala/list",
        "/api/maal-out/list-sales",
        "/api/labour/all",
        "/api/expenses/list",
        "/api/expenses/summary",
    ] {
        let res = client
            .get(srv.url(&format!("{path}?company_id={}", seeded.company())))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{path}");
    }
}

#[tokio::test]
async fn malformed_body_is_a_client_error() {
    let seeded = Seeded::new().await;
    let srv = TestServer::spawn(seeded.store.clone()).await;

    let res = reqwest::Client::new()
        .post(srv.url("/api/feriwala/add"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_body");
}

#[tokio::test]
async fn maal_out_sale_and_payment() {
    let seeded = Seeded::new().await;
    let srv = TestServer::spawn(seeded.store.clone()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/maal-out/add-sale"))
        .json(&json!({
            "company_id": seeded.company(),
            "godown_id": seeded.godown(),
            "firm_name": "Shakti Metals",
            "date": "2026-03-05",
            "weight": "1.5",
            "rate": "42000",
            "gst": "18",
            "vehicle_no": "MH12AB1234",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(dec_field(&body["sale"]["amount"]), dec("63000"));
    assert_eq!(body["sale"]["firm_name"], "Shakti Metals");

    let res = client
        .post(srv.url("/api/maal-out/add-payment"))
        .json(&json!({
            "company_id": seeded.company(),
            "godown_id": seeded.godown(),
            "firm_name": "Shakti Metals",
            "amount": "25000",
            "date": "2026-03-06",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(dec_field(&body["payment"]["amount"]), dec("25000"));

    let res = client
        .get(srv.url(&format!(
            "/api/maal-out/list-sales?{}&date=2026-03-05",
            seeded.scope_query()
        )))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["sales"].as_array().unwrap().len(), 1);

    let res = client
        .get(srv.url(&format!(
            "/api/maal-out/list-payments?{}",
            seeded.scope_query()
        )))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["payments"][0]["firm_name"], "Shakti Metals");

    let res = client
        .post(srv.url("/api/maal-out/add-sale"))
        .json(&json!({
            "company_id": seeded.company(),
            "godown_id": seeded.godown(),
            "firm_name": "Shakti Metals",
            "weight": "0",
            "rate": "42000",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn attendance_is_marked_once_per_day() {
    let seeded = Seeded::new().await;
    let srv = TestServer::spawn(seeded.store.clone()).await;
    let client = reqwest::Client::new();

    let res = client
        .get(srv.url(&format!("/api/labour/all?{}", seeded.scope_query())))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["labour"][0]["name"], "Suresh");

    let day = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
    for status in ["Present", "Absent"] {
        let res = client
            .post(srv.url("/api/labour/attendance/mark"))
            .json(&json!({
                "company_id": seeded.company(),
                "godown_id": seeded.godown(),
                "labour_id": seeded.labourer.to_string(),
                "date": day,
                "status": status,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["attendance"]["status"], status);
    }

    let res = client
        .get(srv.url(&format!(
            "/api/attendance/by-date?{}&date={day}",
            seeded.scope_query()
        )))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    let attendance = body["attendance"].as_array().unwrap();
    assert_eq!(attendance.len(), 1);
    assert_eq!(attendance[0]["labour_id"], seeded.labourer.to_string());
    assert_eq!(attendance[0]["status"], "Absent");

    let res = client
        .post(srv.url("/api/labour/attendance/mark"))
        .json(&json!({
            "company_id": seeded.company(),
            "godown_id": seeded.godown(),
            "labour_id": LabourId::new().to_string(),
            "date": day,
            "status": "Present",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn expense_book_lists_and_summarises_a_day() {
    let seeded = Seeded::new().await;
    let srv = TestServer::spawn(seeded.store.clone()).await;
    let client = reqwest::Client::new();

    for (category, amount, mode, account) in [
        ("Diesel", "800", "cash", Some(seeded.account.to_string())),
        ("Tea", "60", "upi", None),
        ("Repairs", "1500", "bank", None),
    ] {
        let res = client
            .post(srv.url("/api/expenses/add"))
            .json(&json!({
                "company_id": seeded.company(),
                "godown_id": seeded.godown(),
                "date": "2026-03-10",
                "category": category,
                "paid_to": "Local vendor",
                "payment_mode": mode,
                "amount": amount,
                "account_id": account,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED, "{category}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["expense"]["category"], category);
    }

    let snapshot = seeded.store.snapshot().await;
    assert_eq!(snapshot.accounts[&seeded.account].balance, Money::new(dec("9200")));

    let res = client
        .get(srv.url(&format!(
            "/api/expenses/list?{}&date=2026-03-10",
            seeded.scope_query()
        )))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    let expenses = body["expenses"].as_array().unwrap();
    assert_eq!(expenses.len(), 3);
    let diesel = expenses.iter().find(|e| e["category"] == "Diesel").unwrap();
    assert_eq!(diesel["account_name"], "Cash");
    assert_eq!(diesel["paid_to"], "Local vendor");
    assert_eq!(dec_field(&diesel["amount"]), dec("800"));

    let res = client
        .get(srv.url(&format!(
            "/api/expenses/summary?{}&start_date=2026-03-10&end_date=2026-03-10",
            seeded.scope_query()
        )))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let summary = &body["summary"];
    assert_eq!(dec_field(&summary["total_amount"]), dec("2360"));
    assert_eq!(dec_field(&summary["total_cash"]), dec("800"));
    assert_eq!(dec_field(&summary["total_upi"]), dec("60"));
    assert_eq!(dec_field(&summary["total_bank"]), dec("1500"));

    let res = client
        .get(srv.url(&format!(
            "/api/expenses/summary?{}&start_date=2026-03-11&end_date=2026-03-10",
            seeded.scope_query()
        )))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn expense_without_category_is_rejected() {
    let seeded = Seeded::new().await;
    let srv = TestServer::spawn(seeded.store.clone()).await;

    let res = reqwest::Client::new()
        .post(srv.url("/api/expenses/add"))
        .json(&json!({
            "company_id": seeded.company(),
            "godown_id": seeded.godown(),
            "amount": "100",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(seeded.store.snapshot().await.expenses.is_empty());
}
