//! Common test utilities for dashboard-service integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use dashboard_service::models::{
    Invoice, InvoiceInput, ListInvoicesFilter, NewInvoice, INVOICES_PER_PAGE,
};
use dashboard_service::services::{
    AuthErrorKind, AuthProvider, Credentials, InvoiceStore, PageCache, SignIn, SignInError,
};
use dashboard_service::startup::build_router;
use dashboard_service::AppState;
use service_core::error::AppError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once};
use tower::ServiceExt;
use uuid::Uuid;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,dashboard_service=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub const TEST_CUSTOMER_ID: &str = "3958dc9e-712f-4377-85e9-fec4b6a6442a";

/// Statement issued against the in-memory store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Insert(NewInvoice),
    Update(Uuid, InvoiceInput),
    Delete(Uuid),
    Get(Uuid),
    List(ListInvoicesFilter),
}

/// In-memory invoice table that records every statement.
#[derive(Default)]
pub struct InMemoryStore {
    invoices: Mutex<Vec<Invoice>>,
    calls: Mutex<Vec<StoreCall>>,
    failing: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every subsequent statement fail like a lost connection.
    pub fn fail_statements(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn invoices(&self) -> Vec<Invoice> {
        self.invoices.lock().unwrap().clone()
    }

    pub fn seed(&self, amount: i64, status: &str) -> Invoice {
        let invoice = Invoice {
            id: Uuid::new_v4(),
            customer_id: Uuid::parse_str(TEST_CUSTOMER_ID).unwrap(),
            amount,
            status: status.to_string(),
            date: chrono::NaiveDate::from_ymd_opt(2023, 12, 6).unwrap(),
        };
        self.invoices.lock().unwrap().push(invoice.clone());
        invoice
    }

    fn record(&self, call: StoreCall) -> Result<(), AppError> {
        self.calls.lock().unwrap().push(call);
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(anyhow::anyhow!("connection refused")));
        }
        Ok(())
    }
}

#[async_trait]
impl InvoiceStore for InMemoryStore {
    async fn insert_invoice(&self, invoice: &NewInvoice) -> Result<Invoice, AppError> {
        self.record(StoreCall::Insert(invoice.clone()))?;
        let created = Invoice {
            id: Uuid::new_v4(),
            customer_id: Uuid::parse_str(&invoice.customer_id).unwrap_or_default(),
            amount: invoice.amount,
            status: invoice.status.as_str().to_string(),
            date: invoice.date,
        };
        self.invoices.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update_invoice(
        &self,
        id: Uuid,
        input: &InvoiceInput,
    ) -> Result<Option<Invoice>, AppError> {
        self.record(StoreCall::Update(id, input.clone()))?;
        let mut invoices = self.invoices.lock().unwrap();
        Ok(invoices.iter_mut().find(|i| i.id == id).map(|invoice| {
            invoice.customer_id = Uuid::parse_str(&input.customer_id).unwrap_or_default();
            invoice.amount = input.amount;
            invoice.status = input.status.as_str().to_string();
            invoice.clone()
        }))
    }

    async fn delete_invoice(&self, id: Uuid) -> Result<u64, AppError> {
        self.record(StoreCall::Delete(id))?;
        let mut invoices = self.invoices.lock().unwrap();
        let before = invoices.len();
        invoices.retain(|i| i.id != id);
        Ok((before - invoices.len()) as u64)
    }

    async fn get_invoice(&self, id: Uuid) -> Result<Option<Invoice>, AppError> {
        self.record(StoreCall::Get(id))?;
        Ok(self.invoices().into_iter().find(|i| i.id == id))
    }

    async fn list_invoices(&self, filter: &ListInvoicesFilter) -> Result<Vec<Invoice>, AppError> {
        self.record(StoreCall::List(filter.clone()))?;
        let query = filter.query.to_lowercase();
        Ok(self
            .invoices()
            .into_iter()
            .filter(|i| query.is_empty() || i.status.contains(&query))
            .skip(usize::try_from(filter.offset()).unwrap_or(usize::MAX))
            .take(INVOICES_PER_PAGE as usize)
            .collect())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(anyhow::anyhow!("connection refused")));
        }
        Ok(())
    }
}

/// Page cache that only records which routes were revalidated.
#[derive(Default)]
pub struct RecordingCache {
    routes: Mutex<Vec<String>>,
}

impl RecordingCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn revalidated(&self) -> Vec<String> {
        self.routes.lock().unwrap().clone()
    }
}

impl PageCache for RecordingCache {
    fn revalidate(&self, route: &str) {
        self.routes.lock().unwrap().push(route.to_string());
    }
}

/// How the scripted provider answers the next sign-in.
#[derive(Debug, Clone, Copy)]
pub enum Script {
    Accept,
    Reject(AuthErrorKind),
    Crash,
}

/// Authentication provider with a fixed answer that records each call.
pub struct ScriptedAuthProvider {
    script: Mutex<Script>,
    calls: Mutex<Vec<(String, Credentials)>>,
}

impl ScriptedAuthProvider {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn set_script(&self, script: Script) {
        *self.script.lock().unwrap() = script;
    }

    pub fn calls(&self) -> Vec<(String, Credentials)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthProvider for ScriptedAuthProvider {
    async fn sign_in(
        &self,
        strategy: &str,
        credentials: &Credentials,
    ) -> Result<SignIn, SignInError> {
        self.calls
            .lock()
            .unwrap()
            .push((strategy.to_string(), credentials.clone()));

        let script = *self.script.lock().unwrap();
        match script {
            Script::Accept => Ok(SignIn {
                access_token: "access-token".to_string(),
                refresh_token: Some("refresh-token".to_string()),
                user_id: Some("410544b2-4001-4271-9855-fec4b6a6442a".to_string()),
            }),
            Script::Reject(kind) => Err(SignInError::Auth(kind)),
            Script::Crash => Err(SignInError::Other(anyhow::anyhow!("provider exploded"))),
        }
    }
}

/// Router wired to in-memory collaborators.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub auth_provider: Arc<ScriptedAuthProvider>,
    pub state: AppState,
}

impl TestApp {
    pub fn spawn() -> Self {
        init_tracing();

        let store = InMemoryStore::new();
        let auth_provider = ScriptedAuthProvider::new(Script::Accept);
        let state = AppState::new(store.clone(), auth_provider.clone(), "credentials");

        Self {
            router: build_router(state.clone()),
            store,
            auth_provider,
            state,
        }
    }

    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.request(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.request(builder.body(Body::empty()).unwrap()).await
    }

    /// Sign in through `/login` and return the session cookie.
    pub async fn login(&self) -> String {
        let response = self
            .post_form("/login", "email=user%40nextmail.com&password=123456", None)
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("session cookie")
            .to_str()
            .unwrap();
        set_cookie
            .split(';')
            .next()
            .expect("cookie pair")
            .to_string()
    }
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .unwrap()
}
