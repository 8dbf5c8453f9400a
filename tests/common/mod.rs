//! In-process stand-in for the invoice backend.
//!
//! Speaks the same routes and JSON shapes as the real service, issues real
//! HS256 JWTs, and records how often each endpoint was hit so tests can assert
//! on network traffic.
#![allow(dead_code)]

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, State},
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use invoice_desk::{
    client::ApiClient,
    config::AppConfig,
    dto::{
        auth::{LoginRequest, RefreshRequest, SignupRequest, VerifyRequest},
        invoices::{CreateInvoiceRequest, InvoiceItemRequest},
    },
    models::{AuthTokens, Invoice, InvoiceItem, InvoiceStatus, Transaction, TransactionType, User},
    notify::{self, Toasts},
    session::AuthSession,
    store::TokenStore,
};

const SECRET: &[u8] = b"mock-backend-secret";
const ACCESS_TTL_SECS: i64 = 300;
const REFRESH_TTL_SECS: i64 = 86_400;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    token_type: String,
    jti: String,
    exp: usize,
}

#[derive(Debug, Clone)]
struct Account {
    user: User,
    password: String,
}

#[derive(Debug, Default)]
struct BackendState {
    accounts: Vec<Account>,
    invoices: BTreeMap<i64, Invoice>,
    transactions: Vec<Transaction>,
    next_invoice_id: i64,
    next_item_id: i64,
    next_transaction_id: i64,
    revoked: HashSet<String>,
    calls: HashMap<&'static str, usize>,
    delays: HashMap<&'static str, Duration>,
    failures: HashMap<&'static str, StatusCode>,
}

impl BackendState {
    /// Counts the call and returns the configured delay and forced failure.
    fn enter(&mut self, endpoint: &'static str) -> (Option<Duration>, Option<StatusCode>) {
        *self.calls.entry(endpoint).or_default() += 1;
        (
            self.delays.get(endpoint).copied(),
            self.failures.get(endpoint).copied(),
        )
    }

    fn account(&self, username: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.user.username == username)
    }

    fn build_items(&mut self, items: &[InvoiceItemRequest]) -> Vec<InvoiceItem> {
        items
            .iter()
            .map(|item| {
                self.next_item_id += 1;
                InvoiceItem {
                    id: self.next_item_id,
                    description: item.description.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    total_price: Decimal::from(item.quantity) * item.unit_price,
                }
            })
            .collect()
    }

    fn record_transaction(&mut self, invoice: &Invoice, kind: TransactionType) {
        self.next_transaction_id += 1;
        self.transactions.push(Transaction {
            id: self.next_transaction_id,
            transaction_type: kind,
            amount: invoice.total_amount,
            transaction_date: Utc::now(),
            status: "completed".into(),
            invoice: Some(invoice.id),
            created_by: Some(1),
        });
    }

    fn create_invoice(&mut self, body: &CreateInvoiceRequest, status: InvoiceStatus) -> Invoice {
        self.next_invoice_id += 1;
        let items = self.build_items(&body.items);
        let now = Utc::now();
        let invoice = Invoice {
            id: self.next_invoice_id,
            reference_number: body.reference_number.clone(),
            customer_name: body.customer_name.clone(),
            customer_email: body.customer_email.clone(),
            total_amount: items.iter().map(|i| i.total_price).sum(),
            status,
            created_at: now,
            updated_at: now,
            items,
            transactions: Vec::new(),
        };
        self.invoices.insert(invoice.id, invoice.clone());
        self.record_transaction(&invoice, TransactionType::Sale);
        invoice
    }
}

type Shared = Arc<Mutex<BackendState>>;

fn lock(state: &Shared) -> std::sync::MutexGuard<'_, BackendState> {
    state.lock().unwrap()
}

fn sign(username: &str, token_type: &str, ttl_secs: i64) -> String {
    let claims = Claims {
        sub: username.to_string(),
        token_type: token_type.to_string(),
        jti: Uuid::new_v4().to_string(),
        exp: (Utc::now().timestamp() + ttl_secs) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET),
    )
    .unwrap()
}

fn check(token: &str, token_type: &str) -> Option<Claims> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(SECRET),
        &Validation::default(),
    )
    .ok()?;
    (decoded.claims.token_type == token_type).then_some(decoded.claims)
}

fn error(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn forced(status: StatusCode) -> Response {
    error(status, json!({ "detail": "Server exploded" }))
}

fn not_found() -> Response {
    error(StatusCode::NOT_FOUND, json!({ "detail": "Not found." }))
}

async fn respond(delay: Option<Duration>, response: Response) -> Response {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    response
}

/// Username of a caller holding a valid access token.
struct AuthUser(String);

impl FromRequestParts<Shared> for AuthUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &Shared) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim);

        let claims = token.and_then(|t| {
            let claims = check(t, "access")?;
            (!lock(state).revoked.contains(t)).then_some(claims)
        });
        match claims {
            Some(claims) => Ok(AuthUser(claims.sub)),
            None => {
                lock(state).enter("unauthorized");
                Err(error(
                    StatusCode::UNAUTHORIZED,
                    json!({
                        "detail": "Given token not valid for any token type",
                        "code": "token_not_valid",
                    }),
                ))
            }
        }
    }
}

async fn signup(State(state): State<Shared>, Json(body): Json<SignupRequest>) -> Response {
    let (delay, fail) = lock(&state).enter("signup");
    let response = match fail {
        Some(status) => forced(status),
        None => {
            let mut s = lock(&state);
            if s.account(&body.username).is_some() {
                error(
                    StatusCode::BAD_REQUEST,
                    json!({ "username": ["A user with that username already exists."] }),
                )
            } else if body.password != body.password2 {
                error(
                    StatusCode::BAD_REQUEST,
                    json!({ "password": ["Password fields didn't match."] }),
                )
            } else {
                let user = User {
                    id: s.accounts.len() as i64 + 1,
                    username: body.username.clone(),
                    email: body.email.clone(),
                    first_name: body.first_name.clone(),
                    last_name: body.last_name.clone(),
                };
                s.accounts.push(Account {
                    user: user.clone(),
                    password: body.password.clone(),
                });
                (
                    StatusCode::CREATED,
                    Json(json!({ "user": user, "message": "User created successfully" })),
                )
                    .into_response()
            }
        }
    };
    respond(delay, response).await
}

async fn login(State(state): State<Shared>, Json(body): Json<LoginRequest>) -> Response {
    let (delay, fail) = lock(&state).enter("login");
    let response = match fail {
        Some(status) => forced(status),
        None => {
            let known = lock(&state)
                .account(&body.username)
                .is_some_and(|a| a.password == body.password);
            if known {
                Json(json!({
                    "access": sign(&body.username, "access", ACCESS_TTL_SECS),
                    "refresh": sign(&body.username, "refresh", REFRESH_TTL_SECS),
                }))
                .into_response()
            } else {
                error(
                    StatusCode::UNAUTHORIZED,
                    json!({ "detail": "No active account found with the given credentials" }),
                )
            }
        }
    };
    respond(delay, response).await
}

async fn refresh(State(state): State<Shared>, Json(body): Json<RefreshRequest>) -> Response {
    let (delay, fail) = lock(&state).enter("refresh");
    let response = match fail {
        Some(status) => forced(status),
        None => {
            let revoked = lock(&state).revoked.contains(&body.refresh);
            match check(&body.refresh, "refresh").filter(|_| !revoked) {
                Some(claims) => {
                    Json(json!({ "access": sign(&claims.sub, "access", ACCESS_TTL_SECS) }))
                        .into_response()
                }
                None => error(
                    StatusCode::UNAUTHORIZED,
                    json!({ "detail": "Token is invalid or expired", "code": "token_not_valid" }),
                ),
            }
        }
    };
    respond(delay, response).await
}

async fn verify(State(state): State<Shared>, Json(body): Json<VerifyRequest>) -> Response {
    let (delay, fail) = lock(&state).enter("verify");
    let response = match fail {
        Some(status) => forced(status),
        None if check(&body.token, "access").is_some()
            && !lock(&state).revoked.contains(&body.token) =>
        {
            Json(json!({})).into_response()
        }
        None => error(
            StatusCode::UNAUTHORIZED,
            json!({ "detail": "Token is invalid or expired", "code": "token_not_valid" }),
        ),
    };
    respond(delay, response).await
}

async fn logout(State(state): State<Shared>, Json(body): Json<RefreshRequest>) -> Response {
    let (delay, fail) = lock(&state).enter("logout");
    let response = match fail {
        Some(status) => forced(status),
        None => {
            lock(&state).revoked.insert(body.refresh);
            StatusCode::RESET_CONTENT.into_response()
        }
    };
    respond(delay, response).await
}

async fn list_invoices(State(state): State<Shared>, _user: AuthUser) -> Response {
    let (delay, fail) = lock(&state).enter("list_invoices");
    let response = match fail {
        Some(status) => forced(status),
        None => {
            let mut list: Vec<Invoice> = lock(&state).invoices.values().cloned().collect();
            list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            Json(list).into_response()
        }
    };
    respond(delay, response).await
}

async fn get_invoice(
    State(state): State<Shared>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Response {
    let (delay, fail) = lock(&state).enter("get_invoice");
    let response = match fail {
        Some(status) => forced(status),
        None => match lock(&state).invoices.get(&id).cloned() {
            Some(invoice) => Json(invoice).into_response(),
            None => not_found(),
        },
    };
    respond(delay, response).await
}

async fn create_invoice(
    State(state): State<Shared>,
    _user: AuthUser,
    Json(body): Json<CreateInvoiceRequest>,
) -> Response {
    let (delay, fail) = lock(&state).enter("create_invoice");
    let response = match fail {
        Some(status) => forced(status),
        None => {
            let mut s = lock(&state);
            let taken = s
                .invoices
                .values()
                .any(|inv| inv.reference_number == body.reference_number);
            if taken {
                error(
                    StatusCode::BAD_REQUEST,
                    json!({ "reference_number": ["invoice with this reference number already exists."] }),
                )
            } else {
                let invoice = s.create_invoice(&body, InvoiceStatus::Pending);
                (StatusCode::CREATED, Json(invoice)).into_response()
            }
        }
    };
    respond(delay, response).await
}

async fn update_invoice(
    State(state): State<Shared>,
    _user: AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<CreateInvoiceRequest>,
) -> Response {
    let (delay, fail) = lock(&state).enter("update_invoice");
    let response = match fail {
        Some(status) => forced(status),
        None => {
            let mut s = lock(&state);
            let items = if body.items.is_empty() {
                None
            } else {
                Some(s.build_items(&body.items))
            };
            match s.invoices.get_mut(&id) {
                Some(invoice) => {
                    invoice.reference_number = body.reference_number.clone();
                    invoice.customer_name = body.customer_name.clone();
                    invoice.customer_email = body.customer_email.clone();
                    if let Some(items) = items {
                        invoice.total_amount = items.iter().map(|i| i.total_price).sum();
                        invoice.items = items;
                    }
                    invoice.updated_at = Utc::now();
                    Json(invoice.clone()).into_response()
                }
                None => not_found(),
            }
        }
    };
    respond(delay, response).await
}

async fn delete_invoice(
    State(state): State<Shared>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Response {
    let (delay, fail) = lock(&state).enter("delete_invoice");
    let response = match fail {
        Some(status) => (status, "Cannot delete invoice right now").into_response(),
        None => match lock(&state).invoices.remove(&id) {
            Some(_) => StatusCode::NO_CONTENT.into_response(),
            None => not_found(),
        },
    };
    respond(delay, response).await
}

fn transition(
    state: &Shared,
    id: i64,
    from: InvoiceStatus,
    to: InvoiceStatus,
    message: &str,
) -> Response {
    let mut s = lock(state);
    let Some(invoice) = s.invoices.get_mut(&id) else {
        return error(StatusCode::NOT_FOUND, json!({ "error": "Invoice not found" }));
    };
    if invoice.status != from {
        return error(StatusCode::BAD_REQUEST, json!({ "error": message }));
    }
    invoice.status = to;
    invoice.updated_at = Utc::now();
    let invoice = invoice.clone();
    if to == InvoiceStatus::Paid {
        s.record_transaction(&invoice, TransactionType::Payment);
    }
    Json(invoice).into_response()
}

async fn mark_paid(State(state): State<Shared>, _user: AuthUser, Path(id): Path<i64>) -> Response {
    let (delay, fail) = lock(&state).enter("mark_paid");
    let response = match fail {
        Some(status) => forced(status),
        None => transition(
            &state,
            id,
            InvoiceStatus::Pending,
            InvoiceStatus::Paid,
            "Only pending invoices can be marked as paid",
        ),
    };
    respond(delay, response).await
}

async fn mark_pending(
    State(state): State<Shared>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Response {
    let (delay, fail) = lock(&state).enter("mark_pending");
    let response = match fail {
        Some(status) => forced(status),
        None => transition(
            &state,
            id,
            InvoiceStatus::Paid,
            InvoiceStatus::Pending,
            "Only paid invoices can be marked as pending",
        ),
    };
    respond(delay, response).await
}

async fn list_transactions(State(state): State<Shared>, _user: AuthUser) -> Response {
    let (delay, fail) = lock(&state).enter("list_transactions");
    let response = match fail {
        Some(status) => forced(status),
        None => Json(lock(&state).transactions.clone()).into_response(),
    };
    respond(delay, response).await
}

async fn get_transaction(
    State(state): State<Shared>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Response {
    let (delay, fail) = lock(&state).enter("get_transaction");
    let response = match fail {
        Some(status) => forced(status),
        None => match lock(&state).transactions.iter().find(|t| t.id == id).cloned() {
            Some(tx) => Json(tx).into_response(),
            None => not_found(),
        },
    };
    respond(delay, response).await
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/auth/signup/", post(signup))
        .route("/api/auth/login/", post(login))
        .route("/api/auth/refresh/", post(refresh))
        .route("/api/auth/verify/", post(verify))
        .route("/api/auth/logout/", post(logout))
        .route("/api/invoices/", get(list_invoices).post(create_invoice))
        .route(
            "/api/invoices/{id}/",
            get(get_invoice).put(update_invoice).delete(delete_invoice),
        )
        .route("/api/invoices/{id}/mark-paid/", patch(mark_paid))
        .route("/api/invoices/{id}/mark-pending/", patch(mark_pending))
        .route("/api/transactions/", get(list_transactions))
        .route("/api/transactions/{id}/", get(get_transaction))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct MockBackend {
    pub base_url: String,
    state: Shared,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(BackendState::default()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn config(&self) -> AppConfig {
        AppConfig::for_url(&self.base_url)
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.config()).unwrap()
    }

    /// Fresh session over `store`, plus the receiving end of its toasts.
    pub fn session(&self, store: TokenStore) -> (AuthSession, Toasts) {
        let (notifier, toasts) = notify::channel();
        (AuthSession::new(self.client(), store, notifier), toasts)
    }

    pub fn add_user(&self, username: &str, password: &str) -> User {
        let mut s = lock(&self.state);
        let user = User {
            id: s.accounts.len() as i64 + 1,
            username: username.to_string(),
            email: format!("{username}@mail.test"),
            first_name: String::new(),
            last_name: String::new(),
        };
        s.accounts.push(Account {
            user: user.clone(),
            password: password.to_string(),
        });
        user
    }

    pub fn issue_tokens(&self, username: &str) -> AuthTokens {
        AuthTokens {
            access: sign(username, "access", ACCESS_TTL_SECS),
            refresh: sign(username, "refresh", REFRESH_TTL_SECS),
        }
    }

    /// Access token that expired an hour ago.
    pub fn expired_access(&self, username: &str) -> String {
        sign(username, "access", -3_600)
    }

    /// Blacklists an access or refresh token.
    pub fn revoke(&self, token: &str) {
        lock(&self.state).revoked.insert(token.to_string());
    }

    pub fn is_revoked(&self, token: &str) -> bool {
        lock(&self.state).revoked.contains(token)
    }

    /// Stores an invoice directly, bypassing the HTTP layer.
    pub fn seed_invoice(
        &self,
        reference: &str,
        customer: &str,
        items: &[(&str, u32, &str)],
        status: InvoiceStatus,
    ) -> Invoice {
        let body = CreateInvoiceRequest {
            reference_number: reference.to_string(),
            customer_name: customer.to_string(),
            customer_email: format!("{}@customer.test", customer.to_lowercase()),
            items: items
                .iter()
                .map(|(description, quantity, price)| InvoiceItemRequest {
                    description: description.to_string(),
                    quantity: *quantity,
                    unit_price: price.parse().unwrap(),
                })
                .collect(),
        };
        lock(&self.state).create_invoice(&body, status)
    }

    pub fn invoice(&self, id: i64) -> Option<Invoice> {
        lock(&self.state).invoices.get(&id).cloned()
    }

    pub fn invoice_count(&self) -> usize {
        lock(&self.state).invoices.len()
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        lock(&self.state).calls.get(endpoint).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        lock(&self.state).calls.values().sum()
    }

    pub fn reset_calls(&self) {
        lock(&self.state).calls.clear();
    }

    /// Holds the response of `endpoint` back for `delay` after the state change
    /// has been applied.
    pub fn delay(&self, endpoint: &'static str, delay: Duration) {
        lock(&self.state).delays.insert(endpoint, delay);
    }

    pub fn fail(&self, endpoint: &'static str, status: StatusCode) {
        lock(&self.state).failures.insert(endpoint, status);
    }
}
