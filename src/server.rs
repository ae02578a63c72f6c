// Portal HTTP API with Axum
//
// One shared Portal behind a mutex: single user, demonstration only.
// Billing endpoints behave like the /dashboard route: without a session they
// redirect to the landing content instead of failing.

use crate::billing::{Bill, SettlementTicket};
use crate::error::PortalError;
use crate::landing::{self, LandingContent};
use crate::portal::{today, Portal};
use crate::session::{Route, SessionSnapshot};
use crate::GateOutcome;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub const LANDING_API_PATH: &str = "/api/landing";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    portal: Arc<Mutex<Portal>>,
}

impl AppState {
    pub fn new(portal: Portal) -> Self {
        Self {
            portal: Arc::new(Mutex::new(portal)),
        }
    }

    /// All portal mutation goes through this lock
    pub fn lock(&self) -> MutexGuard<'_, Portal> {
        self.portal.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::<()>::err(message))).into_response()
}

fn portal_error(err: PortalError) -> Response {
    let status = match err {
        PortalError::UnknownRoute(_) | PortalError::UnknownBill(_) => StatusCode::NOT_FOUND,
        PortalError::UnknownTicket(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error!(error = %err, "request failed");
    error_response(status, err.to_string())
}

/// Silent redirect for billing requests without a session.
/// 303, so a followed POST (pay) becomes a GET of the landing content.
fn to_landing() -> Response {
    Redirect::to(LANDING_API_PATH).into_response()
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    identifier: String,
    #[serde(default)]
    secret: String,
}

#[derive(Debug, Deserialize)]
pub struct NavigateQuery {
    path: String,
}

#[derive(Serialize)]
struct NavigateResponse {
    requested: String,
    route: Route,
    path: &'static str,
    redirected: bool,
}

#[derive(Serialize)]
struct PaymentResponse {
    accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    ticket: Option<SettlementTicket>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET / and GET /api/landing - Static landing content
async fn get_landing() -> Json<ApiResponse<LandingContent>> {
    Json(ApiResponse::ok(landing::content()))
}

/// GET /api/session - Current session state
async fn get_session(State(state): State<AppState>) -> Json<ApiResponse<SessionSnapshot>> {
    Json(ApiResponse::ok(state.lock().session.snapshot()))
}

/// POST /api/session/prompt - Show the login prompt
async fn open_prompt(State(state): State<AppState>) -> Json<ApiResponse<SessionSnapshot>> {
    let mut portal = state.lock();
    portal.open_login();
    Json(ApiResponse::ok(portal.session.snapshot()))
}

/// DELETE /api/session/prompt - Dismiss the login prompt
async fn close_prompt(State(state): State<AppState>) -> Json<ApiResponse<SessionSnapshot>> {
    let mut portal = state.lock();
    portal.dismiss_login();
    Json(ApiResponse::ok(portal.session.snapshot()))
}

/// POST /api/login - Submit the credential gate
async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Response {
    if request.identifier.is_empty() || request.secret.is_empty() {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "EB Number and Password are required",
        );
    }

    let mut portal = state.lock();
    match portal.login(&request.identifier, &request.secret) {
        Ok(outcome @ GateOutcome::Accepted { .. }) => {
            (StatusCode::OK, Json(ApiResponse::ok(outcome))).into_response()
        }
        Ok(GateOutcome::Rejected { message }) => error_response(StatusCode::UNAUTHORIZED, message),
        Err(e) => portal_error(e),
    }
}

/// GET /api/navigate?path=/dashboard - Resolve a destination
async fn navigate(State(state): State<AppState>, Query(query): Query<NavigateQuery>) -> Response {
    let mut portal = state.lock();
    let requested = Route::from_path(&query.path);

    match portal.navigate_path(&query.path) {
        Ok(route) => Json(ApiResponse::ok(NavigateResponse {
            requested: query.path.clone(),
            route,
            path: route.path(),
            redirected: requested != Some(route),
        }))
        .into_response(),
        Err(e) => portal_error(e),
    }
}

/// Show the billing destination; `Ok(false)` means the caller must redirect
fn enter_billing(portal: &mut Portal) -> Result<bool, Response> {
    match portal.navigate(Route::Billing) {
        Ok(Route::Billing) => Ok(true),
        Ok(Route::Landing) => Ok(false),
        Err(e) => Err(portal_error(e)),
    }
}

/// GET /api/bills - All bills, most recent first
async fn list_bills(State(state): State<AppState>) -> Response {
    let mut portal = state.lock();
    match enter_billing(&mut portal) {
        Ok(true) => {}
        Ok(false) => return to_landing(),
        Err(response) => return response,
    }

    let bills: Vec<Bill> = portal
        .billing()
        .map(|billing| billing.bills().to_vec())
        .unwrap_or_default();
    Json(ApiResponse::ok(bills)).into_response()
}

/// GET /api/bills/current - The pending bill, or null
async fn current_bill(State(state): State<AppState>) -> Response {
    let mut portal = state.lock();
    match enter_billing(&mut portal) {
        Ok(true) => {}
        Ok(false) => return to_landing(),
        Err(response) => return response,
    }

    let pending = portal
        .billing()
        .and_then(|billing| billing.current_pending_bill().cloned());
    Json(ApiResponse::ok(pending)).into_response()
}

/// GET /api/bills/:id - One bill
async fn get_bill(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let mut portal = state.lock();
    match enter_billing(&mut portal) {
        Ok(true) => {}
        Ok(false) => return to_landing(),
        Err(response) => return response,
    }

    let decoded_id = urlencoding::decode(&id)
        .unwrap_or_else(|_| id.clone().into())
        .into_owned();

    match portal.billing().and_then(|billing| billing.bill(&decoded_id).cloned()) {
        Some(bill) => Json(ApiResponse::ok(bill)).into_response(),
        None => portal_error(PortalError::UnknownBill(decoded_id)),
    }
}

/// POST /api/bills/pay - Start settling the pending bill
async fn pay(State(state): State<AppState>) -> Response {
    let ticket = {
        let mut portal = state.lock();
        match enter_billing(&mut portal) {
            Ok(true) => {}
            Ok(false) => return to_landing(),
            Err(response) => return response,
        }
        match portal.pay_current_bill(today(), Instant::now()) {
            Ok(ticket) => ticket,
            Err(e) => return portal_error(e),
        }
    };

    match ticket {
        Some(ticket) => {
            spawn_settlement(state.clone(), ticket.clone());
            (
                StatusCode::ACCEPTED,
                Json(ApiResponse::ok(PaymentResponse {
                    accepted: true,
                    ticket: Some(ticket),
                })),
            )
                .into_response()
        }
        None => Json(ApiResponse::ok(PaymentResponse {
            accepted: false,
            ticket: None,
        }))
        .into_response(),
    }
}

/// Sleep for the settlement delay, then fire the continuation under the lock
pub fn spawn_settlement(state: AppState, ticket: SettlementTicket) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(ticket.delay).await;
        let result = state.lock().settle(ticket.id);
        match result {
            Ok(bill) => info!(bill = %bill.id, "settlement continuation finished"),
            Err(e) => error!(error = %e, "settlement continuation failed"),
        }
    })
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/landing", get(get_landing))
        .route("/session", get(get_session))
        .route("/session/prompt", post(open_prompt).delete(close_prompt))
        .route("/login", post(login))
        .route("/navigate", get(navigate))
        .route("/bills", get(list_bills))
        .route("/bills/current", get(current_bill))
        .route("/bills/pay", post(pay))
        .route("/bills/:id", get(get_bill));

    Router::new()
        .route("/", get(get_landing))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
