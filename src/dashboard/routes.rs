//! Dashboard API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<DashboardState>`;
//! the write lock around the ledger serialises appends.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::engine::ledger::parse_day;
use crate::engine::{BalancePoint, Ledger, Projection, WagerStats};
use crate::types::{Event, EventKind, LedgerError, Outcome};

/// How many events `/api/events` returns without a `limit`.
const DEFAULT_EVENT_LIMIT: usize = 10;

/// Most daily points `/api/balance-history` returns (about ten years).
const MAX_HISTORY_DAYS: usize = 3660;

/// Accepted wager dates, relative to today.
const MAX_WAGER_AGE_DAYS: i64 = 3660;
const MAX_WAGER_LEAD_DAYS: i64 = 366;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    pub ledger: RwLock<Ledger>,
    pub currency: String,
}

impl DashboardState {
    pub fn new(ledger: Ledger, currency: impl Into<String>) -> Self {
        Self {
            ledger: RwLock::new(ledger),
            currency: currency.into(),
        }
    }
}

pub type AppState = Arc<DashboardState>;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub balance: Decimal,
    pub starting_balance: Decimal,
    pub currency: String,
    pub event_count: usize,
    pub persistence_stale: bool,
    pub load_notice: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<WagerStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceHistoryResponse {
    pub has_data: bool,
    /// True when older days were left out.
    pub truncated: bool,
    pub points: Vec<BalancePoint>,
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct WagerRequest {
    /// `YYYY-MM-DD`
    pub date: String,
    pub stake: Decimal,
    pub odds: Decimal,
    /// `WON` | `LOST` | `VOID`
    pub outcome: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FundsRequest {
    pub amount: Decimal,
    /// `DEPOSIT` | `WITHDRAWAL`
    pub operation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppendResponse {
    pub event: Event,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// In-memory balance when the append happened but was not saved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<Decimal>,
}

type AppendResult = Result<(StatusCode, Json<AppendResponse>), (StatusCode, Json<ErrorResponse>)>;

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let ledger = state.ledger.read().await;
    Json(StatusResponse {
        balance: ledger.current_balance(),
        starting_balance: ledger.starting_balance(),
        currency: state.currency.clone(),
        event_count: ledger.len(),
        persistence_stale: ledger.persistence_stale(),
        load_notice: ledger.load_notice().to_string(),
    })
}

/// GET /api/stats
pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let ledger = state.ledger.read().await;
    let stats = WagerStats::from_events(ledger.events());
    Json(StatsResponse {
        available: stats.is_some(),
        stats,
    })
}

/// GET /api/balance-history
pub async fn get_balance_history(State(state): State<AppState>) -> Json<BalanceHistoryResponse> {
    let projection = {
        let ledger = state.ledger.read().await;
        Projection::from_events(ledger.events())
    };
    let response = match &projection {
        Projection::Empty => BalanceHistoryResponse {
            has_data: false,
            truncated: false,
            points: Vec::new(),
        },
        Projection::Series(series) => BalanceHistoryResponse {
            has_data: true,
            truncated: series.len() > MAX_HISTORY_DAYS,
            points: series.last_days(MAX_HISTORY_DAYS).collect(),
        },
    };
    Json(response)
}

/// GET /api/events?limit=N
pub async fn get_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Json<Vec<Event>> {
    let ledger = state.ledger.read().await;
    let limit = query.limit.unwrap_or(DEFAULT_EVENT_LIMIT);
    Json(ledger.recent(limit).to_vec())
}

/// POST /api/wagers
pub async fn post_wager(State(state): State<AppState>, Json(req): Json<WagerRequest>) -> AppendResult {
    let date = parse_day(&req.date).ok_or_else(|| {
        append_error(LedgerError::Validation(format!(
            "Invalid date {:?}, expected YYYY-MM-DD",
            req.date
        )))
    })?;
    check_wager_date(date).map_err(append_error)?;
    let outcome: Outcome = req.outcome.parse().map_err(append_error)?;

    let mut ledger = state.ledger.write().await;
    let receipt = ledger
        .append_wager(date, req.stake, req.odds, outcome, req.label)
        .map_err(append_error)?;

    Ok((
        StatusCode::CREATED,
        Json(AppendResponse {
            event: receipt.event,
            balance: receipt.balance,
        }),
    ))
}

/// POST /api/funds
pub async fn post_funds(State(state): State<AppState>, Json(req): Json<FundsRequest>) -> AppendResult {
    let operation: EventKind = req.operation.parse().map_err(append_error)?;

    let mut ledger = state.ledger.write().await;
    let receipt = ledger
        .append_fund_movement(req.amount, operation)
        .map_err(append_error)?;

    Ok((
        StatusCode::CREATED,
        Json(AppendResponse {
            event: receipt.event,
            balance: receipt.balance,
        }),
    ))
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Reject wager dates far from today.
fn check_wager_date(date: NaiveDate) -> Result<(), LedgerError> {
    let today = Utc::now().date_naive();
    let offset = (date - today).num_days();
    if offset < -MAX_WAGER_AGE_DAYS || offset > MAX_WAGER_LEAD_DAYS {
        return Err(LedgerError::Validation(format!(
            "Wager date {date} is out of range (at most {MAX_WAGER_AGE_DAYS} days back, {MAX_WAGER_LEAD_DAYS} ahead)"
        )));
    }
    Ok(())
}

fn append_error(err: LedgerError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, balance) = match &err {
        LedgerError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, None),
        LedgerError::Persistence { balance, .. } => (StatusCode::SERVICE_UNAVAILABLE, Some(*balance)),
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            balance,
        }),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
