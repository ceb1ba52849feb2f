//! Ledger core: load, validate, recompute, append.
//!
//! The ledger owns the ordered event sequence. The first event is always
//! the single ANCHOR; every other balance is the cumulative sum of deltas
//! from it, rebuilt on load so a corrupted balance column in storage
//! never leaks into memory. Every append writes the full sequence back.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::{debug, error, info, warn};

use crate::storage::{
    LedgerStore, LoadResult, RawRow, COL_DATE, COL_KIND, COL_LABEL, COL_NET_DELTA, COL_ODDS,
    COL_OUTCOME, COL_RUNNING_BALANCE, COL_STAKE,
};
use crate::types::{Event, EventKind, LedgerError, Outcome, DEFAULT_LABEL};

/// Columns a stored row must carry to be usable.
const REQUIRED_COLUMNS: &[&str] = &[COL_DATE, COL_KIND, COL_RUNNING_BALANCE];

// ---------------------------------------------------------------------------
// Load notice & receipts
// ---------------------------------------------------------------------------

/// How the ledger came to be at initialisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadNotice {
    /// Stored rows were accepted.
    Restored { events: usize },
    /// Nothing was stored; a fresh anchor was created.
    Fresh,
    /// Stored rows were unusable and have been discarded.
    Reinitialized { reason: String },
}

impl std::fmt::Display for LoadNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadNotice::Restored { events } => write!(f, "restored {events} events"),
            LoadNotice::Fresh => write!(f, "new ledger"),
            LoadNotice::Reinitialized { reason } => {
                write!(f, "stored ledger discarded: {reason}")
            }
        }
    }
}

/// Result of a successful append.
#[derive(Debug, Clone, PartialEq)]
pub struct AppendReceipt {
    pub event: Event,
    pub balance: Decimal,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

pub struct Ledger {
    events: Vec<Event>,
    starting_balance: Decimal,
    store: Box<dyn LedgerStore>,
    notice: LoadNotice,
    /// True while memory holds events the store has not confirmed.
    stale: bool,
}

impl Ledger {
    /// Load from `store`, falling back to a fresh anchor-only ledger when
    /// the store is empty or its content is unusable.
    pub fn initialize(store: Box<dyn LedgerStore>, starting_balance: Decimal) -> Self {
        let fresh = || vec![Event::anchor(today(), starting_balance)];

        let (events, notice) = match store.load() {
            LoadResult::Valid(rows) if !rows.is_empty() => match restore(&rows) {
                Ok(events) => {
                    let count = events.len();
                    (events, LoadNotice::Restored { events: count })
                }
                Err(reason) => {
                    warn!(reason = %reason, rows = rows.len(), "Stored ledger rejected, reinitialising");
                    (fresh(), LoadNotice::Reinitialized { reason })
                }
            },
            LoadResult::Malformed(reason) => {
                warn!(reason = %reason, "Stored ledger is malformed, reinitialising");
                (fresh(), LoadNotice::Reinitialized { reason })
            }
            LoadResult::Empty | LoadResult::Valid(_) => {
                info!(%starting_balance, "No stored ledger, starting fresh");
                (fresh(), LoadNotice::Fresh)
            }
        };

        let ledger = Self {
            events,
            starting_balance,
            store,
            notice,
            stale: false,
        };

        let anchor_balance = ledger.events[0].running_balance;
        if anchor_balance != starting_balance {
            warn!(
                stored = %anchor_balance,
                configured = %starting_balance,
                "Stored anchor balance differs from configured starting balance, keeping stored"
            );
        }

        info!(
            events = ledger.events.len(),
            balance = %ledger.current_balance(),
            notice = %ledger.notice,
            "Ledger initialised"
        );
        ledger
    }

    /// Record a settled wager.
    pub fn append_wager(
        &mut self,
        date: NaiveDate,
        stake: Decimal,
        odds: Decimal,
        outcome: Outcome,
        label: Option<String>,
    ) -> Result<AppendReceipt, LedgerError> {
        if !outcome.is_settled() {
            return Err(reject(format!(
                "Outcome must be WON, LOST or VOID, got {outcome}"
            )));
        }
        if stake <= Decimal::ZERO {
            return Err(reject(format!("Stake must be positive, got {stake}")));
        }
        if odds < Decimal::ONE {
            return Err(reject(format!("Odds must be at least 1.0, got {odds}")));
        }

        let label = label
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_LABEL.to_string());

        let event = Event::wager(date, stake, odds, outcome, label);
        if event.derive_net_delta().is_none() {
            return Err(reject(format!("Payout of {stake} at odds {odds} is out of range")));
        }
        self.commit(event)
    }

    /// Record a deposit or withdrawal dated today.
    pub fn append_fund_movement(
        &mut self,
        amount: Decimal,
        operation: EventKind,
    ) -> Result<AppendReceipt, LedgerError> {
        if !operation.is_fund_movement() {
            return Err(reject(format!(
                "Operation must be DEPOSIT or WITHDRAWAL, got {operation}"
            )));
        }
        if amount <= Decimal::ZERO {
            return Err(reject(format!("Amount must be positive, got {amount}")));
        }

        self.commit(Event::fund_movement(today(), operation, amount))
    }

    /// Place `event` after the current last event, then write everything back.
    /// The in-memory append stands even if the write fails.
    fn commit(&mut self, mut event: Event) -> Result<AppendReceipt, LedgerError> {
        let balance = self
            .current_balance()
            .checked_add(event.net_delta)
            .ok_or_else(|| reject(format!("Balance out of range after adding {}", event.net_delta)))?;
        event.running_balance = balance;
        self.events.push(event.clone());

        info!(
            kind = %event.kind,
            date = %event.date,
            delta = %event.net_delta,
            balance = %balance,
            "Event appended"
        );

        self.persist()?;
        Ok(AppendReceipt { event, balance })
    }

    fn persist(&mut self) -> Result<(), LedgerError> {
        let rows: Vec<RawRow> = self.events.iter().map(RawRow::from).collect();
        match self.store.save(&rows) {
            Ok(()) => {
                self.stale = false;
                Ok(())
            }
            Err(e) => {
                self.stale = true;
                error!(
                    error = %e,
                    events = rows.len(),
                    "Failed to save ledger, persisted copy is behind memory"
                );
                Err(LedgerError::Persistence {
                    balance: self.current_balance(),
                    reason: e.to_string(),
                })
            }
        }
    }

    // -- Read-only accessors ------------------------------------------------

    /// Balance after the last event.
    pub fn current_balance(&self) -> Decimal {
        self.events
            .last()
            .map(|e| e.running_balance)
            .unwrap_or(self.starting_balance)
    }

    /// The configured starting balance (may differ from a restored anchor).
    pub fn starting_balance(&self) -> Decimal {
        self.starting_balance
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// The last `n` events, oldest first.
    pub fn recent(&self, n: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(n);
        &self.events[start..]
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn load_notice(&self) -> &LoadNotice {
        &self.notice
    }

    /// Whether the last save failed, leaving storage behind memory.
    pub fn persistence_stale(&self) -> bool {
        self.stale
    }
}

// ---------------------------------------------------------------------------
// Recompute & decode
// ---------------------------------------------------------------------------

/// Rebuild every `net_delta` and `running_balance` after the anchor.
/// The anchor's own balance is the starting point and is kept as-is.
///
/// Fails, naming the 1-based row, when a delta or balance leaves the
/// `Decimal` range. Events before that row are already rewritten.
pub fn recompute(events: &mut [Event]) -> Result<(), String> {
    let Some((anchor, rest)) = events.split_first_mut() else {
        return Ok(());
    };
    anchor.net_delta = Decimal::ZERO;
    let mut balance = anchor.running_balance;
    for (i, event) in rest.iter_mut().enumerate() {
        let n = i + 2;
        event.net_delta = event
            .derive_net_delta()
            .ok_or_else(|| format!("row {n}: payout out of range"))?;
        balance = balance
            .checked_add(event.net_delta)
            .ok_or_else(|| format!("row {n}: balance out of range"))?;
        event.running_balance = balance;
    }
    Ok(())
}

/// Decode stored rows and rebuild their balances.
fn restore(rows: &[RawRow]) -> Result<Vec<Event>, String> {
    let mut events = decode_rows(rows)?;
    recompute(&mut events)?;
    Ok(events)
}

/// Turn stored rows into events, enforcing the single leading anchor.
fn decode_rows(rows: &[RawRow]) -> Result<Vec<Event>, String> {
    let mut events = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let n = i + 1;
        if let Some(missing) = REQUIRED_COLUMNS.iter().find(|col| !row.has(col)) {
            return Err(format!("row {n}: missing column {missing}"));
        }

        let kind_tag = row.get(COL_KIND).unwrap_or_default();
        let kind = EventKind::from_str(kind_tag)
            .map_err(|_| format!("row {n}: unknown kind {kind_tag:?}"))?;
        match (i, kind) {
            (0, EventKind::Anchor) => {}
            (0, other) => return Err(format!("first row is {other}, expected ANCHOR")),
            (_, EventKind::Anchor) => return Err(format!("row {n}: duplicate ANCHOR")),
            _ => {}
        }

        let date_cell = row.get(COL_DATE).unwrap_or_default();
        let date = parse_day(date_cell).ok_or_else(|| format!("row {n}: invalid date {date_cell:?}"))?;

        let outcome = row
            .get(COL_OUTCOME)
            .and_then(|s| Outcome::from_str(s).ok())
            .unwrap_or(Outcome::NotApplicable);

        let label = row
            .get(COL_LABEL)
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LABEL)
            .to_string();

        events.push(Event {
            date,
            kind,
            stake: coerce_decimal(row.get(COL_STAKE)),
            odds: coerce_decimal(row.get(COL_ODDS)),
            outcome,
            net_delta: coerce_decimal(row.get(COL_NET_DELTA)),
            running_balance: coerce_decimal(row.get(COL_RUNNING_BALANCE)),
            label,
        });
    }

    if events.is_empty() {
        return Err("no rows".into());
    }
    Ok(events)
}

/// Parse a `YYYY-MM-DD` day, ignoring any trailing time component.
pub fn parse_day(cell: &str) -> Option<NaiveDate> {
    let day = cell.trim().split([' ', 'T']).next().unwrap_or_default();
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Numeric cell → decimal; anything unparsable counts as zero.
fn coerce_decimal(cell: Option<&str>) -> Decimal {
    let Some(s) = cell.map(str::trim).filter(|s| !s.is_empty()) else {
        return Decimal::ZERO;
    };
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .or_else(|_| Decimal::from_str(&s.replace(',', ".")))
        .unwrap_or(Decimal::ZERO)
}

fn reject(reason: String) -> LedgerError {
    debug!(reason = %reason, "Append rejected");
    LedgerError::Validation(reason)
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
