//! Shared types for the BANKROLL ledger.
//!
//! The event model lives here so that the storage layer, the ledger core
//! and the read-only views can all depend on it without circular imports.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label written on events that carry no user-supplied tag.
pub const DEFAULT_LABEL: &str = "N/A";

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// The kind of a ledger event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Anchor,
    Wager,
    Deposit,
    Withdrawal,
}

impl EventKind {
    /// Storage tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Anchor => "ANCHOR",
            EventKind::Wager => "WAGER",
            EventKind::Deposit => "DEPOSIT",
            EventKind::Withdrawal => "WITHDRAWAL",
        }
    }

    /// Whether this kind moves funds in or out (deposit / withdrawal).
    pub fn is_fund_movement(&self) -> bool {
        matches!(self, EventKind::Deposit | EventKind::Withdrawal)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a kind tag (case-insensitive). The French tags written by the
/// first version of the tracker (`DEBUT`, `Pari`, `DEPOT`, `RETRAIT`) are
/// accepted too.
impl std::str::FromStr for EventKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ANCHOR" | "DEBUT" | "DÉBUT" => Ok(EventKind::Anchor),
            "WAGER" | "PARI" => Ok(EventKind::Wager),
            "DEPOSIT" | "DEPOT" | "DÉPÔT" => Ok(EventKind::Deposit),
            "WITHDRAWAL" | "RETRAIT" => Ok(EventKind::Withdrawal),
            _ => Err(LedgerError::Validation(format!("Unknown event kind: {s}"))),
        }
    }
}

/// Settlement outcome of a wager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Won,
    Lost,
    Void,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl Outcome {
    /// Storage tag for this outcome.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Won => "WON",
            Outcome::Lost => "LOST",
            Outcome::Void => "VOID",
            Outcome::NotApplicable => "N/A",
        }
    }

    /// Whether a wager may be settled with this outcome.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Outcome::NotApplicable)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse an outcome tag (case-insensitive), including the legacy
/// `Gagné` / `Perdu` / `Annulé` tags.
impl std::str::FromStr for Outcome {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "WON" | "GAGNÉ" | "GAGNE" => Ok(Outcome::Won),
            "LOST" | "PERDU" => Ok(Outcome::Lost),
            "VOID" | "ANNULÉ" | "ANNULE" => Ok(Outcome::Void),
            "N/A" | "NOT_APPLICABLE" => Ok(Outcome::NotApplicable),
            _ => Err(LedgerError::Validation(format!(
                "Outcome must be WON, LOST or VOID, got: {s}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// One ledger record.
///
/// `net_delta` and `running_balance` are derived. The ledger recomputes
/// them on every load, so a value read from storage is never trusted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub date: NaiveDate,
    pub kind: EventKind,
    /// Amount wagered; zero for non-wager kinds.
    pub stake: Decimal,
    /// Decimal odds (>= 1.0) for wagers; zero otherwise.
    pub odds: Decimal,
    pub outcome: Outcome,
    pub net_delta: Decimal,
    pub running_balance: Decimal,
    pub label: String,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EventKind::Wager => write!(
                f,
                "{} {} {:.2} @ {:.2} {} [{}] Δ{:+.2} → {:.2}",
                self.date,
                self.kind,
                self.stake,
                self.odds,
                self.outcome,
                self.label,
                self.net_delta,
                self.running_balance,
            ),
            _ => write!(
                f,
                "{} {} Δ{:+.2} → {:.2}",
                self.date, self.kind, self.net_delta, self.running_balance,
            ),
        }
    }
}

impl Event {
    /// The single sentinel event that establishes the starting balance.
    pub fn anchor(date: NaiveDate, balance: Decimal) -> Self {
        Self {
            date,
            kind: EventKind::Anchor,
            stake: Decimal::ZERO,
            odds: Decimal::ZERO,
            outcome: Outcome::NotApplicable,
            net_delta: Decimal::ZERO,
            running_balance: balance,
            label: DEFAULT_LABEL.to_string(),
        }
    }

    /// A settled wager. `running_balance` is left at zero until the
    /// ledger places the event. `net_delta` is zero when `stake * odds`
    /// is out of range; [`Event::derive_net_delta`] reports that case.
    pub fn wager(
        date: NaiveDate,
        stake: Decimal,
        odds: Decimal,
        outcome: Outcome,
        label: impl Into<String>,
    ) -> Self {
        let mut event = Self {
            date,
            kind: EventKind::Wager,
            stake,
            odds,
            outcome,
            net_delta: Decimal::ZERO,
            running_balance: Decimal::ZERO,
            label: label.into(),
        };
        event.net_delta = event.derive_net_delta().unwrap_or_default();
        event
    }

    /// A deposit or withdrawal of `amount` (positive).
    pub fn fund_movement(date: NaiveDate, kind: EventKind, amount: Decimal) -> Self {
        let net_delta = match kind {
            EventKind::Withdrawal => -amount,
            _ => amount,
        };
        Self {
            date,
            kind,
            stake: Decimal::ZERO,
            odds: Decimal::ZERO,
            outcome: Outcome::NotApplicable,
            net_delta,
            running_balance: Decimal::ZERO,
            label: DEFAULT_LABEL.to_string(),
        }
    }

    /// Balance contribution implied by kind, stake, odds and outcome.
    ///
    /// Fund movements keep no separate amount column: the amount is the
    /// magnitude of the stored delta and only its sign is re-derived.
    ///
    /// `None` when the payout of a won wager does not fit in a `Decimal`.
    pub fn derive_net_delta(&self) -> Option<Decimal> {
        let delta = match self.kind {
            EventKind::Anchor => Decimal::ZERO,
            EventKind::Wager => match self.outcome {
                Outcome::Won => self.stake.checked_mul(self.odds)?.checked_sub(self.stake)?,
                Outcome::Lost => -self.stake,
                Outcome::Void | Outcome::NotApplicable => Decimal::ZERO,
            },
            EventKind::Deposit => self.net_delta.abs(),
            EventKind::Withdrawal => -self.net_delta.abs(),
        };
        Some(delta)
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors surfaced to callers of the ledger.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// An out-of-domain input was rejected before any mutation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The event was applied in memory but the store did not confirm the write.
    #[error("Persistence failure: balance {balance:.2} is not saved ({reason})")]
    Persistence { balance: Decimal, reason: String },
}

impl LedgerError {
    pub fn is_validation(&self) -> bool {
        matches!(self, LedgerError::Validation(_))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
