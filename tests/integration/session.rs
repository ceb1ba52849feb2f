//! A full session against an in-memory store, including a save outage.

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use bankroll::engine::{Ledger, Projection, WagerStats};
use bankroll::storage::{LedgerStore, LoadResult, MemoryStore};
use bankroll::types::{EventKind, LedgerError, Outcome};

use crate::assert_invariants;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 9, d).unwrap()
}

#[test]
fn session_with_outage_catches_up_on_next_save() {
    let store = MemoryStore::new();
    let mut ledger = Ledger::initialize(Box::new(store.clone()), dec!(0));
    assert!(WagerStats::from_events(ledger.events()).is_none());

    ledger.append_fund_movement(dec!(100), EventKind::Deposit).unwrap();
    ledger
        .append_wager(day(1), dec!(10), dec!(2.5), Outcome::Won, Some("Tennis".into()))
        .unwrap();
    assert_eq!(store.rows().len(), 3);
    assert_invariants(&ledger);

    store.fail_saves("network down");
    let err = ledger
        .append_wager(day(2), dec!(20), dec!(2), Outcome::Lost, None)
        .unwrap_err();
    assert!(matches!(err, LedgerError::Persistence { balance, .. } if balance == dec!(95)));
    assert!(ledger.persistence_stale());
    assert_eq!(ledger.current_balance(), dec!(95));
    assert_eq!(store.rows().len(), 3);

    store.restore_saves();
    ledger.append_fund_movement(dec!(5), EventKind::Withdrawal).unwrap();
    assert!(!ledger.persistence_stale());
    assert_eq!(store.rows().len(), 5);
    assert_invariants(&ledger);

    let reopened = Ledger::initialize(Box::new(store.clone()), dec!(0));
    assert_eq!(reopened.events(), ledger.events());
    assert_eq!(reopened.current_balance(), dec!(90));
}

#[test]
fn rejected_appends_never_reach_the_store() {
    let store = MemoryStore::new();
    let mut ledger = Ledger::initialize(Box::new(store.clone()), dec!(100));

    assert!(ledger
        .append_wager(day(1), dec!(0), dec!(2), Outcome::Won, None)
        .unwrap_err()
        .is_validation());
    assert!(ledger
        .append_wager(day(1), dec!(10), dec!(0.9), Outcome::Won, None)
        .unwrap_err()
        .is_validation());
    assert!(ledger
        .append_fund_movement(dec!(10), EventKind::Anchor)
        .unwrap_err()
        .is_validation());

    assert_eq!(store.save_count(), 0);
    assert_eq!(store.load(), LoadResult::Empty);
    assert_eq!(ledger.current_balance(), dec!(100));
}

#[test]
fn statistics_and_projection_use_snapshots() {
    // Same day as the fresh anchor, so the series is a single point.
    let today = chrono::Utc::now().date_naive();
    let store = MemoryStore::new();
    let mut ledger = Ledger::initialize(Box::new(store), dec!(50));
    ledger
        .append_wager(today, dec!(10), dec!(2), Outcome::Won, None)
        .unwrap();

    let projection = Projection::from_events(ledger.events());
    let stats = WagerStats::from_events(ledger.events()).unwrap();

    ledger
        .append_wager(today, dec!(10), dec!(2), Outcome::Lost, None)
        .unwrap();

    // Earlier snapshots are unaffected by later appends.
    assert_eq!(stats.wager_count, 1);
    assert_eq!(stats.current_balance, dec!(60));
    assert_eq!(projection.points().len(), 1);
    assert_eq!(projection.points()[0].balance, dec!(60));
    assert_eq!(Projection::from_events(ledger.events()).points()[0].balance, dec!(50));

    let stats = WagerStats::from_events(ledger.events()).unwrap();
    assert_eq!(stats.wager_count, 2);
    assert!((stats.win_rate - 50.0).abs() < 1e-10);
    assert!((stats.return_on_investment - 0.0).abs() < 1e-10);
}
