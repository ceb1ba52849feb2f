//! Replaying stored ledgers from disk.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::PathBuf;

use bankroll::engine::{Ledger, LoadNotice, Projection, WagerStats};
use bankroll::storage::{CsvFileStore, JsonFileStore, LedgerStore, LoadResult};
use bankroll::types::{EventKind, Outcome};

use crate::assert_invariants;

fn temp_path(ext: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("bankroll_it_{}.{ext}", uuid::Uuid::new_v4()));
    p
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
}

const CORRUPTED: &str = "\
date;kind;stake;odds;outcome;net_delta;running_balance;label
2026-08-01;ANCHOR;0;0;N/A;0;200;N/A
2026-08-02;WAGER;20;1.5;WON;10;0;Football
2026-08-02;WAGER;15;2.2;LOST;-15;-999;Tennis
2026-08-05;DEPOSIT;0;0;N/A;100;;N/A
2026-08-06;WAGER;10;3;VOID;0;not-a-number;Golf
2026-08-07;WITHDRAWAL;0;0;N/A;-45;12;N/A
";

#[test]
fn corrupted_balances_are_rebuilt_from_deltas() {
    let path = temp_path("csv");
    std::fs::write(&path, CORRUPTED).unwrap();

    let ledger = Ledger::initialize(Box::new(CsvFileStore::new(&path)), dec!(0));

    // 200 + 10 - 15 + 100 + 0 - 45
    assert_eq!(ledger.current_balance(), dec!(250));
    assert_eq!(*ledger.load_notice(), LoadNotice::Restored { events: 6 });
    assert_invariants(&ledger);
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn restored_ledger_feeds_stats_and_chart() {
    let path = temp_path("csv");
    std::fs::write(&path, CORRUPTED).unwrap();
    let ledger = Ledger::initialize(Box::new(CsvFileStore::new(&path)), dec!(0));

    let stats = WagerStats::from_events(ledger.events()).unwrap();
    assert_eq!(stats.wager_count, 3);
    assert_eq!(stats.total_staked, dec!(45));
    assert_eq!(stats.net_wager_profit, dec!(-5));

    let points = Projection::from_events(ledger.events()).points();
    assert_eq!(points.len(), 7);
    assert_eq!(points[0].balance, dec!(200));
    assert_eq!(points[1].balance, dec!(195));
    assert_eq!(points[2].balance, dec!(195));
    assert_eq!(points[3].balance, dec!(195));
    assert_eq!(points[4].balance, dec!(295));
    assert_eq!(points[6].balance, dec!(250));
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn append_then_reopen_csv() {
    let path = temp_path("csv");
    {
        let mut ledger = Ledger::initialize(Box::new(CsvFileStore::new(&path)), dec!(100));
        ledger
            .append_wager(day(3), dec!(10), dec!(2.5), Outcome::Won, Some("Boxing".into()))
            .unwrap();
        ledger.append_fund_movement(dec!(30), EventKind::Withdrawal).unwrap();
    }

    let reopened = Ledger::initialize(Box::new(CsvFileStore::new(&path)), dec!(100));
    assert_eq!(reopened.len(), 3);
    assert_eq!(reopened.current_balance(), dec!(85));
    assert_eq!(reopened.events()[1].label, "Boxing");
    assert_invariants(&reopened);
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn append_then_reopen_json() {
    let path = temp_path("json");
    {
        let mut ledger = Ledger::initialize(Box::new(JsonFileStore::new(&path)), dec!(0));
        ledger.append_fund_movement(dec!(50), EventKind::Deposit).unwrap();
        ledger
            .append_wager(day(4), dec!(5), dec!(1.8), Outcome::Lost, None)
            .unwrap();
    }

    let reopened = Ledger::initialize(Box::new(JsonFileStore::new(&path)), dec!(0));
    assert_eq!(reopened.current_balance(), dec!(45));
    assert_invariants(&reopened);
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn malformed_file_is_replaced_on_next_append() {
    let path = temp_path("csv");
    std::fs::write(&path, "date;kind;running_balance\n2026-08-01;WAGER;10\n").unwrap();

    let mut ledger = Ledger::initialize(Box::new(CsvFileStore::new(&path)), dec!(75));
    assert!(matches!(ledger.load_notice(), LoadNotice::Reinitialized { .. }));
    assert_eq!(ledger.current_balance(), dec!(75));

    ledger.append_fund_movement(dec!(25), EventKind::Deposit).unwrap();

    let LoadResult::Valid(rows) = CsvFileStore::new(&path).load() else {
        panic!("expected rows on disk");
    };
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("kind"), Some("ANCHOR"));
    assert_eq!(rows[1].get("running_balance"), Some("100"));
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn empty_file_starts_fresh() {
    let path = temp_path("csv");
    std::fs::write(&path, "").unwrap();

    let ledger = Ledger::initialize(Box::new(CsvFileStore::new(&path)), Decimal::ZERO);
    assert_eq!(*ledger.load_notice(), LoadNotice::Fresh);
    assert_eq!(ledger.current_balance(), Decimal::ZERO);
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn original_tracker_file_is_restored_and_rewritten() {
    let path = temp_path("csv");
    std::fs::write(
        &path,
        "Date;Type;Montant_Pari;Cote;Résultat;Gain_Net;Bankroll_Finale;Details_Pari\n\
         2025-03-01;DEBUT;0.0;0.0;N/A;0.0;0.0;N/A\n\
         2025-03-01;DEPOT;0.0;0.0;N/A;100.0;100.0;N/A\n\
         2025-03-02;Pari;10.0;2.5;Gagné;15.0;115.0;Foot\n\
         2025-03-04;Pari;20.0;1.8;Perdu;-20.0;95.0;Tennis\n\
         2025-03-05;RETRAIT;0.0;0.0;N/A;-30.0;65.0;N/A\n",
    )
    .unwrap();

    let mut ledger = Ledger::initialize(Box::new(CsvFileStore::new(&path)), dec!(0));
    assert_eq!(*ledger.load_notice(), LoadNotice::Restored { events: 5 });
    assert_eq!(ledger.current_balance(), dec!(65));
    assert_eq!(ledger.events()[2].outcome, Outcome::Won);
    assert_eq!(ledger.events()[2].label, "Foot");
    assert_eq!(ledger.events()[4].kind, EventKind::Withdrawal);
    assert_invariants(&ledger);

    ledger.append_fund_movement(dec!(5), EventKind::Deposit).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("date;kind;stake;odds;outcome;net_delta;running_balance;label\n"));
    let reopened = Ledger::initialize(Box::new(CsvFileStore::new(&path)), dec!(0));
    assert_eq!(reopened.events(), ledger.events());
    assert_eq!(reopened.current_balance(), dec!(70));
    std::fs::remove_file(&path).unwrap();
}
