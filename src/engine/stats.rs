//! Wager statistics.
//!
//! Read-only aggregation over WAGER events. Anchor, deposit and
//! withdrawal events never count toward these figures.

use rust_decimal::prelude::*;
use serde::Serialize;
use std::fmt;

use crate::types::{Event, EventKind, Outcome};

/// Aggregate wager performance for a ledger snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WagerStats {
    pub wager_count: usize,
    pub wins: usize,
    pub losses: usize,
    pub voids: usize,
    pub total_staked: Decimal,
    /// Sum of wager deltas only.
    pub net_wager_profit: Decimal,
    /// Profit over stake, in percent.
    pub return_on_investment: f64,
    /// Won wagers over all wagers, in percent.
    pub win_rate: f64,
    /// Balance after the last event of the snapshot (all kinds).
    pub current_balance: Decimal,
}

impl WagerStats {
    /// Compute statistics, or `None` when the snapshot holds no wagers.
    pub fn from_events(events: &[Event]) -> Option<Self> {
        let wagers: Vec<&Event> = events
            .iter()
            .filter(|e| e.kind == EventKind::Wager)
            .collect();
        if wagers.is_empty() {
            return None;
        }

        let count_of = |outcome: Outcome| wagers.iter().filter(|e| e.outcome == outcome).count();
        let wager_count = wagers.len();
        let wins = count_of(Outcome::Won);
        // Deposits can refill the balance between wagers, so wager-only
        // sums may exceed any single balance. They saturate instead.
        let total_staked = wagers
            .iter()
            .fold(Decimal::ZERO, |acc, e| acc.saturating_add(e.stake));
        let net_wager_profit = wagers
            .iter()
            .fold(Decimal::ZERO, |acc, e| acc.saturating_add(e.net_delta));

        let return_on_investment = if total_staked > Decimal::ZERO {
            net_wager_profit
                .checked_div(total_staked)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                .and_then(|pct| pct.to_f64())
                .unwrap_or(0.0)
        } else {
            0.0
        };
        let win_rate = wins as f64 / wager_count as f64 * 100.0;

        Some(Self {
            wager_count,
            wins,
            losses: count_of(Outcome::Lost),
            voids: count_of(Outcome::Void),
            total_staked,
            net_wager_profit,
            return_on_investment,
            win_rate,
            current_balance: events.last().map(|e| e.running_balance).unwrap_or_default(),
        })
    }
}

impl fmt::Display for WagerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "balance={:.2} | profit={:.2} | wagers={} (W{}/L{}/V{}) | staked={:.2} | roi={:.2}% | win_rate={:.2}%",
            self.current_balance,
            self.net_wager_profit,
            self.wager_count,
            self.wins,
            self.losses,
            self.voids,
            self.total_staked,
            self.return_on_investment,
            self.win_rate,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ledger::recompute;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn events(list: Vec<Event>) -> Vec<Event> {
        let mut all = vec![Event::anchor(date(), dec!(100))];
        all.extend(list);
        recompute(&mut all).unwrap();
        all
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()
    }

    fn wager(stake: Decimal, odds: Decimal, outcome: Outcome) -> Event {
        Event::wager(date(), stake, odds, outcome, "x")
    }

    #[test]
    fn test_no_wagers_no_stats() {
        let snapshot = events(vec![
            Event::fund_movement(date(), EventKind::Deposit, dec!(50)),
            Event::fund_movement(date(), EventKind::Withdrawal, dec!(10)),
        ]);
        assert!(WagerStats::from_events(&snapshot).is_none());
        assert!(WagerStats::from_events(&[]).is_none());
    }

    #[test]
    fn test_mixed_wagers() {
        let snapshot = events(vec![
            wager(dec!(10), dec!(2.5), Outcome::Won),
            wager(dec!(10), dec!(2), Outcome::Lost),
            Event::fund_movement(date(), EventKind::Deposit, dec!(500)),
            wager(dec!(10), dec!(3), Outcome::Void),
        ]);
        let stats = WagerStats::from_events(&snapshot).unwrap();

        assert_eq!(stats.wager_count, 3);
        assert_eq!((stats.wins, stats.losses, stats.voids), (1, 1, 1));
        assert_eq!(stats.total_staked, dec!(30));
        assert_eq!(stats.net_wager_profit, dec!(5));
        assert!((stats.return_on_investment - 16.666_666).abs() < 1e-4);
        assert!((stats.win_rate - 33.333_333).abs() < 1e-4);
        assert_eq!(stats.current_balance, dec!(605));
    }

    #[test]
    fn test_fund_movements_excluded_from_profit() {
        let snapshot = events(vec![
            Event::fund_movement(date(), EventKind::Deposit, dec!(1000)),
            wager(dec!(20), dec!(2), Outcome::Won),
        ]);
        let stats = WagerStats::from_events(&snapshot).unwrap();
        assert_eq!(stats.net_wager_profit, dec!(20));
        assert!((stats.return_on_investment - 100.0).abs() < 1e-10);
        assert!((stats.win_rate - 100.0).abs() < 1e-10);
    }

    #[test]
    fn test_zero_stake_gives_zero_roi() {
        // Only reachable through coerced storage cells.
        let mut snapshot = events(vec![wager(dec!(1), dec!(2), Outcome::Lost)]);
        snapshot[1].stake = Decimal::ZERO;
        recompute(&mut snapshot).unwrap();

        let stats = WagerStats::from_events(&snapshot).unwrap();
        assert_eq!(stats.total_staked, Decimal::ZERO);
        assert_eq!(stats.return_on_investment, 0.0);
        assert_eq!(stats.win_rate, 0.0);
    }

    #[test]
    fn test_huge_refilled_losses_saturate() {
        use std::str::FromStr;
        let huge = Decimal::from_str("50000000000000000000000000000").unwrap();
        let mut snapshot = vec![Event::anchor(date(), Decimal::ZERO)];
        for _ in 0..2 {
            snapshot.push(Event::fund_movement(date(), EventKind::Deposit, huge));
            snapshot.push(wager(huge, dec!(2), Outcome::Lost));
        }
        recompute(&mut snapshot).unwrap();

        let stats = WagerStats::from_events(&snapshot).unwrap();
        assert_eq!(stats.total_staked, Decimal::MAX);
        assert_eq!(stats.net_wager_profit, Decimal::MIN);
        assert_eq!(stats.current_balance, Decimal::ZERO);
    }

    #[test]
    fn test_display() {
        let snapshot = events(vec![wager(dec!(10), dec!(2.5), Outcome::Won)]);
        let s = WagerStats::from_events(&snapshot).unwrap().to_string();
        assert!(s.contains("balance=115.00"));
        assert!(s.contains("roi=150.00%"));
        assert!(s.contains("W1/L0/V0"));
    }

    #[test]
    fn test_serializes() {
        let snapshot = events(vec![wager(dec!(10), dec!(2), Outcome::Lost)]);
        let json = serde_json::to_value(WagerStats::from_events(&snapshot).unwrap()).unwrap();
        assert_eq!(json["wager_count"], 1);
        assert_eq!(json["net_wager_profit"].as_f64(), Some(-10.0));
    }
}
