//! Daily balance projection for charting.
//!
//! Events are grouped by calendar day; the last balance seen for a day
//! (in append order) is its close. Days without events carry the
//! previous close forward, so the series has exactly one point per day
//! between the first and last observed day.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::types::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalancePoint {
    pub date: NaiveDate,
    pub balance: Decimal,
}

/// Result of projecting a ledger snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// No data point at all; render a placeholder.
    Empty,
    Series(DailySeries),
}

impl Projection {
    pub fn from_events(events: &[Event]) -> Self {
        let mut closes = BTreeMap::new();
        for event in events {
            closes.insert(event.date, event.running_balance);
        }

        match (closes.keys().next().copied(), closes.keys().next_back().copied()) {
            (Some(first), Some(last)) => Projection::Series(DailySeries { closes, first, last }),
            _ => Projection::Empty,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Projection::Empty)
    }

    /// All points, collected. Empty for [`Projection::Empty`].
    pub fn points(&self) -> Vec<BalancePoint> {
        match self {
            Projection::Empty => Vec::new(),
            Projection::Series(series) => series.iter().collect(),
        }
    }
}

/// A non-empty set of daily closes. Owns its data, so it stays valid
/// after the ledger moves on.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    closes: BTreeMap<NaiveDate, Decimal>,
    first: NaiveDate,
    last: NaiveDate,
}

impl DailySeries {
    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn last_day(&self) -> NaiveDate {
        self.last
    }

    /// Number of calendar days covered (inclusive).
    pub fn len(&self) -> usize {
        ((self.last - self.first).num_days() + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// A fresh forward-filling iterator. May be called any number of times.
    pub fn iter(&self) -> DailyPoints<'_> {
        DailyPoints {
            closes: &self.closes,
            next: Some(self.first),
            last: self.last,
            carried: Decimal::ZERO,
        }
    }

    /// Forward-filling iterator over at most the last `days` days.
    pub fn last_days(&self, days: usize) -> DailyPoints<'_> {
        let span = (days.min(self.len()) as i64 - 1).max(0);
        let start = self.last - chrono::Duration::days(span);
        let carried = self
            .closes
            .range(..=start)
            .next_back()
            .map(|(_, close)| *close)
            .unwrap_or_default();
        DailyPoints {
            closes: &self.closes,
            next: (days > 0).then_some(start),
            last: self.last,
            carried,
        }
    }
}

impl<'a> IntoIterator for &'a DailySeries {
    type Item = BalancePoint;
    type IntoIter = DailyPoints<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy day-by-day walk over a [`DailySeries`].
pub struct DailyPoints<'a> {
    closes: &'a BTreeMap<NaiveDate, Decimal>,
    next: Option<NaiveDate>,
    last: NaiveDate,
    carried: Decimal,
}

impl Iterator for DailyPoints<'_> {
    type Item = BalancePoint;

    fn next(&mut self) -> Option<BalancePoint> {
        let day = self.next.filter(|d| *d <= self.last)?;
        if let Some(close) = self.closes.get(&day) {
            self.carried = *close;
        }
        self.next = day.succ_opt();
        Some(BalancePoint {
            date: day,
            balance: self.carried,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.next {
            Some(d) if d <= self.last => ((self.last - d).num_days() + 1) as usize,
            _ => 0,
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DailyPoints<'_> {}
