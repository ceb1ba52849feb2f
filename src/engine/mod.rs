//! Ledger engine: the authoritative event sequence plus the read-only
//! views computed from it.

pub mod ledger;
pub mod stats;
pub mod timeline;

pub use ledger::{AppendReceipt, Ledger, LoadNotice};
pub use stats::WagerStats;
pub use timeline::{BalancePoint, DailySeries, Projection};
