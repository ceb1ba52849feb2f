//! Integration tests: full sessions through the public API.

mod replay;
mod session;

use bankroll::engine::Ledger;
use bankroll::types::EventKind;

/// Assert the anchor and cumulative-sum invariants on a ledger.
pub fn assert_invariants(ledger: &Ledger) {
    let events = ledger.events();
    assert!(!events.is_empty());
    assert_eq!(events[0].kind, EventKind::Anchor);
    assert_eq!(
        events.iter().filter(|e| e.kind == EventKind::Anchor).count(),
        1
    );
    for pair in events.windows(2) {
        assert_eq!(Some(pair[1].net_delta), pair[1].derive_net_delta());
        assert_eq!(
            pair[1].running_balance,
            pair[0].running_balance + pair[1].net_delta
        );
    }
    assert_eq!(
        ledger.current_balance(),
        events.last().map(|e| e.running_balance).unwrap()
    );
}
