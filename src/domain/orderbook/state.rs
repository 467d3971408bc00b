//! Per-symbol book state with sequence-checked snapshot and delta application.

use crate::domain::orderbook::wire::{DepthKind, DepthMessage, WireLevel};
use crate::domain::orderbook::{OrderBookSnapshot, PriceLevel};
use crate::shared::Symbol;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Result of offering one message to a [`BookState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaOutcome {
    /// The message changed the book.
    Applied,
    /// `seq <= version`; nothing changed.
    Duplicate,
    /// One or more sequence numbers were skipped; the book needs a snapshot.
    Gap { expected: u64, got: u64 },
    /// A delta arrived before any snapshot.
    Uninitialized,
}

/// Mutable book for one market. Owned by the cache partition's writer.
#[derive(Debug, Clone, Default)]
pub struct BookState {
    initialized: bool,
    version: u64,
    updated_at: Option<DateTime<Utc>>,
    bids: BTreeMap<Decimal, Decimal>,
    asks: BTreeMap<Decimal, Decimal>,
}

impl BookState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a message of either kind.
    pub fn apply(&mut self, msg: &DepthMessage) -> DeltaOutcome {
        match msg.kind {
            DepthKind::Snapshot => {
                if self.apply_snapshot(msg) {
                    DeltaOutcome::Applied
                } else {
                    DeltaOutcome::Duplicate
                }
            }
            DepthKind::Update => self.apply_delta(msg),
        }
    }

    /// Replace the book if the snapshot is newer than what is held, or if
    /// nothing is held yet. Returns whether it was taken.
    pub fn apply_snapshot(&mut self, msg: &DepthMessage) -> bool {
        if self.initialized && msg.sequence_number <= self.version {
            return false;
        }
        self.bids.clear();
        self.asks.clear();
        merge_levels(&mut self.bids, &msg.bids);
        merge_levels(&mut self.asks, &msg.asks);
        self.version = msg.sequence_number;
        self.updated_at = Some(msg.updated_at);
        self.initialized = true;
        true
    }

    /// Apply a delta only if it is exactly the next sequence number.
    pub fn apply_delta(&mut self, msg: &DepthMessage) -> DeltaOutcome {
        if !self.initialized {
            return DeltaOutcome::Uninitialized;
        }
        if msg.sequence_number <= self.version {
            return DeltaOutcome::Duplicate;
        }
        let expected = self.version + 1;
        if msg.sequence_number != expected {
            return DeltaOutcome::Gap {
                expected,
                got: msg.sequence_number,
            };
        }
        merge_levels(&mut self.bids, &msg.bids);
        merge_levels(&mut self.asks, &msg.asks);
        self.version = msg.sequence_number;
        self.updated_at = Some(msg.updated_at);
        DeltaOutcome::Applied
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.keys().next_back().copied()
    }

    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.keys().next().copied()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Immutable copy for readers. `None` until the first snapshot.
    pub fn to_snapshot(&self, symbol: &Symbol) -> Option<OrderBookSnapshot> {
        if !self.initialized {
            return None;
        }
        Some(OrderBookSnapshot {
            symbol: symbol.clone(),
            bids: self
                .bids
                .iter()
                .rev()
                .map(|(&price, &size)| PriceLevel { price, size })
                .collect(),
            asks: self
                .asks
                .iter()
                .map(|(&price, &size)| PriceLevel { price, size })
                .collect(),
            timestamp: self.updated_at.unwrap_or_else(Utc::now),
            version: self.version,
        })
    }
}

fn merge_levels(side: &mut BTreeMap<Decimal, Decimal>, levels: &[WireLevel]) {
    for level in levels {
        if level.qty.is_zero() {
            side.remove(&level.px);
        } else {
            side.insert(level.px, level.qty);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::NativeId;

    fn msg(kind: DepthKind, seq: u64, bids: &[(i64, i64)], asks: &[(i64, i64)]) -> DepthMessage {
        let levels = |v: &[(i64, i64)]| {
            v.iter()
                .map(|&(p, q)| WireLevel::new(Decimal::from(p), Decimal::from(q)))
                .collect()
        };
        DepthMessage {
            symbol: NativeId::from("BTCRUSDPERP"),
            kind,
            bids: levels(bids),
            asks: levels(asks),
            sequence_number: seq,
            updated_at: DateTime::<Utc>::from_timestamp_millis(seq as i64 * 1_000).unwrap(),
        }
    }

    fn snapshot(seq: u64, bids: &[(i64, i64)], asks: &[(i64, i64)]) -> DepthMessage {
        msg(DepthKind::Snapshot, seq, bids, asks)
    }

    fn update(seq: u64, bids: &[(i64, i64)], asks: &[(i64, i64)]) -> DepthMessage {
        msg(DepthKind::Update, seq, bids, asks)
    }

    #[test]
    fn test_snapshot_replaces_state() {
        let mut book = BookState::new();
        assert!(book.apply_snapshot(&snapshot(1, &[(50, 10)], &[(51, 5)])));
        assert!(book.apply_snapshot(&snapshot(2, &[(49, 20)], &[(52, 8)])));
        assert_eq!(book.best_bid(), Some(Decimal::from(49)));
        assert_eq!(book.best_ask(), Some(Decimal::from(52)));
        assert_eq!(book.version(), 2);
    }

    #[test]
    fn test_older_snapshot_is_ignored() {
        let mut book = BookState::new();
        book.apply_snapshot(&snapshot(5, &[(50, 10)], &[]));
        assert!(!book.apply_snapshot(&snapshot(5, &[(40, 1)], &[])));
        assert!(!book.apply_snapshot(&snapshot(3, &[(40, 1)], &[])));
        assert_eq!(book.best_bid(), Some(Decimal::from(50)));
    }

    #[test]
    fn test_delta_sequence_rules() {
        let mut book = BookState::new();
        assert_eq!(book.apply_delta(&update(1, &[], &[])), DeltaOutcome::Uninitialized);

        book.apply_snapshot(&snapshot(10, &[(50, 10)], &[(51, 5)]));
        assert_eq!(book.apply_delta(&update(10, &[(50, 0)], &[])), DeltaOutcome::Duplicate);
        assert_eq!(book.apply_delta(&update(11, &[(49, 3)], &[])), DeltaOutcome::Applied);
        assert_eq!(
            book.apply_delta(&update(13, &[], &[])),
            DeltaOutcome::Gap { expected: 12, got: 13 }
        );
        assert_eq!(book.version(), 11);
    }

    #[test]
    fn test_zero_size_removes_level() {
        let mut book = BookState::new();
        book.apply_snapshot(&snapshot(1, &[(50, 10)], &[(51, 5)]));
        book.apply_delta(&update(2, &[(50, 0)], &[]));
        assert_eq!(book.best_bid(), None);
    }

    #[test]
    fn test_replayed_messages_converge() {
        let stream = [
            snapshot(1, &[(50, 10)], &[(52, 5)]),
            update(2, &[(51, 1)], &[]),
            update(3, &[], &[(52, 0), (53, 2)]),
            update(4, &[(50, 4)], &[]),
        ];

        let mut clean = BookState::new();
        for m in &stream {
            clean.apply(m);
        }

        // Same messages with stale duplicates interleaved.
        let mut noisy = BookState::new();
        for (i, m) in stream.iter().enumerate() {
            noisy.apply(m);
            for earlier in &stream[..=i] {
                assert_ne!(noisy.apply(earlier), DeltaOutcome::Applied);
            }
        }

        let symbol = Symbol::from("BTC/USD");
        assert_eq!(clean.to_snapshot(&symbol), noisy.to_snapshot(&symbol));
    }

    #[test]
    fn test_to_snapshot_orders_sides() {
        let mut book = BookState::new();
        assert!(book.to_snapshot(&Symbol::from("BTC/USD")).is_none());

        book.apply_snapshot(&snapshot(1, &[(48, 1), (50, 1), (49, 1)], &[(53, 1), (51, 1)]));
        let snap = book.to_snapshot(&Symbol::from("BTC/USD")).unwrap();
        let bids: Vec<_> = snap.bids.iter().map(|l| l.price).collect();
        let asks: Vec<_> = snap.asks.iter().map(|l| l.price).collect();
        assert_eq!(bids, vec![Decimal::from(50), Decimal::from(49), Decimal::from(48)]);
        assert_eq!(asks, vec![Decimal::from(51), Decimal::from(53)]);
        assert_eq!(snap.spread(), Some(Decimal::from(1)));
    }

    #[test]
    fn test_clear() {
        let mut book = BookState::new();
        book.apply_snapshot(&snapshot(1, &[(50, 10)], &[(51, 5)]));
        book.clear();
        assert!(!book.is_initialized());
        assert_eq!(book.version(), 0);
    }
}
