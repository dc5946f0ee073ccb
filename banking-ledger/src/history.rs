//! Per-account balance history
//!
//! An append-only log of `(timestamp, balance)` snapshots supporting
//! point-in-time lookup. Once the terminal `Absorbed` entry is written the
//! log is closed and further appends are dropped.

use crate::types::{Amount, Balance, HistoryEntry, Timestamp};
use serde::{Deserialize, Serialize};

/// Append-only balance log for a single account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalanceHistory {
    entries: Vec<HistoryEntry>,
}

impl BalanceHistory {
    /// Start a history with the opening balance of a new account
    pub fn open(timestamp: Timestamp) -> Self {
        Self {
            entries: vec![HistoryEntry::active(timestamp, 0)],
        }
    }

    /// Record a live balance
    ///
    /// Returns `false` if the history is already closed.
    pub fn record(&mut self, timestamp: Timestamp, amount: Amount) -> bool {
        if self.is_closed() {
            tracing::warn!(timestamp, amount, "Dropping history entry for absorbed account");
            return false;
        }
        self.entries.push(HistoryEntry::active(timestamp, amount));
        true
    }

    /// Append the terminal marker
    ///
    /// Returns `false` if the history is already closed.
    pub fn close(&mut self, timestamp: Timestamp) -> bool {
        if self.is_closed() {
            return false;
        }
        self.entries.push(HistoryEntry::absorbed(timestamp));
        true
    }

    /// Check for the terminal marker
    pub fn is_closed(&self) -> bool {
        self.entries
            .last()
            .map_or(false, |entry| entry.balance.is_absorbed())
    }

    /// Timestamp of the terminal marker, if any
    pub fn closed_at(&self) -> Option<Timestamp> {
        self.entries
            .last()
            .filter(|entry| entry.balance.is_absorbed())
            .map(|entry| entry.timestamp)
    }

    /// Timestamp of the opening entry
    pub fn opened_at(&self) -> Timestamp {
        // `open` guarantees at least one entry
        self.entries.first().map_or(Timestamp::MIN, |entry| entry.timestamp)
    }

    /// Latest entry at or before `at`
    ///
    /// Binary search for the greatest index whose timestamp is `<= at`.
    /// With equal timestamps the last one written wins.
    pub fn floor(&self, at: Timestamp) -> Option<&HistoryEntry> {
        let idx = self.entries.partition_point(|entry| entry.timestamp <= at);
        idx.checked_sub(1).map(|i| &self.entries[i])
    }

    /// Balance at `at`, or `None` if `at` precedes the history or falls
    /// on the terminal marker
    pub fn balance_at(&self, at: Timestamp) -> Option<Amount> {
        self.floor(at).and_then(|entry| match entry.balance {
            Balance::Active(amount) => Some(amount),
            Balance::Absorbed => None,
        })
    }

    /// All entries in write order
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: a history is opened with one entry
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
