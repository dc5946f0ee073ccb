//! Deferred cashback scheduler
//!
//! Payments register a cashback that becomes payable once the caller's
//! timestamp reaches the payment's maturity. Nothing runs in the
//! background: the ledger calls [`CashbackScheduler::take_matured`] at the
//! start of every operation and applies what comes back.
//!
//! Pending entries are keyed by `(maturity, payment)` so a flush only
//! walks the matured prefix and yields credits in maturity order.

use crate::types::{AccountId, Amount, PaymentId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Cashback waiting for its maturity timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCashback {
    /// Payment that earned the cashback
    pub payment_id: PaymentId,
    /// Account that will receive the credit
    pub account_id: AccountId,
    /// Timestamp of the payment
    pub created_at: Timestamp,
    /// Credit amount
    pub cashback: Amount,
    /// Timestamp at which the credit applies
    pub matures_at: Timestamp,
}

/// Cashback scheduler
#[derive(Debug, Clone, Default)]
pub struct CashbackScheduler {
    /// Pending credits ordered by maturity, then issue order
    queue: BTreeMap<(Timestamp, PaymentId), PendingCashback>,

    /// Maturity of each pending payment, for membership and removal
    index: HashMap<PaymentId, Timestamp>,
}

impl CashbackScheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending cashback
    pub fn schedule(&mut self, pending: PendingCashback) {
        self.index.insert(pending.payment_id, pending.matures_at);
        self.queue
            .insert((pending.matures_at, pending.payment_id), pending);
    }

    /// Remove and return every cashback with `matures_at <= now`, in
    /// maturity order
    ///
    /// A second call at the same or an earlier timestamp returns nothing.
    pub fn take_matured(&mut self, now: Timestamp) -> Vec<PendingCashback> {
        // Everything strictly before (now + 1, first id) has matured
        let matured = match now.checked_add(1) {
            Some(bound) => {
                let rest = self
                    .queue
                    .split_off(&(bound, PaymentId::from_sequence(0)));
                std::mem::replace(&mut self.queue, rest)
            }
            None => std::mem::take(&mut self.queue),
        };

        let due: Vec<PendingCashback> = matured.into_values().collect();
        for pending in &due {
            self.index.remove(&pending.payment_id);
        }
        due
    }

    /// Check whether a payment's cashback is still outstanding
    pub fn is_pending(&self, payment_id: &PaymentId) -> bool {
        self.index.contains_key(payment_id)
    }

    /// Move every pending cashback owned by `from` to `to`
    ///
    /// Returns the number of reassigned entries.
    pub fn reassign(&mut self, from: &AccountId, to: &AccountId) -> usize {
        let mut moved = 0;
        for pending in self.queue.values_mut() {
            if &pending.account_id == from {
                pending.account_id = to.clone();
                moved += 1;
            }
        }
        moved
    }

    /// Number of outstanding cashbacks
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Check for outstanding cashbacks
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Outstanding cashbacks in maturity order
    pub fn pending(&self) -> impl Iterator<Item = &PendingCashback> {
        self.queue.values()
    }
}
