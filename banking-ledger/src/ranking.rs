//! Top spenders ranking
//!
//! Selects the `n` accounts with the largest outgoing totals using a
//! bounded heap, O(A log n) instead of sorting every account.

use crate::types::{AccountId, Amount};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;

/// One row of the ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpenderRank {
    /// Account
    pub account_id: AccountId,
    /// Outgoing total
    pub outgoing: Amount,
}

impl SpenderRank {
    /// Create a ranking row
    pub fn new(account_id: AccountId, outgoing: Amount) -> Self {
        Self {
            account_id,
            outgoing,
        }
    }
}

impl fmt::Display for SpenderRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.account_id, self.outgoing)
    }
}

/// Ranking order: higher outgoing first, then ascending account ID
pub fn rank_order(a: &SpenderRank, b: &SpenderRank) -> Ordering {
    b.outgoing
        .cmp(&a.outgoing)
        .then_with(|| a.account_id.cmp(&b.account_id))
}

/// Heap entry ordered so the top of a max-heap is the weakest candidate
#[derive(Debug, PartialEq, Eq)]
struct Candidate(SpenderRank);

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        rank_order(&self.0, &other.0)
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Select the best `n` rows, ordered by [`rank_order`]
pub fn top_n<'a, I>(rows: I, n: usize) -> Vec<SpenderRank>
where
    I: IntoIterator<Item = (&'a AccountId, Amount)>,
{
    if n == 0 {
        return Vec::new();
    }

    let mut heap: BinaryHeap<Candidate> = BinaryHeap::with_capacity(n + 1);
    for (account_id, outgoing) in rows {
        if heap.len() == n {
            let replace = heap.peek().map_or(false, |weakest| {
                rank_order(&weakest.0, &SpenderRank::new(account_id.clone(), outgoing))
                    == Ordering::Greater
            });
            if !replace {
                continue;
            }
            heap.pop();
        }
        heap.push(Candidate(SpenderRank::new(account_id.clone(), outgoing)));
    }

    // Ascending `Candidate` order is best-first
    heap.into_sorted_vec()
        .into_iter()
        .map(|candidate| candidate.0)
        .collect()
}
