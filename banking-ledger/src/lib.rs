//! Banking Ledger
//!
//! In-memory account ledger with deferred cashback, point-in-time balance
//! queries, spender ranking and account merging. Time is never read from
//! the clock: every operation carries the caller's logical timestamp.
//!
//! # Architecture
//!
//! - **Single Owner**: One `Ledger` value owns all state; operations take `&mut self`
//! - **Lazy Scheduling**: Matured cashbacks are applied at the start of every operation
//! - **Append-only History**: Per-account balance snapshots with floor lookup
//! - **Bounded Ranking**: Top-N selection through a fixed-size heap
//!
//! # Invariants
//!
//! - Balances are never negative
//! - Every issued payment ID resolves to exactly one owning account
//! - Histories are never shortened or reordered
//! - An absorbed account's history ends with exactly one terminal entry
//! - Payment IDs never repeat

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod history;
pub mod cashback;
pub mod ranking;
pub mod ledger;
pub mod query;
pub mod merge;
pub mod error;
pub mod config;
pub mod metrics;

// Re-exports
pub use error::{LedgerError, Result};
pub use types::{
    Account, AccountId, Amount, Balance, HistoryEntry, PaymentId, PaymentStatus, Timestamp,
};
pub use history::BalanceHistory;
pub use cashback::{CashbackScheduler, PendingCashback};
pub use ranking::SpenderRank;
pub use ledger::{Ledger, LedgerSnapshot};
pub use config::Config;
pub use metrics::Metrics;
