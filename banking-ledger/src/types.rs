//! Core types for the ledger
//!
//! All types are designed for:
//! - Deterministic ordering (ranking and snapshots)
//! - Integer arithmetic (no fractional currency units)
//! - A tagged terminal state instead of numeric sentinels

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Logical timestamp supplied by the caller
pub type Timestamp = i64;

/// Monetary amount in integer currency units
pub type Amount = i64;

/// Account identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Create new account ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for AccountId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Payment identifier of the form `payment<N>`
///
/// `N` comes from a ledger-wide counter starting at 1, so ordering by the
/// numeric sequence is issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PaymentId(u64);

impl PaymentId {
    const PREFIX: &'static str = "payment";

    /// Create from sequence number
    pub fn from_sequence(sequence: u64) -> Self {
        Self(sequence)
    }

    /// Sequence number
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0)
    }
}

impl FromStr for PaymentId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| format!("Invalid payment id '{}'", s))?;
        // Reject signs and leading zeros so the textual form stays canonical
        if digits.is_empty() || digits.starts_with(['+', '-', '0']) {
            return Err(format!("Invalid payment id '{}'", s));
        }
        digits
            .parse::<u64>()
            .map(Self)
            .map_err(|e| format!("Invalid payment id '{}': {}", s, e))
    }
}

impl From<PaymentId> for String {
    fn from(id: PaymentId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for PaymentId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Balance recorded in a history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Balance {
    /// Balance of a live account
    Active(Amount),
    /// Terminal marker: the account was merged into another one
    Absorbed,
}

impl Balance {
    /// Amount, if the entry is not the terminal marker
    pub fn amount(&self) -> Option<Amount> {
        match self {
            Balance::Active(amount) => Some(*amount),
            Balance::Absorbed => None,
        }
    }

    /// Check for the terminal marker
    pub fn is_absorbed(&self) -> bool {
        matches!(self, Balance::Absorbed)
    }
}

/// One balance snapshot in an account's history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// When the snapshot was taken
    pub timestamp: Timestamp,
    /// Balance after the change at `timestamp`
    pub balance: Balance,
}

impl HistoryEntry {
    /// Snapshot of a live balance
    pub fn active(timestamp: Timestamp, amount: Amount) -> Self {
        Self {
            timestamp,
            balance: Balance::Active(amount),
        }
    }

    /// Terminal marker for an absorbed account
    pub fn absorbed(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            balance: Balance::Absorbed,
        }
    }
}

/// Cashback status of a payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Cashback not yet matured
    InProgress,
    /// Cashback credited
    CashbackReceived,
}

impl PaymentStatus {
    /// Wire label
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::InProgress => "IN_PROGRESS",
            PaymentStatus::CashbackReceived => "CASHBACK_RECEIVED",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live account state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Current balance (never negative)
    pub balance: Amount,
    /// Total sent through transfers and payments
    pub outgoing: Amount,
}
