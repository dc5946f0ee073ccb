//! Error types for the ledger
//!
//! Every operation failure is an ordinary, expected outcome. Validation
//! always runs before any mutation, so an `Err` never leaves partial state.

use crate::types::{AccountId, Amount, PaymentId, Timestamp};
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Ledger errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Amount was zero or negative
    #[error("Amount must be positive, got {0}")]
    InvalidAmount(Amount),

    /// Account was never created or has been absorbed by a merge
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Account ID is already taken
    #[error("Account already exists: {0}")]
    AccountExists(AccountId),

    /// Source and target of a two-account operation are identical
    #[error("Source and target account are the same: {0}")]
    SameAccount(AccountId),

    /// Debit exceeds the current balance
    #[error("Insufficient funds in {account_id}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// Account being debited
        account_id: AccountId,
        /// Balance at the time of the request
        balance: Amount,
        /// Requested debit
        requested: Amount,
    },

    /// Credit would overflow the account balance
    #[error("Balance overflow in {account_id}: balance {balance}, credit {credit}")]
    BalanceOverflow {
        /// Account being credited
        account_id: AccountId,
        /// Balance at the time of the request
        balance: Amount,
        /// Requested credit
        credit: Amount,
    },

    /// Payment ID was never issued
    #[error("Payment not found: {0}")]
    PaymentNotFound(PaymentId),

    /// Payment belongs to another account (possibly after a merge)
    #[error("Payment {payment_id} is owned by {owner}, not {requested_by}")]
    PaymentOwnershipMismatch {
        /// Payment being queried
        payment_id: PaymentId,
        /// Current owner of the payment
        owner: AccountId,
        /// Account named in the request
        requested_by: AccountId,
    },

    /// Balance query for a point after the request timestamp
    #[error("Cannot query balance at {at} from timestamp {ts}")]
    FutureQuery {
        /// Request timestamp
        ts: Timestamp,
        /// Queried point in time
        at: Timestamp,
    },

    /// Balance query for a point before the account existed
    #[error("Account {account_id} did not exist at {at} (created at {created_at})")]
    BeforeCreation {
        /// Account being queried
        account_id: AccountId,
        /// Queried point in time
        at: Timestamp,
        /// First history timestamp of the account
        created_at: Timestamp,
    },

    /// Balance query at or after the point the account was merged away
    #[error("Account {account_id} was absorbed at {absorbed_at}")]
    AccountAbsorbed {
        /// Absorbed account
        account_id: AccountId,
        /// Merge timestamp
        absorbed_at: Timestamp,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error (snapshots)
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error (config file loading)
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(err: toml::de::Error) -> Self {
        LedgerError::Config(format!("Failed to parse config: {}", err))
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl LedgerError {
    /// Short stable label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::InvalidAmount(_) => "invalid_amount",
            LedgerError::AccountNotFound(_) => "account_not_found",
            LedgerError::AccountExists(_) => "account_exists",
            LedgerError::SameAccount(_) => "same_account",
            LedgerError::InsufficientFunds { .. } => "insufficient_funds",
            LedgerError::BalanceOverflow { .. } => "balance_overflow",
            LedgerError::PaymentNotFound(_) => "payment_not_found",
            LedgerError::PaymentOwnershipMismatch { .. } => "payment_ownership_mismatch",
            LedgerError::FutureQuery { .. } => "future_query",
            LedgerError::BeforeCreation { .. } => "before_creation",
            LedgerError::AccountAbsorbed { .. } => "account_absorbed",
            LedgerError::Serialization(_) => "serialization",
            LedgerError::Config(_) => "config",
            LedgerError::Io(_) => "io",
        }
    }
}
