//! Main ledger orchestration layer
//!
//! This module owns all ledger state and implements the write operations:
//! account creation, deposits, transfers and cashback payments. Queries
//! live in [`crate::query`] and account merging in [`crate::merge`].
//!
//! Every public operation starts by flushing the cashback scheduler at the
//! caller's timestamp, so observed state always includes every cashback
//! due by then.
//!
//! # Example
//!
//! ```
//! use banking_ledger::Ledger;
//!
//! let mut ledger = Ledger::new();
//! ledger.create_account(1, "alice").unwrap();
//! ledger.deposit(2, "alice", 1_000).unwrap();
//! let payment = ledger.pay(3, "alice", 300).unwrap();
//! assert_eq!(payment.to_string(), "payment1");
//! ```

use crate::{
    cashback::{CashbackScheduler, PendingCashback},
    history::BalanceHistory,
    types::{Account, AccountId, Amount, PaymentId, Timestamp},
    Config, LedgerError, Metrics, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// In-memory banking ledger driven by caller-supplied timestamps
#[derive(Debug)]
pub struct Ledger {
    /// Configuration
    pub(crate) config: Config,

    /// Live accounts
    pub(crate) accounts: HashMap<AccountId, Account>,

    /// Balance history of every account ever created, absorbed ones included
    pub(crate) histories: HashMap<AccountId, BalanceHistory>,

    /// Outstanding cashbacks
    pub(crate) scheduler: CashbackScheduler,

    /// Current owner of every payment ever issued
    pub(crate) payment_owners: HashMap<PaymentId, AccountId>,

    /// Sequence number of the next payment
    pub(crate) next_payment: u64,

    /// Highest timestamp seen by any operation
    pub(crate) last_seen: Option<Timestamp>,

    /// Metrics
    pub(crate) metrics: Metrics,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Create a ledger with the default configuration
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a ledger with a custom configuration
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            accounts: HashMap::new(),
            histories: HashMap::new(),
            scheduler: CashbackScheduler::new(),
            payment_owners: HashMap::new(),
            next_payment: 1,
            last_seen: None,
            metrics: Metrics::default(),
        }
    }

    /// Create a ledger from a validated configuration
    pub fn try_with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    /// Apply every cashback due by `ts`
    ///
    /// Returns the number of cashbacks credited. Calling it again at the
    /// same or an earlier timestamp credits nothing.
    pub fn flush(&mut self, ts: Timestamp) -> usize {
        let applied = self.begin(ts);
        self.refresh_gauges();
        applied
    }

    /// Open an account with a zero balance
    ///
    /// IDs of absorbed accounts stay reserved and are rejected with
    /// [`LedgerError::AccountExists`].
    pub fn create_account(&mut self, ts: Timestamp, account_id: &str) -> Result<()> {
        self.begin(ts);
        let outcome = self.apply_create_account(ts, account_id);
        self.finish("create_account", &outcome);
        outcome
    }

    /// Credit `amount` and return the new balance
    pub fn deposit(&mut self, ts: Timestamp, account_id: &str, amount: Amount) -> Result<Amount> {
        self.begin(ts);
        let outcome = self.apply_deposit(ts, account_id, amount);
        self.finish("deposit", &outcome);
        outcome
    }

    /// Move `amount` between two accounts and return the source balance
    pub fn transfer(
        &mut self,
        ts: Timestamp,
        source: &str,
        target: &str,
        amount: Amount,
    ) -> Result<Amount> {
        self.begin(ts);
        let outcome = self.apply_transfer(ts, source, target, amount);
        self.finish("transfer", &outcome);
        outcome
    }

    /// Debit `amount` as a payment earning deferred cashback
    pub fn pay(&mut self, ts: Timestamp, account_id: &str, amount: Amount) -> Result<PaymentId> {
        self.begin(ts);
        let outcome = self.apply_pay(ts, account_id, amount);
        self.finish("pay", &outcome);
        outcome
    }

    fn apply_create_account(&mut self, ts: Timestamp, account_id: &str) -> Result<()> {
        // Absorbed IDs keep their history and stay reserved
        if self.histories.contains_key(account_id) {
            return Err(LedgerError::AccountExists(AccountId::new(account_id)));
        }

        let id = AccountId::new(account_id);
        self.accounts.insert(id.clone(), Account::default());
        self.histories.insert(id, BalanceHistory::open(ts));

        debug!(account_id, ts, "Account created");
        Ok(())
    }

    fn apply_deposit(&mut self, ts: Timestamp, account_id: &str, amount: Amount) -> Result<Amount> {
        ensure_positive(amount)?;
        let account = self.account(account_id)?;
        let balance = credited(account_id, account.balance, amount)?;

        self.set_balance(ts, account_id, balance);

        debug!(account_id, amount, balance, ts, "Deposit applied");
        Ok(balance)
    }

    fn apply_transfer(
        &mut self,
        ts: Timestamp,
        source: &str,
        target: &str,
        amount: Amount,
    ) -> Result<Amount> {
        ensure_positive(amount)?;
        let source_account = self.account(source)?;
        let target_account = self.account(target)?;
        if source == target {
            return Err(LedgerError::SameAccount(AccountId::new(source)));
        }
        ensure_funds(source, source_account.balance, amount)?;

        let source_balance = source_account.balance - amount;
        let source_outgoing = credited(source, source_account.outgoing, amount)?;
        let target_balance = credited(target, target_account.balance, amount)?;

        self.set_balance(ts, source, source_balance);
        self.set_outgoing(source, source_outgoing);
        self.set_balance(ts, target, target_balance);

        debug!(source, target, amount, source_balance, ts, "Transfer applied");
        Ok(source_balance)
    }

    fn apply_pay(&mut self, ts: Timestamp, account_id: &str, amount: Amount) -> Result<PaymentId> {
        ensure_positive(amount)?;
        let account = self.account(account_id)?;
        ensure_funds(account_id, account.balance, amount)?;

        let balance = account.balance - amount;
        let outgoing = credited(account_id, account.outgoing, amount)?;

        let payment_id = PaymentId::from_sequence(self.next_payment);
        self.next_payment += 1;

        let owner = AccountId::new(account_id);
        let pending = PendingCashback {
            payment_id,
            account_id: owner.clone(),
            created_at: ts,
            cashback: self.config.cashback.cashback_for(amount),
            matures_at: self.config.cashback.maturity_of(ts),
        };

        self.set_balance(ts, account_id, balance);
        self.set_outgoing(account_id, outgoing);
        self.payment_owners.insert(payment_id, owner);

        debug!(
            account_id,
            amount,
            balance,
            cashback = pending.cashback,
            matures_at = pending.matures_at,
            %payment_id,
            "Payment applied"
        );
        self.scheduler.schedule(pending);
        Ok(payment_id)
    }

    /// Common prologue of every public operation
    ///
    /// Tracks the highest timestamp seen and applies matured cashbacks.
    pub(crate) fn begin(&mut self, ts: Timestamp) -> usize {
        match self.last_seen {
            Some(last) if ts < last => {
                warn!(ts, last_seen = last, "Operation timestamp went backwards");
            }
            _ => self.last_seen = Some(ts),
        }
        self.apply_matured(ts)
    }

    /// Common epilogue of every public operation
    pub(crate) fn finish<T>(&self, operation: &str, outcome: &Result<T>) {
        if let Err(err) = outcome {
            debug!(operation, error = %err, "Operation rejected");
        }
        self.metrics.record_outcome(operation, outcome);
        self.refresh_gauges();
    }

    fn apply_matured(&mut self, ts: Timestamp) -> usize {
        let due = self.scheduler.take_matured(ts);
        let mut applied = 0;

        for pending in due {
            let Some(account) = self.accounts.get_mut(pending.account_id.as_str()) else {
                // Merges move cashbacks to the survivor, so owners stay live
                warn!(
                    account_id = %pending.account_id,
                    payment_id = %pending.payment_id,
                    "Dropping cashback for inactive account"
                );
                continue;
            };

            let previous = account.balance;
            account.balance = previous.saturating_add(pending.cashback);
            let balance = account.balance;
            let credited = balance - previous;
            if credited < pending.cashback {
                warn!(
                    account_id = %pending.account_id,
                    payment_id = %pending.payment_id,
                    cashback = pending.cashback,
                    lost = pending.cashback - credited,
                    "Cashback credit saturated at maximum balance"
                );
            }
            if let Some(history) = self.histories.get_mut(pending.account_id.as_str()) {
                history.record(pending.matures_at, balance);
            }

            info!(
                account_id = %pending.account_id,
                payment_id = %pending.payment_id,
                cashback = pending.cashback,
                matures_at = pending.matures_at,
                balance,
                "Cashback credited"
            );
            self.metrics.record_cashback(credited);
            applied += 1;
        }

        applied
    }

    pub(crate) fn refresh_gauges(&self) {
        self.metrics
            .update_gauges(self.scheduler.len(), self.accounts.len());
    }

    /// Snapshot of a live account
    pub(crate) fn account(&self, account_id: &str) -> Result<Account> {
        self.accounts
            .get(account_id)
            .cloned()
            .ok_or_else(|| LedgerError::AccountNotFound(AccountId::new(account_id)))
    }

    /// Set the balance of a live account and record it in its history
    pub(crate) fn set_balance(&mut self, ts: Timestamp, account_id: &str, balance: Amount) {
        if let Some(account) = self.accounts.get_mut(account_id) {
            account.balance = balance;
        }
        self.record_history(ts, account_id, balance);
    }

    fn set_outgoing(&mut self, account_id: &str, outgoing: Amount) {
        if let Some(account) = self.accounts.get_mut(account_id) {
            account.outgoing = outgoing;
        }
    }

    pub(crate) fn record_history(&mut self, ts: Timestamp, account_id: &str, balance: Amount) {
        if let Some(history) = self.histories.get_mut(account_id) {
            history.record(ts, balance);
        }
    }

    /// Current balance of a live account
    pub fn balance(&self, account_id: &str) -> Option<Amount> {
        self.accounts.get(account_id).map(|account| account.balance)
    }

    /// Outgoing total of a live account
    pub fn outgoing(&self, account_id: &str) -> Option<Amount> {
        self.accounts.get(account_id).map(|account| account.outgoing)
    }

    /// History of any account ever created, absorbed ones included
    pub fn history(&self, account_id: &str) -> Option<&BalanceHistory> {
        self.histories.get(account_id)
    }

    /// Check whether an account is live
    pub fn contains_account(&self, account_id: &str) -> bool {
        self.accounts.contains_key(account_id)
    }

    /// Number of live accounts
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Number of outstanding cashbacks
    pub fn pending_payments(&self) -> usize {
        self.scheduler.len()
    }

    /// Current owner of a payment
    pub fn payment_owner(&self, payment_id: &PaymentId) -> Option<&AccountId> {
        self.payment_owners.get(payment_id)
    }

    /// Configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Metrics
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Point-in-time dump of all ledger state in deterministic order
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            accounts: self
                .accounts
                .iter()
                .map(|(id, account)| (id.clone(), account.clone()))
                .collect(),
            pending: self.scheduler.pending().cloned().collect(),
            payment_owners: self
                .payment_owners
                .iter()
                .map(|(payment, owner)| (*payment, owner.clone()))
                .collect(),
            histories: self
                .histories
                .iter()
                .map(|(id, history)| (id.clone(), history.clone()))
                .collect(),
            next_payment: self.next_payment,
        }
    }
}

/// Serializable dump of ledger state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Live accounts
    pub accounts: BTreeMap<AccountId, Account>,
    /// Outstanding cashbacks in maturity order
    pub pending: Vec<PendingCashback>,
    /// Payment ownership index
    pub payment_owners: BTreeMap<PaymentId, AccountId>,
    /// Balance histories
    pub histories: BTreeMap<AccountId, BalanceHistory>,
    /// Sequence number of the next payment
    pub next_payment: u64,
}

impl LedgerSnapshot {
    /// Render as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn ensure_positive(amount: Amount) -> Result<()> {
    if amount <= 0 {
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(())
}

fn ensure_funds(account_id: &str, balance: Amount, requested: Amount) -> Result<()> {
    if requested > balance {
        return Err(LedgerError::InsufficientFunds {
            account_id: AccountId::new(account_id),
            balance,
            requested,
        });
    }
    Ok(())
}

/// `current + credit`, rejecting overflow
pub(crate) fn credited(account_id: &str, current: Amount, credit: Amount) -> Result<Amount> {
    current
        .checked_add(credit)
        .ok_or_else(|| LedgerError::BalanceOverflow {
            account_id: AccountId::new(account_id),
            balance: current,
            credit,
        })
}
