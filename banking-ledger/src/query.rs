//! Read operations: point-in-time balances, payment status, ranking
//!
//! Successful balance and status queries append a `(ts, current balance)`
//! entry to the queried account's history, the same as a write would.

use crate::{
    ranking::{self, SpenderRank},
    types::{AccountId, Amount, Balance, PaymentId, PaymentStatus, Timestamp},
    Ledger, LedgerError, Result,
};
use tracing::debug;

impl Ledger {
    /// Balance of `account_id` as of `at`, queried at `ts`
    ///
    /// Absorbed accounts still answer for points before their merge.
    pub fn get_balance(&mut self, ts: Timestamp, account_id: &str, at: Timestamp) -> Result<Amount> {
        self.begin(ts);
        let outcome = self.query_balance(ts, account_id, at);
        self.finish("get_balance", &outcome);
        outcome
    }

    /// Cashback status of a payment owned by `account_id`
    pub fn get_payment_status(
        &mut self,
        ts: Timestamp,
        account_id: &str,
        payment_id: PaymentId,
    ) -> Result<PaymentStatus> {
        self.begin(ts);
        let outcome = self.query_payment_status(ts, account_id, payment_id);
        self.finish("get_payment_status", &outcome);
        outcome
    }

    /// The `n` accounts with the largest outgoing totals
    ///
    /// Ordered by outgoing total descending, then account ID ascending.
    /// Empty when `n <= 0` or no account exists.
    pub fn top_spenders(&mut self, ts: Timestamp, n: i64) -> Vec<SpenderRank> {
        self.begin(ts);
        let limit = usize::try_from(n).unwrap_or(0);
        let ranked = ranking::top_n(
            self.accounts
                .iter()
                .map(|(id, account)| (id, account.outgoing)),
            limit,
        );
        self.finish("top_spenders", &Ok::<_, LedgerError>(()));
        ranked
    }

    fn query_balance(&mut self, ts: Timestamp, account_id: &str, at: Timestamp) -> Result<Amount> {
        if at > ts {
            return Err(LedgerError::FutureQuery { ts, at });
        }

        let history = self
            .histories
            .get(account_id)
            .ok_or_else(|| LedgerError::AccountNotFound(AccountId::new(account_id)))?;

        let before_creation = || LedgerError::BeforeCreation {
            account_id: AccountId::new(account_id),
            at,
            created_at: history.opened_at(),
        };
        if at < history.opened_at() {
            return Err(before_creation());
        }

        let entry = history.floor(at).ok_or_else(before_creation)?;
        let amount = match entry.balance {
            Balance::Active(amount) => amount,
            Balance::Absorbed => {
                return Err(LedgerError::AccountAbsorbed {
                    account_id: AccountId::new(account_id),
                    absorbed_at: entry.timestamp,
                });
            }
        };

        // The history of an absorbed account is closed
        if let Some(current) = self.balance(account_id) {
            self.record_history(ts, account_id, current);
        }

        debug!(account_id, at, amount, ts, "Balance queried");
        Ok(amount)
    }

    fn query_payment_status(
        &mut self,
        ts: Timestamp,
        account_id: &str,
        payment_id: PaymentId,
    ) -> Result<PaymentStatus> {
        let current = self.account(account_id)?.balance;
        let owner = self
            .payment_owners
            .get(&payment_id)
            .ok_or(LedgerError::PaymentNotFound(payment_id))?;
        if owner.as_str() != account_id {
            return Err(LedgerError::PaymentOwnershipMismatch {
                payment_id,
                owner: owner.clone(),
                requested_by: AccountId::new(account_id),
            });
        }

        self.record_history(ts, account_id, current);

        let status = if self.scheduler.is_pending(&payment_id) {
            PaymentStatus::InProgress
        } else {
            PaymentStatus::CashbackReceived
        };
        debug!(account_id, %payment_id, %status, ts, "Payment status queried");
        Ok(status)
    }
}
