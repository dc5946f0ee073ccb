//! Account merging
//!
//! `merge_accounts(ts, survivor, absorbed)` folds the absorbed account into
//! the survivor:
//!
//! 1. Pending cashbacks of `absorbed` are reassigned to `survivor`
//! 2. Payment ownership entries pointing at `absorbed` are repointed
//! 3. Balances and outgoing totals are added together
//! 4. `absorbed` leaves the live set; its history gets the terminal
//!    `Absorbed` entry at `ts` and accepts nothing afterwards
//!
//! The absorbed account's history stays queryable for points before `ts`.

use crate::{
    ledger::credited,
    types::{AccountId, Timestamp},
    Ledger, LedgerError, Result,
};
use tracing::info;

impl Ledger {
    /// Merge `absorbed` into `survivor`; irreversible
    pub fn merge_accounts(&mut self, ts: Timestamp, survivor: &str, absorbed: &str) -> Result<()> {
        self.begin(ts);
        let outcome = self.apply_merge(ts, survivor, absorbed);
        self.finish("merge_accounts", &outcome);
        outcome
    }

    fn apply_merge(&mut self, ts: Timestamp, survivor: &str, absorbed: &str) -> Result<()> {
        if survivor == absorbed {
            return Err(LedgerError::SameAccount(AccountId::new(survivor)));
        }
        let kept = self.account(survivor)?;
        let gone = self.account(absorbed)?;

        let balance = credited(survivor, kept.balance, gone.balance)?;
        let outgoing = credited(survivor, kept.outgoing, gone.outgoing)?;

        let from = AccountId::new(absorbed);
        let to = AccountId::new(survivor);

        let moved_cashbacks = self.scheduler.reassign(&from, &to);

        let mut moved_payments = 0usize;
        for owner in self.payment_owners.values_mut() {
            if *owner == from {
                *owner = to.clone();
                moved_payments += 1;
            }
        }

        self.accounts.remove(absorbed);
        if let Some(account) = self.accounts.get_mut(survivor) {
            account.outgoing = outgoing;
        }
        self.set_balance(ts, survivor, balance);

        if let Some(history) = self.histories.get_mut(absorbed) {
            history.close(ts);
        }

        info!(
            survivor,
            absorbed,
            balance,
            outgoing,
            moved_cashbacks,
            moved_payments,
            ts,
            "Accounts merged"
        );
        Ok(())
    }
}
