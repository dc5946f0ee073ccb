//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Balances never go negative in any recorded history entry
//! - Histories are ordered and end with at most one terminal entry
//! - Payment IDs are issued sequentially and never reused
//! - Ranking matches a full sort by (outgoing desc, id asc)
//! - Failed operations leave state untouched

use banking_ledger::{
    ranking::rank_order, AccountId, Balance, Ledger, LedgerError, PaymentStatus, SpenderRank,
};
use proptest::prelude::*;

const DAY: i64 = 86_400_000;
const ACCOUNTS: [&str; 4] = ["A1", "A2", "A3", "A4"];

/// Install a test subscriber once; `RUST_LOG=debug` shows ledger events
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// One randomly generated ledger operation
#[derive(Debug, Clone)]
enum Op {
    Create(usize),
    Deposit(usize, i64),
    Transfer(usize, usize, i64),
    Pay(usize, i64),
    Merge(usize, usize),
    Balance(usize, i64),
    Rank(i64),
}

/// Strategy for generating operations over a small account pool
fn op_strategy() -> impl Strategy<Value = Op> {
    let idx = 0..ACCOUNTS.len();
    prop_oneof![
        idx.clone().prop_map(Op::Create),
        (idx.clone(), -10i64..5_000).prop_map(|(a, amt)| Op::Deposit(a, amt)),
        (idx.clone(), idx.clone(), -10i64..3_000).prop_map(|(a, b, amt)| Op::Transfer(a, b, amt)),
        (idx.clone(), -10i64..3_000).prop_map(|(a, amt)| Op::Pay(a, amt)),
        (idx.clone(), idx.clone()).prop_map(|(a, b)| Op::Merge(a, b)),
        (idx, 0i64..DAY * 3).prop_map(|(a, back)| Op::Balance(a, back)),
        (-2i64..6).prop_map(Op::Rank),
    ]
}

/// Strategy for generating increasing timestamps, sometimes a day apart
fn step_strategy() -> impl Strategy<Value = i64> {
    prop_oneof![4 => 1i64..1_000, 1 => DAY / 2..DAY * 2]
}

fn run(ops: &[(Op, i64)]) -> Ledger {
    let mut ledger = Ledger::new();
    let mut ts = 0;
    for (op, step) in ops {
        ts += step;
        match op {
            Op::Create(a) => {
                let _ = ledger.create_account(ts, ACCOUNTS[*a]);
            }
            Op::Deposit(a, amount) => {
                let _ = ledger.deposit(ts, ACCOUNTS[*a], *amount);
            }
            Op::Transfer(a, b, amount) => {
                let _ = ledger.transfer(ts, ACCOUNTS[*a], ACCOUNTS[*b], *amount);
            }
            Op::Pay(a, amount) => {
                let _ = ledger.pay(ts, ACCOUNTS[*a], *amount);
            }
            Op::Merge(a, b) => {
                let _ = ledger.merge_accounts(ts, ACCOUNTS[*a], ACCOUNTS[*b]);
            }
            Op::Balance(a, back) => {
                let _ = ledger.get_balance(ts, ACCOUNTS[*a], ts - back);
            }
            Op::Rank(n) => {
                let _ = ledger.top_spenders(ts, *n);
            }
        }
    }
    ledger
}

fn ops_strategy() -> impl Strategy<Value = Vec<(Op, i64)>> {
    prop::collection::vec((op_strategy(), step_strategy()), 1..80)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: no history entry ever records a negative balance
    #[test]
    fn prop_balances_never_negative(ops in ops_strategy()) {
        let ledger = run(&ops);
        for id in ACCOUNTS {
            if let Some(history) = ledger.history(id) {
                for entry in history.entries() {
                    if let Balance::Active(amount) = entry.balance {
                        prop_assert!(amount >= 0);
                    }
                }
            }
            if let Some(balance) = ledger.balance(id) {
                prop_assert!(balance >= 0);
            }
        }
    }

    /// Property: histories are time-ordered and closed at most once
    #[test]
    fn prop_history_ordered_and_terminal(ops in ops_strategy()) {
        let ledger = run(&ops);
        for id in ACCOUNTS {
            let Some(history) = ledger.history(id) else { continue };
            let entries = history.entries();
            prop_assert!(entries.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

            let sentinels: Vec<usize> = entries
                .iter()
                .enumerate()
                .filter(|(_, e)| e.balance.is_absorbed())
                .map(|(i, _)| i)
                .collect();
            prop_assert!(sentinels.len() <= 1);
            if let Some(&pos) = sentinels.first() {
                prop_assert_eq!(pos, entries.len() - 1);
                prop_assert!(!ledger.contains_account(id));
            } else {
                prop_assert!(ledger.contains_account(id));
            }
        }
    }

    /// Property: every issued payment resolves to exactly one live owner
    #[test]
    fn prop_payment_owners_are_live(ops in ops_strategy()) {
        let ledger = run(&ops);
        let snapshot = ledger.snapshot();
        let sequences: Vec<u64> = snapshot.payment_owners.keys().map(|p| p.sequence()).collect();
        let expected: Vec<u64> = (1..snapshot.next_payment).collect();
        prop_assert_eq!(sequences, expected);
        for owner in snapshot.payment_owners.values() {
            prop_assert!(ledger.contains_account(owner.as_str()));
        }
        for pending in &snapshot.pending {
            prop_assert!(ledger.contains_account(pending.account_id.as_str()));
        }
    }

    /// Property: ranking equals a full sort of live accounts
    #[test]
    fn prop_ranking_matches_full_sort(ops in ops_strategy(), n in 0i64..6) {
        let mut ledger = run(&ops);
        let ts = ledger.snapshot().histories.values()
            .filter_map(|h| h.entries().last().map(|e| e.timestamp))
            .max()
            .unwrap_or(0);

        let mut expected: Vec<SpenderRank> = ledger.snapshot().accounts.iter()
            .map(|(id, account)| SpenderRank::new(id.clone(), account.outgoing))
            .collect();
        expected.sort_by(rank_order);
        expected.truncate(n as usize);

        // Flushing at `ts` does not change outgoing totals
        prop_assert_eq!(ledger.top_spenders(ts, n), expected);
    }

    /// Property: rejected deposits leave the ledger unchanged
    #[test]
    fn prop_rejected_deposit_is_noop(ops in ops_strategy(), amount in -1_000i64..=0) {
        let mut ledger = run(&ops);
        let ts = ledger.snapshot().histories.values()
            .filter_map(|h| h.entries().last().map(|e| e.timestamp))
            .max()
            .unwrap_or(0) + 2 * DAY;
        ledger.flush(ts);

        let before = ledger.snapshot();
        for id in ACCOUNTS {
            prop_assert_eq!(
                ledger.deposit(ts, id, amount),
                Err(LedgerError::InvalidAmount(amount))
            );
        }
        prop_assert_eq!(ledger.snapshot(), before);
    }

    /// Property: cashback is exactly floor(2%) and lands at maturity
    #[test]
    fn prop_cashback_amount(amount in 1i64..10_000_000, start in 0i64..1_000) {
        let mut ledger = Ledger::new();
        ledger.create_account(start, "A1").unwrap();
        ledger.deposit(start, "A1", amount).unwrap();
        let payment = ledger.pay(start + 1, "A1", amount).unwrap();

        prop_assert_eq!(
            ledger.get_payment_status(start + DAY, "A1", payment),
            Ok(PaymentStatus::InProgress)
        );
        prop_assert_eq!(ledger.balance("A1"), Some(0));

        prop_assert_eq!(
            ledger.get_payment_status(start + 1 + DAY, "A1", payment),
            Ok(PaymentStatus::CashbackReceived)
        );
        prop_assert_eq!(ledger.balance("A1"), Some(amount * 2 / 100));
    }

    /// Property: balance queries about the future always fail
    #[test]
    fn prop_future_queries_fail(ops in ops_strategy(), ahead in 1i64..1_000) {
        let mut ledger = run(&ops);
        for id in ACCOUNTS {
            prop_assert!(matches!(
                ledger.get_balance(0, id, ahead),
                Err(LedgerError::FutureQuery { .. })
            ), "expected FutureQuery error");
        }
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn test_full_scenario() {
        init_tracing();
        let mut ledger = Ledger::new();

        assert!(ledger.create_account(1, "account1").is_ok());
        assert!(ledger.create_account(2, "account2").is_ok());

        assert_eq!(ledger.deposit(3, "account1", 2000), Ok(2000));
        assert_eq!(ledger.deposit(4, "account2", 2000), Ok(2000));

        let payment = ledger.pay(5, "account2", 300).unwrap();
        assert_eq!(payment.to_string(), "payment1");

        assert_eq!(ledger.transfer(6, "account1", "account2", 500), Ok(1500));

        assert!(ledger.merge_accounts(7, "account1", "non-existing").is_err());
        assert!(ledger.merge_accounts(8, "account1", "account1").is_err());
        assert!(ledger.merge_accounts(9, "account1", "account2").is_ok());

        assert_eq!(ledger.deposit(10, "account1", 100), Ok(3800));
        assert!(ledger.deposit(11, "account2", 100).is_err());

        assert!(ledger.get_payment_status(12, "account2", payment).is_err());
        assert_eq!(
            ledger
                .get_payment_status(13, "account1", payment)
                .map(|s| s.to_string()),
            Ok("IN_PROGRESS".to_string())
        );

        let absorbed_len = ledger.history("account2").unwrap().len();
        assert_eq!(ledger.get_balance(14, "account2", 7), Ok(2200));
        assert_eq!(ledger.history("account2").unwrap().len(), absorbed_len);

        assert!(ledger.get_balance(14, "account2", 1).is_err());
        assert!(ledger.get_balance(15, "account2", 9).is_err());
        assert_eq!(ledger.history("account2").unwrap().len(), absorbed_len);
        assert_eq!(ledger.get_balance(16, "account1", 11), Ok(3800));

        assert_eq!(ledger.deposit(5 + DAY, "account1", 100), Ok(3906));

        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.accounts.len(), 1);
        assert_eq!(snapshot.accounts["account1"].outgoing, 800);
        assert!(snapshot.pending.is_empty());
        assert_eq!(
            snapshot.payment_owners.get(&payment),
            Some(&AccountId::new("account1"))
        );
    }

    #[test]
    fn test_top_spenders_after_merge() {
        init_tracing();
        let mut ledger = Ledger::new();
        for id in ["c", "b", "a"] {
            ledger.create_account(1, id).unwrap();
            ledger.deposit(2, id, 1_000).unwrap();
        }
        ledger.pay(3, "a", 100).unwrap();
        ledger.pay(4, "b", 250).unwrap();
        ledger.transfer(5, "c", "a", 150).unwrap();

        let ranked: Vec<String> = ledger
            .top_spenders(6, 2)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(ranked, vec!["b(250)", "c(150)"]);

        ledger.merge_accounts(7, "a", "c").unwrap();
        let ranked: Vec<String> = ledger
            .top_spenders(8, 5)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(ranked, vec!["a(250)", "b(250)"]);
    }

    #[test]
    fn test_late_query_sees_every_matured_cashback() {
        init_tracing();
        let mut ledger = Ledger::new();
        ledger.create_account(0, "A1").unwrap();
        ledger.deposit(0, "A1", 10_000).unwrap();
        ledger.pay(10, "A1", 1_000).unwrap();
        ledger.pay(20, "A1", 2_000).unwrap();

        // Far in the future: both credits land at their own maturity
        assert_eq!(ledger.get_balance(50 * DAY, "A1", 15 + DAY), Ok(7_020));
        assert_eq!(ledger.get_balance(50 * DAY, "A1", 20 + DAY), Ok(7_060));
        assert_eq!(ledger.get_balance(50 * DAY, "A1", 19 + DAY), Ok(7_020));
        assert_eq!(ledger.get_balance(50 * DAY, "A1", 9 + DAY), Ok(7_000));
    }
}
