//! Property-based tests for period balance maintenance.
//!
//! A random history of creates, amends and voids is run through the
//! incremental path and compared against a full replay of the lines that
//! remain active.

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;
use partida_shared::types::AccountId;

use super::balance::{BalanceBook, Movement};

const ACCOUNTS: usize = 4;

/// One balanced pair: debit account, credit account, amount in cents.
type Pair = (usize, usize, i64);

#[derive(Debug, Clone)]
enum Op {
    Create { day: u64, pairs: Vec<Pair> },
    Amend { target: usize, day: u64, pairs: Vec<Pair> },
    AmendSame { target: usize },
    Void { target: usize },
}

fn pairs() -> impl Strategy<Value = Vec<Pair>> {
    prop::collection::vec((0..ACCOUNTS, 0..ACCOUNTS, 1i64..10_000_000i64), 1..4)
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0u64..730, pairs()).prop_map(|(day, pairs)| Op::Create { day, pairs }),
        1 => (any::<usize>(), 0u64..730, pairs())
            .prop_map(|(target, day, pairs)| Op::Amend { target, day, pairs }),
        1 => any::<usize>().prop_map(|target| Op::AmendSame { target }),
        1 => any::<usize>().prop_map(|target| Op::Void { target }),
    ]
}

struct Entry {
    number: i32,
    active: bool,
    movements: Vec<Movement>,
}

struct History {
    accounts: Vec<AccountId>,
    entries: Vec<Entry>,
    book: BalanceBook,
}

impl History {
    fn new() -> Self {
        Self {
            accounts: (0..ACCOUNTS).map(|_| AccountId::new()).collect(),
            entries: Vec::new(),
            book: BalanceBook::new(),
        }
    }

    fn movements(&self, number: i32, day: u64, pairs: &[Pair]) -> Vec<Movement> {
        let date = NaiveDate::from_ymd_opt(2023, 1, 1)
            .and_then(|d| d.checked_add_days(Days::new(day)))
            .unwrap();
        pairs
            .iter()
            .flat_map(|&(debit, credit, cents)| {
                let amount = Decimal::new(cents, 2);
                [
                    Movement {
                        account_id: self.accounts[debit],
                        date,
                        entry_number: number,
                        debit: amount,
                        credit: Decimal::ZERO,
                    },
                    Movement {
                        account_id: self.accounts[credit],
                        date,
                        entry_number: number,
                        debit: Decimal::ZERO,
                        credit: amount,
                    },
                ]
            })
            .collect()
    }

    fn run(&mut self, op: &Op) {
        match op {
            Op::Create { day, pairs } => {
                let number = i32::try_from(self.entries.len() + 1).unwrap();
                let movements = self.movements(number, *day, pairs);
                for m in &movements {
                    self.book.apply(m);
                }
                self.entries.push(Entry {
                    number,
                    active: true,
                    movements,
                });
            }
            Op::Amend { target, day, pairs } => {
                let Some(idx) = self.pick_active(*target) else {
                    return;
                };
                let number = self.entries[idx].number;
                let replacement = self.movements(number, *day, pairs);
                for m in &self.entries[idx].movements {
                    self.book.reverse(m);
                }
                for m in &replacement {
                    self.book.apply(m);
                }
                self.entries[idx].movements = replacement;
            }
            Op::AmendSame { target } => {
                let Some(idx) = self.pick_active(*target) else {
                    return;
                };
                let same = self.entries[idx].movements.clone();
                for m in &self.entries[idx].movements {
                    self.book.reverse(m);
                }
                for m in &same {
                    self.book.apply(m);
                }
            }
            Op::Void { target } => {
                let Some(idx) = self.pick_active(*target) else {
                    return;
                };
                for m in &self.entries[idx].movements {
                    self.book.reverse(m);
                }
                self.entries[idx].active = false;
            }
        }
    }

    fn pick_active(&self, target: usize) -> Option<usize> {
        if self.entries.is_empty() {
            return None;
        }
        let idx = target % self.entries.len();
        self.entries[idx].active.then_some(idx)
    }

    fn active_movements(&self) -> impl Iterator<Item = &Movement> {
        self.entries
            .iter()
            .filter(|e| e.active)
            .flat_map(|e| e.movements.iter())
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Replaying active lines gives the same periods and cached balances as
    /// the incremental path.
    #[test]
    fn prop_recompute_matches_incremental(ops in prop::collection::vec(op(), 1..40)) {
        let mut history = History::new();
        for op in &ops {
            history.run(op);
        }

        let rebuilt = BalanceBook::replay(history.active_movements());

        prop_assert_eq!(history.book.non_zero_periods(), rebuilt.non_zero_periods());
        for account in &history.accounts {
            prop_assert_eq!(
                history.book.account(*account).balance,
                rebuilt.account(*account).balance
            );
        }
    }

    /// The nets of an account's periods add up to its active lines.
    #[test]
    fn prop_balance_conservation(ops in prop::collection::vec(op(), 1..40)) {
        let mut history = History::new();
        for op in &ops {
            history.run(op);
        }

        for account in &history.accounts {
            let expected: Decimal = history
                .active_movements()
                .filter(|m| m.account_id == *account)
                .map(Movement::signed_amount)
                .sum();
            prop_assert_eq!(history.book.net_for(*account), expected);
        }
    }

    /// Posting then voiding an entry leaves every touched period as it was.
    #[test]
    fn prop_void_restores_periods(
        before in prop::collection::vec(op(), 0..10),
        day in 0u64..730,
        entry in pairs(),
    ) {
        let mut history = History::new();
        for op in &before {
            history.run(op);
        }
        let snapshot = history.book.non_zero_periods();

        history.run(&Op::Create { day, pairs: entry });
        let last = history.entries.len() - 1;
        history.run(&Op::Void { target: last });

        prop_assert_eq!(history.book.non_zero_periods(), snapshot);
    }

    /// Amending an entry with its own lines leaves balances untouched.
    #[test]
    fn prop_amend_same_lines_is_noop(
        ops in prop::collection::vec(op(), 1..20),
        target in any::<usize>(),
    ) {
        let mut history = History::new();
        for op in &ops {
            history.run(op);
        }
        let snapshot = history.book.non_zero_periods();

        history.run(&Op::AmendSame { target });

        prop_assert_eq!(history.book.non_zero_periods(), snapshot);
    }
}
