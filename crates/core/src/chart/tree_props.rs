//! Property-based tests for hierarchical rollup.

use std::collections::HashMap;

use proptest::prelude::*;
use rust_decimal::Decimal;
use partida_shared::types::{AccountId, TenantId};

use super::account::{Account, BalanceSide};
use super::tree::AccountTree;

/// Strategy for unique codes over digits 0-2, up to four long, each with a
/// level drawn independently of the code length. Codes such as "1" and
/// "10" can therefore both sit on level 1.
fn chart_shape() -> impl Strategy<Value = Vec<(String, i32)>> {
    let code = prop::collection::vec(0u8..=2, 1..=4)
        .prop_map(|digits| digits.iter().map(|d| char::from(b'0' + d)).collect::<String>());
    prop::collection::btree_map(code, 1i32..=4, 1..16).prop_map(|codes| {
        codes
            .into_iter()
            .map(|(code, level)| {
                let longest = i32::try_from(code.len()).unwrap_or(i32::MAX);
                (code, level.min(longest))
            })
            .collect()
    })
}

/// Parent by brute force: the account with the longest code that can parent
/// `idx`.
fn parent_of(accounts: &[Account], idx: usize) -> Option<usize> {
    let child = &accounts[idx];
    accounts
        .iter()
        .enumerate()
        .filter(|(_, candidate)| candidate.can_parent(child))
        .max_by_key(|(_, candidate)| candidate.code.len())
        .map(|(i, _)| i)
}

/// Walks the parent chain of `descendant` looking for `ancestor`.
fn on_chain(accounts: &[Account], ancestor: usize, descendant: usize) -> bool {
    let mut current = parent_of(accounts, descendant);
    while let Some(idx) = current {
        if idx == ancestor {
            return true;
        }
        current = parent_of(accounts, idx);
    }
    false
}

/// Builds the chart; accounts nobody hangs under are the postable ones.
fn chart(shape: &[(String, i32)]) -> Vec<Account> {
    let tenant_id = TenantId::new();
    let mut accounts: Vec<Account> = shape
        .iter()
        .map(|(code, level)| Account {
            id: AccountId::new(),
            tenant_id,
            code: code.clone(),
            name: code.clone(),
            level: *level,
            postable: false,
            monetary: true,
            adjustable: false,
            balance_side: BalanceSide::Debit,
            is_active: true,
        })
        .collect();

    let parents: Vec<Option<usize>> = (0..accounts.len())
        .map(|idx| parent_of(&accounts, idx))
        .collect();
    for (idx, account) in accounts.iter_mut().enumerate() {
        account.postable = !parents.contains(&Some(idx));
    }
    accounts
}

fn balances_for(accounts: &[Account], cents: &[i64]) -> HashMap<AccountId, Decimal> {
    accounts
        .iter()
        .zip(cents)
        .filter(|(account, _)| account.postable)
        .map(|(account, c)| (account.id, Decimal::new(*c, 2)))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A parent's rolled-up balance equals the sum of the postable accounts
    /// on its parent chain.
    #[test]
    fn prop_rollup_equals_sum_of_postable_descendants(
        shape in chart_shape(),
        cents in prop::collection::vec(-1_000_000i64..1_000_000i64, 16),
    ) {
        let accounts = chart(&shape);
        let balances = balances_for(&accounts, &cents);

        let tree = AccountTree::new(accounts.clone());
        let totals = tree.rollup(&balances);

        for (p, parent) in accounts.iter().enumerate().filter(|(_, a)| !a.postable) {
            let expected: Decimal = accounts
                .iter()
                .enumerate()
                .filter(|(c, child)| child.postable && on_chain(&accounts, p, *c))
                .map(|(_, child)| balances.get(&child.id).copied().unwrap_or_default())
                .sum();
            prop_assert_eq!(totals[&parent.id], expected, "account {}", parent.code);
        }
    }

    /// The tree's parent matches the brute-force nearest parent.
    #[test]
    fn prop_parent_is_nearest_candidate(shape in chart_shape()) {
        let accounts = chart(&shape);
        let tree = AccountTree::new(accounts.clone());

        for (idx, account) in accounts.iter().enumerate() {
            let expected = parent_of(&accounts, idx).map(|p| accounts[p].code.as_str());
            let actual = tree.parent(account.id).map(|p| p.code.as_str());
            prop_assert_eq!(actual, expected, "account {}", account.code);
        }
    }

    /// Every postable balance is counted under exactly one root, so the
    /// root totals add up to the sum of every postable balance.
    #[test]
    fn prop_roots_cover_all_postable_once(
        shape in chart_shape(),
        cents in prop::collection::vec(-1_000_000i64..1_000_000i64, 16),
    ) {
        let accounts = chart(&shape);
        let balances = balances_for(&accounts, &cents);

        let tree = AccountTree::new(accounts);
        let totals = tree.rollup(&balances);

        let roots: Decimal = tree
            .iter()
            .filter(|account| tree.parent(account.id).is_none())
            .map(|account| totals[&account.id])
            .sum();
        let all: Decimal = balances.values().copied().sum();
        prop_assert_eq!(roots, all);
    }
}
