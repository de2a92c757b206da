//! Property-based tests for journal line validation.

use std::collections::HashMap;

use proptest::prelude::*;
use rust_decimal::Decimal;
use partida_shared::types::money::BALANCE_TOLERANCE;
use partida_shared::types::{AccountId, TenantId};

use super::error::ValidationError;
use super::types::LineDraft;
use super::validation::validate_lines;
use crate::chart::{Account, BalanceSide};

/// Strategy to generate a positive amount from 0.01 to 1,000,000.00.
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn chart(tenant_id: TenantId, size: usize) -> (Vec<AccountId>, HashMap<AccountId, Account>) {
    let accounts: Vec<Account> = (0..size)
        .map(|i| Account {
            id: AccountId::new(),
            tenant_id,
            code: format!("11{i}"),
            name: format!("Account {i}"),
            level: 3,
            postable: true,
            monetary: true,
            adjustable: false,
            balance_side: BalanceSide::Debit,
            is_active: true,
        })
        .collect();
    let ids = accounts.iter().map(|a| a.id).collect();
    (ids, accounts.into_iter().map(|a| (a.id, a)).collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any set of debits matched by a single credit of the same total is accepted.
    #[test]
    fn prop_balanced_lines_accepted(
        debits in prop::collection::vec(positive_amount(), 1..10),
    ) {
        let tenant_id = TenantId::new();
        let (ids, accounts) = chart(tenant_id, 4);
        let total: Decimal = debits.iter().copied().sum();

        let mut lines: Vec<LineDraft> = debits
            .iter()
            .enumerate()
            .map(|(i, amount)| LineDraft::debit(ids[i % 3], *amount))
            .collect();
        lines.push(LineDraft::credit(ids[3], total));

        let totals = validate_lines(tenant_id, &lines, &accounts, BALANCE_TOLERANCE);
        prop_assert!(totals.is_ok(), "balanced lines rejected: {:?}", totals);
        let totals = totals.unwrap();
        prop_assert_eq!(totals.debit, total);
        prop_assert_eq!(totals.credit, total);
    }

    /// Differences up to one cent pass; anything larger is reported as unbalanced.
    #[test]
    fn prop_tolerance_is_one_cent(
        amount in positive_amount(),
        diff_cents in -500i64..500i64,
    ) {
        let tenant_id = TenantId::new();
        let (ids, accounts) = chart(tenant_id, 2);
        let credit = amount + Decimal::new(diff_cents, 2);
        prop_assume!(credit > Decimal::ZERO);

        let lines = vec![
            LineDraft::debit(ids[0], amount),
            LineDraft::credit(ids[1], credit),
        ];
        let result = validate_lines(tenant_id, &lines, &accounts, BALANCE_TOLERANCE);

        if diff_cents.abs() <= 1 {
            prop_assert!(result.is_ok(), "within tolerance rejected: {:?}", result);
        } else {
            prop_assert_eq!(
                result,
                Err(ValidationError::Unbalanced { debit: amount, credit })
            );
        }
    }

    /// A negative amount anywhere is rejected with its line number.
    #[test]
    fn prop_negative_amount_rejected(
        amount in positive_amount(),
        position in 0usize..4,
    ) {
        let tenant_id = TenantId::new();
        let (ids, accounts) = chart(tenant_id, 4);
        let mut lines: Vec<LineDraft> = ids.iter().map(|id| LineDraft::debit(*id, amount)).collect();
        lines[position].debit = -amount;

        prop_assert_eq!(
            validate_lines(tenant_id, &lines, &accounts, BALANCE_TOLERANCE),
            Err(ValidationError::NegativeAmount { line: position + 1 })
        );
    }

    /// A line carrying both a debit and a credit is rejected even when balanced.
    #[test]
    fn prop_both_sides_rejected(amount in positive_amount()) {
        let tenant_id = TenantId::new();
        let (ids, accounts) = chart(tenant_id, 1);
        let lines = vec![LineDraft {
            account_id: ids[0],
            debit: amount,
            credit: amount,
            note: None,
        }];

        prop_assert_eq!(
            validate_lines(tenant_id, &lines, &accounts, BALANCE_TOLERANCE),
            Err(ValidationError::BothSides { line: 1 })
        );
    }
}
