//! Period balance store integration tests: conservation, lookups and the
//! recompute repair path.

mod common;

use std::collections::{BTreeMap, HashMap};

use partida_core::ledger::{AmendEntryInput, LineDraft, PeriodKey, PeriodTotals};
use partida_db::repositories::{BalanceError, BalanceRepository, JournalRepository};
use partida_shared::types::{AccountId, TenantId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;

use common::{Chart, date, seed_chart, setup_db, simple_entry};

fn non_zero(periods: BTreeMap<PeriodKey, PeriodTotals>) -> BTreeMap<PeriodKey, PeriodTotals> {
    periods.into_iter().filter(|(_, t)| !t.is_zero()).collect()
}

/// Posts a history spanning several months with amends and voids.
async fn build_history(db: &DatabaseConnection, chart: &Chart) {
    let journal = JournalRepository::new(db.clone());
    let t = chart.tenant_id;

    let opening = journal
        .create(simple_entry(t, date(2024, 1, 2), chart.cash.id, chart.capital.id, dec!(5000)))
        .await
        .unwrap();
    let purchase = journal
        .create(simple_entry(t, date(2024, 1, 20), chart.stock.id, chart.payables.id, dec!(1200.50)))
        .await
        .unwrap();
    let payment = journal
        .create(simple_entry(t, date(2024, 2, 5), chart.payables.id, chart.cash.id, dec!(600.25)))
        .await
        .unwrap();
    journal
        .create(simple_entry(t, date(2024, 3, 31), chart.stock.id, chart.cash.id, dec!(99.75)))
        .await
        .unwrap();

    journal
        .amend(
            t,
            purchase.id,
            AmendEntryInput {
                date: date(2024, 2, 10),
                description: Some("Purchase, corrected".to_string()),
                lines: vec![
                    LineDraft::debit(chart.stock.id, dec!(1100)),
                    LineDraft::debit(chart.cash.id, dec!(100.50)),
                    LineDraft::credit(chart.payables.id, dec!(1200.50)),
                ],
                amended_by: None,
            },
        )
        .await
        .unwrap();
    journal.void(t, payment.id, None).await.unwrap();
    journal
        .amend(
            t,
            opening.id,
            AmendEntryInput {
                date: date(2024, 1, 2),
                description: None,
                lines: vec![
                    LineDraft::debit(chart.cash.id, dec!(4000)),
                    LineDraft::debit(chart.stock.id, dec!(1000)),
                    LineDraft::credit(chart.capital.id, dec!(5000)),
                ],
                amended_by: None,
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_period_and_accumulated_balances() {
    let db = setup_db().await;
    let chart = seed_chart(&db, TenantId::new()).await;
    let journal = JournalRepository::new(db.clone());
    let balances = BalanceRepository::new(db.clone());
    let t = chart.tenant_id;

    for (month, amount) in [(1, dec!(100)), (1, dec!(50)), (3, dec!(25)), (7, dec!(0.50))] {
        journal
            .create(simple_entry(t, date(2024, month, 1), chart.cash.id, chart.payables.id, amount))
            .await
            .unwrap();
    }
    journal
        .create(simple_entry(t, date(2023, 12, 31), chart.cash.id, chart.payables.id, dec!(1000)))
        .await
        .unwrap();

    let january = balances.period_balance(t, chart.cash.id, 2024, 1).await.unwrap();
    assert_eq!(january.debit_total, dec!(150));
    assert_eq!(january.credit_total, Decimal::ZERO);
    assert_eq!(january.net, dec!(150));

    let empty = balances.period_balance(t, chart.cash.id, 2024, 2).await.unwrap();
    assert!(empty.is_zero());

    assert_eq!(
        balances.accumulated_balance(t, chart.cash.id, 2023, 12).await.unwrap(),
        dec!(1000)
    );
    assert_eq!(
        balances.accumulated_balance(t, chart.cash.id, 2024, 3).await.unwrap(),
        dec!(1175)
    );
    assert_eq!(
        balances.accumulated_balance(t, chart.payables.id, 2024, 12).await.unwrap(),
        dec!(-1175.50)
    );
}

#[tokio::test]
async fn test_period_nets_match_active_lines() {
    let db = setup_db().await;
    let chart = seed_chart(&db, TenantId::new()).await;
    build_history(&db, &chart).await;

    let journal = JournalRepository::new(db.clone());
    let balances = BalanceRepository::new(db.clone());

    let page = journal
        .entries_in_range(
            chart.tenant_id,
            date(2000, 1, 1),
            date(2100, 1, 1),
            false,
            &partida_shared::types::PageRequest::new(1, 100),
        )
        .await
        .unwrap();
    let mut expected: HashMap<AccountId, Decimal> = HashMap::new();
    for entry in &page.data {
        for line in &entry.lines {
            *expected.entry(line.account_id).or_default() += line.signed_amount();
        }
    }

    let mut stored: HashMap<AccountId, Decimal> = HashMap::new();
    for (key, totals) in balances.periods(chart.tenant_id, None).await.unwrap() {
        *stored.entry(key.account_id).or_default() += totals.net;
    }

    for account in [chart.cash.id, chart.stock.id, chart.payables.id, chart.capital.id] {
        let want = expected.get(&account).copied().unwrap_or_default();
        let got = stored.get(&account).copied().unwrap_or_default();
        assert_eq!(got, want, "account {account}");

        let cached = balances.cached_balance(chart.tenant_id, account).await.unwrap();
        assert_eq!(cached.balance, want);
    }

    assert_eq!(expected[&chart.cash.id], dec!(4000) + dec!(100.50) - dec!(99.75));
    assert_eq!(expected[&chart.stock.id], dec!(1000) + dec!(1100) + dec!(99.75));
}

#[tokio::test]
async fn test_recompute_matches_incremental_maintenance() {
    let db = setup_db().await;
    let chart = seed_chart(&db, TenantId::new()).await;
    build_history(&db, &chart).await;
    let balances = BalanceRepository::new(db.clone());

    let incremental = non_zero(balances.periods(chart.tenant_id, None).await.unwrap());
    let mut cached_before = Vec::new();
    for account in [chart.cash.id, chart.stock.id, chart.payables.id, chart.capital.id] {
        cached_before.push(balances.cached_balance(chart.tenant_id, account).await.unwrap());
    }

    let summary = balances.recompute(chart.tenant_id, None).await.unwrap();
    assert_eq!(summary.lines_replayed, 8);
    assert_eq!(summary.periods_written, incremental.len());

    let rebuilt = balances.periods(chart.tenant_id, None).await.unwrap();
    assert_eq!(rebuilt, incremental);

    for (account, before) in [chart.cash.id, chart.stock.id, chart.payables.id, chart.capital.id]
        .into_iter()
        .zip(cached_before)
    {
        let after = balances.cached_balance(chart.tenant_id, account).await.unwrap();
        assert_eq!(after.balance, before.balance);
    }

    // A second run is a no-op
    balances.recompute(chart.tenant_id, None).await.unwrap();
    assert_eq!(balances.periods(chart.tenant_id, None).await.unwrap(), incremental);
}

#[tokio::test]
async fn test_recompute_repairs_a_single_account() {
    let db = setup_db().await;
    let chart = seed_chart(&db, TenantId::new()).await;
    build_history(&db, &chart).await;
    let balances = BalanceRepository::new(db.clone());

    let expected = non_zero(balances.periods(chart.tenant_id, None).await.unwrap());

    // Corrupt the stock rows behind the engine's back
    {
        use partida_db::entities::period_balances;
        use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, sea_query::Expr};

        period_balances::Entity::update_many()
            .col_expr(period_balances::Column::Net, Expr::value(dec!(1)))
            .filter(period_balances::Column::AccountId.eq(chart.stock.id.into_inner()))
            .exec(&*db)
            .await
            .unwrap();
    }
    assert_ne!(
        non_zero(balances.periods(chart.tenant_id, None).await.unwrap()),
        expected
    );

    let summary = balances
        .recompute(chart.tenant_id, Some(chart.stock.id))
        .await
        .unwrap();
    assert_eq!(summary.accounts_reset, 1);

    assert_eq!(
        non_zero(balances.periods(chart.tenant_id, None).await.unwrap()),
        expected
    );
    let cached = balances.cached_balance(chart.tenant_id, chart.stock.id).await.unwrap();
    assert_eq!(cached.last_movement, Some(date(2024, 3, 31)));
}

#[tokio::test]
async fn test_recompute_of_unknown_account_fails() {
    let db = setup_db().await;
    let chart = seed_chart(&db, TenantId::new()).await;
    let balances = BalanceRepository::new(db.clone());

    let err = balances
        .recompute(chart.tenant_id, Some(AccountId::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, BalanceError::AccountNotFound(_)));
}
