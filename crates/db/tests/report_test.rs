//! Reporting engine integration tests.

mod common;

use partida_core::ledger::LineDraft;
use partida_core::reports::{CodeRange, ReportError};
use partida_db::repositories::{
    AccountRepository, JournalRepository, ReportQueryError, ReportRepository,
};
use partida_shared::types::TenantId;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;

use common::{Chart, date, seed_chart, setup_db, simple_entry};

/// Posts three entries and voids the last one.
async fn post_sample(db: &DatabaseConnection, chart: &Chart) {
    let journal = JournalRepository::new(db.clone());
    let t = chart.tenant_id;

    journal
        .create(simple_entry(t, date(2024, 1, 15), chart.cash.id, chart.payables.id, dec!(1000.00)))
        .await
        .unwrap();

    let mut purchase = simple_entry(t, date(2024, 2, 1), chart.stock.id, chart.cash.id, dec!(300));
    purchase.description = Some("Stock purchase".to_string());
    purchase.lines[0] = LineDraft::debit(chart.stock.id, dec!(300)).with_note("Pallets");
    journal.create(purchase).await.unwrap();

    let voided = journal
        .create(simple_entry(t, date(2024, 2, 10), chart.cash.id, chart.capital.id, dec!(50)))
        .await
        .unwrap();
    journal.void(t, voided.id, None).await.unwrap();
}

#[tokio::test]
async fn test_trial_balance_splits_net_by_side() {
    let db = setup_db().await;
    let chart = seed_chart(&db, TenantId::new()).await;
    post_sample(&db, &chart).await;
    let reports = ReportRepository::new(db.clone());

    let january = reports
        .trial_balance(chart.tenant_id, None, date(2024, 1, 31), false)
        .await
        .unwrap();
    assert_eq!(january.rows.len(), 2);
    assert_eq!(january.rows[0].code, "111");
    assert_eq!(january.rows[0].debit_balance, dec!(1000));
    assert_eq!(january.rows[0].credit_balance, Decimal::ZERO);
    assert_eq!(january.rows[1].code, "211");
    assert_eq!(january.rows[1].debit_balance, Decimal::ZERO);
    assert_eq!(january.rows[1].credit_balance, dec!(1000));
    assert!(january.totals.is_balanced);

    let year = reports
        .trial_balance(chart.tenant_id, None, date(2024, 12, 31), false)
        .await
        .unwrap();
    let codes: Vec<&str> = year.rows.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, vec!["111", "112", "211"]);
    assert_eq!(year.rows[0].total_debit, dec!(1000));
    assert_eq!(year.rows[0].total_credit, dec!(300));
    assert_eq!(year.rows[0].debit_balance, dec!(700));
    assert_eq!(year.totals.total_debit, dec!(1300));
    assert_eq!(year.totals.debit_balance, year.totals.credit_balance);

    let with_empty = reports
        .trial_balance(chart.tenant_id, None, date(2024, 12, 31), true)
        .await
        .unwrap();
    assert_eq!(with_empty.rows.len(), 5);

    let february_only = reports
        .trial_balance(chart.tenant_id, Some(date(2024, 2, 1)), date(2024, 2, 29), false)
        .await
        .unwrap();
    assert_eq!(february_only.rows.len(), 2);
    assert_eq!(february_only.rows[0].credit_balance, dec!(300));
}

#[tokio::test]
async fn test_balance_general_rolls_up_descendants() {
    let db = setup_db().await;
    let chart = seed_chart(&db, TenantId::new()).await;
    post_sample(&db, &chart).await;
    let reports = ReportRepository::new(db.clone());

    let report = reports
        .balance_general(chart.tenant_id, None, date(2024, 12, 31))
        .await
        .unwrap();

    let balance_of = |code: &str| {
        report
            .lines
            .iter()
            .find(|l| l.code == code)
            .map(|l| l.balance)
    };
    assert_eq!(balance_of("1"), Some(dec!(1000)));
    assert_eq!(balance_of("11"), Some(dec!(1000)));
    assert_eq!(balance_of("111"), Some(dec!(700)));
    assert_eq!(balance_of("112"), Some(dec!(300)));
    assert_eq!(balance_of("2"), Some(dec!(-1000)));
    assert_eq!(balance_of("211"), Some(dec!(-1000)));
    // Zero below level 1 is omitted, level 1 is always listed
    assert_eq!(balance_of("3"), Some(Decimal::ZERO));
    assert_eq!(balance_of("31"), None);
    assert_eq!(balance_of("311"), None);

    let top: Vec<(&str, Decimal)> = report
        .top_level
        .iter()
        .map(|t| (t.code.as_str(), t.balance))
        .collect();
    assert_eq!(
        top,
        vec![
            ("1", dec!(1000)),
            ("2", dec!(-1000)),
            ("3", Decimal::ZERO),
            ("5", Decimal::ZERO),
        ]
    );
}

#[tokio::test]
async fn test_ledger_by_account_carries_opening_balance() {
    let db = setup_db().await;
    let chart = seed_chart(&db, TenantId::new()).await;
    post_sample(&db, &chart).await;
    let reports = ReportRepository::new(db.clone());

    let codes = CodeRange {
        from: Some("111".to_string()),
        to: Some("112".to_string()),
    };
    let report = reports
        .ledger_by_account(chart.tenant_id, date(2024, 2, 1), date(2024, 12, 31), &codes)
        .await
        .unwrap();

    assert_eq!(report.accounts.len(), 2);
    let cash = &report.accounts[0];
    assert_eq!(cash.code, "111");
    assert_eq!(cash.opening_balance, dec!(1000));
    assert_eq!(cash.movements.len(), 1);
    assert_eq!(cash.movements[0].credit, dec!(300));
    assert_eq!(cash.movements[0].balance, dec!(700));
    assert_eq!(cash.movements[0].description.as_deref(), Some("Stock purchase"));
    assert_eq!(cash.closing_balance, dec!(700));

    let stock = &report.accounts[1];
    assert_eq!(stock.opening_balance, Decimal::ZERO);
    assert_eq!(stock.movements[0].description.as_deref(), Some("Pallets"));
    assert_eq!(stock.closing_balance, dec!(300));

    // No movement inside the range: left out
    let march = reports
        .ledger_by_account(chart.tenant_id, date(2024, 3, 1), date(2024, 3, 31), &CodeRange::default())
        .await
        .unwrap();
    assert!(march.accounts.is_empty());
}

#[tokio::test]
async fn test_journal_listing_skips_void_entries() {
    let db = setup_db().await;
    let chart = seed_chart(&db, TenantId::new()).await;
    post_sample(&db, &chart).await;
    let reports = ReportRepository::new(db.clone());

    let listing = reports
        .journal_listing(chart.tenant_id, date(2024, 1, 1), date(2024, 12, 31))
        .await
        .unwrap();

    let numbers: Vec<i32> = listing.entries.iter().map(|e| e.number).collect();
    assert_eq!(numbers, vec![1, 2]);
    assert_eq!(listing.entries[0].lines[0].account_code, "111");
    assert_eq!(listing.entries[1].total_debit, dec!(300));
    assert_eq!(listing.total_debit, dec!(1300));
    assert_eq!(listing.total_credit, dec!(1300));
}

#[tokio::test]
async fn test_inverted_range_is_rejected() {
    let db = setup_db().await;
    let chart = seed_chart(&db, TenantId::new()).await;
    let reports = ReportRepository::new(db.clone());

    let err = reports
        .trial_balance(chart.tenant_id, Some(date(2024, 12, 31)), date(2024, 1, 1), false)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ReportQueryError::Report(ReportError::InvalidDateRange { .. })
    ));
}

#[tokio::test]
async fn test_balance_general_skips_inactive_accounts() {
    let db = setup_db().await;
    let chart = seed_chart(&db, TenantId::new()).await;
    post_sample(&db, &chart).await;
    let accounts = AccountRepository::new(db.clone());
    let reports = ReportRepository::new(db.clone());

    let results = accounts
        .find_by_code(chart.tenant_id, "5")
        .await
        .unwrap()
        .unwrap();
    accounts
        .set_active(chart.tenant_id, results.id, false)
        .await
        .unwrap();

    let report = reports
        .balance_general(chart.tenant_id, None, date(2024, 12, 31))
        .await
        .unwrap();

    let top: Vec<&str> = report.top_level.iter().map(|t| t.code.as_str()).collect();
    assert_eq!(top, vec!["1", "2", "3"]);
    assert!(report.lines.iter().all(|l| l.code != "5"));
    assert_eq!(
        report.lines.iter().find(|l| l.code == "1").map(|l| l.balance),
        Some(dec!(1000))
    );
}
