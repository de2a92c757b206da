//! Shared fixtures for the repository integration tests.
//!
//! Each test gets its own PostgreSQL database with the real migrations
//! applied. When `PARTIDA_TEST_DATABASE_URL` points at a server, a fresh
//! database is created on it per test; otherwise a throwaway container is
//! started and lives as long as the returned handle.

#![allow(dead_code)]

use std::ops::Deref;

use chrono::NaiveDate;
use partida_core::chart::{Account, BalanceSide};
use partida_core::ledger::{CreateEntryInput, LineDraft};
use partida_db::migration::Migrator;
use partida_db::repositories::{AccountRepository, CreateAccountInput};
use partida_shared::types::{AccountId, TenantId};
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use testcontainers::ContainerAsync;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;
use uuid::Uuid;

/// A migrated database and, when one was started, the container behind it.
pub struct TestDb {
    db: DatabaseConnection,
    _container: Option<ContainerAsync<Postgres>>,
}

impl Deref for TestDb {
    type Target = DatabaseConnection;

    fn deref(&self) -> &DatabaseConnection {
        &self.db
    }
}

pub async fn setup_db() -> TestDb {
    setup_db_with_pool(4).await
}

/// Like `setup_db` with an explicit pool size, for tests that need several
/// transactions open at once.
pub async fn setup_db_with_pool(max_connections: u32) -> TestDb {
    let (url, container) = match std::env::var("PARTIDA_TEST_DATABASE_URL") {
        Ok(server_url) => (fresh_database(&server_url).await, None),
        Err(_) => {
            let container = Postgres::default()
                .start()
                .await
                .expect("Failed to start Postgres container");
            let host = container.get_host().await.expect("Container has no host");
            let port = container
                .get_host_port_ipv4(5432)
                .await
                .expect("Container has no Postgres port");
            (
                format!("postgres://postgres:postgres@{host}:{port}/postgres"),
                Some(container),
            )
        }
    };

    let mut options = ConnectOptions::new(url);
    options
        .max_connections(max_connections)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to connect to test database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    TestDb {
        db,
        _container: container,
    }
}

/// Creates an empty database next to the one `server_url` names and
/// returns its URL.
async fn fresh_database(server_url: &str) -> String {
    let admin = Database::connect(server_url)
        .await
        .expect("Failed to connect to test server");
    let name = format!("partida_test_{}", Uuid::new_v4().simple());
    admin
        .execute_unprepared(&format!("CREATE DATABASE {name}"))
        .await
        .expect("Failed to create test database");
    admin.close().await.ok();

    let base = server_url
        .rsplit_once('/')
        .map_or(server_url, |(base, _)| base);
    format!("{base}/{name}")
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A small chart:
///
/// ```text
/// 1 Assets            2 Liabilities      3 Equity          5 Results
///   11 Current          21 Current         31 Capital        51 Financial
///     111 Cash (M)        211 Payables       311 Capital (A)   511 REI
///     112 Stock (A)
/// ```
pub struct Chart {
    pub tenant_id: TenantId,
    pub assets: Account,
    pub cash: Account,
    pub stock: Account,
    pub payables: Account,
    pub capital: Account,
    pub rei: Account,
}

async fn add(
    repo: &AccountRepository,
    tenant_id: TenantId,
    code: &str,
    name: &str,
    postable: bool,
    side: BalanceSide,
) -> Account {
    repo.create_account(CreateAccountInput::new(tenant_id, code, name, postable, side))
        .await
        .expect("Failed to create account")
}

pub async fn seed_chart(db: &DatabaseConnection, tenant_id: TenantId) -> Chart {
    let repo = AccountRepository::new(db.clone());
    let debit = BalanceSide::Debit;
    let credit = BalanceSide::Credit;

    let assets = add(&repo, tenant_id, "1", "Assets", false, debit).await;
    add(&repo, tenant_id, "11", "Current assets", false, debit).await;
    let cash = repo
        .create_account(CreateAccountInput::new(tenant_id, "111", "Cash", true, debit).monetary())
        .await
        .expect("Failed to create account");
    let stock = repo
        .create_account(
            CreateAccountInput::new(tenant_id, "112", "Stock", true, debit).adjustable(),
        )
        .await
        .expect("Failed to create account");

    add(&repo, tenant_id, "2", "Liabilities", false, credit).await;
    add(&repo, tenant_id, "21", "Current liabilities", false, credit).await;
    let payables = add(&repo, tenant_id, "211", "Payables", true, credit).await;

    add(&repo, tenant_id, "3", "Equity", false, credit).await;
    add(&repo, tenant_id, "31", "Capital", false, credit).await;
    let capital = repo
        .create_account(
            CreateAccountInput::new(tenant_id, "311", "Share capital", true, credit).adjustable(),
        )
        .await
        .expect("Failed to create account");

    add(&repo, tenant_id, "5", "Results", false, credit).await;
    add(&repo, tenant_id, "51", "Financial results", false, credit).await;
    let rei = add(&repo, tenant_id, "511", "REI", true, credit).await;

    Chart {
        tenant_id,
        assets,
        cash,
        stock,
        payables,
        capital,
        rei,
    }
}

/// Two-line entry debiting `debit_account` and crediting `credit_account`.
pub fn simple_entry(
    tenant_id: TenantId,
    on: NaiveDate,
    debit_account: AccountId,
    credit_account: AccountId,
    amount: Decimal,
) -> CreateEntryInput {
    CreateEntryInput {
        tenant_id,
        date: on,
        description: Some("Test entry".to_string()),
        is_opening: false,
        lines: vec![
            LineDraft::debit(debit_account, amount),
            LineDraft::credit(credit_account, amount),
        ],
        created_by: None,
    }
}
